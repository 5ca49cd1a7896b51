// ===========================
// tests/match_lifecycle.rs
// ===========================
mod test_utils;

use std::collections::HashSet;

use matchday_backend::error::AppError;
use matchday_backend::{social, stats};
use matchday_common::requests::{CreatePostRequest, InviteRequest};
use matchday_common::{ApprovalStatus, InvitationStatus, MatchPatch, MatchStatus, Plan, Role};
use test_utils::{insert_user, match_request, memory_state, player};

#[tokio::test]
async fn test_invite_codes_unique_and_stable() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Advanced).await;

    let mut codes = HashSet::new();
    let mut created = Vec::new();
    for i in 0..10 {
        let m = state
            .matches
            .create_match(&host, match_request(&format!("Game {i}"), i + 1, false))
            .await
            .unwrap();
        assert!(codes.insert(m.invite_code.clone()));
        created.push(m);
    }

    let patch = MatchPatch {
        title: Some("Renamed".to_string()),
        status: Some(MatchStatus::InProgress),
        ..MatchPatch::default()
    };
    let before = &created[0];
    let after = state
        .matches
        .update_match(&host, before.id, patch)
        .await
        .unwrap();
    assert_eq!(after.title, "Renamed");
    assert_eq!(after.invite_code, before.invite_code);
    assert_eq!(after.invite_link, before.invite_link);
}

#[tokio::test]
async fn test_confirmation_is_idempotent() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Basic).await;
    let user = player(&state, "Player", Plan::Free).await;
    let m = state
        .matches
        .create_match(&host, match_request("Five a side", 2, false))
        .await
        .unwrap();

    let first = state.matches.set_confirmation(&user, m.id, true).await.unwrap();
    let second = state.matches.set_confirmation(&user, m.id, true).await.unwrap();
    assert_eq!(first.id, second.id);

    let rows = state.matches.list_confirmations(m.id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].confirmed);

    let cancelled = state.matches.set_confirmation(&user, m.id, false).await.unwrap();
    assert!(!cancelled.confirmed);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(state.matches.list_confirmations(m.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_code_creates_nothing() {
    let state = memory_state();
    let user = player(&state, "Player", Plan::Free).await;

    let err = state.matches.join_by_code(&user, "ZZZZZZZZ").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCode));
    let rows = state
        .storage
        .list_confirmations_by_user(user.id)
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn test_join_by_code_ignores_case_and_whitespace() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Basic).await;
    let user = player(&state, "Player", Plan::Free).await;
    let m = state
        .matches
        .create_match(&host, match_request("Kickabout", 1, false))
        .await
        .unwrap();

    let code = format!("  {}  ", m.invite_code.to_lowercase());
    let joined = state.matches.join_by_code(&user, &code).await.unwrap();
    assert_eq!(joined.id, m.id);

    let confirmation = state
        .storage
        .get_confirmation(user.id, m.id)
        .await
        .unwrap()
        .unwrap();
    assert!(confirmation.confirmed);
    assert_eq!(confirmation.status, ApprovalStatus::Approved);
}

#[tokio::test]
async fn test_basic_plan_creates_two_matches() {
    let state = memory_state();
    let a = player(&state, "Alex", Plan::Basic).await;

    for i in 0..2 {
        state
            .matches
            .create_match(&a, match_request(&format!("Game {i}"), i + 1, false))
            .await
            .unwrap();
    }
    let err = state
        .matches
        .create_match(&a, match_request("One too many", 5, false))
        .await
        .unwrap_err();
    match err {
        AppError::QuotaExceeded(limits) => {
            assert_eq!(limits.created_count, 2);
            assert_eq!(limits.max_created, 2);
            assert!(!limits.can_create);
        },
        other => panic!("expected quota error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_free_plan_limits() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Intermediate).await;
    let user = player(&state, "Free", Plan::Free).await;

    let err = state
        .matches
        .create_match(&user, match_request("Mine", 1, false))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::QuotaExceeded(_)));

    let first = state
        .matches
        .create_match(&host, match_request("First", 1, false))
        .await
        .unwrap();
    let second = state
        .matches
        .create_match(&host, match_request("Second", 2, false))
        .await
        .unwrap();

    state.matches.join_by_code(&user, &first.invite_code).await.unwrap();
    // joining again counts as the same participation
    state.matches.join_by_code(&user, &first.invite_code).await.unwrap();

    let err = state
        .matches
        .join_by_code(&user, &second.invite_code)
        .await
        .unwrap_err();
    match err {
        AppError::QuotaExceeded(limits) => {
            assert_eq!(limits.joined_count, 1);
            assert!(!limits.can_join);
            assert!(!limits.can_create);
        },
        other => panic!("expected quota error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_creates_respect_quota() {
    let state = memory_state();
    let a = player(&state, "Racer", Plan::Basic).await;

    let mut handles = Vec::new();
    for i in 0..6 {
        let state = state.clone();
        let a = a.clone();
        handles.push(tokio::spawn(async move {
            state
                .matches
                .create_match(&a, match_request(&format!("Race {i}"), i + 1, false))
                .await
        }));
    }

    let mut succeeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => succeeded += 1,
            Err(AppError::QuotaExceeded(_)) => {},
            Err(other) => panic!("unexpected error {other:?}"),
        }
    }
    assert_eq!(succeeded, 2);
}

#[tokio::test]
async fn test_approval_required_join_is_pending() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Basic).await;
    let b = player(&state, "Blair", Plan::Free).await;
    let m = state
        .matches
        .create_match(&host, match_request("Invite only", 3, true))
        .await
        .unwrap();

    state.matches.join_by_code(&b, &m.invite_code).await.unwrap();
    let confirmation = state
        .storage
        .get_confirmation(b.id, m.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(confirmation.status, ApprovalStatus::Pending);
    assert!(!confirmation.confirmed);

    // a plain player cannot approve themselves
    let err = state
        .matches
        .review_participant(&b, m.id, b.id, ApprovalStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let approved = state
        .matches
        .review_participant(&host, m.id, b.id, ApprovalStatus::Approved)
        .await
        .unwrap();
    assert!(approved.confirmed);

    let notifications = state.storage.list_notifications(b.id).await.unwrap();
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn test_only_creator_or_admin_edits() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Basic).await;
    let other = player(&state, "Other", Plan::Basic).await;
    let admin = insert_user(state.storage.as_ref(), "Admin", Plan::Free, Role::Admin).await;
    let m = state
        .matches
        .create_match(&host, match_request("Owned", 2, false))
        .await
        .unwrap();

    let patch = MatchPatch {
        location: Some("Somewhere else".to_string()),
        ..MatchPatch::default()
    };
    let err = state
        .matches
        .update_match(&other, m.id, patch.clone())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(state.matches.get_match(m.id).await.unwrap().location, m.location);

    let edited = state.matches.update_match(&admin, m.id, patch).await.unwrap();
    assert_eq!(edited.location, "Somewhere else");
}

#[tokio::test]
async fn test_attendance_feeds_user_stats() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Advanced).await;
    let user = player(&state, "Regular", Plan::Advanced).await;

    let empty = stats::user_stats(state.storage.as_ref(), user.id).await.unwrap();
    assert_eq!(empty.total_matches, 0);
    assert_eq!(empty.attendance_rate, 0.0);

    for i in 0..4 {
        let m = state
            .matches
            .create_match(&host, match_request(&format!("Week {i}"), i + 1, false))
            .await
            .unwrap();
        state.matches.join_by_code(&user, &m.invite_code).await.unwrap();
        if i < 3 {
            state
                .matches
                .set_attendance(&host, m.id, user.id, true)
                .await
                .unwrap();
        }
    }

    let summary = stats::user_stats(state.storage.as_ref(), user.id).await.unwrap();
    assert_eq!(summary.total_matches, 4);
    assert_eq!(summary.attendance_rate, 75.0);
}

#[tokio::test]
async fn test_invitation_accept_confirms_invitee() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Basic).await;
    let guest = player(&state, "Guest", Plan::Free).await;
    let m = state
        .matches
        .create_match(&host, match_request("Private", 2, true))
        .await
        .unwrap();

    let invitation = state
        .matches
        .invite_user(
            &host,
            m.id,
            InviteRequest {
                user_id: Some(guest.id),
                email: None,
            },
        )
        .await
        .unwrap();

    let err = state
        .matches
        .respond_to_invitation(&host, invitation.id, InvitationStatus::Accepted)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    state
        .matches
        .respond_to_invitation(&guest, invitation.id, InvitationStatus::Accepted)
        .await
        .unwrap();
    let confirmation = state
        .storage
        .get_confirmation(guest.id, m.id)
        .await
        .unwrap()
        .unwrap();
    assert!(confirmation.confirmed);
    assert_eq!(confirmation.status, ApprovalStatus::Approved);

    let err = state
        .matches
        .respond_to_invitation(&guest, invitation.id, InvitationStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn test_delete_cascades_and_detaches_posts() {
    let state = memory_state();
    let host = player(&state, "Host", Plan::Basic).await;
    let user = player(&state, "Player", Plan::Free).await;
    let m = state
        .matches
        .create_match(&host, match_request("Short lived", 2, false))
        .await
        .unwrap();
    state.matches.join_by_code(&user, &m.invite_code).await.unwrap();
    let post = social::create_post(
        state.storage.as_ref(),
        &state.registry,
        &user,
        CreatePostRequest {
            content: "See you there".to_string(),
            match_id: Some(m.id),
            image_url: None,
        },
    )
    .await
    .unwrap();

    let err = state.matches.delete_match(&user, m.id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    state.matches.delete_match(&host, m.id).await.unwrap();
    assert!(state.storage.get_match(m.id).await.unwrap().is_none());
    assert!(state
        .storage
        .list_confirmations_by_user(user.id)
        .await
        .unwrap()
        .is_empty());
    let kept = state.storage.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(kept.match_id, None);

    let host_matches = state.storage.list_matches_created_by(host.id).await.unwrap();
    assert!(host_matches.is_empty());
}
