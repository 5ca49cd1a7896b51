// ============================
// crates/backend-lib/src/stats.rs
// ============================
//! Per-match statistics with multi-party attestation, ratings, and the
//! per-user aggregate.
use chrono::Utc;
use matchday_common::requests::{CreateStatisticsRequest, RateRequest};
use matchday_common::{
    ApprovalStatus, Match, MatchId, Rating, Statistics, User, UserId, UserStats,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::storage::Storage;
use crate::validation::{validate_rating, validate_text, MAX_COMMENT_LENGTH};

async fn load_match(storage: &dyn Storage, match_id: MatchId) -> Result<Match, AppError> {
    storage
        .get_match(match_id)
        .await?
        .ok_or_else(|| AppError::not_found("match"))
}

/// Record counts for a player; moderators and admins only
pub async fn record_statistics(
    storage: &dyn Storage,
    recorder: &User,
    match_id: MatchId,
    request: CreateStatisticsRequest,
) -> Result<Statistics, AppError> {
    if !recorder.role.is_staff() {
        return Err(AppError::Forbidden(
            "only moderators may record statistics".to_string(),
        ));
    }
    load_match(storage, match_id).await?;
    if storage.get_user(request.user_id).await?.is_none() {
        return Err(AppError::not_found("user"));
    }

    storage
        .insert_statistics(Statistics {
            id: Uuid::new_v4(),
            match_id,
            user_id: request.user_id,
            goals: request.goals,
            assists: request.assists,
            yellow_cards: request.yellow_cards,
            red_cards: request.red_cards,
            status: ApprovalStatus::Pending,
            approved_by: Vec::new(),
            created_at: Utc::now(),
        })
        .await
}

pub async fn list_match_statistics(
    storage: &dyn Storage,
    match_id: MatchId,
) -> Result<Vec<Statistics>, AppError> {
    load_match(storage, match_id).await?;
    storage.list_statistics_by_match(match_id).await
}

/// Attest or reject a statistics row.
///
/// Approvals accumulate per distinct reviewer; the row only becomes
/// `approved` once `quorum` reviewers have signed it.
pub async fn review_statistics(
    storage: &dyn Storage,
    reviewer: &User,
    statistics_id: Uuid,
    decision: ApprovalStatus,
    quorum: usize,
) -> Result<Statistics, AppError> {
    let mut stats = storage
        .get_statistics(statistics_id)
        .await?
        .ok_or_else(|| AppError::not_found("statistics"))?;
    let m = load_match(storage, stats.match_id).await?;
    if !(reviewer.role.is_staff() || m.created_by == reviewer.id) {
        return Err(AppError::Forbidden(
            "only the creator or a moderator may review statistics".to_string(),
        ));
    }

    match decision {
        ApprovalStatus::Approved => {
            if !stats.approved_by.contains(&reviewer.id) {
                stats.approved_by.push(reviewer.id);
            }
            if stats.approved_by.len() >= quorum {
                stats.status = ApprovalStatus::Approved;
            }
        },
        ApprovalStatus::Rejected => stats.status = ApprovalStatus::Rejected,
        ApprovalStatus::Pending => {
            return Err(AppError::Validation(
                "decision must be approved or rejected".to_string(),
            ))
        },
    }
    storage.update_statistics(stats).await
}

/// Rate another player's performance in a match
pub async fn rate_player(
    storage: &dyn Storage,
    rater: &User,
    player_id: UserId,
    request: RateRequest,
) -> Result<Rating, AppError> {
    let rating = validate_rating(request.rating)?;
    if let Some(comment) = &request.comment {
        validate_text("comment", comment, MAX_COMMENT_LENGTH, true)?;
    }
    if player_id == rater.id {
        return Err(AppError::Validation("cannot rate yourself".to_string()));
    }
    if storage.get_user(player_id).await?.is_none() {
        return Err(AppError::not_found("user"));
    }
    load_match(storage, request.match_id).await?;

    storage
        .insert_rating(Rating {
            id: Uuid::new_v4(),
            rater_id: rater.id,
            player_id,
            match_id: request.match_id,
            rating,
            comment: request.comment,
            created_at: Utc::now(),
        })
        .await
}

pub async fn user_stats(storage: &dyn Storage, user_id: UserId) -> Result<UserStats, AppError> {
    let confirmations = storage.list_confirmations_by_user(user_id).await?;
    let statistics = storage.list_statistics_by_user(user_id).await?;
    let ratings = storage.list_ratings_for_player(user_id).await?;

    let total = confirmations.len() as u64;
    let attended = confirmations.iter().filter(|c| c.attended).count() as u64;
    let counted = statistics
        .iter()
        .filter(|s| s.status != ApprovalStatus::Rejected);
    let (total_goals, total_assists) = counted.fold((0u64, 0u64), |(goals, assists), s| {
        (goals + u64::from(s.goals), assists + u64::from(s.assists))
    });

    Ok(UserStats {
        total_matches: total,
        total_goals,
        total_assists,
        average_rating: mean(ratings.iter().map(|r| f64::from(r.rating))),
        attendance_rate: attendance_rate(attended, total),
    })
}

/// Percentage of confirmations that were attended; zero without any
pub fn attendance_rate(attended: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    attended as f64 / total as f64 * 100.0
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / f64::from(count)
    }
}
