//! Match lifecycle endpoints.
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use matchday_common::requests::{
    AttendanceRequest, CreateMatchRequest, InviteRequest, JoinByCodeRequest,
    RespondInvitationRequest, ReviewParticipantRequest,
};
use matchday_common::{
    Confirmation, Match, MatchId, MatchInvitation, MatchPatch, Participant, UserId,
};
use uuid::Uuid;

use super::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::AppState;

pub async fn list_matches(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Vec<Match>>, AppError> {
    Ok(Json(state.matches.list_matches(&current.user).await?))
}

pub async fn create_match(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<CreateMatchRequest>,
) -> Result<(StatusCode, Json<Match>), AppError> {
    let m = state.matches.create_match(&current.user, request).await?;
    Ok((StatusCode::CREATED, Json(m)))
}

pub async fn get_match(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Match>, AppError> {
    Ok(Json(state.matches.get_match(match_id).await?))
}

pub async fn update_match(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
    ApiJson(patch): ApiJson<MatchPatch>,
) -> Result<Json<Match>, AppError> {
    Ok(Json(
        state
            .matches
            .update_match(&current.user, match_id, patch)
            .await?,
    ))
}

pub async fn delete_match(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<StatusCode, AppError> {
    state.matches.delete_match(&current.user, match_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn join_by_code(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<JoinByCodeRequest>,
) -> Result<Json<Match>, AppError> {
    Ok(Json(
        state
            .matches
            .join_by_code(&current.user, &request.code)
            .await?,
    ))
}

pub async fn confirm(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Confirmation>, AppError> {
    Ok(Json(
        state
            .matches
            .set_confirmation(&current.user, match_id, true)
            .await?,
    ))
}

pub async fn cancel_confirmation(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Confirmation>, AppError> {
    Ok(Json(
        state
            .matches
            .set_confirmation(&current.user, match_id, false)
            .await?,
    ))
}

pub async fn list_confirmations(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Vec<Confirmation>>, AppError> {
    Ok(Json(state.matches.list_confirmations(match_id).await?))
}

pub async fn participants(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Vec<Participant>>, AppError> {
    Ok(Json(state.matches.participants(match_id).await?))
}

pub async fn review_participant(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((match_id, user_id)): Path<(MatchId, UserId)>,
    ApiJson(request): ApiJson<ReviewParticipantRequest>,
) -> Result<Json<Confirmation>, AppError> {
    Ok(Json(
        state
            .matches
            .review_participant(&current.user, match_id, user_id, request.status)
            .await?,
    ))
}

pub async fn set_attendance(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path((match_id, user_id)): Path<(MatchId, UserId)>,
    ApiJson(request): ApiJson<AttendanceRequest>,
) -> Result<Json<Confirmation>, AppError> {
    Ok(Json(
        state
            .matches
            .set_attendance(&current.user, match_id, user_id, request.attended)
            .await?,
    ))
}

pub async fn list_invitations(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Vec<MatchInvitation>>, AppError> {
    Ok(Json(
        state
            .matches
            .list_invitations(&current.user, match_id)
            .await?,
    ))
}

pub async fn invite(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
    ApiJson(request): ApiJson<InviteRequest>,
) -> Result<(StatusCode, Json<MatchInvitation>), AppError> {
    let invitation = state
        .matches
        .invite_user(&current.user, match_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(invitation)))
}

pub async fn respond_invitation(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(invitation_id): Path<Uuid>,
    ApiJson(request): ApiJson<RespondInvitationRequest>,
) -> Result<Json<MatchInvitation>, AppError> {
    Ok(Json(
        state
            .matches
            .respond_to_invitation(&current.user, invitation_id, request.status)
            .await?,
    ))
}
