//! Statistics and ratings.
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use matchday_common::requests::{CreateStatisticsRequest, RateRequest, ReviewStatisticsRequest};
use matchday_common::{MatchId, Rating, Statistics, UserId};
use uuid::Uuid;

use super::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::{stats, AppState};

pub async fn record_statistics(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(match_id): Path<MatchId>,
    ApiJson(request): ApiJson<CreateStatisticsRequest>,
) -> Result<(StatusCode, Json<Statistics>), AppError> {
    let stats =
        stats::record_statistics(state.storage.as_ref(), &current.user, match_id, request).await?;
    Ok((StatusCode::CREATED, Json(stats)))
}

pub async fn list_statistics(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(match_id): Path<MatchId>,
) -> Result<Json<Vec<Statistics>>, AppError> {
    Ok(Json(
        stats::list_match_statistics(state.storage.as_ref(), match_id).await?,
    ))
}

pub async fn review_statistics(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(statistics_id): Path<Uuid>,
    ApiJson(request): ApiJson<ReviewStatisticsRequest>,
) -> Result<Json<Statistics>, AppError> {
    Ok(Json(
        stats::review_statistics(
            state.storage.as_ref(),
            &current.user,
            statistics_id,
            request.status,
            state.settings.matches.statistics_quorum,
        )
        .await?,
    ))
}

pub async fn rate_player(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(player_id): Path<UserId>,
    ApiJson(request): ApiJson<RateRequest>,
) -> Result<(StatusCode, Json<Rating>), AppError> {
    let rating =
        stats::rate_player(state.storage.as_ref(), &current.user, player_id, request).await?;
    Ok((StatusCode::CREATED, Json(rating)))
}
