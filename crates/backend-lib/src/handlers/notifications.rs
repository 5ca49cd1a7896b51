use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use matchday_common::Notification;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::{notifications, AppState};

pub async fn list(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Vec<Notification>>, AppError> {
    Ok(Json(
        notifications::list_for_user(state.storage.as_ref(), current.user.id).await?,
    ))
}

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Notification>, AppError> {
    Ok(Json(
        notifications::mark_read(state.storage.as_ref(), current.user.id, notification_id)
            .await?,
    ))
}
