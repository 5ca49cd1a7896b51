//! Profile, role and plan management plus per-user views.
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use matchday_common::requests::{SetPlanRequest, SetRoleRequest, UpdateProfileRequest};
use matchday_common::{Plan, PlanLimits, PublicUser, Role, User, UserId, UserPayment, UserStats};

use super::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::validation::{validate_name, validate_text};
use crate::{finance, plan_limits, stats, AppState};

const MAX_PROFILE_FIELD: usize = 500;

fn require_admin(current: &CurrentUser) -> Result<(), AppError> {
    if current.user.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("admin role required".to_string()))
    }
}

async fn load_user(state: &AppState, user_id: UserId) -> Result<User, AppError> {
    state
        .storage
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))
}

pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, AppError> {
    let mut user = current.user;
    if let Some(name) = &request.name {
        user.name = validate_name(name)?.to_string();
    }
    if let Some(position) = request.position {
        validate_text("position", &position, MAX_PROFILE_FIELD, true)?;
        user.position = Some(position);
    }
    if let Some(photo_url) = request.photo_url {
        validate_text("photoUrl", &photo_url, MAX_PROFILE_FIELD, true)?;
        user.photo_url = Some(photo_url);
    }
    let user = state.storage.update_user(user).await?;
    Ok(Json(PublicUser::from(&user)))
}

pub async fn set_role(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(user_id): Path<UserId>,
    ApiJson(request): ApiJson<SetRoleRequest>,
) -> Result<Json<PublicUser>, AppError> {
    require_admin(&current)?;
    let role: Role = request.role.parse()?;
    let mut user = load_user(&state, user_id).await?;
    user.role = role;
    let user = state.storage.update_user(user).await?;
    tracing::info!(%user_id, role = %role, admin_id = %current.user.id, "role changed");
    Ok(Json(PublicUser::from(&user)))
}

pub async fn set_plan(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
    Path(user_id): Path<UserId>,
    ApiJson(request): ApiJson<SetPlanRequest>,
) -> Result<Json<PublicUser>, AppError> {
    require_admin(&current)?;
    // strict here, unlike stored values which fall back to free
    let plan: Plan = request.plan.parse()?;
    let mut user = load_user(&state, user_id).await?;
    user.plan = plan;
    let user = state.storage.update_user(user).await?;
    tracing::info!(%user_id, plan = %plan, admin_id = %current.user.id, "plan changed");
    Ok(Json(PublicUser::from(&user)))
}

pub async fn user_stats(
    State(state): State<Arc<AppState>>,
    _current: CurrentUser,
    Path(user_id): Path<UserId>,
) -> Result<Json<UserStats>, AppError> {
    load_user(&state, user_id).await?;
    Ok(Json(stats::user_stats(state.storage.as_ref(), user_id).await?))
}

pub async fn plan_limits(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<PlanLimits>, AppError> {
    Ok(Json(
        plan_limits::evaluate(state.storage.as_ref(), &current.user).await?,
    ))
}

pub async fn my_payments(
    State(state): State<Arc<AppState>>,
    current: CurrentUser,
) -> Result<Json<Vec<UserPayment>>, AppError> {
    Ok(Json(
        finance::payments_for_user(state.storage.as_ref(), &current.user).await?,
    ))
}
