//! Registration, login and session endpoints.
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use matchday_common::requests::{LoginRequest, RegisterRequest};
use matchday_common::{AuthResponse, Plan, PublicUser, Role, User};
use uuid::Uuid;

use super::ApiJson;
use crate::auth::CurrentUser;
use crate::error::AppError;
use crate::validation::{normalize_email, validate_email, validate_name, validate_password};
use crate::AppState;

pub async fn register(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let name = validate_name(&request.name)?.to_string();
    validate_email(request.email.trim())?;
    validate_password(&request.password, &state.settings.password_requirements)?;
    let email = normalize_email(&request.email);

    if state.storage.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("email already registered".to_string()));
    }

    let credential_hash = state
        .auth
        .hash_password(&request.password)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    let is_bootstrap_admin = state
        .settings
        .bootstrap_admin_email
        .as_deref()
        .is_some_and(|admin| normalize_email(admin) == email);

    let user = state
        .storage
        .insert_user(User {
            id: Uuid::new_v4(),
            name,
            email,
            credential_hash,
            role: if is_bootstrap_admin { Role::Admin } else { Role::Player },
            plan: Plan::Free,
            position: None,
            photo_url: None,
            created_at: Utc::now(),
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, "user registered");
    let token = state.auth.issue_token(user.id).await;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            user: PublicUser::from(&user),
            token,
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let email = normalize_email(&request.email);
    if !state.auth_rate_limiter.check_rate_limit(&email) {
        return Err(AppError::AuthRateLimited);
    }

    let user = state.storage.find_user_by_email(&email).await?;
    let verified = match &user {
        Some(user) => {
            state
                .auth
                .verify_password(&user.credential_hash, &request.password)
                .await
        },
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        state.auth_rate_limiter.record_failed_attempt(&email);
        return Err(AppError::Unauthenticated(
            "invalid email or password".to_string(),
        ));
    };

    state.auth_rate_limiter.record_success(&email);
    let token = state.auth.issue_token(user.id).await;
    tracing::debug!(user_id = %user.id, "login succeeded");
    Ok(Json(AuthResponse {
        user: PublicUser::from(&user),
        token,
    }))
}

pub async fn me(current: CurrentUser) -> Json<PublicUser> {
    Json(PublicUser::from(&current.user))
}

pub async fn logout(State(state): State<Arc<AppState>>, current: CurrentUser) -> StatusCode {
    state.auth.revoke(&current.token).await;
    StatusCode::NO_CONTENT
}
