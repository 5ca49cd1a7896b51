// ===========================
// tests/test_utils/mod.rs
// ===========================
//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use matchday_backend::config::Settings;
use matchday_backend::storage::{MemoryStorage, Storage};
use matchday_backend::AppState;
use matchday_common::requests::CreateMatchRequest;
use matchday_common::{Plan, Role, User};
use uuid::Uuid;

/// Settings with a cheap password hash so tests stay fast
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.password_hash_log_n = 4;
    settings
}

pub fn memory_state() -> Arc<AppState> {
    state_with(test_settings())
}

pub fn state_with(settings: Settings) -> Arc<AppState> {
    Arc::new(AppState::new(settings, Arc::new(MemoryStorage::new())))
}

pub async fn insert_user(storage: &dyn Storage, name: &str, plan: Plan, role: Role) -> User {
    storage
        .insert_user(User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            credential_hash: String::new(),
            role,
            plan,
            position: None,
            photo_url: None,
            created_at: Utc::now(),
        })
        .await
        .expect("insert user")
}

pub async fn player(state: &AppState, name: &str, plan: Plan) -> User {
    insert_user(state.storage.as_ref(), name, plan, Role::Player).await
}

pub fn match_request(title: &str, days_ahead: i64, requires_approval: bool) -> CreateMatchRequest {
    CreateMatchRequest {
        title: title.to_string(),
        description: None,
        location: "Victoria Park".to_string(),
        date: Utc::now() + Duration::days(days_ahead),
        max_players: 10,
        is_public: true,
        auto_release: true,
        requires_approval,
    }
}
