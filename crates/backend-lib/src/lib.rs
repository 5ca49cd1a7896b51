// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core library of the Matchday server: match coordination over HTTP with
//! realtime fan-out on a WebSocket channel.

pub mod auth;
pub mod config;
pub mod error;
pub mod fanout;
pub mod finance;
pub mod handlers;
pub mod matches;
pub mod metrics;
pub mod middleware;
pub mod notifications;
pub mod plan_limits;
pub mod routes;
pub mod social;
pub mod stats;
pub mod storage;
pub mod validation;
pub mod ws_router;

use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthRateLimiter, AuthService, DefaultAuth, SessionManager};
use crate::config::Settings;
use crate::fanout::ConnectionRegistry;
use crate::matches::MatchManager;
use crate::middleware::RateLimiter;
use crate::storage::Storage;

pub use crate::routes::app;

/// Application state shared across all handlers
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session manager, shared with `auth`
    pub sessions: SessionManager,
    pub settings: Arc<Settings>,
    /// Storage backend chosen at startup
    pub storage: Arc<dyn Storage>,
    /// Live realtime connections
    pub registry: Arc<ConnectionRegistry>,
    pub matches: MatchManager,
    /// Per-client request budget for the auth routes
    pub rate_limiter: RateLimiter,
    /// Per-account lockout after failed logins
    pub auth_rate_limiter: AuthRateLimiter,
}

impl AppState {
    /// Create a new application state
    pub fn new(settings: Settings, storage: Arc<dyn Storage>) -> Self {
        let sessions = SessionManager::new(Duration::from_secs(settings.session_ttl_secs));
        let auth = Arc::new(DefaultAuth::new(
            sessions.clone(),
            settings.password_hash_log_n,
        ));
        let registry = Arc::new(ConnectionRegistry::new());
        let matches = MatchManager::new(
            storage.clone(),
            registry.clone(),
            settings.matches.clone(),
        );
        let rate_limiter = RateLimiter::new(
            settings.rate_limit.max_requests,
            Duration::from_secs(settings.rate_limit.window_secs),
        );

        Self {
            auth,
            sessions,
            settings: Arc::new(settings),
            storage,
            registry,
            matches,
            rate_limiter,
            auth_rate_limiter: AuthRateLimiter::default(),
        }
    }

    /// Periodic housekeeping: expired sessions, stale rate-limit entries
    pub async fn run_maintenance(&self) {
        self.sessions.cleanup_expired_sessions().await;
        self.rate_limiter.cleanup();
        self.auth_rate_limiter.cleanup();
    }
}
