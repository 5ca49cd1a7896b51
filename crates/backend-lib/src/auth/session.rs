// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use crate::auth::token_generator::session_token;
use crate::metrics;
use matchday_common::UserId;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, SystemTime},
};
use tokio::sync::RwLock;

/// Session information
#[derive(Clone, Debug)]
pub struct Session {
    pub user_id: UserId,
    pub created_at: SystemTime,
    pub expires_at: SystemTime,
}

impl Session {
    pub fn is_expired(&self, now: SystemTime) -> bool {
        now >= self.expires_at
    }
}

/// Session manager for handling bearer tokens
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
    ttl: Duration,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(ttl: Duration) -> Self {
        SessionManager {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Create a new session and return its token
    pub async fn create_session(&self, user_id: UserId) -> String {
        let token = session_token();
        let now = SystemTime::now();
        let session = Session {
            user_id,
            created_at: now,
            expires_at: now + self.ttl,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(token.clone(), session);

        ::metrics::counter!(metrics::SESSION_CREATED).increment(1);
        ::metrics::gauge!(metrics::SESSION_ACTIVE).set(sessions.len() as f64);

        token
    }

    /// Get a live session by token
    pub async fn get_session(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.read().await;
        sessions
            .get(token)
            .filter(|session| !session.is_expired(SystemTime::now()))
            .cloned()
    }

    /// Remove a session; returns whether it existed
    pub async fn revoke(&self, token: &str) -> bool {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(token).is_some();
        ::metrics::gauge!(metrics::SESSION_ACTIVE).set(sessions.len() as f64);
        removed
    }

    /// Drop expired sessions and return how many were removed
    pub async fn cleanup_expired_sessions(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let now = SystemTime::now();
        let before_count = sessions.len();

        sessions.retain(|_, session| !session.is_expired(now));

        let after_count = sessions.len();
        let removed = before_count - after_count;

        if removed > 0 {
            ::metrics::counter!(metrics::SESSION_EXPIRED).increment(removed as u64);
            ::metrics::gauge!(metrics::SESSION_ACTIVE).set(after_count as f64);
            tracing::debug!(removed, "expired sessions pruned");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_session_lifecycle() {
        let manager = SessionManager::new(Duration::from_secs(60));
        let user_id = Uuid::new_v4();

        let token = manager.create_session(user_id).await;
        let session = manager.get_session(&token).await.unwrap();
        assert_eq!(session.user_id, user_id);

        assert!(manager.get_session("unknown-token").await.is_none());

        assert!(manager.revoke(&token).await);
        assert!(manager.get_session(&token).await.is_none());
        assert!(!manager.revoke(&token).await);
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible_and_pruned() {
        let manager = SessionManager::new(Duration::ZERO);
        let token = manager.create_session(Uuid::new_v4()).await;

        assert!(manager.get_session(&token).await.is_none());
        assert_eq!(manager.cleanup_expired_sessions().await, 1);
        assert_eq!(manager.cleanup_expired_sessions().await, 0);
    }
}
