use crate::auth::{hash_password, verify_password, AuthService, SessionManager};
use async_trait::async_trait;
use matchday_common::UserId;

/// Session-backed authentication with scrypt password hashes
pub struct DefaultAuth {
    sm: SessionManager,
    hash_log_n: u8,
}

impl DefaultAuth {
    pub fn new(sm: SessionManager, hash_log_n: u8) -> Self {
        Self { sm, hash_log_n }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn hash_password(&self, plain: &str) -> anyhow::Result<String> {
        // scrypt blocks; run it on the blocking pool
        let plain = plain.to_owned();
        let log_n = self.hash_log_n;
        tokio::task::spawn_blocking(move || hash_password(&plain, log_n)).await?
    }

    async fn verify_password(&self, hash: &str, plain: &str) -> bool {
        let (hash, plain) = (hash.to_owned(), plain.to_owned());
        tokio::task::spawn_blocking(move || verify_password(&hash, &plain))
            .await
            .unwrap_or(false)
    }

    async fn issue_token(&self, user_id: UserId) -> String {
        self.sm.create_session(user_id).await
    }

    async fn authenticate(&self, token: &str) -> Option<UserId> {
        self.sm.get_session(token).await.map(|session| session.user_id)
    }

    async fn revoke(&self, token: &str) -> bool {
        self.sm.revoke(token).await
    }
}
