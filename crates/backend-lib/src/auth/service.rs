use async_trait::async_trait;
use matchday_common::UserId;

/// Credential and token handling behind the HTTP layer
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn hash_password(&self, plain: &str) -> anyhow::Result<String>;
    async fn verify_password(&self, hash: &str, plain: &str) -> bool;
    async fn issue_token(&self, user_id: UserId) -> String;
    /// Resolve a token to the user it was issued for
    async fn authenticate(&self, token: &str) -> Option<UserId>;
    async fn revoke(&self, token: &str) -> bool;
}
