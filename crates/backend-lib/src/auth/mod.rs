// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.
pub mod extractor;
pub mod password;
pub mod rate_limit;
mod service;
mod service_impl;
pub mod session;
pub mod token_generator;

pub use extractor::{bearer_token, CurrentUser};
pub use password::{hash_password, verify_password};
pub use rate_limit::AuthRateLimiter;
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use session::{Session, SessionManager};
