// ==============
// crates/backend-lib/src/metrics.rs

//! Metric keys recorded through the `metrics` facade
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_REJECTED: &str = "ws.rejected";
pub const WS_ACTIVE: &str = "ws.active";
pub const FANOUT_DELIVERED: &str = "fanout.delivered";
pub const FANOUT_DROPPED: &str = "fanout.dropped";
pub const MATCH_CREATED: &str = "match.created";
pub const MATCH_JOINED: &str = "match.joined";
pub const QUOTA_REJECTED: &str = "quota.rejected";
pub const STORAGE_FALLBACK: &str = "storage.fallback";
pub const SESSION_CREATED: &str = "session.created";
pub const SESSION_EXPIRED: &str = "session.expired";
pub const SESSION_ACTIVE: &str = "session.active";
pub const AUTH_LOCKOUT: &str = "auth.lockout";
pub const RATE_LIMITED: &str = "http.rate_limited";
