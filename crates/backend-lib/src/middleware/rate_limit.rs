use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;

use crate::{error::AppError, metrics, AppState};

/// Fixed-window request budget per client key
#[derive(Debug)]
pub struct RateLimiter {
    pub(crate) entries: DashMap<String, RateLimitEntry>,
    max_requests: u32,
    window: Duration,
}

/// Rate limit entry for a client
#[derive(Debug)]
pub(crate) struct RateLimitEntry {
    requests: u32,
    window_start: Instant,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Count one request for `client`; false once its budget is spent
    pub fn check(&self, client: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(client.to_string())
            .or_insert_with(|| RateLimitEntry {
                requests: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) > self.window {
            entry.requests = 0;
            entry.window_start = now;
        }

        if entry.requests >= self.max_requests {
            return false;
        }
        entry.requests += 1;
        true
    }

    /// Forget clients whose window has passed
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) <= self.window);
    }
}

/// Rate limiter middleware, keyed by the `x-real-ip` header set by the proxy
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let client_ip = request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("unknown");

    if !state.rate_limiter.check(client_ip) {
        ::metrics::counter!(metrics::RATE_LIMITED).increment(1);
        tracing::debug!(client = client_ip, "request rate limited");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
