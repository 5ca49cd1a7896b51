// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers, grouped by resource.
use axum::extract::FromRequest;

use crate::error::AppError;

pub mod auth;
pub mod finance;
pub mod matches;
pub mod notifications;
pub mod social;
pub mod stats;
pub mod users;

/// JSON body extractor whose rejections use the API error format
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
