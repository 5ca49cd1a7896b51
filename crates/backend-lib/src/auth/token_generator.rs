// ============================
// crates/backend-lib/src/auth/token_generator.rs
// ============================
//! Opaque bearer tokens for sessions and the realtime channel.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

/// 256 bits of entropy
pub const SESSION_TOKEN_BYTES: usize = 32;

/// A fresh session token: random bytes, URL-safe base64 without padding,
/// so it can travel in a query string unescaped
pub fn session_token() -> String {
    let mut raw = [0u8; SESSION_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut raw);
    URL_SAFE_NO_PAD.encode(raw)
}
