// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request field validation.

use crate::config::PasswordRequirements;
use matchday_common::requests::CreateMatchRequest;
use matchday_common::MatchPatch;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

// Common validation constants
pub const MIN_MAX_PLAYERS: u32 = 4;
pub const MAX_MAX_PLAYERS: u32 = 50;
const MAX_NAME_LENGTH: usize = 80;
const MAX_TITLE_LENGTH: usize = 120;
const MAX_LOCATION_LENGTH: usize = 200;
const MAX_DESCRIPTION_LENGTH: usize = 2000;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
pub const MAX_POST_LENGTH: usize = 2000;
pub const MAX_COMMENT_LENGTH: usize = 1000;
const MAX_CATEGORY_LENGTH: usize = 60;
/// Upper bound for a single ledger amount, in minor units.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());
static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^<>/\\{}\[\];]*$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid match: {0}")]
    InvalidMatch(String),

    #[error("Invalid content: {0}")]
    InvalidContent(String),

    #[error("Invalid rating: {0}")]
    InvalidRating(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a display name
pub fn validate_name(name: &str) -> ValidationResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidName("Name must not be empty".to_string()));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }

    if !NAME_REGEX.is_match(name) {
        return Err(ValidationError::InvalidName(
            "Name contains invalid characters".to_string(),
        ));
    }

    Ok(name)
}

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Emails are compared case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Check a password against the configured complexity requirements
pub fn validate_password<'a>(
    password: &'a str,
    requirements: &PasswordRequirements,
) -> ValidationResult<&'a str> {
    if password.len() < requirements.min_length {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {} characters",
            requirements.min_length
        )));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    if requirements.require_uppercase && !password.chars().any(char::is_uppercase) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain an uppercase letter".to_string(),
        ));
    }

    if requirements.require_lowercase && !password.chars().any(char::is_lowercase) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain a lowercase letter".to_string(),
        ));
    }

    if requirements.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain a digit".to_string(),
        ));
    }

    if requirements.require_special && !password.chars().any(|c| !c.is_alphanumeric()) {
        return Err(ValidationError::InvalidPassword(
            "Password must contain a special character".to_string(),
        ));
    }

    Ok(password)
}

pub fn validate_max_players(max_players: u32) -> ValidationResult<u32> {
    if !(MIN_MAX_PLAYERS..=MAX_MAX_PLAYERS).contains(&max_players) {
        return Err(ValidationError::InvalidMatch(format!(
            "maxPlayers must be between {MIN_MAX_PLAYERS} and {MAX_MAX_PLAYERS}"
        )));
    }
    Ok(max_players)
}

fn validate_required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::InvalidMatch(format!("{field} is required")));
    }
    if value.chars().count() > max {
        return Err(ValidationError::InvalidMatch(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(())
}

/// Validate the fields of a new match
pub fn validate_new_match(request: &CreateMatchRequest) -> ValidationResult<()> {
    validate_required("title", &request.title, MAX_TITLE_LENGTH)?;
    validate_required("location", &request.location, MAX_LOCATION_LENGTH)?;
    if let Some(description) = &request.description {
        validate_text("description", description, MAX_DESCRIPTION_LENGTH, true)?;
    }
    validate_max_players(request.max_players)?;
    Ok(())
}

/// Validate the fields present in a match patch
pub fn validate_match_patch(patch: &MatchPatch) -> ValidationResult<()> {
    if let Some(title) = &patch.title {
        validate_required("title", title, MAX_TITLE_LENGTH)?;
    }
    if let Some(location) = &patch.location {
        validate_required("location", location, MAX_LOCATION_LENGTH)?;
    }
    if let Some(description) = &patch.description {
        validate_text("description", description, MAX_DESCRIPTION_LENGTH, true)?;
    }
    if let Some(max_players) = patch.max_players {
        validate_max_players(max_players)?;
    }
    Ok(())
}

/// Validate free text such as post or comment content
pub fn validate_text<'a>(
    field: &str,
    value: &'a str,
    max: usize,
    allow_empty: bool,
) -> ValidationResult<&'a str> {
    if !allow_empty && value.trim().is_empty() {
        return Err(ValidationError::InvalidContent(format!("{field} must not be empty")));
    }
    if value.chars().count() > max {
        return Err(ValidationError::InvalidContent(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(value)
}

pub fn validate_rating(rating: u8) -> ValidationResult<u8> {
    if !(1..=10).contains(&rating) {
        return Err(ValidationError::InvalidRating(
            "Rating must be between 1 and 10".to_string(),
        ));
    }
    Ok(rating)
}

/// Validate a monetary amount in minor units
pub fn validate_amount(amount: i64) -> ValidationResult<i64> {
    if amount <= 0 {
        return Err(ValidationError::InvalidAmount(
            "Amount must be a positive number of minor units".to_string(),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::InvalidAmount(format!(
            "Amount cannot exceed {MAX_AMOUNT}"
        )));
    }
    Ok(amount)
}

pub fn validate_category(category: &str) -> ValidationResult<&str> {
    let category = category.trim();
    if category.is_empty() || category.chars().count() > MAX_CATEGORY_LENGTH {
        return Err(ValidationError::InvalidAmount(format!(
            "Category must be between 1 and {MAX_CATEGORY_LENGTH} characters"
        )));
    }
    Ok(category)
}

/// Invite codes are matched case-insensitively and without surrounding space.
pub fn normalize_invite_code(code: &str) -> String {
    code.trim().to_uppercase()
}
