// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: compiled defaults, then a TOML file,
//! then `MATCHDAY_`-prefixed environment variables. Nested keys use a
//! double underscore, e.g. `MATCHDAY_STORAGE__BACKEND=memory`.
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
const ENV_PREFIX: &str = "MATCHDAY_";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level, overridden by `RUST_LOG` when set
    pub log_level: String,
    pub log_format: LogFormat,
    pub storage: StorageSettings,
    /// Session TTL in seconds
    pub session_ttl_secs: u64,
    pub password_requirements: PasswordRequirements,
    /// scrypt cost parameter (log2 of N)
    pub password_hash_log_n: u8,
    pub rate_limit: RateLimitSettings,
    pub matches: MatchSettings,
    pub realtime: RealtimeSettings,
    /// Accounts registered with this email become admins
    pub bootstrap_admin_email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// JSON collections on disk, falling back to memory when unusable
    FlatFile,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Data directory path
    pub path: PathBuf,
}

/// Password complexity requirements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordRequirements {
    /// Minimum password length
    pub min_length: usize,
    /// Require uppercase letters
    pub require_uppercase: bool,
    /// Require lowercase letters
    pub require_lowercase: bool,
    /// Require digits
    pub require_digit: bool,
    /// Require special characters
    pub require_special: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per client and window
    pub max_requests: u32,
    pub window_secs: u64,
}

/// Whether `max_players` rejects participants or only informs clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    Advisory,
    Strict,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchSettings {
    /// Prefix of generated invite links
    pub public_base_url: String,
    pub invite_code_length: usize,
    pub capacity_policy: CapacityPolicy,
    /// Distinct approvers needed before statistics are authoritative
    pub statistics_quorum: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeSettings {
    /// Buffered frames per connection before events are dropped
    pub channel_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            storage: StorageSettings::default(),
            session_ttl_secs: 60 * 60 * 24 * 7, // 7 days
            password_requirements: PasswordRequirements::default(),
            password_hash_log_n: 15,
            rate_limit: RateLimitSettings::default(),
            matches: MatchSettings::default(),
            realtime: RealtimeSettings::default(),
            bootstrap_admin_email: None,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::FlatFile,
            path: PathBuf::from("data"),
        }
    }
}

impl Default for PasswordRequirements {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: false,
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 60,
        }
    }
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:3000".to_string(),
            invite_code_length: 8,
            capacity_policy: CapacityPolicy::Advisory,
            statistics_quorum: 2,
        }
    }
}

impl Default for RealtimeSettings {
    fn default() -> Self {
        Self { channel_capacity: 64 }
    }
}

impl Settings {
    /// Load settings from the default file location and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load settings from an explicit TOML file and the environment.
    /// A missing file is not an error; defaults apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    /// Extract and validate settings from an assembled figment
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("invalid log level: {}", self.log_level);
        }
        if self.session_ttl_secs == 0 {
            bail!("session_ttl_secs must be positive");
        }
        if self.password_requirements.min_length < 8 {
            bail!("password_requirements.min_length must be at least 8");
        }
        if !(1..=20).contains(&self.password_hash_log_n) {
            bail!("password_hash_log_n must be between 1 and 20");
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0 {
            bail!("rate_limit values must be positive");
        }
        if !(6..=16).contains(&self.matches.invite_code_length) {
            bail!("matches.invite_code_length must be between 6 and 16");
        }
        if self.matches.statistics_quorum == 0 {
            bail!("matches.statistics_quorum must be positive");
        }
        if self.realtime.channel_capacity == 0 {
            bail!("realtime.channel_capacity must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod config_tests;
