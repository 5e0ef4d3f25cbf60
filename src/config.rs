//! Configuration module for authcore.

use serde::Deserialize;
use std::path::Path;

use crate::{AuthError, Result};

/// Token signing and lifetime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Secret key for signing tokens. Must not be empty; prefer setting
    /// it via the `AUTHCORE_TOKEN_SECRET` environment variable.
    #[serde(default)]
    pub secret: String,
    /// Session token lifetime in days.
    #[serde(default = "default_session_ttl_days")]
    pub session_ttl_days: u64,
    /// Reset token lifetime in minutes.
    #[serde(default = "default_reset_ttl_minutes")]
    pub reset_ttl_minutes: u64,
}

fn default_session_ttl_days() -> u64 {
    7
}

fn default_reset_ttl_minutes() -> u64 {
    30
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            session_ttl_days: default_session_ttl_days(),
            reset_ttl_minutes: default_reset_ttl_minutes(),
        }
    }
}

/// Password hashing cost configuration.
///
/// The defaults are intentionally expensive; lowering them trades
/// security for speed.
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordConfig {
    /// Argon2 memory cost in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Argon2 time cost (iterations).
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Argon2 parallelism (lanes).
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    65536
}

fn default_iterations() -> u32 {
    3
}

fn default_parallelism() -> u32 {
    4
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

/// Credential store call configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Timeout in seconds for a single store call.
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

fn default_store_timeout() -> u64 {
    5
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_store_timeout(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/authcore.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Token configuration.
    #[serde(default)]
    pub token: TokenConfig,
    /// Password hashing configuration.
    #[serde(default)]
    pub password: PasswordConfig,
    /// Credential store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(AuthError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| AuthError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `AUTHCORE_TOKEN_SECRET`: Override the token signing secret
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("AUTHCORE_TOKEN_SECRET") {
            if !secret.is_empty() {
                self.token.secret = secret;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the token secret is not set; every other field
    /// has a usable default.
    pub fn validate(&self) -> Result<()> {
        if self.token.secret.is_empty() {
            return Err(AuthError::Config(
                "token secret is not set. \
                 Set it in the config file or via AUTHCORE_TOKEN_SECRET."
                    .to_string(),
            ));
        }
        Ok(())
    }
}
