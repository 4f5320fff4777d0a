use std::path::PathBuf;

use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://www.gravatar.com";
pub const DEFAULT_SECURE_BASE_URL: &str = "https://secure.gravatar.com";

/// Runtime settings for the avatar client and the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GravatarConfig {
    pub profiles_path: PathBuf,
    pub log_level: String,
    pub probe_timeout_secs: u64,
    pub user_agent: String,
    pub base_url: String,
    pub secure_base_url: String,
}

impl Default for GravatarConfig {
    fn default() -> Self {
        Self {
            profiles_path: PathBuf::from("./config/gravatar.yaml"),
            log_level: "info".to_string(),
            probe_timeout_secs: 10,
            user_agent: "gravatar-rs/0.1".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            secure_base_url: DEFAULT_SECURE_BASE_URL.to_string(),
        }
    }
}

/// Load configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_config() -> Result<GravatarConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_config_from_env()
}

/// Load configuration from environment variables already in the process.
///
/// Unlike [`load_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_config_from_env() -> Result<GravatarConfig, ConfigError> {
    build_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function.
fn build_config<F>(lookup: F) -> Result<GravatarConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = GravatarConfig::default();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let probe_timeout_secs = match lookup("GRAVATAR_PROBE_TIMEOUT_SECS") {
        Ok(raw) => parse_timeout(&raw)?,
        Err(_) => defaults.probe_timeout_secs,
    };

    Ok(GravatarConfig {
        profiles_path: lookup("GRAVATAR_PROFILES_PATH")
            .map_or(defaults.profiles_path, PathBuf::from),
        log_level: or_default("GRAVATAR_LOG_LEVEL", &defaults.log_level),
        probe_timeout_secs,
        user_agent: or_default("GRAVATAR_USER_AGENT", &defaults.user_agent),
        base_url: or_default("GRAVATAR_BASE_URL", &defaults.base_url),
        secure_base_url: or_default("GRAVATAR_SECURE_BASE_URL", &defaults.secure_base_url),
    })
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar {
        var: "GRAVATAR_PROBE_TIMEOUT_SECS".to_string(),
        reason,
    };
    let secs = raw.trim().parse::<u64>().map_err(|e| invalid(e.to_string()))?;
    if secs == 0 {
        return Err(invalid("timeout must be greater than zero".to_string()));
    }
    Ok(secs)
}
