/// Runtime configuration
///
/// Values come from, highest precedence first:
/// - process environment
/// - `.env` in the working directory
/// - `config.env` in the per-user config directory
///   (e.g. ~/.config/oledvec-review/config.env on Linux)
/// - built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use crate::state::history::DEFAULT_CAPACITY;

pub const API_URL_VAR: &str = "OLEDVEC_API_URL";
pub const MAX_DISPLAY_WIDTH_VAR: &str = "OLEDVEC_MAX_DISPLAY_WIDTH";
pub const HISTORY_CAPACITY_VAR: &str = "OLEDVEC_HISTORY_CAPACITY";
pub const REQUEST_TIMEOUT_VAR: &str = "OLEDVEC_REQUEST_TIMEOUT_SECS";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the review server, without trailing slash
    pub api_url: String,
    /// Widest the source photo is drawn, in logical pixels
    pub max_display_width: f32,
    /// Undo snapshots kept per item
    pub history_capacity: usize,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            max_display_width: 640.0,
            history_capacity: DEFAULT_CAPACITY,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Load `.env` files, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        if let Some(path) = Self::user_config_path().filter(|path| path.exists()) {
            if let Err(error) = dotenvy::from_path(&path) {
                tracing::warn!(path = %path.display(), %error, "ignoring unreadable config file");
            }
        }

        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn user_config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("oledvec-review");
        path.push("config.env");
        Some(path)
    }

    /// Build a config from an arbitrary variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(API_URL_VAR) {
            let trimmed = url.trim().trim_end_matches('/');
            if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
                return Err(invalid(API_URL_VAR, &url, "expected an http(s) URL"));
            }
            config.api_url = trimmed.to_string();
        }

        if let Some(raw) = lookup(MAX_DISPLAY_WIDTH_VAR) {
            let width: f32 = raw
                .trim()
                .parse()
                .map_err(|e: std::num::ParseFloatError| invalid(MAX_DISPLAY_WIDTH_VAR, &raw, &e.to_string()))?;
            if !width.is_finite() || width <= 0.0 {
                return Err(invalid(MAX_DISPLAY_WIDTH_VAR, &raw, "must be positive"));
            }
            config.max_display_width = width;
        }

        if let Some(raw) = lookup(HISTORY_CAPACITY_VAR) {
            let capacity = parse_positive(HISTORY_CAPACITY_VAR, &raw)?;
            config.history_capacity = capacity as usize;
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_VAR) {
            let secs = parse_positive(REQUEST_TIMEOUT_VAR, &raw)?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    let value: u64 = raw
        .trim()
        .parse()
        .map_err(|e: std::num::ParseIntError| invalid(var, raw, &e.to_string()))?;
    if value == 0 {
        return Err(invalid(var, raw, "must be at least 1"));
    }
    Ok(value)
}

fn invalid(var: &'static str, value: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.history_capacity, 50);
    }

    #[test]
    fn test_overrides_from_environment() {
        let config = Config::from_lookup(lookup(&[
            (API_URL_VAR, "http://review.local:9000/"),
            (MAX_DISPLAY_WIDTH_VAR, "800"),
            (HISTORY_CAPACITY_VAR, "20"),
            (REQUEST_TIMEOUT_VAR, "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "http://review.local:9000");
        assert_eq!(config.max_display_width, 800.0);
        assert_eq!(config.history_capacity, 20);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert_matches!(
            Config::from_lookup(lookup(&[(HISTORY_CAPACITY_VAR, "0")])),
            Err(ConfigError::Invalid { var: HISTORY_CAPACITY_VAR, .. })
        );
        assert_matches!(
            Config::from_lookup(lookup(&[(MAX_DISPLAY_WIDTH_VAR, "-3")])),
            Err(ConfigError::Invalid { var: MAX_DISPLAY_WIDTH_VAR, .. })
        );
        assert_matches!(
            Config::from_lookup(lookup(&[(API_URL_VAR, "review.local")])),
            Err(ConfigError::Invalid { var: API_URL_VAR, .. })
        );
        assert_matches!(
            Config::from_lookup(lookup(&[(REQUEST_TIMEOUT_VAR, "soon")])),
            Err(ConfigError::Invalid { var: REQUEST_TIMEOUT_VAR, .. })
        );
    }
}
