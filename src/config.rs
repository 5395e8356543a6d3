use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::safety::openfda::OPENFDA_BASE_URL;
use crate::safety::refills::DEFAULT_REFILL_WINDOW_DAYS;
use crate::safety::SafetyError;

/// Application-level constants
pub const APP_NAME: &str = "MedGuardian";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "medguardian_lib=info,warn"
}

const ENV_OPENFDA_URL: &str = "MEDGUARDIAN_OPENFDA_URL";
const ENV_TIMEOUT_SECS: &str = "MEDGUARDIAN_TIMEOUT_SECS";
const ENV_CACHE_CAPACITY: &str = "MEDGUARDIAN_CACHE_CAPACITY";
const ENV_CACHE_TTL_SECS: &str = "MEDGUARDIAN_CACHE_TTL_SECS";
const ENV_REFILL_WINDOW_DAYS: &str = "MEDGUARDIAN_REFILL_WINDOW_DAYS";

/// Runtime settings for [`crate::safety::SafetyEngine`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub openfda_base_url: String,
    pub request_timeout_secs: u64,
    /// Maximum cached label lookups.
    pub cache_capacity: u64,
    /// `None` keeps entries until evicted by capacity.
    pub cache_ttl_secs: Option<u64>,
    pub refill_window_days: i64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            openfda_base_url: OPENFDA_BASE_URL.to_string(),
            request_timeout_secs: 10,
            cache_capacity: 512,
            cache_ttl_secs: Some(24 * 60 * 60),
            refill_window_days: DEFAULT_REFILL_WINDOW_DAYS,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `MEDGUARDIAN_*` environment variables.
    pub fn from_env() -> Result<Self, SafetyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SafetyError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_OPENFDA_URL) {
            let url = url.trim();
            if url.is_empty() {
                return Err(config_error(ENV_OPENFDA_URL, url));
            }
            config.openfda_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            config.request_timeout_secs = parse_var(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_CAPACITY) {
            config.cache_capacity = parse_var(ENV_CACHE_CAPACITY, &raw)?;
        }
        if let Some(raw) = lookup(ENV_CACHE_TTL_SECS) {
            let secs: u64 = parse_var(ENV_CACHE_TTL_SECS, &raw)?;
            config.cache_ttl_secs = (secs > 0).then_some(secs);
        }
        if let Some(raw) = lookup(ENV_REFILL_WINDOW_DAYS) {
            let days: i64 = parse_var(ENV_REFILL_WINDOW_DAYS, &raw)?;
            if days < 0 {
                return Err(config_error(ENV_REFILL_WINDOW_DAYS, &raw));
            }
            config.refill_window_days = days;
        }

        Ok(config)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, SafetyError> {
    raw.trim().parse().map_err(|_| config_error(key, raw))
}

fn config_error(key: &str, value: &str) -> SafetyError {
    SafetyError::Config {
        key: key.to_string(),
        value: value.to_string(),
    }
}
