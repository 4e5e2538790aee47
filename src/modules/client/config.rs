//! Build-time configuration for the API endpoint with runtime overrides.
//! `COLOMBO_API_URL` baked in at build time is the default; the same variable
//! in the process environment (or a CLI flag) replaces it at runtime.
//! Configuration values are public; do not store secrets here.

use std::time::Duration;

use crate::{DEFAULT_LANDING_PATH, DEFAULT_LOGIN_PATH, REQUEST_TIMEOUT_SECS, TOKEN_SLOT};

pub const API_URL_ENV: &str = "COLOMBO_API_URL";
pub const TOKEN_SLOT_ENV: &str = "COLOMBO_TOKEN_SLOT";

/// Client configuration
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_base_url: String,
    pub token_slot: String,
    pub request_timeout: Duration,
    pub login_path: String,
    pub landing_path: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: option_env!("COLOMBO_API_URL").unwrap_or("").to_string(),
            token_slot: TOKEN_SLOT.to_string(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            landing_path: DEFAULT_LANDING_PATH.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads build-time defaults and applies process environment overrides
    pub fn load() -> Self {
        let mut config = Self::default();
        apply_runtime_overrides(&mut config, RuntimeConfig::from_env());
        config
    }

    /// Replaces the base URL when `value` is non-empty
    pub fn with_api_base_url(mut self, value: Option<&str>) -> Self {
        apply_runtime_overrides(
            &mut self,
            RuntimeConfig {
                api_base_url: value.and_then(normalize_runtime_value),
                ..RuntimeConfig::default()
            },
        );
        self
    }

    /// Joins the configured base URL and an endpoint path
    pub fn endpoint(&self, path: &str) -> String {
        build_url_with_base(&self.api_base_url, path)
    }
}

#[derive(Default)]
struct RuntimeConfig {
    api_base_url: Option<String>,
    token_slot: Option<String>,
}

impl RuntimeConfig {
    fn from_env() -> Self {
        Self {
            api_base_url: read_env(API_URL_ENV),
            token_slot: read_env(TOKEN_SLOT_ENV),
        }
    }
}

fn read_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .and_then(|value| normalize_runtime_value(&value))
}

fn apply_runtime_overrides(config: &mut AppConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = runtime.token_slot {
        config.token_slot = value;
    }
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Builds a URL from an explicit base URL and the provided path
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}
