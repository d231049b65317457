//! Configuration management for gantt-sync.
//!
//! Configuration can be set via environment variables:
//! - `GANTT_HOST_PAGE` - Optional. Path to an HTML snapshot of the embedding page.
//! - `GANTT_HOST_BASE_URL` - Optional. Base URL for resolving relative links on that page.
//! - `GANTT_API_URL` - Optional. Explicit endpoint; overrides the one found on the page.
//! - `GANTT_MESSAGES_PATH` - Optional. JSON message dictionary (`{locale: {key: message}}`).
//! - `GANTT_LICENSE_KEY` - Optional. License key used when the page carries none.
//! - `GANTT_STRICT_LOAD` - Optional. Abort a reload on the first malformed record. Defaults to `false`.

use std::path::PathBuf;
use thiserror::Error;
use url::Url;

use crate::session::LoadPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to read host page {path}: {source}")]
    HostPage {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Snapshot of the embedding page
    pub host_page_path: Option<PathBuf>,

    /// Base URL of the embedding page
    pub host_base_url: Option<Url>,

    /// Endpoint override
    pub api_url: Option<String>,

    /// Message dictionary file
    pub messages_path: Option<PathBuf>,

    /// License key fallback
    pub license_key: Option<String>,

    /// Abort reloads on malformed records
    pub strict_load: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `GANTT_HOST_BASE_URL` is not a URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let host_base_url = match non_empty_var("GANTT_HOST_BASE_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidValue("GANTT_HOST_BASE_URL".to_string(), format!("{}", e))
            })?),
            None => None,
        };

        Ok(Self {
            host_page_path: non_empty_var("GANTT_HOST_PAGE").map(PathBuf::from),
            host_base_url,
            api_url: non_empty_var("GANTT_API_URL"),
            messages_path: non_empty_var("GANTT_MESSAGES_PATH").map(PathBuf::from),
            license_key: non_empty_var("GANTT_LICENSE_KEY"),
            strict_load: env_var_bool("GANTT_STRICT_LOAD", false),
        })
    }

    /// Read the host page snapshot, or an empty document when none is configured.
    pub fn read_host_page(&self) -> Result<String, ConfigError> {
        match &self.host_page_path {
            Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::HostPage {
                path: path.display().to_string(),
                source,
            }),
            None => Ok(String::new()),
        }
    }

    pub fn load_policy(&self) -> LoadPolicy {
        if self.strict_load {
            LoadPolicy::Strict
        } else {
            LoadPolicy::Lenient
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Recognises `1`, `true`, `yes`, `y`, `on` (case-insensitive) as `true`.
fn env_var_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => parse_bool(&value),
        Err(_) => default,
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}
