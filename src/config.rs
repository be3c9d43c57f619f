//! Settings read from the environment, with defaults for local use.
//!
//! HOST, PORT, DATA_DIR, SUMMARY_API_URL, SUMMARY_API_KEY, SUMMARY_MODEL, SUMMARY_TIMEOUT_SECS.

use std::env;
use std::path::PathBuf;

/// Connection settings for the round-summary service.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryConfig {
    pub api_url: String,
    /// `None` when unset or blank; calls are refused before sending.
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    /// Directory holding the persisted state files.
    pub data_dir: PathBuf,
    pub summary: SummaryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            summary: SummaryConfig::default(),
        }
    }
}

/// Non-empty, trimmed value of an environment variable.
fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl AppConfig {
    /// Defaults overridden by whatever is set in the environment.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_value("HOST").unwrap_or(defaults.host),
            port: env_value("PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: env_value("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            summary: SummaryConfig {
                api_url: env_value("SUMMARY_API_URL").unwrap_or(defaults.summary.api_url),
                api_key: env_value("SUMMARY_API_KEY"),
                model: env_value("SUMMARY_MODEL").unwrap_or(defaults.summary.model),
                timeout_secs: env_value("SUMMARY_TIMEOUT_SECS")
                    .and_then(|t| t.parse().ok())
                    .unwrap_or(defaults.summary.timeout_secs),
            },
        }
    }
}
