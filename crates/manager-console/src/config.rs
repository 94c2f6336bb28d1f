use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use reputation::AdvisoryThresholds;
use serde::Deserialize;

/// Backend base URL used by the web client.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
/// Generous because the same backend also serves slow chat completions.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SESSION_FILE: &str = ".manager-session.json";

/// Top-level console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Backend base URL, without a trailing slash.
    pub api_url: String,
    /// Per-request transport timeout.
    pub request_timeout: Duration,
    /// Where the externally issued session is persisted.
    pub session_path: PathBuf,
    /// Warning counts at which demotion / deregistration are suggested.
    pub thresholds: AdvisoryThresholds,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        let defaults = AdvisoryThresholds::default();
        Self {
            api_url: normalize_url(
                &std::env::var("MANAGER_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            ),
            request_timeout: Duration::from_secs(env_number(
                "MANAGER_API_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )),
            session_path: std::env::var("MANAGER_SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_SESSION_FILE)),
            thresholds: AdvisoryThresholds {
                demote_vip: env_number("MANAGER_DEMOTE_THRESHOLD", defaults.demote_vip),
                deregister: env_number("MANAGER_DEREGISTER_THRESHOLD", defaults.deregister),
            },
        }
    }
}

/// On-disk TOML shape. Every key is optional and overlays the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_url: Option<String>,
    request_timeout_secs: Option<u64>,
    session_path: Option<PathBuf>,
    demote_threshold: Option<u32>,
    deregister_threshold: Option<u32>,
}

impl ConsoleConfig {
    /// Load a TOML config file on top of the environment defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
            .context(format!("Failed to parse config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content).context("Invalid console config TOML")?;
        Ok(Self::default().overlay(file))
    }

    fn overlay(mut self, file: ConfigFile) -> Self {
        if let Some(url) = file.api_url {
            self.api_url = normalize_url(&url);
        }
        if let Some(secs) = file.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = file.session_path {
            self.session_path = path;
        }
        if let Some(n) = file.demote_threshold {
            self.thresholds.demote_vip = n;
        }
        if let Some(n) = file.deregister_threshold {
            self.thresholds.deregister = n;
        }
        self
    }

    /// Override the API URL (CLI flag).
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = normalize_url(url);
        self
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn env_number<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_overlay_defaults() {
        let config = ConsoleConfig::from_toml_str(
            r#"
            api_url = "https://food.example.com/api/"
            request_timeout_secs = 15
            demote_threshold = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.api_url, "https://food.example.com/api");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.thresholds.demote_vip, 4);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ConsoleConfig::from_toml_str("api_ulr = \"typo\"").unwrap_err();
        assert!(format!("{err:#}").contains("Invalid console config TOML"));
    }

    #[test]
    fn cli_override_strips_trailing_slash() {
        let config = ConsoleConfig::from_toml_str("").unwrap().with_api_url("http://h:1/api//");
        assert_eq!(config.api_url, "http://h:1/api");
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = ConsoleConfig::from_file(Path::new("/nonexistent/manager.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
