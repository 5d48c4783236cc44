//! Application configuration.
//!
//! Loaded from an optional TOML file with `NETPATH__SECTION__KEY` environment overrides.

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;

use crate::gui::edge_sampler::DEFAULT_EDGE_CAP;
use crate::gui::render::{DEFAULT_FOCUS_ALTITUDE, FocusSettings};
use crate::orchestrator::OrchestratorSettings;
use crate::orchestrator::preconditions::MAX_TESTS;

pub const DEFAULT_CONFIG_FILE: &str = "netpath.toml";
pub const ENV_PREFIX: &str = "NETPATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid backend.request_timeout {value:?}: {source}")]
    Timeout {
        value: String,
        source: humantime::DurationError,
    },
    #[error("invalid limits.max_tests {0}: must be between 1 and {max}", max = MAX_TESTS)]
    MaxTests(u32),
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default)]
    pub limits: LimitsConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Humantime duration, e.g. `60s` or `2m`.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> String {
    "60s".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_edge_cap")]
    pub edge_cap: usize,

    /// Fixes the background edge sample between runs.
    #[serde(default)]
    pub sampler_seed: Option<u64>,

    #[serde(default = "default_focus_altitude")]
    pub focus_altitude: f64,

    #[serde(default = "default_focus_transition_ms")]
    pub focus_transition_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            edge_cap: default_edge_cap(),
            sampler_seed: None,
            focus_altitude: default_focus_altitude(),
            focus_transition_ms: default_focus_transition_ms(),
        }
    }
}

fn default_edge_cap() -> usize {
    DEFAULT_EDGE_CAP
}

fn default_focus_altitude() -> f64 {
    DEFAULT_FOCUS_ALTITUDE
}

fn default_focus_transition_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_tests")]
    pub max_tests: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_tests: default_max_tests(),
        }
    }
}

fn default_max_tests() -> u32 {
    MAX_TESTS
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let app_config: AppConfig = config.try_deserialize()?;
        app_config.orchestrator_settings()?;
        Ok(app_config)
    }

    pub fn request_timeout(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.backend.request_timeout).map_err(|source| {
            ConfigError::Timeout {
                value: self.backend.request_timeout.clone(),
                source,
            }
        })
    }

    pub fn max_tests(&self) -> Result<u32, ConfigError> {
        match self.limits.max_tests {
            n @ 1..=MAX_TESTS => Ok(n),
            n => Err(ConfigError::MaxTests(n)),
        }
    }

    pub fn orchestrator_settings(&self) -> Result<OrchestratorSettings, ConfigError> {
        Ok(OrchestratorSettings {
            request_timeout: self.request_timeout()?,
            max_tests: self.max_tests()?,
        })
    }

    pub fn focus_settings(&self) -> FocusSettings {
        FocusSettings {
            altitude: self.render.focus_altitude,
            transition: Duration::from_millis(self.render.focus_transition_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("");
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(60));
        assert_eq!(config.render.edge_cap, 300);
        assert_eq!(config.render.sampler_seed, None);
        assert_eq!(config.limits.max_tests, 20);
        assert_eq!(config.log.filter, "info");
        let focus = config.focus_settings();
        assert_eq!(focus.altitude, 1.5);
        assert_eq!(focus.transition, Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_file_overrides() {
        let config = from_toml(
            r#"
            [backend]
            request_timeout = "2m 30s"

            [render]
            edge_cap = 50
            sampler_seed = 7
            "#,
        );
        assert_eq!(config.backend.base_url, "http://127.0.0.1:5000");
        assert_eq!(config.request_timeout().unwrap(), Duration::from_secs(150));
        assert_eq!(config.render.edge_cap, 50);
        assert_eq!(config.render.sampler_seed, Some(7));
        assert_eq!(config.orchestrator_settings().unwrap().max_tests, 20);
    }

    #[test]
    fn test_invalid_timeout() {
        let config = from_toml("[backend]\nrequest_timeout = \"soon\"");
        assert!(matches!(config.request_timeout(), Err(ConfigError::Timeout { .. })));
    }

    #[test]
    fn test_max_tests_out_of_range() {
        let config = from_toml("[limits]\nmax_tests = 50");
        let err = config.orchestrator_settings().unwrap_err();
        assert!(matches!(err, ConfigError::MaxTests(50)));
        assert_eq!(
            err.to_string(),
            "invalid limits.max_tests 50: must be between 1 and 20"
        );
        let config = from_toml("[limits]\nmax_tests = 0");
        assert!(matches!(config.max_tests(), Err(ConfigError::MaxTests(0))));
        let config = from_toml("[limits]\nmax_tests = 5");
        assert_eq!(config.orchestrator_settings().unwrap().max_tests, 5);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = AppConfig::load(Path::new("does-not-exist.toml")).unwrap();
        assert_eq!(config.render.focus_transition_ms, 1000);
    }
}
