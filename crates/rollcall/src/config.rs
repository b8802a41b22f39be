//! Configuration management for rollcall.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::remote::schema::SchemaVersion;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "rollcall";

/// How a toggle moves a cell between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TogglePolicy {
    /// The new status is the logical negation of the current one.
    #[default]
    Bidirectional,
    /// A cell may only be moved from present to absent; absent cells are
    /// left alone and the remote write forces `absent`.
    LockAbsent,
}

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `ROLLCALL_`, sections separated
///    by double underscores, e.g. `ROLLCALL_BACKEND__BASE_URL`)
/// 2. TOML config file at `~/.config/rollcall/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Remote backend configuration.
    pub backend: BackendConfig,
    /// Roster configuration.
    pub roster: RosterConfig,
    /// Refresh loop configuration.
    pub refresh: RefreshConfig,
}

/// Remote backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the hosted backend.
    pub base_url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// Bearer token of the authenticated session, if any.
    pub access_token: Option<String>,
    /// Which table shape the backend carries.
    pub schema: SchemaVersion,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

/// Roster configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Section label shown in headers.
    pub section: String,
    /// The fixed subject list attendance is tracked per day.
    pub subjects: Vec<String>,
}

/// Refresh loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    /// Interval between background re-fetches in milliseconds.
    pub poll_interval_ms: u64,
    /// Toggle semantics for attendance edits.
    pub toggle_policy: TogglePolicy,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:54321".to_string(),
            api_key: String::new(),
            access_token: None,
            schema: SchemaVersion::default(),
            timeout_secs: 30,
        }
    }
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            section: "ICT 12".to_string(),
            subjects: default_subjects(),
        }
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            toggle_policy: TogglePolicy::default(),
        }
    }
}

/// The default fixed subject list.
fn default_subjects() -> Vec<String> {
    ["PE", "MATH", "ENGLISH", "SCIENCE", "ICT"]
        .into_iter()
        .map(ToString::to_string)
        .collect()
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. TOML config file (if exists)
    /// 3. Environment variables (prefixed with `ROLLCALL_`; section and key
    ///    are separated by a double underscore so underscore-bearing keys
    ///    like `base_url` stay addressable)
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("ROLLCALL_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.is_empty() {
            return Err(Error::ConfigValidation {
                message: "backend.base_url must not be empty".to_string(),
            });
        }

        if self.backend.timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "backend.timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.refresh.poll_interval_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "refresh.poll_interval_ms must be greater than 0".to_string(),
            });
        }

        if self.roster.subjects.is_empty() {
            return Err(Error::ConfigValidation {
                message: "roster.subjects must not be empty".to_string(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for subject in &self.roster.subjects {
            if !seen.insert(subject.as_str()) {
                return Err(Error::ConfigValidation {
                    message: format!("duplicate subject: {subject}"),
                });
            }
        }

        Ok(())
    }

    /// Get the poll interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.refresh.poll_interval_ms)
    }

    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}
