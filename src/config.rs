//! # Console Configuration
//!
//! Broker credentials, the bike's device identifier and the feedback
//! subscriptions are read once at startup and never change afterwards.
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. `~/.config/smartbike-console/config.toml` (or the file named by
//!    `SMARTBIKE_CONFIG`), created with defaults on first start
//! 3. The environment variables `MQTT_HOST`, `MQTT_USER`, `MQTT_PASS` and
//!    `DEVICE_ID`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn, Level};

use crate::console::control_loop::LoopTiming;
use crate::mqtt::config::{MqttConfig, MqttConfigError};
use crate::mqtt::topics::Role;

const CONFIG_DIR: &str = ".config/smartbike-console";
const CONFIG_FILE: &str = "config.toml";
const CONFIG_PATH_VAR: &str = "SMARTBIKE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Mqtt(#[from] MqttConfigError),

    #[error("Unknown log level '{0}'")]
    LogLevel(String),
}

/// Feedback channels subscribed to at startup.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct FeedbackConfig {
    /// Bike channels by role, e.g. `speed` or `button-report`
    pub roles: Vec<Role>,
    /// Literal topic patterns, e.g. `#`
    pub topics: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub prompt_delay_ms: u64,
    pub post_dispatch_delay_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            prompt_delay_ms: 800,
            post_dispatch_delay_ms: 500,
        }
    }
}

impl From<&TimingConfig> for LoopTiming {
    fn from(timing: &TimingConfig) -> Self {
        LoopTiming {
            before_prompt: Duration::from_millis(timing.prompt_delay_ms),
            after_dispatch: Duration::from_millis(timing.post_dispatch_delay_ms),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ConsoleConfig {
    pub device_id: String,
    pub log_level: String,
    pub mqtt: MqttConfig,
    pub feedback: FeedbackConfig,
    pub timing: TimingConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            device_id: "000001".to_string(),
            log_level: "info".to_string(),
            mqtt: MqttConfig::default(),
            feedback: FeedbackConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Config file location, honouring `SMARTBIKE_CONFIG`.
    pub fn default_path() -> PathBuf {
        if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
            return PathBuf::from(path);
        }
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Loads the file at `path`, writing the defaults there first if it does
    /// not exist yet, then applies environment overrides and validates.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |name| std::env::var(name).ok()).await
    }

    async fn load_with(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut config = if exists {
            debug!("Reading configuration from {}", path.display());
            let content =
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| ConfigError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?;
            Self::from_toml_str(&content)?
        } else {
            let config = ConsoleConfig::default();
            config.save(path).await?;
            info!("Created default configuration at {}", path.display());
            config
        };

        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Overrides credentials and device id from variables found by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup("MQTT_HOST") {
            self.mqtt.server.url = host;
        }
        if let Some(user) = lookup("MQTT_USER") {
            self.mqtt.server.user = user;
        }
        if let Some(pw) = lookup("MQTT_PASS") {
            self.mqtt.server.pw = pw;
        }
        if let Some(device_id) = lookup("DEVICE_ID") {
            self.device_id = device_id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.mqtt.validate()?;
        self.log_level()?;
        if self.device_id.is_empty() {
            warn!("Device id is empty; topics will read bike//...");
        }
        Ok(())
    }

    pub fn log_level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::LogLevel(self.log_level.clone()))
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}
