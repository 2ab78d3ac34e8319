//! Run configuration read from TOML, plus API secrets from the environment.

use crate::notify::{LogNotifier, OutboxNotifier, ResultNotifier};
use crate::observations::error::ObservationError;
use crate::observations::source::{
    ArduinoCloudSource, DEFAULT_API_BASE, DEFAULT_AUDIENCE, DEFAULT_TOKEN_URL,
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const CLIENT_ID_VAR: &str = "ARDUINO_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "ARDUINO_CLIENT_SECRET";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file '{0}'")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Environment variable {0} is not set")]
    MissingSecret(&'static str),

    #[error("Failed to set up the observation source")]
    Source(#[from] ObservationError),

    #[error("Notification outbox is configured without {0}")]
    IncompleteNotification(&'static str),

    #[error("Failed to determine the user config directory")]
    ConfigDirResolution,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    pub station: StationConfig,
    pub observations: ObservationsConfig,
    pub models: ModelsConfig,
    pub arduino: ArduinoConfig,
    #[serde(default)]
    pub notification: NotificationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationConfig {
    /// Place name used in forecast messages.
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservationsConfig {
    /// CSV history the daily readings are appended to.
    pub history: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelsConfig {
    /// Directory holding `temp_max.json`, `temp_min.json` and `rain.json`.
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArduinoConfig {
    pub thing_id: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_audience")]
    pub audience: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_token_url() -> String {
    DEFAULT_TOKEN_URL.to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_audience() -> String {
    DEFAULT_AUDIENCE.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Without an `outbox`, forecasts only go to the log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationConfig {
    pub outbox: Option<PathBuf>,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub recipients: Vec<String>,
}

/// Credentials that never live in the config file.
#[derive(Clone, Default)]
pub struct Secrets {
    pub arduino_client_id: Option<String>,
    pub arduino_client_secret: Option<String>,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("arduino_client_id", &self.arduino_client_id.as_ref().map(|_| "***"))
            .field("arduino_client_secret", &self.arduino_client_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

impl Secrets {
    /// Reads the secrets from the process environment, after loading a `.env` file if one
    /// exists.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self {
            arduino_client_id: std::env::var(CLIENT_ID_VAR).ok(),
            arduino_client_secret: std::env::var(CLIENT_SECRET_VAR).ok(),
        }
    }

    pub fn arduino_credentials(&self) -> Result<(&str, &str), ConfigError> {
        let id = self
            .arduino_client_id
            .as_deref()
            .ok_or(ConfigError::MissingSecret(CLIENT_ID_VAR))?;
        let secret = self
            .arduino_client_secret
            .as_deref()
            .ok_or(ConfigError::MissingSecret(CLIENT_SECRET_VAR))?;
        Ok((id, secret))
    }
}

impl ForecastConfig {
    /// `$XDG_CONFIG_HOME/station-forecast/config.toml` or the platform equivalent.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("station-forecast").join("config.toml"))
            .ok_or(ConfigError::ConfigDirResolution)
    }

    pub fn from_toml(path: &Path, contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        Self::from_toml(path, &contents)
    }

    pub fn arduino_source(&self, secrets: &Secrets) -> Result<ArduinoCloudSource, ConfigError> {
        let (client_id, client_secret) = secrets.arduino_credentials()?;
        Ok(self.arduino.source(client_id, client_secret)?)
    }

    /// The outbox notifier when an outbox is configured, otherwise the log notifier.
    ///
    /// # Errors
    ///
    /// [`ConfigError::IncompleteNotification`] when an outbox is set but the sender is blank or
    /// there are no recipients.
    pub fn notifier(&self) -> Result<Box<dyn ResultNotifier>, ConfigError> {
        let location = self.station.location.clone();
        let Some(outbox) = &self.notification.outbox else {
            return Ok(Box::new(LogNotifier::new(location)));
        };

        let notification = &self.notification;
        if notification.sender.trim().is_empty() {
            return Err(ConfigError::IncompleteNotification("a sender"));
        }
        if notification.recipients.iter().all(|r| r.trim().is_empty()) {
            return Err(ConfigError::IncompleteNotification("recipients"));
        }
        Ok(Box::new(OutboxNotifier::new(
            outbox,
            location,
            notification.sender.clone(),
            notification.recipients.clone(),
        )))
    }
}

impl ArduinoConfig {
    fn source(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<ArduinoCloudSource, ObservationError> {
        ArduinoCloudSource::builder()
            .thing_id(self.thing_id.as_str())
            .client_id(client_id)
            .client_secret(client_secret)
            .token_url(self.token_url.as_str())
            .api_base(self.api_base.as_str())
            .audience(self.audience.as_str())
            .timeout(Duration::from_secs(self.timeout_seconds))
            .build()
    }
}
