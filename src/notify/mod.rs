//! Delivering a [`Forecast`] to its readers.

use crate::pipeline::Forecast;
use log::info;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Failed to create outbox directory '{0}'")]
    OutboxCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to write message into '{0}'")]
    MessageWrite(PathBuf, #[source] std::io::Error),

    #[error("Failed to move message into place at '{0}'")]
    MessagePersist(PathBuf, #[source] tempfile::PersistError),
}

/// Receives each completed forecast exactly once.
pub trait ResultNotifier {
    fn notify(&self, forecast: &Forecast) -> Result<(), NotifyError>;
}

/// Subject and plain-text body of a forecast summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastMessage {
    pub subject: String,
    pub body: String,
}

impl ForecastMessage {
    /// Renders `forecast` for readers at `location`.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use station_forecast::{Forecast, ForecastMessage};
    ///
    /// let forecast = Forecast {
    ///     observed_on: NaiveDate::from_ymd_opt(2024, 7, 3).unwrap(),
    ///     forecast_for: NaiveDate::from_ymd_opt(2024, 7, 4).unwrap(),
    ///     temp_max: 88.44,
    ///     temp_min: 67.05,
    ///     rain: false,
    /// };
    /// let message = ForecastMessage::render(&forecast, "New Windsor, MD");
    /// assert_eq!(message.subject, "Weather Prediction for 07-04-2024");
    /// assert!(message.body.contains("High Temperature: 88.4 (F)"));
    /// ```
    pub fn render(forecast: &Forecast, location: &str) -> Self {
        let date = forecast.forecast_for.format("%m-%d-%Y");
        Self {
            subject: format!("Weather Prediction for {date}"),
            body: format!(
                "Forecast for {date} in {location}:\n\n\
                 High Temperature: {:.1} (F)\n\
                 Low Temperature: {:.1} (F)\n\
                 Rain tomorrow?: {}",
                forecast.temp_max,
                forecast.temp_min,
                if forecast.rain { "Yes" } else { "No" }
            ),
        }
    }
}

/// Writes the rendered message to the log.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    location: String,
}

impl LogNotifier {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl ResultNotifier for LogNotifier {
    fn notify(&self, forecast: &Forecast) -> Result<(), NotifyError> {
        let message = ForecastMessage::render(forecast, &self.location);
        info!("{}\n{}", message.subject, message.body);
        Ok(())
    }
}

/// Drops one mail file per forecast into an outbox directory.
///
/// Files are named `forecast-YYYY-MM-DD.eml` after the forecast day and hold RFC 5322 style
/// headers followed by the plain-text body. A mail transport picks them up from there. Each
/// file appears atomically; a second forecast for the same day replaces the first.
#[derive(Debug, Clone)]
pub struct OutboxNotifier {
    directory: PathBuf,
    location: String,
    sender: String,
    recipients: Vec<String>,
}

impl OutboxNotifier {
    pub fn new(
        directory: impl Into<PathBuf>,
        location: impl Into<String>,
        sender: impl Into<String>,
        recipients: Vec<String>,
    ) -> Self {
        Self {
            directory: directory.into(),
            location: location.into(),
            sender: sender.into(),
            recipients,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, forecast: &Forecast) -> PathBuf {
        self.directory
            .join(format!("forecast-{}.eml", forecast.forecast_for.format("%Y-%m-%d")))
    }

    fn compose(&self, message: &ForecastMessage) -> String {
        format!(
            "From: {}\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=utf-8\r\n\r\n{}\r\n",
            self.sender,
            self.recipients.join(", "),
            message.subject,
            message.body.replace('\n', "\r\n")
        )
    }
}

impl ResultNotifier for OutboxNotifier {
    fn notify(&self, forecast: &Forecast) -> Result<(), NotifyError> {
        std::fs::create_dir_all(&self.directory)
            .map_err(|e| NotifyError::OutboxCreation(self.directory.clone(), e))?;

        let message = ForecastMessage::render(forecast, &self.location);
        let mut file = NamedTempFile::new_in(&self.directory)
            .map_err(|e| NotifyError::MessageWrite(self.directory.clone(), e))?;
        file.write_all(self.compose(&message).as_bytes())
            .map_err(|e| NotifyError::MessageWrite(file.path().to_path_buf(), e))?;

        let path = self.path_for(forecast);
        file.persist(&path)
            .map_err(|e| NotifyError::MessagePersist(path.clone(), e))?;
        info!("Queued \"{}\" at {:?}", message.subject, path);
        Ok(())
    }
}
