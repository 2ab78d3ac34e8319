use crate::config::ConfigError;
use crate::features::error::FeatureError;
use crate::model::error::ModelError;
use crate::notify::NotifyError;
use crate::observations::error::ObservationError;
use crate::training::TrainingError;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Observation(#[from] ObservationError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error(transparent)]
    Training(#[from] TrainingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No calendar day follows {0}")]
    DateOutOfRange(NaiveDate),
}
