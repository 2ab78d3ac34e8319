pub mod config;
mod error;
pub mod features;
pub mod model;
pub mod notify;
pub mod observations;
mod pipeline;
pub mod training;
mod types;

pub use config::{ConfigError, ForecastConfig, Secrets};
pub use error::ForecastError;
pub use pipeline::*;

pub use features::columns::{feature_columns, BaseSeries, MODEL_EXCLUDED_COLUMNS};
pub use features::engineer::{FeatureEngineer, FeatureFrameExt};
pub use features::error::FeatureError;
pub use features::imputation::impute_training_gaps;
pub use features::row::{FeatureRow, ModelInput, TargetedRow};
pub use features::selector::{latest, with_targets};

pub use model::error::ModelError;
pub use model::predictor::{LinearModel, ModelOutput, Predictor, Predictors};
pub use model::store::{JsonModelStore, ModelStore};

pub use notify::{ForecastMessage, LogNotifier, NotifyError, OutboxNotifier, ResultNotifier};

pub use observations::error::ObservationError;
pub use observations::noaa::read_ghcn_daily;
pub use observations::source::{ArduinoCloudSource, ObservationSource};
pub use observations::store::{CsvObservationStore, ObservationStore};

pub use training::{TrainingError, TrainingTable};

pub use types::compass::{wind_direction_degrees, CompassPoint};
pub use types::observation::Observation;
pub use types::target::{TargetKind, UnknownTarget};
