use chrono::NaiveDate;
use polars::error::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error("No feature row has a complete lookback window (need at least {required} consecutive complete days)")]
    EmptyFeatureSet { required: usize },

    #[error("Observations are not in ascending date order: {current} follows {previous}")]
    UnorderedObservations {
        previous: NaiveDate,
        current: NaiveDate,
    },

    #[error("Duplicate observation for {0}")]
    DuplicateDate(NaiveDate),

    #[error("Required column '{0}' not found in feature frame")]
    ColumnNotFound(String, #[source] PolarsError),

    #[error("Feature frame row {row} has a null date")]
    NullDate { row: usize },

    #[error("Failed processing feature frame: {0}")]
    Polars(#[from] PolarsError),
}
