use crate::types::target::TargetKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Feature columns do not match the {target} model's schema (missing: {missing:?}, unexpected: {unexpected:?})")]
    FeatureSchemaMismatch {
        target: TargetKind,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    #[error("Model for {target} has {coefficients} coefficients for {features} features")]
    MalformedModel {
        target: TargetKind,
        features: usize,
        coefficients: usize,
    },

    #[error("Model for {target} lists feature '{feature}' more than once")]
    DuplicateFeature { target: TargetKind, feature: String },

    #[error("Model registered for {expected} was trained for {found}")]
    TargetMismatch {
        expected: TargetKind,
        found: TargetKind,
    },

    #[error("No predictor loaded for {0}")]
    MissingPredictor(TargetKind),

    #[error("Classifier for {target} returned {value}, expected 0 or 1")]
    InvalidClassLabel { target: TargetKind, value: f64 },

    #[error("Failed to read model file '{0}'")]
    ModelRead(PathBuf, #[source] std::io::Error),

    #[error("Failed to decode model file '{0}'")]
    ModelDecode(PathBuf, #[source] serde_json::Error),
}
