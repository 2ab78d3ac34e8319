//! The predictor contract and the linear models the training side exports.

use crate::features::row::ModelInput;
use crate::model::error::ModelError;
use crate::types::target::TargetKind;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A trained model for one [`TargetKind`].
///
/// Predictors are loaded once per run and never change afterwards. `predict` must refuse an
/// input whose column set differs from the one the model was trained on rather than guess a
/// value for the difference.
pub trait Predictor: Send + Sync {
    fn target(&self) -> TargetKind;

    /// Columns the model was trained on.
    fn feature_names(&self) -> &[String];

    /// Predicts one value. Classifiers return `1.0` or `0.0`.
    fn predict(&self, input: &ModelInput) -> Result<f64, ModelError>;
}

/// Checks that `input` carries exactly the columns in `expected`.
///
/// # Errors
///
/// [`ModelError::FeatureSchemaMismatch`] listing the columns missing from the input and the
/// columns the model has never seen.
pub fn check_schema(
    target: TargetKind,
    expected: &[String],
    input: &ModelInput,
) -> Result<(), ModelError> {
    let expected: BTreeSet<&str> = expected.iter().map(String::as_str).collect();
    let presented: BTreeSet<&str> = input.names().collect();
    if expected == presented {
        return Ok(());
    }
    Err(ModelError::FeatureSchemaMismatch {
        target,
        missing: expected
            .difference(&presented)
            .map(|c| c.to_string())
            .collect(),
        unexpected: presented
            .difference(&expected)
            .map(|c| c.to_string())
            .collect(),
    })
}

/// How a linear score becomes a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelOutput {
    /// The score is the prediction.
    Regression,
    /// The logistic of the score is compared against `threshold`.
    Classification { threshold: f64 },
}

/// Linear model exported by the external fitting procedure as JSON.
///
/// ```json
/// {
///   "target": "temp_max",
///   "features": ["cos_day_of_year", "month", "..."],
///   "intercept": 12.5,
///   "coefficients": [0.8, 0.1, "..."],
///   "output": { "kind": "regression" }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub target: TargetKind,
    pub features: Vec<String>,
    pub intercept: f64,
    pub coefficients: Vec<f64>,
    pub output: ModelOutput,
}

impl LinearModel {
    /// Rejects models whose coefficient list does not line up with their feature list, or
    /// that name a feature more than once.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.features.len() != self.coefficients.len() {
            return Err(ModelError::MalformedModel {
                target: self.target,
                features: self.features.len(),
                coefficients: self.coefficients.len(),
            });
        }
        let mut seen = BTreeSet::new();
        if let Some(repeated) = self.features.iter().find(|f| !seen.insert(f.as_str())) {
            return Err(ModelError::DuplicateFeature {
                target: self.target,
                feature: repeated.clone(),
            });
        }
        Ok(())
    }

    fn score(&self, input: &ModelInput) -> f64 {
        self.features
            .iter()
            .zip(&self.coefficients)
            .map(|(name, coef)| coef * input.get(name).unwrap_or(f64::NAN))
            .sum::<f64>()
            + self.intercept
    }
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

impl Predictor for LinearModel {
    fn target(&self) -> TargetKind {
        self.target
    }

    fn feature_names(&self) -> &[String] {
        &self.features
    }

    fn predict(&self, input: &ModelInput) -> Result<f64, ModelError> {
        self.validate()?;
        check_schema(self.target, &self.features, input)?;
        let score = self.score(input);
        Ok(match self.output {
            ModelOutput::Regression => score,
            ModelOutput::Classification { threshold } => {
                if logistic(score) >= threshold {
                    1.0
                } else {
                    0.0
                }
            }
        })
    }
}

/// One predictor per target, each checked to be registered under the target it was trained
/// for.
#[derive(Default)]
pub struct Predictors {
    by_target: BTreeMap<TargetKind, Box<dyn Predictor>>,
}

impl Predictors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `predictor` for `kind`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// [`ModelError::TargetMismatch`] when the predictor reports a different target.
    pub fn register(
        &mut self,
        kind: TargetKind,
        predictor: Box<dyn Predictor>,
    ) -> Result<(), ModelError> {
        if predictor.target() != kind {
            return Err(ModelError::TargetMismatch {
                expected: kind,
                found: predictor.target(),
            });
        }
        self.by_target.insert(kind, predictor);
        Ok(())
    }

    pub fn get(&self, kind: TargetKind) -> Result<&dyn Predictor, ModelError> {
        self.by_target
            .get(&kind)
            .map(|p| p.as_ref())
            .ok_or(ModelError::MissingPredictor(kind))
    }

    /// Runs the predictor for `kind` on `input` after checking `input` against the columns
    /// that predictor reports it was trained on.
    ///
    /// # Errors
    ///
    /// [`ModelError::MissingPredictor`], [`ModelError::FeatureSchemaMismatch`], or whatever the
    /// predictor itself returns.
    pub fn predict(&self, kind: TargetKind, input: &ModelInput) -> Result<f64, ModelError> {
        let predictor = self.get(kind)?;
        check_schema(kind, predictor.feature_names(), input)?;
        predictor.predict(input)
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
