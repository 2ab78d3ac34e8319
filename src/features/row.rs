//! Row types produced by the feature pipeline.

use crate::features::columns::is_model_excluded;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

/// One fully populated row of the feature table.
///
/// Values are keyed by column name. The map keeps columns sorted by name, which is the column
/// order every predictor sees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub date: NaiveDate,
    pub values: BTreeMap<String, f64>,
}

impl FeatureRow {
    pub fn get(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// The predictor-facing view of this row. See [`ModelInput::from_row`].
    pub fn model_input(&self) -> ModelInput {
        ModelInput::from_row(self)
    }
}

/// A feature row paired with the value it should predict. Training only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetedRow {
    pub row: FeatureRow,
    pub target: f64,
}

/// The ordered `(column, value)` pairs handed to a predictor.
///
/// Built only through [`ModelInput::from_row`], which drops
/// [`MODEL_EXCLUDED_COLUMNS`](crate::features::columns::MODEL_EXCLUDED_COLUMNS). Training
/// export and live inference both go through it, so the two cannot disagree on which columns a
/// model sees.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInput {
    columns: Vec<(String, f64)>,
}

impl ModelInput {
    pub fn from_row(row: &FeatureRow) -> Self {
        let columns = row
            .values
            .iter()
            .filter(|(name, _)| !is_model_excluded(name))
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        Self { columns }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, column: &str) -> Option<f64> {
        // Sorted by construction from a BTreeMap.
        self.columns
            .binary_search_by(|(name, _)| name.as_str().cmp(column))
            .ok()
            .map(|idx| self.columns[idx].1)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
