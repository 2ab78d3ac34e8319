//! Picks rows out of the feature table: the newest one for inference, or every row paired
//! with its next-day target for training.

use crate::features::columns::BaseSeries;
use crate::features::engineer::FeatureEngineer;
use crate::features::error::FeatureError;
use crate::features::row::{FeatureRow, TargetedRow};
use crate::types::observation::{finite, Observation};
use crate::types::target::TargetKind;
use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;

/// Returns the chronologically last feature row of a table computed with the default
/// [`FeatureEngineer`].
///
/// # Errors
///
/// [`FeatureError::EmptyFeatureSet`] when `features` is empty, which happens whenever the
/// history holds fewer than 31 complete consecutive days. Tables computed with other windows
/// or lags should go through [`FeatureEngineer::latest`] so the error reports their own
/// requirement.
pub fn latest(features: &[FeatureRow]) -> Result<FeatureRow, FeatureError> {
    FeatureEngineer::default().latest(features)
}

/// Last row of `features`, or [`FeatureError::EmptyFeatureSet`] reporting `required` days.
pub(crate) fn last_row(features: &[FeatureRow], required: usize) -> Result<FeatureRow, FeatureError> {
    features
        .last()
        .cloned()
        .ok_or(FeatureError::EmptyFeatureSet { required })
}

/// Value of `kind` in the observation that follows a feature row.
fn target_value(kind: TargetKind, next: &Observation) -> Option<f64> {
    match kind {
        TargetKind::TempMax => finite(BaseSeries::TempMax.value(next)),
        TargetKind::TempMin => finite(BaseSeries::TempMin.value(next)),
        TargetKind::Rain => finite(BaseSeries::Precipitation.value(next))
            .map(|precip| if precip > 0.0 { 1.0 } else { 0.0 }),
    }
}

/// Pairs every feature row with the value of `kind` in the next observation of `raw`.
///
/// "Next" is positional: the observation that follows the row's date in `raw`, however many
/// calendar days later it is. Rows with no following observation (the newest row) and rows
/// whose next-day reading is missing get no target and are left out. Output keeps the input
/// order.
pub fn with_targets(
    features: &[FeatureRow],
    raw: &[Observation],
    kind: TargetKind,
) -> Vec<TargetedRow> {
    let positions: HashMap<NaiveDate, usize> = raw
        .iter()
        .enumerate()
        .map(|(idx, obs)| (obs.date, idx))
        .collect();

    let targeted: Vec<TargetedRow> = features
        .iter()
        .filter_map(|row| {
            let next = raw.get(positions.get(&row.date)? + 1)?;
            Some(TargetedRow {
                row: row.clone(),
                target: target_value(kind, next)?,
            })
        })
        .collect();

    debug!(
        "Attached {} targets to {} of {} feature rows",
        kind,
        targeted.len(),
        features.len()
    );
    targeted
}
