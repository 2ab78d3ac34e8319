//! Gap filling for long historical training series.
//!
//! Only the training path uses this. Live inference keeps the strict policy where a missing
//! reading drops every row that depends on it, so a model fitted on imputed history may see
//! slightly different inputs than it gets in production. The skew is logged on every run.

use crate::features::columns::BaseSeries;
use crate::features::error::FeatureError;
use crate::features::frame::{observations_from_frame, observations_to_frame};
use crate::types::observation::Observation;
use log::{info, warn};
use polars::prelude::{col, lit, Expr, IntoLazy, LazyFrame};

fn fill_from_neighbours_then_mean(series: BaseSeries) -> Expr {
    let filled = col(series.column()).forward_fill(None).backward_fill(None);
    filled.clone().fill_null(filled.mean()).alias(series.column())
}

/// Fills gaps the way the historical training tables were prepared:
///
/// * precipitation: missing means none fell (`0.0`);
/// * temperatures: carried forward from the previous day, leading gaps stay missing;
/// * wind speed and direction: carried forward, then backward, then the series mean.
pub fn fill_training_gaps(frame: LazyFrame) -> LazyFrame {
    frame.with_columns([
        col(BaseSeries::Precipitation.column())
            .fill_null(lit(0.0))
            .alias(BaseSeries::Precipitation.column()),
        col(BaseSeries::TempMin.column())
            .forward_fill(None)
            .alias(BaseSeries::TempMin.column()),
        col(BaseSeries::TempMax.column())
            .forward_fill(None)
            .alias(BaseSeries::TempMax.column()),
        fill_from_neighbours_then_mean(BaseSeries::WindSpeed),
        fill_from_neighbours_then_mean(BaseSeries::WindDirection),
    ])
}

fn missing_readings(observations: &[Observation]) -> usize {
    observations
        .iter()
        .map(|obs| {
            BaseSeries::ALL
                .iter()
                .filter(|series| series.value(obs).is_none())
                .count()
        })
        .sum()
}

/// Applies [`fill_training_gaps`] to a typed observation series.
pub fn impute_training_gaps(observations: &[Observation]) -> Result<Vec<Observation>, FeatureError> {
    let before = missing_readings(observations);
    let frame = observations_to_frame(observations)?;
    let filled = fill_training_gaps(frame.lazy()).collect()?;
    let imputed = observations_from_frame(&filled)?;
    let after = missing_readings(&imputed);

    if before > after {
        warn!(
            "Imputed {} missing readings in training history; live inference drops such rows instead",
            before - after
        );
    } else {
        info!("Training history had no imputable gaps");
    }
    Ok(imputed)
}
