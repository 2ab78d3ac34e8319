//! The feature pipeline shared by training and inference.

use crate::features::columns::{
    feature_columns, BaseSeries, RollingAggregation, COS_DAY_OF_YEAR, DATE, DAY_OF_YEAR,
    LAG_OFFSETS, MONTH, ROLLING_WINDOWS, SIN_DAY_OF_YEAR, WEEK_OF_YEAR, YEAR_PERIOD_DAYS,
};
use crate::features::error::FeatureError;
use crate::features::frame::{observations_to_frame, rows_from_frame};
use crate::features::row::FeatureRow;
use crate::features::selector::last_row;
use crate::types::observation::Observation;
use bon::Builder;
use log::debug;
use polars::prelude::{col, lit, DataType, Expr, IntoLazy, LazyFrame, RollingOptionsFixedWindow};
use std::f64::consts::PI;

/// Feature expressions on a `LazyFrame` holding the base observation columns.
///
/// Each method appends columns and returns a new lazy plan; nothing is evaluated until the
/// frame is collected.
pub trait FeatureFrameExt {
    /// Adds trailing rolling aggregates for every derived base series and window.
    ///
    /// A window of size `w` covers the current row and the `w - 1` rows before it. A window
    /// that is not full, or that contains a missing value, yields null.
    fn with_rolling_features(self, windows: &[usize]) -> LazyFrame;

    /// Adds the value found `lag` rows earlier, by position, for every derived base series.
    fn with_lag_features(self, lags: &[usize]) -> LazyFrame;

    /// Adds day of year, month, ISO week and the sine/cosine of the day of year over a
    /// 365.25-day period, all computed from the row's own `date`.
    fn with_calendar_features(self) -> LazyFrame;
}

fn rolling_expr(series: BaseSeries, window: usize) -> Option<Expr> {
    let options = RollingOptionsFixedWindow {
        window_size: window,
        min_periods: window,
        ..Default::default()
    };
    let source = col(series.column());
    let name = series.rolling_column(window)?;
    let expr = match series.rolling_aggregation()? {
        RollingAggregation::Mean => source.rolling_mean(options),
        RollingAggregation::Sum => source.rolling_sum(options),
    };
    Some(expr.alias(name))
}

impl FeatureFrameExt for LazyFrame {
    fn with_rolling_features(self, windows: &[usize]) -> LazyFrame {
        let exprs: Vec<Expr> = windows
            .iter()
            .flat_map(|&window| {
                BaseSeries::DERIVED
                    .iter()
                    .filter_map(move |&series| rolling_expr(series, window))
            })
            .collect();
        if exprs.is_empty() {
            return self;
        }
        self.with_columns(exprs)
    }

    fn with_lag_features(self, lags: &[usize]) -> LazyFrame {
        let exprs: Vec<Expr> = lags
            .iter()
            .flat_map(|&lag| {
                BaseSeries::DERIVED.iter().map(move |series| {
                    col(series.column())
                        .shift(lit(lag as i64))
                        .alias(series.lag_column(lag))
                })
            })
            .collect();
        if exprs.is_empty() {
            return self;
        }
        self.with_columns(exprs)
    }

    fn with_calendar_features(self) -> LazyFrame {
        let angle = lit(2.0 * PI) * col(DAY_OF_YEAR) / lit(YEAR_PERIOD_DAYS);
        self.with_columns([
            col(DATE)
                .dt()
                .ordinal_day()
                .cast(DataType::Float64)
                .alias(DAY_OF_YEAR),
            col(DATE).dt().month().cast(DataType::Float64).alias(MONTH),
            col(DATE)
                .dt()
                .week()
                .cast(DataType::Float64)
                .alias(WEEK_OF_YEAR),
        ])
        // Second pass: the trig columns read `day_of_year` from the first.
        .with_columns([
            angle.clone().sin().alias(SIN_DAY_OF_YEAR),
            angle.cos().alias(COS_DAY_OF_YEAR),
        ])
    }
}

/// Turns a daily observation history into the feature table.
///
/// The engineer is stateless: the same history always produces the same rows. A row is kept
/// only when every column is defined, so with the default windows the first row appears once
/// 31 consecutive complete days are available (the 30-day lag needs a 31st row).
///
/// Window and lag sizes default to [`ROLLING_WINDOWS`] and [`LAG_OFFSETS`]; smaller lists are
/// useful for synthetic tests.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, NaiveDate};
/// use station_forecast::{FeatureEngineer, Observation};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
/// let history: Vec<Observation> = (0..31)
///     .map(|i| {
///         Observation::new(start + Duration::days(i))
///             .with_precipitation(0.0)
///             .with_temperatures(50.0, 30.0)
///             .with_wind(4.0, 270.0)
///     })
///     .collect();
///
/// let rows = FeatureEngineer::default().compute(&history)?;
/// assert_eq!(rows.len(), 1);
/// assert_eq!(rows[0].get("temp_max_lag_30"), Some(50.0));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
pub struct FeatureEngineer {
    #[builder(default = ROLLING_WINDOWS.to_vec())]
    windows: Vec<usize>,
    #[builder(default = LAG_OFFSETS.to_vec())]
    lags: Vec<usize>,
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self {
            windows: ROLLING_WINDOWS.to_vec(),
            lags: LAG_OFFSETS.to_vec(),
        }
    }
}

impl FeatureEngineer {
    /// Number of consecutive complete rows needed before the first feature row exists.
    pub fn required_history(&self) -> usize {
        let longest_window = self.windows.iter().copied().max().unwrap_or(1);
        let longest_lag = self.lags.iter().copied().max().unwrap_or(0);
        longest_window.max(longest_lag + 1)
    }

    /// Every feature column, excluding `date`, in frame order.
    pub fn feature_columns(&self) -> Vec<String> {
        feature_columns(&self.windows, &self.lags)
    }

    /// The newest row of a table this engineer computed.
    ///
    /// # Errors
    ///
    /// [`FeatureError::EmptyFeatureSet`] carrying [`required_history`](Self::required_history)
    /// when `rows` is empty.
    pub fn latest(&self, rows: &[FeatureRow]) -> Result<FeatureRow, FeatureError> {
        last_row(rows, self.required_history())
    }

    /// Applies the feature expressions to a frame of base columns and drops incomplete rows.
    pub fn compute_frame(&self, frame: LazyFrame) -> LazyFrame {
        frame
            .with_rolling_features(&self.windows)
            .with_lag_features(&self.lags)
            .with_calendar_features()
            .drop_nulls(None)
    }

    /// Computes all valid feature rows, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureError::UnorderedObservations`] or [`FeatureError::DuplicateDate`]
    /// when `observations` is not strictly increasing by date, and
    /// [`FeatureError::Polars`] if the frame computation fails.
    pub fn compute(&self, observations: &[Observation]) -> Result<Vec<FeatureRow>, FeatureError> {
        check_ascending(observations)?;
        let frame = observations_to_frame(observations)?;
        let features = self.compute_frame(frame.lazy()).collect()?;
        debug!(
            "Computed {} feature rows from {} observations",
            features.height(),
            observations.len()
        );
        rows_from_frame(&features, &self.feature_columns())
    }
}

fn check_ascending(observations: &[Observation]) -> Result<(), FeatureError> {
    for pair in observations.windows(2) {
        let (previous, current) = (pair[0].date, pair[1].date);
        if current == previous {
            return Err(FeatureError::DuplicateDate(current));
        }
        if current < previous {
            return Err(FeatureError::UnorderedObservations { previous, current });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
    }

    /// `days` complete observations where temp_min is the 1-based day index.
    fn synthetic(days: usize) -> Vec<Observation> {
        (0..days)
            .map(|i| {
                let index = (i + 1) as f64;
                Observation::new(start() + Duration::days(i as i64))
                    .with_precipitation(2.5)
                    .with_temperatures(100.0 + index, index)
                    .with_wind(3.0 + index, 180.0)
            })
            .collect()
    }

    #[test]
    fn test_compute_is_deterministic() -> Result<(), FeatureError> {
        let history = synthetic(60);
        let engineer = FeatureEngineer::default();
        let first = engineer.compute(&history)?;
        let second = engineer.compute(&history)?;
        assert_eq!(first.len(), 30);
        assert_eq!(first, second);
        for (a, b) in first.iter().zip(&second) {
            for (column, value) in &a.values {
                assert_eq!(value.to_bits(), b.values[column].to_bits(), "{column}");
            }
        }
        Ok(())
    }

    #[test]
    fn test_rolling_windows() -> Result<(), FeatureError> {
        let rows = FeatureEngineer::default().compute(&synthetic(35))?;
        let day_35 = rows.last().unwrap();
        assert_eq!(day_35.date, start() + Duration::days(34));

        let expected_mean = (29..=35).sum::<i32>() as f64 / 7.0;
        assert!((day_35.get("temp_min_roll_avg_7").unwrap() - expected_mean).abs() < 1e-9);
        assert!((day_35.get("temp_min_roll_avg_3").unwrap() - 34.0).abs() < 1e-9);
        assert!((day_35.get("precip_roll_sum_30").unwrap() - 30.0 * 2.5).abs() < 1e-9);
        assert!((day_35.get("precip_roll_sum_7").unwrap() - 7.0 * 2.5).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_lags_are_positional() -> Result<(), FeatureError> {
        let history = synthetic(40);
        let rows = FeatureEngineer::default().compute(&history)?;
        let last = rows.last().unwrap();
        // Day 40 is index 39; lag 7 reads index 32.
        assert_eq!(last.get("temp_max_lag_7"), history[32].temp_max);
        assert_eq!(last.get("temp_max_lag_30"), history[9].temp_max);
        assert_eq!(last.get("wind_speed_lag_1"), history[38].wind_speed);
        Ok(())
    }

    #[test]
    fn test_lag_ignores_calendar_gaps() -> Result<(), FeatureError> {
        let mut history = synthetic(3);
        history[2].date = history[2].date + Duration::days(10);
        let engineer = FeatureEngineer::builder().windows(vec![]).lags(vec![1]).build();
        let rows = engineer.compute(&history)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("temp_min_lag_1"), Some(2.0));
        Ok(())
    }

    #[test]
    fn test_validity_cutoff_at_31_days() -> Result<(), FeatureError> {
        let engineer = FeatureEngineer::default();
        assert_eq!(engineer.required_history(), 31);
        assert!(engineer.compute(&synthetic(30))?.is_empty());

        let rows = engineer.compute(&synthetic(31))?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date, start() + Duration::days(30));
        assert_eq!(rows[0].values.len(), engineer.feature_columns().len());
        Ok(())
    }

    #[test]
    fn test_empty_history_yields_no_rows() -> Result<(), FeatureError> {
        assert!(FeatureEngineer::default().compute(&[])?.is_empty());
        Ok(())
    }

    #[test]
    fn test_missing_value_invalidates_lookback() -> Result<(), FeatureError> {
        let mut history = synthetic(70);
        // Index 40 has no high temperature; every later row reaches it through the 30-day
        // window.
        history[40].temp_max = None;
        let rows = FeatureEngineer::default().compute(&history)?;
        let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();

        assert_eq!(rows.len(), 10);
        assert_eq!(dates.first(), Some(&history[30].date));
        assert_eq!(dates.last(), Some(&history[39].date));
        Ok(())
    }

    #[test]
    fn test_unrecognized_wind_direction_drops_its_row() -> Result<(), FeatureError> {
        let mut history = synthetic(31);
        history[30].wind_direction = crate::wind_direction_degrees("Calm");
        let rows = FeatureEngineer::default().compute(&history)?;
        assert!(rows.is_empty());
        Ok(())
    }

    #[test]
    fn test_year_end_wraparound() -> Result<(), FeatureError> {
        let dec_31 = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        let history = vec![
            Observation::new(dec_31)
                .with_precipitation(0.0)
                .with_temperatures(40.0, 30.0)
                .with_wind(2.0, 0.0),
            Observation::new(dec_31 + Duration::days(1))
                .with_precipitation(0.0)
                .with_temperatures(41.0, 31.0)
                .with_wind(2.0, 0.0),
        ];
        let engineer = FeatureEngineer::builder().windows(vec![]).lags(vec![]).build();
        let rows = engineer.compute(&history)?;
        let (dec, jan) = (&rows[0], &rows[1]);

        assert_eq!(dec.get(DAY_OF_YEAR), Some(365.0));
        assert_eq!(jan.get(DAY_OF_YEAR), Some(1.0));
        assert_eq!(dec.get(MONTH), Some(12.0));
        assert_eq!(jan.get(WEEK_OF_YEAR), Some(1.0));
        assert!((dec.get(SIN_DAY_OF_YEAR).unwrap() - jan.get(SIN_DAY_OF_YEAR).unwrap()).abs() < 0.05);
        assert!((dec.get(COS_DAY_OF_YEAR).unwrap() - jan.get(COS_DAY_OF_YEAR).unwrap()).abs() < 0.01);
        Ok(())
    }

    #[test]
    fn test_rejects_unordered_and_duplicate_dates() {
        let mut history = synthetic(3);
        history.swap(1, 2);
        assert!(matches!(
            FeatureEngineer::default().compute(&history),
            Err(FeatureError::UnorderedObservations { .. })
        ));

        let mut history = synthetic(3);
        history[2].date = history[1].date;
        assert!(matches!(
            FeatureEngineer::default().compute(&history),
            Err(FeatureError::DuplicateDate(_))
        ));
    }
}
