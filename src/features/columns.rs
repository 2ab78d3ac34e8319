//! Column names and window sizes shared by training and inference.
//!
//! Every feature column name is produced here and nowhere else, so a model trained on an
//! exported table and the live inference row always agree on naming.

use crate::types::observation::Observation;

/// Trailing rolling-window sizes, in rows, including the current row.
pub const ROLLING_WINDOWS: [usize; 3] = [3, 7, 30];

/// Positional lag offsets, in rows.
pub const LAG_OFFSETS: [usize; 6] = [1, 2, 3, 7, 14, 30];

/// Period of the cyclical day-of-year encoding.
pub const YEAR_PERIOD_DAYS: f64 = 365.25;

pub const DATE: &str = "date";
pub const DAY_OF_YEAR: &str = "day_of_year";
pub const MONTH: &str = "month";
pub const WEEK_OF_YEAR: &str = "week_of_year";
pub const SIN_DAY_OF_YEAR: &str = "sin_day_of_year";
pub const COS_DAY_OF_YEAR: &str = "cos_day_of_year";

/// Calendar columns in frame order.
const CALENDAR_COLUMNS: [&str; 5] = [
    DAY_OF_YEAR,
    MONTH,
    WEEK_OF_YEAR,
    SIN_DAY_OF_YEAR,
    COS_DAY_OF_YEAR,
];

/// Columns computed for every row but never fed to a predictor.
///
/// The raw ordinal day does not carry over from one year to the next; the sine/cosine pair
/// replaces it.
pub const MODEL_EXCLUDED_COLUMNS: [&str; 1] = [DAY_OF_YEAR];

/// Aggregation applied over a rolling window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollingAggregation {
    Mean,
    Sum,
}

impl RollingAggregation {
    fn suffix(&self) -> &'static str {
        match self {
            RollingAggregation::Mean => "avg",
            RollingAggregation::Sum => "sum",
        }
    }
}

/// A raw observation series as it appears in the feature frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseSeries {
    Precipitation,
    TempMax,
    TempMin,
    WindSpeed,
    WindDirection,
}

impl BaseSeries {
    /// Base columns in frame order.
    pub const ALL: [BaseSeries; 5] = [
        BaseSeries::Precipitation,
        BaseSeries::TempMax,
        BaseSeries::TempMin,
        BaseSeries::WindSpeed,
        BaseSeries::WindDirection,
    ];

    /// Series that get rolling and lag features, in the order their columns are emitted.
    pub const DERIVED: [BaseSeries; 4] = [
        BaseSeries::TempMin,
        BaseSeries::TempMax,
        BaseSeries::Precipitation,
        BaseSeries::WindSpeed,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            BaseSeries::Precipitation => "precip",
            BaseSeries::TempMax => "temp_max",
            BaseSeries::TempMin => "temp_min",
            BaseSeries::WindSpeed => "wind_speed",
            BaseSeries::WindDirection => "wind_direction",
        }
    }

    /// Precipitation accumulates, everything else averages. Wind direction is not rolled.
    pub fn rolling_aggregation(&self) -> Option<RollingAggregation> {
        match self {
            BaseSeries::Precipitation => Some(RollingAggregation::Sum),
            BaseSeries::TempMax | BaseSeries::TempMin | BaseSeries::WindSpeed => {
                Some(RollingAggregation::Mean)
            }
            BaseSeries::WindDirection => None,
        }
    }

    /// e.g. `temp_min_roll_avg_7`, `precip_roll_sum_30`.
    pub fn rolling_column(&self, window: usize) -> Option<String> {
        self.rolling_aggregation()
            .map(|agg| format!("{}_roll_{}_{}", self.column(), agg.suffix(), window))
    }

    /// e.g. `temp_max_lag_14`.
    pub fn lag_column(&self, lag: usize) -> String {
        format!("{}_lag_{}", self.column(), lag)
    }

    pub fn value(&self, observation: &Observation) -> Option<f64> {
        match self {
            BaseSeries::Precipitation => observation.precipitation,
            BaseSeries::TempMax => observation.temp_max,
            BaseSeries::TempMin => observation.temp_min,
            BaseSeries::WindSpeed => observation.wind_speed,
            BaseSeries::WindDirection => observation.wind_direction,
        }
    }
}

/// All feature columns, excluding `date`, in the order the feature frame holds them.
pub fn feature_columns(windows: &[usize], lags: &[usize]) -> Vec<String> {
    let mut columns: Vec<String> = BaseSeries::ALL
        .iter()
        .map(|series| series.column().to_string())
        .collect();
    for &window in windows {
        columns.extend(
            BaseSeries::DERIVED
                .iter()
                .filter_map(|series| series.rolling_column(window)),
        );
    }
    for &lag in lags {
        columns.extend(BaseSeries::DERIVED.iter().map(|series| series.lag_column(lag)));
    }
    columns.extend(CALENDAR_COLUMNS.iter().map(|c| c.to_string()));
    columns
}

/// True when `column` is computed but kept away from predictors.
pub fn is_model_excluded(column: &str) -> bool {
    MODEL_EXCLUDED_COLUMNS.contains(&column)
}
