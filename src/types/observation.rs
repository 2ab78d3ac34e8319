//! Defines [`Observation`], one day of station readings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather station readings.
///
/// Every measurement is optional: `None` marks a reading that was missing or could not be
/// interpreted (for example an unrecognized wind direction label). Missing readings are never
/// replaced with defaults on the inference path; they invalidate every feature row whose
/// lookback depends on them.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use station_forecast::Observation;
///
/// let day = Observation::new(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
///     .with_precipitation(0.0)
///     .with_temperatures(71.5, 52.0)
///     .with_wind(6.2, 45.0);
/// assert_eq!(day.temp_max, Some(71.5));
/// assert!(day.is_complete());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// Total precipitation in mm.
    pub precipitation: Option<f64>,
    /// Daily high in °F.
    pub temp_max: Option<f64>,
    /// Daily low in °F.
    pub temp_min: Option<f64>,
    pub wind_speed: Option<f64>,
    /// Prevailing wind direction in degrees (0 = N, clockwise).
    pub wind_direction: Option<f64>,
}

impl Observation {
    /// Creates an observation for `date` with every reading missing.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            precipitation: None,
            temp_max: None,
            temp_min: None,
            wind_speed: None,
            wind_direction: None,
        }
    }

    pub fn with_precipitation(mut self, precipitation: f64) -> Self {
        self.precipitation = Some(precipitation);
        self
    }

    pub fn with_temperatures(mut self, temp_max: f64, temp_min: f64) -> Self {
        self.temp_max = Some(temp_max);
        self.temp_min = Some(temp_min);
        self
    }

    pub fn with_wind(mut self, speed: f64, direction_degrees: f64) -> Self {
        self.wind_speed = Some(speed);
        self.wind_direction = Some(direction_degrees);
        self
    }

    /// True when no reading is missing.
    pub fn is_complete(&self) -> bool {
        self.precipitation.is_some()
            && self.temp_max.is_some()
            && self.temp_min.is_some()
            && self.wind_speed.is_some()
            && self.wind_direction.is_some()
    }
}

/// Drops NaN so that it is treated as a missing reading everywhere downstream.
pub(crate) fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| !v.is_nan())
}
