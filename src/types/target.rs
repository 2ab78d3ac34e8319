//! Defines [`TargetKind`], the three quantities the station forecasts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A forecast target. Each target has its own trained predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Tomorrow's high temperature.
    TempMax,
    /// Tomorrow's low temperature.
    TempMin,
    /// Whether any precipitation falls tomorrow, encoded as `1.0` / `0.0`.
    Rain,
}

impl TargetKind {
    pub const ALL: [TargetKind; 3] = [TargetKind::TempMax, TargetKind::TempMin, TargetKind::Rain];

    /// Stable name used for model files, CLI arguments and log lines.
    pub fn name(&self) -> &'static str {
        match self {
            TargetKind::TempMax => "temp_max",
            TargetKind::TempMin => "temp_min",
            TargetKind::Rain => "rain",
        }
    }

    pub fn is_classification(&self) -> bool {
        matches!(self, TargetKind::Rain)
    }
}

/// Allows formatting a `TargetKind` using its stable name.
///
/// # Examples
///
/// ```
/// use station_forecast::TargetKind;
///
/// assert_eq!(TargetKind::TempMax.to_string(), "temp_max");
/// assert_eq!(format!("{}", TargetKind::Rain), "rain");
/// ```
impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown forecast target '{0}', expected one of temp_max, temp_min, rain")]
pub struct UnknownTarget(pub String);

impl FromStr for TargetKind {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TargetKind::ALL
            .into_iter()
            .find(|kind| kind.name() == s.trim())
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_from_str() {
        for kind in TargetKind::ALL {
            assert_eq!(kind.name().parse::<TargetKind>(), Ok(kind));
        }
        assert_eq!(
            "snow".parse::<TargetKind>(),
            Err(UnknownTarget("snow".to_string()))
        );
    }

    #[test]
    fn test_only_rain_is_classification() {
        assert!(TargetKind::Rain.is_classification());
        assert!(!TargetKind::TempMax.is_classification());
        assert!(!TargetKind::TempMin.is_classification());
    }
}
