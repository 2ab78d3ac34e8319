//! The two entry points into the feature pipeline: next-day inference over the live history,
//! and target-labelled tables for training.

use crate::error::ForecastError;
use crate::features::engineer::FeatureEngineer;
use crate::features::error::FeatureError;
use crate::features::row::{FeatureRow, TargetedRow};
use crate::features::selector::with_targets;
use crate::model::error::ModelError;
use crate::model::predictor::Predictors;
use crate::types::observation::Observation;
use crate::types::target::TargetKind;
use chrono::NaiveDate;
use log::{debug, info};
use serde::Serialize;

/// The three next-day predictions made from one feature row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecast {
    /// Date of the feature row the forecast was made from.
    pub observed_on: NaiveDate,
    /// The day being forecast, one calendar day after `observed_on`.
    pub forecast_for: NaiveDate,
    pub temp_max: f64,
    pub temp_min: f64,
    pub rain: bool,
}

/// Predicts tomorrow's high, low and rain from the full observation history.
///
/// Features are recomputed from scratch on every call. Either all three predictions succeed
/// or the call fails; a partial forecast is never returned.
///
/// # Errors
///
/// * [`FeatureError::EmptyFeatureSet`] when the history has no complete 31-day stretch ending
///   in a valid row.
/// * [`ModelError::FeatureSchemaMismatch`] when any predictor was trained on other columns.
/// * [`ModelError::MissingPredictor`] or [`ModelError::InvalidClassLabel`].
pub fn run_inference(
    history: &[Observation],
    predictors: &Predictors,
) -> Result<Forecast, ForecastError> {
    let engineer = FeatureEngineer::default();
    let rows = engineer.compute(history)?;
    let row = engineer.latest(&rows)?;
    info!(
        "Forecasting from the feature row for {} ({} valid rows)",
        row.date,
        rows.len()
    );
    forecast_from_row(&row, predictors)
}

/// Applies every predictor to one feature row.
///
/// Each predictor's reported columns are checked against the row before it runs, whatever
/// its implementation.
pub fn forecast_from_row(
    row: &FeatureRow,
    predictors: &Predictors,
) -> Result<Forecast, ForecastError> {
    let input = row.model_input();
    let predict = |kind: TargetKind| -> Result<f64, ModelError> {
        let value = predictors.predict(kind, &input)?;
        debug!("{} prediction: {}", kind, value);
        Ok(value)
    };

    let temp_max = predict(TargetKind::TempMax)?;
    let temp_min = predict(TargetKind::TempMin)?;
    let rain = match predict(TargetKind::Rain)? {
        label if label == 1.0 => true,
        label if label == 0.0 => false,
        value => {
            return Err(ModelError::InvalidClassLabel {
                target: TargetKind::Rain,
                value,
            }
            .into())
        }
    };

    let forecast_for = row
        .date
        .succ_opt()
        .ok_or(ForecastError::DateOutOfRange(row.date))?;
    Ok(Forecast {
        observed_on: row.date,
        forecast_for,
        temp_max,
        temp_min,
        rain,
    })
}

/// Every valid feature row of `history` labelled with the next observation's `kind` value,
/// oldest first.
///
/// The caller owns any chronological split; row order is preserved for it.
pub fn build_training_table(
    history: &[Observation],
    kind: TargetKind,
) -> Result<Vec<TargetedRow>, FeatureError> {
    let rows = FeatureEngineer::default().compute(history)?;
    Ok(with_targets(&rows, history, kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::columns::is_model_excluded;
    use crate::features::row::ModelInput;
    use crate::model::predictor::{LinearModel, ModelOutput, Predictor};
    use chrono::Duration;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn history(days: usize) -> Vec<Observation> {
        (0..days)
            .map(|i| {
                Observation::new(start() + Duration::days(i as i64))
                    .with_precipitation(if i % 4 == 0 { 0.2 } else { 0.0 })
                    .with_temperatures(60.0 + i as f64, 40.0 + i as f64)
                    .with_wind(5.0, 180.0)
            })
            .collect()
    }

    fn model_columns() -> Vec<String> {
        FeatureEngineer::default()
            .feature_columns()
            .into_iter()
            .filter(|c| !is_model_excluded(c))
            .collect()
    }

    fn constant(target: TargetKind, intercept: f64) -> LinearModel {
        let features = model_columns();
        LinearModel {
            target,
            coefficients: vec![0.0; features.len()],
            features,
            intercept,
            output: if target.is_classification() {
                ModelOutput::Classification { threshold: 0.5 }
            } else {
                ModelOutput::Regression
            },
        }
    }

    fn predictors() -> Predictors {
        let mut predictors = Predictors::new();
        for (kind, intercept) in [
            (TargetKind::TempMax, 81.5),
            (TargetKind::TempMin, 58.25),
            (TargetKind::Rain, 4.0),
        ] {
            predictors
                .register(kind, Box::new(constant(kind, intercept)))
                .unwrap();
        }
        predictors
    }

    #[test]
    fn test_forecasts_the_day_after_the_latest_row() -> Result<(), ForecastError> {
        let history = history(45);
        let forecast = run_inference(&history, &predictors())?;

        let last = history.last().unwrap().date;
        assert_eq!(forecast.observed_on, last);
        assert_eq!(forecast.forecast_for, last + Duration::days(1));
        assert_eq!(forecast.temp_max, 81.5);
        assert_eq!(forecast.temp_min, 58.25);
        assert!(forecast.rain);
        Ok(())
    }

    #[test]
    fn test_short_history_is_empty_feature_set() {
        let result = run_inference(&history(30), &predictors());
        assert!(matches!(
            result,
            Err(ForecastError::Feature(FeatureError::EmptyFeatureSet { required: 31 }))
        ));
    }

    #[test]
    fn test_missing_predictor_refuses_the_whole_forecast() {
        let mut partial = Predictors::new();
        partial
            .register(
                TargetKind::TempMax,
                Box::new(constant(TargetKind::TempMax, 70.0)),
            )
            .unwrap();
        let result = run_inference(&history(40), &partial);
        assert!(matches!(
            result,
            Err(ForecastError::Model(ModelError::MissingPredictor(TargetKind::TempMin)))
        ));
    }

    #[test]
    fn test_schema_mismatch_is_fatal() {
        let mut stale = constant(TargetKind::TempMin, 50.0);
        stale.features.push("humidity_lag_1".into());
        stale.coefficients.push(0.0);

        let mut predictors = predictors();
        predictors.register(TargetKind::TempMin, Box::new(stale)).unwrap();
        assert!(matches!(
            run_inference(&history(40), &predictors),
            Err(ForecastError::Model(ModelError::FeatureSchemaMismatch { .. }))
        ));
    }

    /// Returns `value` for every input, reporting `features` as its trained columns.
    struct Fixed {
        target: TargetKind,
        features: Vec<String>,
        value: f64,
    }

    impl Predictor for Fixed {
        fn target(&self) -> TargetKind {
            self.target
        }

        fn feature_names(&self) -> &[String] {
            &self.features
        }

        fn predict(&self, _input: &ModelInput) -> Result<f64, ModelError> {
            Ok(self.value)
        }
    }

    #[test]
    fn test_foreign_predictor_schema_is_checked() {
        let mut predictors = Predictors::new();
        for (target, value) in [
            (TargetKind::TempMax, 70.0),
            (TargetKind::TempMin, 50.0),
            (TargetKind::Rain, 1.0),
        ] {
            let fixed = Fixed {
                target,
                features: vec!["humidity".into()],
                value,
            };
            predictors.register(target, Box::new(fixed)).unwrap();
        }
        assert!(matches!(
            run_inference(&history(40), &predictors),
            Err(ForecastError::Model(ModelError::FeatureSchemaMismatch {
                target: TargetKind::TempMax,
                ..
            }))
        ));
    }

    #[test]
    fn test_rain_must_be_a_class_label() {
        let mut predictors = predictors();
        let probability = Fixed {
            target: TargetKind::Rain,
            features: model_columns(),
            value: 0.7,
        };
        predictors.register(TargetKind::Rain, Box::new(probability)).unwrap();
        assert!(matches!(
            run_inference(&history(40), &predictors),
            Err(ForecastError::Model(ModelError::InvalidClassLabel { value, .. })) if value == 0.7
        ));
    }

    #[test]
    fn test_training_table_drops_the_newest_row() -> Result<(), FeatureError> {
        let history = history(40);
        let table = build_training_table(&history, TargetKind::TempMin)?;

        // 40 days leave 10 feature rows; the newest has no next day.
        assert_eq!(table.len(), 9);
        let first = &table[0];
        assert_eq!(first.row.date, start() + Duration::days(30));
        assert_eq!(first.target, 40.0 + 31.0);
        assert!(table.windows(2).all(|w| w[0].row.date < w[1].row.date));
        Ok(())
    }
}
