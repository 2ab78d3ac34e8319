//! Conversions between typed rows and polars frames.

use crate::features::columns::{BaseSeries, DATE};
use crate::features::error::FeatureError;
use crate::features::row::FeatureRow;
use crate::types::observation::{finite, Observation};
use chrono::NaiveDate;
use polars::prelude::*;

/// Days from 0001-01-01 (CE) to 1970-01-01, the origin of polars `Date` values.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(UNIX_EPOCH_DAYS_FROM_CE + days)
}

fn get_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, FeatureError> {
    df.column(name)
        .map_err(|e| FeatureError::ColumnNotFound(name.to_string(), e))
}

/// Builds a frame with a `date` column and one `Float64` column per [`BaseSeries`].
///
/// NaN readings become nulls, so polars treats them exactly like missing values.
pub fn observations_to_frame(observations: &[Observation]) -> Result<DataFrame, FeatureError> {
    let dates: Vec<NaiveDate> = observations.iter().map(|o| o.date).collect();
    let mut columns = Vec::with_capacity(BaseSeries::ALL.len() + 1);
    columns.push(Column::new(DATE.into(), dates));
    for series in BaseSeries::ALL {
        let values: Vec<Option<f64>> = observations
            .iter()
            .map(|o| finite(series.value(o)))
            .collect();
        columns.push(Column::new(series.column().into(), values));
    }
    Ok(DataFrame::new(columns)?)
}

fn dates_of(df: &DataFrame) -> Result<Vec<NaiveDate>, FeatureError> {
    let dates = get_column(df, DATE)?.date()?;
    (0..df.height())
        .map(|row| {
            dates
                .get(row)
                .and_then(date_from_epoch_days)
                .ok_or(FeatureError::NullDate { row })
        })
        .collect()
}

/// Reads `columns` of every row into [`FeatureRow`]s.
///
/// The frame is expected to have passed through `drop_nulls`; a null cell is simply left out
/// of its row.
pub fn rows_from_frame(df: &DataFrame, columns: &[String]) -> Result<Vec<FeatureRow>, FeatureError> {
    let dates = dates_of(df)?;
    let value_columns = columns
        .iter()
        .map(|name| Ok((name.as_str(), get_column(df, name)?.f64()?)))
        .collect::<Result<Vec<_>, FeatureError>>()?;

    Ok(dates
        .into_iter()
        .enumerate()
        .map(|(idx, date)| FeatureRow {
            date,
            values: value_columns
                .iter()
                .filter_map(|(name, ca)| ca.get(idx).map(|v| (name.to_string(), v)))
                .collect(),
        })
        .collect())
}

/// Inverse of [`observations_to_frame`].
pub fn observations_from_frame(df: &DataFrame) -> Result<Vec<Observation>, FeatureError> {
    let dates = dates_of(df)?;
    let precip = get_column(df, BaseSeries::Precipitation.column())?.f64()?;
    let temp_max = get_column(df, BaseSeries::TempMax.column())?.f64()?;
    let temp_min = get_column(df, BaseSeries::TempMin.column())?.f64()?;
    let wind_speed = get_column(df, BaseSeries::WindSpeed.column())?.f64()?;
    let wind_direction = get_column(df, BaseSeries::WindDirection.column())?.f64()?;

    Ok(dates
        .into_iter()
        .enumerate()
        .map(|(idx, date)| Observation {
            date,
            precipitation: precip.get(idx),
            temp_max: temp_max.get(idx),
            temp_min: temp_min.get(idx),
            wind_speed: wind_speed.get(idx),
            wind_direction: wind_direction.get(idx),
        })
        .collect())
}
