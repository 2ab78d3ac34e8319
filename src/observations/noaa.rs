//! Reader for NOAA GHCN daily summary exports, the training history.

use crate::observations::error::ObservationError;
use crate::types::observation::{finite, Observation};
use chrono::NaiveDate;
use csv::StringRecord;
use log::info;
use std::fs::File;
use std::path::Path;

const DATE: &str = "DATE";
const PRECIPITATION: &str = "PRCP";
const TEMP_MAX: &str = "TMAX";
const TEMP_MIN: &str = "TMIN";
const WIND_SPEED: &str = "AWND";
const WIND_DIRECTION: &str = "WDF2";

struct ColumnIndex {
    date: usize,
    precipitation: usize,
    temp_max: usize,
    temp_min: usize,
    wind_speed: usize,
    wind_direction: usize,
}

impl ColumnIndex {
    fn from_headers(path: &Path, headers: &StringRecord) -> Result<Self, ObservationError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|h| h.trim() == column)
                .ok_or_else(|| ObservationError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })
        };
        Ok(Self {
            date: find(DATE)?,
            precipitation: find(PRECIPITATION)?,
            temp_max: find(TEMP_MAX)?,
            temp_min: find(TEMP_MIN)?,
            wind_speed: find(WIND_SPEED)?,
            wind_direction: find(WIND_DIRECTION)?,
        })
    }
}

fn reading(record: &StringRecord, index: usize) -> Option<f64> {
    finite(record.get(index)?.trim().parse::<f64>().ok())
}

/// Reads the `DATE, PRCP, TMAX, TMIN, AWND, WDF2` columns of a GHCN daily CSV.
///
/// Other columns are ignored. Blank cells become missing readings; the rows keep file order.
pub fn read_ghcn_daily(path: impl AsRef<Path>) -> Result<Vec<Observation>, ObservationError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ObservationError::FileOpen(path.to_path_buf(), e))?;
    let mut reader = csv::Reader::from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| ObservationError::CsvRead(path.to_path_buf(), e))?
        .clone();
    let columns = ColumnIndex::from_headers(path, &headers)?;

    let mut observations = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ObservationError::CsvRead(path.to_path_buf(), e))?;
        let raw_date = record.get(columns.date).unwrap_or_default().trim();
        let date = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|_| {
            ObservationError::InvalidDate {
                path: path.to_path_buf(),
                line: record.position().map(|p| p.line()).unwrap_or_default(),
                value: raw_date.to_string(),
            }
        })?;

        observations.push(Observation {
            date,
            precipitation: reading(&record, columns.precipitation),
            temp_max: reading(&record, columns.temp_max),
            temp_min: reading(&record, columns.temp_min),
            wind_speed: reading(&record, columns.wind_speed),
            wind_direction: reading(&record, columns.wind_direction),
        });
    }

    info!("Read {} daily records from {:?}", observations.len(), path);
    Ok(observations)
}
