//! The append-only daily observation history.

use crate::observations::error::ObservationError;
use crate::types::observation::Observation;
use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Ordered storage for daily observations. Observations are only ever appended.
pub trait ObservationStore {
    /// Every stored observation, oldest first.
    fn read_all(&self) -> Result<Vec<Observation>, ObservationError>;

    /// Appends one observation. Its date must be after every stored date.
    fn append(&self, observation: &Observation) -> Result<(), ObservationError>;
}

/// One CSV line: `timestamp,precip,temp_max,temp_min,wind_speed,wind_direction`.
#[derive(Debug, Serialize, Deserialize)]
struct HistoryRecord {
    timestamp: NaiveDate,
    precip: Option<f64>,
    temp_max: Option<f64>,
    temp_min: Option<f64>,
    wind_speed: Option<f64>,
    wind_direction: Option<f64>,
}

impl From<&Observation> for HistoryRecord {
    fn from(obs: &Observation) -> Self {
        Self {
            timestamp: obs.date,
            precip: obs.precipitation,
            temp_max: obs.temp_max,
            temp_min: obs.temp_min,
            wind_speed: obs.wind_speed,
            wind_direction: obs.wind_direction,
        }
    }
}

impl From<HistoryRecord> for Observation {
    fn from(record: HistoryRecord) -> Self {
        Observation {
            date: record.timestamp,
            precipitation: record.precip,
            temp_max: record.temp_max,
            temp_min: record.temp_min,
            wind_speed: record.wind_speed,
            wind_direction: record.wind_direction,
        }
    }
}

/// Observation history kept in a single CSV file with a header row.
///
/// Missing readings are empty fields. The file is created, header included, by the first
/// [`append`](ObservationStore::append); reading a file that does not exist yet returns an
/// empty history.
#[derive(Debug, Clone)]
pub struct CsvObservationStore {
    path: PathBuf,
}

impl CsvObservationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ObservationStore for CsvObservationStore {
    fn read_all(&self) -> Result<Vec<Observation>, ObservationError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No observation history at {:?} yet", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(ObservationError::FileOpen(self.path.clone(), e)),
        };

        let observations = csv::Reader::from_reader(file)
            .deserialize::<HistoryRecord>()
            .map(|record| {
                record
                    .map(Observation::from)
                    .map_err(|e| ObservationError::CsvRead(self.path.clone(), e))
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Read {} observations from {:?}", observations.len(), self.path);
        Ok(observations)
    }

    fn append(&self, observation: &Observation) -> Result<(), ObservationError> {
        let existing = self.read_all()?;
        if let Some(last) = existing.last() {
            if observation.date <= last.date {
                return Err(ObservationError::NonIncreasingDate {
                    last: last.date,
                    new: observation.date,
                });
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| ObservationError::FileOpen(self.path.clone(), e))?;
        let needs_header = file
            .metadata()
            .map_err(|e| ObservationError::FileOpen(self.path.clone(), e))?
            .len()
            == 0;
        if !needs_header {
            terminate_last_line(&mut file)
                .map_err(|e| ObservationError::CsvWrite(self.path.clone(), e.into()))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer
            .serialize(HistoryRecord::from(observation))
            .map_err(|e| ObservationError::CsvWrite(self.path.clone(), e))?;
        writer
            .flush()
            .map_err(|e| ObservationError::CsvWrite(self.path.clone(), e.into()))?;

        info!("Appended observation for {} to {:?}", observation.date, self.path);
        Ok(())
    }
}

/// Appends a newline if the file's last byte is not one, so the next record starts on its
/// own line.
fn terminate_last_line(file: &mut File) -> std::io::Result<()> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    if last[0] != b'\n' {
        debug!("History file lacks a final newline, adding one");
        file.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(n: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 1).unwrap() + Duration::days(n)
    }

    #[test]
    fn test_append_then_read_round_trip() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = CsvObservationStore::new(dir.path().join("historical_data.csv"));
        assert!(store.read_all()?.is_empty());

        let complete = Observation::new(day(0))
            .with_precipitation(0.3)
            .with_temperatures(78.1, 61.0)
            .with_wind(7.5, 225.0);
        let calm = Observation {
            wind_direction: None,
            ..Observation::new(day(1)).with_temperatures(80.0, 63.5)
        };
        store.append(&complete)?;
        store.append(&calm)?;

        let contents = std::fs::read_to_string(store.path())?;
        let mut lines = contents.lines();
        assert_eq!(
            lines.next(),
            Some("timestamp,precip,temp_max,temp_min,wind_speed,wind_direction")
        );
        assert_eq!(lines.next(), Some("2024-09-01,0.3,78.1,61.0,7.5,225.0"));
        assert_eq!(lines.next(), Some("2024-09-02,,80.0,63.5,,"));
        assert_eq!(lines.next(), None);

        assert_eq!(store.read_all()?, vec![complete, calm]);
        Ok(())
    }

    #[test]
    fn test_rejects_non_increasing_dates() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let store = CsvObservationStore::new(dir.path().join("history.csv"));
        store.append(&Observation::new(day(5)))?;

        let result = store.append(&Observation::new(day(5)));
        assert!(matches!(
            result,
            Err(ObservationError::NonIncreasingDate { last, new }) if last == day(5) && new == day(5)
        ));
        assert!(store.append(&Observation::new(day(4))).is_err());
        assert_eq!(store.read_all()?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_append_after_unterminated_last_line() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("history.csv");
        std::fs::write(
            &path,
            "timestamp,precip,temp_max,temp_min,wind_speed,wind_direction\n2024-01-01,0,35,20,3,45",
        )?;
        let store = CsvObservationStore::new(&path);
        let next = Observation::new(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap()).with_precipitation(1.0);
        store.append(&next)?;

        let contents = std::fs::read_to_string(&path)?;
        assert!(contents.ends_with("2024-01-01,0,35,20,3,45\n2024-01-02,1.0,,,,\n"));
        let history = store.read_all()?;
        assert_eq!(history.len(), 2);
        assert_eq!(history[1], next);
        Ok(())
    }

    #[test]
    fn test_reads_hand_written_history() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("history.csv");
        std::fs::write(
            &path,
            "timestamp,precip,temp_max,temp_min,wind_speed,wind_direction\n2024-01-01,0,35,20,3,45\n",
        )?;
        let history = CsvObservationStore::new(&path).read_all()?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].wind_direction, Some(45.0));
        assert_eq!(history[0].temp_max, Some(35.0));
        Ok(())
    }
}
