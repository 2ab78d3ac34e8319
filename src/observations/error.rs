use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservationError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Token exchange with {url} was refused with status {status}")]
    TokenExchange {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Failed to decode response from {0}")]
    ResponseDecode(String, #[source] reqwest::Error),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Failed to open observation file '{0}'")]
    FileOpen(PathBuf, #[source] std::io::Error),

    #[error("Failed to read observation CSV '{0}'")]
    CsvRead(PathBuf, #[source] csv::Error),

    #[error("Failed to write observation CSV '{0}'")]
    CsvWrite(PathBuf, #[source] csv::Error),

    #[error("Column '{column}' not found in '{path}'")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("Invalid date '{value}' on line {line} of '{path}'")]
    InvalidDate {
        path: PathBuf,
        line: u64,
        value: String,
    },

    #[error("Observation for {new} is not after the last stored date {last}")]
    NonIncreasingDate { last: NaiveDate, new: NaiveDate },
}
