//! Target-labelled feature tables handed to the external model-fitting procedure.

use crate::features::columns::{is_model_excluded, DATE};
use crate::features::engineer::FeatureEngineer;
use crate::features::error::FeatureError;
use crate::features::row::TargetedRow;
use crate::pipeline::build_training_table;
use crate::types::observation::Observation;
use crate::types::target::TargetKind;
use chrono::NaiveDate;
use log::info;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const TARGET: &str = "target";

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("Failed to create output directory '{0}'")]
    DirCreation(PathBuf, #[source] std::io::Error),

    #[error("Failed to create table file '{0}'")]
    FileCreate(PathBuf, #[source] std::io::Error),

    #[error("Failed to write table '{0}'")]
    TableWrite(PathBuf, #[source] PolarsError),
}

/// Feature rows of one target, oldest first, each with its next-day label.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingTable {
    target: TargetKind,
    rows: Vec<TargetedRow>,
}

impl TrainingTable {
    pub fn new(target: TargetKind, rows: Vec<TargetedRow>) -> Self {
        Self { target, rows }
    }

    /// Computes the table for `target` from a full daily history.
    pub fn build(history: &[Observation], target: TargetKind) -> Result<Self, FeatureError> {
        let rows = build_training_table(history, target)?;
        info!("Built {} training table with {} rows", target, rows.len());
        Ok(Self::new(target, rows))
    }

    pub fn target(&self) -> TargetKind {
        self.target
    }

    pub fn rows(&self) -> &[TargetedRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Splits chronologically: rows dated on or before `cutoff` train, later rows test.
    pub fn split_at(&self, cutoff: NaiveDate) -> (TrainingTable, TrainingTable) {
        let boundary = self.rows.partition_point(|r| r.row.date <= cutoff);
        let (train, test) = self.rows.split_at(boundary);
        (
            Self::new(self.target, train.to_vec()),
            Self::new(self.target, test.to_vec()),
        )
    }

    /// Predictor input columns, in the order every model sees them.
    pub fn model_columns(&self) -> Vec<String> {
        match self.rows.first() {
            Some(first) => first.row.model_input().names().map(str::to_string).collect(),
            None => {
                let mut columns: Vec<String> = FeatureEngineer::default()
                    .feature_columns()
                    .into_iter()
                    .filter(|c| !is_model_excluded(c))
                    .collect();
                columns.sort();
                columns
            }
        }
    }

    /// `date`, then the model input columns, then `target`.
    pub fn to_frame(&self) -> Result<DataFrame, FeatureError> {
        let model_columns = self.model_columns();
        let mut columns = Vec::with_capacity(model_columns.len() + 2);

        let dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.row.date).collect();
        columns.push(Column::new(DATE.into(), dates));
        for name in &model_columns {
            let values: Vec<Option<f64>> = self.rows.iter().map(|r| r.row.get(name)).collect();
            columns.push(Column::new(name.as_str().into(), values));
        }
        let targets: Vec<f64> = self.rows.iter().map(|r| r.target).collect();
        columns.push(Column::new(TARGET.into(), targets));

        Ok(DataFrame::new(columns)?)
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), TrainingError> {
        let path = path.as_ref();
        let mut df = self.to_frame()?;
        let file = File::create(path).map_err(|e| TrainingError::FileCreate(path.to_path_buf(), e))?;
        CsvWriter::new(file)
            .include_header(true)
            .finish(&mut df)
            .map_err(|e| TrainingError::TableWrite(path.to_path_buf(), e))?;
        info!("Wrote {} rows to {:?}", df.height(), path);
        Ok(())
    }

    pub fn write_parquet(&self, path: impl AsRef<Path>) -> Result<(), TrainingError> {
        let path = path.as_ref();
        let mut df = self.to_frame()?;
        let file = File::create(path).map_err(|e| TrainingError::FileCreate(path.to_path_buf(), e))?;
        ParquetWriter::new(file)
            .finish(&mut df)
            .map_err(|e| TrainingError::TableWrite(path.to_path_buf(), e))?;
        info!("Wrote {} rows to {:?}", df.height(), path);
        Ok(())
    }
}
