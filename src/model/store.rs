//! Loading trained predictors from disk.

use crate::model::error::ModelError;
use crate::model::predictor::{LinearModel, Predictor, Predictors};
use crate::types::target::TargetKind;
use log::info;
use std::path::{Path, PathBuf};

/// Source of trained predictors.
pub trait ModelStore {
    fn load(&self, kind: TargetKind) -> Result<Box<dyn Predictor>, ModelError>;

    /// Loads a predictor for every target. Fails on the first target that cannot be loaded,
    /// so a run never starts with a partial set.
    fn load_all(&self) -> Result<Predictors, ModelError> {
        let mut predictors = Predictors::new();
        for kind in TargetKind::ALL {
            predictors.register(kind, self.load(kind)?)?;
        }
        Ok(predictors)
    }
}

/// Reads [`LinearModel`]s stored as `{directory}/{target}.json`.
#[derive(Debug, Clone)]
pub struct JsonModelStore {
    directory: PathBuf,
}

impl JsonModelStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path_for(&self, kind: TargetKind) -> PathBuf {
        self.directory.join(format!("{}.json", kind.name()))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl ModelStore for JsonModelStore {
    fn load(&self, kind: TargetKind) -> Result<Box<dyn Predictor>, ModelError> {
        let path = self.path_for(kind);
        let bytes = std::fs::read(&path).map_err(|e| ModelError::ModelRead(path.clone(), e))?;
        let model: LinearModel =
            serde_json::from_slice(&bytes).map_err(|e| ModelError::ModelDecode(path.clone(), e))?;
        model.validate()?;
        info!(
            "Loaded {} model with {} features from {:?}",
            kind,
            model.features.len(),
            path
        );
        Ok(Box::new(model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::predictor::ModelOutput;

    fn write_model(dir: &Path, model: &LinearModel) {
        let path = dir.join(format!("{}.json", model.target));
        std::fs::write(path, serde_json::to_vec_pretty(model).unwrap()).unwrap();
    }

    fn linear(target: TargetKind) -> LinearModel {
        LinearModel {
            target,
            features: vec!["month".into()],
            intercept: 0.0,
            coefficients: vec![1.0],
            output: if target.is_classification() {
                ModelOutput::Classification { threshold: 0.5 }
            } else {
                ModelOutput::Regression
            },
        }
    }

    #[test]
    fn test_load_all_targets() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        for kind in TargetKind::ALL {
            write_model(dir.path(), &linear(kind));
        }

        let predictors = JsonModelStore::new(dir.path()).load_all()?;
        assert_eq!(predictors.len(), 3);
        assert_eq!(predictors.get(TargetKind::Rain)?.target(), TargetKind::Rain);
        assert_eq!(predictors.get(TargetKind::TempMin)?.feature_names(), ["month"]);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_read_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        write_model(dir.path(), &linear(TargetKind::TempMax));

        let err = JsonModelStore::new(dir.path()).load_all().err();
        assert!(matches!(err, Some(ModelError::ModelRead(path, _)) if path.ends_with("temp_min.json")));
        Ok(())
    }

    #[test]
    fn test_model_file_under_wrong_name_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        for kind in TargetKind::ALL {
            write_model(dir.path(), &linear(kind));
        }
        std::fs::copy(dir.path().join("temp_max.json"), dir.path().join("temp_min.json"))?;

        let err = JsonModelStore::new(dir.path()).load_all().err();
        assert!(matches!(
            err,
            Some(ModelError::TargetMismatch {
                expected: TargetKind::TempMin,
                found: TargetKind::TempMax
            })
        ));
        Ok(())
    }

    #[test]
    fn test_garbage_is_decode_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("rain.json"), b"not json")?;
        let err = JsonModelStore::new(dir.path()).load(TargetKind::Rain).err();
        assert!(matches!(err, Some(ModelError::ModelDecode(..))));
        Ok(())
    }
}
