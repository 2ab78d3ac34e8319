//! Feature engineering shared by the training and inference drivers.
//!
//! Both drivers go through [`engineer::FeatureEngineer`] and [`row::ModelInput`]; there is no
//! second copy of the feature definitions anywhere in the crate.

pub mod columns;
pub mod engineer;
pub mod error;
pub mod frame;
pub mod imputation;
pub mod row;
pub mod selector;
