pub mod error;
pub mod predictor;
pub mod store;
