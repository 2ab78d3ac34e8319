pub mod error;
pub mod noaa;
pub mod source;
pub mod store;
