pub mod compass;
pub mod observation;
pub mod target;
