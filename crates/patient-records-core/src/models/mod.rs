//! Domain models for patient records.

mod patient;
mod validation;
mod vitals;

pub use patient::*;
pub use validation::*;
pub use vitals::*;
