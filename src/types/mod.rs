//! Type definitions for ensemble diagnosis

pub mod diagnosis;
pub mod distribution;
pub mod label;

pub use diagnosis::{Diagnosis, RankedScore};
pub use distribution::{EnsembleWeight, ProbabilityVector};
pub use label::LabelSet;
