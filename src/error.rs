//! Domain error types for ensemble diagnosis

use thiserror::Error;

/// Validation failures in the ensemble domain types.
///
/// I/O and runtime failures are not represented here; those travel as
/// `anyhow::Error` with context attached at the call site.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EnsembleError {
    /// Weight text could not be parsed as a decimal number
    #[error("invalid weight {0:?}: not a decimal number")]
    InvalidWeight(String),

    /// Weight parsed but lies outside the closed unit interval (or is NaN)
    #[error("weight {0} is outside [0.0, 1.0]")]
    WeightOutOfRange(f64),

    /// Distribution with no entries
    #[error("probability vector is empty")]
    EmptyDistribution,

    /// Entries are negative/non-finite or do not sum to one
    #[error("invalid probability vector: {0}")]
    InvalidDistribution(String),

    /// Two distributions that must align positionally have different lengths
    #[error("probability vectors differ in length: image={image}, text={text}")]
    LengthMismatch { image: usize, text: usize },

    /// Model output width does not match the configured label set
    #[error("{model} model produced {outputs} classes but {labels} labels are configured")]
    LabelCount {
        model: String,
        outputs: usize,
        labels: usize,
    },

    /// Label set is empty or contains duplicates
    #[error("invalid label set: {0}")]
    InvalidLabels(String),
}
