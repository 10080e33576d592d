//! Skin Condition Ensemble Diagnosis Library
//!
//! Classifies a skin image and a symptom description with two ONNX models
//! and combines their class distributions with an operator-chosen weight.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod preprocess;
pub mod prompt;
pub mod types;

pub use config::AppConfig;
pub use error::EnsembleError;
pub use models::aggregator::EnsembleCombiner;
pub use models::inference::EnsembleEngine;
pub use prompt::Prompter;
pub use types::{Diagnosis, EnsembleWeight, LabelSet, ProbabilityVector};
