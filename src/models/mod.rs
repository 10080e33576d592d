//! ML model inference components

pub mod aggregator;
pub mod image;
pub mod inference;
pub mod loader;
pub mod text;

pub use aggregator::EnsembleCombiner;
pub use inference::{EnsembleEngine, ImageModel, TextModel};
pub use loader::ModelLoader;
