//! ONNX model loader

use anyhow::{Context, Result};
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;
use tracing::info;

/// Loaded ONNX model with metadata
pub struct LoadedModel {
    /// Model name
    pub name: String,
    /// ONNX Runtime session
    pub session: Session,
    /// Input names declared by the graph, in order
    pub input_names: Vec<String>,
    /// Output name for class logits
    pub output_name: String,
}

impl LoadedModel {
    /// Whether the graph declares an input with this name.
    pub fn has_input(&self, name: &str) -> bool {
        self.input_names.iter().any(|n| n == name)
    }

    /// First declared input, for single-input graphs.
    pub fn primary_input(&self) -> &str {
        self.input_names
            .first()
            .map(String::as_str)
            .unwrap_or("input")
    }
}

/// Loader for ONNX models
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    /// Register the CUDA execution provider (needs the `cuda` feature)
    use_gpu: bool,
}

impl ModelLoader {
    /// Create a new model loader with specified number of threads
    pub fn with_threads(onnx_threads: usize, use_gpu: bool) -> Result<Self> {
        ort::init().commit()?;
        if use_gpu && !cfg!(feature = "cuda") {
            tracing::warn!("GPU requested but built without the `cuda` feature, using CPU");
        }
        info!(onnx_threads, use_gpu, "ONNX Runtime initialized");
        Ok(Self {
            onnx_threads,
            use_gpu,
        })
    }

    /// Load a single ONNX model from file
    pub fn load_model<P: AsRef<Path>>(&self, path: P, name: &str) -> Result<LoadedModel> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = self.onnx_threads, "Loading ONNX model");

        if !path.exists() {
            anyhow::bail!("{} model file not found: {}", name, path.display());
        }

        #[allow(unused_mut)]
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(self.onnx_threads)?;

        #[cfg(feature = "cuda")]
        if self.use_gpu {
            // ORT falls back to CPU when CUDA cannot be initialized
            builder = builder.with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build(),
            ])?;
        }

        let session = builder
            .commit_from_file(path)
            .with_context(|| format!("Failed to load model from {:?}", path))?;

        let input_names: Vec<String> = session.inputs.iter().map(|i| i.name.clone()).collect();

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("logits") || o.name.contains("output"))
            .map(|o| o.name.clone())
            .unwrap_or_else(|| {
                session
                    .outputs
                    .first()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "logits".to_string())
            });

        info!(
            model = %name,
            inputs = ?input_names,
            output = %output_name,
            "Model loaded successfully"
        );

        Ok(LoadedModel {
            name: name.to_string(),
            session,
            input_names,
            output_name,
        })
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self {
            onnx_threads: 1,
            use_gpu: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let loader = ModelLoader::default();
        let err = loader
            .load_model("/nonexistent/image_model.onnx", "image")
            .err()
            .unwrap();
        assert!(err.to_string().contains("not found"));
    }
}
