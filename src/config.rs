//! Configuration management for ensemble diagnosis

use crate::models::aggregator::DEFAULT_TOP_K;
use crate::types::label::LabelSet;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default config file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "DERM_CONFIG";

/// Report format written to stdout
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Label line followed by the ranked scores
    #[default]
    Text,
    /// Full diagnosis as pretty JSON
    Json,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub preprocess: PreprocessConfig,
    pub ensemble: EnsembleConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// ONNX model configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Image classifier (ResNet-50 export)
    pub image_model: String,
    /// Text classifier (BERT sequence classifier export)
    pub text_model: String,
    /// HuggingFace tokenizer.json matching the text model
    pub tokenizer: String,
    /// Intra-op threads per session (default: 1)
    #[serde(default = "default_onnx_threads")]
    pub onnx_threads: usize,
    /// Register the CUDA execution provider when built with the `cuda` feature
    #[serde(default)]
    pub use_gpu: bool,
}

fn default_onnx_threads() -> usize {
    1
}

/// Input preparation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Square edge the image is resized to
    pub image_size: u32,
    /// Per-channel normalization mean (RGB)
    pub mean: [f32; 3],
    /// Per-channel normalization std (RGB)
    pub std: [f32; 3],
    /// Token sequence length for the text model
    pub max_length: usize,
}

/// Ensemble configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Number of ranked labels to report
    pub top_k: usize,
    /// Class labels in model output order
    pub labels: LabelSet,
}

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from `DERM_CONFIG` or the default path.
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from_path(path)
    }

    /// Layer defaults, an optional TOML file, and `DERM__*` environment variables.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let defaults = Config::try_from(&AppConfig::default())
            .context("Failed to serialize default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::from(path.as_ref()).required(false))
            .add_source(
                Environment::with_prefix("DERM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.ensemble.top_k == 0 {
            anyhow::bail!("ensemble.top_k must be at least 1");
        }
        if self.preprocess.image_size == 0 {
            anyhow::bail!("preprocess.image_size must be positive");
        }
        if self.preprocess.max_length < 2 {
            anyhow::bail!("preprocess.max_length must leave room for [CLS] and [SEP]");
        }
        if self.preprocess.std.iter().any(|&s| s <= 0.0) {
            anyhow::bail!("preprocess.std entries must be positive");
        }
        Ok(())
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            image_size: 224,
            mean: [0.485, 0.456, 0.406],
            std: [0.229, 0.224, 0.225],
            max_length: 64,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            models: ModelsConfig {
                image_model: "image_model.onnx".to_string(),
                text_model: "text_model.onnx".to_string(),
                tokenizer: "tokenizer.json".to_string(),
                onnx_threads: 1,
                use_gpu: false,
            },
            preprocess: PreprocessConfig::default(),
            ensemble: EnsembleConfig {
                top_k: DEFAULT_TOP_K,
                labels: LabelSet::default(),
            },
            output: OutputConfig {
                format: OutputFormat::Text,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
