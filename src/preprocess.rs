//! Input preparation for classifier inference.
//!
//! Converts an image file and a symptom description into the tensors the
//! exported models were trained on. Layouts and constants must match the
//! training-time transforms exactly.

use crate::config::PreprocessConfig;
use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::RgbImage;
use std::path::Path;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

/// Resizes and normalizes RGB images into an NCHW f32 tensor.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Output edge length (square)
    size: u32,
    /// Per-channel mean, RGB order
    mean: [f32; 3],
    /// Per-channel std, RGB order
    std: [f32; 3],
}

impl ImagePreprocessor {
    pub fn new(size: u32, mean: [f32; 3], std: [f32; 3]) -> Self {
        Self { size, mean, std }
    }

    pub fn from_config(config: &PreprocessConfig) -> Self {
        Self::new(config.image_size, config.mean, config.std)
    }

    /// Tensor shape produced by `prepare`: `[1, 3, size, size]`.
    pub fn shape(&self) -> [i64; 4] {
        let s = self.size as i64;
        [1, 3, s, s]
    }

    /// Decode an image file and prepare it.
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Vec<f32>> {
        let path = path.as_ref();
        let img = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        Ok(self.prepare(&img.to_rgb8()))
    }

    /// Resize to `size x size`, scale to [0, 1], normalize, lay out channel-major.
    pub fn prepare(&self, rgb: &RgbImage) -> Vec<f32> {
        let resized = image::imageops::resize(rgb, self.size, self.size, FilterType::Triangle);
        let plane = (self.size * self.size) as usize;
        let mut tensor = vec![0.0_f32; 3 * plane];

        for (i, pixel) in resized.pixels().enumerate() {
            for c in 0..3 {
                let v = pixel[c] as f32 / 255.0;
                tensor[c * plane + i] = (v - self.mean[c]) / self.std[c];
            }
        }

        tensor
    }
}

impl Default for ImagePreprocessor {
    fn default() -> Self {
        Self::from_config(&PreprocessConfig::default())
    }
}

/// Model inputs for one encoded description.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedText {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl EncodedText {
    /// Widen tokenizer ids to the i64 inputs BERT exports expect.
    pub fn from_ids(ids: &[u32], mask: &[u32], type_ids: &[u32]) -> Self {
        let widen = |v: &[u32]| v.iter().map(|&x| x as i64).collect::<Vec<i64>>();
        Self {
            input_ids: widen(ids),
            attention_mask: widen(mask),
            token_type_ids: widen(type_ids),
        }
    }

    /// Sequence length (all three inputs share it).
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }

    /// Number of real (non-padding) tokens.
    pub fn token_count(&self) -> usize {
        self.attention_mask.iter().filter(|&&m| m != 0).count()
    }
}

/// WordPiece encoder padding and truncating to a fixed length.
pub struct TextEncoder {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl TextEncoder {
    /// Load a HuggingFace `tokenizer.json` and fix its sequence length.
    pub fn from_file<P: AsRef<Path>>(path: P, max_length: usize) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = Tokenizer::from_file(path)
            .map_err(|e| anyhow!("Failed to load tokenizer from {}: {}", path.display(), e))?;
        Self::with_tokenizer(tokenizer, max_length)
    }

    pub fn with_tokenizer(mut tokenizer: Tokenizer, max_length: usize) -> Result<Self> {
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::Fixed(max_length),
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                ..Default::default()
            }))
            .map_err(|e| anyhow!("Invalid truncation settings: {}", e))?;

        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Encode with special tokens, padded to exactly `max_length`.
    pub fn encode(&self, text: &str) -> Result<EncodedText> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow!("Tokenization failed: {}", e))?;

        Ok(EncodedText::from_ids(
            encoding.get_ids(),
            encoding.get_attention_mask(),
            encoding.get_type_ids(),
        ))
    }
}
