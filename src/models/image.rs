//! Image classifier backed by an ONNX ResNet-50 export

use crate::models::inference::ImageModel;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::preprocess::ImagePreprocessor;
use crate::types::distribution::ProbabilityVector;
use anyhow::{Context, Result};
use ort::value::Tensor;
use std::path::Path;
use tracing::debug;

/// Skin image classifier: preprocess, run session, softmax.
pub struct ImageClassifier {
    model: LoadedModel,
    preprocessor: ImagePreprocessor,
}

impl ImageClassifier {
    pub fn load<P: AsRef<Path>>(
        loader: &ModelLoader,
        path: P,
        preprocessor: ImagePreprocessor,
    ) -> Result<Self> {
        let model = loader.load_model(path, "image")?;
        Ok(Self {
            model,
            preprocessor,
        })
    }

    /// Raw logits for one prepared image tensor.
    fn run(&mut self, pixels: Vec<f32>) -> Result<Vec<f32>> {
        let input = Tensor::from_array((self.preprocessor.shape().to_vec(), pixels))
            .context("Failed to create image tensor")?;

        let input_name = self.model.primary_input().to_string();
        let outputs = self
            .model
            .session
            .run(ort::inputs![input_name => input])?;

        let (_, logits) = outputs[self.model.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .context("Image model output is not an f32 tensor")?;

        Ok(logits.to_vec())
    }
}

impl ImageModel for ImageClassifier {
    fn classify_image(&mut self, path: &Path) -> Result<ProbabilityVector> {
        let pixels = self.preprocessor.load(path)?;
        let logits = self.run(pixels)?;
        debug!(model = %self.model.name, classes = logits.len(), "Image logits extracted");

        Ok(ProbabilityVector::from_logits(&logits)?)
    }
}
