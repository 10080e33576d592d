//! Text classifier backed by an ONNX BERT sequence-classification export

use crate::models::inference::TextModel;
use crate::models::loader::{LoadedModel, ModelLoader};
use crate::preprocess::{EncodedText, TextEncoder};
use crate::types::distribution::ProbabilityVector;
use anyhow::{Context, Result};
use ort::value::{DynValue, Tensor};
use std::path::Path;
use tracing::debug;

const INPUT_IDS: &str = "input_ids";
const ATTENTION_MASK: &str = "attention_mask";
const TOKEN_TYPE_IDS: &str = "token_type_ids";

/// Symptom description classifier: tokenize, run session, softmax.
pub struct TextClassifier {
    model: LoadedModel,
    encoder: TextEncoder,
}

impl TextClassifier {
    pub fn load<P: AsRef<Path>>(loader: &ModelLoader, path: P, encoder: TextEncoder) -> Result<Self> {
        let model = loader.load_model(path, "text")?;

        for required in [INPUT_IDS, ATTENTION_MASK] {
            if !model.has_input(required) {
                anyhow::bail!(
                    "Text model is missing input {:?} (declares {:?})",
                    required,
                    model.input_names
                );
            }
        }

        Ok(Self { model, encoder })
    }

    /// Raw logits for one encoded description.
    fn run(&mut self, encoded: EncodedText) -> Result<Vec<f32>> {
        let shape = vec![1_i64, encoded.len() as i64];
        let tensor = |data: Vec<i64>| -> Result<DynValue> {
            Ok(Tensor::from_array((shape.clone(), data))
                .context("Failed to create text tensor")?
                .into_dyn())
        };

        let mut inputs: Vec<(String, DynValue)> = vec![
            (INPUT_IDS.to_string(), tensor(encoded.input_ids)?),
            (ATTENTION_MASK.to_string(), tensor(encoded.attention_mask)?),
        ];
        // Some exports fold token types away; only feed them when declared
        if self.model.has_input(TOKEN_TYPE_IDS) {
            inputs.push((TOKEN_TYPE_IDS.to_string(), tensor(encoded.token_type_ids)?));
        }

        let outputs = self.model.session.run(inputs)?;

        let (_, logits) = outputs[self.model.output_name.as_str()]
            .try_extract_tensor::<f32>()
            .context("Text model output is not an f32 tensor")?;

        Ok(logits.to_vec())
    }
}

impl TextModel for TextClassifier {
    fn classify_text(&mut self, text: &str) -> Result<ProbabilityVector> {
        let encoded = self.encoder.encode(text)?;
        debug!(
            tokens = encoded.token_count(),
            max_length = self.encoder.max_length(),
            "Description encoded"
        );

        let logits = self.run(encoded)?;
        debug!(model = %self.model.name, classes = logits.len(), "Text logits extracted");

        Ok(ProbabilityVector::from_logits(&logits)?)
    }
}
