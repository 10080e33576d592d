//! Two-model ensemble inference engine

use crate::config::AppConfig;
use crate::metrics::RunMetrics;
use crate::models::aggregator::EnsembleCombiner;
use crate::models::image::ImageClassifier;
use crate::models::loader::ModelLoader;
use crate::models::text::TextClassifier;
use crate::preprocess::{ImagePreprocessor, TextEncoder};
use crate::types::diagnosis::Diagnosis;
use crate::types::distribution::{EnsembleWeight, ProbabilityVector};
use crate::types::label::LabelSet;
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Produces a class distribution for an image file.
pub trait ImageModel {
    fn classify_image(&mut self, path: &Path) -> Result<ProbabilityVector>;
}

/// Produces a class distribution for a free-text description.
pub trait TextModel {
    fn classify_text(&mut self, text: &str) -> Result<ProbabilityVector>;
}

/// Owns both classifiers and combines their outputs.
pub struct EnsembleEngine<I = ImageClassifier, T = TextClassifier> {
    image_model: I,
    text_model: T,
    combiner: EnsembleCombiner,
    labels: LabelSet,
    metrics: RunMetrics,
}

impl EnsembleEngine<ImageClassifier, TextClassifier> {
    /// Load both ONNX models and the tokenizer from configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.models.onnx_threads, config.models.use_gpu)?;
        let mut metrics = RunMetrics::new();

        let start = Instant::now();
        let image_model = ImageClassifier::load(
            &loader,
            &config.models.image_model,
            ImagePreprocessor::from_config(&config.preprocess),
        )
        .context("Failed to load image classifier")?;
        metrics.record_load("image", start.elapsed());

        let start = Instant::now();
        let encoder = TextEncoder::from_file(&config.models.tokenizer, config.preprocess.max_length)?;
        let text_model = TextClassifier::load(&loader, &config.models.text_model, encoder)
            .context("Failed to load text classifier")?;
        metrics.record_load("text", start.elapsed());

        info!(
            labels = config.ensemble.labels.len(),
            top_k = config.ensemble.top_k,
            "Ensemble engine initialized"
        );

        let mut engine = Self::with_models(
            image_model,
            text_model,
            EnsembleCombiner::new(config.ensemble.top_k),
            config.ensemble.labels.clone(),
        );
        engine.metrics = metrics;
        Ok(engine)
    }
}

impl<I: ImageModel, T: TextModel> EnsembleEngine<I, T> {
    /// Assemble an engine from already-constructed classifiers
    pub fn with_models(
        image_model: I,
        text_model: T,
        combiner: EnsembleCombiner,
        labels: LabelSet,
    ) -> Self {
        Self {
            image_model,
            text_model,
            combiner,
            labels,
            metrics: RunMetrics::new(),
        }
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn metrics(&self) -> &RunMetrics {
        &self.metrics
    }

    /// Classify the image and description, then combine with `weight`.
    pub fn diagnose(
        &mut self,
        image_path: &Path,
        description: &str,
        weight: EnsembleWeight,
    ) -> Result<Diagnosis> {
        let image_probs = {
            let model = &mut self.image_model;
            self.metrics
                .time_inference("image", || model.classify_image(image_path))
                .with_context(|| format!("Image inference failed for {}", image_path.display()))?
        };
        EnsembleCombiner::check_labels("image", &image_probs, &self.labels)?;

        let text_probs = {
            let model = &mut self.text_model;
            self.metrics
                .time_inference("text", || model.classify_text(description))
                .context("Text inference failed")?
        };
        EnsembleCombiner::check_labels("text", &text_probs, &self.labels)?;

        let agreement = EnsembleCombiner::agreement(&image_probs, &text_probs);
        self.metrics.record_agreement(agreement);

        let prediction =
            self.combiner
                .ensemble_predict(&image_probs, &text_probs, weight, &self.labels)?;

        let models_agree =
            EnsembleCombiner::argmax(&image_probs) == EnsembleCombiner::argmax(&text_probs);

        debug!(
            image_weight = weight.image(),
            label = %prediction.label,
            agreement,
            models_agree,
            "Ensemble inference complete"
        );

        Ok(Diagnosis {
            diagnosis_id: uuid::Uuid::new_v4().to_string(),
            label: prediction.label,
            index: prediction.index,
            image_weight: weight,
            top_k: prediction.ranked,
            final_distribution: prediction.distribution,
            image_distribution: image_probs,
            text_distribution: text_probs,
            models_agree,
            timestamp: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EnsembleError;

    struct FixedImage(Vec<f64>);
    struct FixedText(Vec<f64>);
    struct FailingImage;

    impl ImageModel for FixedImage {
        fn classify_image(&mut self, _path: &Path) -> Result<ProbabilityVector> {
            Ok(ProbabilityVector::new(self.0.clone())?)
        }
    }

    impl TextModel for FixedText {
        fn classify_text(&mut self, text: &str) -> Result<ProbabilityVector> {
            assert!(!text.is_empty());
            Ok(ProbabilityVector::new(self.0.clone())?)
        }
    }

    impl ImageModel for FailingImage {
        fn classify_image(&mut self, path: &Path) -> Result<ProbabilityVector> {
            anyhow::bail!("cannot decode {}", path.display())
        }
    }

    fn labels() -> LabelSet {
        LabelSet::new(vec![
            "Acne".to_string(),
            "Eczema".to_string(),
            "Psoriasis".to_string(),
        ])
        .unwrap()
    }

    #[test]
    fn test_diagnose() {
        let mut engine = EnsembleEngine::with_models(
            FixedImage(vec![0.9, 0.05, 0.05]),
            FixedText(vec![0.0, 0.0, 1.0]),
            EnsembleCombiner::default(),
            labels(),
        );

        let diagnosis = engine
            .diagnose(
                Path::new("lesion.jpg"),
                "itchy red patches",
                EnsembleWeight::new(0.8).unwrap(),
            )
            .unwrap();

        assert_eq!(diagnosis.label, "Acne");
        assert_eq!(diagnosis.index, 0);
        let order: Vec<&str> = diagnosis.top_k.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(order, vec!["Acne", "Psoriasis", "Eczema"]);
        assert!(!diagnosis.models_agree);
        assert!((diagnosis.final_distribution.sum() - 1.0).abs() < 1e-9);

        assert!(engine.metrics().inference_time("image").is_some());
        assert!(engine.metrics().inference_time("text").is_some());
        assert!((engine.metrics().agreement().unwrap() - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_text_only_weight() {
        let mut engine = EnsembleEngine::with_models(
            FixedImage(vec![0.9, 0.05, 0.05]),
            FixedText(vec![0.1, 0.7, 0.2]),
            EnsembleCombiner::default(),
            labels(),
        );

        let diagnosis = engine
            .diagnose(Path::new("x.png"), "dry scaly skin", EnsembleWeight::TEXT_ONLY)
            .unwrap();

        assert_eq!(diagnosis.label, "Eczema");
        assert_eq!(diagnosis.final_distribution, diagnosis.text_distribution);
    }

    #[test]
    fn test_label_count_mismatch() {
        let mut engine = EnsembleEngine::with_models(
            FixedImage(vec![0.5, 0.5]),
            FixedText(vec![0.2, 0.3, 0.5]),
            EnsembleCombiner::default(),
            labels(),
        );

        let err = engine
            .diagnose(Path::new("x.png"), "rash", EnsembleWeight::EQUAL)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<EnsembleError>(),
            Some(EnsembleError::LabelCount { outputs: 2, labels: 3, .. })
        ));
    }

    #[test]
    fn test_image_failure_propagates() {
        let mut engine = EnsembleEngine::with_models(
            FailingImage,
            FixedText(vec![0.2, 0.3, 0.5]),
            EnsembleCombiner::default(),
            labels(),
        );

        let err = engine
            .diagnose(Path::new("broken.jpg"), "rash", EnsembleWeight::EQUAL)
            .unwrap_err();

        assert!(err.to_string().contains("Image inference failed"));
    }
}
