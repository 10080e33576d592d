//! Score aggregation for the image/text ensemble

use crate::error::EnsembleError;
use crate::types::diagnosis::RankedScore;
use crate::types::distribution::{EnsembleWeight, ProbabilityVector};
use crate::types::label::LabelSet;
use std::cmp::Ordering;

/// Default number of ranked entries reported.
pub const DEFAULT_TOP_K: usize = 3;

/// Outcome of `EnsembleCombiner::ensemble_predict`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsemblePrediction {
    /// Index of the predicted label
    pub index: usize,
    /// Predicted label
    pub label: String,
    /// Top-K ranking of the combined distribution
    pub ranked: Vec<RankedScore>,
    /// Combined distribution
    pub distribution: ProbabilityVector,
}

/// Combines two aligned class distributions with a linear weight.
#[derive(Debug, Clone)]
pub struct EnsembleCombiner {
    /// Number of ranked entries to produce
    top_k: usize,
}

impl EnsembleCombiner {
    pub fn new(top_k: usize) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Weighted elementwise sum: `w * image[i] + (1 - w) * text[i]`.
    pub fn combine(
        &self,
        image: &ProbabilityVector,
        text: &ProbabilityVector,
        weight: EnsembleWeight,
    ) -> Result<ProbabilityVector, EnsembleError> {
        if image.len() != text.len() {
            return Err(EnsembleError::LengthMismatch {
                image: image.len(),
                text: text.len(),
            });
        }

        let (w_img, w_txt) = (weight.image(), weight.text());
        let combined = image
            .as_slice()
            .iter()
            .zip(text.as_slice())
            .map(|(&i, &t)| w_img * i + w_txt * t)
            .collect();

        // Convex combination of two distributions is a distribution
        Ok(ProbabilityVector::from_trusted(combined))
    }

    /// Index of the highest score; ties go to the lowest index.
    pub fn argmax(distribution: &ProbabilityVector) -> usize {
        let mut best = 0;
        for (i, &p) in distribution.as_slice().iter().enumerate() {
            if p > distribution.as_slice()[best] {
                best = i;
            }
        }
        best
    }

    /// Indices of the `k` highest scores, descending; ties go to the lowest index.
    pub fn top_k_indices(distribution: &ProbabilityVector, k: usize) -> Vec<usize> {
        let scores = distribution.as_slice();
        let mut indices: Vec<usize> = (0..scores.len()).collect();
        // Stable sort keeps ascending index order among equal scores
        indices.sort_by(|&a, &b| scores[b].partial_cmp(&scores[a]).unwrap_or(Ordering::Equal));
        indices.truncate(k);
        indices
    }

    /// Ranked `(label, score)` entries for the top `k` classes.
    pub fn rank(
        &self,
        distribution: &ProbabilityVector,
        labels: &LabelSet,
    ) -> Result<Vec<RankedScore>, EnsembleError> {
        Self::check_labels("ensemble", distribution, labels)?;

        Ok(Self::top_k_indices(distribution, self.top_k)
            .into_iter()
            .map(|index| RankedScore {
                index,
                label: labels.get(index).unwrap_or_default().to_string(),
                score: distribution.as_slice()[index],
            })
            .collect())
    }

    /// Combine both distributions and pick the label and top-K ranking.
    pub fn ensemble_predict(
        &self,
        image: &ProbabilityVector,
        text: &ProbabilityVector,
        weight: EnsembleWeight,
        labels: &LabelSet,
    ) -> Result<EnsemblePrediction, EnsembleError> {
        let distribution = self.combine(image, text, weight)?;
        let ranked = self.rank(&distribution, labels)?;
        let index = Self::argmax(&distribution);
        let label = labels.get(index).unwrap_or_default().to_string();

        Ok(EnsemblePrediction {
            index,
            label,
            ranked,
            distribution,
        })
    }

    /// Fail unless the distribution has exactly one entry per label.
    pub fn check_labels(
        model: &str,
        distribution: &ProbabilityVector,
        labels: &LabelSet,
    ) -> Result<(), EnsembleError> {
        if distribution.len() != labels.len() {
            return Err(EnsembleError::LabelCount {
                model: model.to_string(),
                outputs: distribution.len(),
                labels: labels.len(),
            });
        }
        Ok(())
    }

    /// One minus total variation distance between two distributions, in `[0, 1]`.
    pub fn agreement(image: &ProbabilityVector, text: &ProbabilityVector) -> f64 {
        let tv: f64 = image
            .as_slice()
            .iter()
            .zip(text.as_slice())
            .map(|(a, b)| (a - b).abs())
            .sum::<f64>()
            / 2.0;
        (1.0 - tv).clamp(0.0, 1.0)
    }
}

impl Default for EnsembleCombiner {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}
