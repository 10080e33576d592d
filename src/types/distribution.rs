//! Categorical distributions and the ensemble weight

use crate::error::EnsembleError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Allowed deviation of a distribution's sum from 1.0.
pub const SUM_TOLERANCE: f64 = 1e-4;

/// Ordered class probabilities, aligned positionally to a `LabelSet`.
///
/// Entries are finite, non-negative and sum to 1 within `SUM_TOLERANCE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProbabilityVector(Vec<f64>);

impl ProbabilityVector {
    /// Validate and wrap a probability vector.
    pub fn new(probs: Vec<f64>) -> Result<Self, EnsembleError> {
        if probs.is_empty() {
            return Err(EnsembleError::EmptyDistribution);
        }

        if let Some((i, p)) = probs
            .iter()
            .enumerate()
            .find(|(_, p)| !p.is_finite() || **p < 0.0)
        {
            return Err(EnsembleError::InvalidDistribution(format!(
                "entry {} is {}",
                i, p
            )));
        }

        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(EnsembleError::InvalidDistribution(format!(
                "entries sum to {:.6}",
                sum
            )));
        }

        Ok(Self(probs))
    }

    /// Softmax over raw model logits.
    pub fn from_logits(logits: &[f32]) -> Result<Self, EnsembleError> {
        if logits.is_empty() {
            return Err(EnsembleError::EmptyDistribution);
        }
        if logits.iter().any(|l| !l.is_finite()) {
            return Err(EnsembleError::InvalidDistribution(
                "non-finite logit".to_string(),
            ));
        }

        // Shift by the max so exp() cannot overflow
        let max = logits
            .iter()
            .map(|&l| l as f64)
            .fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|&l| (l as f64 - max).exp()).collect();
        let total: f64 = exps.iter().sum();

        Ok(Self(exps.into_iter().map(|e| e / total).collect()))
    }

    /// Wrap values already known to form a distribution.
    pub(crate) fn from_trusted(probs: Vec<f64>) -> Self {
        Self(probs)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }
}

/// Image classifier share of the ensemble, in `[0.0, 1.0]`.
///
/// The text classifier receives the complement.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct EnsembleWeight(f64);

impl EnsembleWeight {
    pub const IMAGE_ONLY: Self = Self(1.0);
    pub const TEXT_ONLY: Self = Self(0.0);
    pub const EQUAL: Self = Self(0.5);

    pub fn new(image_weight: f64) -> Result<Self, EnsembleError> {
        // NaN fails the range check as well
        if (0.0..=1.0).contains(&image_weight) {
            Ok(Self(image_weight))
        } else {
            Err(EnsembleError::WeightOutOfRange(image_weight))
        }
    }

    /// Weight applied to the image distribution.
    pub fn image(self) -> f64 {
        self.0
    }

    /// Weight applied to the text distribution.
    pub fn text(self) -> f64 {
        1.0 - self.0
    }
}

impl FromStr for EnsembleWeight {
    type Err = EnsembleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: f64 = trimmed
            .parse()
            .map_err(|_| EnsembleError::InvalidWeight(trimmed.to_string()))?;
        Self::new(value)
    }
}

impl fmt::Display for EnsembleWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_distribution() {
        let p = ProbabilityVector::new(vec![0.7, 0.2, 0.1]).unwrap();
        assert_eq!(p.len(), 3);
        assert!((p.sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_distributions() {
        assert_eq!(
            ProbabilityVector::new(vec![]),
            Err(EnsembleError::EmptyDistribution)
        );
        assert!(ProbabilityVector::new(vec![0.5, 0.6]).is_err());
        assert!(ProbabilityVector::new(vec![1.2, -0.2]).is_err());
        assert!(ProbabilityVector::new(vec![f64::NAN, 1.0]).is_err());
    }

    #[test]
    fn test_softmax_uniform() {
        let p = ProbabilityVector::from_logits(&[2.0, 2.0, 2.0, 2.0]).unwrap();
        for &v in p.as_slice() {
            assert!((v - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn test_softmax_large_logits() {
        let p = ProbabilityVector::from_logits(&[1000.0, 0.0, -1000.0]).unwrap();
        assert!((p.sum() - 1.0).abs() < 1e-9);
        assert!((p.as_slice()[0] - 1.0).abs() < 1e-9);
        assert!(p.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_softmax_ordering() {
        let p = ProbabilityVector::from_logits(&[0.5, 3.0, 1.0]).unwrap();
        let s = p.as_slice();
        assert!(s[1] > s[2] && s[2] > s[0]);
    }

    #[test]
    fn test_weight_parsing() {
        for bad in ["abc", "-0.1", "1.5", "", "NaN", "inf"] {
            assert!(bad.parse::<EnsembleWeight>().is_err(), "accepted {:?}", bad);
        }

        assert_eq!("0".parse::<EnsembleWeight>().unwrap().image(), 0.0);
        assert_eq!("1".parse::<EnsembleWeight>().unwrap().image(), 1.0);
        assert_eq!(" 0.37 \n".parse::<EnsembleWeight>().unwrap().image(), 0.37);
    }

    #[test]
    fn test_weight_error_kinds() {
        assert_eq!(
            "abc".parse::<EnsembleWeight>(),
            Err(EnsembleError::InvalidWeight("abc".to_string()))
        );
        assert_eq!(
            "1.5".parse::<EnsembleWeight>(),
            Err(EnsembleError::WeightOutOfRange(1.5))
        );
    }

    #[test]
    fn test_weight_complement() {
        let w = EnsembleWeight::new(0.8).unwrap();
        assert!((w.image() + w.text() - 1.0).abs() < 1e-12);
        assert!((w.text() - 0.2).abs() < 1e-12);
    }
}
