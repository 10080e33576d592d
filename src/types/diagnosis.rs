//! Diagnosis result data structures

use crate::types::distribution::{EnsembleWeight, ProbabilityVector};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Width of the label column in the text report.
const LABEL_COLUMN_WIDTH: usize = 25;

/// One entry of a top-K ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedScore {
    /// Position in the label set
    pub index: usize,
    /// Class label name
    pub label: String,
    /// Ensembled probability
    pub score: f64,
}

/// Outcome of combining the image and text classifiers for one case.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    /// Unique diagnosis identifier
    pub diagnosis_id: String,

    /// Predicted class label (argmax of the final distribution)
    pub label: String,

    /// Index of the predicted label
    pub index: usize,

    /// Image classifier weight used for the combination
    pub image_weight: EnsembleWeight,

    /// Top-K labels by ensembled score, descending
    pub top_k: Vec<RankedScore>,

    /// Ensembled distribution
    pub final_distribution: ProbabilityVector,

    /// Image classifier distribution
    pub image_distribution: ProbabilityVector,

    /// Text classifier distribution
    pub text_distribution: ProbabilityVector,

    /// Whether both classifiers individually predict the same label
    pub models_agree: bool,

    /// Generation timestamp
    pub timestamp: DateTime<Utc>,
}

impl Diagnosis {
    /// Render as pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for Diagnosis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f)?;
        writeln!(f, "Ensembled ➔ {}", self.label)?;
        for ranked in &self.top_k {
            writeln!(
                f,
                "  {:width$} {:.4}",
                ranked.label,
                ranked.score,
                width = LABEL_COLUMN_WIDTH
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Diagnosis {
        let final_distribution = ProbabilityVector::new(vec![0.72, 0.04, 0.24]).unwrap();
        Diagnosis {
            diagnosis_id: "d-1".to_string(),
            label: "Acne".to_string(),
            index: 0,
            image_weight: EnsembleWeight::new(0.8).unwrap(),
            top_k: vec![
                RankedScore {
                    index: 0,
                    label: "Acne".to_string(),
                    score: 0.72,
                },
                RankedScore {
                    index: 2,
                    label: "Benign Tumors".to_string(),
                    score: 0.24,
                },
                RankedScore {
                    index: 1,
                    label: "Actinic Keratosis".to_string(),
                    score: 0.04,
                },
            ],
            image_distribution: ProbabilityVector::new(vec![0.9, 0.05, 0.05]).unwrap(),
            text_distribution: ProbabilityVector::new(vec![0.0, 0.0, 1.0]).unwrap(),
            final_distribution,
            models_agree: false,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_text_report_format() {
        let report = sample().to_string();
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "");
        assert_eq!(lines[1], "Ensembled ➔ Acne");
        assert_eq!(lines[2], "  Acne                      0.7200");
        assert_eq!(lines[3], "  Benign Tumors             0.2400");
        assert_eq!(lines[4], "  Actinic Keratosis         0.0400");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_json_report() {
        let json = sample().to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["label"], "Acne");
        assert_eq!(value["image_weight"], 0.8);
        assert_eq!(value["top_k"].as_array().unwrap().len(), 3);
        assert_eq!(value["top_k"][1]["index"], 2);
        assert_eq!(value["final_distribution"][0], 0.72);
    }
}
