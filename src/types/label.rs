//! Ordered class label set shared by both classifiers

use crate::error::EnsembleError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Skin condition categories in model output order.
pub const DEFAULT_CLASS_NAMES: [&str; 22] = [
    "Acne",
    "Actinic Keratosis",
    "Benign Tumors",
    "Bullous",
    "Candidiasis",
    "Drug Eruption",
    "Eczema",
    "Infestations/Bites",
    "Lichen",
    "Lupus",
    "Moles",
    "Psoriasis",
    "Rosacea",
    "Seborrheic Keratoses",
    "Skin Cancer",
    "Sun/Sunlight Damage",
    "Tinea",
    "Unknown/Normal",
    "Vascular Tumors",
    "Vasculitis",
    "Vitiligo",
    "Warts",
];

/// Index-to-label mapping. Position `i` names output `i` of both models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct LabelSet {
    names: Vec<String>,
}

impl LabelSet {
    /// Build a label set, rejecting empty sets and duplicate names.
    pub fn new(names: Vec<String>) -> Result<Self, EnsembleError> {
        if names.is_empty() {
            return Err(EnsembleError::InvalidLabels("no labels".to_string()));
        }

        let mut seen = HashSet::with_capacity(names.len());
        for name in &names {
            if !seen.insert(name.as_str()) {
                return Err(EnsembleError::InvalidLabels(format!(
                    "duplicate label {:?}",
                    name
                )));
            }
        }

        Ok(Self { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Label at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Position of a label name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            names: DEFAULT_CLASS_NAMES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TryFrom<Vec<String>> for LabelSet {
    type Error = EnsembleError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<LabelSet> for Vec<String> {
    fn from(labels: LabelSet) -> Self {
        labels.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_labels() {
        let labels = LabelSet::default();
        assert_eq!(labels.len(), 22);
        assert_eq!(labels.get(0), Some("Acne"));
        assert_eq!(labels.get(21), Some("Warts"));
        assert_eq!(labels.get(22), None);
        assert_eq!(labels.index_of("Skin Cancer"), Some(14));
        assert_eq!(labels.iter().nth(6), Some("Eczema"));
        assert_eq!(labels.iter().count(), 22);
    }

    #[test]
    fn test_rejects_duplicates_and_empty() {
        assert!(LabelSet::new(vec![]).is_err());

        let dup = LabelSet::new(vec!["Acne".to_string(), "Acne".to_string()]);
        assert!(matches!(dup, Err(EnsembleError::InvalidLabels(_))));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: LabelSet = serde_json::from_str(r#"["a", "b", "c"]"#).unwrap();
        assert_eq!(ok.len(), 3);

        let bad: Result<LabelSet, _> = serde_json::from_str(r#"["a", "a"]"#);
        assert!(bad.is_err());
    }
}
