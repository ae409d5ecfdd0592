// Accuracy of a computed mapping against a ground-truth mapping
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{LinetraceError, Result};
use crate::matching::LineMapping;

/// Expected new index per old index; `None` means the line was deleted
///
/// Stored as a JSON object keyed by old index, e.g. `{"0": 0, "1": null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroundTruth(pub BTreeMap<usize, Option<usize>>);

impl GroundTruth {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LinetraceError::Json {
            source: e,
            context: "Failed to parse ground truth".to_string(),
        })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| LinetraceError::Io {
            source: e,
            context: format!("Failed to read ground truth: {:?}", path),
        })?;
        Self::from_json(&content)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accuracy {
    pub correct: usize,
    pub total: usize,
}

impl Accuracy {
    /// Percentage of correct lines; 0.0 when nothing was checked
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64 * 100.0
        }
    }

    pub fn merge(&mut self, other: Accuracy) {
        self.correct += other.correct;
        self.total += other.total;
    }
}

/// Score a mapping line by line against the ground truth
///
/// A line is correct when its first predicted new index equals the expected
/// one, or when both sides agree the line was deleted. Old indices beyond the
/// mapping count as deleted predictions.
pub fn evaluate(mapping: &LineMapping, truth: &GroundTruth) -> Accuracy {
    let correct = truth
        .0
        .iter()
        .filter(|&(&old, expected)| {
            let predicted = mapping.targets(old).first().copied();
            predicted == *expected
        })
        .count();

    Accuracy {
        correct,
        total: truth.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::Resolution;

    #[test]
    fn test_evaluate() {
        let mut mapping = LineMapping::new(4, 3);
        mapping.commit(0, vec![0], Resolution::Exact, 1.0);
        mapping.commit(1, vec![1, 2], Resolution::Split, 0.8);

        let truth = GroundTruth::from_json(r#"{"0": 0, "1": 1, "2": null, "3": 2, "9": null}"#).unwrap();
        let accuracy = evaluate(&mapping, &truth);

        // 0, 1, 2 and 9 agree; 3 was expected at 2 but predicted deleted
        assert_eq!(accuracy, Accuracy { correct: 4, total: 5 });
        assert!((accuracy.percentage() - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_merge_and_empty() {
        let mut total = Accuracy::default();
        assert_eq!(total.percentage(), 0.0);
        total.merge(Accuracy { correct: 1, total: 2 });
        total.merge(Accuracy { correct: 3, total: 3 });
        assert_eq!(total, Accuracy { correct: 4, total: 5 });
    }
}
