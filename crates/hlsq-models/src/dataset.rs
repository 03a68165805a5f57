//! Labelled test data

use crate::error::{ModelError, Result};
use serde::Deserialize;

/// Test samples with ground-truth class labels
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    samples: Vec<Vec<f32>>,
    labels: Vec<usize>,
    num_classes: usize,
}

#[derive(Debug, Deserialize)]
struct DatasetFile {
    samples: Vec<Vec<f32>>,
    labels: Vec<usize>,
    #[serde(default)]
    num_classes: Option<usize>,
}

impl Dataset {
    /// Build and validate a dataset.
    ///
    /// `num_classes` defaults to one more than the largest label.
    ///
    /// # Errors
    ///
    /// Returns error if sample and label counts differ, samples have
    /// different widths, or a label is outside `0..num_classes`.
    pub fn new(
        samples: Vec<Vec<f32>>,
        labels: Vec<usize>,
        num_classes: Option<usize>,
    ) -> Result<Self> {
        if samples.len() != labels.len() {
            return Err(ModelError::invalid_dataset(format!(
                "{} samples but {} labels",
                samples.len(),
                labels.len()
            )));
        }
        if let Some(first) = samples.first() {
            if let Some(i) = samples.iter().position(|s| s.len() != first.len()) {
                return Err(ModelError::invalid_dataset(format!(
                    "sample {i} has {} values, expected {}",
                    samples[i].len(),
                    first.len()
                )));
            }
        }

        let inferred = labels.iter().max().map_or(0, |m| m + 1);
        let num_classes = num_classes.unwrap_or(inferred);
        if let Some(bad) = labels.iter().find(|&&l| l >= num_classes) {
            return Err(ModelError::invalid_dataset(format!(
                "label {bad} outside 0..{num_classes}"
            )));
        }

        Ok(Self {
            samples,
            labels,
            num_classes,
        })
    }

    /// Parse a dataset from JSON: `{"samples": [[…]], "labels": […], "num_classes": N}`.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the data is inconsistent.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: DatasetFile = serde_json::from_str(text)
            .map_err(|e| ModelError::parse_error("dataset", e.to_string()))?;
        Self::new(file.samples, file.labels, file.num_classes)
    }

    /// Input samples
    pub fn samples(&self) -> &[Vec<f32>] {
        &self.samples
    }

    /// Ground-truth class per sample
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Number of classes
    pub const fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether there are no samples
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Keep only the first `limit` samples
    #[must_use]
    pub fn truncated(mut self, limit: usize) -> Self {
        self.samples.truncate(limit);
        self.labels.truncate(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_infers_classes() {
        let data = Dataset::from_json(r#"{"samples": [[0.0], [1.0], [2.0]], "labels": [0, 2, 1]}"#)
            .unwrap();
        assert_eq!(data.len(), 3);
        assert_eq!(data.num_classes(), 3);
        assert_eq!(data.labels(), [0, 2, 1]);
    }

    #[test]
    fn test_explicit_classes_bound_labels() {
        assert!(Dataset::new(vec![vec![0.0]], vec![4], Some(4)).is_err());
        let data = Dataset::new(vec![vec![0.0]], vec![1], Some(10)).unwrap();
        assert_eq!(data.num_classes(), 10);
    }

    #[test]
    fn test_rejects_inconsistent_data() {
        assert!(Dataset::new(vec![vec![0.0]], vec![], None).is_err());
        assert!(Dataset::new(vec![vec![0.0], vec![0.0, 1.0]], vec![0, 0], None).is_err());
    }

    #[test]
    fn test_truncated() {
        let data = Dataset::new(vec![vec![0.0]; 5], vec![0, 1, 0, 1, 0], None)
            .unwrap()
            .truncated(2);
        assert_eq!(data.len(), 2);
        assert_eq!(data.labels(), [0, 1]);
        assert_eq!(data.num_classes(), 2);
    }
}
