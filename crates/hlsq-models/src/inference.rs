//! Classification interface shared by every inference variant

use crate::error::{ModelError, Result};

/// Anything that maps one input sample to per-class scores.
///
/// Implemented by the floating-point [`crate::Network`] and by the
/// fixed-point hardware emulation; the equivalence tester only sees this
/// trait.
pub trait Classifier: Send + Sync {
    /// Name used in logs and reports
    fn name(&self) -> &str;

    /// Per-class scores for one sample
    ///
    /// # Errors
    ///
    /// Returns error if the sample cannot be evaluated.
    fn scores(&self, sample: &[f32]) -> Result<Vec<f32>>;

    /// Predicted class for one sample (arg-max of the scores)
    ///
    /// # Errors
    ///
    /// Returns error if scoring fails or yields no comparable score.
    fn predict(&self, sample: &[f32]) -> Result<usize> {
        let scores = self.scores(sample)?;
        argmax(&scores).ok_or_else(|| ModelError::EmptyScores {
            model: self.name().to_string(),
        })
    }
}

/// Index of the largest score.
///
/// Ties resolve to the lowest index; NaN never wins. Returns `None` when
/// there is no comparable score.
pub fn argmax(scores: &[f32]) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, &s) in scores.iter().enumerate() {
        if s.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if s <= b => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}
