//! Staged equivalence testing
//!
//! Runs one batch of labelled samples through every requested variant and
//! compares the predicted classes against ground truth and against each
//! other. Live variants (anything implementing [`Classifier`]) are evaluated
//! in parallel; simulation-log variants come from parsed [`SimLog`]s.
//!
//! Log lines that failed to parse leave a hole in that variant's sequence.
//! Comparisons involving such a variant cover only the samples both sides
//! produced a prediction for, and report how many that was.

use crate::error::{ComparisonError, Result};
use crate::simlog::{MalformedLine, SimLog};
use hlsq_models::{Classifier, Dataset};
use rayon::prelude::*;
use std::fmt;
use std::fmt::Write as _;
use tracing::{debug, info};

/// Inference variant taking part in a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Variant {
    /// Floating-point trained network
    Trained,
    /// Bit-accurate fixed-point model of the hardware
    Emulated,
    /// C simulation log
    CSim,
    /// C/RTL cosimulation log
    Cosim,
}

impl Variant {
    /// All variants, in pipeline order
    pub const ALL: [Self; 4] = [Self::Trained, Self::Emulated, Self::CSim, Self::Cosim];
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Trained => "trained model",
            Self::Emulated => "hardware model",
            Self::CSim => "C simulation",
            Self::Cosim => "C/RTL cosimulation",
        })
    }
}

/// Percentage of positions at which two prediction sequences agree.
///
/// # Errors
///
/// Returns error if the sequences differ in length or are empty.
pub fn match_percentage(a: &[usize], b: &[usize]) -> std::result::Result<f64, ComparisonError> {
    if a.len() != b.len() {
        return Err(ComparisonError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(ComparisonError::Empty);
    }
    let matches = a.iter().zip(b).filter(|(x, y)| x == y).count();
    #[allow(clippy::cast_precision_loss)]
    let percentage = 100.0 * matches as f64 / a.len() as f64;
    Ok(percentage)
}

/// Match of one variant against ground truth
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accuracy {
    /// Variant
    pub variant: Variant,
    /// Samples compared
    pub compared: usize,
    /// Match percentage
    pub percentage: f64,
}

/// Match between two variants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Agreement {
    /// Later variant in pipeline order
    pub variant: Variant,
    /// Earlier variant it is compared to
    pub baseline: Variant,
    /// Samples compared
    pub compared: usize,
    /// Match percentage
    pub percentage: f64,
}

/// Everything an equivalence run measured
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestOutcome {
    sample_count: usize,
    accuracy: Vec<Accuracy>,
    agreement: Vec<Agreement>,
    malformed: Vec<(Variant, MalformedLine)>,
}

impl TestOutcome {
    /// Number of samples evaluated
    pub const fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Per-variant match against ground truth
    pub fn accuracies(&self) -> &[Accuracy] {
        &self.accuracy
    }

    /// Pairwise matches between variants
    pub fn agreements(&self) -> &[Agreement] {
        &self.agreement
    }

    /// Simulation-log lines that were excluded
    pub fn malformed(&self) -> &[(Variant, MalformedLine)] {
        &self.malformed
    }

    /// Match of one variant against ground truth
    pub fn accuracy(&self, variant: Variant) -> Option<f64> {
        self.accuracy
            .iter()
            .find(|a| a.variant == variant)
            .map(|a| a.percentage)
    }

    /// Match between two variants, in either order
    pub fn agreement(&self, a: Variant, b: Variant) -> Option<f64> {
        self.agreement
            .iter()
            .find(|p| (p.variant, p.baseline) == (a, b) || (p.variant, p.baseline) == (b, a))
            .map(|p| p.percentage)
    }

    /// Human-readable result lines
    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Num samples: {}", self.sample_count);
        for a in &self.accuracy {
            let _ = writeln!(
                out,
                "The {} matched the ground truth {:.2}% of the time{}",
                a.variant,
                a.percentage,
                partial(a.compared, self.sample_count)
            );
        }
        for p in &self.agreement {
            let _ = writeln!(
                out,
                "The {} matched the {} {:.2}% of the time{}",
                p.variant,
                p.baseline,
                p.percentage,
                partial(p.compared, self.sample_count)
            );
        }
        for (variant, line) in &self.malformed {
            let _ = writeln!(out, "ERROR: {variant} log {line}");
        }
        out
    }
}

fn partial(compared: usize, total: usize) -> String {
    if compared == total {
        String::new()
    } else {
        format!(" ({compared} of {total} samples)")
    }
}

/// Runs the requested variants over one dataset
#[derive(Default)]
pub struct EquivalenceTester<'a> {
    models: Vec<(Variant, &'a dyn Classifier)>,
    logs: Vec<(Variant, SimLog)>,
    limit: Option<usize>,
}

impl<'a> EquivalenceTester<'a> {
    /// Tester with no variants
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a live variant
    #[must_use]
    pub fn with_model(mut self, variant: Variant, model: &'a dyn Classifier) -> Self {
        self.models.push((variant, model));
        self
    }

    /// Add a simulation-log variant
    #[must_use]
    pub fn with_log(mut self, variant: Variant, log: SimLog) -> Self {
        self.logs.push((variant, log));
        self
    }

    /// Evaluate only the first `limit` samples
    #[must_use]
    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    /// Run every variant and compare.
    ///
    /// # Errors
    ///
    /// Returns error if a live variant fails on a sample, if a log does not
    /// hold one line per evaluated sample, or if a comparison has no samples
    /// in common. A log longer than the dataset is accepted only when a limit
    /// is set, and is then cut to the limit.
    pub fn run(&self, dataset: &Dataset) -> Result<TestOutcome> {
        let n = self.limit.map_or(dataset.len(), |l| l.min(dataset.len()));
        let samples = &dataset.samples()[..n];
        let truth: Vec<Option<usize>> = dataset.labels()[..n].iter().copied().map(Some).collect();

        info!("Running {} live variant(s) on {n} samples", self.models.len());
        let live = self
            .models
            .par_iter()
            .map(|(variant, model)| {
                let predictions = samples
                    .par_iter()
                    .map(|s| model.predict(s).map(Some))
                    .collect::<hlsq_models::Result<Vec<_>>>()?;
                debug!("{variant}: {} predictions from {}", predictions.len(), model.name());
                Ok((*variant, predictions))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut sequences: Vec<(Variant, Vec<Option<usize>>)> = live;
        let mut malformed = Vec::new();
        for (variant, log) in &self.logs {
            let lines = log.line_count();
            if lines < n || (lines > n && self.limit.is_none()) {
                return Err(ComparisonError::LengthMismatch { left: lines, right: n }.into());
            }
            sequences.push((*variant, log.by_line()[..n].to_vec()));
            malformed.extend(
                log.malformed()
                    .iter()
                    .filter(|m| m.line <= n)
                    .map(|m| (*variant, m.clone())),
            );
        }
        sequences.sort_by_key(|(v, _)| *v);

        let mut outcome = TestOutcome {
            sample_count: n,
            malformed,
            ..TestOutcome::default()
        };
        for (variant, predictions) in &sequences {
            let (compared, percentage) = compare_aligned(predictions, &truth)?;
            outcome.accuracy.push(Accuracy {
                variant: *variant,
                compared,
                percentage,
            });
        }
        for (i, (variant, predictions)) in sequences.iter().enumerate() {
            for (baseline, base_predictions) in &sequences[..i] {
                let (compared, percentage) = compare_aligned(predictions, base_predictions)?;
                outcome.agreement.push(Agreement {
                    variant: *variant,
                    baseline: *baseline,
                    compared,
                    percentage,
                });
            }
        }
        Ok(outcome)
    }
}

/// Compare the positions where both sequences hold a prediction
fn compare_aligned(a: &[Option<usize>], b: &[Option<usize>]) -> Result<(usize, f64)> {
    if a.len() != b.len() {
        return Err(ComparisonError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        }
        .into());
    }
    let (left, right): (Vec<usize>, Vec<usize>) = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .unzip();
    let percentage = match_percentage(&left, &right)?;
    Ok((left.len(), percentage))
}
