//! Synthesis gate and synthesis plan

use crate::error::UsageError;
use std::fmt;

/// Default acceptance threshold, in percent
pub const DEFAULT_MATCH_THRESHOLD: f64 = 75.0;

/// Decides whether synthesis proceeds after equivalence testing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthesisGate {
    threshold: f64,
}

/// Outcome of the gate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateDecision {
    /// Match strictly above threshold
    Proceed,
    /// Match at or below threshold; synthesis is skipped
    Reject {
        /// Measured match percentage
        match_percentage: f64,
        /// Threshold it failed
        threshold: f64,
    },
}

impl GateDecision {
    /// Whether synthesis may proceed
    pub const fn is_proceed(&self) -> bool {
        matches!(self, Self::Proceed)
    }
}

impl SynthesisGate {
    /// Gate with the given threshold in percent
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Acceptance threshold in percent
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Evaluate a hardware-model vs trained-model match percentage
    pub fn evaluate(&self, match_percentage: f64) -> GateDecision {
        if match_percentage > self.threshold {
            GateDecision::Proceed
        } else {
            GateDecision::Reject {
                match_percentage,
                threshold: self.threshold,
            }
        }
    }
}

impl Default for SynthesisGate {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD)
    }
}

/// Which synthesis stages run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SynthesisPlan {
    csynth: bool,
    vsynth: bool,
}

impl SynthesisPlan {
    /// No synthesis
    pub const NONE: Self = Self {
        csynth: false,
        vsynth: false,
    };

    /// Validated plan.
    ///
    /// # Errors
    ///
    /// Returns [`UsageError::VsynthWithoutCsynth`] if RTL synthesis is
    /// requested without C synthesis.
    pub const fn new(csynth: bool, vsynth: bool) -> Result<Self, UsageError> {
        if vsynth && !csynth {
            return Err(UsageError::VsynthWithoutCsynth);
        }
        Ok(Self { csynth, vsynth })
    }

    /// Plan where RTL synthesis implies C synthesis
    pub const fn implied(csynth: bool, vsynth: bool) -> Self {
        Self {
            csynth: csynth || vsynth,
            vsynth,
        }
    }

    /// Whether C-to-RTL synthesis runs
    pub const fn csynth(&self) -> bool {
        self.csynth
    }

    /// Whether RTL synthesis runs
    pub const fn vsynth(&self) -> bool {
        self.vsynth
    }

    /// Whether nothing is synthesized
    pub const fn is_empty(&self) -> bool {
        !self.csynth
    }
}

impl fmt::Display for SynthesisPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.csynth, self.vsynth) {
            (false, _) => f.write_str("none"),
            (true, false) => f.write_str("csynth"),
            (true, true) => f.write_str("csynth+vsynth"),
        }
    }
}
