//! Error types for the generation and verification flow

use hlsq_fixed::FixedPointError;
use hlsq_models::ModelError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for flow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Errors that can occur anywhere in the flow
#[derive(Debug, Error)]
pub enum FlowError {
    /// Invalid configuration; aborts the run before side effects
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Invalid flag combination; aborts the run before side effects
    #[error("Usage error: {0}")]
    Usage(#[from] UsageError),

    /// Prediction sequences cannot be compared
    #[error("Comparison error: {0}")]
    Comparison(#[from] ComparisonError),

    /// Network or dataset failure
    #[error(transparent)]
    Model(#[from] ModelError),

    /// HLS backend failure
    #[error("HLS backend '{backend}' failed: {reason}")]
    Backend {
        /// Backend name
        backend: String,
        /// Reason for failure
        reason: String,
    },

    /// External tool exited unsuccessfully
    #[error("{tool} exited with {status}")]
    ToolFailed {
        /// Program that was run
        tool: String,
        /// Exit status description
        status: String,
    },

    /// Synthesis report missing after a synthesis run
    #[error("Synthesis report not found: {path}")]
    ReportMissing {
        /// Expected report location
        path: PathBuf,
    },

    /// External tool exceeded its time limit
    #[error("Operation timeout after {duration_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds
        duration_ms: u64,
    },

    /// External tool was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl FlowError {
    /// Create a backend error
    pub fn backend(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend {
            backend: backend.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a usage error (distinct exit status)
    pub const fn is_usage(&self) -> bool {
        matches!(self, Self::Usage(_))
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Precision violates the fixed-point invariants
    #[error(transparent)]
    InvalidPrecision(#[from] FixedPointError),

    /// Named interface layer is not in the network
    #[error("{role} layer '{name}' not found in network")]
    MissingInterfaceLayer {
        /// `input` or `output`
        role: &'static str,
        /// Expected layer name
        name: String,
    },

    /// Topological detection did not find exactly one interface layer
    #[error("expected exactly one {role} layer, found {count}")]
    AmbiguousInterfaceLayer {
        /// `input` or `output`
        role: &'static str,
        /// Number of candidates
        count: usize,
    },

    /// Configuration references a layer the network does not have
    #[error("configured layer '{name}' not found in network")]
    UnknownLayer {
        /// Layer name
        name: String,
    },

    /// Configuration references an attribute the layer does not expose
    #[error("layer '{layer}' has no precision attribute '{attribute}'")]
    UnknownAttribute {
        /// Layer name
        layer: String,
        /// Attribute name
        attribute: String,
    },

    /// Setting value cannot be used
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidSetting {
        /// Setting key
        key: String,
        /// Offending value
        value: String,
        /// Reason for rejection
        reason: String,
    },
}

impl ConfigError {
    /// Create an invalid setting error
    pub fn invalid_setting(
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidSetting {
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Invalid flag combinations, reported before any stage runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    /// RTL synthesis requested without C synthesis
    #[error("HLS synthesis must be enabled in order to run Verilog synthesis")]
    VsynthWithoutCsynth,
}

/// Errors comparing two prediction sequences
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComparisonError {
    /// Sequences differ in length
    #[error("cannot compare {left} predictions against {right}")]
    LengthMismatch {
        /// Length of the first sequence
        left: usize,
        /// Length of the second sequence
        right: usize,
    },

    /// Nothing to compare
    #[error("cannot compare empty prediction sequences")]
    Empty,
}
