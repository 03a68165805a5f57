//! Error types for network and dataset operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for network and dataset operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while loading or running a network
#[derive(Debug, Error)]
pub enum ModelError {
    /// File not found or cannot be read
    #[error("File not found: {path}")]
    FileNotFound {
        /// Path that was attempted
        path: PathBuf,
    },

    /// Source file could not be decoded
    #[error("Failed to parse {what}: {reason}")]
    ParseError {
        /// What was being parsed
        what: &'static str,
        /// Reason for failure
        reason: String,
    },

    /// Invalid layer definition
    #[error("Invalid layer: {reason}")]
    InvalidLayer {
        /// Reason for failure
        reason: String,
    },

    /// Inconsistent test data
    #[error("Invalid dataset: {reason}")]
    InvalidDataset {
        /// Reason for failure
        reason: String,
    },

    /// Sample width does not match the network input
    #[error("Input size mismatch: got {actual} values, expected {expected}")]
    InputSize {
        /// Network input width
        expected: usize,
        /// Sample width
        actual: usize,
    },

    /// Inference produced no usable score
    #[error("Inference produced no class scores for '{model}'")]
    EmptyScores {
        /// Name of the classifier
        model: String,
    },

    /// Inference failed inside a classifier implementation
    #[error("Inference failed: {reason}")]
    InferenceFailed {
        /// Reason for failure
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

impl ModelError {
    /// Create a parse error
    pub fn parse_error(what: &'static str, reason: impl Into<String>) -> Self {
        Self::ParseError {
            what,
            reason: reason.into(),
        }
    }

    /// Create an invalid layer error
    pub fn invalid_layer(reason: impl Into<String>) -> Self {
        Self::InvalidLayer {
            reason: reason.into(),
        }
    }

    /// Create an invalid dataset error
    pub fn invalid_dataset(reason: impl Into<String>) -> Self {
        Self::InvalidDataset {
            reason: reason.into(),
        }
    }

    /// Create an inference error
    pub fn inference_failed(reason: impl Into<String>) -> Self {
        Self::InferenceFailed {
            reason: reason.into(),
        }
    }
}
