//! Error types for fixed-point precision handling

use thiserror::Error;

/// Result type alias for precision operations
pub type Result<T> = std::result::Result<T, FixedPointError>;

/// Errors raised while building or parsing a fixed-point format
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixedPointError {
    /// Integer width leaves no fractional bits
    #[error("Invalid precision: total width {total_bits} must exceed integer width {integer_bits}")]
    NoFractionalBits {
        /// Requested total width
        total_bits: u32,
        /// Requested integer width
        integer_bits: u32,
    },

    /// Total width outside what the HLS arbitrary-precision types support
    #[error("Invalid precision: total width {total_bits} outside 1..={max}")]
    WidthOutOfRange {
        /// Requested total width
        total_bits: u32,
        /// Largest supported width
        max: u32,
    },

    /// Malformed `fixed<…>` descriptor
    #[error("Cannot parse precision '{input}': {reason}")]
    Parse {
        /// Offending input text
        input: String,
        /// Reason for failure
        reason: String,
    },

    /// Unrecognised rounding mode token
    #[error("Unknown rounding mode: {0}")]
    UnknownRounding(String),

    /// Unrecognised saturation mode token
    #[error("Unknown saturation mode: {0}")]
    UnknownSaturation(String),
}

impl FixedPointError {
    /// Create a parse error
    pub fn parse(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            input: input.into(),
            reason: reason.into(),
        }
    }
}
