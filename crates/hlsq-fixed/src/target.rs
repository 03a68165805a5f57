//! Target device and training-time constants.
//!
//! The generator targets one device per run; these are the values it falls
//! back to when the caller does not supply its own.

use crate::precision::PrecisionSpec;

/// Default FPGA part (Zynq UltraScale+ ZCU102 board).
pub const DEFAULT_FPGA_PART: &str = "xczu9eg-ffvb1156-2-e";

/// Default HLS backend name.
pub const DEFAULT_BACKEND: &str = "Vivado";

/// Project (top function) name the backend emits.
pub const DEFAULT_PROJECT_NAME: &str = "myproject";

/// Word width the network was quantization-aware trained with.
pub const TRAINING_WORD_WIDTH: u32 = 12;

/// Integer width the network was quantization-aware trained with.
pub const TRAINING_INT_WIDTH: u32 = 1;

/// Default interface (bus) word width.
pub const INTERFACE_WORD_WIDTH: u32 = 12;

/// Default interface (bus) integer width.
pub const INTERFACE_INT_WIDTH: u32 = 2;

/// Default total width of interior layers.
pub const DEFAULT_WORD_WIDTH: u32 = 12;

/// Default integer width of interior layers.
pub const DEFAULT_INT_WIDTH: u32 = 4;

/// Precision interior layers get unless overridden: `fixed<12, 4>`.
pub const DEFAULT_PRECISION: PrecisionSpec =
    PrecisionSpec::from_const_widths(DEFAULT_WORD_WIDTH, DEFAULT_INT_WIDTH);

/// Precision the network was trained with: `fixed<12, 1>`.
pub const TRAINING_PRECISION: PrecisionSpec =
    PrecisionSpec::from_const_widths(TRAINING_WORD_WIDTH, TRAINING_INT_WIDTH);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_precisions_have_fraction() {
        assert_eq!(DEFAULT_PRECISION.fractional_bits(), 8);
        assert_eq!(TRAINING_PRECISION.fractional_bits(), 11);
        assert!(INTERFACE_WORD_WIDTH > INTERFACE_INT_WIDTH);
    }
}
