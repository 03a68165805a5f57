//! Fixed-point precision model for HLS neural network targets.
//!
//! This crate has **no hardware access** and **no I/O**; it is a pure model
//! of the arbitrary-precision fixed-point types the HLS backend emits
//! (`ap_fixed<W, I, Q, O>`): their textual form, their bit-accurate
//! quantization behaviour, and the target-device constants the generator
//! defaults to.
//!
//! # Crate organisation
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`precision`] | `PrecisionSpec`, rounding and saturation modes, `fixed<…>` rendering and parsing |
//! | [`quantize`] | Bit-accurate rounding/overflow emulation of a `PrecisionSpec` |
//! | [`target`] | FPGA part, training widths and default precisions |
//!
//! # Example
//!
//! ```
//! use hlsq_fixed::{PrecisionSpec, RoundingMode, SaturationMode};
//!
//! let spec: PrecisionSpec = "ap_fixed<12, 2, AP_RND_CONV, AP_SAT>".parse().unwrap();
//! assert_eq!(spec.fractional_bits(), 10);
//! assert_eq!(spec.rounding(), RoundingMode::RndConv);
//! assert_eq!(spec.saturation(), SaturationMode::Sat);
//! assert_eq!(spec.to_string(), "fixed<12, 2, RND_CONV, SAT>");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod error;
pub mod precision;
pub mod quantize;
pub mod target;

pub use error::{FixedPointError, Result};
pub use precision::{PrecisionSpec, RoundingMode, SaturationMode};
