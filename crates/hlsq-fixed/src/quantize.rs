//! Bit-accurate emulation of fixed-point rounding and overflow.
//!
//! Values are scaled by `2^F` (F = fractional bits), rounded to an integer
//! according to the [`RoundingMode`], then brought back into the signed
//! `W`-bit range according to the [`SaturationMode`].
//!
//! ```text
//! lsb  = 2^-F
//! min  = -2^(W-1) · lsb
//! max  = (2^(W-1) - 1) · lsb
//! ```
//!
//! Arithmetic runs in `f64`, which is exact for formats up to 53 bits wide;
//! the emulated networks stay well inside that.

use crate::precision::{PrecisionSpec, RoundingMode, SaturationMode};

impl PrecisionSpec {
    /// Weight of the least significant bit
    pub fn lsb(&self) -> f64 {
        pow2(-i64::from(self.fractional_bits()))
    }

    /// Most positive representable value
    pub fn max_value(&self) -> f64 {
        (pow2(i64::from(self.total_bits()) - 1) - 1.0) * self.lsb()
    }

    /// Most negative representable value
    pub fn min_value(&self) -> f64 {
        -pow2(i64::from(self.total_bits()) - 1) * self.lsb()
    }

    /// Quantize a value to this format.
    ///
    /// NaN maps to zero; infinities clamp to the range ends regardless of
    /// the saturation mode.
    pub fn quantize(&self, value: f64) -> f64 {
        if value.is_nan() {
            return 0.0;
        }
        if value.is_infinite() {
            return if value > 0.0 {
                self.max_value()
            } else {
                self.min_value()
            };
        }

        let scale = pow2(i64::from(self.fractional_bits()));
        let q = round_scaled(value * scale, self.rounding());

        let max_q = pow2(i64::from(self.total_bits()) - 1) - 1.0;
        let min_q = -pow2(i64::from(self.total_bits()) - 1);

        let q = if q > max_q || q < min_q {
            match self.saturation() {
                SaturationMode::Sat => q.clamp(min_q, max_q),
                SaturationMode::SatSym => q.clamp(-max_q, max_q),
                SaturationMode::SatZero => 0.0,
                SaturationMode::Wrap => {
                    let modulus = pow2(i64::from(self.total_bits()));
                    if modulus.is_finite() {
                        (q - min_q).rem_euclid(modulus) + min_q
                    } else {
                        q
                    }
                }
            }
        } else {
            q
        };

        q / scale
    }

    /// Quantize a slice of `f32` values in place
    pub fn quantize_slice(&self, values: &mut [f32]) {
        for v in values {
            #[allow(clippy::cast_possible_truncation)]
            let q = self.quantize(f64::from(*v)) as f32;
            *v = q;
        }
    }
}

fn round_scaled(x: f64, mode: RoundingMode) -> f64 {
    match mode {
        RoundingMode::Trn => x.floor(),
        RoundingMode::TrnZero => x.trunc(),
        RoundingMode::Rnd => (x + 0.5).floor(),
        RoundingMode::RndMinInf => (x - 0.5).ceil(),
        RoundingMode::RndInf => x.round(),
        RoundingMode::RndZero => {
            if (x - x.trunc()).abs() == 0.5 {
                x.trunc()
            } else {
                x.round()
            }
        }
        RoundingMode::RndConv => x.round_ties_even(),
    }
}

fn pow2(exp: i64) -> f64 {
    #[allow(clippy::cast_possible_truncation)]
    2f64.powi(exp as i32)
}
