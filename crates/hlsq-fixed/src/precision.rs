//! Fixed-point format descriptor.
//!
//! A [`PrecisionSpec`] is the four-field description of a signed HLS
//! fixed-point type. The canonical text form consumed by the backend is
//!
//! ```text
//! fixed<W, I, Q, O>
//!   W  total width in bits            (1..=1024)
//!   I  integer width in bits          (I < W)
//!   Q  rounding mode                  RND | RND_ZERO | RND_MIN_INF | RND_INF | RND_CONV | TRN | TRN_ZERO
//!   O  saturation (overflow) mode     SAT | SAT_ZERO | SAT_SYM | WRAP
//! ```
//!
//! The parser also accepts the vendor spelling `ap_fixed<…>` with `AP_`
//! prefixed modes, and omitted modes (`TRN`, `WRAP`).

use crate::error::{FixedPointError, Result};
use std::fmt;
use std::str::FromStr;

/// Widest arbitrary-precision type the HLS libraries accept by default.
pub const MAX_TOTAL_BITS: u32 = 1024;

/// Quantization (rounding) mode applied when bits fall below the LSB
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RoundingMode {
    /// Round half towards plus infinity
    Rnd,
    /// Round half towards zero
    RndZero,
    /// Round half towards minus infinity
    RndMinInf,
    /// Round half away from zero
    RndInf,
    /// Round half to even (convergent)
    RndConv,
    /// Truncate towards minus infinity
    #[default]
    Trn,
    /// Truncate towards zero
    TrnZero,
}

/// Overflow mode applied when a value exceeds the representable range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SaturationMode {
    /// Clamp to the most positive / most negative value
    Sat,
    /// Overflowing values become zero
    SatZero,
    /// Clamp symmetrically to ±max
    SatSym,
    /// Two's-complement wrap-around
    #[default]
    Wrap,
}

impl RoundingMode {
    /// All rounding modes, in backend documentation order
    pub const ALL: [Self; 7] = [
        Self::Rnd,
        Self::RndZero,
        Self::RndMinInf,
        Self::RndInf,
        Self::RndConv,
        Self::Trn,
        Self::TrnZero,
    ];

    /// Backend token (without the `AP_` prefix)
    pub const fn token(self) -> &'static str {
        match self {
            Self::Rnd => "RND",
            Self::RndZero => "RND_ZERO",
            Self::RndMinInf => "RND_MIN_INF",
            Self::RndInf => "RND_INF",
            Self::RndConv => "RND_CONV",
            Self::Trn => "TRN",
            Self::TrnZero => "TRN_ZERO",
        }
    }
}

impl SaturationMode {
    /// All saturation modes
    pub const ALL: [Self; 4] = [Self::Sat, Self::SatZero, Self::SatSym, Self::Wrap];

    /// Backend token (without the `AP_` prefix)
    pub const fn token(self) -> &'static str {
        match self {
            Self::Sat => "SAT",
            Self::SatZero => "SAT_ZERO",
            Self::SatSym => "SAT_SYM",
            Self::Wrap => "WRAP",
        }
    }
}

impl fmt::Display for RoundingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl fmt::Display for SaturationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for RoundingMode {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self> {
        let token = strip_vendor_prefix(s.trim());
        Self::ALL
            .into_iter()
            .find(|mode| mode.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| FixedPointError::UnknownRounding(s.trim().to_string()))
    }
}

impl FromStr for SaturationMode {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self> {
        let token = strip_vendor_prefix(s.trim());
        Self::ALL
            .into_iter()
            .find(|mode| mode.token().eq_ignore_ascii_case(token))
            .ok_or_else(|| FixedPointError::UnknownSaturation(s.trim().to_string()))
    }
}

fn strip_vendor_prefix(token: &str) -> &str {
    token
        .strip_prefix("AP_")
        .or_else(|| token.strip_prefix("ap_"))
        .unwrap_or(token)
}

/// Signed fixed-point number format.
///
/// Construction enforces `total_bits > integer_bits`: every precision in the
/// generated configuration sits on a numeric path that carries fractional
/// information, so a format without fractional bits is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PrecisionSpec {
    total_bits: u32,
    integer_bits: u32,
    rounding: RoundingMode,
    saturation: SaturationMode,
}

impl PrecisionSpec {
    /// Create a format with the default `TRN` / `WRAP` modes.
    ///
    /// # Errors
    ///
    /// Returns error if `total_bits <= integer_bits` or the width is out of range.
    pub fn new(total_bits: u32, integer_bits: u32) -> Result<Self> {
        Self::with_modes(
            total_bits,
            integer_bits,
            RoundingMode::default(),
            SaturationMode::default(),
        )
    }

    /// Create a format with explicit rounding and saturation modes.
    ///
    /// # Errors
    ///
    /// Returns error if `total_bits <= integer_bits` or the width is out of range.
    pub fn with_modes(
        total_bits: u32,
        integer_bits: u32,
        rounding: RoundingMode,
        saturation: SaturationMode,
    ) -> Result<Self> {
        if total_bits == 0 || total_bits > MAX_TOTAL_BITS {
            return Err(FixedPointError::WidthOutOfRange {
                total_bits,
                max: MAX_TOTAL_BITS,
            });
        }
        if total_bits <= integer_bits {
            return Err(FixedPointError::NoFractionalBits {
                total_bits,
                integer_bits,
            });
        }
        Ok(Self {
            total_bits,
            integer_bits,
            rounding,
            saturation,
        })
    }

    /// Const constructor for widths fixed at compile time (`TRN` / `WRAP`).
    pub(crate) const fn from_const_widths(total_bits: u32, integer_bits: u32) -> Self {
        assert!(total_bits > integer_bits && total_bits <= MAX_TOTAL_BITS);
        Self {
            total_bits,
            integer_bits,
            rounding: RoundingMode::Trn,
            saturation: SaturationMode::Wrap,
        }
    }

    /// Total width in bits
    pub const fn total_bits(&self) -> u32 {
        self.total_bits
    }

    /// Integer width in bits (sign bit included)
    pub const fn integer_bits(&self) -> u32 {
        self.integer_bits
    }

    /// Fractional width in bits, always at least one
    pub const fn fractional_bits(&self) -> u32 {
        self.total_bits - self.integer_bits
    }

    /// Rounding mode
    pub const fn rounding(&self) -> RoundingMode {
        self.rounding
    }

    /// Saturation mode
    pub const fn saturation(&self) -> SaturationMode {
        self.saturation
    }

    /// Same widths, different modes
    #[must_use]
    pub const fn modes(mut self, rounding: RoundingMode, saturation: SaturationMode) -> Self {
        self.rounding = rounding;
        self.saturation = saturation;
        self
    }
}

impl fmt::Display for PrecisionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fixed<{}, {}, {}, {}>",
            self.total_bits, self.integer_bits, self.rounding, self.saturation
        )
    }
}

impl FromStr for PrecisionSpec {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let body = text
            .strip_prefix("ap_fixed")
            .or_else(|| text.strip_prefix("fixed"))
            .ok_or_else(|| FixedPointError::parse(text, "expected 'fixed<…>' or 'ap_fixed<…>'"))?
            .trim_start();
        let args = body
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .ok_or_else(|| FixedPointError::parse(text, "missing '<…>' argument list"))?;

        let fields: Vec<&str> = args.split(',').map(str::trim).collect();
        if !(2..=4).contains(&fields.len()) {
            return Err(FixedPointError::parse(
                text,
                format!("expected 2 to 4 arguments, found {}", fields.len()),
            ));
        }

        let width = |field: &str, what: &str| {
            field
                .parse::<u32>()
                .map_err(|_| FixedPointError::parse(text, format!("{what} '{field}' is not a width")))
        };
        let total_bits = width(fields[0], "total width")?;
        let integer_bits = width(fields[1], "integer width")?;
        let rounding = fields
            .get(2)
            .map_or(Ok(RoundingMode::default()), |f| f.parse())?;
        let saturation = fields
            .get(3)
            .map_or(Ok(SaturationMode::default()), |f| f.parse())?;

        Self::with_modes(total_bits, integer_bits, rounding, saturation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_no_fractional_bits() {
        assert_eq!(
            PrecisionSpec::new(8, 8),
            Err(FixedPointError::NoFractionalBits {
                total_bits: 8,
                integer_bits: 8
            })
        );
        assert!(PrecisionSpec::new(4, 9).is_err());
        assert!(PrecisionSpec::new(9, 8).is_ok());
    }

    #[test]
    fn test_rejects_width_out_of_range() {
        assert!(matches!(
            PrecisionSpec::new(0, 0),
            Err(FixedPointError::WidthOutOfRange { .. })
        ));
        assert!(PrecisionSpec::new(MAX_TOTAL_BITS + 1, 1).is_err());
        assert!(PrecisionSpec::new(MAX_TOTAL_BITS, 1).is_ok());
    }

    #[test]
    fn test_render_canonical() {
        let spec = PrecisionSpec::new(12, 4).unwrap();
        assert_eq!(spec.to_string(), "fixed<12, 4, TRN, WRAP>");
    }

    #[test]
    fn test_parse_vendor_spelling() {
        let spec: PrecisionSpec = "ap_fixed<12, 2, AP_RND_CONV, AP_SAT>".parse().unwrap();
        assert_eq!(spec.total_bits(), 12);
        assert_eq!(spec.integer_bits(), 2);
        assert_eq!(spec.rounding(), RoundingMode::RndConv);
        assert_eq!(spec.saturation(), SaturationMode::Sat);
    }

    #[test]
    fn test_parse_defaults_missing_modes() {
        let spec: PrecisionSpec = "ap_fixed<16,6>".parse().unwrap();
        assert_eq!(spec.rounding(), RoundingMode::Trn);
        assert_eq!(spec.saturation(), SaturationMode::Wrap);

        let spec: PrecisionSpec = " fixed< 10 , 3 , RND > ".parse().unwrap();
        assert_eq!(spec.rounding(), RoundingMode::Rnd);
        assert_eq!(spec.saturation(), SaturationMode::Wrap);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "int<8>".parse::<PrecisionSpec>(),
            Err(FixedPointError::Parse { .. })
        ));
        assert!(matches!(
            "fixed<8>".parse::<PrecisionSpec>(),
            Err(FixedPointError::Parse { .. })
        ));
        assert!(matches!(
            "fixed<8, 2, RND_UP>".parse::<PrecisionSpec>(),
            Err(FixedPointError::UnknownRounding(_))
        ));
        assert!(matches!(
            "fixed<8, 2, RND, CLAMP>".parse::<PrecisionSpec>(),
            Err(FixedPointError::UnknownSaturation(_))
        ));
        assert!(matches!(
            "fixed<4, 4>".parse::<PrecisionSpec>(),
            Err(FixedPointError::NoFractionalBits { .. })
        ));
    }

    fn any_rounding() -> impl Strategy<Value = RoundingMode> {
        prop::sample::select(RoundingMode::ALL.to_vec())
    }

    fn any_saturation() -> impl Strategy<Value = SaturationMode> {
        prop::sample::select(SaturationMode::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn rendered_format_round_trips(
            (total, integer) in (1u32..=MAX_TOTAL_BITS).prop_flat_map(|t| (Just(t), 0..t)),
            rounding in any_rounding(),
            saturation in any_saturation(),
        ) {
            let spec = PrecisionSpec::with_modes(total, integer, rounding, saturation).unwrap();
            let reparsed: PrecisionSpec = spec.to_string().parse().unwrap();
            prop_assert_eq!(reparsed, spec);
        }
    }
}
