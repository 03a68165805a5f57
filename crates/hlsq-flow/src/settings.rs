//! Validated run settings
//!
//! Every knob of a generation run comes from an environment-style key/value
//! lookup. Values are parsed and checked once, here; the rest of the flow
//! only ever sees a [`FlowSettings`].
//!
//! | Key | Default |
//! |-----|---------|
//! | `HLS4ML_PROJECT_PATH` | `../hls/hls4ml_network` |
//! | `HLS4ML_WEIGHTS_PATH` | `./weights/weights.json` |
//! | `HLS4ML_WORD_WIDTH` | `12` |
//! | `HLS4ML_INT_WIDTH` | `2` |
//! | `HLS4ML_QUANTIZERS_TO_MODIFY` | empty |
//! | `HLS4ML_BIG_QUANTIZER` | `ap_fixed<12, 2, AP_RND_CONV, AP_SAT>` |
//! | `VIVADO_BIN_DIR` | `/path/to/vivado/version/bin` |
//! | `HLS4ML_TEST_DATA_PATH` | `./inputs/test_data.json` (empty skips testing) |
//! | `HLS4ML_EXECUTE_CSYNTH` | `False` |
//! | `HLS4ML_EXECUTE_VSYNTH` | `False` (implies csynth) |
//! | `HLS4ML_MATCH_THRESHOLD` | `75.0` |
//! | `HLS4ML_SYNTH_TIMEOUT_SECS` | unset |

use crate::config::{IoType, ModelDefaults, OverrideRequest};
use crate::error::ConfigError;
use crate::gate::{SynthesisPlan, DEFAULT_MATCH_THRESHOLD};
use crate::manifest::ParameterRecord;
use hlsq_fixed::target::{
    INTERFACE_INT_WIDTH, INTERFACE_WORD_WIDTH, TRAINING_INT_WIDTH, TRAINING_WORD_WIDTH,
};
use hlsq_fixed::PrecisionSpec;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

/// Output directory
pub const PROJECT_PATH: &str = "HLS4ML_PROJECT_PATH";
/// Trained network source
pub const WEIGHTS_PATH: &str = "HLS4ML_WEIGHTS_PATH";
/// Interface total bits
pub const WORD_WIDTH: &str = "HLS4ML_WORD_WIDTH";
/// Interface integer bits
pub const INT_WIDTH: &str = "HLS4ML_INT_WIDTH";
/// Comma-separated attributes to override
pub const QUANTIZERS_TO_MODIFY: &str = "HLS4ML_QUANTIZERS_TO_MODIFY";
/// Override precision
pub const BIG_QUANTIZER: &str = "HLS4ML_BIG_QUANTIZER";
/// Vendor toolchain binaries
pub const VIVADO_BIN_DIR: &str = "VIVADO_BIN_DIR";
/// Test data; empty skips testing
pub const TEST_DATA_PATH: &str = "HLS4ML_TEST_DATA_PATH";
/// Run C-to-RTL synthesis
pub const EXECUTE_CSYNTH: &str = "HLS4ML_EXECUTE_CSYNTH";
/// Run RTL synthesis
pub const EXECUTE_VSYNTH: &str = "HLS4ML_EXECUTE_VSYNTH";
/// Gate threshold in percent
pub const MATCH_THRESHOLD: &str = "HLS4ML_MATCH_THRESHOLD";
/// Synthesis timeout in seconds
pub const SYNTH_TIMEOUT_SECS: &str = "HLS4ML_SYNTH_TIMEOUT_SECS";

const DEFAULT_PROJECT_PATH: &str = "../hls/hls4ml_network";
const DEFAULT_WEIGHTS_PATH: &str = "./weights/weights.json";
const DEFAULT_BIG_QUANTIZER: &str = "ap_fixed<12, 2, AP_RND_CONV, AP_SAT>";
const DEFAULT_VIVADO_BIN_DIR: &str = "/path/to/vivado/version/bin";
const DEFAULT_TEST_DATA_PATH: &str = "./inputs/test_data.json";

/// Settings of one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct FlowSettings {
    /// Output directory of the generated project
    pub project_path: PathBuf,
    /// Trained network source
    pub weights_path: PathBuf,
    /// Precision of the input and output layers
    pub interface_precision: PrecisionSpec,
    /// Attribute override
    pub overrides: OverrideRequest,
    /// Vendor toolchain binaries, put on the search path of child processes
    pub toolchain_dir: PathBuf,
    /// Test data; `None` skips equivalence testing
    pub test_data_path: Option<PathBuf>,
    /// Synthesis stages to run
    pub plan: SynthesisPlan,
    /// Gate threshold in percent
    pub match_threshold: f64,
    /// Limit on each synthesis invocation
    pub synth_timeout: Option<Duration>,
}

impl FlowSettings {
    /// Read settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if any value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns error if any value is invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let word_width = parse_number::<u32>(WORD_WIDTH, lookup(WORD_WIDTH))?.unwrap_or(INTERFACE_WORD_WIDTH);
        let int_width = parse_number::<u32>(INT_WIDTH, lookup(INT_WIDTH))?.unwrap_or(INTERFACE_INT_WIDTH);
        let interface_precision = PrecisionSpec::new(word_width, int_width)?;

        let replacement: PrecisionSpec = text(BIG_QUANTIZER, DEFAULT_BIG_QUANTIZER).parse()?;
        let overrides = OverrideRequest::from_list(&text(QUANTIZERS_TO_MODIFY, ""), replacement);

        let test_data = text(TEST_DATA_PATH, DEFAULT_TEST_DATA_PATH);
        let test_data_path = (!test_data.is_empty()).then(|| PathBuf::from(test_data));

        let csynth = parse_bool(EXECUTE_CSYNTH, lookup(EXECUTE_CSYNTH))?;
        let vsynth = parse_bool(EXECUTE_VSYNTH, lookup(EXECUTE_VSYNTH))?;

        let match_threshold =
            parse_number::<f64>(MATCH_THRESHOLD, lookup(MATCH_THRESHOLD))?.unwrap_or(DEFAULT_MATCH_THRESHOLD);
        if !(0.0..=100.0).contains(&match_threshold) {
            return Err(ConfigError::invalid_setting(
                MATCH_THRESHOLD,
                match_threshold.to_string(),
                "must be a percentage between 0 and 100",
            ));
        }

        let synth_timeout = match parse_number::<u64>(SYNTH_TIMEOUT_SECS, lookup(SYNTH_TIMEOUT_SECS))? {
            Some(0) => {
                return Err(ConfigError::invalid_setting(
                    SYNTH_TIMEOUT_SECS,
                    "0",
                    "must be at least one second",
                ))
            }
            secs => secs.map(Duration::from_secs),
        };

        Ok(Self {
            project_path: PathBuf::from(text(PROJECT_PATH, DEFAULT_PROJECT_PATH)),
            weights_path: PathBuf::from(text(WEIGHTS_PATH, DEFAULT_WEIGHTS_PATH)),
            interface_precision,
            overrides,
            toolchain_dir: PathBuf::from(text(VIVADO_BIN_DIR, DEFAULT_VIVADO_BIN_DIR)),
            test_data_path,
            plan: SynthesisPlan::implied(csynth, vsynth),
            match_threshold,
            synth_timeout,
        })
    }

    /// Parameter record written to the manifest
    pub fn parameter_record(&self, defaults: &ModelDefaults, io_type: IoType) -> ParameterRecord {
        ParameterRecord {
            interface_word_width: self.interface_precision.total_bits(),
            interface_int_width: self.interface_precision.integer_bits(),
            training_word_width: TRAINING_WORD_WIDTH,
            training_int_width: TRAINING_INT_WIDTH,
            interface_precision: self.interface_precision.to_string(),
            default_precision: defaults.precision.to_string(),
            quantizers_to_modify: self.overrides.attributes().to_vec(),
            modified_quantizer: self.overrides.replacement().to_string(),
            default_reuse_factor: defaults.reuse_factor,
            default_strategy: defaults.strategy.to_string(),
            io_type: io_type.to_string(),
        }
    }

    /// Plan and relevant settings, as printed before a run
    pub fn describe(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Plan:");
        let _ = writeln!(out, "\t - Load trained network");
        let _ = writeln!(out, "\t - Generate the HLS project");
        if let Some(path) = &self.test_data_path {
            let _ = writeln!(
                out,
                "\t - Test trained and hardware models against the data in {}",
                path.display()
            );
        }
        if self.plan.csynth() {
            let _ = writeln!(out, "\t - Execute C++ to Verilog HLS synthesis");
        }
        if self.plan.vsynth() {
            let _ = writeln!(out, "\t - Execute Verilog RTL synthesis");
        }
        let _ = writeln!(
            out,
            "\t - Serialize the results to {}",
            self.project_path.join(crate::manifest::MANIFEST_FILE).display()
        );
        let _ = writeln!(out);
        let _ = writeln!(out, "Relevant settings:");
        let _ = writeln!(out, "Vivado Path: {}", self.toolchain_dir.display());
        let _ = writeln!(out, "Project Path: {}", self.project_path.display());
        let _ = writeln!(out, "Weights Path: {}", self.weights_path.display());
        out
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: Option<String>) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value
        .map(|v| {
            v.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::invalid_setting(key, v.as_str(), e.to_string()))
        })
        .transpose()
}

fn parse_bool(key: &str, value: Option<String>) -> Result<bool, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("False" | "false" | "0") => Ok(false),
        Some("True" | "true" | "1") => Ok(true),
        Some(other) => Err(ConfigError::invalid_setting(
            key,
            other,
            "expected True or False",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlsq_fixed::{RoundingMode, SaturationMode};
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<FlowSettings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        FlowSettings::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.project_path, PathBuf::from("../hls/hls4ml_network"));
        assert_eq!(s.weights_path, PathBuf::from("./weights/weights.json"));
        assert_eq!(s.interface_precision, PrecisionSpec::new(12, 2).unwrap());
        assert!(s.overrides.is_empty());
        assert_eq!(
            s.overrides.replacement(),
            PrecisionSpec::new(12, 2)
                .unwrap()
                .modes(RoundingMode::RndConv, SaturationMode::Sat)
        );
        assert_eq!(s.test_data_path, Some(PathBuf::from("./inputs/test_data.json")));
        assert_eq!(s.plan, SynthesisPlan::NONE);
        assert!((s.match_threshold - 75.0).abs() < f64::EPSILON);
        assert_eq!(s.synth_timeout, None);
    }

    #[test]
    fn test_overrides_and_flags() {
        let s = settings(&[
            (QUANTIZERS_TO_MODIFY, "result,accum"),
            (BIG_QUANTIZER, "fixed<18, 8>"),
            (EXECUTE_VSYNTH, "True"),
            (TEST_DATA_PATH, ""),
            (SYNTH_TIMEOUT_SECS, "3600"),
        ])
        .unwrap();
        assert_eq!(s.overrides.attributes(), ["result", "accum"]);
        assert_eq!(s.overrides.replacement(), PrecisionSpec::new(18, 8).unwrap());
        assert!(s.plan.csynth());
        assert!(s.plan.vsynth());
        assert_eq!(s.test_data_path, None);
        assert_eq!(s.synth_timeout, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_bool_spellings() {
        for (value, expected) in [("True", true), ("true", true), ("1", true), ("False", false), ("0", false)] {
            let s = settings(&[(EXECUTE_CSYNTH, value)]).unwrap();
            assert_eq!(s.plan.csynth(), expected, "{value}");
        }
        assert!(matches!(
            settings(&[(EXECUTE_CSYNTH, "yes")]),
            Err(ConfigError::InvalidSetting { .. })
        ));
    }

    #[test]
    fn test_interface_widths_validated() {
        assert!(matches!(
            settings(&[(WORD_WIDTH, "4"), (INT_WIDTH, "4")]),
            Err(ConfigError::InvalidPrecision(_))
        ));
        assert!(matches!(
            settings(&[(WORD_WIDTH, "twelve")]),
            Err(ConfigError::InvalidSetting { .. })
        ));
        let s = settings(&[(WORD_WIDTH, "16"), (INT_WIDTH, "6")]).unwrap();
        assert_eq!(s.interface_precision.fractional_bits(), 10);
    }

    #[test]
    fn test_invalid_values() {
        assert!(settings(&[(BIG_QUANTIZER, "ap_fixed<4, 6>")]).is_err());
        assert!(settings(&[(MATCH_THRESHOLD, "150")]).is_err());
        assert!(settings(&[(SYNTH_TIMEOUT_SECS, "0")]).is_err());
    }

    #[test]
    fn test_describe_lists_stages() {
        let s = settings(&[(EXECUTE_CSYNTH, "True"), (PROJECT_PATH, "/tmp/p")]).unwrap();
        let plan = s.describe();
        assert!(plan.contains("Test trained and hardware models"));
        assert!(plan.contains("Execute C++ to Verilog HLS synthesis"));
        assert!(!plan.contains("Verilog RTL synthesis"));
        assert!(plan.contains("/tmp/p/.project_info"));
    }
}
