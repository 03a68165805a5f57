//! Precision configuration, HLS project generation and staged equivalence
//! verification.
//!
//! # Flow
//!
//! ```text
//! NetworkProvider ──► ConfigGenerator ──► ModelBuilder ──┬─► EmulatedNetwork
//!                     (per-layer precision)              ├─► HlsBackend::convert
//!                                                        └─► .project_info header
//!
//! DatasetProvider ──► EquivalenceTester (trained / emulated / csim / cosim)
//!                          │
//!                          ▼
//!                     SynthesisGate ──► HlsBackend::synthesize ──► .project_info reports
//! ```
//!
//! # Example
//!
//! ```no_run
//! use hlsq_flow::backends::Hls4mlBackend;
//! use hlsq_flow::toolchain::Toolchain;
//! use hlsq_flow::{FlowSettings, Pipeline};
//! use hlsq_models::{JsonDatasetProvider, JsonNetworkProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = FlowSettings::from_env()?;
//! let backend = Hls4mlBackend::new(Toolchain::new(&settings.toolchain_dir));
//! let outcome = Pipeline::new(settings, &JsonNetworkProvider, &JsonDatasetProvider, &backend).run()?;
//! println!("{outcome:?}");
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::doc_markdown)]

mod backend;
pub mod backends;
mod builder;
pub mod config;
mod equivalence;
mod error;
mod gate;
mod manifest;
mod pipeline;
pub mod settings;
pub mod simlog;
pub mod toolchain;
pub mod tree;

pub use backend::{HlsBackend, HlsProject, SynthesisReports};
pub use builder::{BuiltModel, ModelBuilder};
pub use config::{
    ConfigGenerator, InterfaceLayers, IoType, LayerConfig, LayerPrecision, LayerSettings,
    ModelConfig, ModelDefaults, OverrideRequest, ProjectTarget, Strategy,
};
pub use equivalence::{match_percentage, Accuracy, Agreement, EquivalenceTester, TestOutcome, Variant};
pub use error::{ComparisonError, ConfigError, FlowError, Result, UsageError};
pub use gate::{GateDecision, SynthesisGate, SynthesisPlan, DEFAULT_MATCH_THRESHOLD};
pub use manifest::{ManifestHeader, ManifestWriter, ParameterRecord, MANIFEST_FILE};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use settings::FlowSettings;
pub use simlog::{MalformedLine, SimLog};
pub use toolchain::RunLimits;
pub use tree::{ConfigMap, ConfigNode, ConfigValue};

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        ConfigGenerator, EquivalenceTester, FlowError, FlowSettings, HlsBackend, ManifestWriter,
        ModelConfig, OverrideRequest, Pipeline, PipelineOutcome, Result, SimLog, SynthesisGate,
        SynthesisPlan, Variant,
    };
}
