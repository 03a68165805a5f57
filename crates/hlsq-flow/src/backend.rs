//! HLS backend boundary
//!
//! The code-generation framework and the vendor synthesis tools sit behind
//! [`HlsBackend`]. The flow only relies on the contract: a configuration goes
//! in, a project directory comes out, and synthesis leaves its reports at
//! well-known locations inside that directory.

use crate::config::ModelConfig;
use crate::error::Result;
use crate::gate::SynthesisPlan;
use crate::toolchain::RunLimits;
use std::fmt::Debug;
use std::path::{Path, PathBuf};

/// HLS code generation and synthesis
pub trait HlsBackend: Debug + Send + Sync {
    /// Backend name for logs and errors
    fn name(&self) -> &str;

    /// Generate a buildable project from a configuration
    ///
    /// # Errors
    ///
    /// Returns error if the project cannot be generated.
    fn convert(&self, config: &ModelConfig) -> Result<HlsProject>;

    /// Run the requested synthesis stages
    ///
    /// # Errors
    ///
    /// Returns error if a stage fails, exceeds its limits or leaves no report.
    fn synthesize(
        &self,
        project: &HlsProject,
        plan: SynthesisPlan,
        limits: &RunLimits,
    ) -> Result<SynthesisReports>;
}

/// Generated project on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsProject {
    output_dir: PathBuf,
    project_name: String,
}

impl HlsProject {
    /// Project rooted at `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>, project_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            project_name: project_name.into(),
        }
    }

    /// Project directory
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Top-level project name
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// C synthesis report location
    pub fn csynth_report(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_prj", self.project_name))
            .join("solution1")
            .join("syn")
            .join("report")
            .join(format!("{}_csynth.rpt", self.project_name))
    }

    /// RTL synthesis report location
    pub fn vsynth_report(&self) -> PathBuf {
        self.output_dir.join("vivado_synth.rpt")
    }
}

/// Reports produced by a synthesis run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisReports {
    /// C synthesis report, when that stage ran
    pub csynth: Option<PathBuf>,
    /// RTL synthesis report, when that stage ran
    pub vsynth: Option<PathBuf>,
}
