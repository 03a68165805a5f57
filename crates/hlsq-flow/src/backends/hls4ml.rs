//! hls4ml command-line backend
//!
//! Writes the configuration tree to `<out>/hls4ml_config.yml` (JSON, which
//! hls4ml's YAML loader accepts) and drives the `hls4ml` CLI:
//!
//! ```text
//! hls4ml convert -c <out>/hls4ml_config.yml
//! hls4ml build -p <out> -s [-l]
//! ```
//!
//! The vendor binaries directory is put on the search path of each child.

use crate::backend::{HlsBackend, HlsProject, SynthesisReports};
use crate::config::ModelConfig;
use crate::error::{FlowError, Result};
use crate::gate::SynthesisPlan;
use crate::toolchain::{self, RunLimits, Toolchain};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Configuration file name inside the output directory
pub const CONFIG_FILE: &str = "hls4ml_config.yml";

const BACKEND_NAME: &str = "hls4ml";

/// Backend driving the `hls4ml` CLI
#[derive(Debug, Clone)]
pub struct Hls4mlBackend {
    toolchain: Toolchain,
    program: PathBuf,
}

impl Hls4mlBackend {
    /// Backend using the `hls4ml` found on the toolchain search path
    pub fn new(toolchain: Toolchain) -> Self {
        Self {
            toolchain,
            program: PathBuf::from("hls4ml"),
        }
    }

    /// Use a specific `hls4ml` executable
    #[must_use]
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Path of the configuration file for a project directory
    pub fn config_path(output_dir: &Path) -> PathBuf {
        output_dir.join(CONFIG_FILE)
    }
}

impl HlsBackend for Hls4mlBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    fn convert(&self, config: &ModelConfig) -> Result<HlsProject> {
        let target = config.target();
        fs::create_dir_all(&target.output_dir)?;

        let config_path = Self::config_path(&target.output_dir);
        let text = serde_json::to_string_pretty(&config.to_tree())
            .map_err(|e| FlowError::backend(BACKEND_NAME, e.to_string()))?;
        fs::write(&config_path, text)?;
        info!("Wrote {}", config_path.display());

        let mut command = self.toolchain.command(&self.program)?;
        command.arg("convert").arg("-c").arg(&config_path);
        toolchain::run(&mut command, &RunLimits::unlimited())?;

        Ok(HlsProject::new(&target.output_dir, &target.project_name))
    }

    fn synthesize(
        &self,
        project: &HlsProject,
        plan: SynthesisPlan,
        limits: &RunLimits,
    ) -> Result<SynthesisReports> {
        if plan.is_empty() {
            return Ok(SynthesisReports::default());
        }

        let mut command = self.toolchain.command(&self.program)?;
        command.arg("build").arg("-p").arg(project.output_dir()).arg("-s");
        if plan.vsynth() {
            command.arg("-l");
        }
        info!("Synthesizing {} ({plan})", project.project_name());
        toolchain::run(&mut command, limits)?;

        let expect = |path: PathBuf| {
            if path.is_file() {
                Ok(path)
            } else {
                Err(FlowError::ReportMissing { path })
            }
        };
        Ok(SynthesisReports {
            csynth: Some(expect(project.csynth_report())?),
            vsynth: if plan.vsynth() {
                Some(expect(project.vsynth_report())?)
            } else {
                None
            },
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::config::{ConfigGenerator, ProjectTarget};
    use hlsq_fixed::PrecisionSpec;
    use hlsq_models::Network;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Records its arguments and creates the reports a real build leaves behind
    const FAKE_HLS4ML: &str = r#"#!/bin/sh
echo "$@" >> "$(dirname "$0")/calls"
if [ "$1" = "build" ]; then
  mkdir -p "$3/myproject_prj/solution1/syn/report"
  echo "csynth report" > "$3/myproject_prj/solution1/syn/report/myproject_csynth.rpt"
  for a in "$@"; do
    if [ "$a" = "-l" ]; then echo "vsynth report" > "$3/vivado_synth.rpt"; fi
  done
fi
"#;

    fn setup() -> (TempDir, Hls4mlBackend, ModelConfig) {
        let temp_dir = TempDir::new().unwrap();
        let bin = temp_dir.path().join("bin");
        fs::create_dir_all(&bin).unwrap();
        let tool = bin.join("hls4ml");
        fs::write(&tool, FAKE_HLS4ML).unwrap();
        fs::set_permissions(&tool, fs::Permissions::from_mode(0o755)).unwrap();

        let network = Network::from_json(
            r#"{"name": "id", "input_size": 1, "layers": [
                {"name": "input_layer", "kind": "input"},
                {"name": "output_layer", "kind": "activation", "function": "linear"}
            ]}"#,
        )
        .unwrap();
        let config = ConfigGenerator::new(PrecisionSpec::new(12, 2).unwrap())
            .generate(
                network.graph(),
                ProjectTarget::new(temp_dir.path().join("proj"), "id.json"),
            )
            .unwrap();
        (temp_dir, Hls4mlBackend::new(Toolchain::new(bin)), config)
    }

    #[test]
    fn test_convert_writes_config_and_calls_cli() {
        let (temp_dir, backend, config) = setup();
        let project = backend.convert(&config).unwrap();

        let written = fs::read_to_string(temp_dir.path().join("proj").join(CONFIG_FILE)).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["IOType"], "io_stream");
        assert_eq!(
            json["HLSConfig"]["LayerName"]["output_layer"]["Strategy"],
            "Stable"
        );
        assert_eq!(project.project_name(), "myproject");

        let calls = fs::read_to_string(temp_dir.path().join("bin").join("calls")).unwrap();
        assert!(calls.starts_with("convert -c "));
    }

    #[test]
    fn test_synthesize_collects_reports() {
        let (_temp_dir, backend, config) = setup();
        let project = backend.convert(&config).unwrap();

        let none = backend
            .synthesize(&project, SynthesisPlan::NONE, &RunLimits::unlimited())
            .unwrap();
        assert_eq!(none, SynthesisReports::default());

        let reports = backend
            .synthesize(&project, SynthesisPlan::new(true, true).unwrap(), &RunLimits::unlimited())
            .unwrap();
        assert_eq!(reports.csynth, Some(project.csynth_report()));
        assert_eq!(reports.vsynth, Some(project.vsynth_report()));
    }

    #[test]
    fn test_missing_cli_is_backend_error() {
        let (_temp_dir, backend, config) = setup();
        let backend = backend.with_program("/nonexistent/hls4ml");
        assert!(matches!(backend.convert(&config), Err(FlowError::Backend { .. })));
    }
}
