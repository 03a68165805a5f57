//! Append-only project manifest
//!
//! `<output_dir>/.project_info` records how a project was generated and what
//! every later stage found. The file is opened in append mode for every
//! block and each block goes out in a single write, so the file only ever
//! grows by whole blocks.

use crate::backend::SynthesisReports;
use crate::equivalence::TestOutcome;
use crate::error::{FlowError, Result};
use crate::tree::ConfigMap;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Manifest file name inside the output directory
pub const MANIFEST_FILE: &str = ".project_info";

/// Generation parameters, dumped as pretty JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterRecord {
    /// Interface total bits
    pub interface_word_width: u32,
    /// Interface integer bits
    pub interface_int_width: u32,
    /// Training total bits
    pub training_word_width: u32,
    /// Training integer bits
    pub training_int_width: u32,
    /// Interface precision
    pub interface_precision: String,
    /// Interior default precision
    pub default_precision: String,
    /// Overridden attributes
    pub quantizers_to_modify: Vec<String>,
    /// Override precision
    pub modified_quantizer: String,
    /// Global reuse factor
    pub default_reuse_factor: u32,
    /// Global strategy
    pub default_strategy: String,
    /// I/O mode
    pub io_type: String,
}

/// Contents of the first manifest block
#[derive(Debug, Clone)]
pub struct ManifestHeader<'a> {
    /// Program that generated the project
    pub generator: &'a str,
    /// FPGA part
    pub part: &'a str,
    /// Generation time
    pub generated_at: DateTime<Local>,
    /// Network source
    pub model_source: &'a Path,
    /// Architecture summary table
    pub summary: &'a str,
    /// Rendered configuration
    pub config: &'a ConfigMap,
    /// Generation parameters
    pub params: &'a ParameterRecord,
}

/// Appends blocks to one project's manifest
#[derive(Debug)]
pub struct ManifestWriter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ManifestWriter {
    /// Writer for `<output_dir>/.project_info`
    pub fn new(output_dir: &Path) -> Self {
        Self {
            path: output_dir.join(MANIFEST_FILE),
            lock: Mutex::new(()),
        }
    }

    /// Manifest location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one block.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or written.
    pub fn append(&self, block: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        file.flush()?;
        debug!("Appended {} bytes to {}", block.len(), self.path.display());
        Ok(())
    }

    /// Append the generation header.
    ///
    /// # Errors
    ///
    /// Returns error if the parameters cannot be serialized or the block
    /// cannot be written.
    pub fn write_header(&self, header: &ManifestHeader<'_>) -> Result<()> {
        let params = serde_json::to_string_pretty(header.params)
            .map_err(|e| FlowError::Io { source: e.into() })?;

        let mut block = String::new();
        let _ = writeln!(
            block,
            "Project generated via {} for FPGA part {} at {}\n",
            header.generator,
            header.part,
            header.generated_at.format("%Y-%m-%d %H:%M:%S%.6f")
        );
        let _ = writeln!(
            block,
            "The neural network was initialized with {} and had the following architecture summary:",
            header.model_source.display()
        );
        let _ = writeln!(block, "{}\n\n", header.summary);
        let _ = writeln!(block, "The corresponding HLS configuration was:");
        block.push_str(&header.config.render());
        let _ = writeln!(block, "The generation parameters used were:");
        let _ = write!(block, "{params}\n\n");
        self.append(&block)
    }

    /// Append equivalence test results.
    ///
    /// # Errors
    ///
    /// Returns error if the block cannot be written.
    pub fn append_test_results(&self, outcome: &TestOutcome) -> Result<()> {
        let mut block = format!(
            "The models were tested against {} test samples\n",
            outcome.sample_count()
        );
        for a in outcome.accuracies() {
            let _ = writeln!(
                block,
                "The {} achieved an accuracy of: {:.2}%",
                a.variant, a.percentage
            );
        }
        for p in outcome.agreements() {
            let _ = writeln!(
                block,
                "The {} matched the {} {:.2}% of the time",
                p.variant, p.baseline, p.percentage
            );
        }
        for (variant, line) in outcome.malformed() {
            let _ = writeln!(block, "Ignored {variant} log {line}");
        }
        self.append(&block)
    }

    /// Record that the gate stopped the run.
    ///
    /// # Errors
    ///
    /// Returns error if the block cannot be written.
    pub fn append_rejection(&self, threshold: f64) -> Result<()> {
        self.append(&format!(
            "Network fails to meet match threshold of {threshold}%. Skipping build of network\n"
        ))
    }

    /// Copy a synthesis report into the manifest verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::ReportMissing`] if the report does not exist, or
    /// an I/O error if it cannot be read or appended.
    pub fn append_report(&self, heading: &str, report: &Path) -> Result<()> {
        if !report.is_file() {
            return Err(FlowError::ReportMissing {
                path: report.to_path_buf(),
            });
        }
        let text = fs::read_to_string(report)?;
        self.append(&format!("{heading}\n\n{text}\n\n"))
    }

    /// Copy every report a synthesis run produced, C synthesis first.
    ///
    /// # Errors
    ///
    /// Same as [`ManifestWriter::append_report`].
    pub fn append_synthesis_reports(&self, reports: &SynthesisReports) -> Result<()> {
        if let Some(path) = &reports.csynth {
            self.append_report(
                "C++ to Verilog HLS synthesis was performed\nDumping HLS csynth report:",
                path,
            )?;
        }
        if let Some(path) = &reports.vsynth {
            self.append_report(
                "Verilog synthesis was performed\nDumping Vivado synthesis report:",
                path,
            )?;
        }
        Ok(())
    }
}
