//! Generation pipeline
//!
//! ```text
//! load network → generate config → build (emulated model, project, manifest header)
//!   → [test trained vs hardware model] → gate → [synthesize] → append reports
//! ```
//!
//! Stages run one after another. Configuration errors stop the run before
//! anything is written; a gate rejection is recorded in the manifest and
//! ends the run successfully.

use crate::backend::{HlsBackend, HlsProject, SynthesisReports};
use crate::builder::ModelBuilder;
use crate::config::{ConfigGenerator, InterfaceLayers, IoType, ModelDefaults, ProjectTarget};
use crate::equivalence::{EquivalenceTester, TestOutcome, Variant};
use crate::error::Result;
use crate::gate::{GateDecision, SynthesisGate};
use crate::manifest::ManifestWriter;
use crate::settings::FlowSettings;
use crate::toolchain::RunLimits;
use hlsq_models::{DatasetProvider, NetworkProvider};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{info, warn};

/// How a pipeline run ended
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Every requested stage ran
    Completed {
        /// Generated project
        project: HlsProject,
        /// Equivalence results, when testing ran
        test: Option<TestOutcome>,
        /// Synthesis reports, when synthesis ran
        reports: SynthesisReports,
    },
    /// The gate stopped the run before synthesis
    Rejected {
        /// Generated project
        project: HlsProject,
        /// Equivalence results that failed the gate
        test: TestOutcome,
        /// Gate decision
        decision: GateDecision,
    },
}

/// One settings-driven generation run
pub struct Pipeline<'a> {
    settings: FlowSettings,
    networks: &'a dyn NetworkProvider,
    datasets: &'a dyn DatasetProvider,
    backend: &'a dyn HlsBackend,
    defaults: ModelDefaults,
    interface: InterfaceLayers,
    generator_name: String,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> Pipeline<'a> {
    /// Pipeline with injected loaders and backend
    pub fn new(
        settings: FlowSettings,
        networks: &'a dyn NetworkProvider,
        datasets: &'a dyn DatasetProvider,
        backend: &'a dyn HlsBackend,
    ) -> Self {
        Self {
            settings,
            networks,
            datasets,
            backend,
            defaults: ModelDefaults::default(),
            interface: InterfaceLayers::default(),
            generator_name: env!("CARGO_PKG_NAME").to_string(),
            cancel: None,
        }
    }

    /// Identify interface layers differently
    #[must_use]
    pub fn with_interface(mut self, interface: InterfaceLayers) -> Self {
        self.interface = interface;
        self
    }

    /// Name recorded in the manifest as the generating program
    #[must_use]
    pub fn with_generator_name(mut self, name: impl Into<String>) -> Self {
        self.generator_name = name.into();
        self
    }

    /// Flag that cancels running synthesis when set
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Settings of this run
    pub const fn settings(&self) -> &FlowSettings {
        &self.settings
    }

    /// Run every stage.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure. A gate rejection is not an error.
    pub fn run(&self) -> Result<PipelineOutcome> {
        let settings = &self.settings;

        info!("Generating neural network");
        let network = self.networks.load_network(&settings.weights_path)?;

        let config = ConfigGenerator::new(settings.interface_precision)
            .with_defaults(self.defaults)
            .with_override(settings.overrides.clone())
            .with_interface(self.interface.clone())
            .generate(
                network.graph(),
                ProjectTarget::new(&settings.project_path, &settings.weights_path),
            )?;

        let manifest = ManifestWriter::new(&settings.project_path);
        let params = settings.parameter_record(&self.defaults, IoType::default());
        let built = ModelBuilder::new(self.backend, &manifest)
            .with_generator(&self.generator_name)
            .build(&config, &network, &params)?;

        let mut test = None;
        if let Some(data_path) = &settings.test_data_path {
            info!("Testing networks prior to synthesis");
            let dataset = self.datasets.load_dataset(data_path)?;
            let outcome = EquivalenceTester::new()
                .with_model(Variant::Trained, &network)
                .with_model(Variant::Emulated, &built.emulated)
                .run(&dataset)?;
            info!("{}", outcome.report().trim_end());
            manifest.append_test_results(&outcome)?;

            if let Some(agreement) = outcome.agreement(Variant::Emulated, Variant::Trained) {
                let decision = SynthesisGate::new(settings.match_threshold).evaluate(agreement);
                if !decision.is_proceed() {
                    warn!(
                        "Network fails to meet match threshold of {}%",
                        settings.match_threshold
                    );
                    manifest.append_rejection(settings.match_threshold)?;
                    return Ok(PipelineOutcome::Rejected {
                        project: built.project,
                        test: outcome,
                        decision,
                    });
                }
            }
            test = Some(outcome);
        }

        let reports = if settings.plan.is_empty() {
            SynthesisReports::default()
        } else {
            let mut limits = RunLimits::unlimited().with_timeout(settings.synth_timeout);
            limits.cancel.clone_from(&self.cancel);
            let reports = self.backend.synthesize(&built.project, settings.plan, &limits)?;
            info!("Synthesis complete. Serializing results to {}", manifest.path().display());
            manifest.append_synthesis_reports(&reports)?;
            reports
        };

        Ok(PipelineOutcome::Completed {
            project: built.project,
            test,
            reports,
        })
    }
}
