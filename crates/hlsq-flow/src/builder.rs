//! Model builder
//!
//! Turns a [`ModelConfig`] and the loaded network into the artifacts of a
//! generation run: the emulated hardware model, the backend project, and the
//! manifest header.

use crate::backend::{HlsBackend, HlsProject};
use crate::backends::EmulatedNetwork;
use crate::config::ModelConfig;
use crate::error::Result;
use crate::manifest::{ManifestHeader, ManifestWriter, ParameterRecord};
use chrono::Local;
use hlsq_models::Network;
use tracing::info;

/// Output of a successful build
#[derive(Debug)]
pub struct BuiltModel {
    /// Simulatable hardware model
    pub emulated: EmulatedNetwork,
    /// Generated project
    pub project: HlsProject,
}

/// Builds the hardware model and project for one configuration
#[derive(Debug)]
pub struct ModelBuilder<'a> {
    backend: &'a dyn HlsBackend,
    manifest: &'a ManifestWriter,
    generator: String,
}

impl<'a> ModelBuilder<'a> {
    /// Builder using `backend`, recording to `manifest`
    pub fn new(backend: &'a dyn HlsBackend, manifest: &'a ManifestWriter) -> Self {
        Self {
            backend,
            manifest,
            generator: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    /// Name recorded as the generating program
    #[must_use]
    pub fn with_generator(mut self, generator: impl Into<String>) -> Self {
        self.generator = generator.into();
        self
    }

    /// Build.
    ///
    /// The configuration is checked against the network before the backend
    /// is called; the manifest header is written once the project exists.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the configuration names layers or
    /// attributes the network does not have, or the backend error if
    /// project generation fails.
    pub fn build(
        &self,
        config: &ModelConfig,
        network: &Network,
        params: &ParameterRecord,
    ) -> Result<BuiltModel> {
        config.layers().check_against(network.graph())?;

        info!("Setting up HLS project with {}...", self.backend.name());
        let emulated = EmulatedNetwork::new(network, config);
        let project = self.backend.convert(config)?;

        info!("Dumping initial parameter settings to {}", self.manifest.path().display());
        let target = config.target();
        self.manifest.write_header(&ManifestHeader {
            generator: &self.generator,
            part: &target.part,
            generated_at: Local::now(),
            model_source: &target.model_source,
            summary: &network.summary(),
            config: &config.to_tree(),
            params,
        })?;

        Ok(BuiltModel { emulated, project })
    }
}
