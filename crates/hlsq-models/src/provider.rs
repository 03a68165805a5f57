//! Injectable network and dataset loaders
//!
//! The pipeline never hard-codes how a trained network or its test data are
//! read. Callers hand it a [`NetworkProvider`] and a [`DatasetProvider`];
//! the JSON providers here cover the formats the `hlsq` binary reads.

use crate::dataset::Dataset;
use crate::error::{ModelError, Result};
use crate::network::Network;
use std::fs;
use std::path::Path;

/// Loads a trained network from a model source
pub trait NetworkProvider: Send + Sync {
    /// Load the network stored at `source`
    ///
    /// # Errors
    ///
    /// Returns error if the source cannot be read or describes an invalid network.
    fn load_network(&self, source: &Path) -> Result<Network>;
}

/// Loads labelled test data
pub trait DatasetProvider: Send + Sync {
    /// Load the dataset stored at `source`
    ///
    /// # Errors
    ///
    /// Returns error if the source cannot be read or is inconsistent.
    fn load_dataset(&self, source: &Path) -> Result<Dataset>;
}

/// Reads networks from the JSON network description
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonNetworkProvider;

/// Reads datasets from `{"samples": …, "labels": …}` JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDatasetProvider;

impl NetworkProvider for JsonNetworkProvider {
    fn load_network(&self, source: &Path) -> Result<Network> {
        tracing::info!("Loading network from: {}", source.display());
        let network = Network::from_json(&read_source(source)?)?;
        tracing::info!(
            "Network '{}': {} layers, {} parameters",
            network.name(),
            network.layers().len(),
            network.parameter_count()
        );
        Ok(network)
    }
}

impl DatasetProvider for JsonDatasetProvider {
    fn load_dataset(&self, source: &Path) -> Result<Dataset> {
        tracing::info!("Loading test data from: {}", source.display());
        let dataset = Dataset::from_json(&read_source(source)?)?;
        tracing::debug!(
            "Dataset: {} samples, {} classes",
            dataset.len(),
            dataset.num_classes()
        );
        Ok(dataset)
    }
}

fn read_source(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(ModelError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("weights.json");
        assert!(matches!(
            JsonNetworkProvider.load_network(&missing),
            Err(ModelError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_load_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let net_path = temp_dir.path().join("net.json");
        let data_path = temp_dir.path().join("data.json");
        fs::write(
            &net_path,
            r#"{"name": "id", "input_size": 2, "layers": [{"name": "input_layer", "kind": "input"}]}"#,
        )
        .unwrap();
        fs::write(&data_path, r#"{"samples": [[1.0, 0.0]], "labels": [0]}"#).unwrap();

        let net = JsonNetworkProvider.load_network(&net_path).unwrap();
        let data = JsonDatasetProvider.load_dataset(&data_path).unwrap();
        assert_eq!(net.output_size(), 2);
        assert_eq!(data.len(), 1);
    }

    #[test]
    fn test_malformed_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("data.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonDatasetProvider.load_dataset(&path),
            Err(ModelError::ParseError { .. })
        ));
    }
}
