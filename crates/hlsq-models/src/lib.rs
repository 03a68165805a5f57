#![deny(unsafe_code)]

//! Trained-network boundary for the hlsq HLS generator
//!
//! This crate describes the quantization-aware network that is about to be
//! lowered to hardware, and the labelled test data it is verified against.
//!
//! - [`NetworkGraph`] / [`LayerDescriptor`]: the introspected layer graph the
//!   configuration generator walks (names, configurable precision attributes,
//!   parent/child links)
//! - [`Network`]: a sequential network with floating-point inference, the
//!   reference every hardware variant is compared to
//! - [`Dataset`]: test samples with ground-truth class labels
//! - [`NetworkProvider`] / [`DatasetProvider`]: injectable loaders, with JSON
//!   implementations
//!
//! # Example
//!
//! ```no_run
//! use hlsq_models::{JsonNetworkProvider, NetworkProvider};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let network = JsonNetworkProvider.load_network("weights/weights.json".as_ref())?;
//!
//! println!("Network: {}", network.name());
//! println!("Layers: {}", network.graph().len());
//! println!("{}", network.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod dataset;
mod error;
mod graph;
mod inference;
mod network;
mod provider;

pub use dataset::Dataset;
pub use error::{ModelError, Result};
pub use graph::{LayerDescriptor, NetworkGraph};
pub use inference::{argmax, Classifier};
pub use network::{dense_forward, Activation, Layer, LayerKind, Network};
pub use provider::{DatasetProvider, JsonDatasetProvider, JsonNetworkProvider, NetworkProvider};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{
        Classifier, Dataset, DatasetProvider, LayerDescriptor, Network, NetworkGraph,
        NetworkProvider, Result,
    };
}
