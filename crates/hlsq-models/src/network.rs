//! Sequential network representation and floating-point inference

use crate::error::{ModelError, Result};
use crate::graph::{LayerDescriptor, NetworkGraph};
use crate::inference::Classifier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

/// Element-wise (or vector-wise, for softmax) activation function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    /// Identity
    Linear,
    /// max(0, x)
    Relu,
    /// Logistic function
    Sigmoid,
    /// Hyperbolic tangent
    Tanh,
    /// Normalised exponential over the whole vector
    Softmax,
}

impl Activation {
    /// Apply the activation in place
    pub fn apply(self, values: &mut [f32]) {
        match self {
            Self::Linear => {}
            Self::Relu => values.iter_mut().for_each(|v| *v = v.max(0.0)),
            Self::Sigmoid => values
                .iter_mut()
                .for_each(|v| *v = 1.0 / (1.0 + (-*v).exp())),
            Self::Tanh => values.iter_mut().for_each(|v| *v = v.tanh()),
            Self::Softmax => {
                let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let mut sum = 0.0f32;
                for v in values.iter_mut() {
                    *v = (*v - max).exp();
                    sum += *v;
                }
                if sum > 0.0 {
                    values.iter_mut().for_each(|v| *v /= sum);
                }
            }
        }
    }
}

/// What a layer computes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerKind {
    /// Network input (identity)
    Input,

    /// Fully connected layer: `y = W·x + b`
    Dense {
        /// One row per output unit, each row as wide as the layer input
        weights: Vec<Vec<f32>>,
        /// One bias per output unit
        bias: Vec<f32>,
    },

    /// Activation layer
    Activation {
        /// Activation function
        function: Activation,
    },
}

impl LayerKind {
    /// Class name the HLS backend uses for this layer
    pub fn class_name(&self) -> &'static str {
        match self {
            Self::Input => "InputLayer",
            Self::Dense { .. } => "Dense",
            Self::Activation {
                function: Activation::Softmax,
            } => "Softmax",
            Self::Activation { .. } => "Activation",
        }
    }

    /// Configurable precision attributes, in backend order.
    ///
    /// Layers without attributes carry one scalar precision.
    pub fn precision_attributes(&self) -> &'static [&'static str] {
        match self {
            Self::Input => &[],
            Self::Dense { .. } => &["weight", "bias", "result", "accum"],
            Self::Activation {
                function: Activation::Softmax,
            } => &["result", "exp_table", "inv_table"],
            Self::Activation { .. } => &[],
        }
    }

    /// Number of trainable parameters
    pub fn parameter_count(&self) -> usize {
        match self {
            Self::Dense { weights, bias } => weights.iter().map(Vec::len).sum::<usize>() + bias.len(),
            _ => 0,
        }
    }
}

/// Named network layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    /// Layer name
    pub name: String,

    /// Layer computation
    #[serde(flatten)]
    pub kind: LayerKind,
}

/// On-disk network description
#[derive(Debug, Deserialize)]
struct NetworkFile {
    name: String,
    input_size: usize,
    layers: Vec<Layer>,
}

/// Trained sequential network
#[derive(Debug, Clone)]
pub struct Network {
    name: String,
    input_size: usize,
    layers: Vec<Layer>,
    widths: Vec<usize>,
    graph: NetworkGraph,
}

impl Network {
    /// Build and validate a network.
    ///
    /// # Errors
    ///
    /// Returns error if there are no layers, names repeat, or dense layer
    /// dimensions do not chain.
    pub fn new(name: impl Into<String>, input_size: usize, layers: Vec<Layer>) -> Result<Self> {
        let name = name.into();
        if layers.is_empty() {
            return Err(ModelError::invalid_layer(format!("network '{name}' has no layers")));
        }
        if input_size == 0 {
            return Err(ModelError::invalid_layer("input size must be positive"));
        }

        let mut seen = HashSet::new();
        let mut widths = Vec::with_capacity(layers.len());
        let mut width = input_size;

        for layer in &layers {
            if !seen.insert(layer.name.as_str()) {
                return Err(ModelError::invalid_layer(format!(
                    "duplicate layer name '{}'",
                    layer.name
                )));
            }
            if let LayerKind::Dense { weights, bias } = &layer.kind {
                if weights.is_empty() {
                    return Err(ModelError::invalid_layer(format!(
                        "dense layer '{}' has no output units",
                        layer.name
                    )));
                }
                if let Some(row) = weights.iter().position(|r| r.len() != width) {
                    return Err(ModelError::invalid_layer(format!(
                        "dense layer '{}' row {row} has {} weights, expected {width}",
                        layer.name,
                        weights[row].len()
                    )));
                }
                if bias.len() != weights.len() {
                    return Err(ModelError::invalid_layer(format!(
                        "dense layer '{}' has {} biases for {} units",
                        layer.name,
                        bias.len(),
                        weights.len()
                    )));
                }
                width = weights.len();
            }
            widths.push(width);
        }

        let graph = build_graph(&layers);
        tracing::debug!("Network '{}': {} layers, {} outputs", name, layers.len(), width);

        Ok(Self {
            name,
            input_size,
            layers,
            widths,
            graph,
        })
    }

    /// Parse a network from its JSON description.
    ///
    /// # Errors
    ///
    /// Returns error if the JSON is malformed or the network is invalid.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: NetworkFile = serde_json::from_str(text)
            .map_err(|e| ModelError::parse_error("network description", e.to_string()))?;
        Self::new(file.name, file.input_size, file.layers)
    }

    /// Network name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of input features
    pub const fn input_size(&self) -> usize {
        self.input_size
    }

    /// Number of output classes
    pub fn output_size(&self) -> usize {
        self.widths.last().copied().unwrap_or(self.input_size)
    }

    /// Layers in execution order
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Introspected layer graph
    pub fn graph(&self) -> &NetworkGraph {
        &self.graph
    }

    /// Total trainable parameters
    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(|l| l.kind.parameter_count()).sum()
    }

    /// Floating-point forward pass.
    ///
    /// # Errors
    ///
    /// Returns error if the sample width does not match the input size.
    pub fn forward(&self, sample: &[f32]) -> Result<Vec<f32>> {
        if sample.len() != self.input_size {
            return Err(ModelError::InputSize {
                expected: self.input_size,
                actual: sample.len(),
            });
        }

        let mut x = sample.to_vec();
        for layer in &self.layers {
            match &layer.kind {
                LayerKind::Input => {}
                LayerKind::Dense { weights, bias } => x = dense_forward(weights, bias, &x),
                LayerKind::Activation { function } => function.apply(&mut x),
            }
        }
        Ok(x)
    }

    /// Architecture summary table
    pub fn summary(&self) -> String {
        let rule = "_".repeat(65);
        let double = "=".repeat(65);
        let mut out = String::new();

        let _ = writeln!(out, "Model: \"{}\"", self.name);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, " {:<28}{:<26}{}", "Layer (type)", "Output Shape", "Param #");
        let _ = writeln!(out, "{double}");
        for (layer, width) in self.layers.iter().zip(&self.widths) {
            let label = format!("{} ({})", layer.name, layer.kind.class_name());
            let shape = format!("(None, {width})");
            let _ = writeln!(out, " {label:<28}{shape:<26}{}", layer.kind.parameter_count());
        }
        let _ = writeln!(out, "{double}");
        let _ = writeln!(out, "Total params: {}", self.parameter_count());
        let _ = write!(out, "{rule}");
        out
    }
}

impl Classifier for Network {
    fn name(&self) -> &str {
        &self.name
    }

    fn scores(&self, sample: &[f32]) -> Result<Vec<f32>> {
        self.forward(sample)
    }
}

/// Fully connected layer in `f32`
pub fn dense_forward(weights: &[Vec<f32>], bias: &[f32], input: &[f32]) -> Vec<f32> {
    weights
        .iter()
        .zip(bias)
        .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>() + b)
        .collect()
}

fn build_graph(layers: &[Layer]) -> NetworkGraph {
    let descriptors = layers
        .iter()
        .enumerate()
        .map(|(i, layer)| LayerDescriptor {
            name: layer.name.clone(),
            class_name: layer.kind.class_name().to_string(),
            attributes: layer
                .kind
                .precision_attributes()
                .iter()
                .map(ToString::to_string)
                .collect(),
            parents: i
                .checked_sub(1)
                .map(|p| vec![layers[p].name.clone()])
                .unwrap_or_default(),
            children: layers
                .get(i + 1)
                .map(|c| vec![c.name.clone()])
                .unwrap_or_default(),
        })
        .collect();
    NetworkGraph::new(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TINY: &str = r#"{
        "name": "tiny",
        "input_size": 2,
        "layers": [
            {"name": "input_layer", "kind": "input"},
            {"name": "dense_1", "kind": "dense", "weights": [[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]], "bias": [0.0, 0.5, -3.0]},
            {"name": "relu_1", "kind": "activation", "function": "relu"},
            {"name": "output_layer", "kind": "activation", "function": "softmax"}
        ]
    }"#;

    #[test]
    fn test_parse_and_graph() {
        let net = Network::from_json(TINY).unwrap();
        assert_eq!(net.output_size(), 3);
        assert_eq!(net.parameter_count(), 9);

        let graph = net.graph();
        assert_eq!(graph.len(), 4);
        let dense = graph.get("dense_1").unwrap();
        assert_eq!(dense.class_name, "Dense");
        assert_eq!(dense.attributes, ["weight", "bias", "result", "accum"]);
        assert_eq!(dense.parents, ["input_layer"]);
        assert_eq!(dense.children, ["relu_1"]);
        assert!(!graph.get("relu_1").unwrap().is_attribute_keyed());
        assert_eq!(graph.get("output_layer").unwrap().class_name, "Softmax");
    }

    #[test]
    fn test_forward() {
        let net = Network::from_json(TINY).unwrap();
        let out = net.forward(&[2.0, 1.0]).unwrap();
        // pre-softmax [2.0, 1.5, 0.0]
        assert_eq!(out.len(), 3);
        assert!((out.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!(out[0] > out[1] && out[1] > out[2]);
    }

    #[test]
    fn test_forward_rejects_wrong_width() {
        let net = Network::from_json(TINY).unwrap();
        assert!(matches!(
            net.forward(&[1.0]),
            Err(ModelError::InputSize { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_rejects_bad_dimensions() {
        let layers = vec![Layer {
            name: "dense".into(),
            kind: LayerKind::Dense {
                weights: vec![vec![1.0, 2.0, 3.0]],
                bias: vec![0.0],
            },
        }];
        assert!(matches!(
            Network::new("bad", 2, layers),
            Err(ModelError::InvalidLayer { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let layer = Layer {
            name: "same".into(),
            kind: LayerKind::Input,
        };
        assert!(Network::new("dup", 1, vec![layer.clone(), layer]).is_err());
    }

    #[test]
    fn test_summary_lists_layers() {
        let net = Network::from_json(TINY).unwrap();
        let summary = net.summary();
        assert!(summary.starts_with("Model: \"tiny\""));
        assert!(summary.contains("dense_1 (Dense)"));
        assert!(summary.contains("(None, 3)"));
        assert!(summary.contains("Total params: 9"));
    }
}
