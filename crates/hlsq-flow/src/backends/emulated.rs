// SPDX-License-Identifier: AGPL-3.0-only

//! Emulated hardware model
//!
//! Runs the trained network the way the generated hardware computes it:
//! every weight, bias, accumulator, activation and table lookup is quantized
//! to the precision the configuration assigns it, with the configured
//! rounding and overflow behavior.
//!
//! ## Precision model
//!
//! ```text
//! input           →  input layer precision
//! dense           →  weight / bias quantized once at construction,
//!                    accumulator quantized after every multiply-add,
//!                    output quantized to `result`
//! activation      →  function in f64, output quantized to the layer precision
//! softmax         →  exp values to `exp_table`, 1/Σ to `inv_table`,
//!                    output to `result`
//! ```
//!
//! Scalar layer precisions apply to every step of that layer. Layers or
//! attributes the configuration does not mention use the model default.

use crate::config::{LayerPrecision, ModelConfig};
use hlsq_fixed::PrecisionSpec;
use hlsq_models::{Activation, Classifier, LayerKind, ModelError, Network};
use tracing::debug;

#[derive(Debug, Clone)]
enum EmulatedLayer {
    Quantize {
        precision: PrecisionSpec,
    },
    Dense {
        weights: Vec<Vec<f64>>,
        bias: Vec<f64>,
        accum: PrecisionSpec,
        result: PrecisionSpec,
    },
    Activation {
        function: Activation,
        result: PrecisionSpec,
    },
    Softmax {
        exp_table: PrecisionSpec,
        inv_table: PrecisionSpec,
        result: PrecisionSpec,
    },
}

/// Bit-accurate fixed-point model of the generated hardware
#[derive(Debug, Clone)]
pub struct EmulatedNetwork {
    name: String,
    input_size: usize,
    layers: Vec<EmulatedLayer>,
}

impl EmulatedNetwork {
    /// Build the emulation of `network` under `config`
    pub fn new(network: &Network, config: &ModelConfig) -> Self {
        let default = config.defaults().precision;
        let layers = network
            .layers()
            .iter()
            .map(|layer| {
                let precision = config.layers().get(&layer.name).map(|s| &s.precision);
                let attr = |name: &str| {
                    precision
                        .and_then(|p: &LayerPrecision| p.get(name))
                        .unwrap_or(default)
                };
                match &layer.kind {
                    LayerKind::Input => EmulatedLayer::Quantize {
                        precision: attr("result"),
                    },
                    LayerKind::Dense { weights, bias } => {
                        let weight = attr("weight");
                        let bias_precision = attr("bias");
                        EmulatedLayer::Dense {
                            weights: weights
                                .iter()
                                .map(|row| row.iter().map(|&w| weight.quantize(f64::from(w))).collect())
                                .collect(),
                            bias: bias
                                .iter()
                                .map(|&b| bias_precision.quantize(f64::from(b)))
                                .collect(),
                            accum: attr("accum"),
                            result: attr("result"),
                        }
                    }
                    LayerKind::Activation {
                        function: Activation::Softmax,
                    } => EmulatedLayer::Softmax {
                        exp_table: attr("exp_table"),
                        inv_table: attr("inv_table"),
                        result: attr("result"),
                    },
                    LayerKind::Activation { function } => EmulatedLayer::Activation {
                        function: *function,
                        result: attr("result"),
                    },
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "Emulating '{}' with {} fixed-point layers",
            network.name(),
            layers.len()
        );
        Self {
            name: format!("{} (emulated)", network.name()),
            input_size: network.input_size(),
            layers,
        }
    }

    /// Fixed-point forward pass.
    ///
    /// # Errors
    ///
    /// Returns error if the sample width does not match the input size.
    pub fn forward(&self, sample: &[f32]) -> hlsq_models::Result<Vec<f32>> {
        if sample.len() != self.input_size {
            return Err(ModelError::InputSize {
                expected: self.input_size,
                actual: sample.len(),
            });
        }

        let mut x: Vec<f64> = sample.iter().copied().map(f64::from).collect();
        for layer in &self.layers {
            x = match layer {
                EmulatedLayer::Quantize { precision } => x.iter().map(|&v| precision.quantize(v)).collect(),
                EmulatedLayer::Dense {
                    weights,
                    bias,
                    accum,
                    result,
                } => weights
                    .iter()
                    .zip(bias)
                    .map(|(row, &b)| {
                        let acc = row
                            .iter()
                            .zip(&x)
                            .fold(accum.quantize(b), |acc, (w, v)| accum.quantize(acc + w * v));
                        result.quantize(acc)
                    })
                    .collect(),
                EmulatedLayer::Activation { function, result } => x
                    .iter()
                    .map(|&v| result.quantize(activate(*function, v)))
                    .collect(),
                EmulatedLayer::Softmax {
                    exp_table,
                    inv_table,
                    result,
                } => softmax(&x, *exp_table, *inv_table, *result),
            };
        }

        #[allow(clippy::cast_possible_truncation)]
        let scores = x.into_iter().map(|v| v as f32).collect();
        Ok(scores)
    }
}

impl Classifier for EmulatedNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn scores(&self, sample: &[f32]) -> hlsq_models::Result<Vec<f32>> {
        self.forward(sample)
    }
}

fn activate(function: Activation, v: f64) -> f64 {
    match function {
        Activation::Linear => v,
        Activation::Relu => v.max(0.0),
        Activation::Sigmoid => 1.0 / (1.0 + (-v).exp()),
        Activation::Tanh => v.tanh(),
        // Handled as a whole-vector layer
        Activation::Softmax => v,
    }
}

fn softmax(x: &[f64], exp_table: PrecisionSpec, inv_table: PrecisionSpec, result: PrecisionSpec) -> Vec<f64> {
    let max = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = x.iter().map(|&v| exp_table.quantize((v - max).exp())).collect();
    let sum: f64 = exps.iter().sum();
    let inv = if sum > 0.0 { inv_table.quantize(1.0 / sum) } else { 0.0 };
    exps.iter().map(|&e| result.quantize(e * inv)).collect()
}
