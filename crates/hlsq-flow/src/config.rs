//! Per-layer precision configuration generator.
//!
//! Turns the introspected layer graph of a trained network into a complete
//! HLS configuration:
//!
//! 1. **Baseline**: one entry per layer. Layers exposing precision
//!    attributes get an attribute-keyed mapping, every attribute at the
//!    default precision; the rest get one scalar default precision. Reuse
//!    factor and strategy come from the model-level defaults.
//! 2. **Interface**: the input and output layers get the interface
//!    precision (scalar, matching the external bus), and the output layer is
//!    pinned to the `Stable` strategy.
//! 3. **Overrides**: every attribute named in the [`OverrideRequest`] is
//!    replaced on every attribute-keyed layer that exposes it. Scalar layers
//!    are never touched.
//!
//! The generator performs no I/O.

use crate::error::ConfigError;
use crate::tree::{ConfigMap, ConfigNode};
use hlsq_fixed::target::{DEFAULT_BACKEND, DEFAULT_FPGA_PART, DEFAULT_PRECISION, DEFAULT_PROJECT_NAME};
use hlsq_fixed::PrecisionSpec;
use hlsq_models::NetworkGraph;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// Default name of the layer fed by the external input bus
pub const DEFAULT_INPUT_LAYER: &str = "input_layer";

/// Default name of the layer driving the external output bus
pub const DEFAULT_OUTPUT_LAYER: &str = "output_layer";

/// Scheduling strategy of a layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Fully unrolled, lowest latency
    #[default]
    Latency,
    /// Resource-sharing implementation
    Resource,
    /// Numerically stable implementation, no latency-oriented reordering
    Stable,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Latency => "Latency",
            Self::Resource => "Resource",
            Self::Stable => "Stable",
        })
    }
}

/// How data enters and leaves the generated design
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IoType {
    /// All values presented in parallel
    Parallel,
    /// Values streamed through FIFOs
    #[default]
    Stream,
}

impl fmt::Display for IoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Parallel => "io_parallel",
            Self::Stream => "io_stream",
        })
    }
}

/// Precision of one layer: one scalar, or one precision per attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerPrecision {
    /// Single precision for the whole layer
    Scalar(PrecisionSpec),
    /// Ordered attribute → precision mapping
    PerAttribute(Vec<(String, PrecisionSpec)>),
}

impl LayerPrecision {
    /// Whether the precision is an attribute mapping
    pub fn is_attribute_keyed(&self) -> bool {
        matches!(self, Self::PerAttribute(_))
    }

    /// Precision of one attribute (scalar layers answer for every attribute)
    pub fn get(&self, attribute: &str) -> Option<PrecisionSpec> {
        match self {
            Self::Scalar(p) => Some(*p),
            Self::PerAttribute(entries) => entries
                .iter()
                .find(|(name, _)| name == attribute)
                .map(|(_, p)| *p),
        }
    }

    /// Replace an attribute present in the mapping; returns whether it changed.
    ///
    /// Scalar precisions and absent attributes are left alone.
    pub fn replace(&mut self, attribute: &str, precision: PrecisionSpec) -> bool {
        match self {
            Self::Scalar(_) => false,
            Self::PerAttribute(entries) => entries
                .iter_mut()
                .find(|(name, _)| name == attribute)
                .map(|(_, p)| *p = precision)
                .is_some(),
        }
    }

    fn to_node(&self) -> ConfigNode {
        match self {
            Self::Scalar(p) => (*p).into(),
            Self::PerAttribute(entries) => entries
                .iter()
                .fold(ConfigMap::new(), |map, (name, p)| map.with(name.as_str(), *p))
                .into(),
        }
    }
}

/// Configuration of one layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerSettings {
    /// Numeric precision
    pub precision: LayerPrecision,
    /// Reuse factor
    pub reuse_factor: u32,
    /// Scheduling strategy
    pub strategy: Strategy,
}

/// Model-level defaults every layer starts from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelDefaults {
    /// Default precision of interior layers
    pub precision: PrecisionSpec,
    /// Global reuse factor
    pub reuse_factor: u32,
    /// Global strategy
    pub strategy: Strategy,
}

impl Default for ModelDefaults {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            reuse_factor: 1,
            strategy: Strategy::Latency,
        }
    }
}

/// Ordered per-layer configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerConfig {
    layers: Vec<(String, LayerSettings)>,
}

impl LayerConfig {
    /// Baseline configuration: one entry per graph layer, all at the defaults
    pub fn baseline(graph: &NetworkGraph, defaults: &ModelDefaults) -> Self {
        let layers = graph
            .layers()
            .iter()
            .map(|layer| {
                let precision = if layer.is_attribute_keyed() {
                    LayerPrecision::PerAttribute(
                        layer
                            .attributes
                            .iter()
                            .map(|a| (a.clone(), defaults.precision))
                            .collect(),
                    )
                } else {
                    LayerPrecision::Scalar(defaults.precision)
                };
                let settings = LayerSettings {
                    precision,
                    reuse_factor: defaults.reuse_factor,
                    strategy: defaults.strategy,
                };
                (layer.name.clone(), settings)
            })
            .collect();
        Self { layers }
    }

    /// Settings of one layer
    pub fn get(&self, layer: &str) -> Option<&LayerSettings> {
        self.layers.iter().find(|(n, _)| n == layer).map(|(_, s)| s)
    }

    /// Mutable settings of one layer
    pub fn get_mut(&mut self, layer: &str) -> Option<&mut LayerSettings> {
        self.layers
            .iter_mut()
            .find(|(n, _)| n == layer)
            .map(|(_, s)| s)
    }

    /// Layers in graph order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LayerSettings)> {
        self.layers.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Number of configured layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether no layer is configured
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Apply an override to every attribute-keyed layer; returns the number
    /// of attribute precisions that were replaced.
    pub fn apply_override(&mut self, request: &OverrideRequest) -> usize {
        let mut replaced = 0;
        for (name, settings) in &mut self.layers {
            for attribute in request.attributes() {
                if settings.precision.replace(attribute, request.replacement()) {
                    debug!("{name}.{attribute} -> {}", request.replacement());
                    replaced += 1;
                }
            }
        }
        replaced
    }

    /// Check every configured layer and attribute against the network graph.
    ///
    /// # Errors
    ///
    /// Returns the first layer or attribute the graph does not have.
    pub fn check_against(&self, graph: &NetworkGraph) -> Result<(), ConfigError> {
        for (name, settings) in &self.layers {
            let layer = graph
                .get(name)
                .ok_or_else(|| ConfigError::UnknownLayer { name: name.clone() })?;
            if let LayerPrecision::PerAttribute(entries) = &settings.precision {
                if let Some((attribute, _)) = entries.iter().find(|(a, _)| !layer.has_attribute(a)) {
                    return Err(ConfigError::UnknownAttribute {
                        layer: name.clone(),
                        attribute: attribute.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn to_node(&self) -> ConfigMap {
        self.layers.iter().fold(ConfigMap::new(), |map, (name, s)| {
            map.with(
                name.as_str(),
                ConfigMap::new()
                    .with("Precision", s.precision.to_node())
                    .with("ReuseFactor", s.reuse_factor)
                    .with("Strategy", s.strategy.to_string()),
            )
        })
    }
}

/// Replace the precision of selected attributes on every layer exposing them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRequest {
    attributes: Vec<String>,
    replacement: PrecisionSpec,
}

impl OverrideRequest {
    /// Create a request; duplicate and blank attribute names are dropped
    pub fn new<I, S>(attributes: I, replacement: PrecisionSpec) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();
        for attribute in attributes {
            let attribute = attribute.as_ref().trim();
            if !attribute.is_empty() && !unique.iter().any(|a| a == attribute) {
                unique.push(attribute.to_string());
            }
        }
        Self {
            attributes: unique,
            replacement,
        }
    }

    /// Parse a comma-separated attribute list (`"result,accum"`; empty = none)
    pub fn from_list(list: &str, replacement: PrecisionSpec) -> Self {
        Self::new(list.split(','), replacement)
    }

    /// Attribute names to override
    pub fn attributes(&self) -> &[String] {
        &self.attributes
    }

    /// Replacement precision
    pub const fn replacement(&self) -> PrecisionSpec {
        self.replacement
    }

    /// Whether the request overrides nothing
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// How the input and output layers are identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceLayers {
    /// Fixed, pre-agreed layer names; absent names are an error
    Named {
        /// Input layer name
        input: String,
        /// Output layer name
        output: String,
    },
    /// The unique layer without parents and the unique layer without children
    Topological,
}

impl Default for InterfaceLayers {
    fn default() -> Self {
        Self::Named {
            input: DEFAULT_INPUT_LAYER.to_string(),
            output: DEFAULT_OUTPUT_LAYER.to_string(),
        }
    }
}

impl InterfaceLayers {
    /// Resolve to `(input, output)` layer names.
    ///
    /// # Errors
    ///
    /// Returns error if a named layer is absent or detection is ambiguous.
    pub fn resolve(&self, graph: &NetworkGraph) -> Result<(String, String), ConfigError> {
        match self {
            Self::Named { input, output } => {
                for (role, name) in [("input", input), ("output", output)] {
                    if !graph.contains(name) {
                        return Err(ConfigError::MissingInterfaceLayer {
                            role,
                            name: name.clone(),
                        });
                    }
                }
                Ok((input.clone(), output.clone()))
            }
            Self::Topological => {
                let unique = |role: &'static str, names: Vec<&str>| match names.as_slice() {
                    [name] => Ok((*name).to_string()),
                    _ => Err(ConfigError::AmbiguousInterfaceLayer {
                        role,
                        count: names.len(),
                    }),
                };
                let input = unique("input", graph.sources().map(|l| l.name.as_str()).collect())?;
                let output = unique("output", graph.sinks().map(|l| l.name.as_str()).collect())?;
                Ok((input, output))
            }
        }
    }
}

/// Where and for what the project is generated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTarget {
    /// Output directory of the generated project
    pub output_dir: PathBuf,
    /// Source the network was loaded from
    pub model_source: PathBuf,
    /// FPGA part identifier
    pub part: String,
    /// Top-level project name
    pub project_name: String,
    /// HLS backend name
    pub backend: String,
    /// I/O mode
    pub io_type: IoType,
}

impl ProjectTarget {
    /// Target with the default part, project name, backend and I/O mode
    pub fn new(output_dir: impl Into<PathBuf>, model_source: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            model_source: model_source.into(),
            part: DEFAULT_FPGA_PART.to_string(),
            project_name: DEFAULT_PROJECT_NAME.to_string(),
            backend: DEFAULT_BACKEND.to_string(),
            io_type: IoType::default(),
        }
    }
}

/// Complete generation request handed to the model builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    defaults: ModelDefaults,
    layers: LayerConfig,
    target: ProjectTarget,
    interface_layers: (String, String),
}

impl ModelConfig {
    /// Model-level defaults
    pub const fn defaults(&self) -> &ModelDefaults {
        &self.defaults
    }

    /// Per-layer configuration
    pub const fn layers(&self) -> &LayerConfig {
        &self.layers
    }

    /// Project target
    pub const fn target(&self) -> &ProjectTarget {
        &self.target
    }

    /// Input layer name
    pub fn input_layer(&self) -> &str {
        &self.interface_layers.0
    }

    /// Output layer name
    pub fn output_layer(&self) -> &str {
        &self.interface_layers.1
    }

    /// Render as a configuration tree
    pub fn to_tree(&self) -> ConfigMap {
        let model = ConfigMap::new()
            .with("Precision", self.defaults.precision)
            .with("ReuseFactor", self.defaults.reuse_factor)
            .with("Strategy", self.defaults.strategy.to_string());
        let hls = ConfigMap::new()
            .with("Model", model)
            .with("LayerName", self.layers.to_node());

        ConfigMap::new()
            .with("Backend", self.target.backend.as_str())
            .with("ProjectName", self.target.project_name.as_str())
            .with("OutputDir", self.target.output_dir.display().to_string())
            .with("XilinxPart", self.target.part.as_str())
            .with("IOType", self.target.io_type.to_string())
            .with("ModelSource", self.target.model_source.display().to_string())
            .with("HLSConfig", hls)
    }
}

/// Builds a [`ModelConfig`] from a layer graph
#[derive(Debug, Clone)]
pub struct ConfigGenerator {
    defaults: ModelDefaults,
    interface_precision: PrecisionSpec,
    overrides: Option<OverrideRequest>,
    interface: InterfaceLayers,
}

impl ConfigGenerator {
    /// Generator with the given interface precision and default everything else
    pub fn new(interface_precision: PrecisionSpec) -> Self {
        Self {
            defaults: ModelDefaults::default(),
            interface_precision,
            overrides: None,
            interface: InterfaceLayers::default(),
        }
    }

    /// Set the model-level defaults
    #[must_use]
    pub fn with_defaults(mut self, defaults: ModelDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Set the attribute override (an empty request is dropped)
    #[must_use]
    pub fn with_override(mut self, request: OverrideRequest) -> Self {
        self.overrides = (!request.is_empty()).then_some(request);
        self
    }

    /// Set how interface layers are identified
    #[must_use]
    pub fn with_interface(mut self, interface: InterfaceLayers) -> Self {
        self.interface = interface;
        self
    }

    /// Generate the configuration for a network graph.
    ///
    /// # Errors
    ///
    /// Returns error if the interface layers cannot be identified.
    pub fn generate(&self, graph: &NetworkGraph, target: ProjectTarget) -> Result<ModelConfig, ConfigError> {
        let (input, output) = self.interface.resolve(graph)?;

        let mut layers = LayerConfig::baseline(graph, &self.defaults);

        info!(
            "Setting {input} and {output} precision to {}",
            self.interface_precision
        );
        for name in [&input, &output] {
            if let Some(settings) = layers.get_mut(name) {
                settings.precision = LayerPrecision::Scalar(self.interface_precision);
            }
        }
        if let Some(settings) = layers.get_mut(&output) {
            settings.strategy = Strategy::Stable;
        }

        if let Some(request) = &self.overrides {
            info!(
                "Overriding {:?} with {}",
                request.attributes(),
                request.replacement()
            );
            let replaced = layers.apply_override(request);
            debug!("{replaced} attribute precision(s) overridden");
        }

        Ok(ModelConfig {
            defaults: self.defaults,
            layers,
            target,
            interface_layers: (input, output),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlsq_models::LayerDescriptor;

    fn layer(name: &str, attributes: &[&str]) -> LayerDescriptor {
        LayerDescriptor {
            name: name.to_string(),
            class_name: "Dense".to_string(),
            attributes: attributes.iter().map(ToString::to_string).collect(),
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    fn chain(layers: Vec<LayerDescriptor>) -> NetworkGraph {
        let names: Vec<String> = layers.iter().map(|l| l.name.clone()).collect();
        let layers = layers
            .into_iter()
            .enumerate()
            .map(|(i, mut l)| {
                l.parents = i.checked_sub(1).map(|p| vec![names[p].clone()]).unwrap_or_default();
                l.children = names.get(i + 1).cloned().into_iter().collect();
                l
            })
            .collect();
        NetworkGraph::new(layers)
    }

    fn graph() -> NetworkGraph {
        chain(vec![
            layer("input_layer", &[]),
            layer("dense_1", &["weight", "bias", "result", "accum"]),
            layer("relu_1", &[]),
            layer("dense_2", &["weight", "bias", "result"]),
            layer("output_layer", &["result", "exp_table"]),
        ])
    }

    fn p(w: u32, i: u32) -> PrecisionSpec {
        PrecisionSpec::new(w, i).unwrap()
    }

    fn target() -> ProjectTarget {
        ProjectTarget::new("/tmp/proj", "weights.json")
    }

    #[test]
    fn test_baseline_and_interface() {
        let config = ConfigGenerator::new(p(12, 2)).generate(&graph(), target()).unwrap();
        let layers = config.layers();

        assert_eq!(layers.len(), 5);
        assert_eq!(layers.get("input_layer").unwrap().precision, LayerPrecision::Scalar(p(12, 2)));
        let output = layers.get("output_layer").unwrap();
        assert_eq!(output.precision, LayerPrecision::Scalar(p(12, 2)));
        assert_eq!(output.strategy, Strategy::Stable);

        let dense = layers.get("dense_1").unwrap();
        assert!(dense.precision.is_attribute_keyed());
        assert_eq!(dense.precision.get("accum"), Some(DEFAULT_PRECISION));
        assert_eq!(dense.strategy, Strategy::Latency);
        assert_eq!(dense.reuse_factor, 1);
        assert_eq!(layers.get("relu_1").unwrap().precision, LayerPrecision::Scalar(DEFAULT_PRECISION));
        assert_eq!(config.input_layer(), "input_layer");
        assert_eq!(config.output_layer(), "output_layer");
    }

    #[test]
    fn test_override_only_touches_keyed_layers_with_attribute() {
        let wide = p(18, 8);
        let base = ConfigGenerator::new(p(12, 2)).generate(&graph(), target()).unwrap();
        let config = ConfigGenerator::new(p(12, 2))
            .with_override(OverrideRequest::from_list("accum", wide))
            .generate(&graph(), target())
            .unwrap();

        for (name, settings) in config.layers().iter() {
            if name == "dense_1" {
                assert_eq!(settings.precision.get("accum"), Some(wide));
                assert_eq!(settings.precision.get("weight"), Some(DEFAULT_PRECISION));
            } else {
                assert_eq!(Some(settings), base.layers().get(name), "{name} changed");
            }
        }
    }

    #[test]
    fn test_override_is_idempotent() {
        let request = OverrideRequest::from_list("result,accum", p(16, 6));
        let mut once = LayerConfig::baseline(&graph(), &ModelDefaults::default());
        once.apply_override(&request);
        let mut twice = once.clone();
        twice.apply_override(&request);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_override_is_noop() {
        let request = OverrideRequest::from_list("", p(16, 6));
        assert!(request.is_empty());
        let plain = ConfigGenerator::new(p(12, 2)).generate(&graph(), target()).unwrap();
        let with_empty = ConfigGenerator::new(p(12, 2))
            .with_override(request)
            .generate(&graph(), target())
            .unwrap();
        assert_eq!(plain, with_empty);
    }

    #[test]
    fn test_override_list_parsing() {
        let request = OverrideRequest::from_list(" result, ,accum,result ", p(16, 6));
        assert_eq!(request.attributes(), ["result", "accum"]);
    }

    #[test]
    fn test_missing_named_interface_fails_fast() {
        let g = chain(vec![layer("in", &[]), layer("output_layer", &[])]);
        assert_eq!(
            ConfigGenerator::new(p(12, 2)).generate(&g, target()),
            Err(ConfigError::MissingInterfaceLayer {
                role: "input",
                name: "input_layer".into()
            })
        );
    }

    #[test]
    fn test_topological_interface() {
        let g = chain(vec![layer("in", &[]), layer("mid", &["result"]), layer("out", &[])]);
        let config = ConfigGenerator::new(p(10, 3))
            .with_interface(InterfaceLayers::Topological)
            .generate(&g, target())
            .unwrap();
        assert_eq!(config.input_layer(), "in");
        assert_eq!(config.output_layer(), "out");
        assert_eq!(config.layers().get("out").unwrap().strategy, Strategy::Stable);

        let disconnected = NetworkGraph::new(vec![layer("a", &[]), layer("b", &[])]);
        assert_eq!(
            InterfaceLayers::Topological.resolve(&disconnected),
            Err(ConfigError::AmbiguousInterfaceLayer { role: "input", count: 2 })
        );
    }

    #[test]
    fn test_check_against_graph() {
        let config = ConfigGenerator::new(p(12, 2)).generate(&graph(), target()).unwrap();
        assert!(config.layers().check_against(&graph()).is_ok());

        let smaller = chain(vec![layer("input_layer", &[]), layer("output_layer", &[])]);
        assert_eq!(
            config.layers().check_against(&smaller),
            Err(ConfigError::UnknownLayer { name: "dense_1".into() })
        );

        let renamed_attr = chain(vec![
            layer("input_layer", &[]),
            layer("dense_1", &["weight", "bias", "result", "accum_t"]),
            layer("relu_1", &[]),
            layer("dense_2", &["weight", "bias", "result"]),
            layer("output_layer", &["result", "exp_table"]),
        ]);
        assert_eq!(
            config.layers().check_against(&renamed_attr),
            Err(ConfigError::UnknownAttribute {
                layer: "dense_1".into(),
                attribute: "accum".into()
            })
        );
    }

    #[test]
    fn test_tree_shape() {
        let config = ConfigGenerator::new(p(12, 2)).generate(&graph(), target()).unwrap();
        let tree = config.to_tree();
        assert_eq!(
            tree.path(&["HLSConfig", "LayerName", "dense_1", "Precision", "accum"]),
            Some(&ConfigNode::from(DEFAULT_PRECISION))
        );
        assert_eq!(
            tree.path(&["HLSConfig", "LayerName", "output_layer", "Strategy"]),
            Some(&ConfigNode::from("Stable"))
        );
        assert_eq!(tree.get("IOType"), Some(&ConfigNode::from("io_stream")));
        assert_eq!(tree.get("XilinxPart"), Some(&ConfigNode::from(DEFAULT_FPGA_PART)));
    }
}
