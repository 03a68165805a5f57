//! Introspected layer graph

/// One layer as the configuration generator sees it.
///
/// Derived from a [`crate::Network`]; immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerDescriptor {
    /// Layer name (unique within the graph)
    pub name: String,

    /// Layer class name as the HLS backend knows it (`Dense`, `Activation`, …)
    pub class_name: String,

    /// Configurable numeric attributes, in backend order.
    ///
    /// Empty when the layer exposes a single scalar precision.
    pub attributes: Vec<String>,

    /// Names of the layers feeding this one
    pub parents: Vec<String>,

    /// Names of the layers this one feeds
    pub children: Vec<String>,
}

impl LayerDescriptor {
    /// Whether the layer exposes a per-attribute precision mapping
    pub fn is_attribute_keyed(&self) -> bool {
        !self.attributes.is_empty()
    }

    /// Whether the layer exposes the named attribute
    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.iter().any(|a| a == attribute)
    }
}

/// Ordered layer graph of a trained network
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetworkGraph {
    layers: Vec<LayerDescriptor>,
}

impl NetworkGraph {
    /// Build a graph from descriptors in topological order
    pub fn new(layers: Vec<LayerDescriptor>) -> Self {
        Self { layers }
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the graph has no layers
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layers in topological order
    pub fn layers(&self) -> &[LayerDescriptor] {
        &self.layers
    }

    /// Look up a layer by name
    pub fn get(&self, name: &str) -> Option<&LayerDescriptor> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Whether a layer with this name exists
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Layers with no parents (graph inputs)
    pub fn sources(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().filter(|l| l.parents.is_empty())
    }

    /// Layers with no children (graph outputs)
    pub fn sinks(&self) -> impl Iterator<Item = &LayerDescriptor> {
        self.layers.iter().filter(|l| l.children.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, parents: &[&str], children: &[&str]) -> LayerDescriptor {
        LayerDescriptor {
            name: name.to_string(),
            class_name: "Dense".to_string(),
            attributes: vec!["weight".into(), "bias".into()],
            parents: parents.iter().map(ToString::to_string).collect(),
            children: children.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_sources_and_sinks() {
        let graph = NetworkGraph::new(vec![
            descriptor("a", &[], &["b"]),
            descriptor("b", &["a"], &["c"]),
            descriptor("c", &["b"], &[]),
        ]);

        let sources: Vec<_> = graph.sources().map(|l| l.name.as_str()).collect();
        let sinks: Vec<_> = graph.sinks().map(|l| l.name.as_str()).collect();
        assert_eq!(sources, ["a"]);
        assert_eq!(sinks, ["c"]);
        assert!(graph.contains("b"));
        assert!(!graph.contains("d"));
    }

    #[test]
    fn test_attribute_lookup() {
        let layer = descriptor("dense", &[], &[]);
        assert!(layer.is_attribute_keyed());
        assert!(layer.has_attribute("bias"));
        assert!(!layer.has_attribute("accum"));
    }
}
