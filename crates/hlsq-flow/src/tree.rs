//! Typed configuration tree.
//!
//! Every configuration the flow hands to the backend or writes to the
//! manifest is first rendered into a [`ConfigMap`]: an ordered mapping whose
//! nodes are either leaves or nested maps. One printer and one serializer
//! cover every shape the tree can take.
//!
//! ```text
//! HLSConfig
//!   Model
//!     Precision:      fixed<12, 4, TRN, WRAP>
//!     ReuseFactor:    1
//!   LayerName
//!     dense_1
//!       Precision
//!         weight:     fixed<12, 4, TRN, WRAP>
//! ```

use hlsq_fixed::PrecisionSpec;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// Column at which leaf values start in the rendered tree
pub const KEY_WIDTH: usize = 20;

/// Leaf value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigValue {
    /// Free text
    Text(String),
    /// Unsigned integer
    Integer(u64),
    /// Boolean flag
    Bool(bool),
}

/// Tree node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigNode {
    /// Terminal value
    Leaf(ConfigValue),
    /// Nested mapping
    Map(ConfigMap),
}

/// Insertion-ordered mapping of name to node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigMap {
    entries: Vec<(String, ConfigNode)>,
}

impl ConfigMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry, keeping the original position on replace
    pub fn insert(&mut self, key: impl Into<String>, node: impl Into<ConfigNode>) {
        let key = key.into();
        let node = node.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = node,
            None => self.entries.push((key, node)),
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, node: impl Into<ConfigNode>) -> Self {
        self.insert(key, node);
        self
    }

    /// Look up an entry
    pub fn get(&self, key: &str) -> Option<&ConfigNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Follow a path of keys through nested maps
    pub fn path(&self, keys: &[&str]) -> Option<&ConfigNode> {
        let (first, rest) = keys.split_first()?;
        let node = self.get(first)?;
        if rest.is_empty() {
            return Some(node);
        }
        match node {
            ConfigNode::Map(map) => map.path(rest),
            ConfigNode::Leaf(_) => None,
        }
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render with fixed-width, left-aligned keys
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_into(self, 0, &mut out);
        out
    }
}

fn render_into(map: &ConfigMap, depth: usize, out: &mut String) {
    for (key, node) in map.iter() {
        out.push_str(&"  ".repeat(depth));
        out.push_str(key);
        match node {
            ConfigNode::Map(child) => {
                out.push('\n');
                render_into(child, depth + 1, out);
            }
            ConfigNode::Leaf(value) => {
                let pad = KEY_WIDTH.saturating_sub(key.len() + 2 * depth);
                out.push(':');
                out.push_str(&" ".repeat(pad));
                out.push_str(&value.to_string());
                out.push('\n');
            }
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<u32> for ConfigValue {
    fn from(n: u32) -> Self {
        Self::Integer(u64::from(n))
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<PrecisionSpec> for ConfigValue {
    fn from(p: PrecisionSpec) -> Self {
        Self::Text(p.to_string())
    }
}

macro_rules! leaf_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ConfigNode {
                fn from(value: $ty) -> Self {
                    Self::Leaf(value.into())
                }
            }
        )*
    };
}

leaf_from!(ConfigValue, &str, String, u32, bool, PrecisionSpec);

impl From<ConfigMap> for ConfigNode {
    fn from(map: ConfigMap) -> Self {
        Self::Map(map)
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Text(s) => serializer.serialize_str(s),
            Self::Integer(n) => serializer.serialize_u64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
        }
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Leaf(v) => v.serialize(serializer),
            Self::Map(m) => m.serialize(serializer),
        }
    }
}

impl Serialize for ConfigMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ConfigMap {
        ConfigMap::new()
            .with("IOType", "io_stream")
            .with(
                "HLSConfig",
                ConfigMap::new().with("Model", ConfigMap::new().with("ReuseFactor", 1u32)),
            )
            .with("Trace", false)
    }

    #[test]
    fn test_render_alignment() {
        let text = sample().render();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], format!("IOType:{}io_stream", " ".repeat(14)));
        assert_eq!(lines[1], "HLSConfig");
        assert_eq!(lines[2], "  Model");
        // depth 2: pad = 20 - 11 - 4
        assert_eq!(lines[3], format!("    ReuseFactor:{}1", " ".repeat(5)));
        assert_eq!(lines[4], format!("Trace:{}False", " ".repeat(15)));
    }

    #[test]
    fn test_long_keys_do_not_underflow() {
        let map = ConfigMap::new().with("AVeryLongConfigurationKeyName", "x");
        assert_eq!(map.render(), "AVeryLongConfigurationKeyName:x\n");
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = sample();
        map.insert("IOType", "io_parallel");
        assert_eq!(map.len(), 3);
        assert_eq!(map.iter().next().unwrap().0, "IOType");
        assert_eq!(
            map.get("IOType"),
            Some(&ConfigNode::Leaf(ConfigValue::Text("io_parallel".into())))
        );
    }

    #[test]
    fn test_path_lookup() {
        let map = sample();
        assert_eq!(
            map.path(&["HLSConfig", "Model", "ReuseFactor"]),
            Some(&ConfigNode::Leaf(ConfigValue::Integer(1)))
        );
        assert!(map.path(&["IOType", "Nested"]).is_none());
        assert!(map.path(&[]).is_none());
    }

    #[test]
    fn test_json_keeps_insertion_order() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(
            json,
            r#"{"IOType":"io_stream","HLSConfig":{"Model":{"ReuseFactor":1}},"Trace":false}"#
        );
    }
}
