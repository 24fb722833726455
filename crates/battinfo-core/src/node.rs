//! In-memory JSON-LD document model.
//!
//! The converter builds its output incrementally, so the tree is mutable and
//! keeps keys in insertion order. Values are a small tagged union rather than
//! free-form JSON: a key holds a scalar, a list of type names, a single child
//! node, or an ordered sequence of sibling nodes.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use thiserror::Error;

pub const TYPE_KEY: &str = "@type";
pub const ID_KEY: &str = "@id";
pub const REVERSE_KEY: &str = "@reverse";
pub const CONTEXT_KEY: &str = "@context";
pub const COMMENT_KEY: &str = "rdfs:comment";
pub const NUMERICAL_PART_KEY: &str = "hasNumericalPart";
pub const NUMBER_VALUE_KEY: &str = "hasNumberValue";
pub const MEASUREMENT_UNIT_KEY: &str = "hasMeasurementUnit";

/// Cell contents that spreadsheet exports use for "no value".
const EMPTY_SENTINELS: &[&str] = &[
    "nan", "NaN", "NAN", "NA", "N/A", "#N/A", "<NA>", "null", "NULL", "None",
];

/// A key could not be treated as a node because it already holds a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("key '{0}' already holds a scalar value")]
pub struct NodeConflict(pub String);

/// A leaf value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    /// Exact decimal, serialised as a JSON number with its authored scale.
    Number(#[serde(serialize_with = "rust_decimal::serde::arbitrary_precision::serialize")] Decimal),
    String(String),
}

impl Scalar {
    /// Decode a spreadsheet cell.
    ///
    /// Numbers are only recognised when the decimal renders back to exactly
    /// the authored text, so `0.50` keeps its trailing zero while `001` and
    /// `1e-3` stay strings.
    pub fn from_cell(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() || EMPTY_SENTINELS.contains(&text) {
            return Scalar::Null;
        }
        match Decimal::from_str(text) {
            Ok(number) if number.to_string() == text => Scalar::Number(number),
            _ => Scalar::String(text.to_string()),
        }
    }

    /// Null, blank strings and not-a-number markers carry no information.
    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Number(_) => false,
            Scalar::String(s) => s.trim().is_empty(),
        }
    }

    /// Truthiness used when deciding whether a value is worth writing:
    /// zero and the empty string are false.
    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Number(n) => !n.is_zero(),
            Scalar::String(s) => !s.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Number(n) => write!(f, "{n}"),
            Scalar::String(s) => write!(f, "{s}"),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::String(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::String(s)
    }
}

impl From<Decimal> for Scalar {
    fn from(n: Decimal) -> Self {
        Scalar::Number(n)
    }
}

/// Value stored under a node key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NodeValue {
    Scalar(Scalar),
    /// A `@type` that accumulated more than one name.
    Types(Vec<String>),
    Node(Node),
    Sequence(Vec<Node>),
}

impl NodeValue {
    pub fn as_node(&self) -> Option<&Node> {
        match self {
            NodeValue::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_node_mut(&mut self) -> Option<&mut Node> {
        match self {
            NodeValue::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_nodes(&self) -> Option<&[Node]> {
        match self {
            NodeValue::Sequence(nodes) => Some(nodes),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            NodeValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }
}

impl From<Node> for NodeValue {
    fn from(node: Node) -> Self {
        NodeValue::Node(node)
    }
}

impl From<Scalar> for NodeValue {
    fn from(scalar: Scalar) -> Self {
        NodeValue::Scalar(scalar)
    }
}

impl From<&str> for NodeValue {
    fn from(s: &str) -> Self {
        NodeValue::Scalar(s.into())
    }
}

impl From<String> for NodeValue {
    fn from(s: String) -> Self {
        NodeValue::Scalar(s.into())
    }
}

/// An insertion-ordered JSON-LD object.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Node(IndexMap<String, NodeValue>);

impl Node {
    pub fn new() -> Self {
        Self::default()
    }

    /// A node holding only `@type`.
    pub fn typed(type_name: &str) -> Self {
        let mut node = Self::new();
        node.merge_type(type_name);
        node
    }

    /// Builder-style insert.
    pub fn with(mut self, key: &str, value: impl Into<NodeValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&NodeValue> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut NodeValue> {
        self.0.get_mut(key)
    }

    /// Set a key, replacing any previous value in place.
    pub fn insert(&mut self, key: &str, value: impl Into<NodeValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Type names currently asserted on this node.
    pub fn types(&self) -> Vec<&str> {
        match self.0.get(TYPE_KEY) {
            Some(NodeValue::Scalar(Scalar::String(name))) => vec![name.as_str()],
            Some(NodeValue::Types(names)) => names.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }

    /// Add a type name to `@type` without dropping the existing ones.
    ///
    /// A single name is stored as a string; a second distinct name turns the
    /// value into a list. Repeated names are ignored, as are empty ones.
    pub fn merge_type(&mut self, type_name: &str) {
        if type_name.is_empty() {
            return;
        }
        if !self.0.contains_key(TYPE_KEY) {
            self.insert(TYPE_KEY, type_name);
            return;
        }
        let Some(value) = self.0.get_mut(TYPE_KEY) else {
            return;
        };
        match value {
            NodeValue::Types(names) => {
                if !names.iter().any(|n| n == type_name) {
                    names.push(type_name.to_string());
                }
            }
            NodeValue::Scalar(Scalar::String(existing)) => {
                if existing.as_str() != type_name {
                    let existing = std::mem::take(existing);
                    *value = NodeValue::Types(vec![existing, type_name.to_string()]);
                }
            }
            other => {
                log::warn!("Replacing malformed @type value {other:?} with '{type_name}'");
                *other = type_name.into();
            }
        }
    }

    /// Get or create the `@reverse` node.
    pub fn reverse_mut(&mut self) -> Result<&mut Node, NodeConflict> {
        let value = self
            .0
            .entry(REVERSE_KEY.to_string())
            .or_insert_with(|| NodeValue::Node(Node::new()));
        match value {
            NodeValue::Node(node) => Ok(node),
            NodeValue::Sequence(nodes) => nodes
                .last_mut()
                .ok_or_else(|| NodeConflict(REVERSE_KEY.to_string())),
            _ => Err(NodeConflict(REVERSE_KEY.to_string())),
        }
    }

    /// Attach an entry under `key` without losing earlier entries.
    ///
    /// * absent or `{}` → the entry becomes the value;
    /// * a single node → `[existing, entry]`;
    /// * a sequence → the entry is appended.
    pub fn set_or_append(&mut self, key: &str, entry: Node) -> Result<(), NodeConflict> {
        match self.0.get_mut(key) {
            None => {
                self.insert(key, entry);
                Ok(())
            }
            Some(NodeValue::Node(existing)) if existing.is_empty() => {
                *existing = entry;
                Ok(())
            }
            Some(NodeValue::Node(_)) | Some(NodeValue::Sequence(_)) => {
                self.as_sequence(key)?.push(entry);
                Ok(())
            }
            Some(_) => Err(NodeConflict(key.to_string())),
        }
    }

    /// View the value under `key` as a sequence of nodes, converting a single
    /// node into a one-element sequence. An absent key becomes an empty
    /// sequence.
    pub fn as_sequence(&mut self, key: &str) -> Result<&mut Vec<Node>, NodeConflict> {
        let value = self
            .0
            .entry(key.to_string())
            .or_insert_with(|| NodeValue::Sequence(Vec::new()));
        if let NodeValue::Node(node) = value {
            let node = std::mem::take(node);
            *value = NodeValue::Sequence(vec![node]);
        }
        match value {
            NodeValue::Sequence(nodes) => Ok(nodes),
            _ => Err(NodeConflict(key.to_string())),
        }
    }

    /// The node under `key`, or the last one if it holds a sequence.
    pub fn last_of(&mut self, key: &str) -> Option<&mut Node> {
        match self.0.get_mut(key)? {
            NodeValue::Node(node) => Some(node),
            NodeValue::Sequence(nodes) => nodes.last_mut(),
            _ => None,
        }
    }

    /// Number of sibling nodes stored under `key`.
    pub fn sibling_count(&self, key: &str) -> usize {
        match self.0.get(key) {
            Some(NodeValue::Node(_)) => 1,
            Some(NodeValue::Sequence(nodes)) => nodes.len(),
            _ => 0,
        }
    }

    /// The `index`-th sibling under `key`; a single node is sibling 0.
    pub fn sibling_mut(&mut self, key: &str, index: usize) -> Option<&mut Node> {
        match self.0.get_mut(key)? {
            NodeValue::Node(node) if index == 0 => Some(node),
            NodeValue::Sequence(nodes) => nodes.get_mut(index),
            _ => None,
        }
    }

    /// Add a new sibling under `key` and return its index.
    ///
    /// The first sibling is stored as a plain node; the second converts the
    /// value into a sequence.
    pub fn push_sibling(&mut self, key: &str, sibling: Node) -> Result<usize, NodeConflict> {
        match self.0.get(key) {
            None => {
                self.insert(key, sibling);
                Ok(0)
            }
            Some(NodeValue::Node(_)) | Some(NodeValue::Sequence(_)) => {
                let nodes = self.as_sequence(key)?;
                nodes.push(sibling);
                Ok(nodes.len() - 1)
            }
            Some(_) => Err(NodeConflict(key.to_string())),
        }
    }
}

/// The `@context` header: a base context IRI followed by local term
/// definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    pub base: String,
    pub terms: IndexMap<String, String>,
}

impl Serialize for Context {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.base)?;
        seq.serialize_element(&self.terms)?;
        seq.end()
    }
}

/// A complete JSON-LD document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub context: Context,
    pub root: Node,
}

impl Document {
    /// Serialise with the given indentation width.
    pub fn to_json_pretty(&self, indent: usize) -> serde_json::Result<String> {
        let indent = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only ever writes valid UTF-8.
        Ok(String::from_utf8(out).unwrap_or_default())
    }

    pub fn to_value(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.root.len() + 1))?;
        map.serialize_entry(CONTEXT_KEY, &self.context)?;
        for (key, value) in &self.root.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
