//! Plist tree nodes.
//!
//! A plist document is a tree of dicts, arrays and scalar leaves. Dicts keep
//! their entries in document order; in the XML form each entry is a `<key>`
//! element followed by its value element, and the writer flattens entries
//! back into that sibling layout.

use serde::{Deserialize, Serialize};

/// Scalar element kinds, named after their XML tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Bool,
    Integer,
    Real,
    String,
    Date,
    Data,
}

impl ScalarKind {
    /// Parse a mod `type` tag (`"bool"`, `"integer"`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "bool" => Some(ScalarKind::Bool),
            "integer" => Some(ScalarKind::Integer),
            "real" => Some(ScalarKind::Real),
            "string" => Some(ScalarKind::String),
            "date" => Some(ScalarKind::Date),
            "data" => Some(ScalarKind::Data),
            _ => None,
        }
    }

    /// The `type` tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "bool",
            ScalarKind::Integer => "integer",
            ScalarKind::Real => "real",
            ScalarKind::String => "string",
            ScalarKind::Date => "date",
            ScalarKind::Data => "data",
        }
    }

    /// XML element name used for an empty element of this kind.
    ///
    /// Booleans have no payload-free form other than `<true/>`/`<false/>`,
    /// so an empty bool serializes as `<false/>`.
    pub fn element_name(&self) -> &'static str {
        match self {
            ScalarKind::Bool => "false",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A scalar leaf.
///
/// Numeric, date and data payloads keep their serialized text so that a
/// load/save cycle reproduces them verbatim.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(String),
    Real(String),
    String(String),
    Date(String),
    Data(String),
    /// Element with no payload, e.g. `<string/>`.
    Void(ScalarKind),
}

impl Scalar {
    /// Kind of this scalar.
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Integer(_) => ScalarKind::Integer,
            Scalar::Real(_) => ScalarKind::Real,
            Scalar::String(_) => ScalarKind::String,
            Scalar::Date(_) => ScalarKind::Date,
            Scalar::Data(_) => ScalarKind::Data,
            Scalar::Void(kind) => *kind,
        }
    }

    /// Build a scalar of `kind` from its serialized text.
    ///
    /// Returns `None` for [`ScalarKind::Bool`], which has no text form.
    pub fn from_text(kind: ScalarKind, text: String) -> Option<Self> {
        match kind {
            ScalarKind::Bool => None,
            ScalarKind::Integer => Some(Scalar::Integer(text)),
            ScalarKind::Real => Some(Scalar::Real(text)),
            ScalarKind::String => Some(Scalar::String(text)),
            ScalarKind::Date => Some(Scalar::Date(text)),
            ScalarKind::Data => Some(Scalar::Data(text)),
        }
    }

    /// Serialized text payload, if any.
    pub fn text(&self) -> Option<&str> {
        match self {
            Scalar::Integer(s)
            | Scalar::Real(s)
            | Scalar::String(s)
            | Scalar::Date(s)
            | Scalar::Data(s) => Some(s),
            Scalar::Bool(_) | Scalar::Void(_) => None,
        }
    }
}

/// Coarse node kind, used when reporting structural mismatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Dict,
    Array,
    Scalar,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::Dict => "dict",
            NodeKind::Array => "array",
            NodeKind::Scalar => "scalar",
        };
        write!(f, "{}", name)
    }
}

/// A node in a plist tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PlistNode {
    Dict(Dict),
    Array(Vec<PlistNode>),
    Scalar(Scalar),
}

impl PlistNode {
    /// Empty dict node.
    pub fn dict() -> Self {
        PlistNode::Dict(Dict::new())
    }

    /// Empty array node.
    pub fn array() -> Self {
        PlistNode::Array(Vec::new())
    }

    /// String scalar node.
    pub fn string(value: impl Into<String>) -> Self {
        PlistNode::Scalar(Scalar::String(value.into()))
    }

    /// Bool scalar node.
    pub fn bool(value: bool) -> Self {
        PlistNode::Scalar(Scalar::Bool(value))
    }

    /// Integer scalar node.
    pub fn integer(value: i64) -> Self {
        PlistNode::Scalar(Scalar::Integer(value.to_string()))
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            PlistNode::Dict(_) => NodeKind::Dict,
            PlistNode::Array(_) => NodeKind::Array,
            PlistNode::Scalar(_) => NodeKind::Scalar,
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            PlistNode::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut Dict> {
        match self {
            PlistNode::Dict(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<PlistNode>> {
        match self {
            PlistNode::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<PlistNode>> {
        match self {
            PlistNode::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            PlistNode::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// String payload when this is a `<string>` node.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PlistNode::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Bool payload when this is a `<true/>`/`<false/>` node.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PlistNode::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

impl From<Scalar> for PlistNode {
    fn from(scalar: Scalar) -> Self {
        PlistNode::Scalar(scalar)
    }
}

impl From<Dict> for PlistNode {
    fn from(dict: Dict) -> Self {
        PlistNode::Dict(dict)
    }
}

/// Ordered plist dictionary.
///
/// Entries are stored in document order. Lookups address the first entry
/// with a matching key, which is also the only one once a merge has run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dict {
    entries: Vec<(String, PlistNode)>,
}

impl Dict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether `key` is present (case-sensitive exact match).
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    /// Index of the entry for `key`.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    pub fn get(&self, key: &str) -> Option<&PlistNode> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PlistNode> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Value of the entry at `index`.
    pub fn value_at(&self, index: usize) -> Option<&PlistNode> {
        self.entries.get(index).map(|(_, v)| v)
    }

    pub fn value_at_mut(&mut self, index: usize) -> Option<&mut PlistNode> {
        self.entries.get_mut(index).map(|(_, v)| v)
    }

    /// Append a new entry at the end.
    ///
    /// Does not check for an existing key; use [`Dict::upsert`] for that.
    pub fn push(&mut self, key: impl Into<String>, value: PlistNode) {
        self.entries.push((key.into(), value));
    }

    /// Replace the value at `index`, keeping the key where it is.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn replace_at(&mut self, index: usize, value: PlistNode) -> PlistNode {
        std::mem::replace(&mut self.entries[index].1, value)
    }

    /// Insert or replace the value for `key`.
    ///
    /// An existing key keeps its position; a new key goes to the end.
    /// Returns the previous value if there was one.
    pub fn upsert(&mut self, key: &str, value: PlistNode) -> Option<PlistNode> {
        match self.position(key) {
            Some(index) => Some(self.replace_at(index, value)),
            None => {
                self.push(key, value);
                None
            }
        }
    }

    /// Remove the entry for `key`, keeping the order of the others.
    pub fn remove(&mut self, key: &str) -> Option<PlistNode> {
        let index = self.position(key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PlistNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut PlistNode)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, PlistNode)> for Dict {
    fn from_iter<I: IntoIterator<Item = (String, PlistNode)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dict {
        let mut dict = Dict::new();
        dict.push("A", PlistNode::string("a"));
        dict.push("B", PlistNode::integer(2));
        dict.push("C", PlistNode::bool(true));
        dict
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let dict = sample();
        assert!(dict.contains_key("A"));
        assert!(!dict.contains_key("a"));
        assert_eq!(dict.position("C"), Some(2));
    }

    #[test]
    fn test_upsert_existing_keeps_position() {
        let mut dict = sample();
        let old = dict.upsert("A", PlistNode::string("z"));

        assert_eq!(old, Some(PlistNode::string("a")));
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
        assert_eq!(dict.get("A").and_then(|n| n.as_str()), Some("z"));
    }

    #[test]
    fn test_upsert_new_appends() {
        let mut dict = sample();
        assert!(dict.upsert("D", PlistNode::dict()).is_none());
        assert_eq!(dict.keys().last(), Some("D"));
        assert_eq!(dict.len(), 4);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut dict = sample();
        assert!(dict.remove("B").is_some());
        assert!(dict.remove("B").is_none());
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["A", "C"]);
    }

    #[test]
    fn test_first_duplicate_wins_lookup() {
        let dict: Dict = vec![
            ("K".to_string(), PlistNode::string("first")),
            ("K".to_string(), PlistNode::string("second")),
        ]
        .into_iter()
        .collect();

        assert_eq!(dict.get("K").and_then(|n| n.as_str()), Some("first"));
    }

    #[test]
    fn test_scalar_kind_tags() {
        for tag in ["bool", "integer", "real", "string", "date", "data"] {
            let kind = ScalarKind::from_tag(tag).unwrap();
            assert_eq!(kind.as_str(), tag);
        }
        assert!(ScalarKind::from_tag("array").is_none());
        assert_eq!(ScalarKind::Bool.element_name(), "false");
    }

    #[test]
    fn test_void_scalar_kind() {
        let scalar = Scalar::Void(ScalarKind::Date);
        assert_eq!(scalar.kind(), ScalarKind::Date);
        assert!(scalar.text().is_none());
    }
}
