//! Persisted document types.
//!
//! The JSON shape is shared with the browser front end, so field names are
//! camelCase and every struct keeps unknown keys in an `extra` map that is
//! written back verbatim.

use super::lenient;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// The root aggregate: everything one `data.json` holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Entities, in display order.
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub nodes: Vec<Node>,
    /// Manual relationships.
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub links: Vec<Link>,
    /// Node pairs for which no auto-link may be derived.
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub suppressed_auto_pairs: Vec<SuppressedPair>,
    /// Curvature overrides keyed by `"source->target"`.
    ///
    /// Values are kept as raw JSON so a hand-edited string survives a
    /// round trip; [`lenient::parse_number`] is applied when reading.
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub auto_edge_overrides: BTreeMap<String, Value>,
    /// Visual groupings.
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub groups: Vec<Group>,
    /// Unknown top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the document holds no nodes, links, groups, or
    /// suppression and override state.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
            && self.links.is_empty()
            && self.suppressed_auto_pairs.is_empty()
            && self.auto_edge_overrides.is_empty()
            && self.groups.is_empty()
    }
}

/// An entity with typed key/value fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique, immutable identifier.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Ordered fields.
    #[serde(default, deserialize_with = "lenient::null_default")]
    pub fields: Vec<Field>,
    /// Canvas position; opaque to the store. An explicit `null` is kept as
    /// `Some(Value::Null)` so it is written back as `null`.
    #[serde(
        default,
        deserialize_with = "lenient::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub position: Option<Value>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Creates a node with the given id and fields.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            id: id.into(),
            fields,
            ..Self::default()
        }
    }

    /// Sets the position.
    #[must_use]
    pub fn with_position(mut self, position: Value) -> Self {
        self.position = Some(position);
        self
    }

    /// Iterates over the values of tag fields.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Tag)
            .map(|f| f.value.as_str())
    }

    /// Returns the first field with `key`.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// The type of a field value.
///
/// Unknown types are kept verbatim and treated as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Free text.
    #[default]
    Text,
    /// A number, parsed best-effort.
    Number,
    /// A tag; drives auto-link inference and node colour.
    Tag,
    /// Any other type name.
    Other(String),
}

impl FieldType {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Tag => "tag",
            Self::Other(name) => name,
        }
    }

    /// Returns true for text and for unknown types.
    #[must_use]
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Other(_))
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        match name {
            "text" => Self::Text,
            "number" => Self::Number,
            "tag" => Self::Tag,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = lenient::string(deserializer)?;
        if name.is_empty() {
            return Ok(Self::Text);
        }
        Ok(Self::from(name.as_str()))
    }
}

/// One key/value pair on a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    #[serde(default, deserialize_with = "lenient::string")]
    pub key: String,
    /// Value type.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Value, always stored as a string.
    #[serde(default, deserialize_with = "lenient::string")]
    pub value: String,
}

impl Field {
    /// Creates a field.
    #[must_use]
    pub fn new(key: impl Into<String>, field_type: FieldType, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            field_type,
            value: value.into(),
        }
    }

    /// Creates a text field.
    #[must_use]
    pub fn text(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldType::Text, value)
    }

    /// Creates a tag field.
    #[must_use]
    pub fn tag(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldType::Tag, value)
    }

    /// Creates a number field.
    #[must_use]
    pub fn number(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldType::Number, value)
    }

    /// Parses the value as a number; `None` on failure.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        lenient::parse_number_str(&self.value)
    }
}

/// Type name of manual links.
pub const MANUAL_LINK_TYPE: &str = "manual";

fn manual_type() -> String {
    MANUAL_LINK_TYPE.to_string()
}

/// An explicit, user-created relationship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Unique identifier.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Source node id; may dangle.
    #[serde(default, deserialize_with = "lenient::string")]
    pub source: String,
    /// Target node id; may dangle.
    #[serde(default, deserialize_with = "lenient::string")]
    pub target: String,
    /// Display label.
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub label: Option<String>,
    /// Always `"manual"` for stored links.
    #[serde(rename = "type", default = "manual_type", deserialize_with = "lenient::string")]
    pub link_type: String,
    /// Curvature.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::opt_number"
    )]
    pub cpd: Option<f64>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Link {
    /// Creates a manual link.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        label: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label,
            link_type: manual_type(),
            cpd: None,
            extra: Map::new(),
        }
    }

    /// Returns true if either endpoint is `node_id`.
    #[must_use]
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// An unordered node pair, stored with the lexicographically smaller id
/// first.
///
/// Stored as `{"a": .., "b": ..}`. Pairs read from disk are normalized on
/// decode so hand-edited files compare correctly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SuppressedPair {
    a: String,
    b: String,
}

impl SuppressedPair {
    /// Creates a normalized pair.
    #[must_use]
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        let (x, y) = (x.into(), y.into());
        if x <= y {
            Self { a: x, b: y }
        } else {
            Self { a: y, b: x }
        }
    }

    /// The smaller id.
    #[must_use]
    pub fn a(&self) -> &str {
        &self.a
    }

    /// The larger id.
    #[must_use]
    pub fn b(&self) -> &str {
        &self.b
    }

    /// Returns true if this pair joins `x` and `y` in either order.
    #[must_use]
    pub fn matches(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

impl<'de> Deserialize<'de> for SuppressedPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default, deserialize_with = "lenient::string")]
            a: String,
            #[serde(default, deserialize_with = "lenient::string")]
            b: String,
        }
        let raw = Raw::deserialize(deserializer)?;
        Ok(Self::new(raw.a, raw.b))
    }
}

/// Default group label.
pub const DEFAULT_GROUP_LABEL: &str = "编组";
/// Default group colour.
pub const DEFAULT_GROUP_COLOR: &str = "#3b82f6";

fn default_group_label() -> String {
    DEFAULT_GROUP_LABEL.to_string()
}

fn default_group_color() -> String {
    DEFAULT_GROUP_COLOR.to_string()
}

/// A visual grouping of nodes. Members are not checked against the node
/// list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier.
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    /// Display label.
    #[serde(default = "default_group_label", deserialize_with = "lenient::string")]
    pub label: String,
    /// Member node ids.
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub members: Vec<String>,
    /// Fill colour.
    #[serde(default = "default_group_color", deserialize_with = "lenient::string")]
    pub color: String,
    /// Fill opacity.
    #[serde(default = "lenient::default_opacity", deserialize_with = "lenient::opacity")]
    pub opacity: f64,
    /// Unknown keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Group {
    /// Creates a group with default label, colour and opacity.
    #[must_use]
    pub fn new(id: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            id: id.into(),
            label: default_group_label(),
            members,
            color: default_group_color(),
            opacity: lenient::DEFAULT_OPACITY,
            extra: Map::new(),
        }
    }
}

/// Type name of derived links.
pub const AUTO_LINK_TYPE: &str = "auto";
/// Rule identifier for tag/name matching.
pub const TAG_NAME_RULE: &str = "B";

/// A derived edge. Computed on every read and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoLink {
    /// `auto-<source>-<target>`.
    pub id: String,
    /// The node whose field matched the tag.
    pub source: String,
    /// The node holding the tag.
    pub target: String,
    /// Always `"auto"`.
    #[serde(rename = "type")]
    pub link_type: String,
    /// Rule that produced the edge.
    pub rule: String,
    /// `"<tag>:<name>"`.
    pub label: String,
    /// Curvature copied from an override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpd: Option<f64>,
}

impl AutoLink {
    /// Creates a tag/name auto-link from `source` to `target`.
    #[must_use]
    pub fn tag_name(source: &str, target: &str, tag: &str, name: &str) -> Self {
        Self {
            id: format!("auto-{source}-{target}"),
            source: source.to_string(),
            target: target.to_string(),
            link_type: AUTO_LINK_TYPE.to_string(),
            rule: TAG_NAME_RULE.to_string(),
            label: format!("{tag}:{name}"),
            cpd: None,
        }
    }
}

/// Whether undo and redo are currently possible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStatus {
    /// At least one undo entry exists.
    pub can_undo: bool,
    /// At least one redo entry exists.
    pub can_redo: bool,
}
