//! Node templates, persisted separately in `templates.json`.
//!
//! Templates keep the order they were written in. On disk they are a plain
//! JSON object; a repeated name keeps its first position and its last value.

use super::document::Field;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Named field lists used to pre-fill new nodes, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSet {
    entries: Vec<(String, Vec<Field>)>,
}

impl TemplateSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The set written on first start.
    #[must_use]
    pub fn builtin() -> Self {
        let mut set = Self::new();
        set.insert(
            "NPC",
            vec![
                Field::text("名称", ""),
                Field::tag("标签", "NPC"),
                Field::text("地点", ""),
                Field::text("动机", ""),
            ],
        );
        set.insert("地点", vec![Field::text("名称", ""), Field::tag("标签", "地点")]);
        set
    }

    /// Returns the fields of template `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&[Field]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, fields)| fields.as_slice())
    }

    /// Adds a template at the end, or replaces one in place.
    pub fn insert(&mut self, name: impl Into<String>, fields: Vec<Field>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = fields,
            None => self.entries.push((name, fields)),
        }
    }

    /// Template names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Templates in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Field])> {
        self.entries
            .iter()
            .map(|(n, fields)| (n.as_str(), fields.as_slice()))
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for TemplateSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, fields) in &self.entries {
            map.serialize_entry(name, fields)?;
        }
        map.end()
    }
}

struct TemplateSetVisitor;

impl<'de> Visitor<'de> for TemplateSetVisitor {
    type Value = TemplateSet;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of template names to field lists")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut set = TemplateSet::new();
        while let Some((name, fields)) = access.next_entry::<String, Vec<Field>>()? {
            set.insert(name, fields);
        }
        Ok(set)
    }
}

impl<'de> Deserialize<'de> for TemplateSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TemplateSetVisitor)
    }
}
