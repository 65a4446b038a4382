//! In-place edits on a [`Document`].
//!
//! These are pure data operations. The store wraps them with history,
//! caching and persistence.

use super::document::{Document, Group, Link, Node, SuppressedPair};
use serde_json::Value;

/// Builds the override key for a directed edge.
#[must_use]
pub fn override_key(source: &str, target: &str) -> String {
    format!("{source}->{target}")
}

impl Document {
    /// Returns the node with `id`.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Returns the node with `id` mutably.
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Removes the node with `id` and every link touching it.
    ///
    /// Groups keep their member ids. Returns the removed node.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let node = self.nodes.remove(index);
        self.links.retain(|l| !l.touches(id));
        Some(node)
    }

    /// Returns the link with `id` mutably.
    pub fn link_mut(&mut self, id: &str) -> Option<&mut Link> {
        self.links.iter_mut().find(|l| l.id == id)
    }

    /// Removes the link with `id`.
    pub fn remove_link(&mut self, id: &str) -> Option<Link> {
        let index = self.links.iter().position(|l| l.id == id)?;
        Some(self.links.remove(index))
    }

    /// Returns the group with `id` mutably.
    pub fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        self.groups.iter_mut().find(|g| g.id == id)
    }

    /// Removes the group with `id`.
    pub fn remove_group(&mut self, id: &str) -> Option<Group> {
        let index = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(index))
    }

    /// Returns true if auto-links between `x` and `y` are suppressed.
    #[must_use]
    pub fn is_suppressed(&self, x: &str, y: &str) -> bool {
        self.suppressed_auto_pairs.iter().any(|p| p.matches(x, y))
    }

    /// Suppresses the pair; returns false if it already was.
    pub fn suppress(&mut self, x: &str, y: &str) -> bool {
        if self.is_suppressed(x, y) {
            return false;
        }
        self.suppressed_auto_pairs.push(SuppressedPair::new(x, y));
        true
    }

    /// Removes every entry for the pair; returns false if none existed.
    pub fn unsuppress(&mut self, x: &str, y: &str) -> bool {
        let before = self.suppressed_auto_pairs.len();
        self.suppressed_auto_pairs.retain(|p| !p.matches(x, y));
        self.suppressed_auto_pairs.len() != before
    }

    /// Stores a curvature override for the directed edge `source -> target`.
    pub fn set_override(&mut self, source: &str, target: &str, cpd: f64) {
        self.auto_edge_overrides
            .insert(override_key(source, target), Value::from(cpd));
    }

    /// Returns the parsed override for `source -> target`, if any.
    #[must_use]
    pub fn override_for(&self, source: &str, target: &str) -> Option<f64> {
        self.auto_edge_overrides
            .get(&override_key(source, target))
            .and_then(super::lenient::parse_number)
    }

    /// Removes everything except unknown top-level keys.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.links.clear();
        self.suppressed_auto_pairs.clear();
        self.auto_edge_overrides.clear();
        self.groups.clear();
    }
}
