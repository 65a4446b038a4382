//! Display style derived from a node's fields.

use crate::model::{FieldType, Node};
use serde::{Deserialize, Serialize};

/// Colour used for nodes without tags.
pub const UNTAGGED_COLOR: &str = "#9CA3AF";

const PRESET_COLORS: &[(&str, &str)] = &[("NPC", "#4F8EF7"), ("地点", "#34C759"), ("剧情", "#F59E0B")];

const BASE_SIZE: f64 = 30.0;
const SIZE_CAP: f64 = 100.0;

/// Colours and size for rendering a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    /// One colour per tag, in field order.
    pub colors: Vec<String>,
    /// Radius.
    pub size: f64,
}

/// Returns the colour for `tag`: a preset, or a stable 24-bit hash.
#[must_use]
pub fn stable_color_for_tag(tag: &str) -> String {
    if let Some((_, color)) = PRESET_COLORS.iter().find(|(name, _)| *name == tag) {
        return (*color).to_string();
    }
    let h = tag
        .chars()
        .fold(0u32, |h, c| (h.wrapping_mul(131).wrapping_add(c as u32)) & 0x00FF_FFFF);
    format!("#{h:06X}")
}

/// Derives the style of `node`.
///
/// Size grows with the largest number field, capped at 100; unparseable
/// numbers are ignored.
#[must_use]
pub fn derive_node_style(node: &Node) -> NodeStyle {
    let mut colors: Vec<String> = node.tags().map(stable_color_for_tag).collect();
    if colors.is_empty() {
        colors.push(UNTAGGED_COLOR.to_string());
    }

    let max_number = node
        .fields
        .iter()
        .filter(|f| f.field_type == FieldType::Number)
        .filter_map(|f| f.as_number())
        .fold(0.0_f64, f64::max);

    NodeStyle {
        colors,
        size: BASE_SIZE + max_number.min(SIZE_CAP) * 0.5,
    }
}
