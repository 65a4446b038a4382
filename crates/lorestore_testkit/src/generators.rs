//! Property-based test generators using proptest.
//!
//! Strategies keep node ids unique within a document and draw names and
//! tags from small pools so generated worlds actually derive edges.

use lorestore_core::{Document, Field, FieldType, Link, Node, SuppressedPair};
use proptest::prelude::*;
use serde_json::{json, Value as JsonValue};

const NAME_POOL: &[&str] = &["Alice", "Bob", "Rusty Mug", "北城", "Ravens"];
const TAG_POOL: &[&str] = &["NPC", "地点", "剧情", "Guild"];

/// Strategy for generating node ids.
pub fn node_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9]{0,7}").expect("Invalid regex")
}

/// Strategy for generating a name from the shared pool.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(NAME_POOL).prop_map(str::to_string)
}

/// Strategy for generating a tag from the shared pool.
pub fn tag_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(TAG_POOL).prop_map(str::to_string)
}

/// Strategy for generating a single field.
pub fn field_strategy() -> impl Strategy<Value = Field> {
    prop_oneof![
        2 => name_strategy().prop_map(|v| Field::text("名称", v)),
        2 => tag_strategy().prop_map(|v| Field::tag("标签", v)),
        2 => (tag_strategy(), name_strategy()).prop_map(|(k, v)| Field::text(k, v)),
        1 => (-1000.0f64..1000.0).prop_map(|n| Field::number("weight", n.to_string())),
        1 => ("[a-z]{1,6}", ".{0,12}").prop_map(|(k, v)| Field::new(k, FieldType::Text, v)),
    ]
}

/// Strategy for generating a node position: missing, `null` or a point.
pub fn position_strategy() -> impl Strategy<Value = Option<JsonValue>> {
    prop_oneof![
        Just(None),
        Just(Some(JsonValue::Null)),
        (-1000i32..1000, -1000i32..1000).prop_map(|(x, y)| Some(json!({"x": x, "y": y}))),
    ]
}

/// Strategy for generating a node with the given id.
pub fn node_strategy(id: String) -> impl Strategy<Value = Node> {
    (prop::collection::vec(field_strategy(), 0..5), position_strategy()).prop_map(
        move |(fields, position)| Node {
            position,
            ..Node::new(id.clone(), fields)
        },
    )
}

/// Strategy for generating a document with up to `max_nodes` nodes.
///
/// Links, suppressed pairs and overrides only reference existing nodes.
pub fn document_strategy(max_nodes: usize) -> impl Strategy<Value = Document> {
    prop::collection::btree_set(node_id_strategy(), 0..=max_nodes)
        .prop_flat_map(|ids| {
            let ids: Vec<String> = ids.into_iter().collect();
            let nodes = ids
                .iter()
                .map(|id| node_strategy(id.clone()))
                .collect::<Vec<_>>();
            (Just(ids), nodes)
        })
        .prop_flat_map(|(ids, nodes)| {
            let pairs = if ids.is_empty() {
                Just(Vec::new()).boxed()
            } else {
                let pick = prop::sample::select(ids);
                prop::collection::vec((pick.clone(), pick), 0..4).boxed()
            };
            (Just(nodes), pairs.clone(), pairs, -2.0f64..2.0)
        })
        .prop_map(|(nodes, links, suppressed, cpd)| {
            let mut doc = Document::new();
            doc.nodes = nodes;
            doc.links = links
                .iter()
                .enumerate()
                .map(|(i, (s, t))| Link::new(format!("l{i}"), s.as_str(), t.as_str(), None))
                .collect();
            for (a, b) in suppressed.into_iter().filter(|(a, b)| a != b) {
                doc.suppress(&a, &b);
            }
            if let Some((s, t)) = links.first() {
                doc.set_override(s, t, cpd);
            }
            doc
        })
}

/// An edit applied to a store in property tests.
#[derive(Debug, Clone)]
pub enum StoreOperation {
    /// Create a node with these fields.
    CreateNode {
        /// Node fields.
        fields: Vec<Field>,
    },
    /// Delete the node at this index of the current node list, if any.
    DeleteNode {
        /// Index into the node list, wrapped.
        index: usize,
    },
    /// Undo the last edit.
    Undo,
    /// Redo the last undone edit.
    Redo,
}

/// Strategy for generating store operations.
pub fn store_operation_strategy() -> impl Strategy<Value = StoreOperation> {
    prop_oneof![
        4 => prop::collection::vec(field_strategy(), 0..3)
            .prop_map(|fields| StoreOperation::CreateNode { fields }),
        1 => any::<usize>().prop_map(|index| StoreOperation::DeleteNode { index }),
        2 => Just(StoreOperation::Undo),
        1 => Just(StoreOperation::Redo),
    ]
}

/// Strategy for generating a sequence of store operations.
pub fn operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<StoreOperation>> {
    prop::collection::vec(store_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

/// Returns true if every pair in `pairs` is stored normalized.
pub fn pairs_normalized(pairs: &[SuppressedPair]) -> bool {
    pairs.iter().all(|p| p.a() <= p.b())
}
