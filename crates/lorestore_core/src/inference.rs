//! Auto-link inference.
//!
//! Edges are derived from field data on every read and never stored. The
//! single rule ("B") links a node carrying tag `T` and name `N` to every
//! other node that has an explicit field `T = N`:
//!
//! ```text
//! Y: 标签(tag) = NPC, 名称 = Alice        Z: NPC = Alice
//!                     Y  <──── NPC:Alice ────  Z
//! ```
//!
//! The edge points from the matching node (source) to the tag holder
//! (target). Each unordered node pair yields at most one edge, whichever
//! tag/name combination is found first.
//!
//! Suppression and overrides are applied afterwards by [`resolve_auto_links`].

use crate::model::{AutoLink, Document, FieldType, Node};
use std::collections::{HashMap, HashSet};

/// Keys whose text value is a node's name.
pub const NAME_KEYS: &[&str] = &["名称", "name"];

/// Keys whose text value is a delimited list of alternative names.
pub const ALIAS_KEYS: &[&str] = &["名称列表", "别名", "aliases", "Aliases"];

/// Delimiters for alias lists.
pub const ALIAS_SEPARATORS: &[char] = &[',', '，', ';', '|', '\n', '\r', '\t'];

/// Splits a delimited list into trimmed, non-empty parts.
#[must_use]
pub fn split_multi_values(raw: &str) -> Vec<&str> {
    raw.split(ALIAS_SEPARATORS)
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Collects a node's names: name fields first, then alias list entries,
/// deduplicated in first-seen order.
#[must_use]
pub fn name_values(node: &Node) -> Vec<&str> {
    let text_fields = || {
        node.fields
            .iter()
            .filter(|f| f.field_type == FieldType::Text)
    };

    let names = text_fields()
        .filter(|f| NAME_KEYS.contains(&f.key.as_str()))
        .map(|f| f.value.trim())
        .filter(|v| !v.is_empty());
    let aliases = text_fields()
        .filter(|f| ALIAS_KEYS.contains(&f.key.as_str()))
        .flat_map(|f| split_multi_values(&f.value));

    let mut seen = HashSet::new();
    names.chain(aliases).filter(|v| seen.insert(*v)).collect()
}

/// Derives auto-links from `nodes`.
///
/// `filter` restricts both the indexed field keys and the tags considered.
/// `None` or an empty slice means no restriction. Nodes with an empty id
/// are ignored.
#[must_use]
pub fn compute_auto_links(nodes: &[Node], filter: Option<&[String]>) -> Vec<AutoLink> {
    let filter = filter.filter(|keys| !keys.is_empty());
    let allowed = |key: &str| filter.map_or(true, |keys| keys.iter().any(|k| k == key));

    let mut index: HashMap<(&str, &str), Vec<&str>> = HashMap::new();
    for node in nodes.iter().filter(|n| !n.id.is_empty()) {
        for field in node.fields.iter().filter(|f| allowed(f.key.as_str())) {
            index
                .entry((field.key.as_str(), field.value.as_str()))
                .or_default()
                .push(node.id.as_str());
        }
    }

    let mut links = Vec::new();
    let mut seen: HashSet<(&str, &str)> = HashSet::new();

    for holder in nodes.iter().filter(|n| !n.id.is_empty()) {
        let names = name_values(holder);
        if names.is_empty() {
            continue;
        }
        for tag in holder.tags().filter(|t| !t.is_empty() && allowed(*t)) {
            for name in &names {
                let Some(matches) = index.get(&(tag, *name)) else {
                    continue;
                };
                for &source in matches {
                    if source == holder.id {
                        continue;
                    }
                    if !seen.insert(pair_key(source, &holder.id)) {
                        continue;
                    }
                    links.push(AutoLink::tag_name(source, &holder.id, tag, name));
                }
            }
        }
    }

    links
}

/// Unordered pair key with the lexicographically smaller id first.
fn pair_key<'a>(x: &'a str, y: &'a str) -> (&'a str, &'a str) {
    if x <= y {
        (x, y)
    } else {
        (y, x)
    }
}

/// Drops links whose endpoints form a suppressed pair.
pub fn apply_suppression(doc: &Document, links: &mut Vec<AutoLink>) {
    if doc.suppressed_auto_pairs.is_empty() {
        return;
    }
    links.retain(|link| !doc.is_suppressed(&link.source, &link.target));
}

/// Copies curvature overrides onto links whose literal `source->target`
/// key has one.
pub fn apply_overrides(doc: &Document, links: &mut [AutoLink]) {
    if doc.auto_edge_overrides.is_empty() {
        return;
    }
    for link in links {
        if let Some(cpd) = doc.override_for(&link.source, &link.target) {
            link.cpd = Some(cpd);
        }
    }
}

/// Computes the auto-links of `doc` with suppression and overrides applied.
#[must_use]
pub fn resolve_auto_links(doc: &Document, filter: Option<&[String]>) -> Vec<AutoLink> {
    let mut links = compute_auto_links(&doc.nodes, filter);
    apply_suppression(doc, &mut links);
    apply_overrides(doc, &mut links);
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    fn world() -> Vec<Node> {
        vec![
            Node::new("x", vec![Field::text("名称", "Alice")]),
            Node::new(
                "y",
                vec![Field::tag("标签", "NPC"), Field::text("名称", "Alice")],
            ),
            Node::new("z", vec![Field::text("NPC", "Alice")]),
        ]
    }

    #[test]
    fn tag_and_name_match_links_field_holder_to_tag_holder() {
        let links = compute_auto_links(&world(), None);
        assert_eq!(links.len(), 1);
        let link = &links[0];
        assert_eq!(link.source, "z");
        assert_eq!(link.target, "y");
        assert_eq!(link.label, "NPC:Alice");
        assert_eq!(link.rule, "B");
        assert_eq!(link.link_type, "auto");
        assert_eq!(link.id, "auto-z-y");
        assert_eq!(link.cpd, None);
    }

    #[test]
    fn english_name_key_counts() {
        let nodes = vec![
            Node::new("h", vec![Field::tag("t", "Guild"), Field::text("name", "Ravens")]),
            Node::new("m", vec![Field::text("Guild", "Ravens")]),
        ];
        let links = compute_auto_links(&nodes, None);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "Guild:Ravens");
    }

    #[test]
    fn name_fields_must_be_text() {
        let nodes = vec![
            Node::new("h", vec![Field::tag("t", "NPC"), Field::tag("名称", "Alice")]),
            Node::new("m", vec![Field::text("NPC", "Alice")]),
        ];
        assert!(compute_auto_links(&nodes, None).is_empty());
    }

    #[test]
    fn aliases_split_on_every_separator() {
        let node = Node::new(
            "n",
            vec![
                Field::text("名称", " Alice "),
                Field::text("别名", "Al，Ally;A|Alice\nAli\tLi, ,"),
            ],
        );
        assert_eq!(
            name_values(&node),
            vec!["Alice", "Al", "Ally", "A", "Ali", "Li"]
        );
    }

    #[test]
    fn alias_match_links() {
        let nodes = vec![
            Node::new(
                "h",
                vec![
                    Field::tag("标签", "地点"),
                    Field::text("名称", "Old Harbor"),
                    Field::text("aliases", "Harbor, Docks"),
                ],
            ),
            Node::new("m", vec![Field::text("地点", "Docks")]),
        ];
        let links = compute_auto_links(&nodes, None);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].label, "地点:Docks");
        assert_eq!(links[0].source, "m");
    }

    #[test]
    fn pair_emitted_once_across_names_and_tags() {
        let nodes = vec![
            Node::new(
                "a",
                vec![
                    Field::tag("t", "NPC"),
                    Field::tag("t", "Ally"),
                    Field::text("名称", "Bob"),
                    Field::text("别名", "Bobby"),
                    Field::text("NPC", "Carl"),
                ],
            ),
            Node::new(
                "b",
                vec![
                    Field::tag("t", "NPC"),
                    Field::text("名称", "Carl"),
                    Field::text("NPC", "Bob"),
                    Field::text("Ally", "Bobby"),
                ],
            ),
        ];
        let links = compute_auto_links(&nodes, None);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source, "b");
        assert_eq!(links[0].target, "a");
        assert_eq!(links[0].label, "NPC:Bob");
    }

    #[test]
    fn self_matches_are_ignored() {
        let nodes = vec![Node::new(
            "solo",
            vec![
                Field::tag("t", "NPC"),
                Field::text("名称", "Alice"),
                Field::text("NPC", "Alice"),
            ],
        )];
        assert!(compute_auto_links(&nodes, None).is_empty());
    }

    #[test]
    fn nodes_without_id_are_skipped() {
        let mut nodes = world();
        nodes[2].id.clear();
        assert!(compute_auto_links(&nodes, None).is_empty());
    }

    #[test]
    fn filter_restricts_keys_and_tags() {
        let mut nodes = world();
        nodes.push(Node::new("w", vec![Field::text("地点", "Alice")]));
        nodes[1].fields.push(Field::tag("标签", "地点"));

        assert_eq!(compute_auto_links(&nodes, None).len(), 2);

        let only_place = vec!["地点".to_string()];
        let links = compute_auto_links(&nodes, Some(only_place.as_slice()));
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].source, "w");

        let empty: Vec<String> = Vec::new();
        assert_eq!(compute_auto_links(&nodes, Some(empty.as_slice())).len(), 2);
    }

    #[test]
    fn suppression_is_symmetric() {
        for (a, b) in [("y", "z"), ("z", "y")] {
            let mut doc = Document::new();
            doc.nodes = world();
            doc.suppress(a, b);
            assert!(resolve_auto_links(&doc, None).is_empty());
        }
    }

    #[test]
    fn override_applies_only_to_literal_direction() {
        let mut doc = Document::new();
        doc.nodes = world();

        doc.set_override("y", "z", 40.0);
        assert_eq!(resolve_auto_links(&doc, None)[0].cpd, None);

        doc.set_override("z", "y", -25.0);
        assert_eq!(resolve_auto_links(&doc, None)[0].cpd, Some(-25.0));
    }

    #[test]
    fn lexicographic_pair_key() {
        assert_eq!(pair_key("b", "a"), ("a", "b"));
        assert_eq!(pair_key("a", "b"), ("a", "b"));
        assert_eq!(pair_key("B", "a"), ("B", "a"));
    }
}
