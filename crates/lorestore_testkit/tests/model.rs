//! Property tests comparing the store against a plain model.

use lorestore_core::{compute_auto_links, resolve_auto_links, CoreError, Document};
use lorestore_testkit::prelude::*;
use proptest::prelude::*;
use std::collections::HashSet;

/// Undo/redo bookkeeping without a store.
struct Model {
    current: Document,
    undo: Vec<Document>,
    redo: Vec<Document>,
}

impl Model {
    fn commit(&mut self, next: Document) {
        let before = std::mem::replace(&mut self.current, next);
        self.undo.push(before);
        self.redo.clear();
    }
}

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn store_matches_model(ops in operation_sequence_strategy(1, 40)) {
        let store = TestStore::memory();
        let mut model = Model { current: Document::new(), undo: Vec::new(), redo: Vec::new() };

        for op in ops {
            match op {
                StoreOperation::CreateNode { fields } => {
                    let node = store.create_node(fields, None).unwrap();
                    let mut next = model.current.clone();
                    next.nodes.push(node);
                    model.commit(next);
                }
                StoreOperation::DeleteNode { index } => {
                    if model.current.nodes.is_empty() {
                        continue;
                    }
                    let id = model.current.nodes[index % model.current.nodes.len()].id.clone();
                    store.delete_node(&id).unwrap();
                    let mut next = model.current.clone();
                    next.remove_node(&id);
                    model.commit(next);
                }
                StoreOperation::Undo => match model.undo.pop() {
                    Some(prev) => {
                        store.undo().unwrap();
                        let current = std::mem::replace(&mut model.current, prev);
                        model.redo.push(current);
                    }
                    None => prop_assert!(matches!(store.undo(), Err(CoreError::NothingToUndo))),
                },
                StoreOperation::Redo => match model.redo.pop() {
                    Some(next) => {
                        store.redo().unwrap();
                        let current = std::mem::replace(&mut model.current, next);
                        model.undo.push(current);
                    }
                    None => prop_assert!(matches!(store.redo(), Err(CoreError::NothingToRedo))),
                },
            }
            prop_assert_eq!(store.read().unwrap(), model.current.clone());
            let status = store.history_status();
            prop_assert_eq!(status.can_undo, !model.undo.is_empty());
            prop_assert_eq!(status.can_redo, !model.redo.is_empty());
        }
    }

    #[test]
    fn derived_links_are_unique_per_pair(doc in document_strategy(8)) {
        let mut pairs = HashSet::new();
        for link in compute_auto_links(&doc.nodes, None) {
            prop_assert_ne!(&link.source, &link.target);
            prop_assert_eq!(&link.id, &format!("auto-{}-{}", link.source, link.target));
            let key = if link.source <= link.target {
                (link.source.clone(), link.target.clone())
            } else {
                (link.target.clone(), link.source.clone())
            };
            prop_assert!(pairs.insert(key));
        }
    }

    #[test]
    fn suppressed_pairs_never_surface(doc in document_strategy(8)) {
        for link in resolve_auto_links(&doc, None) {
            prop_assert!(!doc.is_suppressed(&link.source, &link.target));
        }
    }

    #[test]
    fn documents_survive_reopen(doc in document_strategy(6)) {
        let store = TestStore::memory();
        store.import_document(doc.clone()).unwrap();
        let store = store.reopen();
        prop_assert_eq!(store.read().unwrap(), doc);
    }
}
