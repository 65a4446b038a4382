//! Test fixtures and store helpers.
//!
//! Provides convenience functions for setting up test stores
//! and common sample documents.

use lorestore_core::{Config, Document, Field, Group, Link, Node, Store};
use lorestore_storage::InMemoryBackend;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Flush delay used by test stores, short enough to keep tests quick.
pub const TEST_FLUSH_DELAY: Duration = Duration::from_millis(50);

/// A test store with automatic cleanup.
pub struct TestStore {
    /// The store instance.
    pub store: Store,
    /// The in-memory backend, if the store is not file-based.
    pub backend: Option<Arc<InMemoryBackend>>,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: Option<TempDir>,
}

impl TestStore {
    /// Creates a store over an in-memory backend.
    pub fn memory() -> Self {
        let backend = Arc::new(InMemoryBackend::new());
        let store = Store::open_with_backend(test_config("mem"), backend.clone())
            .expect("Failed to open in-memory store");
        Self {
            store,
            backend: Some(backend),
            _temp_dir: None,
        }
    }

    /// Creates a store in a fresh temporary directory.
    pub fn file() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Store::open(test_config(temp_dir.path())).expect("Failed to open file store");
        Self {
            store,
            backend: None,
            _temp_dir: Some(temp_dir),
        }
    }

    /// Returns the data directory if file-based, None if in-memory.
    pub fn dir(&self) -> Option<&Path> {
        self._temp_dir.as_ref().map(TempDir::path)
    }

    /// Closes the store and opens it again over the same files.
    pub fn reopen(self) -> Self {
        let Self {
            store,
            backend,
            _temp_dir,
        } = self;
        let config = store.config().clone();
        store.close().expect("Failed to close store");
        drop(store);

        let store = match &backend {
            Some(backend) => Store::open_with_backend(config, backend.clone()),
            None => Store::open(config),
        }
        .expect("Failed to reopen store");
        Self {
            store,
            backend,
            _temp_dir,
        }
    }
}

impl std::ops::Deref for TestStore {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

/// Configuration rooted at `dir` with the short test flush delay.
pub fn test_config(dir: impl AsRef<Path>) -> Config {
    Config::new()
        .data_dir(dir.as_ref())
        .flush_delay(TEST_FLUSH_DELAY)
}

/// Runs a test with a temporary in-memory store.
///
/// # Example
///
/// ```rust,ignore
/// use lorestore_testkit::with_temp_store;
///
/// #[test]
/// fn my_test() {
///     with_temp_store(|store| {
///         store.create_node(vec![], None).unwrap();
///     });
/// }
/// ```
pub fn with_temp_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store) -> R,
{
    let test_store = TestStore::memory();
    f(&test_store.store)
}

/// Runs a test with a store in a temporary directory.
pub fn with_file_store<F, R>(f: F) -> R
where
    F: FnOnce(&Store, &Path) -> R,
{
    let test_store = TestStore::file();
    let dir = test_store.dir().expect("File store should have a directory");
    f(&test_store.store, dir)
}

/// Number of auto-links [`sample_world`] derives.
pub const SAMPLE_AUTO_LINKS: usize = 2;

/// A small world: two characters and a tavern.
///
/// Bob names the tavern in his `地点` field and Alice by alias in his `NPC`
/// field, so two edges are derived. Alice also has one manual link to the
/// tavern and both characters share a group.
pub fn sample_world() -> Document {
    let mut doc = Document::new();
    doc.nodes = vec![
        Node::new(
            "alice",
            vec![
                Field::tag("标签", "NPC"),
                Field::text("名称", "Alice"),
                Field::text("别名", "Al, Ally"),
            ],
        ),
        Node::new(
            "tavern",
            vec![Field::tag("标签", "地点"), Field::text("名称", "Rusty Mug")],
        ),
        Node::new(
            "bob",
            vec![
                Field::tag("标签", "NPC"),
                Field::text("名称", "Bob"),
                Field::text("地点", "Rusty Mug"),
                Field::text("NPC", "Ally"),
                Field::number("age", "41"),
            ],
        ),
    ];
    doc.links = vec![Link::new(
        "l-works",
        "alice",
        "tavern",
        Some("works at".to_string()),
    )];
    doc.groups = vec![Group::new(
        "g-cast",
        vec!["alice".to_string(), "bob".to_string()],
    )];
    doc
}

/// A document of `count` untagged nodes named `n0`, `n1`, and so on.
pub fn numbered_nodes(count: usize) -> Document {
    let mut doc = Document::new();
    doc.nodes = (0..count)
        .map(|i| Node::new(format!("n{i}"), vec![Field::text("名称", format!("n{i}"))]))
        .collect();
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorestore_core::resolve_auto_links;

    #[test]
    fn sample_world_derives_expected_links() {
        let links = resolve_auto_links(&sample_world(), None);
        assert_eq!(links.len(), SAMPLE_AUTO_LINKS);
        assert!(links
            .iter()
            .any(|l| l.source == "bob" && l.target == "tavern" && l.label == "地点:Rusty Mug"));
        assert!(links
            .iter()
            .any(|l| l.source == "bob" && l.target == "alice" && l.label == "NPC:Ally"));
    }

    #[test]
    fn with_temp_store_starts_empty() {
        with_temp_store(|store| {
            assert!(store.read().unwrap().is_empty());
        });
    }

    #[test]
    fn reopen_keeps_data() {
        let test_store = TestStore::memory();
        test_store.import_document(sample_world()).unwrap();
        let test_store = test_store.reopen();
        assert_eq!(test_store.read().unwrap(), sample_world());
    }

    #[test]
    fn file_store_reopen_keeps_data() {
        let test_store = TestStore::file();
        test_store.import_document(numbered_nodes(3)).unwrap();
        let test_store = test_store.reopen();
        assert_eq!(test_store.read().unwrap().nodes.len(), 3);
    }
}
