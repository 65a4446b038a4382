//! The store facade.
//!
//! [`Store`] ties the pieces together: every mutation reads the cached
//! document, edits a copy, records the previous version in history and
//! installs the copy, which schedules a debounced flush. Reads return
//! independent copies. Templates bypass all of that and are written through
//! immediately.

use crate::config::Config;
use crate::dir::StoreDir;
use crate::error::{CoreError, CoreResult};
use crate::flush::FlushOutcome;
use crate::history::HistoryManager;
use crate::id::new_id;
use crate::inference::resolve_auto_links;
use crate::model::{
    AutoLink, Document, Field, Group, HistoryStatus, Link, Node, SuppressedPair, TemplateSet,
    DEFAULT_GROUP_COLOR, DEFAULT_GROUP_LABEL,
};
use crate::snapshot::SnapshotStore;
use crate::stats::{StatsSnapshot, StoreStats};
use crate::style::{derive_node_style, NodeStyle};
use lorestore_storage::{DurableWriter, FileBackend, Recovery, StorageBackend};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Partial update of a group. `None` leaves a property unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupUpdate {
    /// New label.
    pub label: Option<String>,
    /// New member list.
    pub members: Option<Vec<String>>,
    /// New colour.
    pub color: Option<String>,
    /// New opacity.
    pub opacity: Option<f64>,
}

impl GroupUpdate {
    /// Sets the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the members.
    #[must_use]
    pub fn members<I, S>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.members = Some(members.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the colour.
    #[must_use]
    pub fn color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets the opacity.
    #[must_use]
    pub fn opacity(mut self, opacity: f64) -> Self {
        self.opacity = Some(opacity);
        self
    }

    fn apply(self, group: &mut Group) {
        if let Some(label) = self.label {
            group.label = label;
        }
        if let Some(members) = self.members {
            group.members = members;
        }
        if let Some(color) = self.color {
            group.color = color;
        }
        if let Some(opacity) = self.opacity.filter(|o| o.is_finite()) {
            group.opacity = opacity;
        }
    }
}

/// A node together with its derived style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyledNode {
    /// The stored node.
    #[serde(flatten)]
    pub node: Node,
    /// Derived display style.
    pub style: NodeStyle,
}

impl From<Node> for StyledNode {
    fn from(node: Node) -> Self {
        let style = derive_node_style(&node);
        Self { node, style }
    }
}

/// Everything needed to draw the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphView {
    /// Nodes with styles.
    pub nodes: Vec<StyledNode>,
    /// Manual links.
    pub links: Vec<Link>,
    /// Derived links after suppression and overrides.
    pub auto_links: Vec<AutoLink>,
    /// Groups.
    pub groups: Vec<Group>,
}

/// A graph document store with undo, debounced persistence and derived
/// links.
///
/// # Example
///
/// ```rust,ignore
/// use lorestore_core::{Config, Field, Store};
///
/// let store = Store::open(Config::new().data_dir("world"))?;
/// let alice = store.create_node(vec![Field::text("名称", "Alice")], None)?;
/// store.undo()?;
/// store.close()?;
/// ```
pub struct Store {
    config: Config,
    /// Held for the directory lock; `None` for custom backends.
    _dir: Option<StoreDir>,
    snapshot: SnapshotStore,
    history: Mutex<HistoryManager>,
    writer: DurableWriter,
    templates: Mutex<TemplateSet>,
    stats: Arc<StoreStats>,
    closed: AtomicBool,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("data_path", &self.config.data_path())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl Store {
    /// Opens the store in `config.data_dir` on the OS filesystem.
    ///
    /// Both documents are loaded (and repaired if corrupt) before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns `StoreLocked` if another store holds the directory, or an
    /// I/O error if the documents cannot be read or created.
    pub fn open(config: Config) -> CoreResult<Self> {
        let dir = StoreDir::open(&config.data_dir, config.lock_dir)?;
        Self::open_inner(config, Arc::new(FileBackend::new()), Some(dir))
    }

    /// Opens the store over a custom backend. No directory lock is taken.
    ///
    /// # Errors
    ///
    /// Returns an error if the documents cannot be read or created.
    pub fn open_with_backend(config: Config, backend: Arc<dyn StorageBackend>) -> CoreResult<Self> {
        Self::open_inner(config, backend, None)
    }

    fn open_inner(
        config: Config,
        backend: Arc<dyn StorageBackend>,
        dir: Option<StoreDir>,
    ) -> CoreResult<Self> {
        let writer = DurableWriter::new(backend, config.retry);
        let stats = Arc::new(StoreStats::new());
        let snapshot = SnapshotStore::new(
            writer.clone(),
            config.data_path(),
            config.flush_delay,
            Arc::clone(&stats),
        )?;
        let doc = snapshot.read()?;

        let templates = writer.load(&config.templates_path(), TemplateSet::builtin())?;
        if templates.recovery.was_corrupt() {
            stats.record_recovery();
        }

        info!(
            path = %config.data_path().display(),
            nodes = doc.nodes.len(),
            recovery = ?snapshot.last_recovery(),
            "store opened"
        );

        Ok(Self {
            history: Mutex::new(HistoryManager::new(config.history_capacity)),
            config,
            _dir: dir,
            snapshot,
            writer,
            templates: Mutex::new(templates.value),
            stats,
            closed: AtomicBool::new(false),
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Path of the document file.
    #[must_use]
    pub fn data_path(&self) -> PathBuf {
        self.config.data_path()
    }

    /// How the document was obtained at open.
    #[must_use]
    pub fn recovery(&self) -> Option<Recovery> {
        self.snapshot.last_recovery()
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_closed() {
            return Err(CoreError::StoreClosed);
        }
        Ok(())
    }

    /// Runs `f` on a copy of the document and installs the result.
    ///
    /// The previous document is always recorded in history, which clears
    /// redo, even if `f` changed nothing. If `f` fails nothing is touched.
    fn mutate<R>(&self, f: impl FnOnce(&mut Document) -> CoreResult<R>) -> CoreResult<R> {
        self.mutate_if(|doc| f(doc).map(|result| (result, true)))
    }

    /// Like [`mutate`](Self::mutate), but `f` also reports whether to
    /// commit. An uncommitted edit records no history and writes nothing.
    fn mutate_if<R>(
        &self,
        f: impl FnOnce(&mut Document) -> CoreResult<(R, bool)>,
    ) -> CoreResult<R> {
        self.ensure_open()?;
        let mut history = self.history.lock();
        let before = self.snapshot.read()?;
        let mut doc = before.clone();
        let (result, commit) = f(&mut doc)?;
        if commit {
            history.record_before_mutation(before);
            self.snapshot.write(doc);
        } else {
            debug!("edit skipped, nothing to change");
        }
        Ok(result)
    }

    // === Document ===

    /// Returns an independent copy of the current document.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn read(&self) -> CoreResult<Document> {
        self.ensure_open()?;
        self.snapshot.read()
    }

    /// Replaces the document. Always recorded in history, so even an
    /// identical write clears redo.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn write(&self, doc: Document) -> CoreResult<()> {
        self.mutate(|current| {
            *current = doc;
            Ok(())
        })
    }

    /// Replaces the document with an imported one. Same as
    /// [`write`](Self::write).
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn import_document(&self, doc: Document) -> CoreResult<()> {
        self.write(doc)
    }

    /// Clears nodes, links, suppression, overrides and groups.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn reset(&self) -> CoreResult<()> {
        self.mutate(|doc| {
            doc.clear();
            Ok(())
        })
    }

    // === History ===

    /// Restores the document as it was before the last mutation.
    ///
    /// # Errors
    ///
    /// Returns `NothingToUndo` if there is no history.
    pub fn undo(&self) -> CoreResult<()> {
        self.ensure_open()?;
        let mut history = self.history.lock();
        let current = self.snapshot.read()?;
        let previous = history.undo(current)?;
        self.snapshot.write(previous);
        self.stats.record_undo();
        Ok(())
    }

    /// Re-applies the last undone mutation.
    ///
    /// # Errors
    ///
    /// Returns `NothingToRedo` if nothing was undone since the last mutation.
    pub fn redo(&self) -> CoreResult<()> {
        self.ensure_open()?;
        let mut history = self.history.lock();
        let current = self.snapshot.read()?;
        let next = history.redo(current)?;
        self.snapshot.write(next);
        self.stats.record_redo();
        Ok(())
    }

    /// Returns whether undo and redo are possible.
    #[must_use]
    pub fn history_status(&self) -> HistoryStatus {
        self.history.lock().status()
    }

    // === Templates ===

    /// Returns the template set.
    #[must_use]
    pub fn read_templates(&self) -> TemplateSet {
        self.templates.lock().clone()
    }

    /// Replaces and immediately persists the template set. Not recorded in
    /// history.
    ///
    /// # Errors
    ///
    /// Returns the save error; the previous set stays in effect.
    pub fn write_templates(&self, templates: TemplateSet) -> CoreResult<()> {
        self.ensure_open()?;
        let mut current = self.templates.lock();
        self.writer.save(&self.config.templates_path(), &templates)?;
        *current = templates;
        Ok(())
    }

    // === Ids ===

    /// Returns a new unique id.
    #[must_use]
    pub fn new_id(&self) -> String {
        new_id()
    }

    // === Nodes ===

    /// Appends a node with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn create_node(&self, fields: Vec<Field>, position: Option<Value>) -> CoreResult<Node> {
        self.mutate(|doc| {
            let node = Node {
                id: new_id(),
                fields,
                position,
                extra: serde_json::Map::new(),
            };
            doc.nodes.push(node.clone());
            Ok(node)
        })
    }

    /// Replaces a node's fields and/or position. `None` leaves a part as it
    /// is; a position of `Value::Null` clears it and is stored as `null`.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if no node has `id`.
    pub fn update_node(
        &self,
        id: &str,
        fields: Option<Vec<Field>>,
        position: Option<Value>,
    ) -> CoreResult<Node> {
        self.mutate(|doc| {
            let node = doc.node_mut(id).ok_or_else(|| CoreError::node_not_found(id))?;
            if let Some(fields) = fields {
                node.fields = fields;
            }
            if let Some(position) = position {
                node.position = Some(position);
            }
            Ok(node.clone())
        })
    }

    /// Moves several nodes at once. Unknown ids are skipped.
    ///
    /// Returns the number of nodes updated.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if no id matched; nothing is written.
    pub fn update_positions(&self, positions: &BTreeMap<String, Value>) -> CoreResult<usize> {
        self.mutate(|doc| {
            let mut updated = 0;
            for node in &mut doc.nodes {
                if let Some(position) = positions.get(&node.id) {
                    node.position = Some(position.clone());
                    updated += 1;
                }
            }
            if updated == 0 {
                let first = positions.keys().next().cloned().unwrap_or_default();
                return Err(CoreError::node_not_found(first));
            }
            Ok(updated)
        })
    }

    /// Deletes a node and every manual link touching it. Groups keep the
    /// id.
    ///
    /// # Errors
    ///
    /// Returns `NodeNotFound` if no node has `id`.
    pub fn delete_node(&self, id: &str) -> CoreResult<Node> {
        self.mutate(|doc| doc.remove_node(id).ok_or_else(|| CoreError::node_not_found(id)))
    }

    // === Manual links ===

    /// Adds a manual link. Endpoints are not checked.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn create_link(&self, source: &str, target: &str, label: Option<String>) -> CoreResult<Link> {
        self.mutate(|doc| {
            let link = Link::new(new_id(), source, target, label);
            doc.links.push(link.clone());
            Ok(link)
        })
    }

    /// Updates a link's label and/or curvature.
    ///
    /// # Errors
    ///
    /// Returns `LinkNotFound` if no link has `id`, or `InvalidOperation` for
    /// a non-finite curvature.
    pub fn update_link(
        &self,
        id: &str,
        label: Option<String>,
        cpd: Option<f64>,
    ) -> CoreResult<Link> {
        if cpd.is_some_and(|c| !c.is_finite()) {
            return Err(CoreError::invalid_operation("curvature must be finite"));
        }
        self.mutate(|doc| {
            let link = doc.link_mut(id).ok_or_else(|| CoreError::link_not_found(id))?;
            if label.is_some() {
                link.label = label;
            }
            if cpd.is_some() {
                link.cpd = cpd;
            }
            Ok(link.clone())
        })
    }

    /// Deletes a manual link.
    ///
    /// # Errors
    ///
    /// Returns `LinkNotFound` if no link has `id`.
    pub fn delete_link(&self, id: &str) -> CoreResult<Link> {
        self.mutate(|doc| doc.remove_link(id).ok_or_else(|| CoreError::link_not_found(id)))
    }

    // === Auto-link settings ===

    /// Suppresses auto-links between `a` and `b`. Already suppressed pairs
    /// are left alone without a history entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPair` if `a == b`.
    pub fn suppress(&self, a: &str, b: &str) -> CoreResult<()> {
        if a == b {
            return Err(CoreError::invalid_pair(a, b));
        }
        self.mutate_if(|doc| Ok(((), doc.suppress(a, b))))
    }

    /// Lifts a suppression. Absent pairs are left alone without a history
    /// entry.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPair` if `a == b`.
    pub fn unsuppress(&self, a: &str, b: &str) -> CoreResult<()> {
        if a == b {
            return Err(CoreError::invalid_pair(a, b));
        }
        self.mutate_if(|doc| Ok(((), doc.unsuppress(a, b))))
    }

    /// Lists suppressed pairs.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn suppressed_pairs(&self) -> CoreResult<Vec<SuppressedPair>> {
        Ok(self.read()?.suppressed_auto_pairs)
    }

    /// Sets the curvature of the auto-link `source -> target`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for a non-finite curvature.
    pub fn set_override(&self, source: &str, target: &str, cpd: f64) -> CoreResult<()> {
        if !cpd.is_finite() {
            return Err(CoreError::invalid_operation("curvature must be finite"));
        }
        self.mutate(|doc| {
            doc.set_override(source, target, cpd);
            Ok(())
        })
    }

    // === Groups ===

    /// Creates a group. Unset properties take the defaults (label "编组",
    /// colour `#3b82f6`, opacity 0.08, no members).
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn create_group(&self, update: GroupUpdate) -> CoreResult<Group> {
        self.mutate(|doc| {
            let mut group = Group::new(new_id(), Vec::new());
            update.apply(&mut group);
            if group.label.is_empty() {
                group.label = DEFAULT_GROUP_LABEL.to_string();
            }
            if group.color.is_empty() {
                group.color = DEFAULT_GROUP_COLOR.to_string();
            }
            doc.groups.push(group.clone());
            Ok(group)
        })
    }

    /// Updates a group.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if no group has `id`.
    pub fn update_group(&self, id: &str, update: GroupUpdate) -> CoreResult<Group> {
        self.mutate(|doc| {
            let group = doc.group_mut(id).ok_or_else(|| CoreError::group_not_found(id))?;
            update.apply(group);
            Ok(group.clone())
        })
    }

    /// Deletes a group. Member nodes are untouched.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if no group has `id`.
    pub fn delete_group(&self, id: &str) -> CoreResult<Group> {
        self.mutate(|doc| doc.remove_group(id).ok_or_else(|| CoreError::group_not_found(id)))
    }

    /// Lists groups.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn groups(&self) -> CoreResult<Vec<Group>> {
        Ok(self.read()?.groups)
    }

    // === Derived views ===

    /// Auto-links of the current document with suppression and overrides
    /// applied.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn auto_links(&self, filter: Option<&[String]>) -> CoreResult<Vec<AutoLink>> {
        let doc = self.read()?;
        Ok(resolve_auto_links(&doc, filter))
    }

    /// Builds the full graph view from one snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreClosed` after [`close`](Self::close).
    pub fn graph_view(&self, filter: Option<&[String]>) -> CoreResult<GraphView> {
        let doc = self.read()?;
        let auto_links = resolve_auto_links(&doc, filter);
        Ok(GraphView {
            nodes: doc.nodes.into_iter().map(StyledNode::from).collect(),
            links: doc.links,
            auto_links,
            groups: doc.groups,
        })
    }

    // === Lifecycle ===

    /// Flushes pending changes now instead of waiting for the timer.
    ///
    /// # Errors
    ///
    /// Returns the save error; the changes stay pending.
    pub fn flush(&self) -> CoreResult<FlushOutcome> {
        self.ensure_open()?;
        self.snapshot.flush_now()
    }

    /// Returns true if changes are waiting to be flushed.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.snapshot.is_dirty()
    }

    /// Returns a copy of the statistics.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns true once [`close`](Self::close) has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Stops the flush worker and writes any pending changes.
    ///
    /// Idempotent. Every later operation fails with `StoreClosed`.
    ///
    /// # Errors
    ///
    /// Returns the final save error. The store is closed regardless.
    pub fn close(&self) -> CoreResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        // Wait for in-flight mutations.
        let _history = self.history.lock();
        let outcome = self.snapshot.shutdown()?;
        info!(path = %self.config.data_path().display(), ?outcome, "store closed");
        Ok(())
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            error!(error = %err, "final flush failed, recent changes may be lost");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorestore_storage::InMemoryBackend;
    use serde_json::json;
    use std::path::Path;
    use std::time::Duration;

    fn memory_store() -> (Arc<InMemoryBackend>, Store) {
        let backend = Arc::new(InMemoryBackend::new());
        let config = Config::new()
            .data_dir("mem")
            .flush_delay(Duration::from_secs(60));
        let store = Store::open_with_backend(config, backend.clone()).unwrap();
        (backend, store)
    }

    fn persisted(backend: &InMemoryBackend) -> Document {
        let bytes = backend.get(&Path::new("mem").join("data.json")).unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn open_creates_both_documents() {
        let (backend, store) = memory_store();
        assert_eq!(store.recovery(), Some(Recovery::Created));
        assert!(backend.get(&Path::new("mem").join("templates.json")).is_some());
        assert_eq!(store.read_templates(), TemplateSet::builtin());
        assert_eq!(persisted(&backend), Document::default());
    }

    #[test]
    fn create_node_records_history() {
        let (_, store) = memory_store();
        let node = store
            .create_node(vec![Field::text("名称", "Alice")], Some(json!({"x": 1, "y": 2})))
            .unwrap();
        assert_eq!(node.id.len(), 32);
        assert_eq!(store.read().unwrap().nodes, vec![node]);
        assert!(store.history_status().can_undo);
        store.undo().unwrap();
        assert!(store.read().unwrap().nodes.is_empty());
    }

    #[test]
    fn failed_mutation_touches_nothing() {
        let (_, store) = memory_store();
        let err = store.update_node("missing", Some(vec![]), None).unwrap_err();
        assert!(matches!(err, CoreError::NodeNotFound { .. }));
        assert!(!store.history_status().can_undo);
        assert!(!store.is_dirty());
    }

    #[test]
    fn update_node_keeps_unspecified_parts() {
        let (_, store) = memory_store();
        let node = store
            .create_node(vec![Field::text("名称", "A")], Some(json!({"x": 0})))
            .unwrap();
        let updated = store.update_node(&node.id, None, Some(json!({"x": 5}))).unwrap();
        assert_eq!(updated.fields, node.fields);
        assert_eq!(updated.position, Some(json!({"x": 5})));
    }

    #[test]
    fn null_position_matches_disk_after_close() {
        let (backend, store) = memory_store();
        let node = store.create_node(vec![], Some(Value::Null)).unwrap();
        let cached = store.read().unwrap();
        assert_eq!(cached.nodes[0].position, Some(Value::Null));

        store.close().unwrap();
        assert_eq!(persisted(&backend), cached);
        assert_eq!(persisted(&backend).nodes[0].id, node.id);
    }

    #[test]
    fn update_node_can_clear_position() {
        let (backend, store) = memory_store();
        let node = store.create_node(vec![], Some(json!({"x": 3}))).unwrap();
        let cleared = store.update_node(&node.id, None, Some(Value::Null)).unwrap();
        assert_eq!(cleared.position, Some(Value::Null));
        store.flush().unwrap();
        assert_eq!(persisted(&backend).nodes[0], cleared);
    }

    #[test]
    fn update_positions_counts_matches() {
        let (_, store) = memory_store();
        let a = store.create_node(vec![], None).unwrap();
        let b = store.create_node(vec![], None).unwrap();
        let mut positions = BTreeMap::new();
        positions.insert(a.id.clone(), json!({"x": 1}));
        positions.insert(b.id.clone(), json!({"x": 2}));
        positions.insert("ghost".to_string(), json!({"x": 3}));
        assert_eq!(store.update_positions(&positions).unwrap(), 2);

        let mut none = BTreeMap::new();
        none.insert("ghost".to_string(), json!({"x": 3}));
        let undo_before = store.history_status();
        assert!(matches!(
            store.update_positions(&none),
            Err(CoreError::NodeNotFound { .. })
        ));
        assert_eq!(store.history_status(), undo_before);
    }

    #[test]
    fn delete_node_cascades_links_in_one_step() {
        let (_, store) = memory_store();
        let a = store.create_node(vec![], None).unwrap();
        let b = store.create_node(vec![], None).unwrap();
        store.create_link(&a.id, &b.id, Some("knows".into())).unwrap();
        let group = store
            .create_group(GroupUpdate::default().members([a.id.clone()]))
            .unwrap();

        store.delete_node(&a.id).unwrap();
        let doc = store.read().unwrap();
        assert!(doc.links.is_empty());
        assert_eq!(doc.groups[0].members, group.members);

        store.undo().unwrap();
        let doc = store.read().unwrap();
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.links.len(), 1);
    }

    #[test]
    fn link_crud() {
        let (_, store) = memory_store();
        let link = store.create_link("a", "b", None).unwrap();
        assert_eq!(link.link_type, "manual");
        let updated = store.update_link(&link.id, Some("rival".into()), Some(12.0)).unwrap();
        assert_eq!(updated.label.as_deref(), Some("rival"));
        assert_eq!(updated.cpd, Some(12.0));
        assert!(matches!(
            store.update_link(&link.id, None, Some(f64::NAN)),
            Err(CoreError::InvalidOperation { .. })
        ));
        store.delete_link(&link.id).unwrap();
        assert!(matches!(
            store.delete_link(&link.id),
            Err(CoreError::LinkNotFound { .. })
        ));
    }

    #[test]
    fn suppress_rules() {
        let (_, store) = memory_store();
        assert!(matches!(
            store.suppress("a", "a"),
            Err(CoreError::InvalidPair { .. })
        ));
        store.suppress("b", "a").unwrap();
        assert_eq!(store.suppressed_pairs().unwrap(), vec![SuppressedPair::new("a", "b")]);

        // Second suppress and absent unsuppress record nothing.
        store.undo().unwrap();
        assert!(!store.history_status().can_undo);
        store.suppress("a", "b").unwrap();
        store.suppress("a", "b").unwrap();
        store.unsuppress("x", "y").unwrap();
        store.undo().unwrap();
        assert!(!store.history_status().can_undo);
    }

    #[test]
    fn graph_view_applies_styles_suppression_and_overrides() {
        let (_, store) = memory_store();
        let y = store
            .create_node(
                vec![Field::tag("标签", "NPC"), Field::text("名称", "Alice")],
                None,
            )
            .unwrap();
        let z = store
            .create_node(vec![Field::text("NPC", "Alice")], None)
            .unwrap();
        store.set_override(&z.id, &y.id, 33.0).unwrap();

        let view = store.graph_view(None).unwrap();
        assert_eq!(view.nodes[0].style.colors, vec!["#4F8EF7"]);
        assert_eq!(view.auto_links.len(), 1);
        assert_eq!(view.auto_links[0].cpd, Some(33.0));

        let value = serde_json::to_value(&view).unwrap();
        assert!(value["autoLinks"].is_array());
        assert_eq!(value["nodes"][0]["id"], y.id.as_str());
        assert!(value["nodes"][0]["style"]["size"].is_number());

        store.suppress(&y.id, &z.id).unwrap();
        assert!(store.graph_view(None).unwrap().auto_links.is_empty());
    }

    #[test]
    fn groups_crud_and_defaults() {
        let (_, store) = memory_store();
        let group = store.create_group(GroupUpdate::default()).unwrap();
        assert_eq!(group.label, DEFAULT_GROUP_LABEL);
        assert_eq!(group.color, DEFAULT_GROUP_COLOR);
        assert!((group.opacity - 0.08).abs() < f64::EPSILON);

        let updated = store
            .update_group(&group.id, GroupUpdate::default().label("Harbor").opacity(0.3))
            .unwrap();
        assert_eq!(updated.label, "Harbor");
        assert_eq!(updated.color, DEFAULT_GROUP_COLOR);
        assert_eq!(store.groups().unwrap(), vec![updated]);

        store.delete_group(&group.id).unwrap();
        assert!(matches!(
            store.update_group(&group.id, GroupUpdate::default()),
            Err(CoreError::GroupNotFound { .. })
        ));
    }

    #[test]
    fn reset_and_import_are_undoable() {
        let (_, store) = memory_store();
        store.create_node(vec![], None).unwrap();
        store.reset().unwrap();
        assert!(store.read().unwrap().is_empty());
        store.undo().unwrap();
        assert_eq!(store.read().unwrap().nodes.len(), 1);

        let mut imported = Document::new();
        imported.nodes.push(Node::new("i1", vec![]));
        store.import_document(imported.clone()).unwrap();
        assert_eq!(store.read().unwrap(), imported);
    }

    #[test]
    fn templates_write_through_without_history() {
        let (backend, store) = memory_store();
        let mut set = TemplateSet::new();
        set.insert("势力", vec![Field::text("名称", "")]);
        store.write_templates(set.clone()).unwrap();
        assert_eq!(store.read_templates(), set);
        assert!(!store.history_status().can_undo);
        let bytes = backend.get(&Path::new("mem").join("templates.json")).unwrap();
        let on_disk: TemplateSet = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(on_disk, set);
    }

    #[test]
    fn template_order_survives_write_through() {
        let (backend, store) = memory_store();
        let mut set = TemplateSet::new();
        set.insert("Zeta", vec![]);
        set.insert("Alpha", vec![]);
        store.write_templates(set).unwrap();

        let bytes = backend.get(&Path::new("mem").join("templates.json")).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.find("Zeta").unwrap() < text.find("Alpha").unwrap());
        let reread: TemplateSet = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(reread.names().collect::<Vec<_>>(), vec!["Zeta", "Alpha"]);
        assert_eq!(store.read_templates().names().collect::<Vec<_>>(), vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn close_flushes_and_rejects_later_calls() {
        let (backend, store) = memory_store();
        store.create_node(vec![Field::text("名称", "A")], None).unwrap();
        assert!(store.is_dirty());
        assert!(persisted(&backend).nodes.is_empty());

        store.close().unwrap();
        assert_eq!(persisted(&backend).nodes.len(), 1);
        assert!(matches!(store.read(), Err(CoreError::StoreClosed)));
        assert!(matches!(store.undo(), Err(CoreError::StoreClosed)));
        store.close().unwrap();
    }

    #[test]
    fn drop_flushes() {
        let (backend, store) = memory_store();
        store.create_node(vec![], None).unwrap();
        drop(store);
        assert_eq!(persisted(&backend).nodes.len(), 1);
    }
}
