//! # LoreStore Core
//!
//! Persistence and consistency core for LoreStore graph documents.
//!
//! This crate provides:
//! - The document model (nodes, manual links, groups, suppression and
//!   curvature overrides) with lenient JSON decoding
//! - A lock-guarded snapshot cache with debounced durable flushing
//! - Bounded, in-memory undo/redo history
//! - Auto-link inference from tag and name fields
//! - The [`Store`] facade tying these together, plus templates, ids and
//!   statistics
//!
//! Durable file handling lives in `lorestore_storage`.
//!
//! ## Example
//!
//! ```rust
//! use lorestore_core::{compute_auto_links, Field, Node};
//!
//! let nodes = vec![
//!     Node::new("y", vec![Field::tag("标签", "NPC"), Field::text("名称", "Alice")]),
//!     Node::new("z", vec![Field::text("NPC", "Alice")]),
//! ];
//! let links = compute_auto_links(&nodes, None);
//! assert_eq!(links[0].label, "NPC:Alice");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod dir;
mod error;
mod flush;
mod history;
mod id;
pub mod inference;
pub mod model;
mod snapshot;
mod stats;
mod store;
pub mod style;

pub use config::{parse_delay_secs, Config, FLUSH_DELAY_ENV};
pub use dir::StoreDir;
pub use error::{CoreError, CoreResult};
pub use flush::{Flush, FlushOutcome, FlushScheduler};
pub use history::{HistoryManager, DEFAULT_HISTORY_CAPACITY};
pub use id::new_id;
pub use inference::{compute_auto_links, resolve_auto_links};
pub use model::{
    AutoLink, Document, Field, FieldType, Group, HistoryStatus, Link, Node, SuppressedPair,
    TemplateSet,
};
pub use snapshot::SnapshotStore;
pub use stats::{StatsSnapshot, StoreStats};
pub use store::{GraphView, GroupUpdate, Store, StyledNode};
pub use style::{derive_node_style, stable_color_for_tag, NodeStyle};

pub use lorestore_storage::{Recovery, RetryPolicy};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
