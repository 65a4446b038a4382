//! Document data model.

mod document;
mod edit;
pub mod lenient;
mod template;

pub use document::{
    AutoLink, Document, Field, FieldType, Group, HistoryStatus, Link, Node, SuppressedPair,
    AUTO_LINK_TYPE, DEFAULT_GROUP_COLOR, DEFAULT_GROUP_LABEL, MANUAL_LINK_TYPE, TAG_NAME_RULE,
};
pub use edit::override_key;
pub use template::TemplateSet;
