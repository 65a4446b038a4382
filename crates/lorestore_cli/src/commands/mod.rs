//! CLI command implementations.

pub mod auto_links;
pub mod inspect;
pub mod repair;
pub mod verify;

use lorestore_core::{Config, Document};
use lorestore_storage::{FileBackend, StorageBackend};
use std::error::Error;
use std::path::Path;

/// Configuration for a data directory with default file names.
pub(crate) fn config_for(dir: &Path) -> Config {
    Config::from_env().data_dir(dir)
}

/// Reads and decodes the document without repairing anything.
pub(crate) fn read_document(dir: &Path) -> Result<Document, Box<dyn Error>> {
    let path = config_for(dir).data_path();
    let bytes = FileBackend::new()
        .read(&path)?
        .ok_or_else(|| format!("No document found at {}", path.display()))?;
    lorestore_codec::from_json_bytes(&bytes).map_err(|err| {
        format!(
            "Document at {} is corrupt ({err}); run `lorestore repair`",
            path.display()
        )
        .into()
    })
}
