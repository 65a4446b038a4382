//! Crash simulation for LoreStore.
//!
//! These helpers leave a data directory in the states an interrupted
//! process can leave behind:
//!
//! 1. **Killed before the debounce fired** - [`abandon`] drops the store
//!    without its final flush
//! 2. **Torn write** - [`truncate_file`] cuts a file short
//! 3. **Appended garbage** - [`append_garbage`] adds bytes after a valid
//!    document
//! 4. **Killed between write and rename** - [`leave_temp_file`] leaves a
//!    stray temp file next to the document
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lorestore_testkit::crash::*;
//!
//! let config = test_config(dir).lock_dir(false);
//! let store = Store::open(config.clone())?;
//! store.create_node(vec![], None)?;
//! abandon(store);
//! assert!(Store::open(config)?.read()?.nodes.is_empty());
//! ```

use lorestore_core::Store;
use lorestore_storage::DurableWriter;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Discards `store` as if the process had been killed.
///
/// No flush runs and the flush worker is never joined. The store's `LOCK`
/// (if any) stays held until the process exits, so stores meant to be
/// reopened afterwards must be opened with `lock_dir(false)`.
pub fn abandon(store: Store) {
    std::mem::forget(store);
}

/// Truncates the file at `path` to its first `keep` bytes.
pub fn truncate_file(path: &Path, keep: usize) -> io::Result<()> {
    let bytes = fs::read(path)?;
    let keep = keep.min(bytes.len());
    fs::write(path, &bytes[..keep])
}

/// Appends `garbage` to the file at `path`.
pub fn append_garbage(path: &Path, garbage: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(garbage)?;
    file.sync_all()
}

/// Writes `bytes` to the temp sibling the writer uses for `path`.
///
/// Returns the temp path.
pub fn leave_temp_file(path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    let temp = DurableWriter::temp_path(path);
    fs::write(&temp, bytes)?;
    Ok(temp)
}
