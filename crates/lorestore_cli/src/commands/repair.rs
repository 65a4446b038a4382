//! Repair command implementation.

use super::config_for;
use super::verify::{describe, is_healthy};
use lorestore_core::{Document, StoreDir, TemplateSet};
use lorestore_storage::{DurableWriter, FileBackend, Recovery};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

fn report(label: &str, recovery: &Recovery) {
    match recovery {
        Recovery::Clean => println!("  {label}: ok"),
        Recovery::Created => println!("  {label}: created"),
        Recovery::Empty => println!("  {label}: empty, left as is"),
        Recovery::Salvaged { backup } => {
            println!("  {label}: salvaged, original kept at {}", backup.display());
        }
        Recovery::Reset { backup } => {
            println!("  {label}: reset to default, original kept at {}", backup.display());
        }
    }
}

fn repair_one<T: Serialize + DeserializeOwned>(
    writer: &DurableWriter,
    label: &str,
    path: &Path,
    default: T,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if dry_run {
        let probe = writer.probe::<T>(path)?;
        let action = if is_healthy(&probe) { "nothing to do" } else { "would repair" };
        println!("  {label}: {} ({action})", describe(&probe));
        return Ok(());
    }
    let loaded = writer.load(path, default)?;
    if loaded.recovery.was_corrupt() {
        info!(path = %path.display(), recovery = ?loaded.recovery, "repaired");
    }
    report(label, &loaded.recovery);
    Ok(())
}

/// Runs the repair command.
///
/// Takes the directory lock so a running store is not repaired underneath.
pub fn run(path: &Path, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_for(path);
    let _dir = StoreDir::open(path, !dry_run)?;
    let writer = DurableWriter::new(Arc::new(FileBackend::new()), config.retry);

    println!("Repairing data directory at {:?}", path);
    repair_one(&writer, "Document", &config.data_path(), Document::default(), dry_run)?;
    repair_one(
        &writer,
        "Templates",
        &config.templates_path(),
        TemplateSet::builtin(),
        dry_run,
    )?;
    Ok(())
}
