//! Verify command implementation.

use super::config_for;
use lorestore_core::{Document, TemplateSet};
use lorestore_storage::{DurableWriter, FileBackend, Probe};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;

/// Returns true if the probe found nothing that needs repair.
pub(crate) fn is_healthy(probe: &Probe) -> bool {
    matches!(probe, Probe::Missing | Probe::Empty | Probe::Healthy { .. })
}

pub(crate) fn describe(probe: &Probe) -> String {
    match probe {
        Probe::Missing => "missing (will be created on open)".to_string(),
        Probe::Empty => "empty (treated as default)".to_string(),
        Probe::Healthy { size } => format!("ok, {size} bytes"),
        Probe::Salvageable {
            size,
            salvaged_len,
            reason,
        } => format!("corrupt ({reason}); {salvaged_len} of {size} bytes salvageable"),
        Probe::Unrecoverable { size, reason } => {
            format!("corrupt ({reason}); nothing salvageable in {size} bytes")
        }
    }
}

fn check<T: DeserializeOwned>(
    writer: &DurableWriter,
    label: &str,
    path: &Path,
) -> Result<bool, Box<dyn std::error::Error>> {
    let probe = writer.probe::<T>(path)?;
    let mark = if is_healthy(&probe) { "✓" } else { "✗" };
    println!("{mark} {label}: {}", describe(&probe));
    Ok(is_healthy(&probe))
}

/// Runs the verify command.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying data directory at {:?}", path);
    println!();

    let config = config_for(path);
    let writer = DurableWriter::new(Arc::new(FileBackend::new()), config.retry);
    let data_ok = check::<Document>(&writer, "Document", &config.data_path())?;
    let templates_ok = check::<TemplateSet>(&writer, "Templates", &config.templates_path())?;

    println!();
    if data_ok && templates_ok {
        println!("✓ Verification passed");
        Ok(())
    } else {
        println!("✗ Verification failed; run `lorestore repair`");
        Err("Verification failed".into())
    }
}
