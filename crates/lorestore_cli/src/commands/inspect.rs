//! Inspect command implementation.

use super::{config_for, read_document};
use lorestore_core::{resolve_auto_links, Document, TemplateSet};
use lorestore_storage::{list_backups, BackupKind, FileBackend, StorageBackend};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Data directory inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Data directory.
    pub path: String,
    /// Document size in bytes.
    pub data_size: u64,
    /// Number of nodes.
    pub node_count: usize,
    /// Number of fields across all nodes.
    pub field_count: usize,
    /// Number of manual links.
    pub link_count: usize,
    /// Number of derived links after suppression.
    pub auto_link_count: usize,
    /// Number of groups.
    pub group_count: usize,
    /// Number of suppressed pairs.
    pub suppressed_pairs: usize,
    /// Number of curvature overrides.
    pub overrides: usize,
    /// Nodes per tag value.
    pub tags: BTreeMap<String, usize>,
    /// Template names, if the template file decodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub templates: Option<Vec<String>>,
    /// Corrupt-file backups of the document.
    pub corrupt_backups: usize,
    /// Permission-error backups of the document.
    pub permerr_backups: usize,
}

impl InspectResult {
    fn summarize(path: &Path, data_size: u64, doc: &Document) -> Self {
        let mut tags = BTreeMap::new();
        for node in &doc.nodes {
            let mut seen: Vec<&str> = node.tags().collect();
            seen.sort_unstable();
            seen.dedup();
            for tag in seen {
                *tags.entry(tag.to_string()).or_insert(0) += 1;
            }
        }

        Self {
            path: path.display().to_string(),
            data_size,
            node_count: doc.nodes.len(),
            field_count: doc.nodes.iter().map(|n| n.fields.len()).sum(),
            link_count: doc.links.len(),
            auto_link_count: resolve_auto_links(doc, None).len(),
            group_count: doc.groups.len(),
            suppressed_pairs: doc.suppressed_auto_pairs.len(),
            overrides: doc.auto_edge_overrides.len(),
            tags,
            templates: None,
            corrupt_backups: 0,
            permerr_backups: 0,
        }
    }
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = config_for(path);
    let data_path = config.data_path();
    let doc = read_document(path)?;
    let data_size = std::fs::metadata(&data_path)?.len();

    let mut result = InspectResult::summarize(path, data_size, &doc);
    result.corrupt_backups = list_backups(&data_path, BackupKind::Corrupt).len();
    result.permerr_backups = list_backups(&data_path, BackupKind::PermissionError).len();
    result.templates = FileBackend::new()
        .read(&config.templates_path())?
        .and_then(|bytes| lorestore_codec::from_json_bytes::<TemplateSet>(&bytes).ok())
        .map(|set| set.names().map(str::to_string).collect());

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("LoreStore Data Inspection");
    println!("=========================");
    println!();
    println!("Path: {}", result.path);
    println!("Document size: {}", format_size(result.data_size));
    println!();
    println!("Graph:");
    println!("  Nodes:       {} ({} fields)", result.node_count, result.field_count);
    println!("  Links:       {}", result.link_count);
    println!("  Auto-links:  {}", result.auto_link_count);
    println!("  Groups:      {}", result.group_count);
    println!("  Suppressed:  {}", result.suppressed_pairs);
    println!("  Overrides:   {}", result.overrides);

    if !result.tags.is_empty() {
        println!();
        println!("Tags:");
        for (tag, count) in &result.tags {
            println!("  {tag}: {count}");
        }
    }

    println!();
    match &result.templates {
        Some(names) => println!("Templates: {}", names.join(", ")),
        None => println!("Templates: (missing or corrupt)"),
    }
    println!(
        "Backups: {} corrupt, {} permission",
        result.corrupt_backups, result.permerr_backups
    );
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} bytes", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
