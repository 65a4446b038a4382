//! Auto-links command implementation.

use super::read_document;
use lorestore_core::resolve_auto_links;
use std::path::Path;

/// Runs the auto-links command.
pub fn run(path: &Path, fields: &[String], format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let doc = read_document(path)?;
    let links = resolve_auto_links(&doc, Some(fields));

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&links)?),
        _ => {
            for link in &links {
                match link.cpd {
                    Some(cpd) => println!(
                        "{} -> {}  [{}] rule {} cpd {cpd}",
                        link.source, link.target, link.label, link.rule
                    ),
                    None => println!(
                        "{} -> {}  [{}] rule {}",
                        link.source, link.target, link.label, link.rule
                    ),
                }
            }
            println!("{} auto-link(s)", links.len());
        }
    }

    Ok(())
}
