//! Descriptor document loading with helpful error messages.
//!
//! Document-level problems (missing file, invalid top-level JSON) are fatal
//! and abort before any descriptor processing; everything descriptor-level is
//! diagnosed later, during reconciliation or probing.

use std::path::Path;

use anyhow::{Context, Result};

use super::schema::DescriptorDocument;

/// Load and parse a descriptor document from disk.
pub fn load_descriptor_document(path: &Path) -> Result<DescriptorDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Descriptor document not found: {}", path.display()))?;

    parse_descriptor_document(&content)
        .with_context(|| format!("Failed to parse descriptor document: {}", path.display()))
}

/// Parse descriptor document content from a string.
pub fn parse_descriptor_document(content: &str) -> Result<DescriptorDocument> {
    // Reject non-object top levels up front; the flattened-map error serde
    // produces for these is unhelpful.
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| enhance_json_error(&e, content))?;

    if !value.is_object() {
        anyhow::bail!(
            "Descriptor document must be a JSON object mapping environment names to descriptor lists"
        );
    }

    serde_json::from_value(value).context("Invalid descriptor document structure")
}

/// Enhance JSON parsing errors with the offending line.
fn enhance_json_error(error: &serde_json::Error, content: &str) -> anyhow::Error {
    let line_num = error.line();
    match get_line_context(content, line_num) {
        Some(context) => anyhow::anyhow!(
            "JSON parsing error at line {}:\n{}\n\nError: {}",
            line_num,
            context,
            error
        ),
        None => anyhow::anyhow!("JSON parsing error: {}", error),
    }
}

/// Get context lines around an error.
fn get_line_context(content: &str, line_num: usize) -> Option<String> {
    if line_num == 0 {
        return None;
    }
    let lines: Vec<&str> = content.lines().collect();
    let start = line_num.saturating_sub(2);
    let end = (line_num + 2).min(lines.len());
    if start >= end {
        return None;
    }

    Some(
        lines[start..end]
            .iter()
            .enumerate()
            .map(|(i, line)| {
                let num = start + i + 1;
                let marker = if num == line_num { ">>>" } else { "   " };
                format!("{} {:4} | {}", marker, num, line)
            })
            .collect::<Vec<_>>()
            .join("\n"),
    )
}
