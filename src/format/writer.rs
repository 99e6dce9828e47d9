//! Document emission for the JSONC config format.
//!
//! Wraps a pretty-printed structural value with a `CONFIG_SECTION` header
//! block and a closing footer block, and reinserts recorded comments
//! immediately above the property lines they belong to.

use std::collections::HashMap;

use chrono::Local;
use serde_json::Value;

use crate::store::descriptor::ConfigMetadata;

/// Render `value` as the full on-disk document.
///
/// Section comments from `metadata` take precedence over inline comments
/// harvested from the previous parse: when both exist for a property, the
/// section comment line is emitted first.
pub fn render_document(
    value: &Value,
    version: &str,
    metadata: &ConfigMetadata,
    comments: &HashMap<String, String>,
) -> Result<String, serde_json::Error> {
    let body = serde_json::to_string_pretty(value)?;

    let mut out = String::with_capacity(body.len() + 256);
    push_header(&mut out, version, metadata);

    let lines: Vec<&str> = body.lines().collect();
    for (index, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(name) = property_name(trimmed) {
            let indent = &line[..line.len() - trimmed.len()];
            if let Some(comment) = metadata.section_comments.get(name) {
                out.push_str(indent);
                out.push_str("// ");
                out.push_str(comment);
                out.push('\n');
            }
            if let Some(comment) = comments.get(name) {
                out.push_str(indent);
                out.push_str("// ");
                out.push_str(comment);
                out.push('\n');
            }
        }
        out.push_str(line);
        if index < lines.len() - 1 {
            out.push('\n');
        }
    }

    push_footer(&mut out, metadata);
    Ok(out)
}

/// Property name of a pretty-printed line, if it declares one.
/// `"retries": 3,` yields `retries`; `},` yields nothing.
fn property_name(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix('"')?;
    let end = rest.find('"')?;
    let after = rest[end + 1..].trim_start();
    if after.starts_with(':') {
        Some(&rest[..end])
    } else {
        None
    }
}

fn push_header(out: &mut String, version: &str, metadata: &ConfigMetadata) {
    out.push_str("/* CONFIG_SECTION\n");
    for line in &metadata.header_comments {
        out.push_str(" * ");
        out.push_str(line);
        out.push('\n');
    }
    if metadata.include_version {
        out.push_str(" * Version: ");
        out.push_str(version);
        out.push('\n');
    }
    if metadata.include_timestamp {
        out.push_str(&format!(
            " * Last updated: {}\n",
            Local::now().format("%Y-%m-%dT%H:%M:%S")
        ));
    }
    out.push_str(" */\n");
}

fn push_footer(out: &mut String, metadata: &ConfigMetadata) {
    out.push_str("\n/*\n");
    for line in &metadata.footer_comments {
        out.push_str(" * ");
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(" * END_CONFIG_SECTION\n */");
}
