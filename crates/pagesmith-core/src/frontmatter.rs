//! Front-matter extraction and flat-map parsing.
//!
//! The block between the first two `---` delimiters is parsed as YAML
//! and flattened to string values, with empty values trimmed away.

use std::collections::BTreeMap;

use serde_yaml_ng::Value;

/// Extract the raw front-matter block, without the `---` delimiters.
/// Returns `None` when the content carries no block.
pub fn extract_block(content: &str) -> Option<&str> {
    let mut sections = content.splitn(3, "---");
    sections.next()?;
    let block = sections.next()?;
    // A closing delimiter must exist for the block to count.
    sections.next()?;
    Some(block)
}

/// Parse a front-matter block into a flat key → string map. Nested
/// values are skipped, empty values are trimmed out. Returns `None`
/// when the block is not valid YAML or not a mapping.
pub fn parse_flat(block: &str) -> Option<BTreeMap<String, String>> {
    let value: Value = serde_yaml_ng::from_str(block).ok()?;
    let mapping = value.as_mapping()?;
    let mut flat = BTreeMap::new();
    for (key, value) in mapping {
        let Some(key) = key.as_str() else { continue };
        let rendered = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            _ => continue,
        };
        if !rendered.is_empty() {
            flat.insert(key.to_string(), rendered);
        }
    }
    Some(flat)
}

/// Boolean-ish truth test for front-matter values; absent is false.
pub fn is_truthy(value: Option<&String>) -> bool {
    matches!(
        value.map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("true") | Some("yes") | Some("1")
    )
}

/// `true` when the value is present and explicitly false-like.
pub fn is_explicitly_false(value: Option<&String>) -> bool {
    matches!(
        value.map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("false") | Some("no") | Some("0")
    )
}
