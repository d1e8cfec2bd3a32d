use serde_json::Value;
use tracing::warn;

use crate::models::inventory::InventoryEntry;
use crate::models::plan::{MoveItem, Plan, PlanCategory};

/// Responses larger than this are handled by the first-object extraction
/// path instead of the full truncation scan.
pub const MAX_RESPONSE_BYTES: usize = 1_000_000;

/// Result of type-checking a sanitized response against the plan wire shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedPlan {
    Valid(Plan),
    /// Parsed, but nothing usable survived validation.
    Empty,
    /// Not JSON, or not an object at the top level.
    Malformed,
}

/// Extract a well-formed JSON object from a noisy generator response:
/// strips markdown fences and stray quoting, then truncates to the last
/// balanced top-level object so trailing prose is discarded. If no balanced
/// object exists the cleaned text is returned as-is and the parser decides.
/// Total: never fails, worst case yields `"{}"`.
pub fn sanitize_response(raw: &str) -> String {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned
        .trim_matches(|c: char| c == '"' || c.is_whitespace())
        .to_string();

    if cleaned.len() > MAX_RESPONSE_BYTES {
        warn!(bytes = cleaned.len(), "large response, extracting first object");
        return extract_first_object(&cleaned);
    }

    let mut depth = 0usize;
    let mut last_complete = 0usize;
    for (offset, ch) in cleaned.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                if depth > 0 {
                    depth -= 1;
                    if depth == 0 {
                        last_complete = offset + 1;
                    }
                }
            }
            _ => {}
        }
    }

    if last_complete > 0 {
        cleaned[..last_complete].to_string()
    } else {
        cleaned
    }
}

/// Chunked path for oversized responses: the span of the first balanced
/// brace group, everything after its matching close discarded.
fn extract_first_object(text: &str) -> String {
    let Some(start) = text.find('{') else {
        return "{}".to_string();
    };

    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return text[start..start + offset + 1].to_string();
                }
            }
            _ => {}
        }
    }
    "{}".to_string()
}

/// Type-check sanitized text against the expected wire shape. Categories
/// whose value is not an array are dropped whole; array entries that are not
/// objects carrying string `original_path` and `new_path` fields are dropped
/// individually without error.
pub fn parse_plan(sanitized: &str) -> ParsedPlan {
    let parsed: Value = match serde_json::from_str(sanitized) {
        Ok(value) => value,
        Err(_) => return ParsedPlan::Malformed,
    };
    let Value::Object(entries) = parsed else {
        return ParsedPlan::Malformed;
    };

    let mut categories = Vec::new();
    for (name, value) in entries {
        let Value::Array(raw_items) = value else {
            continue;
        };
        let items: Vec<MoveItem> = raw_items
            .iter()
            .filter_map(|raw| {
                let original_path = raw.get("original_path")?.as_str()?;
                let new_path = raw.get("new_path")?.as_str()?;
                Some(MoveItem {
                    original_path: original_path.to_string(),
                    new_path: new_path.to_string(),
                })
            })
            .collect();
        if !items.is_empty() {
            categories.push(PlanCategory { name, items });
        }
    }

    if categories.is_empty() {
        ParsedPlan::Empty
    } else {
        ParsedPlan::Valid(Plan { categories })
    }
}

/// Deterministic category-by-extension plan: every non-folder entry lands
/// under its lower-cased category label. Categories appear in first-seen
/// inventory order.
pub fn fallback_plan(inventory: &[InventoryEntry]) -> Plan {
    let mut categories: Vec<PlanCategory> = Vec::new();
    for entry in inventory {
        if entry.is_folder {
            continue;
        }
        let label = entry.category.label();
        let item = MoveItem {
            original_path: entry.relative_path.clone(),
            new_path: format!("{label}/{}", entry.relative_path),
        };
        match categories.iter_mut().find(|category| category.name == label) {
            Some(category) => category.items.push(item),
            None => categories.push(PlanCategory {
                name: label.to_string(),
                items: vec![item],
            }),
        }
    }
    Plan { categories }
}

/// Full pipeline from an untrusted response to a usable plan: sanitize,
/// parse, and substitute the fallback when nothing trustworthy came back.
pub fn resolve_plan(raw: &str, inventory: &[InventoryEntry]) -> Plan {
    match parse_plan(&sanitize_response(raw)) {
        ParsedPlan::Valid(plan) => plan,
        ParsedPlan::Empty => {
            warn!("response contained no usable plan entries, using fallback");
            fallback_plan(inventory)
        }
        ParsedPlan::Malformed => {
            warn!("response was not a valid plan document, using fallback");
            fallback_plan(inventory)
        }
    }
}
