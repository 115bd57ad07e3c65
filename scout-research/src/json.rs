//! Best-effort JSON extraction from free-text model replies
//!
//! Reasoning replies are required to contain one recoverable JSON object,
//! but the model may wrap it in prose. This module is the single place
//! that recovers the object; every call site shares the same two-path
//! policy (strict parse, then the caller's documented default).

use serde_json::{Map, Value};

/// Locate and parse the first brace-delimited JSON object in `text`
///
/// Tries the widest span first (first `{` to last `}`), then falls back
/// to scanning for the first balanced object, which handles replies with
/// prose or further braces after the object.
pub fn extract_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;

    if let Some(end) = text.rfind('}') {
        if end > start {
            if let Ok(value) = serde_json::from_str::<Value>(&text[start..=end]) {
                if value.is_object() {
                    return Some(value);
                }
            }
        }
    }

    first_balanced_object(&text[start..])
}

/// Scan for the first balanced `{...}` span that parses as an object
fn first_balanced_object(text: &str) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let open = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &b) in bytes.iter().enumerate().skip(open) {
            if escaped {
                escaped = false;
                continue;
            }
            match b {
                b'\\' if in_string => escaped = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        if let Ok(value) = serde_json::from_str::<Value>(&text[open..=i]) {
                            if value.is_object() {
                                return Some(value);
                            }
                        }
                        break;
                    }
                }
                _ => {}
            }
        }

        search_from = open + 1;
    }

    None
}

/// String field, if present and a string
pub fn str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Numeric field, if present and a number
pub fn f64_field(obj: &Map<String, Value>, key: &str) -> Option<f64> {
    obj.get(key).and_then(|v| v.as_f64())
}

/// Boolean field, if present and a boolean
pub fn bool_field(obj: &Map<String, Value>, key: &str) -> Option<bool> {
    obj.get(key).and_then(|v| v.as_bool())
}

/// List-of-strings field; non-string entries are skipped
pub fn string_list(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
