//! Text sanitization for relayed chat messages

use serde_json::Value;

/// Maximum length, in characters, of relayed text after escaping
pub const MAX_TEXT_CHARS: usize = 1000;

/// Sanitize a raw `msg` value for broadcast
///
/// Returns `None` for falsy input (null, false, zero, empty string,
/// empty array or object). Otherwise the value's string form is
/// HTML-escaped and then cut to [`MAX_TEXT_CHARS`] characters, so the cap
/// applies to the escaped text.
///
/// Arrays and objects are stringified as compact JSON, e.g. `["a",1]`.
pub fn sanitize_text(raw: &Value) -> Option<String> {
    if !is_truthy(raw) {
        return None;
    }

    let escaped = escape_html(&display_value(raw));
    Some(truncate_chars(escaped, MAX_TEXT_CHARS))
}

/// Whether a JSON value counts as present
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

/// Escape the characters that are significant in HTML text and attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

fn truncate_chars(mut text: String, max_chars: usize) -> String {
    if let Some((idx, _)) = text.char_indices().nth(max_chars) {
        text.truncate(idx);
    }
    text
}
