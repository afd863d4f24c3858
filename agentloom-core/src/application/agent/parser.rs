//! Tool-call extraction from free-form model output.

use super::models::ToolCallRequest;
use serde_json::Value;

/// Every bracket-balanced `{...}` or `[...]` in `content` with its byte
/// offset, in order of the opening bracket. Brackets inside string literals
/// are ignored. An opener that never closes yields a span to the end of input.
fn balanced_spans(content: &str) -> Vec<(usize, &str)> {
    let bytes = content.as_bytes();
    let mut spans = Vec::new();
    let mut start = 0;

    while let Some(offset) = bytes[start..].iter().position(|b| *b == b'{' || *b == b'[') {
        let open = start + offset;
        match closing_index(bytes, open) {
            Closing::At(close) => spans.push((open, &content[open..=close])),
            Closing::Mismatched => {}
            Closing::Unterminated => {
                spans.push((open, &content[open..]));
                break;
            }
        }
        start = open + 1;
    }
    spans
}

enum Closing {
    At(usize),
    Mismatched,
    Unterminated,
}

fn closing_index(bytes: &[u8], open: usize) -> Closing {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (index, byte) in bytes.iter().enumerate().skip(open) {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' => stack.push(b'}'),
            b'[' => stack.push(b']'),
            b'}' | b']' => {
                if stack.pop() != Some(*byte) {
                    return Closing::Mismatched;
                }
                if stack.is_empty() {
                    return Closing::At(index);
                }
            }
            _ => {}
        }
    }
    Closing::Unterminated
}

/// Result of scanning model output for JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted<'a> {
    Parsed(Value),
    /// The first candidate substring, which failed to parse.
    Malformed { candidate: &'a str, error: String },
    NotFound,
}

/// Find the first balanced JSON value in `content`.
///
/// When the first candidate does not parse, values nested inside it are never
/// accepted; only candidates that start after it are tried. If none of those
/// parses either, the first candidate is handed back for repair.
pub fn extract_json(content: &str) -> Extracted<'_> {
    let spans = balanced_spans(content);
    let Some(&(first_start, first)) = spans.first() else {
        return Extracted::NotFound;
    };

    let error = match serde_json::from_str::<Value>(first) {
        Ok(value) => return Extracted::Parsed(value),
        Err(err) => err.to_string(),
    };

    let first_end = first_start + first.len();
    let later = spans
        .iter()
        .skip(1)
        .filter(|(start, _)| *start >= first_end)
        .find_map(|(_, span)| serde_json::from_str::<Value>(span).ok());

    match later {
        Some(value) => Extracted::Parsed(value),
        None => Extracted::Malformed {
            candidate: first,
            error,
        },
    }
}

/// Interpret a JSON value as a batch of tool calls. A lone object is a batch
/// of one.
pub fn parse_tool_calls(value: Value) -> Result<Vec<ToolCallRequest>, String> {
    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        other => return Err(format!("expected a JSON array or object, got {other}")),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            let Value::Object(mut map) = item else {
                return Err(format!("tool call #{position} is not a JSON object"));
            };
            let tool = match map.remove("tool") {
                Some(Value::String(name)) if !name.trim().is_empty() => name,
                _ => return Err(format!("tool call #{position} is missing the \"tool\" field")),
            };
            let tool_input = map.remove("tool_input").unwrap_or(Value::Null);
            Ok(ToolCallRequest { tool, tool_input })
        })
        .collect()
}
