//! Best-effort extraction of a structured payload from model output.
//!
//! Models asked for JSON answer with bare JSON, JSON in a fenced block, or
//! JSON buried in prose. [`extract_structured`] tries each shape in turn and
//! returns the first candidate that parses to an object or array.

use serde_json::Value;

type Strategy = fn(&str) -> Option<&str>;

const STRATEGIES: [(&str, Strategy); 4] = [
    ("whole_text", whole_text),
    ("json_fence", json_fence),
    ("any_fence", any_fence),
    ("balanced_span", balanced_span),
];

/// Returns the first object or array found in `text`, or `None`.
pub fn extract_structured(text: &str) -> Option<Value> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    STRATEGIES.iter().find_map(|(name, strategy)| {
        let candidate = strategy(text)?;
        let value = serde_json::from_str::<Value>(candidate.trim()).ok()?;
        if value.is_object() || value.is_array() {
            tracing::trace!(strategy = name, "Extracted structured payload");
            Some(value)
        } else {
            None
        }
    })
}

fn whole_text(text: &str) -> Option<&str> {
    Some(text)
}

fn json_fence(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let end = text[start..].find("```")?;
    Some(&text[start..start + end])
}

fn any_fence(text: &str) -> Option<&str> {
    let start = text.find("```")? + 3;
    // Skip a language tag on the opening line.
    let start = text[start..]
        .find('\n')
        .map(|i| start + i + 1)
        .unwrap_or(start);
    let end = text[start..].find("```")?;
    Some(&text[start..start + end])
}

/// Bracket scanning stops here; replies longer than this are not searched
/// past the limit.
const MAX_SCAN_BYTES: usize = 1024 * 1024;

/// First `{...}` or `[...]` span whose brackets balance and which parses,
/// ignoring brackets inside string literals.
///
/// One pass with a stack of open positions. Every close records the span it
/// ends, so spans nested inside a bracket that never closes are still found.
fn balanced_span(text: &str) -> Option<&str> {
    let bytes = &text.as_bytes()[..text.len().min(MAX_SCAN_BYTES)];
    let mut open = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            // Quotes in the prose around a payload are not strings.
            b'"' if !open.is_empty() => in_string = true,
            b'{' | b'[' => open.push(i),
            b'}' | b']' => {
                if let Some(start) = open.pop() {
                    spans.push((start, i));
                }
            }
            _ => {}
        }
    }

    spans.sort_unstable_by_key(|&(start, _)| start);
    spans
        .into_iter()
        .map(|(start, end)| &text[start..=end])
        .find(|candidate| serde_json::from_str::<Value>(candidate).is_ok())
}
