/*!
 * Tolerant parsing of model responses.
 *
 * Models are asked for a JSON array of `{id, text}` records but may wrap it
 * in a markdown fence, surround it with prose, or return the wrong number of
 * records. Recovery runs as a fixed sequence of small stages:
 *
 * 1. `strip_code_fence` - keep the interior of a ``` block if there is one
 * 2. `slice_array_span` - keep the text between the first `[` and last `]`
 * 3. `parse_records` - decode the array; any failure yields no records
 * 4. `align_positional` - map records onto the original items by index
 *
 * Alignment is purely positional. Echoed `id` values are never consulted.
 */

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::captions::CaptionItem;

/// Fence explicitly tagged as JSON
static JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)```json\s*([\s\S]*?)\s*```").expect("valid regex"));

/// Any fence, with or without a language tag
static ANY_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```(?:[A-Za-z0-9_+-]+)?\s*([\s\S]*?)\s*```").expect("valid regex"));

/// Text-narrowing stages, applied in order
const TEXT_STAGES: &[(&str, fn(&str) -> &str)] = &[
    ("strip_code_fence", strip_code_fence),
    ("slice_array_span", slice_array_span),
];

/// One record decoded from the model's array
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseRecord {
    /// Identifier echoed by the model, kept for diagnostics only
    pub id: Option<String>,
    /// Translated text, if the record carried a string `text`
    pub text: Option<String>,
}

/// Outcome of parsing one response against its chunk
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// One item per original item, timestamps untouched
    pub items: Vec<CaptionItem>,
    /// Positions whose text came from the model
    pub matched: usize,
    /// Records the model returned
    pub record_count: usize,
}

impl ParsedResponse {
    /// Whether every position fell back to the original text
    pub fn is_total_fallback(&self) -> bool {
        self.matched == 0
    }
}

/// Keep the interior of the first fenced block, or the whole text if none
pub fn strip_code_fence(raw: &str) -> &str {
    JSON_FENCE
        .captures(raw)
        .or_else(|| ANY_FENCE.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
}

/// Keep the span from the first `[` to the last `]`, or the whole text if there is none
pub fn slice_array_span(text: &str) -> &str {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => text,
    }
}

/// Decode an array of records; anything else produces an empty list
pub fn parse_records(text: &str) -> Vec<ResponseRecord> {
    let value = match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(e) => {
            warn!("JSON parse error in model response: {}", e);
            return Vec::new();
        }
    };

    let Value::Array(elements) = value else {
        warn!("Model response is JSON but not an array");
        return Vec::new();
    };

    elements
        .iter()
        .map(|element| ResponseRecord {
            id: element.get("id").map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            text: element.get("text").and_then(Value::as_str).map(str::to_string),
        })
        .collect()
}

/// Map records onto the original items by index
pub fn align_positional(records: &[ResponseRecord], original: &[CaptionItem]) -> ParsedResponse {
    let mut matched = 0;

    let items = original
        .iter()
        .enumerate()
        .map(|(idx, item)| match records.get(idx).and_then(|r| r.text.as_deref()) {
            Some(text) if !text.is_empty() => {
                matched += 1;
                item.with_text(text)
            }
            _ => item.clone(),
        })
        .collect();

    if records.len() != original.len() {
        debug!(
            "Model returned {} records for {} captions; aligned by position",
            records.len(),
            original.len()
        );
    }

    ParsedResponse {
        items,
        matched,
        record_count: records.len(),
    }
}

/// Run the full recovery pipeline and report how much of it matched
pub fn parse_detailed(raw: &str, original: &[CaptionItem]) -> ParsedResponse {
    let mut text = raw;
    for (name, stage) in TEXT_STAGES {
        let next = stage(text);
        if next.len() != text.len() {
            debug!("Recovery stage {} narrowed response to {} bytes", name, next.len());
        }
        text = next;
    }

    let records = parse_records(text);
    align_positional(&records, original)
}

/// Parse a raw model response into translated items, one per original item
pub fn parse(raw: &str, original: &[CaptionItem]) -> Vec<CaptionItem> {
    parse_detailed(raw, original).items
}
