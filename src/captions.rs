/*!
 * Caption data model.
 *
 * Captions arrive as an ordered JSON array of `{startInSeconds, endInSeconds, text}`
 * records. Order is temporal and is preserved by every stage of the pipeline;
 * translation only ever replaces `text`.
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ParseError;

/// Default duration given to an imported caption that has no end time
const DEFAULT_IMPORT_DURATION_SECS: f64 = 5.0;

/// A single timed caption line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionItem {
    /// Start time in seconds
    pub start_in_seconds: f64,

    /// End time in seconds
    pub end_in_seconds: f64,

    /// Caption text
    pub text: String,
}

impl CaptionItem {
    /// Create a new caption item
    pub fn new(start_in_seconds: f64, end_in_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_in_seconds,
            end_in_seconds,
            text: text.into(),
        }
    }

    /// Copy of this item with the text replaced
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        Self {
            start_in_seconds: self.start_in_seconds,
            end_in_seconds: self.end_in_seconds,
            text: text.into(),
        }
    }
}

/// A contiguous slice of the caption list sent to the backend as one request
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Offset of the first item in the full sequence
    pub origin_index: usize,

    /// Items of this chunk, in order
    pub items: Vec<CaptionItem>,
}

/// Translated counterpart of a [`Chunk`]
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkResult {
    /// Offset of the first item in the full sequence
    pub origin_index: usize,

    /// Translated items, one per chunk item
    pub items: Vec<CaptionItem>,

    /// Some items kept their original text
    pub degraded: bool,
}

impl ChunkResult {
    /// Result where every item was translated
    pub fn translated(origin_index: usize, items: Vec<CaptionItem>) -> Self {
        Self {
            origin_index,
            items,
            degraded: false,
        }
    }

    /// Result that keeps the chunk's original text
    pub fn untranslated(chunk: &Chunk) -> Self {
        Self {
            origin_index: chunk.origin_index,
            items: chunk.items.clone(),
            degraded: true,
        }
    }
}

/// Format seconds as `HH:MM:SS`, the identifier shown to the model
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 { seconds.floor() as u64 } else { 0 };
    let hours = (total / 3600) % 24;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, secs)
}

/// Parse `HH:MM:SS` or `MM:SS` back into seconds
pub fn parse_timestamp(value: &str) -> Option<f64> {
    let parts: Vec<f64> = value
        .trim()
        .split(':')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match parts.as_slice() {
        [h, m, s] => Some(h * 3600.0 + m * 60.0 + s),
        [m, s] => Some(m * 60.0 + s),
        _ => None,
    }
}

/// Decode a caption list from its JSON wire form
pub fn captions_from_json(json: &str) -> Result<Vec<CaptionItem>, ParseError> {
    serde_json::from_str(json).map_err(|e| ParseError::Malformed(e.to_string()))
}

/// Encode a caption list as pretty-printed JSON
pub fn captions_to_json(items: &[CaptionItem]) -> Result<String, ParseError> {
    serde_json::to_string_pretty(items).map_err(|e| ParseError::Malformed(e.to_string()))
}

/// Render captions as a plain-text transcript, one `[HH:MM:SS] text` line each
pub fn format_transcript(items: &[CaptionItem]) -> String {
    items
        .iter()
        .map(|c| format!("[{}] {}", format_timestamp(c.start_in_seconds), c.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Normalize a translated caption list produced outside the pipeline.
///
/// Records may carry `startInSeconds` or an `id` timestamp instead. Records
/// without a start or a non-empty text are dropped. A missing end time becomes
/// the next record's start, or start plus five seconds for the last record.
pub fn import_translation(json: &str) -> Result<Vec<CaptionItem>, ParseError> {
    let value: Value = serde_json::from_str(json).map_err(|e| ParseError::Malformed(e.to_string()))?;

    let records = match value {
        Value::Array(records) if !records.is_empty() => records,
        _ => return Err(ParseError::InvalidFormat("expected a non-empty array".to_string())),
    };

    let valid: Vec<(f64, Option<f64>, String)> = records
        .iter()
        .filter_map(|record| {
            let start = record
                .get("startInSeconds")
                .and_then(Value::as_f64)
                .or_else(|| record.get("id").and_then(Value::as_str).and_then(parse_timestamp))?;
            let text = record.get("text").and_then(Value::as_str)?;
            if text.is_empty() {
                return None;
            }
            let end = record.get("endInSeconds").and_then(Value::as_f64);
            Some((start, end, text.to_string()))
        })
        .collect();

    if valid.is_empty() {
        return Err(ParseError::InvalidFormat("timestamps/text missing".to_string()));
    }

    let items = valid
        .iter()
        .enumerate()
        .map(|(i, (start, end, text))| {
            let end = end.unwrap_or_else(|| match valid.get(i + 1) {
                Some((next_start, _, _)) => *next_start,
                None => start + DEFAULT_IMPORT_DURATION_SECS,
            });
            CaptionItem::new(*start, end, text.clone())
        })
        .collect();

    Ok(items)
}
