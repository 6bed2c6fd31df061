/*!
 * Prompt construction.
 *
 * Batch prompts embed a chunk as a JSON array of `{id, text}` records and ask
 * for an array of the same length back. Sentence prompts wrap one sentence
 * with its neighbours so the model can disambiguate terms.
 */

use serde::Serialize;

use crate::captions::{format_timestamp, CaptionItem};

/// Record shown to the model for each caption
#[derive(Debug, Serialize)]
struct PromptRecord<'a> {
    id: String,
    text: &'a str,
}

/// Builds prompts for one language pair
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    source_language: String,
    target_language: String,
}

impl PromptBuilder {
    /// Create a builder from human-readable language names (e.g. "English", "Korean")
    pub fn new(source_language: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_language: source_language.into(),
            target_language: target_language.into(),
        }
    }

    /// JSON array embedded in the batch prompt
    pub fn chunk_payload(items: &[CaptionItem]) -> String {
        let records: Vec<PromptRecord<'_>> = items
            .iter()
            .map(|c| PromptRecord {
                id: format_timestamp(c.start_in_seconds),
                text: &c.text,
            })
            .collect();

        serde_json::to_string_pretty(&records).unwrap_or_else(|_| "[]".to_string())
    }

    /// Prompt for translating one chunk
    pub fn batch_prompt(&self, items: &[CaptionItem]) -> String {
        let source = &self.source_language;
        let target = &self.target_language;

        format!(
            r#"You are a professional subtitle translator. Translate the {source} subtitles (JSON) below into {target} subtitles (JSON).
Follow these synchronization rules without exception:

1. One-to-one mapping: the output list must contain exactly as many entries as the input list ({count}). Never add, merge or drop entries.
2. Context-aware translation: read neighbouring entries together and produce natural {target} sentences rather than translating each entry in isolation.
3. Structure sync: a sentence that spans several entries in {source} must span the same entries in {target}.
4. Proportional split: when a sentence is split across entries, split the translation at the same proportion. Do not move all of the content into one entry.

Input format:
[
  {{"id": "00:00:02", "text": "Welcome to this course..."}},
  ...
]

Output format (JSON only):
[
  {{"id": "00:00:02", "text": "<{target} translation>"}},
  ...
]

Input:
```json
{payload}
```
"#,
            source = source,
            target = target,
            count = items.len(),
            payload = Self::chunk_payload(items),
        )
    }

    /// Prompt for translating one sentence with its surrounding context
    pub fn sentence_prompt(&self, current: &str, prev: &str, next: &str) -> String {
        format!(
            r#"Context:
"""
{prev}
"""

Target Sentence:
"""
{current}
"""

Future Context:
"""
{next}
"""

Instruction:
Translate the "Target Sentence" from {source} into natural {target}.
- Use the context to disambiguate terms.
- Output ONLY the {target} translation. Do not include quotes or explanations.
"#,
            prev = prev,
            current = current,
            next = next,
            source = self.source_language,
            target = self.target_language,
        )
    }
}
