/*!
 * Caption translation pipeline.
 *
 * Batch path: `fingerprint` → `cache` → `scheduler` → `parser` → `cache`,
 * driven by `orchestrator`. Live path: `incremental`. Submodules:
 *
 * - `fingerprint`: content hash of a caption list
 * - `cache`: persistent result cache and in-memory sentence cache
 * - `modes`: speed modes and dispatch settings
 * - `scheduler`: chunked, wave-based dispatch with ordered merge
 * - `parser`: tolerant recovery of translations from model output
 * - `prompts`: prompt builders
 * - `events`: events and sinks for observers
 * - `orchestrator`: full batch runs
 * - `incremental`: context-aware single-sentence translation
 */

// Re-export main types for easier usage
pub use self::cache::{KeyValueStore, MemoryStore, ResultCache, SentenceCache};
pub use self::events::{EventSink, TranslationEvent};
pub use self::fingerprint::{fingerprint, Fingerprint};
pub use self::incremental::IncrementalTranslator;
pub use self::modes::{ModeConfig, SpeedMode};
pub use self::orchestrator::BatchOrchestrator;
pub use self::prompts::PromptBuilder;
pub use self::scheduler::{ChunkScheduler, ScheduleReport};

// Submodules
pub mod cache;
pub mod events;
pub mod fingerprint;
pub mod incremental;
pub mod modes;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod scheduler;
