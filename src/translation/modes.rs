/*!
 * Operating modes for batch dispatch.
 *
 * A mode fixes how many captions go into one request, how many requests run
 * at once, and how long to pause between waves of requests.
 */

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Captions per backend request in every built-in mode
pub const DEFAULT_CHUNK_SIZE: usize = 50;

/// Speed mode selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpeedMode {
    /// Parallel dispatch with a short pause
    Fast,
    /// One request at a time with a longer pause
    #[default]
    Stable,
}

impl SpeedMode {
    /// Label used in status messages
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Fast => "Fast",
            Self::Stable => "Stable",
        }
    }
}

impl std::fmt::Display for SpeedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Stable => write!(f, "stable"),
        }
    }
}

impl std::str::FromStr for SpeedMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "stable" => Ok(Self::Stable),
            _ => Err(anyhow::anyhow!("Invalid speed mode: {}", s)),
        }
    }
}

/// Dispatch settings for one batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeConfig {
    /// Captions per chunk
    pub chunk_size: usize,
    /// Chunks dispatched concurrently in one wave
    pub concurrency: usize,
    /// Pause between waves in milliseconds
    pub inter_batch_delay_ms: u64,
    /// Mode this configuration came from
    pub mode: SpeedMode,
}

impl ModeConfig {
    /// Built-in settings for a mode
    pub fn for_mode(mode: SpeedMode) -> Self {
        match mode {
            SpeedMode::Fast => Self {
                chunk_size: DEFAULT_CHUNK_SIZE,
                concurrency: 5,
                inter_batch_delay_ms: 200,
                mode,
            },
            SpeedMode::Stable => Self {
                chunk_size: DEFAULT_CHUNK_SIZE,
                concurrency: 1,
                inter_batch_delay_ms: 1000,
                mode,
            },
        }
    }

    /// Fully custom settings
    pub fn custom(chunk_size: usize, concurrency: usize, inter_batch_delay_ms: u64) -> Self {
        Self {
            chunk_size,
            concurrency,
            inter_batch_delay_ms,
            mode: if concurrency > 1 { SpeedMode::Fast } else { SpeedMode::Stable },
        }
    }

    /// Override the chunk size
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Chunk size, never below one
    pub fn effective_chunk_size(&self) -> usize {
        self.chunk_size.max(1)
    }

    /// Wave width, never below one
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Pause between waves
    pub fn inter_batch_delay(&self) -> Duration {
        Duration::from_millis(self.inter_batch_delay_ms)
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self::for_mode(SpeedMode::default())
    }
}
