/*!
 * Chunked, wave-based dispatch of a caption list.
 *
 * The list is cut into fixed-size chunks. Chunks are sent in waves of at most
 * `concurrency` concurrent requests; the next wave starts only after the whole
 * previous wave has finished, with a pause in between. Results are merged by
 * sorting on each chunk's origin index, never by completion order.
 */

use anyhow::Result;
use futures::future::join_all;
use log::{debug, error, warn};
use std::future::Future;
use std::time::Instant;

use crate::captions::{CaptionItem, Chunk, ChunkResult};

use super::modes::ModeConfig;

/// Outcome of a scheduler run
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleReport {
    /// Merged items in original order
    pub items: Vec<CaptionItem>,
    /// Number of chunks dispatched
    pub total_chunks: usize,
    /// Origin indices of chunks that fell back to their original text
    pub failed_chunks: Vec<usize>,
    /// Origin indices of chunks where only some items were translated
    pub degraded_chunks: Vec<usize>,
}

impl ScheduleReport {
    /// Whether every item of every chunk was translated
    pub fn is_complete(&self) -> bool {
        self.failed_chunks.is_empty() && self.degraded_chunks.is_empty()
    }

    /// Take the merged items
    pub fn into_items(self) -> Vec<CaptionItem> {
        self.items
    }
}

/// Split a caption list into consecutive chunks of `chunk_size`
pub fn partition(items: &[CaptionItem], chunk_size: usize) -> Vec<Chunk> {
    let chunk_size = chunk_size.max(1);
    items
        .chunks(chunk_size)
        .enumerate()
        .map(|(i, slice)| Chunk {
            origin_index: i * chunk_size,
            items: slice.to_vec(),
        })
        .collect()
}

/// Percentage of completed chunks, rounded to the nearest integer
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}

/// Force a chunk result to the chunk's length, filling gaps from the originals
fn repair(chunk: &Chunk, mut result: ChunkResult) -> ChunkResult {
    let expected = chunk.items.len();
    let actual = result.items.len();
    if actual != expected {
        warn!(
            "Chunk at {} returned {} items for {}; repairing by position",
            chunk.origin_index, actual, expected
        );
        result.items.truncate(expected);
        result.items.extend(chunk.items[result.items.len()..].iter().cloned());
        result.degraded |= actual < expected;
    }
    result.origin_index = chunk.origin_index;
    result
}

/// Dispatches chunks with bounded concurrency and merges them in order
#[derive(Debug, Clone)]
pub struct ChunkScheduler {
    config: ModeConfig,
}

impl ChunkScheduler {
    /// Create a scheduler for one mode configuration
    pub fn new(config: ModeConfig) -> Self {
        Self { config }
    }

    /// Translate `items` chunk by chunk.
    ///
    /// `translate_chunk` is called once per chunk. A chunk whose call fails keeps
    /// its original items and the run continues. `on_progress` receives the
    /// completed percentage before each wave.
    pub async fn run<F, Fut, P>(&self, items: &[CaptionItem], translate_chunk: F, on_progress: P) -> ScheduleReport
    where
        F: Fn(Chunk) -> Fut,
        Fut: Future<Output = Result<ChunkResult>>,
        P: Fn(u8),
    {
        let chunks = partition(items, self.config.effective_chunk_size());
        let total_chunks = chunks.len();
        let wave_size = self.config.effective_concurrency();
        let delay = self.config.inter_batch_delay();

        debug!(
            "Scheduling {} captions as {} chunks (size {}, concurrency {}, delay {:?})",
            items.len(),
            total_chunks,
            self.config.effective_chunk_size(),
            wave_size,
            delay
        );

        let mut results: Vec<ChunkResult> = Vec::with_capacity(total_chunks);
        let mut failed_chunks = Vec::new();
        let mut degraded_chunks = Vec::new();
        let mut completed = 0;

        let waves: Vec<&[Chunk]> = chunks.chunks(wave_size).collect();
        let wave_count = waves.len();

        for (wave_index, wave) in waves.into_iter().enumerate() {
            on_progress(progress_percent(completed, total_chunks));

            let start_time = Instant::now();
            let outcomes = join_all(wave.iter().map(|chunk| {
                let call = translate_chunk(chunk.clone());
                async move { (chunk, call.await) }
            }))
            .await;

            for (chunk, outcome) in outcomes {
                match outcome {
                    Ok(result) => {
                        let result = repair(chunk, result);
                        if result.degraded {
                            warn!("Chunk at {} was only partly translated", chunk.origin_index);
                            degraded_chunks.push(chunk.origin_index);
                        }
                        results.push(result);
                    }
                    Err(e) => {
                        error!("Chunk at {} failed, keeping original text: {}", chunk.origin_index, e);
                        failed_chunks.push(chunk.origin_index);
                        results.push(ChunkResult::untranslated(chunk));
                    }
                }
            }

            completed += wave.len();
            debug!(
                "Wave {}/{} finished in {:?}",
                wave_index + 1,
                wave_count,
                start_time.elapsed()
            );

            if wave_index + 1 < wave_count && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        results.sort_by_key(|r| r.origin_index);
        failed_chunks.sort_unstable();
        degraded_chunks.sort_unstable();

        ScheduleReport {
            items: results.into_iter().flat_map(|r| r.items).collect(),
            total_chunks,
            failed_chunks,
            degraded_chunks,
        }
    }
}
