/*!
 * Tests for chunk partitioning and wave dispatch
 */

use anyhow::anyhow;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use capwai::captions::ChunkResult;
use capwai::translation::scheduler::partition;
use capwai::translation::{ChunkScheduler, ModeConfig, SpeedMode};
use crate::common;

fn echo_chunk(chunk: capwai::Chunk) -> ChunkResult {
    ChunkResult::translated(
        chunk.origin_index,
        chunk.items.iter().map(|c| c.with_text(format!("T:{}", c.text))).collect(),
    )
}

#[test]
fn test_partition_with120Items_shouldMakeThreeChunks() {
    let chunks = partition(&common::sample_captions(120), 50);

    let sizes: Vec<usize> = chunks.iter().map(|c| c.items.len()).collect();
    let origins: Vec<usize> = chunks.iter().map(|c| c.origin_index).collect();
    assert_eq!(sizes, vec![50, 50, 20]);
    assert_eq!(origins, vec![0, 50, 100]);
}

#[tokio::test(start_paused = true)]
async fn test_run_stableMode_shouldPauseBetweenChunks() {
    let items = common::sample_captions(120);
    let scheduler = ChunkScheduler::new(ModeConfig::for_mode(SpeedMode::Stable));
    let calls = AtomicUsize::new(0);
    let progress = Mutex::new(Vec::new());

    let start = Instant::now();
    let report = scheduler
        .run(
            &items,
            |chunk| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move { Ok(echo_chunk(chunk)) }
            },
            |percent| progress.lock().push(percent),
        )
        .await;

    // Three chunks, two one-second pauses between them
    assert!(start.elapsed() >= Duration::from_secs(2));
    assert!(start.elapsed() < Duration::from_secs(3));
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(*progress.lock(), vec![0, 33, 67]);
    assert!(report.is_complete());
    assert_eq!(report.items.len(), 120);
    assert!(report.items.iter().zip(&items).all(|(t, s)| t.text == format!("T:{}", s.text)));
}

#[tokio::test(start_paused = true)]
async fn test_run_fastMode_shouldBoundInFlightChunks() {
    let items = common::sample_captions(12 * 50);
    let scheduler = ChunkScheduler::new(ModeConfig::for_mode(SpeedMode::Fast));
    let in_flight = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let report = scheduler
        .run(
            &items,
            |chunk| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok(echo_chunk(chunk))
                }
            },
            |_| {},
        )
        .await;

    assert_eq!(peak.load(Ordering::SeqCst), 5);
    assert_eq!(report.total_chunks, 12);
    assert!(report.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_run_withSlowFirstChunk_shouldStillMergeInOrder() {
    let items = common::sample_captions(30);
    let scheduler = ChunkScheduler::new(ModeConfig::custom(10, 3, 0));

    let report = scheduler
        .run(
            &items,
            |chunk| async move {
                let delay = if chunk.origin_index == 0 { 500 } else { 10 };
                tokio::time::sleep(Duration::from_millis(delay)).await;
                Ok(echo_chunk(chunk))
            },
            |_| {},
        )
        .await;

    let starts: Vec<f64> = report.items.iter().map(|c| c.start_in_seconds).collect();
    let expected: Vec<f64> = items.iter().map(|c| c.start_in_seconds).collect();
    assert_eq!(starts, expected);
}

#[tokio::test(start_paused = true)]
async fn test_run_withFailingMiddleChunk_shouldKeepOriginalsThere() {
    let items = common::sample_captions(9);
    let scheduler = ChunkScheduler::new(ModeConfig::custom(3, 1, 0));

    let report = scheduler
        .run(
            &items,
            |chunk| async move {
                if chunk.origin_index == 3 {
                    Err(anyhow!("backend unavailable"))
                } else {
                    Ok(echo_chunk(chunk))
                }
            },
            |_| {},
        )
        .await;

    assert_eq!(report.failed_chunks, vec![3]);
    assert!(!report.is_complete());
    assert_eq!(report.items[2].text, format!("T:{}", items[2].text));
    assert_eq!(report.items[3..6], items[3..6]);
    assert_eq!(report.items[6].text, format!("T:{}", items[6].text));
}
