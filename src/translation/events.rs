/*!
 * Status, progress and completion events.
 *
 * The pipeline reports to an observer through `EventSink` and knows nothing
 * about how events are displayed.
 */

use log::{error, info};
use parking_lot::Mutex;
use serde::Serialize;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

use crate::captions::CaptionItem;

/// Event emitted by the translation pipeline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload")]
pub enum TranslationEvent {
    /// Human-readable status line
    #[serde(rename = "status-update")]
    Status(String),
    /// Percentage of chunks completed before the current wave
    #[serde(rename = "progress")]
    Progress(u8),
    /// Full translated caption list
    #[serde(rename = "complete")]
    Complete(Vec<CaptionItem>),
    /// Run-terminating or per-sentence error
    #[serde(rename = "error")]
    Error(String),
    /// Translation of a single sentence
    #[serde(rename = "subtitle")]
    Subtitle(String),
}

impl TranslationEvent {
    /// Short name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Status(_) => "status-update",
            Self::Progress(_) => "progress",
            Self::Complete(_) => "complete",
            Self::Error(_) => "error",
            Self::Subtitle(_) => "subtitle",
        }
    }
}

/// Receiver of pipeline events
pub trait EventSink: Send + Sync {
    /// Deliver one event
    fn emit(&self, event: TranslationEvent);
}

impl<F> EventSink for F
where
    F: Fn(TranslationEvent) + Send + Sync,
{
    fn emit(&self, event: TranslationEvent) {
        self(event)
    }
}

/// Drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: TranslationEvent) {}
}

/// Writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: TranslationEvent) {
        match event {
            TranslationEvent::Status(status) => info!("{}", status),
            TranslationEvent::Progress(percent) => info!("Progress: {}%", percent),
            TranslationEvent::Complete(items) => info!("Translation complete: {} captions", items.len()),
            TranslationEvent::Error(message) => error!("{}", message),
            TranslationEvent::Subtitle(text) => info!("{}", text),
        }
    }
}

/// Forwards events into a tokio channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: UnboundedSender<TranslationEvent>,
}

impl ChannelSink {
    /// Wrap a channel sender
    pub fn new(sender: UnboundedSender<TranslationEvent>) -> Self {
        Self { sender }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: TranslationEvent) {
        // A closed receiver means nobody is listening any more
        let _ = self.sender.send(event);
    }
}

/// Prints each event as one JSON object per line on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonLinesSink;

impl EventSink for JsonLinesSink {
    fn emit(&self, event: TranslationEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => {
                let mut stdout = std::io::stdout().lock();
                let _ = writeln!(stdout, "{}", line);
            }
            Err(e) => error!("Failed to encode {} event: {}", event.kind(), e),
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<TranslationEvent>>>,
}

impl RecordingSink {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything received so far
    pub fn events(&self) -> Vec<TranslationEvent> {
        self.events.lock().clone()
    }

    /// Status lines received so far
    pub fn statuses(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TranslationEvent::Status(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Progress percentages received so far
    pub fn progress(&self) -> Vec<u8> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                TranslationEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: TranslationEvent) {
        self.events.lock().push(event);
    }
}
