//! Progress events emitted during a harvest.
//!
//! The orchestrator publishes `HarvestEvent`s on a `tokio::sync::broadcast`
//! channel. The CLI renders them as a progress bar; with no subscriber the
//! events are dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// A progress event with its position in the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestEvent {
    /// Monotonically increasing sequence number.
    pub seq: u64,
    pub event: HarvestEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum HarvestEventKind {
    /// The listing size is known and the page selection applied.
    PagesDiscovered { page_count: u32, pages_selected: u32 },
    /// A listing page was read.
    PageListed { page: u32, subjects: u32 },
    /// A listing page could not be read; it contributes no subjects.
    PageFailed { page: u32, message: String },
    SubjectHarvested { code: String, constraints: u32 },
    SubjectFailed { code: String, href: String, message: String },
    HarvestComplete {
        subjects: u32,
        failed: u32,
        elapsed_ms: u64,
    },
}

pub type ProgressSender = tokio::sync::broadcast::Sender<HarvestEvent>;
pub type ProgressReceiver = tokio::sync::broadcast::Receiver<HarvestEvent>;

/// Create a progress channel. A lagging receiver loses the oldest events.
pub fn channel() -> (ProgressSender, ProgressReceiver) {
    tokio::sync::broadcast::channel(1024)
}

/// Shared emitter that stamps sequence numbers. Safe to use from concurrent
/// subject tasks.
#[derive(Debug, Default)]
pub struct Emitter {
    tx: Option<ProgressSender>,
    seq: AtomicU64,
}

impl Emitter {
    pub fn new(tx: Option<ProgressSender>) -> Self {
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Send an event, ignoring the error raised when nobody is listening.
    pub fn emit(&self, event: HarvestEventKind) {
        if let Some(sender) = &self.tx {
            let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
            let _ = sender.send(HarvestEvent { seq, event });
        }
    }
}
