//! Notification channel for live queue updates.
//!
//! The engine and directories publish [`QueueEvent`]s through the
//! [`EventPublisher`] trait; the production implementation fans them out to
//! connected viewers over a broadcast channel. Delivery is best-effort and
//! at-most-once: events are a cache-invalidation hint for observers, never a
//! source of truth.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::section::Section;

/// An event published to connected viewers.
///
/// Variant names match the wire event names emitted by the service
/// (`event` / `payload` envelope).
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "event", content = "payload")]
pub enum QueueEvent {
    #[serde(rename = "sectionAdded")]
    SectionAdded(Section),
    #[serde(rename = "section-deleted")]
    SectionDeleted(Uuid),
    #[serde(rename = "section-updated")]
    SectionUpdated(Section),
    #[serde(rename = "queue-updated")]
    QueueUpdated { section: String },
}

impl QueueEvent {
    pub fn queue_updated(section: impl Into<String>) -> Self {
        Self::QueueUpdated {
            section: section.into(),
        }
    }

    /// Wire name of the event, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::SectionAdded(_) => "sectionAdded",
            Self::SectionDeleted(_) => "section-deleted",
            Self::SectionUpdated(_) => "section-updated",
            Self::QueueUpdated { .. } => "queue-updated",
        }
    }
}

/// Fire-and-forget publish interface.
///
/// Injectable so the engine's correctness never depends on a particular
/// transport; tests substitute a [`RecordingPublisher`].
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: QueueEvent);
}

/// Broadcast-based fan-out hub for connected viewers.
///
/// Each WebSocket connection holds a receiver; a slow viewer that lags past
/// the buffer capacity loses the oldest events rather than blocking
/// publishers.
pub struct EventHub {
    tx: broadcast::Sender<QueueEvent>,
    published: AtomicU64,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            published: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.tx.subscribe()
    }

    /// Number of currently connected viewers
    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total events published since startup
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl EventPublisher for EventHub {
    fn publish(&self, event: QueueEvent) {
        self.published.fetch_add(1, Ordering::Relaxed);
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => {
                tracing::debug!(event = name, receivers, "Event published");
            }
            Err(_) => {
                tracing::debug!(event = name, "Event published with no viewers connected");
            }
        }
    }
}

/// Test stub that records every published event in order.
pub struct RecordingPublisher {
    events: Mutex<Vec<QueueEvent>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<QueueEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<QueueEvent> {
        std::mem::take(&mut self.events.lock().unwrap())
    }
}

impl Default for RecordingPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, event: QueueEvent) {
        self.events.lock().unwrap().push(event);
    }
}
