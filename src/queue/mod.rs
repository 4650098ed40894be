//! Queue engine: per-section ordered queues and service advancement.
//!
//! This is the part of the service with real invariants: within a section,
//! positions are a dense 1..N sequence, and at most one entry is currently
//! being served. The engine serializes every position-mutating operation on
//! a section through a per-section mutex, so count-then-create,
//! delete-then-renumber and clear-then-promote cannot interleave.

use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppError;
use crate::events::{EventPublisher, QueueEvent};
use crate::store::{RecordStore, StoreError};

/// One customer's placement within a section's queue.
///
/// `section` is the section *name*, not its id; section renames cascade to
/// these records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub id: Uuid,
    pub membership_number: String,
    pub section: String,
    /// 1-based rank within the section, dense and unique
    pub position: u32,
    pub is_currently_serving: bool,
}

impl QueueEntry {
    pub fn new(
        membership_number: impl Into<String>,
        section: impl Into<String>,
        position: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            membership_number: membership_number.into(),
            section: section.into(),
            position,
            is_currently_serving: false,
        }
    }
}

/// Result of advancing service in a section.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOutcome {
    /// The entry whose service just finished
    pub previous_serving_entry: QueueEntry,
    /// The entry now being served, if the queue was not exhausted
    pub next_serving_entry: Option<QueueEntry>,
}

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue entry {0} not found")]
    EntryNotFound(Uuid),

    #[error("no customer is currently being served in section '{0}'")]
    NoneServing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<QueueError> for AppError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::EntryNotFound(_) => AppError::NotFound(err.to_string()),
            QueueError::NoneServing(_) => AppError::Conflict(err.to_string()),
            QueueError::Store(e) => AppError::Store(e),
        }
    }
}

/// The queue engine.
///
/// Holds no queue state of its own; entries live in the record store. The
/// engine owns the per-section locks and publishes a `queue-updated` event
/// after every successful mutation.
pub struct QueueEngine {
    store: Arc<dyn RecordStore>,
    events: Arc<dyn EventPublisher>,
    section_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl QueueEngine {
    pub fn new(store: Arc<dyn RecordStore>, events: Arc<dyn EventPublisher>) -> Self {
        Self {
            store,
            events,
            section_locks: DashMap::new(),
        }
    }

    fn section_lock(&self, section: &str) -> Arc<Mutex<()>> {
        self.section_locks
            .entry(section.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Append a customer to the end of a section's queue.
    ///
    /// Position assignment (count + 1) runs under the section lock, so two
    /// concurrent enqueues cannot compute the same position.
    pub async fn enqueue(
        &self,
        membership_number: &str,
        section: &str,
    ) -> Result<QueueEntry, QueueError> {
        let lock = self.section_lock(section);
        let _guard = lock.lock().await;

        let position = self.store.count_entries(section).await? + 1;
        let entry = QueueEntry::new(membership_number, section, position);
        self.store.insert_entry(&entry).await?;

        tracing::info!(
            entry_id = %entry.id,
            membership_number = %membership_number,
            section = %section,
            position,
            "Customer joined queue"
        );
        self.events.publish(QueueEvent::queue_updated(section));
        Ok(entry)
    }

    /// Remove an entry and renumber the remaining entries back to a dense
    /// 1..N sequence.
    pub async fn remove_entry(&self, id: Uuid) -> Result<(), QueueError> {
        // The section name comes from the record itself, and a rename can
        // move the entry between the lookup and the lock acquisition. Chase
        // the entry until the lock held matches its current section, so the
        // delete-and-renumber always runs under the lock of the section
        // actually mutated.
        let (entry, _guard) = loop {
            let found = self
                .store
                .get_entry(id)
                .await?
                .ok_or(QueueError::EntryNotFound(id))?;
            let guard = self.section_lock(&found.section).lock_owned().await;
            let current = self
                .store
                .get_entry(id)
                .await?
                .ok_or(QueueError::EntryNotFound(id))?;
            if current.section == found.section {
                break (current, guard);
            }
        };
        self.store.delete_entry(id).await?;

        // O(N) writes per removal; sections are human-scale
        let remaining = self.store.entries_in_section(&entry.section).await?;
        for (index, e) in remaining.iter().enumerate() {
            let expected = index as u32 + 1;
            if e.position != expected {
                self.store.set_entry_position(e.id, expected).await?;
            }
        }

        tracing::info!(
            entry_id = %id,
            section = %entry.section,
            remaining = remaining.len(),
            "Queue entry removed and positions renumbered"
        );
        self.events
            .publish(QueueEvent::queue_updated(&entry.section));
        Ok(())
    }

    /// Finish serving the current customer and promote the next one.
    ///
    /// The next customer is the one with the lowest position strictly greater
    /// than the finished entry's, so a gap never strands the section. An
    /// exhausted queue leaves nobody serving; that is not an error.
    pub async fn advance_service(&self, section: &str) -> Result<AdvanceOutcome, QueueError> {
        let lock = self.section_lock(section);
        let _guard = lock.lock().await;

        let mut current = self
            .store
            .find_serving_entry(section)
            .await?
            .ok_or_else(|| QueueError::NoneServing(section.to_string()))?;
        self.store.set_entry_serving(current.id, false).await?;
        current.is_currently_serving = false;

        let mut next = self
            .store
            .entries_in_section(section)
            .await?
            .into_iter()
            .find(|e| e.position > current.position);
        if let Some(ref mut n) = next {
            self.store.set_entry_serving(n.id, true).await?;
            n.is_currently_serving = true;
        }

        tracing::info!(
            section = %section,
            finished = %current.id,
            next = ?next.as_ref().map(|n| n.id),
            "Service advanced"
        );
        self.events.publish(QueueEvent::queue_updated(section));
        Ok(AdvanceOutcome {
            previous_serving_entry: current,
            next_serving_entry: next,
        })
    }

    /// All entries for a section, ordered by position ascending.
    /// Read-only; no lock, no events.
    pub async fn list_queue(&self, section: &str) -> Result<Vec<QueueEntry>, QueueError> {
        Ok(self.store.entries_in_section(section).await?)
    }

    /// Cascade helper for section deletion: drop every entry in the section.
    pub async fn remove_section_entries(&self, section: &str) -> Result<u64, QueueError> {
        let lock = self.section_lock(section);
        let _guard = lock.lock().await;

        let removed = self.store.delete_entries_in_section(section).await?;
        tracing::info!(section = %section, removed, "Section queue entries removed");
        Ok(removed)
    }

    /// Cascade helper for section renames: move every entry to the new name,
    /// preserving positions. Both names are locked, in sorted order, so a
    /// concurrent enqueue under either name cannot interleave.
    pub async fn rename_section_entries(
        &self,
        old_name: &str,
        new_name: &str,
    ) -> Result<u64, QueueError> {
        let (first, second) = if old_name <= new_name {
            (old_name, new_name)
        } else {
            (new_name, old_name)
        };
        let first_lock = self.section_lock(first);
        let second_lock = self.section_lock(second);
        let _first_guard = first_lock.lock().await;
        let _second_guard = if first == second {
            None
        } else {
            Some(second_lock.lock().await)
        };

        let updated = self
            .store
            .rename_entries_section(old_name, new_name)
            .await?;
        tracing::info!(
            old_name = %old_name,
            new_name = %new_name,
            updated,
            "Section queue entries moved to renamed section"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingPublisher;
    use crate::store::MemoryStore;

    struct TestEngine {
        engine: QueueEngine,
        store: Arc<MemoryStore>,
        publisher: Arc<RecordingPublisher>,
    }

    fn create_engine() -> TestEngine {
        let store = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let engine = QueueEngine::new(store.clone(), publisher.clone());
        TestEngine {
            engine,
            store,
            publisher,
        }
    }

    fn positions(entries: &[QueueEntry]) -> Vec<u32> {
        entries.iter().map(|e| e.position).collect()
    }

    #[tokio::test]
    async fn test_enqueue_assigns_dense_positions() {
        let t = create_engine();
        for i in 0..4 {
            let entry = t.engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap();
            assert_eq!(entry.position, i + 1);
            assert!(!entry.is_currently_serving);
        }
        let queue = t.engine.list_queue("Lab").await.unwrap();
        assert_eq!(positions(&queue), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_enqueue_publishes_queue_updated() {
        let t = create_engine();
        t.engine.enqueue("M-1", "Lab").await.unwrap();
        assert_eq!(
            t.publisher.take(),
            vec![QueueEvent::queue_updated("Lab")]
        );
    }

    #[tokio::test]
    async fn test_sections_are_independent() {
        let t = create_engine();
        t.engine.enqueue("M-1", "Lab").await.unwrap();
        t.engine.enqueue("M-2", "Radiology").await.unwrap();
        let entry = t.engine.enqueue("M-3", "Lab").await.unwrap();
        assert_eq!(entry.position, 2);
        assert_eq!(
            t.engine.list_queue("Radiology").await.unwrap()[0].position,
            1
        );
    }

    #[tokio::test]
    async fn test_removal_renumbers_remaining() {
        let t = create_engine();
        let e1 = t.engine.enqueue("M-1", "X").await.unwrap();
        let e2 = t.engine.enqueue("M-2", "X").await.unwrap();
        let e3 = t.engine.enqueue("M-3", "X").await.unwrap();

        t.engine.remove_entry(e2.id).await.unwrap();

        let queue = t.engine.list_queue("X").await.unwrap();
        assert_eq!(queue.len(), 2);
        assert_eq!(queue[0].id, e1.id);
        assert_eq!(queue[0].position, 1);
        assert_eq!(queue[1].id, e3.id);
        assert_eq!(queue[1].position, 2);
    }

    #[tokio::test]
    async fn test_remove_unknown_entry_is_not_found() {
        let t = create_engine();
        let err = t.engine.remove_entry(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, QueueError::EntryNotFound(_)));
    }

    #[tokio::test]
    async fn test_positions_stay_dense_after_mixed_operations() {
        let t = create_engine();
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(t.engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap().id);
        }
        // Remove from the front, the middle and the back
        t.engine.remove_entry(ids[0]).await.unwrap();
        t.engine.remove_entry(ids[3]).await.unwrap();
        t.engine.remove_entry(ids[5]).await.unwrap();
        t.engine.enqueue("M-6", "Lab").await.unwrap();

        let queue = t.engine.list_queue("Lab").await.unwrap();
        let expected: Vec<u32> = (1..=queue.len() as u32).collect();
        assert_eq!(positions(&queue), expected);
    }

    #[tokio::test]
    async fn test_advancement_walks_queue_in_position_order() {
        let t = create_engine();
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(t.engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap().id);
        }
        t.store.set_entry_serving(ids[0], true).await.unwrap();

        let outcome = t.engine.advance_service("Lab").await.unwrap();
        assert_eq!(outcome.previous_serving_entry.id, ids[0]);
        assert_eq!(outcome.next_serving_entry.as_ref().unwrap().id, ids[1]);

        let outcome = t.engine.advance_service("Lab").await.unwrap();
        assert_eq!(outcome.previous_serving_entry.id, ids[1]);
        assert_eq!(outcome.next_serving_entry.as_ref().unwrap().id, ids[2]);

        let outcome = t.engine.advance_service("Lab").await.unwrap();
        assert_eq!(outcome.previous_serving_entry.id, ids[2]);
        assert!(outcome.next_serving_entry.is_none());

        // Queue exhausted: nobody serving, further advances conflict
        let err = t.engine.advance_service("Lab").await.unwrap_err();
        assert!(matches!(err, QueueError::NoneServing(_)));
    }

    #[tokio::test]
    async fn test_at_most_one_serving_after_each_advance() {
        let t = create_engine();
        let mut ids = Vec::new();
        for i in 0..4 {
            ids.push(t.engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap().id);
        }
        t.store.set_entry_serving(ids[0], true).await.unwrap();

        for _ in 0..3 {
            t.engine.advance_service("Lab").await.unwrap();
            let serving: Vec<_> = t
                .engine
                .list_queue("Lab")
                .await
                .unwrap()
                .into_iter()
                .filter(|e| e.is_currently_serving)
                .collect();
            assert_eq!(serving.len(), 1);
        }
    }

    #[tokio::test]
    async fn test_advance_without_current_server_is_conflict() {
        let t = create_engine();
        t.engine.enqueue("M-1", "Lab").await.unwrap();
        let before = t.engine.list_queue("Lab").await.unwrap();
        t.publisher.take();

        let err = t.engine.advance_service("Lab").await.unwrap_err();
        assert!(matches!(err, QueueError::NoneServing(_)));

        // State unchanged, nothing published
        assert_eq!(t.engine.list_queue("Lab").await.unwrap(), before);
        assert!(t.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_advance_skips_gap_to_lowest_greater_position() {
        let t = create_engine();
        // Seed a gapped section directly through the store
        let mut first = QueueEntry::new("M-1", "Lab", 1);
        first.is_currently_serving = true;
        t.store.insert_entry(&first).await.unwrap();
        let third = QueueEntry::new("M-3", "Lab", 3);
        t.store.insert_entry(&third).await.unwrap();

        let outcome = t.engine.advance_service("Lab").await.unwrap();
        assert_eq!(outcome.next_serving_entry.unwrap().id, third.id);
    }

    #[tokio::test]
    async fn test_serving_flag_moves_forward_not_back() {
        let t = create_engine();
        let mut ids = Vec::new();
        for i in 0..3 {
            ids.push(t.engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap().id);
        }
        // Staff skipped straight to the middle of the queue
        t.store.set_entry_serving(ids[1], true).await.unwrap();

        let outcome = t.engine.advance_service("Lab").await.unwrap();
        assert_eq!(outcome.next_serving_entry.unwrap().id, ids[2]);
    }

    #[tokio::test]
    async fn test_list_queue_is_idempotent() {
        let t = create_engine();
        for i in 0..3 {
            t.engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap();
        }
        let first = t.engine.list_queue("Lab").await.unwrap();
        let second = t.engine.list_queue("Lab").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_enqueues_get_unique_positions() {
        let t = create_engine();
        let engine = Arc::new(t.engine);
        let mut handles = Vec::new();
        for i in 0..16 {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let queue = engine.list_queue("Lab").await.unwrap();
        let expected: Vec<u32> = (1..=16).collect();
        assert_eq!(positions(&queue), expected);
    }

    #[tokio::test]
    async fn test_rename_section_entries_preserves_positions() {
        let t = create_engine();
        t.engine.enqueue("M-1", "Lab").await.unwrap();
        t.engine.enqueue("M-2", "Lab").await.unwrap();

        let moved = t
            .engine
            .rename_section_entries("Lab", "Pathology")
            .await
            .unwrap();
        assert_eq!(moved, 2);
        assert!(t.engine.list_queue("Lab").await.unwrap().is_empty());
        assert_eq!(
            positions(&t.engine.list_queue("Pathology").await.unwrap()),
            vec![1, 2]
        );
    }

    #[tokio::test]
    async fn test_remove_section_entries_empties_queue() {
        let t = create_engine();
        for i in 0..3 {
            t.engine.enqueue(&format!("M-{i}"), "Lab").await.unwrap();
        }
        let removed = t.engine.remove_section_entries("Lab").await.unwrap();
        assert_eq!(removed, 3);
        assert!(t.engine.list_queue("Lab").await.unwrap().is_empty());
    }
}
