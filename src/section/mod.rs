//! Section directory: named queue lanes.
//!
//! Sections are simple reference data, but deleting or renaming one cascades
//! to the queue entries that reference it by name.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::events::{EventPublisher, QueueEvent};
use crate::queue::QueueEngine;
use crate::store::RecordStore;

/// A named queue lane (a service counter or department).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub name: String,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRequest {
    pub name: String,
}

pub struct SectionDirectory {
    store: Arc<dyn RecordStore>,
    engine: Arc<QueueEngine>,
    events: Arc<dyn EventPublisher>,
}

impl SectionDirectory {
    pub fn new(
        store: Arc<dyn RecordStore>,
        engine: Arc<QueueEngine>,
        events: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            store,
            engine,
            events,
        }
    }

    /// Create a section. Names are unique; queue entries key off them.
    pub async fn create(&self, name: &str) -> Result<Section> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("section name is required".into()));
        }
        if self.store.find_section_by_name(name).await?.is_some() {
            return Err(AppError::Validation(format!(
                "section name '{name}' is already in use"
            )));
        }

        let section = Section::new(name);
        self.store.insert_section(&section).await?;

        tracing::info!(section_id = %section.id, name = %section.name, "Section created");
        self.events
            .publish(QueueEvent::SectionAdded(section.clone()));
        Ok(section)
    }

    pub async fn list(&self) -> Result<Vec<Section>> {
        Ok(self.store.list_sections().await?)
    }

    /// Rename a section and cascade the new name to its queue entries,
    /// preserving their positions.
    pub async fn rename(&self, id: Uuid, new_name: &str) -> Result<Section> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(AppError::Validation("section name is required".into()));
        }

        let section = self
            .store
            .get_section(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("section {id} not found")))?;

        if let Some(existing) = self.store.find_section_by_name(new_name).await? {
            if existing.id != id {
                return Err(AppError::Validation(format!(
                    "section name '{new_name}' is already in use"
                )));
            }
        }

        let old_name = section.name.clone();
        self.store.update_section_name(id, new_name).await?;
        let moved = self
            .engine
            .rename_section_entries(&old_name, new_name)
            .await?;

        let updated = Section {
            id,
            name: new_name.to_string(),
        };
        tracing::info!(
            section_id = %id,
            old_name = %old_name,
            new_name = %new_name,
            entries_moved = moved,
            "Section renamed"
        );
        self.events
            .publish(QueueEvent::SectionUpdated(updated.clone()));
        Ok(updated)
    }

    /// Delete a section and every queue entry that references it.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        let section = self
            .store
            .get_section(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("section {id} not found")))?;

        self.store.delete_section(id).await?;
        let removed = self.engine.remove_section_entries(&section.name).await?;

        tracing::info!(
            section_id = %id,
            name = %section.name,
            entries_removed = removed,
            "Section deleted"
        );
        self.events.publish(QueueEvent::SectionDeleted(id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingPublisher;
    use crate::store::MemoryStore;

    struct TestDirectory {
        sections: SectionDirectory,
        engine: Arc<QueueEngine>,
        publisher: Arc<RecordingPublisher>,
    }

    fn create_directory() -> TestDirectory {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let publisher = Arc::new(RecordingPublisher::new());
        let engine = Arc::new(QueueEngine::new(store.clone(), publisher.clone()));
        let sections = SectionDirectory::new(store, engine.clone(), publisher.clone());
        TestDirectory {
            sections,
            engine,
            publisher,
        }
    }

    #[tokio::test]
    async fn test_create_and_list() {
        let t = create_directory();
        let section = t.sections.create("Pharmacy").await.unwrap();
        assert_eq!(section.name, "Pharmacy");

        let all = t.sections.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            t.publisher.take(),
            vec![QueueEvent::SectionAdded(section)]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_duplicate_names() {
        let t = create_directory();
        assert!(matches!(
            t.sections.create("  ").await.unwrap_err(),
            AppError::Validation(_)
        ));

        t.sections.create("Lab").await.unwrap();
        assert!(matches!(
            t.sections.create("Lab").await.unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_queue_entries() {
        let t = create_directory();
        let section = t.sections.create("A").await.unwrap();
        for i in 0..3 {
            t.engine.enqueue(&format!("M-{i}"), "A").await.unwrap();
        }

        t.sections.delete(section.id).await.unwrap();

        assert!(t.engine.list_queue("A").await.unwrap().is_empty());
        assert!(t.sections.list().await.unwrap().is_empty());
        let events = t.publisher.take();
        assert_eq!(events.last(), Some(&QueueEvent::SectionDeleted(section.id)));
    }

    #[tokio::test]
    async fn test_delete_unknown_section_is_not_found() {
        let t = create_directory();
        assert!(matches!(
            t.sections.delete(Uuid::new_v4()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_rename_cascades_and_preserves_positions() {
        let t = create_directory();
        let section = t.sections.create("A").await.unwrap();
        let e1 = t.engine.enqueue("M-1", "A").await.unwrap();
        let e2 = t.engine.enqueue("M-2", "A").await.unwrap();

        let renamed = t.sections.rename(section.id, "B").await.unwrap();
        assert_eq!(renamed.name, "B");

        assert!(t.engine.list_queue("A").await.unwrap().is_empty());
        let moved = t.engine.list_queue("B").await.unwrap();
        assert_eq!(moved.len(), 2);
        assert_eq!(moved[0].id, e1.id);
        assert_eq!(moved[0].position, 1);
        assert_eq!(moved[1].id, e2.id);
        assert_eq!(moved[1].position, 2);

        let events = t.publisher.take();
        assert_eq!(events.last(), Some(&QueueEvent::SectionUpdated(renamed)));
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let t = create_directory();
        let section = t.sections.create("A").await.unwrap();
        let renamed = t.sections.rename(section.id, "A").await.unwrap();
        assert_eq!(renamed.name, "A");
    }

    #[tokio::test]
    async fn test_rename_to_taken_name_is_rejected() {
        let t = create_directory();
        t.sections.create("A").await.unwrap();
        let other = t.sections.create("B").await.unwrap();
        assert!(matches!(
            t.sections.rename(other.id, "A").await.unwrap_err(),
            AppError::Validation(_)
        ));
    }
}
