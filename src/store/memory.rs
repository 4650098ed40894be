//! In-memory record store backed by DashMap.
//!
//! Default backend; state is lost on restart. Used by tests and development.

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::customer::Customer;
use crate::queue::QueueEntry;
use crate::section::Section;

use super::{RecordStore, StoreResult};

/// In-memory record store.
///
/// Individual operations are atomic per record via DashMap's sharded locks;
/// multi-record sequences (renumbering, cascades) are serialized by the
/// queue engine above this layer.
pub struct MemoryStore {
    sections: DashMap<Uuid, Section>,
    customers: DashMap<Uuid, Customer>,
    entries: DashMap<Uuid, QueueEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            sections: DashMap::new(),
            customers: DashMap::new(),
            entries: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_section(&self, section: &Section) -> StoreResult<()> {
        self.sections.insert(section.id, section.clone());
        Ok(())
    }

    async fn get_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        Ok(self.sections.get(&id).map(|s| s.clone()))
    }

    async fn find_section_by_name(&self, name: &str) -> StoreResult<Option<Section>> {
        Ok(self
            .sections
            .iter()
            .find(|entry| entry.value().name == name)
            .map(|entry| entry.value().clone()))
    }

    async fn list_sections(&self) -> StoreResult<Vec<Section>> {
        Ok(self.sections.iter().map(|e| e.value().clone()).collect())
    }

    async fn update_section_name(&self, id: Uuid, name: &str) -> StoreResult<()> {
        if let Some(mut section) = self.sections.get_mut(&id) {
            section.name = name.to_string();
        }
        Ok(())
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.sections.remove(&id).is_some())
    }

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        self.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        Ok(self.customers.get(&id).map(|c| c.clone()))
    }

    async fn find_customer_by_membership(
        &self,
        membership_number: &str,
    ) -> StoreResult<Option<Customer>> {
        Ok(self
            .customers
            .iter()
            .find(|entry| entry.value().membership_number == membership_number)
            .map(|entry| entry.value().clone()))
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        Ok(self.customers.iter().map(|e| e.value().clone()).collect())
    }

    async fn update_customer(&self, customer: &Customer) -> StoreResult<()> {
        self.customers.insert(customer.id, customer.clone());
        Ok(())
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.customers.remove(&id).is_some())
    }

    async fn insert_entry(&self, entry: &QueueEntry) -> StoreResult<()> {
        self.entries.insert(entry.id, entry.clone());
        Ok(())
    }

    async fn get_entry(&self, id: Uuid) -> StoreResult<Option<QueueEntry>> {
        Ok(self.entries.get(&id).map(|e| e.clone()))
    }

    async fn entries_in_section(&self, section: &str) -> StoreResult<Vec<QueueEntry>> {
        let mut entries: Vec<QueueEntry> = self
            .entries
            .iter()
            .filter(|e| e.value().section == section)
            .map(|e| e.value().clone())
            .collect();
        entries.sort_by_key(|e| e.position);
        Ok(entries)
    }

    async fn count_entries(&self, section: &str) -> StoreResult<u32> {
        Ok(self
            .entries
            .iter()
            .filter(|e| e.value().section == section)
            .count() as u32)
    }

    async fn find_serving_entry(&self, section: &str) -> StoreResult<Option<QueueEntry>> {
        Ok(self
            .entries
            .iter()
            .find(|e| e.value().section == section && e.value().is_currently_serving)
            .map(|e| e.value().clone()))
    }

    async fn set_entry_position(&self, id: Uuid, position: u32) -> StoreResult<()> {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.position = position;
        }
        Ok(())
    }

    async fn set_entry_serving(&self, id: Uuid, serving: bool) -> StoreResult<()> {
        if let Some(mut entry) = self.entries.get_mut(&id) {
            entry.is_currently_serving = serving;
        }
        Ok(())
    }

    async fn delete_entry(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.entries.remove(&id).is_some())
    }

    async fn delete_entries_in_section(&self, section: &str) -> StoreResult<u64> {
        let ids: Vec<Uuid> = self
            .entries
            .iter()
            .filter(|e| e.value().section == section)
            .map(|e| e.value().id)
            .collect();
        let removed = ids.len() as u64;
        for id in ids {
            self.entries.remove(&id);
        }
        Ok(removed)
    }

    async fn rename_entries_section(&self, old_name: &str, new_name: &str) -> StoreResult<u64> {
        let mut updated = 0;
        for mut entry in self.entries.iter_mut() {
            if entry.value().section == old_name {
                entry.value_mut().section = new_name.to_string();
                updated += 1;
            }
        }
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(section: &str, position: u32) -> QueueEntry {
        QueueEntry::new(format!("M-{position}"), section, position)
    }

    #[tokio::test]
    async fn test_section_crud() {
        let store = MemoryStore::new();
        let section = Section::new("Pharmacy");

        store.insert_section(&section).await.unwrap();
        assert_eq!(
            store.get_section(section.id).await.unwrap().unwrap().name,
            "Pharmacy"
        );
        assert!(store
            .find_section_by_name("Pharmacy")
            .await
            .unwrap()
            .is_some());

        store
            .update_section_name(section.id, "Dispensary")
            .await
            .unwrap();
        assert_eq!(
            store.get_section(section.id).await.unwrap().unwrap().name,
            "Dispensary"
        );

        assert!(store.delete_section(section.id).await.unwrap());
        assert!(!store.delete_section(section.id).await.unwrap());
        assert!(store.get_section(section.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_customer_lookup_by_membership() {
        let store = MemoryStore::new();
        let customer = Customer::new("M-100", "Asha", "Nurse", "General");
        store.insert_customer(&customer).await.unwrap();

        let found = store
            .find_customer_by_membership("M-100")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, customer.id);
        assert!(store
            .find_customer_by_membership("M-999")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_entries_sorted_by_position() {
        let store = MemoryStore::new();
        for position in [3, 1, 2] {
            store.insert_entry(&entry("Lab", position)).await.unwrap();
        }

        let entries = store.entries_in_section("Lab").await.unwrap();
        let positions: Vec<u32> = entries.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(store.count_entries("Lab").await.unwrap(), 3);
        assert_eq!(store.count_entries("Radiology").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_serving_entry() {
        let store = MemoryStore::new();
        let mut serving = entry("Lab", 1);
        serving.is_currently_serving = true;
        store.insert_entry(&serving).await.unwrap();
        store.insert_entry(&entry("Lab", 2)).await.unwrap();

        let found = store.find_serving_entry("Lab").await.unwrap().unwrap();
        assert_eq!(found.id, serving.id);
        assert!(store.find_serving_entry("Radiology").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_entries_in_section() {
        let store = MemoryStore::new();
        store.insert_entry(&entry("Lab", 1)).await.unwrap();
        store.insert_entry(&entry("Lab", 2)).await.unwrap();
        store.insert_entry(&entry("Radiology", 1)).await.unwrap();

        assert_eq!(store.delete_entries_in_section("Lab").await.unwrap(), 2);
        assert!(store.entries_in_section("Lab").await.unwrap().is_empty());
        assert_eq!(store.count_entries("Radiology").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rename_entries_section_preserves_positions() {
        let store = MemoryStore::new();
        store.insert_entry(&entry("Lab", 1)).await.unwrap();
        store.insert_entry(&entry("Lab", 2)).await.unwrap();

        assert_eq!(
            store.rename_entries_section("Lab", "Pathology").await.unwrap(),
            2
        );
        assert!(store.entries_in_section("Lab").await.unwrap().is_empty());
        let moved = store.entries_in_section("Pathology").await.unwrap();
        let positions: Vec<u32> = moved.iter().map(|e| e.position).collect();
        assert_eq!(positions, vec![1, 2]);
    }
}
