//! Record store abstraction.
//!
//! Durable, queryable storage for Section, Customer and QueueEntry records.
//! The engine and directories only see the [`RecordStore`] trait; a factory
//! selects the backend from configuration (memory by default, postgres when
//! a connection string is configured).

mod factory;
mod memory;
mod postgres;

pub use factory::create_record_store;
pub use memory::MemoryStore;
pub use postgres::PostgresStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::customer::Customer;
use crate::queue::QueueEntry;
use crate::section::Section;

/// Errors surfaced by a record store backend.
///
/// All variants are transient from the caller's perspective: the operation
/// did not complete and left no visible partial write (single-record
/// operations only; multi-write sequences are serialized above this layer).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store backend error: {0}")]
    Backend(#[from] sqlx::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Typed create / read-by-filter / update / delete / count operations over
/// the three record types.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // Sections
    async fn insert_section(&self, section: &Section) -> StoreResult<()>;
    async fn get_section(&self, id: Uuid) -> StoreResult<Option<Section>>;
    async fn find_section_by_name(&self, name: &str) -> StoreResult<Option<Section>>;
    async fn list_sections(&self) -> StoreResult<Vec<Section>>;
    async fn update_section_name(&self, id: Uuid, name: &str) -> StoreResult<()>;
    /// Returns false if no section with this id existed
    async fn delete_section(&self, id: Uuid) -> StoreResult<bool>;

    // Customers
    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()>;
    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>>;
    async fn find_customer_by_membership(
        &self,
        membership_number: &str,
    ) -> StoreResult<Option<Customer>>;
    async fn list_customers(&self) -> StoreResult<Vec<Customer>>;
    /// Full overwrite of an existing customer record, keyed by id
    async fn update_customer(&self, customer: &Customer) -> StoreResult<()>;
    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool>;

    // Queue entries
    async fn insert_entry(&self, entry: &QueueEntry) -> StoreResult<()>;
    async fn get_entry(&self, id: Uuid) -> StoreResult<Option<QueueEntry>>;
    /// All entries for a section, ordered by position ascending
    async fn entries_in_section(&self, section: &str) -> StoreResult<Vec<QueueEntry>>;
    async fn count_entries(&self, section: &str) -> StoreResult<u32>;
    async fn find_serving_entry(&self, section: &str) -> StoreResult<Option<QueueEntry>>;
    async fn set_entry_position(&self, id: Uuid, position: u32) -> StoreResult<()>;
    async fn set_entry_serving(&self, id: Uuid, serving: bool) -> StoreResult<()>;
    async fn delete_entry(&self, id: Uuid) -> StoreResult<bool>;
    /// Returns the number of entries removed
    async fn delete_entries_in_section(&self, section: &str) -> StoreResult<u64>;
    /// Moves every entry of `old_name` to `new_name`, preserving positions.
    /// Returns the number of entries updated.
    async fn rename_entries_section(&self, old_name: &str, new_name: &str) -> StoreResult<u64>;
}
