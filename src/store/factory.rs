//! Record store factory

use std::sync::Arc;

use crate::config::StoreConfig;

use super::memory::MemoryStore;
use super::postgres::PostgresStore;
use super::{RecordStore, StoreError};

/// Create a record store based on configuration.
///
/// - `"postgres"`: connects with the configured URL and ensures the schema;
///   a connection failure is fatal rather than silently degrading to memory.
/// - `"memory"` (default): volatile in-process store.
pub async fn create_record_store(
    settings: &StoreConfig,
) -> Result<Arc<dyn RecordStore>, StoreError> {
    match settings.backend.as_str() {
        "postgres" => {
            tracing::info!(backend = "postgres", "Connecting record store");
            Ok(Arc::new(PostgresStore::connect(settings).await?))
        }
        other => {
            if other != "memory" {
                tracing::warn!(
                    backend = other,
                    "Unknown store backend, using memory"
                );
            }
            tracing::info!(backend = "memory", "Creating in-memory record store");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
