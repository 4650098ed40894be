//! PostgreSQL record store.
//!
//! Persistent backend using sqlx. The schema is created on connect so the
//! service can point at an empty database. Row structs stay private to this
//! module; domain types never carry sqlx derives.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use crate::config::StoreConfig;
use crate::customer::Customer;
use crate::queue::QueueEntry;
use crate::section::Section;

use super::{RecordStore, StoreError, StoreResult};

const CONNECT_TIMEOUT_SECS: u64 = 5;

/// PostgreSQL-backed record store.
pub struct PostgresStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct SectionRow {
    id: Uuid,
    name: String,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    membership_number: String,
    name: String,
    designation: String,
    hospital: String,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            membership_number: row.membership_number,
            name: row.name,
            designation: row.designation,
            hospital: row.hospital,
        }
    }
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    id: Uuid,
    membership_number: String,
    section: String,
    position: i32,
    is_currently_serving: bool,
}

impl From<EntryRow> for QueueEntry {
    fn from(row: EntryRow) -> Self {
        Self {
            id: row.id,
            membership_number: row.membership_number,
            section: row.section,
            position: row.position as u32,
            is_currently_serving: row.is_currently_serving,
        }
    }
}

impl PostgresStore {
    /// Connect and ensure the schema exists.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect(&config.url)
            .await?;

        tracing::info!(pool_size = config.pool, "PostgreSQL pool created");

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sections (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS customers (
                id UUID PRIMARY KEY,
                membership_number TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                designation TEXT NOT NULL DEFAULT '',
                hospital TEXT NOT NULL DEFAULT ''
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS queue_entries (
                id UUID PRIMARY KEY,
                membership_number TEXT NOT NULL,
                section TEXT NOT NULL,
                position INT NOT NULL,
                is_currently_serving BOOLEAN NOT NULL DEFAULT FALSE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_queue_entries_section_position \
             ON queue_entries (section, position)",
        )
        .execute(&self.pool)
        .await?;

        tracing::info!("Record store schema ready");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn insert_section(&self, section: &Section) -> StoreResult<()> {
        sqlx::query("INSERT INTO sections (id, name) VALUES ($1, $2)")
            .bind(section.id)
            .bind(&section.name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_section(&self, id: Uuid) -> StoreResult<Option<Section>> {
        let row = sqlx::query_as::<_, SectionRow>("SELECT id, name FROM sections WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Section::from))
    }

    async fn find_section_by_name(&self, name: &str) -> StoreResult<Option<Section>> {
        let row = sqlx::query_as::<_, SectionRow>("SELECT id, name FROM sections WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Section::from))
    }

    async fn list_sections(&self) -> StoreResult<Vec<Section>> {
        let rows = sqlx::query_as::<_, SectionRow>("SELECT id, name FROM sections")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Section::from).collect())
    }

    async fn update_section_name(&self, id: Uuid, name: &str) -> StoreResult<()> {
        sqlx::query("UPDATE sections SET name = $2 WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_section(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_customer(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO customers (id, membership_number, name, designation, hospital) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(customer.id)
        .bind(&customer.membership_number)
        .bind(&customer.name)
        .bind(&customer.designation)
        .bind(&customer.hospital)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_customer(&self, id: Uuid) -> StoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, membership_number, name, designation, hospital \
             FROM customers WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Customer::from))
    }

    async fn find_customer_by_membership(
        &self,
        membership_number: &str,
    ) -> StoreResult<Option<Customer>> {
        let row = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, membership_number, name, designation, hospital \
             FROM customers WHERE membership_number = $1",
        )
        .bind(membership_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Customer::from))
    }

    async fn list_customers(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            "SELECT id, membership_number, name, designation, hospital FROM customers",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Customer::from).collect())
    }

    async fn update_customer(&self, customer: &Customer) -> StoreResult<()> {
        sqlx::query(
            "UPDATE customers SET membership_number = $2, name = $3, designation = $4, \
             hospital = $5 WHERE id = $1",
        )
        .bind(customer.id)
        .bind(&customer.membership_number)
        .bind(&customer.name)
        .bind(&customer.designation)
        .bind(&customer.hospital)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_customer(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_entry(&self, entry: &QueueEntry) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO queue_entries (id, membership_number, section, position, \
             is_currently_serving) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(entry.id)
        .bind(&entry.membership_number)
        .bind(&entry.section)
        .bind(entry.position as i32)
        .bind(entry.is_currently_serving)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_entry(&self, id: Uuid) -> StoreResult<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, membership_number, section, position, is_currently_serving \
             FROM queue_entries WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(QueueEntry::from))
    }

    async fn entries_in_section(&self, section: &str) -> StoreResult<Vec<QueueEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            "SELECT id, membership_number, section, position, is_currently_serving \
             FROM queue_entries WHERE section = $1 ORDER BY position ASC",
        )
        .bind(section)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(QueueEntry::from).collect())
    }

    async fn count_entries(&self, section: &str) -> StoreResult<u32> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM queue_entries WHERE section = $1")
                .bind(section)
                .fetch_one(&self.pool)
                .await?;
        Ok(count as u32)
    }

    async fn find_serving_entry(&self, section: &str) -> StoreResult<Option<QueueEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(
            "SELECT id, membership_number, section, position, is_currently_serving \
             FROM queue_entries WHERE section = $1 AND is_currently_serving LIMIT 1",
        )
        .bind(section)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(QueueEntry::from))
    }

    async fn set_entry_position(&self, id: Uuid, position: u32) -> StoreResult<()> {
        sqlx::query("UPDATE queue_entries SET position = $2 WHERE id = $1")
            .bind(id)
            .bind(position as i32)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_entry_serving(&self, id: Uuid, serving: bool) -> StoreResult<()> {
        sqlx::query("UPDATE queue_entries SET is_currently_serving = $2 WHERE id = $1")
            .bind(id)
            .bind(serving)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_entry(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM queue_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_entries_in_section(&self, section: &str) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM queue_entries WHERE section = $1")
            .bind(section)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn rename_entries_section(&self, old_name: &str, new_name: &str) -> StoreResult<u64> {
        let result = sqlx::query("UPDATE queue_entries SET section = $2 WHERE section = $1")
            .bind(old_name)
            .bind(new_name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
