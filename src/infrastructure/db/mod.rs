// ============================================================
// DATABASE INFRASTRUCTURE
// ============================================================
// Row-level store operations behind a trait so the pipelines can
// be exercised without a live PostgreSQL instance.

pub mod postgres;

pub use postgres::PgStore;

use async_trait::async_trait;

use crate::domain::error::Result;
use crate::domain::record::RecordSet;

/// Counters from one batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub inserted: usize,
    /// Rows skipped because their primary key already exists.
    pub duplicates_skipped: usize,
    /// Rows rejected by a table constraint; non-fatal to the batch.
    pub constraint_violations: usize,
}

/// Row-level access to the review database.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn count_rows(&self, table: &str) -> Result<i64>;

    async fn table_exists(&self, table: &str) -> Result<bool>;

    /// `SELECT *` into a record set, preserving column order.
    async fn fetch_table(&self, table: &str) -> Result<RecordSet>;

    /// Insert every row, skipping duplicate primary keys. A
    /// per-row constraint violation is counted and the batch
    /// continues; any other database error aborts and rolls back
    /// the whole call.
    async fn insert_rows(&self, table: &str, data: &RecordSet) -> Result<InsertReport>;

    /// Delete all rows, restart the identity sequence at 1, then
    /// insert, all within one transaction: if the batch aborts the
    /// old rows are restored. Plain erase deliberately leaves the
    /// sequence alone; only replace-mode import goes through here.
    async fn replace_rows(&self, table: &str, data: &RecordSet) -> Result<InsertReport>;

    /// Delete all rows; returns the number removed.
    async fn delete_all(&self, table: &str) -> Result<u64>;
}
