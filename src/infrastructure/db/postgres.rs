// ============================================================
// POSTGRES STORE
// ============================================================
// sqlx-backed implementation of ReviewStore. Table names are
// interpolated only after validation against the fixed registry;
// row values are always bound parameters.

use async_trait::async_trait;
use bigdecimal::ToPrimitive;
use chrono::{DateTime, Utc};
use sqlx::error::ErrorKind;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::query::Query;
use sqlx::{Acquire, Column, Postgres, Row};
use std::time::Duration;
use tracing::{error, info};

use crate::domain::error::{AppError, Result};
use crate::domain::record::{RecordSet, Value};
use crate::domain::tables;
use crate::infrastructure::config::DbConfig;
use crate::infrastructure::db::{InsertReport, ReviewStore};

const CONNECT_TIMEOUT_SECS: u64 = 10;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and run a health check. One operation owns one
    /// store; call `close` on every exit path.
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password);

        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(|e| {
                error!("Failed to connect to PostgreSQL: {}", e);
                AppError::ConnectionFailed(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        sqlx::query("SELECT 1")
            .execute(&pool)
            .await
            .map_err(|e| AppError::ConnectionFailed(format!("Health check failed: {}", e)))?;

        info!(host = %config.host, database = %config.name, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Only registry tables may be spliced into SQL text.
    fn checked_table(table: &str) -> Result<&str> {
        if tables::descriptor(table).is_some() {
            Ok(table)
        } else {
            Err(AppError::TableNotFound(table.to_string()))
        }
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn count_rows(&self, table: &str) -> Result<i64> {
        let table = Self::checked_table(table)?;
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count rows in '{}': {}", table, e)))
    }

    async fn table_exists(&self, table: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT FROM information_schema.tables WHERE table_name = $1)",
        )
        .bind(table)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to check table '{}': {}", table, e)))
    }

    async fn fetch_table(&self, table: &str) -> Result<RecordSet> {
        let table = Self::checked_table(table)?;
        let rows = sqlx::query(&format!("SELECT * FROM {}", table))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to read '{}': {}", table, e)))?;

        let Some(first) = rows.first() else {
            return RecordSet::new(Vec::new());
        };

        let columns: Vec<String> = first
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rs = RecordSet::new(columns)?;
        for row in &rows {
            let values = (0..row.columns().len())
                .map(|i| extract_value(row, i))
                .collect();
            rs.push_row(values)?;
        }
        Ok(rs)
    }

    async fn insert_rows(&self, table: &str, data: &RecordSet) -> Result<InsertReport> {
        let table = Self::checked_table(table)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open transaction: {}", e)))?;

        // On error the transaction drops here and rolls back
        // everything inserted so far in this call.
        let report = insert_batch(&mut tx, table, data).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit insert batch: {}", e)))?;

        Ok(report)
    }

    async fn replace_rows(&self, table: &str, data: &RecordSet) -> Result<InsertReport> {
        let table = Self::checked_table(table)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open transaction: {}", e)))?;

        // Delete, sequence restart and inserts share the
        // transaction: an aborted batch restores the old rows.
        let removed = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete from '{}': {}", table, e)))?
            .rows_affected();

        sqlx::query(&format!("ALTER SEQUENCE {}_id_seq RESTART WITH 1", table))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to restart sequence for '{}': {}", table, e))
            })?;

        let report = insert_batch(&mut tx, table, data).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit replace: {}", e)))?;

        info!(table, removed, "Replaced table contents and restarted identity");
        Ok(report)
    }

    async fn delete_all(&self, table: &str) -> Result<u64> {
        let table = Self::checked_table(table)?;
        let result = sqlx::query(&format!("DELETE FROM {}", table))
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete from '{}': {}", table, e)))?;
        Ok(result.rows_affected())
    }
}

/// Insert every row of the batch inside the caller's transaction.
/// A constraint violation rolls back only that row's savepoint;
/// any other database error propagates and the caller's
/// transaction rolls back on drop.
async fn insert_batch(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    table: &str,
    data: &RecordSet,
) -> Result<InsertReport> {
    let column_list = data.columns().join(", ");
    let placeholders: Vec<String> =
        (1..=data.columns().len()).map(|i| format!("${}", i)).collect();
    // ON CONFLICT DO NOTHING skips duplicate primary keys without
    // failing the statement.
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT DO NOTHING",
        table,
        column_list,
        placeholders.join(", ")
    );

    let mut report = InsertReport::default();

    for row in data.rows() {
        // One savepoint per row so a constraint violation does not
        // poison the enclosing transaction.
        let mut savepoint = tx
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to open savepoint: {}", e)))?;

        let mut query = sqlx::query(&sql);
        for value in row {
            query = bind_value(query, value);
        }

        match query.execute(&mut *savepoint).await {
            Ok(result) => {
                savepoint.commit().await.map_err(|e| {
                    AppError::DatabaseError(format!("Failed to release savepoint: {}", e))
                })?;
                if result.rows_affected() == 0 {
                    report.duplicates_skipped += 1;
                } else {
                    report.inserted += 1;
                }
            }
            Err(sqlx::Error::Database(db_err)) if is_constraint_violation(db_err.kind()) => {
                savepoint.rollback().await.map_err(|e| {
                    AppError::DatabaseError(format!("Failed to roll back savepoint: {}", e))
                })?;
                report.constraint_violations += 1;
            }
            Err(e) => {
                return Err(AppError::DatabaseError(format!(
                    "Insert into '{}' failed: {}",
                    table, e
                )));
            }
        }
    }

    Ok(report)
}

fn is_constraint_violation(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UniqueViolation
            | ErrorKind::ForeignKeyViolation
            | ErrorKind::NotNullViolation
            | ErrorKind::CheckViolation
    )
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(Option::<String>::None),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Bool(b) => query.bind(*b),
        Value::Date(d) => query.bind(*d),
        Value::Time(t) => query.bind(*t),
        Value::Timestamp(ts) => query.bind(*ts),
    }
}

/// Decode a column by trying concrete types in order of
/// likelihood; anything unsupported decodes as null.
fn extract_value(row: &PgRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map(|n| Value::Int(n as i64)).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map(Value::Int).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map(Value::Float).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bigdecimal::BigDecimal>, _>(index) {
        return v
            .and_then(|d| d.to_f64())
            .map(Value::Float)
            .unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map(Value::Bool).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map(Value::Text).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDate>, _>(index) {
        return v.map(Value::Date).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveTime>, _>(index) {
        return v.map(Value::Time).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<chrono::NaiveDateTime>, _>(index) {
        return v.map(Value::Timestamp).unwrap_or(Value::Null);
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(index) {
        return v
            .map(|dt| Value::Timestamp(dt.naive_utc()))
            .unwrap_or(Value::Null);
    }

    Value::Null
}
