// ============================================================
// IMPORT PIPELINE
// ============================================================
// read -> clean -> conflict-check -> write for one table. The
// database is not touched until cleaning has produced at least
// one valid row.

use std::path::Path;

use tracing::info;

use crate::application::cleaning::clean_for_table;
use crate::application::prompts::{ImportDecision, ImportMode};
use crate::domain::error::{AppError, Result};
use crate::domain::outcome::CleaningOutcome;
use crate::domain::tables;
use crate::infrastructure::csv;
use crate::infrastructure::db::{InsertReport, ReviewStore};

/// Counts reported to the user after one import.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub table: String,
    pub rows_read: usize,
    pub rows_clean: usize,
    pub cleaning: CleaningOutcome,
    /// None when the target table was empty and no decision was
    /// needed.
    pub mode: Option<ImportMode>,
    pub insert: InsertReport,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        format!(
            "{}: read {}, cleaned to {}, inserted {}, skipped {} duplicates, {} constraint rejects",
            self.table,
            self.rows_read,
            self.rows_clean,
            self.insert.inserted,
            self.insert.duplicates_skipped,
            self.insert.constraint_violations
        )
    }
}

/// Import one CSV file into one table.
pub async fn import_table(
    store: &dyn ReviewStore,
    decision: &mut dyn ImportDecision,
    path: &Path,
    table: &str,
) -> Result<ImportReport> {
    let raw = csv::read_records(path)?;
    let rows_read = raw.len();

    info!(table, rows = rows_read, "Cleaning rows for import");
    let (mut cleaned, cleaning) = clean_for_table(raw, table);
    if cleaned.is_empty() {
        return Err(AppError::NoValidRows(format!(
            "No rows for '{}' survived cleaning ({})",
            table,
            cleaning.summary()
        )));
    }

    let existing = store.count_rows(table).await?;
    let mut mode = None;
    if existing > 0 {
        mode = Some(decision.resolve_existing_rows(table, existing)?);
    }

    // The database assigns the primary key for these tables, so
    // an incoming id column must not be inserted.
    if tables::descriptor(table).map_or(false, |d| d.generated_pk) && cleaned.drop_column("id") {
        info!(table, "Stripped incoming 'id' column for generated primary key");
        if cleaned.columns().is_empty() {
            return Err(AppError::NoValidRows(format!(
                "Nothing left to import into '{}' after removing the id column",
                table
            )));
        }
    }

    // Replace wipes and restarts the identity sequence in the same
    // transaction as the inserts, so an aborted batch restores the
    // previous rows.
    let insert = match mode {
        Some(ImportMode::Replace) => store.replace_rows(table, &cleaned).await?,
        _ => store.insert_rows(table, &cleaned).await?,
    };
    let report = ImportReport {
        table: table.to_string(),
        rows_read,
        rows_clean: cleaned.len(),
        cleaning,
        mode,
        insert,
    };
    info!(summary = %report.summary(), "Import finished");
    Ok(report)
}
