// ============================================================
// ERASE
// ============================================================
// Confirmation-gated deletion of all rows in one table. The
// identity sequence is deliberately left alone here; only
// replace-mode import restarts it.

use tracing::{info, warn};

use crate::application::prompts::EraseConfirmation;
use crate::domain::error::{AppError, Result};
use crate::infrastructure::db::ReviewStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EraseOutcome {
    Erased { rows: u64 },
    /// The confirmation phrase did not match; user cancellation,
    /// not an error.
    Cancelled,
}

/// The exact phrase the user must type to erase a table.
pub fn confirmation_phrase(table: &str) -> String {
    format!("erase all data in {}", table)
}

pub async fn erase_table(
    store: &dyn ReviewStore,
    confirm: &mut dyn EraseConfirmation,
    table: &str,
) -> Result<EraseOutcome> {
    if !store.table_exists(table).await? {
        return Err(AppError::TableNotFound(table.to_string()));
    }

    let phrase = confirmation_phrase(table);
    let typed = confirm.confirm_table(table, &phrase)?;
    if typed != phrase {
        warn!(table, "Confirmation phrase did not match, erase cancelled");
        return Ok(EraseOutcome::Cancelled);
    }

    let rows = store.delete_all(table).await?;
    info!(table, rows, "Erased table data");
    Ok(EraseOutcome::Erased { rows })
}
