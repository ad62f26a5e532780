// ============================================================
// PROMPT PORTS
// ============================================================
// The pipelines block on user decisions at a few well-defined
// points. Those decisions come through these traits so the
// pipelines are testable without a terminal.

use std::path::PathBuf;

use crate::domain::error::Result;

/// How to handle an import into a non-empty table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    /// Delete all existing rows, restart the identity sequence,
    /// then insert fresh.
    Replace,
    /// Insert only rows whose primary key does not already exist.
    Merge,
}

/// Asked once per import when the target table already has rows.
pub trait ImportDecision {
    /// An invalid answer surfaces as `InvalidUserChoice` and the
    /// import aborts with nothing written.
    fn resolve_existing_rows(&mut self, table: &str, existing: i64) -> Result<ImportMode>;
}

/// Gates for the destructive erase operations.
pub trait EraseConfirmation {
    /// Returns whatever the user typed; the pipeline compares it
    /// against the expected phrase.
    fn confirm_table(&mut self, table: &str, phrase: &str) -> Result<String>;

    /// Group-level y/n gate, asked before any per-table phrase.
    fn confirm_group(&mut self, group: &str) -> Result<bool>;
}

/// Supplies per-table file paths for group operations. `None`
/// means the user skipped the table.
pub trait FilePicker {
    fn pick_source(&mut self, table: &str) -> Result<Option<PathBuf>>;

    fn pick_destination(&mut self, table: &str) -> Result<Option<PathBuf>>;
}
