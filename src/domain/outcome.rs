// ============================================================
// CLEANING OUTCOME
// ============================================================
// Counters produced by one cleaning run, consumed for reporting
// and never persisted.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningOutcome {
    pub rows_in: usize,
    pub rows_out: usize,
    pub duplicates_removed: usize,
    pub missing_required: usize,
    pub out_of_range: usize,
    pub invalid_primary_key: usize,
    /// Cells whose value changed type or content during cleaning.
    pub coercions: usize,
}

impl CleaningOutcome {
    pub fn rows_dropped(&self) -> usize {
        self.rows_in - self.rows_out
    }

    pub fn summary(&self) -> String {
        format!(
            "{} rows in, {} rows out ({} duplicate, {} missing required, \
             {} out of range, {} invalid id), {} values coerced",
            self.rows_in,
            self.rows_out,
            self.duplicates_removed,
            self.missing_required,
            self.out_of_range,
            self.invalid_primary_key,
            self.coercions
        )
    }
}
