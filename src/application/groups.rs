// ============================================================
// GROUP OPERATIONS
// ============================================================
// Fan an operation out across a table group in an order that
// respects foreign keys: referenced table first for import,
// referencing table first for erase. Fan-out is best-effort; a
// failure on one table is reported and the next is attempted.

use tracing::{error, info};

use crate::application::erase::{erase_table, EraseOutcome};
use crate::application::export::{export_table, ExportOutcome};
use crate::application::import::{import_table, ImportReport};
use crate::application::prompts::{EraseConfirmation, FilePicker, ImportDecision};
use crate::domain::error::Result;
use crate::domain::schema::TableGroup;
use crate::infrastructure::db::ReviewStore;

#[derive(Debug)]
pub enum GroupEraseOutcome {
    /// Declined at the group-level gate; no table was touched.
    Cancelled,
    Completed(Vec<(&'static str, Result<EraseOutcome>)>),
}

/// Import one file per member table, in dependency order. Tables
/// without a chosen file are skipped.
pub async fn import_group(
    store: &dyn ReviewStore,
    decision: &mut dyn ImportDecision,
    picker: &mut dyn FilePicker,
    group: &TableGroup,
) -> Vec<(&'static str, Result<ImportReport>)> {
    let mut results = Vec::new();
    for table in group.import_order {
        match picker.pick_source(table) {
            Ok(Some(path)) => {
                let result = import_table(store, decision, &path, table).await;
                if let Err(e) = &result {
                    error!(table, error = %e, "Group import failed for table");
                }
                results.push((*table, result));
            }
            Ok(None) => info!(table, "No file selected, skipping table"),
            Err(e) => results.push((*table, Err(e))),
        }
    }
    results
}

pub async fn export_group(
    store: &dyn ReviewStore,
    picker: &mut dyn FilePicker,
    group: &TableGroup,
) -> Vec<(&'static str, Result<ExportOutcome>)> {
    let mut results = Vec::new();
    for table in group.import_order {
        match picker.pick_destination(table) {
            Ok(Some(path)) => {
                let result = export_table(store, table, &path).await;
                if let Err(e) = &result {
                    error!(table, error = %e, "Group export failed for table");
                }
                results.push((*table, result));
            }
            Ok(None) => info!(table, "No destination selected, skipping table"),
            Err(e) => results.push((*table, Err(e))),
        }
    }
    results
}

/// Erase every member table, referencing tables first. Requires
/// the group-level confirmation before any per-table phrase gate.
pub async fn erase_group(
    store: &dyn ReviewStore,
    confirm: &mut dyn EraseConfirmation,
    group: &TableGroup,
) -> Result<GroupEraseOutcome> {
    if !confirm.confirm_group(group.name)? {
        info!(group = group.name, "Group erase cancelled");
        return Ok(GroupEraseOutcome::Cancelled);
    }

    let mut results = Vec::new();
    for table in group.erase_order() {
        let result = erase_table(store, confirm, table).await;
        if let Err(e) = &result {
            error!(table, error = %e, "Group erase failed for table");
        }
        results.push((table, result));
    }
    Ok(GroupEraseOutcome::Completed(results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        write_temp_csv, FakeStore, ScriptedConfirm, ScriptedDecision, ScriptedPicker,
    };
    use crate::domain::error::AppError;
    use crate::domain::record::{RecordSet, Value};
    use crate::domain::tables::{self, COMMENTS, COMMENTS_GROUP, COMMENT_RATINGS};

    fn comments_group() -> &'static TableGroup {
        tables::group(COMMENTS_GROUP).unwrap()
    }

    fn seed(store: &FakeStore, table: &str) {
        let mut rs = RecordSet::new(vec!["id".to_string()]).unwrap();
        rs.push_row(vec![Value::Int(1)]).unwrap();
        store.tables.lock().unwrap().insert(table.to_string(), rs);
    }

    #[tokio::test]
    async fn test_group_erase_deletes_referencing_table_first() {
        let store = FakeStore::new();
        seed(&store, COMMENTS);
        seed(&store, COMMENT_RATINGS);
        let mut confirm = ScriptedConfirm::accepting();

        let outcome = erase_group(&store, &mut confirm, comments_group())
            .await
            .unwrap();

        assert!(matches!(outcome, GroupEraseOutcome::Completed(_)));
        let calls = store.calls.lock().unwrap();
        let ratings_delete = calls
            .iter()
            .position(|c| c == &format!("delete:{}", COMMENT_RATINGS))
            .unwrap();
        let comments_delete = calls
            .iter()
            .position(|c| c == &format!("delete:{}", COMMENTS))
            .unwrap();
        assert!(ratings_delete < comments_delete);
    }

    #[tokio::test]
    async fn test_group_gate_declined_touches_nothing() {
        let store = FakeStore::new();
        seed(&store, COMMENTS);
        seed(&store, COMMENT_RATINGS);
        let mut confirm = ScriptedConfirm::declining_group();

        let outcome = erase_group(&store, &mut confirm, comments_group())
            .await
            .unwrap();

        assert!(matches!(outcome, GroupEraseOutcome::Cancelled));
        assert!(store.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_erase_continues_past_failure() {
        let store = FakeStore::new();
        // comments_commentrating missing entirely: TableNotFound,
        // but comments_comment_rate must still be attempted.
        seed(&store, COMMENTS);
        let mut confirm = ScriptedConfirm::accepting();

        let outcome = erase_group(&store, &mut confirm, comments_group())
            .await
            .unwrap();

        let GroupEraseOutcome::Completed(results) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(results.len(), 2);
        assert!(matches!(
            results[0].1,
            Err(AppError::TableNotFound(_))
        ));
        assert!(matches!(results[1].1, Ok(EraseOutcome::Erased { rows: 1 })));
    }

    #[tokio::test]
    async fn test_group_import_runs_in_dependency_order_and_skips() {
        let store = FakeStore::new();
        let path = write_temp_csv(
            "group_import",
            "id,restaurant_name,comment\n1,A,good\n",
        );
        let mut picker = ScriptedPicker::default();
        picker.sources.insert(COMMENTS.to_string(), path.clone());
        // No file for comments_commentrating: skipped.
        let mut decision = ScriptedDecision::invalid();

        let results = import_group(&store, &mut decision, &mut picker, comments_group()).await;
        std::fs::remove_file(&path).ok();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, COMMENTS);
        assert!(results[0].1.is_ok());
    }
}
