// ============================================================
// EXPORT PIPELINE
// ============================================================

use std::path::Path;

use tracing::{info, warn};

use crate::domain::error::Result;
use crate::infrastructure::csv;
use crate::infrastructure::db::ReviewStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { rows: usize },
    /// The table has no rows; nothing was written and this is not
    /// a failure.
    NoData,
}

/// Export every row of a table to a CSV file.
pub async fn export_table(
    store: &dyn ReviewStore,
    table: &str,
    destination: &Path,
) -> Result<ExportOutcome> {
    let rs = store.fetch_table(table).await?;
    if rs.is_empty() {
        warn!(table, "No data to export");
        return Ok(ExportOutcome::NoData);
    }

    csv::write_records(destination, &rs)?;
    info!(table, rows = rs.len(), destination = %destination.display(), "Export finished");
    Ok(ExportOutcome::Written { rows: rs.len() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::import::import_table;
    use crate::application::testing::{FakeStore, ScriptedDecision};
    use crate::domain::record::{RecordSet, Value};
    use crate::domain::tables::LISTINGS;

    #[tokio::test]
    async fn test_empty_table_is_no_data() {
        let store = FakeStore::new();
        let path = std::env::temp_dir().join("tdr_toolkit_export_nodata.csv");

        let outcome = export_table(&store, LISTINGS, &path).await.unwrap();

        assert_eq!(outcome, ExportOutcome::NoData);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_export_writes_all_rows() {
        let store = FakeStore::new();
        let mut rs = RecordSet::new(vec![
            "restaurant_name".to_string(),
            "two_dish_price".to_string(),
        ])
        .unwrap();
        rs.push_row(vec![Value::Text("Lucky Kitchen".into()), Value::Float(45.0)])
            .unwrap();
        rs.push_row(vec![Value::Text("Golden Bowl".into()), Value::Null])
            .unwrap();
        store.tables.lock().unwrap().insert(LISTINGS.to_string(), rs);

        let path = std::env::temp_dir().join("tdr_toolkit_export_rows.csv");
        let outcome = export_table(&store, LISTINGS, &path).await.unwrap();

        assert_eq!(outcome, ExportOutcome::Written { rows: 2 });
        let written = std::fs::read(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(written.starts_with(b"\xEF\xBB\xBF"));
        let text = String::from_utf8_lossy(&written);
        assert!(text.contains("Lucky Kitchen,45"));
        assert!(text.contains("Golden Bowl,"));
    }

    #[tokio::test]
    async fn test_export_then_import_reproduces_rows() {
        let source = FakeStore::new();
        let mut rs = RecordSet::new(vec![
            "restaurant_name".to_string(),
            "two_dish_price".to_string(),
        ])
        .unwrap();
        rs.push_row(vec![Value::Text("茶餐廳".into()), Value::Float(45.0)])
            .unwrap();
        rs.push_row(vec![Value::Text("Golden Bowl".into()), Value::Float(52.5)])
            .unwrap();
        source.tables.lock().unwrap().insert(LISTINGS.to_string(), rs);

        let path = std::env::temp_dir().join("tdr_toolkit_export_roundtrip.csv");
        export_table(&source, LISTINGS, &path).await.unwrap();

        let target = FakeStore::new();
        let mut decision = ScriptedDecision::invalid();
        let report = import_table(&target, &mut decision, &path, LISTINGS)
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report.insert.inserted, 2);
        let tables = target.tables.lock().unwrap();
        assert_eq!(tables[LISTINGS].len(), 2);
        assert_eq!(
            tables[LISTINGS].get(0, "restaurant_name"),
            Some(&Value::Text("茶餐廳".to_string()))
        );
        assert_eq!(
            tables[LISTINGS].get(1, "two_dish_price"),
            Some(&Value::Float(52.5))
        );
    }
}
