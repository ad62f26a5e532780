// ============================================================
// CSV WRITER
// ============================================================
// Serialize a RecordSet to a CSV file. Output is UTF-8 with a
// BOM so spreadsheet tools pick up non-ASCII restaurant names.

use std::path::Path;

use tracing::info;

use crate::domain::error::{AppError, Result};
use crate::domain::record::RecordSet;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write a record set to disk, header row first, nulls as empty
/// cells.
pub fn write_records(path: &Path, rs: &RecordSet) -> Result<()> {
    let bytes = to_csv_bytes(rs)?;
    std::fs::write(path, bytes)
        .map_err(|e| AppError::WriteFailed(format!("Failed to write '{}': {}", path.display(), e)))?;
    info!(path = %path.display(), rows = rs.len(), "Wrote CSV export");
    Ok(())
}

/// Render a record set as BOM-prefixed CSV bytes.
pub fn to_csv_bytes(rs: &RecordSet) -> Result<Vec<u8>> {
    let mut buffer = Vec::from(UTF8_BOM);
    {
        let mut writer = csv::Writer::from_writer(&mut buffer);
        writer
            .write_record(rs.columns())
            .map_err(|e| AppError::WriteFailed(format!("Failed to write CSV header: {}", e)))?;

        for row in rs.rows() {
            let record: Vec<String> = row.iter().map(|v| v.to_csv_field()).collect();
            writer
                .write_record(&record)
                .map_err(|e| AppError::WriteFailed(format!("Failed to write CSV row: {}", e)))?;
        }
        writer
            .flush()
            .map_err(|e| AppError::WriteFailed(format!("Failed to flush CSV output: {}", e)))?;
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::Value;
    use chrono::NaiveDate;

    fn sample() -> RecordSet {
        let mut rs = RecordSet::new(vec![
            "name".to_string(),
            "price".to_string(),
            "edit_date".to_string(),
        ])
        .unwrap();
        rs.push_row(vec![
            Value::Text("茶餐廳".to_string()),
            Value::Float(45.0),
            Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()),
        ])
        .unwrap();
        rs.push_row(vec![Value::Text("Golden Bowl".to_string()), Value::Null, Value::Null])
            .unwrap();
        rs
    }

    #[test]
    fn test_output_starts_with_bom() {
        let bytes = to_csv_bytes(&sample()).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
    }

    #[test]
    fn test_nulls_render_as_empty_cells() {
        let bytes = to_csv_bytes(&sample()).unwrap();
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "name,price,edit_date");
        assert_eq!(lines[1], "茶餐廳,45,2024-03-15");
        assert_eq!(lines[2], "Golden Bowl,,");
    }

    #[test]
    fn test_round_trip_through_reader() {
        let rs = sample();
        let bytes = to_csv_bytes(&rs).unwrap();
        let (content, _, _) = encoding_rs::UTF_8.decode(&bytes);
        let parsed = crate::infrastructure::csv::reader::parse_content(&content).unwrap();

        assert_eq!(parsed.columns(), rs.columns());
        assert_eq!(parsed.len(), rs.len());
        assert_eq!(parsed.get(0, "name"), Some(&Value::Text("茶餐廳".to_string())));
    }
}
