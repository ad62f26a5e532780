// ============================================================
// CSV READER
// ============================================================
// Load a CSV file into a RecordSet. All cells arrive as text;
// empty cells become explicit nulls. Typing happens later in the
// cleaning stage.

use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::debug;

use crate::domain::error::{AppError, Result};
use crate::domain::record::{RecordSet, Value};

/// Read a CSV file from disk.
///
/// Fails with `SourceNotFound` when the path is absent and
/// `SourceEmpty` when the file holds a header but no rows.
pub fn read_records(path: &Path) -> Result<RecordSet> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AppError::SourceNotFound(path.display().to_string())
        } else {
            AppError::IoError(format!("Failed to read '{}': {}", path.display(), e))
        }
    })?;

    if bytes.is_empty() {
        return Err(AppError::SourceEmpty(path.display().to_string()));
    }

    // Tolerates a UTF-8 BOM and replaces invalid sequences rather
    // than refusing the file.
    let (content, _, had_errors) = encoding_rs::UTF_8.decode(&bytes);
    if had_errors {
        debug!(path = %path.display(), "Input contained invalid UTF-8, decoded lossily");
    }

    let rs = parse_content(&content)?;
    if rs.is_empty() {
        return Err(AppError::SourceEmpty(path.display().to_string()));
    }
    Ok(rs)
}

/// Parse CSV content from a string.
pub fn parse_content(content: &str) -> Result<RecordSet> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true) // Allow rows with different lengths
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
        .clone();

    let mut rs = RecordSet::new(headers.iter().map(|h| h.to_string()).collect())?;
    let width = headers.len();

    for (index, result) in reader.records().enumerate() {
        let record = result
            .map_err(|e| AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e)))?;

        let row = (0..width)
            .map(|i| match record.get(i) {
                None | Some("") => Value::Null,
                Some(cell) => Value::Text(cell.to_string()),
            })
            .collect();
        rs.push_row(row)?;
    }

    Ok(rs)
}
