// ============================================================
// TABLE CLEANING RULES
// ============================================================
// Pure transformation of a raw record set into rows acceptable
// to the target table. No database access: cleaning problems are
// resolved locally by dropping, coercing or substituting, never
// by raising.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::domain::outcome::CleaningOutcome;
use crate::domain::record::{RecordSet, Value};
use crate::domain::schema::{ColumnRule, EmptyPolicy, TableDescriptor};
use crate::domain::tables;

/// Keep digits, decimal points and a leading minus when stripping
/// currency symbols.
static NON_NUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.\-]").unwrap());

/// Strings that mean "no value" wherever they appear in a cell.
const NULL_SENTINELS: [&str; 4] = ["nan", "NaN", "NULL", "null"];

enum DropReason {
    MissingRequired,
    OutOfRange,
    InvalidPrimaryKey,
}

/// Clean a record set for the given table.
///
/// Generic rules run first (duplicate removal, column-name
/// trimming, required-column drops), then the table's declared
/// column policies. An unknown table gets the generic rules only
/// and a warning, not an error.
pub fn clean_for_table(mut rs: RecordSet, table: &str) -> (RecordSet, CleaningOutcome) {
    let mut outcome = CleaningOutcome {
        rows_in: rs.len(),
        ..Default::default()
    };

    outcome.duplicates_removed = rs.dedup_rows();
    rs.trim_column_names();

    let Some(descriptor) = tables::descriptor(table) else {
        warn!(table, "No specific cleaning rules for table, generic rules only");
        outcome.rows_out = rs.len();
        return (rs, outcome);
    };

    drop_missing_required(&mut rs, descriptor, &mut outcome);
    apply_column_rules(&mut rs, descriptor, &mut outcome);

    outcome.rows_out = rs.len();
    debug!(table, summary = %outcome.summary(), "Cleaning finished");
    (rs, outcome)
}

/// Drop rows with a null/blank value in a required column.
/// Columns whose rule carries a fallback literal are exempt: the
/// substitution in `apply_column_rules` takes precedence over the
/// drop.
fn drop_missing_required(
    rs: &mut RecordSet,
    descriptor: &TableDescriptor,
    outcome: &mut CleaningOutcome,
) {
    let checked: Vec<usize> = descriptor
        .required
        .iter()
        .filter(|name| {
            descriptor
                .spec(name)
                .map_or(true, |spec| spec.rule.fallback().is_none())
        })
        .filter_map(|name| rs.column_index(name))
        .collect();

    if checked.is_empty() {
        return;
    }

    let before = rs.len();
    rs.retain_rows(|row| checked.iter().all(|&idx| !row[idx].is_null_or_blank()));
    outcome.missing_required += before - rs.len();
}

fn apply_column_rules(
    rs: &mut RecordSet,
    descriptor: &TableDescriptor,
    outcome: &mut CleaningOutcome,
) {
    let specs: Vec<(usize, &'static str, &ColumnRule, bool)> = descriptor
        .columns
        .iter()
        .filter_map(|spec| {
            rs.column_index(spec.name)
                .map(|idx| (idx, spec.name, &spec.rule, descriptor.is_required(spec.name)))
        })
        .collect();

    let rows = std::mem::take(rs.rows_mut());
    let mut kept = Vec::with_capacity(rows.len());

    'rows: for mut row in rows {
        for (idx, _, rule, required) in &specs {
            match apply_rule(rule, &row[*idx], *required) {
                Ok(value) => {
                    if value != row[*idx] {
                        outcome.coercions += 1;
                        row[*idx] = value;
                    }
                }
                Err(reason) => {
                    match reason {
                        DropReason::MissingRequired => outcome.missing_required += 1,
                        DropReason::OutOfRange => outcome.out_of_range += 1,
                        DropReason::InvalidPrimaryKey => outcome.invalid_primary_key += 1,
                    }
                    continue 'rows;
                }
            }
        }
        kept.push(row);
    }

    *rs.rows_mut() = kept;
}

fn apply_rule(rule: &ColumnRule, value: &Value, required: bool) -> Result<Value, DropReason> {
    match rule {
        ColumnRule::Numeric {
            strip_symbols,
            min_exclusive,
            max_exclusive,
        } => match to_number(value, *strip_symbols) {
            Some(n) => {
                if min_exclusive.map_or(false, |min| n <= min)
                    || max_exclusive.map_or(false, |max| n >= max)
                {
                    Err(DropReason::OutOfRange)
                } else {
                    Ok(Value::Float(n))
                }
            }
            None => null_result(required),
        },
        ColumnRule::IntRange { min, max } => match to_int(value) {
            Some(i) => {
                if i < *min || i > *max {
                    Err(DropReason::OutOfRange)
                } else {
                    Ok(Value::Int(i))
                }
            }
            None => null_result(required),
        },
        ColumnRule::Integer { null_as_zero } => match to_int(value) {
            Some(i) => Ok(Value::Int(i)),
            None if *null_as_zero => Ok(Value::Int(0)),
            None => null_result(required),
        },
        ColumnRule::Time => match value {
            Value::Time(t) => Ok(Value::Time(*t)),
            other => match clean_text(other)
                .and_then(|s| NaiveTime::parse_from_str(&s, "%H:%M:%S").ok())
            {
                Some(t) => Ok(Value::Time(t)),
                None => null_result(required),
            },
        },
        ColumnRule::Date => match value {
            Value::Date(d) => Ok(Value::Date(*d)),
            Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
            other => match clean_text(other).and_then(|s| parse_date(&s)) {
                Some(d) => Ok(Value::Date(d)),
                None => null_result(required),
            },
        },
        ColumnRule::Timestamp => match value {
            Value::Timestamp(ts) => Ok(Value::Timestamp(*ts)),
            Value::Date(d) => Ok(Value::Timestamp(d.and_hms_opt(0, 0, 0).unwrap_or_default())),
            other => match clean_text(other).and_then(|s| parse_timestamp(&s)) {
                Some(ts) => Ok(Value::Timestamp(ts)),
                None => null_result(required),
            },
        },
        ColumnRule::Text {
            empty,
            max_len,
            fallback,
        } => match clean_text(value) {
            Some(mut s) => {
                if let Some(cap) = max_len {
                    if s.chars().count() > *cap {
                        s = s.chars().take(*cap).collect();
                    }
                }
                Ok(Value::Text(s))
            }
            None => {
                if let Some(literal) = fallback {
                    Ok(Value::Text(literal.to_string()))
                } else {
                    match empty {
                        EmptyPolicy::EmptyString => Ok(Value::Text(String::new())),
                        EmptyPolicy::Null => null_result(required),
                    }
                }
            }
        },
        ColumnRule::Boolean => match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            other => match clean_text(other).map(|s| s.to_uppercase()) {
                Some(s) if s == "TRUE" || s == "1" => Ok(Value::Bool(true)),
                Some(s) if s == "FALSE" || s == "0" => Ok(Value::Bool(false)),
                _ => Ok(Value::Null),
            },
        },
        ColumnRule::PrimaryKey => match to_int(value) {
            Some(i) => Ok(Value::Int(i)),
            None => Err(DropReason::InvalidPrimaryKey),
        },
    }
}

fn null_result(required: bool) -> Result<Value, DropReason> {
    if required {
        Err(DropReason::MissingRequired)
    } else {
        Ok(Value::Null)
    }
}

/// Trimmed text with sentinel strings mapped away. Non-text
/// scalars are rendered as text, matching how raw CSV cells
/// arrive.
fn clean_text(value: &Value) -> Option<String> {
    let rendered;
    let raw = match value {
        Value::Null => return None,
        Value::Text(s) => s.as_str(),
        other => {
            rendered = other.to_csv_field();
            rendered.as_str()
        }
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() || NULL_SENTINELS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn to_number(value: &Value, strip_symbols: bool) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => f.is_finite().then_some(*f),
        other => {
            let mut s = clean_text(other)?;
            if strip_symbols {
                s = NON_NUMERIC.replace_all(&s, "").into_owned();
            }
            s.parse::<f64>().ok().filter(|f| f.is_finite())
        }
    }
}

/// Integer coercion with float truncation, so "4.0" and 4.7 both
/// land on an integer the way the source data uses them.
fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        Value::Float(f) => f.is_finite().then_some(*f as i64),
        other => {
            let s = clean_text(other)?;
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let normalized = s.replace('/', "-");
    NaiveDate::parse_from_str(&normalized, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&normalized, "%d-%m-%Y"))
        .ok()
        .or_else(|| parse_timestamp(&normalized).map(|ts| ts.date()))
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tables::{COMMENTS, COMMENT_RATINGS, LISTINGS};

    fn record_set(columns: &[&str], rows: &[&[&str]]) -> RecordSet {
        let mut rs = RecordSet::new(columns.iter().map(|c| c.to_string()).collect()).unwrap();
        for row in rows {
            let values = row
                .iter()
                .map(|cell| {
                    if cell.is_empty() {
                        Value::Null
                    } else {
                        Value::Text(cell.to_string())
                    }
                })
                .collect();
            rs.push_row(values).unwrap();
        }
        rs
    }

    #[test]
    fn test_currency_symbol_stripped_from_price() {
        let rs = record_set(
            &["restaurant_name", "two_dish_price"],
            &[&["Lucky Kitchen", "$45.00"]],
        );
        let (cleaned, outcome) = clean_for_table(rs, LISTINGS);
        assert_eq!(cleaned.get(0, "two_dish_price"), Some(&Value::Float(45.0)));
        assert_eq!(outcome.rows_out, 1);
        assert!(outcome.coercions >= 1);
    }

    #[test]
    fn test_negative_price_dropped() {
        let rs = record_set(
            &["restaurant_name", "two_dish_price"],
            &[&["Lucky Kitchen", "-5"]],
        );
        let (cleaned, outcome) = clean_for_table(rs, LISTINGS);
        assert!(cleaned.is_empty());
        assert_eq!(outcome.out_of_range, 1);
    }

    #[test]
    fn test_price_upper_bound_exclusive() {
        let rs = record_set(
            &["restaurant_name", "two_dish_price"],
            &[
                &["A", "1000"],
                &["B", "999.5"],
                &["C", "0"],
            ],
        );
        let (cleaned, outcome) = clean_for_table(rs, LISTINGS);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.get(0, "restaurant_name"), Some(&Value::Text("B".into())));
        assert_eq!(outcome.out_of_range, 2);
    }

    #[test]
    fn test_unparseable_required_price_drops_row() {
        let rs = record_set(
            &["restaurant_name", "two_dish_price"],
            &[&["Lucky Kitchen", "cheap"]],
        );
        let (cleaned, outcome) = clean_for_table(rs, LISTINGS);
        assert!(cleaned.is_empty());
        assert_eq!(outcome.missing_required, 1);
    }

    #[test]
    fn test_open_hours_coerced_to_time_or_null() {
        let rs = record_set(
            &[
                "restaurant_name",
                "two_dish_price",
                "openhour_afternoon",
                "closehour_night",
            ],
            &[&["Lucky Kitchen", "45", "11:30:00", "not a time"]],
        );
        let (cleaned, _) = clean_for_table(rs, LISTINGS);
        assert_eq!(
            cleaned.get(0, "openhour_afternoon"),
            Some(&Value::Time(NaiveTime::from_hms_opt(11, 30, 0).unwrap()))
        );
        assert_eq!(cleaned.get(0, "closehour_night"), Some(&Value::Null));
    }

    #[test]
    fn test_rating_out_of_range_dropped() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "comment_rating"],
            &[
                &["A", "good", "1", "7"],
                &["B", "fine", "2", "5"],
            ],
        );
        let (cleaned, outcome) = clean_for_table(rs, COMMENTS);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.get(0, "comment_rating"), Some(&Value::Int(5)));
        assert_eq!(outcome.out_of_range, 1);
    }

    #[test]
    fn test_blank_rating_kept_as_null() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "restaurant_rating"],
            &[&["A", "good", "1", "  "]],
        );
        let (cleaned, _) = clean_for_table(rs, COMMENTS);
        assert_eq!(cleaned.get(0, "restaurant_rating"), Some(&Value::Null));
    }

    #[test]
    fn test_foodie_name_fallback_retains_row() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "foodie_name"],
            &[&["A", "good", "1", "   "]],
        );
        let (cleaned, outcome) = clean_for_table(rs, COMMENTS);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(
            cleaned.get(0, "foodie_name"),
            Some(&Value::Text("Guest".to_string()))
        );
        assert_eq!(outcome.missing_required, 0);
    }

    #[test]
    fn test_missing_required_comment_drops_row() {
        let rs = record_set(
            &["restaurant_name", "comment", "id"],
            &[&["A", "", "1"], &["B", "tasty", "2"]],
        );
        let (cleaned, outcome) = clean_for_table(rs, COMMENTS);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(outcome.missing_required, 1);
    }

    #[test]
    fn test_invalid_primary_key_drops_row() {
        let rs = record_set(
            &["restaurant_name", "comment", "id"],
            &[&["A", "good", "abc"], &["B", "fine", "6"]],
        );
        let (cleaned, outcome) = clean_for_table(rs, COMMENTS);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.get(0, "id"), Some(&Value::Int(6)));
        assert_eq!(outcome.invalid_primary_key, 1);
    }

    #[test]
    fn test_photo_columns_normalize_to_empty_string() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "comment_photo1", "comment_photo2"],
            &[&["A", "good", "1", "nan", "photos/a.jpg"]],
        );
        let (cleaned, _) = clean_for_table(rs, COMMENTS);
        assert_eq!(
            cleaned.get(0, "comment_photo1"),
            Some(&Value::Text(String::new()))
        );
        assert_eq!(
            cleaned.get(0, "comment_photo2"),
            Some(&Value::Text("photos/a.jpg".to_string()))
        );
    }

    #[test]
    fn test_sentinel_strings_become_null() {
        for sentinel in ["nan", "NaN", "NULL", "null", " "] {
            let rs = record_set(
                &["restaurant_name", "comment", "id", "restaurant_rating"],
                &[&["A", "good", "1", sentinel]],
            );
            let (cleaned, _) = clean_for_table(rs, COMMENTS);
            assert_eq!(cleaned.get(0, "restaurant_rating"), Some(&Value::Null));
        }
    }

    #[test]
    fn test_edit_date_slash_normalization() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "edit_date"],
            &[&["A", "good", "1", "2024/03/15"]],
        );
        let (cleaned, _) = clean_for_table(rs, COMMENTS);
        assert_eq!(
            cleaned.get(0, "edit_date"),
            Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()))
        );
    }

    #[test]
    fn test_list_date_timestamp_parsing() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "list_date"],
            &[&["A", "good", "1", "2024-03-15 18:45:00"], &["B", "ok", "2", "garbage"]],
        );
        let (cleaned, _) = clean_for_table(rs, COMMENTS);
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(18, 45, 0)
            .unwrap();
        assert_eq!(cleaned.get(0, "list_date"), Some(&Value::Timestamp(expected)));
        assert_eq!(cleaned.get(1, "list_date"), Some(&Value::Null));
    }

    #[test]
    fn test_boolean_coercion() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "is_published"],
            &[
                &["A", "good", "1", "TRUE"],
                &["B", "ok", "2", "false"],
                &["C", "meh", "3", "0"],
                &["D", "bad", "4", "maybe"],
            ],
        );
        let (cleaned, _) = clean_for_table(rs, COMMENTS);
        assert_eq!(cleaned.get(0, "is_published"), Some(&Value::Bool(true)));
        assert_eq!(cleaned.get(1, "is_published"), Some(&Value::Bool(false)));
        assert_eq!(cleaned.get(2, "is_published"), Some(&Value::Bool(false)));
        assert_eq!(cleaned.get(3, "is_published"), Some(&Value::Null));
    }

    #[test]
    fn test_foodie_name_id_null_becomes_zero() {
        let rs = record_set(
            &["restaurant_name", "comment", "id", "foodie_name_id", "two_dish_rice_id"],
            &[&["A", "good", "1", "", ""]],
        );
        let (cleaned, _) = clean_for_table(rs, COMMENTS);
        assert_eq!(cleaned.get(0, "foodie_name_id"), Some(&Value::Int(0)));
        assert_eq!(cleaned.get(0, "two_dish_rice_id"), Some(&Value::Null));
    }

    #[test]
    fn test_duplicate_rows_removed_first() {
        let rs = record_set(
            &["rating", "comment_id"],
            &[&["4", "1"], &["4", "1"], &["5", "2"]],
        );
        let (cleaned, outcome) = clean_for_table(rs, COMMENT_RATINGS);
        assert_eq!(cleaned.len(), 2);
        assert_eq!(outcome.duplicates_removed, 1);
    }

    #[test]
    fn test_whitespace_column_names_trimmed() {
        let rs = record_set(&[" rating ", "comment_id"], &[&["3", "9"]]);
        let (cleaned, _) = clean_for_table(rs, COMMENT_RATINGS);
        assert_eq!(cleaned.get(0, "rating"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_unknown_table_gets_generic_rules_only() {
        let rs = record_set(&["x"], &[&["a"], &["a"], &["b"]]);
        let (cleaned, outcome) = clean_for_table(rs, "mystery_table");
        assert_eq!(cleaned.len(), 2);
        assert_eq!(outcome.duplicates_removed, 1);
        // Values untouched by any policy.
        assert_eq!(cleaned.get(0, "x"), Some(&Value::Text("a".to_string())));
    }

    #[test]
    fn test_length_cap_truncates_instead_of_dropping() {
        let rule = ColumnRule::Text {
            empty: EmptyPolicy::Null,
            max_len: Some(5),
            fallback: None,
        };
        let result = apply_rule(&rule, &Value::Text("truncate me".into()), false);
        assert!(matches!(result, Ok(Value::Text(ref s)) if s == "trunc"));
    }

    #[test]
    fn test_no_nan_survives_cleaning() {
        let rs = record_set(
            &["rater_name", "rating", "comment_id"],
            &[&["nan", "4", "2"]],
        );
        let (cleaned, _) = clean_for_table(rs, COMMENT_RATINGS);
        assert_eq!(cleaned.get(0, "rater_name"), Some(&Value::Null));
    }
}
