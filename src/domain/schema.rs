// ============================================================
// TABLE SCHEMA
// ============================================================
// Declarative per-column cleaning policies. Rules are data, not
// code: the cleaning engine interprets them, which keeps each
// policy testable in isolation.

/// What a null-like text value becomes after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPolicy {
    /// Free-text columns: sentinel strings become SQL NULL.
    Null,
    /// Photo-path style columns stored under a NOT NULL
    /// constraint: sentinel strings become an empty string.
    EmptyString,
}

/// A single column-cleaning policy.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnRule {
    /// Parse as a float. Unparseable values become null; a null in
    /// a required column drops the row. Values outside the open
    /// range (min, max) drop the row.
    Numeric {
        /// Strip everything that is not a digit or a decimal point
        /// before parsing (currency symbols, thousands separators).
        strip_symbols: bool,
        min_exclusive: Option<f64>,
        max_exclusive: Option<f64>,
    },
    /// Parse as an integer and enforce an inclusive range. Rows
    /// whose coerced value falls outside the range are dropped;
    /// nulls are kept unless the column is required.
    IntRange { min: i64, max: i64 },
    /// Foreign-key style integer coercion. Unparseable values
    /// become null, or the literal 0 when `null_as_zero` is set.
    Integer { null_as_zero: bool },
    /// Expect `HH:MM:SS`; anything else becomes null.
    Time,
    /// Flexible date parsing, normalizing `/` separators to `-`
    /// first. Unparseable values become null.
    Date,
    /// Flexible timestamp parsing. Unparseable values become null.
    Timestamp,
    /// Trim, map sentinel strings per policy, optionally cap the
    /// length and substitute a literal fallback for null.
    Text {
        empty: EmptyPolicy,
        max_len: Option<usize>,
        fallback: Option<&'static str>,
    },
    /// Case-insensitive TRUE/1 and FALSE/0; anything else null.
    Boolean,
    /// Integer primary key: rows with an unparseable id are
    /// dropped regardless of the required-column list.
    PrimaryKey,
}

impl ColumnRule {
    pub fn text(empty: EmptyPolicy) -> Self {
        ColumnRule::Text {
            empty,
            max_len: None,
            fallback: None,
        }
    }

    pub fn fallback(&self) -> Option<&'static str> {
        match self {
            ColumnRule::Text { fallback, .. } => *fallback,
            _ => None,
        }
    }
}

/// A column and its cleaning policy.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub rule: ColumnRule,
}

impl ColumnSpec {
    pub fn new(name: &'static str, rule: ColumnRule) -> Self {
        Self { name, rule }
    }
}

/// Cleaning and import metadata for one database table.
#[derive(Debug, Clone)]
pub struct TableDescriptor {
    pub name: &'static str,
    pub columns: Vec<ColumnSpec>,
    /// Rows with a null/blank value in any of these columns are
    /// dropped, except columns whose rule carries a fallback.
    pub required: &'static [&'static str],
    /// Primary key assigned by the database: incoming `id` values
    /// are stripped before insert.
    pub generated_pk: bool,
}

impl TableDescriptor {
    pub fn spec(&self, column: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == column)
    }

    pub fn is_required(&self, column: &str) -> bool {
        self.required.contains(&column)
    }
}

/// A set of related tables with a referential-integrity ordering.
#[derive(Debug, Clone)]
pub struct TableGroup {
    pub name: &'static str,
    /// Referenced table first; used for import and export.
    pub import_order: &'static [&'static str],
}

impl TableGroup {
    /// Referencing table first, so deletes never violate foreign
    /// keys.
    pub fn erase_order(&self) -> Vec<&'static str> {
        let mut order: Vec<_> = self.import_order.to_vec();
        order.reverse();
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erase_order_is_reversed_import_order() {
        let group = TableGroup {
            name: "g",
            import_order: &["parent", "child"],
        };
        assert_eq!(group.erase_order(), vec!["child", "parent"]);
    }

    #[test]
    fn test_fallback_only_on_text_rules() {
        let with = ColumnRule::Text {
            empty: EmptyPolicy::Null,
            max_len: None,
            fallback: Some("Guest"),
        };
        assert_eq!(with.fallback(), Some("Guest"));
        assert_eq!(ColumnRule::Boolean.fallback(), None);
    }
}
