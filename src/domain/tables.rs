// ============================================================
// TABLE REGISTRY
// ============================================================
// The fixed set of tables this toolkit touches. Table names are
// interpolated into SQL from this list only; user input never is.

use once_cell::sync::Lazy;

use crate::domain::schema::{ColumnRule, ColumnSpec, EmptyPolicy, TableDescriptor, TableGroup};

pub const LISTINGS: &str = "listings_two_dish_rice";
pub const ADMIN_USERS: &str = "adminusers_adminuser";
pub const COMMENTS: &str = "comments_comment_rate";
pub const COMMENT_RATINGS: &str = "comments_commentrating";

/// Group identifier covering both comment tables.
pub const COMMENTS_GROUP: &str = "comments_data";

static TABLES: Lazy<Vec<TableDescriptor>> = Lazy::new(|| {
    vec![
        listings_descriptor(),
        admin_users_descriptor(),
        comments_descriptor(),
        comment_ratings_descriptor(),
    ]
});

static GROUPS: Lazy<Vec<TableGroup>> = Lazy::new(|| {
    vec![TableGroup {
        name: COMMENTS_GROUP,
        // comments_commentrating.comment_id references
        // comments_comment_rate.id, so the parent imports first.
        import_order: &[COMMENTS, COMMENT_RATINGS],
    }]
});

pub fn descriptor(table: &str) -> Option<&'static TableDescriptor> {
    TABLES.iter().find(|t| t.name == table)
}

pub fn group(name: &str) -> Option<&'static TableGroup> {
    GROUPS.iter().find(|g| g.name == name)
}

pub fn known_tables() -> Vec<&'static str> {
    TABLES.iter().map(|t| t.name).collect()
}

fn listings_descriptor() -> TableDescriptor {
    let mut columns = vec![
        ColumnSpec::new(
            "two_dish_price",
            ColumnRule::Numeric {
                strip_symbols: true,
                min_exclusive: Some(0.0),
                max_exclusive: Some(1000.0),
            },
        ),
        ColumnSpec::new("restaurant_name", ColumnRule::text(EmptyPolicy::Null)),
    ];
    for col in [
        "openhour_afternoon",
        "openhour_night",
        "openhour_fullday",
        "openhour_nightsnack",
        "closehour_afternoon",
        "closehour_night",
        "closehour_fullday",
        "closehour_nightsnack",
    ] {
        columns.push(ColumnSpec::new(col, ColumnRule::Time));
    }
    TableDescriptor {
        name: LISTINGS,
        columns,
        required: &["restaurant_name", "two_dish_price"],
        generated_pk: false,
    }
}

fn admin_users_descriptor() -> TableDescriptor {
    TableDescriptor {
        name: ADMIN_USERS,
        columns: vec![
            ColumnSpec::new("admin_name", ColumnRule::text(EmptyPolicy::Null)),
            ColumnSpec::new("admin_desc", ColumnRule::text(EmptyPolicy::Null)),
            ColumnSpec::new("admin_email", ColumnRule::text(EmptyPolicy::Null)),
            ColumnSpec::new("admin_photo", ColumnRule::text(EmptyPolicy::EmptyString)),
        ],
        required: &["admin_name", "admin_email"],
        generated_pk: true,
    }
}

fn comments_descriptor() -> TableDescriptor {
    let mut columns = vec![
        ColumnSpec::new("id", ColumnRule::PrimaryKey),
        ColumnSpec::new("restaurant_name", ColumnRule::text(EmptyPolicy::Null)),
        ColumnSpec::new(
            "foodie_name",
            ColumnRule::Text {
                empty: EmptyPolicy::Null,
                max_len: None,
                fallback: Some("Guest"),
            },
        ),
        ColumnSpec::new("comment", ColumnRule::text(EmptyPolicy::Null)),
    ];
    for col in [
        "comment_photo1",
        "comment_photo2",
        "comment_photo3",
        "comment_photo4",
        "comment_photo5",
        "comment_photo6",
    ] {
        columns.push(ColumnSpec::new(col, ColumnRule::text(EmptyPolicy::EmptyString)));
    }
    columns.extend([
        ColumnSpec::new("list_date", ColumnRule::Timestamp),
        ColumnSpec::new("edit_date", ColumnRule::Date),
        ColumnSpec::new("is_published", ColumnRule::Boolean),
        ColumnSpec::new("restaurant_rating", ColumnRule::IntRange { min: 1, max: 5 }),
        ColumnSpec::new("comment_rating", ColumnRule::IntRange { min: 1, max: 5 }),
        ColumnSpec::new("two_dish_rice_id", ColumnRule::Integer { null_as_zero: false }),
        ColumnSpec::new("foodie_name_id", ColumnRule::Integer { null_as_zero: true }),
    ]);
    TableDescriptor {
        name: COMMENTS,
        columns,
        // foodie_name is nominally required but its fallback
        // substitution takes precedence over the drop rule.
        required: &["restaurant_name", "comment", "foodie_name"],
        generated_pk: false,
    }
}

fn comment_ratings_descriptor() -> TableDescriptor {
    TableDescriptor {
        name: COMMENT_RATINGS,
        columns: vec![
            ColumnSpec::new("rater_name", ColumnRule::text(EmptyPolicy::Null)),
            ColumnSpec::new("created_date", ColumnRule::Timestamp),
            ColumnSpec::new("rater_id", ColumnRule::Integer { null_as_zero: false }),
            ColumnSpec::new("rating", ColumnRule::IntRange { min: 1, max: 5 }),
            ColumnSpec::new("comment_id", ColumnRule::Integer { null_as_zero: false }),
        ],
        required: &["rating", "comment_id"],
        generated_pk: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tables_registered() {
        assert_eq!(
            known_tables(),
            vec![LISTINGS, ADMIN_USERS, COMMENTS, COMMENT_RATINGS]
        );
        assert!(descriptor("unknown_table").is_none());
    }

    #[test]
    fn test_comments_group_ordering() {
        let group = group(COMMENTS_GROUP).unwrap();
        assert_eq!(group.import_order, &[COMMENTS, COMMENT_RATINGS]);
        assert_eq!(group.erase_order(), vec![COMMENT_RATINGS, COMMENTS]);
    }

    #[test]
    fn test_admin_users_pk_is_generated() {
        assert!(descriptor(ADMIN_USERS).unwrap().generated_pk);
        assert!(!descriptor(COMMENTS).unwrap().generated_pk);
    }

    #[test]
    fn test_foodie_name_has_fallback() {
        let desc = descriptor(COMMENTS).unwrap();
        let spec = desc.spec("foodie_name").unwrap();
        assert_eq!(spec.rule.fallback(), Some("Guest"));
        assert!(desc.is_required("foodie_name"));
    }
}
