//! # Cemetery Records
//!
//! Canonical record schema plus the update-payload logic.
//!
//! ## Schema
//! - Table: `cemetery_records`
//! - Key: `memorial_id` (**int**), assigned by the store, never updatable
//! - Names/title: `last_name`, `maiden_name`, `first_name`, `middle_name`, `title` (**string**)
//! - Dates: `birth_date`, `death_date` (**string**), `birth_year`, `death_year` (**int**)
//! - `age` (**string**, entries like "3 mo." exist so this is not numeric)
//! - `is_veteran` (**bool**)
//! - Plot: `section`, `lot`, `moved_from`, `moved_to` (**string**)
//! - `notes` (**string**)
//!
//! Everything but the key is nullable. The search projection is the public
//! display set and omits the key; read-by-identifier selects all columns.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TABLE: &str = "cemetery_records";
pub const ID_COLUMN: &str = "memorial_id";

/// Fields shown on the public search page, in render order.
pub const SEARCH_PROJECTION: &[&str] = &[
    "last_name",
    "maiden_name",
    "first_name",
    "middle_name",
    "title",
    "birth_date",
    "death_date",
    "age",
    "is_veteran",
    "section",
    "lot",
    "moved_from",
    "moved_to",
    "notes",
];

/// Columns an update may touch. The key is deliberately absent.
pub const UPDATABLE_COLUMNS: &[&str] = &[
    "last_name",
    "maiden_name",
    "first_name",
    "middle_name",
    "title",
    "birth_date",
    "death_date",
    "birth_year",
    "death_year",
    "age",
    "is_veteran",
    "section",
    "lot",
    "moved_from",
    "moved_to",
    "notes",
];

const INT_COLUMNS: &[&str] = &["birth_year", "death_year"];
const BOOL_COLUMNS: &[&str] = &["is_veteran"];

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Record {
    pub memorial_id: Option<i64>,
    pub last_name: Option<String>,
    pub maiden_name: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub title: Option<String>,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub birth_year: Option<i64>,
    pub death_year: Option<i64>,
    pub age: Option<String>,
    pub is_veteran: Option<bool>,
    pub section: Option<String>,
    pub lot: Option<String>,
    pub moved_from: Option<String>,
    pub moved_to: Option<String>,
    pub notes: Option<String>,
}

/// Turns a submitted form map into the partial-update body sent to the store.
///
/// Identifier keys are stripped so the key can never be reassigned, unknown
/// keys are dropped, typed columns are coerced, and empty inputs become null
/// so a cleared form field clears the column.
pub fn prepare_update(fields: &[(String, String)]) -> Map<String, Value> {
    let mut body = Map::new();

    for (key, value) in fields {
        if key == ID_COLUMN || key == "memorialID" {
            continue;
        }

        if !UPDATABLE_COLUMNS.contains(&key.as_str()) {
            continue;
        }

        body.insert(key.clone(), coerce(key, value.trim()));
    }

    body
}

fn coerce(column: &str, value: &str) -> Value {
    if value.is_empty() {
        return Value::Null;
    }

    if INT_COLUMNS.contains(&column) {
        return match value.parse::<i64>() {
            Ok(n) => Value::from(n),
            Err(_) => Value::Null,
        };
    }

    if BOOL_COLUMNS.contains(&column) {
        return Value::Bool(matches!(value, "true" | "on" | "1" | "yes"));
    }

    Value::String(value.to_string())
}
