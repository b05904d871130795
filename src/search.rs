//! # Search Queries
//!
//! Builds the store query for the public search page.
//!
//! ## Semantics
//! - Surname and given name are case-insensitive substring matches
//! - Birth year and death year are exact matches
//! - Filters combine with AND; an omitted or blank filter adds nothing,
//!   so leaving everything blank returns the whole table
//! - Results always sort ascending by surname
//! - No pagination, the full result set comes back in one response
use serde::Deserialize;

use crate::records::SEARCH_PROJECTION;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    pub birth_year: Option<String>,
    pub death_year: Option<String>,
}

impl SearchFilters {
    /// Query parameters in the store's filter syntax: the fixed projection
    /// and ordering, then one parameter per present filter.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("select".to_string(), SEARCH_PROJECTION.join(",")),
            ("order".to_string(), "last_name.asc".to_string()),
        ];

        if let Some(last_name) = present(&self.last_name) {
            params.push(("last_name".to_string(), format!("ilike.*{last_name}*")));
        }
        if let Some(first_name) = present(&self.first_name) {
            params.push(("first_name".to_string(), format!("ilike.*{first_name}*")));
        }
        if let Some(birth_year) = present(&self.birth_year) {
            params.push(("birth_year".to_string(), format!("eq.{birth_year}")));
        }
        if let Some(death_year) = present(&self.death_year) {
            params.push(("death_year".to_string(), format!("eq.{death_year}")));
        }

        params
    }
}

/// Blank form inputs arrive as empty strings and must behave like omissions.
fn present(filter: &Option<String>) -> Option<&str> {
    filter
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}
