//! Raw query-string access.
//!
//! Browsers and scripts may repeat a key (`?type=1&type=2`); the last value
//! wins, the way a form-driven page expects. Decoding into the raw pairs
//! never fails, so a messy query string can only drop a filter, never turn
//! the request into an error.

use crate::core::filter::RawFilter;

/// Decoded `key=value` pairs in the order they appeared.
#[derive(Debug, Clone, Default)]
pub struct QueryPairs(Vec<(String, String)>);

impl From<Vec<(String, String)>> for QueryPairs {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self(pairs)
    }
}

impl QueryPairs {
    /// The last value given for `key`, if any.
    #[must_use]
    pub fn last(&self, key: &str) -> Option<String> {
        self.0
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// The ledger filter fields of the list page.
    #[must_use]
    pub fn raw_filter(&self) -> RawFilter {
        RawFilter {
            date_from: self.last("date_from"),
            date_to: self.last("date_to"),
            status: self.last("status"),
            type_id: self.last("type"),
            category: self.last("category"),
            subcategory: self.last("subcategory"),
        }
    }
}
