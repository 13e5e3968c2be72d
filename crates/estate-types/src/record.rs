//! The `Record` abstraction every domain item implements.
//!
//! Views never reach into records by string key directly: the filter,
//! sort and stats code asks a record for a named field through
//! [`Record::field`], which returns `None` for names outside the record's
//! schema and [`FieldValue::Missing`] for a known field with no value.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{EstateError, Result};

/// Borrowed view of a single record field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Time(DateTime<Utc>),
    Bool(bool),
    Missing,
}

impl<'a> FieldValue<'a> {
    /// Exact match against a criteria value as it arrives from a query map
    pub fn matches(&self, expected: &str) -> bool {
        match self {
            FieldValue::Text(text) => *text == expected,
            FieldValue::Number(n) => expected.trim().parse::<f64>().is_ok_and(|e| e == *n),
            FieldValue::Bool(b) => expected.parse::<bool>().is_ok_and(|e| e == *b),
            FieldValue::Time(t) => DateTime::parse_from_rfc3339(expected)
                .is_ok_and(|e| e.with_timezone(&Utc) == *t),
            FieldValue::Missing => false,
        }
    }

    /// Numeric view used by range filters; timestamps map to epoch millis
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Time(t) => Some(t.timestamp_millis() as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&'a str> {
        match self {
            FieldValue::Text(text) => Some(*text),
            _ => None,
        }
    }

    /// Total order used by sorting: missing values always compare last
    pub fn compare(&self, other: &FieldValue<'_>) -> Ordering {
        match (self, other) {
            (FieldValue::Missing, FieldValue::Missing) => Ordering::Equal,
            (FieldValue::Missing, _) => Ordering::Greater,
            (_, FieldValue::Missing) => Ordering::Less,
            (FieldValue::Text(a), FieldValue::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (FieldValue::Bool(a), FieldValue::Bool(b)) => a.cmp(b),
            (a, b) => match (a.as_number(), b.as_number()) {
                (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            },
        }
    }
}

/// A domain item stored in a collection
pub trait Record: Clone {
    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;

    /// Schema-aware field lookup using the REST field names (camelCase)
    fn field(&self, name: &str) -> Option<FieldValue<'_>>;

    /// Whitelist of text fields the free-text search looks at
    fn search_fields(&self) -> &'static [&'static str];

    /// Allowed wire values for enum-typed fields, used to reject bad filters
    fn enum_values(_field: &str) -> Option<&'static [&'static str]>
    where
        Self: Sized,
    {
        None
    }
}

/// A record type that lives under its own REST collection
pub trait Resource: Record + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection segment under `/api`, e.g. `leads`
    const PATH: &'static str;

    /// Human name used in errors and logs
    const NAME: &'static str;
}

/// Checks the collection invariant that ids are unique within one cache key
pub fn validate_unique_ids<R: Record>(records: &[R]) -> Result<()> {
    let mut seen = HashSet::with_capacity(records.len());
    for record in records {
        if !seen.insert(record.id()) {
            return Err(EstateError::Validation(format!(
                "duplicate record id {:?} in collection",
                record.id()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_matches_by_value_kind() {
        assert!(FieldValue::Text("new").matches("new"));
        assert!(!FieldValue::Text("new").matches("New"));
        assert!(FieldValue::Number(3.0).matches("3"));
        assert!(FieldValue::Bool(false).matches("false"));
        assert!(!FieldValue::Missing.matches(""));

        let t = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert!(FieldValue::Time(t).matches("2024-05-01T10:00:00Z"));
    }

    #[test]
    fn test_missing_sorts_last() {
        assert_eq!(FieldValue::Missing.compare(&FieldValue::Number(1.0)), Ordering::Greater);
        assert_eq!(FieldValue::Number(1.0).compare(&FieldValue::Missing), Ordering::Less);
        assert_eq!(
            FieldValue::Text("alice").compare(&FieldValue::Text("Bob")),
            Ordering::Less
        );
    }

    proptest! {
        #[test]
        fn prop_compare_is_antisymmetric(
            a in prop::option::of(-1e6f64..1e6),
            b in prop::option::of(-1e6f64..1e6)
        ) {
            let to_field = |v: Option<f64>| v.map_or(FieldValue::Missing, FieldValue::Number);
            let (a, b) = (to_field(a), to_field(b));
            prop_assert_eq!(a.compare(&b), b.compare(&a).reverse());
        }
    }
}
