//! Filter/search engine over fetched collections.
//!
//! All active constraints are combined with AND. Equality values of `"all"`
//! or `""` mean "no constraint", field names the record does not know are
//! ignored, and the free-text query is matched case-insensitively against
//! the record's search whitelist. Filtering keeps the input order; only an
//! explicit sort reorders.

use std::collections::BTreeMap;

use estate_types::{EstateError, FieldValue, Record, Result};
use serde::{Deserialize, Serialize};

/// Criteria value meaning "no constraint on this field"
pub const ALL: &str = "all";

/// Query-param key carrying the free-text search
pub const SEARCH_PARAM: &str = "q";

/// Query-param key carrying the sort (`field` or `-field`)
pub const SORT_PARAM: &str = "sort";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

/// Inclusive numeric range; a missing bound is open
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(default)]
    pub equals: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(default)]
    pub ranges: BTreeMap<String, NumericRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortSpec>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_eq(mut self, field: &str, value: &str) -> Self {
        self.equals.insert(field.to_string(), value.to_string());
        self
    }

    pub fn with_search(mut self, query: &str) -> Self {
        self.search = Some(query.to_string());
        self
    }

    pub fn with_range(mut self, field: &str, min: Option<f64>, max: Option<f64>) -> Self {
        self.ranges.insert(field.to_string(), NumericRange::new(min, max));
        self
    }

    pub fn sorted_by(mut self, field: &str, direction: SortDirection) -> Self {
        self.sort = Some(SortSpec {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Equality constraints that actually constrain something
    pub fn active_equals(&self) -> impl Iterator<Item = (&str, &str)> {
        self.equals
            .iter()
            .filter(|(_, value)| !value.is_empty() && value.as_str() != ALL)
            .map(|(field, value)| (field.as_str(), value.as_str()))
    }

    /// Lower-cased search query, if one is set and non-blank
    pub fn search_query(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }

    fn active_ranges(&self) -> impl Iterator<Item = (&str, &NumericRange)> {
        self.ranges
            .iter()
            .filter(|(_, range)| !range.is_unbounded())
            .map(|(field, range)| (field.as_str(), range))
    }

    /// True when no constraint is active (the filter is the identity)
    pub fn is_unconstrained(&self) -> bool {
        self.active_equals().next().is_none()
            && self.search_query().is_none()
            && self.active_ranges().next().is_none()
    }

    /// Rejects malformed input before it is applied or dispatched
    pub fn validate<R: Record>(&self) -> Result<()> {
        for (field, value) in self.active_equals() {
            if let Some(allowed) = R::enum_values(field) {
                if !allowed.contains(&value) {
                    return Err(EstateError::Validation(format!(
                        "{:?} is not a valid value for {} (expected one of {})",
                        value,
                        field,
                        allowed.join(", ")
                    )));
                }
            }
        }

        for (field, range) in self.active_ranges() {
            if range.min.is_some_and(f64::is_nan) || range.max.is_some_and(f64::is_nan) {
                return Err(EstateError::Validation(format!(
                    "range bound for {} is not a number",
                    field
                )));
            }
            if let (Some(min), Some(max)) = (range.min, range.max) {
                if min > max {
                    return Err(EstateError::Validation(format!(
                        "range for {} has min {} above max {}",
                        field, min, max
                    )));
                }
            }
        }

        Ok(())
    }

    /// Does one record satisfy every active constraint?
    pub fn matches<R: Record>(&self, record: &R) -> bool {
        for (field, expected) in self.active_equals() {
            if let Some(value) = record.field(field) {
                if !value.matches(expected) {
                    return false;
                }
            }
        }

        if let Some(query) = self.search_query() {
            let hit = record.search_fields().iter().any(|name| {
                record
                    .field(name)
                    .and_then(|v| v.as_text())
                    .is_some_and(|text| text.to_lowercase().contains(&query))
            });
            if !hit {
                return false;
            }
        }

        for (field, range) in self.active_ranges() {
            if let Some(value) = record.field(field) {
                match value.as_number() {
                    Some(n) if range.contains(n) => {}
                    _ => return false,
                }
            }
        }

        true
    }

    /// Parses the plain key/value map used for REST query params and URL state
    pub fn from_params<'a, I>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut criteria = FilterCriteria::new();
        for (key, value) in params {
            if key == SEARCH_PARAM || key == "search" {
                criteria.search = Some(value.to_string());
            } else if key == SORT_PARAM {
                criteria.sort = parse_sort(value);
            } else if let Some(field) = key.strip_prefix("min_") {
                let bound = parse_bound(key, value)?;
                criteria.ranges.entry(field.to_string()).or_default().min = bound;
            } else if let Some(field) = key.strip_prefix("max_") {
                let bound = parse_bound(key, value)?;
                criteria.ranges.entry(field.to_string()).or_default().max = bound;
            } else {
                criteria.equals.insert(key.to_string(), value.to_string());
            }
        }
        Ok(criteria)
    }

    /// Query params for the REST collaborator; unconstrained keys are omitted
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .active_equals()
            .map(|(field, value)| (field.to_string(), value.to_string()))
            .collect();

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params.push((SEARCH_PARAM.to_string(), search.to_string()));
        }

        for (field, range) in self.active_ranges() {
            if let Some(min) = range.min {
                params.push((format!("min_{}", field), min.to_string()));
            }
            if let Some(max) = range.max {
                params.push((format!("max_{}", field), max.to_string()));
            }
        }

        if let Some(sort) = &self.sort {
            let value = match sort.direction {
                SortDirection::Asc => sort.field.clone(),
                SortDirection::Desc => format!("-{}", sort.field),
            };
            params.push((SORT_PARAM.to_string(), value));
        }

        params
    }
}

fn parse_sort(value: &str) -> Option<SortSpec> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    Some(match value.strip_prefix('-') {
        Some(field) => SortSpec {
            field: field.to_string(),
            direction: SortDirection::Desc,
        },
        None => SortSpec {
            field: value.to_string(),
            direction: SortDirection::Asc,
        },
    })
}

fn parse_bound(key: &str, value: &str) -> Result<Option<f64>> {
    let value = value.trim();
    if value.is_empty() || value == ALL {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(Some)
        .map_err(|_| EstateError::Validation(format!("{} must be a number, got {:?}", key, value)))
}

/// Filtered subset of `records`, preserving input order
pub fn filter<R: Record>(records: &[R], criteria: &FilterCriteria) -> Vec<R> {
    records
        .iter()
        .filter(|record| criteria.matches(*record))
        .cloned()
        .collect()
}

/// Filter, then apply the criteria's sort if it has one
pub fn apply<R: Record>(records: &[R], criteria: &FilterCriteria) -> Vec<R> {
    let mut result = filter(records, criteria);
    if let Some(sort) = &criteria.sort {
        sort_records(&mut result, sort);
    }
    result
}

/// Stable sort by one field; records without the field stay at the end in
/// both directions
pub fn sort_records<R: Record>(records: &mut [R], sort: &SortSpec) {
    records.sort_by(|a, b| {
        let left = a.field(&sort.field).unwrap_or(FieldValue::Missing);
        let right = b.field(&sort.field).unwrap_or(FieldValue::Missing);
        match (&left, &right) {
            (FieldValue::Missing, _) | (_, FieldValue::Missing) => left.compare(&right),
            _ => match sort.direction {
                SortDirection::Asc => left.compare(&right),
                SortDirection::Desc => right.compare(&left),
            },
        }
    });
}
