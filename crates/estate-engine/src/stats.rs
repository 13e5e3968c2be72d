// Dashboard stat cards: per-value counts and numeric summaries
use std::collections::BTreeMap;

use estate_types::{FieldValue, Record};
use serde::{Deserialize, Serialize};

/// Count of records per value of `field`. Records without a value are
/// skipped; an unknown field yields an empty map.
pub fn count_by<R: Record>(records: &[R], field: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let key = match record.field(field) {
            Some(FieldValue::Text(text)) => text.to_string(),
            Some(FieldValue::Number(n)) => n.to_string(),
            Some(FieldValue::Bool(b)) => b.to_string(),
            Some(FieldValue::Time(t)) => t.to_rfc3339(),
            Some(FieldValue::Missing) | None => continue,
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NumericSummary {
    pub count: usize,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Summary of a numeric field, `None` when no record carries a value
pub fn numeric_summary<R: Record>(records: &[R], field: &str) -> Option<NumericSummary> {
    let values: Vec<f64> = records
        .iter()
        .filter_map(|r| r.field(field).and_then(|v| v.as_number()))
        .filter(|v| v.is_finite())
        .collect();
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(NumericSummary {
        count: values.len(),
        sum,
        min: values.iter().copied().fold(f64::INFINITY, f64::min),
        max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        mean: sum / values.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use estate_types::{Property, PropertyStatus, PropertyType};

    fn property(id: &str, status: PropertyStatus, price: f64) -> Property {
        Property {
            id: id.to_string(),
            title: format!("Listing {}", id),
            address: "1 Main St".to_string(),
            city: "Pune".to_string(),
            property_type: PropertyType::Apartment,
            status,
            price,
            bedrooms: None,
            area_sqft: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_count_by_status() {
        let listings = vec![
            property("1", PropertyStatus::Available, 100.0),
            property("2", PropertyStatus::Sold, 200.0),
            property("3", PropertyStatus::Available, 300.0),
        ];
        let counts = count_by(&listings, "status");
        assert_eq!(counts.get("available"), Some(&2));
        assert_eq!(counts.get("sold"), Some(&1));
        assert!(count_by(&listings, "nonsense").is_empty());
        assert!(count_by(&listings, "bedrooms").is_empty());
    }

    #[test]
    fn test_numeric_summary() {
        let listings = vec![
            property("1", PropertyStatus::Available, 100.0),
            property("2", PropertyStatus::Sold, 300.0),
        ];
        let summary = numeric_summary(&listings, "price").unwrap();
        assert_eq!(summary.count, 2);
        assert_eq!(summary.min, 100.0);
        assert_eq!(summary.max, 300.0);
        assert_eq!(summary.mean, 200.0);
        assert!(numeric_summary(&listings, "areaSqft").is_none());
    }
}
