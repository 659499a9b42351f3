//! Record transforms applied between a source and a sink
//!
//! Three optional steps run in a fixed order on each record:
//! 1. key normalization (`VendorID` → `vendor_id`)
//! 2. a derived `YYYY-MM-DD` date column from a datetime column
//! 3. dropping records whose listed fields are not strictly positive

use crate::types::{JsonValue, Record};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Derive a date column from a datetime column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeriveDate {
    /// Column holding the datetime (after key normalization)
    pub from: String,
    /// Column receiving the date
    pub to: String,
}

/// Transform configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Replace `ID` with `_id` in keys, then lowercase them
    pub normalize_keys: bool,
    /// Optional derived date column
    pub derive_date: Option<DeriveDate>,
    /// Fields that must hold a number greater than zero
    pub require_positive: Vec<String>,
}

impl TransformConfig {
    /// True when no step is configured
    pub fn is_noop(&self) -> bool {
        !self.normalize_keys && self.derive_date.is_none() && self.require_positive.is_empty()
    }
}

/// Applies a [`TransformConfig`] to batches of records
#[derive(Debug, Clone, Default)]
pub struct RecordTransform {
    config: TransformConfig,
}

impl RecordTransform {
    /// Create a transform from its configuration
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    /// Transform a batch in place, returning how many records were dropped
    pub fn apply(&self, records: &mut Vec<Record>) -> usize {
        if self.config.is_noop() {
            return 0;
        }

        let before = records.len();
        let transformed: Vec<Record> = records
            .drain(..)
            .filter_map(|record| self.apply_one(record))
            .collect();
        *records = transformed;
        before - records.len()
    }

    /// Transform one record; `None` means it was filtered out
    pub fn apply_one(&self, record: Record) -> Option<Record> {
        let mut record = if self.config.normalize_keys {
            record
                .into_iter()
                .map(|(key, value)| (normalize_key(&key), value))
                .collect()
        } else {
            record
        };

        if let Some(derive) = &self.config.derive_date {
            if let Some(date) = record.get(&derive.from).and_then(parse_date) {
                record.insert(
                    derive.to.clone(),
                    JsonValue::String(date.format("%Y-%m-%d").to_string()),
                );
            }
        }

        let keep = self.config.require_positive.iter().all(|field| {
            record
                .get(field)
                .and_then(JsonValue::as_f64)
                .is_some_and(|v| v > 0.0)
        });

        keep.then_some(record)
    }
}

/// `VendorID` → `vendor_id`, `PULocationID` → `pulocation_id`
pub fn normalize_key(key: &str) -> String {
    key.replace("ID", "_id").to_lowercase()
}

/// Parse the date part of a datetime-ish JSON string
fn parse_date(value: &JsonValue) -> Option<NaiveDate> {
    let text = value.as_str()?.trim();

    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use test_case::test_case;

    fn record(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn taxi_transform() -> RecordTransform {
        RecordTransform::new(TransformConfig {
            normalize_keys: true,
            derive_date: Some(DeriveDate {
                from: "lpep_pickup_datetime".to_string(),
                to: "lpep_pickup_date".to_string(),
            }),
            require_positive: vec!["passenger_count".to_string(), "trip_distance".to_string()],
        })
    }

    #[test_case("VendorID", "vendor_id")]
    #[test_case("RatecodeID", "ratecode_id")]
    #[test_case("PULocationID", "pulocation_id")]
    #[test_case("DOLocationID", "dolocation_id")]
    #[test_case("passenger_count", "passenger_count")]
    #[test_case("Total_Amount", "total_amount")]
    fn test_normalize_key(input: &str, expected: &str) {
        assert_eq!(normalize_key(input), expected);
    }

    #[test_case(json!("2020-10-01 00:09:08") ; "space separated")]
    #[test_case(json!("2020-10-01T00:09:08") ; "iso without zone")]
    #[test_case(json!("2020-10-01T00:09:08+00:00") ; "rfc3339")]
    #[test_case(json!("2020-10-01") ; "date only")]
    fn test_parse_date_formats(value: JsonValue) {
        assert_eq!(
            parse_date(&value),
            NaiveDate::from_ymd_opt(2020, 10, 1)
        );
    }

    #[test]
    fn test_parse_date_rejects_other_values() {
        assert_eq!(parse_date(&json!(1_601_510_948)), None);
        assert_eq!(parse_date(&json!("yesterday")), None);
    }

    #[test]
    fn test_noop_transform_keeps_everything() {
        let transform = RecordTransform::default();
        let mut records = vec![record(json!({"VendorID": 1}))];

        assert_eq!(transform.apply(&mut records), 0);
        assert_eq!(records[0]["VendorID"], 1);
    }

    #[test]
    fn test_taxi_transform() {
        let transform = taxi_transform();
        let mut records = vec![
            record(json!({
                "VendorID": 2,
                "lpep_pickup_datetime": "2020-10-01 00:09:08",
                "passenger_count": 1,
                "trip_distance": 0.8
            })),
            record(json!({
                "VendorID": 1,
                "lpep_pickup_datetime": "2020-10-01 00:20:00",
                "passenger_count": 0,
                "trip_distance": 3.1
            })),
            record(json!({
                "VendorID": 1,
                "lpep_pickup_datetime": "2020-10-02 10:00:00",
                "passenger_count": 2,
                "trip_distance": 0
            })),
            record(json!({
                "VendorID": 2,
                "lpep_pickup_datetime": null,
                "passenger_count": null,
                "trip_distance": 1.0
            })),
        ];

        let dropped = transform.apply(&mut records);

        assert_eq!(dropped, 3);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0],
            record(json!({
                "vendor_id": 2,
                "lpep_pickup_datetime": "2020-10-01 00:09:08",
                "lpep_pickup_date": "2020-10-01",
                "passenger_count": 1,
                "trip_distance": 0.8
            }))
        );
    }

    #[test]
    fn test_unparseable_datetime_leaves_column_out() {
        let transform = RecordTransform::new(TransformConfig {
            derive_date: Some(DeriveDate {
                from: "ts".to_string(),
                to: "day".to_string(),
            }),
            ..Default::default()
        });

        let out = transform.apply_one(record(json!({"ts": "soon"}))).unwrap();
        assert!(!out.contains_key("day"));
    }

    #[test]
    fn test_transform_config_yaml() {
        let config: TransformConfig = serde_yaml::from_str(
            "normalize_keys: true\nrequire_positive: [trip_distance]\n",
        )
        .unwrap();

        assert!(config.normalize_keys);
        assert!(config.derive_date.is_none());
        assert_eq!(config.require_positive, vec!["trip_distance".to_string()]);
        assert!(!config.is_noop());
    }
}
