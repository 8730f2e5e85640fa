//! Core types for the vitals ingestion pipeline
//!
//! This module defines the data structures that flow through each stage:
//! loosely-typed raw records, validated records, clean canonical records, and
//! the drop-reason taxonomy.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Input key names as they appear on the wire
pub const EVENT_TIMESTAMP: &str = "event_timestamp";
pub const SENSOR_ID: &str = "sensor_id";
pub const HEART_RATE: &str = "heart_rate";
pub const BODY_TEMPERATURE: &str = "body_temperature";
pub const SPO2: &str = "spO2";
pub const BATTERY_LEVEL: &str = "battery_level";

/// One field of an untrusted record, tagged by what upstream actually sent
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RawField {
    /// Key not present in the source object
    #[default]
    Absent,
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    /// Array or object
    Nested(Value),
}

impl RawField {
    pub fn is_absent(&self) -> bool {
        matches!(self, RawField::Absent)
    }
}

impl From<Option<Value>> for RawField {
    fn from(value: Option<Value>) -> Self {
        match value {
            None => RawField::Absent,
            Some(Value::Null) => RawField::Null,
            Some(Value::Bool(b)) => RawField::Bool(b),
            Some(Value::Number(n)) => RawField::Number(n),
            Some(Value::String(s)) => RawField::Text(s),
            Some(nested) => RawField::Nested(nested),
        }
    }
}

/// Untrusted record as received from a bedside monitor
///
/// `spo2` and `battery_level` are never interpreted, so they keep the raw JSON
/// value. `None` means the key was absent; a JSON `null` is `Some(Value::Null)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub event_timestamp: RawField,
    pub sensor_id: RawField,
    pub heart_rate: RawField,
    pub body_temperature: RawField,
    pub spo2: Option<Value>,
    pub battery_level: Option<Value>,
}

/// A record whose required fields have been narrowed to strict types
///
/// Only the validator constructs this. The timestamp keeps its source offset
/// and the sensor id keeps its surrounding whitespace; both are canonicalized
/// by the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRecord {
    pub event_timestamp: DateTime<FixedOffset>,
    pub sensor_id: String,
    pub heart_rate: f64,
    pub body_temperature: f64,
    pub spo2: Option<Value>,
    pub battery_level: Option<Value>,
}

/// Trusted, canonical record ready for downstream storage
///
/// Field order here is the output field order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(with = "utc_timestamp")]
    pub event_timestamp: DateTime<Utc>,
    pub sensor_id: String,
    pub heart_rate: f64,
    pub body_temperature: f64,
    #[serde(
        rename = "spO2",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub spo2: Option<Value>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub battery_level: Option<Value>,
}

/// Keeps an explicit `null` as `Some(Value::Null)`; a missing key falls back
/// to `None` through `#[serde(default)]`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Canonical UTC timestamp text: RFC 3339, `Z` suffix, shortest exact
/// fractional seconds.
pub mod utc_timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&text)
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(de::Error::custom)
    }
}

/// Why a record was dropped
///
/// Variant order is the validator's evaluation order, preceded by the
/// parser's `MalformedInput`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MalformedInput,
    MissingRequiredField,
    InvalidTimestamp,
    FutureTimestamp,
    InvalidSensorId,
    InvalidHeartRate,
    InvalidTemperature,
}

impl DropReason {
    pub const ALL: [DropReason; 7] = [
        DropReason::MalformedInput,
        DropReason::MissingRequiredField,
        DropReason::InvalidTimestamp,
        DropReason::FutureTimestamp,
        DropReason::InvalidSensorId,
        DropReason::InvalidHeartRate,
        DropReason::InvalidTemperature,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DropReason::MalformedInput => "malformed_input",
            DropReason::MissingRequiredField => "missing_required_field",
            DropReason::InvalidTimestamp => "invalid_timestamp",
            DropReason::FutureTimestamp => "future_timestamp",
            DropReason::InvalidSensorId => "invalid_sensor_id",
            DropReason::InvalidHeartRate => "invalid_heart_rate",
            DropReason::InvalidTemperature => "invalid_temperature",
        }
    }
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_raw_field_from_value() {
        assert_eq!(RawField::from(None), RawField::Absent);
        assert_eq!(RawField::from(Some(Value::Null)), RawField::Null);
        assert_eq!(RawField::from(Some(json!(true))), RawField::Bool(true));
        assert_eq!(
            RawField::from(Some(json!("icu-1"))),
            RawField::Text("icu-1".to_string())
        );
        assert_eq!(
            RawField::from(Some(json!([1, 2]))),
            RawField::Nested(json!([1, 2]))
        );
        assert!(matches!(RawField::from(Some(json!(72))), RawField::Number(_)));
    }

    #[test]
    fn test_drop_reason_serializes_as_code() {
        for reason in DropReason::ALL {
            let json = serde_json::to_string(&reason).unwrap();
            assert_eq!(json, format!("\"{}\"", reason.as_str()));
            assert_eq!(reason.to_string(), reason.as_str());
        }
    }

    #[test]
    fn test_clean_record_field_order_and_omission() {
        let record = CleanRecord {
            event_timestamp: Utc.with_ymd_and_hms(2026, 1, 27, 13, 50, 50).unwrap(),
            sensor_id: "icu-monitor-004".to_string(),
            heart_rate: 70.5,
            body_temperature: 37.07,
            spo2: None,
            battery_level: Some(json!(41)),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"event_timestamp":"2026-01-27T13:50:50Z","sensor_id":"icu-monitor-004","heart_rate":70.5,"body_temperature":37.07,"battery_level":41}"#
        );
    }

    #[test]
    fn test_clean_record_keeps_explicit_null() {
        let json = r#"{"event_timestamp":"2026-01-27T13:50:50Z","sensor_id":"a","heart_rate":60.0,"body_temperature":36.6,"spO2":null}"#;
        let record: CleanRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.spo2, Some(Value::Null));
        assert_eq!(record.battery_level, None);
        assert_eq!(serde_json::to_string(&record).unwrap(), json);
    }

    #[test]
    fn test_utc_timestamp_fraction_digits() {
        let ts = DateTime::parse_from_rfc3339("2026-01-27T13:50:50.771629Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(utc_timestamp::format(&ts), "2026-01-27T13:50:50.771629Z");

        let ts = Utc.with_ymd_and_hms(2026, 1, 27, 13, 50, 50).unwrap();
        assert_eq!(utc_timestamp::format(&ts), "2026-01-27T13:50:50Z");
    }
}
