//! Storage layout derivation for clean records
//!
//! Downstream loaders write clean records into two stores: a key-ordered hot
//! store scanned for "last N minutes of sensor X", and a date-partitioned
//! warehouse. The stores themselves live elsewhere; this module only derives
//! the keys and groupings they are addressed by.
//!
//! Hot-store row keys are `{sensor_id}#{reverse_ts}` where
//! `reverse_ts = MAX_TS_MICROS - event_micros`, zero-padded to 19 digits so
//! lexical order matches numeric order and the newest reading of a sensor
//! sorts first.

use crate::types::{utc_timestamp, CleanRecord};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// Upper bound of the reverse-timestamp key space (microseconds)
pub const MAX_TS_MICROS: i64 = i64::MAX;

/// Separator between sensor id and reverse timestamp in a row key
pub const ROW_KEY_SEPARATOR: char = '#';

/// Column groupings in the hot store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ColumnFamily {
    /// Physiological readings
    #[serde(rename = "v")]
    Vitals,
    /// Device state
    #[serde(rename = "d")]
    Device,
    /// Identity and time
    #[serde(rename = "m")]
    Metadata,
}

impl ColumnFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnFamily::Vitals => "v",
            ColumnFamily::Device => "d",
            ColumnFamily::Metadata => "m",
        }
    }
}

/// One hot-store cell
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub family: ColumnFamily,
    pub qualifier: &'static str,
    pub value: String,
}

impl Cell {
    fn new(family: ColumnFamily, qualifier: &'static str, value: String) -> Self {
        Self {
            family,
            qualifier,
            value,
        }
    }
}

/// Everything a loader needs to place one clean record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorageRow {
    pub row_key: String,
    pub partition_date: NaiveDate,
    pub cells: Vec<Cell>,
}

impl StorageRow {
    pub fn from_record(record: &CleanRecord) -> Self {
        Self {
            row_key: row_key(&record.sensor_id, &record.event_timestamp),
            partition_date: partition_date(&record.event_timestamp),
            cells: cells(record),
        }
    }
}

/// `MAX_TS_MICROS - micros(ts)`, computed without overflow
pub fn reverse_timestamp(ts: &DateTime<Utc>) -> u64 {
    let reverse = i128::from(MAX_TS_MICROS) - i128::from(ts.timestamp_micros());
    // i64::MAX - i64::MIN == u64::MAX, so this always fits
    reverse as u64
}

pub fn row_key(sensor_id: &str, ts: &DateTime<Utc>) -> String {
    format!(
        "{sensor_id}{ROW_KEY_SEPARATOR}{:019}",
        reverse_timestamp(ts)
    )
}

/// Warehouse partition: UTC calendar date of the event
pub fn partition_date(ts: &DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Hot-store cells for a record, grouped vitals → device → metadata.
///
/// Optional readings produce a cell only when present and not null. The
/// `v:spo2` value comes from the record's `spO2` field only; there is no
/// lowercase `spo2` fallback since a clean record cannot carry that key.
pub fn cells(record: &CleanRecord) -> Vec<Cell> {
    let mut cells = vec![
        Cell::new(ColumnFamily::Vitals, "hr", number_text(record.heart_rate)),
        Cell::new(
            ColumnFamily::Vitals,
            "temp",
            number_text(record.body_temperature),
        ),
    ];

    if let Some(value) = present_text(record.spo2.as_ref()) {
        cells.push(Cell::new(ColumnFamily::Vitals, "spo2", value));
    }
    if let Some(value) = present_text(record.battery_level.as_ref()) {
        cells.push(Cell::new(ColumnFamily::Device, "battery", value));
    }

    cells.push(Cell::new(
        ColumnFamily::Metadata,
        "sensor_id",
        record.sensor_id.clone(),
    ));
    cells.push(Cell::new(
        ColumnFamily::Metadata,
        "event_timestamp",
        utc_timestamp::format(&record.event_timestamp),
    ));

    cells
}

/// Same digits the emitter writes
fn number_text(value: f64) -> String {
    Value::from(value).to_string()
}

fn present_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
