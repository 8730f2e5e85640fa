//! Record normalization
//!
//! This module converts validated records into their canonical form.
//! - Timestamps converted to UTC
//! - Sensor ids trimmed
//! - Optional readings carried through untouched, or left out when absent

use crate::types::{CleanRecord, ValidatedRecord};
use chrono::Utc;

/// Normalizer for converting validated records to clean records
pub struct Normalizer;

impl Normalizer {
    /// Normalize a validated record. Pure conversion; cannot fail.
    pub fn normalize(record: ValidatedRecord) -> CleanRecord {
        CleanRecord {
            event_timestamp: record.event_timestamp.with_timezone(&Utc),
            sensor_id: record.sensor_id.trim().to_string(),
            heart_rate: record.heart_rate,
            body_temperature: record.body_temperature,
            spo2: record.spo2,
            battery_level: record.battery_level,
        }
    }
}
