//! Raw line decoding
//!
//! Turns one line of monitor output into a [`RawRecord`]. Only structure is
//! checked here; field content is the validator's concern.

use crate::error::ParseError;
use crate::types::{
    RawRecord, BATTERY_LEVEL, BODY_TEMPERATURE, EVENT_TIMESTAMP, HEART_RATE, SENSOR_ID, SPO2,
};
use serde_json::Value;

/// Parser for raw monitor lines
pub struct Parser;

impl Parser {
    /// Decode a line that is already known to be UTF-8.
    ///
    /// Surrounding whitespace is ignored. Callers skip blank lines before
    /// getting here; an empty line is reported as a syntax error.
    pub fn parse(line: &str) -> Result<RawRecord, ParseError> {
        let value: Value = serde_json::from_str(line.trim())?;

        let mut object = match value {
            Value::Object(map) => map,
            Value::Array(_) => return Err(ParseError::NotAnObject("array")),
            Value::String(_) => return Err(ParseError::NotAnObject("string")),
            Value::Number(_) => return Err(ParseError::NotAnObject("number")),
            Value::Bool(_) => return Err(ParseError::NotAnObject("bool")),
            Value::Null => return Err(ParseError::NotAnObject("null")),
        };

        Ok(RawRecord {
            event_timestamp: object.remove(EVENT_TIMESTAMP).into(),
            sensor_id: object.remove(SENSOR_ID).into(),
            heart_rate: object.remove(HEART_RATE).into(),
            body_temperature: object.remove(BODY_TEMPERATURE).into(),
            spo2: object.remove(SPO2),
            battery_level: object.remove(BATTERY_LEVEL),
        })
    }
}
