//! Canonical output encoding
//!
//! This module serializes clean records into newline-terminated compact JSON
//! and writes them to the output sink. Values are not touched here.

use crate::error::IngestError;
use crate::types::CleanRecord;
use std::io::Write;

/// Encode one clean record as a canonical output line (including `\n`)
pub fn encode_line(record: &CleanRecord) -> Result<String, IngestError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

/// Writes clean records to an output sink
pub struct Emitter<W: Write> {
    sink: W,
    flush_each: bool,
}

impl<W: Write> Emitter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            flush_each: false,
        }
    }

    /// Flush the sink after every record
    pub fn with_flush(mut self, flush_each: bool) -> Self {
        self.flush_each = flush_each;
        self
    }

    /// Serialize and write one record
    pub fn emit(&mut self, record: &CleanRecord) -> Result<(), IngestError> {
        serde_json::to_writer(&mut self.sink, record)?;
        self.sink.write_all(b"\n")?;
        if self.flush_each {
            self.sink.flush()?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), IngestError> {
        self.sink.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn make_record() -> CleanRecord {
        CleanRecord {
            event_timestamp: Utc.with_ymd_and_hms(2026, 1, 27, 13, 50, 50).unwrap()
                + chrono::Duration::microseconds(771_629),
            sensor_id: "icu-monitor-004".to_string(),
            heart_rate: 72.0,
            body_temperature: 37.07,
            spo2: Some(json!(97)),
            battery_level: Some(json!(41)),
        }
    }

    #[test]
    fn test_encode_line() {
        let line = encode_line(&make_record()).unwrap();
        assert_eq!(
            line,
            "{\"event_timestamp\":\"2026-01-27T13:50:50.771629Z\",\"sensor_id\":\"icu-monitor-004\",\"heart_rate\":72.0,\"body_temperature\":37.07,\"spO2\":97,\"battery_level\":41}\n"
        );
    }

    #[test]
    fn test_emitter_writes_lines_in_order() {
        let mut emitter = Emitter::new(Vec::new()).with_flush(true);
        let first = make_record();
        let mut second = make_record();
        second.sensor_id = "icu-monitor-005".to_string();
        second.spo2 = None;

        emitter.emit(&first).unwrap();
        emitter.emit(&second).unwrap();

        let output = String::from_utf8(emitter.into_inner()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("icu-monitor-004"));
        assert!(lines[1].contains("icu-monitor-005"));
        assert!(!lines[1].contains("spO2"));
        assert!(output.ends_with('\n'));
        assert_eq!(encode_line(&first).unwrap(), format!("{}\n", lines[0]));
    }
}
