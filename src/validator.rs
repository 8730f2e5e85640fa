//! Record validation
//!
//! Narrows each loosely-typed field of a [`RawRecord`] into a strict type or
//! rejects the record. Checks short-circuit in a fixed order so a record that
//! is wrong in several ways always reports the same, most useful reason:
//!
//! 1. `missing_required_field`
//! 2. `invalid_timestamp`
//! 3. `future_timestamp`
//! 4. `invalid_sensor_id`
//! 5. `invalid_heart_rate`
//! 6. `invalid_temperature`
//!
//! `spO2` and `battery_level` are not inspected.

use crate::config::TemperatureBounds;
use crate::types::{DropReason, RawField, RawRecord, ValidatedRecord};
use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

/// Outcome of validating one record
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted(ValidatedRecord),
    Rejected(DropReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    /// The drop reason, if rejected
    pub fn reason(&self) -> Option<DropReason> {
        match self {
            Verdict::Accepted(_) => None,
            Verdict::Rejected(reason) => Some(*reason),
        }
    }
}

/// Validator for raw records
///
/// Holds only fixed configuration. The comparison instant for the
/// future-timestamp check is passed per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    bounds: TemperatureBounds,
}

impl Validator {
    pub fn new(bounds: TemperatureBounds) -> Self {
        Self { bounds }
    }

    /// Classify a record against `now`.
    pub fn validate(&self, record: RawRecord, now: DateTime<Utc>) -> Verdict {
        match self.check(record, now) {
            Ok(validated) => Verdict::Accepted(validated),
            Err(reason) => Verdict::Rejected(reason),
        }
    }

    fn check(&self, record: RawRecord, now: DateTime<Utc>) -> Result<ValidatedRecord, DropReason> {
        let required = [
            &record.event_timestamp,
            &record.sensor_id,
            &record.heart_rate,
            &record.body_temperature,
        ];
        if required.iter().any(|field| field.is_absent()) {
            return Err(DropReason::MissingRequiredField);
        }

        let event_timestamp = match &record.event_timestamp {
            RawField::Text(text) => parse_timestamp(text),
            _ => None,
        }
        .ok_or(DropReason::InvalidTimestamp)?;

        if event_timestamp.with_timezone(&Utc) > now {
            return Err(DropReason::FutureTimestamp);
        }

        let sensor_id = sensor_text(&record.sensor_id)
            .filter(|id| !id.trim().is_empty())
            .ok_or(DropReason::InvalidSensorId)?;

        let heart_rate = coerce_number(&record.heart_rate).ok_or(DropReason::InvalidHeartRate)?;

        let body_temperature = coerce_number(&record.body_temperature)
            .filter(|temp| self.bounds.contains(*temp))
            .ok_or(DropReason::InvalidTemperature)?;

        Ok(ValidatedRecord {
            event_timestamp,
            sensor_id,
            heart_rate,
            body_temperature,
            spo2: record.spo2,
            battery_level: record.battery_level,
        })
    }
}

/// Parse an ISO-8601 instant. Offset-less input is taken as UTC.
///
/// Besides RFC 3339 this accepts the basic form (`20260127T135050Z`), a space
/// separator, hour or minute precision (`13Z`, `13:50Z`), a comma before the
/// fraction, offsets as `Z`, `±HH`, `±HHMM` or `±HH:MM`, and `24:00` as
/// midnight of the next day. A date without a time is not an instant.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts);
    }

    let date_len = if text.get(4..5) == Some("-") { 10 } else { 8 };
    let date = parse_date(text.get(..date_len)?)?;

    let rest = text.get(date_len..)?;
    let rest = rest
        .strip_prefix(['T', 't', ' '])
        .filter(|rest| !rest.is_empty())?;

    let (clock, offset) = split_offset(rest)?;
    let (time, next_day) = parse_time(clock)?;
    let date = if next_day {
        date.checked_add_days(Days::new(1))?
    } else {
        date
    };
    let naive = date.and_time(time);

    match offset {
        Some(offset) => offset.from_local_datetime(&naive).single(),
        None => Some(Utc.from_utc_datetime(&naive).into()),
    }
}

/// `YYYY-MM-DD` or `YYYYMMDD`
fn parse_date(text: &str) -> Option<NaiveDate> {
    let (year, month, day) = if text.len() == 10 {
        if text.get(7..8) != Some("-") {
            return None;
        }
        (text.get(0..4)?, text.get(5..7)?, text.get(8..10)?)
    } else {
        (text.get(0..4)?, text.get(4..6)?, text.get(6..8)?)
    };
    NaiveDate::from_ymd_opt(digits(year)? as i32, digits(month)?, digits(day)?)
}

/// Split a trailing UTC designator or numeric offset off the clock time.
fn split_offset(text: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = text.strip_suffix(['Z', 'z']) {
        return Some((clock, FixedOffset::east_opt(0)));
    }

    let Some(at) = text.find(['+', '-']) else {
        return Some((text, None));
    };
    let (clock, offset) = text.split_at(at);
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let offset = &offset[1..];

    let (hours, minutes) = match offset.len() {
        2 => (offset, "00"),
        4 => (offset.get(..2)?, offset.get(2..)?),
        5 if offset.get(2..3) == Some(":") => (offset.get(..2)?, offset.get(3..)?),
        _ => return None,
    };
    let (hours, minutes) = (digits(hours)?, digits(minutes)?);
    if hours > 23 || minutes > 59 {
        return None;
    }

    let seconds = (hours * 3600 + minutes * 60) as i32;
    Some((clock, Some(FixedOffset::east_opt(sign * seconds)?)))
}

/// Clock time at hour, minute, or second precision, extended or basic.
/// Returns whether the time was `24:00`, which rolls over to the next day.
fn parse_time(text: &str) -> Option<(NaiveTime, bool)> {
    let (main, fraction) = match text.find(['.', ',']) {
        Some(at) => (&text[..at], Some(&text[at + 1..])),
        None => (text, None),
    };

    let parts: Vec<&str> = if main.contains(':') {
        main.split(':').collect()
    } else {
        (0..main.len() / 2)
            .map(|i| main.get(i * 2..i * 2 + 2))
            .collect::<Option<Vec<_>>>()?
    };
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.len() != 2) {
        return None;
    }
    if main.len() % 2 == 1 && !main.contains(':') {
        return None;
    }

    let hour = digits(parts[0])?;
    let minute = parts.get(1).map_or(Some(0), |p| digits(p))?;
    let second = parts.get(2).map_or(Some(0), |p| digits(p))?;

    let nano = match fraction {
        // A fraction only follows whole seconds
        Some(_) if parts.len() < 3 => return None,
        Some(fraction) => fraction_nanos(fraction)?,
        None => 0,
    };

    if hour == 24 {
        if minute != 0 || second != 0 || nano != 0 {
            return None;
        }
        return Some((NaiveTime::from_hms_opt(0, 0, 0)?, true));
    }
    Some((NaiveTime::from_hms_nano_opt(hour, minute, second, nano)?, false))
}

/// Fractional seconds to nanoseconds; digits past the ninth are dropped.
fn fraction_nanos(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let kept = &text[..text.len().min(9)];
    let nanos: u32 = kept.parse().ok()?;
    Some(nanos * 10u32.pow(9 - kept.len() as u32))
}

fn digits(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Sensor ids arrive as text; bare numbers are taken in their decimal form.
fn sensor_text(field: &RawField) -> Option<String> {
    match field {
        RawField::Text(text) => Some(text.clone()),
        RawField::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a reading to a finite f64. Numeric strings are accepted.
fn coerce_number(field: &RawField) -> Option<f64> {
    let value = match field {
        RawField::Number(n) => n.as_f64()?,
        RawField::Text(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}
