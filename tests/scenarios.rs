//! End-to-end behaviour of the ingestion pipeline over raw JSONL streams.

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::io::{Cursor, Write};
use vitals_ingest::{
    DropReason, FixedClock, IngestPipeline, IngestSummary, PipelineConfig, TemperatureBounds,
};

const CANONICAL: &str = r#"{"event_timestamp":"2026-01-27T13:50:50Z","sensor_id":"icu-monitor-004","heart_rate":70.5,"body_temperature":37.07,"spO2":97,"battery_level":41}"#;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 27, 14, 0, 0).unwrap()
}

fn run(input: &str) -> (String, IngestSummary) {
    run_with(&PipelineConfig::default(), input)
}

fn run_with(config: &PipelineConfig, input: &str) -> (String, IngestSummary) {
    let pipeline = IngestPipeline::with_clock(config, FixedClock(now()));
    let mut output = Vec::new();
    let summary = pipeline.run(Cursor::new(input), &mut output).unwrap();
    (String::from_utf8(output).unwrap(), summary)
}

fn assert_single_drop(input: &str, reason: DropReason) {
    let (output, summary) = run(input);
    assert_eq!(output, "");
    assert_eq!(summary.records_seen, 1);
    assert_eq!(summary.emitted, 0);
    assert_eq!(summary.dropped_for(reason), 1, "{summary:?}");
    assert_eq!(summary.total_dropped(), 1);
}

#[test]
fn canonical_record_is_emitted_unchanged() {
    let (output, summary) = run(&format!("{CANONICAL}\n"));
    assert_eq!(output, format!("{CANONICAL}\n"));
    assert_eq!(summary.emitted, 1);
}

#[test]
fn null_heart_rate_is_dropped() {
    assert_single_drop(
        r#"{"event_timestamp":"2026-01-27T13:50:50Z","sensor_id":"icu-monitor-004","heart_rate":null,"body_temperature":37.07}"#,
        DropReason::InvalidHeartRate,
    );
}

#[test]
fn fever_beyond_bounds_is_dropped() {
    assert_single_drop(
        r#"{"event_timestamp":"2026-01-27T13:50:50Z","sensor_id":"icu-monitor-004","heart_rate":70.5,"body_temperature":46}"#,
        DropReason::InvalidTemperature,
    );
}

#[test]
fn blank_sensor_id_is_dropped() {
    assert_single_drop(
        r#"{"event_timestamp":"2026-01-27T13:50:50Z","sensor_id":"   ","heart_rate":70.5,"body_temperature":37.07}"#,
        DropReason::InvalidSensorId,
    );
}

#[test]
fn timestamp_one_second_after_now_is_dropped() {
    assert_single_drop(
        r#"{"event_timestamp":"2026-01-27T14:00:01Z","sensor_id":"icu-monitor-004","heart_rate":70.5,"body_temperature":37.07}"#,
        DropReason::FutureTimestamp,
    );
}

#[test]
fn truncated_line_is_malformed() {
    assert_single_drop(r#"{"sensor_id": "icu-monitor-001""#, DropReason::MalformedInput);
}

#[test]
fn seventeen_digit_readings_are_kept_exactly() {
    let line = CANONICAL
        .replace("70.5", "71.30000000000001")
        .replace("37.07", "36.801793343883844");
    let (output, summary) = run(&line);
    assert_eq!(summary.emitted, 1);
    assert_eq!(output, format!("{line}\n"));
}

#[test]
fn temperature_boundaries() {
    let line = |temp: &str| {
        format!(
            r#"{{"event_timestamp":"2026-01-27T13:50:50Z","sensor_id":"a","heart_rate":60,"body_temperature":{temp}}}"#
        )
    };
    let input = ["25.0", "45.0", "25.0001", "44.9999"]
        .iter()
        .map(|t| line(t))
        .collect::<Vec<_>>()
        .join("\n");

    let (output, summary) = run(&input);
    assert_eq!(summary.emitted, 2);
    assert_eq!(summary.dropped_for(DropReason::InvalidTemperature), 2);
    assert!(output.contains("\"body_temperature\":25.0001"));
    assert!(output.contains("\"body_temperature\":44.9999"));
}

#[test]
fn normalizes_offsets_and_whitespace() {
    let input = r#"{"event_timestamp":"2026-01-27T15:50:50.771629+02:00","sensor_id":"  icu-monitor-004 ","heart_rate":"72","body_temperature":37,"battery_level":null}"#;
    let (output, _) = run(input);
    assert_eq!(
        output,
        "{\"event_timestamp\":\"2026-01-27T13:50:50.771629Z\",\"sensor_id\":\"icu-monitor-004\",\"heart_rate\":72.0,\"body_temperature\":37.0,\"battery_level\":null}\n"
    );
}

#[test]
fn mixed_stream_keeps_order_and_counts() {
    let input = [
        CANONICAL,
        "",
        "[]",
        r#"{"event_timestamp":"yesterday","sensor_id":"a","heart_rate":1,"body_temperature":37}"#,
        &CANONICAL.replace("icu-monitor-004", "icu-monitor-009"),
        r#"{"sensor_id":"a","heart_rate":1,"body_temperature":37}"#,
    ]
    .join("\n");

    let (output, summary) = run(&input);
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("icu-monitor-004"));
    assert!(lines[1].contains("icu-monitor-009"));

    assert_eq!(summary.records_seen, 5);
    assert_eq!(summary.emitted, 2);
    assert_eq!(summary.dropped_for(DropReason::MalformedInput), 1);
    assert_eq!(summary.dropped_for(DropReason::InvalidTimestamp), 1);
    assert_eq!(summary.dropped_for(DropReason::MissingRequiredField), 1);
    assert_eq!(
        summary.records_seen,
        summary.emitted + summary.total_dropped()
    );
}

#[test]
fn crlf_line_endings() {
    let (output, summary) = run(&format!("{CANONICAL}\r\n{CANONICAL}\r\n"));
    assert_eq!(summary.emitted, 2);
    assert_eq!(output, format!("{CANONICAL}\n{CANONICAL}\n"));
}

#[test]
fn config_file_narrows_bounds() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[temperature]\nmin_exclusive = 36.0\nmax_exclusive = 38.0").unwrap();
    let config = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(config.temperature, TemperatureBounds::new(36.0, 38.0));

    let (_, summary) = run_with(
        &config,
        &CANONICAL.replace("37.07", "38.5"),
    );
    assert_eq!(summary.dropped_for(DropReason::InvalidTemperature), 1);
}
