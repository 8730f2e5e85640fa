//! Pipeline orchestration
//!
//! This module provides the public API for the ingestion boundary.
//! It runs each raw line through Parser → Validator → Normalizer → Emitter and
//! keeps the drop accounting.
//!
//! Every stage is a pure function of one record plus fixed configuration, so
//! [`process_line`] can be called from any number of workers without
//! coordination. [`IngestPipeline`] is the sequential stream driver on top.

use crate::clock::{Clock, SystemClock};
use crate::config::PipelineConfig;
use crate::emitter::Emitter;
use crate::error::{IngestError, ParseError};
use crate::normalizer::Normalizer;
use crate::parser::Parser;
use crate::summary::IngestSummary;
use crate::types::{CleanRecord, DropReason, RawRecord};
use crate::validator::{Validator, Verdict};
use chrono::{DateTime, Utc};
use std::io::{BufRead, Write};

/// What happened to one input line
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// Empty or whitespace-only; not a record
    Blank,
    Emitted(CleanRecord),
    Dropped(DropReason),
}

/// Process one raw line.
///
/// Pipeline stages:
/// 1. Parser - Decode the line into a loosely-typed record
/// 2. Validator - Accept, or reject with a single reason
/// 3. Normalizer - Canonicalize the accepted record
pub fn process_line(line: &str, validator: &Validator, now: DateTime<Utc>) -> LineOutcome {
    if line.trim().is_empty() {
        return LineOutcome::Blank;
    }
    classify_parsed(Parser::parse(line), validator, now)
}

/// Process one raw line given as bytes. Non-UTF-8 input is `malformed_input`.
pub fn process_bytes(line: &[u8], validator: &Validator, now: DateTime<Utc>) -> LineOutcome {
    match std::str::from_utf8(line) {
        Ok(text) => process_line(text, validator, now),
        Err(_) => classify_parsed(Err(ParseError::InvalidUtf8), validator, now),
    }
}

fn classify_parsed(
    parsed: Result<RawRecord, ParseError>,
    validator: &Validator,
    now: DateTime<Utc>,
) -> LineOutcome {
    let raw = match parsed {
        Ok(raw) => raw,
        Err(e) => {
            tracing::trace!(error = %e, "Unparseable line");
            return LineOutcome::Dropped(DropReason::MalformedInput);
        }
    };

    match validator.validate(raw, now) {
        Verdict::Accepted(validated) => LineOutcome::Emitted(Normalizer::normalize(validated)),
        Verdict::Rejected(reason) => LineOutcome::Dropped(reason),
    }
}

/// Sequential stream driver
///
/// The clock is sampled once per record.
pub struct IngestPipeline<C: Clock = SystemClock> {
    validator: Validator,
    clock: C,
    flush_each: bool,
}

impl IngestPipeline<SystemClock> {
    /// Create a pipeline checking timestamps against wall-clock time
    pub fn new(config: &PipelineConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> IngestPipeline<C> {
    /// Create a pipeline with an explicit source of "now"
    pub fn with_clock(config: &PipelineConfig, clock: C) -> Self {
        Self {
            validator: Validator::new(config.temperature),
            clock,
            flush_each: false,
        }
    }

    /// Flush output after each emitted record
    pub fn with_flush(mut self, flush_each: bool) -> Self {
        self.flush_each = flush_each;
        self
    }

    /// Classify one line against the current clock
    pub fn classify(&self, line: &[u8]) -> LineOutcome {
        process_bytes(line, &self.validator, self.clock.now())
    }

    /// Stream raw lines from `reader` to clean lines on `writer`.
    ///
    /// Rejected records only show up in the returned summary. Fails only when
    /// the reader or writer does.
    pub fn run<R: BufRead, W: Write>(
        &self,
        reader: R,
        writer: W,
    ) -> Result<IngestSummary, IngestError> {
        let mut emitter = Emitter::new(writer).with_flush(self.flush_each);

        let summary = self.for_each_outcome(reader, |_, outcome| match outcome {
            LineOutcome::Emitted(record) => emitter.emit(&record),
            _ => Ok(()),
        })?;

        emitter.flush()?;
        Ok(summary)
    }

    /// Classify every line of `reader`, handing each non-blank outcome to
    /// `handler` with its 1-based line number.
    pub fn for_each_outcome<R, F>(
        &self,
        mut reader: R,
        mut handler: F,
    ) -> Result<IngestSummary, IngestError>
    where
        R: BufRead,
        F: FnMut(u64, LineOutcome) -> Result<(), IngestError>,
    {
        let mut summary = IngestSummary::new();
        let mut buf: Vec<u8> = Vec::with_capacity(512);
        let mut line_no: u64 = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_no += 1;

            let outcome = self.classify(&buf);
            match &outcome {
                LineOutcome::Blank => continue,
                LineOutcome::Emitted(_) => summary.record_emitted(),
                LineOutcome::Dropped(reason) => {
                    tracing::debug!(line = line_no, reason = %reason, "Dropped record");
                    summary.record_drop(*reason);
                }
            }
            handler(line_no, outcome)?;
        }

        tracing::info!(
            records_seen = summary.records_seen,
            emitted = summary.emitted,
            dropped = summary.total_dropped(),
            "Ingestion finished"
        );

        Ok(summary)
    }
}
