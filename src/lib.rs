//! ICU vitals ingestion boundary
//!
//! Accepts untrusted physiological telemetry from bedside monitors one line at
//! a time and decides, per record and in isolation, whether it can be trusted.
//! Trusted records are normalized and emitted in a canonical form; everything
//! else is dropped with exactly one reason code:
//! parse → validate → normalize → emit.
//!
//! ## Modules
//!
//! - **Pipeline stages**: [`parser`], [`validator`], [`normalizer`], [`emitter`]
//! - **Orchestration**: [`pipeline`] with drop accounting in [`summary`]
//! - **Storage layout**: [`storage`] derives hot-store row keys and warehouse partitions

pub mod clock;
pub mod config;
pub mod emitter;
pub mod error;
pub mod normalizer;
pub mod parser;
pub mod pipeline;
pub mod storage;
pub mod summary;
pub mod types;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{PipelineConfig, TemperatureBounds};
pub use error::{IngestError, ParseError};
pub use pipeline::{process_line, IngestPipeline, LineOutcome};
pub use summary::IngestSummary;
pub use types::{CleanRecord, DropReason, RawField, RawRecord};
pub use validator::{Validator, Verdict};

/// Crate version reported by the CLI
pub const INGEST_VERSION: &str = env!("CARGO_PKG_VERSION");
