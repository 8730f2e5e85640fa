//! Vitals CLI - Command-line interface for the ICU vitals ingestion boundary
//!
//! Commands:
//! - ingest: Stream raw monitor events into clean canonical events
//! - validate: Classify raw events and report drop reasons without emitting
//! - row-keys: Derive hot-store row keys and warehouse partitions for clean events
//! - schema: Print the input and output contracts

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use vitals_ingest::storage::StorageRow;
use vitals_ingest::{
    CleanRecord, Clock, DropReason, FixedClock, IngestError, IngestPipeline, IngestSummary,
    LineOutcome, PipelineConfig, SystemClock, INGEST_VERSION,
};

/// Vitals - validation and normalization boundary for ICU monitor telemetry
#[derive(Parser)]
#[command(name = "vitals")]
#[command(version = INGEST_VERSION)]
#[command(about = "Validate and normalize ICU bedside monitor events", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream raw events into clean canonical events
    Ingest {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Write the run summary to this file instead of stderr
        #[arg(long)]
        summary: Option<PathBuf>,

        /// Flush output after each record
        #[arg(long)]
        flush: bool,
    },

    /// Classify raw events and report drop reasons without emitting
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        #[command(flatten)]
        pipeline: PipelineArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Derive hot-store row keys and warehouse partitions for clean events
    RowKeys {
        /// Clean events input (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },

    /// Print schema information
    Schema {
        /// Schema to print (input or output)
        #[arg(value_enum)]
        schema_type: SchemaType,

        /// Output as JSON schema
        #[arg(long)]
        json_schema: bool,
    },
}

#[derive(clap::Args)]
struct PipelineArgs {
    /// Pipeline config file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fixed "now" for the future-timestamp check (RFC 3339), for replays
    #[arg(long)]
    now: Option<String>,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Raw monitor event
    Input,
    /// Clean canonical event
    Output,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VitalsCliError> {
    match cli.command {
        Commands::Ingest {
            input,
            output,
            pipeline,
            summary,
            flush,
        } => cmd_ingest(&input, &output, &pipeline, summary.as_deref(), flush),

        Commands::Validate {
            input,
            pipeline,
            json,
        } => cmd_validate(&input, &pipeline, json),

        Commands::RowKeys { input, output } => cmd_row_keys(&input, &output),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_ingest(
    input: &Path,
    output: &Path,
    args: &PipelineArgs,
    summary_path: Option<&Path>,
    flush: bool,
) -> Result<(), VitalsCliError> {
    let pipeline = build_pipeline(args)?.with_flush(flush);

    let reader = open_input(input)?;
    let writer = open_output(output)?;
    let summary = pipeline.run(reader, writer)?;

    let summary_json = serde_json::to_string(&summary)?;
    match summary_path {
        Some(path) => fs::write(path, summary_json + "\n")?,
        None => eprintln!("{summary_json}"),
    }

    Ok(())
}

fn cmd_validate(input: &Path, args: &PipelineArgs, json: bool) -> Result<(), VitalsCliError> {
    let pipeline = build_pipeline(args)?;
    let reader = open_input(input)?;

    let mut drops: Vec<DropDetail> = Vec::new();
    let summary = pipeline.for_each_outcome(reader, |line, outcome| {
        if let LineOutcome::Dropped(reason) = outcome {
            drops.push(DropDetail { line, reason });
        }
        Ok(())
    })?;

    let report = ValidationReport { summary, drops };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Records:  {}", report.summary.records_seen);
        println!("Accepted: {}", report.summary.emitted);
        println!("Dropped:  {}", report.summary.total_dropped());

        if !report.drops.is_empty() {
            println!("\nDrops by reason:");
            for (reason, count) in &report.summary.dropped {
                println!("  {reason:<24} {count}");
            }

            println!("\nDropped lines:");
            for drop in &report.drops {
                println!("  - line {}: {}", drop.line, drop.reason);
            }
        }
    }

    let dropped = report.summary.total_dropped();
    if dropped > 0 {
        Err(VitalsCliError::RecordsDropped(dropped))
    } else {
        Ok(())
    }
}

fn cmd_row_keys(input: &Path, output: &Path) -> Result<(), VitalsCliError> {
    let reader = open_input(input)?;
    let mut writer = open_output(output)?;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let record: CleanRecord = serde_json::from_str(trimmed).map_err(|e| {
            VitalsCliError::ParseError(format!("Line {}: not a clean record: {}", idx + 1, e))
        })?;

        serde_json::to_writer(&mut writer, &StorageRow::from_record(&record))?;
        writer.write_all(b"\n")?;
    }

    writer.flush()?;
    Ok(())
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), VitalsCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input: one JSON object per line (untrusted)");
                println!();
                println!("Required:");
                println!("- event_timestamp: ISO-8601 instant; no offset means UTC");
                println!("- sensor_id: non-blank string (numbers are accepted as text)");
                println!("- heart_rate: finite number or numeric string");
                println!("- body_temperature: number in the open interval (25, 45) °C by default");
                println!();
                println!("Optional (passed through unchanged, never validated):");
                println!("- spO2");
                println!("- battery_level");
                println!();
                println!("Drop reasons, in evaluation order:");
                for reason in DropReason::ALL {
                    println!("- {reason}");
                }
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output: one compact JSON object per line (clean)");
                println!();
                println!("- event_timestamp: UTC RFC 3339 with Z suffix");
                println!("- sensor_id: trimmed, non-empty");
                println!("- heart_rate: finite number");
                println!("- body_temperature: finite number inside the configured bounds");
                println!("- spO2: present only if supplied");
                println!("- battery_level: present only if supplied");
            }
        }
    }

    Ok(())
}

// Helper functions

fn build_pipeline(args: &PipelineArgs) -> Result<IngestPipeline<Box<dyn Clock>>, VitalsCliError> {
    let config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };

    let clock: Box<dyn Clock> = match &args.now {
        Some(text) => {
            let now = DateTime::parse_from_rfc3339(text)
                .map_err(|e| VitalsCliError::InvalidNow(format!("{text}: {e}")))?;
            Box::new(FixedClock(now.with_timezone(&Utc)))
        }
        None => Box::new(SystemClock),
    };

    Ok(IngestPipeline::with_clock(&config, clock))
}

fn open_input(path: &Path) -> Result<Box<dyn BufRead>, VitalsCliError> {
    if path.to_string_lossy() == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

fn open_output(path: &Path) -> Result<Box<dyn Write>, VitalsCliError> {
    if path.to_string_lossy() == "-" {
        Ok(Box::new(BufWriter::new(io::stdout().lock())))
    } else {
        Ok(Box::new(BufWriter::new(File::create(path)?)))
    }
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "icu.vitals.raw",
        "description": "Raw bedside monitor event (untrusted)",
        "type": "object",
        "required": ["event_timestamp", "sensor_id", "heart_rate", "body_temperature"],
        "properties": {
            "event_timestamp": { "type": "string" },
            "sensor_id": { "type": ["string", "number"] },
            "heart_rate": { "type": ["number", "string", "null"] },
            "body_temperature": { "type": ["number", "string", "null"] },
            "spO2": {},
            "battery_level": {}
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": "icu.vitals.clean",
        "description": "Validated, normalized bedside monitor event",
        "type": "object",
        "required": ["event_timestamp", "sensor_id", "heart_rate", "body_temperature"],
        "additionalProperties": false,
        "properties": {
            "event_timestamp": { "type": "string", "format": "date-time", "pattern": "Z$" },
            "sensor_id": { "type": "string", "minLength": 1 },
            "heart_rate": { "type": "number" },
            "body_temperature": {
                "type": "number",
                "exclusiveMinimum": 25.0,
                "exclusiveMaximum": 45.0
            },
            "spO2": {},
            "battery_level": {}
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum VitalsCliError {
    Io(io::Error),
    Ingest(IngestError),
    Json(serde_json::Error),
    InvalidNow(String),
    ParseError(String),
    RecordsDropped(u64),
}

impl From<io::Error> for VitalsCliError {
    fn from(e: io::Error) -> Self {
        VitalsCliError::Io(e)
    }
}

impl From<IngestError> for VitalsCliError {
    fn from(e: IngestError) -> Self {
        VitalsCliError::Ingest(e)
    }
}

impl From<serde_json::Error> for VitalsCliError {
    fn from(e: serde_json::Error) -> Self {
        VitalsCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitalsCliError> for CliError {
    fn from(e: VitalsCliError) -> Self {
        match e {
            VitalsCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitalsCliError::Ingest(IngestError::Config(e)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check TOML syntax of the config file".to_string()),
            },
            VitalsCliError::Ingest(IngestError::InvalidConfig(msg)) => CliError {
                code: "CONFIG_ERROR".to_string(),
                message: msg,
                hint: Some("Temperature bounds must be finite with min below max".to_string()),
            },
            VitalsCliError::Ingest(e) => CliError {
                code: "INGEST_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("The input or output stream failed".to_string()),
            },
            VitalsCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            VitalsCliError::InvalidNow(msg) => CliError {
                code: "INVALID_NOW".to_string(),
                message: msg,
                hint: Some("Use an RFC 3339 instant, e.g. 2026-01-27T13:50:50Z".to_string()),
            },
            VitalsCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("row-keys expects the output of 'vitals ingest'".to_string()),
            },
            VitalsCliError::RecordsDropped(count) => CliError {
                code: "RECORDS_DROPPED".to_string(),
                message: format!("{} records were dropped", count),
                hint: Some("See the report above for reasons".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    #[serde(flatten)]
    summary: IngestSummary,
    drops: Vec<DropDetail>,
}

#[derive(serde::Serialize)]
struct DropDetail {
    line: u64,
    reason: DropReason,
}
