//! evmatrix - Command-line interface for event-matrix
//!
//! Commands:
//! - build: Run the pipeline and print the user × event matrix
//! - describe: Summary statistics for event columns
//! - column: Extract one event column
//! - validate: Report malformed records
//! - schema: Describe the input and output formats

use clap::{Parser, Subcommand, ValueEnum};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_matrix::encoder::{MatrixEncoder, OUTPUT_FORMAT};
use event_matrix::render::{self, RenderOptions};
use event_matrix::schema::{RecordAdapter, UserId, RECORD_FORMAT};
use event_matrix::stats::{self, ColumnSummary};
use event_matrix::{
    EventMatrix, InputFormat, MatrixProcessor, PipelineError, MATRIX_VERSION, PRODUCER_NAME,
};

/// evmatrix - Per-user event count matrices from analytics event logs
#[derive(Parser)]
#[command(name = "evmatrix")]
#[command(version = MATRIX_VERSION)]
#[command(about = "Aggregate analytics events into a user × event count matrix", long_about = None)]
struct Cli {
    /// Log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline and print the normalized matrix
    Build {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormatArg,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "table")]
        output_format: OutputFormat,

        /// Only the first N users
        #[arg(long, conflicts_with = "tail")]
        head: Option<usize>,

        /// Only the last N users
        #[arg(long)]
        tail: Option<usize>,

        /// Elide the middle of tables longer than this
        #[arg(long)]
        max_rows: Option<usize>,
    },

    /// Summary statistics (count, mean, std, quartiles) per event column
    Describe {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormatArg,

        /// Only summarize this event
        #[arg(long)]
        column: Option<String>,

        /// Only include users who triggered this event at least once
        #[arg(long)]
        nonzero: Option<String>,

        /// Digits after the decimal point
        #[arg(long, default_value = "2")]
        precision: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract every user's count for one event
    Column {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormatArg,

        /// Event name
        #[arg(short, long)]
        event: String,

        /// Only users with a count above zero
        #[arg(long)]
        nonzero: bool,

        /// Number of users per count value instead of the raw column
        #[arg(long)]
        value_counts: bool,

        /// Also print the most frequent count(s)
        #[arg(long)]
        mode: bool,

        /// Single user to look up
        #[arg(long)]
        user: Option<String>,

        /// Elide the middle of columns longer than this
        #[arg(long)]
        max_rows: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report records missing `event` or `properties.user_id`
    Validate {
        /// Input file path (use - for stdin)
        #[arg(short, long, default_value = "-")]
        input: PathBuf,

        /// Input format
        #[arg(long, default_value = "json")]
        input_format: InputFormatArg,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
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

#[derive(Clone, Copy, ValueEnum)]
enum InputFormatArg {
    /// JSON array of records
    Json,
    /// Newline-delimited JSON (one record per line)
    Ndjson,
}

impl From<InputFormatArg> for InputFormat {
    fn from(arg: InputFormatArg) -> Self {
        match arg {
            InputFormatArg::Json => InputFormat::Json,
            InputFormatArg::Ndjson => InputFormat::Ndjson,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Aligned text table
    Table,
    /// Comma-separated values
    Csv,
    /// Compact JSON payload
    Json,
    /// Pretty-printed JSON payload
    JsonPretty,
}

#[derive(Clone, ValueEnum)]
enum SchemaType {
    /// Input schema (analytics.event_log.v1)
    Input,
    /// Output schema (analytics.event_matrix.v1)
    Output,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr `tracing` subscriber
fn setup_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .init();
}

fn run(cli: Cli) -> Result<(), MatrixCliError> {
    match cli.command {
        Commands::Build {
            input,
            input_format,
            output,
            output_format,
            head,
            tail,
            max_rows,
        } => cmd_build(
            &input,
            input_format.into(),
            &output,
            output_format,
            head,
            tail,
            max_rows,
        ),

        Commands::Describe {
            input,
            input_format,
            column,
            nonzero,
            precision,
            json,
        } => cmd_describe(
            &input,
            input_format.into(),
            column.as_deref(),
            nonzero.as_deref(),
            precision,
            json,
        ),

        Commands::Column {
            input,
            input_format,
            event,
            nonzero,
            value_counts,
            mode,
            user,
            max_rows,
            json,
        } => cmd_column(
            &input,
            input_format.into(),
            &event,
            ColumnFlags {
                nonzero,
                value_counts,
                mode,
                user,
                max_rows,
                json,
            },
        ),

        Commands::Validate {
            input,
            input_format,
            json,
        } => cmd_validate(&input, input_format.into(), json),

        Commands::Schema {
            schema_type,
            json_schema,
        } => cmd_schema(schema_type, json_schema),
    }
}

fn cmd_build(
    input: &Path,
    input_format: InputFormat,
    output: &Path,
    output_format: OutputFormat,
    head: Option<usize>,
    tail: Option<usize>,
    max_rows: Option<usize>,
) -> Result<(), MatrixCliError> {
    let mut matrix = load_matrix(input, input_format)?;

    if let Some(n) = head {
        matrix = matrix.head(n);
    }
    if let Some(n) = tail {
        matrix = matrix.tail(n);
    }

    let options = RenderOptions {
        max_rows,
        ..RenderOptions::default()
    };

    let output_data = match output_format {
        OutputFormat::Table => render::render_matrix(&matrix, &options),
        OutputFormat::Csv => render::render_csv(&matrix),
        OutputFormat::Json => MatrixEncoder::new().encode_to_json(&matrix)? + "\n",
        OutputFormat::JsonPretty => MatrixEncoder::pretty().encode_to_json(&matrix)? + "\n",
    };

    write_output(output, &output_data)
}

fn cmd_describe(
    input: &Path,
    input_format: InputFormat,
    column: Option<&str>,
    nonzero: Option<&str>,
    precision: usize,
    json: bool,
) -> Result<(), MatrixCliError> {
    let mut matrix = load_matrix(input, input_format)?;

    if let Some(event) = nonzero {
        matrix = matrix
            .filter_rows(event, |count| count > 0)
            .ok_or_else(|| PipelineError::UnknownEvent(event.to_string()))?;
    }

    let mut summaries = stats::describe_matrix(&matrix);
    if let Some(event) = column {
        let summary: ColumnSummary = summaries
            .swap_remove(event)
            .ok_or_else(|| PipelineError::UnknownEvent(event.to_string()))?;
        summaries.clear();
        summaries.insert(event.to_string(), summary);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        let options = RenderOptions {
            precision,
            ..RenderOptions::default()
        };
        print!("{}", render::render_summaries(&summaries, &options));
    }

    Ok(())
}

struct ColumnFlags {
    nonzero: bool,
    value_counts: bool,
    mode: bool,
    user: Option<String>,
    max_rows: Option<usize>,
    json: bool,
}

fn cmd_column(
    input: &Path,
    input_format: InputFormat,
    event: &str,
    flags: ColumnFlags,
) -> Result<(), MatrixCliError> {
    let matrix = load_matrix(input, input_format)?;

    if let Some(user) = flags.user.as_deref() {
        let user_id = UserId::parse_lossy(user);
        if matrix.row_position(&user_id).is_none() {
            return Err(PipelineError::UnknownUser(user.to_string()).into());
        }
        let count = matrix
            .get(&user_id, event)
            .ok_or_else(|| PipelineError::UnknownEvent(event.to_string()))?;
        println!("{}", count);
        return Ok(());
    }

    let mut column = matrix
        .column(event)
        .ok_or_else(|| PipelineError::UnknownEvent(event.to_string()))?;
    if flags.nonzero {
        column = column.nonzero();
    }

    let counts = column.counts();
    let value_counts = flags.value_counts.then(|| stats::value_counts(&counts));
    let mode = flags.mode.then(|| stats::mode(&counts));

    if flags.json {
        let report = ColumnReport {
            event: column.event.clone(),
            values: (!flags.value_counts).then(|| column.values.clone()),
            value_counts,
            mode,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &value_counts {
        Some(vc) => print!("{}", render::render_value_counts(&column.event, vc)),
        None => {
            let options = RenderOptions {
                max_rows: flags.max_rows,
                ..RenderOptions::default()
            };
            print!("{}", render::render_column(&column, &options));
        }
    }
    if let Some(mode) = mode {
        let shown: Vec<String> = mode.iter().map(u64::to_string).collect();
        println!("Mode: {}", shown.join(", "));
    }

    Ok(())
}

fn cmd_validate(input: &Path, input_format: InputFormat, json: bool) -> Result<(), MatrixCliError> {
    let input_data = read_input(input)?;
    let records = MatrixProcessor::new(input_format).parse(&input_data)?;

    let results = RecordAdapter::validate_records(&records);

    let report = ValidationReport {
        total_records: records.len(),
        valid_records: records.len() - results.len(),
        invalid_records: results.len(),
        errors: results
            .iter()
            .map(|r| ValidationErrorDetail {
                index: r.index,
                event: r.event.clone(),
                field: r.error.field().to_string(),
                error: r.error.to_string(),
            })
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total records:   {}", report.total_records);
        println!("Valid records:   {}", report.valid_records);
        println!("Invalid records: {}", report.invalid_records);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!(
                    "  - Record {} ({}): {}",
                    err.index,
                    err.event.as_deref().unwrap_or("unnamed"),
                    err.error
                );
            }
        }
    }

    if report.invalid_records > 0 {
        Err(MatrixCliError::ValidationFailed(report.invalid_records))
    } else {
        Ok(())
    }
}

fn cmd_schema(schema_type: SchemaType, json_schema: bool) -> Result<(), MatrixCliError> {
    match schema_type {
        SchemaType::Input => {
            if json_schema {
                println!("{}", get_input_json_schema());
            } else {
                println!("Input Schema: {}", RECORD_FORMAT);
                println!();
                println!("A JSON array (or NDJSON stream) of event records:");
                println!();
                println!("  {{\"event\": \"<event name>\", \"properties\": {{\"user_id\": <int|string>, ...}}}}");
                println!();
                println!("- event: event name (required)");
                println!("- properties.user_id: user identifier, integer or string (required)");
                println!("- any other properties are accepted and ignored");
            }
        }
        SchemaType::Output => {
            if json_schema {
                println!("{}", get_output_json_schema());
            } else {
                println!("Output Schema: {}", OUTPUT_FORMAT);
                println!();
                println!("- format, producer {{ name, version }}, computed_at_utc");
                println!("- shape: [users, events]");
                println!("- users: row labels, sorted (integers before strings)");
                println!("- events: column labels, sorted by name");
                println!("- counts: row-major occurrence counts; 0 where a user never triggered an event");
            }
        }
    }

    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, MatrixCliError> {
    if input.to_string_lossy() == "-" {
        if atty::is(atty::Stream::Stdin) {
            return Err(MatrixCliError::StdinIsTerminal);
        }
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn load_matrix(input: &Path, input_format: InputFormat) -> Result<EventMatrix, MatrixCliError> {
    let input_data = read_input(input)?;
    let matrix = MatrixProcessor::new(input_format).process(&input_data)?;

    let (users, events) = matrix.shape();
    tracing::info!(users, events, "event matrix ready");
    Ok(matrix)
}

fn write_output(output: &Path, data: &str) -> Result<(), MatrixCliError> {
    if output.to_string_lossy() == "-" {
        print!("{}", data);
    } else {
        fs::write(output, data)?;
    }
    Ok(())
}

fn get_input_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": RECORD_FORMAT,
        "description": "Analytics event record",
        "type": "object",
        "required": ["event", "properties"],
        "properties": {
            "event": { "type": "string" },
            "properties": {
                "type": "object",
                "required": ["user_id"],
                "properties": {
                    "user_id": { "type": ["integer", "string"] }
                },
                "additionalProperties": true
            }
        }
    })
    .to_string()
}

fn get_output_json_schema() -> String {
    serde_json::json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": OUTPUT_FORMAT,
        "description": "Per-user event count matrix",
        "type": "object",
        "required": ["format", "producer", "computed_at_utc", "shape", "users", "events", "counts"],
        "properties": {
            "format": { "type": "string", "const": OUTPUT_FORMAT },
            "producer": {
                "type": "object",
                "properties": {
                    "name": { "type": "string", "const": PRODUCER_NAME },
                    "version": { "type": "string" }
                }
            },
            "computed_at_utc": { "type": "string", "format": "date-time" },
            "shape": {
                "type": "array",
                "items": { "type": "integer", "minimum": 0 },
                "minItems": 2,
                "maxItems": 2
            },
            "users": { "type": "array", "items": { "type": ["integer", "string"] } },
            "events": { "type": "array", "items": { "type": "string" } },
            "counts": {
                "type": "array",
                "items": { "type": "array", "items": { "type": "integer", "minimum": 0 } }
            }
        }
    })
    .to_string()
}

// Error types

#[derive(Debug)]
enum MatrixCliError {
    Io(io::Error),
    Pipeline(PipelineError),
    Json(serde_json::Error),
    ValidationFailed(usize),
    StdinIsTerminal,
}

impl From<io::Error> for MatrixCliError {
    fn from(e: io::Error) -> Self {
        MatrixCliError::Io(e)
    }
}

impl From<PipelineError> for MatrixCliError {
    fn from(e: PipelineError) -> Self {
        MatrixCliError::Pipeline(e)
    }
}

impl From<serde_json::Error> for MatrixCliError {
    fn from(e: serde_json::Error) -> Self {
        MatrixCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<MatrixCliError> for CliError {
    fn from(e: MatrixCliError) -> Self {
        match e {
            MatrixCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            MatrixCliError::Pipeline(e @ PipelineError::MalformedRecord { .. }) => CliError {
                code: "MALFORMED_RECORD".to_string(),
                message: e.to_string(),
                hint: Some("Run 'evmatrix validate' to list every malformed record".to_string()),
            },
            MatrixCliError::Pipeline(e @ PipelineError::UnknownEvent(_)) => CliError {
                code: "UNKNOWN_EVENT".to_string(),
                message: e.to_string(),
                hint: Some("Event names are case-sensitive".to_string()),
            },
            MatrixCliError::Pipeline(e @ PipelineError::UnknownUser(_)) => CliError {
                code: "UNKNOWN_USER".to_string(),
                message: e.to_string(),
                hint: None,
            },
            MatrixCliError::Pipeline(e) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: e.to_string(),
                hint: Some(format!("Ensure input matches {} schema", RECORD_FORMAT)),
            },
            MatrixCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            MatrixCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} records failed validation", count),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            MatrixCliError::StdinIsTerminal => CliError {
                code: "NO_INPUT".to_string(),
                message: "stdin is a terminal and no input file was given".to_string(),
                hint: Some("Pass --input <file> or pipe an event log into stdin".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_records: usize,
    valid_records: usize,
    invalid_records: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    index: usize,
    event: Option<String>,
    field: String,
    error: String,
}

#[derive(serde::Serialize)]
struct ColumnReport {
    event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    values: Option<indexmap::IndexMap<UserId, u64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_counts: Option<BTreeMap<u64, usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mode: Option<Vec<u64>>,
}
