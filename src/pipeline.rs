//! Pipeline orchestration
//!
//! This module provides the public API for event-matrix.
//! It runs the full pipeline from a serialized event log to the finished
//! user × event count matrix.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assembler::TableAssembler;
use crate::counter::EventCounter;
use crate::error::PipelineError;
use crate::grouper::RecordGrouper;
use crate::matrix::MatrixBuilder;
use crate::normalizer::Normalizer;
use crate::schema::{EventSource, RawEventRecord, RecordAdapter};
use crate::table::{EventMatrix, RawMatrix};
use crate::types::{UserEventCounts, UserEventLog, UserVectors};

/// Serialized layout of an event log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputFormat {
    /// JSON array of records
    #[default]
    Json,
    /// Newline-delimited JSON, one record per line
    Ndjson,
}

/// Convert a JSON array of event records into an event matrix.
///
/// # Example
/// ```
/// use event_matrix::schema::UserId;
///
/// let json = r#"[
///     {"event": "login", "properties": {"user_id": 1}},
///     {"event": "login", "properties": {"user_id": 1}},
///     {"event": "purchase", "properties": {"user_id": 2}}
/// ]"#;
/// let matrix = event_matrix::json_to_matrix(json).unwrap();
/// assert_eq!(matrix.get(&UserId::from(1), "login"), Some(2));
/// assert_eq!(matrix.get(&UserId::from(2), "login"), Some(0));
/// ```
pub fn json_to_matrix(json: &str) -> Result<EventMatrix, PipelineError> {
    MatrixProcessor::new(InputFormat::Json).process(json)
}

/// Convert an NDJSON event log into an event matrix.
pub fn ndjson_to_matrix(ndjson: &str) -> Result<EventMatrix, PipelineError> {
    MatrixProcessor::new(InputFormat::Ndjson).process(ndjson)
}

/// Run the pipeline over records already in memory.
///
/// Pipeline stages:
/// 1. RecordGrouper - Group event names by user
/// 2. EventCounter - Count occurrences per user
/// 3. TableAssembler - One labeled vector per user
/// 4. MatrixBuilder - Union the vectors and transpose to users × events
/// 5. Normalizer - Fill undefined cells with zero
pub fn records_to_matrix<S: EventSource>(records: &[S]) -> Result<EventMatrix, PipelineError> {
    run_stages(records).map(|stages| stages.matrix)
}

/// Every intermediate structure of one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineStages {
    pub log: UserEventLog,
    pub counts: UserEventCounts,
    pub vectors: UserVectors,
    pub raw: RawMatrix,
    pub matrix: EventMatrix,
}

fn run_stages<S: EventSource>(records: &[S]) -> Result<PipelineStages, PipelineError> {
    if records.is_empty() {
        warn!("event log is empty; producing an empty matrix");
    }

    // Stage 1: Group records; a malformed record aborts the run here
    let log = RecordGrouper::group(records)?;

    // Stage 2: Count occurrences
    let counts = EventCounter::count(&log);

    // Stage 3: Assemble labeled vectors
    let vectors = TableAssembler::assemble(&counts);

    // Stage 4: Build and transpose
    let raw = MatrixBuilder::build(&vectors);

    // Stage 5: Normalize
    let matrix = Normalizer::normalize(&raw);

    Ok(PipelineStages {
        log,
        counts,
        vectors,
        raw,
        matrix,
    })
}

/// Processor bound to one input format.
///
/// Use this when the intermediate stages are needed, or when the same
/// format is read repeatedly.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixProcessor {
    format: InputFormat,
}

impl MatrixProcessor {
    pub fn new(format: InputFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> InputFormat {
        self.format
    }

    /// Parse input into wire records without running the pipeline
    pub fn parse(&self, input: &str) -> Result<Vec<RawEventRecord>, PipelineError> {
        let records = match self.format {
            InputFormat::Json => RecordAdapter::parse_array(input)?,
            InputFormat::Ndjson => RecordAdapter::parse_ndjson(input)?,
        };
        debug!(records = records.len(), format = ?self.format, "parsed event log");
        Ok(records)
    }

    /// Parse and run the full pipeline
    pub fn process(&self, input: &str) -> Result<EventMatrix, PipelineError> {
        let records = self.parse(input)?;
        records_to_matrix(&records)
    }

    /// Parse and run the full pipeline, keeping every intermediate stage
    pub fn process_stages(&self, input: &str) -> Result<PipelineStages, PipelineError> {
        let records = self.parse(input)?;
        run_stages(&records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EventRecord, UserId};
    use pretty_assertions::assert_eq;

    fn sample_json() -> &'static str {
        r#"[
            {"event": "login", "properties": {"user_id": 1}},
            {"event": "login", "properties": {"user_id": 1}},
            {"event": "purchase", "properties": {"user_id": 2}}
        ]"#
    }

    #[test]
    fn test_json_to_matrix_end_to_end() {
        let matrix = json_to_matrix(sample_json()).unwrap();

        assert_eq!(matrix.users(), &[UserId::from(1), UserId::from(2)]);
        assert_eq!(matrix.events(), &["login".to_string(), "purchase".to_string()]);

        let first = matrix.row(&UserId::from(1)).unwrap();
        assert_eq!(first["login"], 2);
        assert_eq!(first["purchase"], 0);

        let second = matrix.row(&UserId::from(2)).unwrap();
        assert_eq!(second["login"], 0);
        assert_eq!(second["purchase"], 1);
    }

    #[test]
    fn test_ndjson_matches_json() {
        let ndjson = r#"{"event": "login", "properties": {"user_id": 1}}
{"event": "login", "properties": {"user_id": 1}}
{"event": "purchase", "properties": {"user_id": 2}}
"#;
        assert_eq!(
            ndjson_to_matrix(ndjson).unwrap(),
            json_to_matrix(sample_json()).unwrap()
        );
    }

    #[test]
    fn test_empty_input_is_empty_matrix() {
        let matrix = json_to_matrix("[]").unwrap();
        assert_eq!(matrix.shape(), (0, 0));

        let matrix = ndjson_to_matrix("\n\n").unwrap();
        assert!(matrix.is_empty());
    }

    #[test]
    fn test_missing_user_id_aborts() {
        let json = r#"[
            {"event": "login", "properties": {"user_id": 1}},
            {"event": "purchase", "properties": {"plan": "pro"}}
        ]"#;

        let result = json_to_matrix(json);
        assert!(matches!(
            result,
            Err(PipelineError::MalformedRecord {
                index: 1,
                field: "properties.user_id"
            })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(json_to_matrix("not valid json").is_err());
    }

    #[test]
    fn test_records_to_matrix_from_validated_records() {
        let records = vec![
            EventRecord::new("PhotoUpload", "alice"),
            EventRecord::new("PhotoUpload", "alice"),
            EventRecord::new("login", "bob"),
        ];

        let matrix = records_to_matrix(&records).unwrap();
        assert_eq!(matrix.get(&UserId::from("alice"), "PhotoUpload"), Some(2));
        assert_eq!(matrix.get(&UserId::from("bob"), "PhotoUpload"), Some(0));
    }

    #[test]
    fn test_process_stages_exposes_intermediates() {
        let stages = MatrixProcessor::new(InputFormat::Json)
            .process_stages(sample_json())
            .unwrap();

        assert_eq!(stages.log.total_events(), 3);
        assert_eq!(stages.counts.total(&UserId::from(1)), 2);
        assert_eq!(stages.vectors.len(), 2);
        assert_eq!(stages.raw.undefined_count(), 2);
        assert_eq!(stages.matrix.shape(), (2, 2));
    }

    #[test]
    fn test_mixed_user_id_kinds() {
        let json = r#"[
            {"event": "login", "properties": {"user_id": "guest"}},
            {"event": "login", "properties": {"user_id": 7}}
        ]"#;

        let matrix = json_to_matrix(json).unwrap();
        assert_eq!(matrix.users(), &[UserId::from(7), UserId::from("guest")]);
    }

    #[test]
    fn test_unsigned_user_id_above_i64_range() {
        let json = r#"[
            {"event": "login", "properties": {"user_id": 18446744073709551615}},
            {"event": "login", "properties": {"user_id": 3}}
        ]"#;

        let matrix = json_to_matrix(json).unwrap();
        assert_eq!(matrix.users(), &[UserId::from(3), UserId::from(u64::MAX)]);
        assert_eq!(matrix.get(&UserId::from(u64::MAX), "login"), Some(1));
    }
}
