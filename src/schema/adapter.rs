//! Adapter for reading analytics event logs
//!
//! Parses JSON arrays and NDJSON streams into wire records, and checks them
//! for the two fields the pipeline depends on.

use crate::error::PipelineError;
use crate::schema::record::*;

/// Adapter for converting serialized event logs into records
pub struct RecordAdapter;

impl RecordAdapter {
    /// Parse a JSON string containing an array of records
    pub fn parse_array(json: &str) -> Result<Vec<RawEventRecord>, PipelineError> {
        let records: Vec<RawEventRecord> = serde_json::from_str(json)?;
        Ok(records)
    }

    /// Parse NDJSON (newline-delimited JSON) containing records
    pub fn parse_ndjson(ndjson: &str) -> Result<Vec<RawEventRecord>, PipelineError> {
        let mut records = Vec::new();
        for (line_num, line) in ndjson.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawEventRecord>(trimmed) {
                Ok(record) => records.push(record),
                Err(e) => {
                    return Err(PipelineError::ParseError(format!(
                        "Failed to parse line {}: {}",
                        line_num + 1,
                        e
                    )));
                }
            }
        }
        Ok(records)
    }

    /// Convert wire records into validated records, stopping at the first
    /// malformed one
    pub fn to_records(records: &[RawEventRecord]) -> Result<Vec<EventRecord>, PipelineError> {
        records
            .iter()
            .enumerate()
            .map(|(idx, record)| record.to_record(idx))
            .collect()
    }

    /// Validate a batch of records, returning one entry per malformed record
    pub fn validate_records(records: &[RawEventRecord]) -> Vec<ValidationResult> {
        records
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| {
                record.validate().err().map(|error| ValidationResult {
                    index: idx,
                    event: record.event.clone(),
                    error,
                })
            })
            .collect()
    }
}

/// A malformed record found during validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub index: usize,
    /// Event name, when the record had one
    pub event: Option<String>,
    pub error: ValidationError,
}
