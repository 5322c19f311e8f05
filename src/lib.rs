//! event-matrix - per-user event count matrices from analytics event logs
//!
//! event-matrix turns a flat log of `{event, properties.user_id}` records into a
//! dense user × event table of trigger counts through a deterministic
//! pipeline: grouping → counting → assembly → matrix building (with
//! transpose) → normalization.
//!
//! ## Modules
//!
//! - **Pipeline**: the five aggregation stages and the one-shot entry points
//! - **Stats / Render / Encoder**: read-only views over a finished matrix

pub mod assembler;
pub mod counter;
pub mod encoder;
pub mod error;
pub mod grouper;
pub mod matrix;
pub mod normalizer;
pub mod pipeline;
pub mod render;
pub mod schema;
pub mod stats;
pub mod table;
pub mod types;

pub use error::PipelineError;
pub use pipeline::{
    json_to_matrix, ndjson_to_matrix, records_to_matrix, InputFormat, MatrixProcessor,
    PipelineStages,
};
pub use table::{Column, EventMatrix, RawMatrix};

// Schema exports
pub use schema::{EventRecord, EventSource, RawEventRecord, RecordAdapter, UserId, RECORD_FORMAT};

/// Version embedded in encoded matrix payloads
pub const MATRIX_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for encoded matrix payloads
pub const PRODUCER_NAME: &str = "event-matrix";
