//! Matrix JSON encoding
//!
//! This module encodes a finished event matrix into a self-describing JSON
//! payload. Counts are written row-major in the order of `users` × `events`.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::schema::UserId;
use crate::table::{EventMatrix, Table};
use crate::{MATRIX_VERSION, PRODUCER_NAME};

/// Current output payload format
pub const OUTPUT_FORMAT: &str = "analytics.event_matrix.v1";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixProducer {
    pub name: String,
    pub version: String,
}

/// JSON form of an event matrix
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixPayload {
    pub format: String,
    pub producer: MatrixProducer,
    pub computed_at_utc: String,
    /// (rows, columns)
    pub shape: (usize, usize),
    pub users: Vec<UserId>,
    pub events: Vec<String>,
    pub counts: Vec<Vec<u64>>,
}

impl MatrixPayload {
    /// Rebuild the matrix; fails if `shape` or `counts` does not match the axes
    pub fn into_matrix(self) -> Result<EventMatrix, PipelineError> {
        let axes = (self.users.len(), self.events.len());
        if self.shape != axes {
            return Err(PipelineError::ParseError(format!(
                "shape {:?} does not match {} users × {} events",
                self.shape, axes.0, axes.1
            )));
        }
        Table::from_parts(self.users, self.events, self.counts).ok_or_else(|| {
            PipelineError::ParseError("counts do not match users × events".to_string())
        })
    }
}

/// Encoder for matrix JSON payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct MatrixEncoder {
    pretty: bool,
}

impl MatrixEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoder that emits indented JSON
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    /// Encode a matrix into a payload
    pub fn encode(&self, matrix: &EventMatrix) -> MatrixPayload {
        MatrixPayload {
            format: OUTPUT_FORMAT.to_string(),
            producer: MatrixProducer {
                name: PRODUCER_NAME.to_string(),
                version: MATRIX_VERSION.to_string(),
            },
            computed_at_utc: Utc::now().to_rfc3339(),
            shape: matrix.shape(),
            users: matrix.users().to_vec(),
            events: matrix.events().to_vec(),
            counts: matrix.rows().map(|(_, cells)| cells.to_vec()).collect(),
        }
    }

    /// Encode to JSON string
    pub fn encode_to_json(&self, matrix: &EventMatrix) -> Result<String, PipelineError> {
        let payload = self.encode(matrix);
        let json = if self.pretty {
            serde_json::to_string_pretty(&payload)?
        } else {
            serde_json::to_string(&payload)?
        };
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::json_to_matrix;
    use pretty_assertions::assert_eq;

    fn sample_matrix() -> EventMatrix {
        json_to_matrix(
            r#"[
                {"event": "login", "properties": {"user_id": 1}},
                {"event": "login", "properties": {"user_id": 1}},
                {"event": "purchase", "properties": {"user_id": "guest"}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_encode_payload_fields() {
        let json = MatrixEncoder::new().encode_to_json(&sample_matrix()).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(payload["format"], OUTPUT_FORMAT);
        assert_eq!(payload["producer"]["name"], PRODUCER_NAME);
        assert_eq!(payload["shape"], serde_json::json!([2, 2]));
        assert_eq!(payload["users"], serde_json::json!([1, "guest"]));
        assert_eq!(payload["events"], serde_json::json!(["login", "purchase"]));
        assert_eq!(payload["counts"], serde_json::json!([[2, 0], [0, 1]]));
        assert!(payload["computed_at_utc"].as_str().is_some());
    }

    #[test]
    fn test_payload_rebuilds_matrix() {
        let matrix = sample_matrix();
        let json = MatrixEncoder::pretty().encode_to_json(&matrix).unwrap();
        assert!(json.contains('\n'));

        let payload: MatrixPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(payload.into_matrix().unwrap(), matrix);
    }

    #[test]
    fn test_payload_with_wrong_shape_is_rejected() {
        let mut payload = MatrixEncoder::new().encode(&sample_matrix());
        payload.shape = (5, 5);

        match payload.into_matrix() {
            Err(PipelineError::ParseError(msg)) => assert!(msg.contains("(5, 5)"), "{}", msg),
            other => panic!("expected a shape error, got {:?}", other),
        }
    }

    #[test]
    fn test_mismatched_payload_is_rejected() {
        let mut payload = MatrixEncoder::new().encode(&sample_matrix());
        payload.counts.pop();
        assert!(payload.into_matrix().is_err());
    }
}
