//! Record grouping
//!
//! First pipeline stage: collects each user's event names in input order.

use tracing::debug;

use crate::error::PipelineError;
use crate::schema::{EventSource, ValidationError};
use crate::types::UserEventLog;

/// Groups raw records by user
pub struct RecordGrouper;

impl RecordGrouper {
    /// Group records into a per-user event log.
    ///
    /// Fails on the first record that lacks an event name or a user id; no
    /// partial log is returned.
    pub fn group<S: EventSource>(records: &[S]) -> Result<UserEventLog, PipelineError> {
        let mut log = UserEventLog::new();

        for (index, record) in records.iter().enumerate() {
            let event = record
                .event_name()
                .ok_or_else(|| ValidationError::MissingEvent.into_pipeline_error(index))?;
            let user = record
                .user_id()
                .ok_or_else(|| ValidationError::MissingUserId.into_pipeline_error(index))?;

            log.push(user.clone(), event);
        }

        debug!(
            records = records.len(),
            users = log.len(),
            "grouped records by user"
        );
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{EventRecord, RawEventRecord, UserId};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_group_preserves_per_user_order() {
        let records = vec![
            EventRecord::new("login", 1),
            EventRecord::new("view", 2),
            EventRecord::new("purchase", 1),
            EventRecord::new("login", 1),
        ];

        let log = RecordGrouper::group(&records).unwrap();

        assert_eq!(log.len(), 2);
        assert_eq!(
            log.get(&UserId::from(1)).unwrap(),
            &["login".to_string(), "purchase".to_string(), "login".to_string()]
        );
        assert_eq!(log.get(&UserId::from(2)).unwrap(), &["view".to_string()]);
    }

    #[test]
    fn test_group_empty_input() {
        let records: Vec<EventRecord> = Vec::new();
        let log = RecordGrouper::group(&records).unwrap();
        assert!(log.is_empty());
    }

    #[test]
    fn test_group_rejects_missing_user_id() {
        let records: Vec<RawEventRecord> = serde_json::from_str(
            r#"[
                {"event": "login", "properties": {"user_id": 1}},
                {"event": "login", "properties": {}}
            ]"#,
        )
        .unwrap();

        let err = RecordGrouper::group(&records).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedRecord {
                index: 1,
                field: "properties.user_id"
            }
        ));
    }

    #[test]
    fn test_group_rejects_missing_event() {
        let records: Vec<RawEventRecord> =
            serde_json::from_str(r#"[{"properties": {"user_id": "a"}}]"#).unwrap();

        let err = RecordGrouper::group(&records).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MalformedRecord {
                index: 0,
                field: "event"
            }
        ));
    }
}
