//! Event counting
//!
//! Reduces each user's ordered event sequence to occurrence counts.

use indexmap::IndexMap;
use tracing::debug;

use crate::types::{UserEventCounts, UserEventLog};

/// Counts event occurrences per user
pub struct EventCounter;

impl EventCounter {
    /// Count occurrences per user.
    ///
    /// Repeated names share one counter; names keep the order in which the
    /// user first triggered them.
    pub fn count(log: &UserEventLog) -> UserEventCounts {
        let mut counts = UserEventCounts::new();

        for (user, events) in log.iter() {
            counts.insert(user.clone(), tally(events));
        }

        debug!(users = counts.len(), "counted events per user");
        counts
    }
}

fn tally(events: &[String]) -> IndexMap<String, u64> {
    let mut tally: IndexMap<String, u64> = IndexMap::new();
    for event in events {
        *tally.entry(event.clone()).or_insert(0) += 1;
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::UserId;
    use pretty_assertions::assert_eq;

    fn sample_log() -> UserEventLog {
        let mut log = UserEventLog::new();
        for event in ["PhotoUpload", "login", "PhotoUpload", "PhotoUpload"] {
            log.push(UserId::from(1234), event);
        }
        log.push(UserId::from(567), "login");
        log
    }

    #[test]
    fn test_count_merges_repeated_names() {
        let counts = EventCounter::count(&sample_log());

        assert_eq!(counts.count(&UserId::from(1234), "PhotoUpload"), Some(3));
        assert_eq!(counts.count(&UserId::from(1234), "login"), Some(1));
        assert_eq!(counts.count(&UserId::from(567), "login"), Some(1));
        assert_eq!(counts.count(&UserId::from(567), "PhotoUpload"), None);
    }

    #[test]
    fn test_count_keeps_first_seen_label_order() {
        let counts = EventCounter::count(&sample_log());
        let labels: Vec<&String> = counts.get(&UserId::from(1234)).unwrap().keys().collect();
        assert_eq!(labels, vec!["PhotoUpload", "login"]);
    }

    #[test]
    fn test_count_conserves_occurrences() {
        let log = sample_log();
        let counts = EventCounter::count(&log);

        for (user, events) in log.iter() {
            assert_eq!(counts.total(user), events.len() as u64);
        }
    }

    #[test]
    fn test_user_without_events_keeps_empty_entry() {
        let mut log = UserEventLog::new();
        log.touch(UserId::from("idle"));

        let counts = EventCounter::count(&log);
        assert_eq!(counts.len(), 1);
        assert!(counts.get(&UserId::from("idle")).unwrap().is_empty());
    }
}
