//! Intermediate structures produced by the aggregation stages
//!
//! Every structure here keys users in first-seen order and keeps the
//! first-seen order of event names within a user.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::UserId;

/// Ordered event names each user triggered
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserEventLog {
    events: IndexMap<UserId, Vec<String>>,
}

impl UserEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one occurrence of `event` to `user`'s sequence
    pub fn push(&mut self, user: UserId, event: impl Into<String>) {
        self.events.entry(user).or_default().push(event.into());
    }

    /// Register a user without recording any event for them
    pub fn touch(&mut self, user: UserId) {
        self.events.entry(user).or_default();
    }

    pub fn get(&self, user: &UserId) -> Option<&[String]> {
        self.events.get(user).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &[String])> {
        self.events.iter().map(|(u, e)| (u, e.as_slice()))
    }

    pub fn users(&self) -> impl Iterator<Item = &UserId> {
        self.events.keys()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total number of event occurrences across all users
    pub fn total_events(&self) -> usize {
        self.events.values().map(Vec::len).sum()
    }
}

/// Per-user occurrence counts, keyed by event name in first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserEventCounts {
    counts: IndexMap<UserId, IndexMap<String, u64>>,
}

impl UserEventCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, user: UserId, counts: IndexMap<String, u64>) {
        self.counts.insert(user, counts);
    }

    pub fn get(&self, user: &UserId) -> Option<&IndexMap<String, u64>> {
        self.counts.get(user)
    }

    /// Count for a single (user, event) pair
    pub fn count(&self, user: &UserId, event: &str) -> Option<u64> {
        self.counts.get(user).and_then(|c| c.get(event)).copied()
    }

    /// Sum of a user's counts
    pub fn total(&self, user: &UserId) -> u64 {
        self.counts
            .get(user)
            .map(|c| c.values().sum())
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &IndexMap<String, u64>)> {
        self.counts.iter()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

/// One user's counts as a labeled vector: event names are labels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LabeledVector {
    entries: IndexMap<String, u64>,
}

impl LabeledVector {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.values().copied()
    }

    pub fn get(&self, label: &str) -> Option<u64> {
        self.entries.get(label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, u64)> for LabeledVector {
    fn from_iter<I: IntoIterator<Item = (String, u64)>>(iter: I) -> Self {
        LabeledVector {
            entries: iter.into_iter().collect(),
        }
    }
}

/// Labeled vectors keyed by user, in first-seen user order
pub type UserVectors = IndexMap<UserId, LabeledVector>;
