//! Table assembly
//!
//! Turns per-user counts into one labeled vector per user.

use tracing::debug;

use crate::types::{LabeledVector, UserEventCounts, UserVectors};

/// Assembles labeled vectors from per-user counts
pub struct TableAssembler;

impl TableAssembler {
    /// One vector per user, labels in the order their counts were recorded.
    ///
    /// Users without events get an empty vector rather than being dropped.
    pub fn assemble(counts: &UserEventCounts) -> UserVectors {
        let vectors: UserVectors = counts
            .iter()
            .map(|(user, events)| {
                let vector: LabeledVector = events
                    .iter()
                    .map(|(event, count)| (event.clone(), *count))
                    .collect();
                (user.clone(), vector)
            })
            .collect();

        debug!(vectors = vectors.len(), "assembled per-user vectors");
        vectors
    }
}
