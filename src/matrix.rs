//! Matrix building
//!
//! Combines per-user vectors into one table. The natural product is
//! container-oriented: each user's vector becomes a column and the union of
//! event names forms the row axis. [`MatrixBuilder::build`] then transposes
//! it so users are rows and events are columns; the normalizer only accepts
//! the transposed orientation.

use std::collections::BTreeSet;
use tracing::debug;

use crate::schema::UserId;
use crate::table::{ContainerFrame, RawMatrix, Table};
use crate::types::UserVectors;

/// Builds the user × event table from per-user vectors
pub struct MatrixBuilder;

impl MatrixBuilder {
    /// Build the container-oriented frame: rows are events, columns are users.
    ///
    /// Events are sorted by name, users by identifier, so the result does not
    /// depend on the order records arrived in. A cell is `None` when the
    /// user's vector has no entry for that event.
    pub fn frame(vectors: &UserVectors) -> ContainerFrame {
        let events: Vec<String> = vectors
            .values()
            .flat_map(|v| v.labels())
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut users: Vec<&UserId> = vectors.keys().collect();
        users.sort();

        let cells: Vec<Vec<Option<u64>>> = events
            .iter()
            .map(|event| {
                users
                    .iter()
                    .map(|user| vectors.get(*user).and_then(|v| v.get(event)))
                    .collect()
            })
            .collect();

        let users: Vec<UserId> = users.into_iter().cloned().collect();
        Table::from_grid(events, users, cells)
    }

    /// Build the pre-normalization matrix with users on rows.
    pub fn build(vectors: &UserVectors) -> RawMatrix {
        let matrix = Self::frame(vectors).transpose();

        let (rows, cols) = matrix.shape();
        debug!(
            users = rows,
            events = cols,
            undefined = matrix.undefined_count(),
            "built raw event matrix"
        );
        matrix
    }
}
