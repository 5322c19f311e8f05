//! Matrix normalization
//!
//! Final pipeline stage:
//! - Undefined (user, event) cells become 0
//! - Every cell is fixed to `u64`

use tracing::debug;

use crate::table::{EventMatrix, RawMatrix};

/// Normalizer for converting a raw matrix into the delivered event matrix
pub struct Normalizer;

impl Normalizer {
    /// Fill undefined cells with zero and fix the cell type
    pub fn normalize(matrix: &RawMatrix) -> EventMatrix {
        let filled = matrix.undefined_count();
        let normalized = matrix.map_cells(|cell| cell.unwrap_or(0));

        debug!(filled, "normalized event matrix");
        normalized
    }
}
