//! Two-dimensional labeled tables
//!
//! A [`Table`] has a row axis (`index`), a column axis (`columns`) and
//! row-major cells. The pipeline uses three instantiations:
//!
//! - [`ContainerFrame`]: events on the row axis, users on the column axis.
//!   This is the shape the builder produces naturally.
//! - [`RawMatrix`]: users on rows, events on columns, cells possibly undefined.
//! - [`EventMatrix`]: the finished, dense user × event count table.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::schema::UserId;

/// Labeled two-dimensional table with row-major storage
///
/// Every row of `cells` has one entry per column and there is one row per
/// index label. Deserialization enforces the same shape as [`Table::from_parts`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TableParts<R, C, T>")]
pub struct Table<R, C, T> {
    index: Vec<R>,
    columns: Vec<C>,
    cells: Vec<Vec<T>>,
}

/// Unchecked wire form of a [`Table`]
#[derive(Deserialize)]
struct TableParts<R, C, T> {
    index: Vec<R>,
    columns: Vec<C>,
    cells: Vec<Vec<T>>,
}

impl<R, C, T> TryFrom<TableParts<R, C, T>> for Table<R, C, T> {
    type Error = String;

    fn try_from(parts: TableParts<R, C, T>) -> Result<Self, Self::Error> {
        let (rows, cols) = (parts.index.len(), parts.columns.len());
        Table::from_parts(parts.index, parts.columns, parts.cells)
            .ok_or_else(|| format!("cells do not form a {} × {} grid", rows, cols))
    }
}

/// Pre-transpose table: rows are events, columns are users
pub type ContainerFrame = Table<String, UserId, Option<u64>>;

/// Users × events, before undefined cells are filled
pub type RawMatrix = Table<UserId, String, Option<u64>>;

/// Users × events, every cell a defined count
pub type EventMatrix = Table<UserId, String, u64>;

impl<R, C, T> Table<R, C, T> {
    /// Build a table from its axes and row-major cells.
    ///
    /// Returns `None` when the cell grid does not match the axes.
    pub fn from_parts(index: Vec<R>, columns: Vec<C>, cells: Vec<Vec<T>>) -> Option<Self> {
        let fits = cells.len() == index.len() && cells.iter().all(|row| row.len() == columns.len());
        fits.then_some(Table {
            index,
            columns,
            cells,
        })
    }

    /// Build a table whose grid the caller has already shaped to the axes
    pub(crate) fn from_grid(index: Vec<R>, columns: Vec<C>, cells: Vec<Vec<T>>) -> Self {
        debug_assert_eq!(cells.len(), index.len());
        debug_assert!(cells.iter().all(|row| row.len() == columns.len()));
        Table {
            index,
            columns,
            cells,
        }
    }

    /// An empty table with no rows and no columns
    pub fn empty() -> Self {
        Table {
            index: Vec::new(),
            columns: Vec::new(),
            cells: Vec::new(),
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    pub fn index(&self) -> &[R] {
        &self.index
    }

    pub fn columns(&self) -> &[C] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty() && self.columns.is_empty()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&T> {
        self.cells.get(row).and_then(|r| r.get(col))
    }

    /// Iterate rows as (label, cells)
    pub fn rows(&self) -> impl Iterator<Item = (&R, &[T])> {
        self.index
            .iter()
            .zip(self.cells.iter().map(Vec::as_slice))
    }

    /// Swap the axes: rows become columns and columns become rows
    pub fn transpose(self) -> Table<C, R, T> {
        let (n_rows, n_cols) = self.shape();
        let mut transposed: Vec<Vec<T>> = (0..n_cols).map(|_| Vec::with_capacity(n_rows)).collect();

        for row in self.cells {
            for (col, value) in row.into_iter().enumerate() {
                transposed[col].push(value);
            }
        }

        Table {
            index: self.columns,
            columns: self.index,
            cells: transposed,
        }
    }

    /// Apply `f` to every cell, keeping both axes
    pub fn map_cells<U>(&self, mut f: impl FnMut(&T) -> U) -> Table<R, C, U>
    where
        R: Clone,
        C: Clone,
    {
        Table {
            index: self.index.clone(),
            columns: self.columns.clone(),
            cells: self
                .cells
                .iter()
                .map(|row| row.iter().map(&mut f).collect())
                .collect(),
        }
    }

    /// Keep the rows at the given positions, in the given order
    fn select_rows(&self, positions: impl IntoIterator<Item = usize>) -> Self
    where
        R: Clone,
        C: Clone,
        T: Clone,
    {
        let mut index = Vec::new();
        let mut cells = Vec::new();
        for pos in positions {
            index.push(self.index[pos].clone());
            cells.push(self.cells[pos].clone());
        }
        Table {
            index,
            columns: self.columns.clone(),
            cells,
        }
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> Self
    where
        R: Clone,
        C: Clone,
        T: Clone,
    {
        self.select_rows(0..n.min(self.index.len()))
    }

    /// Last `n` rows
    pub fn tail(&self, n: usize) -> Self
    where
        R: Clone,
        C: Clone,
        T: Clone,
    {
        let len = self.index.len();
        self.select_rows(len.saturating_sub(n)..len)
    }
}

impl<R: PartialEq, C: PartialEq, T> Table<R, C, T> {
    pub fn row_position(&self, row: &R) -> Option<usize> {
        self.index.iter().position(|r| r == row)
    }

    pub fn column_position(&self, col: &C) -> Option<usize> {
        self.columns.iter().position(|c| c == col)
    }
}

impl RawMatrix {
    /// Number of cells with no recorded value
    pub fn undefined_count(&self) -> usize {
        self.cells.iter().flatten().filter(|c| c.is_none()).count()
    }
}

/// All users' counts for one event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub event: String,
    pub values: IndexMap<UserId, u64>,
}

impl Column {
    /// Counts in row order
    pub fn counts(&self) -> Vec<u64> {
        self.values.values().copied().collect()
    }

    /// Only the users who triggered the event at least once
    pub fn nonzero(&self) -> Column {
        Column {
            event: self.event.clone(),
            values: self
                .values
                .iter()
                .filter(|(_, v)| **v > 0)
                .map(|(u, v)| (u.clone(), *v))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl EventMatrix {
    pub fn users(&self) -> &[UserId] {
        self.index()
    }

    pub fn events(&self) -> &[String] {
        self.columns()
    }

    fn event_position(&self, event: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == event)
    }

    /// Count for a (user, event) pair; `None` if either label is unknown
    pub fn get(&self, user: &UserId, event: &str) -> Option<u64> {
        let row = self.row_position(user)?;
        let col = self.event_position(event)?;
        self.cell(row, col).copied()
    }

    /// One user's counts keyed by event name
    pub fn row(&self, user: &UserId) -> Option<IndexMap<String, u64>> {
        let row = self.row_position(user)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(self.cells[row].iter().copied())
                .collect(),
        )
    }

    /// Sum of one user's row
    pub fn row_sum(&self, user: &UserId) -> Option<u64> {
        let row = self.row_position(user)?;
        Some(self.cells[row].iter().sum())
    }

    /// Every user's count for one event
    pub fn column(&self, event: &str) -> Option<Column> {
        let col = self.event_position(event)?;
        Some(Column {
            event: event.to_string(),
            values: self
                .index
                .iter()
                .cloned()
                .zip(self.cells.iter().map(|row| row[col]))
                .collect(),
        })
    }

    /// Rows whose value in `event` satisfies `keep`
    pub fn filter_rows(&self, event: &str, keep: impl Fn(u64) -> bool) -> Option<EventMatrix> {
        let col = self.event_position(event)?;
        let positions: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, row)| keep(row[col]))
            .map(|(pos, _)| pos)
            .collect();
        Some(self.select_rows(positions))
    }

    /// Lift back into the pre-normalization type with every cell defined
    pub fn to_raw(&self) -> RawMatrix {
        self.map_cells(|c| Some(*c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_matrix() -> EventMatrix {
        Table::from_parts(
            vec![UserId::from(1), UserId::from(2), UserId::from(3)],
            vec!["login".to_string(), "purchase".to_string()],
            vec![vec![2, 0], vec![0, 1], vec![5, 3]],
        )
        .unwrap()
    }

    #[test]
    fn test_from_parts_rejects_ragged_grid() {
        let table: Option<Table<u8, u8, u8>> =
            Table::from_parts(vec![1, 2], vec![1, 2], vec![vec![0, 0], vec![0]]);
        assert!(table.is_none());
    }

    #[test]
    fn test_deserialize_rejects_ragged_grid() {
        let ragged = r#"{"index":[1,2],"columns":["login","purchase"],"cells":[[1,2],[3]]}"#;
        let err = serde_json::from_str::<EventMatrix>(ragged).unwrap_err();
        assert!(err.to_string().contains("2 × 2"), "{}", err);

        let missing_row = r#"{"index":[1,2],"columns":["login"],"cells":[[1]]}"#;
        assert!(serde_json::from_str::<EventMatrix>(missing_row).is_err());
    }

    #[test]
    fn test_serde_keeps_well_formed_matrix() {
        let matrix = sample_matrix();
        let json = serde_json::to_string(&matrix).unwrap();
        let back: EventMatrix = serde_json::from_str(&json).unwrap();

        assert_eq!(back, matrix);
        assert_eq!(back.column("purchase").unwrap().counts(), vec![0, 1, 3]);
    }

    #[test]
    fn test_transpose_swaps_axes() {
        let frame: ContainerFrame = Table::from_parts(
            vec!["login".to_string(), "purchase".to_string()],
            vec![UserId::from(1), UserId::from(2)],
            vec![vec![Some(2), None], vec![None, Some(1)]],
        )
        .unwrap();

        let raw: RawMatrix = frame.transpose();

        assert_eq!(raw.shape(), (2, 2));
        assert_eq!(raw.index(), &[UserId::from(1), UserId::from(2)]);
        assert_eq!(raw.columns(), &["login".to_string(), "purchase".to_string()]);
        assert_eq!(raw.cell(0, 0), Some(&Some(2)));
        assert_eq!(raw.cell(0, 1), Some(&None));
        assert_eq!(raw.cell(1, 1), Some(&Some(1)));
        assert_eq!(raw.undefined_count(), 2);
    }

    #[test]
    fn test_transpose_of_rowless_table_keeps_columns_as_rows() {
        let frame: ContainerFrame = Table::from_parts(
            Vec::new(),
            vec![UserId::from("idle")],
            Vec::new(),
        )
        .unwrap();

        let raw = frame.transpose();
        assert_eq!(raw.shape(), (1, 0));
    }

    #[test]
    fn test_get_row_and_column() {
        let matrix = sample_matrix();

        assert_eq!(matrix.get(&UserId::from(3), "purchase"), Some(3));
        assert_eq!(matrix.get(&UserId::from(9), "purchase"), None);
        assert_eq!(matrix.get(&UserId::from(1), "logout"), None);
        assert_eq!(matrix.row_sum(&UserId::from(3)), Some(8));

        let row = matrix.row(&UserId::from(2)).unwrap();
        assert_eq!(row["login"], 0);
        assert_eq!(row["purchase"], 1);

        let column = matrix.column("login").unwrap();
        assert_eq!(column.counts(), vec![2, 0, 5]);
        assert_eq!(column.nonzero().len(), 2);
    }

    #[test]
    fn test_head_tail_and_filter() {
        let matrix = sample_matrix();

        assert_eq!(matrix.head(2).users(), &[UserId::from(1), UserId::from(2)]);
        assert_eq!(matrix.tail(1).users(), &[UserId::from(3)]);
        assert_eq!(matrix.head(10).shape(), (3, 2));
        assert_eq!(matrix.tail(0).shape(), (0, 2));

        let buyers = matrix.filter_rows("purchase", |v| v > 0).unwrap();
        assert_eq!(buyers.users(), &[UserId::from(2), UserId::from(3)]);
        assert!(matrix.filter_rows("logout", |v| v > 0).is_none());
    }

    #[test]
    fn test_to_raw_has_no_undefined_cells() {
        let raw = sample_matrix().to_raw();
        assert_eq!(raw.undefined_count(), 0);
        assert_eq!(raw.cell(2, 1), Some(&Some(3)));
    }
}
