//! Text rendering
//!
//! Plain-text and CSV views of matrices, columns and summaries. Precision
//! and row limits are passed in through [`RenderOptions`]; they only affect
//! how values are printed, never the values themselves.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::stats::ColumnSummary;
use crate::table::{Column, EventMatrix};

/// Display settings for rendered output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Digits after the decimal point for floating statistics
    pub precision: usize,
    /// Show at most this many rows, eliding the middle
    pub max_rows: Option<usize>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            precision: 2,
            max_rows: None,
        }
    }
}

const ELLIPSIS: &str = "...";

/// Render a matrix as an aligned text table with users as the index column
pub fn render_matrix(matrix: &EventMatrix, options: &RenderOptions) -> String {
    let (n_rows, n_cols) = matrix.shape();
    if n_rows == 0 || n_cols == 0 {
        let users: Vec<String> = matrix.users().iter().map(ToString::to_string).collect();
        return format!(
            "Empty matrix\nColumns: [{}]\nIndex: [{}]\n",
            matrix.events().join(", "),
            users.join(", ")
        );
    }

    let header: Vec<String> = matrix.events().to_vec();
    let rows: Vec<_> = matrix.rows().collect();
    let visible = visible_rows(n_rows, options.max_rows);

    let lines: Vec<(String, Vec<String>)> = visible
        .iter()
        .map(|slot| match slot {
            Some(pos) => {
                let (user, cells) = rows[*pos];
                (user.to_string(), cells.iter().map(u64::to_string).collect())
            }
            None => (ELLIPSIS.to_string(), vec![ELLIPSIS.to_string(); n_cols]),
        })
        .collect();

    let mut out = layout("", &header, &lines);
    out.push('\n');
    if visible.len() < n_rows {
        out.push_str(&format!("\n[{} rows x {} columns]\n", n_rows, n_cols));
    }
    out
}

/// Render a matrix as CSV with a `user_id` header column
pub fn render_csv(matrix: &EventMatrix) -> String {
    let mut out = String::new();
    let header: Vec<String> = std::iter::once("user_id".to_string())
        .chain(matrix.events().iter().map(|e| csv_field(e)))
        .collect();
    out.push_str(&header.join(","));
    out.push('\n');

    for (user, cells) in matrix.rows() {
        let row: Vec<String> = std::iter::once(csv_field(&user.to_string()))
            .chain(cells.iter().map(u64::to_string))
            .collect();
        out.push_str(&row.join(","));
        out.push('\n');
    }
    out
}

/// Render one column as `user  count` lines followed by its name
pub fn render_column(column: &Column, options: &RenderOptions) -> String {
    let total = column.len();
    let rows: Vec<(String, Vec<String>)> = visible_rows(total, options.max_rows)
        .into_iter()
        .map(|slot| match slot {
            Some(pos) => column
                .values
                .get_index(pos)
                .map(|(u, v)| (u.to_string(), vec![v.to_string()]))
                .unwrap_or_default(),
            None => (ELLIPSIS.to_string(), vec![ELLIPSIS.to_string()]),
        })
        .collect();

    let mut out = String::new();
    if !rows.is_empty() {
        out.push_str(&layout_body(&[], &rows));
    }
    out.push_str(&format!("Name: {}, Length: {}\n", column.event, total));
    out
}

/// Render per-value user counts (count value → number of users)
pub fn render_value_counts(event: &str, counts: &BTreeMap<u64, usize>) -> String {
    let rows: Vec<(String, Vec<String>)> = counts
        .iter()
        .map(|(value, users)| (value.to_string(), vec![users.to_string()]))
        .collect();

    let mut out = layout(event, &["users".to_string()], &rows);
    out.push('\n');
    out
}

/// Render column summaries as a table: one row per statistic, one column
/// per event
pub fn render_summaries(
    summaries: &IndexMap<String, ColumnSummary>,
    options: &RenderOptions,
) -> String {
    if summaries.is_empty() {
        return "Empty summary\n".to_string();
    }

    let header: Vec<String> = summaries.keys().cloned().collect();
    let rows: Vec<(String, Vec<String>)> = SUMMARY_ROWS
        .iter()
        .map(|stat| {
            (
                stat.to_string(),
                summaries
                    .values()
                    .map(|s| summary_cell(s, stat, options.precision))
                    .collect(),
            )
        })
        .collect();

    let mut out = layout("", &header, &rows);
    out.push('\n');
    out
}

const SUMMARY_ROWS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

fn summary_cell(summary: &ColumnSummary, stat: &str, precision: usize) -> String {
    match stat {
        "count" => summary.count.to_string(),
        "mean" => float(summary.mean, precision),
        "std" => float(summary.std, precision),
        "min" => opt(summary.min),
        "25%" => float(summary.q25, precision),
        "50%" => float(summary.median, precision),
        "75%" => float(summary.q75, precision),
        "max" => opt(summary.max),
        _ => String::new(),
    }
}

/// Row slots to show: `Some(position)` or `None` for the elided middle
fn visible_rows(total: usize, max_rows: Option<usize>) -> Vec<Option<usize>> {
    match max_rows {
        Some(max) if total > max => {
            let head = (max + 1) / 2;
            let tail = max / 2;
            (0..head)
                .map(Some)
                .chain(std::iter::once(None))
                .chain((total - tail..total).map(Some))
                .collect()
        }
        _ => (0..total).map(Some).collect(),
    }
}

/// Header line plus body, right-aligned
fn layout(corner: &str, header: &[String], rows: &[(String, Vec<String>)]) -> String {
    let widths = column_widths(corner, header, rows);
    let mut out = String::new();

    let mut line = pad(corner, widths[0]);
    for (i, name) in header.iter().enumerate() {
        line.push_str("  ");
        line.push_str(&pad(name, widths[i + 1]));
    }
    out.push_str(line.trim_end());
    out.push('\n');
    out.push_str(&layout_rows(&widths, rows));
    out.trim_end_matches('\n').to_string()
}

/// Body lines only, no header
fn layout_body(header: &[String], rows: &[(String, Vec<String>)]) -> String {
    let widths = column_widths("", header, rows);
    layout_rows(&widths, rows)
}

fn layout_rows(widths: &[usize], rows: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (label, cells) in rows {
        let mut line = format!("{:<width$}", label, width = widths[0]);
        for (i, cell) in cells.iter().enumerate() {
            line.push_str("  ");
            line.push_str(&pad(cell, widths.get(i + 1).copied().unwrap_or(0)));
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn column_widths(corner: &str, header: &[String], rows: &[(String, Vec<String>)]) -> Vec<usize> {
    let n_cols = rows
        .iter()
        .map(|(_, cells)| cells.len())
        .max()
        .unwrap_or(0)
        .max(header.len());
    let mut widths = vec![0; n_cols + 1];

    widths[0] = rows
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0)
        .max(corner.chars().count());
    for (i, name) in header.iter().enumerate() {
        widths[i + 1] = widths[i + 1].max(name.chars().count());
    }
    for (_, cells) in rows {
        for (i, cell) in cells.iter().enumerate() {
            widths[i + 1] = widths[i + 1].max(cell.chars().count());
        }
    }
    widths
}

fn pad(s: &str, width: usize) -> String {
    format!("{:>width$}", s, width = width)
}

fn float(v: Option<f64>, precision: usize) -> String {
    v.map_or_else(|| "NaN".to_string(), |v| format!("{:.*}", precision, v))
}

fn opt<T: Display>(v: Option<T>) -> String {
    v.map_or_else(|| "NaN".to_string(), |v| v.to_string())
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::json_to_matrix;
    use crate::stats::{describe_matrix, value_counts};
    use pretty_assertions::assert_eq;

    fn sample_matrix() -> EventMatrix {
        json_to_matrix(
            r#"[
                {"event": "login", "properties": {"user_id": 1}},
                {"event": "login", "properties": {"user_id": 1}},
                {"event": "purchase", "properties": {"user_id": 2}},
                {"event": "login", "properties": {"user_id": 3}}
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn test_render_matrix_aligns_columns() {
        let out = render_matrix(&sample_matrix(), &RenderOptions::default());
        let expected = "\
   login  purchase
1      2         0
2      0         1
3      1         0
";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_render_matrix_elides_middle_rows() {
        let options = RenderOptions {
            max_rows: Some(2),
            ..RenderOptions::default()
        };
        let out = render_matrix(&sample_matrix(), &options);

        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[1].trim_start().chars().next(), Some('1'));
        assert!(lines[2].starts_with("..."));
        assert!(lines[3].starts_with('3'));
        assert!(out.ends_with("[3 rows x 2 columns]\n"));
    }

    #[test]
    fn test_render_empty_matrix() {
        let empty = json_to_matrix("[]").unwrap();
        assert_eq!(
            render_matrix(&empty, &RenderOptions::default()),
            "Empty matrix\nColumns: []\nIndex: []\n"
        );
    }

    #[test]
    fn test_render_csv_quotes_awkward_names() {
        let matrix = json_to_matrix(
            r#"[{"event": "share, then like", "properties": {"user_id": "a\"b"}}]"#,
        )
        .unwrap();

        assert_eq!(
            render_csv(&matrix),
            "user_id,\"share, then like\"\n\"a\"\"b\",1\n"
        );
    }

    #[test]
    fn test_render_summaries_respects_precision() {
        let summaries = describe_matrix(&sample_matrix());

        let two = render_summaries(&summaries, &RenderOptions::default());
        assert!(two.contains("1.00"), "{}", two);

        let four = render_summaries(
            &summaries,
            &RenderOptions {
                precision: 4,
                ..RenderOptions::default()
            },
        );
        assert!(four.contains("1.0000"), "{}", four);
        assert!(four.lines().next().unwrap().contains("purchase"));
    }

    #[test]
    fn test_render_column_and_value_counts() {
        let column = sample_matrix().column("login").unwrap();

        let out = render_column(&column, &RenderOptions::default());
        assert!(out.ends_with("Name: login, Length: 3\n"), "{}", out);
        assert_eq!(out.lines().next(), Some("1  2"));

        let counts = render_value_counts("login", &value_counts(&column.counts()));
        assert_eq!(counts, "login  users\n0          1\n1          1\n2          1\n");
    }
}
