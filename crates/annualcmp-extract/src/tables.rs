//! Table detection over a page's text layer.
//!
//! The text layer carries no table objects, so tables are recovered from
//! layout: statement rows are printed as columns separated by wide gaps.
//! A run of consecutive multi-column lines becomes one table.

use std::sync::LazyLock;

use regex::Regex;

/// Column gap: two or more whitespace characters, or any tab.
static CELL_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|\s{2,}").expect("valid cell gap regex"));

/// Minimum rows for an accepted table: one header plus one data row.
const MIN_TABLE_ROWS: usize = 2;

/// Split one line into trimmed, non-empty cells.
pub(crate) fn split_cells(line: &str) -> Vec<String> {
    CELL_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Detect every table on a page, in reading order.
///
/// Each table is returned as its grid of rows, header row first.
pub(crate) fn detect_tables(page_text: &str) -> Vec<Vec<Vec<String>>> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in page_text.lines() {
        let cells = split_cells(line);
        if cells.len() >= 2 {
            current.push(cells);
        } else {
            flush(&mut current, &mut tables);
        }
    }
    flush(&mut current, &mut tables);

    tables
}

fn flush(current: &mut Vec<Vec<String>>, tables: &mut Vec<Vec<Vec<String>>>) {
    let rows = std::mem::take(current);
    let has_numbers = rows.iter().flatten().any(|cell| is_numeric_cell(cell));
    if rows.len() >= MIN_TABLE_ROWS && has_numbers {
        tables.push(rows);
    }
}

/// Whether a cell holds an amount, e.g. `1,234`, `(56.7)`, `-12%` or `$300`.
fn is_numeric_cell(cell: &str) -> bool {
    let cleaned: String = cell
        .chars()
        .filter(|c| !matches!(c, ',' | '(' | ')' | '%' | '$' | ' '))
        .collect();
    let cleaned = cleaned.strip_prefix('-').unwrap_or(&cleaned);
    !cleaned.is_empty()
        && cleaned.chars().any(|c| c.is_ascii_digit())
        && cleaned.parse::<f64>().is_ok()
}

/// Render a table grid as the text stored in a table section.
///
/// `index` is the 1-based table number on its page.
pub(crate) fn render_table(index: usize, rows: &[Vec<String>]) -> String {
    let body = rows
        .iter()
        .map(|row| row.join(" | "))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Table {index}:\n{body}")
}
