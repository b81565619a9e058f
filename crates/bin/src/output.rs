//! Output formatting helpers for human-readable and JSON output.

pub use crate::cli::Format as OutputFormat;

/// Print a table with aligned columns in human-readable format.
///
/// `headers` and each row in `rows` must have the same length.
pub fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        return;
    }

    let col_count = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(col_count) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    println!("{}", align(headers.iter().copied(), &widths));
    for row in rows {
        println!("{}", align(row.iter().map(String::as_str), &widths));
    }
}

fn align<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Print one JSON value per line.
pub fn print_json_lines(values: &[serde_json::Value]) -> Result<(), serde_json::Error> {
    for value in values {
        println!("{}", serde_json::to_string(value)?);
    }
    Ok(())
}
