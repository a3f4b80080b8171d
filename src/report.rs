use csv::WriterBuilder;
use std::path::Path;
use tracing::info;

use crate::aggregator::AggregateTable;
use crate::error::{ReportError, Result};

/// Formats the table with `+---+` borders, a header row and centered cells.
pub fn render_table(table: &AggregateTable) -> String {
    let body: Vec<[String; 3]> = table
        .rows
        .iter()
        .map(|row| {
            [
                row.url.clone(),
                row.pageviews.to_string(),
                row.visitors.to_string(),
            ]
        })
        .collect();

    let mut widths = AggregateTable::COLUMNS.map(|name| name.chars().count());
    for cells in &body {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let border = widths
        .iter()
        .map(|width| "-".repeat(width + 2))
        .collect::<Vec<_>>()
        .join("+");
    let border = format!("+{border}+");

    let line = |cells: &[&str]| {
        let inner = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!(" {cell:^width$} "))
            .collect::<Vec<_>>()
            .join("|");
        format!("|{inner}|")
    };

    let mut out = vec![border.clone(), line(&AggregateTable::COLUMNS), border.clone()];
    for cells in &body {
        out.push(line(&[cells[0].as_str(), cells[1].as_str(), cells[2].as_str()]));
    }
    if !body.is_empty() {
        out.push(border);
    }
    out.join("\n")
}

pub fn print_report(table: &AggregateTable) {
    println!("{}", render_table(table));
}

/// Writes `url,pageviews,visitors` rows, header included even when empty.
pub fn write_csv(table: &AggregateTable, path: &Path) -> Result<()> {
    let output_error = |source: csv::Error| ReportError::Output {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(output_error)?;
    writer
        .write_record(AggregateTable::COLUMNS)
        .map_err(output_error)?;
    for row in &table.rows {
        writer.serialize(row).map_err(output_error)?;
    }
    writer
        .flush()
        .map_err(|e| output_error(csv::Error::from(e)))?;

    info!(action = "write", component = "csv_export", file_path = ?path, row_count = table.len(), "Report saved");
    Ok(())
}
