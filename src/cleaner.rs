use anyhow::anyhow;
use chrono::{DateTime, SecondsFormat, Utc};
use std::collections::HashSet;
use std::time::Instant;
use tracing::info;

use crate::error::{ReportError, Result};
use crate::loader::RawTable;
use crate::timestamp::parse_timestamp;

pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const URL_COLUMN: &str = "url";
pub const USERID_COLUMN: &str = "userid";

/// One visit event after cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub url: Option<String>,
    pub userid: Option<String>,
    /// Values of the non-required columns, in `CleanTable::columns` order.
    pub extra: Vec<Option<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CleanTable {
    /// Every surviving column, in source order, whitespace removed.
    pub columns: Vec<String>,
    pub records: Vec<EventRecord>,
}

impl CleanTable {
    /// Renders the table back into raw form, timestamps as RFC 3339 UTC.
    pub fn to_raw(&self) -> RawTable {
        let rows = self
            .records
            .iter()
            .map(|record| {
                let mut extra = record.extra.iter();
                self.columns
                    .iter()
                    .map(|name| match name.as_str() {
                        TIMESTAMP_COLUMN => Some(
                            record
                                .timestamp
                                .to_rfc3339_opts(SecondsFormat::AutoSi, true),
                        ),
                        URL_COLUMN => record.url.clone(),
                        USERID_COLUMN => record.userid.clone(),
                        _ => extra.next().cloned().flatten(),
                    })
                    .collect()
            })
            .collect();

        RawTable::new(self.columns.clone(), rows)
    }
}

pub fn clean(raw: &RawTable) -> Result<CleanTable> {
    let start_time = Instant::now();
    info!(
        action = "start",
        component = "data_cleaner",
        column_count = raw.headers.len(),
        row_count = raw.rows.len(),
        "Cleaning visit log"
    );

    let kept = non_empty_columns(raw);
    let columns: Vec<String> = kept
        .iter()
        .map(|&index| strip_whitespace(&raw.headers[index]))
        .collect();

    let mut seen = HashSet::new();
    for name in &columns {
        if !seen.insert(name.as_str()) {
            return Err(ReportError::DuplicateColumn {
                column: name.clone(),
            });
        }
    }

    let position = |column: &str| -> Result<usize> {
        columns
            .iter()
            .position(|name| name == column)
            .map(|pos| kept[pos])
            .ok_or_else(|| ReportError::MissingColumn {
                column: column.to_string(),
            })
    };
    let timestamp_index = position(TIMESTAMP_COLUMN)?;
    let url_index = position(URL_COLUMN)?;
    let userid_index = position(USERID_COLUMN)?;
    let extra_indices: Vec<usize> = kept
        .iter()
        .zip(&columns)
        .filter(|(_, name)| !is_required(name))
        .map(|(&index, _)| index)
        .collect();

    let mut records = Vec::with_capacity(raw.rows.len());
    for (row_number, row) in raw.rows.iter().enumerate() {
        let field = |index: usize| row.get(index).cloned().flatten();

        let timestamp = match row.get(timestamp_index) {
            Some(Some(value)) => parse_timestamp(value)?,
            Some(None) => {
                return Err(ReportError::DateParse {
                    value: String::new(),
                    reason: format!("empty timestamp in data row {}", row_number + 1),
                })
            }
            None => {
                return Err(ReportError::Internal(anyhow!(
                    "data row {} has {} fields, expected {}",
                    row_number + 1,
                    row.len(),
                    raw.headers.len()
                )))
            }
        };

        records.push(EventRecord {
            timestamp,
            url: field(url_index),
            userid: field(userid_index),
            extra: extra_indices.iter().map(|&index| field(index)).collect(),
        });
    }

    info!(
        action = "complete",
        component = "data_cleaner",
        columns_dropped = raw.headers.len() - columns.len(),
        record_count = records.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Visit log cleaned"
    );
    Ok(CleanTable { columns, records })
}

/// Indices of columns holding at least one value. With no rows at all,
/// every column is empty.
fn non_empty_columns(raw: &RawTable) -> Vec<usize> {
    (0..raw.headers.len())
        .filter(|&index| {
            raw.rows
                .iter()
                .any(|row| matches!(row.get(index), Some(Some(_))))
        })
        .collect()
}

fn strip_whitespace(name: &str) -> String {
    name.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_required(name: &str) -> bool {
    matches!(name, TIMESTAMP_COLUMN | URL_COLUMN | USERID_COLUMN)
}
