use anyhow::anyhow;
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{ReportError, Result};

/// Delimiters tried, in order, when none are configured.
pub const DEFAULT_DELIMITERS: [u8; 3] = [b';', b',', b'|'];

/// A delimited log exactly as read from disk: header names untouched and
/// empty fields represented as `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Candidate field separators; the first one that splits the header
    /// line into more than one column wins.
    pub delimiters: Vec<u8>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            delimiters: DEFAULT_DELIMITERS.to_vec(),
        }
    }
}

/// Reads a delimited log into a `RawTable`, detecting the delimiter from its header.
pub fn load(path: &Path, config: &LoaderConfig) -> Result<RawTable> {
    let start_time = Instant::now();
    info!(action = "start", component = "log_loader", file_path = ?path, "Loading visit log");

    if !path.is_file() {
        return Err(ReportError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path).map_err(|e| ReportError::Format {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let delimiter = detect_delimiter(&content, &config.delimiters)
        .ok_or_else(|| anyhow!("no candidate delimiters configured"))?;
    debug!(action = "detect", component = "log_loader", delimiter = %char::from(delimiter), "Selected field delimiter");

    let table = parse_delimited(&content, delimiter).map_err(|message| ReportError::Format {
        path: path.to_path_buf(),
        message,
    })?;

    info!(
        action = "complete",
        component = "log_loader",
        column_count = table.headers.len(),
        row_count = table.rows.len(),
        duration_ms = start_time.elapsed().as_millis(),
        "Visit log loaded"
    );
    Ok(table)
}

/// Picks the first candidate that yields a header with more than one
/// column, falling back to the first candidate.
pub fn detect_delimiter(content: &str, candidates: &[u8]) -> Option<u8> {
    candidates
        .iter()
        .copied()
        .find(|&delimiter| {
            let mut reader = ReaderBuilder::new()
                .delimiter(delimiter)
                .has_headers(false)
                .flexible(true)
                .from_reader(content.as_bytes());
            let mut record = StringRecord::new();
            matches!(reader.read_record(&mut record), Ok(true)) && record.len() > 1
        })
        .or_else(|| candidates.first().copied())
}

fn parse_delimited(content: &str, delimiter: u8) -> std::result::Result<RawTable, String> {
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());
    let mut records = reader.records();

    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| e.to_string())?
            .iter()
            .map(str::to_string)
            .collect(),
        None => return Err("no header line found".to_string()),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| e.to_string())?;
        if record.len() > headers.len() {
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            return Err(format!(
                "expected {} fields on line {}, found {}",
                headers.len(),
                line,
                record.len()
            ));
        }

        let mut row: Vec<Option<String>> = record
            .iter()
            .map(|field| (!field.is_empty()).then(|| field.to_string()))
            .collect();
        row.resize(headers.len(), None);
        rows.push(row);
    }

    Ok(RawTable { headers, rows })
}
