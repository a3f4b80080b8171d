use std::path::PathBuf;
use thiserror::Error;

/// Exit code for invalid command line flag values.
pub const EX_USAGE: u8 = 64;
/// Exit code for missing input or malformed data.
pub const EX_DATAERR: u8 = 65;
/// Exit code for unexpected internal failures.
pub const EX_SOFTWARE: u8 = 70;
/// Exit code when the output file cannot be created.
pub const EX_CANTCREAT: u8 = 73;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("the file {path:?} does not exist")]
    NotFound { path: PathBuf },

    #[error("the format of file {path:?} is not valid: {message}")]
    Format { path: PathBuf, message: String },

    #[error("column '{column}' was not found")]
    MissingColumn { column: String },

    #[error("column '{column}' appears more than once after removing whitespace")]
    DuplicateColumn { column: String },

    #[error("invalid date/time '{value}': {reason}")]
    DateParse { value: String, reason: String },

    #[error("failed to write report to {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unexpected error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ReportError {
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ReportError::NotFound { .. }
                | ReportError::Format { .. }
                | ReportError::MissingColumn { .. }
                | ReportError::DuplicateColumn { .. }
                | ReportError::DateParse { .. }
        )
    }

    /// Process exit code for this error, following BSD sysexits.
    pub fn exit_code(&self) -> u8 {
        if self.is_data_error() {
            return EX_DATAERR;
        }
        match self {
            ReportError::Output { .. } => EX_CANTCREAT,
            _ => EX_SOFTWARE,
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
