pub mod aggregator;
pub mod args;
pub mod cleaner;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod report;
pub mod timestamp;
pub mod utils;

pub use aggregator::{aggregate, AggregateRow, AggregateTable};
pub use args::Args;
pub use cleaner::{clean, CleanTable, EventRecord};
pub use error::{ReportError, Result};
pub use loader::{load, LoaderConfig, RawTable};
pub use pipeline::{generate_report, run_report};
