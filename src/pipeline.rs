use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::aggregator::{aggregate, AggregateTable};
use crate::cleaner::clean;
use crate::error::Result;
use crate::loader::{load, LoaderConfig};
use crate::report::{print_report, write_csv};
use crate::timestamp::parse_timestamp;
use crate::Args;

/// Loads, cleans and aggregates one log for the `[date_from, date_to]`
/// window. Both bounds are normalized to UTC before filtering.
pub fn generate_report(
    date_from: &str,
    date_to: &str,
    log: &Path,
    config: &LoaderConfig,
) -> Result<AggregateTable> {
    let total_start_time = Instant::now();
    info!(action = "start", component = "pipeline", log = ?log, "Starting visit report");

    let from = parse_timestamp(date_from)?;
    let to = parse_timestamp(date_to)?;
    info!(action = "configure", component = "pipeline", from = %from, to = %to, "Report window normalized to UTC");

    let raw = load(log, config)?;
    let cleaned = clean(&raw)?;
    let table = aggregate(&cleaned, from, to);

    info!(
        action = "complete",
        component = "pipeline",
        url_count = table.len(),
        duration_ms = total_start_time.elapsed().as_millis(),
        "Report generated"
    );
    Ok(table)
}

/// Produces the report for `args`: printed to stdout, then saved as CSV
/// when `--output` is given. Nothing is emitted if any stage fails.
pub fn run_report(args: &Args, config: &LoaderConfig) -> Result<AggregateTable> {
    let table = generate_report(&args.date_from, &args.date_to, &args.log, config)?;

    print_report(&table);
    if let Some(path) = &args.output {
        write_csv(&table, path)?;
    }

    Ok(table)
}
