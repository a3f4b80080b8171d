use clap::Parser;
use std::panic::{self, AssertUnwindSafe};
use std::process::ExitCode;
use tracing::debug;

use pixel_report::error::{EX_SOFTWARE, EX_USAGE};
use pixel_report::utils::{loader_config, setup_logging};
use pixel_report::{run_report, Args};

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    let config = match loader_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::from(EX_USAGE);
        }
    };

    match panic::catch_unwind(AssertUnwindSafe(|| run_report(&args, &config))) {
        Ok(Ok(_)) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            debug!(action = "abort", component = "main", exit_code = e.exit_code(), error = ?e, "Report failed");
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
        Err(_) => {
            eprintln!("Error: unexpected internal failure");
            ExitCode::from(EX_SOFTWARE)
        }
    }
}
