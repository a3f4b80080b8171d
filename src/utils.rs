use time::macros::format_description;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

use crate::args::Args;
use crate::loader::LoaderConfig;

/// Installs the global subscriber. Logs go to stderr so stdout only ever
/// carries the report; `RUST_LOG` overrides the verbosity flag.
pub fn setup_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "error" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let timer = LocalTime::new(format_description!(
        "[hour]:[minute]:[second].[subsecond digits:3]"
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(timer)
        .with_writer(std::io::stderr)
        .init();
}

/// Validates `--delimiters` and turns it into the loader's candidate set.
pub fn loader_config(args: &Args) -> anyhow::Result<LoaderConfig> {
    if args.delimiters.is_empty() {
        anyhow::bail!("--delimiters must name at least one character");
    }

    let mut delimiters = Vec::with_capacity(args.delimiters.len());
    for c in args.delimiters.chars() {
        if !c.is_ascii() || c.is_ascii_alphanumeric() || matches!(c, '"' | '\n' | '\r') {
            anyhow::bail!("--delimiters contains unusable delimiter {:?}", c);
        }
        delimiters.push(c as u8);
    }

    Ok(LoaderConfig { delimiters })
}
