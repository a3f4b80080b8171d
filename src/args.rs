use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "pixel-report",
    about = "Summarize tracking pixel hits into page views and unique visitors per URL",
    version,
    long_about = None
)]
pub struct Args {
    /// Start date for time range filter. Example: '2013-09-01 09:00:00'
    pub date_from: String,

    /// End date for time range filter. Example: '2013-09-01 10:59:59'
    pub date_to: String,

    /// Path to a log of website visitors
    pub log: PathBuf,

    /// Path to save the output as a CSV file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Candidate field delimiters, tried in order
    #[arg(short, long, default_value = ";,|")]
    pub delimiters: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positionals_and_flags() {
        let args = Args::try_parse_from([
            "pixel-report",
            "2013-09-01 09:00:00",
            "2013-09-01 10:59:59",
            "samples/example1.log",
            "-o",
            "out.csv",
            "--verbose",
        ])
        .unwrap();

        assert_eq!(args.date_from, "2013-09-01 09:00:00");
        assert_eq!(args.date_to, "2013-09-01 10:59:59");
        assert_eq!(args.log, PathBuf::from("samples/example1.log"));
        assert_eq!(args.output, Some(PathBuf::from("out.csv")));
        assert_eq!(args.delimiters, ";,|");
        assert!(args.verbose);
    }

    #[test]
    fn log_path_is_required() {
        assert!(Args::try_parse_from(["pixel-report", "2013-09-01", "2013-09-02"]).is_err());
    }
}
