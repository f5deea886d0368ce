use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use clap::error::ErrorKind;
use tracing::error;
use tracing_subscriber::EnvFilter;

use prescribing_store::config::PipelineConfig;
use prescribing_store::error::{EXIT_BAD_ARGUMENTS, EXIT_OK};
use prescribing_store::ingestion::{IngestionOptions, TracingObserver};
use prescribing_store::pipeline::{ingest, run_reports, verify_store};
use prescribing_store::PipelineResult;

/// Convert the practice and prescribing extracts into the document store, then print the report
/// answers.
#[derive(Debug, Parser)]
#[command(name = "prescribing-store", version)]
struct Cli {
    /// Skip conversion and query the store left by an earlier run.
    #[arg(short = 'f', long = "skip-conversion")]
    skip_conversion: bool,

    /// JSON settings file; built-in defaults are used when omitted.
    config: Option<PathBuf>,
}

fn main() {
    init_tracing();

    // `/?` is accepted as a help flag alongside `-h`/`--help`.
    let args = std::env::args().map(|a| if a == "/?" { "--help".to_string() } else { a });
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_OK,
                _ => EXIT_BAD_ARGUMENTS,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    if let Err(e) = run(&cli) {
        error!("{e}");
        process::exit(e.exit_code());
    }
}

fn run(cli: &Cli) -> PipelineResult<()> {
    let config = match &cli.config {
        Some(path) => PipelineConfig::from_json_path(path)?,
        None => PipelineConfig::default(),
    };

    if cli.skip_conversion {
        verify_store(&config)?;
    } else {
        let options = IngestionOptions {
            observer: Some(Arc::new(TracingObserver)),
            ..IngestionOptions::default()
        };
        ingest(&config, &options)?;
    }

    let report = run_reports(&config)?;
    println!("{report}");
    if report.report_written {
        println!(
            "Average price by regions has been saved to {}",
            config.report_path().display()
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
