//! Mixtape CLI entry point.
//!
//! # Responsibility
//! - Parse the three positional paths and logging options.
//! - Load inputs, apply changes through `mixtape_core`, write the result.
//!
//! # Invariants
//! - Missing input paths fail the process before the core is invoked.
//! - Soft change failures never change the exit code.

use clap::Parser;
use log::{error, info};
use mixtape_core::store::{read_document_value, write_document_value};
use mixtape_core::{
    apply_changes, default_log_level, init_logging, CHANGES_PARAMETER, MIXTAPE_PARAMETER,
};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "mixtape", version)]
#[command(
    about = "Given a mixtape and a list of change operations, output a file with the expected changes"
)]
struct Cli {
    /// Source document (e.g. mixtape.json)
    mixtape_json: PathBuf,

    /// Change request (e.g. changes.json)
    changes_json: PathBuf,

    /// Where the updated document is written
    output_json: PathBuf,

    /// Log level: trace, debug, info, warn or error
    #[arg(long, env = "MIXTAPE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files (stderr when unset)
    #[arg(long, env = "MIXTAPE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Print one line per change outcome to stdout
    #[arg(long)]
    summary: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli.log_level.as_deref().unwrap_or(default_log_level());
    if let Err(err) = init_logging(level, cli.log_dir.as_deref()) {
        eprintln!("mixtape: {err}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={}", err);
            eprintln!("mixtape: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    info!("event=cli_run module=cli status=start");

    // Both inputs are checked before either is parsed.
    for (path, parameter) in [
        (&cli.mixtape_json, MIXTAPE_PARAMETER),
        (&cli.changes_json, CHANGES_PARAMETER),
    ] {
        if !path.exists() {
            return Err(mixtape_core::StoreError::MissingInput {
                parameter,
                path: path.clone(),
            }
            .into());
        }
    }

    let mixtape = read_document_value(&cli.mixtape_json, MIXTAPE_PARAMETER)?;
    let changes = read_document_value(&cli.changes_json, CHANGES_PARAMETER)?;

    let (result, report) = apply_changes(mixtape, changes)?;

    if cli.summary {
        for record in report.records() {
            println!("{record}");
        }
    }

    write_document_value(&cli.output_json, &result)?;

    info!(
        "event=cli_run module=cli status=ok applied={} skipped={} rejected={} output={}",
        report.applied_count(),
        report.skipped_count(),
        report.rejected_count(),
        cli.output_json.display()
    );
    Ok(())
}
