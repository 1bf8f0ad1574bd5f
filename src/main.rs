use clap::Parser;
use pgn_oracle::chess::{Config, log};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

/// Write one reference JSON document per PGN file.
#[derive(Parser)]
#[command(name = "pgn-oracle")]
#[command(about = "Generate reference JSON documents from PGN game trees")]
#[command(version)]
struct Args {
    /// Directory holding *.pgn and *.pgn.zst files
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory receiving the documents (created if missing)
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: PathBuf,

    /// Source files converted in parallel
    #[arg(short, long, default_value_t = 1)]
    jobs: usize,

    /// Fill `eval` from [%eval] comment commands
    #[arg(long)]
    evaluations: bool,

    /// Write non-ASCII text as raw UTF-8 instead of \u escapes
    #[arg(long)]
    no_ascii_escape: bool,
}

impl Args {
    fn into_config(self) -> Config {
        Config::new(self.input_dir, self.output_dir)
            .with_jobs(self.jobs)
            .with_evaluations(self.evaluations)
            .with_ascii_escape(!self.no_ascii_escape)
    }
}

fn main() -> ExitCode {
    let config = Args::parse().into_config();
    log::init();

    match pgn_oracle::run(&config) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            error!(
                files_failed = summary.files_failed,
                "Some sources could not be converted"
            );
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
