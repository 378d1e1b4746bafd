use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use tracing::error;

use testgen_ci::{changed_files, logger, run_with_config, Config, LlmClient, RunOptions};

#[derive(Parser)]
#[command(
    name = "testgen",
    version,
    about = "Draft test files for changed sources with an LLM, for use in CI."
)]
struct Cli {
    /// Changed files. One argument may hold a whitespace-separated list.
    files: Vec<String>,

    /// Build prompts but skip the API call and output files
    #[arg(long)]
    dry_run: bool,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    let files = changed_files(&cli.files);
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    run_with_config(
        Config::load().inspect_err(|e| error!("{e}")),
        LlmClient::new,
        &files,
        &cwd,
        RunOptions {
            dry_run: cli.dry_run,
        },
    )?;

    Ok(())
}
