mod cli;
mod error;
mod export;
mod logging;
mod model;
mod orchestrator;
mod presentation;
mod text_summary;
mod transport;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_non_tui = !args.is_interactive();
    logging::init(&args)?;

    match cli::run(args).await? {
        // Explicitly exit in non-TUI modes so scripts see the outcome in the status code.
        cli::Outcome::Success if is_non_tui => std::process::exit(0),
        cli::Outcome::Failed => std::process::exit(1),
        cli::Outcome::Success => Ok(()),
    }
}
