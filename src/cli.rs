use crate::model::AnalysisRequest;
use crate::orchestrator::{process_run_completion, RequestController};
use crate::presentation::Screen;
use crate::transport::HttpTransport;
use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Output line routing for stdout/stderr writer.
enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "flight-safety-cli",
    version,
    about = "Flight path weather safety check with optional TUI"
)]
pub struct Cli {
    /// Base URL of the analysis service
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    pub base_url: String,

    /// Departure city or airport (prefills the form in the TUI)
    #[arg(long, short = 'd')]
    pub departure: Option<String>,

    /// Arrival city or airport (prefills the form in the TUI)
    #[arg(long, short = 'a')]
    pub arrival: Option<String>,

    /// Give up on an analysis request after this long
    #[arg(long, default_value = "15s")]
    pub timeout: humantime::Duration,

    /// OpenWeather API key forwarded to the service when it has none of its own
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Print the final screen as JSON and exit (no TUI)
    #[arg(long, conflicts_with = "text")]
    pub json: bool,

    /// Print a text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Check that the service answers on /healthz and exit
    #[arg(long)]
    pub health: bool,

    /// Write the returned plot image to this file after a successful run
    #[arg(long)]
    pub save_plot: Option<PathBuf>,

    /// Export the analysis result as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export the result table as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Write diagnostic logs to this file (filter with RUST_LOG)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// True when the run will draw the TUI.
    pub fn is_interactive(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text && !self.health
    }

    pub fn deadline(&self) -> Duration {
        Duration::from(self.timeout)
    }

    /// Request built from the command line; both locations are required in scripted modes.
    pub fn scripted_request(&self) -> Result<AnalysisRequest> {
        let departure = self
            .departure
            .as_deref()
            .context("--departure is required with --json/--text")?;
        let arrival = self
            .arrival
            .as_deref()
            .context("--arrival is required with --json/--text")?;
        Ok(AnalysisRequest::new(departure, arrival).with_api_key(self.api_key.clone()))
    }
}

/// How a run ended, for the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// Build the HTTP transport from CLI arguments.
pub fn build_transport(args: &Cli) -> Result<HttpTransport> {
    let user_agent = format!("flight-safety-cli/{}", env!("CARGO_PKG_VERSION"));
    HttpTransport::new(&args.base_url, &user_agent)
}

pub async fn run(args: Cli) -> Result<Outcome> {
    if args.health {
        return run_health(args).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            crate::tui::run(args).await?;
            return Ok(Outcome::Success);
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_scripted(args).await;
        }
    }

    run_scripted(args).await
}

async fn run_health(args: Cli) -> Result<Outcome> {
    let transport = build_transport(&args)?;
    let body = transport
        .health()
        .await
        .with_context(|| format!("service at {} is not healthy", transport.base_url()))?;
    println!("{}: {}", transport.base_url(), body);
    Ok(Outcome::Success)
}

/// Run a single invocation against an in-memory screen and print the result.
async fn run_scripted(args: Cli) -> Result<Outcome> {
    let request = args.scripted_request()?;
    let transport = build_transport(&args)?;

    // Ctrl-C cancels the invocation instead of killing the process mid-request.
    let shutdown = CancellationToken::new();
    let ctrl_c = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        })
    };

    let mut controller = RequestController::new(transport, Screen::default())
        .with_deadline(args.deadline())
        .with_shutdown(shutdown);
    controller.run_analysis(request).await;
    ctrl_c.abort();

    let processed = controller
        .last_response()
        .map(|response| process_run_completion(&args, response));
    let screen = controller.into_sink();

    let (out_tx, out_handle) = spawn_output_writer();
    if args.json {
        let out = serde_json::to_string_pretty(&screen).context("serialize screen")?;
        let _ = out_tx.send(OutputLine::Stdout(out));
    } else {
        for line in crate::text_summary::build_text_summary(&screen).lines {
            let _ = out_tx.send(OutputLine::Stdout(line));
        }
    }
    let mut export_failed = false;
    if let Some(processed) = processed {
        export_failed = processed.failed;
        for m in processed.messages {
            let _ = out_tx.send(OutputLine::Stderr(m));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;

    if screen.shows_error() || export_failed {
        Ok(Outcome::Failed)
    } else {
        Ok(Outcome::Success)
    }
}
