//! Diagnostic logging setup.
//!
//! Scripted modes log to stderr. The TUI draws on the terminal, so it only ever logs to a
//! file: `--log-file` if given, otherwise the per-user cache directory.

use crate::cli::Cli;
use anyhow::{Context, Result};
use std::any::Any;
use std::fs::OpenOptions;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Default log location for interactive sessions.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("flight-safety-cli").join("flight-safety-cli.log"))
}

fn init_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open log file {}", path.display()))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

/// Initialise tracing for the process. Safe to call more than once.
pub fn init(args: &Cli) -> Result<()> {
    if let Some(path) = args.log_file.as_deref() {
        return init_file(path);
    }

    if args.is_interactive() {
        // Best effort: an unwritable cache dir just means no diagnostics.
        if let Some(path) = default_log_path() {
            let _ = init_file(&path);
        }
        return Ok(());
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

/// Routes panic reports through `tracing` while alive, so a caught panic cannot print
/// over a terminal the UI is drawing on. Dropping it restores the default hook.
pub struct PanicLogGuard;

impl PanicLogGuard {
    pub fn install() -> Self {
        std::panic::set_hook(Box::new(|info| {
            tracing::error!("{}", panic_line(info.payload(), info.location()));
        }));
        PanicLogGuard
    }
}

impl Drop for PanicLogGuard {
    fn drop(&mut self) {
        let _ = std::panic::take_hook();
    }
}

fn panic_line(payload: &(dyn Any + Send), location: Option<&Location<'_>>) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    match location {
        Some(loc) => format!("panic at {}:{}: {message}", loc.file(), loc.line()),
        None => format!("panic: {message}"),
    }
}
