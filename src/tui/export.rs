use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

#[derive(Debug, Clone, Copy)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Export the last successful response into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_last_response(state: &UiState, format: ExportFormat) -> Result<PathBuf> {
    let response = state
        .last_response
        .as_ref()
        .context("no result to export yet")?;
    let path = crate::export::default_export_path(format.extension())?;
    match format {
        ExportFormat::Json => crate::export::export_json(&path, response)?,
        ExportFormat::Csv => crate::export::export_csv(&path, response)?,
    }
    Ok(path)
}

/// Export and report the outcome on the info line.
pub fn export_and_show_path(state: &mut UiState, format: ExportFormat) {
    match export_last_response(state, format) {
        Ok(path) => {
            state.info = format!("Exported: {}", path.display());
            state.last_exported_path = Some(path.display().to_string());
        }
        Err(e) => {
            tracing::warn!("export failed: {e:#}");
            state.info = format!("Export failed: {e:#}");
        }
    }
}

/// Initialize the clipboard manager thread if not already initialized.
/// Each clipboard instance is kept alive for a while so clipboard managers on Linux can
/// read the contents before it is dropped.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Queue text for the clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}

pub fn copy_last_export(state: &mut UiState) {
    let Some(path) = state.last_exported_path.clone() else {
        state.info = "Nothing exported yet (Ctrl-S)".into();
        return;
    };
    state.info = match copy_to_clipboard(&path) {
        Ok(()) => format!("Copied: {path}"),
        Err(e) => format!("Copy failed: {e:#}"),
    };
}
