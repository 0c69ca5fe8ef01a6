//! Post-run processing utilities.
//!
//! Handles plot saving and exports after an invocation succeeds.

use crate::cli::Cli;
use crate::export;
use crate::model::AnalysisResponse;

/// Result of post-run processing, ready for presentation layers.
pub(crate) struct ProcessedRun {
    pub messages: Vec<String>,
    pub failed: bool,
}

/// Apply the export options from the command line to a successful response.
pub(crate) fn process_run_completion(args: &Cli, response: &AnalysisResponse) -> ProcessedRun {
    let mut messages = Vec::new();
    let mut failed = false;

    if let Some(path) = args.save_plot.as_deref() {
        match export::save_plot(path, &response.plot) {
            Ok(n) => messages.push(format!("Saved plot ({n} bytes): {}", path.display())),
            Err(e) => {
                failed = true;
                messages.push(format!("Save plot failed: {e:#}"));
            }
        }
    }
    if let Some(path) = args.export_json.as_deref() {
        match export::export_json(path, response) {
            Ok(()) => messages.push(format!("Exported JSON: {}", path.display())),
            Err(e) => {
                failed = true;
                messages.push(format!("Export JSON failed: {e:#}"));
            }
        }
    }
    if let Some(path) = args.export_csv.as_deref() {
        match export::export_csv(path, response) {
            Ok(()) => messages.push(format!("Exported CSV: {}", path.display())),
            Err(e) => {
                failed = true;
                messages.push(format!("Export CSV failed: {e:#}"));
            }
        }
    }

    for m in &messages {
        tracing::info!("{m}");
    }

    ProcessedRun { messages, failed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::ffi::OsString;

    fn response(plot: &str) -> AnalysisResponse {
        serde_json::from_value(serde_json::json!({
            "alert": "All clear on current check.",
            "plot": plot,
            "rows": [{"nearest_city": "Rome, Italy", "safety": "Safe to continue", "temp_c": 21.5}]
        }))
        .unwrap()
    }

    #[test]
    fn no_options_means_no_messages() {
        let args = Cli::parse_from(["flight-safety-cli"]);
        let processed = process_run_completion(&args, &response("p.png"));
        assert!(processed.messages.is_empty());
        assert!(!processed.failed);
    }

    #[test]
    fn writes_every_requested_export() {
        let dir = tempfile::tempdir().unwrap();
        let plot = dir.path().join("plot.png");
        let json = dir.path().join("r.json");
        let csv = dir.path().join("r.csv");
        let args = Cli::parse_from([
            OsString::from("flight-safety-cli"),
            "--save-plot".into(),
            plot.clone().into_os_string(),
            "--export-json".into(),
            json.clone().into_os_string(),
            "--export-csv".into(),
            csv.clone().into_os_string(),
        ]);

        let processed =
            process_run_completion(&args, &response("data:image/png;base64,iVBORw0KGgo="));
        assert!(!processed.failed, "{:?}", processed.messages);
        assert_eq!(processed.messages.len(), 3);
        assert!(plot.exists() && json.exists() && csv.exists());
    }

    #[test]
    fn non_inline_plot_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        let plot = dir.path().join("plot.png");
        let args = Cli::parse_from([
            OsString::from("flight-safety-cli"),
            "--save-plot".into(),
            plot.into_os_string(),
        ]);

        let processed = process_run_completion(&args, &response("https://x/plot.png"));
        assert!(processed.failed);
        assert!(processed.messages[0].starts_with("Save plot failed"));
    }
}
