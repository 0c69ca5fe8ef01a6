//! Writing results to disk: decoded plot images, JSON and CSV exports.

use crate::model::AnalysisResponse;
use crate::orchestrator::render_row;
use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use std::fs;
use std::path::{Path, PathBuf};

/// Decode a `data:<mime>;base64,<payload>` reference into its media type and bytes.
pub fn decode_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow!("plot is not an inline data reference"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow!("data reference has no payload"))?;
    let mime = header
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow!("only base64 data references are supported"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .context("decode base64 plot payload")?;
    Ok((mime.to_string(), bytes))
}

/// Short description of a plot reference for surfaces that cannot show images.
pub fn describe_plot(source: &str) -> String {
    if !source.starts_with("data:") {
        return source.to_string();
    }
    match decode_data_uri(source) {
        Ok((mime, bytes)) => format!("inline {mime} ({} bytes)", bytes.len()),
        Err(_) => "inline data (unreadable)".to_string(),
    }
}

/// Write an inline plot to `path`. Returns the number of bytes written.
pub fn save_plot(path: &Path, plot: &str) -> Result<usize> {
    let (_, bytes) = decode_data_uri(plot)?;
    write_file(path, &bytes)?;
    Ok(bytes.len())
}

pub fn export_json(path: &Path, response: &AnalysisResponse) -> Result<()> {
    let json = serde_json::to_vec_pretty(response).context("serialize response")?;
    write_file(path, &json)
}

pub fn export_csv(path: &Path, response: &AnalysisResponse) -> Result<()> {
    write_file(path, table_csv(response)?.as_bytes())
}

const CSV_HEADER: [&str; 7] = [
    "index",
    "waypoint",
    "nearest_city",
    "safety",
    "temp_c",
    "wind_ms",
    "condition",
];

/// Render the result table as CSV, cells formatted exactly as displayed.
pub fn table_csv(response: &AnalysisResponse) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER).context("write CSV header")?;
    for (i, row) in response.rows.iter().enumerate() {
        let r = render_row(i + 1, row);
        wtr.write_record([
            r.index.to_string(),
            row.waypoint.clone().unwrap_or_default(),
            r.nearest_city,
            r.safety,
            r.temp_c,
            r.wind_ms,
            r.condition,
        ])
        .with_context(|| format!("write CSV row {}", i + 1))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| anyhow!("flush CSV: {}", e.error()))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write {}", path.display()))
}

/// Timestamped file name in the current directory, e.g. `flight-safety-2026-01-02_10-11-12.json`.
pub fn default_export_path(extension: &str) -> Result<PathBuf> {
    if extension.is_empty() {
        bail!("export extension must not be empty");
    }
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    let stamp = now
        .format(time::macros::format_description!(
            "[year]-[month]-[day]_[hour]-[minute]-[second]"
        ))
        .context("format export timestamp")?;
    let dir = std::env::current_dir().context("get current directory")?;
    Ok(dir.join(format!("flight-safety-{stamp}.{extension}")))
}
