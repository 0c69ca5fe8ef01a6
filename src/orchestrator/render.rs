//! Response interpretation and row formatting.

use crate::error::{status_message, AnalysisError};
use crate::model::{AnalysisResponse, ResultRow, Safety};
use crate::presentation::{RenderedRow, SafetyClass};
use crate::transport::RawResponse;

/// Classify a raw endpoint response.
///
/// The body is parsed before the status is looked at, so a non-JSON error page is
/// reported as malformed rather than as a remote error.
pub(crate) fn interpret(raw: RawResponse) -> Result<AnalysisResponse, AnalysisError> {
    let RawResponse { status, body } = raw;

    let value: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| AnalysisError::malformed(status, &body, e))?;

    if !status.is_success() {
        let message = value
            .get("error")
            .and_then(|v| v.as_str())
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| status_message(status));
        return Err(AnalysisError::RemoteError { status, message });
    }

    // Valid JSON of the wrong shape is as unusable as invalid JSON.
    serde_json::from_value(value).map_err(|e| AnalysisError::malformed(status, &body, e))
}

pub(crate) fn safety_class(safety: &Safety) -> Option<SafetyClass> {
    match safety {
        Safety::Safe => Some(SafetyClass::Positive),
        Safety::Unsafe => Some(SafetyClass::Negative),
        Safety::Other(_) => None,
    }
}

/// Absent values render as empty cells.
fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn number_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Format a row for display. `index` is 1-based.
pub(crate) fn render_row(index: usize, row: &ResultRow) -> RenderedRow {
    RenderedRow {
        index,
        nearest_city: cell(row.nearest_city.as_deref()),
        safety: row.safety.as_str().to_string(),
        safety_class: safety_class(&row.safety),
        temp_c: number_cell(row.temp_c),
        wind_ms: number_cell(row.wind_ms),
        condition: cell(row.condition.as_deref()),
    }
}
