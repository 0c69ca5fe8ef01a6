//! Text summary builder for CLI output.
//!
//! This module formats the final screen (banner, plot, table) as human-readable lines.

use crate::presentation::{BannerTone, RenderedRow, SafetyClass, Screen};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

pub(crate) const HEADERS: [&str; 6] = ["#", "Nearest city", "Safety", "Temp (°C)", "Wind (m/s)", "Condition"];

/// Marker appended to the safety cell so the class survives plain text.
pub(crate) fn safety_marker(class: Option<SafetyClass>) -> &'static str {
    match class {
        Some(SafetyClass::Positive) => " [ok]",
        Some(SafetyClass::Negative) => " [!!]",
        None => "",
    }
}

fn cells(row: &RenderedRow) -> [String; 6] {
    [
        row.index.to_string(),
        row.nearest_city.clone(),
        format!("{}{}", row.safety, safety_marker(row.safety_class)),
        row.temp_c.clone(),
        row.wind_ms.clone(),
        row.condition.clone(),
    ]
}

/// Build a text summary from the final screen state.
pub(crate) fn build_text_summary(screen: &Screen) -> TextSummary {
    let mut lines = Vec::new();

    if screen.banner.visible {
        match screen.banner.tone {
            BannerTone::Info => lines.push(format!("Alert: {}", screen.banner.text)),
            BannerTone::Error => lines.push(format!("Error: {}", screen.banner.text)),
        }
    }

    if screen.image.visible {
        lines.push(format!(
            "Plot: {}",
            crate::export::describe_plot(&screen.image.source)
        ));
    }

    if screen.table.visible {
        let rows: Vec<[String; 6]> = screen.table.rows.iter().map(cells).collect();
        let mut widths = HEADERS.map(|h| h.chars().count());
        for r in &rows {
            for (w, c) in widths.iter_mut().zip(r.iter()) {
                *w = (*w).max(c.chars().count());
            }
        }

        let fmt_line = |cells: &[String]| {
            cells
                .iter()
                .zip(widths.iter())
                .map(|(c, w)| format!("{:<width$}", c, width = *w))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        lines.push(String::new());
        lines.push(fmt_line(&HEADERS.map(String::from)));
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("  "),
        );
        for r in &rows {
            lines.push(fmt_line(r));
        }
    }

    TextSummary { lines }
}
