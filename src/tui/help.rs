use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const KEYBINDS: &[(&str, &str)] = &[
    ("Enter", "Analyze route (from either field)"),
    ("Tab / ↓", "Next field"),
    ("S-Tab / ↑", "Previous field"),
    ("Ctrl-U", "Clear field"),
    ("Ctrl-S", "Export last result as JSON"),
    ("Ctrl-E", "Export last result table as CSV"),
    ("Ctrl-Y", "Copy exported path to clipboard"),
    ("F1", "Toggle this help"),
    ("Esc / Ctrl-C", "Quit"),
];

fn keybind_line(key: &'static str, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<14}"), Style::default().fg(Color::Magenta)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYBINDS.iter().map(|(k, w)| keybind_line(k, w)));
    lines.push(Line::from(""));
    lines.push(Line::from("Safety column:"));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Safe to continue", Style::default().fg(Color::Green)),
        Span::raw("    no hazard on this leg"),
    ]));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::styled("Unsafe to continue", Style::default().fg(Color::Red)),
        Span::raw("  conditions over the limits"),
    ]));
    lines.push(Line::from(vec![
        Span::raw("  "),
        Span::raw("anything else"),
        Span::raw("       shown as sent by the service"),
    ]));

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
