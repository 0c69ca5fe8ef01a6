mod bindings;
mod export;
mod help;
mod state;

use crate::cli::Cli;
use crate::model::AnalysisResponse;
use crate::orchestrator::{self, SessionEvent, UiCommand};
use crate::presentation::SafetyClass;
use anyhow::{Context, Result};
use bindings::{Action, InputBindings};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use export::ExportFormat;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Terminal,
};
use state::{Field, UiState};
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let (event_tx, event_rx) = mpsc::unbounded_channel::<SessionEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();
    let transport = crate::cli::build_transport(&args)?;
    let _panic_log = crate::logging::PanicLogGuard::install();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_session(transport, args.deadline(), event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

fn initial_state(args: &Cli) -> UiState {
    UiState {
        departure: args.departure.clone().unwrap_or_default(),
        arrival: args.arrival.clone().unwrap_or_default(),
        api_key: args.api_key.clone(),
        base_url: args.base_url.clone(),
        deadline: args.deadline(),
        ..Default::default()
    }
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<SessionEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = initial_state(&args);
    let bindings = InputBindings::default();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();
    let mut dirty = true;
    let mut session_done = false;

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        loop {
            match event_rx.try_recv() {
                Ok(SessionEvent::Sink(ev)) => state.apply_sink_event(ev),
                Ok(SessionEvent::Completed { response }) => {
                    handle_run_completed(&args, &mut state, *response);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    session_done = true;
                    break;
                }
            }
            dirty = true;
        }
        if session_done {
            tracing::debug!("session ended; closing the UI");
            break Ok(());
        }

        if dirty || last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
            dirty = false;
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                let Some(action) = bindings.action(k.modifiers, k.code) else {
                    continue;
                };
                dirty = true;
                if let Flow::Quit = handle_action(&mut state, action, &cmd_tx) {
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_action(state: &mut UiState, action: Action, cmd_tx: &UnboundedSender<UiCommand>) -> Flow {
    match action {
        Action::Quit => {
            let _ = cmd_tx.send(UiCommand::Quit);
            return Flow::Quit;
        }
        Action::ToggleHelp => state.tab = if state.tab == 0 { 1 } else { 0 },
        Action::ExportJson => export::export_and_show_path(state, ExportFormat::Json),
        Action::ExportCsv => export::export_and_show_path(state, ExportFormat::Csv),
        Action::CopyPath => export::copy_last_export(state),
        Action::Trigger => {
            if let Some(request) = state.take_trigger() {
                tracing::debug!(departure = %request.departure, arrival = %request.arrival, "analyze");
                if cmd_tx.send(UiCommand::Analyze(request)).is_err() {
                    state.info = "Session closed".into();
                }
            }
        }
        // Editing only applies on the Analyze tab.
        _ if state.tab != 0 => {}
        Action::NextField | Action::PrevField => state.focus = state.focus.next(),
        Action::Insert(c) => state.focused_mut().push(c),
        Action::Backspace => {
            state.focused_mut().pop();
        }
        Action::ClearField => state.focused_mut().clear(),
    }
    Flow::Continue
}

fn handle_run_completed(args: &Cli, state: &mut UiState, response: AnalysisResponse) {
    let processed = orchestrator::process_run_completion(args, &response);
    if !processed.messages.is_empty() {
        state.info = processed.messages.join("; ");
    }
    state.last_response = Some(response);
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Analyze"), Line::from("Help")])
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("flight-safety-cli"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_analyze(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }
}

fn draw_analyze(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Form
            Constraint::Length(3), // Banner
            Constraint::Length(3), // Plot
            Constraint::Min(0),    // Result table
            Constraint::Length(3), // Status
        ])
        .split(area);

    draw_form(rows[0], f, state);

    let banner = &state.screen.banner;
    if banner.visible {
        let (title, style) = if state.banner_is_error() {
            (
                "Error",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )
        } else {
            ("Alert", Style::default().fg(Color::Cyan))
        };
        let p = Paragraph::new(Span::styled(banner.text.clone(), style))
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(p, rows[1]);
    }

    let image = &state.screen.image;
    if image.visible {
        let p = Paragraph::new(crate::export::describe_plot(&image.source)).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Plot (Ctrl-S to export)"),
        );
        f.render_widget(p, rows[2]);
    }

    if state.screen.table.visible {
        draw_table(rows[3], f, state);
    }

    draw_status(rows[4], f, state);
}

fn draw_form(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Min(18),
        ])
        .split(area);

    let field = |title: &'static str, value: &str, focused: bool| {
        let border = if focused {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Paragraph::new(value.to_string()).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border)
                .title(title),
        )
    };
    f.render_widget(
        field("Departure", &state.departure, state.focus == Field::Departure),
        cols[0],
    );
    f.render_widget(
        field("Arrival", &state.arrival, state.focus == Field::Arrival),
        cols[1],
    );

    let trigger_style = if state.screen.trigger.enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let trigger = Paragraph::new(Span::styled(state.trigger_text(), trigger_style))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Enter"));
    f.render_widget(trigger, cols[2]);

    if state.tab == 0 {
        let (rect, text) = match state.focus {
            Field::Departure => (cols[0], &state.departure),
            Field::Arrival => (cols[1], &state.arrival),
        };
        let inner_width = rect.width.saturating_sub(2);
        let offset = (text.chars().count() as u16).min(inner_width.saturating_sub(1));
        f.set_cursor_position((rect.x + 1 + offset, rect.y + 1));
    }
}

fn safety_style(class: Option<SafetyClass>) -> Style {
    match class {
        Some(SafetyClass::Positive) => Style::default().fg(Color::Green),
        Some(SafetyClass::Negative) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        None => Style::default(),
    }
}

fn draw_table(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let header = Row::new(crate::text_summary::HEADERS.iter().map(|h| Cell::from(*h)))
        .style(Style::default().fg(Color::Yellow));
    let rows = state.screen.table.rows.iter().map(|r| {
        Row::new(vec![
            Cell::from(r.index.to_string()),
            Cell::from(r.nearest_city.clone()),
            Cell::from(r.safety.clone()).style(safety_style(r.safety_class)),
            Cell::from(r.temp_c.clone()),
            Cell::from(r.wind_ms.clone()),
            Cell::from(r.condition.clone()),
        ])
    });
    let widths = [
        Constraint::Length(4),
        Constraint::Percentage(30),
        Constraint::Length(20),
        Constraint::Length(10),
        Constraint::Length(11),
        Constraint::Min(10),
    ];
    let title = format!("Route ({} waypoints)", state.screen.table.rows.len());
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let left = if state.info.is_empty() {
        "Enter: analyze  Tab: next field  F1: help  Esc: quit".to_string()
    } else {
        state.info.clone()
    };
    let line = Line::from(vec![
        Span::raw(left),
        Span::styled(
            format!(
                "  |  {}  timeout {}",
                state.base_url,
                humantime::format_duration(state.deadline)
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::{BUSY_LABEL, TRIGGER_LABEL};
    use crate::presentation::{BannerTone, Region, RenderedRow, SinkEvent};
    use clap::Parser;
    use ratatui::backend::TestBackend;

    fn rendered(state: &UiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| draw(f.area(), f, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn form_is_prefilled_from_args() {
        let args = Cli::parse_from(["flight-safety-cli", "-d", "Paris", "-a", "Rome"]);
        let state = initial_state(&args);
        assert_eq!(state.departure, "Paris");
        assert_eq!(state.arrival, "Rome");
        assert_eq!(state.deadline, Duration::from_secs(15));
    }

    #[test]
    fn enter_sends_one_request_until_trigger_restored() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState {
            departure: "Paris".into(),
            arrival: "Rome".into(),
            ..Default::default()
        };

        assert_eq!(handle_action(&mut state, Action::Trigger, &tx), Flow::Continue);
        assert_eq!(handle_action(&mut state, Action::Trigger, &tx), Flow::Continue);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Analyze(r)) if r.arrival == "Rome"));
        assert!(rx.try_recv().is_err());

        state.apply_sink_event(SinkEvent::Enabled(true));
        handle_action(&mut state, Action::Trigger, &tx);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Analyze(_))));
    }

    #[test]
    fn enter_on_help_tab_still_triggers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState {
            tab: 1,
            departure: "Paris".into(),
            arrival: "Rome".into(),
            ..Default::default()
        };
        handle_action(&mut state, Action::Trigger, &tx);
        assert!(matches!(
            rx.try_recv(),
            Ok(UiCommand::Analyze(r)) if r.departure == "Paris" && r.arrival == "Rome"
        ));
        assert!(!state.screen.trigger.enabled);
    }

    #[test]
    fn typing_edits_the_focused_field() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        for c in "Oslo".chars() {
            handle_action(&mut state, Action::Insert(c), &tx);
        }
        handle_action(&mut state, Action::Backspace, &tx);
        handle_action(&mut state, Action::NextField, &tx);
        handle_action(&mut state, Action::Insert('B'), &tx);
        assert_eq!(state.departure, "Osl");
        assert_eq!(state.arrival, "B");

        handle_action(&mut state, Action::ToggleHelp, &tx);
        handle_action(&mut state, Action::Insert('x'), &tx);
        assert_eq!(state.arrival, "B");
    }

    #[test]
    fn quit_notifies_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut state = UiState::default();
        assert_eq!(handle_action(&mut state, Action::Quit, &tx), Flow::Quit);
        assert!(matches!(rx.try_recv(), Ok(UiCommand::Quit)));
    }

    #[test]
    fn idle_screen_shows_trigger_only() {
        let state = UiState::default();
        let out = rendered(&state);
        assert!(out.contains(TRIGGER_LABEL));
        assert!(!out.contains("Nearest city"));
        assert!(!out.contains("Error"));
    }

    #[test]
    fn busy_and_result_states_render() {
        let mut state = UiState::default();
        state.apply_sink_event(SinkEvent::Enabled(false));
        state.apply_sink_event(SinkEvent::Label(BUSY_LABEL.into()));
        assert!(rendered(&state).contains("Analyzing"));

        state.apply_sink_event(SinkEvent::Text {
            text: "Storm near Lyon".into(),
            tone: BannerTone::Info,
        });
        state.apply_sink_event(SinkEvent::Visible {
            region: Region::Banner,
            visible: true,
        });
        state.apply_sink_event(SinkEvent::AppendRow(Box::new(RenderedRow {
            index: 1,
            nearest_city: "Lyon, France".into(),
            safety: "Unsafe to continue".into(),
            safety_class: Some(SafetyClass::Negative),
            temp_c: "3".into(),
            wind_ms: "22".into(),
            condition: "thunderstorm".into(),
        })));
        state.apply_sink_event(SinkEvent::Visible {
            region: Region::Table,
            visible: true,
        });
        let out = rendered(&state);
        assert!(out.contains("Storm near Lyon"));
        assert!(out.contains("Lyon, France"));
        assert!(out.contains("Nearest city"));
    }

    #[test]
    fn error_banner_renders_with_error_title() {
        let mut state = UiState::default();
        state.apply_sink_event(SinkEvent::Text {
            text: "request took too long".into(),
            tone: BannerTone::Error,
        });
        state.apply_sink_event(SinkEvent::Visible {
            region: Region::Banner,
            visible: true,
        });
        let out = rendered(&state);
        assert!(out.contains("Error"));
        assert!(out.contains("request took too long"));
    }
}
