mod charts;
mod help;
mod state;

use crate::cli::{build_config, build_form, Cli};
use crate::dashboard::HistoryPanel;
use crate::engine::BioiaClient;
use crate::model::LabEvent;
use crate::orchestrator::{self, SubmissionController, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Terminal,
};
use state::{UiState, FORM_LABELS, TAB_COUNT, TAB_HELP, TAB_HISTORY, TAB_RESULTS, TAB_SIMULATE};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let client = BioiaClient::new(&cfg)?;
    let ctrl = Arc::new(SubmissionController::new(client, &cfg));

    let (event_tx, event_rx) = mpsc::unbounded_channel::<LabEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let on_launch = args.submit_on_launch.then(|| build_form(&args));
    let res = orchestrator::run_controller(ctrl, on_launch, event_tx, cmd_rx).await;

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

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<LabEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only.
    let mut state = UiState::new(build_form(&args), Duration::from(args.progress_duration));

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep the UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            apply_event(&args, &mut state, ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(cmd) = handle_key(&args, &mut state, k.modifiers, k.code) {
                    let quit = matches!(cmd, UiCommand::Quit);
                    let _ = cmd_tx.send(cmd);
                    if quit {
                        break Ok(());
                    }
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn apply_event(args: &Cli, state: &mut UiState, ev: LabEvent) {
    let is_result = matches!(ev, LabEvent::ResultReady { .. });
    if matches!(ev, LabEvent::HistoryLoaded { .. }) {
        state.history_scroll = 0;
    }
    state.dashboard.apply(ev);

    if is_result {
        state.info.clear();
        if let Some(shown) = state.dashboard.last_result.as_ref() {
            let messages = orchestrator::process_result_exports(args, shown);
            if !messages.is_empty() {
                state.info = messages.join("; ");
            }
        }
        if state.tab == TAB_SIMULATE {
            state.tab = TAB_RESULTS;
        }
    }
}

/// Map a key press to a controller command, updating local state on the way.
fn handle_key(
    args: &Cli,
    state: &mut UiState,
    modifiers: KeyModifiers,
    code: KeyCode,
) -> Option<UiCommand> {
    match (modifiers, code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Some(UiCommand::Quit),
        (KeyModifiers::CONTROL, KeyCode::Char('r')) => return Some(UiCommand::RefreshHistory),
        (_, KeyCode::Tab) => {
            state.tab = (state.tab + 1) % TAB_COUNT;
            return None;
        }
        (_, KeyCode::BackTab) => {
            state.tab = (state.tab + TAB_COUNT - 1) % TAB_COUNT;
            return None;
        }
        _ => {}
    }

    if state.tab == TAB_SIMULATE {
        return match code {
            KeyCode::Up => {
                state.prev_field();
                None
            }
            KeyCode::Down => {
                state.next_field();
                None
            }
            KeyCode::Backspace => {
                state.backspace();
                None
            }
            KeyCode::Char(c) => {
                state.type_char(c);
                None
            }
            KeyCode::Enter => {
                if state.dashboard.in_flight {
                    state.info = "A simulation is already running.".into();
                    None
                } else {
                    state.info.clear();
                    Some(UiCommand::Submit(state.form.clone()))
                }
            }
            KeyCode::Esc => {
                state.info.clear();
                Some(UiCommand::Reset)
            }
            _ => None,
        };
    }

    match code {
        KeyCode::Char('q') => Some(UiCommand::Quit),
        KeyCode::Char('r') => Some(UiCommand::RefreshHistory),
        KeyCode::Char('?') => {
            state.tab = TAB_HELP;
            None
        }
        KeyCode::Char('e') if state.tab == TAB_RESULTS => {
            match state.dashboard.last_result.as_ref() {
                Some(shown) => match crate::storage::export_to_current_dir(&build_config(args), shown) {
                    Ok(p) => state.info = format!("Exported JSON: {}", p.display()),
                    Err(e) => state.info = format!("JSON export failed: {e:#}"),
                },
                None => state.info = "No result to export yet.".into(),
            }
            None
        }
        KeyCode::Up if state.tab == TAB_HISTORY => {
            state.scroll_history(false);
            None
        }
        KeyCode::Down if state.tab == TAB_HISTORY => {
            state.scroll_history(true);
            None
        }
        KeyCode::Esc => {
            state.tab = TAB_SIMULATE;
            None
        }
        _ => None,
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("Simulate"),
        Line::from("Results"),
        Line::from("History"),
        Line::from("Help"),
    ])
    .select(state.tab)
    .block(Block::default().borders(Borders::ALL).title("BIOIA_LAB"))
    .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        TAB_SIMULATE => draw_simulate(chunks[1], f, state),
        TAB_RESULTS => draw_results(chunks[1], f, state),
        TAB_HISTORY => draw_history(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f),
    }

    draw_status(chunks[2], f, state);
}

fn draw_simulate(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let editing = !state.dashboard.in_flight;
    let mut lines = Vec::with_capacity(FORM_LABELS.len());
    for (i, label) in FORM_LABELS.iter().enumerate() {
        let selected = i == state.selected_field;
        let marker = if selected { "> " } else { "  " };
        let value_style = if selected && editing {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw(marker),
            Span::styled(format!("{label:<8}"), Style::default().fg(Color::Gray)),
            Span::styled(state.field_value(i).to_string(), value_style),
        ]));
    }
    let title = if editing {
        "Mission (Enter to run)"
    } else {
        "Mission (running)"
    };
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title)),
        rows[0],
    );

    charts::draw_progress(f, rows[1], &state.dashboard.progress, &state.dashboard.eta);

    let pending = match state.dashboard.pending_request.as_ref() {
        Some(r) => format!(
            "Submitted: crew {} · {} days · {} · {}",
            r.crew_size, r.duration_days, r.profile, r.bioai_mode
        ),
        None => String::new(),
    };
    f.render_widget(
        Paragraph::new(vec![Line::from(pending)])
            .block(Block::default().borders(Borders::ALL).title("Request")),
        rows[2],
    );
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let Some(shown) = state.dashboard.last_result.as_ref() else {
        let p = Paragraph::new("No results yet. Run a simulation from the Simulate tab.")
            .block(Block::default().borders(Borders::ALL).title("Results"));
        f.render_widget(p, area);
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)].as_ref())
        .split(area);

    let lines: Vec<Line> = crate::text_summary::build_result_summary(shown)
        .lines
        .into_iter()
        .map(Line::from)
        .collect();
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Results (e: export)")),
        cols[0],
    );

    charts::draw_percent_gauges(f, cols[1], &shown.result);
}

fn draw_history(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("History (r: refresh)");

    let entries = match &state.dashboard.history {
        HistoryPanel::Loaded(entries) if !entries.is_empty() => entries,
        HistoryPanel::Loaded(_) => {
            f.render_widget(
                Paragraph::new(crate::text_summary::EMPTY_HISTORY).block(block),
                area,
            );
            return;
        }
        HistoryPanel::NotLoaded => {
            f.render_widget(Paragraph::new("Loading history…").block(block), area);
            return;
        }
        HistoryPanel::Unavailable(msg) => {
            f.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    format!("⚠️ {msg}"),
                    Style::default().fg(Color::Red),
                )))
                .block(block),
                area,
            );
            return;
        }
    };

    let header = Row::new(
        crate::text_summary::HISTORY_HEADERS
            .iter()
            .map(|h| Cell::from(*h)),
    )
    .style(Style::default().fg(Color::Yellow));
    let rows = crate::text_summary::history_rows(entries)
        .into_iter()
        .skip(state.history_scroll)
        .map(|row| Row::new(row.cells.into_iter().map(Cell::from)));
    let widths = [
        Constraint::Length(20),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(16),
        Constraint::Length(6),
        Constraint::Length(10),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(9),
    ];
    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut spans = vec![Span::raw(state.dashboard.status.clone())];
    if !state.info.is_empty() {
        spans.push(Span::raw("  |  "));
        spans.push(Span::styled(
            state.info.clone(),
            Style::default().fg(Color::Gray),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL).title("Status")),
        area,
    );
}
