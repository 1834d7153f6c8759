mod help;
mod state;

use crate::cli::{build_client_config, build_controller_settings, Cli};
use crate::engine::{ScoringClient, ScoringService};
use crate::model::{MatchResult, WorkflowEvent};
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use help::draw_help;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Terminal,
};
use state::{push_wrapped_status_kv, Field, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    let client = ScoringClient::new(&build_client_config(&args))?;
    let service: Arc<dyn ScoringService> = Arc::new(client);
    let settings = build_controller_settings(&args);

    // Unbounded channels avoid backpressure between the UI thread and the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<WorkflowEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    let mut state = UiState::default();
    prefill(&args, &mut state, &cmd_tx)?;

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_handle = std::thread::spawn(move || run_threaded(state, event_rx, cmd_tx));

    let res = orchestrator::run_controller(service, settings, event_tx, cmd_rx).await;

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

/// Seed the form (and the controller) from command-line arguments.
fn prefill(args: &Cli, state: &mut UiState, cmd_tx: &UnboundedSender<UiCommand>) -> Result<()> {
    if !args.files.is_empty() {
        state.files_input = args
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("; ");
        let _ = cmd_tx.send(UiCommand::SelectFiles(args.files.clone()));
    }
    state.job_input = args.job_text()?;
    state.enhanced = args.enhanced;
    state.credential_input = args.api_key.clone().unwrap_or_default();
    let _ = cmd_tx.send(UiCommand::SetJob(state.job_input.clone()));
    let _ = cmd_tx.send(UiCommand::SetEnhanced(state.enhanced));
    let _ = cmd_tx.send(UiCommand::SetCredential(state.credential_input.clone()));
    Ok(())
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    mut state: UiState,
    mut event_rx: UnboundedReceiver<WorkflowEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(cmd) = state.handle_key(k) {
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

fn field_block(title: &str, focused: bool) -> Block<'_> {
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let enhanced_row = if state.enhanced { 6 } else { 3 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(enhanced_row),
                Constraint::Min(6),
                Constraint::Length(5),
            ]
            .as_ref(),
        )
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Resume Parser & Job Fit Analyzer",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("F1 help", Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("resume-match"));
    f.render_widget(header, chunks[0]);

    draw_files(chunks[1], f, state);

    let job = Paragraph::new(state.job_input.as_str())
        .wrap(Wrap { trim: false })
        .block(field_block(
            "Job description",
            state.focus == Field::Job,
        ));
    f.render_widget(job, chunks[2]);

    draw_mode(chunks[3], f, state);
    draw_results(chunks[4], f, state);
    draw_status(chunks[5], f, state);

    if state.show_help {
        draw_help(centered(area, 80, 60), f);
    }
    if let Some(msg) = state.alert.as_deref() {
        draw_alert(centered(area, 60, 25), f, msg);
    }
}

fn draw_files(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let selected = &state.workflow.file_names;
    let title = if selected.is_empty() {
        "Resumes (PDFs, up to 5) - none selected".to_string()
    } else {
        format!("Resumes (PDFs, up to 5) - selected: {}", selected.join(", "))
    };
    let p = Paragraph::new(state.files_input.as_str())
        .block(field_block(&title, state.focus == Field::Files));
    f.render_widget(p, area);
}

fn draw_mode(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let mark = if state.enhanced { "[x]" } else { "[ ]" };
    let toggle = Paragraph::new(format!("{mark} Use OpenAI LLM for enhanced accuracy"))
        .block(field_block("Scoring", state.focus == Field::Enhanced));
    f.render_widget(toggle, rows[0]);

    if state.enhanced {
        let masked = "*".repeat(state.credential_input.chars().count());
        let title = if state.workflow.has_credential {
            "OpenAI API key (set)"
        } else {
            "OpenAI API key"
        };
        let key = Paragraph::new(masked).block(field_block(
            title,
            state.focus == Field::Credential,
        ));
        f.render_widget(key, rows[1]);
    }
}

fn result_lines(results: &[MatchResult]) -> Vec<Line<'static>> {
    results
        .iter()
        .map(|r| {
            Line::from(vec![
                Span::styled(
                    r.candidate_name.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" - {}", r.filename)),
                Span::styled(
                    format!("  {:.2}", r.score),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        })
        .collect()
}

fn draw_results(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let wf = &state.workflow;
    let mut top = result_lines(&wf.results);
    if !wf.results.is_empty() {
        top.push(Line::from(""));
        let label = if wf.downloading {
            "Downloading...".to_string()
        } else {
            format!(
                "Ctrl-D: download top resumes ({})",
                wf.download_candidates.len()
            )
        };
        top.push(Line::from(Span::styled(
            label,
            Style::default().fg(Color::Cyan),
        )));
    }
    let top = Paragraph::new(top).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Top Matching Resumes"),
    );
    f.render_widget(top, cols[0]);

    let low = Paragraph::new(result_lines(&wf.less_score)).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Resumes with Low Match Score"),
    );
    f.render_widget(low, cols[1]);
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let mut lines = Vec::new();
    let action = if state.workflow.submitting {
        "Analyzing..."
    } else {
        "Ctrl-S: Check Match"
    };
    lines.push(Line::from(vec![
        Span::styled(action, Style::default().fg(Color::Green)),
        Span::styled(
            format!("  ({:?})", state.workflow.phase),
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    push_wrapped_status_kv(&mut lines, "Info", &state.info, area.width, Color::White);
    if let Some(path) = state.last_archive.as_ref() {
        let path = path.display().to_string();
        push_wrapped_status_kv(&mut lines, "Archive", &path, area.width, Color::Cyan);
    }
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}

fn draw_alert(area: Rect, f: &mut ratatui::Frame, msg: &str) {
    let mut lines = Vec::new();
    push_wrapped_status_kv(&mut lines, "Alert", msg, area.width, Color::Red);
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Enter/Esc to dismiss",
        Style::default().fg(Color::DarkGray),
    )));
    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title("Warning"),
    );
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}

fn centered(area: Rect, pct_x: u16, pct_y: u16) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - pct_y) / 2),
                Constraint::Percentage(pct_y),
                Constraint::Percentage((100 - pct_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - pct_x) / 2),
                Constraint::Percentage(pct_x),
                Constraint::Percentage((100 - pct_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}
