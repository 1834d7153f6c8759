use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn keybind(key: &'static str, pad: usize, what: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        keybind("Esc / Ctrl-C", 3, "Quit"),
        keybind("Tab / S-Tab", 4, "Next / previous field"),
        keybind("Enter", 10, "Select files (files field), newline (job field)"),
        keybind("Space", 10, "Toggle LLM scoring (toggle field)"),
        keybind("Ctrl-S / F5", 4, "Check match"),
        keybind("Ctrl-D / F6", 4, "Download top resumes"),
        keybind("F1", 13, "Show/hide this help"),
        Line::from(""),
        Line::from("Files:"),
        Line::from("  Separate paths with ';' (spaces inside a path are kept). At most 5 resumes."),
        Line::from("  Only PDFs are scored by the service."),
        Line::from(""),
        Line::from("Download:"),
        Line::from("  Resumes scoring 0.5 or more are saved as top_candidates.zip."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
