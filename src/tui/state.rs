use crate::model::{WorkflowEvent, WorkflowSnapshot};
use crate::orchestrator::UiCommand;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    style::Color,
    style::Style,
    text::{Line, Span},
};
use std::path::PathBuf;

/// Form field that receives typed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Files,
    Job,
    Enhanced,
    Credential,
}

impl Field {
    fn next(self, enhanced: bool) -> Self {
        match self {
            Field::Files => Field::Job,
            Field::Job => Field::Enhanced,
            Field::Enhanced if enhanced => Field::Credential,
            Field::Enhanced | Field::Credential => Field::Files,
        }
    }

    fn prev(self, enhanced: bool) -> Self {
        match self {
            Field::Files if enhanced => Field::Credential,
            Field::Files => Field::Enhanced,
            Field::Job => Field::Files,
            Field::Enhanced => Field::Job,
            Field::Credential => Field::Enhanced,
        }
    }
}

pub struct UiState {
    pub focus: Field,
    pub files_input: String,
    pub job_input: String,
    pub credential_input: String,
    pub enhanced: bool,
    pub show_help: bool,
    pub info: String,
    /// Pending warning; shown until dismissed.
    pub alert: Option<String>,
    pub last_archive: Option<PathBuf>,
    // Controller-owned workflow state, as last published.
    pub workflow: WorkflowSnapshot,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            focus: Field::Files,
            files_input: String::new(),
            job_input: String::new(),
            credential_input: String::new(),
            enhanced: false,
            show_help: false,
            info: "Enter resume paths separated by ';' and press Enter to select them.".into(),
            alert: None,
            last_archive: None,
            workflow: WorkflowSnapshot::default(),
        }
    }
}

/// Separator between entries in the files field. Paths may contain spaces.
pub const PATH_SEPARATOR: char = ';';

/// Split the files field into paths, trimming each entry and skipping blanks.
pub fn parse_paths(input: &str) -> Vec<PathBuf> {
    input
        .split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .collect()
}

impl UiState {
    pub fn apply_event(&mut self, ev: WorkflowEvent) {
        match ev {
            WorkflowEvent::StateChanged(snapshot) => self.workflow = *snapshot,
            WorkflowEvent::Alert(msg) => self.alert = Some(msg),
            WorkflowEvent::Info(info) => self.info = info.to_message(),
            WorkflowEvent::ArchiveSaved { path } => {
                self.info = format!("Saved: {}", path.display());
                self.last_archive = Some(path);
            }
        }
    }

    fn edit_target(&mut self) -> Option<&mut String> {
        match self.focus {
            Field::Files => Some(&mut self.files_input),
            Field::Job => Some(&mut self.job_input),
            Field::Credential => Some(&mut self.credential_input),
            Field::Enhanced => None,
        }
    }

    /// Command that mirrors the focused field after an edit.
    fn sync_command(&self) -> Option<UiCommand> {
        match self.focus {
            Field::Job => Some(UiCommand::SetJob(self.job_input.clone())),
            Field::Credential => Some(UiCommand::SetCredential(self.credential_input.clone())),
            Field::Enhanced => Some(UiCommand::SetEnhanced(self.enhanced)),
            Field::Files => None,
        }
    }

    fn toggle_enhanced(&mut self) -> Option<UiCommand> {
        self.enhanced = !self.enhanced;
        if !self.enhanced && self.focus == Field::Credential {
            self.focus = Field::Enhanced;
        }
        Some(UiCommand::SetEnhanced(self.enhanced))
    }

    /// Apply a key press to the form and return the command it triggers, if any.
    pub fn handle_key(&mut self, k: KeyEvent) -> Option<UiCommand> {
        if self.alert.is_some() {
            // Alerts block the form until acknowledged, like a modal dialog.
            if matches!(k.code, KeyCode::Enter | KeyCode::Esc) {
                self.alert = None;
            }
            if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
                return Some(UiCommand::Quit);
            }
            return None;
        }

        match (k.modifiers, k.code) {
            (KeyModifiers::CONTROL, KeyCode::Char('c')) | (_, KeyCode::Esc) => {
                Some(UiCommand::Quit)
            }
            (KeyModifiers::CONTROL, KeyCode::Char('s')) | (_, KeyCode::F(5)) => {
                Some(UiCommand::Submit)
            }
            (KeyModifiers::CONTROL, KeyCode::Char('d')) | (_, KeyCode::F(6)) => {
                Some(UiCommand::Download)
            }
            (_, KeyCode::F(1)) => {
                self.show_help = !self.show_help;
                None
            }
            (_, KeyCode::Tab) => {
                self.focus = self.focus.next(self.enhanced);
                None
            }
            (_, KeyCode::BackTab) => {
                self.focus = self.focus.prev(self.enhanced);
                None
            }
            (_, KeyCode::Enter) => match self.focus {
                Field::Files => Some(UiCommand::SelectFiles(parse_paths(&self.files_input))),
                Field::Job => {
                    self.job_input.push('\n');
                    self.sync_command()
                }
                Field::Enhanced => self.toggle_enhanced(),
                Field::Credential => None,
            },
            (_, KeyCode::Char(' ')) if self.focus == Field::Enhanced => self.toggle_enhanced(),
            (_, KeyCode::Backspace) => {
                self.edit_target()?.pop();
                self.sync_command()
            }
            (m, KeyCode::Char(c)) if !m.contains(KeyModifiers::CONTROL) => {
                self.edit_target()?.push(c);
                self.sync_command()
            }
            _ => None,
        }
    }
}

pub fn push_wrapped_status_kv(
    out: &mut Vec<Line<'static>>,
    label: &str,
    value: &str,
    status_area_width: u16,
    color: Color,
) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }

    // Account for borders (2 chars on each side)
    let usable_width = status_area_width.saturating_sub(4).max(1);
    let label_text = format!("{label}:");
    let label_width = label_text.chars().count() as u16;

    let value_chars: Vec<char> = value.chars().collect();
    let mut remaining = value_chars.as_slice();
    let mut first = true;

    while !remaining.is_empty() {
        let line_width = if first {
            usable_width.saturating_sub(label_width + 1).max(1)
        } else {
            usable_width.saturating_sub(2).max(1)
        };

        let chars_to_take = (remaining.len() as u16).min(line_width) as usize;
        let (line_chars, rest) = remaining.split_at(chars_to_take);
        let line_text: String = line_chars.iter().collect();

        if first {
            out.push(Line::from(vec![
                Span::styled(label_text.clone(), Style::default().fg(Color::Gray)),
                Span::raw(" "),
                Span::styled(line_text, Style::default().fg(color)),
            ]));
            first = false;
        } else {
            out.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(line_text, Style::default().fg(color)),
            ]));
        }

        remaining = rest;
    }
}
