//! Application state for the review TUI.

use super::editor::EditorBuffer;
use super::view;
use crate::core::{AnalysisResult, SourceText};
use crate::session::{Action, Reviewer, Session};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use std::fs;
use std::path::{Path, PathBuf};

/// Which widget receives typed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Editor,
    /// Path input for opening a file
    OpenPrompt,
}

/// Work requested by a key press, run after the "running" frame is drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    Submit,
    Open(PathBuf),
    Action(Action),
}

impl Job {
    pub fn label(&self) -> String {
        match self {
            Self::Submit => "Checking syntax and runtime...".to_string(),
            Self::Open(path) => format!("Opening {}...", path.display()),
            Self::Action(Action::Format) => "Formatting...".to_string(),
            Self::Action(Action::Complexity) => "Analyzing complexity...".to_string(),
            Self::Action(Action::Lint) => "Linting...".to_string(),
        }
    }
}

/// A file opened from disk; its text keeps the upload origin until edited.
#[derive(Debug, Clone)]
struct LoadedFile {
    name: String,
    text: String,
}

pub struct ReviewApp {
    reviewer: Reviewer,
    session: Session,
    editor: EditorBuffer,
    focus: Focus,
    prompt: String,
    tab: Action,
    result_scroll: u16,
    pending: Option<Job>,
    status: Option<String>,
    loaded: Option<LoadedFile>,
    /// Editor viewport height from the last render
    editor_height: usize,
}

impl ReviewApp {
    pub fn new(reviewer: Reviewer) -> Self {
        Self {
            reviewer,
            session: Session::new(),
            editor: EditorBuffer::new(),
            focus: Focus::Editor,
            prompt: String::new(),
            tab: Action::Format,
            result_scroll: 0,
            pending: None,
            status: None,
            loaded: None,
            editor_height: 20,
        }
    }

    /// Queue a file to be opened on the first loop iteration.
    pub fn open_on_start(&mut self, path: PathBuf) {
        self.pending = Some(Job::Open(path));
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut EditorBuffer {
        &mut self.editor
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn tab(&self) -> Action {
        self.tab
    }

    pub fn result_scroll(&self) -> u16 {
        self.result_scroll
    }

    pub fn pending(&self) -> Option<&Job> {
        self.pending.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn complexity_engine(&self) -> &str {
        self.reviewer.complexity_engine()
    }

    pub fn set_editor_height(&mut self, height: usize) {
        self.editor_height = height;
        self.editor.scroll_to_cursor(height);
    }

    pub fn render(&mut self, frame: &mut Frame) {
        view::render(frame, self);
    }

    /// Handle a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(false);
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('q') {
            return Ok(true);
        }

        match self.focus {
            Focus::OpenPrompt => self.handle_prompt_key(key),
            Focus::Editor if ctrl => self.handle_command_key(key),
            Focus::Editor => self.handle_editor_key(key),
        }
        Ok(false)
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.focus = Focus::Editor,
            KeyCode::Enter => {
                let path = self.prompt.trim();
                if !path.is_empty() {
                    self.pending = Some(Job::Open(PathBuf::from(path)));
                }
                self.focus = Focus::Editor;
            }
            KeyCode::Backspace => {
                self.prompt.pop();
            }
            KeyCode::Char(c) => self.prompt.push(c),
            _ => {}
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('s') => {
                if self.editor.is_blank() {
                    self.status = Some("Enter some code first.".to_string());
                } else {
                    self.pending = Some(Job::Submit);
                }
            }
            KeyCode::Char('o') => {
                self.focus = Focus::OpenPrompt;
                self.status = None;
            }
            KeyCode::Char('f') => self.request(Action::Format),
            KeyCode::Char('k') => self.request(Action::Complexity),
            KeyCode::Char('l') => self.request(Action::Lint),
            KeyCode::Char('a') => self.adopt_formatted(),
            KeyCode::Char('n') => self.next_tab(),
            KeyCode::Up => self.result_scroll = self.result_scroll.saturating_sub(1),
            KeyCode::Down => self.result_scroll = self.result_scroll.saturating_add(1),
            _ => {}
        }
    }

    fn handle_editor_key(&mut self, key: KeyEvent) {
        let editor = &mut self.editor;
        match key.code {
            KeyCode::Char(c) => editor.insert_char(c),
            KeyCode::Enter => editor.insert_newline(),
            KeyCode::Tab => editor.insert_indent(),
            KeyCode::Backspace => editor.backspace(),
            KeyCode::Delete => editor.delete(),
            KeyCode::Left => editor.move_left(),
            KeyCode::Right => editor.move_right(),
            KeyCode::Up => editor.move_up(),
            KeyCode::Down => editor.move_down(),
            KeyCode::Home => editor.move_home(),
            KeyCode::End => editor.move_end(),
            KeyCode::PageUp => editor.page_up(self.editor_height),
            KeyCode::PageDown => editor.page_down(self.editor_height),
            _ => return,
        }
        editor.scroll_to_cursor(self.editor_height);
    }

    /// Paste text into the editor at the cursor.
    pub fn paste(&mut self, text: &str) {
        if self.focus == Focus::OpenPrompt {
            self.prompt.push_str(text.trim());
            return;
        }
        self.editor.insert_str(text);
        self.editor.scroll_to_cursor(self.editor_height);
    }

    fn request(&mut self, action: Action) {
        self.tab = action;
        if self.session.source().is_none() {
            self.status = Some("Submit code first (Ctrl+S) or open a file (Ctrl+O).".to_string());
        } else {
            self.pending = Some(Job::Action(action));
        }
    }

    fn next_tab(&mut self) {
        let index = Action::ALL.iter().position(|a| *a == self.tab).unwrap_or(0);
        self.tab = Action::ALL[(index + 1) % Action::ALL.len()];
        self.result_scroll = 0;
    }

    fn adopt_formatted(&mut self) {
        match self.session.action_result(Action::Format) {
            Some(AnalysisResult::Formatted(code)) => {
                self.editor.set_text(&code.text);
                self.status = Some("Formatted code copied to the editor.".to_string());
            }
            _ => self.status = Some("Nothing to adopt; run Format (Ctrl+F) first.".to_string()),
        }
    }

    /// Run the queued job, if any. Blocks until the job finishes.
    pub fn run_pending(&mut self) {
        let Some(job) = self.pending.take() else {
            return;
        };
        self.status = None;
        match job {
            Job::Submit => {
                let source = self.current_source();
                self.reviewer.submit(&mut self.session, source);
            }
            Job::Open(path) => self.open(&path),
            Job::Action(action) => {
                self.tab = action;
                self.result_scroll = 0;
                if let Err(e) = self.reviewer.perform(&mut self.session, action) {
                    self.status = Some(e.to_string());
                }
            }
        }
    }

    fn current_source(&self) -> SourceText {
        let text = self.editor.text();
        match &self.loaded {
            Some(file) if file.text == text => SourceText::uploaded(&file.name, text),
            _ => SourceText::manual(text),
        }
    }

    fn open(&mut self, path: &Path) {
        match fs::read(path) {
            Ok(bytes) => {
                let text = String::from_utf8_lossy(&bytes).into_owned();
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.editor.set_text(&text);
                self.loaded = Some(LoadedFile {
                    name: name.clone(),
                    text: self.editor.text(),
                });
                self.reviewer
                    .submit(&mut self.session, SourceText::uploaded(name, text));
            }
            Err(e) => {
                tracing::warn!("failed to open {}: {}", path.display(), e);
                self.status = Some(format!("Cannot open {}: {}", path.display(), e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ComplexityConfig, EngineKind, ReviewConfig};
    use crate::core::InputOrigin;
    use crate::errors::ToolError;
    use crate::runtime::{CodeRunner, ExecutionOutcome};
    use crate::session::CheckState;
    use tempfile::TempDir;

    struct Clean;

    impl CodeRunner for Clean {
        fn execute(&self, _source: &str) -> Result<ExecutionOutcome, ToolError> {
            Ok(ExecutionOutcome {
                status: Some(0),
                ..ExecutionOutcome::default()
            })
        }
    }

    fn app() -> ReviewApp {
        let config = ReviewConfig {
            complexity: ComplexityConfig {
                engine: EngineKind::Builtin,
                ..ComplexityConfig::default()
            },
            ..ReviewConfig::default()
        };
        ReviewApp::new(Reviewer::new(&config).unwrap().with_runner(Clean))
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn type_text(app: &mut ReviewApp, text: &str) {
        for c in text.chars() {
            let event = if c == '\n' {
                key(KeyCode::Enter)
            } else {
                key(KeyCode::Char(c))
            };
            app.handle_key(event).unwrap();
        }
    }

    #[test]
    fn test_quit() {
        let mut app = app();
        assert!(app.handle_key(ctrl('q')).unwrap());
    }

    #[test]
    fn test_submit_runs_checks() {
        let mut app = app();
        type_text(&mut app, "x = 1");
        app.handle_key(ctrl('s')).unwrap();
        assert_eq!(app.pending(), Some(&Job::Submit));
        app.run_pending();
        assert_eq!(app.session().state(), CheckState::Clean);
        assert_eq!(app.session().source().unwrap().origin(), &InputOrigin::Manual);
    }

    #[test]
    fn test_submit_blank_editor_is_refused() {
        let mut app = app();
        app.handle_key(ctrl('s')).unwrap();
        assert_eq!(app.pending(), None);
        assert!(app.status().is_some());
    }

    #[test]
    fn test_action_requires_input() {
        let mut app = app();
        app.handle_key(ctrl('k')).unwrap();
        assert_eq!(app.pending(), None);
        assert_eq!(app.tab(), Action::Complexity);
    }

    #[test]
    fn test_complexity_action() {
        let mut app = app();
        type_text(&mut app, "def f():\nreturn 1");
        app.handle_key(ctrl('s')).unwrap();
        app.run_pending();
        app.handle_key(ctrl('k')).unwrap();
        app.run_pending();
        assert!(matches!(
            app.session().action_result(Action::Complexity),
            Some(AnalysisResult::Complexity(report)) if report.max_score() == Some(1)
        ));
    }

    #[test]
    fn test_open_file_submits_as_upload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sample.py");
        fs::write(&path, "def f(x) return x\n").unwrap();

        let mut app = app();
        app.handle_key(ctrl('o')).unwrap();
        assert_eq!(app.focus(), Focus::OpenPrompt);
        app.paste(&path.display().to_string());
        app.handle_key(key(KeyCode::Enter)).unwrap();
        app.run_pending();

        assert_eq!(app.session().state(), CheckState::SyntaxFailed);
        assert_eq!(
            app.session().source().unwrap().label(),
            "Uploaded: sample.py"
        );

        // Resubmitting the unchanged text keeps the upload origin.
        app.handle_key(ctrl('s')).unwrap();
        app.run_pending();
        assert_eq!(
            app.session().source().unwrap().label(),
            "Uploaded: sample.py"
        );
    }

    #[test]
    fn test_open_non_utf8_file_decodes_lossily() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("latin1.py");
        fs::write(&path, b"name = '\xe9t\xe9'\n").unwrap();

        let mut app = app();
        app.open_on_start(path);
        app.run_pending();

        let source = app.session().source().unwrap();
        assert_eq!(source.label(), "Uploaded: latin1.py");
        assert_eq!(source.as_str(), "name = '\u{FFFD}t\u{FFFD}'\n");
        assert!(app.status().is_none());
    }

    #[test]
    fn test_open_missing_file_sets_status() {
        let mut app = app();
        app.open_on_start(PathBuf::from("/nonexistent/file.py"));
        app.run_pending();
        assert!(app.status().unwrap().starts_with("Cannot open"));
        assert_eq!(app.session().state(), CheckState::AwaitingInput);
    }

    #[test]
    fn test_next_tab_cycles() {
        let mut app = app();
        app.handle_key(ctrl('n')).unwrap();
        assert_eq!(app.tab(), Action::Complexity);
        app.handle_key(ctrl('n')).unwrap();
        app.handle_key(ctrl('n')).unwrap();
        assert_eq!(app.tab(), Action::Format);
    }
}
