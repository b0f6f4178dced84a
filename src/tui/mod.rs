//! Interactive terminal front end.
//!
//! The editor pane is manual entry, `Ctrl+O` opens a file (upload). Checks
//! run on submit; Format, Complexity and Lint run on demand. Every job is
//! synchronous: the "running" frame is drawn first, then the job blocks the
//! loop until it finishes.
//!
//! ```rust,ignore
//! use pyreview::tui::ReviewExplorer;
//!
//! let mut explorer = ReviewExplorer::new(reviewer)?;
//! explorer.run()?;
//! ```

pub mod app;
pub mod editor;
pub mod theme;
pub mod view;

use crate::observability::set_tui_active;
use crate::session::Reviewer;
use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use app::ReviewApp;

/// Review TUI manager
pub struct ReviewExplorer {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    app: ReviewApp,
}

impl ReviewExplorer {
    pub fn new(reviewer: Reviewer) -> Result<Self> {
        enable_raw_mode()?;
        set_tui_active(true);
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;

        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(Self {
            terminal,
            app: ReviewApp::new(reviewer),
        })
    }

    /// Load `path` as an upload before the first key press.
    pub fn open(&mut self, path: PathBuf) {
        self.app.open_on_start(path);
    }

    /// Run the interactive event loop
    pub fn run(&mut self) -> Result<()> {
        loop {
            self.terminal.draw(|f| self.app.render(f))?;

            if self.app.pending().is_some() {
                self.app.run_pending();
                continue;
            }

            if !event::poll(Duration::from_millis(250))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if key.code == KeyCode::Char('c')
                        && key.modifiers.contains(KeyModifiers::CONTROL)
                    {
                        break;
                    }
                    if self.app.handle_key(key)? {
                        break;
                    }
                }
                Event::Paste(text) => self.app.paste(&text),
                _ => {}
            }
        }

        self.cleanup()?;
        Ok(())
    }

    /// Restore the terminal
    fn cleanup(&mut self) -> Result<()> {
        set_tui_active(false);
        disable_raw_mode()?;
        execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableBracketedPaste
        )?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

impl Drop for ReviewExplorer {
    fn drop(&mut self) {
        let _ = self.cleanup();
    }
}
