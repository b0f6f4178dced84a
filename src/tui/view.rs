//! Rendering for the review TUI.
//!
//! Layout: editor on the left, check verdict and action results on the
//! right, key hints in the footer. The open-file prompt is drawn as a popup.

use super::app::{Focus, ReviewApp};
use super::theme::Theme;
use crate::core::{AnalysisResult, ComplexityReport};
use crate::session::{Action, CheckState, Session};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
    Frame,
};

const LINE_NUMBER_WIDTH: u16 = 5;

pub fn render(frame: &mut Frame, app: &mut ReviewApp) {
    let theme = Theme::default();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Min(0),    // Body
            Constraint::Length(1), // Footer
        ])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(body[1]);

    render_header(frame, app, chunks[0], &theme);
    render_editor(frame, app, body[0], &theme);
    render_checks(frame, app.session(), right[0], &theme);
    render_results(frame, app, right[1], &theme);
    render_footer(frame, app, chunks[2], &theme);

    if app.focus() == Focus::OpenPrompt {
        render_open_prompt(frame, app, &theme);
    }
}

fn render_header(frame: &mut Frame, app: &ReviewApp, area: Rect, theme: &Theme) {
    let origin = app
        .session()
        .source()
        .map(|s| s.label())
        .unwrap_or_else(|| "no input".to_string());
    let header = Paragraph::new(Line::from(vec![
        Span::styled("pyreview", theme.title_style()),
        Span::raw("  "),
        Span::styled(origin, theme.muted_style()),
        Span::raw("  "),
        Span::styled(
            format!("complexity: {}", app.complexity_engine()),
            theme.muted_style(),
        ),
    ]));
    frame.render_widget(header, area);
}

fn render_editor(frame: &mut Frame, app: &mut ReviewApp, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(app.focus() == Focus::Editor))
        .title(Span::styled(" Code ", theme.title_style()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    app.set_editor_height(inner.height as usize);
    let editor = app.editor();
    let lines: Vec<Line> = editor
        .lines()
        .iter()
        .enumerate()
        .skip(editor.scroll())
        .take(inner.height as usize)
        .map(|(index, text)| {
            Line::from(vec![
                Span::styled(
                    format!("{:>4} ", index + 1),
                    theme.line_number_style(),
                ),
                Span::styled(text.clone(), theme.text_style()),
            ])
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    if app.focus() == Focus::Editor && app.pending().is_none() {
        let (row, _) = editor.cursor();
        let x = inner.x + LINE_NUMBER_WIDTH + editor.cursor_display_col() as u16;
        let y = inner.y + (row - editor.scroll()) as u16;
        if x < inner.right() && y < inner.bottom() {
            frame.set_cursor_position((x, y));
        }
    }
}

fn render_checks(frame: &mut Frame, session: &Session, area: Rect, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(false))
        .title(Span::styled(" Checks ", theme.title_style()));

    let paragraph = Paragraph::new(check_lines(session, theme))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

/// Verdict lines for the automatic checks.
pub fn check_lines(session: &Session, theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    match session.state() {
        CheckState::AwaitingInput => lines.push(Line::styled(
            "Type code and press Ctrl+S, or open a file with Ctrl+O.",
            theme.muted_style(),
        )),
        CheckState::InputReceived => lines.push(Line::styled("Checking...", theme.busy_style())),
        CheckState::Clean => {
            lines.push(Line::styled("No syntax errors found.", theme.success_style()));
            lines.push(Line::styled(
                "No runtime errors detected.",
                theme.success_style(),
            ));
        }
        CheckState::SyntaxFailed | CheckState::RuntimeFailed => {
            if session.state() == CheckState::RuntimeFailed {
                lines.push(Line::styled("No syntax errors found.", theme.success_style()));
            }
            if let Some(result) = session.check_result() {
                lines.push(Line::styled(result_headline(result), theme.error_style()));
            }
            if let Some(hint) = session.suggestion() {
                lines.push(Line::from(vec![
                    Span::styled("Suggestion: ", theme.hint_style()),
                    Span::styled(hint.to_string(), theme.text_style()),
                ]));
            }
        }
    }
    lines
}

/// One-line description of a failing check result.
fn result_headline(result: &AnalysisResult) -> String {
    match result {
        AnalysisResult::SyntaxError(error) => error.to_string(),
        AnalysisResult::RuntimeError { message, .. } => message.clone(),
        AnalysisResult::ToolError(error) => format!("Runtime check unavailable: {error}"),
        other => format!("{other:?}"),
    }
}

fn render_results(frame: &mut Frame, app: &ReviewApp, area: Rect, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(0)])
        .split(area);

    let selected = Action::ALL
        .iter()
        .position(|a| *a == app.tab())
        .unwrap_or(0);
    let tabs = Tabs::new(Action::ALL.iter().map(|a| a.label()))
        .select(selected)
        .style(theme.muted_style())
        .highlight_style(theme.selected_tab_style())
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(tabs, chunks[0]);

    let lines = match app.session().action_result(app.tab()) {
        Some(result) => result_lines(result, theme),
        None => vec![Line::styled(empty_hint(app.tab()), theme.muted_style())],
    };
    let paragraph = Paragraph::new(lines)
        .scroll((app.result_scroll(), 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, chunks[1]);
}

fn empty_hint(action: Action) -> &'static str {
    match action {
        Action::Format => "Press Ctrl+F to format the code.",
        Action::Complexity => "Press Ctrl+K to analyze complexity.",
        Action::Lint => "Press Ctrl+L to lint the code.",
    }
}

/// Body of a result tab.
pub fn result_lines(result: &AnalysisResult, theme: &Theme) -> Vec<Line<'static>> {
    match result {
        AnalysisResult::Formatted(code) => {
            let mut lines = vec![Line::styled(
                "Formatted code (Ctrl+A to use it):",
                theme.success_style(),
            )];
            lines.extend(
                code.text
                    .lines()
                    .map(|l| Line::styled(l.to_string(), theme.text_style())),
            );
            lines
        }
        AnalysisResult::Complexity(report) => complexity_lines(report, theme),
        AnalysisResult::Lint(report) if !report.has_findings() => {
            vec![Line::styled("No lint findings.", theme.success_style())]
        }
        AnalysisResult::Lint(report) => report
            .text
            .lines()
            .map(|l| Line::styled(l.to_string(), theme.text_style()))
            .collect(),
        AnalysisResult::ToolError(error) => {
            vec![Line::styled(error.to_string(), theme.error_style())]
        }
        AnalysisResult::SyntaxError(error) => {
            vec![Line::styled(error.to_string(), theme.error_style())]
        }
        AnalysisResult::RuntimeError { message, .. } => {
            vec![Line::styled(message.clone(), theme.error_style())]
        }
    }
}

fn complexity_lines(report: &ComplexityReport, theme: &Theme) -> Vec<Line<'static>> {
    if report.records.is_empty() {
        return vec![Line::styled(
            "No functions or classes to score.",
            theme.muted_style(),
        )];
    }

    let mut lines: Vec<Line> = report
        .records
        .iter()
        .map(|record| {
            Line::from(vec![
                Span::styled(
                    format!("{} {:>4}  ", record.kind.letter(), record.line),
                    theme.muted_style(),
                ),
                Span::styled(record.name.clone(), theme.text_style()),
                Span::raw(" - "),
                Span::styled(
                    format!("{} ({})", record.rank(), record.score),
                    theme.rank_style(record.rank()),
                ),
            ])
        })
        .collect();

    if let Some(average) = report.average_score() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!(
                "{} blocks, average complexity {:.1}",
                report.records.len(),
                average
            ),
            theme.muted_style(),
        ));
    }
    lines
}

fn render_footer(frame: &mut Frame, app: &ReviewApp, area: Rect, theme: &Theme) {
    let line = if let Some(job) = app.pending() {
        Line::styled(job.label(), theme.busy_style())
    } else if let Some(status) = app.status() {
        Line::styled(status.to_string(), theme.hint_style())
    } else {
        let keys = [
            ("^S", "check"),
            ("^O", "open"),
            ("^F", "format"),
            ("^K", "complexity"),
            ("^L", "lint"),
            ("^A", "adopt"),
            ("^N", "tab"),
            ("^Q", "quit"),
        ];
        let spans: Vec<Span> = keys
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(*key, theme.key_style()),
                    Span::styled(format!(" {label}  "), theme.muted_style()),
                ]
            })
            .collect();
        Line::from(spans)
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_open_prompt(frame: &mut Frame, app: &ReviewApp, theme: &Theme) {
    let area = centered_rect(60, 3, frame.area());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style(true))
        .title(Span::styled(" Open file (Enter / Esc) ", theme.title_style()));
    let input = Paragraph::new(app.prompt().to_string()).block(block);

    frame.render_widget(Clear, area);
    frame.render_widget(input, area);

    let x = area.x + 1 + app.prompt().chars().count() as u16;
    if x < area.right().saturating_sub(1) {
        frame.set_cursor_position((x, area.y + 1));
    }
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height: height.min(area.height),
    }
}
