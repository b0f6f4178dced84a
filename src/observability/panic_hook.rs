//! Panic hook that restores the terminal and prints a crash report.
//!
//! When the TUI is active the alternate screen and raw mode are left first,
//! otherwise the report would be drawn over (or hidden by) the UI.

use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const WIDTH: usize = 78;

static TUI_ACTIVE: AtomicBool = AtomicBool::new(false);

/// Mark whether the terminal is currently owned by the TUI.
pub fn set_tui_active(active: bool) {
    TUI_ACTIVE.store(active, Ordering::SeqCst);
}

pub fn is_tui_active() -> bool {
    TUI_ACTIVE.load(Ordering::SeqCst)
}

/// Install the crash-report panic hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        print_crash_report(info);
    }));
}

fn print_crash_report(info: &PanicHookInfo<'_>) {
    if is_tui_active() {
        exit_tui_mode();
    }

    eprintln!();
    for line in crash_report_lines(info) {
        eprintln!("{line}");
    }
}

fn exit_tui_mode() {
    set_tui_active(false);
    // Already panicking; nothing useful to do with these errors.
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = crossterm::execute!(
        std::io::stdout(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableBracketedPaste
    );
}

fn crash_report_lines(info: &PanicHookInfo<'_>) -> Vec<String> {
    let rule = format!("+{}+", "-".repeat(WIDTH));
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    let mut lines = vec![
        rule.clone(),
        boxed("PYREVIEW CRASH REPORT"),
        rule.clone(),
        boxed(&format!("Version: {VERSION}")),
        boxed(&format!("Platform: {}", std::env::consts::OS)),
        boxed(&format!("Time: {timestamp}")),
        rule.clone(),
        boxed(&format!("PANIC: {}", extract_panic_message(info))),
    ];
    if let Some(location) = info.location() {
        lines.push(boxed(&format!(
            "Location: {}:{}:{}",
            location.file(),
            location.line(),
            location.column()
        )));
    }
    lines.push(rule.clone());

    if std::env::var("RUST_BACKTRACE").is_ok() {
        lines.push(boxed("STACK TRACE:"));
        lines.push(rule);
        lines.push(std::backtrace::Backtrace::capture().to_string());
    } else {
        lines.push(boxed("Run with RUST_BACKTRACE=1 for stack trace"));
        lines.push(rule);
    }
    lines
}

fn boxed(text: &str) -> String {
    format!("|  {:<width$}|", truncate(text, WIDTH - 2), width = WIDTH - 2)
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
