//! Color theme and styling for the review TUI.

use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    /// Accent for titles, focus and the selected tab
    pub primary: Color,
    /// Passing checks
    pub success: Color,
    /// Failing checks and tool errors
    pub error: Color,
    /// Hints, line numbers, inactive elements
    pub muted: Color,
    pub text: Color,
}

impl Theme {
    pub fn default_theme() -> Self {
        Self {
            primary: Color::Cyan,
            success: Color::Green,
            error: Color::Red,
            muted: Color::DarkGray,
            text: Color::White,
        }
    }

    pub fn warning(&self) -> Color {
        Color::Yellow
    }

    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.primary)
        } else {
            Style::default().fg(self.muted)
        }
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    pub fn hint_style(&self) -> Style {
        Style::default().fg(self.warning())
    }

    pub fn muted_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn text_style(&self) -> Style {
        Style::default().fg(self.text)
    }

    /// Key names in the footer
    pub fn key_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn line_number_style(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn selected_tab_style(&self) -> Style {
        Style::default()
            .fg(self.primary)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    }

    /// Running-job indicator
    pub fn busy_style(&self) -> Style {
        Style::default()
            .fg(self.warning())
            .add_modifier(Modifier::BOLD)
    }

    /// Complexity rank colors: A/B green, C/D yellow, E/F red.
    pub fn rank_style(&self, rank: char) -> Style {
        match rank {
            'A' | 'B' => Style::default().fg(self.success),
            'C' | 'D' => Style::default().fg(self.warning()),
            _ => Style::default().fg(self.error),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::default_theme()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_creation() {
        let theme = Theme::default_theme();
        assert_eq!(theme.primary, Color::Cyan);
        assert_eq!(theme.success, Color::Green);
        assert_eq!(theme.error, Color::Red);
    }

    #[test]
    fn test_pass_and_fail_are_distinct() {
        let theme = Theme::default_theme();
        assert_ne!(theme.success_style().fg, theme.error_style().fg);
        assert_eq!(theme.rank_style('A').fg, Some(Color::Green));
        assert_eq!(theme.rank_style('F').fg, Some(Color::Red));
    }
}
