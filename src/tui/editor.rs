//! Minimal multi-line text buffer for manual code entry.

use unicode_width::UnicodeWidthStr;

const INDENT: &str = "    ";

/// Line-oriented buffer with a character-indexed cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorBuffer {
    lines: Vec<String>,
    row: usize,
    /// Cursor column in characters
    col: usize,
    /// First visible line
    scroll: usize,
}

impl Default for EditorBuffer {
    fn default() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            scroll: 0,
        }
    }
}

impl EditorBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_text(text: &str) -> Self {
        let mut buffer = Self::default();
        buffer.set_text(text);
        buffer
    }

    /// Replace the contents and move the cursor to the start.
    pub fn set_text(&mut self, text: &str) {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        self.lines = lines;
        self.row = 0;
        self.col = 0;
        self.scroll = 0;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.trim().is_empty())
    }

    /// Cursor as (row, character column).
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    /// Display column of the cursor, accounting for wide characters.
    pub fn cursor_display_col(&self) -> usize {
        let line = &self.lines[self.row];
        line[..byte_index(line, self.col)].width()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Keep the cursor inside a viewport of `height` lines.
    pub fn scroll_to_cursor(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + height {
            self.scroll = self.row + 1 - height;
        }
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        line.insert(at, c);
        self.col += 1;
    }

    pub fn insert_str(&mut self, s: &str) {
        for c in s.chars() {
            match c {
                '\n' => self.insert_newline(),
                '\r' => {}
                c => self.insert_char(c),
            }
        }
    }

    /// Soft tab: spaces up to the next multiple of four.
    pub fn insert_indent(&mut self) {
        let width = INDENT.len() - self.col % INDENT.len();
        for _ in 0..width {
            self.insert_char(' ');
        }
    }

    /// Split the line, carrying its indentation over (plus one level after `:`).
    pub fn insert_newline(&mut self) {
        let line = &mut self.lines[self.row];
        let at = byte_index(line, self.col);
        let rest = line.split_off(at);

        let mut indent: String = line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        if line.trim_end().ends_with(':') {
            indent.push_str(INDENT);
        }
        self.col = indent.chars().count();
        self.row += 1;
        self.lines.insert(self.row, indent + &rest);
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col - 1);
            line.remove(at);
            self.col -= 1;
        } else if self.row > 0 {
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&current);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let line = &mut self.lines[self.row];
            let at = byte_index(line, self.col);
            line.remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len(self.row));
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_len(self.row);
    }

    pub fn page_up(&mut self, height: usize) {
        for _ in 0..height.max(1) {
            self.move_up();
        }
    }

    pub fn page_down(&mut self, height: usize) {
        for _ in 0..height.max(1) {
            self.move_down();
        }
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_typing_and_text() {
        let mut editor = EditorBuffer::new();
        editor.insert_str("x = 1\ny = 2");
        assert_eq!(editor.text(), "x = 1\ny = 2");
        assert_eq!(editor.cursor(), (1, 5));
    }

    #[test]
    fn test_newline_keeps_indent_and_indents_after_colon() {
        let mut editor = EditorBuffer::new();
        editor.insert_str("def f(x):");
        editor.insert_newline();
        assert_eq!(editor.cursor(), (1, 4));
        editor.insert_str("return x");
        editor.insert_newline();
        assert_eq!(editor.text(), "def f(x):\n    return x\n    ");
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut editor = EditorBuffer::from_text("ab\ncd");
        editor.move_down();
        editor.move_home();
        editor.backspace();
        assert_eq!(editor.text(), "abcd");
        assert_eq!(editor.cursor(), (0, 2));
    }

    #[test]
    fn test_delete_at_end_of_line_joins_next() {
        let mut editor = EditorBuffer::from_text("ab\ncd");
        editor.move_end();
        editor.delete();
        assert_eq!(editor.text(), "abcd");
    }

    #[test]
    fn test_multibyte_characters() {
        let mut editor = EditorBuffer::from_text("s = 'héllo'");
        editor.move_end();
        editor.move_left();
        editor.move_left();
        editor.backspace();
        assert_eq!(editor.text(), "s = 'hélo'");
        assert_eq!(editor.cursor_display_col(), 8);
    }

    #[test]
    fn test_soft_tab() {
        let mut editor = EditorBuffer::new();
        editor.insert_char('x');
        editor.insert_indent();
        assert_eq!(editor.text(), "x   ");
    }

    #[test]
    fn test_vertical_movement_clamps_column() {
        let mut editor = EditorBuffer::from_text("long line\nab");
        editor.move_end();
        editor.move_down();
        assert_eq!(editor.cursor(), (1, 2));
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let mut editor = EditorBuffer::from_text(&"x\n".repeat(20));
        editor.page_down(15);
        editor.scroll_to_cursor(10);
        assert_eq!(editor.scroll(), 6);
        editor.page_up(15);
        editor.scroll_to_cursor(10);
        assert_eq!(editor.scroll(), 0);
    }

    #[test]
    fn test_blank() {
        assert!(EditorBuffer::from_text("  \n\t\n").is_blank());
        assert!(!EditorBuffer::from_text("pass").is_blank());
    }
}
