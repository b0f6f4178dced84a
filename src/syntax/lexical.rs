//! Token-level checks the grammar parser cannot report precisely: string
//! termination, delimiter balance, line continuations and indentation.
//!
//! The scanner only understands enough of Python's lexical structure to skip
//! comments and string bodies and to find logical line boundaries.

use crate::core::{ErrorCategory, SyntaxError};

const TAB_SIZE: usize = 8;

const ROOT_INDENT: Indent = Indent {
    width: 0,
    alt_width: 0,
};

#[derive(Debug, Clone, Copy)]
struct Position {
    line: usize,
    column: usize,
}

#[derive(Debug, Clone, Copy)]
struct OpenDelimiter {
    ch: char,
    at: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Indent {
    /// Width with tabs expanded to the next multiple of eight
    width: usize,
    /// Width with tabs counted as one column
    alt_width: usize,
}

#[derive(Debug, Clone)]
struct LogicalLine {
    line: usize,
    indent: Indent,
    /// Characters of leading whitespace on the first physical line
    indent_chars: usize,
    /// Last character that is not whitespace or comment
    last: char,
    /// Column just past `last` on its physical line
    end: Position,
}

/// Run all lexical checks and return the first error in source order.
pub fn check(source: &str) -> Result<(), SyntaxError> {
    let lines = Scanner::new(source).scan()?;
    check_indentation(&lines)
}

struct Scanner {
    chars: Vec<char>,
    idx: usize,
    line: usize,
    column: usize,
    line_start: usize,
    stack: Vec<OpenDelimiter>,
    current: Option<LogicalLine>,
    lines: Vec<LogicalLine>,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            idx: 0,
            line: 1,
            column: 1,
            line_start: 0,
            stack: Vec::new(),
            current: None,
            lines: Vec::new(),
        }
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn here(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek(0) {
            self.idx += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
                self.line_start = self.idx;
            } else {
                self.column += 1;
            }
        }
    }

    fn scan(mut self) -> Result<Vec<LogicalLine>, SyntaxError> {
        while let Some(c) = self.peek(0) {
            match c {
                '\n' => {
                    if self.stack.is_empty() {
                        if let Some(line) = self.current.take() {
                            self.lines.push(line);
                        }
                    }
                    self.bump();
                }
                ' ' | '\t' | '\x0c' | '\r' => self.bump(),
                '#' => {
                    while matches!(self.peek(0), Some(c) if c != '\n') {
                        self.bump();
                    }
                }
                '\\' => self.continuation()?,
                '"' | '\'' => {
                    self.begin_token();
                    self.string(c)?;
                    self.mark_last(c);
                }
                '(' | '[' | '{' => {
                    self.begin_token();
                    self.stack.push(OpenDelimiter {
                        ch: c,
                        at: self.here(),
                    });
                    self.bump();
                    self.mark_last(c);
                }
                ')' | ']' | '}' => {
                    self.begin_token();
                    self.close(c)?;
                    self.bump();
                    self.mark_last(c);
                }
                _ => {
                    self.begin_token();
                    self.bump();
                    self.mark_last(c);
                }
            }
        }

        if let Some(open) = self.stack.last() {
            return Err(SyntaxError::new(
                format!("'{}' was never closed", open.ch),
                open.at.line,
                open.at.column,
                ErrorCategory::UnexpectedEof,
            ));
        }
        if let Some(line) = self.current.take() {
            self.lines.push(line);
        }
        Ok(self.lines)
    }

    fn begin_token(&mut self) {
        if self.current.is_some() {
            return;
        }
        let (indent, indent_chars) = measure_indent(&self.chars[self.line_start..]);
        self.current = Some(LogicalLine {
            line: self.line,
            indent,
            indent_chars,
            last: ' ',
            end: self.here(),
        });
    }

    fn mark_last(&mut self, c: char) {
        let end = self.here();
        if let Some(line) = self.current.as_mut() {
            line.last = c;
            line.end = end;
        }
    }

    fn continuation(&mut self) -> Result<(), SyntaxError> {
        let at = self.here();
        match self.peek(1) {
            Some('\n') => {
                self.bump();
                self.bump();
                Ok(())
            }
            Some('\r') if self.peek(2) == Some('\n') => {
                self.bump();
                self.bump();
                self.bump();
                Ok(())
            }
            None => Err(SyntaxError::new(
                "unexpected EOF while parsing",
                at.line,
                at.column,
                ErrorCategory::UnexpectedEof,
            )),
            Some(_) => Err(SyntaxError::new(
                "unexpected character after line continuation character",
                at.line,
                at.column + 1,
                ErrorCategory::InvalidSyntax,
            )),
        }
    }

    fn string(&mut self, quote: char) -> Result<(), SyntaxError> {
        let start = self.here();
        let triple = self.peek(1) == Some(quote) && self.peek(2) == Some(quote);
        let opening = if triple { 3 } else { 1 };
        for _ in 0..opening {
            self.bump();
        }

        loop {
            match self.peek(0) {
                None => {
                    let kind = if triple {
                        "unterminated triple-quoted string literal"
                    } else {
                        "unterminated string literal"
                    };
                    return Err(SyntaxError::new(
                        format!("{kind} (detected at line {})", self.line),
                        start.line,
                        start.column,
                        ErrorCategory::UnexpectedEof,
                    ));
                }
                Some('\\') => {
                    self.bump();
                    self.bump();
                }
                Some('\n') if !triple => {
                    return Err(SyntaxError::new(
                        format!("unterminated string literal (detected at line {})", self.line),
                        start.line,
                        start.column,
                        ErrorCategory::UnexpectedEof,
                    ));
                }
                Some(c) if c == quote => {
                    if !triple {
                        self.bump();
                        return Ok(());
                    }
                    if self.peek(1) == Some(quote) && self.peek(2) == Some(quote) {
                        self.bump();
                        self.bump();
                        self.bump();
                        return Ok(());
                    }
                    self.bump();
                }
                Some(_) => self.bump(),
            }
        }
    }

    fn close(&mut self, closer: char) -> Result<(), SyntaxError> {
        let at = self.here();
        let Some(open) = self.stack.pop() else {
            return Err(SyntaxError::new(
                format!("unmatched '{closer}'"),
                at.line,
                at.column,
                ErrorCategory::InvalidSyntax,
            ));
        };
        if matching_opener(closer) == open.ch {
            return Ok(());
        }
        let mut message = format!(
            "closing parenthesis '{closer}' does not match opening parenthesis '{}'",
            open.ch
        );
        if open.at.line != at.line {
            message.push_str(&format!(" on line {}", open.at.line));
        }
        Err(SyntaxError::new(
            message,
            at.line,
            at.column,
            ErrorCategory::InvalidSyntax,
        ))
    }
}

fn matching_opener(closer: char) -> char {
    match closer {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn measure_indent(line: &[char]) -> (Indent, usize) {
    let mut width = 0;
    let mut alt_width = 0;
    let mut count = 0;
    for &c in line {
        match c {
            ' ' => {
                width += 1;
                alt_width += 1;
            }
            '\t' => {
                width = (width / TAB_SIZE + 1) * TAB_SIZE;
                alt_width += 1;
            }
            '\x0c' => {
                width = 0;
                alt_width = 0;
            }
            _ => break,
        }
        count += 1;
    }
    (Indent { width, alt_width }, count)
}

fn check_indentation(lines: &[LogicalLine]) -> Result<(), SyntaxError> {
    let mut stack = vec![ROOT_INDENT];
    let mut block_opener: Option<&LogicalLine> = None;

    for line in lines {
        let top = stack.last().copied().unwrap_or(ROOT_INDENT);
        let column = line.indent_chars + 1;

        if block_opener.take().is_some() {
            if line.indent.width <= top.width {
                return Err(indent_error("expected an indented block", line.line, column));
            }
            if line.indent.alt_width <= top.alt_width {
                return Err(tab_error(line.line, column));
            }
            stack.push(line.indent);
        } else if line.indent.width > top.width {
            return Err(indent_error("unexpected indent", line.line, column));
        } else if line.indent.width == top.width {
            if line.indent.alt_width != top.alt_width {
                return Err(tab_error(line.line, column));
            }
        } else {
            while stack.len() > 1 && stack.last().is_some_and(|i| i.width > line.indent.width) {
                stack.pop();
            }
            let restored = stack.last().copied().unwrap_or(top);
            if restored.width != line.indent.width {
                return Err(indent_error(
                    "unindent does not match any outer indentation level",
                    line.line,
                    column,
                ));
            }
            if restored.alt_width != line.indent.alt_width {
                return Err(tab_error(line.line, column));
            }
        }

        if line.last == ':' {
            block_opener = Some(line);
        }
    }

    if let Some(opener) = block_opener {
        return Err(indent_error(
            "expected an indented block",
            opener.end.line,
            opener.end.column,
        ));
    }
    Ok(())
}

fn indent_error(message: &str, line: usize, column: usize) -> SyntaxError {
    SyntaxError::new(message, line, column, ErrorCategory::Indentation)
}

fn tab_error(line: usize, column: usize) -> SyntaxError {
    SyntaxError::new(
        "inconsistent use of tabs and spaces in indentation",
        line,
        column,
        ErrorCategory::Indentation,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn error(source: &str) -> SyntaxError {
        check(source).expect_err("expected a lexical error")
    }

    #[test]
    fn test_valid_code_passes() {
        let source = indoc! {r#"
            import os

            class A:
                def f(self, x):  # comment with ( and "
                    if x:
                        return {"a": [1, 2, (3)]}
                    s = '''multi
            line ) ] }'''
                    return s + "\"quoted\"" + r'\d'

            total = 1 + \
                2
        "#};
        assert_eq!(check(source), Ok(()));
    }

    #[test]
    fn test_empty_source_passes() {
        assert_eq!(check(""), Ok(()));
        assert_eq!(check("\n\n   \n# only a comment\n"), Ok(()));
    }

    #[test]
    fn test_unclosed_paren_reports_opening_line() {
        let err = error("x = 1\ny = (2,\n     3\n");
        assert_eq!(err.message, "'(' was never closed");
        assert_eq!((err.line, err.column), (2, 5));
        assert_eq!(err.category, ErrorCategory::UnexpectedEof);
    }

    #[test]
    fn test_unmatched_closer() {
        let err = error("a = 1\nb = 2)\n");
        assert_eq!(err.message, "unmatched ')'");
        assert_eq!((err.line, err.column), (2, 6));
    }

    #[test]
    fn test_mismatched_closer_on_other_line() {
        let err = error("items = (1,\n    2]\n");
        assert_eq!(
            err.message,
            "closing parenthesis ']' does not match opening parenthesis '(' on line 1"
        );
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_unterminated_strings() {
        let err = error("x = 'abc\ny = 2\n");
        assert_eq!(err.message, "unterminated string literal (detected at line 1)");
        assert_eq!((err.line, err.column), (1, 5));

        let err = error("doc = \"\"\"never\nends\n");
        assert!(err
            .message
            .starts_with("unterminated triple-quoted string literal"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_character_after_continuation() {
        let err = error("x = 1 + \\ 2\n");
        assert_eq!(
            err.message,
            "unexpected character after line continuation character"
        );
        assert_eq!(err.category, ErrorCategory::InvalidSyntax);
    }

    #[test]
    fn test_unexpected_indent() {
        let err = error("x = 1\n    y = 2\n");
        assert_eq!(err.message, "unexpected indent");
        assert_eq!((err.line, err.column), (2, 5));
        assert_eq!(err.category, ErrorCategory::Indentation);
    }

    #[test]
    fn test_expected_indented_block() {
        let err = error("def f():\nreturn 1\n");
        assert_eq!(err.message, "expected an indented block");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_block_opener_at_end_of_input() {
        let err = error("if True:\n");
        assert_eq!(err.message, "expected an indented block");
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_bad_dedent() {
        let err = error("if x:\n        a = 1\n    b = 2\n");
        assert_eq!(
            err.message,
            "unindent does not match any outer indentation level"
        );
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_mixed_tabs_and_spaces() {
        let err = error("if x:\n\ta = 1\n        b = 2\n");
        assert_eq!(
            err.message,
            "inconsistent use of tabs and spaces in indentation"
        );
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_brackets_span_lines_without_indent_checks() {
        let source = "data = [\n        1,\n  2,\n]\nprint(data)\n";
        assert_eq!(check(source), Ok(()));
    }

    #[test]
    fn test_one_line_compound_statement() {
        assert_eq!(check("if x: pass\ny = 1\n"), Ok(()));
    }
}
