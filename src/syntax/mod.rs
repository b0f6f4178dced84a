//! Parse-only syntax checking for Python source.
//!
//! Two passes, both side-effect free:
//!
//! 1. [`lexical`] checks strings, delimiters, continuations and indentation
//!    and points at the offending token.
//! 2. [`grammar`] parses with tree-sitter-python and reports the first
//!    error or missing node.
//!
//! The code is never executed.

pub mod grammar;
pub mod lexical;

use crate::core::SyntaxError;

/// Check `source` and return the first syntax error, if any.
pub fn check_syntax(source: &str) -> Result<(), SyntaxError> {
    lexical::check(source)?;
    grammar::check(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ErrorCategory;

    #[test]
    fn test_division_example_is_valid() {
        assert_eq!(check_syntax("def f(x): return x/0\nf(1)\n"), Ok(()));
    }

    #[test]
    fn test_lexical_errors_win_over_grammar() {
        let err = check_syntax("print((1, 2)\n").unwrap_err();
        assert_eq!(err.message, "'(' was never closed");
        assert_eq!(err.category, ErrorCategory::UnexpectedEof);
    }

    #[test]
    fn test_deterministic() {
        let source = "class A:\n    def m(self) pass\n";
        assert_eq!(check_syntax(source), check_syntax(source));
    }
}
