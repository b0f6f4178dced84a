//! Rule-based remediation hints.
//!
//! Errors are classified into an [`ErrorCategory`] from their structured
//! form (syntax error category, exception type name); each category maps to
//! one canned tip. No inference happens here.

use crate::core::{ErrorCategory, RuntimeFault, SyntaxError};

pub const DEFAULT_SUGGESTION: &str = "Consider reviewing the code for common syntax issues.";

/// The canned tip for a category.
pub fn suggestion(category: ErrorCategory) -> &'static str {
    match category {
        ErrorCategory::UnexpectedEof => {
            "Check if all your parentheses, brackets, and quotes are properly closed."
        }
        ErrorCategory::InvalidSyntax => {
            "Look for any incorrect syntax, such as missing colons, unmatched parentheses, or improper indentation."
        }
        ErrorCategory::Indentation => "Check that the indentation is consistent (tabs vs spaces).",
        ErrorCategory::UndefinedName => "Ensure all variables are defined before use.",
        ErrorCategory::DivisionByZero => {
            "Consider using a try-except block to handle division by zero."
        }
        ErrorCategory::TypeMismatch => {
            "Check that operands and arguments have the types the operation expects."
        }
        ErrorCategory::MissingKey => {
            "Check that the key or index exists before accessing it, or use .get() with a default."
        }
        ErrorCategory::MissingModule => {
            "Make sure the module is installed and the import path is spelled correctly."
        }
        ErrorCategory::Timeout => {
            "Look for infinite loops or long-running work at module level."
        }
        ErrorCategory::Unknown => DEFAULT_SUGGESTION,
    }
}

impl ErrorCategory {
    /// Exact lookup by the classic error keys.
    pub fn from_key(key: &str) -> Self {
        match key {
            "unexpected EOF while parsing" => Self::UnexpectedEof,
            "invalid syntax" => Self::InvalidSyntax,
            "NameError" => Self::UndefinedName,
            "IndentationError" => Self::Indentation,
            "ZeroDivisionError" => Self::DivisionByZero,
            _ => Self::Unknown,
        }
    }

    /// Classify a Python exception type name, including common subclasses.
    pub fn from_exception(kind: &str) -> Self {
        match kind {
            "ZeroDivisionError" => Self::DivisionByZero,
            "NameError" | "UnboundLocalError" => Self::UndefinedName,
            "IndentationError" | "TabError" => Self::Indentation,
            "SyntaxError" => Self::InvalidSyntax,
            "TypeError" => Self::TypeMismatch,
            "KeyError" | "IndexError" | "LookupError" => Self::MissingKey,
            "ImportError" | "ModuleNotFoundError" => Self::MissingModule,
            "TimeoutError" => Self::Timeout,
            _ => Self::Unknown,
        }
    }
}

/// Tip for one of the classic error keys; unknown keys get the default.
pub fn suggestion_for_key(key: &str) -> &'static str {
    suggestion(ErrorCategory::from_key(key))
}

pub fn for_syntax_error(error: &SyntaxError) -> &'static str {
    suggestion(error.category)
}

pub fn for_runtime_fault(fault: &RuntimeFault) -> &'static str {
    let category = match fault {
        RuntimeFault::DivisionByZero { .. } => ErrorCategory::DivisionByZero,
        RuntimeFault::TimedOut { .. } => ErrorCategory::Timeout,
        RuntimeFault::Generic { kind, .. } => ErrorCategory::from_exception(kind),
    };
    suggestion(category)
}
