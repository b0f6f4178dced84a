//! Grammar-level validation with tree-sitter-python.
//!
//! tree-sitter recovers from errors where CPython stops, and it still accepts
//! a few Python 2 forms. The first problem in document order is reported,
//! anchored on the token CPython would point at.

use crate::core::ast::{byte_position, node_text, parse_source, PythonAst};
use crate::core::{ErrorCategory, SyntaxError};
use tree_sitter::Node;

/// Reserved words that tree-sitter falls back to reading as identifiers.
const KEYWORDS: &[&str] = &[
    "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del", "elif",
    "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda",
    "nonlocal", "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// Tokens that may open an expression right after an operator.
const PREFIX_TOKENS: &[&str] = &["-", "+", "~", "(", "[", "{"];

/// Tokens after which a starred expression may follow.
const SEPARATORS: &[&str] = &["=", ",", "(", "[", "{", ":", "->"];

const GENERATOR_MESSAGE: &str = "Generator expression must be parenthesized";

#[derive(Debug)]
enum Problem<'t> {
    /// `print x` or `exec code`
    Legacy { node: Node<'t>, keyword: &'static str },
    /// A generator sharing a call's parentheses with other arguments
    BareGenerator(Node<'t>),
    /// `[x for x in a, b]`
    LooseComma(Node<'t>),
    Missing(Node<'t>),
    Error(Node<'t>),
}

/// Parse `source` and report the first grammar error in document order.
pub fn check(source: &str) -> Result<(), SyntaxError> {
    let ast = parse_source(source).map_err(|e| {
        SyntaxError::new(e.to_string(), 1, 1, ErrorCategory::InvalidSyntax)
    })?;

    match first_problem(&ast) {
        Some(problem) => Err(describe(problem, &ast)),
        None => Ok(()),
    }
}

fn first_problem(ast: &PythonAst) -> Option<Problem<'_>> {
    let mut cursor = ast.root().walk();
    loop {
        if let Some(problem) = classify(cursor.node(), &ast.source) {
            return Some(problem);
        }
        if cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return None;
            }
        }
    }
}

fn classify<'t>(node: Node<'t>, source: &str) -> Option<Problem<'t>> {
    if node.is_missing() {
        return Some(Problem::Missing(node));
    }
    if node.is_error() {
        let in_arguments = node.parent().is_some_and(|p| p.kind() == "argument_list");
        if in_arguments && tokens(node).iter().any(|t| node_text(t, source) == "for") {
            return Some(Problem::BareGenerator(node));
        }
        return Some(Problem::Error(node));
    }

    match node.kind() {
        // `print >> f` and `print >> f, x` are shifts in Python 3
        "print_statement" if !has_child(node, "chevron") => Some(Problem::Legacy {
            node,
            keyword: "print",
        }),
        "exec_statement" => Some(Problem::Legacy {
            node,
            keyword: "exec",
        }),
        "generator_expression" if node.parent().is_some_and(|p| p.kind() == "call") => {
            let mut cursor = node.walk();
            let clauses: Vec<Node> = node.named_children(&mut cursor).collect();
            clauses
                .into_iter()
                .filter(|clause| matches!(clause.kind(), "for_in_clause" | "if_clause"))
                .any(|clause| loose_comma(clause).is_some())
                .then(|| Problem::BareGenerator(node.named_child(0).unwrap_or(node)))
        }
        "for_in_clause" => loose_comma(node).map(Problem::LooseComma),
        _ => None,
    }
}

fn has_child(node: Node, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

/// Comma after the iterable of a comprehension clause.
fn loose_comma(clause: Node<'_>) -> Option<Node<'_>> {
    let mut after_in = clause.kind() != "for_in_clause";
    let mut cursor = clause.walk();
    let children: Vec<Node> = clause.children(&mut cursor).collect();
    for child in children {
        match child.kind() {
            "in" if !child.is_named() => after_in = true,
            "," if after_in => return Some(child),
            _ if child.is_error() && after_in => {
                if let Some(comma) = tokens(child).into_iter().find(|t| t.kind() == ",") {
                    return Some(comma);
                }
            }
            _ => {}
        }
    }
    None
}

fn describe(problem: Problem<'_>, ast: &PythonAst) -> SyntaxError {
    let source = ast.source.as_str();
    let at = |byte: usize| byte_position(source, byte);

    let (message, (line, column)) = match problem {
        Problem::Legacy { node, keyword } => (
            format!("Missing parentheses in call to '{keyword}'. Did you mean {keyword}(...)?"),
            at(node.start_byte()),
        ),
        Problem::BareGenerator(node) => (GENERATOR_MESSAGE.to_string(), at(node.start_byte())),
        Problem::LooseComma(node) => ("invalid syntax".to_string(), at(node.start_byte())),
        Problem::Missing(node) => (
            format!("invalid syntax (expected '{}')", node.kind()),
            at(token_after(ast, node.start_byte())),
        ),
        Problem::Error(node) => ("invalid syntax".to_string(), at(error_offset(node, ast))),
    };
    SyntaxError::new(message, line, column, ErrorCategory::InvalidSyntax)
}

/// Byte offset of the token CPython would reject inside an ERROR node.
///
/// Inside an otherwise valid construct the ERROR holds exactly the skipped
/// tokens. At statement level it holds the prefix tree-sitter could not
/// finish, so the offender is the first token that cannot follow the one
/// before it, or whatever comes after the prefix.
fn error_offset(node: Node, ast: &PythonAst) -> usize {
    let source = ast.source.as_str();
    let tokens = tokens(node);
    let statement_level = node
        .parent()
        .map_or(true, |p| matches!(p.kind(), "module" | "block"));
    if !statement_level {
        return tokens.first().map_or(node.start_byte(), first_leaf_start);
    }

    let mut depth = 0usize;
    let mut prev: Option<Node> = None;
    for token in tokens {
        if let Some(prev) = prev {
            let wrapped = depth == 0 && token.start_position().row > prev.end_position().row;
            if wrapped {
                return prev.end_byte();
            }
        }
        if is_keyword_name(&token, source) {
            return token.start_byte();
        }
        if let Some(prev) = prev {
            if cannot_follow(&prev, &token, source) {
                return token.start_byte();
            }
        }
        match token.kind() {
            "(" | "[" | "{" => depth += 1,
            ")" | "]" | "}" => depth = depth.saturating_sub(1),
            _ => {}
        }
        prev = Some(token);
    }
    token_after(ast, node.end_byte())
}

/// Direct children of an ERROR node, with nested ERROR nodes flattened.
fn tokens(node: Node<'_>) -> Vec<Node<'_>> {
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| !child.is_extra())
        .flat_map(|child| {
            if child.is_error() {
                tokens(child)
            } else {
                vec![child]
            }
        })
        .collect()
}

fn first_leaf_start(node: &Node) -> usize {
    let mut current = *node;
    while let Some(child) = current.child(0) {
        current = child;
    }
    current.start_byte()
}

fn is_keyword_name(token: &Node, source: &str) -> bool {
    token.kind() == "identifier" && KEYWORDS.contains(&node_text(token, source))
}

fn is_operand(token: &Node) -> bool {
    token.is_named() || matches!(token.kind(), ")" | "]" | "}")
}

fn is_operator(token: &Node) -> bool {
    !token.is_named()
        && !token
            .kind()
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
}

fn cannot_follow(prev: &Node, token: &Node, source: &str) -> bool {
    if is_operand(prev) && token.is_named() {
        // Calls and subscripts continue the operand
        let text = node_text(token, source);
        return !(text.starts_with('(') || text.starts_with('['));
    }
    if is_operator(prev) && !is_operand(prev) && is_operator(token) {
        let kind = token.kind();
        if PREFIX_TOKENS.contains(&kind) {
            return false;
        }
        let starred = matches!(kind, "*" | "**");
        return !(starred && SEPARATORS.contains(&prev.kind()));
    }
    false
}

/// Start of the next token on the same line, or `byte` when the line ends.
fn token_after(ast: &PythonAst, byte: usize) -> usize {
    let source = ast.source.as_str();
    let mut cursor = ast.root().walk();
    loop {
        let node = cursor.node();
        let is_token = node.child_count() == 0
            && !node.is_missing()
            && !node.is_extra()
            && node.end_byte() > node.start_byte();
        if is_token && node.start_byte() >= byte {
            let same_line = source
                .get(byte..node.start_byte())
                .is_some_and(|gap| !gap.contains('\n'));
            return if same_line { node.start_byte() } else { byte };
        }
        if node.end_byte() > byte && cursor.goto_first_child() {
            continue;
        }
        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return byte;
            }
        }
    }
}
