//! In-process cyclomatic complexity with tree-sitter-python.
//!
//! Counting follows radon so that switching engines does not change scores:
//!
//! - every function starts at 1
//! - `if`, `elif`, conditional expressions, `with`, `assert`: +1
//! - `for`/`while`: +1, plus 1 when the loop has an `else`
//! - `try`: +1 per `except`, plus 1 for `else`
//! - boolean operators: +1 per operator
//! - comprehensions: +1 per `for` and per `if` clause
//! - `match`: +1 per `case`, a trailing `case _:` is free
//!
//! Nested function bodies are scored on their own and listed as closures.
//! A class scores `1 + body decisions + sum(method scores)` averaged over its
//! methods, plus one when it has more than one method.

use super::ComplexityEngine;
use crate::core::ast::{node_end_line, node_line, node_text, parse_source};
use crate::core::{ComplexityRecord, ConstructKind};
use crate::errors::ToolError;
use std::fs;
use std::path::Path;
use tree_sitter::Node;

pub struct BuiltinEngine;

impl ComplexityEngine for BuiltinEngine {
    fn name(&self) -> &str {
        "builtin"
    }

    fn analyze(&self, path: &Path) -> Result<Vec<ComplexityRecord>, ToolError> {
        let source = fs::read_to_string(path)
            .map_err(|e| ToolError::io(format!("reading {}", path.display()), &e))?;
        analyze_source(&source)
    }
}

/// Score every function, method, closure and class in `source`.
pub fn analyze_source(source: &str) -> Result<Vec<ComplexityRecord>, ToolError> {
    let ast = parse_source(source).map_err(|e| ToolError::invalid_output("builtin", e.to_string()))?;
    if ast.has_errors() {
        return Err(ToolError::Syntax {
            message: "invalid syntax".to_string(),
        });
    }

    let mut records = Vec::new();
    for definition in definitions(ast.root()) {
        match definition.kind() {
            "class_definition" => {
                score_class(definition, source, None, &mut records);
            }
            _ => {
                score_function(definition, source, None, ConstructKind::Function, &mut records);
            }
        }
    }
    Ok(records)
}

/// Function and class definitions directly reachable from `node` without
/// crossing another definition.
fn definitions(node: Node) -> Vec<Node> {
    let mut found = Vec::new();
    collect_definitions(node, &mut found);
    found
}

fn collect_definitions<'t>(node: Node<'t>, found: &mut Vec<Node<'t>>) {
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "function_definition" | "class_definition" => found.push(child),
            "decorated_definition" => {
                if let Some(definition) = child.child_by_field_name("definition") {
                    found.push(definition);
                }
            }
            _ => collect_definitions(child, found),
        }
    }
}

fn qualified(prefix: Option<&str>, node: Node, source: &str) -> String {
    let name = node
        .child_by_field_name("name")
        .map(|n| node_text(&n, source))
        .unwrap_or("<anonymous>");
    match prefix {
        Some(prefix) => format!("{prefix}.{name}"),
        None => name.to_string(),
    }
}

fn record(name: String, kind: ConstructKind, node: Node, score: u32) -> ComplexityRecord {
    ComplexityRecord {
        name,
        kind,
        line: node_line(&node),
        end_line: node_end_line(&node),
        score,
    }
}

fn score_function(
    node: Node,
    source: &str,
    prefix: Option<&str>,
    kind: ConstructKind,
    out: &mut Vec<ComplexityRecord>,
) -> u32 {
    let name = qualified(prefix, node, source);
    let body = node.child_by_field_name("body");
    let score = 1 + body.map(decisions).unwrap_or(0);
    out.push(record(name.clone(), kind, node, score));

    if let Some(body) = body {
        // Classes defined inside functions are not reported.
        for nested in definitions(body) {
            if nested.kind() == "function_definition" {
                score_function(nested, source, Some(&name), ConstructKind::Closure, out);
            }
        }
    }
    score
}

fn score_class(node: Node, source: &str, prefix: Option<&str>, out: &mut Vec<ComplexityRecord>) {
    let name = qualified(prefix, node, source);
    let Some(body) = node.child_by_field_name("body") else {
        out.push(record(name, ConstructKind::Class, node, 1));
        return;
    };

    let mut real = 1 + decisions(body);
    let mut methods = 0;
    for nested in definitions(body) {
        if nested.kind() == "class_definition" {
            score_class(nested, source, Some(&name), out);
        } else {
            real += score_function(nested, source, Some(&name), ConstructKind::Method, out);
            methods += 1;
        }
    }

    let score = match methods {
        0 => real,
        n => real / n + u32::from(n > 1),
    };
    out.push(record(name, ConstructKind::Class, node, score.max(1)));
}

/// Decision points in `node`, not descending into nested definitions.
fn decisions(node: Node) -> u32 {
    let own = match node.kind() {
        "if_statement"
        | "elif_clause"
        | "conditional_expression"
        | "with_statement"
        | "assert_statement"
        | "except_clause"
        | "except_group_clause"
        | "for_in_clause"
        | "boolean_operator" => 1,
        // a case guard is not a comprehension filter
        "if_clause" => u32::from(node.parent().map(|p| p.kind()) != Some("case_clause")),
        "for_statement" | "while_statement" => 1 + u32::from(has_child(node, "else_clause")),
        "try_statement" => u32::from(has_child(node, "else_clause")),
        "match_statement" => match_cases(node),
        _ => 0,
    };

    let mut total = own;
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "function_definition" | "class_definition" | "decorated_definition" => {}
            _ => total += decisions(child),
        }
    }
    total
}

fn has_child(node: Node, kind: &str) -> bool {
    let found = node.children(&mut node.walk()).any(|c| c.kind() == kind);
    found
}

fn match_cases(node: Node) -> u32 {
    let mut cases = Vec::new();
    for child in node.children(&mut node.walk()) {
        match child.kind() {
            "case_clause" => cases.push(child),
            "block" => cases.extend(
                child
                    .children(&mut child.walk())
                    .filter(|c| c.kind() == "case_clause"),
            ),
            _ => {}
        }
    }

    let wildcard_last = cases.last().is_some_and(is_wildcard_case);
    cases.len() as u32 - u32::from(wildcard_last)
}

fn is_wildcard_case(clause: &Node) -> bool {
    if clause.child_by_field_name("guard").is_some() {
        return false;
    }
    let patterns: Vec<Node> = clause
        .children(&mut clause.walk())
        .filter(|c| c.kind() == "case_pattern")
        .collect();
    // `case _:` has a single pattern with no named children
    patterns.len() == 1 && patterns[0].named_child_count() == 0
}
