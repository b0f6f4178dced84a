//! `radon cc --json` adapter.

use super::ComplexityEngine;
use crate::config::ComplexityConfig;
use crate::core::{ComplexityRecord, ConstructKind};
use crate::errors::ToolError;
use crate::sandbox::{resolve_program, Invocation, ProcessSandbox};
use crate::tools::{failure_message, tool_name};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

pub struct RadonEngine {
    sandbox: Arc<ProcessSandbox>,
    config: ComplexityConfig,
}

impl RadonEngine {
    pub fn new(sandbox: Arc<ProcessSandbox>, config: ComplexityConfig) -> Self {
        Self { sandbox, config }
    }
}

impl ComplexityEngine for RadonEngine {
    fn name(&self) -> &str {
        "radon"
    }

    fn analyze(&self, path: &Path) -> Result<Vec<ComplexityRecord>, ToolError> {
        let tool = tool_name(&self.config.program);
        let program = resolve_program(&tool, &self.config.program)?;
        let invocation = Invocation::new(&tool, program, self.config.timeout())
            .args(["cc", "--json"])
            .arg(path);

        let report = self.sandbox.run(&invocation)?;
        if !report.success() {
            return Err(ToolError::failed(
                tool,
                report.status,
                failure_message(&report.stderr, &report.stdout),
            ));
        }
        parse_report(&tool, &report.stdout)
    }
}

/// One entry of radon's JSON output.
#[derive(Debug, Deserialize)]
struct Block {
    #[serde(rename = "type")]
    kind: String,
    name: String,
    lineno: usize,
    #[serde(default)]
    endline: Option<usize>,
    complexity: u32,
    #[serde(default)]
    classname: Option<String>,
    #[serde(default)]
    closures: Vec<Block>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileResult {
    Blocks(Vec<Block>),
    Error { error: String },
}

/// Parse radon's `{path: [blocks] | {"error": ...}}` document.
pub fn parse_report(tool: &str, json: &str) -> Result<Vec<ComplexityRecord>, ToolError> {
    let files: BTreeMap<String, FileResult> = serde_json::from_str(json)
        .map_err(|e| ToolError::invalid_output(tool, e.to_string()))?;

    let mut records = Vec::new();
    for result in files.into_values() {
        match result {
            FileResult::Blocks(blocks) => {
                for block in blocks {
                    flatten(block, None, &mut records);
                }
            }
            FileResult::Error { error } => {
                return Err(ToolError::failed(tool, None, error));
            }
        }
    }
    Ok(records)
}

fn flatten(block: Block, parent: Option<&str>, out: &mut Vec<ComplexityRecord>) {
    let (name, kind) = match (parent, block.kind.as_str(), &block.classname) {
        (Some(parent), _, _) => (format!("{parent}.{}", block.name), ConstructKind::Closure),
        (None, "class", _) => (block.name.clone(), ConstructKind::Class),
        (None, "method", Some(class)) => (format!("{class}.{}", block.name), ConstructKind::Method),
        (None, "method", None) => (block.name.clone(), ConstructKind::Method),
        (None, _, _) => (block.name.clone(), ConstructKind::Function),
    };

    out.push(ComplexityRecord {
        name: name.clone(),
        kind,
        line: block.lineno,
        end_line: block.endline.unwrap_or(block.lineno),
        score: block.complexity.max(1),
    });
    for closure in block.closures {
        flatten(closure, Some(&name), out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_functions_methods_and_closures() {
        let json = indoc! {r#"
            {"/tmp/pyreview_x/snippet.py": [
              {"type": "function", "rank": "A", "lineno": 1, "endline": 5, "name": "outer",
               "col_offset": 0, "complexity": 2, "closures": [
                 {"type": "function", "rank": "A", "lineno": 2, "endline": 3, "name": "inner",
                  "col_offset": 4, "complexity": 1, "closures": []}
               ]},
              {"type": "class", "rank": "A", "lineno": 7, "endline": 9, "name": "Shape",
               "col_offset": 0, "complexity": 2, "real_complexity": 2,
               "methods": [{"type": "method", "rank": "A", "lineno": 8, "endline": 9,
                            "name": "area", "classname": "Shape", "col_offset": 4,
                            "complexity": 1, "closures": []}]},
              {"type": "method", "rank": "A", "lineno": 8, "endline": 9, "name": "area",
               "classname": "Shape", "col_offset": 4, "complexity": 1, "closures": []}
            ]}
        "#};

        let records = parse_report("radon", json).unwrap();
        let summary: Vec<(String, ConstructKind, u32)> = records
            .into_iter()
            .map(|r| (r.name, r.kind, r.score))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("outer".to_string(), ConstructKind::Function, 2),
                ("outer.inner".to_string(), ConstructKind::Closure, 1),
                ("Shape".to_string(), ConstructKind::Class, 2),
                ("Shape.area".to_string(), ConstructKind::Method, 1),
            ]
        );
    }

    #[test]
    fn test_parse_error_entry() {
        let json = r#"{"snippet.py": {"error": "invalid syntax (<unknown>, line 1)"}}"#;
        let err = parse_report("radon", json).unwrap_err();
        assert_eq!(
            err,
            ToolError::failed("radon", None, "invalid syntax (<unknown>, line 1)")
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_report("radon", "Traceback (most recent call last)"),
            Err(ToolError::InvalidOutput { .. })
        ));
    }

    #[test]
    fn test_empty_file_has_no_records() {
        assert_eq!(parse_report("radon", r#"{"snippet.py": []}"#).unwrap(), vec![]);
    }
}
