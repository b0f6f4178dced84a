//! Tree-sitter parser integration for Python
//!
//! Provides parsing with the tree-sitter-python grammar plus small node helpers.

use anyhow::{Context, Result};
use tree_sitter::{Node, Parser, Tree};

/// Parsed Python source and the text it was parsed from.
pub struct PythonAst {
    pub tree: Tree,
    pub source: String,
}

impl PythonAst {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn has_errors(&self) -> bool {
        has_parse_errors(&self.tree)
    }
}

/// Parse Python source code into a tree-sitter AST
pub fn parse_source(content: &str) -> Result<PythonAst> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .context("Failed to set tree-sitter language")?;

    let tree = parser
        .parse(content, None)
        .context("Failed to parse source code")?;

    Ok(PythonAst {
        tree,
        source: content.to_string(),
    })
}

/// Check if a parse tree has errors
pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or("")
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Get the last line spanned by a node (1-indexed)
pub fn node_end_line(node: &Node) -> usize {
    node.end_position().row + 1
}

/// Get the column for a node (1-indexed, in characters rather than bytes)
pub fn node_column(node: &Node, source: &str) -> usize {
    byte_position(source, node.start_byte()).1
}

/// 1-indexed line and character column of a byte offset.
pub fn byte_position(source: &str, byte: usize) -> (usize, usize) {
    let byte = byte.min(source.len());
    let prefix = source.get(..byte).unwrap_or(source);
    let line_start = prefix.rfind('\n').map(|idx| idx + 1).unwrap_or(0);
    let line = prefix.matches('\n').count() + 1;
    (line, prefix[line_start..].chars().count() + 1)
}
