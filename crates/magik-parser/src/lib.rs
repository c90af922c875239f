//! Magik parser: event-based parser producing a rowan-based CST.
//!
//! This crate transforms the token stream from `magik-lexer` into a lossless
//! concrete syntax tree (CST) using the `rowan` library. The CST preserves
//! all tokens including whitespace and comments, so node ranges are byte
//! offsets into the original source and `##` type-doc comments stay
//! reachable for the definition reader.
//!
//! Parsing never fails: malformed input produces `ERROR_NODE`s and a list of
//! [`ParseError`]s next to a best-effort tree.

pub mod ast;
pub mod cst;
pub mod error;
mod parser;
pub mod syntax_kind;

pub use cst::{SyntaxElement, SyntaxNode, SyntaxToken};
pub use error::{ParseError, Unclosed};
pub use syntax_kind::SyntaxKind;

/// Result of parsing a Magik source file.
///
/// Contains the green tree (the immutable, cheap-to-clone CST) and every
/// parse error encountered.
#[derive(Debug, Clone)]
pub struct Parse {
    green: rowan::GreenNode,
    errors: Vec<ParseError>,
}

impl Parse {
    /// Build the syntax tree root from the green node.
    pub fn syntax(&self) -> SyntaxNode {
        SyntaxNode::new_root(self.green.clone())
    }

    /// The root as a typed [`ast::SourceFile`].
    pub fn tree(&self) -> ast::item::SourceFile {
        ast::item::SourceFile {
            syntax: self.syntax(),
        }
    }

    /// Parse errors encountered during parsing.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Whether parsing completed without errors.
    pub fn ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse a Magik source file into a CST.
///
/// This is the main entry point for the parser. It lexes the source,
/// parses the token stream, and returns a [`Parse`] result containing
/// the syntax tree and any errors.
pub fn parse(source: &str) -> Parse {
    let tokens = magik_lexer::Lexer::tokenize(source);
    let mut p = parser::Parser::new(tokens, source);
    parser::parse_source_file(&mut p);
    let (green, errors) = p.build_tree();
    Parse { green, errors }
}

/// Render a tree for snapshots: one node or token per line, indented two
/// spaces per level, trivia omitted.
///
/// ```text
/// SOURCE_FILE@0..9
///   LITERAL@0..2
///     INT_NUMBER@0..2 "42"
/// ```
pub fn debug_tree(node: &SyntaxNode) -> String {
    let mut out = String::new();
    render(node, 0, &mut out);
    out
}

fn render(node: &SyntaxNode, depth: usize, out: &mut String) {
    let range = node.text_range();
    out.push_str(&format!(
        "{:indent$}{:?}@{}..{}\n",
        "",
        node.kind(),
        u32::from(range.start()),
        u32::from(range.end()),
        indent = depth * 2
    ));
    for child in node.children_with_tokens() {
        match child {
            rowan::NodeOrToken::Node(n) => render(&n, depth + 1, out),
            rowan::NodeOrToken::Token(t) => {
                if t.kind().is_trivia() || t.kind() == SyntaxKind::EOF {
                    continue;
                }
                let range = t.text_range();
                out.push_str(&format!(
                    "{:indent$}{:?}@{}..{} {:?}\n",
                    "",
                    t.kind(),
                    u32::from(range.start()),
                    u32::from(range.end()),
                    t.text(),
                    indent = (depth + 1) * 2
                ));
            }
        }
    }
}
