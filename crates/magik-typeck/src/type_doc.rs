//! Type documentation in `##` comments.
//!
//! ```text
//! _method rope.add(element, _optional index)
//!     ## Add ELEMENT at INDEX.
//!     ## @param {sw:integer} index
//!     ## @return {_self}
//! ```
//!
//! Recognized tags: `@param {T} name`, `@return {T}` (one per result
//! position), `@loop {T}` (one per loop value), `@slot {T} name` and
//! `@generic name`. Types use the syntax of [`TypeString::parse`]; a type
//! that does not parse is logged and read as `_undefined`.

use magik_parser::{SyntaxKind, SyntaxNode, SyntaxToken};
use rowan::Direction;
use tracing::debug;

use crate::result_string::ExpressionResultString;
use crate::type_string::TypeString;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeDoc {
    /// Untagged lines, joined with newlines.
    pub description: String,
    pub params: Vec<(String, TypeString)>,
    pub returns: Vec<TypeString>,
    pub loops: Vec<TypeString>,
    pub slots: Vec<(String, TypeString)>,
    pub generics: Vec<String>,
}

impl TypeDoc {
    /// Parse `##` comment lines. Lines may still carry the `##` prefix.
    pub fn parse<'a>(lines: impl IntoIterator<Item = &'a str>, package: &str) -> TypeDoc {
        let mut doc = TypeDoc::default();
        let mut description: Vec<&str> = Vec::new();
        for line in lines {
            let line = line.trim_start().trim_start_matches('#').trim();
            let Some(tagged) = line.strip_prefix('@') else {
                description.push(line);
                continue;
            };
            let (tag, rest) = tagged.split_once(char::is_whitespace).unwrap_or((tagged, ""));
            let rest = rest.trim();
            match tag {
                "param" => {
                    if let Some((ts, name)) = typed_name(rest, package) {
                        doc.params.push((name, ts));
                    }
                }
                "slot" => {
                    if let Some((ts, name)) = typed_name(rest, package) {
                        doc.slots.push((name, ts));
                    }
                }
                "return" => doc.returns.push(braced_type(rest, package).map_or(TypeString::Undefined, |(ts, _)| ts)),
                "loop" => doc.loops.push(braced_type(rest, package).map_or(TypeString::Undefined, |(ts, _)| ts)),
                "generic" => {
                    if let Some(name) = rest.split_whitespace().next() {
                        doc.generics.push(name.to_string());
                    }
                }
                _ => description.push(line),
            }
        }
        while description.last().is_some_and(|l| l.is_empty()) {
            description.pop();
        }
        doc.description = description.join("\n");
        doc
    }

    /// Doc of a method or procedure: the `##` lines inside `node` that do
    /// not belong to a nested method or procedure.
    pub fn for_definition(node: &SyntaxNode, package: &str) -> TypeDoc {
        let lines: Vec<SyntaxToken> = node
            .descendants_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::DOC_COMMENT && owner_of(t).as_ref() == Some(node))
            .collect();
        TypeDoc::parse(lines.iter().map(|t| t.text()), package)
    }

    /// Doc of a top-level statement: `##` lines directly above it, then
    /// any inside it.
    pub fn for_statement(node: &SyntaxNode, package: &str) -> TypeDoc {
        let mut above: Vec<SyntaxToken> = node
            .siblings_with_tokens(Direction::Prev)
            .skip(1)
            .map_while(|it| it.into_token().filter(|t| t.kind().is_trivia()))
            .filter(|t| t.kind() == SyntaxKind::DOC_COMMENT)
            .collect();
        above.reverse();
        let inside = node
            .descendants_with_tokens()
            .filter_map(|it| it.into_token())
            .filter(|t| t.kind() == SyntaxKind::DOC_COMMENT);
        let lines: Vec<SyntaxToken> = above.into_iter().chain(inside).collect();
        TypeDoc::parse(lines.iter().map(|t| t.text()), package)
    }

    pub fn is_empty(&self) -> bool {
        *self == TypeDoc::default()
    }

    pub fn param(&self, name: &str) -> Option<&TypeString> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, ts)| ts)
    }

    pub fn slot(&self, name: &str) -> Option<&TypeString> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, ts)| ts)
    }

    /// The documented results; `None` without `@return` lines.
    pub fn return_types(&self) -> Option<ExpressionResultString> {
        (!self.returns.is_empty()).then(|| ExpressionResultString::new(self.returns.clone()))
    }

    /// The documented loop values; `None` without `@loop` lines.
    pub fn loop_types(&self) -> Option<ExpressionResultString> {
        (!self.loops.is_empty()).then(|| ExpressionResultString::new(self.loops.clone()))
    }

    /// `None` when the description is empty.
    pub fn description(&self) -> Option<String> {
        (!self.description.is_empty()).then(|| self.description.clone())
    }
}

/// The nearest method or procedure containing `token`.
fn owner_of(token: &SyntaxToken) -> Option<SyntaxNode> {
    token
        .parent_ancestors()
        .find(|n| matches!(n.kind(), SyntaxKind::METHOD_DEFINITION | SyntaxKind::PROC_EXPR))
}

/// `{T} rest`: the parsed type and the text after the closing brace.
fn braced_type<'a>(text: &'a str, package: &str) -> Option<(TypeString, &'a str)> {
    let inner = text.strip_prefix('{')?;
    let close = inner.find('}')?;
    let source = inner[..close].trim();
    let ts = match TypeString::parse(source, package) {
        Ok(ts) => ts,
        Err(err) => {
            debug!(%err, "unreadable type in doc comment");
            TypeString::Undefined
        }
    };
    Some((ts, inner[close + 1..].trim()))
}

fn typed_name(text: &str, package: &str) -> Option<(TypeString, String)> {
    let (ts, rest) = braced_type(text, package)?;
    let name = rest.split_whitespace().next()?;
    Some((ts, name.to_string()))
}
