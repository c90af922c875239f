//! Magik semantic model: type strings, definitions, and local type reasoning.
//!
//! This crate builds on the parser's CST to answer "what type does this
//! expression have?" without ever running Magik code:
//!
//! - Definitions (exemplars, methods, globals, ...) are read from parsed
//!   files and stored in a [`DefinitionKeeper`], which hands out immutable
//!   snapshots.
//! - A [`TypeResolver`] answers inheritance questions against a snapshot.
//! - Per file, a [`ScopeTree`] records variables and a reasoning walk assigns
//!   an [`ExpressionResultString`] to every expression.
//!
//! # Architecture
//!
//! - [`type_string`]: type reference algebra (`TypeString`)
//! - [`result_string`]: ordered multi-value results
//! - [`definitions`]: the definition model
//! - [`keeper`]: copy-on-write definition store
//! - [`builtins`]: intrinsic exemplars, methods and operators
//! - [`resolver`]: inheritance, method lookup, subtyping
//! - [`reader`]: definitions from a parsed file
//! - [`type_doc`]: `##` type documentation
//! - [`scope`]: scope tree and position index
//! - [`reasoner`]: local type reasoning

pub mod builtins;
pub mod definitions;
pub mod error;
pub mod keeper;
pub mod reader;
pub mod reasoner;
pub mod resolver;
pub mod result_string;
pub mod scope;
pub mod type_doc;
pub mod type_string;

use magik_parser::{Parse, SyntaxNode};
use rowan::{TextRange, TextSize};

pub use crate::definitions::Definition;
pub use crate::error::TypeStringError;
pub use crate::keeper::{DefinitionKeeper, KeeperSnapshot};
pub use crate::reasoner::{NodeKey, ReasonerResult};
pub use crate::resolver::TypeResolver;
pub use crate::result_string::ExpressionResultString;
pub use crate::scope::{ScopeId, ScopeTree};
pub use crate::type_string::TypeString;

/// Scopes and reasoning results of one file against one keeper snapshot.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub scopes: ScopeTree,
    pub reasoning: ReasonerResult,
    offsets: OffsetIndex,
}

/// Build the scope tree of `parse` and reason over it.
pub fn analyze(parse: &Parse, keeper: &KeeperSnapshot) -> FileAnalysis {
    let scopes = ScopeTree::build(&parse.tree());
    let reasoning = reasoner::reason(&parse.syntax(), &scopes, keeper);
    let offsets = OffsetIndex::build(reasoning.iter().map(|(key, _)| *key));
    FileAnalysis {
        scopes,
        reasoning,
        offsets,
    }
}

impl FileAnalysis {
    /// The result of `node`, if it was reasoned about.
    pub fn result_type_of(&self, node: &SyntaxNode) -> Option<&ExpressionResultString> {
        self.reasoning.result_of(node)
    }

    /// The result of the innermost reasoned-about node containing
    /// `offset`. Where two nodes touch at `offset` the one starting there
    /// wins; equal ranges prefer the lower node kind.
    pub fn type_at_offset(&self, offset: TextSize) -> Option<(TextRange, &ExpressionResultString)> {
        let key = self.offsets.innermost(offset)?;
        self.reasoning.get(&key).map(|result| (key.range, result))
    }

    pub fn scope_for_offset(&self, offset: TextSize) -> ScopeId {
        self.scopes.scope_for_offset(offset)
    }
}

/// Node ranges sorted by start, outermost first, each paired with the
/// position of the nearest range enclosing it.
#[derive(Debug, Clone, Default)]
struct OffsetIndex {
    nodes: Vec<(NodeKey, Option<usize>)>,
}

impl OffsetIndex {
    fn build(keys: impl Iterator<Item = NodeKey>) -> OffsetIndex {
        let mut keys: Vec<NodeKey> = keys.collect();
        keys.sort_by(|a, b| {
            a.range
                .start()
                .cmp(&b.range.start())
                .then(b.range.end().cmp(&a.range.end()))
                .then(b.kind.cmp(&a.kind))
        });
        let mut nodes: Vec<(NodeKey, Option<usize>)> = Vec::with_capacity(keys.len());
        let mut open: Vec<usize> = Vec::new();
        for key in keys {
            while let Some(&top) = open.last() {
                if nodes[top].0.range.contains_range(key.range) {
                    break;
                }
                open.pop();
            }
            let parent = open.last().copied();
            open.push(nodes.len());
            nodes.push((key, parent));
        }
        OffsetIndex { nodes }
    }

    /// Syntax ranges nest, so the innermost range containing `offset` is
    /// the last one starting at or before it, or one of its enclosers.
    fn innermost(&self, offset: TextSize) -> Option<NodeKey> {
        let upper = self.nodes.partition_point(|(key, _)| key.range.start() <= offset);
        let mut current = upper.checked_sub(1);
        while let Some(i) = current {
            let (key, parent) = self.nodes.get(i)?;
            if key.range.contains_inclusive(offset) {
                return Some(*key);
            }
            current = *parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use magik_parser::SyntaxKind;

    fn key(start: u32, end: u32, kind: SyntaxKind) -> NodeKey {
        NodeKey {
            range: TextRange::new(start.into(), end.into()),
            kind,
        }
    }

    #[test]
    fn innermost_walks_out_of_closed_siblings() {
        // a.b(c) + d, with `c` and `d` as name references
        let keys = [
            key(0, 10, SyntaxKind::BINARY_EXPR),
            key(0, 6, SyntaxKind::METHOD_INVOCATION),
            key(0, 1, SyntaxKind::NAME_REF),
            key(4, 5, SyntaxKind::NAME_REF),
            key(9, 10, SyntaxKind::NAME_REF),
        ];
        let index = OffsetIndex::build(keys.into_iter().rev());
        let at = |offset: u32| index.innermost(offset.into()).map(|k| (k.range, k.kind));
        assert_eq!(at(4), Some((keys[3].range, SyntaxKind::NAME_REF)));
        assert_eq!(at(2), Some((keys[1].range, SyntaxKind::METHOD_INVOCATION)));
        assert_eq!(at(7), Some((keys[0].range, SyntaxKind::BINARY_EXPR)));
        assert_eq!(at(9), Some((keys[4].range, SyntaxKind::NAME_REF)));
        assert_eq!(at(11), None);
    }

    #[test]
    fn equal_ranges_prefer_the_lower_kind() {
        let name = key(2, 4, SyntaxKind::NAME_REF);
        let paren = key(2, 4, SyntaxKind::PAREN_EXPR);
        let index = OffsetIndex::build([paren, key(0, 8, SyntaxKind::BLOCK_EXPR), name].into_iter());
        assert_eq!(
            index.innermost(3.into()).map(|k| k.kind),
            Some(name.kind.min(paren.kind))
        );
    }
}
