//! Typed views over the CST.
//!
//! Each wrapper is a `SyntaxNode` whose kind has been checked, with
//! accessors that find children by kind: [`item::MethodDefinition::exemplar_name`],
//! [`expr::MethodInvocation::signature`] and so on.
//!
//! Accessors return `Option` everywhere: a tree recovered from a syntax
//! error may lack any child, and consumers skip what is missing.

pub mod expr;
pub mod item;
pub mod stmt;

use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

pub trait AstNode: Sized {
    /// `None` unless `node` has this wrapper's kind.
    fn cast(node: SyntaxNode) -> Option<Self>;

    fn syntax(&self) -> &SyntaxNode;
}

/// `ast_node!(Wrapper, KIND)` declares `Wrapper` and its [`AstNode`] impl.
macro_rules! ast_node {
    ($name:ident, $kind:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name {
            pub(crate) syntax: SyntaxNode,
        }

        impl AstNode for $name {
            fn cast(node: SyntaxNode) -> Option<Self> {
                if node.kind() == SyntaxKind::$kind {
                    Some(Self { syntax: node })
                } else {
                    None
                }
            }

            fn syntax(&self) -> &SyntaxNode {
                &self.syntax
            }
        }
    };
}

pub(crate) use ast_node;

pub fn child_node<N: AstNode>(parent: &SyntaxNode) -> Option<N> {
    parent.children().find_map(N::cast)
}

pub fn child_nodes<'a, N: AstNode + 'a>(parent: &'a SyntaxNode) -> impl Iterator<Item = N> + 'a {
    parent.children().filter_map(N::cast)
}

pub fn child_token(parent: &SyntaxNode, kind: SyntaxKind) -> Option<SyntaxToken> {
    parent
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|it| it.kind() == kind)
}

/// All child tokens with the given kind.
pub fn child_tokens(parent: &SyntaxNode, kind: SyntaxKind) -> impl Iterator<Item = SyntaxToken> + '_ {
    parent
        .children_with_tokens()
        .filter_map(|it| it.into_token())
        .filter(move |it| it.kind() == kind)
}

// ── Name ───────────────────────────────────────────────────────────────

ast_node!(Name, NAME);

impl Name {
    pub fn ident(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    /// The identifier text.
    pub fn text(&self) -> Option<String> {
        self.ident().map(|t| t.text().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::stmt::VariableDecl;

    #[test]
    fn child_helpers_find_nodes_and_tokens() {
        let parse = crate::parse("_local a, b");
        let decl: VariableDecl = parse
            .syntax()
            .descendants()
            .find_map(VariableDecl::cast)
            .unwrap();
        assert!(child_token(decl.syntax(), SyntaxKind::LOCAL_KW).is_some());
        let names: Vec<String> = decl
            .syntax()
            .descendants()
            .filter_map(Name::cast)
            .filter_map(|n| n.text())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
