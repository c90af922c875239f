//! Typed AST nodes for top-level items and bodies.
//!
//! Covers the source file root, `_package`, method definitions, parameter
//! lists, statement bodies and `_proc` expressions.

use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode, Name};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

// ── Source File ──────────────────────────────────────────────────────────

ast_node!(SourceFile, SOURCE_FILE);

impl SourceFile {
    /// Top-level statements, in source order.
    pub fn statements(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.syntax.children()
    }

    /// Method definitions directly under the root.
    pub fn methods(&self) -> impl Iterator<Item = MethodDefinition> + '_ {
        child_nodes(&self.syntax)
    }
}

// ── Package ──────────────────────────────────────────────────────────────

ast_node!(PackageSpec, PACKAGE_SPEC);

impl PackageSpec {
    pub fn name(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }
}

ast_node!(Pragma, PRAGMA);

// ── Method Definition ────────────────────────────────────────────────────

ast_node!(MethodDefinition, METHOD_DEFINITION);

impl MethodDefinition {
    pub fn is_private(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::PRIVATE_KW).is_some()
    }

    pub fn is_abstract(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::ABSTRACT_KW).is_some()
    }

    pub fn is_iter(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::ITER_KW).is_some()
    }

    /// The `_method` keyword, used as the node's anchor in diagnostics.
    pub fn method_keyword(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::METHOD_KW)
    }

    /// Owning exemplar as written, e.g. `rope` or `sw:rope`.
    pub fn exemplar_name(&self) -> Option<String> {
        let node = self
            .syntax
            .children()
            .find(|n| n.kind() == SyntaxKind::EXEMPLAR_NAME)?;
        child_token(&node, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    /// The bare method name; `None` for `[]` methods.
    pub fn method_name(&self) -> Option<String> {
        let node = self
            .syntax
            .children()
            .find(|n| n.kind() == SyntaxKind::METHOD_NAME)?;
        child_token(&node, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn assignment_param(&self) -> Option<AssignmentParam> {
        child_node(&self.syntax)
    }

    /// Whether this is an `a[i]` method.
    pub fn is_index(&self) -> bool {
        self.param_list().is_some_and(|p| p.is_bracketed())
    }

    /// Signature name: `name`, `name()`, `name<<`, `name()<<`, `[]` or
    /// `[]<<`. `None` when the header is too broken to name the method.
    pub fn signature(&self) -> Option<String> {
        let mut sig = if self.is_index() {
            "[]".to_string()
        } else {
            let mut name = self.method_name()?;
            if self.param_list().is_some() {
                name.push_str("()");
            }
            name
        };
        if self.assignment_param().is_some() {
            sig.push_str("<<");
        }
        Some(sig)
    }

    /// Parameters with `_optional`/`_gather` applied.
    pub fn parameters(&self) -> Vec<(Param, ParamModifier)> {
        self.param_list()
            .map(|list| list.resolved())
            .unwrap_or_default()
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}

// ── Parameters ───────────────────────────────────────────────────────────

ast_node!(ParamList, PARAM_LIST);

impl ParamList {
    pub fn params(&self) -> impl Iterator<Item = Param> + '_ {
        child_nodes(&self.syntax)
    }

    /// `[i, j]` rather than `(a, b)`.
    pub fn is_bracketed(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::L_BRACKET).is_some()
    }

    /// Parameters paired with their effective modifier. `_optional` applies
    /// to every following parameter until `_gather`, which applies to the
    /// last one.
    pub fn resolved(&self) -> Vec<(Param, ParamModifier)> {
        let mut current = ParamModifier::None;
        self.params()
            .map(|param| {
                if param.has_gather() {
                    current = ParamModifier::Gather;
                } else if param.has_optional() {
                    current = ParamModifier::Optional;
                }
                (param, current)
            })
            .collect()
    }
}

/// How a parameter receives its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamModifier {
    None,
    Optional,
    Gather,
}

ast_node!(Param, PARAM);

impl Param {
    pub fn name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn has_optional(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::OPTIONAL_KW).is_some()
    }

    pub fn has_gather(&self) -> bool {
        child_token(&self.syntax, SyntaxKind::GATHER_KW).is_some()
    }
}

ast_node!(AssignmentParam, ASSIGNMENT_PARAM);

impl AssignmentParam {
    pub fn param(&self) -> Option<Param> {
        child_node(&self.syntax)
    }
}

// ── Body ─────────────────────────────────────────────────────────────────

ast_node!(Body, BODY);

impl Body {
    /// Statements in source order, including error nodes.
    pub fn statements(&self) -> impl Iterator<Item = SyntaxNode> + '_ {
        self.syntax.children()
    }
}

// ── Procedure ────────────────────────────────────────────────────────────

ast_node!(ProcExpr, PROC_EXPR);

impl ProcExpr {
    /// The `@name` label, without the `@`.
    pub fn label(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::LABEL)
            .map(|t| t.text().trim_start_matches('@').to_string())
    }

    pub fn param_list(&self) -> Option<ParamList> {
        child_node(&self.syntax)
    }

    pub fn parameters(&self) -> Vec<(Param, ParamModifier)> {
        self.param_list()
            .map(|list| list.resolved())
            .unwrap_or_default()
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(source: &str) -> MethodDefinition {
        crate::parse(source).tree().methods().next().unwrap()
    }

    #[test]
    fn signatures() {
        assert_eq!(method("_method a.b _endmethod").signature().unwrap(), "b");
        assert_eq!(method("_method a.b() _endmethod").signature().unwrap(), "b()");
        assert_eq!(
            method("_method a.b << x _endmethod").signature().unwrap(),
            "b<<"
        );
        assert_eq!(
            method("_method a.b(i) << x _endmethod").signature().unwrap(),
            "b()<<"
        );
        assert_eq!(method("_method a[i] _endmethod").signature().unwrap(), "[]");
        assert_eq!(
            method("_method a[i] << v _endmethod").signature().unwrap(),
            "[]<<"
        );
    }

    #[test]
    fn sticky_parameter_modifiers() {
        let m = method("_method a.b(x, _optional y, z, _gather rest) _endmethod");
        let modifiers: Vec<(String, ParamModifier)> = m
            .parameters()
            .into_iter()
            .map(|(p, m)| (p.name().and_then(|n| n.text()).unwrap(), m))
            .collect();
        assert_eq!(
            modifiers,
            vec![
                ("x".to_string(), ParamModifier::None),
                ("y".to_string(), ParamModifier::Optional),
                ("z".to_string(), ParamModifier::Optional),
                ("rest".to_string(), ParamModifier::Gather),
            ]
        );
    }

    #[test]
    fn method_modifiers() {
        let m = method("_private _iter _method a.b() _endmethod");
        assert!(m.is_private());
        assert!(m.is_iter());
        assert!(!m.is_abstract());
        assert_eq!(m.exemplar_name().as_deref(), Some("a"));
    }
}
