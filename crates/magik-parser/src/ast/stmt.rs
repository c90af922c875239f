//! Typed AST nodes for statements: variable declarations, `_return`, `>>`,
//! `_leave`, `_continue` and `_loopbody`.

use crate::ast::expr::{ArgList, Expr};
use crate::ast::{ast_node, child_node, child_nodes, child_token, AstNode, Name};
use crate::cst::SyntaxNode;
use crate::syntax_kind::SyntaxKind;

// ── Variable declaration ─────────────────────────────────────────────────

/// The storage class a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Local,
    Constant,
    Dynamic,
    Global,
    Import,
    Recursive,
}

ast_node!(VariableDecl, VARIABLE_DECL);

impl VariableDecl {
    /// The declaration's kind. Combined keywords resolve by priority:
    /// `_global` and `_dynamic` win over `_constant`, which wins over
    /// `_recursive` and `_local`.
    pub fn kind(&self) -> DeclKind {
        let has = |kind| child_token(&self.syntax, kind).is_some();
        if has(SyntaxKind::IMPORT_KW) {
            DeclKind::Import
        } else if has(SyntaxKind::GLOBAL_KW) {
            DeclKind::Global
        } else if has(SyntaxKind::DYNAMIC_KW) {
            DeclKind::Dynamic
        } else if has(SyntaxKind::CONSTANT_KW) {
            DeclKind::Constant
        } else if has(SyntaxKind::RECURSIVE_KW) {
            DeclKind::Recursive
        } else {
            DeclKind::Local
        }
    }

    pub fn items(&self) -> impl Iterator<Item = DeclItem> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(DeclItem, DECL_ITEM);

impl DeclItem {
    /// Declared names; more than one for `(a, b) << x`.
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn value(&self) -> Option<Expr> {
        self.syntax.children().find_map(Expr::cast)
    }
}

// ── _return / >> ─────────────────────────────────────────────────────────

ast_node!(ReturnStmt, RETURN_STMT);

impl ReturnStmt {
    pub fn values(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(EmitStmt, EMIT_STMT);

impl EmitStmt {
    pub fn values(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

// ── Loop control ─────────────────────────────────────────────────────────

ast_node!(LeaveStmt, LEAVE_STMT);

impl LeaveStmt {
    pub fn label(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::LABEL)
            .map(|t| t.text().trim_start_matches('@').to_string())
    }

    /// Values in `_leave _with a, b`.
    pub fn values(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(ContinueStmt, CONTINUE_STMT);

ast_node!(LoopbodyStmt, LOOPBODY_STMT);

impl LoopbodyStmt {
    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }
}
