//! Typed AST nodes for expressions.
//!
//! Covers literals, names, `_self`/`_super`, slot references, simple
//! vectors, operators, assignments, invocations, indexing and the compound
//! expressions (`_if`, loops, `_block`, `_proc`, `_try`, `_protect`).

use crate::ast::item::{Body, ProcExpr};
use crate::ast::{ast_node, child_node, child_nodes, child_token, child_tokens, AstNode, Name};
use crate::cst::{SyntaxNode, SyntaxToken};
use crate::syntax_kind::SyntaxKind;

// ── Expr enum ────────────────────────────────────────────────────────────

/// Any expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Literal(Literal),
    NameRef(NameRef),
    SelfExpr(SelfExpr),
    SuperExpr(SuperExpr),
    SlotRef(SlotRef),
    SimpleVector(SimpleVector),
    ParenExpr(ParenExpr),
    TupleExpr(TupleExpr),
    AssignmentExpr(AssignmentExpr),
    BinaryExpr(BinaryExpr),
    UnaryExpr(UnaryExpr),
    MethodInvocation(MethodInvocation),
    ProcedureInvocation(ProcedureInvocation),
    IndexExpr(IndexExpr),
    IfExpr(IfExpr),
    LoopExpr(LoopExpr),
    BlockExpr(BlockExpr),
    ProcExpr(ProcExpr),
    TryExpr(TryExpr),
    ProtectExpr(ProtectExpr),
}

impl Expr {
    pub fn cast(node: SyntaxNode) -> Option<Self> {
        match node.kind() {
            SyntaxKind::LITERAL => Some(Expr::Literal(Literal { syntax: node })),
            SyntaxKind::NAME_REF => Some(Expr::NameRef(NameRef { syntax: node })),
            SyntaxKind::SELF_EXPR => Some(Expr::SelfExpr(SelfExpr { syntax: node })),
            SyntaxKind::SUPER_EXPR => Some(Expr::SuperExpr(SuperExpr { syntax: node })),
            SyntaxKind::SLOT_REF => Some(Expr::SlotRef(SlotRef { syntax: node })),
            SyntaxKind::SIMPLE_VECTOR => Some(Expr::SimpleVector(SimpleVector { syntax: node })),
            SyntaxKind::PAREN_EXPR => Some(Expr::ParenExpr(ParenExpr { syntax: node })),
            SyntaxKind::TUPLE_EXPR => Some(Expr::TupleExpr(TupleExpr { syntax: node })),
            SyntaxKind::ASSIGNMENT_EXPR => {
                Some(Expr::AssignmentExpr(AssignmentExpr { syntax: node }))
            }
            SyntaxKind::BINARY_EXPR => Some(Expr::BinaryExpr(BinaryExpr { syntax: node })),
            SyntaxKind::UNARY_EXPR => Some(Expr::UnaryExpr(UnaryExpr { syntax: node })),
            SyntaxKind::METHOD_INVOCATION => {
                Some(Expr::MethodInvocation(MethodInvocation { syntax: node }))
            }
            SyntaxKind::PROCEDURE_INVOCATION => {
                Some(Expr::ProcedureInvocation(ProcedureInvocation { syntax: node }))
            }
            SyntaxKind::INDEX_EXPR => Some(Expr::IndexExpr(IndexExpr { syntax: node })),
            SyntaxKind::IF_EXPR => Some(Expr::IfExpr(IfExpr { syntax: node })),
            SyntaxKind::LOOP_EXPR => Some(Expr::LoopExpr(LoopExpr { syntax: node })),
            SyntaxKind::BLOCK_EXPR => Some(Expr::BlockExpr(BlockExpr { syntax: node })),
            SyntaxKind::PROC_EXPR => Some(Expr::ProcExpr(ProcExpr { syntax: node })),
            SyntaxKind::TRY_EXPR => Some(Expr::TryExpr(TryExpr { syntax: node })),
            SyntaxKind::PROTECT_EXPR => Some(Expr::ProtectExpr(ProtectExpr { syntax: node })),
            _ => None,
        }
    }

    /// Access the underlying syntax node regardless of variant.
    pub fn syntax(&self) -> &SyntaxNode {
        match self {
            Expr::Literal(n) => &n.syntax,
            Expr::NameRef(n) => &n.syntax,
            Expr::SelfExpr(n) => &n.syntax,
            Expr::SuperExpr(n) => &n.syntax,
            Expr::SlotRef(n) => &n.syntax,
            Expr::SimpleVector(n) => &n.syntax,
            Expr::ParenExpr(n) => &n.syntax,
            Expr::TupleExpr(n) => &n.syntax,
            Expr::AssignmentExpr(n) => &n.syntax,
            Expr::BinaryExpr(n) => &n.syntax,
            Expr::UnaryExpr(n) => &n.syntax,
            Expr::MethodInvocation(n) => &n.syntax,
            Expr::ProcedureInvocation(n) => &n.syntax,
            Expr::IndexExpr(n) => &n.syntax,
            Expr::IfExpr(n) => &n.syntax,
            Expr::LoopExpr(n) => &n.syntax,
            Expr::BlockExpr(n) => &n.syntax,
            Expr::ProcExpr(n) => n.syntax(),
            Expr::TryExpr(n) => &n.syntax,
            Expr::ProtectExpr(n) => &n.syntax,
        }
    }
}

fn nth_expr(node: &SyntaxNode, n: usize) -> Option<Expr> {
    node.children().filter_map(Expr::cast).nth(n)
}

fn label_of(node: &SyntaxNode) -> Option<String> {
    child_token(node, SyntaxKind::LABEL).map(|t| t.text().trim_start_matches('@').to_string())
}

// ── Literal ──────────────────────────────────────────────────────────────

ast_node!(Literal, LITERAL);

impl Literal {
    /// The literal token (INT_NUMBER, STRING, SYMBOL, TRUE_KW, UNSET_KW, ...).
    pub fn token(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| !t.kind().is_trivia())
    }
}

// ── Name Reference ───────────────────────────────────────────────────────

ast_node!(NameRef, NAME_REF);

impl NameRef {
    pub fn ident(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    /// The identifier text.
    pub fn text(&self) -> Option<String> {
        self.ident().map(|t| t.text().to_string())
    }
}

// ── _self / _clone / _super ──────────────────────────────────────────────

ast_node!(SelfExpr, SELF_EXPR);

ast_node!(SuperExpr, SUPER_EXPR);

impl SuperExpr {
    /// The parent named in `_super(parent)`, if any.
    pub fn parent_name(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }
}

// ── Slot Reference ───────────────────────────────────────────────────────

ast_node!(SlotRef, SLOT_REF);

impl SlotRef {
    /// The slot name, without the leading dot.
    pub fn name(&self) -> Option<String> {
        child_token(&self.syntax, SyntaxKind::IDENT).map(|t| t.text().to_string())
    }
}

// ── Simple vector / parentheses / tuples ─────────────────────────────────

ast_node!(SimpleVector, SIMPLE_VECTOR);

impl SimpleVector {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(ParenExpr, PAREN_EXPR);

impl ParenExpr {
    pub fn inner(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(TupleExpr, TUPLE_EXPR);

impl TupleExpr {
    pub fn elements(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

// ── Assignment ───────────────────────────────────────────────────────────

ast_node!(AssignmentExpr, ASSIGNMENT_EXPR);

impl AssignmentExpr {
    /// The assigned-to expression: a name, a tuple of names, or a slot.
    pub fn target(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn value(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }

    pub fn op(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| {
                matches!(
                    t.kind(),
                    SyntaxKind::CHEVRON | SyntaxKind::BOOT_CHEVRON | SyntaxKind::AUG_CHEVRON
                )
            })
    }

    /// For `a +<< 1` the operator `+`; `None` for plain assignment.
    pub fn augmented_operator(&self) -> Option<String> {
        let op = self.op()?;
        if op.kind() != SyntaxKind::AUG_CHEVRON {
            return None;
        }
        op.text().strip_suffix("<<").map(|s| s.to_string())
    }
}

// ── Binary / Unary ───────────────────────────────────────────────────────

ast_node!(BinaryExpr, BINARY_EXPR);

impl BinaryExpr {
    /// The left-hand side expression.
    pub fn lhs(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    /// The right-hand side expression.
    pub fn rhs(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }

    /// The operator token: the first non-trivia token directly under the node.
    pub fn op(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| !t.kind().is_trivia())
    }
}

ast_node!(UnaryExpr, UNARY_EXPR);

impl UnaryExpr {
    pub fn op(&self) -> Option<SyntaxToken> {
        self.syntax
            .children_with_tokens()
            .filter_map(|it| it.into_token())
            .find(|t| !t.kind().is_trivia())
    }

    pub fn operand(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

// ── Invocations ──────────────────────────────────────────────────────────

ast_node!(ArgList, ARG_LIST);

impl ArgList {
    pub fn args(&self) -> impl Iterator<Item = Expr> + '_ {
        self.syntax.children().filter_map(Expr::cast)
    }
}

ast_node!(MethodInvocation, METHOD_INVOCATION);

impl MethodInvocation {
    pub fn receiver(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn name_token(&self) -> Option<SyntaxToken> {
        child_token(&self.syntax, SyntaxKind::IDENT)
    }

    /// The bare method name, e.g. `add` for `r.add(x)`.
    pub fn name(&self) -> Option<String> {
        self.name_token().map(|t| t.text().to_string())
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }

    /// The value in `r.name << value`.
    pub fn assigned_value(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }

    /// Signature name: `name`, `name()`, `name<<` or `name()<<`.
    pub fn signature(&self) -> Option<String> {
        let mut sig = self.name()?;
        if self.arg_list().is_some() {
            sig.push_str("()");
        }
        if self.assigned_value().is_some() {
            sig.push_str("<<");
        }
        Some(sig)
    }
}

ast_node!(ProcedureInvocation, PROCEDURE_INVOCATION);

impl ProcedureInvocation {
    pub fn callee(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }
}

ast_node!(IndexExpr, INDEX_EXPR);

impl IndexExpr {
    pub fn receiver(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn arg_list(&self) -> Option<ArgList> {
        child_node(&self.syntax)
    }

    pub fn assigned_value(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 1)
    }

    /// `[]` or `[]<<`.
    pub fn signature(&self) -> String {
        if self.assigned_value().is_some() {
            "[]<<".to_string()
        } else {
            "[]".to_string()
        }
    }
}

// ── If ───────────────────────────────────────────────────────────────────

ast_node!(IfExpr, IF_EXPR);

impl IfExpr {
    pub fn condition(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn then_body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }

    pub fn elif_clauses(&self) -> impl Iterator<Item = ElifClause> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn else_clause(&self) -> Option<ElseClause> {
        child_node(&self.syntax)
    }
}

ast_node!(ElifClause, ELIF_CLAUSE);

impl ElifClause {
    pub fn condition(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}

ast_node!(ElseClause, ELSE_CLAUSE);

impl ElseClause {
    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}

// ── Loops ────────────────────────────────────────────────────────────────

ast_node!(LoopExpr, LOOP_EXPR);

impl LoopExpr {
    pub fn for_clause(&self) -> Option<ForClause> {
        child_node(&self.syntax)
    }

    pub fn while_clause(&self) -> Option<WhileClause> {
        child_node(&self.syntax)
    }

    pub fn label(&self) -> Option<String> {
        label_of(&self.syntax)
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }

    pub fn finally_clause(&self) -> Option<FinallyClause> {
        child_node(&self.syntax)
    }
}

ast_node!(ForClause, FOR_CLAUSE);

impl ForClause {
    /// The loop variables.
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        child_nodes(&self.syntax)
    }

    /// The iterator invocation driving the loop.
    pub fn iterable(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(WhileClause, WHILE_CLAUSE);

impl WhileClause {
    pub fn condition(&self) -> Option<Expr> {
        nth_expr(&self.syntax, 0)
    }
}

ast_node!(FinallyClause, FINALLY_CLAUSE);

impl FinallyClause {
    pub fn names(&self) -> impl Iterator<Item = Name> + '_ {
        child_nodes(&self.syntax)
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}

// ── Block ────────────────────────────────────────────────────────────────

ast_node!(BlockExpr, BLOCK_EXPR);

impl BlockExpr {
    pub fn label(&self) -> Option<String> {
        label_of(&self.syntax)
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}

// ── Try / Protect ────────────────────────────────────────────────────────

ast_node!(TryExpr, TRY_EXPR);

impl TryExpr {
    /// The condition variable in `_try _with cond`.
    pub fn condition_name(&self) -> Option<Name> {
        child_node(&self.syntax)
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }

    pub fn when_clauses(&self) -> impl Iterator<Item = WhenClause> + '_ {
        child_nodes(&self.syntax)
    }
}

ast_node!(WhenClause, WHEN_CLAUSE);

impl WhenClause {
    /// Condition names handled by this clause.
    pub fn conditions(&self) -> Vec<String> {
        child_tokens(&self.syntax, SyntaxKind::IDENT)
            .map(|t| t.text().to_string())
            .collect()
    }

    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}

ast_node!(ProtectExpr, PROTECT_EXPR);

impl ProtectExpr {
    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }

    pub fn protection_clause(&self) -> Option<ProtectionClause> {
        child_node(&self.syntax)
    }
}

ast_node!(ProtectionClause, PROTECTION_CLAUSE);

impl ProtectionClause {
    pub fn body(&self) -> Option<Body> {
        child_node(&self.syntax)
    }
}
