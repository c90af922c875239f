//! Local type reasoning.
//!
//! A single, order-respecting walk over a file that assigns an
//! [`ExpressionResultString`] to every expression it visits. Variable
//! types are tracked per scope entry and flow forward through straight-line
//! code; branches merge their outgoing states into combinations.
//!
//! Nothing here fails: a node the walker cannot type yields `UNDEFINED`
//! and the walk continues with the next one.

use std::mem;

use magik_parser::ast::expr::{
    ArgList, AssignmentExpr, BinaryExpr, Expr, IfExpr, IndexExpr, LoopExpr, MethodInvocation,
    ProcedureInvocation, ProtectExpr, TryExpr, UnaryExpr,
};
use magik_parser::ast::item::{
    Body, MethodDefinition as MethodNode, PackageSpec, Param, ParamModifier, ProcExpr,
};
use magik_parser::ast::stmt::{DeclKind, LeaveStmt, VariableDecl};
use magik_parser::ast::{AstNode, Name};
use magik_parser::{SyntaxKind, SyntaxNode, SyntaxToken};
use rowan::TextRange;
use rustc_hash::FxHashMap;

use crate::definitions::{bare_method_name, MethodDefinition, ParameterDefinition};
use crate::keeper::KeeperSnapshot;
use crate::resolver::TypeResolver;
use crate::result_string::ExpressionResultString;
use crate::scope::{EntryId, EntryKind, ScopeTree};
use crate::type_doc::TypeDoc;
use crate::type_string::{TypeString, USER_PACKAGE};

/// Integers above this are bignums.
const MAX_SMALL_INTEGER: i128 = 1 << 29;

/// Identifies a syntax node independently of any tree instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub range: TextRange,
    pub kind: SyntaxKind,
}

impl NodeKey {
    pub fn of(node: &SyntaxNode) -> NodeKey {
        NodeKey {
            range: node.text_range(),
            kind: node.kind(),
        }
    }
}

/// Results of reasoning over one file.
#[derive(Debug, Clone, Default)]
pub struct ReasonerResult {
    results: FxHashMap<NodeKey, ExpressionResultString>,
    /// What each method or procedure returns.
    definition_results: FxHashMap<NodeKey, ExpressionResultString>,
    /// What each iterator (or iterator invocation) hands to a loop.
    loop_results: FxHashMap<NodeKey, ExpressionResultString>,
}

impl ReasonerResult {
    /// The result of `node`, if the walk reached it.
    pub fn result_of(&self, node: &SyntaxNode) -> Option<&ExpressionResultString> {
        self.results.get(&NodeKey::of(node))
    }

    pub fn get(&self, key: &NodeKey) -> Option<&ExpressionResultString> {
        self.results.get(key)
    }

    pub fn definition_result(&self, node: &SyntaxNode) -> Option<&ExpressionResultString> {
        self.definition_results.get(&NodeKey::of(node))
    }

    pub fn loop_result(&self, node: &SyntaxNode) -> Option<&ExpressionResultString> {
        self.loop_results.get(&NodeKey::of(node))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeKey, &ExpressionResultString)> + '_ {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Reason over every statement of `root`, a `SOURCE_FILE` node.
pub fn reason(root: &SyntaxNode, scopes: &ScopeTree, keeper: &KeeperSnapshot) -> ReasonerResult {
    let mut reasoner = Reasoner {
        resolver: TypeResolver::new(keeper),
        scopes,
        package: USER_PACKAGE.to_string(),
        state: FxHashMap::default(),
        frames: Vec::new(),
        emits: Vec::new(),
        leaves: Vec::new(),
        result: ReasonerResult::default(),
    };
    for node in root.children() {
        reasoner.statement(&node);
    }
    reasoner.result
}

/// The intrinsic type of a literal token.
pub fn literal_type(token: &SyntaxToken) -> TypeString {
    match token.kind() {
        SyntaxKind::INT_NUMBER => match parse_integer(token.text()) {
            Some(value) if value.abs() <= MAX_SMALL_INTEGER => TypeString::integer(),
            _ => TypeString::bignum(),
        },
        SyntaxKind::FLOAT_NUMBER => TypeString::float(),
        SyntaxKind::STRING => TypeString::char16_vector(),
        SyntaxKind::SYMBOL => TypeString::symbol(),
        SyntaxKind::CHARACTER => TypeString::character(),
        SyntaxKind::TRUE_KW | SyntaxKind::FALSE_KW => TypeString::boolean(),
        SyntaxKind::MAYBE_KW => TypeString::maybe(),
        SyntaxKind::UNSET_KW => TypeString::Unset,
        _ => TypeString::Undefined,
    }
}

/// `123` or `16rFF`.
fn parse_integer(text: &str) -> Option<i128> {
    match text.split_once(['r', 'R']) {
        Some((radix, digits)) => {
            let radix: u32 = radix.parse().ok().filter(|r| (2..=36).contains(r))?;
            i128::from_str_radix(digits, radix).ok()
        }
        None => text.parse().ok(),
    }
}

type State = FxHashMap<EntryId, TypeString>;

/// The type of a variable when a condition holds and when it does not.
/// `Undefined` leaves the variable as it was.
#[derive(Debug, Clone)]
struct Narrowing {
    entry: EntryId,
    then: TypeString,
    otherwise: TypeString,
}

impl Narrowing {
    fn negate(self) -> Narrowing {
        Narrowing {
            entry: self.entry,
            then: self.otherwise,
            otherwise: self.then,
        }
    }
}

struct Frame {
    owner: TypeString,
    /// Index of this frame's slot in the emit stack; `_return` goes there.
    emit_slot: usize,
    loops: Option<ExpressionResultString>,
}

/// A loop, or a labelled block, `_leave` can exit.
struct LeaveTarget {
    label: Option<String>,
    is_loop: bool,
    left: Option<ExpressionResultString>,
}

struct Reasoner<'a> {
    resolver: TypeResolver<'a>,
    scopes: &'a ScopeTree,
    package: String,
    state: State,
    frames: Vec<Frame>,
    /// Accumulators for `>>`, innermost last.
    emits: Vec<Option<ExpressionResultString>>,
    leaves: Vec<LeaveTarget>,
    result: ReasonerResult,
}

fn accumulate(slot: &mut Option<ExpressionResultString>, value: ExpressionResultString) {
    *slot = Some(match slot.take() {
        Some(previous) => previous.combine(&value),
        None => value,
    });
}

/// Per-variable union of `states`, members in first-seen order.
fn merge(states: Vec<State>) -> State {
    let mut merged: FxHashMap<EntryId, Vec<TypeString>> = FxHashMap::default();
    for state in states {
        for (entry, ts) in state {
            merged.entry(entry).or_default().push(ts);
        }
    }
    merged
        .into_iter()
        .map(|(entry, types)| (entry, TypeString::combine(types)))
        .collect()
}

impl<'a> Reasoner<'a> {
    fn record(&mut self, node: &SyntaxNode, result: ExpressionResultString) -> ExpressionResultString {
        self.result.results.insert(NodeKey::of(node), result.clone());
        result
    }

    fn owner(&self) -> TypeString {
        self.frames
            .last()
            .map(|f| f.owner.clone())
            .unwrap_or(TypeString::Undefined)
    }

    // ── Statements ─────────────────────────────────────────────────────

    fn body(&mut self, body: Option<Body>) {
        if let Some(body) = body {
            for stmt in body.statements() {
                self.statement(&stmt);
            }
        }
    }

    fn statement(&mut self, node: &SyntaxNode) {
        match node.kind() {
            SyntaxKind::PACKAGE_SPEC => {
                if let Some(name) = PackageSpec::cast(node.clone()).and_then(|p| p.name()) {
                    self.package = name;
                }
            }
            SyntaxKind::METHOD_DEFINITION => {
                if let Some(method) = MethodNode::cast(node.clone()) {
                    self.method(&method);
                }
            }
            SyntaxKind::VARIABLE_DECL => {
                if let Some(decl) = VariableDecl::cast(node.clone()) {
                    self.declaration(&decl);
                }
            }
            SyntaxKind::RETURN_STMT => {
                let values = self.values(node);
                self.record(node, values.clone());
                if let Some(slot) = self.frames.last().map(|f| f.emit_slot) {
                    accumulate(&mut self.emits[slot], values);
                }
            }
            SyntaxKind::EMIT_STMT => {
                let values = self.values(node);
                self.record(node, values.clone());
                if let Some(slot) = self.emits.last_mut() {
                    accumulate(slot, values);
                }
            }
            SyntaxKind::LEAVE_STMT => {
                let label = LeaveStmt::cast(node.clone()).and_then(|l| l.label());
                let has_values = node.children().any(|n| Expr::cast(n).is_some());
                let values = self.values(node);
                self.record(node, values.clone());
                if has_values {
                    let target = match &label {
                        Some(label) => self
                            .leaves
                            .iter_mut()
                            .rev()
                            .find(|l| l.label.as_deref() == Some(label.as_str())),
                        None => self.leaves.iter_mut().rev().find(|l| l.is_loop),
                    };
                    if let Some(target) = target {
                        accumulate(&mut target.left, values);
                    }
                }
            }
            SyntaxKind::LOOPBODY_STMT => {
                let args: Vec<TypeString> = node
                    .children()
                    .find_map(ArgList::cast)
                    .map(|list| list.args().collect::<Vec<_>>())
                    .unwrap_or_default()
                    .iter()
                    .map(|arg| self.expr(arg).first())
                    .collect();
                let values = ExpressionResultString::new(args);
                self.record(node, values.clone());
                if let Some(frame) = self.frames.last_mut() {
                    accumulate(&mut frame.loops, values);
                }
            }
            _ => match Expr::cast(node.clone()) {
                Some(expr) => {
                    self.expr(&expr);
                }
                None => {
                    for child in node.children() {
                        self.statement(&child);
                    }
                }
            },
        }
    }

    /// Values of `_return`/`>>`/`_leave`: a single expression passes all
    /// its results through, several contribute one result each.
    fn values(&mut self, node: &SyntaxNode) -> ExpressionResultString {
        let exprs: Vec<Expr> = node.children().filter_map(Expr::cast).collect();
        match exprs.as_slice() {
            [] => ExpressionResultString::EMPTY,
            [single] => self.expr(single),
            many => {
                let types = many.iter().map(|e| self.expr(e).first()).collect();
                ExpressionResultString::new(types)
            }
        }
    }

    fn declaration(&mut self, decl: &VariableDecl) {
        let kind = decl.kind();
        let mut last = ExpressionResultString::EMPTY;
        for item in decl.items() {
            let names: Vec<Name> = item.names().collect();
            let value = match item.value() {
                Some(value) => Some(self.expr(&value)),
                None => match kind {
                    DeclKind::Local | DeclKind::Constant | DeclKind::Recursive => {
                        Some(ExpressionResultString::single(TypeString::Unset))
                    }
                    _ => None,
                },
            };
            for (i, name) in names.iter().enumerate() {
                let Some(entry) = self.scopes.reference(name.syntax().text_range()) else {
                    continue;
                };
                let ts = match (&value, kind) {
                    (Some(value), _) => value.get(i, TypeString::Unset),
                    (None, DeclKind::Import) => {
                        let imported = self.scopes.entry(entry).imported;
                        match imported.and_then(|id| self.state.get(&id)) {
                            Some(ts) => ts.clone(),
                            None => continue,
                        }
                    }
                    (None, _) => continue,
                };
                self.state.insert(entry, ts.clone());
                self.record(name.syntax(), ExpressionResultString::single(ts));
            }
            if let Some(value) = value {
                last = value;
            }
        }
        self.record(decl.syntax(), last);
    }

    // ── Definitions ────────────────────────────────────────────────────

    fn method(&mut self, method: &MethodNode) {
        let node = method.syntax();
        let owner = method
            .exemplar_name()
            .map(|name| self.resolver.canonical(&TypeString::qualified(&name, &self.package)))
            .unwrap_or(TypeString::Undefined);
        let doc = TypeDoc::for_definition(node, &self.package);
        let mut params = method.parameters();
        if let Some(param) = method.assignment_param().and_then(|a| a.param()) {
            params.push((param, ParamModifier::None));
        }
        self.definition(node, owner, &params, &doc, |r| r.body(method.body()));
    }

    fn procedure(&mut self, proc_expr: &ProcExpr) -> ExpressionResultString {
        let node = proc_expr.syntax();
        let doc = TypeDoc::for_definition(node, &self.package);
        let params = proc_expr.parameters();
        self.definition(node, TypeString::Undefined, &params, &doc, |r| {
            r.body(proc_expr.body())
        });
        self.record(node, ExpressionResultString::single(TypeString::procedure()))
    }

    fn definition(
        &mut self,
        node: &SyntaxNode,
        owner: TypeString,
        params: &[(Param, ParamModifier)],
        doc: &TypeDoc,
        walk: impl FnOnce(&mut Self),
    ) {
        let outer_state = mem::take(&mut self.state);
        let outer_emits = mem::take(&mut self.emits);
        let outer_leaves = mem::take(&mut self.leaves);
        // Bodies run later; they see the outer state but never change it.
        self.state = outer_state.clone();

        for (param, modifier) in params {
            let Some(name) = param.name() else { continue };
            let documented = name
                .text()
                .and_then(|n| doc.param(&n).cloned())
                .unwrap_or(TypeString::Undefined);
            let ts = match modifier {
                ParamModifier::None => documented,
                ParamModifier::Optional => TypeString::combine([documented, TypeString::Unset]),
                ParamModifier::Gather => TypeString::simple_vector().with_generics(vec![
                    TypeString::generic_definition("K", TypeString::integer()),
                    TypeString::generic_definition("E", documented),
                ]),
            };
            if let Some(entry) = self.scopes.reference(name.syntax().text_range()) {
                self.state.insert(entry, ts.clone());
            }
            self.record(name.syntax(), ExpressionResultString::single(ts));
        }

        self.frames.push(Frame {
            owner,
            emit_slot: 0,
            loops: None,
        });
        self.emits.push(None);
        walk(self);
        let returned = self.emits.pop().flatten();
        let looped = self.frames.pop().and_then(|f| f.loops);

        let key = NodeKey::of(node);
        self.result
            .definition_results
            .insert(key, returned.unwrap_or(ExpressionResultString::EMPTY));
        self.result
            .loop_results
            .insert(key, looped.unwrap_or(ExpressionResultString::EMPTY));

        self.state = outer_state;
        self.emits = outer_emits;
        self.leaves = outer_leaves;
    }

    // ── Expressions ────────────────────────────────────────────────────

    fn expr(&mut self, expr: &Expr) -> ExpressionResultString {
        let result = match expr {
            Expr::Literal(literal) => ExpressionResultString::single(
                literal
                    .token()
                    .map(|t| literal_type(&t))
                    .unwrap_or(TypeString::Undefined),
            ),
            Expr::NameRef(name_ref) => {
                ExpressionResultString::single(self.name_type(name_ref.syntax(), name_ref.text()))
            }
            Expr::SelfExpr(_) => ExpressionResultString::single(self.owner()),
            Expr::SuperExpr(sup) => {
                let parents = self.resolver.parents(&self.owner());
                let parent = match sup.parent_name() {
                    Some(name) => parents
                        .into_iter()
                        .find(|p| p.identifier() == Some(bare_name(&name))),
                    None => parents.into_iter().next(),
                };
                ExpressionResultString::single(parent.unwrap_or(TypeString::Undefined))
            }
            Expr::SlotRef(slot) => ExpressionResultString::single(match slot.name() {
                Some(name) => self.resolver.slot_type(&self.owner(), &name),
                None => TypeString::Undefined,
            }),
            Expr::SimpleVector(vector) => {
                let elements: Vec<TypeString> = vector
                    .elements()
                    .collect::<Vec<_>>()
                    .iter()
                    .map(|e| self.expr(e).first())
                    .collect();
                let ts = if elements.is_empty() {
                    TypeString::simple_vector()
                } else {
                    TypeString::simple_vector().with_generics(vec![
                        TypeString::generic_definition("K", TypeString::integer()),
                        TypeString::generic_definition("E", TypeString::combine(elements)),
                    ])
                };
                ExpressionResultString::single(ts)
            }
            Expr::ParenExpr(paren) => match paren.inner() {
                Some(inner) => ExpressionResultString::single(self.expr(&inner).first()),
                None => ExpressionResultString::UNDEFINED,
            },
            Expr::TupleExpr(tuple) => {
                let types = tuple
                    .elements()
                    .collect::<Vec<_>>()
                    .iter()
                    .map(|e| self.expr(e).first())
                    .collect();
                ExpressionResultString::new(types)
            }
            Expr::AssignmentExpr(assignment) => self.assignment(assignment),
            Expr::BinaryExpr(binary) => self.binary(binary),
            Expr::UnaryExpr(unary) => self.unary(unary),
            Expr::MethodInvocation(invocation) => self.method_invocation(invocation),
            Expr::ProcedureInvocation(invocation) => self.procedure_invocation(invocation),
            Expr::IndexExpr(index) => self.index(index),
            Expr::IfExpr(if_expr) => self.if_expr(if_expr),
            Expr::LoopExpr(loop_expr) => self.loop_expr(loop_expr),
            Expr::BlockExpr(block) => {
                self.emits.push(None);
                self.leaves.push(LeaveTarget {
                    label: block.label(),
                    is_loop: false,
                    left: None,
                });
                self.body(block.body());
                let mut result = self.leaves.pop().and_then(|l| l.left);
                if let Some(emitted) = self.emits.pop().flatten() {
                    accumulate(&mut result, emitted);
                }
                result.unwrap_or(ExpressionResultString::EMPTY)
            }
            Expr::ProcExpr(proc_expr) => return self.procedure(proc_expr),
            Expr::TryExpr(try_expr) => self.try_expr(try_expr),
            Expr::ProtectExpr(protect) => {
                self.emits.push(None);
                self.body(protect.body());
                if let Some(clause) = protect.protection_clause() {
                    self.body(clause.body());
                }
                self.emits
                    .pop()
                    .flatten()
                    .unwrap_or(ExpressionResultString::EMPTY)
            }
        };
        self.record(expr.syntax(), result)
    }

    /// Type of the variable or global a name refers to.
    fn name_type(&self, node: &SyntaxNode, name: Option<String>) -> TypeString {
        let entry = self.scopes.reference(node.text_range());
        if let Some(ts) = entry.and_then(|id| self.state.get(&id)) {
            return ts.clone();
        }
        let is_global = entry.map_or(true, |id| {
            matches!(
                self.scopes.entry(id).kind,
                EntryKind::Global | EntryKind::Dynamic | EntryKind::Definition
            )
        });
        match name {
            Some(name) if is_global => self.global_type(&name),
            _ => TypeString::Undefined,
        }
    }

    fn global_type(&self, name: &str) -> TypeString {
        let ts = TypeString::qualified(name, &self.package);
        if let Some(exemplar) = self.resolver.resolve_exemplar(&ts) {
            return exemplar.type_string.clone();
        }
        if let Some(global) = self.resolver.resolve_global(&ts) {
            return global.alias.clone();
        }
        if self.resolver.resolve_procedure(&ts).is_some() {
            return TypeString::procedure();
        }
        TypeString::Undefined
    }

    fn assignment(&mut self, assignment: &AssignmentExpr) -> ExpressionResultString {
        let value = match assignment.value() {
            Some(value) => self.expr(&value),
            None => ExpressionResultString::UNDEFINED,
        };
        let Some(target) = assignment.target() else { return value };
        let value = match assignment.augmented_operator() {
            Some(op) => {
                let current = self.expr(&target).first();
                ExpressionResultString::single(self.binary_result(&op, &current, &value.first()))
            }
            None => value,
        };
        self.assign(&target, &value);
        value
    }

    fn assign(&mut self, target: &Expr, value: &ExpressionResultString) {
        match target {
            Expr::NameRef(name_ref) => {
                let ts = value.first();
                if let Some(entry) = self.scopes.reference(name_ref.syntax().text_range()) {
                    self.state.insert(entry, ts.clone());
                }
                self.record(name_ref.syntax(), ExpressionResultString::single(ts));
            }
            Expr::TupleExpr(tuple) => {
                for (i, element) in tuple.elements().enumerate() {
                    let ts = ExpressionResultString::single(value.get(i, TypeString::Unset));
                    self.assign(&element, &ts);
                }
            }
            other => {
                self.expr(other);
            }
        }
    }

    fn binary(&mut self, binary: &BinaryExpr) -> ExpressionResultString {
        let lhs = binary.lhs().map(|e| self.expr(&e).first());
        let rhs = binary.rhs().map(|e| self.expr(&e).first());
        let Some(op) = binary.op() else {
            return ExpressionResultString::UNDEFINED;
        };
        let ts = match op.kind() {
            SyntaxKind::AND_KW
            | SyntaxKind::ANDIF_KW
            | SyntaxKind::OR_KW
            | SyntaxKind::ORIF_KW
            | SyntaxKind::XOR_KW
            | SyntaxKind::IS_KW
            | SyntaxKind::ISNT_KW
            | SyntaxKind::CF_KW
            | SyntaxKind::EQ
            | SyntaxKind::NOT_EQ
            | SyntaxKind::LT
            | SyntaxKind::GT
            | SyntaxKind::LT_EQ
            | SyntaxKind::GT_EQ => TypeString::boolean(),
            _ => match (lhs, rhs) {
                (Some(lhs), Some(rhs)) => self.binary_result(op.text(), &lhs, &rhs),
                _ => TypeString::Undefined,
            },
        };
        ExpressionResultString::single(ts)
    }

    fn binary_result(&self, op: &str, lhs: &TypeString, rhs: &TypeString) -> TypeString {
        if lhs.is_undefined() || rhs.is_undefined() {
            return TypeString::Undefined;
        }
        self.resolver.binary_operator(op, lhs, rhs)
    }

    fn unary(&mut self, unary: &UnaryExpr) -> ExpressionResultString {
        let operand = unary.operand().map(|e| self.expr(&e).first());
        let ts = match unary.op().map(|t| t.kind()) {
            Some(SyntaxKind::NOT_KW) => TypeString::boolean(),
            _ => operand.unwrap_or(TypeString::Undefined),
        };
        ExpressionResultString::single(ts)
    }

    // ── Invocations ────────────────────────────────────────────────────

    fn arguments(&mut self, args: Option<ArgList>) -> Vec<TypeString> {
        args.map(|list| list.args().collect::<Vec<_>>())
            .unwrap_or_default()
            .iter()
            .map(|arg| self.expr(arg).first())
            .collect()
    }

    fn method_invocation(&mut self, invocation: &MethodInvocation) -> ExpressionResultString {
        let receiver = invocation
            .receiver()
            .map(|r| self.expr(&r).first())
            .unwrap_or(TypeString::Undefined);
        let mut args = self.arguments(invocation.arg_list());
        if let Some(value) = invocation.assigned_value() {
            args.push(self.expr(&value).first());
        }
        let Some(signature) = invocation.signature() else {
            return ExpressionResultString::UNDEFINED;
        };
        self.invoke(invocation.syntax(), &receiver, &signature, &args)
    }

    fn index(&mut self, index: &IndexExpr) -> ExpressionResultString {
        let receiver = index
            .receiver()
            .map(|r| self.expr(&r).first())
            .unwrap_or(TypeString::Undefined);
        let mut args = self.arguments(index.arg_list());
        if let Some(value) = index.assigned_value() {
            args.push(self.expr(&value).first());
        }
        self.invoke(index.syntax(), &receiver, &index.signature(), &args)
    }

    /// Union of the results of every method `receiver.signature` may run.
    /// Also records what the invocation hands to a driving loop.
    fn invoke(
        &mut self,
        node: &SyntaxNode,
        receiver: &TypeString,
        signature: &str,
        args: &[TypeString],
    ) -> ExpressionResultString {
        let mut returns = None;
        let mut loops = None;
        for part in receiver.parts() {
            let candidates: Vec<_> = if part.is_undefined() {
                self.resolver
                    .keeper()
                    .get_methods_by_name(bare_method_name(signature))
                    .into_iter()
                    .filter(|m| m.name == signature)
                    .collect()
            } else {
                self.resolver.get_method(part, signature).into_iter().collect()
            };
            for method in candidates {
                let bind = |ts: &TypeString| bind_call(ts, part, &method, args);
                accumulate(&mut returns, method.return_types.map(bind));
                accumulate(&mut loops, method.loop_types.map(bind));
            }
        }
        if let Some(loops) = loops {
            self.result.loop_results.insert(NodeKey::of(node), loops);
        }
        returns.unwrap_or(ExpressionResultString::UNDEFINED)
    }

    fn procedure_invocation(&mut self, invocation: &ProcedureInvocation) -> ExpressionResultString {
        let callee = invocation.callee();
        if let Some(callee) = &callee {
            self.expr(callee);
        }
        let args = self.arguments(invocation.arg_list());
        let Some(Expr::NameRef(name_ref)) = callee else {
            return ExpressionResultString::UNDEFINED;
        };
        // A local holding a procedure is not resolved.
        let local = self
            .scopes
            .reference(name_ref.syntax().text_range())
            .is_some_and(|id| self.scopes.entry(id).kind != EntryKind::Global);
        let Some(name) = name_ref.text().filter(|_| !local) else {
            return ExpressionResultString::UNDEFINED;
        };
        let Some(procedure) = self
            .resolver
            .resolve_procedure(&TypeString::qualified(&name, &self.package))
        else {
            return ExpressionResultString::UNDEFINED;
        };
        let bind = |ts: &TypeString| bind_parameters(ts, &procedure.parameters, args.as_slice());
        let loops = procedure.loop_types.map(bind);
        self.result
            .loop_results
            .insert(NodeKey::of(invocation.syntax()), loops);
        procedure.return_types.map(bind)
    }

    // ── Control flow ───────────────────────────────────────────────────

    fn if_expr(&mut self, if_expr: &IfExpr) -> ExpressionResultString {
        let mut branches = Vec::new();
        self.emits.push(None);

        let mut otherwise = self.enter_branch(if_expr.condition());
        self.body(if_expr.then_body());
        branches.push(mem::replace(&mut self.state, otherwise));
        for elif in if_expr.elif_clauses() {
            otherwise = self.enter_branch(elif.condition());
            self.body(elif.body());
            branches.push(mem::replace(&mut self.state, otherwise));
        }
        match if_expr.else_clause() {
            Some(else_clause) => {
                self.body(else_clause.body());
                branches.push(mem::take(&mut self.state));
            }
            None => branches.push(mem::take(&mut self.state)),
        }

        self.state = merge(branches);
        self.emits
            .pop()
            .flatten()
            .unwrap_or(ExpressionResultString::EMPTY)
    }

    /// Evaluate a branch condition and narrow the current state to what
    /// holds when it is true. Returns the state for when it is false.
    fn enter_branch(&mut self, condition: Option<Expr>) -> State {
        let Some(condition) = condition else {
            return self.state.clone();
        };
        self.expr(&condition);
        let narrowings = self.narrowings(&condition);
        let mut otherwise = self.state.clone();
        for narrowing in narrowings {
            if !narrowing.otherwise.is_undefined() {
                otherwise.insert(narrowing.entry, narrowing.otherwise);
            }
            if !narrowing.then.is_undefined() {
                self.state.insert(narrowing.entry, narrowing.then);
            }
        }
        otherwise
    }

    /// Variable types implied by `condition`: `x _is _unset`,
    /// `x _isnt _unset`, `x.is_kind_of?(exemplar)`, combined with `_not`,
    /// `_and`/`_andif` and `_or`/`_orif`.
    fn narrowings(&self, condition: &Expr) -> Vec<Narrowing> {
        match condition {
            Expr::ParenExpr(paren) => paren
                .inner()
                .map(|inner| self.narrowings(&inner))
                .unwrap_or_default(),
            Expr::UnaryExpr(unary) if unary.op().map(|t| t.kind()) == Some(SyntaxKind::NOT_KW) => {
                unary
                    .operand()
                    .map(|operand| self.narrowings(&operand))
                    .unwrap_or_default()
                    .into_iter()
                    .map(Narrowing::negate)
                    .collect()
            }
            Expr::BinaryExpr(binary) => match binary.op().map(|t| t.kind()) {
                Some(kind @ (SyntaxKind::IS_KW | SyntaxKind::ISNT_KW)) => {
                    let narrowing = self.unset_test(binary.lhs(), binary.rhs());
                    match kind {
                        SyntaxKind::IS_KW => narrowing.into_iter().collect(),
                        _ => narrowing.into_iter().map(Narrowing::negate).collect(),
                    }
                }
                Some(SyntaxKind::AND_KW | SyntaxKind::ANDIF_KW) => self
                    .operand_narrowings(binary)
                    .map(|n| Narrowing {
                        otherwise: TypeString::Undefined,
                        ..n
                    })
                    .collect(),
                Some(SyntaxKind::OR_KW | SyntaxKind::ORIF_KW) => self
                    .operand_narrowings(binary)
                    .map(|n| Narrowing {
                        then: TypeString::Undefined,
                        ..n
                    })
                    .collect(),
                _ => Vec::new(),
            },
            Expr::MethodInvocation(invocation)
                if invocation.name().as_deref() == Some("is_kind_of?") =>
            {
                self.kind_test(invocation).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }

    fn operand_narrowings(&self, binary: &BinaryExpr) -> impl Iterator<Item = Narrowing> {
        let lhs = binary.lhs().map(|e| self.narrowings(&e)).unwrap_or_default();
        let rhs = binary.rhs().map(|e| self.narrowings(&e)).unwrap_or_default();
        lhs.into_iter().chain(rhs)
    }

    /// `x _is _unset`, either way round.
    fn unset_test(&self, lhs: Option<Expr>, rhs: Option<Expr>) -> Option<Narrowing> {
        let is_unset = |e: &Expr| match e {
            Expr::Literal(literal) => literal
                .token()
                .is_some_and(|t| t.kind() == SyntaxKind::UNSET_KW),
            _ => false,
        };
        let (lhs, rhs) = (lhs?, rhs?);
        let variable = if is_unset(&rhs) {
            lhs
        } else if is_unset(&lhs) {
            rhs
        } else {
            return None;
        };
        let (entry, current) = self.narrowable(&variable)?;
        let set = current
            .parts()
            .iter()
            .filter(|part| !part.is_unset())
            .cloned()
            .collect::<Vec<_>>();
        let otherwise = if set.is_empty() {
            TypeString::Undefined
        } else {
            TypeString::combine(set)
        };
        Some(Narrowing {
            entry,
            then: TypeString::Unset,
            otherwise,
        })
    }

    /// `x.is_kind_of?(exemplar)`: the members of `x` that are kinds of the
    /// exemplar, or the exemplar itself when none are known to be.
    fn kind_test(&self, invocation: &MethodInvocation) -> Option<Narrowing> {
        let (entry, current) = self.narrowable(&invocation.receiver()?)?;
        let Some(Expr::NameRef(name)) = invocation.arg_list()?.args().next() else {
            return None;
        };
        let exemplar = self
            .resolver
            .resolve_exemplar(&TypeString::qualified(&name.text()?, &self.package))?
            .type_string
            .clone();
        let (kinds, others): (Vec<TypeString>, Vec<TypeString>) = current
            .parts()
            .iter()
            .filter(|part| !part.is_undefined())
            .cloned()
            .partition(|part| self.resolver.is_kind_of(part, &exemplar));
        let then = if kinds.is_empty() {
            exemplar
        } else {
            TypeString::combine(kinds)
        };
        let otherwise = if others.is_empty() || current.is_undefined() {
            TypeString::Undefined
        } else {
            TypeString::combine(others)
        };
        Some(Narrowing {
            entry,
            then,
            otherwise,
        })
    }

    /// A variable whose type a condition may narrow, with its current type.
    fn narrowable(&self, expr: &Expr) -> Option<(EntryId, TypeString)> {
        let Expr::NameRef(name) = expr else { return None };
        let entry = self.scopes.reference(name.syntax().text_range())?;
        if matches!(
            self.scopes.entry(entry).kind,
            EntryKind::Global | EntryKind::Dynamic
        ) {
            return None;
        }
        let current = self
            .state
            .get(&entry)
            .cloned()
            .unwrap_or(TypeString::Undefined);
        Some((entry, current))
    }

    fn loop_expr(&mut self, loop_expr: &LoopExpr) -> ExpressionResultString {
        let for_clause = loop_expr.for_clause();
        let loop_types = match for_clause.as_ref().and_then(|f| f.iterable()) {
            Some(iterable) => {
                self.expr(&iterable);
                self.result
                    .loop_results
                    .get(&NodeKey::of(iterable.syntax()))
                    .cloned()
                    .unwrap_or(ExpressionResultString::UNDEFINED)
            }
            None => ExpressionResultString::UNDEFINED,
        };
        if let Some(condition) = loop_expr.while_clause().and_then(|w| w.condition()) {
            self.expr(&condition);
        }
        let before = self.state.clone();

        if let Some(for_clause) = &for_clause {
            for (i, name) in for_clause.names().enumerate() {
                let ts = loop_types.get(i, TypeString::Unset);
                if let Some(entry) = self.scopes.reference(name.syntax().text_range()) {
                    self.state.insert(entry, ts.clone());
                }
                self.record(name.syntax(), ExpressionResultString::single(ts));
            }
        }

        self.leaves.push(LeaveTarget {
            label: loop_expr.label(),
            is_loop: true,
            left: None,
        });
        self.body(loop_expr.body());
        let after = mem::take(&mut self.state);
        self.state = merge(vec![before, after]);
        let left = self.leaves.pop().and_then(|l| l.left);

        if let Some(finally) = loop_expr.finally_clause() {
            for (i, name) in finally.names().enumerate() {
                let ts = left
                    .as_ref()
                    .map_or(TypeString::Undefined, |l| l.get(i, TypeString::Unset));
                if let Some(entry) = self.scopes.reference(name.syntax().text_range()) {
                    self.state.insert(entry, ts.clone());
                }
                self.record(name.syntax(), ExpressionResultString::single(ts));
            }
            self.body(finally.body());
        }
        left.unwrap_or(ExpressionResultString::EMPTY)
    }

    fn try_expr(&mut self, try_expr: &TryExpr) -> ExpressionResultString {
        let before = self.state.clone();
        self.emits.push(None);
        let condition = try_expr
            .condition_name()
            .and_then(|name| self.scopes.reference(name.syntax().text_range()).map(|e| (name, e)));
        if let Some((name, entry)) = &condition {
            self.state.insert(*entry, TypeString::condition());
            self.record(name.syntax(), ExpressionResultString::single(TypeString::condition()));
        }

        self.body(try_expr.body());
        let mut branches = vec![mem::replace(&mut self.state, before.clone())];
        for when in try_expr.when_clauses() {
            if let Some((_, entry)) = &condition {
                self.state.insert(*entry, TypeString::condition());
            }
            self.body(when.body());
            branches.push(mem::replace(&mut self.state, before.clone()));
        }

        self.state = merge(branches);
        self.emits
            .pop()
            .flatten()
            .unwrap_or(ExpressionResultString::EMPTY)
    }
}

/// Strip a package prefix from a name.
fn bare_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Resolve `_self` and `_parameter(p)` in a method result for one call.
fn bind_call(
    ts: &TypeString,
    receiver: &TypeString,
    method: &MethodDefinition,
    args: &[TypeString],
) -> TypeString {
    let mut parameters = method.parameters.clone();
    parameters.extend(method.assignment_parameter.clone());
    bind_parameters(&ts.substitute(&TypeString::SelfType, receiver), &parameters, args)
}

fn bind_parameters(ts: &TypeString, parameters: &[ParameterDefinition], args: &[TypeString]) -> TypeString {
    parameters.iter().enumerate().fold(ts.clone(), |ts, (i, param)| {
        let argument = args.get(i).cloned().unwrap_or(TypeString::Unset);
        ts.substitute(&TypeString::ParameterReference(param.name.clone()), &argument)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keeper::DefinitionKeeper;
    use magik_parser::ast::item::SourceFile;

    fn find(root: &SyntaxNode, kind: SyntaxKind, text: &str) -> SyntaxNode {
        root.descendants()
            .find(|n| n.kind() == kind && n.text().to_string().trim() == text)
            .unwrap()
    }

    fn analyze(source: &str, keeper: &DefinitionKeeper) -> (SyntaxNode, ReasonerResult) {
        let parse = magik_parser::parse(source);
        let root = parse.syntax();
        let scopes = ScopeTree::build(&SourceFile::cast(root.clone()).unwrap());
        let result = reason(&root, &scopes, &keeper.snapshot());
        (root, result)
    }

    fn type_of(root: &SyntaxNode, result: &ReasonerResult, kind: SyntaxKind, text: &str) -> String {
        result.result_of(&find(root, kind, text)).unwrap().to_string()
    }

    #[test]
    fn literals() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_block\n  _local a << 1, b << 1.5, c << \"s\", d << :sym, e << %a, f << _true, g << _maybe, h << _unset, i << 1073741824\n_endblock\n";
        let (root, result) = analyze(source, &keeper);
        let name_type = |name: &str| type_of(&root, &result, SyntaxKind::NAME, name);
        assert_eq!(name_type("a"), "sw:integer");
        assert_eq!(name_type("b"), "sw:float");
        assert_eq!(name_type("c"), "sw:char16_vector");
        assert_eq!(name_type("d"), "sw:symbol");
        assert_eq!(name_type("e"), "sw:character");
        assert_eq!(name_type("f"), "sw:false");
        assert_eq!(name_type("g"), "sw:maybe");
        assert_eq!(name_type("h"), "sw:unset");
        assert_eq!(name_type("i"), "sw:bignum");
    }

    #[test]
    fn vectors_bind_their_elements() {
        let keeper = DefinitionKeeper::with_builtins();
        let (root, result) = analyze("_block\n  _local v << {1, 2.0}\n  >> v[1]\n_endblock\n", &keeper);
        assert_eq!(
            type_of(&root, &result, SyntaxKind::NAME, "v"),
            "sw:simple_vector<K=sw:integer,E=sw:integer|sw:float>"
        );
        assert_eq!(
            type_of(&root, &result, SyntaxKind::INDEX_EXPR, "v[1]"),
            "sw:integer|sw:float"
        );
    }

    #[test]
    fn self_and_returns_of_self() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_method integer.twice\n  _return _self.abs\n_endmethod\n";
        let (root, result) = analyze(source, &keeper);
        assert_eq!(type_of(&root, &result, SyntaxKind::SELF_EXPR, "_self"), "sw:integer");
        let method = find(&root, SyntaxKind::METHOD_DEFINITION, source.trim());
        assert_eq!(result.definition_result(&method).unwrap().to_string(), "sw:integer");
    }

    #[test]
    fn arithmetic_and_comparisons() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_block\n  _local a << 1 + 2.0, b << 1 < 2, c << _not b, d << 3\n  d +<< 1\n_endblock\n";
        let (root, result) = analyze(source, &keeper);
        assert_eq!(type_of(&root, &result, SyntaxKind::NAME, "a"), "sw:float");
        assert_eq!(type_of(&root, &result, SyntaxKind::NAME, "b"), "sw:false");
        assert_eq!(type_of(&root, &result, SyntaxKind::NAME, "c"), "sw:false");
        assert_eq!(type_of(&root, &result, SyntaxKind::ASSIGNMENT_EXPR, "d +<< 1"), "sw:integer");
    }

    #[test]
    fn loops_bind_iterator_results() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_block\n  _for e _over {1, 2}.fast_elements()\n  _loop\n    >> e\n  _endloop\n_endblock\n";
        let (root, result) = analyze(source, &keeper);
        assert_eq!(type_of(&root, &result, SyntaxKind::NAME, "e"), "sw:integer");
    }

    #[test]
    fn undefined_receivers_consider_every_method_of_that_name() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_block\n  >> unknown.size\n_endblock\n";
        let (root, result) = analyze(source, &keeper);
        assert_eq!(
            type_of(&root, &result, SyntaxKind::METHOD_INVOCATION, "unknown.size"),
            "sw:integer"
        );
        let (root, result) = analyze("_block\n  >> unknown.no_such_method\n_endblock\n", &keeper);
        assert_eq!(
            type_of(&root, &result, SyntaxKind::METHOD_INVOCATION, "unknown.no_such_method"),
            "UNDEFINED"
        );
    }

    #[test]
    fn unset_tests_narrow_branches() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_block\n  _local x\n  _if cond _then x << 1 _endif\n  _if x _isnt _unset\n  _then a << x\n  _else b << x\n  _endif\n  _if _not (x _is _unset) _then c << x _endif\n  _if x _isnt _unset _andif cond _then d << x _endif\n  _if x _is _unset _orif cond _then g << 0 _else e << x _endif\n  f << x\n_endblock\n";
        let (root, result) = analyze(source, &keeper);
        let assigned = |text: &str| type_of(&root, &result, SyntaxKind::ASSIGNMENT_EXPR, text);
        assert_eq!(assigned("a << x"), "sw:integer");
        assert_eq!(assigned("b << x"), "sw:unset");
        assert_eq!(assigned("c << x"), "sw:integer");
        assert_eq!(assigned("d << x"), "sw:integer");
        assert_eq!(assigned("e << x"), "sw:integer");
        assert_eq!(assigned("f << x"), "sw:integer|sw:unset");
    }

    #[test]
    fn kind_tests_narrow_branches() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_block\n  _local x << 1\n  _if cond _then x << \"s\" _endif\n  _if x.is_kind_of?(integer)\n  _then a << x\n  _elif x.is_kind_of?(char16_vector)\n  _then b << x\n  _endif\n  _if x.is_kind_of?(float) _then c << x _else d << x _endif\n_endblock\n";
        let (root, result) = analyze(source, &keeper);
        let assigned = |text: &str| type_of(&root, &result, SyntaxKind::ASSIGNMENT_EXPR, text);
        assert_eq!(assigned("a << x"), "sw:integer");
        assert_eq!(assigned("b << x"), "sw:char16_vector");
        assert_eq!(assigned("c << x"), "sw:float");
        assert_eq!(assigned("d << x"), "sw:char16_vector|sw:integer");
    }

    #[test]
    fn broken_methods_do_not_stop_the_walk() {
        let keeper = DefinitionKeeper::with_builtins();
        let source = "_method a.(\n_endmethod\n$\n_method a.ok() _local b << 2 _endmethod";
        let (root, result) = analyze(source, &keeper);
        assert_eq!(type_of(&root, &result, SyntaxKind::NAME, "b"), "sw:integer");
    }
}
