//! Lexical scopes of a Magik source file.
//!
//! [`ScopeTree::build`] walks the CST once and records every scope (file,
//! method, procedure, block, branch, loop, try, protect) in an arena, with
//! the variables each scope introduces. Entries remember the range of
//! their declaring node and every range that refers to them.
//!
//! Magik has no block scoping for assignments: a name assigned without a
//! declaration becomes a definition of the nearest method, procedure or
//! file scope, so it stays visible after the branch that assigned it.
//! Reading a name nothing declares refers to a global.

use magik_parser::ast::expr::{Expr, IfExpr, LoopExpr, ProtectExpr, TryExpr};
use magik_parser::ast::item::{Body, MethodDefinition, Param, ParamModifier, ProcExpr, SourceFile};
use magik_parser::ast::stmt::{DeclKind, VariableDecl};
use magik_parser::ast::{AstNode, Name};
use magik_parser::{SyntaxKind, SyntaxNode};
use rowan::{TextRange, TextSize};
use rustc_hash::FxHashMap;

/// Index of a scope in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// Index of an entry in a [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    /// The file itself.
    Global,
    Method,
    Procedure,
    Block,
    /// One branch of an `_if`/`_elif`/`_else`.
    If,
    Loop,
    /// A `_try` or one of its `_when` handlers.
    Try,
    /// A `_protect` body or its `_protection` clause.
    Protect,
}

impl ScopeKind {
    /// Scopes that own undeclared assignments.
    pub fn is_definition_scope(self) -> bool {
        matches!(self, ScopeKind::Global | ScopeKind::Method | ScopeKind::Procedure)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Local,
    Parameter,
    Import,
    Constant,
    Dynamic,
    Recursive,
    /// Introduced by assignment without a declaration.
    Definition,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeEntry {
    pub kind: EntryKind,
    pub name: String,
    /// Range of the declaring node: the `VARIABLE_DECL` for declarations,
    /// the parameter name for parameters, the first reference otherwise.
    pub declaration: TextRange,
    /// Every later reference, in source order.
    pub usages: Vec<TextRange>,
    /// For `_import`: the entry being imported.
    pub imported: Option<EntryId>,
    pub scope: ScopeId,
    /// The `_optional`/`_gather` modifier of a parameter.
    pub modifier: Option<ParamModifier>,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub range: TextRange,
    pub parent: Option<ScopeId>,
    pub children: Vec<ScopeId>,
    entries: FxHashMap<String, EntryId>,
}

impl Scope {
    /// The entry this scope itself declares for `name`.
    pub fn entry(&self, name: &str) -> Option<EntryId> {
        self.entries.get(name).copied()
    }

    /// Entries declared in this scope, in declaration order.
    pub fn entries(&self) -> Vec<EntryId> {
        let mut ids: Vec<EntryId> = self.entries.values().copied().collect();
        ids.sort();
        ids
    }
}

/// All scopes and entries of one file.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    entries: Vec<ScopeEntry>,
    /// Scope ranges sorted by start, longest first on ties.
    index: Vec<(TextRange, ScopeId)>,
    /// `NAME`/`NAME_REF` node range to the entry it denotes.
    references: FxHashMap<TextRange, EntryId>,
}

impl ScopeTree {
    /// Build the scope tree of `file`. Broken subtrees contribute whatever
    /// they still contain.
    pub fn build(file: &SourceFile) -> ScopeTree {
        let root = file.syntax();
        let mut builder = ScopeBuilder {
            tree: ScopeTree {
                scopes: Vec::new(),
                entries: Vec::new(),
                index: Vec::new(),
                references: FxHashMap::default(),
            },
            current: ScopeId(0),
        };
        builder.push_scope(ScopeKind::Global, root.text_range());
        for node in root.children() {
            builder.visit(&node);
        }
        let mut tree = builder.tree;
        tree.index = tree
            .scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (s.range, ScopeId(i as u32)))
            .collect();
        tree.index
            .sort_by(|(a, _), (b, _)| a.start().cmp(&b.start()).then(b.end().cmp(&a.end())));
        tree
    }

    pub fn root(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    pub fn entry(&self, id: EntryId) -> &ScopeEntry {
        &self.entries[id.0 as usize]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> + '_ {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, s)| (ScopeId(i as u32), s))
    }

    pub fn entries(&self) -> impl Iterator<Item = (EntryId, &ScopeEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (EntryId(i as u32), e))
    }

    /// The innermost scope containing `offset`; the file scope when no
    /// other scope does.
    ///
    /// Scopes nest, so the innermost one is an ancestor of (or is) the last
    /// scope starting at or before `offset`.
    pub fn scope_for_offset(&self, offset: TextSize) -> ScopeId {
        let upper = self.index.partition_point(|(range, _)| range.start() <= offset);
        let mut current = upper
            .checked_sub(1)
            .and_then(|i| self.index.get(i))
            .map(|(_, id)| *id);
        while let Some(id) = current {
            let scope = self.scope(id);
            if scope.range.contains_inclusive(offset) {
                return id;
            }
            current = scope.parent;
        }
        self.root()
    }

    /// Resolve `name` from `scope` outward.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<EntryId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = self.scope(id);
            if let Some(entry) = scope.entry(name) {
                return Some(entry);
            }
            current = scope.parent;
        }
        None
    }

    /// The entry a `NAME` or `NAME_REF` node denotes.
    pub fn reference(&self, range: TextRange) -> Option<EntryId> {
        self.references.get(&range).copied()
    }

    /// The nearest enclosing method, procedure or file scope.
    pub fn definition_scope(&self, scope: ScopeId) -> ScopeId {
        let mut id = scope;
        loop {
            let s = self.scope(id);
            if s.kind.is_definition_scope() {
                return id;
            }
            match s.parent {
                Some(parent) => id = parent,
                None => return id,
            }
        }
    }
}

// ── Builder ────────────────────────────────────────────────────────────

struct ScopeBuilder {
    tree: ScopeTree,
    current: ScopeId,
}

impl ScopeBuilder {
    fn push_scope(&mut self, kind: ScopeKind, range: TextRange) -> ScopeId {
        let id = ScopeId(self.tree.scopes.len() as u32);
        let parent = if self.tree.scopes.is_empty() {
            None
        } else {
            Some(self.current)
        };
        self.tree.scopes.push(Scope {
            kind,
            range,
            parent,
            children: Vec::new(),
            entries: FxHashMap::default(),
        });
        if let Some(parent) = parent {
            self.tree.scopes[parent.0 as usize].children.push(id);
        }
        self.current = id;
        id
    }

    fn pop_scope(&mut self) {
        if let Some(parent) = self.tree.scope(self.current).parent {
            self.current = parent;
        }
    }

    fn with_scope(&mut self, kind: ScopeKind, range: TextRange, f: impl FnOnce(&mut Self)) {
        let saved = self.current;
        self.push_scope(kind, range);
        f(self);
        self.pop_scope();
        self.current = saved;
    }

    /// Declare `name` in `scope` unless that scope already has it.
    fn declare(
        &mut self,
        scope: ScopeId,
        kind: EntryKind,
        name: String,
        declaration: TextRange,
    ) -> EntryId {
        if let Some(existing) = self.tree.scope(scope).entry(&name) {
            return existing;
        }
        let id = EntryId(self.tree.entries.len() as u32);
        self.tree.entries.push(ScopeEntry {
            kind,
            name: name.clone(),
            declaration,
            usages: Vec::new(),
            imported: None,
            scope,
            modifier: None,
        });
        self.tree.scopes[scope.0 as usize].entries.insert(name, id);
        id
    }

    fn refer(&mut self, range: TextRange, entry: EntryId) {
        self.tree.references.insert(range, entry);
        let entry = &mut self.tree.entries[entry.0 as usize];
        if entry.declaration != range {
            entry.usages.push(range);
        }
    }

    fn declare_name(&mut self, name: &Name, kind: EntryKind, declaration: TextRange) -> Option<EntryId> {
        let text = name.text()?;
        let id = self.declare(self.current, kind, text, declaration);
        self.tree.references.insert(name.syntax().text_range(), id);
        Some(id)
    }

    fn declare_params(&mut self, params: Vec<(Param, ParamModifier)>) {
        for (param, modifier) in params {
            let Some(name) = param.name() else { continue };
            let range = name.syntax().text_range();
            if let Some(id) = self.declare_name(&name, EntryKind::Parameter, range) {
                self.tree.entries[id.0 as usize].modifier = Some(modifier);
            }
        }
    }

    fn visit_body(&mut self, body: Option<Body>) {
        if let Some(body) = body {
            for stmt in body.statements() {
                self.visit(&stmt);
            }
        }
    }

    fn visit_children(&mut self, node: &SyntaxNode) {
        for child in node.children() {
            self.visit(&child);
        }
    }

    fn visit(&mut self, node: &SyntaxNode) {
        match node.kind() {
            SyntaxKind::METHOD_DEFINITION => {
                if let Some(method) = MethodDefinition::cast(node.clone()) {
                    self.with_scope(ScopeKind::Method, node.text_range(), |b| {
                        b.declare_params(method.parameters());
                        if let Some(param) = method.assignment_param().and_then(|a| a.param()) {
                            b.declare_params(vec![(param, ParamModifier::None)]);
                        }
                        b.visit_body(method.body());
                    });
                }
            }
            SyntaxKind::PROC_EXPR => {
                if let Some(proc_expr) = ProcExpr::cast(node.clone()) {
                    self.with_scope(ScopeKind::Procedure, node.text_range(), |b| {
                        b.declare_params(proc_expr.parameters());
                        b.visit_body(proc_expr.body());
                    });
                }
            }
            SyntaxKind::BLOCK_EXPR => {
                self.with_scope(ScopeKind::Block, node.text_range(), |b| b.visit_children(node));
            }
            SyntaxKind::IF_EXPR => {
                if let Some(if_expr) = IfExpr::cast(node.clone()) {
                    self.visit_if(&if_expr);
                }
            }
            SyntaxKind::LOOP_EXPR => {
                if let Some(loop_expr) = LoopExpr::cast(node.clone()) {
                    self.visit_loop(&loop_expr);
                }
            }
            SyntaxKind::TRY_EXPR => {
                if let Some(try_expr) = TryExpr::cast(node.clone()) {
                    self.visit_try(&try_expr);
                }
            }
            SyntaxKind::PROTECT_EXPR => {
                if let Some(protect) = ProtectExpr::cast(node.clone()) {
                    self.with_scope(ScopeKind::Protect, node.text_range(), |b| {
                        b.visit_body(protect.body());
                        if let Some(clause) = protect.protection_clause() {
                            b.with_scope(ScopeKind::Protect, clause.syntax().text_range(), |b| {
                                b.visit_body(clause.body())
                            });
                        }
                    });
                }
            }
            SyntaxKind::VARIABLE_DECL => {
                if let Some(decl) = VariableDecl::cast(node.clone()) {
                    self.visit_decl(&decl);
                }
            }
            SyntaxKind::ASSIGNMENT_EXPR => self.visit_assignment(node),
            SyntaxKind::NAME_REF => self.visit_read(node),
            _ => self.visit_children(node),
        }
    }

    fn visit_if(&mut self, if_expr: &IfExpr) {
        if let Some(condition) = if_expr.condition() {
            self.visit(condition.syntax());
        }
        self.visit_branch(if_expr.then_body());
        for elif in if_expr.elif_clauses() {
            if let Some(condition) = elif.condition() {
                self.visit(condition.syntax());
            }
            self.visit_branch(elif.body());
        }
        if let Some(else_clause) = if_expr.else_clause() {
            self.visit_branch(else_clause.body());
        }
    }

    fn visit_branch(&mut self, body: Option<Body>) {
        let Some(body) = body else { return };
        self.with_scope(ScopeKind::If, body.syntax().text_range(), |b| {
            b.visit_body(Some(body.clone()))
        });
    }

    fn visit_loop(&mut self, loop_expr: &LoopExpr) {
        let for_clause = loop_expr.for_clause();
        if let Some(iterable) = for_clause.as_ref().and_then(|f| f.iterable()) {
            self.visit(iterable.syntax());
        }
        if let Some(condition) = loop_expr.while_clause().and_then(|w| w.condition()) {
            self.visit(condition.syntax());
        }
        self.with_scope(ScopeKind::Loop, loop_expr.syntax().text_range(), |b| {
            if let Some(for_clause) = &for_clause {
                for name in for_clause.names() {
                    let range = name.syntax().text_range();
                    b.declare_name(&name, EntryKind::Local, range);
                }
            }
            b.visit_body(loop_expr.body());
            if let Some(finally) = loop_expr.finally_clause() {
                for name in finally.names() {
                    let range = name.syntax().text_range();
                    b.declare_name(&name, EntryKind::Local, range);
                }
                b.visit_body(finally.body());
            }
        });
    }

    fn visit_try(&mut self, try_expr: &TryExpr) {
        self.with_scope(ScopeKind::Try, try_expr.syntax().text_range(), |b| {
            if let Some(name) = try_expr.condition_name() {
                let range = name.syntax().text_range();
                b.declare_name(&name, EntryKind::Local, range);
            }
            b.visit_body(try_expr.body());
            for when in try_expr.when_clauses() {
                b.with_scope(ScopeKind::Try, when.syntax().text_range(), |b| {
                    b.visit_body(when.body())
                });
            }
        });
    }

    fn visit_decl(&mut self, decl: &VariableDecl) {
        let kind = decl.kind();
        let range = decl.syntax().text_range();
        for item in decl.items() {
            if kind != DeclKind::Recursive {
                if let Some(value) = item.value() {
                    self.visit(value.syntax());
                }
            }
            for name in item.names() {
                match kind {
                    DeclKind::Global => {
                        let Some(text) = name.text() else { continue };
                        let root = ScopeId(0);
                        let id = self.declare(root, EntryKind::Global, text, range);
                        self.tree.references.insert(name.syntax().text_range(), id);
                    }
                    DeclKind::Import => {
                        let Some(text) = name.text() else { continue };
                        let imported = self
                            .tree
                            .scope(self.current)
                            .parent
                            .and_then(|parent| self.tree.lookup(parent, &text));
                        if let Some(id) = self.declare_name(&name, EntryKind::Import, range) {
                            self.tree.entries[id.0 as usize].imported = imported;
                        }
                    }
                    DeclKind::Local => {
                        self.declare_name(&name, EntryKind::Local, range);
                    }
                    DeclKind::Constant => {
                        self.declare_name(&name, EntryKind::Constant, range);
                    }
                    DeclKind::Dynamic => {
                        self.declare_name(&name, EntryKind::Dynamic, range);
                    }
                    DeclKind::Recursive => {
                        self.declare_name(&name, EntryKind::Recursive, range);
                    }
                }
            }
            if kind == DeclKind::Recursive {
                if let Some(value) = item.value() {
                    self.visit(value.syntax());
                }
            }
        }
    }

    fn visit_assignment(&mut self, node: &SyntaxNode) {
        let mut exprs = node.children().filter_map(Expr::cast);
        let target = exprs.next();
        if let Some(value) = exprs.next() {
            self.visit(value.syntax());
        }
        match target {
            Some(Expr::NameRef(name_ref)) => self.assign(name_ref.syntax(), node.text_range()),
            Some(Expr::TupleExpr(tuple)) => {
                for element in tuple.elements() {
                    match element {
                        Expr::NameRef(name_ref) => self.assign(name_ref.syntax(), node.text_range()),
                        other => self.visit(other.syntax()),
                    }
                }
            }
            Some(other) => self.visit(other.syntax()),
            None => {}
        }
    }

    fn assign(&mut self, name_ref: &SyntaxNode, assignment: TextRange) {
        let Some(text) = name_text(name_ref) else { return };
        let range = name_ref.text_range();
        match self.tree.lookup(self.current, &text) {
            Some(entry) => self.refer(range, entry),
            None => {
                let scope = self.tree.definition_scope(self.current);
                let id = self.declare(scope, EntryKind::Definition, text, assignment);
                self.tree.references.insert(range, id);
            }
        }
    }

    fn visit_read(&mut self, name_ref: &SyntaxNode) {
        let Some(text) = name_text(name_ref) else { return };
        let range = name_ref.text_range();
        match self.tree.lookup(self.current, &text) {
            Some(entry) => self.refer(range, entry),
            None => {
                let id = self.declare(ScopeId(0), EntryKind::Global, text, range);
                self.tree.references.insert(range, id);
            }
        }
    }
}

fn name_text(node: &SyntaxNode) -> Option<String> {
    node.children_with_tokens()
        .filter_map(|it| it.into_token())
        .find(|t| t.kind() == SyntaxKind::IDENT)
        .map(|t| t.text().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(source: &str) -> ScopeTree {
        ScopeTree::build(&magik_parser::parse(source).tree())
    }

    fn offset(source: &str, needle: &str) -> TextSize {
        TextSize::from(source.find(needle).unwrap() as u32)
    }

    #[test]
    fn method_parameters_and_locals() {
        let source = "_method a.b(p, _optional q)\n  _local x << p\n  >> x\n_endmethod\n";
        let tree = build(source);
        let scope = tree.scope_for_offset(offset(source, "_local"));
        assert_eq!(tree.scope(scope).kind, ScopeKind::Method);
        let p = tree.lookup(scope, "p").unwrap();
        assert_eq!(tree.entry(p).kind, EntryKind::Parameter);
        assert_eq!(tree.entry(p).usages.len(), 1);
        let q = tree.lookup(scope, "q").unwrap();
        assert_eq!(tree.entry(q).modifier, Some(ParamModifier::Optional));
        let x = tree.lookup(scope, "x").unwrap();
        assert_eq!(tree.entry(x).kind, EntryKind::Local);
        assert_eq!(tree.entry(x).usages.len(), 1);
    }

    #[test]
    fn declaration_range_is_the_declaring_statement() {
        let source = "_method a.b\n  _local x << 1\n_endmethod\n";
        let tree = build(source);
        let scope = tree.scope_for_offset(offset(source, "_local"));
        let x = tree.lookup(scope, "x").unwrap();
        let start = offset(source, "_local");
        let end = start + TextSize::from("_local x << 1".len() as u32);
        assert_eq!(tree.entry(x).declaration, TextRange::new(start, end));
    }

    #[test]
    fn assignment_in_branch_defines_in_method() {
        let source = "_method a.b\n  _if _true _then y << 1 _endif\n  _return y\n_endmethod\n";
        let tree = build(source);
        let branch = tree.scope_for_offset(offset(source, "y << 1"));
        assert_eq!(tree.scope(branch).kind, ScopeKind::If);
        assert!(tree.scope(branch).entry("y").is_none());
        let method = tree.scope_for_offset(offset(source, "_return"));
        let y = tree.scope(method).entry("y").unwrap();
        assert_eq!(tree.entry(y).kind, EntryKind::Definition);
        assert_eq!(tree.entry(y).usages.len(), 1);
    }

    #[test]
    fn unknown_reads_are_globals() {
        let source = "_method a.b\n  _return !current_world!\n_endmethod\n";
        let tree = build(source);
        let entry = tree.scope(tree.root()).entry("!current_world!").unwrap();
        assert_eq!(tree.entry(entry).kind, EntryKind::Global);
    }

    #[test]
    fn declarations_never_overwrite() {
        let source = "_method a.b\n  _local x << 1\n  _local x << 2\n_endmethod\n";
        let tree = build(source);
        let scope = tree.scope_for_offset(offset(source, "_local"));
        assert_eq!(tree.scope(scope).entries().len(), 1);
        let x = tree.lookup(scope, "x").unwrap();
        assert_eq!(tree.entry(x).declaration.start(), offset(source, "_local"));
    }

    #[test]
    fn loop_variables_live_in_the_loop() {
        let source = "_method a.b\n  _for e _over _self.elements() _loop\n    _local t << e\n  _endloop\n_endmethod\n";
        let tree = build(source);
        let inner = tree.scope_for_offset(offset(source, "_local t"));
        assert_eq!(tree.scope(inner).kind, ScopeKind::Loop);
        assert!(tree.scope(inner).entry("e").is_some());
        assert!(tree.scope(inner).entry("t").is_some());
        let method = tree.scope(inner).parent.unwrap();
        assert!(tree.lookup(method, "e").is_none());
    }

    #[test]
    fn import_links_to_outer_entry() {
        let source = "_method a.b\n  _local x << 1\n  _proc()\n    _import x\n    _return x\n  _endproc\n_endmethod\n";
        let tree = build(source);
        let proc_scope = tree.scope_for_offset(offset(source, "_import"));
        assert_eq!(tree.scope(proc_scope).kind, ScopeKind::Procedure);
        let imported = tree.lookup(proc_scope, "x").unwrap();
        assert_eq!(tree.entry(imported).kind, EntryKind::Import);
        let outer = tree.entry(imported).imported.unwrap();
        assert_eq!(tree.entry(outer).kind, EntryKind::Local);
    }

    #[test]
    fn offsets_after_a_closed_scope_find_its_parent() {
        let source = "_method a.b\n  _if x _then _local y << 1 _endif\n  _return 1\n_endmethod\n$\n_method c.d\n  _return 2\n_endmethod\n";
        let tree = build(source);
        let after_if = tree.scope_for_offset(offset(source, "_return 1"));
        assert_eq!(tree.scope(after_if).kind, ScopeKind::Method);
        assert!(tree.scope(after_if).entry("y").is_none());
        assert_eq!(tree.scope_for_offset(offset(source, "$")), tree.root());
        let second = tree.scope_for_offset(offset(source, "_return 2"));
        assert_eq!(tree.scope(second).kind, ScopeKind::Method);
        assert_ne!(second, after_if);
    }

    #[test]
    fn offsets_outside_everything_hit_the_file() {
        let source = "_method a.b\n_endmethod\n\n\n";
        let tree = build(source);
        assert_eq!(tree.scope_for_offset(TextSize::from(source.len() as u32)), tree.root());
    }
}
