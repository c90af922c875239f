//! Definition reader: source file to definition records.
//!
//! Walks the top level of a parsed file (and the bodies of `_block`s) and
//! recognizes the definition forms:
//!
//! - `_package name` switches the current package
//! - `_method owner.name(...)`
//! - `def_slotted_exemplar`, `def_indexed_exemplar`, `def_mixin`
//! - `def_enumeration(:name, ...)` and `def_enumeration_from`
//! - `condition.define_condition(:name, :parent, {:data})`
//! - `def_package(:name, :uses, {...})`
//! - `_global name << value`, with `_proc` values also read as procedures
//! - `rope.define_slot_access(:slot, :read|:write, :public)` and the
//!   `define_slot_externally_readable`/`_writable` shorthands, which
//!   generate accessor methods
//! - `rope.define_shared_constant(:name, value, :private)` and
//!   `rope.define_shared_variable(:name, value, :public)`
//! - `define_binary_operator_case(:|+|, lhs, rhs, _proc ... _endproc)`
//!
//! Types come from `##` type docs. A form too broken to read is skipped
//! with a debug log; the rest of the file is still read.

use std::collections::BTreeSet;
use std::path::Path;

use magik_common::span::{Location, Span};
use magik_parser::ast::expr::{ArgList, Expr, MethodInvocation, ProcedureInvocation};
use magik_parser::ast::item::{MethodDefinition as MethodNode, Param, ParamModifier, ProcExpr};
use magik_parser::ast::stmt::{DeclKind, VariableDecl};
use magik_parser::ast::AstNode;
use magik_parser::{Parse, SyntaxKind, SyntaxNode};
use tracing::debug;

use crate::definitions::{
    BinaryOperatorDefinition, ConditionDefinition, Definition, ExemplarDefinition, ExemplarSort,
    GlobalDefinition, MethodDefinition, MethodModifier, PackageDefinition, ParameterDefinition,
    ParameterModifier, ProcedureDefinition, SlotDefinition,
};
use crate::reasoner::literal_type;
use crate::result_string::ExpressionResultString;
use crate::type_doc::TypeDoc;
use crate::type_string::{TypeString, SW_PACKAGE, USER_PACKAGE};

/// Read every definition in `parse`, located in `path`.
pub fn read_definitions(parse: &Parse, path: &Path) -> Vec<Definition> {
    let mut reader = DefinitionReader {
        path,
        package: USER_PACKAGE.to_string(),
        definitions: Vec::new(),
    };
    reader.read_statements(parse.syntax().children());
    reader.definitions
}

struct DefinitionReader<'a> {
    path: &'a Path,
    package: String,
    definitions: Vec<Definition>,
}

impl DefinitionReader<'_> {
    fn location(&self, node: &SyntaxNode) -> Option<Location> {
        let range = node.text_range();
        Some(Location::new(
            self.path,
            Span::new(range.start().into(), range.end().into()),
        ))
    }

    fn read_statements(&mut self, nodes: impl Iterator<Item = SyntaxNode>) {
        for node in nodes {
            self.read_statement(&node);
        }
    }

    fn read_statement(&mut self, node: &SyntaxNode) {
        match node.kind() {
            SyntaxKind::PACKAGE_SPEC => {
                if let Some(name) = magik_parser::ast::item::PackageSpec::cast(node.clone())
                    .and_then(|p| p.name())
                {
                    self.package = name;
                }
            }
            SyntaxKind::METHOD_DEFINITION => {
                if let Some(method) = MethodNode::cast(node.clone()) {
                    self.read_method(&method);
                }
            }
            SyntaxKind::VARIABLE_DECL => {
                if let Some(decl) = VariableDecl::cast(node.clone()) {
                    if decl.kind() == DeclKind::Global {
                        self.read_global(&decl);
                    }
                }
            }
            SyntaxKind::PROCEDURE_INVOCATION => {
                if let Some(call) = ProcedureInvocation::cast(node.clone()) {
                    self.read_call(&call);
                }
            }
            SyntaxKind::METHOD_INVOCATION => {
                if let Some(call) = MethodInvocation::cast(node.clone()) {
                    self.read_invocation(&call);
                }
            }
            SyntaxKind::BLOCK_EXPR => {
                if let Some(body) = node.children().find(|n| n.kind() == SyntaxKind::BODY) {
                    self.read_statements(body.children());
                }
            }
            _ => {}
        }
    }

    // ── Methods ────────────────────────────────────────────────────────

    fn read_method(&mut self, method: &MethodNode) {
        let node = method.syntax();
        let (Some(exemplar), Some(signature)) = (method.exemplar_name(), method.signature()) else {
            debug!(range = ?node.text_range(), "skipping method without a readable name");
            return;
        };
        let doc = TypeDoc::for_definition(node, &self.package);
        let owner = TypeString::qualified(&exemplar, &self.package);

        let mut definition = MethodDefinition::new(owner, signature);
        definition.location = self.location(node);
        definition.package = self.package.clone();
        if method.is_abstract() {
            definition.modifiers.insert(MethodModifier::Abstract);
        }
        if method.is_iter() {
            definition.modifiers.insert(MethodModifier::Iter);
        }
        if method.is_private() {
            definition.modifiers.insert(MethodModifier::Private);
        }
        definition.parameters = self.read_parameters(method.parameters(), &doc);
        definition.assignment_parameter = method
            .assignment_param()
            .and_then(|a| a.param())
            .and_then(|p| self.read_parameter(&p, ParamModifier::None, &doc));
        definition.return_types = doc
            .return_types()
            .unwrap_or_else(|| scanned_results(node));
        definition.loop_types = doc
            .loop_types()
            .unwrap_or_else(|| scanned_loop_results(node, method.is_iter()));
        definition.doc = doc.description();
        self.definitions.push(definition.into());
    }

    fn read_parameters(
        &self,
        params: Vec<(Param, ParamModifier)>,
        doc: &TypeDoc,
    ) -> Vec<ParameterDefinition> {
        params
            .iter()
            .filter_map(|(param, modifier)| self.read_parameter(param, *modifier, doc))
            .collect()
    }

    fn read_parameter(
        &self,
        param: &Param,
        modifier: ParamModifier,
        doc: &TypeDoc,
    ) -> Option<ParameterDefinition> {
        let name = param.name()?;
        let text = name.text()?;
        let modifier = match modifier {
            ParamModifier::None => ParameterModifier::None,
            ParamModifier::Optional => ParameterModifier::Optional,
            ParamModifier::Gather => ParameterModifier::Gather,
        };
        let type_string = doc.param(&text).cloned().unwrap_or(TypeString::Undefined);
        let mut definition = ParameterDefinition::new(text, modifier, type_string);
        definition.location = self.location(name.syntax());
        Some(definition)
    }

    // ── Exemplars and packages ─────────────────────────────────────────

    fn read_call(&mut self, call: &ProcedureInvocation) {
        let Some(Expr::NameRef(callee)) = call.callee() else { return };
        let Some(callee) = callee.text() else { return };
        let args = arguments(call.arg_list());
        let bare = callee.rsplit(':').next().unwrap_or(&callee);
        match bare {
            "def_slotted_exemplar" => self.read_exemplar(call.syntax(), ExemplarSort::Slotted, &args),
            "def_indexed_exemplar" => self.read_exemplar(call.syntax(), ExemplarSort::Indexed, &args),
            "def_mixin" => self.read_exemplar(call.syntax(), ExemplarSort::Mixin, &args),
            "def_enumeration" | "def_enumeration_from" => self.read_enumeration(call.syntax(), &args),
            "def_package" => self.read_package(call.syntax(), &args),
            "define_binary_operator_case" => self.read_binary_operator(call.syntax(), &args),
            _ => {}
        }
    }

    fn read_exemplar(&mut self, node: &SyntaxNode, sort: ExemplarSort, args: &[Expr]) {
        let Some(name) = args.first().and_then(symbol_name) else {
            debug!(range = ?node.text_range(), "skipping exemplar without a name");
            return;
        };
        let doc = TypeDoc::for_statement(node, &self.package);
        let type_string = TypeString::qualified(&name, &self.package);
        let parents_at = match sort {
            ExemplarSort::Mixin => 1,
            _ => 2,
        };
        let parents = args
            .get(parents_at)
            .map(|arg| {
                symbol_names(arg)
                    .iter()
                    .map(|p| TypeString::qualified(p, &self.package))
                    .collect()
            })
            .unwrap_or_default();
        let slots = match (sort, args.get(1)) {
            (ExemplarSort::Slotted, Some(Expr::SimpleVector(slots))) => slots
                .elements()
                .filter_map(|slot| self.read_slot(&slot, &doc))
                .collect(),
            _ => Vec::new(),
        };
        match ExemplarDefinition::new(type_string, sort, self.location(node)) {
            Ok(exemplar) => self.definitions.push(
                exemplar
                    .with_slots(slots)
                    .with_parents(parents)
                    .with_generics(doc.generics.clone())
                    .with_doc(doc.description())
                    .into(),
            ),
            Err(err) => debug!(%err, "skipping exemplar"),
        }
    }

    /// `{:name, initial_value, ...}`
    fn read_slot(&self, slot: &Expr, doc: &TypeDoc) -> Option<SlotDefinition> {
        let Expr::SimpleVector(vector) = slot else { return None };
        let name = vector.elements().next().as_ref().and_then(symbol_name)?;
        Some(SlotDefinition {
            location: self.location(slot.syntax()),
            type_string: doc.slot(&name).cloned().unwrap_or(TypeString::Undefined),
            name,
        })
    }

    /// `def_enumeration(:colour, _false, :red, :green)`: a slotted
    /// exemplar inheriting from `sw:enumeration_value`.
    fn read_enumeration(&mut self, node: &SyntaxNode, args: &[Expr]) {
        let Some(name) = args.first().and_then(symbol_name) else {
            debug!(range = ?node.text_range(), "skipping enumeration without a name");
            return;
        };
        let doc = TypeDoc::for_statement(node, &self.package);
        let type_string = TypeString::qualified(&name, &self.package);
        match ExemplarDefinition::new(type_string, ExemplarSort::Slotted, self.location(node)) {
            Ok(exemplar) => self.definitions.push(
                exemplar
                    .with_parents(vec![TypeString::enumeration_value()])
                    .with_doc(doc.description())
                    .into(),
            ),
            Err(err) => debug!(%err, "skipping enumeration"),
        }
    }

    /// `def_package(:name, :uses, {:sw, :other})`
    fn read_package(&mut self, node: &SyntaxNode, args: &[Expr]) {
        let Some(name) = args.first().and_then(symbol_name) else {
            debug!(range = ?node.text_range(), "skipping package without a name");
            return;
        };
        let mut uses = vec![SW_PACKAGE.to_string()];
        for pair in args[1..].chunks(2) {
            if let [key, value] = pair {
                if symbol_name(key).as_deref() == Some("uses") {
                    uses = symbol_names(value);
                }
            }
        }
        self.definitions.push(
            PackageDefinition {
                location: self.location(node),
                name,
                uses,
            }
            .into(),
        );
    }

    // ── Conditions and generated methods ───────────────────────────────

    /// `receiver.define_...(...)` forms. The receiver names the exemplar
    /// the generated methods belong to.
    fn read_invocation(&mut self, call: &MethodInvocation) {
        let (Some(name), Some(Expr::NameRef(receiver))) = (call.name(), call.receiver()) else {
            return;
        };
        let Some(receiver) = receiver.text() else { return };
        let args = arguments(call.arg_list());
        let node = call.syntax();
        match name.as_str() {
            "define_condition" if matches!(receiver.as_str(), "condition" | "sw:condition") => {
                self.read_condition(call, &args)
            }
            "define_slot_access" => match args.get(1).and_then(symbol_name) {
                Some(access) => {
                    let flavour = args.get(2).and_then(symbol_name);
                    self.read_slot_access(node, &receiver, &args, &access, flavour.as_deref())
                }
                None => debug!(range = ?node.text_range(), "skipping slot access without a flag"),
            },
            "define_slot_externally_readable" => {
                let flavour = externally_flavour(args.get(1));
                self.read_slot_access(node, &receiver, &args, "readable", flavour)
            }
            "define_slot_externally_writable" => {
                let flavour = externally_flavour(args.get(1));
                self.read_slot_access(node, &receiver, &args, "writable", flavour)
            }
            "define_shared_constant" => self.read_shared_constant(node, &receiver, &args),
            "define_shared_variable" => self.read_shared_variable(node, &receiver, &args),
            _ => {}
        }
    }

    /// `condition.define_condition(:name, :parent, {:data, ...})`
    fn read_condition(&mut self, call: &MethodInvocation, args: &[Expr]) {
        let Some(name) = args.first().and_then(symbol_name) else {
            debug!(range = ?call.syntax().text_range(), "skipping condition without a name");
            return;
        };
        let doc = TypeDoc::for_statement(call.syntax(), &self.package);
        self.definitions.push(
            ConditionDefinition {
                location: self.location(call.syntax()),
                package: self.package.clone(),
                name,
                parent: args.get(1).and_then(symbol_name),
                data_names: args.get(2).map(symbol_names).unwrap_or_default(),
                doc: doc.description(),
            }
            .into(),
        );
    }

    // ── Slot access, shared constants and variables ────────────────────

    /// Getter `slot`, and for writable slots the setters `slot<<` and
    /// `slot^<<`. `access` is `read`/`readable` or `write`/`writable`;
    /// `flavour` defaults to `public`.
    fn read_slot_access(
        &mut self,
        node: &SyntaxNode,
        receiver: &str,
        args: &[Expr],
        access: &str,
        flavour: Option<&str>,
    ) {
        let Some(slot) = args.first().and_then(symbol_name) else {
            debug!(range = ?node.text_range(), "skipping slot access without a slot name");
            return;
        };
        let owner = TypeString::qualified(receiver, &self.package);
        let doc = TypeDoc::for_statement(node, &self.package);
        let slot_type = doc
            .slot(&slot)
            .or_else(|| doc.returns.first())
            .cloned()
            .or_else(|| self.declared_slot_type(&owner, &slot))
            .unwrap_or(TypeString::Undefined);
        let flavour = flavour.unwrap_or("public");
        let accessors = match access {
            "read" | "readable" => vec![(slot.clone(), flavour != "public")],
            "write" | "writable" => {
                let private_set = flavour != "public";
                vec![
                    (slot.clone(), !matches!(flavour, "public" | "read_only")),
                    (format!("{slot}<<"), private_set),
                    (format!("{slot}^<<"), private_set),
                ]
            }
            other => {
                debug!(access = other, "skipping slot access with an unknown flag");
                return;
            }
        };
        for (signature, private) in accessors {
            let accessor = self.accessor(node, &owner, signature, private, &doc, &slot_type);
            self.definitions.push(accessor.into());
        }
    }

    /// `rope.define_shared_constant(:name, value, :private)`. The flavour
    /// may also be `_true` (private) or `_false`.
    fn read_shared_constant(&mut self, node: &SyntaxNode, receiver: &str, args: &[Expr]) {
        let Some(name) = args.first().and_then(symbol_name) else {
            debug!(range = ?node.text_range(), "skipping shared constant without a name");
            return;
        };
        let owner = TypeString::qualified(receiver, &self.package);
        let doc = TypeDoc::for_statement(node, &self.package);
        let value_type = shared_value_type(&doc, args.get(1));
        let private = match args.get(2) {
            Some(Expr::Literal(literal)) => literal.token().is_some_and(|t| {
                t.kind() == SyntaxKind::TRUE_KW
                    || (t.kind() == SyntaxKind::SYMBOL && t.text() == ":private")
            }),
            _ => false,
        };
        let constant = self.accessor(node, &owner, name, private, &doc, &value_type);
        self.definitions.push(constant.into());
    }

    /// `rope.define_shared_variable(:name, value, :public|:readonly|:private)`:
    /// a getter and a `name<<` setter.
    fn read_shared_variable(&mut self, node: &SyntaxNode, receiver: &str, args: &[Expr]) {
        let Some(name) = args.first().and_then(symbol_name) else {
            debug!(range = ?node.text_range(), "skipping shared variable without a name");
            return;
        };
        let owner = TypeString::qualified(receiver, &self.package);
        let doc = TypeDoc::for_statement(node, &self.package);
        let value_type = shared_value_type(&doc, args.get(1));
        let flavour = args.get(2).and_then(symbol_name).unwrap_or_else(|| "private".to_string());
        let getter_private = !matches!(flavour.as_str(), "public" | "readonly");
        let getter = self.accessor(node, &owner, name.clone(), getter_private, &doc, &value_type);
        let setter = self.accessor(node, &owner, format!("{name}<<"), flavour != "public", &doc, &value_type);
        self.definitions.push(getter.into());
        self.definitions.push(setter.into());
    }

    /// A generated method. Setters (signatures ending in `<<`) take the
    /// new value as `val` and answer it; getters answer `value_type`.
    fn accessor(
        &self,
        node: &SyntaxNode,
        owner: &TypeString,
        signature: String,
        private: bool,
        doc: &TypeDoc,
        value_type: &TypeString,
    ) -> MethodDefinition {
        let is_setter = signature.ends_with("<<");
        let mut method = MethodDefinition::new(owner.clone(), signature);
        method.location = self.location(node);
        method.package = self.package.clone();
        if private {
            method.modifiers.insert(MethodModifier::Private);
        }
        method.return_types = if is_setter {
            method.assignment_parameter = Some(ParameterDefinition::new(
                "val",
                ParameterModifier::None,
                value_type.clone(),
            ));
            ExpressionResultString::single(TypeString::ParameterReference("val".into()))
        } else if value_type.is_undefined() {
            ExpressionResultString::UNDEFINED
        } else {
            ExpressionResultString::single(value_type.clone())
        };
        method.doc = doc.description();
        method
    }

    /// Type of `slot` on an exemplar read earlier from this file.
    fn declared_slot_type(&self, owner: &TypeString, slot: &str) -> Option<TypeString> {
        self.definitions.iter().rev().find_map(|d| match d {
            Definition::Exemplar(e) if &e.type_string == owner => {
                e.slot(slot).map(|s| s.type_string.clone())
            }
            _ => None,
        })
    }

    // ── Binary operators ───────────────────────────────────────────────

    /// `define_binary_operator_case(:|+|, lhs, rhs, _proc(a, b) ... _endproc)`.
    /// The result type is the procedure's documented `@return`.
    fn read_binary_operator(&mut self, node: &SyntaxNode, args: &[Expr]) {
        let operator = args.first().and_then(symbol_name);
        let operand = |arg: Option<&Expr>| match arg {
            Some(Expr::NameRef(name)) => name.text(),
            _ => None,
        };
        let (Some(operator), Some(lhs), Some(rhs)) =
            (operator, operand(args.get(1)), operand(args.get(2)))
        else {
            debug!(range = ?node.text_range(), "skipping unreadable binary operator case");
            return;
        };
        let result = match args.get(3) {
            Some(Expr::ProcExpr(proc_expr)) => TypeDoc::for_definition(proc_expr.syntax(), &self.package)
                .returns
                .first()
                .cloned()
                .unwrap_or(TypeString::Undefined),
            _ => TypeString::Undefined,
        };
        let mut definition = BinaryOperatorDefinition::new(
            &operator,
            TypeString::qualified(&lhs, &self.package),
            TypeString::qualified(&rhs, &self.package),
            result,
        );
        definition.location = self.location(node);
        definition.package = self.package.clone();
        self.definitions.push(definition.into());
    }

    // ── Globals and procedures ─────────────────────────────────────────

    fn read_global(&mut self, decl: &VariableDecl) {
        for item in decl.items() {
            let Some(name) = item.names().next().and_then(|n| n.text()) else { continue };
            let type_string = TypeString::qualified(&name, &self.package);
            let value = item.value();
            let alias = match &value {
                Some(Expr::ProcExpr(proc_expr)) => {
                    self.read_procedure(proc_expr, &type_string);
                    TypeString::procedure()
                }
                Some(Expr::Literal(literal)) => literal
                    .token()
                    .map(|t| literal_type(&t))
                    .unwrap_or(TypeString::Undefined),
                Some(Expr::NameRef(name_ref)) => name_ref
                    .text()
                    .map(|n| TypeString::qualified(&n, &self.package))
                    .unwrap_or(TypeString::Undefined),
                _ => TypeString::Undefined,
            };
            self.definitions.push(
                GlobalDefinition {
                    location: self.location(decl.syntax()),
                    package: self.package.clone(),
                    type_string,
                    alias,
                }
                .into(),
            );
        }
    }

    fn read_procedure(&mut self, proc_expr: &ProcExpr, global: &TypeString) {
        let node = proc_expr.syntax();
        let doc = TypeDoc::for_definition(node, &self.package);
        let is_iter = node
            .children_with_tokens()
            .any(|it| it.kind() == SyntaxKind::ITER_KW);
        let mut modifiers = BTreeSet::new();
        if is_iter {
            modifiers.insert(MethodModifier::Iter);
        }
        let definition = ProcedureDefinition {
            location: self.location(node),
            package: self.package.clone(),
            type_string: global.clone(),
            label: proc_expr.label(),
            modifiers,
            parameters: self.read_parameters(proc_expr.parameters(), &doc),
            return_types: doc.return_types().unwrap_or_else(|| scanned_results(node)),
            loop_types: doc
                .loop_types()
                .unwrap_or_else(|| scanned_loop_results(node, is_iter)),
            doc: doc.description(),
        };
        self.definitions.push(definition.into());
    }
}

// ── Helpers ────────────────────────────────────────────────────────────

/// The construct a `>>` emits to: the nearest enclosing block-like
/// expression or definition.
pub(crate) fn emit_target(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.ancestors().skip(1).find(|n| {
        matches!(
            n.kind(),
            SyntaxKind::METHOD_DEFINITION
                | SyntaxKind::PROC_EXPR
                | SyntaxKind::BLOCK_EXPR
                | SyntaxKind::IF_EXPR
                | SyntaxKind::TRY_EXPR
                | SyntaxKind::PROTECT_EXPR
        )
    })
}

fn enclosing_definition(node: &SyntaxNode) -> Option<SyntaxNode> {
    node.ancestors()
        .skip(1)
        .find(|n| matches!(n.kind(), SyntaxKind::METHOD_DEFINITION | SyntaxKind::PROC_EXPR))
}

/// Results of an undocumented definition: none when nothing returns from
/// it, unknown otherwise.
fn scanned_results(definition: &SyntaxNode) -> ExpressionResultString {
    let returns = definition.descendants().any(|n| match n.kind() {
        SyntaxKind::RETURN_STMT => enclosing_definition(&n).as_ref() == Some(definition),
        SyntaxKind::EMIT_STMT => emit_target(&n).as_ref() == Some(definition),
        _ => false,
    });
    if returns {
        ExpressionResultString::UNDEFINED
    } else {
        ExpressionResultString::EMPTY
    }
}

fn scanned_loop_results(definition: &SyntaxNode, is_iter: bool) -> ExpressionResultString {
    let loops = is_iter
        && definition.descendants().any(|n| {
            n.kind() == SyntaxKind::LOOPBODY_STMT
                && enclosing_definition(&n).as_ref() == Some(definition)
        });
    if loops {
        ExpressionResultString::UNDEFINED
    } else {
        ExpressionResultString::EMPTY
    }
}

fn arguments(list: Option<ArgList>) -> Vec<Expr> {
    list.map(|list| list.args().collect()).unwrap_or_default()
}

/// Flavour of `define_slot_externally_*(:slot, private?)`: `_true` or a
/// non-public symbol make the accessors private.
fn externally_flavour(arg: Option<&Expr>) -> Option<&'static str> {
    let Some(Expr::Literal(literal)) = arg else { return None };
    let token = literal.token()?;
    match token.kind() {
        SyntaxKind::TRUE_KW => Some("private"),
        SyntaxKind::SYMBOL if token.text() != ":public" => Some("private"),
        _ => None,
    }
}

/// Documented `@return` type of a shared constant or variable, else the
/// type of a literal initial value.
fn shared_value_type(doc: &TypeDoc, value: Option<&Expr>) -> TypeString {
    if let Some(ts) = doc.returns.first() {
        return ts.clone();
    }
    match value {
        Some(Expr::Literal(literal)) => literal
            .token()
            .map(|t| literal_type(&t))
            .unwrap_or(TypeString::Undefined),
        _ => TypeString::Undefined,
    }
}

/// `:name` or `:|odd name|` without the colon and bars.
fn symbol_name(expr: &Expr) -> Option<String> {
    let Expr::Literal(literal) = expr else { return None };
    let token = literal.token()?;
    if token.kind() != SyntaxKind::SYMBOL {
        return None;
    }
    Some(token.text().trim_start_matches(':').replace('|', ""))
}

/// A symbol or a vector of symbols; `_unset` and anything else give none.
fn symbol_names(expr: &Expr) -> Vec<String> {
    match expr {
        Expr::SimpleVector(vector) => vector.elements().filter_map(|e| symbol_name(&e)).collect(),
        other => symbol_name(other).into_iter().collect(),
    }
}
