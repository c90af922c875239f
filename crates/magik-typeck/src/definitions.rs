//! Definition records.
//!
//! Every record is immutable once built and carries an optional source
//! [`Location`] plus the package it was defined in. Records refer to each
//! other only through [`TypeString`] keys (owner, parents) or names, which
//! are resolved through the keeper at query time.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use magik_common::span::Location;

use crate::error::DefinitionError;
use crate::result_string::ExpressionResultString;
use crate::type_string::TypeString;

// ── Exemplars ──────────────────────────────────────────────────────────

/// How an exemplar stores its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExemplarSort {
    Slotted,
    Indexed,
    /// Built into the runtime (`sw:integer`, `sw:char16_vector`, ...).
    Intrinsic,
    Mixin,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SlotDefinition {
    pub location: Option<Location>,
    pub name: String,
    pub type_string: TypeString,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExemplarDefinition {
    pub location: Option<Location>,
    pub package: String,
    pub type_string: TypeString,
    pub sort: ExemplarSort,
    pub slots: Vec<SlotDefinition>,
    pub parents: Vec<TypeString>,
    /// Generic parameter names declared with `## @generic`.
    pub generics: Vec<String>,
    pub doc: Option<String>,
}

impl ExemplarDefinition {
    /// A new exemplar. The identity must be a simple type without bindings.
    pub fn new(
        type_string: TypeString,
        sort: ExemplarSort,
        location: Option<Location>,
    ) -> Result<Self, DefinitionError> {
        if !type_string.is_simple() && !type_string.is_unset() {
            return Err(DefinitionError::NotAnExemplarName(type_string));
        }
        if !type_string.generics().is_empty() {
            return Err(DefinitionError::GenericIdentity(type_string));
        }
        Ok(Self {
            location,
            package: type_string.package().unwrap_or_default().to_string(),
            type_string,
            sort,
            slots: Vec::new(),
            parents: Vec::new(),
            generics: Vec::new(),
            doc: None,
        })
    }

    pub fn with_slots(mut self, slots: Vec<SlotDefinition>) -> Self {
        self.slots = slots;
        self
    }

    pub fn with_parents(mut self, parents: Vec<TypeString>) -> Self {
        self.parents = parents;
        self
    }

    pub fn with_generics(mut self, generics: Vec<String>) -> Self {
        self.generics = generics;
        self
    }

    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }

    pub fn slot(&self, name: &str) -> Option<&SlotDefinition> {
        self.slots.iter().find(|s| s.name == name)
    }
}

// ── Methods ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MethodModifier {
    Abstract,
    Iter,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterModifier {
    None,
    Optional,
    Gather,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParameterDefinition {
    pub location: Option<Location>,
    pub name: String,
    pub modifier: ParameterModifier,
    pub type_string: TypeString,
}

impl ParameterDefinition {
    pub fn new(name: impl Into<String>, modifier: ParameterModifier, type_string: TypeString) -> Self {
        Self {
            location: None,
            name: name.into(),
            modifier,
            type_string,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDefinition {
    pub location: Option<Location>,
    pub package: String,
    pub owner: TypeString,
    /// Signature name: `new()`, `name<<`, `[]`, `name()<<`.
    pub name: String,
    pub modifiers: BTreeSet<MethodModifier>,
    pub parameters: Vec<ParameterDefinition>,
    /// The value parameter of an assignment method (`<< value`).
    pub assignment_parameter: Option<ParameterDefinition>,
    pub return_types: ExpressionResultString,
    /// What each iteration hands to a driving `_for` loop.
    pub loop_types: ExpressionResultString,
    pub doc: Option<String>,
}

impl MethodDefinition {
    pub fn new(owner: TypeString, name: impl Into<String>) -> Self {
        Self {
            location: None,
            package: owner.package().unwrap_or_default().to_string(),
            owner,
            name: name.into(),
            modifiers: BTreeSet::new(),
            parameters: Vec::new(),
            assignment_parameter: None,
            return_types: ExpressionResultString::UNDEFINED,
            loop_types: ExpressionResultString::EMPTY,
            doc: None,
        }
    }

    /// The method name without `()`/`<<` decoration: `add` for `add()`,
    /// `[]` for `[]<<`.
    pub fn bare_name(&self) -> &str {
        bare_method_name(&self.name)
    }

    pub fn is_iter(&self) -> bool {
        self.modifiers.contains(&MethodModifier::Iter)
    }

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(&MethodModifier::Abstract)
    }

    pub fn is_private(&self) -> bool {
        self.modifiers.contains(&MethodModifier::Private)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDefinition> {
        self.parameters
            .iter()
            .chain(self.assignment_parameter.iter())
            .find(|p| p.name == name)
    }
}

/// Strip `()`, `<<` and `^<<` from a signature name.
pub fn bare_method_name(signature: &str) -> &str {
    let name = match signature.strip_suffix("<<") {
        Some(name) => name.strip_suffix('^').unwrap_or(name),
        None => signature,
    };
    name.strip_suffix("()").unwrap_or(name)
}

// ── Globals, conditions, packages ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalDefinition {
    pub location: Option<Location>,
    pub package: String,
    /// The qualified global name as a type key, e.g. `user:!current_world!`.
    pub type_string: TypeString,
    /// The type of the value bound to the global, `Undefined` if unknown.
    pub alias: TypeString,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionDefinition {
    pub location: Option<Location>,
    pub package: String,
    pub name: String,
    pub parent: Option<String>,
    pub data_names: Vec<String>,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageDefinition {
    pub location: Option<Location>,
    pub name: String,
    pub uses: Vec<String>,
}

// ── Procedures and operators ───────────────────────────────────────────

/// A `_proc` bound to a global.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcedureDefinition {
    pub location: Option<Location>,
    pub package: String,
    /// The global the procedure is bound to.
    pub type_string: TypeString,
    /// The `@label` of the procedure, if any.
    pub label: Option<String>,
    pub modifiers: BTreeSet<MethodModifier>,
    pub parameters: Vec<ParameterDefinition>,
    pub return_types: ExpressionResultString,
    pub loop_types: ExpressionResultString,
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryOperatorDefinition {
    pub location: Option<Location>,
    pub package: String,
    pub operator: String,
    pub lhs: TypeString,
    pub rhs: TypeString,
    pub result: TypeString,
}

impl BinaryOperatorDefinition {
    pub fn new(operator: &str, lhs: TypeString, rhs: TypeString, result: TypeString) -> Self {
        Self {
            location: None,
            package: crate::type_string::SW_PACKAGE.to_string(),
            operator: operator.to_string(),
            lhs,
            rhs,
            result,
        }
    }
}

// ── Definition ─────────────────────────────────────────────────────────

/// The kind of symbol an editor outline shows for a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Class,
    Method,
    Variable,
    Event,
    Module,
    Function,
    Operator,
}

/// Any definition the keeper stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Definition {
    Exemplar(Arc<ExemplarDefinition>),
    Method(Arc<MethodDefinition>),
    Global(Arc<GlobalDefinition>),
    Condition(Arc<ConditionDefinition>),
    Package(Arc<PackageDefinition>),
    Procedure(Arc<ProcedureDefinition>),
    BinaryOperator(Arc<BinaryOperatorDefinition>),
}

impl Definition {
    /// Display name: `sw:rope`, `sw:rope.add()`, `user:!x!`, `error`.
    pub fn name(&self) -> String {
        match self {
            Definition::Exemplar(d) => d.type_string.to_string(),
            Definition::Method(d) => format!("{}.{}", d.owner, d.name),
            Definition::Global(d) => d.type_string.to_string(),
            Definition::Condition(d) => d.name.clone(),
            Definition::Package(d) => d.name.clone(),
            Definition::Procedure(d) => d.type_string.to_string(),
            Definition::BinaryOperator(d) => format!("{} {} {}", d.lhs, d.operator, d.rhs),
        }
    }

    pub fn location(&self) -> Option<&Location> {
        match self {
            Definition::Exemplar(d) => d.location.as_ref(),
            Definition::Method(d) => d.location.as_ref(),
            Definition::Global(d) => d.location.as_ref(),
            Definition::Condition(d) => d.location.as_ref(),
            Definition::Package(d) => d.location.as_ref(),
            Definition::Procedure(d) => d.location.as_ref(),
            Definition::BinaryOperator(d) => d.location.as_ref(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.location().map(|l| l.path())
    }

    pub fn package(&self) -> &str {
        match self {
            Definition::Exemplar(d) => &d.package,
            Definition::Method(d) => &d.package,
            Definition::Global(d) => &d.package,
            Definition::Condition(d) => &d.package,
            Definition::Package(d) => &d.name,
            Definition::Procedure(d) => &d.package,
            Definition::BinaryOperator(d) => &d.package,
        }
    }

    pub fn symbol_kind(&self) -> SymbolKind {
        match self {
            Definition::Exemplar(_) => SymbolKind::Class,
            Definition::Method(_) => SymbolKind::Method,
            Definition::Global(_) => SymbolKind::Variable,
            Definition::Condition(_) => SymbolKind::Event,
            Definition::Package(_) => SymbolKind::Module,
            Definition::Procedure(_) => SymbolKind::Function,
            Definition::BinaryOperator(_) => SymbolKind::Operator,
        }
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<ExemplarDefinition> for Definition {
    fn from(d: ExemplarDefinition) -> Self {
        Definition::Exemplar(Arc::new(d))
    }
}

impl From<MethodDefinition> for Definition {
    fn from(d: MethodDefinition) -> Self {
        Definition::Method(Arc::new(d))
    }
}

impl From<GlobalDefinition> for Definition {
    fn from(d: GlobalDefinition) -> Self {
        Definition::Global(Arc::new(d))
    }
}

impl From<ConditionDefinition> for Definition {
    fn from(d: ConditionDefinition) -> Self {
        Definition::Condition(Arc::new(d))
    }
}

impl From<PackageDefinition> for Definition {
    fn from(d: PackageDefinition) -> Self {
        Definition::Package(Arc::new(d))
    }
}

impl From<ProcedureDefinition> for Definition {
    fn from(d: ProcedureDefinition) -> Self {
        Definition::Procedure(Arc::new(d))
    }
}

impl From<BinaryOperatorDefinition> for Definition {
    fn from(d: BinaryOperatorDefinition) -> Self {
        Definition::BinaryOperator(Arc::new(d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exemplar_identity_rejects_bindings() {
        let bound = TypeString::sw("list").with_generics(vec![TypeString::generic_definition(
            "E",
            TypeString::integer(),
        )]);
        assert_eq!(
            ExemplarDefinition::new(bound.clone(), ExemplarSort::Slotted, None),
            Err(DefinitionError::GenericIdentity(bound))
        );
        assert!(matches!(
            ExemplarDefinition::new(TypeString::SelfType, ExemplarSort::Slotted, None),
            Err(DefinitionError::NotAnExemplarName(_))
        ));
        let ok = ExemplarDefinition::new(TypeString::sw("rope"), ExemplarSort::Slotted, None).unwrap();
        assert_eq!(ok.package, "sw");
    }

    #[test]
    fn bare_names() {
        assert_eq!(bare_method_name("add()"), "add");
        assert_eq!(bare_method_name("name()<<"), "name");
        assert_eq!(bare_method_name("[]<<"), "[]");
        assert_eq!(bare_method_name("size"), "size");
        assert_eq!(bare_method_name("size^<<"), "size");
    }

    #[test]
    fn symbol_kinds_and_names() {
        let method: Definition = MethodDefinition::new(TypeString::sw("rope"), "add()").into();
        assert_eq!(method.symbol_kind(), SymbolKind::Method);
        assert_eq!(method.name(), "sw:rope.add()");
        assert_eq!(method.package(), "sw");
        let package: Definition = PackageDefinition {
            location: None,
            name: "user".into(),
            uses: vec!["sw".into()],
        }
        .into();
        assert_eq!(package.symbol_kind(), SymbolKind::Module);
        assert!(package.location().is_none());
    }
}
