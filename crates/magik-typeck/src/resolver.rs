//! Type resolution over a keeper snapshot.
//!
//! The resolver answers inheritance questions: which methods a type
//! responds to, whether one type is a kind of another, what a slot or a
//! global holds. Lookup order for methods is self first, then parents
//! depth-first, left to right; the first definition found for a signature
//! shadows every later one. Inheritance graphs are walked with a visited
//! set, so cyclic parent declarations terminate.
//!
//! Unknown names are answered with empty results, `false` or
//! `TypeString::Undefined`; the resolver never fails.

use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::definitions::{
    ConditionDefinition, ExemplarDefinition, ExemplarSort, GlobalDefinition, MethodDefinition,
    ProcedureDefinition,
};
use crate::keeper::KeeperSnapshot;
use crate::type_string::{TypeString, SW_PACKAGE};

/// Limit on global-alias indirections followed by [`TypeResolver::resolve_exemplar`].
const MAX_ALIAS_DEPTH: usize = 8;

/// Read-only resolution over one snapshot.
#[derive(Debug, Clone, Copy)]
pub struct TypeResolver<'a> {
    keeper: &'a KeeperSnapshot,
}

impl<'a> TypeResolver<'a> {
    pub fn new(keeper: &'a KeeperSnapshot) -> Self {
        Self { keeper }
    }

    pub fn keeper(&self) -> &'a KeeperSnapshot {
        self.keeper
    }

    // ── Packages and exemplars ─────────────────────────────────────────

    /// `package` followed by every package it uses, breadth first. `sw`
    /// is always searched last if nothing else brought it in.
    pub fn package_chain(&self, package: &str) -> Vec<String> {
        let mut chain = vec![package.to_string()];
        let mut i = 0;
        while i < chain.len() {
            if let Some(def) = self.keeper.get_package(&chain[i]) {
                for used in &def.uses {
                    if !chain.contains(used) {
                        chain.push(used.clone());
                    }
                }
            }
            i += 1;
        }
        if !chain.iter().any(|p| p == SW_PACKAGE) {
            chain.push(SW_PACKAGE.to_string());
        }
        chain
    }

    /// The exemplar `ts` names. Bare names are looked up through the
    /// package chain of their package; a global whose value is a type
    /// resolves to that type's exemplar.
    pub fn resolve_exemplar(&self, ts: &TypeString) -> Option<Arc<ExemplarDefinition>> {
        self.resolve_exemplar_at(ts, 0)
    }

    fn resolve_exemplar_at(
        &self,
        ts: &TypeString,
        depth: usize,
    ) -> Option<Arc<ExemplarDefinition>> {
        if depth > MAX_ALIAS_DEPTH {
            return None;
        }
        if let Some(def) = self.keeper.get_exemplar(ts) {
            return Some(def);
        }
        let (package, identifier) = (ts.package()?, ts.identifier()?);
        for candidate in self.package_chain(package).iter().skip(1) {
            let ts = TypeString::simple(candidate.as_str(), identifier);
            if let Some(def) = self.keeper.get_exemplar(&ts) {
                return Some(def);
            }
        }
        let global = self.resolve_global(ts)?;
        if global.alias.is_simple() && global.alias.without_generics() != ts.without_generics() {
            return self.resolve_exemplar_at(&global.alias, depth + 1);
        }
        None
    }

    /// The resolved identity of `ts` carrying `ts`'s bindings, or `ts`
    /// itself when it names no known exemplar.
    pub fn canonical(&self, ts: &TypeString) -> TypeString {
        match self.resolve_exemplar(ts) {
            Some(def) => def.type_string.clone().with_generics(ts.generics().to_vec()),
            None => ts.clone(),
        }
    }

    /// Direct parents of `ts`. Parents carry the child's bindings: a parent
    /// declared without bindings receives them all, a parent declared with
    /// references has them bound.
    pub fn parents(&self, ts: &TypeString) -> Vec<TypeString> {
        let Some(def) = self.resolve_exemplar(ts) else {
            return Vec::new();
        };
        let declared = if def.parents.is_empty() {
            match def.sort {
                ExemplarSort::Slotted => vec![TypeString::slotted_format_mixin()],
                ExemplarSort::Indexed => vec![TypeString::indexed_format_mixin()],
                ExemplarSort::Intrinsic | ExemplarSort::Mixin => Vec::new(),
            }
        } else {
            def.parents.clone()
        };
        let bindings = ts.generics();
        if bindings.is_empty() {
            return declared;
        }
        declared
            .into_iter()
            .map(|parent| {
                if parent.generics().is_empty() {
                    parent.with_generics(bindings.to_vec())
                } else {
                    parent.substitute_generics(bindings)
                }
            })
            .collect()
    }

    // ── Methods ────────────────────────────────────────────────────────

    /// Every method `ts` responds to, own methods first. A combination
    /// answers the union over its members.
    pub fn get_methods(&self, ts: &TypeString) -> Vec<Arc<MethodDefinition>> {
        if ts.is_combined() {
            let mut methods: Vec<Arc<MethodDefinition>> = Vec::new();
            for part in ts.parts() {
                for method in self.get_methods(part) {
                    if !methods.contains(&method) {
                        methods.push(method);
                    }
                }
            }
            return methods;
        }
        let mut methods = Vec::new();
        let mut visited = FxHashSet::default();
        let mut seen = FxHashSet::default();
        self.collect_methods(ts, &mut visited, &mut seen, &mut methods);
        methods
    }

    fn collect_methods(
        &self,
        ts: &TypeString,
        visited: &mut FxHashSet<TypeString>,
        seen: &mut FxHashSet<String>,
        out: &mut Vec<Arc<MethodDefinition>>,
    ) {
        if !(ts.is_simple() || ts.is_unset()) {
            return;
        }
        let canonical = self.canonical(ts);
        if !visited.insert(canonical.without_generics()) {
            return;
        }
        // Last indexed definition per signature wins within one owner.
        let mut own: Vec<Arc<MethodDefinition>> = self
            .own_methods(&canonical)
            .into_iter()
            .rev()
            .filter(|m| seen.insert(m.name.clone()))
            .collect();
        own.reverse();
        let bindings = canonical.generics();
        out.extend(own.into_iter().map(|m| bind_method(m, bindings)));

        for parent in self.parents(&canonical) {
            self.collect_methods(&parent, visited, seen, out);
        }
    }

    /// Methods declared directly on `canonical`, in index order, including
    /// those whose owner was written in another package but resolves to
    /// it: `_method integer.twice` read in package `user` is stored on
    /// `user:integer` and belongs to `sw:integer`.
    fn own_methods(&self, canonical: &TypeString) -> Vec<Arc<MethodDefinition>> {
        let Some(identifier) = canonical.identifier() else {
            return self.keeper.get_methods(canonical);
        };
        let target = canonical.without_generics();
        let mut owners: FxHashMap<TypeString, bool> = FxHashMap::default();
        self.keeper
            .get_methods_by_owner_identifier(identifier)
            .into_iter()
            .filter(|m| {
                let owner = m.owner.without_generics();
                *owners
                    .entry(owner.clone())
                    .or_insert_with(|| owner == target || self.canonical(&owner).without_generics() == target)
            })
            .collect()
    }

    /// Methods of `ts` with bare name `name`, e.g. `add` finds `add()` and `add()<<`.
    pub fn get_methods_named(&self, ts: &TypeString, name: &str) -> Vec<Arc<MethodDefinition>> {
        self.get_methods(ts)
            .into_iter()
            .filter(|m| m.bare_name() == name)
            .collect()
    }

    /// The method with exactly `signature`, e.g. `add()`.
    pub fn get_method(&self, ts: &TypeString, signature: &str) -> Option<Arc<MethodDefinition>> {
        self.get_methods(ts).into_iter().find(|m| m.name == signature)
    }

    // ── Subtyping ──────────────────────────────────────────────────────

    /// Whether `candidate` is `ancestor` or inherits from it.
    pub fn is_kind_of(&self, candidate: &TypeString, ancestor: &TypeString) -> bool {
        if candidate.is_combined() {
            return candidate.parts().iter().all(|c| self.is_kind_of(c, ancestor));
        }
        if ancestor.is_combined() {
            return ancestor.parts().iter().any(|a| self.is_kind_of(candidate, a));
        }
        if candidate.is_undefined() || ancestor.is_undefined() {
            return false;
        }
        let target = self.canonical(ancestor).without_generics();
        let mut visited = FxHashSet::default();
        let mut stack = vec![candidate.clone()];
        while let Some(ts) = stack.pop() {
            let canonical = self.canonical(&ts).without_generics();
            if canonical == target {
                return true;
            }
            if !visited.insert(canonical.clone()) {
                continue;
            }
            // Reverse so the leftmost parent is explored first.
            stack.extend(self.parents(&canonical).into_iter().rev());
        }
        false
    }

    // ── Slots, globals, procedures, conditions ─────────────────────────

    /// The declared type of `slot` on `owner` or an ancestor.
    pub fn slot_type(&self, owner: &TypeString, slot: &str) -> TypeString {
        let mut visited = FxHashSet::default();
        let mut stack = vec![self.canonical(owner)];
        while let Some(ts) = stack.pop() {
            if !visited.insert(ts.without_generics()) {
                continue;
            }
            if let Some(def) = self.resolve_exemplar(&ts) {
                if let Some(found) = def.slot(slot) {
                    return found.type_string.substitute_generics(ts.generics());
                }
            }
            stack.extend(self.parents(&ts).into_iter().rev());
        }
        TypeString::Undefined
    }

    /// The global `name` in its package or a package it uses.
    pub fn resolve_global(&self, name: &TypeString) -> Option<Arc<GlobalDefinition>> {
        let (package, identifier) = (name.package()?, name.identifier()?);
        self.package_chain(package)
            .iter()
            .find_map(|p| self.keeper.get_global(&TypeString::simple(p.as_str(), identifier)))
    }

    /// The procedure bound to global `name`, most recently indexed first.
    pub fn resolve_procedure(&self, name: &TypeString) -> Option<Arc<ProcedureDefinition>> {
        let (package, identifier) = (name.package()?, name.identifier()?);
        self.package_chain(package).iter().find_map(|p| {
            self.keeper
                .get_procedures(&TypeString::simple(p.as_str(), identifier))
                .pop()
        })
    }

    pub fn resolve_condition(&self, name: &str) -> Option<Arc<ConditionDefinition>> {
        self.keeper.get_condition(name)
    }

    /// The result of `lhs op rhs`, combined over the members of both sides.
    /// Pairs without an operator definition contribute `Undefined`. Operand
    /// types of a case are compared by resolved identity, so a case
    /// declared on `integer` in package `user` applies to `sw:integer`.
    pub fn binary_operator(&self, operator: &str, lhs: &TypeString, rhs: &TypeString) -> TypeString {
        let cases: Vec<(TypeString, TypeString, TypeString)> = self
            .keeper
            .get_binary_operators_named(operator)
            .iter()
            .map(|op| {
                (
                    self.canonical(&op.lhs).without_generics(),
                    self.canonical(&op.rhs).without_generics(),
                    op.result.clone(),
                )
            })
            .collect();
        let mut results = Vec::new();
        for l in lhs.parts() {
            for r in rhs.parts() {
                let (l, r) = (self.canonical(l).without_generics(), self.canonical(r).without_generics());
                let result = cases
                    .iter()
                    .rev()
                    .find(|(case_l, case_r, _)| *case_l == l && *case_r == r)
                    .map(|(_, _, result)| result.clone())
                    .unwrap_or(TypeString::Undefined);
                results.push(result);
            }
        }
        TypeString::combine(results)
    }
}

/// `method` with the owner's generic bindings applied to its parameter,
/// return and loop types. Unchanged methods are shared, not copied.
fn bind_method(method: Arc<MethodDefinition>, bindings: &[TypeString]) -> Arc<MethodDefinition> {
    let return_types = method.return_types.substitute_generics(bindings);
    let loop_types = method.loop_types.substitute_generics(bindings);
    let parameters: Vec<_> = method
        .parameters
        .iter()
        .map(|p| {
            let mut p = p.clone();
            p.type_string = p.type_string.substitute_generics(bindings);
            p
        })
        .collect();
    let assignment_parameter = method.assignment_parameter.as_ref().map(|p| {
        let mut p = p.clone();
        p.type_string = p.type_string.substitute_generics(bindings);
        p
    });
    if return_types == method.return_types
        && loop_types == method.loop_types
        && parameters == method.parameters
        && assignment_parameter == method.assignment_parameter
    {
        return method;
    }
    let mut bound = MethodDefinition::clone(&method);
    bound.return_types = return_types;
    bound.loop_types = loop_types;
    bound.parameters = parameters;
    bound.assignment_parameter = assignment_parameter;
    Arc::new(bound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::Definition;
    use crate::keeper::DefinitionKeeper;
    use crate::result_string::ExpressionResultString;

    fn exemplar(name: &str, parents: &[&str]) -> Definition {
        ExemplarDefinition::new(TypeString::sw(name), ExemplarSort::Slotted, None)
            .unwrap()
            .with_parents(parents.iter().map(|p| TypeString::sw(p)).collect())
            .into()
    }

    fn method(owner: &str, name: &str, returns: TypeString) -> Definition {
        let mut m = MethodDefinition::new(TypeString::sw(owner), name);
        m.return_types = ExpressionResultString::single(returns);
        m.into()
    }

    #[test]
    fn package_chain_walks_uses() {
        let keeper = DefinitionKeeper::with_builtins();
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        assert_eq!(resolver.package_chain("user"), vec!["user", "sw"]);
        assert_eq!(resolver.package_chain("unknown"), vec!["unknown", "sw"]);
    }

    #[test]
    fn user_names_resolve_to_sw_exemplars() {
        let keeper = DefinitionKeeper::with_builtins();
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        let ts = TypeString::simple("user", "integer");
        assert_eq!(resolver.canonical(&ts), TypeString::integer());
        assert!(resolver.get_method(&ts, "abs").is_some());
    }

    #[test]
    fn own_methods_shadow_inherited() {
        let keeper = DefinitionKeeper::new();
        keeper.add(exemplar("a", &[]));
        keeper.add(exemplar("b", &["a"]));
        keeper.add(method("a", "m()", TypeString::integer()));
        keeper.add(method("b", "m()", TypeString::float()));
        keeper.add(method("a", "n()", TypeString::symbol()));
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);

        let methods = resolver.get_methods(&TypeString::sw("b"));
        let names: Vec<_> = methods.iter().map(|m| m.name.clone()).collect();
        assert_eq!(names, vec!["m()", "n()"]);
        assert_eq!(methods[0].return_types.first(), TypeString::float());
    }

    #[test]
    fn left_parent_wins() {
        let keeper = DefinitionKeeper::new();
        keeper.add(exemplar("left", &[]));
        keeper.add(exemplar("right", &[]));
        keeper.add(exemplar("child", &["left", "right"]));
        keeper.add(method("right", "m()", TypeString::float()));
        keeper.add(method("left", "m()", TypeString::integer()));
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        let m = resolver.get_method(&TypeString::sw("child"), "m()").unwrap();
        assert_eq!(m.owner, TypeString::sw("left"));
    }

    #[test]
    fn implicit_mixin_parents() {
        let keeper = DefinitionKeeper::with_builtins();
        keeper.add(exemplar("rope", &[]));
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        assert_eq!(
            resolver.parents(&TypeString::sw("rope")),
            vec![TypeString::slotted_format_mixin()]
        );
        assert!(resolver.is_kind_of(&TypeString::sw("rope"), &TypeString::slotted_format_mixin()));
    }

    #[test]
    fn is_kind_of_combinations() {
        let keeper = DefinitionKeeper::with_builtins();
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        let numbers = TypeString::combine([TypeString::integer(), TypeString::float()]);
        assert!(resolver.is_kind_of(&numbers, &TypeString::object()));
        let mixed = TypeString::combine([TypeString::integer(), TypeString::Undefined]);
        assert!(!resolver.is_kind_of(&mixed, &TypeString::object()));
        assert!(resolver.is_kind_of(&TypeString::integer(), &numbers));
        assert!(!resolver.is_kind_of(&TypeString::sw("nothing"), &TypeString::object()));
    }

    #[test]
    fn slot_types_are_inherited() {
        let keeper = DefinitionKeeper::new();
        let base = ExemplarDefinition::new(TypeString::sw("base"), ExemplarSort::Slotted, None)
            .unwrap()
            .with_slots(vec![crate::definitions::SlotDefinition {
                location: None,
                name: "count".into(),
                type_string: TypeString::integer(),
            }]);
        keeper.add(base.into());
        keeper.add(exemplar("derived", &["base"]));
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        assert_eq!(resolver.slot_type(&TypeString::sw("derived"), "count"), TypeString::integer());
        assert_eq!(resolver.slot_type(&TypeString::sw("derived"), "missing"), TypeString::Undefined);
    }

    #[test]
    fn global_alias_resolves_exemplar() {
        let keeper = DefinitionKeeper::with_builtins();
        keeper.add(
            GlobalDefinition {
                location: None,
                package: "user".into(),
                type_string: TypeString::simple("user", "my_int"),
                alias: TypeString::integer(),
            }
            .into(),
        );
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        let def = resolver.resolve_exemplar(&TypeString::simple("user", "my_int")).unwrap();
        assert_eq!(def.type_string, TypeString::integer());
    }

    #[test]
    fn binary_operators_combine_members() {
        let keeper = DefinitionKeeper::with_builtins();
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        let lhs = TypeString::combine([TypeString::integer(), TypeString::float()]);
        assert_eq!(
            resolver.binary_operator("+", &lhs, &TypeString::integer()).to_string(),
            "sw:integer|sw:float"
        );
        assert_eq!(
            resolver.binary_operator("+", &TypeString::symbol(), &TypeString::integer()),
            TypeString::Undefined
        );
    }
}
