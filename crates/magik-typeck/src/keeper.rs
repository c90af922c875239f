//! The definition keeper: every definition known to the workspace.
//!
//! Definitions are stored in persistent (`im`) maps inside a
//! [`KeeperSnapshot`]. The keeper holds the current snapshot behind a
//! `parking_lot::RwLock<Arc<_>>`:
//!
//! - readers call [`DefinitionKeeper::snapshot`] and query an immutable
//!   snapshot for as long as they like;
//! - writers clone the snapshot (cheap, structurally shared), apply their
//!   change and publish the result with a single pointer swap.
//!
//! A reader therefore sees either the state before or the state after a
//! [`DefinitionKeeper::replace_path`], never a mix.
//!
//! Lookups of unknown names answer empty collections or `None`.

use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use im::{HashMap, Vector};
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::definitions::{
    BinaryOperatorDefinition, ConditionDefinition, Definition, ExemplarDefinition,
    GlobalDefinition, MethodDefinition, PackageDefinition, ProcedureDefinition,
};
use crate::type_string::TypeString;

// ── Snapshot ───────────────────────────────────────────────────────────

/// An immutable view of the keeper's contents.
///
/// Within each key, definitions are kept in the order they were indexed;
/// single-result lookups answer the most recently indexed one.
#[derive(Debug, Clone, Default)]
pub struct KeeperSnapshot {
    generation: u64,
    exemplars: HashMap<TypeString, Vector<Arc<ExemplarDefinition>>>,
    /// Methods keyed by owner (without generic bindings).
    methods: HashMap<TypeString, Vector<Arc<MethodDefinition>>>,
    /// Methods keyed by bare name.
    methods_by_name: HashMap<String, Vector<Arc<MethodDefinition>>>,
    /// Methods keyed by their owner's identifier, whatever its package:
    /// `integer` holds the methods of `sw:integer` and `user:integer`.
    methods_by_owner_identifier: HashMap<String, Vector<Arc<MethodDefinition>>>,
    globals: HashMap<TypeString, Vector<Arc<GlobalDefinition>>>,
    conditions: HashMap<String, Vector<Arc<ConditionDefinition>>>,
    packages: HashMap<String, Vector<Arc<PackageDefinition>>>,
    procedures: HashMap<TypeString, Vector<Arc<ProcedureDefinition>>>,
    /// Binary operator cases keyed by operator.
    binary_operators: HashMap<String, Vector<Arc<BinaryOperatorDefinition>>>,
    by_path: HashMap<PathBuf, Vector<Definition>>,
}

fn values<K, V>(map: &HashMap<K, Vector<V>>, key: &K) -> Vec<V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    map.get(key)
        .map(|v| v.iter().cloned().collect())
        .unwrap_or_default()
}

fn latest<K, V>(map: &HashMap<K, Vector<V>>, key: &K) -> Option<V>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    map.get(key).and_then(|v| v.last().cloned())
}

fn push<K, V>(map: &mut HashMap<K, Vector<V>>, key: K, value: V)
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    let mut entries = map.get(&key).cloned().unwrap_or_default();
    entries.push_back(value);
    map.insert(key, entries);
}

fn remove_value<K, V>(map: &mut HashMap<K, Vector<V>>, key: &K, value: &V) -> bool
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
{
    let Some(entries) = map.get(key) else {
        return false;
    };
    let Some(index) = entries.iter().position(|v| v == value) else {
        return false;
    };
    let mut entries = entries.clone();
    entries.remove(index);
    if entries.is_empty() {
        map.remove(key);
    } else {
        map.insert(key.clone(), entries);
    }
    true
}

fn contains_value<K, V>(map: &HashMap<K, Vector<V>>, key: &K, value: &V) -> bool
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
{
    map.get(key).is_some_and(|v| v.iter().any(|d| d == value))
}

impl KeeperSnapshot {
    /// Incremented on every publish.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    // ── Queries ────────────────────────────────────────────────────────

    /// Every exemplar definition for `ts` (bindings ignored), oldest first.
    pub fn get_exemplars(&self, ts: &TypeString) -> Vec<Arc<ExemplarDefinition>> {
        values(&self.exemplars, &ts.without_generics())
    }

    /// The most recently indexed exemplar definition for `ts`.
    pub fn get_exemplar(&self, ts: &TypeString) -> Option<Arc<ExemplarDefinition>> {
        latest(&self.exemplars, &ts.without_generics())
    }

    /// Methods defined directly on `ts`, in index order. Inherited methods
    /// are the resolver's business.
    pub fn get_methods(&self, ts: &TypeString) -> Vec<Arc<MethodDefinition>> {
        values(&self.methods, &ts.without_generics())
    }

    /// Methods on every owner spelled `identifier`, in any package.
    pub fn get_methods_by_owner_identifier(&self, identifier: &str) -> Vec<Arc<MethodDefinition>> {
        values(&self.methods_by_owner_identifier, &identifier.to_string())
    }

    /// Every method with the bare name `name`, on any owner.
    pub fn get_methods_by_name(&self, name: &str) -> Vec<Arc<MethodDefinition>> {
        values(&self.methods_by_name, &name.to_string())
    }

    pub fn get_global(&self, ts: &TypeString) -> Option<Arc<GlobalDefinition>> {
        latest(&self.globals, ts)
    }

    pub fn get_condition(&self, name: &str) -> Option<Arc<ConditionDefinition>> {
        latest(&self.conditions, &name.to_string())
    }

    pub fn get_package(&self, name: &str) -> Option<Arc<PackageDefinition>> {
        latest(&self.packages, &name.to_string())
    }

    pub fn get_procedures(&self, ts: &TypeString) -> Vec<Arc<ProcedureDefinition>> {
        values(&self.procedures, ts)
    }

    /// Cases of `operator` for exactly `lhs` and `rhs`, as written.
    pub fn get_binary_operators(
        &self,
        operator: &str,
        lhs: &TypeString,
        rhs: &TypeString,
    ) -> Vec<Arc<BinaryOperatorDefinition>> {
        self.get_binary_operators_named(operator)
            .into_iter()
            .filter(|op| &op.lhs == lhs && &op.rhs == rhs)
            .collect()
    }

    /// Every case of `operator`, in index order.
    pub fn get_binary_operators_named(&self, operator: &str) -> Vec<Arc<BinaryOperatorDefinition>> {
        values(&self.binary_operators, &operator.to_string())
    }

    /// Definitions indexed from `path`, in index order.
    pub fn definitions_for_path(&self, path: &Path) -> Vec<Definition> {
        values(&self.by_path, &path.to_path_buf())
    }

    /// Paths that contributed at least one definition.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn exemplar_count(&self) -> usize {
        self.exemplars.values().map(|v| v.len()).sum()
    }

    pub fn method_count(&self) -> usize {
        self.methods.values().map(|v| v.len()).sum()
    }

    /// Whether an equal definition is stored.
    pub fn contains(&self, definition: &Definition) -> bool {
        match definition {
            Definition::Exemplar(d) => {
                contains_value(&self.exemplars, &d.type_string.without_generics(), d)
            }
            Definition::Method(d) => contains_value(&self.methods, &d.owner.without_generics(), d),
            Definition::Global(d) => contains_value(&self.globals, &d.type_string, d),
            Definition::Condition(d) => contains_value(&self.conditions, &d.name, d),
            Definition::Package(d) => contains_value(&self.packages, &d.name, d),
            Definition::Procedure(d) => contains_value(&self.procedures, &d.type_string, d),
            Definition::BinaryOperator(d) => contains_value(&self.binary_operators, &d.operator, d),
        }
    }

    // ── Mutation (on a private copy, before publishing) ────────────────

    fn insert(&mut self, definition: Definition) -> bool {
        if self.contains(&definition) {
            return false;
        }
        match &definition {
            Definition::Exemplar(d) => {
                push(&mut self.exemplars, d.type_string.without_generics(), d.clone())
            }
            Definition::Method(d) => {
                push(&mut self.methods, d.owner.without_generics(), d.clone());
                push(&mut self.methods_by_name, d.bare_name().to_string(), d.clone());
                if let Some(identifier) = d.owner.identifier() {
                    push(&mut self.methods_by_owner_identifier, identifier.to_string(), d.clone());
                }
            }
            Definition::Global(d) => push(&mut self.globals, d.type_string.clone(), d.clone()),
            Definition::Condition(d) => push(&mut self.conditions, d.name.clone(), d.clone()),
            Definition::Package(d) => push(&mut self.packages, d.name.clone(), d.clone()),
            Definition::Procedure(d) => {
                push(&mut self.procedures, d.type_string.clone(), d.clone())
            }
            Definition::BinaryOperator(d) => {
                push(&mut self.binary_operators, d.operator.clone(), d.clone())
            }
        }
        if let Some(path) = definition.path() {
            push(&mut self.by_path, path.to_path_buf(), definition.clone());
        }
        true
    }

    fn erase(&mut self, definition: &Definition) -> bool {
        let removed = match definition {
            Definition::Exemplar(d) => {
                remove_value(&mut self.exemplars, &d.type_string.without_generics(), d)
            }
            Definition::Method(d) => {
                remove_value(&mut self.methods_by_name, &d.bare_name().to_string(), d);
                if let Some(identifier) = d.owner.identifier() {
                    remove_value(&mut self.methods_by_owner_identifier, &identifier.to_string(), d);
                }
                remove_value(&mut self.methods, &d.owner.without_generics(), d)
            }
            Definition::Global(d) => remove_value(&mut self.globals, &d.type_string, d),
            Definition::Condition(d) => remove_value(&mut self.conditions, &d.name, d),
            Definition::Package(d) => remove_value(&mut self.packages, &d.name, d),
            Definition::Procedure(d) => remove_value(&mut self.procedures, &d.type_string, d),
            Definition::BinaryOperator(d) => remove_value(&mut self.binary_operators, &d.operator, d),
        };
        if let Some(path) = definition.path() {
            remove_value(&mut self.by_path, &path.to_path_buf(), definition);
        }
        removed
    }
}

// ── Keeper ─────────────────────────────────────────────────────────────

/// Shared, concurrently readable store of definitions.
#[derive(Debug, Default)]
pub struct DefinitionKeeper {
    current: RwLock<Arc<KeeperSnapshot>>,
}

impl DefinitionKeeper {
    /// An empty keeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// A keeper seeded with the built-in packages, exemplars, methods and
    /// operators.
    pub fn with_builtins() -> Self {
        let keeper = Self::new();
        crate::builtins::register_builtins(&keeper);
        keeper
    }

    /// The current contents. The snapshot never changes; later writes
    /// publish a new one.
    pub fn snapshot(&self) -> Arc<KeeperSnapshot> {
        self.current.read().clone()
    }

    /// Apply `change` to a copy of the current snapshot and publish it if
    /// `change` reports a modification.
    fn publish(&self, change: impl FnOnce(&mut KeeperSnapshot) -> bool) -> bool {
        let mut current = self.current.write();
        let mut next = KeeperSnapshot::clone(&current);
        if !change(&mut next) {
            return false;
        }
        next.generation += 1;
        trace!(generation = next.generation, "published keeper snapshot");
        *current = Arc::new(next);
        true
    }

    /// Add a definition. Adding an equal definition again is a no-op.
    pub fn add(&self, definition: Definition) -> bool {
        self.publish(|s| s.insert(definition))
    }

    /// Add several definitions in one publish.
    pub fn add_all(&self, definitions: impl IntoIterator<Item = Definition>) {
        self.publish(|s| {
            let mut changed = false;
            for definition in definitions {
                changed |= s.insert(definition);
            }
            changed
        });
    }

    /// Remove a definition. Removing an absent definition is a no-op.
    pub fn remove(&self, definition: &Definition) -> bool {
        self.publish(|s| s.erase(definition))
    }

    /// Remove every definition indexed from `path`, returning them.
    pub fn remove_all_for_path(&self, path: &Path) -> Vec<Definition> {
        let mut removed = Vec::new();
        self.publish(|s| {
            removed = s.definitions_for_path(path);
            for definition in &removed {
                s.erase(definition);
            }
            !removed.is_empty()
        });
        if !removed.is_empty() {
            debug!(path = %path.display(), count = removed.len(), "removed definitions");
        }
        removed
    }

    /// Replace every definition of `path` with `definitions` atomically.
    ///
    /// Definitions are expected to carry a location in `path`; ones without
    /// a location are stored but cannot be removed by path later. Replacing
    /// a path with the definitions it already has publishes nothing.
    pub fn replace_path(&self, path: &Path, definitions: Vec<Definition>) {
        let published = self.publish(|s| {
            let old = s.definitions_for_path(path);
            if old == definitions {
                return false;
            }
            for definition in &old {
                s.erase(definition);
            }
            for definition in definitions {
                s.insert(definition);
            }
            true
        });
        if published {
            debug!(path = %path.display(), "replaced definitions");
        }
    }

    pub fn generation(&self) -> u64 {
        self.current.read().generation
    }

    // ── Convenience queries on the current snapshot ────────────────────

    pub fn get_exemplar(&self, ts: &TypeString) -> Option<Arc<ExemplarDefinition>> {
        self.snapshot().get_exemplar(ts)
    }

    pub fn get_methods(&self, ts: &TypeString) -> Vec<Arc<MethodDefinition>> {
        self.snapshot().get_methods(ts)
    }

    pub fn get_methods_by_name(&self, name: &str) -> Vec<Arc<MethodDefinition>> {
        self.snapshot().get_methods_by_name(name)
    }

    pub fn definitions_for_path(&self, path: &Path) -> Vec<Definition> {
        self.snapshot().definitions_for_path(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::ExemplarSort;
    use magik_common::span::{Location, Span};

    fn exemplar(name: &str, path: &str) -> Definition {
        ExemplarDefinition::new(
            TypeString::sw(name),
            ExemplarSort::Slotted,
            Some(Location::new(path, Span::new(0, 10))),
        )
        .unwrap()
        .into()
    }

    fn method(owner: &str, name: &str, path: &str) -> Definition {
        let mut m = MethodDefinition::new(TypeString::sw(owner), name);
        m.location = Some(Location::new(path, Span::new(20, 30)));
        m.into()
    }

    #[test]
    fn unknown_names_answer_empty() {
        let keeper = DefinitionKeeper::new();
        let snapshot = keeper.snapshot();
        assert!(snapshot.get_exemplar(&TypeString::sw("nothing")).is_none());
        assert!(snapshot.get_methods(&TypeString::sw("nothing")).is_empty());
        assert!(snapshot.get_methods_by_name("nothing").is_empty());
        assert!(snapshot.get_condition("nothing").is_none());
        assert!(snapshot.definitions_for_path(Path::new("/x.magik")).is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let keeper = DefinitionKeeper::new();
        assert!(keeper.add(exemplar("rope", "/a.magik")));
        let generation = keeper.generation();
        assert!(!keeper.add(exemplar("rope", "/a.magik")));
        assert_eq!(keeper.generation(), generation);
        assert_eq!(keeper.snapshot().get_exemplars(&TypeString::sw("rope")).len(), 1);
    }

    #[test]
    fn remove_absent_is_noop() {
        let keeper = DefinitionKeeper::new();
        assert!(!keeper.remove(&exemplar("rope", "/a.magik")));
        assert_eq!(keeper.generation(), 0);
    }

    #[test]
    fn methods_indexed_by_owner_and_name() {
        let keeper = DefinitionKeeper::new();
        keeper.add(method("rope", "add()", "/a.magik"));
        keeper.add(method("list", "add()", "/b.magik"));
        let mut user_rope = MethodDefinition::new(TypeString::simple("user", "rope"), "size");
        user_rope.location = Some(Location::new("/c.magik", Span::new(0, 4)));
        keeper.add(user_rope.into());
        assert_eq!(keeper.get_methods(&TypeString::sw("rope")).len(), 1);
        assert_eq!(keeper.get_methods_by_name("add").len(), 2);
        let snapshot = keeper.snapshot();
        assert_eq!(snapshot.get_methods_by_owner_identifier("rope").len(), 2);

        keeper.remove_all_for_path(Path::new("/c.magik"));
        assert_eq!(keeper.snapshot().get_methods_by_owner_identifier("rope").len(), 1);
    }

    #[test]
    fn old_snapshots_are_unaffected_by_writes() {
        let keeper = DefinitionKeeper::new();
        keeper.add(exemplar("rope", "/a.magik"));
        let before = keeper.snapshot();
        keeper.replace_path(Path::new("/a.magik"), vec![exemplar("list", "/a.magik")]);
        assert!(before.get_exemplar(&TypeString::sw("rope")).is_some());
        assert!(before.get_exemplar(&TypeString::sw("list")).is_none());
        let after = keeper.snapshot();
        assert!(after.get_exemplar(&TypeString::sw("rope")).is_none());
        assert!(after.get_exemplar(&TypeString::sw("list")).is_some());
        assert!(after.generation() > before.generation());
    }

    #[test]
    fn replace_path_leaves_other_paths_alone() {
        let keeper = DefinitionKeeper::new();
        keeper.add(method("rope", "add()", "/a.magik"));
        keeper.add(method("rope", "remove()", "/b.magik"));
        keeper.replace_path(Path::new("/a.magik"), vec![method("rope", "size", "/a.magik")]);
        let names: Vec<String> = keeper
            .get_methods(&TypeString::sw("rope"))
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(names, vec!["remove()", "size"]);
    }

    #[test]
    fn replace_with_same_definitions_publishes_nothing() {
        let keeper = DefinitionKeeper::new();
        keeper.replace_path(Path::new("/a.magik"), vec![exemplar("rope", "/a.magik")]);
        let generation = keeper.generation();
        keeper.replace_path(Path::new("/a.magik"), vec![exemplar("rope", "/a.magik")]);
        assert_eq!(keeper.generation(), generation);
    }

    #[test]
    fn remove_all_for_path() {
        let keeper = DefinitionKeeper::new();
        keeper.add(exemplar("rope", "/a.magik"));
        keeper.add(method("rope", "add()", "/a.magik"));
        let removed = keeper.remove_all_for_path(Path::new("/a.magik"));
        assert_eq!(removed.len(), 2);
        assert!(keeper.get_exemplar(&TypeString::sw("rope")).is_none());
        assert!(keeper.get_methods_by_name("add").is_empty());
        assert!(keeper.snapshot().paths().is_empty());
    }

    #[test]
    fn latest_definition_wins_single_lookups() {
        let keeper = DefinitionKeeper::new();
        keeper.add(exemplar("rope", "/a.magik"));
        keeper.add(exemplar("rope", "/b.magik"));
        let found = keeper.get_exemplar(&TypeString::sw("rope")).unwrap();
        assert_eq!(
            found.location.as_ref().map(|l| l.path().to_path_buf()),
            Some(PathBuf::from("/b.magik"))
        );
    }
}
