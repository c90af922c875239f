//! Built-in definition registration.
//!
//! Seeds a keeper with what every Magik image provides before any user
//! file is read:
//! - packages `sw` and `user` (`user` uses `sw`)
//! - intrinsic exemplars (`sw:object`, `sw:integer`, `sw:char16_vector`, ...)
//!   and the two format mixins
//! - a small set of methods on them, including the generic
//!   `sw:simple_vector<K, E>` element iterators
//! - arithmetic binary operators on integers and floats
//!
//! Built-in definitions carry no location, so reindexing a file never
//! removes them.

use crate::definitions::{
    BinaryOperatorDefinition, Definition, ExemplarDefinition, ExemplarSort, MethodDefinition,
    MethodModifier, PackageDefinition, ParameterDefinition, ParameterModifier,
};
use crate::keeper::DefinitionKeeper;
use crate::result_string::ExpressionResultString;
use crate::type_string::{TypeString, SW_PACKAGE, USER_PACKAGE};

/// Register all built-in definitions into `keeper` in one publish.
pub fn register_builtins(keeper: &DefinitionKeeper) {
    keeper.add_all(builtin_definitions());
}

/// The built-in definitions, in registration order.
pub fn builtin_definitions() -> Vec<Definition> {
    let mut defs = Vec::new();

    // ── Packages ───────────────────────────────────────────────────

    defs.push(package(SW_PACKAGE, &[]));
    defs.push(package(USER_PACKAGE, &[SW_PACKAGE]));

    // ── Exemplars ──────────────────────────────────────────────────

    defs.push(exemplar(TypeString::object(), ExemplarSort::Intrinsic, vec![], vec![]));
    defs.push(exemplar(
        TypeString::slotted_format_mixin(),
        ExemplarSort::Mixin,
        vec![TypeString::object()],
        vec![],
    ));
    defs.push(exemplar(
        TypeString::indexed_format_mixin(),
        ExemplarSort::Mixin,
        vec![TypeString::object()],
        vec![],
    ));

    let intrinsics = [
        TypeString::unset(),
        TypeString::boolean(),
        TypeString::maybe(),
        TypeString::integer(),
        TypeString::bignum(),
        TypeString::float(),
        TypeString::character(),
        TypeString::char16_vector(),
        TypeString::symbol(),
        TypeString::procedure(),
        TypeString::condition(),
        TypeString::sw_regexp(),
        TypeString::global_variable(),
        TypeString::enumeration_value(),
        TypeString::sw("heavy_thread"),
        TypeString::sw("light_thread"),
    ];
    for ts in intrinsics {
        defs.push(exemplar(ts, ExemplarSort::Intrinsic, vec![TypeString::object()], vec![]));
    }
    defs.push(exemplar(
        TypeString::simple_vector(),
        ExemplarSort::Intrinsic,
        vec![TypeString::object()],
        vec!["K", "E"],
    ));

    // ── Methods ────────────────────────────────────────────────────

    let object = TypeString::object();
    defs.push(method(&object, "is_kind_of?()", &[TypeString::boolean()]));
    defs.push(method(&object, "class_name", &[TypeString::symbol()]));
    defs.push(method(&object, "write_string", &[TypeString::char16_vector()]));
    defs.push(method(&object, "copy", &[TypeString::SelfType]));

    defs.push(method(&TypeString::integer(), "abs", &[TypeString::SelfType]));

    let string = TypeString::char16_vector();
    defs.push(method(&string, "size", &[TypeString::integer()]));
    defs.push(method(&string, "as_symbol()", &[TypeString::symbol()]));

    let vector = TypeString::simple_vector();
    let key = TypeString::GenericReference("K".into());
    let element = TypeString::GenericReference("E".into());
    defs.push(method(&vector, "new()", &[TypeString::SelfType]));
    defs.push(method(&vector, "size", &[TypeString::integer()]));
    defs.push(method(&vector, "[]", &[element.clone()]));
    let mut assign = MethodDefinition::new(vector.clone(), "[]<<");
    assign.assignment_parameter = Some(ParameterDefinition::new(
        "value",
        ParameterModifier::None,
        element.clone(),
    ));
    assign.return_types = ExpressionResultString::single(element.clone());
    defs.push(assign.into());
    defs.push(iterator(&vector, "fast_elements()", vec![element.clone()]));
    defs.push(iterator(&vector, "elements()", vec![element.clone()]));
    defs.push(iterator(&vector, "fast_keys_and_elements()", vec![key, element]));

    // ── Binary operators ───────────────────────────────────────────

    let int = TypeString::integer();
    let float = TypeString::float();
    for op in ["+", "-", "*", "**"] {
        defs.push(operator(op, &int, &int, &int));
        defs.push(operator(op, &int, &float, &float));
        defs.push(operator(op, &float, &int, &float));
        defs.push(operator(op, &float, &float, &float));
    }
    for (lhs, rhs) in [(&int, &int), (&int, &float), (&float, &int), (&float, &float)] {
        defs.push(operator("/", lhs, rhs, &float));
    }
    defs.push(operator("_div", &int, &int, &int));
    defs.push(operator("_mod", &int, &int, &int));
    defs.push(operator("_rem", &int, &int, &int));

    defs
}

fn package(name: &str, uses: &[&str]) -> Definition {
    PackageDefinition {
        location: None,
        name: name.to_string(),
        uses: uses.iter().map(|u| u.to_string()).collect(),
    }
    .into()
}

fn exemplar(
    ts: TypeString,
    sort: ExemplarSort,
    parents: Vec<TypeString>,
    generics: Vec<&str>,
) -> Definition {
    ExemplarDefinition {
        location: None,
        package: SW_PACKAGE.to_string(),
        type_string: ts,
        sort,
        slots: Vec::new(),
        parents,
        generics: generics.into_iter().map(String::from).collect(),
        doc: None,
    }
    .into()
}

fn method(owner: &TypeString, name: &str, returns: &[TypeString]) -> Definition {
    let mut m = MethodDefinition::new(owner.clone(), name);
    m.return_types = ExpressionResultString::new(returns.to_vec());
    m.into()
}

fn iterator(owner: &TypeString, name: &str, loops: Vec<TypeString>) -> Definition {
    let mut m = MethodDefinition::new(owner.clone(), name);
    m.modifiers.insert(MethodModifier::Iter);
    m.return_types = ExpressionResultString::EMPTY;
    m.loop_types = ExpressionResultString::new(loops);
    m.into()
}

fn operator(op: &str, lhs: &TypeString, rhs: &TypeString, result: &TypeString) -> Definition {
    BinaryOperatorDefinition::new(op, lhs.clone(), rhs.clone(), result.clone()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_registered() {
        let keeper = DefinitionKeeper::with_builtins();
        let snapshot = keeper.snapshot();
        assert!(snapshot.get_exemplar(&TypeString::integer()).is_some());
        assert!(snapshot.get_exemplar(&TypeString::Unset).is_some());
        assert_eq!(
            snapshot.get_package(USER_PACKAGE).map(|p| p.uses.clone()),
            Some(vec![SW_PACKAGE.to_string()])
        );
        let vector = snapshot.get_exemplar(&TypeString::simple_vector()).unwrap();
        assert_eq!(vector.generics, vec!["K", "E"]);
    }

    #[test]
    fn arithmetic_operators() {
        let keeper = DefinitionKeeper::with_builtins();
        let snapshot = keeper.snapshot();
        let ops = snapshot.get_binary_operators("+", &TypeString::integer(), &TypeString::float());
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].result, TypeString::float());
        assert!(snapshot
            .get_binary_operators("+", &TypeString::symbol(), &TypeString::float())
            .is_empty());
    }

    #[test]
    fn registration_is_a_single_publish() {
        let keeper = DefinitionKeeper::with_builtins();
        assert_eq!(keeper.generation(), 1);
        register_builtins(&keeper);
        assert_eq!(keeper.generation(), 1);
    }
}
