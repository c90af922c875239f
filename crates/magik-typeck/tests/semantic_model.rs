//! End-to-end tests: Magik source through reader, keeper, resolver, scopes
//! and reasoner.

use std::path::Path;

use magik_parser::{SyntaxKind, SyntaxNode};
use magik_typeck::reader::read_definitions;
use magik_typeck::scope::EntryKind;
use magik_typeck::{analyze, Definition, DefinitionKeeper, TypeResolver, TypeString};

fn index(keeper: &DefinitionKeeper, path: &str, source: &str) {
    let parse = magik_parser::parse(source);
    keeper.replace_path(Path::new(path), read_definitions(&parse, Path::new(path)));
}

fn ts(text: &str) -> TypeString {
    TypeString::parse(text, "user").unwrap()
}

fn method_names(resolver: &TypeResolver<'_>, owner: &str) -> Vec<String> {
    let mut names: Vec<String> = resolver
        .get_methods(&ts(owner))
        .iter()
        .map(|m| format!("{}.{}", m.owner, m.name))
        .collect();
    names.sort();
    names
}

fn find(root: &SyntaxNode, kind: SyntaxKind) -> SyntaxNode {
    root.descendants().find(|n| n.kind() == kind).unwrap()
}

const SHAPES: &str = "\
def_slotted_exemplar(:shape, {})
$
def_slotted_exemplar(:square, {}, {:shape})
$
_method shape.area()
  ## @return {sw:float}
_endmethod
$
_method shape.name
  ## @return {sw:symbol}
_endmethod
$
";

// ── TypeString ─────────────────────────────────────────────────────────

#[test]
fn type_strings_compare_structurally() {
    assert_eq!(
        ts("sw:container<K=sw:symbol,E=sw:simple_vector<E=sw:float>>"),
        ts("sw:container<K=sw:symbol,E=sw:simple_vector<E=sw:float>>")
    );
    assert_ne!(
        ts("sw:container<K=sw:symbol,E=sw:simple_vector<E=sw:float>>"),
        ts("sw:container<K=sw:symbol,E=sw:simple_vector<E=sw:integer>>")
    );
    assert_ne!(ts("sw:rope"), ts("user:rope"));
    assert_eq!(ts("rope"), ts("user:rope"));
}

// ── Resolver ───────────────────────────────────────────────────────────

#[test]
fn inherited_methods_are_found_and_shadowed() {
    let keeper = DefinitionKeeper::with_builtins();
    index(&keeper, "/src/shapes.magik", SHAPES);
    {
        let snapshot = keeper.snapshot();
        let resolver = TypeResolver::new(&snapshot);
        let names = method_names(&resolver, "square");
        assert!(names.contains(&"user:shape.area()".to_string()));
        assert!(names.contains(&"user:shape.name".to_string()));
    }

    index(
        &keeper,
        "/src/square.magik",
        "_method square.area()\n  ## @return {sw:integer}\n_endmethod\n",
    );
    let snapshot = keeper.snapshot();
    let resolver = TypeResolver::new(&snapshot);
    let area = resolver.get_methods_named(&ts("square"), "area");
    assert_eq!(area.len(), 1);
    assert_eq!(area[0].owner, ts("square"));
    assert_eq!(area[0].return_types.to_string(), "sw:integer");
    // Inherited methods without an override are untouched.
    assert!(method_names(&resolver, "square").contains(&"user:shape.name".to_string()));
}

#[test]
fn subtyping_is_asymmetric() {
    let keeper = DefinitionKeeper::with_builtins();
    index(&keeper, "/src/shapes.magik", SHAPES);
    let snapshot = keeper.snapshot();
    let resolver = TypeResolver::new(&snapshot);
    assert!(resolver.is_kind_of(&ts("square"), &ts("shape")));
    assert!(!resolver.is_kind_of(&ts("shape"), &ts("square")));
    assert!(resolver.is_kind_of(&ts("square"), &TypeString::object()));
    assert!(resolver.is_kind_of(&ts("square"), &ts("square")));
}

#[test]
fn generic_results_take_the_instantiation() {
    let keeper = DefinitionKeeper::with_builtins();
    index(
        &keeper,
        "/src/container.magik",
        "\
## @generic K
## @generic E
def_slotted_exemplar(:container, {})
$
_method container.first_key
  ## @return {<K>}
_endmethod
$
",
    );
    let snapshot = keeper.snapshot();
    let resolver = TypeResolver::new(&snapshot);
    let method = resolver
        .get_method(&ts("container<K=sw:symbol,E=sw:float>"), "first_key")
        .unwrap();
    assert_eq!(method.return_types.to_string(), "sw:symbol");
}

#[test]
fn inheritance_cycles_terminate() {
    let keeper = DefinitionKeeper::with_builtins();
    index(
        &keeper,
        "/src/cycle.magik",
        "\
def_slotted_exemplar(:p, {}, {:q})
$
def_slotted_exemplar(:q, {}, {:p})
$
_method q.m
  ## @return {sw:integer}
_endmethod
$
",
    );
    let snapshot = keeper.snapshot();
    let resolver = TypeResolver::new(&snapshot);
    assert_eq!(method_names(&resolver, "p"), vec!["user:q.m"]);
    assert!(resolver.is_kind_of(&ts("p"), &ts("q")));
    assert!(resolver.is_kind_of(&ts("q"), &ts("p")));
    assert!(!resolver.is_kind_of(&ts("p"), &ts("sw:integer")));
}

#[test]
fn last_indexed_definition_wins() {
    let keeper = DefinitionKeeper::with_builtins();
    index(&keeper, "/src/shapes.magik", SHAPES);
    index(
        &keeper,
        "/src/first.magik",
        "_method shape.colour\n  ## @return {sw:symbol}\n_endmethod\n",
    );
    index(
        &keeper,
        "/src/second.magik",
        "_method shape.colour\n  ## @return {sw:integer}\n_endmethod\n",
    );
    let colour = |keeper: &DefinitionKeeper| {
        let snapshot = keeper.snapshot();
        TypeResolver::new(&snapshot)
            .get_method(&ts("square"), "colour")
            .map(|m| m.return_types.to_string())
    };
    assert_eq!(colour(&keeper).as_deref(), Some("sw:integer"));

    keeper.remove_all_for_path(Path::new("/src/second.magik"));
    assert_eq!(colour(&keeper).as_deref(), Some("sw:symbol"));
}

#[test]
fn reindexing_replaces_changed_definitions() {
    let keeper = DefinitionKeeper::with_builtins();
    index(&keeper, "/src/shapes.magik", SHAPES);
    index(
        &keeper,
        "/src/shapes.magik",
        &SHAPES.replace("{sw:float}", "{sw:integer}"),
    );
    let snapshot = keeper.snapshot();
    let areas: Vec<_> = snapshot
        .definitions_for_path(Path::new("/src/shapes.magik"))
        .into_iter()
        .filter_map(|d| match d {
            Definition::Method(m) if m.name == "area()" => Some(m),
            _ => None,
        })
        .collect();
    assert_eq!(areas.len(), 1);
    assert_eq!(areas[0].return_types.to_string(), "sw:integer");
    assert_eq!(snapshot.get_methods(&ts("shape")).len(), 2);
    let resolver = TypeResolver::new(&snapshot);
    assert_eq!(
        resolver
            .get_method(&ts("square"), "area()")
            .map(|m| m.return_types.to_string())
            .as_deref(),
        Some("sw:integer")
    );
}

#[test]
fn methods_on_user_spelled_sw_exemplars() {
    let keeper = DefinitionKeeper::with_builtins();
    index(
        &keeper,
        "/src/twice.magik",
        "_method integer.twice\n  ## @return {sw:integer}\n  _return _self * 2\n_endmethod\n",
    );
    let snapshot = keeper.snapshot();
    let resolver = TypeResolver::new(&snapshot);
    let twice = resolver.get_method(&TypeString::integer(), "twice").unwrap();
    assert_eq!(twice.owner, ts("user:integer"));
    assert_eq!(method_names(&resolver, "user:integer"), method_names(&resolver, "sw:integer"));
    assert_eq!(method_names(&resolver, "integer"), method_names(&resolver, "sw:integer"));

    let parse = magik_parser::parse("_method t.c\n  _local n << 1\n  _return n.twice\n_endmethod\n");
    let analysis = analyze(&parse, &snapshot);
    let method = find(&parse.syntax(), SyntaxKind::METHOD_DEFINITION);
    assert_eq!(
        analysis.reasoning.definition_result(&method).unwrap().to_string(),
        "sw:integer"
    );
}

#[test]
fn operator_cases_on_user_spelled_operands() {
    let keeper = DefinitionKeeper::with_builtins();
    index(
        &keeper,
        "/src/rope.magik",
        "def_slotted_exemplar(:rope, {})\n$\ndefine_binary_operator_case(:|*|, integer, rope,\n  _proc(n, r)\n    ## @return {rope}\n    _return r\n  _endproc)\n$\n",
    );
    let snapshot = keeper.snapshot();
    let resolver = TypeResolver::new(&snapshot);
    assert_eq!(
        resolver.binary_operator("*", &TypeString::integer(), &ts("rope")),
        ts("user:rope")
    );
    assert_eq!(
        resolver.binary_operator("*", &ts("rope"), &TypeString::integer()),
        TypeString::Undefined
    );
}

// ── Reasoner ───────────────────────────────────────────────────────────

#[test]
fn local_assigned_a_literal_returns_its_type() {
    let keeper = DefinitionKeeper::with_builtins();
    let parse = magik_parser::parse("_method a.b\n _local x << 1\n _return x\n_endmethod\n");
    let analysis = analyze(&parse, &keeper.snapshot());
    let root = parse.syntax();

    let ret = find(&root, SyntaxKind::RETURN_STMT);
    let value = ret.children().next().unwrap();
    assert_eq!(analysis.result_type_of(&value).unwrap().to_string(), "sw:integer");
    assert_eq!(analysis.result_type_of(&ret).unwrap().to_string(), "sw:integer");

    let decl = find(&root, SyntaxKind::VARIABLE_DECL);
    let (_, x) = analysis
        .scopes
        .entries()
        .find(|(_, e)| e.name == "x")
        .unwrap();
    assert_eq!(x.kind, EntryKind::Local);
    assert_eq!(x.declaration, decl.text_range());
    assert_eq!(x.usages, vec![value.text_range()]);

    let offset = value.text_range().start();
    let (range, result) = analysis.type_at_offset(offset).unwrap();
    assert_eq!(range, value.text_range());
    assert_eq!(result.to_string(), "sw:integer");
}

#[test]
fn branches_merge_into_a_combination() {
    let keeper = DefinitionKeeper::with_builtins();
    let parse = magik_parser::parse(
        "_method t.c\n  _if cond _then a << 1 _else a << \"s\" _endif\n  _return a\n_endmethod\n",
    );
    let analysis = analyze(&parse, &keeper.snapshot());
    let ret = find(&parse.syntax(), SyntaxKind::RETURN_STMT);
    let value = ret.children().next().unwrap();
    assert_eq!(
        analysis.result_type_of(&value).unwrap().to_string(),
        "sw:integer|sw:char16_vector"
    );
}

#[test]
fn branch_without_else_keeps_the_previous_type() {
    let keeper = DefinitionKeeper::with_builtins();
    let parse = magik_parser::parse(
        "_method t.c\n  _local a << 1\n  _if cond _then a << 2 _endif\n  _return a\n_endmethod\n",
    );
    let analysis = analyze(&parse, &keeper.snapshot());
    let ret = find(&parse.syntax(), SyntaxKind::RETURN_STMT);
    let value = ret.children().next().unwrap();
    assert_eq!(analysis.result_type_of(&value).unwrap().to_string(), "sw:integer");
}

#[test]
fn invocations_use_indexed_methods() {
    let keeper = DefinitionKeeper::with_builtins();
    index(&keeper, "/src/shapes.magik", SHAPES);
    let parse = magik_parser::parse(
        "_method square.double_area()\n  _return _self.area() * 2\n_endmethod\n",
    );
    let analysis = analyze(&parse, &keeper.snapshot());
    let method = find(&parse.syntax(), SyntaxKind::METHOD_DEFINITION);
    assert_eq!(
        analysis.reasoning.definition_result(&method).unwrap().to_string(),
        "sw:float"
    );
}

#[test]
fn unknown_receivers_union_every_owner() {
    let keeper = DefinitionKeeper::with_builtins();
    index(
        &keeper,
        "/src/colours.magik",
        "_method pen.colour\n  ## @return {sw:symbol}\n_endmethod\n$\n_method ink.colour\n  ## @return {sw:integer}\n_endmethod\n$\n_method paint.colour\n  ## @return {sw:symbol}\n_endmethod\n$\n",
    );
    let parse = magik_parser::parse("_method t.c\n  _return mystery.colour\n_endmethod\n");
    let analysis = analyze(&parse, &keeper.snapshot());
    let method = find(&parse.syntax(), SyntaxKind::METHOD_DEFINITION);
    assert_eq!(
        analysis.reasoning.definition_result(&method).unwrap().to_string(),
        "sw:symbol|sw:integer"
    );
}

#[test]
fn comments_do_not_change_scopes() {
    let plain = magik_parser::parse("_method a.b\n  _local x << 1\n  _return x\n_endmethod\n");
    let commented = magik_parser::parse(
        "# mlint: disable=unused-variable\n_method a.b\n  _local x << 1 # mlint: disable\n  _return x\n_endmethod\n",
    );
    let keeper = DefinitionKeeper::with_builtins();
    let entries = |parse: &magik_parser::Parse| -> Vec<(String, EntryKind, usize)> {
        analyze(parse, &keeper.snapshot())
            .scopes
            .entries()
            .map(|(_, e)| (e.name.clone(), e.kind, e.usages.len()))
            .collect()
    };
    assert_eq!(entries(&plain), entries(&commented));
}
