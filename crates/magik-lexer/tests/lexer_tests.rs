use insta::assert_snapshot;
use magik_lexer::Lexer;

/// Render significant tokens as `Kind "text"` lines for snapshot testing.
fn render(source: &str) -> String {
    Lexer::tokenize(source)
        .into_iter()
        .filter(|tok| !tok.kind.is_trivia())
        .map(|tok| {
            let text = &source[tok.span.start as usize..tok.span.end as usize];
            format!("{:?} {:?}", tok.kind, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Definitions ──────────────────────────────────────────────────────────

#[test]
fn test_method_definition() {
    let source = "_private _method rope.add(e, _optional f)\n  _return _self\n_endmethod";
    assert_snapshot!(render(source), @r###"
    Private "_private"
    Method "_method"
    Ident "rope"
    Dot "."
    Ident "add"
    LParen "("
    Ident "e"
    Comma ","
    Optional "_optional"
    Ident "f"
    RParen ")"
    Return "_return"
    SelfKw "_self"
    Endmethod "_endmethod"
    Eof ""
    "###);
}

#[test]
fn test_exemplar_definition_call() {
    let source = "def_slotted_exemplar(:rope, {{:items, _unset}}, {:object})";
    assert_snapshot!(render(source), @r###"
    Ident "def_slotted_exemplar"
    LParen "("
    SymbolLiteral ":rope"
    Comma ","
    LBrace "{"
    LBrace "{"
    SymbolLiteral ":items"
    Comma ","
    Unset "_unset"
    RBrace "}"
    RBrace "}"
    Comma ","
    LBrace "{"
    SymbolLiteral ":object"
    RBrace "}"
    RParen ")"
    Eof ""
    "###);
}

// ── Control flow ─────────────────────────────────────────────────────────

#[test]
fn test_loop_with_label() {
    let source = "_for k, e _over x.fast_keys_and_elements() _loop @outer _leave @outer _endloop";
    assert_snapshot!(render(source), @r###"
    For "_for"
    Ident "k"
    Comma ","
    Ident "e"
    Over "_over"
    Ident "x"
    Dot "."
    Ident "fast_keys_and_elements"
    LParen "("
    RParen ")"
    Loop "_loop"
    Label "@outer"
    Leave "_leave"
    Label "@outer"
    Endloop "_endloop"
    Eof ""
    "###);
}
