//! Method and procedure headers.

use crate::syntax_kind::SyntaxKind;

use super::{body, statements, MarkClosed, Parser};

/// `[_private] [_abstract] [_iter] _method rope.add(e) << v ... _endmethod`
///
/// Accepted header shapes: `a.b`, `a.b(params)`, `a.b << v`,
/// `a.b(params) << v`, `a[params]`, `a[params] << v`.
pub(crate) fn method_definition(p: &mut Parser) {
    let m = p.open();
    while p.at_any(&[
        SyntaxKind::PRIVATE_KW,
        SyntaxKind::ABSTRACT_KW,
        SyntaxKind::ITER_KW,
    ]) {
        p.advance();
    }

    let opened = p.current_span();
    if !p.expect(SyntaxKind::METHOD_KW) {
        p.close(m, SyntaxKind::METHOD_DEFINITION);
        return;
    }

    let exemplar = p.open();
    p.expect(SyntaxKind::IDENT);
    p.close(exemplar, SyntaxKind::EXEMPLAR_NAME);

    if p.eat(SyntaxKind::DOT) {
        let name = p.open();
        p.expect(SyntaxKind::IDENT);
        p.close(name, SyntaxKind::METHOD_NAME);
        if p.at(SyntaxKind::L_PAREN) {
            param_list(p, SyntaxKind::R_PAREN);
        }
    } else if p.at(SyntaxKind::L_BRACKET) {
        param_list(p, SyntaxKind::R_BRACKET);
    } else {
        p.error("expected `.` or `[` after the exemplar name");
    }

    if p.at_any(&[SyntaxKind::CHEVRON, SyntaxKind::BOOT_CHEVRON]) {
        let assign = p.open();
        p.advance();
        param(p);
        p.close(assign, SyntaxKind::ASSIGNMENT_PARAM);
    }

    body(p);
    p.expect_closing(SyntaxKind::ENDMETHOD_KW, opened, "method");
    p.close(m, SyntaxKind::METHOD_DEFINITION);
}

/// `_proc @label(params) ... _endproc`
pub(crate) fn proc_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let opened = p.current_span();
    p.advance(); // _proc
    if !p.at_line_break() {
        p.eat(SyntaxKind::LABEL);
    }
    if p.at(SyntaxKind::L_PAREN) {
        param_list(p, SyntaxKind::R_PAREN);
    } else {
        p.error("expected `(` after `_proc`");
    }
    body(p);
    p.expect_closing(SyntaxKind::ENDPROC_KW, opened, "procedure");
    p.close(m, SyntaxKind::PROC_EXPR)
}

/// `(a, _optional b, c, _gather d)` or `[i, j]`.
fn param_list(p: &mut Parser, close: SyntaxKind) {
    let m = p.open();
    p.advance(); // ( or [
    while !p.at(close) && !p.at(SyntaxKind::EOF) {
        let before = p.position();
        param(p);
        if p.position() == before || !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(close);
    p.close(m, SyntaxKind::PARAM_LIST);
}

/// `_optional` and `_gather` apply to this and every following parameter;
/// the AST layer resolves that, the tree keeps the keyword on the first one.
fn param(p: &mut Parser) {
    let m = p.open();
    p.eat(SyntaxKind::OPTIONAL_KW);
    p.eat(SyntaxKind::GATHER_KW);
    statements::name(p);
    p.close(m, SyntaxKind::PARAM);
}
