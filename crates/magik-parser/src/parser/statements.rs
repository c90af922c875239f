//! Statement parsing: declarations, returns, emits, loop control, package
//! and pragma directives. Anything else is an expression statement.

use crate::syntax_kind::SyntaxKind;

use super::{definitions, expressions, Parser};

/// Declaration keywords that may start (and be combined in) a variable
/// declaration, e.g. `_global _constant`.
const DECL_KEYWORDS: &[SyntaxKind] = &[
    SyntaxKind::LOCAL_KW,
    SyntaxKind::CONSTANT_KW,
    SyntaxKind::DYNAMIC_KW,
    SyntaxKind::GLOBAL_KW,
    SyntaxKind::IMPORT_KW,
    SyntaxKind::RECURSIVE_KW,
];

/// Parse a single statement.
pub(crate) fn statement(p: &mut Parser) {
    match p.current() {
        SyntaxKind::METHOD_KW
        | SyntaxKind::PRIVATE_KW
        | SyntaxKind::ABSTRACT_KW
        | SyntaxKind::ITER_KW => definitions::method_definition(p),

        kind if DECL_KEYWORDS.contains(&kind) => variable_decl(p),

        SyntaxKind::RETURN_KW => value_statement(p, SyntaxKind::RETURN_STMT),
        SyntaxKind::EMIT => value_statement(p, SyntaxKind::EMIT_STMT),
        SyntaxKind::LEAVE_KW => loop_control(p, SyntaxKind::LEAVE_STMT),
        SyntaxKind::CONTINUE_KW => loop_control(p, SyntaxKind::CONTINUE_STMT),
        SyntaxKind::LOOPBODY_KW => loopbody(p),
        SyntaxKind::PACKAGE_KW => package_spec(p),
        SyntaxKind::PRAGMA_KW => pragma(p),

        _ => {
            if expressions::at_expr_start(p) {
                expressions::expr(p);
            }
        }
    }
}

/// `_local a << 1, (b, c) << x.y(), d`
fn variable_decl(p: &mut Parser) {
    let m = p.open();
    while p.at_any(DECL_KEYWORDS) {
        p.advance();
    }

    loop {
        decl_item(p);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }

    p.close(m, SyntaxKind::VARIABLE_DECL);
}

fn decl_item(p: &mut Parser) {
    let m = p.open();
    if p.eat(SyntaxKind::L_PAREN) {
        loop {
            name(p);
            if !p.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        p.expect(SyntaxKind::R_PAREN);
    } else {
        name(p);
    }

    if p.at_any(&[SyntaxKind::CHEVRON, SyntaxKind::BOOT_CHEVRON]) {
        p.advance();
        expressions::expr(p);
    }
    p.close(m, SyntaxKind::DECL_ITEM);
}

/// A name in a defining position.
pub(crate) fn name(p: &mut Parser) {
    if p.at(SyntaxKind::IDENT) {
        let m = p.open();
        p.advance();
        p.close(m, SyntaxKind::NAME);
    } else {
        p.error("expected identifier");
    }
}

/// `_return a, b` and `>> a, b`. Values must start on the same line.
fn value_statement(p: &mut Parser, kind: SyntaxKind) {
    let m = p.open();
    p.advance(); // keyword
    if !p.at_line_break() && expressions::at_expr_start(p) {
        expressions::expr_list(p);
    }
    p.close(m, kind);
}

/// `_leave @label _with a, b` and `_continue`.
fn loop_control(p: &mut Parser, kind: SyntaxKind) {
    let m = p.open();
    p.advance(); // keyword
    if !p.at_line_break() {
        p.eat(SyntaxKind::LABEL);
    }
    if p.eat(SyntaxKind::WITH_KW) {
        expressions::expr_list(p);
    }
    p.close(m, kind);
}

/// `_loopbody(a, b)`
fn loopbody(p: &mut Parser) {
    let m = p.open();
    p.advance(); // _loopbody
    if p.at(SyntaxKind::L_PAREN) {
        expressions::arg_list(p);
    } else {
        p.error("expected `(` after `_loopbody`");
    }
    p.close(m, SyntaxKind::LOOPBODY_STMT);
}

/// `_package sw`
fn package_spec(p: &mut Parser) {
    let m = p.open();
    p.advance(); // _package
    p.expect(SyntaxKind::IDENT);
    p.close(m, SyntaxKind::PACKAGE_SPEC);
}

/// `_pragma(classify_level=basic, topic={a,b})`. The contents are kept as
/// tokens; nothing downstream interprets them.
fn pragma(p: &mut Parser) {
    let m = p.open();
    p.advance(); // _pragma
    if p.expect(SyntaxKind::L_PAREN) {
        let mut depth = 1u32;
        while depth > 0 && !p.at(SyntaxKind::EOF) {
            match p.current() {
                SyntaxKind::L_PAREN => depth += 1,
                SyntaxKind::R_PAREN => depth -= 1,
                _ => {}
            }
            p.advance();
        }
    }
    p.close(m, SyntaxKind::PRAGMA);
}
