//! Pratt expression parser for Magik.
//!
//! Implements operator precedence parsing using binding power tables and
//! the compound expressions (`_if`, loops, `_block`, `_proc`, `_try`,
//! `_protect`) that Magik treats as expressions.

use crate::syntax_kind::SyntaxKind;

use super::{body, definitions, statements, MarkClosed, Parser};

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp) for infix operators.
///
/// Left < right means left-associative. Assignment and `**` are
/// right-associative.
fn infix_binding_power(op: SyntaxKind) -> Option<(u8, u8)> {
    match op {
        SyntaxKind::CHEVRON | SyntaxKind::BOOT_CHEVRON | SyntaxKind::AUG_CHEVRON => Some((2, 1)),

        SyntaxKind::OR_KW | SyntaxKind::ORIF_KW => Some((3, 4)),

        SyntaxKind::AND_KW | SyntaxKind::ANDIF_KW => Some((5, 6)),

        SyntaxKind::XOR_KW => Some((7, 8)),

        SyntaxKind::EQ
        | SyntaxKind::NOT_EQ
        | SyntaxKind::IS_KW
        | SyntaxKind::ISNT_KW
        | SyntaxKind::CF_KW => Some((9, 10)),

        SyntaxKind::LT | SyntaxKind::GT | SyntaxKind::LT_EQ | SyntaxKind::GT_EQ => Some((11, 12)),

        SyntaxKind::PLUS | SyntaxKind::MINUS => Some((13, 14)),

        SyntaxKind::STAR
        | SyntaxKind::SLASH
        | SyntaxKind::DIV_KW
        | SyntaxKind::MOD_KW
        | SyntaxKind::REM_KW => Some((15, 16)),

        SyntaxKind::STAR_STAR => Some((18, 17)),

        _ => None,
    }
}

/// Returns ((), right_bp) for prefix operators.
fn prefix_binding_power(op: SyntaxKind) -> Option<((), u8)> {
    match op {
        SyntaxKind::MINUS | SyntaxKind::PLUS | SyntaxKind::TILDE => Some(((), 19)),
        SyntaxKind::NOT_KW => Some(((), 19)),
        SyntaxKind::SCATTER_KW | SyntaxKind::GATHER_KW => Some(((), 1)),
        _ => None,
    }
}

/// Postfix operations (invocation, method call, indexing) bind tighter than
/// every prefix and infix operator.
const POSTFIX_BP: u8 = 21;

/// Whether the current token can start an expression.
pub(crate) fn at_expr_start(p: &Parser) -> bool {
    let current = p.current();
    prefix_binding_power(current).is_some()
        || matches!(
            current,
            SyntaxKind::INT_NUMBER
                | SyntaxKind::FLOAT_NUMBER
                | SyntaxKind::STRING
                | SyntaxKind::SYMBOL
                | SyntaxKind::CHARACTER
                | SyntaxKind::TRUE_KW
                | SyntaxKind::FALSE_KW
                | SyntaxKind::MAYBE_KW
                | SyntaxKind::UNSET_KW
                | SyntaxKind::IDENT
                | SyntaxKind::SELF_KW
                | SyntaxKind::CLONE_KW
                | SyntaxKind::SUPER_KW
                | SyntaxKind::DOT
                | SyntaxKind::L_BRACE
                | SyntaxKind::L_PAREN
                | SyntaxKind::IF_KW
                | SyntaxKind::FOR_KW
                | SyntaxKind::WHILE_KW
                | SyntaxKind::LOOP_KW
                | SyntaxKind::BLOCK_KW
                | SyntaxKind::PROC_KW
                | SyntaxKind::TRY_KW
                | SyntaxKind::PROTECT_KW
        )
}

// ── Expression Entry Point ─────────────────────────────────────────────

/// Parse an expression at the default (lowest) binding power.
pub(crate) fn expr(p: &mut Parser) {
    expr_bp(p, 0);
}

/// Parse `a, b, c`.
pub(crate) fn expr_list(p: &mut Parser) {
    loop {
        expr(p);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
}

/// Parse `(a, b)` or `[a, b]` into an ARG_LIST node.
pub(crate) fn arg_list(p: &mut Parser) {
    let close = if p.at(SyntaxKind::L_BRACKET) {
        SyntaxKind::R_BRACKET
    } else {
        SyntaxKind::R_PAREN
    };
    let m = p.open();
    p.advance(); // ( or [
    while !p.at(close) && !p.at(SyntaxKind::EOF) {
        if !at_expr_start(p) {
            break;
        }
        expr(p);
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(close);
    p.close(m, SyntaxKind::ARG_LIST);
}

/// Parse an expression with the given minimum binding power.
fn expr_bp(p: &mut Parser, min_bp: u8) -> Option<MarkClosed> {
    let mut lhs = lhs(p)?;

    loop {
        let current = p.current();
        let same_line = !p.at_line_break();

        // ── Postfix: method invocation `.name(args) << value` ──
        if current == SyntaxKind::DOT && same_line && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            p.advance(); // .
            p.expect(SyntaxKind::IDENT);
            if p.at(SyntaxKind::L_PAREN) && !p.at_line_break() {
                arg_list(p);
            }
            assigned_value(p);
            lhs = p.close(m, SyntaxKind::METHOD_INVOCATION);
            continue;
        }

        // ── Postfix: procedure invocation ──
        if current == SyntaxKind::L_PAREN && same_line && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            arg_list(p);
            lhs = p.close(m, SyntaxKind::PROCEDURE_INVOCATION);
            continue;
        }

        // ── Postfix: index access `[args] << value` ──
        if current == SyntaxKind::L_BRACKET && same_line && POSTFIX_BP >= min_bp {
            let m = p.open_before(lhs);
            arg_list(p);
            assigned_value(p);
            lhs = p.close(m, SyntaxKind::INDEX_EXPR);
            continue;
        }

        // ── Infix operators ──
        if let Some((l_bp, r_bp)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }

            let m = p.open_before(lhs);
            p.advance(); // operator
            if expr_bp(p, r_bp).is_none() {
                p.error("expected expression after operator");
            }

            let kind = match current {
                SyntaxKind::CHEVRON | SyntaxKind::BOOT_CHEVRON | SyntaxKind::AUG_CHEVRON => {
                    SyntaxKind::ASSIGNMENT_EXPR
                }
                _ => SyntaxKind::BINARY_EXPR,
            };
            lhs = p.close(m, kind);
            continue;
        }

        break;
    }

    Some(lhs)
}

/// `<< value` directly after a method name or index makes it an assignment
/// method such as `name<<` or `[]<<`.
fn assigned_value(p: &mut Parser) {
    if p.at_any(&[SyntaxKind::CHEVRON, SyntaxKind::BOOT_CHEVRON]) && !p.at_line_break() {
        p.advance();
        if expr_bp(p, 1).is_none() {
            p.error("expected expression after `<<`");
        }
    }
}

// ── Atom / Prefix Parsing (LHS) ───────────────────────────────────────

/// Parse the left-hand side of an expression: an atom or a prefix operator.
fn lhs(p: &mut Parser) -> Option<MarkClosed> {
    let current = p.current();

    if let Some(((), r_bp)) = prefix_binding_power(current) {
        let m = p.open();
        p.advance(); // operator
        if expr_bp(p, r_bp).is_none() {
            p.error("expected expression after prefix operator");
        }
        return Some(p.close(m, SyntaxKind::UNARY_EXPR));
    }

    let closed = match current {
        SyntaxKind::INT_NUMBER
        | SyntaxKind::FLOAT_NUMBER
        | SyntaxKind::STRING
        | SyntaxKind::SYMBOL
        | SyntaxKind::CHARACTER
        | SyntaxKind::TRUE_KW
        | SyntaxKind::FALSE_KW
        | SyntaxKind::MAYBE_KW
        | SyntaxKind::UNSET_KW => single_token(p, SyntaxKind::LITERAL),

        SyntaxKind::IDENT => single_token(p, SyntaxKind::NAME_REF),

        SyntaxKind::SELF_KW | SyntaxKind::CLONE_KW => single_token(p, SyntaxKind::SELF_EXPR),

        SyntaxKind::SUPER_KW => {
            let m = p.open();
            p.advance(); // _super
            if p.at(SyntaxKind::L_PAREN) && !p.at_line_break() {
                p.advance();
                p.expect(SyntaxKind::IDENT);
                p.expect(SyntaxKind::R_PAREN);
            }
            p.close(m, SyntaxKind::SUPER_EXPR)
        }

        // `.slot`
        SyntaxKind::DOT => {
            let m = p.open();
            p.advance(); // .
            p.expect(SyntaxKind::IDENT);
            p.close(m, SyntaxKind::SLOT_REF)
        }

        SyntaxKind::L_BRACE => {
            let m = p.open();
            p.advance(); // {
            while !p.at(SyntaxKind::R_BRACE) && at_expr_start(p) {
                expr(p);
                if !p.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
            p.expect(SyntaxKind::R_BRACE);
            p.close(m, SyntaxKind::SIMPLE_VECTOR)
        }

        SyntaxKind::L_PAREN => paren_or_tuple(p),

        SyntaxKind::IF_KW => if_expr(p),
        SyntaxKind::FOR_KW | SyntaxKind::WHILE_KW | SyntaxKind::LOOP_KW => loop_expr(p),
        SyntaxKind::BLOCK_KW => block_expr(p),
        SyntaxKind::PROC_KW => definitions::proc_expr(p),
        SyntaxKind::TRY_KW => try_expr(p),
        SyntaxKind::PROTECT_KW => protect_expr(p),

        _ => {
            p.error("expected expression");
            return None;
        }
    };
    Some(closed)
}

fn single_token(p: &mut Parser, kind: SyntaxKind) -> MarkClosed {
    let m = p.open();
    p.advance();
    p.close(m, kind)
}

/// `(expr)` or `(a, b)`; the latter is a multiple-assignment target.
fn paren_or_tuple(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    p.advance(); // (
    let mut count = 0;
    while !p.at(SyntaxKind::R_PAREN) && at_expr_start(p) {
        expr(p);
        count += 1;
        if !p.eat(SyntaxKind::COMMA) {
            break;
        }
    }
    p.expect(SyntaxKind::R_PAREN);
    let kind = if count == 1 {
        SyntaxKind::PAREN_EXPR
    } else {
        SyntaxKind::TUPLE_EXPR
    };
    p.close(m, kind)
}

// ── Compound expressions ───────────────────────────────────────────────

/// `_if c _then ... _elif c _then ... _else ... _endif`
fn if_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let opened = p.current_span();
    p.advance(); // _if
    expr(p);
    p.expect(SyntaxKind::THEN_KW);
    body(p);

    while p.at(SyntaxKind::ELIF_KW) {
        let elif = p.open();
        p.advance(); // _elif
        expr(p);
        p.expect(SyntaxKind::THEN_KW);
        body(p);
        p.close(elif, SyntaxKind::ELIF_CLAUSE);
    }

    if p.at(SyntaxKind::ELSE_KW) {
        let else_clause = p.open();
        p.advance(); // _else
        body(p);
        p.close(else_clause, SyntaxKind::ELSE_CLAUSE);
    }

    p.expect_closing(SyntaxKind::ENDIF_KW, opened, "`_if`");
    p.close(m, SyntaxKind::IF_EXPR)
}

/// `_for a, b _over expr _loop @label ... _finally ... _endloop`,
/// `_while expr _loop ... _endloop`, `_loop ... _endloop`.
fn loop_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let opened = p.current_span();

    match p.current() {
        SyntaxKind::FOR_KW => {
            let clause = p.open();
            p.advance(); // _for
            loop {
                statements::name(p);
                if !p.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
            p.expect(SyntaxKind::OVER_KW);
            expr(p);
            p.close(clause, SyntaxKind::FOR_CLAUSE);
        }
        SyntaxKind::WHILE_KW => {
            let clause = p.open();
            p.advance(); // _while
            expr(p);
            p.close(clause, SyntaxKind::WHILE_CLAUSE);
        }
        _ => {}
    }

    p.expect(SyntaxKind::LOOP_KW);
    if !p.at_line_break() {
        p.eat(SyntaxKind::LABEL);
    }
    body(p);

    if p.at(SyntaxKind::FINALLY_KW) {
        let finally = p.open();
        p.advance(); // _finally
        if p.eat(SyntaxKind::WITH_KW) {
            loop {
                statements::name(p);
                if !p.eat(SyntaxKind::COMMA) {
                    break;
                }
            }
        }
        body(p);
        p.close(finally, SyntaxKind::FINALLY_CLAUSE);
    }

    p.expect_closing(SyntaxKind::ENDLOOP_KW, opened, "loop");
    p.close(m, SyntaxKind::LOOP_EXPR)
}

/// `_block @label ... _endblock`
fn block_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let opened = p.current_span();
    p.advance(); // _block
    if !p.at_line_break() {
        p.eat(SyntaxKind::LABEL);
    }
    body(p);
    p.expect_closing(SyntaxKind::ENDBLOCK_KW, opened, "`_block`");
    p.close(m, SyntaxKind::BLOCK_EXPR)
}

/// `_try _with cond ... _when error, warning ... _endtry`
fn try_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let opened = p.current_span();
    p.advance(); // _try
    if p.eat(SyntaxKind::WITH_KW) {
        statements::name(p);
    }
    body(p);

    while p.at(SyntaxKind::WHEN_KW) {
        let when = p.open();
        p.advance(); // _when
        loop {
            p.expect(SyntaxKind::IDENT);
            if !p.eat(SyntaxKind::COMMA) {
                break;
            }
        }
        body(p);
        p.close(when, SyntaxKind::WHEN_CLAUSE);
    }

    p.expect_closing(SyntaxKind::ENDTRY_KW, opened, "`_try`");
    p.close(m, SyntaxKind::TRY_EXPR)
}

/// `_protect ... _protection ... _endprotect`
fn protect_expr(p: &mut Parser) -> MarkClosed {
    let m = p.open();
    let opened = p.current_span();
    p.advance(); // _protect
    body(p);
    if p.at(SyntaxKind::PROTECTION_KW) {
        let protection = p.open();
        p.advance();
        body(p);
        p.close(protection, SyntaxKind::PROTECTION_CLAUSE);
    } else {
        p.error("expected `_protection`");
    }
    p.expect_closing(SyntaxKind::ENDPROTECT_KW, opened, "`_protect`");
    p.close(m, SyntaxKind::PROTECT_EXPR)
}
