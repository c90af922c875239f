//! SyntaxKind enum for the Magik CST.
//!
//! A superset of `TokenKind` (mapped to SCREAMING_SNAKE_CASE) plus the
//! composite node kinds produced by the parser.

use magik_common::token::TokenKind;

/// Every kind of syntax element in the Magik CST.
///
/// The first two values are sentinels used by the event-based parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u16)]
#[allow(non_camel_case_types)]
pub enum SyntaxKind {
    // ── Sentinels ──────────────────────────────────────────────────────
    /// Kind of an opened node until `close()` names it.
    TOMBSTONE = 0,
    /// Tokens the grammar could not place.
    ERROR_NODE = 1,

    // ── Keywords ───────────────────────────────────────────────────────
    ABSTRACT_KW,
    AND_KW,
    ANDIF_KW,
    BLOCK_KW,
    CF_KW,
    CLONE_KW,
    CONSTANT_KW,
    CONTINUE_KW,
    DIV_KW,
    DYNAMIC_KW,
    ELIF_KW,
    ELSE_KW,
    ENDBLOCK_KW,
    ENDIF_KW,
    ENDLOOP_KW,
    ENDMETHOD_KW,
    ENDPROC_KW,
    ENDPROTECT_KW,
    ENDTRY_KW,
    FALSE_KW,
    FINALLY_KW,
    FOR_KW,
    GATHER_KW,
    GLOBAL_KW,
    IF_KW,
    IMPORT_KW,
    IS_KW,
    ISNT_KW,
    ITER_KW,
    LEAVE_KW,
    LOCAL_KW,
    LOOP_KW,
    LOOPBODY_KW,
    MAYBE_KW,
    METHOD_KW,
    MOD_KW,
    NOT_KW,
    OPTIONAL_KW,
    OR_KW,
    ORIF_KW,
    OVER_KW,
    PACKAGE_KW,
    PRAGMA_KW,
    PRIVATE_KW,
    PROC_KW,
    PROTECT_KW,
    PROTECTION_KW,
    RECURSIVE_KW,
    REM_KW,
    RETURN_KW,
    SCATTER_KW,
    SELF_KW,
    SUPER_KW,
    THEN_KW,
    TRUE_KW,
    TRY_KW,
    UNSET_KW,
    WHEN_KW,
    WHILE_KW,
    WITH_KW,
    XOR_KW,

    // ── Operators ──────────────────────────────────────────────────────
    CHEVRON,
    BOOT_CHEVRON,
    AUG_CHEVRON,
    EMIT,
    PLUS,
    MINUS,
    STAR,
    STAR_STAR,
    SLASH,
    EQ,
    NOT_EQ,
    LT,
    GT,
    LT_EQ,
    GT_EQ,
    TILDE,

    // ── Delimiters and punctuation ─────────────────────────────────────
    L_PAREN,
    R_PAREN,
    L_BRACKET,
    R_BRACKET,
    L_BRACE,
    R_BRACE,
    COMMA,
    DOT,
    DOLLAR,

    // ── Literals, identifiers, trivia ──────────────────────────────────
    INT_NUMBER,
    FLOAT_NUMBER,
    STRING,
    SYMBOL,
    CHARACTER,
    LABEL,
    IDENT,
    WHITESPACE,
    NEWLINE,
    COMMENT,
    DOC_COMMENT,
    EOF,
    ERROR,

    // ── Composite node kinds ───────────────────────────────────────────
    /// Root node of a parsed file.
    SOURCE_FILE,
    /// `_package sw`
    PACKAGE_SPEC,
    /// `_pragma(classify_level=basic)`
    PRAGMA,
    /// `_private _method rope.add(e) ... _endmethod`
    METHOD_DEFINITION,
    /// The `rope` in `_method rope.add(e)`.
    EXEMPLAR_NAME,
    /// The `add` in `_method rope.add(e)`.
    METHOD_NAME,
    /// `(a, _optional b, _gather c)` or `[i]` in a method/procedure header.
    PARAM_LIST,
    PARAM,
    /// `<< value` in `_method rope.size << value`.
    ASSIGNMENT_PARAM,
    /// Sequence of statements.
    BODY,
    /// `_local a << 1, (b, c) << x.y()`
    VARIABLE_DECL,
    /// One declared target (or parenthesized target list) with its value.
    DECL_ITEM,
    /// Name in a definition position.
    NAME,
    /// `_return a, b`
    RETURN_STMT,
    /// `>> a, b`
    EMIT_STMT,
    /// `_leave @label _with a`
    LEAVE_STMT,
    /// `_continue @label _with a`
    CONTINUE_STMT,
    /// `_loopbody(a, b)`
    LOOPBODY_STMT,
    /// Number, string, symbol, character, boolean, `_maybe`, `_unset`.
    LITERAL,
    /// Identifier used as an expression.
    NAME_REF,
    /// `_self` or `_clone`
    SELF_EXPR,
    /// `_super` or `_super(parent)`
    SUPER_EXPR,
    /// `.slot` inside a method body.
    SLOT_REF,
    /// `{a, b, c}`
    SIMPLE_VECTOR,
    /// `(expr)`
    PAREN_EXPR,
    /// `(a, b)` as a multiple-assignment target.
    TUPLE_EXPR,
    /// `a << b`, `a ^<< b`, `a +<< b`
    ASSIGNMENT_EXPR,
    /// `a + b`, `a _is b`, etc.
    BINARY_EXPR,
    /// `-a`, `_not a`, `_scatter a`
    UNARY_EXPR,
    /// `receiver.name(args) << value`
    METHOD_INVOCATION,
    /// `callee(args)`
    PROCEDURE_INVOCATION,
    /// `receiver[args] << value`
    INDEX_EXPR,
    /// `(a, b)` or `[a, b]` at a call site.
    ARG_LIST,
    IF_EXPR,
    ELIF_CLAUSE,
    ELSE_CLAUSE,
    /// `_for`/`_while`/bare `_loop ... _endloop`.
    LOOP_EXPR,
    /// `_for a, b _over expr`
    FOR_CLAUSE,
    /// `_while expr`
    WHILE_CLAUSE,
    /// `_finally ...` at the end of a loop.
    FINALLY_CLAUSE,
    BLOCK_EXPR,
    /// `_proc @name(params) ... _endproc`
    PROC_EXPR,
    /// `_try _with c ... _when error ... _endtry`
    TRY_EXPR,
    WHEN_CLAUSE,
    PROTECT_EXPR,
    PROTECTION_CLAUSE,
}

impl SyntaxKind {
    /// Whitespace, newlines and comments, `##` type docs included.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            SyntaxKind::WHITESPACE | SyntaxKind::NEWLINE | SyntaxKind::COMMENT | SyntaxKind::DOC_COMMENT
        )
    }

    /// Keywords and `$` that close a statement sequence.
    pub fn is_body_terminator(self) -> bool {
        matches!(
            self,
            SyntaxKind::ENDMETHOD_KW
                | SyntaxKind::ENDPROC_KW
                | SyntaxKind::ENDIF_KW
                | SyntaxKind::ELIF_KW
                | SyntaxKind::ELSE_KW
                | SyntaxKind::ENDLOOP_KW
                | SyntaxKind::FINALLY_KW
                | SyntaxKind::ENDBLOCK_KW
                | SyntaxKind::WHEN_KW
                | SyntaxKind::ENDTRY_KW
                | SyntaxKind::PROTECTION_KW
                | SyntaxKind::ENDPROTECT_KW
                | SyntaxKind::DOLLAR
                | SyntaxKind::EOF
        )
    }
}

impl From<TokenKind> for SyntaxKind {
    fn from(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Abstract => SyntaxKind::ABSTRACT_KW,
            TokenKind::And => SyntaxKind::AND_KW,
            TokenKind::Andif => SyntaxKind::ANDIF_KW,
            TokenKind::Block => SyntaxKind::BLOCK_KW,
            TokenKind::Cf => SyntaxKind::CF_KW,
            TokenKind::Clone => SyntaxKind::CLONE_KW,
            TokenKind::Constant => SyntaxKind::CONSTANT_KW,
            TokenKind::Continue => SyntaxKind::CONTINUE_KW,
            TokenKind::Div => SyntaxKind::DIV_KW,
            TokenKind::Dynamic => SyntaxKind::DYNAMIC_KW,
            TokenKind::Elif => SyntaxKind::ELIF_KW,
            TokenKind::Else => SyntaxKind::ELSE_KW,
            TokenKind::Endblock => SyntaxKind::ENDBLOCK_KW,
            TokenKind::Endif => SyntaxKind::ENDIF_KW,
            TokenKind::Endloop => SyntaxKind::ENDLOOP_KW,
            TokenKind::Endmethod => SyntaxKind::ENDMETHOD_KW,
            TokenKind::Endproc => SyntaxKind::ENDPROC_KW,
            TokenKind::Endprotect => SyntaxKind::ENDPROTECT_KW,
            TokenKind::Endtry => SyntaxKind::ENDTRY_KW,
            TokenKind::False => SyntaxKind::FALSE_KW,
            TokenKind::Finally => SyntaxKind::FINALLY_KW,
            TokenKind::For => SyntaxKind::FOR_KW,
            TokenKind::Gather => SyntaxKind::GATHER_KW,
            TokenKind::Global => SyntaxKind::GLOBAL_KW,
            TokenKind::If => SyntaxKind::IF_KW,
            TokenKind::Import => SyntaxKind::IMPORT_KW,
            TokenKind::Is => SyntaxKind::IS_KW,
            TokenKind::Isnt => SyntaxKind::ISNT_KW,
            TokenKind::Iter => SyntaxKind::ITER_KW,
            TokenKind::Leave => SyntaxKind::LEAVE_KW,
            TokenKind::Local => SyntaxKind::LOCAL_KW,
            TokenKind::Loop => SyntaxKind::LOOP_KW,
            TokenKind::Loopbody => SyntaxKind::LOOPBODY_KW,
            TokenKind::Maybe => SyntaxKind::MAYBE_KW,
            TokenKind::Method => SyntaxKind::METHOD_KW,
            TokenKind::Mod => SyntaxKind::MOD_KW,
            TokenKind::Not => SyntaxKind::NOT_KW,
            TokenKind::Optional => SyntaxKind::OPTIONAL_KW,
            TokenKind::Or => SyntaxKind::OR_KW,
            TokenKind::Orif => SyntaxKind::ORIF_KW,
            TokenKind::Over => SyntaxKind::OVER_KW,
            TokenKind::Package => SyntaxKind::PACKAGE_KW,
            TokenKind::Pragma => SyntaxKind::PRAGMA_KW,
            TokenKind::Private => SyntaxKind::PRIVATE_KW,
            TokenKind::Proc => SyntaxKind::PROC_KW,
            TokenKind::Protect => SyntaxKind::PROTECT_KW,
            TokenKind::Protection => SyntaxKind::PROTECTION_KW,
            TokenKind::Recursive => SyntaxKind::RECURSIVE_KW,
            TokenKind::Rem => SyntaxKind::REM_KW,
            TokenKind::Return => SyntaxKind::RETURN_KW,
            TokenKind::Scatter => SyntaxKind::SCATTER_KW,
            TokenKind::SelfKw => SyntaxKind::SELF_KW,
            TokenKind::Super => SyntaxKind::SUPER_KW,
            TokenKind::Then => SyntaxKind::THEN_KW,
            TokenKind::True => SyntaxKind::TRUE_KW,
            TokenKind::Try => SyntaxKind::TRY_KW,
            TokenKind::Unset => SyntaxKind::UNSET_KW,
            TokenKind::When => SyntaxKind::WHEN_KW,
            TokenKind::While => SyntaxKind::WHILE_KW,
            TokenKind::With => SyntaxKind::WITH_KW,
            TokenKind::Xor => SyntaxKind::XOR_KW,
            TokenKind::Chevron => SyntaxKind::CHEVRON,
            TokenKind::BootChevron => SyntaxKind::BOOT_CHEVRON,
            TokenKind::AugChevron => SyntaxKind::AUG_CHEVRON,
            TokenKind::Emit => SyntaxKind::EMIT,
            TokenKind::Plus => SyntaxKind::PLUS,
            TokenKind::Minus => SyntaxKind::MINUS,
            TokenKind::Star => SyntaxKind::STAR,
            TokenKind::StarStar => SyntaxKind::STAR_STAR,
            TokenKind::Slash => SyntaxKind::SLASH,
            TokenKind::Eq => SyntaxKind::EQ,
            TokenKind::NotEq => SyntaxKind::NOT_EQ,
            TokenKind::Lt => SyntaxKind::LT,
            TokenKind::Gt => SyntaxKind::GT,
            TokenKind::LtEq => SyntaxKind::LT_EQ,
            TokenKind::GtEq => SyntaxKind::GT_EQ,
            TokenKind::Tilde => SyntaxKind::TILDE,
            TokenKind::LParen => SyntaxKind::L_PAREN,
            TokenKind::RParen => SyntaxKind::R_PAREN,
            TokenKind::LBracket => SyntaxKind::L_BRACKET,
            TokenKind::RBracket => SyntaxKind::R_BRACKET,
            TokenKind::LBrace => SyntaxKind::L_BRACE,
            TokenKind::RBrace => SyntaxKind::R_BRACE,
            TokenKind::Comma => SyntaxKind::COMMA,
            TokenKind::Dot => SyntaxKind::DOT,
            TokenKind::Dollar => SyntaxKind::DOLLAR,
            TokenKind::IntLiteral => SyntaxKind::INT_NUMBER,
            TokenKind::FloatLiteral => SyntaxKind::FLOAT_NUMBER,
            TokenKind::StringLiteral => SyntaxKind::STRING,
            TokenKind::SymbolLiteral => SyntaxKind::SYMBOL,
            TokenKind::CharLiteral => SyntaxKind::CHARACTER,
            TokenKind::Label => SyntaxKind::LABEL,
            TokenKind::Ident => SyntaxKind::IDENT,
            TokenKind::Whitespace => SyntaxKind::WHITESPACE,
            TokenKind::Newline => SyntaxKind::NEWLINE,
            TokenKind::Comment => SyntaxKind::COMMENT,
            TokenKind::DocComment => SyntaxKind::DOC_COMMENT,
            TokenKind::Eof => SyntaxKind::EOF,
            TokenKind::Error => SyntaxKind::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_have_fixed_values() {
        assert_eq!(SyntaxKind::TOMBSTONE as u16, 0);
        assert_eq!(SyntaxKind::ERROR_NODE as u16, 1);
    }

    #[test]
    fn token_kinds_map_to_syntax_kinds() {
        assert_eq!(SyntaxKind::from(TokenKind::Method), SyntaxKind::METHOD_KW);
        assert_eq!(SyntaxKind::from(TokenKind::SelfKw), SyntaxKind::SELF_KW);
        assert_eq!(SyntaxKind::from(TokenKind::Chevron), SyntaxKind::CHEVRON);
        assert_eq!(SyntaxKind::from(TokenKind::IntLiteral), SyntaxKind::INT_NUMBER);
        assert_eq!(SyntaxKind::from(TokenKind::DocComment), SyntaxKind::DOC_COMMENT);
    }

    #[test]
    fn trivia_and_terminators() {
        assert!(SyntaxKind::WHITESPACE.is_trivia());
        assert!(!SyntaxKind::IDENT.is_trivia());
        assert!(SyntaxKind::ENDMETHOD_KW.is_body_terminator());
        assert!(SyntaxKind::DOLLAR.is_body_terminator());
        assert!(!SyntaxKind::RETURN_KW.is_body_terminator());
    }
}
