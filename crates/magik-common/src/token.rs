use serde::Serialize;

use crate::span::Span;

/// A token produced by the Magik lexer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in Magik.
///
/// The lexer is lossless: whitespace, newlines and comments are tokens too,
/// so concatenating all token texts reproduces the source exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // ── Keywords ───────────────────────────────────────────────────────
    Abstract,
    And,
    Andif,
    Block,
    Cf,
    Clone,
    Constant,
    Continue,
    Div,
    Dynamic,
    Elif,
    Else,
    Endblock,
    Endif,
    Endloop,
    Endmethod,
    Endproc,
    Endprotect,
    Endtry,
    False,
    Finally,
    For,
    Gather,
    Global,
    If,
    Import,
    Is,
    Isnt,
    Iter,
    Leave,
    Local,
    Loop,
    Loopbody,
    Maybe,
    Method,
    Mod,
    Not,
    Optional,
    Or,
    Orif,
    Over,
    Package,
    Pragma,
    Private,
    Proc,
    Protect,
    Protection,
    Recursive,
    Rem,
    Return,
    Scatter,
    /// `_self`. Named `SelfKw` to avoid conflict with Rust's `Self`.
    SelfKw,
    Super,
    Then,
    True,
    Try,
    Unset,
    When,
    While,
    With,
    Xor,

    // ── Operators ──────────────────────────────────────────────────────
    /// `<<`
    Chevron,
    /// `^<<`
    BootChevron,
    /// `+<<`, `-<<`, `*<<`, `/<<`
    AugChevron,
    /// `>>`
    Emit,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `**`
    StarStar,
    /// `/`
    Slash,
    /// `=`
    Eq,
    /// `~=` or `<>`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `~`
    Tilde,

    // ── Delimiters ─────────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // ── Punctuation ────────────────────────────────────────────────────
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `$` chunk terminator.
    Dollar,

    // ── Literals ───────────────────────────────────────────────────────
    /// Integer literal, e.g. `42`, `16rFF`.
    IntLiteral,
    /// Floating-point literal, e.g. `3.14`, `1.0e10`.
    FloatLiteral,
    /// `"text"` or `'text'`.
    StringLiteral,
    /// `:name` or `:|odd name|`.
    SymbolLiteral,
    /// `%a`, `%space`.
    CharLiteral,
    /// `@name`, used by `_proc`, `_block`, `_loop` and `_leave`.
    Label,

    // ── Identifiers and trivia ─────────────────────────────────────────
    /// Identifier, possibly package qualified, e.g. `size?`, `sw:rope`.
    Ident,
    /// Spaces, tabs and carriage returns.
    Whitespace,
    Newline,
    /// `# ...`
    Comment,
    /// `## ...` type-doc comment.
    DocComment,

    // ── Special ────────────────────────────────────────────────────────
    Eof,
    /// Invalid/unexpected input. Used for error recovery.
    Error,
}

impl TokenKind {
    /// Tokens the parser skips over when looking ahead.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment | TokenKind::DocComment
        )
    }
}

/// Look up a keyword from its spelling, leading underscore included.
///
/// Magik keywords are case-insensitive, so `_ENDMETHOD` is `Endmethod`.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    let lower = s.to_ascii_lowercase();
    let kind = match lower.as_str() {
        "_abstract" => TokenKind::Abstract,
        "_and" => TokenKind::And,
        "_andif" => TokenKind::Andif,
        "_block" => TokenKind::Block,
        "_cf" => TokenKind::Cf,
        "_clone" => TokenKind::Clone,
        "_constant" => TokenKind::Constant,
        "_continue" => TokenKind::Continue,
        "_div" => TokenKind::Div,
        "_dynamic" => TokenKind::Dynamic,
        "_elif" => TokenKind::Elif,
        "_else" => TokenKind::Else,
        "_endblock" => TokenKind::Endblock,
        "_endif" => TokenKind::Endif,
        "_endloop" => TokenKind::Endloop,
        "_endmethod" => TokenKind::Endmethod,
        "_endproc" => TokenKind::Endproc,
        "_endprotect" => TokenKind::Endprotect,
        "_endtry" => TokenKind::Endtry,
        "_false" => TokenKind::False,
        "_finally" => TokenKind::Finally,
        "_for" => TokenKind::For,
        "_gather" => TokenKind::Gather,
        "_global" => TokenKind::Global,
        "_if" => TokenKind::If,
        "_import" => TokenKind::Import,
        "_is" => TokenKind::Is,
        "_isnt" => TokenKind::Isnt,
        "_iter" => TokenKind::Iter,
        "_leave" => TokenKind::Leave,
        "_local" => TokenKind::Local,
        "_loop" => TokenKind::Loop,
        "_loopbody" => TokenKind::Loopbody,
        "_maybe" => TokenKind::Maybe,
        "_method" => TokenKind::Method,
        "_mod" => TokenKind::Mod,
        "_not" => TokenKind::Not,
        "_optional" => TokenKind::Optional,
        "_or" => TokenKind::Or,
        "_orif" => TokenKind::Orif,
        "_over" => TokenKind::Over,
        "_package" => TokenKind::Package,
        "_pragma" => TokenKind::Pragma,
        "_private" => TokenKind::Private,
        "_proc" => TokenKind::Proc,
        "_protect" => TokenKind::Protect,
        "_protection" => TokenKind::Protection,
        "_recursive" => TokenKind::Recursive,
        "_rem" => TokenKind::Rem,
        "_return" => TokenKind::Return,
        "_scatter" => TokenKind::Scatter,
        "_self" => TokenKind::SelfKw,
        "_super" => TokenKind::Super,
        "_then" => TokenKind::Then,
        "_true" => TokenKind::True,
        "_try" => TokenKind::Try,
        "_unset" => TokenKind::Unset,
        "_when" => TokenKind::When,
        "_while" => TokenKind::While,
        "_with" => TokenKind::With,
        "_xor" => TokenKind::Xor,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_from_str_recognizes_keywords() {
        let keywords = [
            ("_method", TokenKind::Method),
            ("_endmethod", TokenKind::Endmethod),
            ("_local", TokenKind::Local),
            ("_return", TokenKind::Return),
            ("_self", TokenKind::SelfKw),
            ("_loopbody", TokenKind::Loopbody),
            ("_protection", TokenKind::Protection),
            ("_xor", TokenKind::Xor),
        ];
        for (text, expected) in keywords {
            assert_eq!(keyword_from_str(text), Some(expected), "keyword: {text}");
        }
    }

    #[test]
    fn keywords_are_case_insensitive() {
        assert_eq!(keyword_from_str("_ENDMETHOD"), Some(TokenKind::Endmethod));
        assert_eq!(keyword_from_str("_Self"), Some(TokenKind::SelfKw));
    }

    #[test]
    fn non_keywords_return_none() {
        assert_eq!(keyword_from_str("method"), None);
        assert_eq!(keyword_from_str("_methods"), None);
        assert_eq!(keyword_from_str("_"), None);
    }

    #[test]
    fn token_new_creates_span() {
        let token = Token::new(TokenKind::Ident, 5, 10);
        assert_eq!(token.kind, TokenKind::Ident);
        assert_eq!(token.span, Span::new(5, 10));
    }

    #[test]
    fn trivia_kinds() {
        assert!(TokenKind::Whitespace.is_trivia());
        assert!(TokenKind::DocComment.is_trivia());
        assert!(!TokenKind::Ident.is_trivia());
        assert!(!TokenKind::Dollar.is_trivia());
    }
}
