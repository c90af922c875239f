// Magik lexer -- tokenizer for the Magik programming language.

mod cursor;

use cursor::Cursor;
use magik_common::token::{keyword_from_str, Token, TokenKind};

/// The Magik lexer. Converts source text into a lossless stream of tokens.
///
/// Implements `Iterator<Item = Token>`; the final token is always `Eof`.
/// Unknown characters become `Error` tokens and lexing continues.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    /// Set once `Eof` has been produced.
    emitted_eof: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
        }
    }

    /// Lex all of `source` at once.
    ///
    /// The last token is always `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    fn next_token(&mut self) -> Token {
        let start = self.cursor.offset();

        let Some(c) = self.cursor.first() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        match c {
            // ── Trivia ───────────────────────────────────────────────────
            ' ' | '\t' | '\r' => {
                self.cursor.bump_while(|c| c == ' ' || c == '\t' || c == '\r');
                Token::new(TokenKind::Whitespace, start, self.cursor.offset())
            }
            '\n' => self.single_char_token(TokenKind::Newline, start),
            '#' => self.lex_comment(start),

            // ── Single-character delimiters ───────────────────────────────
            '(' => self.single_char_token(TokenKind::LParen, start),
            ')' => self.single_char_token(TokenKind::RParen, start),
            '[' => self.single_char_token(TokenKind::LBracket, start),
            ']' => self.single_char_token(TokenKind::RBracket, start),
            '{' => self.single_char_token(TokenKind::LBrace, start),
            '}' => self.single_char_token(TokenKind::RBrace, start),
            ',' => self.single_char_token(TokenKind::Comma, start),
            '.' => self.single_char_token(TokenKind::Dot, start),
            '$' => self.single_char_token(TokenKind::Dollar, start),
            '=' => self.single_char_token(TokenKind::Eq, start),

            // ── Multi-character operators ─────────────────────────────────
            '<' => self.lex_lt(start),
            '>' => self.lex_gt(start),
            '^' => self.lex_caret(start),
            '~' => self.lex_tilde(start),
            '+' => self.lex_arith(TokenKind::Plus, start),
            '-' => self.lex_arith(TokenKind::Minus, start),
            '/' => self.lex_arith(TokenKind::Slash, start),
            '*' => self.lex_star(start),

            // ── Literals ─────────────────────────────────────────────────
            '0'..='9' => self.lex_number(start),
            '"' | '\'' => self.lex_string(c, start),
            ':' => self.lex_symbol(start),
            '%' => self.lex_char(start),
            '@' => self.lex_label(start),

            // ── Identifiers and keywords ─────────────────────────────────
            c if is_ident_start(c) => self.lex_ident(start),

            _ => {
                self.cursor.bump();
                Token::new(TokenKind::Error, start, self.cursor.offset())
            }
        }
    }

    // ── Helpers ──────────────────────────────────────────────────────────

    fn single_char_token(&mut self, kind: TokenKind, start: u32) -> Token {
        self.cursor.bump();
        Token::new(kind, start, self.cursor.offset())
    }

    fn token_from(&self, kind: TokenKind, start: u32) -> Token {
        Token::new(kind, start, self.cursor.offset())
    }

    /// `# ...` -> `Comment`, `## ...` -> `DocComment`. Both stop before the newline.
    fn lex_comment(&mut self, start: u32) -> Token {
        let kind = if self.cursor.starts_with("##") {
            TokenKind::DocComment
        } else {
            TokenKind::Comment
        };
        self.cursor.bump_while(|c| c != '\n');
        self.token_from(kind, start)
    }

    // ── Operator lexing ──────────────────────────────────────────────────

    /// `<<` -> `Chevron`, `<=` -> `LtEq`, `<>` -> `NotEq`, `<` -> `Lt`
    fn lex_lt(&mut self, start: u32) -> Token {
        self.cursor.bump();
        let kind = match self.cursor.first() {
            Some('<') => TokenKind::Chevron,
            Some('=') => TokenKind::LtEq,
            Some('>') => TokenKind::NotEq,
            _ => return self.token_from(TokenKind::Lt, start),
        };
        self.cursor.bump();
        self.token_from(kind, start)
    }

    /// `>>` -> `Emit`, `>=` -> `GtEq`, `>` -> `Gt`
    fn lex_gt(&mut self, start: u32) -> Token {
        self.cursor.bump();
        let kind = match self.cursor.first() {
            Some('>') => TokenKind::Emit,
            Some('=') => TokenKind::GtEq,
            _ => return self.token_from(TokenKind::Gt, start),
        };
        self.cursor.bump();
        self.token_from(kind, start)
    }

    /// `^<<` -> `BootChevron`, anything else is an error.
    fn lex_caret(&mut self, start: u32) -> Token {
        if self.cursor.eat("^<<") {
            self.token_from(TokenKind::BootChevron, start)
        } else {
            self.single_char_token(TokenKind::Error, start)
        }
    }

    /// `~=` -> `NotEq`, `~` -> `Tilde`
    fn lex_tilde(&mut self, start: u32) -> Token {
        self.cursor.bump();
        if self.cursor.bump_if('=') {
            self.token_from(TokenKind::NotEq, start)
        } else {
            self.token_from(TokenKind::Tilde, start)
        }
    }

    /// `+`, `-`, `/`, or their augmented assignment form `+<<`.
    fn lex_arith(&mut self, plain: TokenKind, start: u32) -> Token {
        self.cursor.bump();
        if self.cursor.eat("<<") {
            self.token_from(TokenKind::AugChevron, start)
        } else {
            self.token_from(plain, start)
        }
    }

    /// `*`, `**`, `*<<`
    fn lex_star(&mut self, start: u32) -> Token {
        if self.cursor.eat("**") {
            self.token_from(TokenKind::StarStar, start)
        } else {
            self.lex_arith(TokenKind::Star, start)
        }
    }

    // ── Literal lexing ───────────────────────────────────────────────────

    /// Integers, radix integers (`16rFF`), and floats (`1.5`, `2e10`, `1.5e-3`).
    fn lex_number(&mut self, start: u32) -> Token {
        self.cursor.bump_while(|c| c.is_ascii_digit());

        if self.cursor.first() == Some('r')
            && self.cursor.lookahead(1).is_some_and(|c| c.is_ascii_alphanumeric())
        {
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_alphanumeric());
            return self.token_from(TokenKind::IntLiteral, start);
        }

        let mut kind = TokenKind::IntLiteral;
        if self.cursor.first() == Some('.') && self.cursor.lookahead(1).is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.bump();
            self.cursor.bump_while(|c| c.is_ascii_digit());
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.cursor.first(), Some('e' | 'E')) {
            let has_exponent = match self.cursor.lookahead(1) {
                Some(c) if c.is_ascii_digit() => true,
                Some('+' | '-') => self.cursor.lookahead(2).is_some_and(|c| c.is_ascii_digit()),
                _ => false,
            };
            if has_exponent {
                self.cursor.bump();
                self.cursor.bump();
                self.cursor.bump_while(|c| c.is_ascii_digit());
                kind = TokenKind::FloatLiteral;
            }
        }

        self.token_from(kind, start)
    }

    /// A string runs to the matching quote. An unterminated string stops at
    /// the end of the line so the rest of the file still lexes.
    fn lex_string(&mut self, quote: char, start: u32) -> Token {
        self.cursor.bump();
        self.cursor.bump_while(|c| c != quote && c != '\n');
        self.cursor.bump_if(quote);
        self.token_from(TokenKind::StringLiteral, start)
    }

    /// `:name`, `:|odd name|`, `:name|with bars|`.
    fn lex_symbol(&mut self, start: u32) -> Token {
        self.cursor.bump();
        let mut consumed = false;
        loop {
            match self.cursor.first() {
                Some('|') => {
                    self.cursor.bump();
                    self.cursor.bump_while(|c| c != '|' && c != '\n');
                    self.cursor.bump_if('|');
                    consumed = true;
                }
                Some(c) if is_ident_continue(c) => {
                    self.cursor.bump_while(is_ident_continue);
                    consumed = true;
                }
                _ => break,
            }
        }
        let kind = if consumed {
            TokenKind::SymbolLiteral
        } else {
            TokenKind::Error
        };
        self.token_from(kind, start)
    }

    /// `%a`, `%space`, `%(`.
    fn lex_char(&mut self, start: u32) -> Token {
        self.cursor.bump();
        match self.cursor.first() {
            Some(c) if c.is_alphabetic() => {
                self.cursor.bump_while(|c| c.is_alphanumeric());
            }
            Some('\n') | None => return self.token_from(TokenKind::Error, start),
            Some(_) => {
                self.cursor.bump();
            }
        }
        self.token_from(TokenKind::CharLiteral, start)
    }

    fn lex_label(&mut self, start: u32) -> Token {
        self.cursor.bump();
        if !self.cursor.first().is_some_and(is_ident_continue) {
            return self.token_from(TokenKind::Error, start);
        }
        self.cursor.bump_while(is_ident_continue);
        self.token_from(TokenKind::Label, start)
    }

    // ── Identifiers and keywords ─────────────────────────────────────────

    /// Lex an identifier or keyword. `pkg:name` without spaces is a single
    /// package-qualified identifier.
    fn lex_ident(&mut self, start: u32) -> Token {
        self.cursor.bump();
        self.cursor.bump_while(is_ident_continue);

        if self.cursor.first() == Some(':') && self.cursor.lookahead(1).is_some_and(is_ident_start) {
            self.cursor.bump();
            self.cursor.bump_while(is_ident_continue);
            return self.token_from(TokenKind::Ident, start);
        }

        let text = self.cursor.since(start);
        let kind = keyword_from_str(text).unwrap_or(TokenKind::Ident);
        self.token_from(kind, start)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }

        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

/// Whether a character can start an identifier. `!` starts dynamic names
/// such as `!output!`.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '!'
}

/// Magik identifiers may contain `?` and `!`.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '?' || c == '!'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::tokenize(source)
            .into_iter()
            .map(|t| t.kind)
            .filter(|k| !k.is_trivia())
            .collect()
    }

    #[test]
    fn lex_local_assignment() {
        assert_eq!(
            kinds("_local x << 1"),
            vec![
                TokenKind::Local,
                TokenKind::Ident,
                TokenKind::Chevron,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_is_lossless() {
        let source = "_method a.b(x)\n  ## @return {sw:integer}\n  _return x # done\n_endmethod\n$\n";
        let rebuilt: String = Lexer::tokenize(source)
            .iter()
            .map(|t| &source[t.span.start as usize..t.span.end as usize])
            .collect();
        assert_eq!(rebuilt, source);
    }

    #[test]
    fn lex_numbers() {
        assert_eq!(
            kinds("42 16rFF 1.5 2e10 1.5e-3"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::FloatLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn integer_followed_by_method_call_is_not_a_float() {
        assert_eq!(
            kinds("1.abs"),
            vec![TokenKind::IntLiteral, TokenKind::Dot, TokenKind::Ident, TokenKind::Eof]
        );
    }

    #[test]
    fn lex_chevrons() {
        assert_eq!(
            kinds("a << b ^<< c +<< d >> e"),
            vec![
                TokenKind::Ident,
                TokenKind::Chevron,
                TokenKind::Ident,
                TokenKind::BootChevron,
                TokenKind::Ident,
                TokenKind::AugChevron,
                TokenKind::Ident,
                TokenKind::Emit,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lex_package_qualified_identifier() {
        let tokens = Lexer::tokenize("sw:rope");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].span.end, 7);
    }

    #[test]
    fn lex_symbol_and_character() {
        assert_eq!(
            kinds(":name :|odd name| %a %space"),
            vec![
                TokenKind::SymbolLiteral,
                TokenKind::SymbolLiteral,
                TokenKind::CharLiteral,
                TokenKind::CharLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn doc_comment_is_distinguished() {
        let tokens = Lexer::tokenize("# plain\n## @return {sw:integer}");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[2].kind, TokenKind::DocComment);
    }

    #[test]
    fn identifiers_may_end_in_punctuation() {
        let tokens = Lexer::tokenize("empty? !output!");
        assert_eq!(tokens[0].kind, TokenKind::Ident);
        assert_eq!(tokens[0].span.end, 6);
        assert_eq!(tokens[2].kind, TokenKind::Ident);
        assert_eq!(tokens[2].span.end, 15);
    }

    #[test]
    fn unterminated_string_stops_at_newline() {
        let tokens = Lexer::tokenize("\"abc\nx");
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].span.end, 4);
        assert_eq!(tokens[2].kind, TokenKind::Ident);
    }

    #[test]
    fn unknown_character_is_error_token() {
        assert_eq!(kinds("?"), vec![TokenKind::Error, TokenKind::Eof]);
    }
}
