//! Recursive-descent parser for Magik producing a lossless rowan tree.
//!
//! Grammar functions never build nodes directly. They record a flat list of
//! [`Event`]s: a node is started with [`Parser::open`], filled by
//! [`Parser::advance`], and named when [`Parser::close`] is called. A node
//! whose role is only known after it was parsed (the receiver of
//! `rope.size`, the target of `x << 1`) is wrapped with
//! [`Parser::open_before`]. [`Parser::build_tree`] replays the events into a
//! green tree.
//!
//! Lookahead skips whitespace, newlines and comments. `open()` emits pending
//! trivia into the enclosing node first, so a node's range covers exactly
//! the text of its construct.
//!
//! Syntax errors are collected, never fatal. Statement sequences that fail
//! to make progress wrap the offending token in an `ERROR_NODE` and move on.

pub(crate) mod definitions;
pub(crate) mod expressions;
pub(crate) mod statements;

use magik_common::span::Span;
use magik_common::token::{Token, TokenKind};

use crate::error::ParseError;
use crate::syntax_kind::SyntaxKind;

#[derive(Debug)]
enum Event {
    /// Starts a node. `kind` stays `TOMBSTONE` until the matching `close()`.
    /// `wrapped_by` points at the `Open` of a node created later by
    /// `open_before()` that must enclose this one.
    Open {
        kind: SyntaxKind,
        wrapped_by: Option<usize>,
    },
    Close,
    /// One token, trivia included.
    Advance,
}

/// A node that has been opened but not closed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkOpened {
    index: usize,
}

/// A finished node, which `open_before()` can still wrap.
#[derive(Debug, Clone, Copy)]
pub(crate) struct MarkClosed {
    index: usize,
}

pub(crate) struct Parser<'src> {
    /// Every token, trivia and the final `Eof` included.
    tokens: Vec<Token>,
    pos: usize,
    events: Vec<Event>,
    source: &'src str,
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        Self {
            tokens,
            pos: 0,
            events: Vec::new(),
            source,
            errors: Vec::new(),
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> SyntaxKind {
        self.nth(0)
    }

    /// Kind of the `n`th non-trivia token from here; `EOF` past the end.
    pub(crate) fn nth(&self, n: usize) -> SyntaxKind {
        let mut remaining = n;
        for token in &self.tokens[self.pos.min(self.tokens.len())..] {
            if token.kind.is_trivia() {
                continue;
            }
            if remaining == 0 {
                return SyntaxKind::from(token.kind);
            }
            remaining -= 1;
        }
        SyntaxKind::EOF
    }

    pub(crate) fn current_text(&self) -> &str {
        let pos = self.skip_to_significant(self.pos);
        match self.tokens.get(pos) {
            Some(token) => &self.source[token.span.start as usize..token.span.end as usize],
            None => "",
        }
    }

    /// At end of input, an empty span at the end of the source.
    pub(crate) fn current_span(&self) -> Span {
        let pos = self.skip_to_significant(self.pos);
        match self.tokens.get(pos) {
            Some(token) => token.span,
            None => {
                let end = self.source.len() as u32;
                Span::new(end, end)
            }
        }
    }

    pub(crate) fn at(&self, kind: SyntaxKind) -> bool {
        self.current() == kind
    }

    pub(crate) fn at_any(&self, kinds: &[SyntaxKind]) -> bool {
        kinds.contains(&self.current())
    }

    /// Whether a newline separates the previous significant token from the
    /// current one. Postfix operators and statement values only continue on
    /// the same line.
    pub(crate) fn at_line_break(&self) -> bool {
        self.tokens[self.pos.min(self.tokens.len())..]
            .iter()
            .take_while(|t| t.kind.is_trivia())
            .any(|t| t.kind == TokenKind::Newline)
    }

    /// Index of the next token to consume. Used by sequence parsers to
    /// detect a lack of progress.
    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    // ── Nodes ──────────────────────────────────────────────────────────

    /// Pending trivia goes to the enclosing node first. The root has no
    /// enclosing node, so it starts before any leading trivia.
    pub(crate) fn open(&mut self) -> MarkOpened {
        if !self.events.is_empty() {
            self.flush_trivia();
        }
        self.push_open()
    }

    /// Open a node that will enclose `completed`.
    pub(crate) fn open_before(&mut self, completed: MarkClosed) -> MarkOpened {
        let mark = self.push_open();
        if let Event::Open { wrapped_by, .. } = &mut self.events[completed.index] {
            *wrapped_by = Some(mark.index);
        }
        mark
    }

    pub(crate) fn close(&mut self, m: MarkOpened, kind: SyntaxKind) -> MarkClosed {
        if let Event::Open { kind: pending, .. } = &mut self.events[m.index] {
            *pending = kind;
        }
        self.events.push(Event::Close);
        MarkClosed { index: m.index }
    }

    fn push_open(&mut self) -> MarkOpened {
        self.events.push(Event::Open {
            kind: SyntaxKind::TOMBSTONE,
            wrapped_by: None,
        });
        MarkOpened {
            index: self.events.len() - 1,
        }
    }

    // ── Mutation: token consumption ────────────────────────────────────

    /// Consume the next non-trivia token and the trivia before it.
    pub(crate) fn advance(&mut self) {
        self.flush_trivia();
        if self.pos < self.tokens.len() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    /// Consume the current token wrapped in an ERROR_NODE.
    pub(crate) fn advance_with_error(&mut self, message: &str) {
        self.error(message);
        let m = self.open();
        self.advance();
        self.close(m, SyntaxKind::ERROR_NODE);
    }

    /// Consume `kind` or record an error without consuming anything.
    pub(crate) fn expect(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            self.error(&format!("expected {}", describe(kind)));
            false
        }
    }

    /// Like [`Parser::expect`], with a pointer back to the opening keyword.
    pub(crate) fn expect_closing(&mut self, kind: SyntaxKind, opened: Span, what: &str) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            let span = self.current_span();
            self.errors
                .push(ParseError::unclosed(&describe(kind), span, what, opened));
            false
        }
    }

    pub(crate) fn eat(&mut self, kind: SyntaxKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Error reporting ────────────────────────────────────────────────

    pub(crate) fn error(&mut self, message: &str) {
        let span = self.current_span();
        self.errors.push(ParseError::new(message, span));
    }

    // ── Trivia ─────────────────────────────────────────────────────────

    fn flush_trivia(&mut self) {
        while self.pos < self.tokens.len() && self.tokens[self.pos].kind.is_trivia() {
            self.events.push(Event::Advance);
            self.pos += 1;
        }
    }

    fn skip_to_significant(&self, mut pos: usize) -> usize {
        while pos < self.tokens.len() && self.tokens[pos].kind.is_trivia() {
            pos += 1;
        }
        pos
    }

    // ── Tree building ──────────────────────────────────────────────────

    /// Replay the events into a green tree.
    ///
    /// An `Open` with a `wrapped_by` link starts a chain: the node itself,
    /// the node wrapping it, the node wrapping that, and so on. The chain is
    /// started outermost first, here, and the later `Open` events of the
    /// wrappers are blanked so they are not started twice.
    pub(crate) fn build_tree(mut self) -> (rowan::GreenNode, Vec<ParseError>) {
        let mut builder = rowan::GreenNodeBuilder::new();
        let mut tokens = self.tokens.iter();
        let mut chain: Vec<SyntaxKind> = Vec::new();

        for i in 0..self.events.len() {
            match self.events[i] {
                Event::Open { kind, wrapped_by: None } => {
                    if kind != SyntaxKind::TOMBSTONE {
                        builder.start_node(rowan::SyntaxKind(kind as u16));
                    }
                }
                Event::Open { kind, wrapped_by: Some(mut next) } => {
                    chain.clear();
                    chain.push(kind);
                    loop {
                        let Event::Open { kind, wrapped_by } = std::mem::replace(
                            &mut self.events[next],
                            Event::Open {
                                kind: SyntaxKind::TOMBSTONE,
                                wrapped_by: None,
                            },
                        ) else {
                            break;
                        };
                        chain.push(kind);
                        match wrapped_by {
                            Some(outer) => next = outer,
                            None => break,
                        }
                    }
                    for &kind in chain.iter().rev() {
                        if kind != SyntaxKind::TOMBSTONE {
                            builder.start_node(rowan::SyntaxKind(kind as u16));
                        }
                    }
                }
                Event::Close => builder.finish_node(),
                Event::Advance => {
                    if let Some(token) = tokens.next() {
                        let kind = SyntaxKind::from(token.kind);
                        let text = &self.source[token.span.start as usize..token.span.end as usize];
                        builder.token(rowan::SyntaxKind(kind as u16), text);
                    }
                }
            }
        }

        (builder.finish(), self.errors)
    }
}

/// Human-readable name of a token kind for error messages.
fn describe(kind: SyntaxKind) -> String {
    match kind {
        SyntaxKind::IDENT => "identifier".to_string(),
        SyntaxKind::L_PAREN => "`(`".to_string(),
        SyntaxKind::R_PAREN => "`)`".to_string(),
        SyntaxKind::R_BRACKET => "`]`".to_string(),
        SyntaxKind::R_BRACE => "`}`".to_string(),
        other => {
            let name = format!("{other:?}");
            match name.strip_suffix("_KW") {
                Some(keyword) => format!("`_{}`", keyword.to_ascii_lowercase()),
                None => name,
            }
        }
    }
}

// ── Top-level parsing ──────────────────────────────────────────────────

/// Parse a complete source file.
///
/// Top-level chunks are statement sequences separated by `$`.
pub(crate) fn parse_source_file(p: &mut Parser) {
    let root = p.open();

    loop {
        while p.eat(SyntaxKind::DOLLAR) {}
        if p.at(SyntaxKind::EOF) {
            break;
        }

        let before = p.position();
        statements::statement(p);
        if p.position() == before {
            p.advance_with_error("unexpected token at top level");
        }
    }

    // EOF carries the trailing trivia.
    p.advance();
    p.close(root, SyntaxKind::SOURCE_FILE);
}

/// Parse statements until a body terminator, wrapped in a BODY node.
pub(crate) fn body(p: &mut Parser) {
    let m = p.open();
    while !p.current().is_body_terminator() {
        let before = p.position();
        statements::statement(p);
        if p.position() == before {
            p.advance_with_error("unexpected token");
        }
    }
    p.close(m, SyntaxKind::BODY);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_keywords_and_tokens() {
        assert_eq!(describe(SyntaxKind::ENDMETHOD_KW), "`_endmethod`");
        assert_eq!(describe(SyntaxKind::IDENT), "identifier");
        assert_eq!(describe(SyntaxKind::CHEVRON), "CHEVRON");
    }
}
