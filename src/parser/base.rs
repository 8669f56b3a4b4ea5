//! Parser infrastructure: the token cursor.
//!
//! Dieter's grammar is identifier-heavy. A qualifier list is an arbitrary
//! run of identifiers terminated by a base-type keyword or the `♥` sigil,
//! and most statements begin with an identifier whose *next* token decides
//! the production (`(` call, `[` indexed assignment, `:=` assignment). The
//! cursor therefore exposes identifier-taking primitives alongside keyword
//! matching, and `bump` hands back the consumed span so span bookkeeping
//! needs no separate lookups.

use crate::ast::Span;
use crate::diag::Diag;
use crate::lexer::token::{Token, TokenKind};
use smol_str::SmolStr;

/// Error type for parsing operations.
pub type ParseError = Box<Diag>;

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Cursor over a lexed token stream.
///
/// Invariant: the slice is non-empty and ends with `Eof` (the lexer and the
/// outer parser both guarantee this), and the cursor never moves past that
/// final token.
pub struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    last_span: Span,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at the start of a token stream.
    pub fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(
            matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)),
            "cursor requires an Eof-terminated token stream"
        );
        Self {
            tokens,
            pos: 0,
            last_span: 0..0,
        }
    }

    /// The token under the cursor.
    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Consumes the current token, returning its span. Sticks at `Eof`.
    pub fn bump(&mut self) -> Span {
        let span = self.peek().span.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        self.last_span = span.clone();
        span
    }

    /// True if the current token is `kind`.
    pub fn at(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    /// Consumes the current token when it is `kind`.
    pub fn eat(&mut self, kind: &TokenKind) -> bool {
        let hit = self.at(kind);
        if hit {
            self.bump();
        }
        hit
    }

    /// Consumes any run of statement-separating semicolons.
    ///
    /// `;` appears in the token set but in no production; it is accepted as
    /// optional trivia between statements and declarations.
    pub fn eat_semicolons(&mut self) {
        while self.eat(&TokenKind::Semicolon) {}
    }

    /// Consumes the current token when it is `kind`, or reports what was
    /// found instead.
    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Span> {
        if self.at(&kind) {
            Ok(self.bump())
        } else {
            Err(self.unexpected(format!("expected {}", kind)))
        }
    }

    /// Consumes an identifier, if one is under the cursor.
    ///
    /// The workhorse of type parsing: a qualifier list is exactly the run of
    /// identifiers this yields before the bare type begins. Statement and
    /// expression parsing use it the same way to commit to the
    /// identifier-first productions.
    pub fn take_identifier(&mut self) -> Option<(SmolStr, Span)> {
        match &self.peek().kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.bump();
                Some((name, span))
            }
            _ => None,
        }
    }

    /// Consumes an identifier or reports what was expected in its place.
    pub fn expect_identifier(&mut self, what: &str) -> ParseResult<(SmolStr, Span)> {
        match self.take_identifier() {
            Some(found) => Ok(found),
            None => Err(self.unexpected(format!("expected {}", what))),
        }
    }

    /// Builds an error at the current token, naming what was found.
    pub fn unexpected(&self, what: impl Into<String>) -> ParseError {
        let token = self.peek();
        Box::new(Diag::error(
            token.span.clone(),
            format!("{}, found {}", what.into(), token.kind),
            "unexpected token",
        ))
    }

    /// Span of the most recently consumed token.
    pub fn prev_span(&self) -> Span {
        self.last_span.clone()
    }
}
