//! Lexical analysis.
//!
//! A hand-written, error-tolerant scanner that converts source text into a
//! token stream. Invalid input produces a diagnostic and scanning continues,
//! so one pass surfaces every lexical problem. The token stream always ends
//! with an `Eof` token.

pub mod token;

use crate::diag::Diag;
use token::{Token, TokenKind, lookup_keyword};

/// Result of lexical analysis: tokens plus any diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexerResult {
    /// The tokens produced, including a trailing EOF token.
    pub tokens: Vec<Token>,
    /// Diagnostics encountered while scanning.
    pub diagnostics: Vec<Diag>,
}

/// Tokenizes source text.
pub fn tokenize(source: &str) -> LexerResult {
    Lexer::new(source).tokenize()
}

/// A lexical analyzer over source text.
pub struct Lexer<'a> {
    source: &'a str,
    pos: usize,
    tokens: Vec<Token>,
    diagnostics: Vec<Diag>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            pos: 0,
            tokens: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// Tokenizes the source text, consuming the lexer.
    pub fn tokenize(mut self) -> LexerResult {
        while !self.is_at_end() {
            self.skip_whitespace();
            if self.is_at_end() {
                break;
            }
            self.scan_token();
        }

        let eof_pos = self.source.len();
        self.tokens
            .push(Token::new(TokenKind::Eof, eof_pos..eof_pos));

        LexerResult {
            tokens: self.tokens,
            diagnostics: self.diagnostics,
        }
    }

    fn scan_token(&mut self) {
        let start = self.pos;
        let ch = self.advance();

        match ch {
            '(' => self.add_token(TokenKind::LParen, start),
            ')' => self.add_token(TokenKind::RParen, start),
            '[' => self.add_token(TokenKind::LBracket, start),
            ']' => self.add_token(TokenKind::RBracket, start),
            ';' => self.add_token(TokenKind::Semicolon, start),
            ',' => self.add_token(TokenKind::Comma, start),
            '.' => self.add_token(TokenKind::Dot, start),
            '<' => self.add_token(TokenKind::Lt, start),

            ':' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Assign, start);
                } else {
                    self.add_token(TokenKind::Colon, start);
                }
            }

            '\u{2665}' => self.add_token(TokenKind::Heart, start),

            '"' => self.scan_string_literal(start),

            '0'..='9' => self.scan_number(start),

            'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier_or_keyword(start),

            _ => {
                self.error(
                    start..self.pos,
                    format!("invalid character '{}'", ch.escape_default()),
                    "this character",
                );
                // Recovery: the character is already consumed; keep scanning.
            }
        }
    }

    fn scan_identifier_or_keyword(&mut self, start: usize) {
        while self.peek().is_some_and(is_identifier_continue) {
            self.advance();
        }

        let text = &self.source[start..self.pos];
        match lookup_keyword(text) {
            Some(kind) => self.add_token(kind, start),
            None => self.add_token(TokenKind::Identifier(text.into()), start),
        }
    }

    fn scan_number(&mut self, start: usize) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let text = &self.source[start..self.pos];
        self.add_token(TokenKind::IntegerLiteral(text.into()), start);
    }

    fn scan_string_literal(&mut self, start: usize) {
        let content_start = self.pos;
        loop {
            match self.peek() {
                Some('"') => {
                    let text = &self.source[content_start..self.pos];
                    self.advance();
                    self.add_token(TokenKind::StringLiteral(text.into()), start);
                    return;
                }
                Some('\n') | None => {
                    self.error(
                        start..start + 1,
                        "unterminated string literal",
                        "string opened here",
                    );
                    let text = &self.source[content_start..self.pos];
                    self.add_token(TokenKind::StringLiteral(text.into()), start);
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek().expect("advance past end of input");
        self.pos += ch.len_utf8();
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn add_token(&mut self, kind: TokenKind, start: usize) {
        self.tokens.push(Token::new(kind, start..self.pos));
    }

    fn error(
        &mut self,
        span: crate::ast::Span,
        message: impl Into<String>,
        label: impl Into<String>,
    ) {
        self.diagnostics.push(Diag::error(span, message, label));
    }
}

fn is_identifier_continue(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_input_yields_eof() {
        let result = tokenize("");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Eof);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("module person end"),
            vec![
                TokenKind::Module,
                TokenKind::Identifier("person".into()),
                TokenKind::End,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn assign_vs_colon() {
        assert_eq!(
            kinds("x : int x := y"),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Colon,
                TokenKind::Int,
                TokenKind::Identifier("x".into()),
                TokenKind::Assign,
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn heart_sigil_spans_utf8() {
        let result = tokenize("\u{2665}t");
        assert_eq!(result.tokens[0].kind, TokenKind::Heart);
        // The sigil is three bytes in UTF-8.
        assert_eq!(result.tokens[0].span, 0..3);
        assert_eq!(result.tokens[1].kind, TokenKind::Identifier("t".into()));
        assert_eq!(result.tokens[1].span, 3..4);
    }

    #[test]
    fn integer_and_string_literals() {
        assert_eq!(
            kinds("42 \"hello\""),
            vec![
                TokenKind::IntegerLiteral("42".into()),
                TokenKind::StringLiteral("hello".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_reported_and_recovered() {
        let result = tokenize("\"oops");
        assert_eq!(result.diagnostics.len(), 1);
        assert!(result.diagnostics[0].message.contains("unterminated"));
        assert_eq!(
            result.tokens[0].kind,
            TokenKind::StringLiteral("oops".into())
        );
        assert_eq!(result.tokens.last().map(|t| &t.kind), Some(&TokenKind::Eof));
    }

    #[test]
    fn invalid_character_is_reported_and_skipped() {
        let result = tokenize("x @ y");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(
            result
                .tokens
                .iter()
                .map(|t| t.kind.clone())
                .collect::<Vec<_>>(),
            vec![
                TokenKind::Identifier("x".into()),
                TokenKind::Identifier("y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn ordering_declaration_tokens() {
        assert_eq!(
            kinds("order beefy < gnarly"),
            vec![
                TokenKind::Order,
                TokenKind::Identifier("beefy".into()),
                TokenKind::Lt,
                TokenKind::Identifier("gnarly".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn program_terminator_dot() {
        assert_eq!(kinds("."), vec![TokenKind::Dot, TokenKind::Eof]);
    }
}
