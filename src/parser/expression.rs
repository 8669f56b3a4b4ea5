//! Expression parsing.

use crate::ast::{Expr, merge_spans};
use crate::lexer::token::TokenKind;
use crate::parser::base::ParseResult;
use crate::parser::program::ProgramParser;

impl ProgramParser<'_> {
    pub(crate) fn parse_expr(&mut self) -> ParseResult<Expr> {
        // Identifier-first forms: variable, map read, call.
        if let Some((name, name_span)) = self.cursor.take_identifier() {
            return match &self.cursor.peek().kind {
                TokenKind::LParen => {
                    let call = self.parse_call_args(name, name_span)?;
                    Ok(Expr::Call(call))
                }
                TokenKind::LBracket => {
                    self.cursor.bump();
                    let index = self.parse_expr()?;
                    let end = self.cursor.expect(TokenKind::RBracket)?;
                    let span = merge_spans(&name_span, &end);
                    Ok(Expr::Index {
                        target: name,
                        target_span: name_span,
                        index: Box::new(index),
                        span,
                    })
                }
                _ => Ok(Expr::Var(name, name_span)),
            };
        }

        match self.cursor.peek().kind.clone() {
            TokenKind::LParen => {
                let start = self.cursor.bump();
                let inner = self.parse_expr()?;
                let end = self.cursor.expect(TokenKind::RParen)?;
                Ok(Expr::Paren(Box::new(inner), merge_spans(&start, &end)))
            }

            TokenKind::Bestow => {
                let start = self.cursor.bump();
                let (qualifier, qualifier_span) =
                    self.cursor.expect_identifier("qualifier name")?;
                let value = self.parse_expr()?;
                let span = merge_spans(&start, &value.span());
                Ok(Expr::Bestow {
                    qualifier,
                    qualifier_span,
                    value: Box::new(value),
                    span,
                })
            }

            TokenKind::Super => Ok(Expr::Super(self.cursor.bump())),

            TokenKind::IntegerLiteral(text) => Ok(Expr::IntLit(text, self.cursor.bump())),

            TokenKind::StringLiteral(text) => Ok(Expr::StrLit(text, self.cursor.bump())),

            _ => Err(self.cursor.unexpected("expected an expression")),
        }
    }
}
