//! Type expression parsing.
//!
//! `Type ::= { qualName } BareType`: the qualifier list is exactly the run
//! of identifiers [`Cursor::take_identifier`] yields before a base-type
//! keyword, `map`, or the `♥` sigil. Qualifier lists are canonicalized
//! (sorted, deduplicated) by the AST constructor.
//!
//! [`Cursor::take_identifier`]: crate::parser::base::Cursor::take_identifier

use crate::ast::{BareTypeExpr, QualifierRef, TypeExpr, merge_spans};
use crate::lexer::token::TokenKind;
use crate::parser::base::ParseResult;
use crate::parser::program::ProgramParser;

impl ProgramParser<'_> {
    pub(crate) fn parse_type(&mut self) -> ParseResult<TypeExpr> {
        let start = self.cursor.peek().span.clone();

        let mut qualifiers = Vec::new();
        while let Some((name, span)) = self.cursor.take_identifier() {
            qualifiers.push(QualifierRef { name, span });
        }

        let base = match &self.cursor.peek().kind {
            TokenKind::Bool => {
                self.cursor.bump();
                BareTypeExpr::Bool
            }
            TokenKind::Int => {
                self.cursor.bump();
                BareTypeExpr::Int
            }
            TokenKind::Rat => {
                self.cursor.bump();
                BareTypeExpr::Rat
            }
            TokenKind::StringTy => {
                self.cursor.bump();
                BareTypeExpr::String
            }
            TokenKind::Ref => {
                self.cursor.bump();
                BareTypeExpr::Ref
            }
            TokenKind::Void => {
                self.cursor.bump();
                BareTypeExpr::Void
            }

            TokenKind::Heart => {
                self.cursor.bump();
                let (name, _) = self.cursor.expect_identifier("type variable name")?;
                BareTypeExpr::Var(name)
            }

            TokenKind::Map => {
                self.cursor.bump();
                let key = if self.cursor.eat(&TokenKind::From) {
                    Some(Box::new(self.parse_type()?))
                } else {
                    None
                };
                self.cursor.expect(TokenKind::To)?;
                let value = Box::new(self.parse_type()?);
                BareTypeExpr::Map { key, value }
            }

            _ => {
                return Err(self.cursor.unexpected(
                    "expected a base type ('bool', 'int', 'rat', 'string', 'ref', 'void', \
                     'map', or '\u{2665}')",
                ));
            }
        };

        let span = merge_spans(&start, &self.cursor.prev_span());
        Ok(TypeExpr::new(qualifiers, base, span))
    }
}
