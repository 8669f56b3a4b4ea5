//! Item and statement parsing.
//!
//! Items synchronize independently: a malformed declaration is reported and
//! the parser skips to the next item keyword, so later declarations still
//! parse. Statements inside a block recover the same way at statement
//! boundaries.

use crate::ast::{
    CallExpr, ForwardDecl, Item, ModuleDecl, OrderingDecl, ProcDecl, Program, Span, Stmt, VarDecl,
    merge_spans,
};
use crate::diag::Diag;
use crate::lexer::token::{Token, TokenKind};
use crate::parser::base::{Cursor, ParseResult};
use smol_str::SmolStr;

/// Recursive-descent parser over a token stream.
pub(crate) struct ProgramParser<'a> {
    pub(crate) cursor: Cursor<'a>,
    pub(crate) diagnostics: Vec<Diag>,
}

impl<'a> ProgramParser<'a> {
    pub(crate) fn new(tokens: &'a [Token]) -> Self {
        Self {
            cursor: Cursor::new(tokens),
            diagnostics: Vec::new(),
        }
    }

    /// Parses a whole program: items terminated by `.`.
    pub(crate) fn parse_program(mut self) -> (Program, Vec<Diag>) {
        let mut items = Vec::new();
        loop {
            self.cursor.eat_semicolons();
            match &self.cursor.peek().kind {
                TokenKind::Dot => {
                    self.cursor.bump();
                    break;
                }
                TokenKind::Eof => {
                    self.diagnostics.push(Diag::error(
                        self.cursor.peek().span.clone(),
                        "expected '.' at end of program",
                        "input ends here",
                    ));
                    break;
                }
                _ => match self.parse_item() {
                    Ok(item) => items.push(item),
                    Err(diag) => {
                        self.diagnostics.push(*diag);
                        self.synchronize_item();
                    }
                },
            }
        }

        if !self.cursor.at(&TokenKind::Eof) {
            self.diagnostics.push(Diag::error(
                self.cursor.peek().span.clone(),
                "unexpected input after program terminator '.'",
                "starting here",
            ));
        }

        (Program { items }, self.diagnostics)
    }

    fn parse_item(&mut self) -> ParseResult<Item> {
        match &self.cursor.peek().kind {
            TokenKind::Module => self.parse_module().map(Item::Module),
            TokenKind::Order => self.parse_ordering().map(Item::Ordering),
            TokenKind::Forward => self.parse_forward().map(Item::Forward),
            _ => Err(self
                .cursor
                .unexpected("expected 'module', 'order', or 'forward'")),
        }
    }

    fn parse_module(&mut self) -> ParseResult<ModuleDecl> {
        let start = self.cursor.expect(TokenKind::Module)?;
        let (name, name_span) = self.cursor.expect_identifier("module name")?;

        let mut vars = Vec::new();
        while self.cursor.eat(&TokenKind::Var) {
            vars.push(self.parse_var_decl()?);
            self.cursor.eat_semicolons();
        }

        let mut procedures = Vec::new();
        while self.cursor.at(&TokenKind::Procedure) {
            procedures.push(self.parse_procedure()?);
            self.cursor.eat_semicolons();
        }

        let end = self.cursor.expect(TokenKind::End)?;
        Ok(ModuleDecl {
            name,
            name_span,
            vars,
            procedures,
            span: merge_spans(&start, &end),
        })
    }

    fn parse_ordering(&mut self) -> ParseResult<OrderingDecl> {
        let start = self.cursor.expect(TokenKind::Order)?;
        let (lesser, lesser_span) = self.cursor.expect_identifier("qualifier name")?;
        self.cursor.expect(TokenKind::Lt)?;
        let (greater, greater_span) = self.cursor.expect_identifier("qualifier name")?;
        let span = merge_spans(&start, &greater_span);
        Ok(OrderingDecl {
            lesser,
            lesser_span,
            greater,
            greater_span,
            span,
        })
    }

    fn parse_forward(&mut self) -> ParseResult<ForwardDecl> {
        let start = self.cursor.expect(TokenKind::Forward)?;
        let (name, name_span) = self.cursor.expect_identifier("procedure name")?;
        self.cursor.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.cursor.at(&TokenKind::RParen) {
            loop {
                params.push(self.parse_type()?);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect(TokenKind::RParen)?;
        self.cursor.expect(TokenKind::Colon)?;
        let return_type = self.parse_type()?;
        let span = merge_spans(&start, &return_type.span);
        Ok(ForwardDecl {
            name,
            name_span,
            params,
            return_type,
            span,
        })
    }

    fn parse_procedure(&mut self) -> ParseResult<ProcDecl> {
        let start = self.cursor.expect(TokenKind::Procedure)?;
        let (name, name_span) = self.cursor.expect_identifier("procedure name")?;
        self.cursor.expect(TokenKind::LParen)?;

        let mut params = Vec::new();
        if !self.cursor.at(&TokenKind::RParen) {
            loop {
                params.push(self.parse_var_decl()?);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.cursor.expect(TokenKind::RParen)?;
        self.cursor.expect(TokenKind::Colon)?;
        let return_type = self.parse_type()?;

        let mut locals = Vec::new();
        while self.cursor.eat(&TokenKind::Var) {
            locals.push(self.parse_var_decl()?);
            self.cursor.eat_semicolons();
        }

        let body = self.parse_statement()?;
        let span = merge_spans(&start, &body.span());
        Ok(ProcDecl {
            name,
            name_span,
            params,
            return_type,
            locals,
            body,
            span,
        })
    }

    pub(crate) fn parse_var_decl(&mut self) -> ParseResult<VarDecl> {
        let (name, name_span) = self.cursor.expect_identifier("variable name")?;
        self.cursor.expect(TokenKind::Colon)?;
        let ty = self.parse_type()?;
        let span = merge_spans(&name_span, &ty.span);
        Ok(VarDecl {
            name,
            name_span,
            ty,
            span,
        })
    }

    pub(crate) fn parse_statement(&mut self) -> ParseResult<Stmt> {
        // An identifier commits to the identifier-first productions; the
        // token after it picks between call, indexed assignment, and plain
        // assignment.
        if let Some((name, name_span)) = self.cursor.take_identifier() {
            return self.parse_identifier_statement(name, name_span);
        }

        match &self.cursor.peek().kind {
            TokenKind::Begin => {
                let start = self.cursor.bump();
                let mut stmts = Vec::new();
                loop {
                    self.cursor.eat_semicolons();
                    if self.cursor.at(&TokenKind::End) {
                        break;
                    }
                    if self.cursor.at(&TokenKind::Eof) {
                        return Err(self.cursor.unexpected("expected 'end' to close block"));
                    }
                    match self.parse_statement() {
                        Ok(stmt) => stmts.push(stmt),
                        Err(diag) => {
                            self.diagnostics.push(*diag);
                            self.synchronize_statement();
                        }
                    }
                }
                let end = self.cursor.expect(TokenKind::End)?;
                Ok(Stmt::Block(stmts, merge_spans(&start, &end)))
            }

            TokenKind::If => {
                let start = self.cursor.bump();
                let condition = self.parse_expr()?;
                self.cursor.expect(TokenKind::Then)?;
                let then_branch = Box::new(self.parse_statement()?);
                let else_branch = if self.cursor.eat(&TokenKind::Else) {
                    Some(Box::new(self.parse_statement()?))
                } else {
                    None
                };
                let end = else_branch
                    .as_ref()
                    .map(|e| e.span())
                    .unwrap_or_else(|| then_branch.span());
                Ok(Stmt::If {
                    condition,
                    then_branch,
                    else_branch,
                    span: merge_spans(&start, &end),
                })
            }

            TokenKind::While => {
                let start = self.cursor.bump();
                let condition = self.parse_expr()?;
                self.cursor.expect(TokenKind::Do)?;
                let body = Box::new(self.parse_statement()?);
                let span = merge_spans(&start, &body.span());
                Ok(Stmt::While {
                    condition,
                    body,
                    span,
                })
            }

            TokenKind::Return => {
                let start = self.cursor.bump();
                let is_final = self.cursor.eat(&TokenKind::Final);
                let value = self.parse_expr()?;
                let span = merge_spans(&start, &value.span());
                Ok(Stmt::Return {
                    value,
                    is_final,
                    span,
                })
            }

            _ => Err(self.cursor.unexpected("expected a statement")),
        }
    }

    fn parse_identifier_statement(&mut self, name: SmolStr, name_span: Span) -> ParseResult<Stmt> {
        match &self.cursor.peek().kind {
            TokenKind::LParen => {
                let call = self.parse_call_args(name, name_span)?;
                Ok(Stmt::Call(call))
            }
            TokenKind::LBracket => {
                self.cursor.bump();
                let index = self.parse_expr()?;
                self.cursor.expect(TokenKind::RBracket)?;
                self.cursor.expect(TokenKind::Assign)?;
                let value = self.parse_expr()?;
                let span = merge_spans(&name_span, &value.span());
                Ok(Stmt::Assign {
                    target: name,
                    target_span: name_span,
                    index: Some(index),
                    value,
                    span,
                })
            }
            TokenKind::Assign => {
                self.cursor.bump();
                let value = self.parse_expr()?;
                let span = merge_spans(&name_span, &value.span());
                Ok(Stmt::Assign {
                    target: name,
                    target_span: name_span,
                    index: None,
                    value,
                    span,
                })
            }
            _ => Err(self
                .cursor
                .unexpected("expected ':=', '[', or '(' after identifier")),
        }
    }

    /// Parses the parenthesized argument list of a call whose name was
    /// already consumed.
    pub(crate) fn parse_call_args(
        &mut self,
        name: SmolStr,
        name_span: Span,
    ) -> ParseResult<CallExpr> {
        self.cursor.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.cursor.at(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.cursor.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let end = self.cursor.expect(TokenKind::RParen)?;
        let span = merge_spans(&name_span, &end);
        Ok(CallExpr {
            name,
            name_span,
            args,
            span,
        })
    }

    /// Skips to the next item boundary after a malformed declaration.
    fn synchronize_item(&mut self) {
        loop {
            match &self.cursor.peek().kind {
                TokenKind::Module
                | TokenKind::Order
                | TokenKind::Forward
                | TokenKind::Dot
                | TokenKind::Eof => break,
                _ => {
                    self.cursor.bump();
                }
            }
        }
    }

    /// Skips to the next statement boundary inside a block.
    fn synchronize_statement(&mut self) {
        loop {
            match &self.cursor.peek().kind {
                TokenKind::Begin
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Return
                | TokenKind::End
                | TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.cursor.bump();
                    break;
                }
                _ => {
                    self.cursor.bump();
                }
            }
        }
    }
}
