//! Parser infrastructure.
//!
//! The parser consumes a token stream produced by the lexer and constructs an
//! AST while preserving diagnostics and recovering at item and statement
//! boundaries.

pub mod base;
mod expression;
mod program;
mod types;

use crate::ast::Program;
use crate::diag::{Diag, DiagSeverity, SourceFile};
use crate::lexer::token::{Token, TokenKind};
use miette::Report;

/// Result of parsing a program.
#[derive(Debug)]
pub struct ParseResult {
    /// The parsed AST, or `None` if parsing failed completely.
    pub ast: Option<Program>,
    /// All collected diagnostics rendered as miette reports.
    pub diagnostics: Vec<Report>,
}

/// Parser with error recovery.
pub struct Parser<'source> {
    tokens: Vec<Token>,
    diagnostics: Vec<Diag>,
    source: &'source str,
}

impl<'source> Parser<'source> {
    /// Creates a new parser from a token stream.
    pub fn new(mut tokens: Vec<Token>, source: &'source str) -> Self {
        if tokens.is_empty() {
            tokens.push(Token::new(TokenKind::Eof, 0..0));
        } else if !matches!(tokens.last().map(|t| &t.kind), Some(TokenKind::Eof)) {
            let eof_pos = tokens.last().map(|t| t.span.end).unwrap_or(0);
            tokens.push(Token::new(TokenKind::Eof, eof_pos..eof_pos));
        }

        Self {
            tokens,
            diagnostics: Vec::new(),
            source,
        }
    }

    /// Merges lexer diagnostics ahead of parser diagnostics.
    pub fn with_lexer_diagnostics(mut self, lex_diags: Vec<Diag>) -> Self {
        let mut all_diags = lex_diags;
        all_diags.append(&mut self.diagnostics);
        self.diagnostics = all_diags;
        self
    }

    /// Parses the token stream into a program AST.
    pub fn parse(mut self) -> ParseResult {
        let (program, parser_diags) = program::ProgramParser::new(&self.tokens).parse_program();
        self.diagnostics.extend(parser_diags);

        let has_error = self
            .diagnostics
            .iter()
            .any(|diag| diag.severity == DiagSeverity::Error);
        let ast = if has_error && program.items.is_empty() {
            None
        } else {
            Some(program)
        };

        let reports = SourceFile::new(self.source).render_all(&self.diagnostics);

        ParseResult {
            ast,
            diagnostics: reports,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BareTypeExpr, Expr, Item, Stmt};
    use crate::lexer::tokenize;
    use std::panic::{AssertUnwindSafe, catch_unwind};

    fn parse_source(source: &str) -> ParseResult {
        let lex = tokenize(source);
        Parser::new(lex.tokens, source)
            .with_lexer_diagnostics(lex.diagnostics)
            .parse()
    }

    #[test]
    fn parser_creation_normalizes_missing_eof() {
        let tokens = vec![Token::new(TokenKind::Module, 0..6)];
        let parser = Parser::new(tokens, "");
        assert_eq!(parser.tokens.len(), 2);
        assert_eq!(parser.tokens[1].kind, TokenKind::Eof);
    }

    #[test]
    fn parse_empty_program() {
        let result = parse_source(".");
        let program = result.ast.unwrap();
        assert!(program.items.is_empty());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn missing_terminator_is_reported() {
        let result = parse_source("module m end");
        assert!(!result.diagnostics.is_empty());
        // The module itself still parsed.
        assert_eq!(result.ast.unwrap().items.len(), 1);
    }

    #[test]
    fn parse_module_with_vars_and_procedure() {
        let source = "\
module person
var names: map from person ref to string
procedure person_get_name(p: person ref): string
    return names[p]
end
.";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let program = result.ast.unwrap();
        let Item::Module(module) = &program.items[0] else {
            panic!("expected module");
        };
        assert_eq!(module.name, "person");
        assert_eq!(module.vars.len(), 1);
        assert_eq!(module.procedures.len(), 1);
        let proc = &module.procedures[0];
        assert_eq!(proc.name, "person_get_name");
        assert_eq!(proc.params.len(), 1);
        assert!(matches!(proc.body, Stmt::Return { .. }));
    }

    #[test]
    fn parse_forward_with_type_variables() {
        let source = "forward glunt(beefy gnarly \u{2665}t): gnarly \u{2665}t .";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let program = result.ast.unwrap();
        let Item::Forward(fwd) = &program.items[0] else {
            panic!("expected forward declaration");
        };
        assert_eq!(fwd.name, "glunt");
        assert_eq!(fwd.params.len(), 1);
        let names: Vec<_> = fwd.params[0]
            .qualifiers
            .iter()
            .map(|q| q.name.as_str())
            .collect();
        assert_eq!(names, vec!["beefy", "gnarly"]);
        assert_eq!(fwd.params[0].base, BareTypeExpr::Var("t".into()));
    }

    #[test]
    fn parse_ordering() {
        let result = parse_source("order beefy < gnarly .");
        let program = result.ast.unwrap();
        let Item::Ordering(ord) = &program.items[0] else {
            panic!("expected ordering");
        };
        assert_eq!(ord.lesser, "beefy");
        assert_eq!(ord.greater, "gnarly");
    }

    #[test]
    fn parse_statements_and_expressions() {
        let source = "\
module m
procedure p(x: int, flag: bool): int
var y: int
begin
    if flag then y := x else y := 4
    while flag do y := glunt(y)
    m2[y] := bestow m (f(y))
    return final y
end
end
.";
        let result = parse_source(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let program = result.ast.unwrap();
        let Item::Module(module) = &program.items[0] else {
            panic!("expected module");
        };
        let Stmt::Block(stmts, _) = &module.procedures[0].body else {
            panic!("expected block body");
        };
        assert_eq!(stmts.len(), 4);
        assert!(matches!(&stmts[0], Stmt::If { .. }));
        assert!(matches!(&stmts[1], Stmt::While { .. }));
        assert!(matches!(
            &stmts[2],
            Stmt::Assign {
                index: Some(_),
                value: Expr::Bestow { .. },
                ..
            }
        ));
        assert!(matches!(&stmts[3], Stmt::Return { is_final: true, .. }));
    }

    #[test]
    fn mixin_map_type_parses() {
        let result = parse_source("module m var anykey: map to int end .");
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
        let Item::Module(module) = &result.ast.unwrap().items[0] else {
            panic!("expected module");
        };
        assert!(matches!(
            &module.vars[0].ty.base,
            BareTypeExpr::Map { key: None, .. }
        ));
    }

    #[test]
    fn recovery_continues_to_next_item() {
        let source = "module 42 end forward ok(): int .";
        let result = parse_source(source);
        assert!(!result.diagnostics.is_empty());
        // The forward declaration after the malformed module still parses.
        let program = result.ast.unwrap();
        assert!(
            program
                .items
                .iter()
                .any(|item| matches!(item, Item::Forward(f) if f.name == "ok"))
        );
    }

    #[test]
    fn parse_returns_none_when_nothing_parsed() {
        let result = parse_source("grue bleem");
        assert!(result.ast.is_none());
        assert!(!result.diagnostics.is_empty());
    }

    #[test]
    fn parser_never_panics_on_random_inputs() {
        fn random_token_kind(seed: &mut u64) -> TokenKind {
            *seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            match *seed % 12 {
                0 => TokenKind::Module,
                1 => TokenKind::Procedure,
                2 => TokenKind::Forward,
                3 => TokenKind::Begin,
                4 => TokenKind::End,
                5 => TokenKind::Return,
                6 => TokenKind::Heart,
                7 => TokenKind::Assign,
                8 => TokenKind::LParen,
                9 => TokenKind::Dot,
                10 => TokenKind::Colon,
                _ => TokenKind::Identifier("x".into()),
            }
        }

        let mut seed = 0xC0FFEE_u64;
        for _ in 0..10_000 {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let token_count = (seed % 32) as usize;

            let mut tokens = Vec::with_capacity(token_count + 1);
            let mut cursor = 0usize;

            for _ in 0..token_count {
                let kind = random_token_kind(&mut seed);
                let end = cursor + 1;
                tokens.push(Token::new(kind, cursor..end));
                cursor = end;
            }

            let result = catch_unwind(AssertUnwindSafe(|| Parser::new(tokens, "").parse()));
            assert!(result.is_ok(), "parser panicked on randomized token stream");
        }
    }
}
