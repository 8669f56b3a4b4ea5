//! Pure-Rust static type checker for the Dieter language.
//!
//! Dieter is a statically typed, modular procedural language whose type
//! qualifiers (commutative, idempotent, set-like modifiers in front of a base
//! type) are owned by modules of the same name. Type variables, written with
//! the `♥` sigil, range over base types and qualifier sets alike, and
//! procedure calls dispatch over qualifier specificity.
//!
//! This crate lexes, parses, and checks Dieter programs. Checking is built on
//! a directional unifier: the supplied (provider) side of every constraint
//! must carry at least the qualifiers of the expected (receptor) side, and a
//! type variable may be re-bound to a less qualified type as a checking pass
//! learns more about its uses. Each accepted call site is annotated with a
//! dispatch chain ordered from most general to most specific candidate.
//!
//! # Parse
//!
//! ```
//! use dieter_checker::parse;
//!
//! let result = parse("module greeter end .");
//! assert!(result.ast.is_some());
//! assert!(result.diagnostics.is_empty());
//! ```
//!
//! # Parse and check
//!
//! ```
//! use dieter_checker::parse_and_check;
//!
//! let source = "
//! forward succ(int): int
//! module arith
//! procedure twice(x: int): int
//!     return succ(succ(x))
//! end
//! .";
//! let result = parse_and_check(source);
//! assert!(result.ir.is_some(), "expected a clean check");
//! ```
//!
//! # Diagnostics
//!
//! ```
//! use dieter_checker::parse_and_check;
//!
//! // 'bestow beta' is only legal inside module 'beta'.
//! let source = "
//! module beta end
//! module alpha
//! procedure bad(x: int): beta int
//!     return bestow beta x
//! end
//! .";
//! let result = parse_and_check(source);
//! assert!(result.ir.is_none());
//! assert!(!result.diagnostics.is_empty());
//! ```

use miette::Report;

pub mod ast;
pub mod diag;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod semantic;
pub mod types;

// Re-export syntax span primitives.
pub use ast::{Span, merge_spans};

// Re-export lexer types for convenience.
pub use diag::{Diag, DiagSeverity, RelatedSite};
pub use lexer::token::{Token, TokenKind};
pub use lexer::{Lexer, LexerResult, tokenize};

// Re-export parser types for convenience.
pub use parser::{ParseResult, Parser};

// Re-export checker types for convenience.
pub use ir::{CheckOutcome, DispatchChain, DispatchTable, Ir};
pub use semantic::TypeChecker;

/// Parses source text end-to-end (lexing + parsing).
///
/// This is the recommended parsing entry point. It guarantees parser input
/// comes from the lexer and merges diagnostics from both phases.
pub fn parse(source: &str) -> ParseResult {
    let lex_result = tokenize(source);
    Parser::new(lex_result.tokens, source)
        .with_lexer_diagnostics(lex_result.diagnostics)
        .parse()
}

/// Result of parsing and checking, with rendered diagnostics.
#[derive(Debug)]
pub struct ParseAndCheckResult {
    /// The checked IR, if both phases succeeded.
    pub ir: Option<Ir>,
    /// Combined diagnostics from parsing and checking.
    pub diagnostics: Vec<Report>,
}

/// Parses and type-checks source text.
///
/// Parse errors short-circuit checking; otherwise the checker runs and its
/// diagnostics are rendered against the same source. The verdict is pure:
/// the same input always produces the same result.
pub fn parse_and_check(source: &str) -> ParseAndCheckResult {
    let parse_result = parse(source);

    if !parse_result.diagnostics.is_empty() {
        return ParseAndCheckResult {
            ir: None,
            diagnostics: parse_result.diagnostics,
        };
    }

    let Some(program) = parse_result.ast else {
        return ParseAndCheckResult {
            ir: None,
            diagnostics: vec![miette::Report::msg(
                "failed to parse source (no AST produced)",
            )],
        };
    };

    let outcome = TypeChecker::new().check(&program);

    let reports = diag::SourceFile::new(source).render_all(&outcome.diagnostics);

    ParseAndCheckResult {
        ir: outcome.ir,
        diagnostics: reports,
    }
}
