//! Statement and expression AST nodes.

use crate::ast::{Span, TypeExpr};
use smol_str::SmolStr;

/// A statement inside a procedure body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    /// `begin { Statement } end`
    Block(Vec<Stmt>, Span),

    /// `if Expr then Statement [ else Statement ]`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
        span: Span,
    },

    /// `while Expr do Statement`
    While {
        condition: Expr,
        body: Box<Stmt>,
        span: Span,
    },

    /// `varName [ "[" Expr "]" ] := Expr`
    Assign {
        target: SmolStr,
        target_span: Span,
        index: Option<Expr>,
        value: Expr,
        span: Span,
    },

    /// A procedure call in statement position.
    Call(CallExpr),

    /// `return [ final ] Expr`
    Return {
        value: Expr,
        is_final: bool,
        span: Span,
    },
}

impl Stmt {
    /// Returns the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block(_, span) => span.clone(),
            Stmt::If { span, .. } => span.clone(),
            Stmt::While { span, .. } => span.clone(),
            Stmt::Assign { span, .. } => span.clone(),
            Stmt::Call(call) => call.span.clone(),
            Stmt::Return { span, .. } => span.clone(),
        }
    }
}

/// An expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// A variable reference.
    Var(SmolStr, Span),

    /// A map read: `varName [ Expr ]`.
    Index {
        target: SmolStr,
        target_span: Span,
        index: Box<Expr>,
        span: Span,
    },

    /// A procedure call.
    Call(CallExpr),

    /// A parenthesized expression.
    Paren(Box<Expr>, Span),

    /// `bestow qualName Expr` — adds a qualifier to the value's static type.
    Bestow {
        qualifier: SmolStr,
        qualifier_span: Span,
        value: Box<Expr>,
        span: Span,
    },

    /// `super` — the next, more specific procedure in the dispatch chain.
    Super(Span),

    /// An integer literal, typed as bare `int`.
    IntLit(SmolStr, Span),

    /// A string literal, typed as bare `string`.
    StrLit(SmolStr, Span),
}

impl Expr {
    /// Returns the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Var(_, span) => span.clone(),
            Expr::Index { span, .. } => span.clone(),
            Expr::Call(call) => call.span.clone(),
            Expr::Paren(_, span) => span.clone(),
            Expr::Bestow { span, .. } => span.clone(),
            Expr::Super(span) => span.clone(),
            Expr::IntLit(_, span) => span.clone(),
            Expr::StrLit(_, span) => span.clone(),
        }
    }
}

/// A procedure call, in statement or expression position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExpr {
    /// The procedure name.
    pub name: SmolStr,
    /// Span of the name.
    pub name_span: Span,
    /// Argument expressions.
    pub args: Vec<Expr>,
    /// Span of the whole call.
    pub span: Span,
}

/// A variable declaration: `varName : Type`.
///
/// Used for module-level variables, procedure parameters, and locals. All
/// variables carry a fully explicit type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    /// The variable name.
    pub name: SmolStr,
    /// Span of the name.
    pub name_span: Span,
    /// The declared type.
    pub ty: TypeExpr,
    /// Span of the whole declaration.
    pub span: Span,
}
