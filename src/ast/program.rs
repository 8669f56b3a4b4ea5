//! Top-level AST node types: programs, modules, and declarations.

use crate::ast::{Span, Stmt, TypeExpr, VarDecl};
use smol_str::SmolStr;

/// Root AST node for a complete program.
///
/// A program is a sequence of module, ordering, and forward declarations,
/// terminated by `.` in the concrete syntax.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Top-level items, in declaration order.
    pub items: Vec<Item>,
}

/// A top-level item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// `module qualName ... end`
    Module(ModuleDecl),
    /// `order qualName < qualName`
    Ordering(OrderingDecl),
    /// `forward procName ( [Type {, Type}] ) : Type`
    Forward(ForwardDecl),
}

impl Item {
    /// Returns the span of this item.
    pub fn span(&self) -> Span {
        match self {
            Item::Module(m) => m.span.clone(),
            Item::Ordering(o) => o.span.clone(),
            Item::Forward(f) => f.span.clone(),
        }
    }
}

/// A module declaration.
///
/// The module name doubles as a qualifier name: the module is the sole owner
/// of `bestow` for that qualifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDecl {
    /// The module (and qualifier) name.
    pub name: SmolStr,
    /// Span of the name.
    pub name_span: Span,
    /// Module-level variables, visible to all procedures of this module.
    pub vars: Vec<VarDecl>,
    /// Procedures declared in this module.
    pub procedures: Vec<ProcDecl>,
    /// Span of the whole declaration.
    pub span: Span,
}

/// An ordering declaration: `order lesser < greater`.
///
/// Declares `greater` strictly more general than `lesser` for dispatch
/// ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderingDecl {
    /// The more specific qualifier.
    pub lesser: SmolStr,
    /// Span of the more specific qualifier.
    pub lesser_span: Span,
    /// The more general qualifier.
    pub greater: SmolStr,
    /// Span of the more general qualifier.
    pub greater_span: Span,
    /// Span of the whole declaration.
    pub span: Span,
}

/// A forward declaration: a signature without a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardDecl {
    /// The procedure name.
    pub name: SmolStr,
    /// Span of the name.
    pub name_span: Span,
    /// Parameter types (unnamed in the forward form).
    pub params: Vec<TypeExpr>,
    /// The return type.
    pub return_type: TypeExpr,
    /// Span of the whole declaration.
    pub span: Span,
}

/// A procedure declaration with a body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcDecl {
    /// The procedure name.
    pub name: SmolStr,
    /// Span of the name.
    pub name_span: Span,
    /// Named parameters.
    pub params: Vec<VarDecl>,
    /// The return type.
    pub return_type: TypeExpr,
    /// Local variable declarations.
    pub locals: Vec<VarDecl>,
    /// The body statement (often a `begin ... end` block).
    pub body: Stmt,
    /// Span of the whole declaration.
    pub span: Span,
}
