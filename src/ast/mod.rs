//! AST foundation types and node structures.

pub mod expression;
pub mod program;
mod span;
pub mod types;

// Re-export span primitives
pub use span::{Span, merge_spans};

// Re-export node types
pub use expression::{CallExpr, Expr, Stmt, VarDecl};
pub use program::{ForwardDecl, Item, ModuleDecl, OrderingDecl, ProcDecl, Program};
pub use types::{BareTypeExpr, QualifierRef, TypeExpr};
