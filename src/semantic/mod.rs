//! Static checking for parsed programs.
//!
//! The checker walks the AST one declaration at a time:
//!
//! 1. **Registration** - orderings feed the generality relation, forward and
//!    procedure declarations feed the procedure table, module declarations
//!    define qualifiers (declaration before use, throughout).
//! 2. **Body checking** - each procedure body is walked with its parameters
//!    and locals in scope; assignments, conditions, returns, and indexed
//!    reads/writes drive the unifier.
//! 3. **Dispatch resolution** - every call site probes the candidate set,
//!    enforces the shared return type, and is annotated with an ordered
//!    dispatch chain, most general candidate first.
//!
//! Checking continues past errors so one run reports as much as possible;
//! within a single declaration the first hard error wins.

pub mod checker;
pub mod diag;
pub mod ordering;
pub mod tables;
pub mod unify;

pub use checker::TypeChecker;
pub use ordering::{Generality, OrderingGraph};
pub use tables::{ProcSig, ProcedureTable, QualifierTable, ScopeStack, SigId};
pub use unify::{UnifyError, UnifyErrorKind, unify};
