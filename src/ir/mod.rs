//! Checked program representation.
//!
//! A successful check yields an [`Ir`]: the original AST together with the
//! sealed qualifier and procedure tables and the dispatch table mapping each
//! call site to its ordered candidate chain. Evaluators walk chains in order,
//! most general candidate first; this crate only produces them.

use crate::ast::{Program, Span};
use crate::diag::{Diag, DiagSeverity};
use crate::semantic::tables::{ProcedureTable, QualifierTable, SigId};
use crate::types::Type;
use smol_str::SmolStr;
use std::collections::HashMap;

/// The resolved dispatch chain for one call site.
#[derive(Debug, Clone)]
pub struct DispatchChain {
    /// The called procedure's name.
    pub procedure: SmolStr,
    /// Applicable signatures, most general first.
    pub candidates: Vec<SigId>,
    /// The call's static type: the candidates' common return type.
    pub return_type: Type,
}

/// Dispatch chains keyed by call-site span.
#[derive(Debug, Clone, Default)]
pub struct DispatchTable {
    chains: HashMap<(usize, usize), DispatchChain>,
}

impl DispatchTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the chain resolved for a call site.
    pub fn record(&mut self, span: Span, chain: DispatchChain) {
        self.chains.insert((span.start, span.end), chain);
    }

    /// Returns the chain recorded for a call site.
    pub fn get(&self, span: &Span) -> Option<&DispatchChain> {
        self.chains.get(&(span.start, span.end))
    }

    /// Number of resolved call sites.
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Returns true if no call site has been recorded.
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Iterates all recorded chains with their call-site positions.
    pub fn iter(&self) -> impl Iterator<Item = (&(usize, usize), &DispatchChain)> {
        self.chains.iter()
    }
}

/// A checked program: AST plus semantic tables.
#[derive(Debug, Clone)]
pub struct Ir {
    program: Program,
    qualifiers: QualifierTable,
    procedures: ProcedureTable,
    dispatch: DispatchTable,
}

impl Ir {
    /// Creates an IR from a program and its check results.
    pub fn new(
        program: Program,
        qualifiers: QualifierTable,
        procedures: ProcedureTable,
        dispatch: DispatchTable,
    ) -> Self {
        Self {
            program,
            qualifiers,
            procedures,
            dispatch,
        }
    }

    /// Returns the original AST.
    pub fn program(&self) -> &Program {
        &self.program
    }

    /// Returns the qualifier table.
    pub fn qualifiers(&self) -> &QualifierTable {
        &self.qualifiers
    }

    /// Returns the procedure table.
    pub fn procedures(&self) -> &ProcedureTable {
        &self.procedures
    }

    /// Returns the dispatch table.
    pub fn dispatch(&self) -> &DispatchTable {
        &self.dispatch
    }
}

/// Outcome of a check, always carrying the diagnostics.
///
/// Warnings and notes may accompany a successful outcome; the IR is withheld
/// only when an error-severity diagnostic was produced.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    /// The checked IR, if no errors occurred.
    pub ir: Option<Ir>,
    /// All diagnostics collected during the check.
    pub diagnostics: Vec<Diag>,
}

impl CheckOutcome {
    /// Creates a successful outcome.
    pub fn success(ir: Ir, diagnostics: Vec<Diag>) -> Self {
        Self {
            ir: Some(ir),
            diagnostics,
        }
    }

    /// Creates a failed outcome.
    pub fn failure(diagnostics: Vec<Diag>) -> Self {
        Self {
            ir: None,
            diagnostics,
        }
    }

    /// Returns true if the check produced an IR.
    pub fn is_success(&self) -> bool {
        self.ir.is_some()
    }

    /// Returns true if the check failed.
    pub fn is_failure(&self) -> bool {
        self.ir.is_none()
    }

    /// Returns true if any error-severity diagnostic was produced.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagSeverity::Error)
    }
}
