//! Symbol tables: qualifiers, procedure signatures, and variable scopes.

use crate::ast::Span;
use crate::semantic::diag;
use crate::types::{Type, alpha_eq};
use smol_str::SmolStr;
use std::collections::HashMap;

/// Registry of qualifier names and their defining modules.
///
/// A qualifier is defined exactly by the module of the same name, so the
/// table maps each qualifier to the declaration site of that module.
#[derive(Debug, Clone, Default)]
pub struct QualifierTable {
    defined: HashMap<SmolStr, Span>,
}

impl QualifierTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a module (and thereby a qualifier) name.
    pub fn define(&mut self, name: SmolStr, span: Span) -> Result<(), Box<crate::diag::Diag>> {
        if let Some(previous) = self.defined.get(&name) {
            return Err(Box::new(diag::duplicate_declaration(
                "module",
                &name,
                span,
                previous.clone(),
            )));
        }
        self.defined.insert(name, span);
        Ok(())
    }

    /// Returns true if the qualifier has a defining module.
    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains_key(name)
    }

    /// Returns the defining module's declaration span.
    pub fn definition_span(&self, name: &str) -> Option<&Span> {
        self.defined.get(name)
    }
}

/// A registered procedure signature.
#[derive(Debug, Clone)]
pub struct ProcSig {
    /// The procedure name.
    pub name: SmolStr,
    /// Parameter types, with rigid variable identities.
    pub params: Vec<Type>,
    /// The return type.
    pub return_type: Type,
    /// The owning module, or `None` for forward declarations.
    pub module: Option<SmolStr>,
    /// Span of the declared name, for secondary labels.
    pub name_span: Span,
    /// Whether the declaration carries a body.
    pub has_body: bool,
}

/// Handle to a registered signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SigId(pub usize);

/// The procedure table: every `forward` and `procedure` declaration adds a
/// signature, in declaration order.
///
/// All signatures sharing a name form that name's dispatch set and must agree
/// on the return type (up to variable renaming); a disagreeing insert is
/// rejected.
#[derive(Debug, Clone, Default)]
pub struct ProcedureTable {
    sigs: Vec<ProcSig>,
    by_name: HashMap<SmolStr, Vec<usize>>,
}

impl ProcedureTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signature, enforcing return-type coherence per name.
    pub fn insert(&mut self, sig: ProcSig) -> Result<SigId, Box<crate::diag::Diag>> {
        if let Some(indices) = self.by_name.get(&sig.name) {
            if let Some(&first) = indices.first() {
                let existing = &self.sigs[first];
                if !alpha_eq(&existing.return_type, &sig.return_type) {
                    return Err(Box::new(diag::return_type_divergence(
                        &sig.name,
                        &existing.return_type,
                        &sig.return_type,
                        sig.name_span.clone(),
                        existing.name_span.clone(),
                    )));
                }
            }
        }
        let idx = self.sigs.len();
        self.sigs.push(sig);
        let name = self.sigs[idx].name.clone();
        self.by_name.entry(name).or_default().push(idx);
        Ok(SigId(idx))
    }

    /// Returns the dispatch set for a name, in declaration order.
    pub fn candidates(&self, name: &str) -> Vec<SigId> {
        self.by_name
            .get(name)
            .map(|v| v.iter().map(|&i| SigId(i)).collect())
            .unwrap_or_default()
    }

    /// Resolves a handle to its signature.
    pub fn sig(&self, id: SigId) -> &ProcSig {
        &self.sigs[id.0]
    }

    /// Number of registered signatures (across all names).
    pub fn len(&self) -> usize {
        self.sigs.len()
    }

    /// Returns true if no signature has been registered.
    pub fn is_empty(&self) -> bool {
        self.sigs.is_empty()
    }
}

/// A declared variable.
#[derive(Debug, Clone)]
pub struct VarInfo {
    /// The declared type, with rigid variable identities.
    pub ty: Type,
    /// Declaration site.
    pub declared_at: Span,
}

/// A stack of variable scopes.
///
/// The outermost frame holds the owning module's variables; a frame is pushed
/// per procedure body for parameters and locals. Lookups search innermost
/// out.
#[derive(Debug, Clone, Default)]
pub struct ScopeStack {
    frames: Vec<HashMap<SmolStr, VarInfo>>,
}

impl ScopeStack {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a new innermost frame.
    pub fn push_frame(&mut self) {
        self.frames.push(HashMap::new());
    }

    /// Pops the innermost frame.
    pub fn pop_frame(&mut self) {
        self.frames.pop();
    }

    /// Declares a variable in the innermost frame.
    ///
    /// Redeclaring a name already present in that frame is an error; shadowing
    /// an outer frame is permitted.
    pub fn declare(
        &mut self,
        name: SmolStr,
        info: VarInfo,
        kind: &str,
    ) -> Result<(), Box<crate::diag::Diag>> {
        let frame = self
            .frames
            .last_mut()
            .expect("declare requires at least one frame");
        if let Some(previous) = frame.get(&name) {
            return Err(Box::new(diag::duplicate_declaration(
                kind,
                &name,
                info.declared_at,
                previous.declared_at.clone(),
            )));
        }
        frame.insert(name, info);
        Ok(())
    }

    /// Looks a variable up, innermost frame first.
    pub fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }
}
