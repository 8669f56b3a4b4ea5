//! The type checker and dispatcher.
//!
//! One pass over the program's items, in declaration order: orderings and
//! forward declarations populate the tables, modules additionally get their
//! procedure bodies checked. Within a declaration the first hard error
//! short-circuits that declaration; sibling declarations keep checking, so
//! one run surfaces as many diagnostics as possible.
//!
//! Every call site gets a fresh substitution and a freshened copy of each
//! candidate signature. Probe failures during candidate filtering are
//! rejections, not errors; they surface only when no candidate survives.

use crate::ast::{
    BareTypeExpr, CallExpr, Expr, ForwardDecl, Item, ModuleDecl, ProcDecl, Program, Span, Stmt,
    TypeExpr,
};
use crate::diag::{Diag, DiagSeverity};
use crate::ir::{CheckOutcome, DispatchChain, DispatchTable, Ir};
use crate::semantic::diag;
use crate::semantic::ordering::{Generality, OrderingGraph};
use crate::semantic::tables::{
    ProcSig, ProcedureTable, QualifierTable, ScopeStack, SigId, VarInfo,
};
use crate::semantic::unify::unify;
use crate::types::{
    BaseType, Primitive, QualifierSet, Subst, Type, TyVar, TyVarGen, alpha_eq, freshen,
};
use smol_str::SmolStr;
use std::collections::HashMap;
use tracing::{debug, trace};

type CheckResult<T> = Result<T, Box<Diag>>;

/// The static checker.
///
/// Owns all state mutated during a check: the qualifier and procedure tables,
/// the ordering graph, the fresh-identity counter, and the accumulated
/// diagnostics. Nothing is shared or global.
#[derive(Default)]
pub struct TypeChecker {
    qualifiers: QualifierTable,
    procedures: ProcedureTable,
    ordering: OrderingGraph,
    tyvars: TyVarGen,
    dispatch: DispatchTable,
    diagnostics: Vec<Diag>,
}

/// Context for checking one procedure body.
struct ProcContext {
    /// The owning module's name, for `bestow` encapsulation.
    module: Option<SmolStr>,
    /// Module frame plus parameter/local frame.
    scopes: ScopeStack,
    /// The declared return type, also the type of `super`.
    return_type: Type,
    /// The procedure's name, for the `super` candidate check.
    name: SmolStr,
    /// The procedure's arity, for the `super` candidate check.
    arity: usize,
}

impl TypeChecker {
    /// Creates a checker with empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a program, producing the checked IR or diagnostics.
    pub fn check(mut self, program: &Program) -> CheckOutcome {
        for item in &program.items {
            match item {
                Item::Ordering(decl) => {
                    if let Err(d) =
                        self.ordering
                            .declare(&decl.lesser, &decl.greater, decl.span.clone())
                    {
                        self.diagnostics.push(*d);
                    }
                }
                Item::Forward(decl) => self.register_forward(decl),
                Item::Module(decl) => self.check_module(decl),
            }
        }

        let has_errors = self
            .diagnostics
            .iter()
            .any(|d| d.severity == DiagSeverity::Error);
        if has_errors {
            CheckOutcome::failure(self.diagnostics)
        } else {
            let ir = Ir::new(
                program.clone(),
                self.qualifiers,
                self.procedures,
                self.dispatch,
            );
            CheckOutcome::success(ir, self.diagnostics)
        }
    }

    fn register_forward(&mut self, decl: &ForwardDecl) {
        let result = (|| -> CheckResult<()> {
            let mut tvars = HashMap::new();
            let params = decl
                .params
                .iter()
                .map(|p| self.lower_type(p, &mut tvars))
                .collect::<CheckResult<Vec<_>>>()?;
            let return_type = self.lower_type(&decl.return_type, &mut tvars)?;
            self.procedures.insert(ProcSig {
                name: decl.name.clone(),
                params,
                return_type,
                module: None,
                name_span: decl.name_span.clone(),
                has_body: false,
            })?;
            Ok(())
        })();
        if let Err(d) = result {
            self.diagnostics.push(*d);
        }
    }

    fn check_module(&mut self, decl: &ModuleDecl) {
        debug!(module = %decl.name, "checking module");
        if let Err(d) = self
            .qualifiers
            .define(decl.name.clone(), decl.name_span.clone())
        {
            self.diagnostics.push(*d);
        }

        // Module-level variables form the outermost scope frame for every
        // procedure of this module. A variable whose type fails to lower is
        // reported and left out; the rest of the module still checks.
        let mut module_vars: Vec<(SmolStr, VarInfo)> = Vec::new();
        for var in &decl.vars {
            let mut tvars = HashMap::new();
            match self.lower_type(&var.ty, &mut tvars) {
                Ok(ty) => {
                    if let Some((_, previous)) =
                        module_vars.iter().find(|(name, _)| *name == var.name)
                    {
                        self.diagnostics.push(diag::duplicate_declaration(
                            "module variable",
                            &var.name,
                            var.name_span.clone(),
                            previous.declared_at.clone(),
                        ));
                    } else {
                        module_vars.push((
                            var.name.clone(),
                            VarInfo {
                                ty,
                                declared_at: var.name_span.clone(),
                            },
                        ));
                    }
                }
                Err(d) => self.diagnostics.push(*d),
            }
        }

        for proc in &decl.procedures {
            if let Err(d) = self.check_procedure(decl, &module_vars, proc) {
                self.diagnostics.push(*d);
            }
        }
    }

    fn check_procedure(
        &mut self,
        module: &ModuleDecl,
        module_vars: &[(SmolStr, VarInfo)],
        proc: &ProcDecl,
    ) -> CheckResult<()> {
        debug!(module = %module.name, procedure = %proc.name, "checking procedure");

        // One type-variable namespace per procedure: `♥t` in a parameter, a
        // local, and the return type is the same variable.
        let mut tvars = HashMap::new();
        let params = proc
            .params
            .iter()
            .map(|p| self.lower_type(&p.ty, &mut tvars))
            .collect::<CheckResult<Vec<_>>>()?;
        let return_type = self.lower_type(&proc.return_type, &mut tvars)?;
        let locals = proc
            .locals
            .iter()
            .map(|l| self.lower_type(&l.ty, &mut tvars))
            .collect::<CheckResult<Vec<_>>>()?;

        self.procedures.insert(ProcSig {
            name: proc.name.clone(),
            params: params.clone(),
            return_type: return_type.clone(),
            module: Some(module.name.clone()),
            name_span: proc.name_span.clone(),
            has_body: true,
        })?;

        let mut scopes = ScopeStack::new();
        scopes.push_frame();
        for (name, info) in module_vars {
            // Module vars were vetted for duplicates already.
            let _ = scopes.declare(name.clone(), info.clone(), "module variable");
        }
        scopes.push_frame();
        for (decl, ty) in proc.params.iter().zip(&params) {
            scopes.declare(
                decl.name.clone(),
                VarInfo {
                    ty: ty.clone(),
                    declared_at: decl.name_span.clone(),
                },
                "parameter",
            )?;
        }
        for (decl, ty) in proc.locals.iter().zip(&locals) {
            scopes.declare(
                decl.name.clone(),
                VarInfo {
                    ty: ty.clone(),
                    declared_at: decl.name_span.clone(),
                },
                "variable",
            )?;
        }

        let ctx = ProcContext {
            module: Some(module.name.clone()),
            scopes,
            return_type,
            name: proc.name.clone(),
            arity: params.len(),
        };
        self.check_statement(&proc.body, &ctx)
    }

    fn check_statement(&mut self, stmt: &Stmt, ctx: &ProcContext) -> CheckResult<()> {
        match stmt {
            Stmt::Block(stmts, _) => {
                for stmt in stmts {
                    self.check_statement(stmt, ctx)?;
                }
                Ok(())
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.check_condition(condition, ctx)?;
                self.check_statement(then_branch, ctx)?;
                if let Some(else_branch) = else_branch {
                    self.check_statement(else_branch, ctx)?;
                }
                Ok(())
            }

            Stmt::While {
                condition, body, ..
            } => {
                self.check_condition(condition, ctx)?;
                self.check_statement(body, ctx)
            }

            Stmt::Assign {
                target,
                target_span,
                index,
                value,
                ..
            } => {
                let var = ctx.scopes.lookup(target).ok_or_else(|| {
                    Box::new(diag::undefined_variable(target, target_span.clone()))
                })?;
                let target_ty = var.ty.clone();

                match index {
                    None => {
                        let value_ty = self.type_of_expr(value, ctx)?;
                        let mut subst = Subst::new();
                        unify(&target_ty, &value_ty, &mut subst).map_err(|e| {
                            Box::new(diag::unification_failure(&e, value.span()))
                        })?;
                        Ok(())
                    }
                    Some(index) => {
                        let (key_ty, value_slot) =
                            map_parts(target, &target_ty, target_span.clone())?;
                        let mut subst = Subst::new();
                        let index_ty = self.type_of_expr(index, ctx)?;
                        if let Some(key_ty) = key_ty {
                            unify(&key_ty, &index_ty, &mut subst).map_err(|e| {
                                Box::new(diag::unification_failure(&e, index.span()))
                            })?;
                        }
                        let value_ty = self.type_of_expr(value, ctx)?;
                        unify(&value_slot, &value_ty, &mut subst).map_err(|e| {
                            Box::new(diag::unification_failure(&e, value.span()))
                        })?;
                        Ok(())
                    }
                }
            }

            Stmt::Call(call) => {
                self.resolve_call(call, ctx)?;
                Ok(())
            }

            Stmt::Return { value, .. } => {
                let value_ty = self.type_of_expr(value, ctx)?;
                let mut subst = Subst::new();
                unify(&ctx.return_type, &value_ty, &mut subst)
                    .map_err(|e| Box::new(diag::unification_failure(&e, value.span())))?;
                Ok(())
            }
        }
    }

    fn check_condition(&mut self, condition: &Expr, ctx: &ProcContext) -> CheckResult<()> {
        let ty = self.type_of_expr(condition, ctx)?;
        let mut subst = Subst::new();
        unify(&Type::prim(Primitive::Bool), &ty, &mut subst)
            .map_err(|e| Box::new(diag::unification_failure(&e, condition.span())))?;
        Ok(())
    }

    fn type_of_expr(&mut self, expr: &Expr, ctx: &ProcContext) -> CheckResult<Type> {
        match expr {
            Expr::Var(name, span) => ctx
                .scopes
                .lookup(name)
                .map(|var| var.ty.clone())
                .ok_or_else(|| Box::new(diag::undefined_variable(name, span.clone()))),

            Expr::IntLit(..) => Ok(Type::prim(Primitive::Int)),
            Expr::StrLit(..) => Ok(Type::prim(Primitive::String)),

            Expr::Paren(inner, _) => self.type_of_expr(inner, ctx),

            Expr::Index {
                target,
                target_span,
                index,
                ..
            } => {
                let var = ctx.scopes.lookup(target).ok_or_else(|| {
                    Box::new(diag::undefined_variable(target, target_span.clone()))
                })?;
                let target_ty = var.ty.clone();
                let (key_ty, value_ty) = map_parts(target, &target_ty, target_span.clone())?;
                let index_ty = self.type_of_expr(index, ctx)?;
                if let Some(key_ty) = key_ty {
                    let mut subst = Subst::new();
                    unify(&key_ty, &index_ty, &mut subst)
                        .map_err(|e| Box::new(diag::unification_failure(&e, index.span())))?;
                }
                Ok(value_ty)
            }

            Expr::Bestow {
                qualifier,
                qualifier_span,
                value,
                ..
            } => {
                if ctx.module.as_ref() != Some(qualifier) {
                    return Err(Box::new(diag::qualifier_module_mismatch(
                        qualifier,
                        ctx.module.as_deref(),
                        qualifier_span.clone(),
                    )));
                }
                let inner = self.type_of_expr(value, ctx)?;
                let mut qualifiers = inner.qualifiers;
                qualifiers.insert(qualifier.clone());
                Ok(Type::new(qualifiers, inner.base))
            }

            Expr::Super(span) => {
                let siblings = self
                    .procedures
                    .candidates(&ctx.name)
                    .into_iter()
                    .filter(|&id| self.procedures.sig(id).params.len() == ctx.arity)
                    .count();
                if siblings <= 1 {
                    return Err(Box::new(diag::invalid_super(&ctx.name, span.clone())));
                }
                Ok(ctx.return_type.clone())
            }

            Expr::Call(call) => self.resolve_call(call, ctx),
        }
    }

    /// Resolves a call site: probes every candidate, enforces the shared
    /// return type, orders the applicable set into a dispatch chain, and
    /// records the chain against the call's span.
    fn resolve_call(&mut self, call: &CallExpr, ctx: &ProcContext) -> CheckResult<Type> {
        let mut arg_types = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            arg_types.push(self.type_of_expr(arg, ctx)?);
        }

        let candidates = self.procedures.candidates(&call.name);
        if candidates.is_empty() {
            return Err(Box::new(diag::undefined_procedure(
                &call.name,
                call.name_span.clone(),
            )));
        }

        let mut applicable: Vec<(SigId, Type)> = Vec::new();
        let mut best_rejection: Option<(usize, String)> = None;
        let mut any_arity_match = false;

        for id in candidates {
            let sig = self.procedures.sig(id).clone();
            if sig.params.len() != arg_types.len() {
                continue;
            }
            any_arity_match = true;

            // Fresh substitution and freshened signature per candidate: probe
            // failures must not leak bindings into other candidates.
            let mut subst = Subst::new();
            let (fresh_params, fresh_return) =
                freshen(&sig.params, &sig.return_type, &mut self.tyvars, &mut subst);

            let mut rejected = false;
            for (pos, (param, arg)) in fresh_params.iter().zip(&arg_types).enumerate() {
                if let Err(err) = unify(param, arg, &mut subst) {
                    trace!(procedure = %call.name, candidate = id.0, pos, "candidate rejected");
                    if best_rejection.as_ref().is_none_or(|(p, _)| pos >= *p) {
                        best_rejection = Some((pos, err.to_string()));
                    }
                    rejected = true;
                    break;
                }
            }
            if !rejected {
                applicable.push((id, subst.apply(&fresh_return)));
            }
        }

        if !any_arity_match {
            let mut arities: Vec<usize> = self
                .procedures
                .candidates(&call.name)
                .into_iter()
                .map(|id| self.procedures.sig(id).params.len())
                .collect();
            arities.sort_unstable();
            arities.dedup();
            return Err(Box::new(diag::arity_mismatch(
                &call.name,
                &arities,
                arg_types.len(),
                call.span.clone(),
            )));
        }
        if applicable.is_empty() {
            return Err(Box::new(diag::no_applicable_candidate(
                &call.name,
                call.span.clone(),
                best_rejection.map(|(_, reason)| reason),
            )));
        }

        // All applicable candidates must resolve to the same return type.
        for window in applicable.windows(2) {
            let (_, left) = &window[0];
            let (_, right) = &window[1];
            if !alpha_eq(left, right) {
                return Err(Box::new(diag::dispatch_return_divergence(
                    &call.name,
                    left,
                    right,
                    call.span.clone(),
                )));
            }
        }

        let chain = self.linearize(&call.name, &applicable, &call.span)?;
        let return_type = applicable[0].1.clone();
        trace!(procedure = %call.name, chain_len = chain.len(), "dispatch chain recorded");
        self.dispatch.record(
            call.span.clone(),
            DispatchChain {
                procedure: call.name.clone(),
                candidates: chain,
                return_type: return_type.clone(),
            },
        );
        Ok(return_type)
    }

    /// Orders applicable candidates most general first.
    ///
    /// Any incomparable pair makes the call ambiguous; ties keep declaration
    /// order.
    fn linearize(
        &self,
        name: &str,
        applicable: &[(SigId, Type)],
        span: &Span,
    ) -> CheckResult<Vec<SigId>> {
        for i in 0..applicable.len() {
            for j in i + 1..applicable.len() {
                let a = self.procedures.sig(applicable[i].0);
                let b = self.procedures.sig(applicable[j].0);
                if self.compare_candidates(a, b) == Generality::Incomparable {
                    return Err(Box::new(diag::ambiguous_dispatch(
                        name,
                        &render_candidate(a),
                        &render_candidate(b),
                        span.clone(),
                    )));
                }
            }
        }

        let mut chain: Vec<SigId> = Vec::with_capacity(applicable.len());
        for &(id, _) in applicable {
            let sig = self.procedures.sig(id);
            let mut pos = chain.len();
            while pos > 0
                && self.compare_candidates(sig, self.procedures.sig(chain[pos - 1]))
                    == Generality::MoreGeneral
            {
                pos -= 1;
            }
            chain.insert(pos, id);
        }
        Ok(chain)
    }

    /// Compares two signatures by qualifier specificity, position by
    /// position. Positions must agree on a direction; a conflict makes the
    /// pair incomparable.
    fn compare_candidates(&self, a: &ProcSig, b: &ProcSig) -> Generality {
        let mut aggregate = Generality::Equal;
        for (pa, pb) in a.params.iter().zip(&b.params) {
            let rel = self.ordering.compare_sets(&pa.qualifiers, &pb.qualifiers);
            aggregate = match (aggregate, rel) {
                (agg, Generality::Equal) => agg,
                (Generality::Equal, rel) => rel,
                (agg, rel) if agg == rel => agg,
                _ => return Generality::Incomparable,
            };
        }
        aggregate
    }

    /// Lowers a syntax type expression to the semantic representation,
    /// resolving qualifiers against the qualifier table and interning type
    /// variables per signature.
    fn lower_type(
        &mut self,
        ty: &TypeExpr,
        tvars: &mut HashMap<SmolStr, TyVar>,
    ) -> CheckResult<Type> {
        let mut qualifiers = QualifierSet::empty();
        for qual in &ty.qualifiers {
            if !self.qualifiers.is_defined(&qual.name) {
                return Err(Box::new(diag::undefined_qualifier(
                    &qual.name,
                    qual.span.clone(),
                )));
            }
            qualifiers.insert(qual.name.clone());
        }

        let base = match &ty.base {
            BareTypeExpr::Bool => BaseType::Prim(Primitive::Bool),
            BareTypeExpr::Int => BaseType::Prim(Primitive::Int),
            BareTypeExpr::Rat => BaseType::Prim(Primitive::Rat),
            BareTypeExpr::String => BaseType::Prim(Primitive::String),
            BareTypeExpr::Ref => BaseType::Prim(Primitive::Ref),
            BareTypeExpr::Void => BaseType::Prim(Primitive::Void),
            BareTypeExpr::Map { key, value } => BaseType::Map {
                key: key
                    .as_ref()
                    .map(|k| self.lower_type(k, tvars).map(Box::new))
                    .transpose()?,
                value: Box::new(self.lower_type(value, tvars)?),
            },
            BareTypeExpr::Var(name) => {
                let var = tvars
                    .entry(name.clone())
                    .or_insert_with(|| self.tyvars.fresh(name.clone()))
                    .clone();
                BaseType::Var(var)
            }
        };
        Ok(Type::new(qualifiers, base))
    }
}

/// Splits a map type into its key (if keyed) and value types.
fn map_parts(
    name: &str,
    ty: &Type,
    span: Span,
) -> CheckResult<(Option<Type>, Type)> {
    match &ty.base {
        BaseType::Map { key, value } => Ok((
            key.as_ref().map(|k| (**k).clone()),
            (**value).clone(),
        )),
        _ => Err(Box::new(diag::not_a_map(name, ty, span))),
    }
}

fn render_candidate(sig: &ProcSig) -> String {
    let params = sig
        .params
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({})", sig.name, params)
}
