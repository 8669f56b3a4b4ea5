//! Directional unification over qualified types.
//!
//! `unify(receptor, provider, subst)` checks that the provider side can be
//! used where the receptor side is expected, extending the substitution with
//! variable bindings as it goes. The relation is deliberately not symmetric:
//! the provider's qualifier set must cover the receptor's, never the other
//! way around. `unify(int, gnarly int)` succeeds while
//! `unify(gnarly int, int)` fails.
//!
//! A flexible variable already bound may be re-bound to a *less* qualified
//! type when a later use supplies fewer qualifiers; the earlier binding was a
//! conservative upper bound. Re-binding only ever drops qualifiers, so every
//! chain of re-binds terminates.
//!
//! Failures are returned as values; nothing is thrown through the recursion.

use crate::types::{BaseType, QualifierSet, Subst, Type, TyVar};
use std::fmt;
use tracing::trace;

/// Why a unification failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyErrorKind {
    /// The provider's qualifier set does not cover the receptor's.
    QualifierViolation {
        /// Qualifiers required by the receptor but absent from the provider.
        missing: QualifierSet,
    },
    /// Base types disagree (primitive vs primitive, map shape, or a rigid
    /// variable against anything other than itself).
    StructuralMismatch,
    /// The receptor is a keyed map but the provider is the mixin form.
    MapKeyRequired,
}

/// A failed unification, carrying both sides for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnifyError {
    /// The failure category.
    pub kind: UnifyErrorKind,
    /// The receptor (expected) side.
    pub receptor: Type,
    /// The provider (supplied) side.
    pub provider: Type,
}

impl UnifyError {
    fn new(kind: UnifyErrorKind, receptor: &Type, provider: &Type) -> Self {
        Self {
            kind,
            receptor: receptor.clone(),
            provider: provider.clone(),
        }
    }
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UnifyErrorKind::QualifierViolation { missing } => write!(
                f,
                "qualifier '{}' required but not supplied: expected {}, found {}",
                missing, self.receptor, self.provider
            ),
            UnifyErrorKind::StructuralMismatch => write!(
                f,
                "type mismatch: expected {}, found {}",
                self.receptor, self.provider
            ),
            UnifyErrorKind::MapKeyRequired => write!(
                f,
                "map key type mismatch: expected {}, found unkeyed {}",
                self.receptor, self.provider
            ),
        }
    }
}

/// Outcome of resolving a type's head through the substitution.
enum Head {
    /// No flexible variable at the head.
    Concrete(Type),
    /// An unbound flexible variable, with the site qualifiers folded along
    /// any variable-to-variable links.
    Unbound { quals: QualifierSet, var: TyVar },
    /// A bound flexible variable: site qualifiers up to the variable, the
    /// variable itself, and its current binding.
    Bound {
        quals: QualifierSet,
        var: TyVar,
        binding: Type,
    },
    /// A rigid variable (owned by the enclosing procedure's signature).
    Rigid { quals: QualifierSet, var: TyVar },
}

fn resolve_head(ty: &Type, subst: &Subst) -> Head {
    let mut quals = ty.qualifiers.clone();
    let mut base = ty.base.clone();
    loop {
        match base {
            BaseType::Var(v) if subst.is_flexible(v.id) => match subst.binding(v.id) {
                None => return Head::Unbound { quals, var: v },
                Some(bound) => {
                    if let BaseType::Var(inner) = &bound.base {
                        if subst.is_flexible(inner.id) && subst.binding(inner.id).is_some() {
                            // Variable chained to a bound variable: fold the
                            // link's qualifiers into the site and continue.
                            quals = quals.union(&bound.qualifiers);
                            base = bound.base.clone();
                            continue;
                        }
                    }
                    return Head::Bound {
                        quals,
                        var: v,
                        binding: bound.clone(),
                    };
                }
            },
            BaseType::Var(v) => return Head::Rigid { quals, var: v },
            other => return Head::Concrete(Type::new(quals, other)),
        }
    }
}

/// True if variable `id` occurs anywhere inside `ty`.
fn occurs(id: u32, ty: &Type) -> bool {
    match &ty.base {
        BaseType::Var(v) => v.id == id,
        BaseType::Prim(_) => false,
        BaseType::Map { key, value } => {
            key.as_ref().is_some_and(|k| occurs(id, k)) || occurs(id, value)
        }
    }
}

/// Directionally unifies `provider` into `receptor`, extending `subst`.
pub fn unify(receptor: &Type, provider: &Type, subst: &mut Subst) -> Result<(), UnifyError> {
    match resolve_head(receptor, subst) {
        Head::Unbound { quals: qr, var: rv } => match resolve_head(provider, subst) {
            Head::Unbound { quals: qp, var: pv } => {
                if pv.id == rv.id {
                    if qr.is_subset_of(&qp) {
                        Ok(())
                    } else {
                        Err(UnifyError::new(
                            UnifyErrorKind::QualifierViolation {
                                missing: qr.difference(&qp),
                            },
                            receptor,
                            provider,
                        ))
                    }
                } else {
                    // Both sides are variables: the receptor wins. The
                    // provider's variable is narrowed toward the receptor's
                    // type expression.
                    trace!(provider_var = pv.id, receptor_var = rv.id, "var-var bind");
                    subst.bind(
                        pv.id,
                        Type::new(qr.difference(&qp), BaseType::Var(rv)),
                    );
                    Ok(())
                }
            }
            other => {
                let pe = effective(other, subst);
                if !qr.is_subset_of(&pe.qualifiers) {
                    return Err(UnifyError::new(
                        UnifyErrorKind::QualifierViolation {
                            missing: qr.difference(&pe.qualifiers),
                        },
                        receptor,
                        provider,
                    ));
                }
                if occurs(rv.id, &pe) {
                    return Err(UnifyError::new(
                        UnifyErrorKind::StructuralMismatch,
                        receptor,
                        provider,
                    ));
                }
                // The site already contributes its own qualifiers; the
                // variable carries only the extras the provider supplied.
                let extra = pe.qualifiers.difference(&qr);
                trace!(var = rv.id, binding = %Type::new(extra.clone(), pe.base.clone()), "bind");
                subst.bind(rv.id, Type::new(extra, pe.base));
                Ok(())
            }
        },

        Head::Bound {
            quals: qr_site,
            var: rv,
            binding,
        } => match resolve_head(provider, subst) {
            Head::Unbound { quals: qp, var: pv } => {
                // Receptor is effectively concrete; narrow the provider's
                // variable toward it.
                let effective_quals = qr_site.union(&binding.qualifiers);
                let target = Type::new(effective_quals.difference(&qp), binding.base.clone());
                if occurs(pv.id, &target) {
                    return Err(UnifyError::new(
                        UnifyErrorKind::StructuralMismatch,
                        receptor,
                        provider,
                    ));
                }
                subst.bind(pv.id, target);
                Ok(())
            }
            other => {
                let pe = effective(other, subst);
                if !qr_site.is_subset_of(&pe.qualifiers) {
                    // The site's own qualifiers are not negotiable; only the
                    // variable's share can be loosened.
                    return Err(UnifyError::new(
                        UnifyErrorKind::QualifierViolation {
                            missing: qr_site.difference(&pe.qualifiers),
                        },
                        receptor,
                        provider,
                    ));
                }
                unify(
                    &Type::bare(binding.base.clone()),
                    &Type::bare(pe.base.clone()),
                    subst,
                )
                .map_err(|e| UnifyError::new(e.kind, receptor, provider))?;
                let avail = pe.qualifiers.difference(&qr_site);
                if binding.qualifiers.is_subset_of(&avail) {
                    Ok(())
                } else {
                    // Re-bind toward the less qualified type: the variable
                    // keeps only the qualifiers this provider can still
                    // supply.
                    let loosened = binding.qualifiers.intersection(&avail);
                    trace!(
                        var = rv.id,
                        old = %binding.qualifiers,
                        new = %loosened,
                        "loosening re-bind"
                    );
                    subst.rebind(rv.id, Type::new(loosened, binding.base));
                    Ok(())
                }
            }
        },

        Head::Rigid { quals: qr, var: rv } => match resolve_head(provider, subst) {
            Head::Unbound { quals: qp, var: pv } => {
                subst.bind(
                    pv.id,
                    Type::new(qr.difference(&qp), BaseType::Var(rv)),
                );
                Ok(())
            }
            other => {
                let pe = effective(other, subst);
                match &pe.base {
                    BaseType::Var(pv) if pv.id == rv.id => {
                        if qr.is_subset_of(&pe.qualifiers) {
                            Ok(())
                        } else {
                            Err(UnifyError::new(
                                UnifyErrorKind::QualifierViolation {
                                    missing: qr.difference(&pe.qualifiers),
                                },
                                receptor,
                                provider,
                            ))
                        }
                    }
                    // A binding chain can end in an unbound variable; it is
                    // still narrowable toward the receptor.
                    BaseType::Var(pv)
                        if subst.is_flexible(pv.id) && subst.binding(pv.id).is_none() =>
                    {
                        subst.bind(
                            pv.id,
                            Type::new(qr.difference(&pe.qualifiers), BaseType::Var(rv)),
                        );
                        Ok(())
                    }
                    _ => Err(UnifyError::new(
                        UnifyErrorKind::StructuralMismatch,
                        receptor,
                        provider,
                    )),
                }
            }
        },

        Head::Concrete(re) => match resolve_head(provider, subst) {
            Head::Unbound { quals: qp, var: pv } => {
                let target = Type::new(re.qualifiers.difference(&qp), re.base.clone());
                if occurs(pv.id, &target) {
                    return Err(UnifyError::new(
                        UnifyErrorKind::StructuralMismatch,
                        receptor,
                        provider,
                    ));
                }
                subst.bind(pv.id, target);
                Ok(())
            }
            other => {
                let pe = effective(other, subst);
                // Cardinal rule: the provider must supply at least the
                // receptor's qualifiers.
                if !re.qualifiers.is_subset_of(&pe.qualifiers) {
                    return Err(UnifyError::new(
                        UnifyErrorKind::QualifierViolation {
                            missing: re.qualifiers.difference(&pe.qualifiers),
                        },
                        receptor,
                        provider,
                    ));
                }
                unify_bases(&re.base, &pe.base, subst)
                    .map_err(|kind| UnifyError::new(kind, receptor, provider))
            }
        },
    }
}

/// Resolves a non-unbound head to its effective type.
fn effective(head: Head, subst: &Subst) -> Type {
    match head {
        Head::Concrete(ty) => subst.apply(&ty),
        Head::Rigid { quals, var } => Type::new(quals, BaseType::Var(var)),
        Head::Bound {
            quals,
            var: _,
            binding,
        } => {
            let inner = subst.apply(&binding);
            Type::new(quals.union(&inner.qualifiers), inner.base)
        }
        Head::Unbound { quals, var } => Type::new(quals, BaseType::Var(var)),
    }
}

fn unify_bases(
    rb: &BaseType,
    pb: &BaseType,
    subst: &mut Subst,
) -> Result<(), UnifyErrorKind> {
    match (rb, pb) {
        (BaseType::Prim(a), BaseType::Prim(b)) if a == b => Ok(()),

        (
            BaseType::Map {
                key: rk,
                value: rv,
            },
            BaseType::Map {
                key: pk,
                value: pv,
            },
        ) => {
            unify(rv, pv, subst).map_err(|e| e.kind)?;
            match (rk, pk) {
                (Some(rk), Some(pk)) => unify(rk, pk, subst).map_err(|e| e.kind),
                // Mixin receptor: any key form is acceptable.
                (None, _) => Ok(()),
                (Some(_), None) => Err(UnifyErrorKind::MapKeyRequired),
            }
        }

        (BaseType::Var(a), BaseType::Var(b)) if a.id == b.id => Ok(()),

        _ => {
            // A flexible variable on either side is still bindable; route it
            // back through the main entry point.
            let receptor_flex = matches!(rb, BaseType::Var(v) if subst.is_flexible(v.id));
            let provider_flex = matches!(pb, BaseType::Var(v) if subst.is_flexible(v.id));
            if receptor_flex || provider_flex {
                unify(&Type::bare(rb.clone()), &Type::bare(pb.clone()), subst)
                    .map_err(|e| e.kind)
            } else {
                Err(UnifyErrorKind::StructuralMismatch)
            }
        }
    }
}
