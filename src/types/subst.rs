//! Substitutions over type variables.
//!
//! A substitution maps variable identities to types. One is created fresh for
//! each call-site or assignment resolution and discarded when that resolution
//! completes; bindings never persist across resolutions.
//!
//! Only variables minted by [`freshen`] for the current resolution are
//! bindable ("flexible"). Variables belonging to the enclosing procedure's
//! declared types are rigid: they stand for arbitrary types chosen by a
//! future caller, so the checker may never commit them to anything.

use crate::types::{BaseType, Type, TyVar, TyVarGen};
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};

/// A substitution from type-variable identities to types.
#[derive(Debug, Default)]
pub struct Subst {
    bindings: HashMap<u32, Type>,
    flexible: HashSet<u32>,
}

impl Subst {
    /// Creates an empty substitution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a variable identity as bindable in this resolution.
    pub fn mark_flexible(&mut self, id: u32) {
        self.flexible.insert(id);
    }

    /// Returns true if the variable may be bound by this substitution.
    pub fn is_flexible(&self, id: u32) -> bool {
        self.flexible.contains(&id)
    }

    /// Returns the current binding of a variable, if any.
    pub fn binding(&self, id: u32) -> Option<&Type> {
        self.bindings.get(&id)
    }

    /// Binds an unbound flexible variable.
    pub fn bind(&mut self, id: u32, ty: Type) {
        debug_assert!(self.flexible.contains(&id), "binding a rigid variable");
        debug_assert!(!self.bindings.contains_key(&id), "variable already bound");
        self.bindings.insert(id, ty);
    }

    /// Replaces an existing binding (the loosening re-bind).
    pub fn rebind(&mut self, id: u32, ty: Type) {
        debug_assert!(self.bindings.contains_key(&id), "rebinding unbound variable");
        self.bindings.insert(id, ty);
    }

    /// Applies the substitution to a type, normalizing qualifier sets.
    ///
    /// When a variable site `(Q, ♥i)` is replaced by its binding `(Qᵢ, Bᵢ)`,
    /// the result carries the union `Q ∪ Qᵢ`: the site's own qualifiers and
    /// the qualifiers the variable was bound with both apply.
    pub fn apply(&self, ty: &Type) -> Type {
        match &ty.base {
            BaseType::Var(v) => match self.bindings.get(&v.id) {
                Some(bound) => {
                    let inner = self.apply(bound);
                    Type::new(ty.qualifiers.union(&inner.qualifiers), inner.base)
                }
                None => ty.clone(),
            },
            BaseType::Prim(_) => ty.clone(),
            BaseType::Map { key, value } => Type::new(
                ty.qualifiers.clone(),
                BaseType::Map {
                    key: key.as_ref().map(|k| Box::new(self.apply(k))),
                    value: Box::new(self.apply(value)),
                },
            ),
        }
    }
}

/// Replaces every type variable in a signature with a freshly minted identity.
///
/// Called exactly once per candidate per call-site resolution. The fresh
/// identities are registered as flexible in `subst`, so unification may bind
/// them; everything else stays rigid.
pub fn freshen(
    params: &[Type],
    return_type: &Type,
    tyvars: &mut TyVarGen,
    subst: &mut Subst,
) -> (Vec<Type>, Type) {
    let mut renames: HashMap<u32, TyVar> = HashMap::new();
    let fresh_params = params
        .iter()
        .map(|p| freshen_type(p, tyvars, subst, &mut renames))
        .collect();
    let fresh_return = freshen_type(return_type, tyvars, subst, &mut renames);
    (fresh_params, fresh_return)
}

fn freshen_type(
    ty: &Type,
    tyvars: &mut TyVarGen,
    subst: &mut Subst,
    renames: &mut HashMap<u32, TyVar>,
) -> Type {
    match &ty.base {
        BaseType::Prim(_) => ty.clone(),
        BaseType::Var(v) => {
            let fresh = renames
                .entry(v.id)
                .or_insert_with(|| {
                    let fresh = tyvars.fresh(name_of(v));
                    subst.mark_flexible(fresh.id);
                    fresh
                })
                .clone();
            Type::new(ty.qualifiers.clone(), BaseType::Var(fresh))
        }
        BaseType::Map { key, value } => Type::new(
            ty.qualifiers.clone(),
            BaseType::Map {
                key: key
                    .as_ref()
                    .map(|k| Box::new(freshen_type(k, tyvars, subst, renames))),
                value: Box::new(freshen_type(value, tyvars, subst, renames)),
            },
        ),
    }
}

fn name_of(v: &TyVar) -> SmolStr {
    v.name.clone()
}
