//! Semantic type representation.
//!
//! A type is a pair of a qualifier set and a base type. Qualifier sets are
//! commutative and idempotent, kept as sorted, deduplicated vectors so set
//! operations stay cheap at the sizes real programs use. Base types form a
//! closed sum: primitives, maps, and type variables.

pub mod subst;

pub use subst::{Subst, freshen};

use smol_str::SmolStr;
use std::collections::HashMap;
use std::fmt;

/// A set of qualifier names.
///
/// Invariant: the backing vector is sorted and free of duplicates, so `{q,q}`
/// and `{q}` are the same value and ordering of insertion never matters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QualifierSet(Vec<SmolStr>);

impl QualifierSet {
    /// The empty qualifier set.
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Builds a set from arbitrary names, deduplicating.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        let mut v: Vec<SmolStr> = names.into_iter().map(Into::into).collect();
        v.sort();
        v.dedup();
        Self(v)
    }

    /// Returns true if the set has no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of qualifiers in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Membership test.
    pub fn contains(&self, name: &str) -> bool {
        self.0.binary_search_by(|q| q.as_str().cmp(name)).is_ok()
    }

    /// Inserts a qualifier, keeping the set sorted and duplicate-free.
    pub fn insert(&mut self, name: SmolStr) {
        if let Err(idx) = self.0.binary_search(&name) {
            self.0.insert(idx, name);
        }
    }

    /// Set union.
    pub fn union(&self, other: &QualifierSet) -> QualifierSet {
        let mut out = self.clone();
        for name in &other.0 {
            out.insert(name.clone());
        }
        out
    }

    /// Set difference: qualifiers in `self` but not in `other`.
    pub fn difference(&self, other: &QualifierSet) -> QualifierSet {
        QualifierSet(
            self.0
                .iter()
                .filter(|q| !other.contains(q))
                .cloned()
                .collect(),
        )
    }

    /// Set intersection.
    pub fn intersection(&self, other: &QualifierSet) -> QualifierSet {
        QualifierSet(
            self.0
                .iter()
                .filter(|q| other.contains(q))
                .cloned()
                .collect(),
        )
    }

    /// Subset test: every qualifier of `self` is in `other`.
    pub fn is_subset_of(&self, other: &QualifierSet) -> bool {
        self.0.iter().all(|q| other.contains(q))
    }

    /// Iterates the qualifier names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &SmolStr> {
        self.0.iter()
    }
}

impl fmt::Display for QualifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, name) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", name)?;
        }
        Ok(())
    }
}

/// A type variable.
///
/// Identity is the numeric id alone; the name is kept for rendering. Two
/// variables freshened from the same source name are distinct.
#[derive(Debug, Clone)]
pub struct TyVar {
    /// Globally unique identity.
    pub id: u32,
    /// The surface name (after the `♥` sigil), for display.
    pub name: SmolStr,
}

impl PartialEq for TyVar {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TyVar {}

impl std::hash::Hash for TyVar {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TyVar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\u{2665}{}", self.name)
    }
}

/// Mints fresh type-variable identities.
///
/// A monotonically increasing counter owned by the checker instance; ids are
/// never reused.
#[derive(Debug, Default)]
pub struct TyVarGen {
    next: u32,
}

impl TyVarGen {
    /// Creates a generator starting at id 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh variable with the given display name.
    pub fn fresh(&mut self, name: SmolStr) -> TyVar {
        let id = self.next;
        self.next += 1;
        TyVar { id, name }
    }
}

/// Primitive base types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Int,
    Rat,
    String,
    Ref,
    Void,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Bool => write!(f, "bool"),
            Primitive::Int => write!(f, "int"),
            Primitive::Rat => write!(f, "rat"),
            Primitive::String => write!(f, "string"),
            Primitive::Ref => write!(f, "ref"),
            Primitive::Void => write!(f, "void"),
        }
    }
}

/// The base of a type, without its qualifier set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseType {
    /// A primitive.
    Prim(Primitive),
    /// A map; a missing key type is the mixin form accepting any key.
    Map {
        key: Option<Box<Type>>,
        value: Box<Type>,
    },
    /// A type variable.
    Var(TyVar),
}

/// A semantic type: a qualifier set over a base type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    /// Qualifiers on the base.
    pub qualifiers: QualifierSet,
    /// The base type.
    pub base: BaseType,
}

impl Type {
    /// Creates a type.
    pub fn new(qualifiers: QualifierSet, base: BaseType) -> Self {
        Self { qualifiers, base }
    }

    /// Creates a type with an empty qualifier set.
    pub fn bare(base: BaseType) -> Self {
        Self {
            qualifiers: QualifierSet::empty(),
            base,
        }
    }

    /// Creates a bare primitive type.
    pub fn prim(p: Primitive) -> Self {
        Self::bare(BaseType::Prim(p))
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.qualifiers.is_empty() {
            write!(f, "{} ", self.qualifiers)?;
        }
        match &self.base {
            BaseType::Prim(p) => write!(f, "{}", p),
            BaseType::Map { key: None, value } => write!(f, "map to {}", value),
            BaseType::Map {
                key: Some(key),
                value,
            } => write!(f, "map from {} to {}", key, value),
            BaseType::Var(v) => write!(f, "{}", v),
        }
    }
}

/// Equality of two types up to a consistent renaming of type variables.
///
/// Used for return-type coherence, where `♥t` and `♥u` spell the same
/// signature in two declarations.
pub fn alpha_eq(a: &Type, b: &Type) -> bool {
    fn go(a: &Type, b: &Type, map: &mut HashMap<u32, u32>) -> bool {
        if a.qualifiers != b.qualifiers {
            return false;
        }
        match (&a.base, &b.base) {
            (BaseType::Prim(p), BaseType::Prim(q)) => p == q,
            (
                BaseType::Map {
                    key: ka,
                    value: va,
                },
                BaseType::Map {
                    key: kb,
                    value: vb,
                },
            ) => {
                let keys_ok = match (ka, kb) {
                    (None, None) => true,
                    (Some(ka), Some(kb)) => go(ka, kb, map),
                    _ => false,
                };
                keys_ok && go(va, vb, map)
            }
            (BaseType::Var(x), BaseType::Var(y)) => match map.get(&x.id) {
                Some(&mapped) => mapped == y.id,
                None => {
                    map.insert(x.id, y.id);
                    true
                }
            },
            _ => false,
        }
    }
    go(a, b, &mut HashMap::new())
}
