//! The qualifier generality relation.
//!
//! `order q < q'` declares `q'` strictly more general than `q`. The relation
//! is closed transitively as declarations are ingested; a declaration that
//! would relate a pair in both directions is a cycle and is rejected.
//! Dispatch consults the relation through [`OrderingGraph::compare_sets`].

use crate::ast::Span;
use crate::semantic::diag;
use crate::types::QualifierSet;
use smol_str::SmolStr;
use std::collections::{HashMap, HashSet};

/// Relative generality of two qualifiers or qualifier sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generality {
    /// The left side is strictly more general.
    MoreGeneral,
    /// The left side is strictly less general.
    LessGeneral,
    /// Identical (sets only; single qualifiers are never self-compared).
    Equal,
    /// The relation does not order the pair.
    Incomparable,
}

/// A strict partial order over qualifier names, kept transitively closed.
#[derive(Debug, Clone, Default)]
pub struct OrderingGraph {
    /// `below[g]` is the set of qualifiers `g` is strictly more general than.
    below: HashMap<SmolStr, HashSet<SmolStr>>,
}

impl OrderingGraph {
    /// Creates an empty relation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingests `order lesser < greater`.
    ///
    /// Fails if the pair would make the relation cyclic (including the
    /// reflexive `order q < q`).
    pub fn declare(
        &mut self,
        lesser: &SmolStr,
        greater: &SmolStr,
        span: Span,
    ) -> Result<(), Box<crate::diag::Diag>> {
        if lesser == greater || self.is_more_general(lesser, greater) {
            return Err(Box::new(diag::ordering_cycle(lesser, greater, span)));
        }

        // Everything at or above `greater` becomes more general than
        // everything at or below `lesser`.
        let mut uppers: Vec<SmolStr> = vec![greater.clone()];
        uppers.extend(
            self.below
                .iter()
                .filter(|(_, below)| below.contains(greater))
                .map(|(name, _)| name.clone()),
        );
        let mut lowers: Vec<SmolStr> = vec![lesser.clone()];
        if let Some(below) = self.below.get(lesser) {
            lowers.extend(below.iter().cloned());
        }

        for upper in &uppers {
            let entry = self.below.entry(upper.clone()).or_default();
            for lower in &lowers {
                entry.insert(lower.clone());
            }
        }
        Ok(())
    }

    /// Returns true if `a` is declared strictly more general than `b`.
    pub fn is_more_general(&self, a: &str, b: &str) -> bool {
        self.below.get(a).is_some_and(|set| set.contains(b))
    }

    /// Compares two individual qualifiers.
    pub fn compare(&self, a: &str, b: &str) -> Generality {
        if self.is_more_general(a, b) {
            Generality::MoreGeneral
        } else if self.is_more_general(b, a) {
            Generality::LessGeneral
        } else {
            Generality::Incomparable
        }
    }

    /// Compares two qualifier sets for dispatch specificity.
    ///
    /// Subset ordering comes first: the smaller set is the more general one.
    /// When neither set contains the other, the declared relation must order
    /// every differing pair in the same direction; otherwise the sets are
    /// incomparable.
    pub fn compare_sets(&self, a: &QualifierSet, b: &QualifierSet) -> Generality {
        if a == b {
            return Generality::Equal;
        }
        if a.is_subset_of(b) {
            return Generality::MoreGeneral;
        }
        if b.is_subset_of(a) {
            return Generality::LessGeneral;
        }

        let only_a = a.difference(b);
        let only_b = b.difference(a);
        let mut verdict = None;
        for qa in only_a.iter() {
            for qb in only_b.iter() {
                let cmp = self.compare(qa, qb);
                match (verdict, cmp) {
                    (_, Generality::Incomparable) => return Generality::Incomparable,
                    (None, c) => verdict = Some(c),
                    (Some(prev), c) if prev == c => {}
                    _ => return Generality::Incomparable,
                }
            }
        }
        verdict.unwrap_or(Generality::Incomparable)
    }
}
