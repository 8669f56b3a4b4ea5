//! Syntax-level type expressions.
//!
//! A type expression is a (possibly empty) list of qualifier names in front of
//! a bare type. The parser emits these in canonical form: qualifiers are
//! deduplicated and sorted by name, so set-equal spellings like
//! `gnarly beefy int` and `beefy beefy gnarly int` parse identically.
//! Resolution against the qualifier table and lowering to the semantic type
//! representation happen later, in the checker.

use crate::ast::Span;
use smol_str::SmolStr;
use std::fmt;

/// A qualifier name occurrence inside a type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifierRef {
    /// The qualifier name.
    pub name: SmolStr,
    /// Where the name appears in source.
    pub span: Span,
}

/// A type expression: qualifier names followed by a bare type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeExpr {
    /// Canonical (sorted, deduplicated) qualifier list.
    pub qualifiers: Vec<QualifierRef>,
    /// The bare type the qualifiers apply to.
    pub base: BareTypeExpr,
    /// Span of the whole type expression.
    pub span: Span,
}

impl TypeExpr {
    /// Creates a type expression, establishing canonical form.
    pub fn new(mut qualifiers: Vec<QualifierRef>, base: BareTypeExpr, span: Span) -> Self {
        qualifiers.sort_by(|a, b| a.name.cmp(&b.name));
        qualifiers.dedup_by(|a, b| a.name == b.name);
        Self {
            qualifiers,
            base,
            span,
        }
    }
}

/// The bare (unqualified) part of a type expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BareTypeExpr {
    /// `bool`
    Bool,
    /// `int`
    Int,
    /// `rat`
    Rat,
    /// `string`
    String,
    /// `ref`
    Ref,
    /// `void`
    Void,
    /// `map [from Type] to Type`; a missing key type is the mixin form that
    /// accepts any key.
    Map {
        key: Option<Box<TypeExpr>>,
        value: Box<TypeExpr>,
    },
    /// `♥name` — a type variable scoped to the enclosing signature.
    Var(SmolStr),
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for qual in &self.qualifiers {
            write!(f, "{} ", qual.name)?;
        }
        write!(f, "{}", self.base)
    }
}

impl fmt::Display for BareTypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BareTypeExpr::Bool => write!(f, "bool"),
            BareTypeExpr::Int => write!(f, "int"),
            BareTypeExpr::Rat => write!(f, "rat"),
            BareTypeExpr::String => write!(f, "string"),
            BareTypeExpr::Ref => write!(f, "ref"),
            BareTypeExpr::Void => write!(f, "void"),
            BareTypeExpr::Map { key: None, value } => write!(f, "map to {}", value),
            BareTypeExpr::Map {
                key: Some(key),
                value,
            } => write!(f, "map from {} to {}", key, value),
            BareTypeExpr::Var(name) => write!(f, "\u{2665}{}", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qual(name: &str) -> QualifierRef {
        QualifierRef {
            name: SmolStr::new(name),
            span: 0..0,
        }
    }

    #[test]
    fn canonical_form_sorts_and_dedups() {
        let ty = TypeExpr::new(
            vec![qual("gnarly"), qual("beefy"), qual("gnarly")],
            BareTypeExpr::Int,
            0..20,
        );
        let names: Vec<_> = ty.qualifiers.iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, vec!["beefy", "gnarly"]);
    }

    #[test]
    fn display_round_trips_surface_syntax() {
        let ty = TypeExpr::new(
            vec![qual("beefy"), qual("gnarly")],
            BareTypeExpr::Var(SmolStr::new("t")),
            0..0,
        );
        assert_eq!(ty.to_string(), "beefy gnarly \u{2665}t");

        let map = TypeExpr::new(
            vec![],
            BareTypeExpr::Map {
                key: Some(Box::new(TypeExpr::new(
                    vec![qual("person")],
                    BareTypeExpr::Ref,
                    0..0,
                ))),
                value: Box::new(TypeExpr::new(vec![], BareTypeExpr::String, 0..0)),
            },
            0..0,
        );
        assert_eq!(map.to_string(), "map from person ref to string");
    }

    #[test]
    fn mixin_map_displays_without_key() {
        let map = TypeExpr::new(
            vec![],
            BareTypeExpr::Map {
                key: None,
                value: Box::new(TypeExpr::new(vec![], BareTypeExpr::Int, 0..0)),
            },
            0..0,
        );
        assert_eq!(map.to_string(), "map to int");
    }
}
