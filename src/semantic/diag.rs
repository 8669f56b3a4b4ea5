//! Checker diagnostics built on the base diagnostic model.
//!
//! One constructor per error kind, so messages and labels stay uniform across
//! the checker.

use crate::ast::Span;
use crate::diag::Diag;
use crate::semantic::unify::UnifyError;
use crate::types::Type;

/// An undefined variable reference.
pub fn undefined_variable(name: &str, span: Span) -> Diag {
    Diag::error(
        span,
        format!("undefined variable '{}'", name),
        "variable not declared",
    )
}

/// An undefined procedure reference.
pub fn undefined_procedure(name: &str, span: Span) -> Diag {
    Diag::error(
        span,
        format!("undefined procedure '{}'", name),
        "no signature declared for this name",
    )
    .suggest("declare the procedure, or forward-declare its signature before use")
}

/// A qualifier used in a type expression without a defining module.
pub fn undefined_qualifier(name: &str, span: Span) -> Diag {
    Diag::error(
        span,
        format!("undefined qualifier '{}'", name),
        "no module of this name",
    )
    .suggest(format!(
        "a qualifier is defined by declaring a module named '{}'",
        name
    ))
}

/// `bestow q` used outside module `q`.
pub fn qualifier_module_mismatch(qualifier: &str, module: Option<&str>, span: Span) -> Diag {
    let context = match module {
        Some(module) => format!("module '{}'", module),
        None => "outside any module".to_string(),
    };
    Diag::error(
        span,
        format!(
            "qualifier '{}' may only be bestowed inside module '{}'",
            qualifier, qualifier
        ),
        format!("bestowed here, in {}", context),
    )
}

/// A failed unification, positioned at the expression that supplied the
/// provider side.
pub fn unification_failure(err: &UnifyError, span: Span) -> Diag {
    Diag::error(span, err.to_string(), "type checked here")
}

/// Two same-named signatures disagree on the return type.
pub fn return_type_divergence(
    name: &str,
    existing: &Type,
    new: &Type,
    span: Span,
    previous: Span,
) -> Diag {
    Diag::error(
        span,
        format!(
            "procedures named '{}' disagree on return type: {} vs {}",
            name, existing, new
        ),
        format!("declared returning {}", new),
    )
    .related(previous, format!("previously declared returning {}", existing))
}

/// Applicable candidates at one call site resolve to different return types.
pub fn dispatch_return_divergence(name: &str, left: &Type, right: &Type, span: Span) -> Diag {
    Diag::error(
        span,
        format!(
            "applicable candidates for '{}' disagree on return type: {} vs {}",
            name, left, right
        ),
        "call cannot be given a single static type",
    )
}

/// Applicable candidates whose signatures the specificity rules cannot order.
pub fn ambiguous_dispatch(name: &str, left: &str, right: &str, span: Span) -> Diag {
    Diag::error(
        span,
        format!(
            "ambiguous dispatch for call to '{}': neither {} nor {} is more general",
            name, left, right
        ),
        "candidates cannot be ordered by specificity",
    )
    .suggest("add an order declaration relating the differing qualifiers")
}

/// An `order` declaration that would make the relation cyclic.
pub fn ordering_cycle(lesser: &str, greater: &str, span: Span) -> Diag {
    Diag::error(
        span,
        format!(
            "ordering cycle: '{}' and '{}' are already related in the opposite direction",
            lesser, greater
        ),
        "this declaration closes a cycle",
    )
}

/// No candidate accepted the call's arity.
pub fn arity_mismatch(name: &str, expected: &[usize], found: usize, span: Span) -> Diag {
    let expected = expected
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>()
        .join(" or ");
    Diag::error(
        span,
        format!(
            "wrong number of arguments to '{}': expected {}, found {}",
            name, expected, found
        ),
        "in this call",
    )
}

/// Every candidate was rejected during the dispatch probe.
pub fn no_applicable_candidate(name: &str, span: Span, best_reason: Option<String>) -> Diag {
    let message = match best_reason {
        Some(reason) => format!(
            "no applicable candidate for call to '{}': closest candidate failed: {}",
            name, reason
        ),
        None => format!("no applicable candidate for call to '{}'", name),
    };
    Diag::error(span, message, "no signature accepts these argument types")
}

/// A name declared twice in the same scope.
pub fn duplicate_declaration(kind: &str, name: &str, span: Span, previous: Span) -> Diag {
    Diag::error(
        span,
        format!("duplicate {} '{}'", kind, name),
        "declared again here",
    )
    .related(previous, "first declared here")
}

/// Indexing applied to a non-map variable.
pub fn not_a_map(name: &str, ty: &Type, span: Span) -> Diag {
    Diag::error(
        span,
        format!("'{}' is not a map: it has type {}", name, ty),
        "indexed here",
    )
}

/// `super` used where the dispatch chain cannot continue.
pub fn invalid_super(name: &str, span: Span) -> Diag {
    Diag::error(
        span,
        format!(
            "'super' used in '{}', which has no other candidate of this arity",
            name
        ),
        "no more specific procedure to dispatch to",
    )
}
