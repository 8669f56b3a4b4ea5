// Integration tests for the checker: representative whole programs and the
// verdicts they must produce.

use dieter_checker::parse_and_check;

fn check_ok(source: &str) {
    let result = parse_and_check(source);
    assert!(
        result.ir.is_some(),
        "expected OK, got diagnostics: {:#?}",
        result.diagnostics
    );
    assert!(result.diagnostics.is_empty());
}

fn check_fails_mentioning(source: &str, needles: &[&str]) {
    let result = parse_and_check(source);
    assert!(result.ir.is_none(), "expected rejection, got OK");
    let rendered = result
        .diagnostics
        .iter()
        .map(|d| format!("{:?}", d))
        .collect::<Vec<_>>()
        .join("\n");
    for needle in needles {
        assert!(
            rendered.to_lowercase().contains(&needle.to_lowercase()),
            "expected a diagnostic mentioning '{}', got:\n{}",
            needle,
            rendered
        );
    }
}

// ==================== The person module ====================

#[test]
fn person_module_typechecks() {
    let source = "
forward new_ref(): ref

module person
var names: map from person ref to string
var ages: map from person ref to int

procedure person_new(name: string, age: int): person ref
var p: person ref
begin
    p := bestow person new_ref()
    names[p] := name
    ages[p] := age
    return p
end

procedure name_of(p: person ref): string
    return names[p]

procedure age_of(p: person ref): int
    return ages[p]
end
.";
    check_ok(source);
}

#[test]
fn person_map_rejects_unqualified_key() {
    // Reading the names map with a bare ref: the key type demands the
    // person qualifier.
    let source = "
forward new_ref(): ref

module person
var names: map from person ref to string

procedure name_of_raw(r: ref): string
    return names[r]
end
.";
    check_fails_mentioning(source, &["person"]);
}

// ==================== Re-binding toward less qualified types ====================

#[test]
fn rebinding_accepts_mixed_qualification() {
    // glunt(i) has type gnarly int; 4 is a plain int. Checking equal's
    // second argument re-binds its variable from gnarly int down to int.
    let source = "
module beefy end
module gnarly end

forward glunt(beefy gnarly \u{2665}t): gnarly \u{2665}t
forward equal(\u{2665}t, \u{2665}t): bool

module driver
procedure run(i: beefy gnarly int): bool
    return equal(glunt(i), 4)
end
.";
    check_ok(source);
}

// ==================== Qualifier-superset violations ====================

#[test]
fn missing_qualifier_on_polymorphic_argument_is_rejected() {
    // traub demands beefy gnarly; the caller's own variable supplies only
    // beefy. The caller's variable ranges over all types, so gnarly cannot
    // be assumed.
    let source = "
module beefy end
module gnarly end

forward traub(beefy gnarly \u{2665}t): bool

module driver
procedure run(x: beefy \u{2665}s): bool
    return traub(x)
end
.";
    check_fails_mentioning(source, &["gnarly"]);
}

#[test]
fn qualified_variable_rejects_bare_value() {
    let source = "
module gnarly end

module driver
var g: gnarly int
procedure run(x: int): void
    g := x
end
.";
    check_fails_mentioning(source, &["gnarly"]);
}

// ==================== Bestow encapsulation ====================

#[test]
fn bestow_outside_defining_module_is_rejected() {
    let source = "
module beta end

module alpha
procedure bad(x: int): beta int
    return bestow beta x
end
.";
    check_fails_mentioning(source, &["beta", "module"]);
}

#[test]
fn bestow_inside_defining_module_is_accepted() {
    let source = "
module beta
procedure mark(x: int): beta int
    return bestow beta x
end
.";
    check_ok(source);
}

// ==================== Dispatch ambiguity and ordering ====================

#[test]
fn ambiguous_dispatch_without_ordering() {
    let source = "
module beefy end
module gnarly end

forward grind(gnarly \u{2665}t): bool
forward grind(beefy \u{2665}t): bool

module driver
procedure run(x: beefy gnarly int): bool
    return grind(x)
end
.";
    check_fails_mentioning(source, &["ambiguous", "order"]);
}

#[test]
fn ordering_declaration_resolves_ambiguity() {
    let source = "
order beefy < gnarly

module beefy end
module gnarly end

forward grind(gnarly \u{2665}t): bool
forward grind(beefy \u{2665}t): bool

module driver
procedure run(x: beefy gnarly int): bool
    return grind(x)
end
.";
    check_ok(source);
}

// ==================== Return-type coherence ====================

#[test]
fn return_type_divergence_is_rejected() {
    let source = "
forward foo(int): int
forward foo(int): bool
.";
    check_fails_mentioning(source, &["return type"]);
}

#[test]
fn renamed_type_variables_do_not_diverge() {
    let source = "
module gnarly end
forward glunt(gnarly \u{2665}t): gnarly \u{2665}t
forward glunt(\u{2665}u): gnarly \u{2665}u
.";
    check_ok(source);
}

// ==================== Undefined names ====================

#[test]
fn undefined_qualifier_is_rejected() {
    let source = "
module driver
var x: beefy int
end
.";
    check_fails_mentioning(source, &["beefy"]);
}

#[test]
fn undefined_procedure_is_rejected() {
    let source = "
module driver
procedure run(x: int): int
    return frobnicate(x)
end
.";
    check_fails_mentioning(source, &["frobnicate"]);
}

#[test]
fn undefined_variable_is_rejected() {
    let source = "
module driver
procedure run(x: int): int
    return y
end
.";
    check_fails_mentioning(source, &["undefined variable"]);
}

// ==================== Ordering cycles ====================

#[test]
fn ordering_cycle_is_rejected() {
    let source = "
order a < b
order b < c
order c < a
.";
    check_fails_mentioning(source, &["cycle"]);
}

// ==================== Arity ====================

#[test]
fn arity_mismatch_is_rejected() {
    let source = "
forward succ(int): int
module driver
procedure run(x: int): int
    return succ(x, x)
end
.";
    check_fails_mentioning(source, &["number of arguments"]);
}

// ==================== super ====================

#[test]
fn super_with_sibling_candidate_is_accepted() {
    let source = "
module gnarly end

forward grind(\u{2665}t): int

module driver
procedure grind(x: gnarly int): int
    return super
end
.";
    check_ok(source);
}

#[test]
fn super_without_sibling_candidate_is_rejected() {
    let source = "
module driver
procedure solo(x: int): int
    return super
end
.";
    check_fails_mentioning(source, &["super"]);
}

// ==================== Conditions, literals, maps ====================

#[test]
fn condition_must_be_bool() {
    let source = "
module driver
procedure run(x: int): int
begin
    if x then return 1
    return 0
end
end
.";
    check_fails_mentioning(source, &["bool"]);
}

#[test]
fn qualified_bool_condition_is_accepted() {
    let source = "
module gnarly end
module driver
procedure run(flag: gnarly bool): int
begin
    while flag do return 1
    return 0
end
end
.";
    check_ok(source);
}

#[test]
fn mixin_map_accepts_any_key_type() {
    let source = "
module driver
var bag: map to int
procedure run(s: string, n: int): int
begin
    bag[s] := 1
    bag[n] := 2
    return bag[s]
end
end
.";
    check_ok(source);
}

#[test]
fn indexing_a_non_map_is_rejected() {
    let source = "
module driver
procedure run(x: int): int
    return x[4]
end
.";
    check_fails_mentioning(source, &["not a map"]);
}

// ==================== Error recovery breadth ====================

#[test]
fn multiple_declarations_each_report() {
    // Two independent bad declarations: both must surface in one run.
    let source = "
module beta end

module alpha
procedure bad_bestow(x: int): beta int
    return bestow beta x
procedure bad_name(x: int): int
    return nowhere(x)
end
.";
    let result = parse_and_check(source);
    assert!(result.ir.is_none());
    assert!(
        result.diagnostics.len() >= 2,
        "expected both declarations to report, got {:#?}",
        result.diagnostics
    );
}

#[test]
fn duplicate_module_is_rejected() {
    let source = "
module twice end
module twice end
.";
    check_fails_mentioning(source, &["duplicate"]);
}

#[test]
fn duplicate_parameter_is_rejected() {
    let source = "
module driver
procedure run(x: int, x: bool): int
    return 1
end
.";
    check_fails_mentioning(source, &["duplicate"]);
}

#[test]
fn recursion_through_own_signature_is_accepted() {
    let source = "
forward equal(\u{2665}t, \u{2665}t): bool
forward pred(int): int

module driver
procedure count_down(n: int): int
begin
    if equal(n, 0) then return 0
    return count_down(pred(n))
end
end
.";
    check_ok(source);
}
