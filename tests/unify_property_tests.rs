// Property-style tests for the unifier over randomized qualifier sets.

use dieter_checker::semantic::unify::{UnifyErrorKind, unify};
use dieter_checker::types::{BaseType, Primitive, QualifierSet, Subst, Type, TyVarGen};

const UNIVERSE: [&str; 5] = ["beefy", "gnarly", "person", "red", "tall"];

fn next(seed: &mut u64) -> u64 {
    *seed = seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(1442695040888963407);
    *seed
}

fn random_quals(seed: &mut u64) -> QualifierSet {
    let bits = next(seed) % (1 << UNIVERSE.len());
    QualifierSet::from_names(
        UNIVERSE
            .iter()
            .enumerate()
            .filter(|(i, _)| bits & (1 << i) != 0)
            .map(|(_, name)| *name),
    )
}

fn qint(quals: QualifierSet) -> Type {
    Type::new(quals, BaseType::Prim(Primitive::Int))
}

#[test]
fn concrete_unification_succeeds_exactly_on_superset() {
    let mut seed = 0xD1E7E3_u64;
    for _ in 0..2_000 {
        let receptor_quals = random_quals(&mut seed);
        let provider_quals = random_quals(&mut seed);
        let should_succeed = receptor_quals.is_subset_of(&provider_quals);

        let mut subst = Subst::new();
        let outcome = unify(
            &qint(receptor_quals.clone()),
            &qint(provider_quals.clone()),
            &mut subst,
        );
        assert_eq!(
            outcome.is_ok(),
            should_succeed,
            "receptor {:?} provider {:?}",
            receptor_quals,
            provider_quals
        );
        if let Err(err) = outcome {
            assert_eq!(
                err.kind,
                UnifyErrorKind::QualifierViolation {
                    missing: receptor_quals.difference(&provider_quals),
                }
            );
        }
    }
}

#[test]
fn successful_unification_restores_direction_under_substitution() {
    // If unify(R, P) succeeds, then applying the resulting substitution to
    // both sides leaves the provider's qualifiers a superset of the
    // receptor's, with equal bases.
    let mut seed = 0xBEEF_u64;
    let mut tyvars = TyVarGen::new();
    for _ in 0..2_000 {
        let site_quals = random_quals(&mut seed);
        let provider_quals = random_quals(&mut seed);
        let var = tyvars.fresh("t".into());
        let mut subst = Subst::new();
        subst.mark_flexible(var.id);

        let receptor = Type::new(site_quals.clone(), BaseType::Var(var));
        let provider = qint(provider_quals);
        if unify(&receptor, &provider, &mut subst).is_ok() {
            let r = subst.apply(&receptor);
            let p = subst.apply(&provider);
            assert!(
                r.qualifiers.is_subset_of(&p.qualifiers),
                "direction invariant broken: {} vs {}",
                r,
                p
            );
            assert_eq!(r.base, p.base);
        } else {
            // The only failure mode here is a site qualifier the provider
            // lacks.
            assert!(!site_quals.is_subset_of(&subst.apply(&provider).qualifiers));
        }
    }
}

#[test]
fn rebinding_only_ever_loosens() {
    // Feeding one variable a random sequence of providers can only shrink
    // its qualifier set, and the final binding is satisfiable by every
    // provider seen.
    let mut seed = 0xCAFE_u64;
    let mut tyvars = TyVarGen::new();
    for _ in 0..500 {
        let var = tyvars.fresh("t".into());
        let mut subst = Subst::new();
        subst.mark_flexible(var.id);
        let receptor = Type::bare(BaseType::Var(var.clone()));

        let mut providers = Vec::new();
        for _ in 0..4 {
            let quals = random_quals(&mut seed);
            providers.push(quals.clone());
            let before = subst.binding(var.id).map(|t| t.qualifiers.clone());
            unify(&receptor, &qint(quals), &mut subst).expect("bare receptor never fails");
            let after = subst
                .binding(var.id)
                .map(|t| t.qualifiers.clone())
                .expect("variable is bound after first use");
            if let Some(before) = before {
                assert!(
                    after.is_subset_of(&before),
                    "re-binding tightened: {:?} -> {:?}",
                    before,
                    after
                );
            }
        }

        let finally = subst.binding(var.id).unwrap().qualifiers.clone();
        for provider in providers {
            assert!(
                finally.is_subset_of(&provider),
                "final binding {:?} not satisfiable by provider {:?}",
                finally,
                provider
            );
        }
    }
}

#[test]
fn asymmetry_witness() {
    let mut subst = Subst::new();
    assert!(
        unify(
            &qint(QualifierSet::empty()),
            &qint(QualifierSet::from_names(["gnarly"])),
            &mut subst,
        )
        .is_ok()
    );

    let mut subst = Subst::new();
    assert!(
        unify(
            &qint(QualifierSet::from_names(["gnarly"])),
            &qint(QualifierSet::empty()),
            &mut subst,
        )
        .is_err()
    );
}

#[test]
fn substitutions_do_not_leak_across_resolutions() {
    // The same variable identity bound in one substitution is untouched in a
    // fresh one; each resolution starts clean.
    let mut tyvars = TyVarGen::new();
    let var = tyvars.fresh("t".into());

    let mut first = Subst::new();
    first.mark_flexible(var.id);
    let receptor = Type::bare(BaseType::Var(var.clone()));
    unify(&receptor, &qint(QualifierSet::from_names(["gnarly"])), &mut first).unwrap();
    assert!(first.binding(var.id).is_some());

    let second = Subst::new();
    assert!(second.binding(var.id).is_none());
    assert!(!second.is_flexible(var.id));
}
