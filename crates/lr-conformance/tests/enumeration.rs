//! Enumerator conformance: a fixed-seed run fills its bound with distinct,
//! re-checkable routines whose generators produce genuine examples.

use lr_interp::{check_routine, eval_unchecked};
use lr_prims::{GenConfig, Prng, Registry};
use lr_synth::{enumerate_routines, generate_examples};
use rustc_hash::FxHashSet;

const SEED: u64 = 0x5EED_CAFE;

#[test]
fn fixed_seed_run_fills_the_bound() {
    let registry = Registry::global();
    let mut prng = Prng::from_seed(SEED);
    let routines = enumerate_routines(registry, 10, &mut prng);
    assert_eq!(routines.len(), 10);

    let notations: FxHashSet<String> = routines.iter().map(|r| r.to_string()).collect();
    assert_eq!(notations.len(), 10, "notations must be pairwise distinct");

    for routine in &routines {
        check_routine(registry, routine).expect("every enumerated routine re-checks");
    }
}

#[test]
fn every_enumerated_routine_yields_an_example() {
    let registry = Registry::global();
    let mut prng = Prng::from_seed(SEED);
    let routines = enumerate_routines(registry, 10, &mut prng);
    for routine in &routines {
        let pairs = generate_examples(registry, routine, &GenConfig::with_count(1), &mut prng)
            .unwrap_or_else(|err| panic!("{} yielded no example: {}", routine, err));
        assert!(!pairs.is_empty());
    }
}

#[test]
fn generated_examples_round_trip_through_evaluation() {
    let registry = Registry::global();
    let mut prng = Prng::from_seed(SEED ^ 1);
    let routines = enumerate_routines(registry, 8, &mut prng);
    for routine in &routines {
        let pairs = generate_examples(registry, routine, &GenConfig::with_count(3), &mut prng)
            .unwrap_or_else(|err| panic!("{} yielded no examples: {}", routine, err));
        for (input, output) in pairs {
            assert_eq!(
                eval_unchecked(registry, routine, &input),
                Ok(output),
                "round-trip failed for {}",
                routine
            );
        }
    }
}

#[test]
fn outputs_of_enumerated_routines_inhabit_their_types() {
    let registry = Registry::global();
    let mut prng = Prng::from_seed(SEED ^ 2);
    let routines = enumerate_routines(registry, 8, &mut prng);
    for routine in &routines {
        let tv = check_routine(registry, routine).expect("routine checks");
        let pairs = generate_examples(registry, routine, &GenConfig::with_count(2), &mut prng)
            .unwrap_or_else(|err| panic!("{} yielded no examples: {}", routine, err));
        for (input, output) in pairs {
            assert!(tv.input().admits(&input));
            assert!(
                tv.output().admits(&output),
                "{} output {:?} escapes its inferred type",
                routine,
                output
            );
        }
    }
}
