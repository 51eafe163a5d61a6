#![forbid(unsafe_code)]

//! Routine enumeration: iterative deepening over the subroutine library with
//! behavioral-equivalence deduplication.

pub mod r#gen;

pub use r#gen::{GenerateError, generate_examples, generate_examples_checked, sample_inputs};

use lr_core::types::{Base, Params, Ty};
use lr_core::{Node, Routine, Value, Wire};
use lr_interp::{TypeVector, check_routine, eval_unchecked};
use lr_prims::{Prng, Registry, Subroutine};
use rustc_hash::FxHashSet;

/// Deepening aborts past this routine size.
const SIZE_CAP: usize = 7;
/// Inputs sampled per side when testing behavioral equivalence.
const SAMPLE_COUNT: usize = 4;
/// Rounds of static-value regeneration before keeping the originals.
const STATIC_RETRIES: usize = 5;
/// Rejection-sampling attempts before falling back to a scan.
const PARAM_ATTEMPTS: usize = 32;
/// Magnitude bound for sampled static values.
pub const RAND_LIMIT: i64 = 10;

#[derive(Debug, Clone)]
struct Candidate {
    routine: Routine,
    tv: TypeVector,
}

/// Enumerate up to `bound` behaviorally distinct, well-typed routines.
///
/// Size-1 seeds cover the whole library in lexicographic order; deepening
/// appends one node at a time, wiring the newest output into a
/// type-compatible slot. Every surviving routine re-passes the checker.
pub fn enumerate_routines(registry: &Registry, bound: usize, prng: &mut Prng) -> Vec<Routine> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut pool: Vec<Candidate> = Vec::new();

    for candidate in seed_candidates(registry, prng) {
        if pool.len() >= bound {
            break;
        }
        admit_candidate(registry, &mut pool, &mut seen, candidate, prng);
    }

    let mut frontier: Vec<Candidate> = pool.clone();
    let mut size = 1;
    while pool.len() < bound && !frontier.is_empty() {
        size += 1;
        if size > SIZE_CAP {
            tracing::warn!(size, bound, built = pool.len(), "size cap hit; stopping early");
            break;
        }
        let mut next = Vec::new();
        'layer: for mut candidate in frontier {
            regenerate_statics(registry, &mut candidate, prng);
            for extended in deepen(registry, &candidate, prng) {
                if pool.len() >= bound {
                    break 'layer;
                }
                if admit_candidate(registry, &mut pool, &mut seen, extended.clone(), prng) {
                    next.push(extended);
                }
            }
        }
        frontier = next;
    }

    let mut routines = Vec::with_capacity(pool.len().min(bound));
    for candidate in pool {
        if routines.len() >= bound {
            break;
        }
        if check_routine(registry, &candidate.routine).is_ok() {
            routines.push(candidate.routine);
        } else {
            tracing::warn!(
                routine = %candidate.routine,
                "enumerated routine no longer passes its own check; discarded"
            );
        }
    }
    routines
}

/// Push unless syntactically seen or behaviorally equivalent to a held
/// routine. Returns whether the candidate was admitted.
fn admit_candidate(
    registry: &Registry,
    pool: &mut Vec<Candidate>,
    seen: &mut FxHashSet<String>,
    candidate: Candidate,
    prng: &mut Prng,
) -> bool {
    if !seen.insert(candidate.routine.to_string()) {
        return false;
    }
    if pool
        .iter()
        .any(|held| equivalent(registry, held, &candidate, prng))
    {
        return false;
    }
    pool.push(candidate);
    true
}

fn seed_candidates(registry: &Registry, prng: &mut Prng) -> Vec<Candidate> {
    let mut seeds = Vec::new();
    for subroutine in registry.subroutines() {
        let mut wires = vec![Wire::Dyn(0)];
        for slot in 0..subroutine.params.len() {
            wires.push(Wire::Static(sample_param(subroutine, slot, RAND_LIMIT, prng)));
        }
        let routine = Routine::new(vec![Node::new(subroutine.name, wires)]);
        if let Ok(tv) = check_routine(registry, &routine) {
            seeds.push(Candidate { routine, tv });
        }
    }
    seeds
}

/// Pairwise behavioral equivalence: identical inferred input types, and
/// each side's sampled inputs produce equal outputs on both routines.
/// Sampling or evaluation failure on either side means "distinct"; the
/// relation is a pragmatic filter, not a true equivalence.
fn equivalent(registry: &Registry, a: &Candidate, b: &Candidate, prng: &mut Prng) -> bool {
    if a.tv.input() != b.tv.input() {
        return false;
    }
    let Some(sampled_a) = sample_inputs(registry, &a.routine, &a.tv, SAMPLE_COUNT, prng) else {
        return false;
    };
    let Some(sampled_b) = sample_inputs(registry, &b.routine, &b.tv, SAMPLE_COUNT, prng) else {
        return false;
    };
    sampled_a.iter().chain(sampled_b.iter()).all(|input| {
        match (
            eval_unchecked(registry, &a.routine, input),
            eval_unchecked(registry, &b.routine, input),
        ) {
            (Ok(out_a), Ok(out_b)) => out_a == out_b,
            _ => false,
        }
    })
}

/// Re-sample every static wire in place; keep the originals if no
/// resampling round yields a routine that still checks.
fn regenerate_statics(registry: &Registry, candidate: &mut Candidate, prng: &mut Prng) {
    for _ in 0..STATIC_RETRIES {
        let mut routine = candidate.routine.clone();
        let mut resampled = false;
        for node in &mut routine.nodes {
            let Some(subroutine) = registry.get(&node.name) else {
                return;
            };
            for slot in 1..node.wires.len() {
                if matches!(node.wires[slot], Wire::Static(_)) {
                    node.wires[slot] =
                        Wire::Static(sample_param(subroutine, slot - 1, RAND_LIMIT, prng));
                    resampled = true;
                }
            }
            if matches!(node.wires[0], Wire::Static(_)) {
                let ty = subroutine
                    .input
                    .resolve(&lr_interp::static_params(node, subroutine))
                    .unwrap_or_else(|_| Ty::int());
                node.wires[0] = Wire::Static(sample_in_type(&ty, RAND_LIMIT, prng));
                resampled = true;
            }
        }
        if !resampled {
            return;
        }
        if let Ok(tv) = check_routine(registry, &routine) {
            *candidate = Candidate { routine, tv };
            return;
        }
    }
}

/// All one-node extensions of `candidate`: for every subroutine and every
/// slot whose required type accepts the routine's current output, wire the
/// newest output into that slot and fill the remaining slots with
/// back-references or fresh statics.
fn deepen(registry: &Registry, candidate: &Candidate, prng: &mut Prng) -> Vec<Candidate> {
    let newest = candidate.routine.len();
    let out_ty = *candidate.tv.output();
    let mut extensions = Vec::new();
    for subroutine in registry.subroutines() {
        for target_slot in 0..subroutine.arity() {
            let Some(node) =
                build_extension(candidate, subroutine, target_slot, newest, &out_ty, prng)
            else {
                continue;
            };
            let mut routine = candidate.routine.clone();
            routine.nodes.push(node);
            if let Ok(tv) = check_routine(registry, &routine) {
                extensions.push(Candidate { routine, tv });
            }
        }
    }
    extensions
}

fn build_extension(
    candidate: &Candidate,
    subroutine: &Subroutine,
    target_slot: usize,
    newest: usize,
    out_ty: &Ty,
    prng: &mut Prng,
) -> Option<Node> {
    let arity = subroutine.arity();
    let mut wires: Vec<Option<Wire>> = vec![None; arity];
    wires[target_slot] = Some(Wire::Dyn(newest));

    // First pick the static parameters; the required types of the remaining
    // slots (and of the target) may depend on them.
    let mut backref_slots = Vec::new();
    for slot in 0..arity {
        if slot == target_slot {
            continue;
        }
        let expr = slot_expr(subroutine, slot);
        if expr.base == Base::IntList || prng.chance(3, 10) {
            backref_slots.push(slot);
        } else if slot == 0 {
            let ty = expr.resolve(&Params::default()).unwrap_or_else(|_| Ty::int());
            wires[slot] = Some(Wire::Static(sample_in_type(&ty, RAND_LIMIT, prng)));
        } else {
            wires[slot] = Some(Wire::Static(sample_param(
                subroutine,
                slot - 1,
                RAND_LIMIT,
                prng,
            )));
        }
    }

    let mut statics = Params::default();
    for (idx, (name, _)) in subroutine.params.iter().enumerate() {
        if let Some(Some(Wire::Static(value))) = wires.get(idx + 1) {
            statics.set(*name, *value);
        }
    }

    let required = slot_expr(subroutine, target_slot).resolve(&statics).ok()?;
    if !out_ty.subtype(&required) {
        return None;
    }

    for slot in backref_slots {
        let expr = slot_expr(subroutine, slot);
        let required = expr.resolve(&statics).ok()?;
        let choices: Vec<usize> = (0..=newest)
            .filter(|index| {
                candidate
                    .tv
                    .get(*index)
                    .is_some_and(|ty| ty.subtype(&required))
            })
            .collect();
        match prng.pick(&choices) {
            Some(index) => wires[slot] = Some(Wire::Dyn(*index)),
            // A list-valued slot with nothing to read kills the candidate;
            // an integer slot falls back to a fresh static.
            None if expr.base == Base::IntList => return None,
            None if slot == 0 => {
                let ty = expr.resolve(&statics).unwrap_or_else(|_| Ty::int());
                wires[slot] = Some(Wire::Static(sample_in_type(&ty, RAND_LIMIT, prng)));
            }
            None => {
                wires[slot] = Some(Wire::Static(sample_param(
                    subroutine,
                    slot - 1,
                    RAND_LIMIT,
                    prng,
                )));
            }
        }
    }

    let wires: Option<Vec<Wire>> = wires.into_iter().collect();
    Some(Node::new(subroutine.name, wires?))
}

fn slot_expr(subroutine: &Subroutine, slot: usize) -> lr_core::types::TyExpr {
    if slot == 0 {
        subroutine.input
    } else {
        subroutine.params[slot - 1].1
    }
}

/// Sample a static value for a parameter slot, respecting its declared type.
pub fn sample_param(subroutine: &Subroutine, slot: usize, limit: i64, prng: &mut Prng) -> i64 {
    let ty = subroutine
        .params
        .get(slot)
        .and_then(|(_, expr)| expr.resolve(&Params::default()).ok())
        .unwrap_or_else(Ty::int);
    sample_in_type(&ty, limit, prng)
}

fn sample_in_type(ty: &Ty, limit: i64, prng: &mut Prng) -> i64 {
    let (lo, hi) = match ty.range {
        Some((lo, hi)) => (lo.max(-limit), hi.min(limit)),
        None => (-limit, limit),
    };
    let (lo, hi) = if lo > hi { (-limit, limit) } else { (lo, hi) };
    for _ in 0..PARAM_ATTEMPTS {
        let value = prng.range_i64(lo, hi);
        if ty.admits(&Value::Int(value)) {
            return value;
        }
    }
    // Deterministic fallback: smallest admissible magnitude.
    for magnitude in 0..=limit.max(1) {
        for value in [magnitude, -magnitude] {
            if ty.admits(&Value::Int(value)) {
                return value;
            }
        }
    }
    1
}
