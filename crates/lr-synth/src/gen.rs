//! Example-input generation for a checked routine.
//!
//! The first node must consume the overall input directly; its subroutine's
//! generator proposes candidates under the node's static parameters, and the
//! inferred input type filters them. Candidates are proposed in rounds, so a
//! generator with a low hit rate gets a bounded number of second chances.

use lr_core::{Routine, RoutineValidationError, Value, Wire};
use lr_interp::{CheckError, TypeVector, check_routine, eval_unchecked, static_params};
use lr_prims::{GenConfig, Prng, Registry};

const PROPOSAL_ROUNDS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    Check(CheckError),
    /// The first node's input wire is not `(dyn 0)`.
    FirstNodeNotOverallInput,
    /// No proposed candidate survived the type filter (or evaluation) after
    /// all rounds.
    Exhausted { name: String },
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Check(err) => write!(f, "routine check failed: {}", err),
            Self::FirstNodeNotOverallInput => {
                write!(f, "first node does not consume the overall input")
            }
            Self::Exhausted { name } => {
                write!(f, "generator for `{}` exhausted its proposal rounds", name)
            }
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<CheckError> for GenerateError {
    fn from(value: CheckError) -> Self {
        Self::Check(value)
    }
}

/// Check the routine, then produce `(input, output)` example pairs.
pub fn generate_examples(
    registry: &Registry,
    routine: &Routine,
    cfg: &GenConfig,
    prng: &mut Prng,
) -> Result<Vec<(Value, Value)>, GenerateError> {
    let tv = check_routine(registry, routine)?;
    generate_examples_checked(registry, routine, &tv, cfg, prng)
}

/// As [`generate_examples`], for a routine the caller already checked.
pub fn generate_examples_checked(
    registry: &Registry,
    routine: &Routine,
    tv: &TypeVector,
    cfg: &GenConfig,
    prng: &mut Prng,
) -> Result<Vec<(Value, Value)>, GenerateError> {
    let accepted = accepted_inputs(registry, routine, tv, cfg, prng)?;

    let mut pairs = Vec::with_capacity(accepted.len());
    for input in accepted {
        match eval_unchecked(registry, routine, &input) {
            Ok(output) => pairs.push((input, output)),
            Err(err) => {
                tracing::warn!(routine = %routine, %err, "accepted input failed to evaluate");
            }
        }
    }

    if pairs.is_empty() {
        return Err(exhausted(routine));
    }
    Ok(pairs)
}

/// Sample exactly `count` inputs inhabiting the routine's input type, or
/// `None` when the generator cannot deliver them.
pub fn sample_inputs(
    registry: &Registry,
    routine: &Routine,
    tv: &TypeVector,
    count: usize,
    prng: &mut Prng,
) -> Option<Vec<Value>> {
    let cfg = GenConfig::with_count(count);
    accepted_inputs(registry, routine, tv, &cfg, prng)
        .ok()
        .filter(|inputs| inputs.len() == count)
}

fn accepted_inputs(
    registry: &Registry,
    routine: &Routine,
    tv: &TypeVector,
    cfg: &GenConfig,
    prng: &mut Prng,
) -> Result<Vec<Value>, GenerateError> {
    let first = routine.first_node().ok_or(GenerateError::Check(
        CheckError::Structure(RoutineValidationError::Empty),
    ))?;
    if first.input_wire() != Some(Wire::Dyn(0)) {
        return Err(GenerateError::FirstNodeNotOverallInput);
    }
    let subroutine =
        registry
            .get(&first.name)
            .ok_or_else(|| CheckError::UnknownSubroutine {
                name: first.name.clone(),
            })?;
    let params = static_params(first, subroutine);

    let mut accepted = Vec::new();
    for _ in 0..PROPOSAL_ROUNDS {
        for candidate in (subroutine.generate)(cfg, &params, prng) {
            if tv.input().admits(&candidate) {
                accepted.push(candidate);
            }
        }
        if accepted.len() >= cfg.count {
            break;
        }
    }

    if accepted.is_empty() {
        tracing::warn!(
            routine = %routine,
            input_ty = ?tv.input(),
            params = ?params,
            "no generated candidate inhabits the inferred input type"
        );
        return Err(exhausted(routine));
    }
    accepted.truncate(cfg.count);
    Ok(accepted)
}

fn exhausted(routine: &Routine) -> GenerateError {
    GenerateError::Exhausted {
        name: routine
            .first_node()
            .map(|node| node.name.clone())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::{GenerateError, generate_examples, sample_inputs};
    use lr_core::{Routine, Value};
    use lr_interp::{check_routine, eval_unchecked};
    use lr_prims::{GenConfig, Prng, Registry};

    fn routine(text: &str) -> Routine {
        text.parse().expect("routine notation parses")
    }

    #[test]
    fn examples_round_trip_through_evaluation() {
        let registry = Registry::global();
        let routine = routine("(index-k (dyn 0) (static 3)) (add-k (dyn 0) (dyn 1))");
        let mut prng = Prng::from_seed(17);
        let pairs = generate_examples(registry, &routine, &GenConfig::with_count(4), &mut prng)
            .expect("examples should generate");
        assert!(!pairs.is_empty());
        for (input, output) in pairs {
            assert_eq!(eval_unchecked(registry, &routine, &input), Ok(output));
        }
    }

    #[test]
    fn generated_inputs_inhabit_inferred_type() {
        let registry = Registry::global();
        let routine = routine("(last (dyn 0))");
        let tv = check_routine(registry, &routine).expect("checks");
        let mut prng = Prng::from_seed(23);
        let inputs =
            sample_inputs(registry, &routine, &tv, 4, &mut prng).expect("sampling succeeds");
        assert_eq!(inputs.len(), 4);
        for input in inputs {
            assert!(tv.input().admits(&input));
            assert!(input.as_list().is_some_and(|items| !items.is_empty()));
        }
    }

    #[test]
    fn bad_routine_is_rejected_before_generation() {
        let registry = Registry::global();
        let mut prng = Prng::from_seed(1);
        let err = generate_examples(
            registry,
            &routine("(mystery (dyn 0))"),
            &GenConfig::default(),
            &mut prng,
        )
        .expect_err("should fail");
        assert!(matches!(err, GenerateError::Check(_)));
    }

    #[test]
    fn first_node_must_consume_overall_input() {
        let registry = Registry::global();
        let mut prng = Prng::from_seed(2);
        // Structurally valid: the second node reads both the input and the
        // first node's output, but the first node reads a constant.
        let r = routine("(range (static 4)) (count-k (dyn 1) (dyn 0))");
        check_routine(registry, &r).expect("routine checks");
        let err = generate_examples(registry, &r, &GenConfig::default(), &mut prng)
            .expect_err("should fail");
        assert_eq!(err, GenerateError::FirstNodeNotOverallInput);
    }
}
