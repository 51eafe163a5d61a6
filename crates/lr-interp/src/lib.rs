#![forbid(unsafe_code)]

pub mod check;

pub use check::{CheckError, TypeVector, check_routine, static_params};

use lr_core::types::Params;
use lr_core::{Routine, Value, Wire};
use lr_prims::{EvalError, Registry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    Check(CheckError),
    /// The concrete input does not inhabit the inferred input type.
    InputRejected,
    /// A dynamic wire resolved to a missing slot; unreachable for routines
    /// that passed the checker.
    MissingValue {
        index: usize,
    },
    /// A dynamic parameter wire delivered a list where a number is needed.
    ParamShape {
        node: usize,
    },
    Eval(EvalError),
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Check(err) => write!(f, "routine check failed: {}", err),
            Self::InputRejected => write!(f, "input does not inhabit the inferred input type"),
            Self::MissingValue { index } => write!(f, "no value at index {}", index),
            Self::ParamShape { node } => {
                write!(f, "node {} received a list-valued parameter", node)
            }
            Self::Eval(err) => write!(f, "evaluation failed: {}", err),
        }
    }
}

impl std::error::Error for RunError {}

impl From<CheckError> for RunError {
    fn from(value: CheckError) -> Self {
        Self::Check(value)
    }
}

impl From<EvalError> for RunError {
    fn from(value: EvalError) -> Self {
        Self::Eval(value)
    }
}

/// Check the routine, test the input against the inferred input type, then
/// execute.
pub fn eval_routine(
    registry: &Registry,
    routine: &Routine,
    input: &Value,
) -> Result<Value, RunError> {
    let tv = check_routine(registry, routine)?;
    if !tv.input().admits(input) {
        return Err(RunError::InputRejected);
    }
    eval_unchecked(registry, routine, input)
}

/// Execute a routine the caller has already checked. Threads a flat value
/// vector `V` with `V[0] = input`; each node reads its wires out of `V` and
/// appends its output.
pub fn eval_unchecked(
    registry: &Registry,
    routine: &Routine,
    input: &Value,
) -> Result<Value, RunError> {
    let mut values: Vec<Value> = Vec::with_capacity(routine.len() + 1);
    values.push(input.clone());

    for (idx, node) in routine.nodes.iter().enumerate() {
        let node_index = idx + 1;
        let subroutine =
            registry
                .get(&node.name)
                .ok_or_else(|| CheckError::UnknownSubroutine {
                    name: node.name.clone(),
                })?;

        let node_input = match node.input_wire() {
            Some(Wire::Static(value)) => Value::Int(value),
            Some(Wire::Dyn(target)) => lookup(&values, target)?,
            None => return Err(RunError::MissingValue { index: node_index }),
        };

        let mut params = Params::default();
        for (slot, (name, _)) in subroutine.params.iter().enumerate() {
            let value = match node.param_wires().get(slot) {
                Some(Wire::Static(value)) => *value,
                Some(Wire::Dyn(target)) => lookup(&values, *target)?
                    .as_int()
                    .ok_or(RunError::ParamShape { node: node_index })?,
                None => {
                    return Err(RunError::Check(CheckError::ArityMismatch {
                        node: node_index,
                        name: node.name.clone(),
                        expected: subroutine.arity(),
                        actual: node.wires.len(),
                    }));
                }
            };
            params.set(*name, value);
        }

        let output = (subroutine.evaluate)(&node_input, &params)?;
        values.push(output);
    }

    match values.pop() {
        Some(output) => Ok(output),
        None => Err(RunError::MissingValue { index: 0 }),
    }
}

fn lookup(values: &[Value], index: usize) -> Result<Value, RunError> {
    values
        .get(index)
        .cloned()
        .ok_or(RunError::MissingValue { index })
}
