//! Routine checker: four short-circuiting passes ending in bidirectional
//! type inference.
//!
//! 1. every node names a registered subroutine with the right wire count;
//! 2. the DAG is structurally sound and fully connected;
//! 3. every static wire value inhabits its slot's declared type;
//! 4. left-to-right inference builds the type vector `T` (overall input at
//!    index 0, node outputs at 1..=m), narrowing each wired producer by the
//!    consumer's requirement. Any contradiction, or an overall input still
//!    unconstrained at the end, fails the routine.

use lr_core::types::{Params, Ty, TypeError, resolve_output};
use lr_core::{Node, Routine, RoutineValidationError, Value, Wire};
use lr_prims::{Registry, Subroutine};

/// Inferred types for one routine: `T[0]` is the overall input type,
/// `T[i]` the output type of node `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeVector {
    tys: Vec<Ty>,
}

impl TypeVector {
    #[must_use]
    pub fn input(&self) -> &Ty {
        &self.tys[0]
    }

    #[must_use]
    pub fn output(&self) -> &Ty {
        &self.tys[self.tys.len() - 1]
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Ty> {
        self.tys.get(index)
    }

    /// Number of entries, i.e. routine length plus one.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    UnknownSubroutine {
        name: String,
    },
    ArityMismatch {
        node: usize,
        name: String,
        expected: usize,
        actual: usize,
    },
    Structure(RoutineValidationError),
    StaticIllTyped {
        node: usize,
        slot: usize,
        value: i64,
    },
    Declaration {
        node: usize,
        error: TypeError,
    },
    Contradiction {
        node: usize,
        target: usize,
    },
    UnconstrainedInput,
}

impl std::fmt::Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownSubroutine { name } => write!(f, "unknown subroutine `{}`", name),
            Self::ArityMismatch {
                node,
                name,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "node {} (`{}`) carries {} wires, expected {}",
                    node, name, actual, expected
                )
            }
            Self::Structure(err) => write!(f, "{}", err),
            Self::StaticIllTyped { node, slot, value } => {
                write!(
                    f,
                    "static value {} on node {} slot {} is outside the declared type",
                    value, node, slot
                )
            }
            Self::Declaration { node, error } => {
                write!(f, "node {} declaration does not resolve: {}", node, error)
            }
            Self::Contradiction { node, target } => {
                write!(
                    f,
                    "node {} narrows index {} to a contradiction",
                    node, target
                )
            }
            Self::UnconstrainedInput => {
                write!(f, "overall input type is unconstrained after inference")
            }
        }
    }
}

impl std::error::Error for CheckError {}

impl From<RoutineValidationError> for CheckError {
    fn from(value: RoutineValidationError) -> Self {
        Self::Structure(value)
    }
}

/// Static parameter bindings of one node: the first parameter wire binds the
/// first declared parameter, and so on. Dynamic parameter wires bind
/// nothing here.
#[must_use]
pub fn static_params(node: &Node, subroutine: &Subroutine) -> Params {
    let mut params = Params::default();
    for (slot, (name, _)) in subroutine.params.iter().enumerate() {
        if let Some(Wire::Static(value)) = node.param_wires().get(slot) {
            params.set(*name, *value);
        }
    }
    params
}

/// Run all four passes. On success the returned vector satisfies
/// `T[0] ≠ any` and carries no bottom entries.
pub fn check_routine(registry: &Registry, routine: &Routine) -> Result<TypeVector, CheckError> {
    // Pass 1: known names, declared arity.
    for (idx, node) in routine.nodes.iter().enumerate() {
        let subroutine = registry
            .get(&node.name)
            .ok_or_else(|| CheckError::UnknownSubroutine {
                name: node.name.clone(),
            })?;
        if node.wires.len() != subroutine.arity() {
            return Err(CheckError::ArityMismatch {
                node: idx + 1,
                name: node.name.clone(),
                expected: subroutine.arity(),
                actual: node.wires.len(),
            });
        }
    }

    // Pass 2: structure and connectedness.
    routine.validate_well_formed()?;

    // Pass 3: static wire values inhabit their slots.
    for (idx, node) in routine.nodes.iter().enumerate() {
        let subroutine = registry.get(&node.name).ok_or_else(|| {
            CheckError::UnknownSubroutine {
                name: node.name.clone(),
            }
        })?;
        let params = static_params(node, subroutine);
        for (slot, wire) in node.wires.iter().enumerate() {
            let Wire::Static(value) = wire else {
                continue;
            };
            let declared = slot_type(subroutine, slot, &params).map_err(|error| {
                CheckError::Declaration {
                    node: idx + 1,
                    error,
                }
            })?;
            if !declared.admits(&Value::Int(*value)) {
                return Err(CheckError::StaticIllTyped {
                    node: idx + 1,
                    slot,
                    value: *value,
                });
            }
        }
    }

    // Pass 4: inference.
    let mut tys = vec![Ty::any(); routine.len() + 1];
    for (idx, node) in routine.nodes.iter().enumerate() {
        let node_index = idx + 1;
        let subroutine = registry.get(&node.name).ok_or_else(|| {
            CheckError::UnknownSubroutine {
                name: node.name.clone(),
            }
        })?;
        let params = static_params(node, subroutine);
        let declared_input = subroutine.input.resolve(&params).map_err(|error| {
            CheckError::Declaration {
                node: node_index,
                error,
            }
        })?;
        tys[node_index] = resolve_output(&subroutine.output, &declared_input, &params)
            .map_err(|error| CheckError::Declaration {
                node: node_index,
                error,
            })?;

        for (slot, wire) in node.wires.iter().enumerate() {
            let Wire::Dyn(target) = wire else {
                continue;
            };
            let required = if slot == 0 {
                declared_input
            } else {
                slot_type(subroutine, slot, &params).map_err(|error| {
                    CheckError::Declaration {
                        node: node_index,
                        error,
                    }
                })?
            };
            tys[*target] =
                Ty::meet_into(&tys[*target], &required).ok_or(CheckError::Contradiction {
                    node: node_index,
                    target: *target,
                })?;
        }
    }

    if tys[0].is_any() {
        return Err(CheckError::UnconstrainedInput);
    }

    Ok(TypeVector { tys })
}

fn slot_type(subroutine: &Subroutine, slot: usize, params: &Params) -> Result<Ty, TypeError> {
    if slot == 0 {
        subroutine.input.resolve(params)
    } else {
        subroutine.params[slot - 1].1.resolve(params)
    }
}
