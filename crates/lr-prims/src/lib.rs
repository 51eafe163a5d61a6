#![forbid(unsafe_code)]

mod arithmetic;
mod lists;
mod reduction;

pub mod r#gen;
pub mod prng;

use lr_core::Value;
use lr_core::types::{ParamName, Params, TyExpr};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub use r#gen::GenConfig;
pub use prng::Prng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    WrongShape {
        name: &'static str,
        expected: &'static str,
    },
    MissingParam {
        name: &'static str,
        param: ParamName,
    },
    BadParam {
        name: &'static str,
        param: ParamName,
        value: i64,
    },
    EmptyInput {
        name: &'static str,
    },
    BadInput {
        name: &'static str,
        value: i64,
    },
    OutOfBounds {
        name: &'static str,
        index: i64,
        len: usize,
    },
    Overflow {
        name: &'static str,
    },
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongShape { name, expected } => {
                write!(f, "{} expects {} input", name, expected)
            }
            Self::MissingParam { name, param } => {
                write!(f, "{} is missing parameter `{}`", name, param.as_str())
            }
            Self::BadParam { name, param, value } => {
                write!(
                    f,
                    "{} rejects parameter `{}` = {}",
                    name,
                    param.as_str(),
                    value
                )
            }
            Self::EmptyInput { name } => write!(f, "{} requires a nonempty list", name),
            Self::BadInput { name, value } => write!(f, "{} rejects input {}", name, value),
            Self::OutOfBounds { name, index, len } => {
                write!(f, "{} index {} out of bounds for length {}", name, index, len)
            }
            Self::Overflow { name } => write!(f, "{} overflowed", name),
        }
    }
}

impl std::error::Error for EvalError {}

pub type EvalFn = fn(&Value, &Params) -> Result<Value, EvalError>;
pub type GenFn = fn(&GenConfig, &Params, &mut Prng) -> Vec<Value>;

/// A pre-declared example input, const-friendly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Example {
    Int(i64),
    List(&'static [i64]),
}

impl Example {
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Int(value) => Value::Int(value),
            Self::List(items) => Value::List(items.to_vec()),
        }
    }
}

/// A primitive subroutine descriptor: typed input and output, parameter
/// schema, evaluator, input generator, and pre-declared examples.
#[derive(Debug, Clone, Copy)]
pub struct Subroutine {
    pub name: &'static str,
    pub description: &'static str,
    pub input: TyExpr,
    pub output: TyExpr,
    pub params: &'static [(ParamName, TyExpr)],
    pub example_params: Params,
    pub examples: &'static [Example],
    pub evaluate: EvalFn,
    pub generate: GenFn,
}

impl Subroutine {
    /// Wire count a node invoking this subroutine must carry.
    #[must_use]
    pub fn arity(&self) -> usize {
        1 + self.params.len()
    }
}

/// Process-wide catalog of primitives, populated once and immutable
/// thereafter. Iteration order is lexicographic by name.
pub struct Registry {
    entries: BTreeMap<&'static str, Subroutine>,
}

impl Registry {
    fn build() -> Self {
        let mut entries = BTreeMap::new();
        for table in [
            arithmetic::SUBROUTINES,
            lists::SUBROUTINES,
            reduction::SUBROUTINES,
        ] {
            for subroutine in table {
                let clash = entries.insert(subroutine.name, *subroutine);
                assert!(
                    clash.is_none(),
                    "duplicate subroutine registration: {}",
                    subroutine.name
                );
            }
        }
        Self { entries }
    }

    pub fn global() -> &'static Self {
        static REGISTRY: OnceLock<Registry> = OnceLock::new();
        REGISTRY.get_or_init(Self::build)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Subroutine> {
        self.entries.get(name)
    }

    pub fn subroutines(&self) -> impl Iterator<Item = &Subroutine> {
        self.entries.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ── Evaluator helpers ──────────────────────────────────────────────

pub(crate) fn expect_int(name: &'static str, value: &Value) -> Result<i64, EvalError> {
    value.as_int().ok_or(EvalError::WrongShape {
        name,
        expected: "int",
    })
}

pub(crate) fn expect_list<'v>(
    name: &'static str,
    value: &'v Value,
) -> Result<&'v [i64], EvalError> {
    value.as_list().ok_or(EvalError::WrongShape {
        name,
        expected: "int-list",
    })
}

pub(crate) fn param(
    name: &'static str,
    params: &Params,
    which: ParamName,
) -> Result<i64, EvalError> {
    params
        .get(which)
        .ok_or(EvalError::MissingParam { name, param: which })
}

pub(crate) fn checked(name: &'static str, value: Option<i64>) -> Result<i64, EvalError> {
    value.ok_or(EvalError::Overflow { name })
}
