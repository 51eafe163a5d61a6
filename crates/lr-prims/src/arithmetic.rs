//! Arithmetic subroutines: scalar integer operations and their elementwise
//! list forms. All arithmetic is checked; overflow surfaces as an
//! evaluation error rather than wrapping.

use crate::r#gen::{self, GenConfig};
use crate::prng::Prng;
use crate::{EvalError, Example, Subroutine, checked, expect_int, expect_list, param};
use lr_core::Value;
use lr_core::types::{Arg, Base, ParamName, Params, TyExpr, TyTag};

const INT: TyExpr = TyExpr::INT;
const INT_LIST: TyExpr = TyExpr::INT_LIST;
const POSITIVE_INT: TyExpr = TyExpr::new(Base::Int, &[TyTag::Positive]);
const EVEN_INT: TyExpr = TyExpr::new(Base::Int, &[TyTag::Even]);
const NON_NEGATIVE_INT: TyExpr = TyExpr::new(Base::Int, &[TyTag::NonNegative]);
const SAME_LENGTH: TyExpr = TyExpr::new(Base::IntList, &[TyTag::SameLength]);
const K_INT: &[(ParamName, TyExpr)] = &[(ParamName::K, INT)];
const K_POSITIVE: &[(ParamName, TyExpr)] = &[(ParamName::K, POSITIVE_INT)];

pub(crate) const SUBROUTINES: &[Subroutine] = &[
    Subroutine {
        name: "plus-k",
        description: "add the constant k to the input",
        input: INT,
        output: INT,
        params: K_INT,
        example_params: Params { k: Some(2), n: None },
        examples: &[Example::Int(3), Example::Int(-4), Example::Int(0)],
        evaluate: eval_plus_k,
        generate: gen_int,
    },
    Subroutine {
        name: "minus-k",
        description: "subtract the constant k from the input",
        input: INT,
        output: INT,
        params: K_INT,
        example_params: Params { k: Some(3), n: None },
        examples: &[Example::Int(10), Example::Int(0)],
        evaluate: eval_minus_k,
        generate: gen_int,
    },
    Subroutine {
        name: "times-k",
        description: "multiply the input by the positive constant k",
        input: INT,
        output: TyExpr::new(Base::Int, &[TyTag::Multiple(Arg::Param(ParamName::K))]),
        params: K_POSITIVE,
        example_params: Params { k: Some(3), n: None },
        examples: &[Example::Int(2), Example::Int(-5)],
        evaluate: eval_times_k,
        generate: gen_int,
    },
    Subroutine {
        name: "double",
        description: "double the input",
        input: INT,
        output: EVEN_INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::Int(7), Example::Int(-3), Example::Int(0)],
        evaluate: eval_double,
        generate: gen_int,
    },
    Subroutine {
        name: "halve",
        description: "halve the (even) input",
        input: EVEN_INT,
        output: INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::Int(8), Example::Int(-4), Example::Int(0)],
        evaluate: eval_halve,
        generate: gen_even_int,
    },
    Subroutine {
        name: "square",
        description: "square the input",
        input: INT,
        output: NON_NEGATIVE_INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::Int(4), Example::Int(-6)],
        evaluate: eval_square,
        generate: gen_int,
    },
    Subroutine {
        name: "abs",
        description: "absolute value of the input",
        input: INT,
        output: NON_NEGATIVE_INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::Int(-9), Example::Int(9), Example::Int(0)],
        evaluate: eval_abs,
        generate: gen_int,
    },
    Subroutine {
        name: "successor",
        description: "the input plus one",
        input: INT,
        output: INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::Int(0), Example::Int(41)],
        evaluate: eval_successor,
        generate: gen_int,
    },
    Subroutine {
        name: "gcd-k",
        description: "greatest common divisor of the input and the positive constant k",
        input: INT,
        output: TyExpr::new(
            Base::Int,
            &[TyTag::Positive, TyTag::Divisor(Arg::Param(ParamName::K))],
        ),
        params: K_POSITIVE,
        example_params: Params { k: Some(12), n: None },
        examples: &[Example::Int(18), Example::Int(-8), Example::Int(0)],
        evaluate: eval_gcd_k,
        generate: gen_int,
    },
    Subroutine {
        name: "fibonacci",
        description: "the n-th Fibonacci number, for positive n",
        input: POSITIVE_INT,
        output: POSITIVE_INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::Int(1), Example::Int(6), Example::Int(10)],
        evaluate: eval_fibonacci,
        generate: gen_small_positive_int,
    },
    Subroutine {
        name: "add-k",
        description: "add the constant k to every element",
        input: INT_LIST,
        output: SAME_LENGTH,
        params: K_INT,
        example_params: Params { k: Some(3), n: None },
        examples: &[
            Example::List(&[1, 2, 3]),
            Example::List(&[]),
            Example::List(&[-2, 0, 2]),
        ],
        evaluate: eval_add_k,
        generate: gen_list,
    },
    Subroutine {
        name: "multiply-k",
        description: "multiply every element by the positive constant k",
        input: INT_LIST,
        output: TyExpr::new(
            Base::IntList,
            &[TyTag::SameLength, TyTag::Multiple(Arg::Param(ParamName::K))],
        ),
        params: K_POSITIVE,
        example_params: Params { k: Some(3), n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[])],
        evaluate: eval_multiply_k,
        generate: gen_list,
    },
    Subroutine {
        name: "cumulative-sum",
        description: "running sums of the input list",
        input: INT_LIST,
        output: SAME_LENGTH,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[])],
        evaluate: eval_cumulative_sum,
        generate: gen_list,
    },
];

// ── Evaluators ─────────────────────────────────────────────────────

fn eval_plus_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("plus-k", input)?;
    let k = param("plus-k", params, ParamName::K)?;
    Ok(Value::Int(checked("plus-k", x.checked_add(k))?))
}

fn eval_minus_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("minus-k", input)?;
    let k = param("minus-k", params, ParamName::K)?;
    Ok(Value::Int(checked("minus-k", x.checked_sub(k))?))
}

fn eval_times_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("times-k", input)?;
    let k = param("times-k", params, ParamName::K)?;
    Ok(Value::Int(checked("times-k", x.checked_mul(k))?))
}

fn eval_double(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("double", input)?;
    Ok(Value::Int(checked("double", x.checked_mul(2))?))
}

fn eval_halve(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("halve", input)?;
    if x % 2 != 0 {
        return Err(EvalError::BadInput {
            name: "halve",
            value: x,
        });
    }
    Ok(Value::Int(x / 2))
}

fn eval_square(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("square", input)?;
    Ok(Value::Int(checked("square", x.checked_mul(x))?))
}

fn eval_abs(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("abs", input)?;
    Ok(Value::Int(checked("abs", x.checked_abs())?))
}

fn eval_successor(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("successor", input)?;
    Ok(Value::Int(checked("successor", x.checked_add(1))?))
}

fn eval_gcd_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("gcd-k", input)?;
    let k = param("gcd-k", params, ParamName::K)?;
    if k <= 0 {
        return Err(EvalError::BadParam {
            name: "gcd-k",
            param: ParamName::K,
            value: k,
        });
    }
    let x = checked("gcd-k", x.checked_abs())?;
    let (mut a, mut b) = (x, k);
    while b != 0 {
        (a, b) = (b, a % b);
    }
    Ok(Value::Int(a))
}

fn eval_fibonacci(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let n = expect_int("fibonacci", input)?;
    if n <= 0 {
        return Err(EvalError::BadInput {
            name: "fibonacci",
            value: n,
        });
    }
    let (mut a, mut b) = (1_i64, 1_i64);
    for _ in 2..n {
        (a, b) = (b, checked("fibonacci", a.checked_add(b))?);
    }
    Ok(Value::Int(if n == 1 { 1 } else { b }))
}

fn eval_add_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("add-k", input)?;
    let k = param("add-k", params, ParamName::K)?;
    let shifted = items
        .iter()
        .map(|x| checked("add-k", x.checked_add(k)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::List(shifted))
}

fn eval_multiply_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("multiply-k", input)?;
    let k = param("multiply-k", params, ParamName::K)?;
    let scaled = items
        .iter()
        .map(|x| checked("multiply-k", x.checked_mul(k)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Value::List(scaled))
}

fn eval_cumulative_sum(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("cumulative-sum", input)?;
    let mut running = 0_i64;
    let mut sums = Vec::with_capacity(items.len());
    for x in items {
        running = checked("cumulative-sum", running.checked_add(*x))?;
        sums.push(running);
    }
    Ok(Value::List(sums))
}

// ── Generators ─────────────────────────────────────────────────────

fn gen_int(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    r#gen::ints(cfg, prng, |p| {
        let limit = cfg.element_limit;
        p.range_i64(-limit, limit)
    })
}

fn gen_even_int(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    r#gen::ints(cfg, prng, |p| {
        let half = (cfg.element_limit / 2).max(1);
        2 * p.range_i64(-half, half)
    })
}

fn gen_small_positive_int(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    // Fibonacci grows fast; keep proposals well inside i64.
    r#gen::ints(cfg, prng, |p| p.range_i64(1, cfg.element_limit.clamp(1, 20)))
}

fn gen_list(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    r#gen::lists(
        cfg,
        prng,
        |p| r#gen::default_len(cfg, p),
        |p| r#gen::default_element(cfg, p),
    )
}
