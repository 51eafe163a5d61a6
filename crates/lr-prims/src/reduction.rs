//! Reduction subroutines: list → scalar folds.

use crate::r#gen::{self, GenConfig};
use crate::prng::Prng;
use crate::{EvalError, Example, Subroutine, checked, expect_list, param};
use lr_core::Value;
use lr_core::types::{Arg, Base, ParamName, Params, TyExpr, TyTag};

const INT: TyExpr = TyExpr::INT;
const INT_LIST: TyExpr = TyExpr::INT_LIST;
const NONEMPTY_LIST: TyExpr =
    TyExpr::new(Base::IntList, &[TyTag::LengthAtLeast(Arg::Lit(1))]);
const NON_NEGATIVE_INT: TyExpr = TyExpr::new(Base::Int, &[TyTag::NonNegative]);
const ELEMENT: TyExpr = TyExpr::new(Base::Int, &[TyTag::Element]);

pub(crate) const SUBROUTINES: &[Subroutine] = &[
    Subroutine {
        name: "len",
        description: "number of elements",
        input: INT_LIST,
        output: NON_NEGATIVE_INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[])],
        evaluate: eval_len,
        generate: gen_list,
    },
    Subroutine {
        name: "sum",
        description: "sum of the elements, zero for the empty list",
        input: INT_LIST,
        output: INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[])],
        evaluate: eval_sum,
        generate: gen_list,
    },
    Subroutine {
        name: "product",
        description: "product of the elements, one for the empty list",
        input: INT_LIST,
        output: INT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[2, 3, 4]), Example::List(&[])],
        evaluate: eval_product,
        generate: gen_list,
    },
    Subroutine {
        name: "maximum",
        description: "largest element of a nonempty list",
        input: NONEMPTY_LIST,
        output: ELEMENT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[3, 7, 2]), Example::List(&[5])],
        evaluate: eval_maximum,
        generate: gen_nonempty_list,
    },
    Subroutine {
        name: "minimum",
        description: "smallest element of a nonempty list",
        input: NONEMPTY_LIST,
        output: ELEMENT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[3, 7, 2]), Example::List(&[5])],
        evaluate: eval_minimum,
        generate: gen_nonempty_list,
    },
    Subroutine {
        name: "count-k",
        description: "number of elements equal to the constant k",
        input: INT_LIST,
        output: NON_NEGATIVE_INT,
        params: &[(ParamName::K, INT)],
        example_params: Params { k: Some(2), n: None },
        examples: &[Example::List(&[2, 1, 2, 2]), Example::List(&[])],
        evaluate: eval_count_k,
        generate: gen_list,
    },
];

// ── Evaluators ─────────────────────────────────────────────────────

fn eval_len(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("len", input)?;
    Ok(Value::Int(items.len() as i64))
}

fn eval_sum(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("sum", input)?;
    let mut total = 0_i64;
    for x in items {
        total = checked("sum", total.checked_add(*x))?;
    }
    Ok(Value::Int(total))
}

fn eval_product(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("product", input)?;
    let mut total = 1_i64;
    for x in items {
        total = checked("product", total.checked_mul(*x))?;
    }
    Ok(Value::Int(total))
}

fn eval_maximum(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("maximum", input)?;
    items
        .iter()
        .max()
        .map(|x| Value::Int(*x))
        .ok_or(EvalError::EmptyInput { name: "maximum" })
}

fn eval_minimum(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("minimum", input)?;
    items
        .iter()
        .min()
        .map(|x| Value::Int(*x))
        .ok_or(EvalError::EmptyInput { name: "minimum" })
}

fn eval_count_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("count-k", input)?;
    let k = param("count-k", params, ParamName::K)?;
    Ok(Value::Int(items.iter().filter(|x| **x == k).count() as i64))
}

// ── Generators ─────────────────────────────────────────────────────

fn gen_list(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    r#gen::lists(
        cfg,
        prng,
        |p| r#gen::default_len(cfg, p),
        |p| r#gen::default_element(cfg, p),
    )
}

fn gen_nonempty_list(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    r#gen::lists(
        cfg,
        prng,
        |p| 1 + r#gen::default_len(cfg, p),
        |p| r#gen::default_element(cfg, p),
    )
}
