//! Structural list subroutines: selection, slicing, reordering, filtering,
//! and list construction.

use crate::r#gen::{self, GenConfig};
use crate::prng::Prng;
use crate::{EvalError, Example, Subroutine, expect_int, expect_list, param};
use lr_core::Value;
use lr_core::types::{Arg, Base, ParamName, Params, TyExpr, TyTag};

/// Hard ceiling on constructed list lengths, so `range`/`repeat-k` cannot
/// be driven into unbounded allocations by a hostile request.
const MAX_BUILT_LEN: i64 = 10_000;

const INT: TyExpr = TyExpr::INT;
const INT_LIST: TyExpr = TyExpr::INT_LIST;
const NONEMPTY_LIST: TyExpr =
    TyExpr::new(Base::IntList, &[TyTag::LengthAtLeast(Arg::Lit(1))]);
const LIST_AT_LEAST_K: TyExpr =
    TyExpr::new(Base::IntList, &[TyTag::LengthAtLeast(Arg::Param(ParamName::K))]);
const ELEMENT: TyExpr = TyExpr::new(Base::Int, &[TyTag::Element]);
const SAME_LENGTH: TyExpr = TyExpr::new(Base::IntList, &[TyTag::SameLength]);
const NO_SMALLER: TyExpr = TyExpr::new(Base::IntList, &[TyTag::NoSmaller]);
const K_INT: &[(ParamName, TyExpr)] = &[(ParamName::K, INT)];
const K_POSITIVE: &[(ParamName, TyExpr)] =
    &[(ParamName::K, TyExpr::new(Base::Int, &[TyTag::Positive]))];
const K_NON_NEGATIVE: &[(ParamName, TyExpr)] =
    &[(ParamName::K, TyExpr::new(Base::Int, &[TyTag::NonNegative]))];

pub(crate) const SUBROUTINES: &[Subroutine] = &[
    Subroutine {
        name: "head",
        description: "first element of a nonempty list",
        input: NONEMPTY_LIST,
        output: ELEMENT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[7])],
        evaluate: eval_head,
        generate: gen_nonempty_list,
    },
    Subroutine {
        name: "last",
        description: "last element of a nonempty list",
        input: NONEMPTY_LIST,
        output: ELEMENT,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[7])],
        evaluate: eval_last,
        generate: gen_nonempty_list,
    },
    Subroutine {
        name: "tail",
        description: "everything after the first element",
        input: NONEMPTY_LIST,
        output: INT_LIST,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[7])],
        evaluate: eval_tail,
        generate: gen_nonempty_list,
    },
    Subroutine {
        name: "index-k",
        description: "the k-th element (1-based) of a list of length at least k",
        input: LIST_AT_LEAST_K,
        output: ELEMENT,
        params: K_POSITIVE,
        example_params: Params { k: Some(2), n: None },
        examples: &[Example::List(&[5, 6, 7]), Example::List(&[1, 2])],
        evaluate: eval_index_k,
        generate: gen_list_at_least_k,
    },
    Subroutine {
        name: "take-k",
        description: "the first k elements of a list of length at least k",
        input: LIST_AT_LEAST_K,
        output: TyExpr::new(Base::IntList, &[TyTag::LengthExact(Arg::Param(ParamName::K))]),
        params: K_NON_NEGATIVE,
        example_params: Params { k: Some(2), n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[4, 5])],
        evaluate: eval_take_k,
        generate: gen_list_at_least_k,
    },
    Subroutine {
        name: "drop-k",
        description: "everything after the first k elements",
        input: LIST_AT_LEAST_K,
        output: INT_LIST,
        params: K_NON_NEGATIVE,
        example_params: Params { k: Some(2), n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[8, 9])],
        evaluate: eval_drop_k,
        generate: gen_list_at_least_k,
    },
    Subroutine {
        name: "append-k",
        description: "the list with the constant k appended",
        input: INT_LIST,
        output: NO_SMALLER,
        params: K_INT,
        example_params: Params { k: Some(5), n: None },
        examples: &[Example::List(&[1, 2]), Example::List(&[])],
        evaluate: eval_append_k,
        generate: gen_list,
    },
    Subroutine {
        name: "prepend-k",
        description: "the list with the constant k prepended",
        input: INT_LIST,
        output: NO_SMALLER,
        params: K_INT,
        example_params: Params { k: Some(5), n: None },
        examples: &[Example::List(&[1, 2]), Example::List(&[])],
        evaluate: eval_prepend_k,
        generate: gen_list,
    },
    Subroutine {
        name: "reverse",
        description: "the list reversed",
        input: INT_LIST,
        output: SAME_LENGTH,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3]), Example::List(&[])],
        evaluate: eval_reverse,
        generate: gen_list,
    },
    Subroutine {
        name: "sort",
        description: "the list sorted nondecreasing",
        input: INT_LIST,
        output: TyExpr::new(Base::IntList, &[TyTag::SameLength, TyTag::Sorted]),
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[3, 1, 2]), Example::List(&[])],
        evaluate: eval_sort,
        generate: gen_list,
    },
    Subroutine {
        name: "unique",
        description: "the list with duplicates removed, first occurrences kept",
        input: INT_LIST,
        output: INT_LIST,
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 1, 2, 3, 2]), Example::List(&[])],
        evaluate: eval_unique,
        generate: gen_list,
    },
    Subroutine {
        name: "filter-even",
        description: "only the even elements",
        input: INT_LIST,
        output: TyExpr::new(Base::IntList, &[TyTag::Even]),
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[1, 2, 3, 4]), Example::List(&[])],
        evaluate: eval_filter_even,
        generate: gen_list,
    },
    Subroutine {
        name: "filter-positive",
        description: "only the strictly positive elements",
        input: INT_LIST,
        output: TyExpr::new(Base::IntList, &[TyTag::Positive]),
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::List(&[-1, 2, -3, 4]), Example::List(&[])],
        evaluate: eval_filter_positive,
        generate: gen_list,
    },
    Subroutine {
        name: "range",
        description: "the list 1..=n for positive input n",
        input: TyExpr::new(Base::Int, &[TyTag::Positive]),
        output: TyExpr::new(Base::IntList, &[TyTag::Positive, TyTag::Sorted]),
        params: &[],
        example_params: Params { k: None, n: None },
        examples: &[Example::Int(5), Example::Int(1)],
        evaluate: eval_range,
        generate: gen_small_positive_int,
    },
    Subroutine {
        name: "repeat-k",
        description: "the input repeated k times",
        input: INT,
        output: TyExpr::new(Base::IntList, &[TyTag::LengthExact(Arg::Param(ParamName::K))]),
        params: K_NON_NEGATIVE,
        example_params: Params { k: Some(3), n: None },
        examples: &[Example::Int(7), Example::Int(0)],
        evaluate: eval_repeat_k,
        generate: gen_int,
    },
];

// ── Evaluators ─────────────────────────────────────────────────────

fn eval_head(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("head", input)?;
    items
        .first()
        .map(|x| Value::Int(*x))
        .ok_or(EvalError::EmptyInput { name: "head" })
}

fn eval_last(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("last", input)?;
    items
        .last()
        .map(|x| Value::Int(*x))
        .ok_or(EvalError::EmptyInput { name: "last" })
}

fn eval_tail(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("tail", input)?;
    if items.is_empty() {
        return Err(EvalError::EmptyInput { name: "tail" });
    }
    Ok(Value::List(items[1..].to_vec()))
}

fn eval_index_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("index-k", input)?;
    let k = param("index-k", params, ParamName::K)?;
    let position = usize::try_from(k)
        .ok()
        .filter(|k| *k >= 1)
        .ok_or(EvalError::BadParam {
            name: "index-k",
            param: ParamName::K,
            value: k,
        })?;
    items
        .get(position - 1)
        .map(|x| Value::Int(*x))
        .ok_or(EvalError::OutOfBounds {
            name: "index-k",
            index: k,
            len: items.len(),
        })
}

fn eval_take_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("take-k", input)?;
    let k = non_negative_k("take-k", params)?;
    if k > items.len() {
        return Err(EvalError::OutOfBounds {
            name: "take-k",
            index: k as i64,
            len: items.len(),
        });
    }
    Ok(Value::List(items[..k].to_vec()))
}

fn eval_drop_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("drop-k", input)?;
    let k = non_negative_k("drop-k", params)?;
    if k > items.len() {
        return Err(EvalError::OutOfBounds {
            name: "drop-k",
            index: k as i64,
            len: items.len(),
        });
    }
    Ok(Value::List(items[k..].to_vec()))
}

fn eval_append_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("append-k", input)?;
    let k = param("append-k", params, ParamName::K)?;
    let mut extended = items.to_vec();
    extended.push(k);
    Ok(Value::List(extended))
}

fn eval_prepend_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("prepend-k", input)?;
    let k = param("prepend-k", params, ParamName::K)?;
    let mut extended = Vec::with_capacity(items.len() + 1);
    extended.push(k);
    extended.extend_from_slice(items);
    Ok(Value::List(extended))
}

fn eval_reverse(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("reverse", input)?;
    Ok(Value::List(items.iter().rev().copied().collect()))
}

fn eval_sort(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let mut items = expect_list("sort", input)?.to_vec();
    items.sort_unstable();
    Ok(Value::List(items))
}

fn eval_unique(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("unique", input)?;
    let mut kept: Vec<i64> = Vec::new();
    for x in items {
        if !kept.contains(x) {
            kept.push(*x);
        }
    }
    Ok(Value::List(kept))
}

fn eval_filter_even(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("filter-even", input)?;
    Ok(Value::List(
        items.iter().filter(|x| **x % 2 == 0).copied().collect(),
    ))
}

fn eval_filter_positive(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let items = expect_list("filter-positive", input)?;
    Ok(Value::List(
        items.iter().filter(|x| **x > 0).copied().collect(),
    ))
}

fn eval_range(input: &Value, _params: &Params) -> Result<Value, EvalError> {
    let n = expect_int("range", input)?;
    if n <= 0 || n > MAX_BUILT_LEN {
        return Err(EvalError::BadInput {
            name: "range",
            value: n,
        });
    }
    Ok(Value::List((1..=n).collect()))
}

fn eval_repeat_k(input: &Value, params: &Params) -> Result<Value, EvalError> {
    let x = expect_int("repeat-k", input)?;
    let k = param("repeat-k", params, ParamName::K)?;
    if !(0..=MAX_BUILT_LEN).contains(&k) {
        return Err(EvalError::BadParam {
            name: "repeat-k",
            param: ParamName::K,
            value: k,
        });
    }
    Ok(Value::List(vec![x; k as usize]))
}

fn non_negative_k(name: &'static str, params: &Params) -> Result<usize, EvalError> {
    let k = param(name, params, ParamName::K)?;
    usize::try_from(k).map_err(|_| EvalError::BadParam {
        name,
        param: ParamName::K,
        value: k,
    })
}

// ── Generators ─────────────────────────────────────────────────────

fn gen_int(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    r#gen::ints(cfg, prng, |p| r#gen::default_element(cfg, p))
}

fn gen_small_positive_int(cfg: &GenConfig, _params: &Params, prng: &mut Prng) -> Vec<Value> {
    r#gen::ints(cfg, prng, |p| p.range_i64(1, cfg.element_limit.max(1)))
}

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

fn gen_list_at_least_k(cfg: &GenConfig, params: &Params, prng: &mut Prng) -> Vec<Value> {
    let floor = params.k.filter(|k| *k > 0).unwrap_or(1) as usize;
    r#gen::lists(
        cfg,
        prng,
        move |p| floor + p.below(4) as usize,
        |p| r#gen::default_element(cfg, p),
    )
}
