#![forbid(unsafe_code)]

//! Framed JSON dispatcher: one request object per stdin line, one response
//! value per stdout line. No request is fatal: malformed input and unknown
//! ops answer `null`, diagnostics go to the tracing subscriber (stderr in
//! the binary), and the loop runs until end-of-input.

use lr_core::{Routine, Value};
use lr_interp::{TypeVector, check_routine, eval_unchecked};
use lr_prims::{GenConfig, Prng, Registry};
use lr_synth::{GenerateError, enumerate_routines, generate_examples_checked};
use serde::Deserialize;
use serde_json::{Value as Json, json};
use std::io::{BufRead, Write};

pub const DEFAULT_GENERATE_COUNT: usize = 1;
pub const DEFAULT_FIND_COUNT: usize = 10;

#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    pub op: String,
    #[serde(default)]
    pub routine: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
    #[serde(default)]
    pub params: RequestParams,
}

/// Recognized request parameters; unknown keys are ignored.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RequestParams {
    #[serde(default)]
    pub count: Option<usize>,
}

/// Handle one raw request line.
pub fn handle_line(registry: &Registry, line: &str, prng: &mut Prng) -> Json {
    match serde_json::from_str::<Request>(line) {
        Ok(request) => handle_request(registry, &request, prng),
        Err(err) => {
            tracing::warn!(%err, "malformed request line");
            Json::Null
        }
    }
}

pub fn handle_request(registry: &Registry, request: &Request, prng: &mut Prng) -> Json {
    match request.op.as_str() {
        "validate" => op_validate(registry, request),
        "evaluate" => op_evaluate(registry, request),
        "examples" => op_examples(registry, request),
        "generate" => op_generate(registry, request, prng),
        "find" => op_find(registry, request, prng),
        op => {
            tracing::warn!(op, "unknown op");
            Json::Null
        }
    }
}

/// Read framed requests until end-of-input, answering one line per request.
pub fn serve<R: BufRead, W: Write>(
    registry: &Registry,
    reader: R,
    mut writer: W,
    prng: &mut Prng,
) -> std::io::Result<()> {
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = handle_line(registry, &line, prng);
        writeln!(writer, "{}", response)?;
        writer.flush()?;
    }
    Ok(())
}

fn op_validate(registry: &Registry, request: &Request) -> Json {
    match checked_routine(registry, request) {
        Some((_, tv)) => Json::Bool(tv.input().admits(&request_input(request))),
        None => Json::Bool(false),
    }
}

fn op_evaluate(registry: &Registry, request: &Request) -> Json {
    let Some((routine, tv)) = checked_routine(registry, request) else {
        return Json::Null;
    };
    let input = request_input(request);
    if !tv.input().admits(&input) {
        return Json::Null;
    }
    match eval_unchecked(registry, &routine, &input) {
        Ok(output) => json!(output),
        Err(err) => {
            tracing::warn!(%err, "evaluation failed on an admitted input");
            Json::Null
        }
    }
}

fn op_examples(registry: &Registry, request: &Request) -> Json {
    let Some((routine, tv)) = checked_routine(registry, request) else {
        return Json::Null;
    };
    let Some(first) = routine.first_node() else {
        return Json::Null;
    };
    let Some(subroutine) = registry.get(&first.name) else {
        return Json::Null;
    };
    let examples: Vec<Value> = subroutine
        .examples
        .iter()
        .map(|example| example.to_value())
        .filter(|example| tv.input().admits(example))
        .collect();
    json!(examples)
}

fn op_generate(registry: &Registry, request: &Request, prng: &mut Prng) -> Json {
    let Some((routine, tv)) = checked_routine(registry, request) else {
        return Json::Null;
    };
    let count = request.params.count.unwrap_or(DEFAULT_GENERATE_COUNT);
    let cfg = GenConfig::with_count(count);
    match generate_examples_checked(registry, &routine, &tv, &cfg, prng) {
        Ok(pairs) => {
            let pairs: Vec<Json> = pairs
                .into_iter()
                .map(|(input, output)| json!([input, output]))
                .collect();
            json!(pairs)
        }
        // Exhaustion already warned on the side channel; the response stays
        // well-formed and empty.
        Err(GenerateError::Exhausted { .. }) => json!([]),
        Err(err) => {
            tracing::warn!(%err, "generate failed");
            Json::Null
        }
    }
}

fn op_find(registry: &Registry, request: &Request, prng: &mut Prng) -> Json {
    let bound = request.params.count.unwrap_or(DEFAULT_FIND_COUNT);
    let routines = enumerate_routines(registry, bound, prng);
    let notations: Vec<String> = routines.iter().map(|routine| routine.to_string()).collect();
    json!(notations)
}

fn checked_routine(registry: &Registry, request: &Request) -> Option<(Routine, TypeVector)> {
    let text = request.routine.as_deref()?;
    let routine = match text.parse::<Routine>() {
        Ok(routine) => routine,
        Err(err) => {
            tracing::debug!(%err, "routine notation failed to parse");
            return None;
        }
    };
    match check_routine(registry, &routine) {
        Ok(tv) => Some((routine, tv)),
        Err(err) => {
            tracing::debug!(%err, routine = text, "routine failed its check");
            None
        }
    }
}

fn request_input(request: &Request) -> Value {
    request.input.clone().unwrap_or(Value::List(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::handle_line;
    use lr_prims::{Prng, Registry};
    use serde_json::{Value as Json, json};

    fn dispatch(line: &str) -> Json {
        let mut prng = Prng::from_seed(1);
        handle_line(Registry::global(), line, &mut prng)
    }

    #[test]
    fn validate_answers_true_and_false() {
        let ok = dispatch(
            r#"{"op":"validate","routine":"(multiply-k (dyn 0) (static 3))","input":[1,2,3]}"#,
        );
        assert_eq!(ok, Json::Bool(true));

        let short = dispatch(
            r#"{"op":"validate","routine":"(index-k (dyn 0) (static 3)) (add-k (dyn 0) (dyn 1))","input":[0,5]}"#,
        );
        assert_eq!(short, Json::Bool(false));
    }

    #[test]
    fn evaluate_returns_output_or_null() {
        let out = dispatch(
            r#"{"op":"evaluate","routine":"(multiply-k (dyn 0) (static 3))","input":[1,2,3]}"#,
        );
        assert_eq!(out, json!([3, 6, 9]));

        let rejected = dispatch(
            r#"{"op":"evaluate","routine":"(index-k (dyn 0) (static 3)) (add-k (dyn 0) (dyn 1))","input":[0,5]}"#,
        );
        assert_eq!(rejected, Json::Null);
    }

    #[test]
    fn default_input_is_the_empty_list() {
        let out = dispatch(r#"{"op":"evaluate","routine":"(sum (dyn 0))"}"#);
        assert_eq!(out, json!(0));
    }

    #[test]
    fn scalar_inputs_pass_through() {
        let out = dispatch(r#"{"op":"evaluate","routine":"(fibonacci (dyn 0))","input":7}"#);
        assert_eq!(out, json!(13));
    }

    #[test]
    fn examples_are_filtered_by_inferred_input_type() {
        let examples = dispatch(
            r#"{"op":"examples","routine":"(index-k (dyn 0) (static 3)) (add-k (dyn 0) (dyn 1))"}"#,
        );
        // index-k's declared examples have lengths 3 and 2; only the first
        // survives the inferred length-at-least-3 input type.
        assert_eq!(examples, json!([[5, 6, 7]]));
    }

    #[test]
    fn generate_pairs_round_trip() {
        let pairs = dispatch(
            r#"{"op":"generate","routine":"(multiply-k (dyn 0) (static 3))","params":{"count":3}}"#,
        );
        let pairs = pairs.as_array().expect("array of pairs");
        assert_eq!(pairs.len(), 3);
        for pair in pairs {
            let pair = pair.as_array().expect("pair");
            assert_eq!(pair.len(), 2);
        }
    }

    #[test]
    fn find_returns_distinct_checked_notations() {
        let found = dispatch(r#"{"op":"find","params":{"count":5}}"#);
        let found = found.as_array().expect("array of notations");
        assert_eq!(found.len(), 5);
        for notation in found {
            let text = notation.as_str().expect("notation string");
            let routine: lr_core::Routine = text.parse().expect("notation parses");
            lr_interp::check_routine(Registry::global(), &routine).expect("routine checks");
        }
    }

    #[test]
    fn malformed_requests_answer_null() {
        assert_eq!(dispatch("not json"), Json::Null);
        assert_eq!(dispatch(r#"{"op":"transmogrify"}"#), Json::Null);
        assert_eq!(dispatch(r#"{"op":"evaluate"}"#), Json::Null);
    }

    #[test]
    fn unparseable_routine_fails_validation_quietly() {
        let out = dispatch(r#"{"op":"validate","routine":"(((","input":[1]}"#);
        assert_eq!(out, Json::Bool(false));
    }
}
