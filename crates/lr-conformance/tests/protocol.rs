//! Framed-protocol conformance: drive the serve loop over in-memory
//! buffers and check one response line per request line.

use lr_conformance::{MULTIPLY_BY_THREE, SHIFT_BY_THIRD_ELEMENT};
use lr_dispatch::serve;
use lr_prims::{Prng, Registry};
use serde_json::{Value as Json, json};

fn run_session(script: &str) -> Vec<Json> {
    let mut output = Vec::new();
    let mut prng = Prng::from_seed(7);
    serve(Registry::global(), script.as_bytes(), &mut output, &mut prng)
        .expect("in-memory session never hits io errors");
    String::from_utf8(output)
        .expect("responses are utf-8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("each response line is JSON"))
        .collect()
}

#[test]
fn one_response_line_per_request_line() {
    let script = format!(
        concat!(
            "{{\"op\":\"validate\",\"routine\":\"{multiply}\",\"input\":[1,2,3]}}\n",
            "{{\"op\":\"evaluate\",\"routine\":\"{multiply}\",\"input\":[1,2,3]}}\n",
            "{{\"op\":\"evaluate\",\"routine\":\"{chain}\",\"input\":[0,5]}}\n",
        ),
        multiply = MULTIPLY_BY_THREE,
        chain = SHIFT_BY_THIRD_ELEMENT,
    );
    let responses = run_session(&script);
    assert_eq!(
        responses,
        vec![Json::Bool(true), json!([3, 6, 9]), Json::Null]
    );
}

#[test]
fn malformed_lines_answer_null_and_do_not_kill_the_loop() {
    let script = format!(
        concat!(
            "this is not json\n",
            "{{\"op\":\"transmogrify\"}}\n",
            "\n",
            "{{\"op\":\"evaluate\",\"routine\":\"{multiply}\",\"input\":[2]}}\n",
        ),
        multiply = MULTIPLY_BY_THREE,
    );
    let responses = run_session(&script);
    // The blank line is skipped; both bad requests answer null; the loop
    // still reaches the final good request.
    assert_eq!(responses, vec![Json::Null, Json::Null, json!([6])]);
}

#[test]
fn examples_and_generate_share_the_session() {
    let script = format!(
        concat!(
            "{{\"op\":\"examples\",\"routine\":\"{multiply}\"}}\n",
            "{{\"op\":\"generate\",\"routine\":\"{multiply}\",\"params\":{{\"count\":2}}}}\n",
        ),
        multiply = MULTIPLY_BY_THREE,
    );
    let responses = run_session(&script);
    assert_eq!(responses.len(), 2);

    let examples = responses[0].as_array().expect("examples array");
    assert!(!examples.is_empty());

    let pairs = responses[1].as_array().expect("generate array");
    assert_eq!(pairs.len(), 2);
    for pair in pairs {
        let pair = pair.as_array().expect("pair");
        assert_eq!(pair.len(), 2);
        assert!(pair[0].is_array(), "multiply-k inputs are lists");
    }
}

#[test]
fn find_then_evaluate_discovered_routines() {
    let responses = run_session("{\"op\":\"find\",\"params\":{\"count\":4}}\n");
    let notations = responses[0].as_array().expect("find array");
    assert_eq!(notations.len(), 4);

    // Each discovered routine must be usable in a follow-up generate call.
    for notation in notations {
        let text = notation.as_str().expect("notation string");
        let script = format!(
            "{{\"op\":\"generate\",\"routine\":\"{}\",\"params\":{{\"count\":1}}}}\n",
            text
        );
        let follow_up = run_session(&script);
        assert!(
            follow_up[0].is_array(),
            "generate for discovered routine `{}` answered {:?}",
            text,
            follow_up[0]
        );
    }
}

#[test]
fn end_of_input_ends_the_session_cleanly() {
    let responses = run_session("");
    assert!(responses.is_empty());
}
