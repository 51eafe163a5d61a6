#![forbid(unsafe_code)]

//! Shared fixtures for the conformance suites under `tests/`.

use lr_core::Routine;

/// Scenario routines exercised across the suites.
pub const MULTIPLY_BY_THREE: &str = "(multiply-k (dyn 0) (static 3))";
pub const SHIFT_BY_THIRD_ELEMENT: &str = "(index-k (dyn 0) (static 3)) (add-k (dyn 0) (dyn 1))";
pub const FIBONACCI: &str = "(fibonacci (dyn 0))";
pub const PRODUCT: &str = "(product (dyn 0))";
pub const LAST: &str = "(last (dyn 0))";

/// Parse a fixture routine, panicking loudly on a typo in the fixture
/// itself.
#[must_use]
pub fn fixture_routine(text: &str) -> Routine {
    text.parse()
        .unwrap_or_else(|err| panic!("fixture routine `{}` failed to parse: {}", text, err))
}

/// Content-address a scenario for structured test logs.
#[must_use]
pub fn scenario_fixture_id(routine: &str, input: &serde_json::Value) -> String {
    lr_test_utils::fixture_id_from_json(&serde_json::json!({
        "routine": routine,
        "input": input,
    }))
    .unwrap_or_else(|err| panic!("fixture digest failed: {}", err))
}
