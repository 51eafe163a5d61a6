//! Shared input-generation helper.
//!
//! Each subroutine's generator proposes `count` candidate inputs
//! independently; the caller is responsible for filtering them against the
//! routine's inferred input type and may re-invoke on rejection. The knobs
//! here are the recognized generator options: default/valid length and
//! default/valid element, specialized per subroutine through closures.

use crate::prng::Prng;
use lr_core::Value;

/// Request-level generation options.
#[derive(Debug, Clone, Copy)]
pub struct GenConfig {
    /// Number of candidates to propose per round.
    pub count: usize,
    /// Inclusive upper bound on default list lengths.
    pub len_limit: usize,
    /// Magnitude bound on default elements.
    pub element_limit: i64,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            count: 1,
            len_limit: 8,
            element_limit: 10,
        }
    }
}

impl GenConfig {
    #[must_use]
    pub fn with_count(count: usize) -> Self {
        Self {
            count,
            ..Self::default()
        }
    }
}

/// Default element draw: uniform in `-element_limit..=element_limit`.
pub fn default_element(cfg: &GenConfig, prng: &mut Prng) -> i64 {
    prng.range_i64(-cfg.element_limit, cfg.element_limit)
}

/// Default length draw: uniform in `0..=len_limit`.
pub fn default_len(cfg: &GenConfig, prng: &mut Prng) -> usize {
    prng.below(cfg.len_limit as u64 + 1) as usize
}

/// Propose `count` integer candidates.
pub fn ints(
    cfg: &GenConfig,
    prng: &mut Prng,
    mut element: impl FnMut(&mut Prng) -> i64,
) -> Vec<Value> {
    (0..cfg.count).map(|_| Value::Int(element(prng))).collect()
}

/// Propose `count` list candidates.
pub fn lists(
    cfg: &GenConfig,
    prng: &mut Prng,
    mut len: impl FnMut(&mut Prng) -> usize,
    mut element: impl FnMut(&mut Prng) -> i64,
) -> Vec<Value> {
    (0..cfg.count)
        .map(|_| {
            let n = len(prng);
            Value::List((0..n).map(|_| element(prng)).collect())
        })
        .collect()
}
