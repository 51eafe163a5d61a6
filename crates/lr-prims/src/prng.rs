//! ThreeFry2x32 counter-based PRNG.
//!
//! Reference: Salmon et al., "Parallel Random Numbers: As Easy as 1, 2, 3"
//! (SC'11), 2x32 variant with 20 rounds. Counter-based generation keeps the
//! whole stream a pure function of `(seed, counter)`, which is what makes a
//! fixed-seed enumeration run reproducible.

/// Skein rotation constants for the 2x32 variant (paper, Table 1).
const ROTATIONS: [u32; 8] = [13, 15, 26, 6, 17, 29, 16, 24];

const NUM_ROUNDS: usize = 20;

/// ThreeFry2x32 block function: encrypt a 2-word counter with a 2-word key.
#[must_use]
pub fn threefry2x32(key: [u32; 2], data: [u32; 2]) -> [u32; 2] {
    // Key schedule parity constant from the Skein specification.
    const KS_PARITY: u32 = 0x1BD1_1BDA;

    let ks2 = key[0] ^ key[1] ^ KS_PARITY;

    let mut x0 = data[0].wrapping_add(key[0]);
    let mut x1 = data[1].wrapping_add(key[1]);

    for round in 0..NUM_ROUNDS {
        x0 = x0.wrapping_add(x1);
        x1 = x1.rotate_left(ROTATIONS[round % 8]) ^ x0;

        if (round + 1) % 4 == 0 {
            let inject = (round + 1) / 4;
            let keys = [key[0], key[1], ks2];
            x0 = x0.wrapping_add(keys[inject % 3]);
            x1 = x1.wrapping_add(keys[(inject + 1) % 3].wrapping_add(inject as u32));
        }
    }

    [x0, x1]
}

/// Stateful sampler over the ThreeFry stream: a fixed key plus a rising
/// block counter.
#[derive(Debug, Clone)]
pub struct Prng {
    key: [u32; 2],
    counter: u64,
}

impl Prng {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            key: [(seed >> 32) as u32, seed as u32],
            counter: 0,
        }
    }

    #[must_use]
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|duration| duration.as_nanos() as u64)
            .unwrap_or(0x9E37_79B9_7F4A_7C15);
        Self::from_seed(nanos)
    }

    pub fn next_u64(&mut self) -> u64 {
        let data = [self.counter as u32, (self.counter >> 32) as u32];
        self.counter = self.counter.wrapping_add(1);
        let block = threefry2x32(self.key, data);
        (u64::from(block[0]) << 32) | u64::from(block[1])
    }

    /// Uniform draw in `0..n`. `n` must be positive.
    pub fn below(&mut self, n: u64) -> u64 {
        debug_assert!(n > 0);
        // Rejection sampling to avoid modulo bias.
        let zone = u64::MAX - (u64::MAX % n);
        loop {
            let draw = self.next_u64();
            if draw < zone {
                return draw % n;
            }
        }
    }

    /// Uniform draw in the inclusive range `lo..=hi`.
    pub fn range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        debug_assert!(lo <= hi);
        let span = hi.wrapping_sub(lo) as u64;
        if span == u64::MAX {
            return self.next_u64() as i64;
        }
        lo.wrapping_add(self.below(span + 1) as i64)
    }

    /// True with probability `num / den`.
    pub fn chance(&mut self, num: u64, den: u64) -> bool {
        self.below(den) < num
    }

    /// Uniform choice of an index into a nonempty slice.
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        items.get(self.below(items.len() as u64) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::{Prng, threefry2x32};

    #[test]
    fn block_function_is_deterministic() {
        assert_eq!(threefry2x32([0, 0], [0, 0]), threefry2x32([0, 0], [0, 0]));
        assert_ne!(threefry2x32([0, 0], [0, 0]), [0, 0]);
    }

    #[test]
    fn different_keys_diverge() {
        assert_ne!(threefry2x32([0, 0], [0, 1]), threefry2x32([0, 1], [0, 1]));
    }

    #[test]
    fn same_seed_same_stream() {
        let mut a = Prng::from_seed(42);
        let mut b = Prng::from_seed(42);
        for _ in 0..16 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Prng::from_seed(1);
        let mut b = Prng::from_seed(2);
        let draws_a: Vec<u64> = (0..4).map(|_| a.next_u64()).collect();
        let draws_b: Vec<u64> = (0..4).map(|_| b.next_u64()).collect();
        assert_ne!(draws_a, draws_b);
    }

    #[test]
    fn range_draws_stay_inside_bounds() {
        let mut prng = Prng::from_seed(7);
        for _ in 0..200 {
            let draw = prng.range_i64(-5, 9);
            assert!((-5..=9).contains(&draw));
        }
    }

    #[test]
    fn below_covers_small_domain() {
        let mut prng = Prng::from_seed(11);
        let mut seen = [false; 5];
        for _ in 0..200 {
            seen[prng.below(5) as usize] = true;
        }
        assert!(seen.iter().all(|hit| *hit));
    }

    #[test]
    fn chance_honors_degenerate_odds() {
        let mut prng = Prng::from_seed(3);
        assert!(!prng.chance(0, 10));
        assert!(prng.chance(10, 10));
    }
}
