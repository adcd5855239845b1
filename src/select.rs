//! Pluggable selection strategies for address and victim choice.
//!
//! Allocation picks one address out of the free set, and failure injection
//! picks one victim out of the active leases. Both go through
//! [`AddressSelector`] so the policy can be swapped: production uses uniform
//! random choice (the reference behavior), tests inject a seeded RNG or
//! [`LowestFirst`] for deterministic outcomes.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Chooses one of `len` candidates.
pub trait AddressSelector: Send + Sync {
    /// Returns an index in `0..len`. Callers guarantee `len > 0`.
    fn pick(&mut self, len: usize) -> usize;
}

/// Uniform random selection backed by a seedable ChaCha8 RNG.
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: ChaCha8Rng,
}

impl RandomSelector {
    /// Creates a selector seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }

    /// Creates a selector with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl AddressSelector for RandomSelector {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Deterministic lowest-candidate-first selection.
///
/// Always picks index 0. With the sorted free set this hands out the lowest
/// free address, which changes the observable allocation order compared to
/// [`RandomSelector`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestFirst;

impl AddressSelector for LowestFirst {
    fn pick(&mut self, _len: usize) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowest_first_always_picks_zero() {
        let mut selector = LowestFirst;
        assert_eq!(selector.pick(1), 0);
        assert_eq!(selector.pick(100), 0);
    }

    #[test]
    fn test_random_selector_stays_in_bounds() {
        let mut selector = RandomSelector::new();
        for len in 1..50 {
            assert!(selector.pick(len) < len);
        }
    }

    #[test]
    fn test_seeded_selector_is_reproducible() {
        let mut first = RandomSelector::seeded(42);
        let mut second = RandomSelector::seeded(42);
        let picks_first: Vec<usize> = (0..20).map(|_| first.pick(10)).collect();
        let picks_second: Vec<usize> = (0..20).map(|_| second.pick(10)).collect();
        assert_eq!(picks_first, picks_second);
    }
}
