//! Seeded randomness that can be rewound.
//!
//! Shuffles and random targets draw from one ChaCha8 stream per world. A
//! [`GameRngState`] is just the seed and word position, so taking one before
//! a draw and restoring it in the undo replays the exact same values.
//!
//! ```
//! use rust_ccg_rules::core::GameRng;
//!
//! let mut rng = GameRng::new(42);
//! let checkpoint = rng.state();
//! let first = rng.gen_index(100);
//!
//! rng.restore(&checkpoint);
//! assert_eq!(rng.gen_index(100), first);
//! assert_eq!(rng.gen_index(0), None);
//! ```

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug)]
pub struct GameRng {
    stream: ChaCha8Rng,
    seed: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            stream: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    /// Uniform index in `0..len`, or `None` when `len` is zero. Nothing is
    /// consumed in the `None` case.
    pub fn gen_index(&mut self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.stream.gen_range(0..len))
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        items.shuffle(&mut self.stream);
    }

    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.stream.get_word_pos(),
        }
    }

    /// Jump to a checkpoint, reseeding first if it came from another seed.
    pub fn restore(&mut self, state: &GameRngState) {
        if state.seed != self.seed {
            *self = Self::new(state.seed);
        }
        self.stream.set_word_pos(state.word_pos);
    }
}

/// Position in a seeded stream. Part of the world view, so two worlds that
/// will draw the same future values compare equal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    pub word_pos: u128,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draws(rng: &mut GameRng, n: usize) -> Vec<usize> {
        (0..n).filter_map(|_| rng.gen_index(1000)).collect()
    }

    #[test]
    fn test_same_seed_same_draws() {
        let mut a = GameRng::new(42);
        let mut b = GameRng::new(42);
        assert_eq!(draws(&mut a, 50), draws(&mut b, 50));
        assert_eq!(a.state(), b.state());
        assert_ne!(draws(&mut GameRng::new(43), 50), draws(&mut GameRng::new(42), 50));
    }

    #[test]
    fn test_restore_rewinds_stream() {
        let mut rng = GameRng::new(7);
        let _ = draws(&mut rng, 10);
        let checkpoint = rng.state();
        let expected = draws(&mut rng, 10);

        rng.restore(&checkpoint);
        assert_eq!(draws(&mut rng, 10), expected);
    }

    #[test]
    fn test_restore_across_seeds() {
        let mut other = GameRng::new(9);
        let _ = draws(&mut other, 3);
        let checkpoint = other.state();
        let expected = draws(&mut other, 5);

        let mut rng = GameRng::new(1);
        rng.restore(&checkpoint);
        assert_eq!(draws(&mut rng, 5), expected);
    }

    #[test]
    fn test_empty_range_consumes_nothing() {
        let mut rng = GameRng::new(1);
        let before = rng.state();
        assert_eq!(rng.gen_index(0), None);
        assert_eq!(rng.state(), before);
    }

    #[test]
    fn test_shuffle_is_a_permutation() {
        let mut rng = GameRng::new(42);
        let mut deck: Vec<u32> = (1..=10).collect();
        rng.shuffle(&mut deck);
        deck.sort_unstable();
        assert_eq!(deck, (1..=10).collect::<Vec<_>>());
    }
}
