//! Random permutations for randomly ordered blocks

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Produces a permutation of object IDs
pub trait Shuffler: Send + Sync {
    /// Return `ids` in a random order
    fn shuffle(&self, ids: Vec<String>) -> Vec<String>;
}

/// Shuffles with the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadShuffler;

impl Shuffler for ThreadShuffler {
    fn shuffle(&self, mut ids: Vec<String>) -> Vec<String> {
        ids.shuffle(&mut rand::rng());
        ids
    }
}

/// Reproducible shuffler seeded once
#[derive(Debug)]
pub struct SeededShuffler {
    rng: Mutex<StdRng>,
}

impl SeededShuffler {
    /// Create a shuffler from a seed
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl Shuffler for SeededShuffler {
    fn shuffle(&self, mut ids: Vec<String>) -> Vec<String> {
        ids.shuffle(&mut *self.rng.lock());
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("p{i}")).collect()
    }

    #[test]
    fn same_seed_same_order() {
        let a = SeededShuffler::new(42).shuffle(ids(8));
        let b = SeededShuffler::new(42).shuffle(ids(8));
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn shuffle_is_a_permutation(n in 0usize..20, seed in any::<u64>()) {
            let mut shuffled = SeededShuffler::new(seed).shuffle(ids(n));
            shuffled.sort();
            let mut expected = ids(n);
            expected.sort();
            prop_assert_eq!(shuffled, expected);
        }

        #[test]
        fn thread_shuffle_keeps_length(n in 0usize..20) {
            prop_assert_eq!(ThreadShuffler.shuffle(ids(n)).len(), n);
        }
    }
}
