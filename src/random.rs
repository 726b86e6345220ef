//! Explicit random state.
//!
//! Every random draw in the crate goes through a [`RandomContext`] passed in
//! by the caller. Independent streams (one per distribution construction, one
//! per evaluation batch) are derived with [`RandomContext::fork`], so results
//! do not depend on evaluation order or on the number of worker threads.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Seeded random state.
#[derive(Debug, Clone)]
pub struct RandomContext {
    seed: u64,
    rng: Xoshiro256PlusPlus,
}

impl RandomContext {
    /// Create a context from a seed.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    /// Seed this context was created from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Independent context for `stream`, determined by the seed alone.
    pub fn fork(&self, stream: u64) -> RandomContext {
        RandomContext::new(stream_seed(self.seed, stream))
    }

    /// Underlying generator.
    pub fn rng(&mut self) -> &mut Xoshiro256PlusPlus {
        &mut self.rng
    }
}

impl RngCore for RandomContext {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }
}

/// SplitMix64 finalizer over `seed` and `stream`.
fn stream_seed(seed: u64, stream: u64) -> u64 {
    let mut z = seed ^ stream.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
