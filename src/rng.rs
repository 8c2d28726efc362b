//! Seedable random streams.
//!
//! Every consumer draws from its own named ChaCha8 stream derived from the
//! farm seed, so adding a new consumer never perturbs the sequence another
//! one observes.

use std::collections::HashMap;

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Stream used for behaviour picks and senescence rolls.
pub const FLOCK_STREAM: &str = "flock";
/// Stream used for the gender of hatched and stocked birds.
pub const HATCHERY_STREAM: &str = "hatchery";

pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let master = &mut self.master;
        let entry = self.streams.entry(name.to_string()).or_insert_with(|| {
            let derived = master.next_u64();
            ChaCha8Rng::seed_from_u64(derived)
        });
        StreamRng { inner: entry }
    }
}

impl Default for RngManager {
    fn default() -> Self {
        Self::new(42)
    }
}

pub struct StreamRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl<'a> RngCore for StreamRng<'a> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Helpers for the weighted picks the simulation makes.
pub trait RngExt {
    /// Returns the index of the bucket hit by a draw over `weights`.
    /// Falls back to the last bucket when every weight is zero.
    fn pick_weighted(&mut self, weights: &[f64]) -> usize;
}

impl<R: RngCore + ?Sized> RngExt for R {
    fn pick_weighted(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().map(|w| w.max(0.0)).sum();
        if weights.is_empty() || total <= 0.0 {
            return weights.len().saturating_sub(1);
        }
        let mut roll = self.gen::<f64>() * total;
        for (index, weight) in weights.iter().enumerate() {
            let weight = weight.max(0.0);
            if roll < weight {
                return index;
            }
            roll -= weight;
        }
        weights.len() - 1
    }
}
