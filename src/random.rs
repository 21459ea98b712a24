//! The seeded random number generator shared by every stage of a tick.
//!
//! A simulation owns exactly one [`RandomSource`]. Motion jitter, transmission trials, period
//! sampling and initial placement all draw from it in a fixed order, so a seed fully determines
//! a run.

use log::trace;
use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::distr::Distribution;
use rand::rngs::SmallRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};

pub type RngType = SmallRng;

pub struct RandomSource {
    base_seed: u64,
    rng: RngType,
}

impl RandomSource {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        trace!("initializing random source (seed={base_seed})");
        RandomSource {
            base_seed,
            rng: RngType::seed_from_u64(base_seed),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Gets a random sample by applying the specified sampler function to the generator.
    pub fn sample<T>(&mut self, sampler: impl FnOnce(&mut RngType) -> T) -> T {
        sampler(&mut self.rng)
    }

    /// Gets a random sample from the specified distribution.
    pub fn sample_distr<T>(&mut self, distribution: impl Distribution<T>) -> T {
        distribution.sample(&mut self.rng)
    }

    /// Gets a random sample within the range provided by `range`.
    pub fn sample_range<S, T>(&mut self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.rng.random_range(range)
    }

    /// Gets a random boolean value which is true with probability `p`. Values of `p` outside
    /// `[0, 1]` (e.g. from floating point error in a combined probability) are clamped.
    pub fn sample_bool(&mut self, p: f64) -> bool {
        self.rng.random_bool(p.clamp(0.0, 1.0))
    }

    /// Draws `amount` distinct indices out of `0..length`, in random order.
    ///
    /// # Panics
    ///
    /// Panics if `amount > length`; callers validate this first.
    pub fn sample_indices(&mut self, length: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, length, amount).into_vec()
    }
}

#[cfg(test)]
mod test {
    use super::RandomSource;
    use rand::RngCore;
    use rand_distr::Normal;

    #[test]
    fn get_rng_basic() {
        let mut rng = RandomSource::new(42);

        assert_ne!(
            rng.sample(RngCore::next_u64),
            rng.sample(RngCore::next_u64)
        );
    }

    #[test]
    fn same_seed_same_values() {
        let mut first = RandomSource::new(42);
        let mut second = RandomSource::new(42);
        for _ in 0..10 {
            assert_eq!(
                first.sample_range::<_, f64>(0.0..1.0),
                second.sample_range::<_, f64>(0.0..1.0)
            );
        }

        let mut other = RandomSource::new(88);
        assert_ne!(
            RandomSource::new(42).sample(RngCore::next_u64),
            other.sample(RngCore::next_u64)
        );
        assert_eq!(other.base_seed(), 88);
    }

    #[test]
    fn sample_distribution() {
        let mut rng = RandomSource::new(42);
        let normal = Normal::new(10.0, 1.0).unwrap();

        let n_samples = 3000;
        let mean: f64 = (0..n_samples)
            .map(|_| rng.sample_distr(normal))
            .sum::<f64>()
            / f64::from(n_samples);
        assert!((mean - 10.0).abs() < 0.1);
    }

    #[test]
    fn sample_range() {
        let mut rng = RandomSource::new(42);
        let result = rng.sample_range::<_, i32>(0..10);
        assert!((0..10).contains(&result));
    }

    #[test]
    fn sample_bool_extremes() {
        let mut rng = RandomSource::new(42);
        assert!(rng.sample_bool(1.0));
        assert!(!rng.sample_bool(0.0));
        // Tiny overshoot from `1 - (1 - p)^k` style arithmetic is clamped.
        assert!(rng.sample_bool(1.0 + 1e-12));
    }

    #[test]
    fn sample_indices_are_distinct() {
        let mut rng = RandomSource::new(42);
        let mut picked = rng.sample_indices(100, 10);
        assert_eq!(picked.len(), 10);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 10);
        assert!(picked.iter().all(|&i| i < 100));
    }
}
