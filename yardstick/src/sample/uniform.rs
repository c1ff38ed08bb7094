use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use super::Sample;
use crate::common::{validate_reservoir_size, BuildError};

/// A uniform sampling reservoir.
///
/// [Reservoir sampling][rs] is a technique used to produce a statistically representative sample of
/// a data stream, in a fixed space, without knowing the length of the stream in advance.
/// `UniformSample` is based on Vitter's ["Algorithm R"][vitter_paper]: once the reservoir is full,
/// the `n`-th value replaces a random slot with probability `size / n`, which leaves every value
/// observed so far with the same chance of being retained.
///
/// Uses a fast PRNG ([Xoshiro256**][xoshiro256starstar]) to limit the per-call sampling overhead.
///
/// [rs]: https://en.wikipedia.org/wiki/Reservoir_sampling
/// [vitter_paper]: https://www.cs.umd.edu/~samir/498/vitter.pdf
/// [xoshiro256starstar]: https://prng.di.unimi.it
pub struct UniformSample {
    values: Vec<f64>,
    count: u64,
    reservoir_size: usize,
    rng: Xoshiro256StarStar,
}

impl UniformSample {
    /// Creates a new `UniformSample` that retains up to `reservoir_size` values.
    ///
    /// # Errors
    ///
    /// If `reservoir_size` is zero, an error is returned.
    pub fn new(reservoir_size: usize) -> Result<Self, BuildError> {
        let rng = Xoshiro256StarStar::from_rng(&mut rand::rng());
        Self::with_rng(reservoir_size, rng)
    }

    /// Creates a new `UniformSample` whose replacement choices are driven by the given seed.
    ///
    /// # Errors
    ///
    /// If `reservoir_size` is zero, an error is returned.
    pub fn with_seed(reservoir_size: usize, seed: u64) -> Result<Self, BuildError> {
        Self::with_rng(reservoir_size, Xoshiro256StarStar::seed_from_u64(seed))
    }

    fn with_rng(reservoir_size: usize, rng: Xoshiro256StarStar) -> Result<Self, BuildError> {
        let reservoir_size = validate_reservoir_size(reservoir_size)?;

        Ok(UniformSample {
            values: Vec::with_capacity(reservoir_size.min(1024)),
            count: 0,
            reservoir_size,
            rng,
        })
    }

    /// Gets the maximum number of values this sample retains.
    pub fn reservoir_size(&self) -> usize {
        self.reservoir_size
    }
}

impl Sample for UniformSample {
    fn update(&mut self, value: f64) {
        self.count += 1;

        if self.values.len() < self.reservoir_size {
            self.values.push(value);
        } else {
            let idx = self.rng.random_range(0..self.count);
            if idx < self.values.len() as u64 {
                self.values[idx as usize] = value;
            }
        }
    }

    fn clear(&mut self) {
        self.values.clear();
        self.count = 0;
    }

    fn size(&self) -> usize {
        self.values.len()
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn values(&self) -> Vec<f64> {
        self.values.clone()
    }
}
