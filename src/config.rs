//! Configuration surface: `numParticles`, `bufferSize` (ρ), and the RNG seed.
//!
//! Grounded in the teacher's `clap`-derived CLI structs (`analysis/cli.rs`):
//! the same fields are exposed to library callers here and to the
//! demonstration binary as `#[derive(clap::Parser)]` fields.

use crate::error::Error;
use crate::error::Result;

/// Tuning knobs for a single `run`.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Target number of completed particles.
    pub num_particles: usize,
    /// Maximum buffer occupancy (ρ).
    pub buffer_size: usize,
    /// RNG seed. Fixing this makes the `wbar` sequence reproducible.
    pub seed: u64,
}

impl Config {
    pub fn new(num_particles: usize, buffer_size: usize) -> Self {
        Self { num_particles, buffer_size, seed: 0 }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// `⌊3ρ/5⌋`, the initial seeding fraction from §4.4.
    pub fn initial_seed_count(&self) -> usize {
        3 * self.buffer_size / 5
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_particles == 0 {
            return Err(Error::InvalidConfig("numParticles must be positive".into()));
        }
        if self.buffer_size == 0 {
            return Err(Error::InvalidConfig("bufferSize must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_particles() {
        assert!(Config::new(0, 10).validate().is_err());
    }

    #[test]
    fn rejects_zero_buffer() {
        assert!(Config::new(10, 0).validate().is_err());
    }

    #[test]
    fn accepts_sane_config() {
        assert!(Config::new(100, 10).validate().is_ok());
    }

    #[test]
    fn seed_fraction_floors() {
        assert_eq!(Config::new(1, 100).initial_seed_count(), 60);
        assert_eq!(Config::new(1, 1).initial_seed_count(), 0);
    }
}
