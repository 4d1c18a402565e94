//! A handful of elementary distributions used only to exercise the
//! scheduler in tests and in the demonstration binary (§1: elementary
//! random primitives are out of scope for the core proper).

use crate::model::Distribution;
use rand::rngs::SmallRng;
use rand::Rng;
use std::f64::consts::PI;

pub struct Bernoulli {
    pub p: f64,
}

impl Distribution for Bernoulli {
    type Value = bool;
    fn sample(&self, rng: &mut SmallRng) -> bool {
        rng.random::<f64>() < self.p
    }
}

pub struct Normal {
    pub mean: f64,
    pub std: f64,
}

impl Normal {
    /// Box-Muller, good enough for a toy model under test.
    pub fn logpdf(&self, x: f64) -> f64 {
        let z = (x - self.mean) / self.std;
        -0.5 * z * z - (self.std * (2.0 * PI).sqrt()).ln()
    }
}

impl Distribution for Normal {
    type Value = f64;
    fn sample(&self, rng: &mut SmallRng) -> f64 {
        let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = rng.random();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
        self.mean + self.std * z
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn bernoulli_respects_bounds() {
        let mut rng = SmallRng::seed_from_u64(1);
        let dist = Bernoulli { p: 0.5 };
        for _ in 0..100 {
            let _: bool = dist.sample(&mut rng);
        }
    }

    #[test]
    fn normal_logpdf_peaks_at_mean() {
        let dist = Normal { mean: 0.0, std: 1.0 };
        assert!(dist.logpdf(0.0) > dist.logpdf(1.0));
        assert!(dist.logpdf(0.0) > dist.logpdf(-1.0));
    }
}
