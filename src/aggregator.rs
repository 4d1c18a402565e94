//! The marginal aggregator (§4.6): turns the completed-particle list into
//! an empirical distribution plus a log-marginal-likelihood estimate, and
//! exposes the anytime `continue(extra)` handle.

use crate::model::Model;
use crate::numeric::logsumexp;
use crate::scheduler::Scheduler;
use crate::store::Value;
use crate::LogWeight;
use rand::rngs::SmallRng;
use rand::Rng;
use std::collections::BTreeMap;

/// The weighted empirical marginal over a model's return value.
///
/// Owns the scheduler outright so that `continue` can resume stepping
/// without any shared/borrowed state across calls.
pub struct Distribution<M: Model> {
    scheduler: Scheduler<M>,
}

impl<M: Model> Distribution<M> {
    pub(crate) fn new(scheduler: Scheduler<M>) -> Self {
        Self { scheduler }
    }

    /// `nc = logsumexp(completed.weights) − log(numParticles)` (§4.6).
    ///
    /// When every completed particle is dead (§7 `NumericDegenerate`)
    /// this is `-inf`, never `NaN`.
    pub fn normalization_constant(&self) -> LogWeight {
        let n = self.scheduler.completed().len();
        if n == 0 {
            return LogWeight::NEG_INFINITY;
        }
        let weights: Vec<LogWeight> = self.scheduler.completed().iter().map(|p| p.weight).collect();
        let nc = logsumexp(&weights) - (n as f64).ln();
        if nc.is_infinite() && nc.is_sign_negative() {
            log::warn!("numeric degeneracy: all {n} completed particles have -inf weight");
        }
        nc
    }

    /// Histogram keyed by each particle's return value, normalized by the
    /// completed count (not by surviving mass — dead completions still
    /// occupy a histogram slot with zero effective weight, see `weights`).
    pub fn histogram(&self) -> BTreeMap<Value, f64> {
        let completed = self.scheduler.completed();
        let total = completed.len().max(1) as f64;
        let mut counts: BTreeMap<Value, f64> = BTreeMap::new();
        for p in completed {
            if let Some(value) = &p.value {
                *counts.entry(value.clone()).or_insert(0.0) += 1.0 / total;
            }
        }
        counts
    }

    /// Sample a return value proportional to empirical weight.
    pub fn sample(&self, rng: &mut SmallRng) -> Option<Value> {
        let completed = self.scheduler.completed();
        if completed.is_empty() {
            return None;
        }
        let weights: Vec<f64> = completed.iter().map(|p| p.weight).collect();
        let probs = crate::numeric::normalize(&weights);
        let u: f64 = rng.random();
        let mut cumulative = 0.0;
        for (p, w) in completed.iter().zip(probs.iter()) {
            cumulative += w;
            if u < cumulative {
                return p.value.clone();
            }
        }
        completed.last().and_then(|p| p.value.clone())
    }

    /// Empirical probability mass at a given return value.
    pub fn score(&self, value: &Value) -> f64 {
        self.histogram().get(value).copied().unwrap_or(0.0)
    }

    pub fn completed_count(&self) -> usize {
        self.scheduler.completed().len()
    }

    /// Extend the budget and keep running (§4.4, §4.6), returning a new
    /// distribution whose estimator uses every completed particle so far.
    pub fn extend(mut self, extra: usize) -> Self {
        self.scheduler.extend(extra);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::particle::Context;
    use crate::particle::Thunk;
    use std::rc::Rc;

    fn coin_model() -> Thunk {
        Rc::new(|ctx: &mut Context| {
            let heads = ctx.sample(&crate::distributions::Bernoulli { p: 0.5 });
            ctx.exit(Value::Bool(heads))
        })
    }

    #[test]
    fn histogram_sums_to_one() {
        let mut scheduler = Scheduler::new(coin_model, Config::new(1000, 50).with_seed(11));
        scheduler.run();
        let dist = Distribution::new(scheduler);
        let total: f64 = dist.histogram().values().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn trivial_coin_converges_near_half() {
        let mut scheduler = Scheduler::new(coin_model, Config::new(10_000, 100).with_seed(12));
        scheduler.run();
        let dist = Distribution::new(scheduler);
        let heads = dist.score(&Value::Bool(true));
        assert!((heads - 0.5).abs() < 0.02, "heads mass {heads} too far from 0.5");
        assert!(dist.normalization_constant().abs() < 0.1);
    }

    #[test]
    fn extend_accumulates_completed_count() {
        let mut scheduler = Scheduler::new(coin_model, Config::new(500, 20).with_seed(13));
        scheduler.run();
        let dist = Distribution::new(scheduler).extend(500);
        assert_eq!(dist.completed_count(), 1000);
    }

    fn all_kill_model() -> Thunk {
        let resume: Thunk = Rc::new(|ctx: &mut Context| ctx.exit(Value::Int(0)));
        Rc::new(move |ctx: &mut Context| ctx.factor(LogWeight::NEG_INFINITY, "obs0", Rc::clone(&resume)))
    }

    #[test]
    fn all_kill_model_is_degenerate_not_empty_panic() {
        // §8 scenario 3: every particle drops at the first observation, so
        // the run stalls with zero completions; the aggregator must still
        // hand back a well-formed (degenerate) distribution rather than
        // looping forever or panicking on an empty completed list.
        let mut scheduler = Scheduler::new(all_kill_model, Config::new(50, 10).with_seed(14));
        scheduler.run();
        let dist = Distribution::new(scheduler);
        assert_eq!(dist.completed_count(), 0);
        assert_eq!(dist.normalization_constant(), LogWeight::NEG_INFINITY);
        assert!(dist.histogram().is_empty());
    }
}
