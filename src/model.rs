//! The inward contract (§6): what a compiled model looks like from the
//! core's point of view, plus the thin `Distribution` interface that
//! `sample` calls through.
//!
//! Elementary random primitives are explicitly out of scope (§1) — the
//! core only needs a way to draw a value and, separately, a way for a
//! model to compute a log-density to hand to `factor`. Concrete
//! distributions live in `crate::distributions` purely to exercise and
//! test the scheduler.

use crate::particle::Thunk;
use rand::rngs::SmallRng;

/// A model is just its own start continuation: invokable to produce the
/// first `Step`, same shape as every other suspension point.
pub trait Model {
    fn start(&self) -> Thunk;
}

impl<F> Model for F
where
    F: Fn() -> Thunk,
{
    fn start(&self) -> Thunk {
        self()
    }
}

/// External collaborator: an elementary random primitive with a sampler
/// and a log-density scorer. The core never inspects `Params`; it only
/// calls `sample`.
pub trait Distribution {
    type Value;
    fn sample(&self, rng: &mut SmallRng) -> Self::Value;
}
