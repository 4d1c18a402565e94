//! The suspended trajectory record (§3 "Particle") and its trampolined
//! continuation representation (Design Notes §9, option (c)).
//!
//! The continuation is shared (`Rc<dyn Fn>`), not `FnOnce`: forking a
//! particle means handing out several independent futures grown from the
//! same suspension point, each resumed with its own `Store`. A plain
//! `Box<dyn FnOnce>` can only ever be called once, so it cannot model
//! that; an `Rc<dyn Fn>` can be cheaply cloned per fork (§4.2 `cloneOne`)
//! and invoked once per child without re-deriving the rest-of-computation.

use crate::store::Store;
use crate::store::Value;
use crate::Arbitrary;
use crate::LogWeight;
use rand::rngs::SmallRng;
use std::rc::Rc;

/// What the model handed back to the scheduler by calling `factor` or
/// `exit` (§4.5). `sample` never produces a `Step`; it is forward-only and
/// resolved synchronously inside `Context::sample`.
pub enum Step {
    /// The trajectory hit an observation. `resume` is invoked with the
    /// post-observation store to continue toward the next suspension.
    Factor { score: LogWeight, addr: String, resume: Thunk },
    /// The trajectory finished.
    Exit { value: Value },
}

/// The reified rest-of-computation: invokable with a fresh `Context`,
/// shareable across forks.
pub type Thunk = Rc<dyn Fn(&mut Context) -> Step>;

/// Threaded explicitly through every resume call (Design Notes §9): the
/// store being carried, and the scheduler's single seeded RNG that
/// backs every `sample` draw.
pub struct Context<'a> {
    pub(crate) store: Store,
    pub(crate) rng: &'a mut SmallRng,
}

impl<'a> Context<'a> {
    pub fn new(store: Store, rng: &'a mut SmallRng) -> Self {
        Self { store, rng }
    }

    pub fn store(&mut self) -> &mut Store {
        &mut self.store
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        self.rng
    }

    /// `sample(store, k, addr, dist, params)`: pure forward draw, no
    /// scheduler interaction.
    pub fn sample<D: crate::model::Distribution>(&mut self, dist: &D) -> D::Value {
        dist.sample(self.rng)
    }

    pub fn factor(&mut self, score: LogWeight, addr: impl Into<String>, resume: Thunk) -> Step {
        Step::Factor { score, addr: addr.into(), resume }
    }

    pub fn exit(&mut self, value: Value) -> Step {
        Step::Exit { value }
    }
}

/// A suspended probabilistic-program trajectory (§3).
pub struct Particle {
    pub continuation: Thunk,
    pub store: Store,
    pub weight: LogWeight,
    pub final_weight: LogWeight,
    pub multiplicity: u64,
    pub num_children_to_spawn: u64,
    pub factor_index: Option<usize>,
    pub value: Option<Value>,
    pub completed: bool,
}

impl Particle {
    /// `init(store, cont)`: fresh particle, weights zeroed, no fork
    /// credit yet (it hasn't been buffered — it's about to run).
    pub fn init(store: Store, continuation: Thunk) -> Self {
        Self {
            continuation,
            store,
            weight: 0.0,
            final_weight: 0.0,
            multiplicity: 1,
            num_children_to_spawn: 0,
            factor_index: None,
            value: None,
            completed: false,
        }
    }

    /// `cloneOne(p)`: the fork primitive. Mirrors everything but awards
    /// exactly one fresh fork credit and a freshly cloned store. The
    /// caller is responsible for decrementing `p.num_children_to_spawn`.
    pub fn clone_one(&self) -> Self {
        Self {
            continuation: Rc::clone(&self.continuation),
            store: self.store.fork(),
            weight: self.weight,
            final_weight: self.final_weight,
            multiplicity: self.multiplicity,
            num_children_to_spawn: 1,
            factor_index: self.factor_index,
            value: self.value.clone(),
            completed: self.completed,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.weight == LogWeight::NEG_INFINITY
    }
}

impl Arbitrary for Particle {
    /// A random leaf particle: useful for exercising ledger/aggregator
    /// laws without driving a real model.
    fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        let continuation: Thunk = Rc::new(|ctx: &mut Context| ctx.exit(Value::Int(0)));
        Self {
            continuation,
            store: Store::random(),
            weight: rng.random_range(-5.0..0.0),
            final_weight: 0.0,
            multiplicity: rng.random_range(1..4),
            num_children_to_spawn: rng.random_range(0..3),
            factor_index: if rng.random_bool(0.5) { Some(rng.random_range(0..10)) } else { None },
            value: None,
            completed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_model() -> Thunk {
        Rc::new(|ctx: &mut Context| ctx.exit(Value::Int(1)))
    }

    #[test]
    fn init_has_no_fork_credit() {
        let p = Particle::init(Store::new(), leaf_model());
        assert_eq!(p.num_children_to_spawn, 0);
        assert_eq!(p.multiplicity, 1);
        assert_eq!(p.weight, 0.0);
        assert!(p.factor_index.is_none());
    }

    #[test]
    fn clone_one_is_isolated_but_shares_continuation() {
        let mut parent = Particle::init(Store::new(), leaf_model());
        parent.store.set("x", Value::Int(7));
        parent.weight = -1.5;
        let child = parent.clone_one();
        assert_eq!(child.num_children_to_spawn, 1);
        assert_eq!(child.weight, parent.weight);
        assert_eq!(child.store.get("x"), parent.store.get("x"));
        // continuations point at the same Rc, cheap to clone
        assert!(Rc::ptr_eq(&parent.continuation, &child.continuation));
    }

    #[test]
    fn dead_particle_is_detected() {
        let mut p = Particle::init(Store::new(), leaf_model());
        p.weight = LogWeight::NEG_INFINITY;
        assert!(p.is_dead());
    }

    #[test]
    fn random_particles_respect_multiplicity_invariant() {
        for _ in 0..50 {
            let p = Particle::random();
            assert!(p.multiplicity >= 1);
        }
    }
}
