//! The per-particle address-keyed store carried along a trajectory.
//!
//! Addresses are opaque strings emitted by model code (§6: "not inspected
//! by the core"). The store is a shallow-cloned flat map rather than a
//! persistent/structurally-shared map (Design Notes §9): mutations on a
//! forked particle must be invisible to its siblings, and a flat
//! `HashMap` clone satisfies that without pulling in a persistent-map
//! dependency the rest of this crate has no other use for.

use crate::Arbitrary;
use std::collections::HashMap;

pub type Address = String;

/// A value a model may stash in its store, or return from `exit`.
///
/// Deliberately small: the core does not know or care what model-level
/// values look like beyond needing to hash/compare them for the
/// aggregator's histogram (§4.6).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// Discretized to a fixed number of decimal digits so that floating
    /// point draws still hash and compare sanely in a histogram.
    Float(i64),
    Str(String),
}

impl Value {
    pub fn float(x: f64) -> Self {
        const SCALE: f64 = 1e6;
        Value::Float((x * SCALE).round() as i64)
    }
}

/// Address-keyed mutable state carried along a particle's trajectory.
#[derive(Debug, Clone, Default)]
pub struct Store {
    slots: HashMap<Address, Value>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, addr: &str) -> Option<&Value> {
        self.slots.get(addr)
    }

    pub fn set(&mut self, addr: impl Into<Address>, value: Value) {
        self.slots.insert(addr.into(), value);
    }

    /// Fork primitive for stores: a shallow clone, so writes on the child
    /// never leak back to the parent or to sibling forks.
    pub fn fork(&self) -> Self {
        self.clone()
    }
}

impl Arbitrary for Value {
    fn random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        match rng.random_range(0..4) {
            0 => Value::Bool(rng.random()),
            1 => Value::Int(rng.random_range(-100..100)),
            2 => Value::float(rng.random_range(-10.0..10.0)),
            _ => Value::Str(format!("s{}", rng.random_range(0..1000))),
        }
    }
}

impl Arbitrary for Store {
    fn random() -> Self {
        let mut store = Store::new();
        for i in 0..5 {
            store.set(format!("addr{i}"), Value::random());
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_store_has_entries() {
        let store = Store::random();
        assert_eq!(store.get("addr0").is_some(), true);
    }

    #[test]
    fn fork_is_isolated() {
        let mut parent = Store::new();
        parent.set("x", Value::Int(1));
        let mut child = parent.fork();
        child.set("x", Value::Int(2));
        assert_eq!(parent.get("x"), Some(&Value::Int(1)));
        assert_eq!(child.get("x"), Some(&Value::Int(2)));
    }
}
