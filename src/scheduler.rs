//! The control loop (§4.4): pick a particle (or seed a fresh one), resume
//! it once, and apply whatever it hands back — a factor (§4.3 ledger
//! update, possibly re-buffering) or an exit (§4.6, completes it).
//!
//! Grounded in the teacher's `mccfr::trainer::Blueprint::sample`/`explore`
//! pair: a stack-free, iteratively-driven tree/particle growth loop keyed
//! off a per-step seeded RNG, rather than native recursion through the
//! model's continuations.

use crate::config::Config;
use crate::ledger::Ledger;
use crate::model::Model;
use crate::particle::Context;
use crate::particle::Particle;
use crate::particle::Step;
use crate::store::Store;
use crate::LogWeight;
use rand::rngs::SmallRng;
use rand::Rng;
use rand::SeedableRng;

/// Floor on how many consecutive no-completion steps `run` tolerates before
/// giving up, regardless of buffer size (§7 `NumericDegenerate`: a model
/// that can never reach `exit` — e.g. `factor(-inf)` on its first
/// observation — must not spin the scheduler forever).
const MIN_STALL_STEPS: usize = 1_000;
/// Scaled against the buffer size so that larger working sets, which
/// naturally take longer between completions, get proportionally more
/// slack before a stall is declared.
const STALL_STEPS_PER_SLOT: usize = 50;

pub struct Scheduler<M: Model> {
    model: M,
    config: Config,
    rng: SmallRng,
    buffer: Vec<Particle>,
    pub(crate) completed: Vec<Particle>,
    ledger: Ledger,
    target: usize,
    stall_limit: usize,
    steps_since_progress: usize,
}

impl<M: Model> Scheduler<M> {
    pub fn new(model: M, config: Config) -> Self {
        let rng = SmallRng::seed_from_u64(config.seed);
        let target = config.num_particles;
        let stall_limit = MIN_STALL_STEPS.max(config.buffer_size.saturating_mul(STALL_STEPS_PER_SLOT));
        let mut scheduler = Self {
            model,
            config,
            rng,
            buffer: Vec::with_capacity(config.buffer_size),
            completed: Vec::with_capacity(target),
            ledger: Ledger::new(),
            target,
            stall_limit,
            steps_since_progress: 0,
        };
        scheduler.seed_initial();
        scheduler
    }

    /// `⌊3ρ/5⌋` fresh particles, each already holding one fork credit so
    /// the buffer invariant (`numChildrenToSpawn ≥ 1`) holds from the start.
    fn seed_initial(&mut self) {
        for _ in 0..self.config.initial_seed_count() {
            let mut particle = self.fresh_particle();
            particle.num_children_to_spawn = 1;
            self.buffer.push(particle);
        }
    }

    fn fresh_particle(&self) -> Particle {
        Particle::init(Store::new(), self.model.start())
    }

    /// Run until the completed count reaches the target budget, or until
    /// `stall_limit` consecutive steps pass without a single new
    /// completion. The latter is the escape hatch for a model that can
    /// never reach `exit` (every trajectory dies at or before its first
    /// observation): without it, `pick_active` would keep minting and
    /// immediately killing fresh particles forever. A stalled run is not
    /// an error — it is the `NumericDegenerate` case (§7): whatever
    /// completed so far (possibly nothing) is still a valid, if
    /// uninformative, anytime result.
    pub fn run(&mut self) {
        while self.completed.len() < self.target {
            self.step();
            if self.steps_since_progress >= self.stall_limit {
                log::warn!(
                    "aSMC run stalled: no completions in {} steps ({}/{} particles done); \
                     stopping early, treating as numerically degenerate",
                    self.steps_since_progress,
                    self.completed.len(),
                    self.target
                );
                break;
            }
        }
        log::info!(
            "aSMC run complete: {} particles, target {}",
            self.completed.len(),
            self.target
        );
    }

    /// Extend the budget and keep stepping — the anytime `continue(extra)`
    /// operation (§4.4, §4.6).
    pub fn extend(&mut self, extra: usize) {
        self.target += extra;
        log::info!("extending budget by {extra} to {}", self.target);
        self.run();
    }

    pub fn completed(&self) -> &[Particle] {
        &self.completed
    }

    /// `i ∈ [0, |buffer|]` uniformly: `i = |buffer|` seeds a fresh
    /// particle, any other index resumes (or forks from) that buffer slot.
    fn pick_active(&mut self) -> Particle {
        let i = self.rng.random_range(0..=self.buffer.len());
        if i == self.buffer.len() {
            self.fresh_particle()
        } else if self.buffer[i].num_children_to_spawn > 1 {
            self.buffer[i].num_children_to_spawn -= 1;
            self.buffer[i].clone_one()
        } else {
            self.buffer.remove(i)
        }
    }

    fn step(&mut self) {
        let mut particle = self.pick_active();
        let mut ctx = Context::new(std::mem::take(&mut particle.store), &mut self.rng);
        let outcome = (particle.continuation)(&mut ctx);
        particle.store = ctx.store;
        let completed_before = self.completed.len();
        match outcome {
            Step::Factor { score, addr, resume } => self.handle_factor(particle, score, &addr, resume),
            Step::Exit { value } => self.handle_exit(particle, value),
        }
        if self.completed.len() > completed_before {
            self.steps_since_progress = 0;
        } else {
            self.steps_since_progress += 1;
        }
    }

    fn handle_factor(&mut self, mut particle: Particle, score: LogWeight, addr: &str, resume: crate::particle::Thunk) {
        particle.weight += score;
        particle.continuation = resume;
        particle.factor_index = Some(particle.factor_index.map_or(0, |i| i + 1));
        let n = particle.factor_index.expect("just set above");

        if particle.is_dead() {
            log::debug!("dropping particle: -inf weight at factor {n} ({addr})");
            return;
        }

        let w = particle.weight;
        let c = self.ledger.arrive(n, w, particle.multiplicity, self.config.buffer_size, &mut self.rng);
        if c == 0 {
            log::debug!("dropping particle: zero children awarded at factor {n} ({addr})");
            return;
        }

        if self.buffer.len() < self.config.buffer_size {
            particle.num_children_to_spawn = c;
            particle.weight = w - (c as f64).ln();
        } else {
            log::debug!("buffer saturated: folding {c} children into multiplicity at factor {n}");
            particle.multiplicity *= c;
            particle.num_children_to_spawn = 1;
            particle.weight = w - (c as f64).ln();
        }
        particle.final_weight = (particle.multiplicity as f64).ln() + particle.weight + score;
        self.buffer.push(particle);
    }

    fn handle_exit(&mut self, mut particle: Particle, value: crate::store::Value) {
        particle.value = Some(value);
        particle.completed = true;
        particle.weight = particle.final_weight;
        self.completed.push(particle);
    }

    pub fn buffer_len(&self) -> usize {
        self.buffer.len()
    }

    #[cfg(test)]
    pub(crate) fn buffer(&self) -> &[Particle] {
        &self.buffer
    }
}
