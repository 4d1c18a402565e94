//! Demonstration binary: runs the scenarios from the testable-properties
//! gallery (§8) and prints a short report for each, the way the teacher's
//! `analysis` CLI walks a fixed menu of named commands (`query.rs`).

use asmc::distributions::Bernoulli;
use asmc::distributions::Normal;
use asmc::Config;
use asmc::Context;
use asmc::Distribution;
use asmc::Model;
use asmc::Thunk;
use asmc::Value;
use clap::Parser;
use std::rc::Rc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario to run.
    #[arg(value_enum, default_value = "all")]
    scenario: Scenario,

    /// Target number of completed particles.
    #[arg(long, default_value_t = 2_000)]
    particles: usize,

    /// Buffer capacity (ρ).
    #[arg(long, default_value_t = 100)]
    buffer: usize,

    /// RNG seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Write logs to this file in addition to the terminal.
    #[arg(long)]
    log_file: Option<String>,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum Scenario {
    All,
    Coin,
    Observed,
    AllKill,
    TwoObservations,
    Chain,
    Continue,
}

fn coin() -> Thunk {
    Rc::new(|ctx: &mut Context| {
        let heads = ctx.sample(&Bernoulli { p: 0.5 });
        ctx.exit(Value::Bool(heads))
    })
}

fn observed_normal() -> Thunk {
    Rc::new(|ctx: &mut Context| {
        let prior = Normal { mean: 0.0, std: 1.0 };
        let x = ctx.sample(&prior);
        let likelihood = Normal { mean: 1.0, std: 0.5 };
        let score = likelihood.logpdf(x);
        let resume: Thunk = Rc::new(move |ctx: &mut Context| ctx.exit(Value::float(x)));
        ctx.factor(score, "obs0", resume)
    })
}

fn all_kill() -> Thunk {
    let resume: Thunk = Rc::new(|ctx: &mut Context| ctx.exit(Value::Int(0)));
    Rc::new(move |ctx: &mut Context| ctx.factor(f64::NEG_INFINITY, "obs0", Rc::clone(&resume)))
}

fn two_observations() -> Thunk {
    Rc::new(|ctx: &mut Context| {
        let prior = Normal { mean: 0.0, std: 1.0 };
        let slope = ctx.sample(&prior);
        let lik0 = Normal { mean: slope * 1.0, std: 0.3 }.logpdf(1.1);
        let resume1: Thunk = Rc::new(move |ctx: &mut Context| {
            let lik1 = Normal { mean: slope * 2.0, std: 0.3 }.logpdf(2.3);
            let resume2: Thunk = Rc::new(move |ctx: &mut Context| ctx.exit(Value::float(slope)));
            ctx.factor(lik1, "obs1", resume2)
        });
        ctx.factor(lik0, "obs0", resume1)
    })
}

fn chain_of_five() -> Thunk {
    fn step(depth: u32) -> Thunk {
        Rc::new(move |ctx: &mut Context| {
            let dist = Normal { mean: 0.0, std: 1.0 };
            let x = ctx.sample(&dist);
            let score = dist.logpdf(x);
            if depth == 0 {
                ctx.exit(Value::float(x))
            } else {
                ctx.factor(score, format!("obs{depth}"), step(depth - 1))
            }
        })
    }
    step(5)
}

fn run_scenario<M: Model>(model: M, config: Config) -> Distribution<M> {
    let bar = asmc::progress(config.num_particles);
    bar.enable_steady_tick(std::time::Duration::from_millis(120));
    let dist = asmc::run(model, config).expect("valid config");
    bar.finish_and_clear();
    dist
}

fn report<M: Model>(name: &str, dist: &Distribution<M>) {
    println!("--- {name} ---");
    println!("completed:  {}", dist.completed_count());
    println!("log Z:      {:.4}", dist.normalization_constant());
    let histogram = dist.histogram();
    let mut entries: Vec<_> = histogram.into_iter().collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    for (value, mass) in entries.into_iter().take(5) {
        println!("  {value:?}: {mass:.4}");
    }
    println!();
}

fn main() {
    let args = Args::parse();
    asmc::init_logging(args.log_file.as_deref());
    let config = Config::new(args.particles, args.buffer).with_seed(args.seed);

    let run_coin = matches!(args.scenario, Scenario::All | Scenario::Coin);
    let run_observed = matches!(args.scenario, Scenario::All | Scenario::Observed);
    let run_all_kill = matches!(args.scenario, Scenario::All | Scenario::AllKill);
    let run_two_obs = matches!(args.scenario, Scenario::All | Scenario::TwoObservations);
    let run_chain = matches!(args.scenario, Scenario::All | Scenario::Chain);
    let run_continue = matches!(args.scenario, Scenario::All | Scenario::Continue);

    if run_coin {
        let dist = run_scenario(coin, config);
        report("trivial coin", &dist);
    }
    if run_observed {
        let dist = run_scenario(observed_normal, config);
        report("single observation", &dist);
    }
    if run_all_kill {
        let dist = run_scenario(all_kill, config);
        report("all particles killed at obs0", &dist);
    }
    if run_two_obs {
        let dist = run_scenario(two_observations, config);
        report("two observations", &dist);
    }
    if run_chain {
        let dist = run_scenario(chain_of_five, config);
        report("chain of five factors", &dist);
    }
    if run_continue {
        let dist = run_scenario(coin, config);
        report("coin (before continue)", &dist);
        let dist = dist.extend(config.num_particles);
        report("coin (after continue)", &dist);
    }
}
