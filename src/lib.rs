//! Asynchronous anytime sequential Monte Carlo (aSMC) inference for
//! probabilistic programs.
//!
//! The engine runs a model reified as a resumable continuation (§6): it
//! maintains a bounded buffer of suspended particles, decides per-step
//! whether to resume a buffered particle or seed a fresh one, and at
//! every observation boundary applies an online resampling policy so
//! that the whole run approximates synchronous SMC without a global
//! barrier (§4.3, §4.4).
//!
//! ```
//! use asmc::{Config, Context, Distribution, Thunk, Value};
//! use asmc::distributions::Bernoulli;
//! use std::rc::Rc;
//!
//! fn coin() -> Thunk {
//!     Rc::new(|ctx: &mut Context| {
//!         let heads = ctx.sample(&Bernoulli { p: 0.5 });
//!         ctx.exit(Value::Bool(heads))
//!     })
//! }
//!
//! let dist: Distribution<_> = asmc::run(coin, Config::new(1000, 50)).unwrap();
//! assert!((dist.score(&Value::Bool(true)) - 0.5).abs() < 0.1);
//! ```

pub mod aggregator;
pub mod config;
pub mod distributions;
pub mod error;
pub mod ledger;
pub mod model;
pub mod numeric;
pub mod particle;
pub mod scheduler;
pub mod store;

pub use aggregator::Distribution;
pub use config::Config;
pub use error::Error;
pub use error::Result;
pub use model::Model;
pub use particle::Context;
pub use particle::Step;
pub use particle::Thunk;
pub use scheduler::Scheduler;
pub use store::Address;
pub use store::Store;
pub use store::Value;

/// Every weight in this crate is a natural log.
pub type LogWeight = f64;

/// Random fixture generation for property-style tests, mirrored from the
/// teacher's own `Arbitrary` trait (`robopoker::Arbitrary`) rather than
/// pulling in `proptest`/`quickcheck`.
pub trait Arbitrary {
    fn random() -> Self;
}

/// Entry point (§6): `aSMC(model, config)`. Validates the configuration,
/// drives the scheduler to the requested budget, and hands back the
/// resulting empirical distribution.
pub fn run<M: Model>(model: M, config: Config) -> Result<Distribution<M>> {
    config.validate()?;
    let mut scheduler = Scheduler::new(model, config);
    scheduler.run();
    Ok(Distribution::new(scheduler))
}

/// A progress bar ticking toward `n` completed particles, the way
/// `robopoker::progress()` sizes one to a known unit count for its own
/// binaries. Library code never calls this itself; the demonstration
/// binary advances it once per completed particle.
#[cfg(feature = "cli")]
pub fn progress(n: usize) -> indicatif::ProgressBar {
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan} {pos}/{len}";
    let style = indicatif::ProgressStyle::with_template(style).unwrap();
    let bar = indicatif::ProgressBar::new(n as u64);
    bar.set_style(style);
    bar
}

/// Install the default terminal+file logger for a run. Library code never
/// calls this itself (§4.7); it exists for the demonstration binary, the
/// way `robopoker::init()` sets up `simplelog` for its own binaries.
#[cfg(feature = "cli")]
pub fn init_logging(log_file: Option<&str>) {
    match log_file {
        None => {
            env_logger::Builder::from_default_env()
                .filter_level(log::LevelFilter::Info)
                .init();
        }
        Some(path) => {
            let config = simplelog::ConfigBuilder::new()
                .set_location_level(log::LevelFilter::Off)
                .set_target_level(log::LevelFilter::Off)
                .build();
            let term = simplelog::TermLogger::new(
                log::LevelFilter::Info,
                config.clone(),
                simplelog::TerminalMode::Mixed,
                simplelog::ColorChoice::Auto,
            );
            let file = simplelog::WriteLogger::new(
                log::LevelFilter::Debug,
                config,
                std::fs::File::create(path).expect("create log file"),
            );
            simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use distributions::Bernoulli;
    use std::rc::Rc;

    fn coin() -> Thunk {
        Rc::new(|ctx: &mut Context| {
            let heads = ctx.sample(&Bernoulli { p: 0.5 });
            ctx.exit(Value::Bool(heads))
        })
    }

    #[test]
    fn rejects_invalid_config_before_stepping() {
        let err = run(coin, Config::new(0, 10));
        assert!(err.is_err());
    }

    #[test]
    fn end_to_end_trivial_model() {
        let dist = run(coin, Config::new(2000, 50).with_seed(99)).unwrap();
        assert_eq!(dist.completed_count(), 2000);
        let heads = dist.score(&Value::Bool(true));
        assert!((heads - 0.5).abs() < 0.05);
    }
}
