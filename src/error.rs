//! Crate-wide error surface.
//!
//! Grounded in `pineappl::error`: a thin `thiserror` enum for errors that
//! originate inside this crate, plus a transparent variant for whatever
//! model code throws at us.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// `numParticles` or `bufferSize` was non-positive.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// Model code raised an error while resuming; we do not catch and retry.
    #[error(transparent)]
    Model(#[from] anyhow::Error),
    /// Every completed particle has `-inf` weight. Not a hard failure: the
    /// aggregator still returns a distribution (with `normalizationConstant
    /// = -inf`) rather than propagating this as `Err`; it exists so callers
    /// who want to distinguish degeneracy from a healthy empty run can.
    #[error("all completed particles have -inf weight")]
    NumericDegenerate,
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
