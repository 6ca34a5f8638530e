//! Error types shared across the crate.
//!
//! The taxonomy is small and deliberate:
//! - configuration problems (`NoSlots`, `ZeroRunLength`, `Generator`) are
//!   rejected before or instead of touching any sink,
//! - `Usage` marks a violated contract precondition and is never retried,
//! - `Io` wraps a failed resource operation and propagates to the caller
//!   untouched: the sampler does not retry, swallow, or log it.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by sinks, filers, and the run-reservoir sampler.
#[derive(Debug, Error)]
pub enum Error {
    /// A sampler was configured with zero slots.
    #[error("at least one slot is required")]
    NoSlots,

    /// A slot was configured with a run length of zero.
    #[error("slot {slot} has run length 0; run lengths must be >= 1")]
    ZeroRunLength { slot: usize },

    /// The supplied random generator returned a value outside `[0, bound)`.
    ///
    /// Checked on every draw, so a malformed generator cannot silently bias
    /// or corrupt slot selection.
    #[error("random generator returned {drawn}, expected a value in [0, {bound})")]
    Generator { drawn: usize, bound: usize },

    /// A contract precondition was violated by the caller.
    #[error("contract violation: {0}")]
    Usage(&'static str),

    /// An underlying resource operation failed.
    #[error("resource error")]
    Io(#[from] std::io::Error),
}
