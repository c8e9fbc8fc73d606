//! Error types at the MAC's fallible seams.
//!
//! Per the error handling design: transient contention, radio timeouts,
//! and decode failures are absorbed internally and never surfaced as
//! errors (see [`crate::mac::SendResult`] and [`crate::stats::Stats`]).
//! Only construction-time and payload-validity failures are errors.

use core::fmt;

/// Returned by [`crate::config::MacConfig::validate`] and, transitively,
/// by [`crate::mac::MacCore::new`]. A node starts with a config it can
/// actually honor, or it does not start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum ConfigError {
    /// `phase2_probability` was outside `(0.0, 1.0]`.
    PhaseTwoProbabilityOutOfRange,
    /// `difs_ms` was zero; every backoff is scaled from this unit, so zero
    /// collapses all protocol timing to nothing.
    DifsNotPositive,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PhaseTwoProbabilityOutOfRange => {
                write!(f, "phase2_probability must be in (0.0, 1.0]")
            }
            Self::DifsNotPositive => write!(f, "difs_ms must be positive"),
        }
    }
}

/// Returned by [`crate::mac::MacCore::send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, defmt::Format)]
pub enum MacError {
    /// The payload exceeds the 255-byte limit a single explicit-header
    /// frame can carry.
    PayloadTooLarge { len: usize },
}

impl fmt::Display for MacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge { len } => {
                write!(f, "payload of {len} bytes exceeds the 255-byte frame limit")
            }
        }
    }
}
