//! # Error taxonomy
//!
//! Typed error kinds for the failure modes the pipeline distinguishes
//! between internally (is this read just invalid, or did a worker die?).
//! Call sites that need a human-readable trail still reach for
//! `anyhow::Context`; this enum exists for the handful of places that need
//! to match on *what kind* of failure occurred.
use thiserror::Error;

/// One of the failure modes described for the pipeline core.
///
/// `InvalidInput` and `TooShort` are recoverable: the offending read is
/// flagged and processing continues. The rest are fatal for the worker
/// that encountered them.
#[derive(Debug, Error)]
pub enum SeedsieveError {
    #[error("invalid input record: {0}")]
    InvalidInput(String),

    #[error("read shorter than window length ({len} < {lnwin})")]
    TooShort { len: usize, lnwin: usize },

    #[error("failed to load index part {index_num}/{part}: {reason}")]
    IndexLoad {
        index_num: usize,
        part: usize,
        reason: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("out of memory while loading index: {0}")]
    OutOfMemory(String),
}
