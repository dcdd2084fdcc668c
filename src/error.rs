//! Crate-wide error taxonomy.
//!
//! Every fallible operation in this crate returns [`Result<T>`], an alias
//! over [`GicsError`]. Variants are non-overlapping by design: callers can
//! match on the kind to decide whether a failure is a corruption signal
//! (`Integrity`), a short buffer (`IncompleteData`), a resource cap
//! (`LimitExceeded`), an unreadable future format (`VersionMismatch`), or
//! anything else (`Other`). Every message is deterministic — no addresses,
//! timestamps, or thread ids are ever embedded, so two runs over the same
//! bad input produce byte-identical error text.

use core::fmt;

/// The crate's standard result alias.
pub type Result<T> = std::result::Result<T, GicsError>;

/// Unified error type for encoding, decoding, and verification failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GicsError {
    /// CRC mismatch, hash-chain mismatch, GCM authentication failure,
    /// cross-stream length mismatch, magic/version mismatch, or wrong
    /// password.
    Integrity(String),
    /// Truncated varint, a block header that runs past the buffer end,
    /// a missing EOS record, or a segment whose declared length exceeds
    /// the remaining input.
    IncompleteData(String),
    /// A resource cap was exceeded: block size, RLE run length, segment
    /// size, file size, or the decompression-bomb guard.
    LimitExceeded(String),
    /// The file declares a future major version this decoder cannot read.
    VersionMismatch(String),
    /// Any other, unclassified failure.
    Other(String),
}

impl GicsError {
    pub(crate) fn integrity(msg: impl Into<String>) -> Self {
        GicsError::Integrity(msg.into())
    }

    pub(crate) fn incomplete(msg: impl Into<String>) -> Self {
        GicsError::IncompleteData(msg.into())
    }

    pub(crate) fn limit(msg: impl Into<String>) -> Self {
        GicsError::LimitExceeded(msg.into())
    }

    pub(crate) fn version(msg: impl Into<String>) -> Self {
        GicsError::VersionMismatch(msg.into())
    }

    pub(crate) fn other(msg: impl Into<String>) -> Self {
        GicsError::Other(msg.into())
    }

    /// `true` for [`GicsError::Integrity`]; used by `Decoder::verify`, which
    /// never propagates errors and instead reduces every failure to a bool.
    pub fn is_integrity(&self) -> bool {
        matches!(self, GicsError::Integrity(_))
    }
}

impl fmt::Display for GicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GicsError::Integrity(msg) => write!(f, "integrity error: {msg}"),
            GicsError::IncompleteData(msg) => write!(f, "incomplete data: {msg}"),
            GicsError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            GicsError::VersionMismatch(msg) => write!(f, "version mismatch: {msg}"),
            GicsError::Other(msg) => write!(f, "gics error: {msg}"),
        }
    }
}

impl std::error::Error for GicsError {}
