//! Error taxonomy for the pipeline.
//!
//! Per-record errors ([`SourceReadError`], [`SerializationError`]) never
//! abort a run on their own; [`TransportError::Fatal`] and explicit
//! cancellation do. [`UnknownSequenceError`] is a defensive check against
//! transport bugs and is logged, never propagated.

use thiserror::Error;

/// A source row could not be read or parsed.
///
/// Carries the row index for diagnostics. The source itself stays usable;
/// the caller decides whether to skip the row or halt the run.
#[derive(Error, Debug)]
#[error("failed to read source row {row}: {message}")]
pub struct SourceReadError {
    /// 0-based index of the offending row.
    pub row: u64,
    /// Underlying parse failure.
    pub message: String,
}

/// A record could not be encoded into a wire payload.
#[derive(Error, Debug)]
#[error("failed to serialize record at row {row}: {message}")]
pub struct SerializationError {
    /// Source row of the offending record.
    pub row: u64,
    /// Underlying encoder failure.
    pub message: String,
}

/// A delivery attempt failed.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Per-attempt failure; the delivery tracker decides whether to retry.
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// Unrecoverable transport condition (authentication failure, unknown
    /// topic). Halts the publisher.
    #[error("fatal transport error: {0}")]
    Fatal(String),
}

impl TransportError {
    /// Whether this error halts the run instead of triggering retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }
}

/// An acknowledgment or failure arrived for a sequence that is not in
/// flight.
#[derive(Error, Debug, PartialEq, Eq)]
#[error("no in-flight envelope for sequence {0}")]
pub struct UnknownSequenceError(pub u64);
