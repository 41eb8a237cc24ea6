//! Envelopes and delivery outcomes.

use bytes::Bytes;

/// A serialized record queued for delivery.
///
/// `sequence` is unique and strictly increasing per run and is the handle
/// used to correlate asynchronous broker results back to the originating
/// record; `row` points back at the source row for diagnostics. The payload
/// is reference-counted so the delivery tracker can keep a retry copy
/// without duplicating the bytes handed to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Per-run sequence number, assigned at record-read time.
    pub sequence: u64,
    /// Source row index of the originating record.
    pub row: u64,
    /// Wire payload.
    pub payload: Bytes,
}

/// Broker confirmation data for one successful delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Partition the message landed on.
    pub partition: i32,
    /// Offset within the partition.
    pub offset: i64,
}

/// Terminal result of one envelope. Emitted exactly once; no further state
/// change occurs after it.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// The broker confirmed the message.
    Acknowledged {
        /// Topic the message was published to.
        topic: String,
        /// Partition the message landed on.
        partition: i32,
        /// Offset within the partition.
        offset: i64,
    },
    /// The envelope exhausted its attempts or could not be serialized.
    Failed {
        /// Reason from the last failed attempt.
        reason: String,
        /// Total send attempts made (0 for serialization failures).
        attempts: u32,
    },
}

impl DeliveryOutcome {
    /// Whether this outcome is an acknowledgment.
    pub fn is_acknowledged(&self) -> bool {
        matches!(self, Self::Acknowledged { .. })
    }
}
