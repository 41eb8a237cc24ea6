//! Delivery tracking and retry decisions.

use std::collections::HashMap;
use trade_ingest_core::{DeliveryOutcome, Envelope, UnknownSequenceError};

struct InFlight {
    envelope: Envelope,
    // Send attempts that have come back failed.
    failed_attempts: u32,
}

/// Verdict for a nacked envelope.
#[derive(Debug)]
pub enum NackVerdict {
    /// Attempts remain; send this envelope again.
    Retry(Envelope),
    /// Retry budget exhausted; the envelope is terminally failed.
    Terminal(DeliveryOutcome),
}

/// Maps in-flight sequence numbers to their envelopes and attempt counts.
///
/// Owned by the publisher's coordinating path; all mutation is
/// single-writer, so no interior locking is needed.
pub struct DeliveryTracker {
    in_flight: HashMap<u64, InFlight>,
    max_retries: u32,
}

impl DeliveryTracker {
    /// Tracker allowing `max_retries` retries per envelope
    /// (`max_retries + 1` total attempts).
    pub fn new(max_retries: u32) -> Self {
        Self {
            in_flight: HashMap::new(),
            max_retries,
        }
    }

    /// Start tracking an envelope about to be enqueued.
    pub fn register(&mut self, envelope: Envelope) {
        self.in_flight.insert(
            envelope.sequence,
            InFlight {
                envelope,
                failed_attempts: 0,
            },
        );
    }

    /// Mark a sequence terminally acknowledged and stop tracking it.
    pub fn record_ack(&mut self, sequence: u64) -> Result<(), UnknownSequenceError> {
        self.in_flight
            .remove(&sequence)
            .map(|_| ())
            .ok_or(UnknownSequenceError(sequence))
    }

    /// Record a failed attempt and decide between retry and terminal
    /// failure.
    pub fn record_nack(
        &mut self,
        sequence: u64,
        reason: &str,
    ) -> Result<NackVerdict, UnknownSequenceError> {
        let entry = self
            .in_flight
            .get_mut(&sequence)
            .ok_or(UnknownSequenceError(sequence))?;
        entry.failed_attempts += 1;
        if entry.failed_attempts <= self.max_retries {
            Ok(NackVerdict::Retry(entry.envelope.clone()))
        } else {
            let entry = self.in_flight.remove(&sequence).expect("entry just seen");
            Ok(NackVerdict::Terminal(DeliveryOutcome::Failed {
                reason: reason.to_string(),
                attempts: entry.failed_attempts,
            }))
        }
    }

    /// Terminally fail a sequence regardless of remaining retry budget.
    /// Used when the transport reports a fatal condition.
    pub fn record_fatal(
        &mut self,
        sequence: u64,
        reason: &str,
    ) -> Result<DeliveryOutcome, UnknownSequenceError> {
        let entry = self
            .in_flight
            .remove(&sequence)
            .ok_or(UnknownSequenceError(sequence))?;
        Ok(DeliveryOutcome::Failed {
            reason: reason.to_string(),
            attempts: entry.failed_attempts + 1,
        })
    }

    /// Stop tracking a sequence without a terminal outcome. Returns the
    /// envelope if it was in flight.
    pub fn abandon(&mut self, sequence: u64) -> Option<Envelope> {
        self.in_flight.remove(&sequence).map(|entry| entry.envelope)
    }

    /// Drop everything still in flight, returning how many envelopes were
    /// abandoned.
    pub fn abandon_all(&mut self) -> u64 {
        let abandoned = self.in_flight.len() as u64;
        self.in_flight.clear();
        abandoned
    }

    /// Number of sequences still awaiting a terminal outcome.
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    /// Whether every tracked sequence has reached a terminal outcome.
    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}
