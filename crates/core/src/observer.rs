//! Terminal outcome observer.

use crate::envelope::DeliveryOutcome;

/// Receives exactly one terminal outcome per envelope.
///
/// This is the sole externally visible per-record signal; it is invoked from
/// the publisher's coordinating path, so implementations should be cheap and
/// must not block.
pub trait OutcomeObserver: Send + Sync {
    /// Called once when `sequence` reaches its terminal outcome.
    fn on_outcome(&self, sequence: u64, outcome: &DeliveryOutcome);
}

/// Observer that ignores all outcomes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl OutcomeObserver for NoopObserver {
    fn on_outcome(&self, _sequence: u64, _outcome: &DeliveryOutcome) {}
}
