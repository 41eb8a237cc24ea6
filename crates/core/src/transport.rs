//! Broker transport boundary.

use crate::envelope::{Delivery, Envelope};
use crate::error::TransportError;
use async_trait::async_trait;

/// Delivers one envelope to one topic and resolves with the broker's
/// verdict.
///
/// `send` is invoked once per attempt; the publisher owns retry policy, so
/// implementations should not retry internally. Concurrent `send` calls for
/// different envelopes are expected.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Publish the envelope's payload and wait for the broker result.
    async fn send(&self, topic: &str, envelope: &Envelope) -> Result<Delivery, TransportError>;
}
