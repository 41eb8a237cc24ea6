//! Bounded publish queue with delivery credits.
//!
//! Capacity is accounted in *delivery credits*, not queue slots: `enqueue`
//! takes a credit that stays taken while the envelope is queued, in flight,
//! and across retries, and is returned only when the envelope reaches a
//! terminal outcome. A transport that stops acknowledging therefore stalls
//! the producer after `capacity` records even though the drain lane dequeues
//! eagerly. `requeue` (the retry path) re-uses the credit its envelope
//! already holds, so ack processing never waits behind production.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use thiserror::Error;
use tokio::sync::Semaphore;
use trade_ingest_core::Envelope;

/// `enqueue` was called after [`PublishQueue::close`] or
/// [`PublishQueue::shutdown`].
#[derive(Error, Debug, PartialEq, Eq)]
#[error("publish queue is closed")]
pub struct QueueClosed;

/// Bounded FIFO of envelopes awaiting their first or next delivery attempt.
pub struct PublishQueue {
    items: Mutex<VecDeque<Envelope>>,
    // One permit per queued envelope.
    ready: Semaphore,
    // Delivery credits; held from enqueue until terminal outcome.
    credits: Semaphore,
    closed: AtomicBool,
}

impl PublishQueue {
    /// Create a queue with the given delivery-credit budget.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "publish queue capacity must be non-zero");
        Self {
            items: Mutex::new(VecDeque::with_capacity(capacity)),
            ready: Semaphore::new(0),
            credits: Semaphore::new(capacity),
            closed: AtomicBool::new(false),
        }
    }

    /// Take a delivery credit and append the envelope.
    ///
    /// Suspends while no credit is free; this is the producer's backpressure
    /// point. Fails once the queue is closed.
    pub async fn enqueue(&self, envelope: Envelope) -> Result<(), QueueClosed> {
        if self.closed.load(Ordering::Acquire) {
            return Err(QueueClosed);
        }
        match self.credits.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return Err(QueueClosed),
        }
        if self.closed.load(Ordering::Acquire) {
            self.credits.add_permits(1);
            return Err(QueueClosed);
        }
        self.items.lock().unwrap().push_back(envelope);
        self.ready.add_permits(1);
        Ok(())
    }

    /// Re-append a nacked envelope for another attempt.
    ///
    /// The envelope's credit is still held, so this never suspends and works
    /// after `close`.
    pub fn requeue(&self, envelope: Envelope) {
        self.items.lock().unwrap().push_back(envelope);
        self.ready.add_permits(1);
    }

    /// Pop the next envelope, suspending while the queue is empty.
    ///
    /// Returns `None` after [`PublishQueue::shutdown`].
    pub async fn dequeue(&self) -> Option<Envelope> {
        match self.ready.acquire().await {
            Ok(permit) => permit.forget(),
            Err(_) => return None,
        }
        self.items.lock().unwrap().pop_front()
    }

    /// Return one delivery credit after an envelope reached its terminal
    /// outcome.
    pub fn release_credit(&self) {
        self.credits.add_permits(1);
    }

    /// Reject further `enqueue` calls; queued envelopes still drain.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    /// Close the queue and wake all waiters; `dequeue` returns `None` from
    /// here on.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        self.ready.close();
        self.credits.close();
    }

    /// Remove and return every still-queued envelope. Used at forced
    /// cancellation to account for envelopes that never reached the
    /// transport.
    pub fn drain_items(&self) -> Vec<Envelope> {
        self.items.lock().unwrap().drain(..).collect()
    }

    /// Number of queued envelopes.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}
