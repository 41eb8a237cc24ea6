//! Publisher configuration.

use std::time::Duration;

/// Default delivery-credit budget of the publish queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1000;

/// Default maximum delivery retries per envelope.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default time to wait for in-flight deliveries on cancellation.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when a source row cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceErrorPolicy {
    /// Log the row and continue with the next one.
    #[default]
    Skip,
    /// Stop issuing records and cancel the run.
    Halt,
}

/// Configuration for one publisher run.
///
/// The defaults are tunable knobs, not protocol constants; the CLI exposes
/// all of them.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Target topic.
    pub topic: String,
    /// Delivery-credit budget (bounded queue capacity).
    pub queue_capacity: usize,
    /// Maximum retries per envelope; total attempts are `max_retries + 1`.
    pub max_retries: u32,
    /// How long a cancelled run waits for in-flight deliveries.
    pub drain_timeout: Duration,
    /// Skip-or-halt policy for unreadable source rows.
    pub on_source_error: SourceErrorPolicy,
}

impl PublisherConfig {
    /// Configuration with defaults for the given topic.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_retries: DEFAULT_MAX_RETRIES,
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
            on_source_error: SourceErrorPolicy::default(),
        }
    }

    /// Set the delivery-credit budget.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the maximum retries per envelope.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the cancellation drain timeout.
    pub fn with_drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    /// Set the source error policy.
    pub fn with_source_error_policy(mut self, policy: SourceErrorPolicy) -> Self {
        self.on_source_error = policy;
        self
    }
}
