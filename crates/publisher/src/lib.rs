//! Publisher pipeline for trade-ingest.
//!
//! This crate turns a [`trade_ingest_core::RecordSource`] and a
//! [`trade_ingest_core::Transport`] into an at-least-once publishing run:
//!
//! - [`PublishQueue`] - bounded FIFO whose capacity is a delivery-credit
//!   budget; taking a credit at enqueue and returning it only at the terminal
//!   outcome is what makes producers block instead of outrunning the broker
//! - [`DeliveryTracker`] - in-flight map correlating broker results back to
//!   envelopes and deciding retry vs. terminal failure
//! - [`Publisher`] - the run itself: production lane, transport drain lane,
//!   and a single-writer coordinator event loop
//!
//! # Run lifecycle
//!
//! `Idle -> Running -> Draining -> Completed`, with `-> Cancelled` from any
//! live phase on explicit cancellation or a fatal transport error. Aggregate
//! counters are reported once, in the [`RunSummary`], after the terminal
//! phase is reached.

pub mod config;
pub mod publisher;
pub mod queue;
pub mod state;
pub mod tracker;

pub use config::{
    PublisherConfig, SourceErrorPolicy, DEFAULT_DRAIN_TIMEOUT, DEFAULT_MAX_RETRIES,
    DEFAULT_QUEUE_CAPACITY,
};
pub use publisher::Publisher;
pub use queue::{PublishQueue, QueueClosed};
pub use state::{PublisherState, RunPhase, RunSummary};
pub use tracker::{DeliveryTracker, NackVerdict};
