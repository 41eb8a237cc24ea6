//! Core types for the trade-ingest pipeline.
//!
//! This crate defines the data model shared by every stage of the pipeline
//! (records, envelopes, delivery outcomes), the error taxonomy, and the
//! boundary traits implemented by concrete adapters:
//!
//! - [`RecordSource`] - yields records from an underlying store (CSV file, etc.)
//! - [`Serializer`] - turns one record into a wire payload
//! - [`Transport`] - delivers a payload to one broker topic
//! - [`OutcomeObserver`] - receives exactly one terminal outcome per envelope
//!
//! # Dependency Direction
//!
//! Source, transport, and publisher crates all depend on this crate, never on
//! each other. This keeps the publisher testable against in-memory fakes.

pub mod envelope;
pub mod error;
pub mod observer;
pub mod record;
pub mod serialize;
pub mod source;
pub mod transport;

pub use envelope::{Delivery, DeliveryOutcome, Envelope};
pub use error::{SerializationError, SourceReadError, TransportError, UnknownSequenceError};
pub use observer::{NoopObserver, OutcomeObserver};
pub use record::{FieldValue, Record};
pub use serialize::{JsonSerializer, Serializer};
pub use source::RecordSource;
pub use transport::Transport;
