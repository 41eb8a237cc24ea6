//! trade-ingest library.
//!
//! A pipeline for publishing tabular trade records to a Kafka topic with
//! demand-driven backpressure and at-least-once delivery:
//!
//! - Bounded publish queue: producers block when the broker falls behind
//! - Delivery tracking: every record reaches exactly one terminal outcome
//! - Bounded retries: nacked records are re-sent up to a configurable limit
//! - Cooperative cancellation with a bounded drain for in-flight deliveries
//!
//! # Pipeline Crates
//!
//! - `trade-ingest-core` - data model and boundary traits
//! - `trade-ingest-csv-source` - CSV-backed record source
//! - `trade-ingest-publisher` - queue, tracker, and the publisher run
//! - `trade-ingest-kafka-transport` - rdkafka transport adapter

use tracing::{debug, warn};

// Re-export pipeline crates for convenience
pub use trade_ingest_csv_source as csv;
pub use trade_ingest_kafka_transport as kafka;
pub use trade_ingest_publisher as publisher;

pub use trade_ingest_core::{
    Delivery, DeliveryOutcome, Envelope, FieldValue, JsonSerializer, OutcomeObserver, Record,
    RecordSource, Serializer, Transport, TransportError,
};
pub use trade_ingest_csv_source::{CsvRecordSource, CsvSourceOptions};
pub use trade_ingest_kafka_transport::KafkaTransport;
pub use trade_ingest_publisher::{
    Publisher, PublisherConfig, PublisherState, RunPhase, RunSummary, SourceErrorPolicy,
};

/// Observer that logs each terminal outcome, off the delivery hot path.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl OutcomeObserver for LogObserver {
    fn on_outcome(&self, sequence: u64, outcome: &DeliveryOutcome) {
        match outcome {
            DeliveryOutcome::Acknowledged {
                topic,
                partition,
                offset,
            } => {
                debug!(sequence, topic = %topic, partition, offset, "delivered");
            }
            DeliveryOutcome::Failed { reason, attempts } => {
                warn!(sequence, attempts, reason = %reason, "delivery failed");
            }
        }
    }
}

/// Map a run summary to the process exit code: 0 for a clean completion,
/// 1 for a completion with failed records, 2 for a cancelled run.
pub fn exit_code(summary: &RunSummary) -> i32 {
    match summary.phase {
        RunPhase::Completed if summary.state.failed == 0 => 0,
        RunPhase::Completed => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(phase: RunPhase, failed: u64) -> RunSummary {
        RunSummary {
            phase,
            state: PublisherState {
                failed,
                ..Default::default()
            },
            unprocessed: 0,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&summary(RunPhase::Completed, 0)), 0);
        assert_eq!(exit_code(&summary(RunPhase::Completed, 2)), 1);
        assert_eq!(exit_code(&summary(RunPhase::Cancelled, 0)), 2);
    }
}
