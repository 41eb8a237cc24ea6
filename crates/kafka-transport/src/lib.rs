//! Kafka transport for trade-ingest.
//!
//! Wraps an rdkafka [`FutureProducer`] behind the
//! [`trade_ingest_core::Transport`] trait. Each `send` is one delivery
//! attempt; retry policy lives in the publisher, so the producer is
//! configured without internal retries beyond librdkafka's own queuing.
//!
//! Broker errors are classified into retryable
//! ([`TransportError::Delivery`]) and fatal ([`TransportError::Fatal`])
//! conditions; authentication failures and unknown topics halt the run
//! instead of burning the retry budget.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::KafkaError;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::types::RDKafkaErrorCode;
use rdkafka::ClientConfig;
use trade_ingest_core::{Delivery, Envelope, Transport, TransportError};

/// Default per-message broker timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Kafka implementation of the broker transport boundary.
pub struct KafkaTransport {
    producer: FutureProducer,
    brokers: String,
    send_timeout: Duration,
}

impl KafkaTransport {
    /// Create a producer connected to the given brokers.
    pub fn connect(brokers: &str) -> Result<Self, TransportError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set(
                "message.timeout.ms",
                DEFAULT_SEND_TIMEOUT.as_millis().to_string(),
            )
            .create()
            .map_err(|e| TransportError::Fatal(format!("failed to create Kafka producer: {e}")))?;

        Ok(Self {
            producer,
            brokers: brokers.to_string(),
            send_timeout: DEFAULT_SEND_TIMEOUT,
        })
    }

    /// Override the per-message broker timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Create the topic if it doesn't exist.
    pub async fn create_topic_if_not_exists(&self, topic: &str, partitions: i32) -> Result<()> {
        let admin_client: AdminClient<DefaultClientContext> = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .create()
            .context("Failed to create admin client")?;

        let new_topic = NewTopic::new(topic, partitions, TopicReplication::Fixed(1));
        let opts = AdminOptions::new().operation_timeout(Some(Duration::from_secs(5)));

        let results = admin_client
            .create_topics(&[new_topic], &opts)
            .await
            .context("Failed to create topics")?;
        for result in results {
            match result {
                Ok(topic_name) => {
                    tracing::info!("Topic '{topic_name}' created successfully");
                }
                Err((topic_name, err)) => {
                    if err.to_string().contains("already exists") {
                        tracing::info!("Topic '{topic_name}' already exists");
                    } else {
                        return Err(anyhow::anyhow!("Failed to create topic: {err}"));
                    }
                }
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Transport for KafkaTransport {
    async fn send(&self, topic: &str, envelope: &Envelope) -> Result<Delivery, TransportError> {
        // Messages carry no key; partition assignment is the broker's call.
        let record = FutureRecord::<(), _>::to(topic).payload(envelope.payload.as_ref());
        match self.producer.send(record, self.send_timeout).await {
            Ok((partition, offset)) => {
                tracing::trace!(sequence = envelope.sequence, partition, offset, "delivered");
                Ok(Delivery { partition, offset })
            }
            Err((err, _)) => Err(classify(err)),
        }
    }
}

/// Split broker errors into retryable and run-halting conditions.
fn classify(err: KafkaError) -> TransportError {
    match err.rdkafka_error_code() {
        Some(
            RDKafkaErrorCode::Authentication
            | RDKafkaErrorCode::SaslAuthenticationFailed
            | RDKafkaErrorCode::TopicAuthorizationFailed
            | RDKafkaErrorCode::GroupAuthorizationFailed
            | RDKafkaErrorCode::ClusterAuthorizationFailed
            | RDKafkaErrorCode::UnknownTopic
            | RDKafkaErrorCode::UnknownTopicOrPartition,
        ) => TransportError::Fatal(err.to_string()),
        _ => TransportError::Delivery(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        for code in [
            RDKafkaErrorCode::QueueFull,
            RDKafkaErrorCode::MessageTimedOut,
            RDKafkaErrorCode::BrokerTransportFailure,
        ] {
            let classified = classify(KafkaError::MessageProduction(code));
            assert!(!classified.is_fatal(), "{code} should be retryable");
        }
    }

    #[test]
    fn test_auth_and_topic_errors_are_fatal() {
        for code in [
            RDKafkaErrorCode::SaslAuthenticationFailed,
            RDKafkaErrorCode::TopicAuthorizationFailed,
            RDKafkaErrorCode::UnknownTopicOrPartition,
        ] {
            let classified = classify(KafkaError::MessageProduction(code));
            assert!(classified.is_fatal(), "{code} should be fatal");
        }
    }
}
