//! The publisher run: production lane, drain lane, coordinator.
//!
//! Two logical lanes run concurrently. The production lane reads records,
//! assigns sequence numbers, serializes, and enqueues; the drain lane pulls
//! envelopes off the queue and issues one transport send per attempt. Both
//! report into a single FIFO event channel consumed by the coordinator,
//! which is the only writer of the tracker and counters. Channel order
//! guarantees that a sequence's registration is processed before any
//! delivery result for it.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use trade_ingest_core::{
    Delivery, DeliveryOutcome, Envelope, JsonSerializer, NoopObserver, OutcomeObserver,
    RecordSource, Serializer, Transport, TransportError,
};

use crate::config::{PublisherConfig, SourceErrorPolicy};
use crate::queue::PublishQueue;
use crate::state::{PublisherState, RunPhase, RunSummary};
use crate::tracker::{DeliveryTracker, NackVerdict};

/// Events flowing from the lanes into the coordinator.
enum Event {
    /// A record was read and its envelope is about to be enqueued.
    Registered { envelope: Envelope },
    /// A record was read but could not be serialized.
    SerializeFailed {
        sequence: u64,
        row: u64,
        reason: String,
    },
    /// A source row could not be read (already logged by the lane).
    SourceError,
    /// The source is exhausted, or the halt policy stopped it.
    SourceDone { halted: bool },
    /// A transport attempt resolved.
    DeliveryResult {
        sequence: u64,
        result: Result<Delivery, TransportError>,
    },
}

/// Orchestrates one record-to-topic publishing run.
///
/// Construct with [`Publisher::new`], optionally swap the serializer or
/// observer, then call [`Publisher::run`] once.
pub struct Publisher<S> {
    source: S,
    serializer: Arc<dyn Serializer>,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn OutcomeObserver>,
    config: PublisherConfig,
}

impl<S: RecordSource + 'static> Publisher<S> {
    /// Publisher over the given source and transport, with the JSON
    /// serializer and no observer.
    pub fn new(source: S, transport: Arc<dyn Transport>, config: PublisherConfig) -> Self {
        Self {
            source,
            serializer: Arc::new(JsonSerializer),
            transport,
            observer: Arc::new(NoopObserver),
            config,
        }
    }

    /// Replace the serializer.
    pub fn with_serializer(mut self, serializer: Arc<dyn Serializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Set the terminal outcome observer.
    pub fn with_observer(mut self, observer: Arc<dyn OutcomeObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Run the pipeline to a terminal phase.
    ///
    /// Cancelling `cancel` stops record issuance within one record's
    /// processing latency; in-flight deliveries are then awaited up to the
    /// configured drain timeout.
    pub async fn run(self, cancel: CancellationToken) -> RunSummary {
        let Publisher {
            source,
            serializer,
            transport,
            observer,
            config,
        } = self;

        info!(
            topic = %config.topic,
            queue_capacity = config.queue_capacity,
            max_retries = config.max_retries,
            "publisher starting"
        );

        let queue = Arc::new(PublishQueue::new(config.queue_capacity));
        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let lane_cancel = cancel.child_token();

        let mut co = Coordinator {
            tracker: DeliveryTracker::new(config.max_retries),
            state: PublisherState::default(),
            observer,
            queue: Arc::clone(&queue),
            topic: config.topic.clone(),
            phase: RunPhase::Idle,
            source_done: false,
            halt: false,
            cancelling: false,
            unprocessed: 0,
        };

        let mut producer = spawn_production_lane(
            source,
            serializer,
            Arc::clone(&queue),
            events_tx.clone(),
            lane_cancel.clone(),
            config.on_source_error,
        );
        let drain = spawn_drain_lane(
            Arc::clone(&queue),
            transport,
            config.topic.clone(),
            events_tx.clone(),
        );
        drop(events_tx);

        // Both lanes are up; the run is live.
        co.phase = RunPhase::Running;

        let completed = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("cancellation requested");
                    break false;
                }
                event = events_rx.recv() => match event {
                    Some(event) => co.handle(event),
                    None => break co.source_done && co.tracker.is_empty(),
                },
            }
            if co.halt {
                break false;
            }
            if co.source_done && co.tracker.is_empty() {
                break true;
            }
        };

        if completed {
            co.phase = RunPhase::Completed;
            queue.shutdown();
            lane_cancel.cancel();
            let _ = drain.await;
            let _ = producer.await;
        } else {
            co.cancelling = true;
            lane_cancel.cancel();
            queue.shutdown();

            // The production lane exits at its next cancellation check and
            // reports how many records a finite source still held.
            let unread = match tokio::time::timeout(config.drain_timeout, &mut producer).await {
                Ok(Ok(unread)) => unread,
                _ => {
                    producer.abort();
                    0
                }
            };

            // Events the lanes queued before noticing the cancellation still
            // count; a serialize failure in that window must still reach its
            // terminal outcome.
            while let Ok(event) = events_rx.try_recv() {
                co.handle(event);
            }

            // Envelopes still queued never reached the transport; no outcome
            // will arrive for them.
            for envelope in queue.drain_items() {
                if co.tracker.abandon(envelope.sequence).is_some() {
                    co.unprocessed += 1;
                }
            }

            let drained = tokio::time::timeout(config.drain_timeout, async {
                while !co.tracker.is_empty() {
                    match events_rx.recv().await {
                        Some(event) => co.handle(event),
                        None => break,
                    }
                }
            })
            .await;
            if drained.is_err() {
                warn!(
                    in_flight = co.tracker.len(),
                    "drain timeout elapsed with deliveries still in flight"
                );
            }
            co.unprocessed += co.tracker.abandon_all();
            co.unprocessed += unread;
            co.phase = RunPhase::Cancelled;
            drain.abort();
        }

        info!(
            phase = %co.phase,
            records_read = co.state.records_read,
            acknowledged = co.state.acknowledged,
            failed = co.state.failed,
            retried = co.state.retried,
            source_errors = co.state.source_errors,
            unprocessed = co.unprocessed,
            "publisher finished"
        );

        RunSummary {
            phase: co.phase,
            state: co.state,
            unprocessed: co.unprocessed,
        }
    }
}

/// Reads records, assigns sequences, serializes, and enqueues.
///
/// Resolves with the number of records the source still held when the lane
/// stopped early (cancellation or halt policy); zero once the source ran
/// dry. Sources without a size hint report zero.
fn spawn_production_lane<S: RecordSource + 'static>(
    mut source: S,
    serializer: Arc<dyn Serializer>,
    queue: Arc<PublishQueue>,
    events: mpsc::UnboundedSender<Event>,
    cancel: CancellationToken,
    policy: SourceErrorPolicy,
) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut sequence: u64 = 0;
        loop {
            // Cancellation is checked between record reads.
            if cancel.is_cancelled() {
                return source.remaining().unwrap_or(0);
            }
            match source.next_record() {
                Ok(Some(record)) => {
                    let assigned = sequence;
                    sequence += 1;
                    match serializer.encode(&record) {
                        Ok(payload) => {
                            let envelope = Envelope {
                                sequence: assigned,
                                row: record.row(),
                                payload,
                            };
                            // Registration must be visible to the coordinator
                            // before any delivery result for this sequence.
                            if events
                                .send(Event::Registered {
                                    envelope: envelope.clone(),
                                })
                                .is_err()
                            {
                                return source.remaining().unwrap_or(0);
                            }
                            tokio::select! {
                                result = queue.enqueue(envelope) => {
                                    if result.is_err() {
                                        return source.remaining().unwrap_or(0);
                                    }
                                }
                                _ = cancel.cancelled() => {
                                    return source.remaining().unwrap_or(0);
                                }
                            }
                        }
                        Err(err) => {
                            let _ = events.send(Event::SerializeFailed {
                                sequence: assigned,
                                row: record.row(),
                                reason: err.to_string(),
                            });
                        }
                    }
                }
                Ok(None) => {
                    if cancel.is_cancelled() {
                        // The source stopped because the run was cancelled,
                        // not because it ran dry.
                        return source.remaining().unwrap_or(0);
                    }
                    debug!(records = sequence, "source exhausted");
                    let _ = events.send(Event::SourceDone { halted: false });
                    return 0;
                }
                Err(err) => {
                    warn!(row = err.row, error = %err, "unreadable source row");
                    let _ = events.send(Event::SourceError);
                    if policy == SourceErrorPolicy::Halt {
                        let _ = events.send(Event::SourceDone { halted: true });
                        return source.remaining().unwrap_or(0);
                    }
                }
            }
        }
    })
}

/// Dequeues envelopes and issues one transport send per attempt.
fn spawn_drain_lane(
    queue: Arc<PublishQueue>,
    transport: Arc<dyn Transport>,
    topic: String,
    events: mpsc::UnboundedSender<Event>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(envelope) = queue.dequeue().await {
            let transport = Arc::clone(&transport);
            let events = events.clone();
            let topic = topic.clone();
            // One task per attempt so a slow broker response never blocks
            // the next dequeue.
            tokio::spawn(async move {
                let sequence = envelope.sequence;
                let result = transport.send(&topic, &envelope).await;
                let _ = events.send(Event::DeliveryResult { sequence, result });
            });
        }
    })
}

/// Single writer of the tracker and counters.
struct Coordinator {
    tracker: DeliveryTracker,
    state: PublisherState,
    observer: Arc<dyn OutcomeObserver>,
    queue: Arc<PublishQueue>,
    topic: String,
    phase: RunPhase,
    source_done: bool,
    halt: bool,
    cancelling: bool,
    unprocessed: u64,
}

impl Coordinator {
    fn handle(&mut self, event: Event) {
        match event {
            Event::Registered { envelope } => {
                self.state.records_read += 1;
                if self.cancelling {
                    // The queue is already shut down; this enqueue cannot
                    // succeed and no delivery will happen.
                    self.unprocessed += 1;
                    return;
                }
                self.state.issued += 1;
                self.tracker.register(envelope);
            }
            Event::SerializeFailed {
                sequence,
                row,
                reason,
            } => {
                self.state.records_read += 1;
                warn!(sequence, row, %reason, "record not serializable");
                self.terminal(sequence, DeliveryOutcome::Failed { reason, attempts: 0 }, false);
            }
            Event::SourceError => {
                self.state.source_errors += 1;
            }
            Event::SourceDone { halted } => {
                self.source_done = true;
                if halted {
                    error!("halting on source read error");
                    self.halt = true;
                } else if !self.cancelling {
                    self.phase = RunPhase::Draining;
                    self.queue.close();
                    if !self.tracker.is_empty() {
                        info!(in_flight = self.tracker.len(), "draining in-flight deliveries");
                    }
                }
            }
            Event::DeliveryResult { sequence, result } => self.handle_delivery(sequence, result),
        }
    }

    fn handle_delivery(&mut self, sequence: u64, result: Result<Delivery, TransportError>) {
        match result {
            Ok(delivery) => match self.tracker.record_ack(sequence) {
                Ok(()) => self.terminal(
                    sequence,
                    DeliveryOutcome::Acknowledged {
                        topic: self.topic.clone(),
                        partition: delivery.partition,
                        offset: delivery.offset,
                    },
                    true,
                ),
                Err(err) => warn!(%err, "ignoring acknowledgment"),
            },
            Err(TransportError::Fatal(reason)) => {
                match self.tracker.record_fatal(sequence, &reason) {
                    Ok(outcome) => self.terminal(sequence, outcome, true),
                    Err(err) => warn!(%err, "ignoring delivery failure"),
                }
                error!(%reason, "fatal transport error, cancelling run");
                self.halt = true;
            }
            Err(TransportError::Delivery(reason)) => {
                match self.tracker.record_nack(sequence, &reason) {
                    Ok(NackVerdict::Retry(envelope)) => {
                        if self.cancelling {
                            // A cancelled run issues no further attempts.
                            self.tracker.abandon(sequence);
                            self.unprocessed += 1;
                            self.queue.release_credit();
                            debug!(sequence, "abandoning retry during cancellation");
                        } else {
                            self.state.retried += 1;
                            debug!(sequence, %reason, "delivery failed, retrying");
                            self.queue.requeue(envelope);
                        }
                    }
                    Ok(NackVerdict::Terminal(outcome)) => self.terminal(sequence, outcome, true),
                    Err(err) => warn!(%err, "ignoring delivery failure"),
                }
            }
        }
    }

    /// Record a terminal outcome: counters, observer, and (for envelopes
    /// that held one) the delivery credit.
    fn terminal(&mut self, sequence: u64, outcome: DeliveryOutcome, release_credit: bool) {
        match &outcome {
            DeliveryOutcome::Acknowledged { .. } => self.state.acknowledged += 1,
            DeliveryOutcome::Failed { .. } => self.state.failed += 1,
        }
        self.observer.on_outcome(sequence, &outcome);
        if release_credit {
            self.queue.release_credit();
        }
    }
}
