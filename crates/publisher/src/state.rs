//! Run phases, counters, and the aggregate summary.

use serde::Serialize;

/// Phase of a publisher run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RunPhase {
    /// Constructed, not yet started.
    Idle,
    /// Reading records and draining acknowledgments.
    Running,
    /// Source exhausted; in-flight deliveries still resolving.
    Draining,
    /// Every issued sequence reached a terminal outcome.
    Completed,
    /// Cancelled explicitly, by source halt policy, or by a fatal transport
    /// error.
    Cancelled,
}

impl RunPhase {
    /// String form used in logs.
    pub fn as_str(&self) -> &str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::Running => "running",
            RunPhase::Draining => "draining",
            RunPhase::Completed => "completed",
            RunPhase::Cancelled => "cancelled",
        }
    }

    /// Whether the run can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Completed | RunPhase::Cancelled)
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-wide counters for one run.
///
/// Mutated only by the publisher's coordinating path, even though
/// acknowledgments arrive concurrently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublisherState {
    /// Records yielded by the source (including ones that failed to
    /// serialize).
    pub records_read: u64,
    /// Envelopes issued for delivery: sequence assigned and registered.
    /// An envelope still blocked at a full queue when the run is cancelled
    /// is counted here and reported in `unprocessed`.
    pub issued: u64,
    /// Envelopes terminally acknowledged.
    pub acknowledged: u64,
    /// Envelopes terminally failed (retry budget exhausted, fatal transport
    /// errors, serialization failures).
    pub failed: u64,
    /// Re-enqueued delivery attempts.
    pub retried: u64,
    /// Source rows that could not be read at all.
    pub source_errors: u64,
}

/// Aggregate result of a run, reported once after the terminal phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Terminal phase: `Completed` or `Cancelled`.
    pub phase: RunPhase,
    /// Final counters.
    pub state: PublisherState,
    /// Records that reached no terminal outcome on a cancelled run:
    /// envelopes issued but unresolved when the drain timeout fired, plus
    /// records a finite source never yielded. Always zero for completed
    /// runs.
    pub unprocessed: u64,
}

impl RunSummary {
    /// Whether the run completed with every envelope acknowledged.
    pub fn is_clean(&self) -> bool {
        self.phase == RunPhase::Completed && self.state.failed == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(RunPhase::Draining.to_string(), "draining");
        assert!(RunPhase::Completed.is_terminal());
        assert!(!RunPhase::Running.is_terminal());
    }

    #[test]
    fn test_clean_summary() {
        let summary = RunSummary {
            phase: RunPhase::Completed,
            state: PublisherState::default(),
            unprocessed: 0,
        };
        assert!(summary.is_clean());

        let summary = RunSummary {
            phase: RunPhase::Cancelled,
            state: PublisherState::default(),
            unprocessed: 2,
        };
        assert!(!summary.is_clean());
    }
}
