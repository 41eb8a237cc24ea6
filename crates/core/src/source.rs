//! Record source boundary.

use crate::error::SourceReadError;
use crate::record::Record;

/// A lazy, finite or infinite sequence of records.
///
/// Implementations must yield records in source order and must not
/// invalidate themselves on a per-row error: after `Err`, the next call
/// continues with the following row. `Ok(None)` is end-of-source.
pub trait RecordSource: Send {
    /// Pull the next record.
    fn next_record(&mut self) -> Result<Option<Record>, SourceReadError>;

    /// Number of records left, when the source knows it.
    ///
    /// Finite, fully-sized sources report the exact remainder so that a
    /// cancelled run can account for records it never read. Streaming
    /// sources, whose remaining length is unknowable without reading ahead,
    /// return `None`.
    fn remaining(&self) -> Option<u64> {
        None
    }
}
