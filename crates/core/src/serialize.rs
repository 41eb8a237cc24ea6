//! Record serialization.

use crate::error::SerializationError;
use crate::record::Record;
use bytes::Bytes;

/// Converts one record into a wire payload.
///
/// Implementations must be total and deterministic: the same record always
/// yields byte-identical output.
pub trait Serializer: Send + Sync {
    /// Encode a record into payload bytes.
    fn encode(&self, record: &Record) -> Result<Bytes, SerializationError>;
}

/// JSON serializer producing one object per record, fields in source column
/// order.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn encode(&self, record: &Record) -> Result<Bytes, SerializationError> {
        serde_json::to_vec(record)
            .map(Bytes::from)
            .map_err(|e| SerializationError {
                row: record.row(),
                message: e.to_string(),
            })
    }
}
