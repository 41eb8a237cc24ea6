//! CSV record source for trade-ingest.
//!
//! Streams rows from a local CSV file as [`trade_ingest_core::Record`]s with
//! best-effort scalar type inference. The reader never buffers the whole
//! file, so arbitrarily large inputs work, and a single malformed row leaves
//! the rest of the file readable.

mod source;

pub use source::{CsvRecordSource, CsvSourceOptions};
