//! Seams between the collection cycle and its two endpoints.

use crate::error::Result;
use crate::line::Record;
use crate::pvs::Snapshot;

/// Source of device snapshots.
///
/// The real implementation is [`crate::pvs::PvsClient`]; tests substitute
/// in-memory doubles.
pub trait SnapshotSource {
    /// Establish a session for the current cycle.
    fn authenticate(&mut self) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Fetch the whole variable namespace.
    fn fetch_all(&mut self) -> impl std::future::Future<Output = Result<Snapshot>> + Send;
}

/// Destination for encoded records.
pub trait RecordSink {
    /// Write a batch of records, returning how many lines were sent.
    ///
    /// Implementations must send all of the batch or none of it.
    fn write(&self, records: &[Record]) -> impl std::future::Future<Output = Result<usize>> + Send;
}
