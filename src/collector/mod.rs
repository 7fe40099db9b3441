//! Collection cycle orchestration.

pub mod driver;
pub mod traits;

// Re-export commonly used items
pub use driver::{Collector, CycleReport, LoopSummary};
pub use traits::{RecordSink, SnapshotSource};
