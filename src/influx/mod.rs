//! InfluxDB sink: batched writes plus the connectivity self-tests.
//!
//! The sink is treated as write-only. The only reads are the `ping` and
//! `SHOW DATABASES` calls made by the diagnostics.

pub mod diagnostics;
pub mod writer;

// Re-export commonly used items
pub use diagnostics::sample_snapshot;
pub use writer::InfluxWriter;
