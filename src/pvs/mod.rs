//! Everything that talks to, or interprets data from, the PVS supervisor.
//!
//! The client performs the serial-number/login handshake and pulls the full
//! variable namespace; the snapshot module turns that flat dump into typed
//! lookups and device descriptors.

pub mod client;
pub mod snapshot;

// Re-export commonly used items
pub use client::{PvsClient, Session};
pub use snapshot::{DeviceDescriptor, DeviceKind, MeterMode, Snapshot};
