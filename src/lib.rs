//! # PVS6 Logger
//!
//! Polls a SunPower PVS6 supervisor over its local HTTPS API and writes the
//! telemetry to InfluxDB using line protocol.
//!
//! ## Features
//!
//! - **Device login**: serial-number lookup and owner login with cookie reuse
//! - **One-shot snapshot**: the full varserver namespace in a single request
//! - **Record building**: comm status, device inventory, meter and inverter
//!   telemetry, supervisor health
//! - **Safe writes**: every batch is syntax-checked and sent all-or-nothing
//! - **Diagnostics**: InfluxDB ping, database bootstrap and test writes
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pvs6_logger::{Collector, InfluxWriter, PvsClient, PvsConfig, SinkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let source = PvsClient::new(PvsConfig::new("172.27.153.1"))?;
//!     let sink = InfluxWriter::new(SinkConfig::default())?;
//!     let mut collector = Collector::new(source, sink);
//!
//!     let report = collector.run_once().await?;
//!     println!("wrote {} lines", report.written);
//!     Ok(())
//! }
//! ```

pub mod collector;
pub mod config;
pub mod error;
pub mod influx;
pub mod line;
pub mod pvs;

// Re-export public API
pub use collector::{Collector, CycleReport, LoopSummary, RecordSink, SnapshotSource};
pub use config::{PvsConfig, SinkConfig};
pub use error::{AuthError, PvsError, Result};
pub use influx::{sample_snapshot, InfluxWriter};
pub use line::{FieldValue, Record};
pub use pvs::{DeviceDescriptor, DeviceKind, MeterMode, PvsClient, Snapshot};

/// The default collection interval in seconds
pub const DEFAULT_INTERVAL_SECS: u64 = 60;

/// The default InfluxDB write endpoint
pub const DEFAULT_INFLUX_URL: &str = "http://127.0.0.1:8086/write";

/// The default InfluxDB database
pub const DEFAULT_INFLUX_DB: &str = "pvs6_detail";

/// Timestamp precision sent with every write (seconds)
pub const INFLUX_PRECISION: &str = "s";

/// Default connect timeout for device and sink requests
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 5;

/// Default request timeout for device and sink requests
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 10;
