//! InfluxDB line protocol: record encoding, snapshot-to-record building and
//! pre-flight validation.

pub mod builder;
pub mod record;
pub mod validate;

// Re-export commonly used items
pub use builder::build;
pub use record::{escape_tag_value, FieldValue, Record};
pub use validate::is_valid;
