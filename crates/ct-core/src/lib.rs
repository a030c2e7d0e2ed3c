//! Core functionality for the COVID-19 tracker
//!
//! This crate provides the cell value type shared by every table, the
//! transport seam used to reach upstream data sources, and format detection
//! for fetched resources.

pub mod format;
pub mod transport;
pub mod value;

// Re-export commonly used types
pub use format::SourceFormat;
pub use transport::{Payload, StaticTransport, Transport, TransportError};
pub use value::Value;
