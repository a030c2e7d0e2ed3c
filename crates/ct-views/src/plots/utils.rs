//! Utilities for plot series

pub mod labels;

// Re-export commonly used items
pub use labels::{compress_label, percent_label, place_label};
