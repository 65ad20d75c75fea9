//! Utility modules shared by snapshot operations.

pub mod errors;
pub mod logger;

pub use errors::{Result, SnapshotError};
