//! Engram snapshot library
//!
//! Copies the engram database and its content directories into timestamped
//! snapshot directories with a SHA-256 manifest, and verifies snapshots
//! against that manifest later.

pub mod config;
pub mod fs;
pub mod snapshot;
pub mod utils;

// Re-export commonly used types
pub use config::StoragePaths;
pub use snapshot::manifest::{Manifest, ManifestFile};
pub use snapshot::{verify_snapshot, Finding, SnapshotBackup, VerifyReport};
pub use utils::errors::SnapshotError;
pub type Result<T> = std::result::Result<T, SnapshotError>;
