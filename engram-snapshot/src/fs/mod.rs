//! File system helpers: walking, copying and hashing.

pub mod copy;
pub mod digest;
pub mod walker;

pub use copy::copy_tree;
pub use digest::file_sha256;
pub use walker::{walk_directory, FileInfo, WalkOptions};
