//! Directory traversal for snapshot enumeration.
//!
//! Collects the regular files below a root along with their path relative to
//! that root, which is what a snapshot manifest records.

use crate::utils::Result;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Options for directory walking
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Relative paths (from the root) that are skipped exactly
    pub exclude_paths: Vec<PathBuf>,
}

impl WalkOptions {
    /// Skip a single path relative to the walk root.
    pub fn excluding(mut self, relative: impl Into<PathBuf>) -> Self {
        self.exclude_paths.push(relative.into());
        self
    }
}

/// Information about a file discovered during walking
#[derive(Debug, Clone)]
pub struct FileInfo {
    /// Full path to the file
    pub path: PathBuf,

    /// Relative path from the root
    pub relative_path: PathBuf,

    /// File size in bytes
    pub size: u64,
}

impl FileInfo {
    /// Create FileInfo from a DirEntry.
    /// For symlinks, resolves to the target to get the real file size.
    /// Returns None if the symlink target is a directory or cannot be resolved.
    fn from_entry(entry: &DirEntry, root: &Path) -> Result<Option<Self>> {
        let raw_metadata = entry.metadata()?;
        let path = entry.path().to_path_buf();
        let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();

        let size = if raw_metadata.is_symlink() {
            match std::fs::metadata(&path) {
                Ok(resolved) if resolved.is_file() => resolved.len(),
                // Symlink to a directory, or broken
                _ => return Ok(None),
            }
        } else {
            raw_metadata.len()
        };

        Ok(Some(Self {
            path,
            relative_path,
            size,
        }))
    }

    /// Relative path with `/` separators regardless of platform.
    pub fn portable_path(&self) -> String {
        portable_path(&self.relative_path)
    }
}

/// Join the normal components of a relative path with `/`.
pub fn portable_path(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Walk a directory tree and collect all files.
///
/// Entries are visited in file-name order within each directory, so the
/// result is stable across runs on the same tree. Symlinks are not followed
/// into directories; a link to a regular file is listed with its target's size.
///
/// # Example
/// ```no_run
/// use engram_snapshot::fs::walker::{walk_directory, WalkOptions};
/// use std::path::Path;
///
/// let files = walk_directory(Path::new("/data"), &WalkOptions::default()).unwrap();
/// println!("Found {} files", files.len());
/// ```
pub fn walk_directory(root: &Path, options: &WalkOptions) -> Result<Vec<FileInfo>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root).follow_links(false).sort_by_file_name();

    for entry in walker {
        let entry = entry?;

        if entry.file_type().is_dir() {
            continue;
        }

        if should_exclude(&entry, root, &options.exclude_paths) {
            continue;
        }

        if let Some(file_info) = FileInfo::from_entry(&entry, root)? {
            files.push(file_info);
        }
    }

    Ok(files)
}

fn should_exclude(entry: &DirEntry, root: &Path, excluded: &[PathBuf]) -> bool {
    match entry.path().strip_prefix(root) {
        Ok(relative) => excluded.iter().any(|p| p == relative),
        Err(_) => false,
    }
}
