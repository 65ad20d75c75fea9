//! Storage path configuration.
//!
//! Resolves the data directory and the SQLite database path once, up front,
//! so that snapshot and store operations receive them explicitly instead of
//! reading process environment on their own.
//!
//! Precedence for the data directory:
//! 1. explicit override (`ENGRAM_DATA_DIR`)
//! 2. `~/.engram`
//!
//! Precedence for the database file:
//! 1. explicit override (`ENGRAM_DB_PATH`)
//! 2. `<data_dir>/engram.sqlite`

use crate::utils::{Result, SnapshotError};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// Default data directory, relative to the user's home.
pub const DEFAULT_DATA_DIR: &str = "~/.engram";

/// File name of the primary database inside the data directory.
pub const DEFAULT_DB_FILE: &str = "engram.sqlite";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoragePaths {
    /// Root data directory holding the database and auxiliary content
    pub data_dir: PathBuf,

    /// Primary SQLite database file
    pub db_path: PathBuf,
}

impl StoragePaths {
    /// Build paths from already-absolute locations.
    pub fn new(data_dir: impl Into<PathBuf>, db_path: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            db_path: db_path.into(),
        }
    }

    /// Resolve storage paths from optional overrides.
    ///
    /// Empty overrides are treated as unset. `home` is used to expand a
    /// leading `~/`; relative results are anchored at the current directory.
    pub fn resolve(
        data_dir_override: Option<&str>,
        db_path_override: Option<&str>,
        home: Option<&Path>,
    ) -> Result<Self> {
        let data_dir_raw = data_dir_override
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_DATA_DIR);
        let data_dir = absolutize(&expand_home_path(data_dir_raw, home)?)?;

        let db_path = match db_path_override.filter(|v| !v.is_empty()) {
            Some(raw) => absolutize(&expand_home_path(raw, home)?)?,
            None => data_dir.join(DEFAULT_DB_FILE),
        };

        Ok(Self { data_dir, db_path })
    }
}

/// Expand a leading `~/` segment to the given home directory.
///
/// Paths without the prefix are returned unchanged. A `~/` path with no
/// known home directory is a configuration error.
pub fn expand_home_path(input: &str, home: Option<&Path>) -> Result<PathBuf> {
    match input.strip_prefix("~/") {
        Some(rest) => {
            let home = home.ok_or_else(|| {
                SnapshotError::Config(format!("cannot expand {input}: home directory unknown"))
            })?;
            Ok(home.join(rest))
        }
        None => Ok(PathBuf::from(input)),
    }
}

/// Create missing parent directories for a file path.
pub fn ensure_parent_dir(file_path: &Path) -> Result<()> {
    if let Some(parent) = file_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Anchor a path at the current directory and collapse `.`/`..` lexically.
pub(crate) fn absolutize(path: &Path) -> Result<PathBuf> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_expand_home_prefix() {
        let home = Path::new("/home/tester");
        let expanded = expand_home_path("~/engram-path-test", Some(home)).unwrap();
        assert_eq!(expanded, PathBuf::from("/home/tester/engram-path-test"));
    }

    #[test]
    fn test_expand_leaves_other_paths() {
        let expanded = expand_home_path("/var/lib/engram", None).unwrap();
        assert_eq!(expanded, PathBuf::from("/var/lib/engram"));
    }

    #[test]
    fn test_expand_without_home_fails() {
        let err = expand_home_path("~/data", None).unwrap_err();
        assert!(matches!(err, SnapshotError::Config(_)));
    }

    #[test]
    fn test_defaults_under_home() {
        let home = Path::new("/home/tester");
        let paths = StoragePaths::resolve(None, None, Some(home)).unwrap();
        assert_eq!(paths.data_dir, PathBuf::from("/home/tester/.engram"));
        assert_eq!(
            paths.db_path,
            PathBuf::from("/home/tester/.engram/engram.sqlite")
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let home = Path::new("/home/tester");
        let paths = StoragePaths::resolve(
            Some("~/engram-custom-data"),
            Some("~/engram-custom-db/custom.sqlite"),
            Some(home),
        )
        .unwrap();
        assert_eq!(paths.data_dir, PathBuf::from("/home/tester/engram-custom-data"));
        assert_eq!(
            paths.db_path,
            PathBuf::from("/home/tester/engram-custom-db/custom.sqlite")
        );
    }

    #[test]
    fn test_db_path_follows_data_dir_override() {
        let paths = StoragePaths::resolve(Some("/srv/engram"), Some(""), None).unwrap();
        assert_eq!(paths.db_path, PathBuf::from("/srv/engram/engram.sqlite"));
    }

    #[test]
    fn test_relative_paths_are_absolute_and_normalized() {
        let paths = StoragePaths::resolve(Some("./data/../store"), None, None).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert!(paths.data_dir.is_absolute());
        assert_eq!(paths.data_dir, cwd.join("store"));
    }

    #[test]
    fn test_ensure_parent_dir_creates_chain() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("a/b/c/db.sqlite");

        ensure_parent_dir(&file_path)?;

        assert!(temp_dir.path().join("a/b/c").is_dir());
        Ok(())
    }
}
