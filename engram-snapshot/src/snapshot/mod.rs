//! Snapshot backup: copy the database and content directories into a
//! timestamped directory and index every copied file in a manifest.
//!
//! The database file is copied byte-for-byte with no lock taken on it. A
//! snapshot taken while another process writes to the database can capture a
//! torn file; callers that need a consistent copy must quiesce writers first.

pub mod manifest;
pub mod verify;

use crate::config::{absolutize, StoragePaths};
use crate::fs::{copy_tree, file_sha256, walk_directory, WalkOptions};
use crate::utils::{Result, SnapshotError};
use chrono::{DateTime, SecondsFormat, Utc};
use manifest::{Manifest, ManifestFile, MANIFEST_FILE_NAME};
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

pub use verify::{verify_snapshot, Finding, VerifyReport};

/// Prefix of every snapshot directory name.
pub const SNAPSHOT_PREFIX: &str = "snapshot-";

/// Content directories under the data directory that are captured when present.
pub const CONTENT_DIRS: [&str; 2] = ["artifacts", "parquet"];

/// Creates snapshots of one storage location.
#[derive(Debug, Clone)]
pub struct SnapshotBackup {
    paths: StoragePaths,
}

impl SnapshotBackup {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    /// Create a snapshot under `destination_root` and return its absolute path.
    pub fn create(&self, destination_root: &Path) -> Result<PathBuf> {
        self.create_at(destination_root, Utc::now())
    }

    /// Create a snapshot stamped with `now`.
    pub fn create_at(&self, destination_root: &Path, now: DateTime<Utc>) -> Result<PathBuf> {
        let start_time = Instant::now();
        let source_db = &self.paths.db_path;
        if !source_db.is_file() {
            return Err(SnapshotError::SourceMissing(source_db.clone()));
        }
        let db_file_name = source_db.file_name().ok_or_else(|| {
            SnapshotError::Config(format!(
                "database path has no file name: {}",
                source_db.display()
            ))
        })?;

        let snapshot_dir = absolutize(&destination_root.join(snapshot_dir_name(&now)))?;
        self.ensure_outside_content_dirs(&snapshot_dir)?;
        fs::create_dir_all(&snapshot_dir)?;
        info!(snapshot = %snapshot_dir.display(), "Creating snapshot");

        fs::copy(source_db, snapshot_dir.join(db_file_name))?;

        for name in CONTENT_DIRS {
            let source = self.paths.data_dir.join(name);
            if !source.is_dir() {
                debug!(dir = %source.display(), "Content directory absent, skipping");
                continue;
            }
            let copied = copy_tree(&source, &snapshot_dir.join(name))?;
            debug!(dir = name, files = copied, "Copied content directory");
        }

        let manifest = Manifest {
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            files: index_files(&snapshot_dir)?,
            source_data_dir: self.paths.data_dir.to_string_lossy().into_owned(),
            source_db_path: source_db.to_string_lossy().into_owned(),
        };
        manifest.write_to(&snapshot_dir)?;

        info!(
            snapshot = %snapshot_dir.display(),
            files = manifest.files.len(),
            bytes = manifest.total_bytes(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "Snapshot created"
        );
        Ok(snapshot_dir)
    }

    /// A snapshot placed under a content directory would be copied into itself.
    fn ensure_outside_content_dirs(&self, snapshot_dir: &Path) -> Result<()> {
        let target = canonical_prefix(snapshot_dir)?;
        for name in CONTENT_DIRS {
            let source = self.paths.data_dir.join(name);
            if !source.is_dir() {
                continue;
            }
            let source = source.canonicalize()?;
            if target.starts_with(&source) {
                return Err(SnapshotError::Config(format!(
                    "snapshot destination {} is inside content directory {}",
                    snapshot_dir.display(),
                    source.display()
                )));
            }
        }
        Ok(())
    }
}

/// Canonicalize the deepest existing ancestor of `path` and re-append the
/// components that do not exist yet.
fn canonical_prefix(path: &Path) -> Result<PathBuf> {
    let mut existing = path;
    let mut pending: Vec<&OsStr> = Vec::new();
    loop {
        match existing.canonicalize() {
            Ok(resolved) => {
                return Ok(pending
                    .iter()
                    .rev()
                    .fold(resolved, |acc: PathBuf, part| acc.join(part)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Err(e.into());
                };
                pending.push(name);
                existing = parent;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Directory name for a snapshot taken at `now`.
///
/// Colons are replaced so the name is valid on every file system; the
/// fixed-width timestamp keeps names sorting by creation time.
pub fn snapshot_dir_name(now: &DateTime<Utc>) -> String {
    format!(
        "{SNAPSHOT_PREFIX}{}",
        now.to_rfc3339_opts(SecondsFormat::Millis, true).replace(':', "-")
    )
}

/// Size and digest of every regular file in the snapshot, manifest excluded.
fn index_files(snapshot_dir: &Path) -> Result<Vec<ManifestFile>> {
    let options = WalkOptions::default().excluding(MANIFEST_FILE_NAME);
    walk_directory(snapshot_dir, &options)?
        .into_iter()
        .map(|file| -> Result<ManifestFile> {
            Ok(ManifestFile {
                bytes: file.size,
                path: file.portable_path(),
                sha256: file_sha256(&file.path)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    struct Fixture {
        _root: TempDir,
        paths: StoragePaths,
        backups: PathBuf,
    }

    fn fixture(with_artifacts: bool, with_parquet: bool) -> Result<Fixture> {
        let root = TempDir::new()?;
        let data_dir = root.path().join("data");
        let paths = StoragePaths::new(&data_dir, data_dir.join("engram.sqlite"));

        fs::create_dir_all(&data_dir)?;
        fs::write(&paths.db_path, "sqlite-placeholder")?;
        if with_artifacts {
            fs::create_dir_all(data_dir.join("artifacts"))?;
            fs::write(data_dir.join("artifacts/artifact-1.txt"), "artifact")?;
        }
        if with_parquet {
            fs::create_dir_all(data_dir.join("parquet"))?;
            fs::write(data_dir.join("parquet/batch-1.parquet"), "parquet")?;
        }

        let backups = root.path().join("backups");
        Ok(Fixture {
            _root: root,
            paths,
            backups,
        })
    }

    fn read_manifest(dir: &Path) -> Manifest {
        let bytes = fs::read(dir.join(MANIFEST_FILE_NAME)).unwrap();
        Manifest::parse(&bytes).unwrap()
    }

    #[test]
    fn test_snapshot_dir_name_is_filesystem_safe() {
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 9, 5, 7).unwrap();
        let name = snapshot_dir_name(&now);
        assert_eq!(name, "snapshot-2026-02-22T09-05-07.000Z");
        assert!(!name.contains(':'));
    }

    #[test]
    fn test_snapshot_dir_names_sort_by_time() {
        let earlier = Utc.with_ymd_and_hms(2026, 2, 22, 9, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2026, 2, 22, 10, 0, 0).unwrap();
        assert!(snapshot_dir_name(&earlier) < snapshot_dir_name(&later));
    }

    #[test]
    fn test_create_and_verify_roundtrip() -> Result<()> {
        let fx = fixture(true, true)?;
        let backup = SnapshotBackup::new(fx.paths.clone());

        let snapshot_dir = backup.create(&fx.backups)?;

        assert!(snapshot_dir.is_absolute());
        assert!(snapshot_dir.join(MANIFEST_FILE_NAME).is_file());
        let report = verify_snapshot(&snapshot_dir)?;
        assert!(report.ok);
        assert!(report.mismatches.is_empty());
        Ok(())
    }

    #[test]
    fn test_manifest_contents() -> Result<()> {
        let fx = fixture(true, true)?;
        let now = Utc.with_ymd_and_hms(2026, 2, 22, 12, 0, 0).unwrap();

        let snapshot_dir = SnapshotBackup::new(fx.paths.clone()).create_at(&fx.backups, now)?;
        let manifest = read_manifest(&snapshot_dir);

        assert_eq!(manifest.created_at, "2026-02-22T12:00:00.000Z");
        assert_eq!(manifest.source_db_path, fx.paths.db_path.to_string_lossy());
        assert_eq!(manifest.source_data_dir, fx.paths.data_dir.to_string_lossy());

        let mut paths: Vec<&str> = manifest.files.iter().map(|f| f.path.as_str()).collect();
        paths.sort_unstable();
        assert_eq!(
            paths,
            vec!["artifacts/artifact-1.txt", "engram.sqlite", "parquet/batch-1.parquet"]
        );

        let db_entry = manifest.files.iter().find(|f| f.path == "engram.sqlite").unwrap();
        assert_eq!(db_entry.bytes, "sqlite-placeholder".len() as u64);
        assert_eq!(db_entry.sha256, file_sha256(&fx.paths.db_path)?);

        let text = fs::read_to_string(snapshot_dir.join(MANIFEST_FILE_NAME))?;
        assert!(text.ends_with('\n'));
        Ok(())
    }

    #[test]
    fn test_absent_content_dirs_are_skipped() -> Result<()> {
        let fx = fixture(false, false)?;

        let snapshot_dir = SnapshotBackup::new(fx.paths.clone()).create(&fx.backups)?;
        let manifest = read_manifest(&snapshot_dir);

        assert_eq!(manifest.files.len(), 1);
        assert_eq!(manifest.files[0].path, "engram.sqlite");
        assert!(!snapshot_dir.join("artifacts").exists());
        Ok(())
    }

    #[test]
    fn test_missing_database_fails_before_creating_destination() -> Result<()> {
        let fx = fixture(false, false)?;
        fs::remove_file(&fx.paths.db_path)?;

        let err = SnapshotBackup::new(fx.paths.clone())
            .create(&fx.backups)
            .unwrap_err();

        assert!(matches!(err, SnapshotError::SourceMissing(ref p) if p == &fx.paths.db_path));
        assert!(err.to_string().starts_with("Database does not exist:"));
        assert!(!fx.backups.exists());
        Ok(())
    }

    #[test]
    fn test_destination_inside_content_dir_rejected() -> Result<()> {
        let fx = fixture(true, false)?;
        let artifacts = fx.paths.data_dir.join("artifacts");
        let destination = artifacts.join("backups");

        let err = SnapshotBackup::new(fx.paths.clone())
            .create(&destination)
            .unwrap_err();

        let SnapshotError::Config(msg) = &err else {
            panic!("unexpected error: {err}");
        };
        assert!(msg.contains("inside content directory"));
        assert!(!destination.exists());
        let entries: Vec<_> = fs::read_dir(&artifacts)?.collect::<std::io::Result<_>>()?;
        assert_eq!(entries.len(), 1);
        Ok(())
    }

    #[test]
    fn test_destination_inside_data_dir_allowed() -> Result<()> {
        let fx = fixture(true, true)?;
        let destination = fx.paths.data_dir.join("backups");

        let snapshot_dir = SnapshotBackup::new(fx.paths.clone()).create(&destination)?;

        assert!(snapshot_dir.starts_with(&destination));
        assert!(verify_snapshot(&snapshot_dir)?.ok);
        Ok(())
    }

    #[test]
    fn test_single_byte_change_reports_one_mismatch() -> Result<()> {
        let fx = fixture(true, true)?;
        let snapshot_dir = SnapshotBackup::new(fx.paths.clone()).create(&fx.backups)?;

        let target = snapshot_dir.join("parquet/batch-1.parquet");
        let mut bytes = fs::read(&target)?;
        bytes[0] ^= 0x01;
        fs::write(&target, bytes)?;

        let report = verify_snapshot(&snapshot_dir)?;
        assert!(!report.ok);
        assert_eq!(report.mismatches, vec!["parquet/batch-1.parquet: checksum mismatch"]);
        Ok(())
    }

    #[test]
    fn test_deleted_file_reported_missing() -> Result<()> {
        let fx = fixture(true, false)?;
        let snapshot_dir = SnapshotBackup::new(fx.paths.clone()).create(&fx.backups)?;

        fs::remove_file(snapshot_dir.join("artifacts/artifact-1.txt"))?;

        let report = verify_snapshot(&snapshot_dir)?;
        assert!(!report.ok);
        assert_eq!(report.mismatches, vec!["artifacts/artifact-1.txt: missing"]);
        Ok(())
    }

    #[test]
    fn test_tampered_database_detected() -> Result<()> {
        let fx = fixture(true, false)?;
        let snapshot_dir = SnapshotBackup::new(fx.paths.clone()).create(&fx.backups)?;

        fs::write(snapshot_dir.join("engram.sqlite"), "tampered")?;

        let report = verify_snapshot(&snapshot_dir)?;
        assert!(report
            .mismatches
            .iter()
            .any(|m| m == "engram.sqlite: checksum mismatch"));
        Ok(())
    }
}
