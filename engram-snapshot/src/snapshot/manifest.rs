//! Snapshot manifest format.
//!
//! Written once as `manifest.json` at the snapshot root, pretty-printed with a
//! trailing newline. Readers accept compact JSON as well. Key names and key
//! order are fixed: `createdAt`, `files`, `sourceDataDir`, `sourceDbPath`,
//! and per file `bytes`, `path`, `sha256`.

use crate::fs::digest::is_sha256_hex;
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Manifest file name at the snapshot root.
pub const MANIFEST_FILE_NAME: &str = "manifest.json";

/// Backup manifest serialized as `manifest.json` in each snapshot directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// ISO-8601 UTC creation timestamp
    pub created_at: String,
    /// Captured files in discovery order
    pub files: Vec<ManifestFile>,
    pub source_data_dir: String,
    pub source_db_path: String,
}

/// Size and digest of one captured file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub bytes: u64,
    /// Relative to the snapshot root, `/`-separated
    pub path: String,
    pub sha256: String,
}

/// Outcome of reading a manifest from disk.
#[derive(Debug)]
pub enum ManifestLoad {
    Missing,
    Invalid(String),
    Loaded(Manifest),
}

impl Manifest {
    /// Parse and schema-check manifest JSON.
    pub fn parse(bytes: &[u8]) -> std::result::Result<Self, String> {
        let manifest: Manifest = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Check invariants serde cannot express on its own.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::with_capacity(self.files.len());
        for file in &self.files {
            if !is_safe_relative_path(&file.path) {
                return Err(format!("unsafe file path: {:?}", file.path));
            }
            if file.path == MANIFEST_FILE_NAME {
                return Err("manifest lists itself".to_string());
            }
            if !seen.insert(file.path.as_str()) {
                return Err(format!("duplicate file path: {}", file.path));
            }
            if !is_sha256_hex(&file.sha256) {
                return Err(format!("malformed sha256 for {}", file.path));
            }
        }
        Ok(())
    }

    /// Total bytes over all captured files.
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }

    /// Pretty JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut text = serde_json::to_string_pretty(self)?;
        text.push('\n');
        Ok(text)
    }

    /// Write `manifest.json` into a snapshot directory.
    pub fn write_to(&self, snapshot_dir: &Path) -> Result<()> {
        fs::write(snapshot_dir.join(MANIFEST_FILE_NAME), self.to_pretty_json()?)?;
        Ok(())
    }
}

/// Read `manifest.json` from a snapshot directory.
///
/// Absence and malformed content are reported as values; only I/O failures
/// other than "not found" are errors.
pub fn load_manifest(snapshot_dir: &Path) -> Result<ManifestLoad> {
    let bytes = match fs::read(snapshot_dir.join(MANIFEST_FILE_NAME)) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(ManifestLoad::Missing),
        Err(e) => return Err(e.into()),
    };

    Ok(match Manifest::parse(&bytes) {
        Ok(manifest) => ManifestLoad::Loaded(manifest),
        Err(reason) => ManifestLoad::Invalid(reason),
    })
}

/// Non-empty, relative, `/`-separated, with no `.` or `..` segments.
fn is_safe_relative_path(path: &str) -> bool {
    !path.is_empty()
        && !path.starts_with('/')
        && !Path::new(path).is_absolute()
        && path
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
}
