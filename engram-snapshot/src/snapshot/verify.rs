//! Snapshot integrity verification.
//!
//! Re-hashes every file a manifest lists and reports what no longer matches.
//! Findings are data, not errors: a structurally valid manifest always
//! yields a report, even when every file fails.

use super::manifest::{load_manifest, ManifestLoad, MANIFEST_FILE_NAME};
use crate::fs::digest::file_sha256;
use crate::utils::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

/// A single verification finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Finding {
    ManifestMissing,
    ManifestInvalid,
    FileMissing(String),
    ChecksumMismatch(String),
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::ManifestMissing => write!(f, "{MANIFEST_FILE_NAME} missing"),
            Finding::ManifestInvalid => write!(f, "{MANIFEST_FILE_NAME} invalid"),
            Finding::FileMissing(path) => write!(f, "{path}: missing"),
            Finding::ChecksumMismatch(path) => write!(f, "{path}: checksum mismatch"),
        }
    }
}

/// Verification result as printed by `verify-backup`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyReport {
    pub mismatches: Vec<String>,
    pub ok: bool,
}

impl VerifyReport {
    pub fn from_findings(findings: &[Finding]) -> Self {
        let mismatches: Vec<String> = findings.iter().map(Finding::to_string).collect();
        Self {
            ok: mismatches.is_empty(),
            mismatches,
        }
    }
}

/// Verify a snapshot directory against its manifest.
pub fn verify_snapshot(snapshot_dir: &Path) -> Result<VerifyReport> {
    let findings = collect_findings(snapshot_dir)?;
    for finding in &findings {
        warn!(snapshot = %snapshot_dir.display(), "{finding}");
    }

    let report = VerifyReport::from_findings(&findings);
    info!(
        snapshot = %snapshot_dir.display(),
        ok = report.ok,
        mismatches = report.mismatches.len(),
        "Snapshot verification finished"
    );
    Ok(report)
}

/// Walk the manifest in order and accumulate findings without short-circuiting.
pub fn collect_findings(snapshot_dir: &Path) -> Result<Vec<Finding>> {
    let manifest = match load_manifest(snapshot_dir)? {
        ManifestLoad::Missing => return Ok(vec![Finding::ManifestMissing]),
        ManifestLoad::Invalid(reason) => {
            warn!(snapshot = %snapshot_dir.display(), %reason, "Rejected manifest");
            return Ok(vec![Finding::ManifestInvalid]);
        }
        ManifestLoad::Loaded(manifest) => manifest,
    };

    let mut findings = Vec::new();
    for file in &manifest.files {
        let absolute = snapshot_dir.join(&file.path);

        let is_file = match fs::metadata(&absolute) {
            Ok(metadata) => metadata.is_file(),
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => return Err(e.into()),
        };
        if !is_file {
            findings.push(Finding::FileMissing(file.path.clone()));
            continue;
        }

        if file_sha256(&absolute)? != file.sha256 {
            findings.push(Finding::ChecksumMismatch(file.path.clone()));
        }
    }

    Ok(findings)
}
