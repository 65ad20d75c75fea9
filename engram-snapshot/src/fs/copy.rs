//! Recursive byte-for-byte directory copy.

use crate::utils::Result;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Copy every file under `src` into `dst`, recreating the directory layout.
///
/// Symlinked files are copied by content; symlinks to directories and broken
/// links are skipped. Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path) -> Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;

    for entry in WalkDir::new(src).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        let relative = match entry.path().strip_prefix(src) {
            Ok(relative) if !relative.as_os_str().is_empty() => relative,
            _ => continue,
        };
        let target = dst.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
            continue;
        }

        if file_type.is_symlink() {
            match fs::metadata(entry.path()) {
                Ok(resolved) if resolved.is_file() => {}
                _ => {
                    tracing::debug!(path = %entry.path().display(), "Skipping non-file symlink");
                    continue;
                }
            }
        }

        fs::copy(entry.path(), &target)?;
        copied += 1;
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_nested_tree() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");

        fs::create_dir_all(src.join("a/b"))?;
        fs::write(src.join("top.txt"), b"top")?;
        fs::write(src.join("a/b/deep.txt"), b"deep")?;

        let copied = copy_tree(&src, &dst)?;

        assert_eq!(copied, 2);
        assert_eq!(fs::read(dst.join("top.txt"))?, b"top");
        assert_eq!(fs::read(dst.join("a/b/deep.txt"))?, b"deep");
        Ok(())
    }

    #[test]
    fn test_copy_keeps_empty_directories() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let src = temp_dir.path().join("src");
        let dst = temp_dir.path().join("dst");

        fs::create_dir_all(src.join("empty"))?;

        assert_eq!(copy_tree(&src, &dst)?, 0);
        assert!(dst.join("empty").is_dir());
        Ok(())
    }
}
