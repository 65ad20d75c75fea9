//! SHA-256 content digests.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Length of a hex-encoded SHA-256 digest.
pub const SHA256_HEX_LEN: usize = 64;

/// Stream a file through SHA-256 and return the lowercase hex digest.
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// True for a 64-character lowercase hex string.
pub fn is_sha256_hex(value: &str) -> bool {
    value.len() == SHA256_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_file_sha256_matches_manual_digest() -> io::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"hello world")?;
        tmp.flush()?;

        let expected = format!("{:x}", Sha256::digest(b"hello world"));
        assert_eq!(file_sha256(tmp.path())?, expected);
        assert_eq!(
            expected,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        Ok(())
    }

    #[test]
    fn test_file_sha256_spans_buffers() -> io::Result<()> {
        let data = vec![7_u8; 20_000];
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(&data)?;
        tmp.flush()?;

        let expected = format!("{:x}", Sha256::digest(&data));
        assert_eq!(file_sha256(tmp.path())?, expected);
        Ok(())
    }

    #[test]
    fn test_is_sha256_hex() {
        assert!(is_sha256_hex(&"a".repeat(64)));
        assert!(!is_sha256_hex(&"A".repeat(64)));
        assert!(!is_sha256_hex(&"a".repeat(63)));
        assert!(!is_sha256_hex(&"g".repeat(64)));
    }
}
