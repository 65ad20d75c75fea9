use serde::Serialize;
use sha2::{Digest, Sha256};

/// Stable content hash for a dataset payload: SHA-256 over its compact JSON.
pub fn hash_dataset_payload<T: Serialize + ?Sized>(payload: &T) -> anyhow::Result<String> {
    let json = serde_json::to_vec(payload)?;
    Ok(format!("{:x}", Sha256::digest(&json)))
}
