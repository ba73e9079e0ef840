//! Idempotency keys for commit attempts.

use garage_core::FormData;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Derive the key for committing `step_id` with `data`.
///
/// Equal inputs give equal keys, so a verbatim retry after a failure or a
/// timeout carries the same key and the backend can deduplicate it.
/// `generation` counts resets of the wizard; answers entered again after a
/// reset are a new submission.
pub fn commit_key(wizard_id: Uuid, generation: u64, step_id: &str, data: &FormData) -> String {
    let mut hasher = Sha256::new();
    hasher.update(wizard_id.as_bytes());
    hasher.update(generation.to_be_bytes());
    hasher.update(step_id.as_bytes());
    hasher.update([0u8]);
    hasher.update(data.canonical_json().as_bytes());
    hex_encode(hasher.finalize())
}

fn hex_encode(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
}
