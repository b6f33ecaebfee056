//! CRC32 checksums over persisted dataset files
//!
//! The checksum of every data file is recorded in the metadata listing at
//! write time and re-verified on every cold read.

use crc32fast::Hasher;

use super::errors::{StoreError, StoreResult};

/// Computes the CRC32 (IEEE) checksum of a dataset file's bytes
pub fn compute_checksum(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Verifies dataset bytes against the checksum recorded for `id`
pub fn verify_dataset(id: &str, data: &[u8], expected: u32) -> StoreResult<()> {
    let actual = compute_checksum(data);
    if actual != expected {
        return Err(StoreError::Corrupted {
            id: id.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
