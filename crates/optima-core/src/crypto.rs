// crates/optima-core/src/crypto.rs

use sha2::{Digest, Sha256};

use crate::identity::ValidatorId;

/// Compute SHA-256 hash of the given bytes.
///
/// Returns a 32-byte hash.
pub fn hash_bytes(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Simulated block hash: hex SHA-256 of `"{id}-{height}"`.
///
/// Not a real block commitment; it only has to be stable per (id, height).
pub fn block_hash(id: &ValidatorId, height: u64) -> String {
    hex::encode(hash_bytes(format!("{}-{}", id, height).as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_bytes() {
        let data = b"optimachain";
        let hash = hash_bytes(data);
        assert_eq!(hash.len(), 32);

        // Same input should produce same hash
        let hash2 = hash_bytes(data);
        assert_eq!(hash, hash2);

        // Different input should produce different hash
        let hash3 = hash_bytes(b"different");
        assert_ne!(hash, hash3);
    }

    #[test]
    fn test_block_hash_matches_manual_digest() {
        let id = ValidatorId::from("deadbeef");
        let expected = hex::encode(hash_bytes(b"deadbeef-12"));
        assert_eq!(block_hash(&id, 12), expected);
        assert_eq!(block_hash(&id, 12).len(), 64);
        assert_ne!(block_hash(&id, 12), block_hash(&id, 13));
    }
}
