use super::{Hash, StateProofError};
use primitive_types::U256;
use rlp::Rlp;
use sha3::{Digest, Keccak256};

// =============================================================================
// HASHING & VALUE ENCODING HELPERS
// =============================================================================

/// Compute Keccak256 hash.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Copy a 32-byte slice into a `Hash`.
pub fn hash_from_slice(bytes: &[u8]) -> Result<Hash, StateProofError> {
    bytes.try_into().map_err(|_| {
        StateProofError::MalformedNode(format!("expected 32-byte hash, got {} bytes", bytes.len()))
    })
}

/// Strip leading zero bytes from a big-endian integer.
pub fn trim_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// RLP-encode a raw storage value for use as a storage-trie leaf value.
///
/// Storage values are big-endian integers; leading zeros are stripped before
/// encoding so `0x002a` and `0x2a` produce the same leaf.
pub fn encode_storage_value(value: &[u8]) -> Vec<u8> {
    rlp::encode(&trim_leading_zeros(value).to_vec()).to_vec()
}

/// Decode a storage-trie leaf value back into its integer form.
pub fn decode_storage_value(encoded: &[u8]) -> Result<U256, StateProofError> {
    let data: Vec<u8> = Rlp::new(encoded).as_val()?;
    let trimmed = trim_leading_zeros(&data);
    if trimmed.len() > 32 {
        return Err(StateProofError::MalformedNode(format!(
            "storage value is {} bytes, expected at most 32",
            trimmed.len()
        )));
    }
    Ok(U256::from_big_endian(trimmed))
}

/// Render a hash as `0x`-prefixed hex for logs and error messages.
pub fn hex_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}
