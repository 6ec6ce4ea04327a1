//! # Domain Entities for State Proofs
//!
//! Core data structures shared by the trie, the root calculator and the
//! proof service.
//!
//! ## Type Decisions
//!
//! - `balance: U256` - Account balances are full 256-bit integers so that
//!   the RLP account record hashes identically to any other Ethereum client.
//! - Addresses travel as hex strings at the edges (state store keys, cache
//!   keys) and as 20-byte arrays inside the trie.

use super::encoding;
use super::StateProofError;
use primitive_types::U256;
use rlp::{Rlp, RlpStream};
use serde::{Deserialize, Serialize};

pub type Hash = [u8; 32];
pub type Address = [u8; 20];

/// Keccak256 hash of an empty RLP-encoded trie.
/// This is the canonical empty trie root per Ethereum specification.
/// Value: keccak256(RLP("")) = 0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421
pub const EMPTY_TRIE_HASH: Hash = [
    0x56, 0xe8, 0x1f, 0x17, 0x1b, 0xcc, 0x55, 0xa6, 0xff, 0x83, 0x45, 0xe6, 0x92, 0xc0, 0xf8, 0x6e,
    0x5b, 0x48, 0xe0, 0x1b, 0x99, 0x6c, 0xad, 0xc0, 0x01, 0x62, 0x2f, 0xb5, 0xe3, 0x63, 0xb4, 0x21,
];

/// Keccak256 of zero-length data, the code hash of accounts without code.
/// Value: keccak256("") = 0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470
pub const EMPTY_DATA_HASH: Hash = [
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
];

/// Account record stored as the leaf value of the world-state trie.
///
/// ## Serialization
///
/// RLP-encoded as: [nonce, balance, storage_root, code_hash]
/// This ordering matches Ethereum's account encoding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Transaction count.
    pub nonce: u64,
    /// Balance in base units.
    pub balance: U256,
    /// Root hash of the account's storage trie (EMPTY_TRIE_HASH if empty).
    pub storage_root: Hash,
    /// Keccak256 hash of contract code (EMPTY_DATA_HASH for accounts without code).
    pub code_hash: Hash,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            nonce: 0,
            balance: U256::zero(),
            storage_root: EMPTY_TRIE_HASH,
            code_hash: EMPTY_DATA_HASH,
        }
    }
}

impl Account {
    /// Create a new account with the specified balance.
    pub fn new(balance: U256) -> Self {
        Self {
            balance,
            ..Default::default()
        }
    }

    /// Builder method to set nonce.
    pub fn with_nonce(mut self, nonce: u64) -> Self {
        self.nonce = nonce;
        self
    }

    /// Builder method to set the code hash.
    pub fn with_code_hash(mut self, code_hash: Hash) -> Self {
        self.code_hash = code_hash;
        self
    }

    /// Builder method to set the storage root.
    pub fn with_storage_root(mut self, storage_root: Hash) -> Self {
        self.storage_root = storage_root;
        self
    }

    /// RLP-encode this account for use as a trie leaf value.
    pub fn rlp_encode(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(4);
        stream.append(&self.nonce);
        stream.append(&self.balance);
        stream.append(&self.storage_root.to_vec());
        stream.append(&self.code_hash.to_vec());
        stream.out().to_vec()
    }

    /// Decode an account record from a trie leaf value.
    pub fn rlp_decode(bytes: &[u8]) -> Result<Self, StateProofError> {
        let record = Rlp::new(bytes);
        if !record.is_list() || record.item_count()? != 4 {
            return Err(StateProofError::MalformedNode(
                "account record must be a 4-item list".to_string(),
            ));
        }

        Ok(Self {
            nonce: record.val_at(0)?,
            balance: record.val_at(1)?,
            storage_root: encoding::hash_from_slice(record.at(2)?.data()?)?,
            code_hash: encoding::hash_from_slice(record.at(3)?.data()?)?,
        })
    }
}

/// Normalise a hex address or slot key for use as a map key.
///
/// Lower-cases and strips an optional `0x` prefix, so `0xAbC` and `abc`
/// address the same entry.
pub fn normalize_hex(value: &str) -> String {
    let trimmed = value.trim();
    let stripped = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    stripped.to_ascii_lowercase()
}

/// Parse a hex address and left-pad it with zero bytes to 20 bytes.
pub fn pad_address(address: &str) -> Result<Address, StateProofError> {
    let normalized = normalize_hex(address);
    if normalized.is_empty() {
        return Err(StateProofError::InvalidArgument(
            "address must not be empty".to_string(),
        ));
    }

    // Odd-length hex is treated as having an implicit leading zero.
    let even = if normalized.len() % 2 == 1 {
        format!("0{normalized}")
    } else {
        normalized
    };

    let bytes = hex::decode(&even)
        .map_err(|e| StateProofError::InvalidArgument(format!("invalid address hex: {e}")))?;
    if bytes.len() > 20 {
        return Err(StateProofError::InvalidArgument(format!(
            "address is {} bytes, expected at most 20",
            bytes.len()
        )));
    }

    let mut padded = [0u8; 20];
    padded[20 - bytes.len()..].copy_from_slice(&bytes);
    Ok(padded)
}

/// Canonical string form of an address: 40 lowercase hex digits, no prefix.
///
/// `0x01`, `0x0001` and the full padded form all map to the same string.
pub fn canonical_address(address: &str) -> Result<String, StateProofError> {
    Ok(hex::encode(pad_address(address)?))
}

/// Encode a storage slot index as a 32-byte big-endian word.
pub fn pad_slot(slot: &U256) -> Hash {
    let mut padded = [0u8; 32];
    slot.to_big_endian(&mut padded);
    padded
}

/// Secure-trie key of an account: Keccak256 of the padded address.
pub fn account_key(address: &Address) -> Hash {
    encoding::keccak256(address)
}

/// Secure-trie key of a storage slot: Keccak256 of the padded slot index.
pub fn storage_key(slot: &U256) -> Hash {
    encoding::keccak256(&pad_slot(slot))
}
