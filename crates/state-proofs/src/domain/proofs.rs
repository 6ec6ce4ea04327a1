//! # Account and Storage Proof Structures
//!
//! Output of [`ProofService::generate_account_proof`](crate::ProofService::generate_account_proof),
//! shaped like an `eth_getProof` response.
//!
//! ## Purpose
//!
//! Proofs allow light clients to verify account state and storage values
//! without downloading the whole state. Each proof list holds the encoded
//! trie nodes from the root towards the target key; replaying it with
//! [`verify_proof`](super::verify_proof) reconstructs the root.
//!
//! An account or slot that does not exist is not an error: its proof is an
//! exclusion proof and the reported fields carry their zero values.

use super::{Account, Address, Hash};
use primitive_types::U256;
use serde::{Deserialize, Serialize};

/// Proof of an account's state (inclusion or exclusion) under a state root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProof {
    /// Account address, left-padded to 20 bytes.
    pub address: Address,
    pub balance: U256,
    /// Keccak256 of the account code (EMPTY_DATA_HASH without code).
    pub code_hash: Hash,
    pub nonce: u64,
    /// Root of the account's storage trie (EMPTY_TRIE_HASH without storage).
    pub storage_hash: Hash,
    /// Encoded world-state trie nodes, root first.
    pub account_proofs: Vec<Vec<u8>>,
    /// One entry per requested storage key, in request order.
    pub storage_proof: Vec<StorageProof>,
}

impl AccountProof {
    /// Account record implied by the proof's fields.
    pub fn account(&self) -> Account {
        Account {
            nonce: self.nonce,
            balance: self.balance,
            storage_root: self.storage_hash,
            code_hash: self.code_hash,
        }
    }

    /// Check if this proves the absence of the account.
    pub fn is_exclusion_proof(&self) -> bool {
        self.account() == Account::default()
    }
}

/// Proof of a single storage slot under an account's storage root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageProof {
    /// Slot index as requested (not hashed).
    pub key: U256,
    /// Stored value, zero if the slot is unset.
    pub value: U256,
    /// Encoded storage trie nodes, root first. Empty when the account has
    /// no storage at all.
    pub proof: Vec<Vec<u8>>,
}

impl StorageProof {
    /// Zero-value proof for an account without storage.
    pub fn empty(key: U256) -> Self {
        Self {
            key,
            value: U256::zero(),
            proof: Vec::new(),
        }
    }
}
