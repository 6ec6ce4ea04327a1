//! Proof engine configuration from environment variables.

use crate::domain::{
    VerifiedStateCache, DEFAULT_ACCOUNT_CAPACITY, DEFAULT_CODE_CAPACITY, DEFAULT_STORAGE_CAPACITY,
    MAX_PROOF_DEPTH,
};
use std::env;

/// Configuration for proof generation, verification and caching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofConfig {
    /// Re-hash node bytes read from a node store and reject mismatches
    pub verify_node_hashes: bool,

    /// Maximum storage keys accepted by one account proof request
    pub max_storage_keys: usize,

    /// Maximum number of nodes accepted in a proof during verification
    pub max_proof_depth: usize,

    /// LRU capacity for cached accounts
    pub cache_account_capacity: usize,

    /// LRU capacity for cached storage slots, across all accounts
    pub cache_storage_capacity: usize,

    /// LRU capacity for cached contract code
    pub cache_code_capacity: usize,
}

impl Default for ProofConfig {
    fn default() -> Self {
        Self {
            verify_node_hashes: true,
            max_storage_keys: 1024,
            max_proof_depth: MAX_PROOF_DEPTH,
            cache_account_capacity: DEFAULT_ACCOUNT_CAPACITY,
            cache_storage_capacity: DEFAULT_STORAGE_CAPACITY,
            cache_code_capacity: DEFAULT_CODE_CAPACITY,
        }
    }
}

impl ProofConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `STATE_PROOFS_VERIFY_NODE_HASHES`: Verify store reads (default: true)
    /// - `STATE_PROOFS_MAX_STORAGE_KEYS`: Storage keys per request (default: 1024)
    /// - `STATE_PROOFS_MAX_PROOF_DEPTH`: Nodes per verified proof (default: 64)
    /// - `STATE_PROOFS_CACHE_ACCOUNTS`: Cached accounts (default: 10000)
    /// - `STATE_PROOFS_CACHE_STORAGE`: Cached storage slots (default: 100000)
    /// - `STATE_PROOFS_CACHE_CODE`: Cached code blobs (default: 1000)
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            verify_node_hashes: env::var("STATE_PROOFS_VERIFY_NODE_HASHES")
                .map(|v| v.to_lowercase() != "false" && v != "0")
                .unwrap_or(defaults.verify_node_hashes),

            max_storage_keys: parse_env("STATE_PROOFS_MAX_STORAGE_KEYS")
                .unwrap_or(defaults.max_storage_keys),

            max_proof_depth: parse_env("STATE_PROOFS_MAX_PROOF_DEPTH")
                .unwrap_or(defaults.max_proof_depth),

            cache_account_capacity: parse_env("STATE_PROOFS_CACHE_ACCOUNTS")
                .unwrap_or(defaults.cache_account_capacity),

            cache_storage_capacity: parse_env("STATE_PROOFS_CACHE_STORAGE")
                .unwrap_or(defaults.cache_storage_capacity),

            cache_code_capacity: parse_env("STATE_PROOFS_CACHE_CODE")
                .unwrap_or(defaults.cache_code_capacity),
        }
    }

    /// Build a verified state cache sized by this configuration.
    pub fn state_cache(&self) -> VerifiedStateCache {
        VerifiedStateCache::with_capacity(
            self.cache_account_capacity,
            self.cache_storage_capacity,
            self.cache_code_capacity,
        )
    }
}

fn parse_env(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
