//! # Verified State Cache (Block-Scoped LRU)
//!
//! Read cache for accounts, code and storage values that were already
//! fetched and verified at a given block.
//!
//! ## Problem
//!
//! Account and storage values are only valid for the block they were read
//! at. Serving them after the head moves returns stale state.
//!
//! ## Solution: Scope-Tagged Cache
//!
//! The whole cache is tagged with `(block_number, state_root)`. Moving to a
//! different scope flushes accounts and storage. Code is content-addressed
//! and immutable, so it survives block transitions.
//!
//! All mutations and reads go through one mutex, so a scope change can
//! never interleave with a read that straddles two blocks.

use super::{encoding, hex_hash, normalize_hex, Account, Hash, StateProofError};
use lru::LruCache;
use parking_lot::Mutex;
use primitive_types::U256;
use std::num::NonZeroUsize;
use tracing::{debug, warn};

/// Default number of cached accounts.
pub const DEFAULT_ACCOUNT_CAPACITY: usize = 10_000;
/// Default number of cached storage slots, across all accounts.
pub const DEFAULT_STORAGE_CAPACITY: usize = 100_000;
/// Default number of cached code blobs.
pub const DEFAULT_CODE_CAPACITY: usize = 1_000;

/// `(address, slot)`, both normalised.
type SlotKey = (String, String);

struct CacheInner {
    block_number: u64,
    state_root: Option<Hash>,
    accounts: LruCache<String, Account>,
    storage: LruCache<SlotKey, U256>,
    code: LruCache<String, Vec<u8>>,
}

impl CacheInner {
    fn clear_block_state(&mut self) {
        self.accounts.clear();
        self.storage.clear();
    }
}

/// Block-scoped cache of verified state.
///
/// Addresses and slot keys are hex strings compared case-insensitively,
/// with or without a `0x` prefix.
pub struct VerifiedStateCache {
    inner: Mutex<CacheInner>,
}

impl VerifiedStateCache {
    /// Create a cache with default capacities.
    pub fn new() -> Self {
        Self::with_capacity(
            DEFAULT_ACCOUNT_CAPACITY,
            DEFAULT_STORAGE_CAPACITY,
            DEFAULT_CODE_CAPACITY,
        )
    }

    /// Create with custom LRU capacities (zero is treated as one).
    ///
    /// `storage_capacity` bounds the number of cached slots over all accounts.
    pub fn with_capacity(
        account_capacity: usize,
        storage_capacity: usize,
        code_capacity: usize,
    ) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                block_number: 0,
                state_root: None,
                accounts: LruCache::new(non_zero(account_capacity)),
                storage: LruCache::new(non_zero(storage_capacity)),
                code: LruCache::new(non_zero(code_capacity)),
            }),
        }
    }

    /// Move the cache to `(block_number, state_root)`.
    ///
    /// If either differs from the current scope, cached accounts and storage
    /// are dropped. Cached code is kept.
    pub fn set_block(&self, block_number: u64, state_root: &[u8]) -> Result<(), StateProofError> {
        if state_root.is_empty() {
            return Err(StateProofError::InvalidArgument(
                "state root must not be empty".to_string(),
            ));
        }
        let state_root = encoding::hash_from_slice(state_root)
            .map_err(|e| StateProofError::InvalidArgument(e.to_string()))?;

        let mut inner = self.inner.lock();
        if inner.block_number == block_number && inner.state_root == Some(state_root) {
            return Ok(());
        }

        if inner.state_root.is_some() && block_number < inner.block_number {
            warn!(
                from = inner.block_number,
                to = block_number,
                "Verified state cache scope moved backwards"
            );
        }
        debug!(
            block = block_number,
            state_root = %hex_hash(&state_root),
            flushed_accounts = inner.accounts.len(),
            "Verified state cache scope changed"
        );

        inner.clear_block_state();
        inner.block_number = block_number;
        inner.state_root = Some(state_root);
        Ok(())
    }

    /// Current `(block_number, state_root)`; `state_root` is `None` until
    /// the first [`set_block`](Self::set_block).
    pub fn scope(&self) -> (u64, Option<Hash>) {
        let inner = self.inner.lock();
        (inner.block_number, inner.state_root)
    }

    pub fn set_account(&self, address: &str, account: Account) -> Result<(), StateProofError> {
        let key = cache_key(address, "address")?;
        self.inner.lock().accounts.put(key, account);
        Ok(())
    }

    pub fn try_get_account(&self, address: &str) -> Result<Option<Account>, StateProofError> {
        let key = cache_key(address, "address")?;
        Ok(self.inner.lock().accounts.get(&key).cloned())
    }

    pub fn set_code(&self, address: &str, code: Vec<u8>) -> Result<(), StateProofError> {
        let key = cache_key(address, "address")?;
        self.inner.lock().code.put(key, code);
        Ok(())
    }

    pub fn try_get_code(&self, address: &str) -> Result<Option<Vec<u8>>, StateProofError> {
        let key = cache_key(address, "address")?;
        Ok(self.inner.lock().code.get(&key).cloned())
    }

    pub fn set_storage(&self, address: &str, slot: &str, value: U256) -> Result<(), StateProofError> {
        let address = cache_key(address, "address")?;
        let slot = cache_key(slot, "storage slot")?;
        self.inner.lock().storage.put((address, slot), value);
        Ok(())
    }

    pub fn try_get_storage(&self, address: &str, slot: &str) -> Result<Option<U256>, StateProofError> {
        let address = cache_key(address, "address")?;
        let slot = cache_key(slot, "storage slot")?;
        Ok(self.inner.lock().storage.get(&(address, slot)).copied())
    }

    /// Reset the scope to block 0 with no state root and drop everything,
    /// code included.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.clear_block_state();
        inner.code.clear();
        inner.block_number = 0;
        inner.state_root = None;
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        CacheStats {
            accounts: inner.accounts.len(),
            account_capacity: inner.accounts.cap().get(),
            storage_slots: inner.storage.len(),
            storage_capacity: inner.storage.cap().get(),
            code_entries: inner.code.len(),
            code_capacity: inner.code.cap().get(),
            block_number: inner.block_number,
        }
    }
}

impl Default for VerifiedStateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics for monitoring.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheStats {
    pub accounts: usize,
    pub account_capacity: usize,
    pub storage_slots: usize,
    pub storage_capacity: usize,
    pub code_entries: usize,
    pub code_capacity: usize,
    pub block_number: u64,
}

fn non_zero(capacity: usize) -> NonZeroUsize {
    NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
}

fn cache_key(value: &str, what: &str) -> Result<String, StateProofError> {
    let key = normalize_hex(value);
    if key.is_empty() {
        return Err(StateProofError::InvalidArgument(format!(
            "{what} must not be empty"
        )));
    }
    Ok(key)
}
