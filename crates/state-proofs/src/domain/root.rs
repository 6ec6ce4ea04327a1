//! Root calculation for storage and world-state tries.
//!
//! Keys handed to these functions are already secure-trie keys (Keccak256 of
//! the padded slot or address); see [`hash_storage_slots`] and
//! [`hash_accounts`] for the conversion.

use super::{
    account_key, encode_storage_value, hex_hash, storage_key, trim_leading_zeros, Account,
    Address, Hash, PatriciaTrie, StateProofError, EMPTY_TRIE_HASH,
};
use crate::ports::TrieNodeStore;
use primitive_types::U256;
use std::collections::HashMap;

/// Re-key a slot map by secure storage key.
pub fn hash_storage_slots(slots: &HashMap<U256, Vec<u8>>) -> HashMap<Hash, Vec<u8>> {
    slots
        .iter()
        .map(|(slot, value)| (storage_key(slot), value.clone()))
        .collect()
}

/// Re-key an account map by secure account key.
pub fn hash_accounts(accounts: &HashMap<Address, Account>) -> HashMap<Hash, Account> {
    accounts
        .iter()
        .map(|(address, account)| (account_key(address), account.clone()))
        .collect()
}

/// Build a storage trie over `slots` without committing it.
///
/// Values are raw big-endian bytes; each is stored as its RLP encoding with
/// leading zeros stripped. Zero values are not stored, as in Ethereum state.
/// A value wider than 32 significant bytes is `InvalidArgument`.
pub fn build_storage_trie<S>(
    slots: &HashMap<Hash, Vec<u8>>,
    store: &S,
) -> Result<PatriciaTrie, StateProofError>
where
    S: TrieNodeStore + ?Sized,
{
    let mut trie = PatriciaTrie::new();
    for (key, value) in slots {
        let significant = trim_leading_zeros(value);
        if significant.is_empty() {
            continue;
        }
        if significant.len() > 32 {
            return Err(StateProofError::InvalidArgument(format!(
                "storage value under key {} is {} bytes, expected at most 32",
                hex_hash(key),
                significant.len()
            )));
        }
        trie.put(key, encode_storage_value(value), store)?;
    }
    Ok(trie)
}

/// Root of the storage trie over `slots`, committed to `store`.
///
/// An empty slot map yields `EMPTY_TRIE_HASH` without touching the store.
pub fn calculate_storage_root<S>(
    slots: &HashMap<Hash, Vec<u8>>,
    store: &S,
) -> Result<Hash, StateProofError>
where
    S: TrieNodeStore + ?Sized,
{
    if slots.is_empty() {
        return Ok(EMPTY_TRIE_HASH);
    }
    build_storage_trie(slots, store)?.commit(store)
}

/// Build the world-state trie over already-hashed account keys.
pub fn build_state_trie<S>(
    accounts: &HashMap<Hash, Account>,
    store: &S,
) -> Result<PatriciaTrie, StateProofError>
where
    S: TrieNodeStore + ?Sized,
{
    let mut trie = PatriciaTrie::new();
    for (key, account) in accounts {
        trie.put(key, account.rlp_encode(), store)?;
    }
    Ok(trie)
}

/// Root of the world-state trie over `accounts`, committed to `store`.
pub fn calculate_state_root<S>(
    accounts: &HashMap<Hash, Account>,
    store: &S,
) -> Result<Hash, StateProofError>
where
    S: TrieNodeStore + ?Sized,
{
    if accounts.is_empty() {
        return Ok(EMPTY_TRIE_HASH);
    }
    build_state_trie(accounts, store)?.commit(store)
}
