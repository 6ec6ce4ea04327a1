//! # Proof Service
//!
//! Builds `eth_getProof`-style account and storage proofs against a state
//! root.
//!
//! ## Strategy Selection
//!
//! - **Incremental**: a persistent [`TrieNodeStore`] is configured and the
//!   caller supplies a non-empty state root. The world-state trie is opened
//!   at that root and walked lazily.
//! - **Full rebuild**: otherwise. Every account is read from the
//!   [`StateStore`] and a transient world-state trie is built in a private
//!   in-memory node store. Both strategies yield identical proofs for the
//!   same logical state.
//!
//! Storage proofs always come from a transient trie over the account's full
//! slot map.

use crate::adapters::InMemoryTrieNodeStore;
use crate::config::ProofConfig;
use crate::domain::{
    account_key, build_state_trie, build_storage_trie, calculate_storage_root,
    decode_storage_value, hash_from_slice, hash_storage_slots, hex_hash, pad_address,
    storage_key, verify_account_proof, Account, AccountProof, Hash, PatriciaTrie,
    StateProofError, StorageProof, EMPTY_TRIE_HASH,
};
use crate::ports::{StateStore, TrieNodeStore};

use primitive_types::U256;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// The proof generation service.
///
/// This service:
/// 1. Reads account and storage state from the [`StateStore`]
/// 2. Chooses between incremental and full-rebuild proof strategies
/// 3. Assembles account and storage proofs
pub struct ProofService<S: StateStore> {
    config: ProofConfig,
    state: Arc<S>,
    /// Persistent world-state trie nodes, if any.
    node_store: Option<Arc<dyn TrieNodeStore>>,
}

impl<S: StateStore> ProofService<S> {
    /// Create a service that always rebuilds the world-state trie.
    pub fn new(state: Arc<S>, config: ProofConfig) -> Self {
        Self {
            config,
            state,
            node_store: None,
        }
    }

    /// Attach a persistent node store, enabling the incremental strategy.
    pub fn with_node_store(mut self, node_store: Arc<dyn TrieNodeStore>) -> Self {
        self.node_store = Some(node_store);
        self
    }

    pub fn config(&self) -> &ProofConfig {
        &self.config
    }

    /// Generate an account proof with storage proofs for `storage_keys`.
    ///
    /// `state_root` selects the incremental strategy when a node store is
    /// attached; `None`, an empty slice or `EMPTY_TRIE_HASH` force a full
    /// rebuild.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for a malformed address or state root, or too
    ///   many storage keys
    /// - `MissingNode` if the persistent store lacks a node on the path
    /// - `MalformedNode` for corrupt node bytes
    /// - `StateStore` for faults of the state store
    #[instrument(
        skip(self, address, storage_keys, state_root),
        fields(address = %address, storage_keys = storage_keys.len())
    )]
    pub async fn generate_account_proof(
        &self,
        address: &str,
        storage_keys: &[U256],
        state_root: Option<&[u8]>,
    ) -> Result<AccountProof, StateProofError> {
        if storage_keys.len() > self.config.max_storage_keys {
            return Err(StateProofError::InvalidArgument(format!(
                "{} storage keys requested, limit is {}",
                storage_keys.len(),
                self.config.max_storage_keys
            )));
        }

        let padded = pad_address(address)?;
        let canonical = hex::encode(padded);
        let requested_root = parse_state_root(state_root)?;
        let account = self.state.get_account(&canonical).await?.unwrap_or_default();
        let storage = self.state.get_all_storage(&canonical).await?;
        let key = account_key(&padded);

        let account_proofs = match (requested_root, &self.node_store) {
            (Some(root), Some(node_store)) => {
                debug!(state_root = %hex_hash(&root), "Using incremental proof strategy");
                PatriciaTrie::load_from_storage(root, node_store.as_ref())?
                    .with_hash_verification(self.config.verify_node_hashes)
                    .generate_proof(&key, node_store.as_ref())?
            }
            _ => {
                debug!(
                    has_node_store = self.node_store.is_some(),
                    "Using full-rebuild proof strategy"
                );
                let transient = InMemoryTrieNodeStore::new();
                let trie = self.build_world_state(&transient).await?;
                if let Some(root) = requested_root {
                    if root != trie.root_hash() {
                        warn!(
                            requested = %hex_hash(&root),
                            rebuilt = %hex_hash(&trie.root_hash()),
                            "Rebuilt state root differs from requested root"
                        );
                    }
                }
                trie.generate_proof(&key, &transient)?
            }
        };

        let (storage_hash, storage_proof) = self.storage_proofs(&storage, storage_keys)?;

        debug!(
            account_nodes = account_proofs.len(),
            storage_proofs = storage_proof.len(),
            "Account proof generated"
        );

        Ok(AccountProof {
            address: padded,
            balance: account.balance,
            code_hash: account.code_hash,
            nonce: account.nonce,
            storage_hash,
            account_proofs,
            storage_proof,
        })
    }

    /// Rebuild the world-state trie from the state store and return its root.
    ///
    /// With a persistent node store attached, the trie (storage tries
    /// included) is committed to it, so later requests can use the
    /// incremental strategy at the returned root.
    #[instrument(skip(self))]
    pub async fn compute_state_root(&self) -> Result<Hash, StateProofError> {
        match &self.node_store {
            Some(node_store) => {
                let mut trie = self.build_world_state(node_store.as_ref()).await?;
                trie.commit(node_store.as_ref())
            }
            None => {
                let transient = InMemoryTrieNodeStore::new();
                Ok(self.build_world_state(&transient).await?.root_hash())
            }
        }
    }

    /// Check an account proof against `state_root` using the configured
    /// depth limit.
    pub fn verify_account_proof(
        &self,
        state_root: &Hash,
        proof: &AccountProof,
    ) -> Result<(), StateProofError> {
        verify_account_proof(state_root, proof, self.config.max_proof_depth)
    }

    /// Build the world-state trie over every account in the state store.
    ///
    /// Each account's storage root is recomputed from its slots; storage
    /// trie nodes are committed to `store`. Two store entries that pad to the
    /// same address are rejected rather than resolved by iteration order.
    async fn build_world_state(
        &self,
        store: &dyn TrieNodeStore,
    ) -> Result<PatriciaTrie, StateProofError> {
        let accounts = self.state.get_all_accounts().await?;

        let mut records: HashMap<Hash, Account> = HashMap::with_capacity(accounts.len());
        for (address, account) in accounts {
            let padded = pad_address(&address)?;
            let canonical = hex::encode(padded);
            let slots = self.state.get_all_storage(&canonical).await?;
            let storage_root = calculate_storage_root(&hash_storage_slots(&slots), store)?;
            let record = account.with_storage_root(storage_root);
            if records.insert(account_key(&padded), record).is_some() {
                return Err(StateProofError::StateStore(format!(
                    "several state store entries resolve to address 0x{canonical}"
                )));
            }
        }

        let trie = build_state_trie(&records, store)?;
        info!(
            accounts = records.len(),
            state_root = %hex_hash(&trie.root_hash()),
            "World-state trie rebuilt"
        );
        Ok(trie.with_hash_verification(self.config.verify_node_hashes))
    }

    /// Storage root and one storage proof per requested key.
    fn storage_proofs(
        &self,
        storage: &HashMap<U256, Vec<u8>>,
        storage_keys: &[U256],
    ) -> Result<(Hash, Vec<StorageProof>), StateProofError> {
        if storage.is_empty() {
            let proofs = storage_keys.iter().copied().map(StorageProof::empty).collect();
            return Ok((EMPTY_TRIE_HASH, proofs));
        }

        let transient = InMemoryTrieNodeStore::new();
        let trie = build_storage_trie(&hash_storage_slots(storage), &transient)?;

        let mut proofs = Vec::with_capacity(storage_keys.len());
        for slot in storage_keys {
            let key = storage_key(slot);
            let value = match trie.get(&key, &transient)? {
                Some(encoded) => decode_storage_value(&encoded)?,
                None => U256::zero(),
            };
            proofs.push(StorageProof {
                key: *slot,
                value,
                proof: trie.generate_proof(&key, &transient)?,
            });
        }

        Ok((trie.root_hash(), proofs))
    }
}

/// `None` for an absent, empty or empty-trie root.
fn parse_state_root(state_root: Option<&[u8]>) -> Result<Option<Hash>, StateProofError> {
    let Some(bytes) = state_root.filter(|b| !b.is_empty()) else {
        return Ok(None);
    };
    let root = hash_from_slice(bytes)
        .map_err(|_| StateProofError::InvalidArgument(format!(
            "state root is {} bytes, expected 32",
            bytes.len()
        )))?;
    Ok((root != EMPTY_TRIE_HASH).then_some(root))
}
