//! # Node Store Integration Tests
//!
//! Behaviour of the engine on top of persistent `TrieNodeStore` and
//! `StateStore` implementations:
//!
//! - Loaded tries fetch only the nodes on the walked path
//! - I/O faults surface as `StoreUnavailable` / `StateStore`
//! - Corrupt node bytes surface as `MalformedNode`

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use primitive_types::U256;
    use state_proofs::{
        Account, Hash, InMemoryStateStore, InMemoryTrieNodeStore, PatriciaTrie,
        ProofConfig, ProofService, StateProofError, StateStore, TrieNodeStore,
    };

    use crate::init_test_logging;

    // =============================================================================
    // TEST STORES
    // =============================================================================

    /// Node store that counts reads.
    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryTrieNodeStore,
        reads: AtomicUsize,
    }

    impl CountingStore {
        fn reads(&self) -> usize {
            self.reads.load(Ordering::SeqCst)
        }

        fn reset(&self) {
            self.reads.store(0, Ordering::SeqCst);
        }
    }

    impl TrieNodeStore for CountingStore {
        fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StateProofError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(hash)
        }

        fn put(&self, hash: Hash, encoded: Vec<u8>) -> Result<(), StateProofError> {
            self.inner.put(hash, encoded)
        }
    }

    /// Node store whose backend goes away once its read budget is spent.
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryTrieNodeStore,
        read_budget: Mutex<Option<usize>>,
    }

    impl FlakyStore {
        fn fail_after(&self, reads: usize) {
            *self.read_budget.lock() = Some(reads);
        }
    }

    impl TrieNodeStore for FlakyStore {
        fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StateProofError> {
            if let Some(remaining) = self.read_budget.lock().as_mut() {
                if *remaining == 0 {
                    return Err(StateProofError::StoreUnavailable(
                        "connection reset".to_string(),
                    ));
                }
                *remaining -= 1;
            }
            self.inner.get(hash)
        }

        fn put(&self, hash: Hash, encoded: Vec<u8>) -> Result<(), StateProofError> {
            self.inner.put(hash, encoded)
        }
    }

    /// Node store that serves raw entries without enforcing content addressing.
    #[derive(Default)]
    struct RawStore {
        nodes: Mutex<HashMap<Hash, Vec<u8>>>,
    }

    impl TrieNodeStore for RawStore {
        fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StateProofError> {
            Ok(self.nodes.lock().get(hash).cloned())
        }

        fn put(&self, hash: Hash, encoded: Vec<u8>) -> Result<(), StateProofError> {
            self.nodes.lock().insert(hash, encoded);
            Ok(())
        }
    }

    /// State store whose backend is down.
    struct UnavailableStateStore;

    #[async_trait]
    impl StateStore for UnavailableStateStore {
        async fn get_account(&self, _address: &str) -> Result<Option<Account>, StateProofError> {
            Err(StateProofError::StateStore("database offline".to_string()))
        }

        async fn get_all_accounts(&self) -> Result<HashMap<String, Account>, StateProofError> {
            Err(StateProofError::StateStore("database offline".to_string()))
        }

        async fn get_all_storage(
            &self,
            _address: &str,
        ) -> Result<HashMap<U256, Vec<u8>>, StateProofError> {
            Err(StateProofError::StateStore("database offline".to_string()))
        }
    }

    fn populated_state() -> InMemoryStateStore {
        let state = InMemoryStateStore::new();
        for i in 1..=200u64 {
            state
                .save_account(&format!("0x{i:040x}"), Account::new(U256::from(i)))
                .unwrap();
        }
        state
    }

    // =============================================================================
    // LAZY LOADING
    // =============================================================================

    #[test]
    fn test_loaded_trie_reads_only_path_nodes() {
        let store = CountingStore::default();
        let mut trie = PatriciaTrie::new();
        for i in 0..500u32 {
            trie.put_secure(&i.to_be_bytes(), vec![0xAB; 40], &store).unwrap();
        }
        let root = trie.commit(&store).unwrap();
        let total = store.inner.len();
        store.reset();

        let loaded = PatriciaTrie::load_from_storage(root, &store).unwrap();
        let proof = loaded.generate_secure_proof(&7u32.to_be_bytes(), &store).unwrap();

        // One read for the root check, then one per proof node.
        assert_eq!(store.reads(), proof.len() + 1);
        assert!(store.reads() < total / 10);
    }

    #[test]
    fn test_put_on_loaded_trie_leaves_other_subtrees_untouched() {
        let store = CountingStore::default();
        let mut trie = PatriciaTrie::new();
        for i in 0..500u32 {
            trie.put_secure(&i.to_be_bytes(), vec![0xCD; 40], &store).unwrap();
        }
        let root = trie.commit(&store).unwrap();
        store.reset();

        let mut loaded = PatriciaTrie::load_from_storage(root, &store).unwrap();
        loaded
            .put_secure(&1000u32.to_be_bytes(), vec![0xEF; 40], &store)
            .unwrap();
        assert!(store.reads() <= 8);

        trie.put_secure(&1000u32.to_be_bytes(), vec![0xEF; 40], &store)
            .unwrap();
        assert_eq!(loaded.root_hash(), trie.root_hash());
    }

    // =============================================================================
    // FAULTS
    // =============================================================================

    #[tokio::test]
    async fn test_node_store_fault_propagates() {
        init_test_logging();
        let state = Arc::new(populated_state());
        let flaky = Arc::new(FlakyStore::default());
        let service =
            ProofService::new(state, ProofConfig::default()).with_node_store(flaky.clone());

        let root = service.compute_state_root().await.unwrap();
        service
            .generate_account_proof("0x01", &[], Some(&root))
            .await
            .unwrap();

        // Only the eager root check succeeds.
        flaky.fail_after(1);
        let result = service
            .generate_account_proof("0x01", &[], Some(&root))
            .await;
        assert!(matches!(result, Err(StateProofError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_state_store_fault_propagates() {
        let service = ProofService::new(Arc::new(UnavailableStateStore), ProofConfig::default());
        let result = service.generate_account_proof("0x01", &[], None).await;
        assert!(matches!(result, Err(StateProofError::StateStore(_))));
        assert!(service.compute_state_root().await.is_err());
    }

    #[tokio::test]
    async fn test_corrupt_node_detected_when_verification_enabled() {
        let state = Arc::new(populated_state());
        let honest = Arc::new(InMemoryTrieNodeStore::new());
        let root = ProofService::new(state.clone(), ProofConfig::default())
            .with_node_store(honest.clone())
            .compute_state_root()
            .await
            .unwrap();

        // Copy the root branch and flip a byte inside its first child hash.
        let raw = Arc::new(RawStore::default());
        let mut encoded = honest.get(&root).unwrap().unwrap();
        encoded[10] ^= 0x01;
        raw.put(root, encoded).unwrap();

        let checked = ProofService::new(state.clone(), ProofConfig::default())
            .with_node_store(raw.clone());
        let result = checked.generate_account_proof("0x01", &[], Some(&root)).await;
        assert!(matches!(result, Err(StateProofError::MalformedNode(_))));

        let unchecked = ProofService::new(
            state,
            ProofConfig {
                verify_node_hashes: false,
                ..ProofConfig::default()
            },
        )
        .with_node_store(raw);
        let result = unchecked
            .generate_account_proof("0x01", &[], Some(&root))
            .await;
        // Without re-hashing the walk either misses a child or returns a
        // proof whose first node no longer hashes to the root.
        match result {
            Ok(proof) => assert!(unchecked.verify_account_proof(&root, &proof).is_err()),
            Err(e) => assert!(matches!(
                e,
                StateProofError::MissingNode(_) | StateProofError::MalformedNode(_)
            )),
        }
    }
}
