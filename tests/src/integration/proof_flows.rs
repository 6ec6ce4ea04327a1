//! # Proof Flow Integration Tests
//!
//! Drives `ProofService` end to end over the in-memory state store:
//!
//! 1. **Empty state**: exclusion proof against the empty trie
//! 2. **Single account**: the proof is exactly one leaf holding the record
//! 3. **Storage**: set slots prove their value, unset slots prove zero
//! 4. **Strategies**: incremental and full-rebuild proofs are identical
//! 5. **Verification**: tampered proofs are rejected

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use primitive_types::U256;
    use state_proofs::{
        account_key, verify_proof, Account, AccountProof, InMemoryStateStore,
        InMemoryTrieNodeStore, Nibbles, ProofConfig, ProofService, StateProofError, TrieNode,
        TrieNodeStore, EMPTY_DATA_HASH, EMPTY_TRIE_HASH, MAX_PROOF_DEPTH,
    };

    use crate::init_test_logging;

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const CONTRACT: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

    fn address(i: u64) -> String {
        format!("0x{i:040x}")
    }

    /// Fifty accounts, every fifth one a contract with a few slots.
    fn populated_state() -> InMemoryStateStore {
        let state = InMemoryStateStore::new();
        for i in 1..=50u64 {
            let account = Account::new(U256::from(i) * U256::exp10(18)).with_nonce(i);
            state.save_account(&address(i), account).unwrap();
            if i % 5 == 0 {
                for slot in 0..4u64 {
                    state
                        .save_storage(&address(i), U256::from(slot), (i * 100 + slot).to_be_bytes().to_vec())
                        .unwrap();
                }
            }
        }
        state
    }

    fn full_rebuild_service(state: Arc<InMemoryStateStore>) -> ProofService<InMemoryStateStore> {
        ProofService::new(state, ProofConfig::default())
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    #[tokio::test]
    async fn test_empty_state_store_yields_empty_proof() {
        init_test_logging();
        let service = full_rebuild_service(Arc::new(InMemoryStateStore::new()));

        let proof = service
            .generate_account_proof(CONTRACT, &[U256::one()], Some(&EMPTY_TRIE_HASH))
            .await
            .unwrap();

        assert!(proof.account_proofs.is_empty());
        assert_eq!(proof.balance, U256::zero());
        assert_eq!(proof.nonce, 0);
        assert_eq!(proof.code_hash, EMPTY_DATA_HASH);
        assert_eq!(proof.storage_hash, EMPTY_TRIE_HASH);
        assert_eq!(proof.storage_proof[0].value, U256::zero());
        assert!(proof.storage_proof[0].proof.is_empty());
    }

    #[tokio::test]
    async fn test_single_account_proof_is_a_single_leaf() {
        init_test_logging();
        let state = Arc::new(InMemoryStateStore::new());
        let account = Account::new(U256::from(100)).with_nonce(1);
        state.save_account(CONTRACT, account.clone()).unwrap();
        let service = full_rebuild_service(state);

        let proof = service.generate_account_proof(CONTRACT, &[], None).await.unwrap();

        assert_eq!(proof.storage_hash, EMPTY_TRIE_HASH);
        assert_eq!(proof.account_proofs.len(), 1);

        let padded = state_proofs::pad_address(CONTRACT).unwrap();
        match TrieNode::decode(&proof.account_proofs[0]).unwrap() {
            TrieNode::Leaf { path, value } => {
                assert_eq!(path, Nibbles::from_bytes(&account_key(&padded)));
                assert_eq!(Account::rlp_decode(&value).unwrap(), account);
            }
            other => panic!("Expected leaf node, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_storage_slot_inclusion_and_absence() {
        init_test_logging();
        let state = Arc::new(InMemoryStateStore::new());
        state
            .save_account(CONTRACT, Account::new(U256::from(100)).with_nonce(1))
            .unwrap();
        state.save_storage(CONTRACT, U256::one(), vec![42]).unwrap();
        let service = full_rebuild_service(state);

        let proof = service
            .generate_account_proof(CONTRACT, &[U256::one(), U256::from(2)], None)
            .await
            .unwrap();

        let set = &proof.storage_proof[0];
        assert_eq!(set.value, U256::from(42));
        assert!(!set.proof.is_empty());

        let unset = &proof.storage_proof[1];
        assert_eq!(unset.key, U256::from(2));
        assert_eq!(unset.value, U256::zero());

        let root = service.compute_state_root().await.unwrap();
        service.verify_account_proof(&root, &proof).unwrap();
    }

    #[tokio::test]
    async fn test_code_hash_is_reported() {
        let state = Arc::new(InMemoryStateStore::new());
        let code_hash = state.save_code(vec![0x60, 0x80, 0x60, 0x40, 0x52]);
        state
            .save_account(CONTRACT, Account::new(U256::zero()).with_code_hash(code_hash))
            .unwrap();
        let service = full_rebuild_service(state.clone());

        let proof = service.generate_account_proof(CONTRACT, &[], None).await.unwrap();
        assert_eq!(proof.code_hash, code_hash);
        assert_eq!(state.get_code(&proof.code_hash).map(|c| c.len()), Some(5));

        let root = service.compute_state_root().await.unwrap();
        service.verify_account_proof(&root, &proof).unwrap();
    }

    #[tokio::test]
    async fn test_short_address_proves_padded_account() {
        let state = Arc::new(InMemoryStateStore::new());
        state
            .save_account(&address(1), Account::new(U256::from(100)).with_nonce(1))
            .unwrap();
        let persistent: Arc<dyn TrieNodeStore> = Arc::new(InMemoryTrieNodeStore::new());
        let service = ProofService::new(state, ProofConfig::default()).with_node_store(persistent);
        let root = service.compute_state_root().await.unwrap();

        let full = address(1);
        for spelling in ["0x01", "0x0001", "1", full.as_str()] {
            let proof = service
                .generate_account_proof(spelling, &[], Some(&root))
                .await
                .unwrap();
            assert_eq!(proof.balance, U256::from(100), "spelling {spelling}");
            assert_eq!(proof.nonce, 1);
            service.verify_account_proof(&root, &proof).unwrap();
        }
    }

    // =============================================================================
    // STRATEGIES
    // =============================================================================

    #[tokio::test]
    async fn test_incremental_and_full_rebuild_agree() {
        init_test_logging();
        let state = Arc::new(populated_state());
        let persistent: Arc<dyn TrieNodeStore> = Arc::new(InMemoryTrieNodeStore::new());

        let full = full_rebuild_service(state.clone());
        let incremental =
            ProofService::new(state, ProofConfig::default()).with_node_store(persistent);

        let root = incremental.compute_state_root().await.unwrap();
        assert_eq!(root, full.compute_state_root().await.unwrap());

        let keys = [U256::zero(), U256::from(3), U256::from(99)];
        for i in [1u64, 5, 25, 50, 51, 1000] {
            let a = full
                .generate_account_proof(&address(i), &keys, Some(&root))
                .await
                .unwrap();
            let b = incremental
                .generate_account_proof(&address(i), &keys, Some(&root))
                .await
                .unwrap();

            assert_eq!(a, b, "strategies disagree for account {i}");
            incremental.verify_account_proof(&root, &b).unwrap();
            assert_eq!(b.is_exclusion_proof(), i > 50);
        }
    }

    #[tokio::test]
    async fn test_historical_root_stays_provable() {
        let state = Arc::new(populated_state());
        let persistent: Arc<dyn TrieNodeStore> = Arc::new(InMemoryTrieNodeStore::new());
        let service = ProofService::new(state.clone(), ProofConfig::default())
            .with_node_store(persistent);

        let old_root = service.compute_state_root().await.unwrap();
        let old_account = Account::new(U256::from(7) * U256::exp10(18)).with_nonce(7);

        state
            .save_account(&address(7), Account::new(U256::from(1)).with_nonce(8))
            .unwrap();
        let new_root = service.compute_state_root().await.unwrap();
        assert_ne!(old_root, new_root);

        // Node store is append-only, so the old root still resolves.
        let proof = service
            .generate_account_proof(&address(7), &[], Some(&old_root))
            .await
            .unwrap();
        let key = account_key(&proof.address);
        let leaf = verify_proof(&old_root, &key, &proof.account_proofs, MAX_PROOF_DEPTH)
            .unwrap()
            .expect("account present at old root");
        assert_eq!(Account::rlp_decode(&leaf).unwrap(), old_account);

        let current = service
            .generate_account_proof(&address(7), &[], Some(&new_root))
            .await
            .unwrap();
        assert_eq!(current.nonce, 8);
        service.verify_account_proof(&new_root, &current).unwrap();
    }

    // =============================================================================
    // VERIFICATION
    // =============================================================================

    #[tokio::test]
    async fn test_tampered_fields_are_rejected() {
        let state = Arc::new(populated_state());
        let service = full_rebuild_service(state);
        let root = service.compute_state_root().await.unwrap();

        let proof = service
            .generate_account_proof(&address(10), &[U256::one()], None)
            .await
            .unwrap();
        service.verify_account_proof(&root, &proof).unwrap();

        let mut richer = proof.clone();
        richer.balance += U256::one();
        assert!(matches!(
            service.verify_account_proof(&root, &richer),
            Err(StateProofError::InvalidProof(_))
        ));

        let mut wrong_slot = proof.clone();
        wrong_slot.storage_proof[0].value = U256::from(1);
        assert!(matches!(
            service.verify_account_proof(&root, &wrong_slot),
            Err(StateProofError::InvalidProof(_))
        ));

        let mut truncated = proof;
        truncated.account_proofs.pop();
        assert!(service.verify_account_proof(&root, &truncated).is_err());
    }

    #[tokio::test]
    async fn test_proof_survives_json_roundtrip() {
        let service = full_rebuild_service(Arc::new(populated_state()));
        let root = service.compute_state_root().await.unwrap();
        let proof = service
            .generate_account_proof(&address(15), &[U256::from(2)], None)
            .await
            .unwrap();

        let json = serde_json::to_string(&proof).unwrap();
        let decoded: AccountProof = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, proof);
        service.verify_account_proof(&root, &decoded).unwrap();
    }
}
