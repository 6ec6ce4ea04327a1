//! # Iterative Proof Verification
//!
//! Replays proof lists produced by [`PatriciaTrie::generate_proof`](super::PatriciaTrie::generate_proof)
//! without access to the trie.
//!
//! ## Threat
//!
//! A malicious peer submits a proof with thousands of nodes, or nodes that
//! reference each other. Verification is a bounded loop: the proof length
//! is capped and every hash-referenced node must be the next list entry.

use super::{
    account_key, decode_storage_value, encoding, hex_hash, nibbles::Nibbles, node::NodeRef,
    node::TrieNode, storage_key, Account, AccountProof, Hash, StateProofError, EMPTY_TRIE_HASH,
};
use primitive_types::U256;

/// Default upper bound on the number of nodes accepted in one proof.
pub const MAX_PROOF_DEPTH: usize = 64;

/// Verify `proof` for the trie path `key` against `root`.
///
/// ## Algorithm: Nibble-Walking Loop
///
/// 1. Check the proof length against `max_depth`
/// 2. Require each hash-referenced node to be the next proof entry
/// 3. Follow the key's nibbles through extensions and branches
/// 4. Stop at the value, or at the node proving the key's absence
///
/// Returns `Some(value)` for an inclusion proof and `None` for a valid
/// exclusion proof. Any inconsistency is `InvalidProof`.
pub fn verify_proof(
    root: &Hash,
    key: &[u8],
    proof: &[Vec<u8>],
    max_depth: usize,
) -> Result<Option<Vec<u8>>, StateProofError> {
    if proof.len() > max_depth {
        return Err(StateProofError::InvalidProof(format!(
            "proof has {} nodes, limit is {max_depth}",
            proof.len()
        )));
    }

    if proof.is_empty() {
        if *root == EMPTY_TRIE_HASH {
            return Ok(None);
        }
        return Err(StateProofError::InvalidProof(format!(
            "empty proof for non-empty root {}",
            hex_hash(root)
        )));
    }

    let path = Nibbles::from_bytes(key);
    let mut depth = 0;
    let mut used = 1;
    let mut node = proof_node(root, &proof[0])?;

    let proven = loop {
        let next = match node {
            TrieNode::Leaf {
                path: leaf_path,
                value,
            } => break (path.slice(depth) == leaf_path).then_some(value),
            TrieNode::Extension {
                path: ext_path,
                child,
            } => {
                if !path.slice(depth).starts_with(&ext_path) {
                    break None;
                }
                depth += ext_path.len();
                child
            }
            TrieNode::Branch {
                mut children,
                value,
            } => {
                if depth >= path.len() {
                    break value;
                }
                let index = path.at(depth) as usize;
                depth += 1;
                std::mem::take(&mut children[index])
            }
        };

        node = match next {
            NodeRef::Empty => break None,
            NodeRef::Inline(child) => *child,
            NodeRef::Hash(hash) => {
                let encoded = proof.get(used).ok_or_else(|| {
                    StateProofError::InvalidProof(format!(
                        "proof ends before node {}",
                        hex_hash(&hash)
                    ))
                })?;
                used += 1;
                proof_node(&hash, encoded)?
            }
        };
    };

    if used != proof.len() {
        return Err(StateProofError::InvalidProof(format!(
            "{} trailing nodes after the end of the path",
            proof.len() - used
        )));
    }

    Ok(proven)
}

/// Check an account proof and all of its storage proofs.
///
/// The account proof must replay against `state_root` to the record implied
/// by the proof's fields (or to absence, if every field is zero). Each
/// storage proof must replay against `storage_hash` to its reported value.
pub fn verify_account_proof(
    state_root: &Hash,
    proof: &AccountProof,
    max_depth: usize,
) -> Result<(), StateProofError> {
    let key = account_key(&proof.address);
    let claimed = proof.account();

    match verify_proof(state_root, &key, &proof.account_proofs, max_depth)? {
        Some(leaf) => {
            let proven = Account::rlp_decode(&leaf)
                .map_err(|e| StateProofError::InvalidProof(format!("account leaf: {e}")))?;
            if proven != claimed {
                return Err(StateProofError::InvalidProof(
                    "account fields differ from the proven record".to_string(),
                ));
            }
        }
        None if claimed != Account::default() => {
            return Err(StateProofError::InvalidProof(
                "account is absent but proof reports non-empty fields".to_string(),
            ));
        }
        None => {}
    }

    for storage in &proof.storage_proof {
        let slot_key = storage_key(&storage.key);
        let value = match verify_proof(&proof.storage_hash, &slot_key, &storage.proof, max_depth)? {
            Some(encoded) => decode_storage_value(&encoded)
                .map_err(|e| StateProofError::InvalidProof(format!("storage leaf: {e}")))?,
            None => U256::zero(),
        };
        if value != storage.value {
            return Err(StateProofError::InvalidProof(format!(
                "storage slot {} proves {value}, proof reports {}",
                storage.key, storage.value
            )));
        }
    }

    Ok(())
}

/// Decode a proof entry after checking it hashes to `expected`.
fn proof_node(expected: &Hash, encoded: &[u8]) -> Result<TrieNode, StateProofError> {
    let actual = encoding::keccak256(encoded);
    if actual != *expected {
        return Err(StateProofError::InvalidProof(format!(
            "node hash {} does not match expected {}",
            hex_hash(&actual),
            hex_hash(expected)
        )));
    }
    TrieNode::decode(encoded).map_err(|e| StateProofError::InvalidProof(e.to_string()))
}
