use crate::domain::{Hash, StateProofError};

/// Content-addressed trie node storage: `hash -> encoded node bytes`.
///
/// Writes are idempotent; re-putting identical content under the same hash
/// is a no-op. A missing entry is `Ok(None)`, never an error.
/// `StoreUnavailable` is reserved for I/O faults of the backing store.
pub trait TrieNodeStore: Send + Sync {
    fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StateProofError>;

    fn put(&self, hash: Hash, encoded: Vec<u8>) -> Result<(), StateProofError>;

    fn put_batch(&self, nodes: Vec<(Hash, Vec<u8>)>) -> Result<(), StateProofError> {
        for (hash, encoded) in nodes {
            self.put(hash, encoded)?;
        }
        Ok(())
    }
}
