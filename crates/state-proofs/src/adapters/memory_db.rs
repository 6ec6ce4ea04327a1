use crate::domain::{Hash, StateProofError};
use crate::ports::TrieNodeStore;
use parking_lot::RwLock;
use std::collections::HashMap;

/// In-memory implementation of TrieNodeStore.
///
/// Used as the private working store of a full rebuild, and as the default
/// store when no persistent one is configured.
#[derive(Default)]
pub struct InMemoryTrieNodeStore {
    nodes: RwLock<HashMap<Hash, Vec<u8>>>,
}

impl InMemoryTrieNodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored nodes.
    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.nodes.read().contains_key(hash)
    }
}

impl TrieNodeStore for InMemoryTrieNodeStore {
    fn get(&self, hash: &Hash) -> Result<Option<Vec<u8>>, StateProofError> {
        Ok(self.nodes.read().get(hash).cloned())
    }

    fn put(&self, hash: Hash, encoded: Vec<u8>) -> Result<(), StateProofError> {
        self.nodes.write().entry(hash).or_insert(encoded);
        Ok(())
    }

    fn put_batch(&self, batch: Vec<(Hash, Vec<u8>)>) -> Result<(), StateProofError> {
        let mut nodes = self.nodes.write();
        for (hash, encoded) in batch {
            nodes.entry(hash).or_insert(encoded);
        }
        Ok(())
    }
}
