use super::{
    encoding, hex_hash, nibbles::Nibbles, node::NodeRef, node::TrieNode, Hash, StateProofError,
    EMPTY_TRIE_HASH, INLINE_THRESHOLD,
};
use crate::ports::TrieNodeStore;
use std::collections::{HashMap, HashSet};

/// Patricia Merkle Trie over a content-addressed node store.
///
/// Nodes created by mutations live in a private dirty overlay until
/// [`commit`](Self::commit) writes them to a [`TrieNodeStore`]. Nodes of a
/// trie opened with [`load_from_storage`](Self::load_from_storage) are
/// fetched lazily from the store passed to each call.
///
/// The root is always referenced by hash, even when its encoding is short
/// enough to be inlined into a parent.
#[derive(Clone, Debug)]
pub struct PatriciaTrie {
    root: Option<Hash>,
    dirty: HashMap<Hash, Vec<u8>>,
    verify_hashes: bool,
}

impl Default for PatriciaTrie {
    fn default() -> Self {
        Self::new()
    }
}

impl PatriciaTrie {
    /// Create an empty trie.
    pub fn new() -> Self {
        Self {
            root: None,
            dirty: HashMap::new(),
            verify_hashes: true,
        }
    }

    /// Open a trie rooted at a previously committed hash.
    ///
    /// The root node must be present in `store`; deeper nodes are only
    /// fetched when a lookup reaches them. `EMPTY_TRIE_HASH` opens an
    /// empty trie without touching the store.
    pub fn load_from_storage<S>(root: Hash, store: &S) -> Result<Self, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        if root == EMPTY_TRIE_HASH {
            return Ok(Self::new());
        }
        if store.get(&root)?.is_none() {
            return Err(StateProofError::MissingNode(root));
        }
        Ok(Self {
            root: Some(root),
            ..Self::new()
        })
    }

    /// Toggle re-hashing of node bytes read from the store.
    pub fn with_hash_verification(mut self, enabled: bool) -> Self {
        self.verify_hashes = enabled;
        self
    }

    pub fn root_hash(&self) -> Hash {
        self.root.unwrap_or(EMPTY_TRIE_HASH)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    // =========================================================================
    // RAW-KEY OPERATIONS
    // =========================================================================

    /// Insert or overwrite `value` at the nibble path of `key`.
    ///
    /// Empty values are rejected with `InvalidArgument`: a branch encodes an
    /// empty value the same way as no value.
    pub fn put<S>(&mut self, key: &[u8], value: Vec<u8>, store: &S) -> Result<(), StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        if value.is_empty() {
            return Err(StateProofError::InvalidArgument(
                "trie values must not be empty".to_string(),
            ));
        }

        let current = match self.root {
            Some(root) => Some(self.load_node(&root, store)?),
            None => None,
        };
        let updated = self.insert_at(current, Nibbles::from_bytes(key), value, store)?;

        let encoded = updated.encode();
        let root = encoding::keccak256(&encoded);
        self.dirty.insert(root, encoded);
        self.root = Some(root);
        Ok(())
    }

    /// Look up the value stored at `key`.
    pub fn get<S>(&self, key: &[u8], store: &S) -> Result<Option<Vec<u8>>, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        self.walk(&Nibbles::from_bytes(key), store, |_| {})
    }

    /// Collect the encoded nodes on the path to `key`, root first.
    ///
    /// Only nodes referenced by hash are listed; inline children are already
    /// part of their parent's encoding. For an absent key the list ends at
    /// the node proving the divergence. An empty trie yields an empty proof.
    pub fn generate_proof<S>(&self, key: &[u8], store: &S) -> Result<Vec<Vec<u8>>, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        let mut proof = Vec::new();
        self.walk(&Nibbles::from_bytes(key), store, |encoded| {
            proof.push(encoded.to_vec())
        })?;
        Ok(proof)
    }

    // =========================================================================
    // SECURE-KEY OPERATIONS (key = Keccak256(logical key))
    // =========================================================================

    pub fn put_secure<S>(
        &mut self,
        key: &[u8],
        value: Vec<u8>,
        store: &S,
    ) -> Result<(), StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        self.put(&encoding::keccak256(key), value, store)
    }

    pub fn get_secure<S>(&self, key: &[u8], store: &S) -> Result<Option<Vec<u8>>, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        self.get(&encoding::keccak256(key), store)
    }

    pub fn generate_secure_proof<S>(
        &self,
        key: &[u8],
        store: &S,
    ) -> Result<Vec<Vec<u8>>, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        self.generate_proof(&encoding::keccak256(key), store)
    }

    /// Write every dirty node reachable from the root into `store`.
    ///
    /// Nodes orphaned by later overwrites are dropped. Returns the root hash.
    pub fn commit<S>(&mut self, store: &S) -> Result<Hash, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        let Some(root) = self.root else {
            self.dirty.clear();
            return Ok(EMPTY_TRIE_HASH);
        };

        let mut batch = Vec::new();
        let mut seen = HashSet::new();
        let mut pending = vec![root];

        while let Some(hash) = pending.pop() {
            if !seen.insert(hash) {
                continue;
            }
            // Anything not dirty is already persisted along with its subtree.
            let Some(encoded) = self.dirty.get(&hash) else {
                continue;
            };
            collect_hash_refs(&TrieNode::decode(encoded)?, &mut pending);
            batch.push((hash, encoded.clone()));
        }

        let written = batch.len();
        store.put_batch(batch)?;
        self.dirty.clear();

        tracing::debug!(root = %hex_hash(&root), nodes = written, "Trie committed");
        Ok(root)
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn insert_at<S>(
        &mut self,
        current: Option<TrieNode>,
        path: Nibbles,
        value: Vec<u8>,
        store: &S,
    ) -> Result<TrieNode, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        let node = match current {
            None => TrieNode::Leaf { path, value },

            Some(TrieNode::Leaf {
                path: leaf_path,
                value: leaf_value,
            }) => {
                if leaf_path == path {
                    return Ok(TrieNode::Leaf { path, value });
                }

                let common = leaf_path.common_prefix_len(&path);
                let mut children: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::Empty);
                let mut branch_value = None;

                if common == leaf_path.len() {
                    branch_value = Some(leaf_value);
                } else {
                    children[leaf_path.at(common) as usize] = self.reference(TrieNode::Leaf {
                        path: leaf_path.slice(common + 1),
                        value: leaf_value,
                    });
                }

                if common == path.len() {
                    branch_value = Some(value);
                } else {
                    children[path.at(common) as usize] = self.reference(TrieNode::Leaf {
                        path: path.slice(common + 1),
                        value,
                    });
                }

                self.split(path.slice_range(0, common), children, branch_value)
            }

            Some(TrieNode::Extension {
                path: ext_path,
                child,
            }) => {
                let common = ext_path.common_prefix_len(&path);

                if common == ext_path.len() {
                    let child_node = self.resolve(&child, store)?;
                    let updated = self.insert_at(child_node, path.slice(common), value, store)?;
                    return Ok(TrieNode::Extension {
                        path: ext_path,
                        child: self.reference(updated),
                    });
                }

                let mut children: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::Empty);
                let mut branch_value = None;

                let rest = ext_path.slice(common + 1);
                children[ext_path.at(common) as usize] = if rest.is_empty() {
                    child
                } else {
                    self.reference(TrieNode::Extension { path: rest, child })
                };

                if common == path.len() {
                    branch_value = Some(value);
                } else {
                    children[path.at(common) as usize] = self.reference(TrieNode::Leaf {
                        path: path.slice(common + 1),
                        value,
                    });
                }

                self.split(path.slice_range(0, common), children, branch_value)
            }

            Some(TrieNode::Branch {
                mut children,
                value: branch_value,
            }) => {
                if path.is_empty() {
                    return Ok(TrieNode::Branch {
                        children,
                        value: Some(value),
                    });
                }

                let index = path.at(0) as usize;
                let child_node = self.resolve(&children[index], store)?;
                let updated = self.insert_at(child_node, path.slice(1), value, store)?;
                children[index] = self.reference(updated);
                TrieNode::Branch {
                    children,
                    value: branch_value,
                }
            }
        };

        Ok(node)
    }

    /// New branch, behind an extension when the diverging paths share a prefix.
    fn split(
        &mut self,
        shared: Nibbles,
        children: [NodeRef; 16],
        value: Option<Vec<u8>>,
    ) -> TrieNode {
        let branch = TrieNode::Branch {
            children: Box::new(children),
            value,
        };
        if shared.is_empty() {
            branch
        } else {
            TrieNode::Extension {
                path: shared,
                child: self.reference(branch),
            }
        }
    }

    /// Reference a freshly built child, staging it in the overlay if it is
    /// too large to inline.
    fn reference(&mut self, node: TrieNode) -> NodeRef {
        let encoded = node.encode();
        if encoded.len() < INLINE_THRESHOLD {
            return NodeRef::Inline(Box::new(node));
        }
        let hash = encoding::keccak256(&encoded);
        self.dirty.insert(hash, encoded);
        NodeRef::Hash(hash)
    }

    /// Walk the path of `key`, handing each hash-resolved node's encoding to
    /// `visit`, and return the value found at the end of the path.
    fn walk<S, F>(
        &self,
        key: &Nibbles,
        store: &S,
        mut visit: F,
    ) -> Result<Option<Vec<u8>>, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
        F: FnMut(&[u8]),
    {
        let Some(root) = self.root else {
            return Ok(None);
        };

        let encoded = self.load_bytes(&root, store)?;
        visit(&encoded);
        let mut node = TrieNode::decode(&encoded)?;
        let mut depth = 0;

        loop {
            let next = match node {
                TrieNode::Leaf { path, value } => {
                    return Ok((key.slice(depth) == path).then_some(value));
                }
                TrieNode::Extension { path, child } => {
                    if !key.slice(depth).starts_with(&path) {
                        return Ok(None);
                    }
                    depth += path.len();
                    child
                }
                TrieNode::Branch {
                    mut children,
                    value,
                } => {
                    if depth >= key.len() {
                        return Ok(value);
                    }
                    let index = key.at(depth) as usize;
                    depth += 1;
                    std::mem::take(&mut children[index])
                }
            };

            node = match next {
                NodeRef::Empty => return Ok(None),
                NodeRef::Inline(child) => *child,
                NodeRef::Hash(hash) => {
                    let encoded = self.load_bytes(&hash, store)?;
                    visit(&encoded);
                    TrieNode::decode(&encoded)?
                }
            };
        }
    }

    fn resolve<S>(&self, node_ref: &NodeRef, store: &S) -> Result<Option<TrieNode>, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        match node_ref {
            NodeRef::Empty => Ok(None),
            NodeRef::Inline(node) => Ok(Some(node.as_ref().clone())),
            NodeRef::Hash(hash) => self.load_node(hash, store).map(Some),
        }
    }

    fn load_node<S>(&self, hash: &Hash, store: &S) -> Result<TrieNode, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        TrieNode::decode(&self.load_bytes(hash, store)?)
    }

    /// Fetch node bytes from the overlay, falling back to the store.
    fn load_bytes<S>(&self, hash: &Hash, store: &S) -> Result<Vec<u8>, StateProofError>
    where
        S: TrieNodeStore + ?Sized,
    {
        if let Some(encoded) = self.dirty.get(hash) {
            return Ok(encoded.clone());
        }

        let encoded = store
            .get(hash)?
            .ok_or(StateProofError::MissingNode(*hash))?;

        if self.verify_hashes && encoding::keccak256(&encoded) != *hash {
            return Err(StateProofError::MalformedNode(format!(
                "node stored under {} hashes to {}",
                hex_hash(hash),
                hex_hash(&encoding::keccak256(&encoded))
            )));
        }
        Ok(encoded)
    }
}

/// Push every hash reference reachable from `node` without leaving the
/// node's own encoding (inline children are searched recursively).
fn collect_hash_refs(node: &TrieNode, out: &mut Vec<Hash>) {
    let mut visit = |child: &NodeRef| match child {
        NodeRef::Empty => {}
        NodeRef::Hash(hash) => out.push(*hash),
        NodeRef::Inline(inner) => collect_hash_refs(inner, out),
    };

    match node {
        TrieNode::Leaf { .. } => {}
        TrieNode::Extension { child, .. } => visit(child),
        TrieNode::Branch { children, .. } => children.iter().for_each(visit),
    }
}
