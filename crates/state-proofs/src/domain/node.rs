use super::{encoding, nibbles::Nibbles, Hash, StateProofError};
use rlp::{Rlp, RlpStream};

// =============================================================================
// TRIE NODE: Leaf, Extension and Branch
// =============================================================================

/// Encoded nodes shorter than this are embedded in their parent instead of
/// being referenced by hash.
pub const INLINE_THRESHOLD: usize = 32;

/// Reference from a parent node to a child.
///
/// Per Ethereum Yellow Paper Appendix D, a child whose RLP encoding is
/// shorter than 32 bytes is embedded directly; otherwise the parent holds
/// the Keccak256 hash of the child's encoding.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum NodeRef {
    /// No child (RLP empty string).
    #[default]
    Empty,
    /// Child embedded in the parent's encoding.
    Inline(Box<TrieNode>),
    /// Child stored separately under its content hash.
    Hash(Hash),
}

impl NodeRef {
    pub fn is_empty(&self) -> bool {
        matches!(self, NodeRef::Empty)
    }

    fn append_to(&self, stream: &mut RlpStream) {
        match self {
            NodeRef::Empty => {
                stream.append_empty_data();
            }
            NodeRef::Inline(node) => {
                stream.append_raw(&node.encode(), 1);
            }
            NodeRef::Hash(hash) => {
                stream.append(&hash.to_vec());
            }
        }
    }

    fn decode(item: &Rlp) -> Result<Self, StateProofError> {
        if item.is_list() {
            let raw = item.as_raw();
            if raw.len() >= INLINE_THRESHOLD {
                return Err(StateProofError::MalformedNode(format!(
                    "inline child is {} bytes, must be shorter than {INLINE_THRESHOLD}",
                    raw.len()
                )));
            }
            return Ok(NodeRef::Inline(Box::new(TrieNode::decode(raw)?)));
        }

        let data = item.data()?;
        match data.len() {
            0 => Ok(NodeRef::Empty),
            32 => Ok(NodeRef::Hash(encoding::hash_from_slice(data)?)),
            n => Err(StateProofError::MalformedNode(format!(
                "child reference is {n} bytes, expected 0 or 32"
            ))),
        }
    }
}

/// Node types in the Patricia Merkle Trie.
///
/// The empty trie is represented by [`NodeRef::Empty`] rather than a node
/// variant, so every `TrieNode` has a concrete encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TrieNode {
    /// Leaf node: stores remaining key path and the value.
    /// RLP: [hex_prefix_encode(path, true), value]
    Leaf {
        /// Remaining path from current position to this leaf.
        path: Nibbles,
        value: Vec<u8>,
    },

    /// Extension node: shared prefix optimization.
    /// RLP: [hex_prefix_encode(path, false), child]
    Extension {
        /// Shared prefix path, never empty.
        path: Nibbles,
        child: NodeRef,
    },

    /// Branch node: 16-way branch for each nibble value.
    /// RLP: \[child\[0\], ..., child\[15\], value\]
    Branch {
        children: Box<[NodeRef; 16]>,
        /// Value of a key that terminates at this branch, never empty.
        value: Option<Vec<u8>>,
    },
}

impl TrieNode {
    /// Branch with no children and no value.
    pub fn empty_branch() -> Self {
        TrieNode::Branch {
            children: Box::new(std::array::from_fn(|_| NodeRef::Empty)),
            value: None,
        }
    }

    /// RLP-encode this node.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            TrieNode::Leaf { path, value } => {
                let mut stream = RlpStream::new_list(2);
                stream.append(&path.encode_hex_prefix(true));
                stream.append(value);
                stream.out().to_vec()
            }

            TrieNode::Extension { path, child } => {
                let mut stream = RlpStream::new_list(2);
                stream.append(&path.encode_hex_prefix(false));
                child.append_to(&mut stream);
                stream.out().to_vec()
            }

            TrieNode::Branch { children, value } => {
                let mut stream = RlpStream::new_list(17);
                for child in children.iter() {
                    child.append_to(&mut stream);
                }
                match value {
                    Some(v) => {
                        stream.append(v);
                    }
                    None => {
                        stream.append_empty_data();
                    }
                }
                stream.out().to_vec()
            }
        }
    }

    /// Decode a node from its RLP encoding.
    ///
    /// The whole buffer must be consumed by a single 2-item (leaf or
    /// extension) or 17-item (branch) list.
    pub fn decode(bytes: &[u8]) -> Result<Self, StateProofError> {
        let rlp = Rlp::new(bytes);
        let info = rlp.payload_info()?;
        if info.header_len + info.value_len != bytes.len() {
            return Err(StateProofError::MalformedNode(format!(
                "node encoding has {} trailing bytes",
                bytes.len().saturating_sub(info.header_len + info.value_len)
            )));
        }
        if !rlp.is_list() {
            return Err(StateProofError::MalformedNode(
                "node encoding is not a list".to_string(),
            ));
        }

        match rlp.item_count()? {
            2 => {
                let (path, is_leaf) = Nibbles::decode_hex_prefix(rlp.at(0)?.data()?)?;
                if is_leaf {
                    return Ok(TrieNode::Leaf {
                        path,
                        value: rlp.at(1)?.data()?.to_vec(),
                    });
                }

                if path.is_empty() {
                    return Err(StateProofError::MalformedNode(
                        "extension with empty path".to_string(),
                    ));
                }
                let child = NodeRef::decode(&rlp.at(1)?)?;
                if child.is_empty() {
                    return Err(StateProofError::MalformedNode(
                        "extension without child".to_string(),
                    ));
                }
                Ok(TrieNode::Extension { path, child })
            }

            17 => {
                let mut children: [NodeRef; 16] = std::array::from_fn(|_| NodeRef::Empty);
                for (i, slot) in children.iter_mut().enumerate() {
                    *slot = NodeRef::decode(&rlp.at(i)?)?;
                }
                let value = rlp.at(16)?.data()?;
                Ok(TrieNode::Branch {
                    children: Box::new(children),
                    value: (!value.is_empty()).then(|| value.to_vec()),
                })
            }

            n => Err(StateProofError::MalformedNode(format!(
                "node list has {n} items, expected 2 or 17"
            ))),
        }
    }

    /// Compute Keccak256 hash of the RLP-encoded node.
    pub fn hash(&self) -> Hash {
        encoding::keccak256(&self.encode())
    }

    /// Reference a parent would hold for this node.
    pub fn reference(&self) -> NodeRef {
        let encoded = self.encode();
        if encoded.len() < INLINE_THRESHOLD {
            NodeRef::Inline(Box::new(self.clone()))
        } else {
            NodeRef::Hash(encoding::keccak256(&encoded))
        }
    }
}
