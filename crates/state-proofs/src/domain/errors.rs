use super::Hash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StateProofError {
    /// Node bytes could not be decoded into a Leaf, Extension or Branch.
    #[error("Malformed trie node: {0}")]
    MalformedNode(String),

    /// A node referenced by hash is absent from the node store.
    #[error("Missing trie node: 0x{}", hex::encode(.0))]
    MissingNode(Hash),

    #[error("Trie node store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A supplied proof does not replay to the expected root.
    #[error("Invalid proof: {0}")]
    InvalidProof(String),

    #[error("State store error: {0}")]
    StateStore(String),
}

impl From<rlp::DecoderError> for StateProofError {
    fn from(err: rlp::DecoderError) -> Self {
        StateProofError::MalformedNode(err.to_string())
    }
}
