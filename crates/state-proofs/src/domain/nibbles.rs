use super::StateProofError;

// =============================================================================
// NIBBLES: Half-byte path representation
// =============================================================================

/// Nibble path for trie traversal.
///
/// Keys are converted to nibbles (half-bytes, 0-15) for traversal through
/// the trie. A 32-byte hashed key becomes 64 nibbles.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Nibbles(pub Vec<u8>);

impl Nibbles {
    /// Create nibbles from arbitrary bytes (high nibble first).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut nibbles = Vec::with_capacity(bytes.len() * 2);
        for byte in bytes {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }
        Nibbles(nibbles)
    }

    /// Get a slice of nibbles starting at offset.
    pub fn slice(&self, start: usize) -> Self {
        Nibbles(self.0[start..].to_vec())
    }

    /// Get a range slice of nibbles.
    pub fn slice_range(&self, start: usize, end: usize) -> Self {
        Nibbles(self.0[start..end].to_vec())
    }

    /// Find common prefix length with another nibbles path.
    pub fn common_prefix_len(&self, other: &Nibbles) -> usize {
        self.0
            .iter()
            .zip(other.0.iter())
            .take_while(|(a, b)| a == b)
            .count()
    }

    pub fn starts_with(&self, prefix: &Nibbles) -> bool {
        self.0.starts_with(&prefix.0)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get nibble at index.
    pub fn at(&self, index: usize) -> u8 {
        self.0[index]
    }

    /// Encode nibbles with hex-prefix for RLP encoding.
    ///
    /// Per Ethereum Yellow Paper:
    /// - First nibble encodes flags: 0=extension even, 1=extension odd, 2=leaf even, 3=leaf odd
    /// - If odd number of nibbles, first nibble is part of path
    pub fn encode_hex_prefix(&self, is_leaf: bool) -> Vec<u8> {
        let odd = self.len() % 2 == 1;
        let prefix = if is_leaf { 2 } else { 0 } + if odd { 1 } else { 0 };

        let mut result = Vec::with_capacity(self.len() / 2 + 1);

        let rest = if odd {
            result.push((prefix << 4) | self.0[0]);
            &self.0[1..]
        } else {
            result.push(prefix << 4);
            &self.0[..]
        };

        for pair in rest.chunks(2) {
            result.push((pair[0] << 4) | pair[1]);
        }

        result
    }

    /// Decode hex-prefix encoded bytes back to nibbles.
    ///
    /// Returns the path and whether the leaf flag was set. Rejects unknown
    /// flags and a non-zero padding nibble on even-length paths.
    pub fn decode_hex_prefix(encoded: &[u8]) -> Result<(Self, bool), StateProofError> {
        let Some(&first) = encoded.first() else {
            return Err(StateProofError::MalformedNode(
                "empty hex-prefix path".to_string(),
            ));
        };

        let flag = first >> 4;
        if flag > 3 {
            return Err(StateProofError::MalformedNode(format!(
                "invalid hex-prefix flag {flag}"
            )));
        }

        let is_leaf = flag >= 2;
        let odd = flag % 2 == 1;

        let mut nibbles = Vec::with_capacity(encoded.len() * 2);
        if odd {
            nibbles.push(first & 0x0F);
        } else if first & 0x0F != 0 {
            return Err(StateProofError::MalformedNode(
                "non-zero padding in even hex-prefix path".to_string(),
            ));
        }

        for &byte in &encoded[1..] {
            nibbles.push(byte >> 4);
            nibbles.push(byte & 0x0F);
        }

        Ok((Nibbles(nibbles), is_leaf))
    }
}

impl From<Vec<u8>> for Nibbles {
    fn from(nibbles: Vec<u8>) -> Self {
        Nibbles(nibbles)
    }
}
