pub mod cache;
pub mod encoding;
pub mod entities;
pub mod errors;
pub mod nibbles;
pub mod node;
pub mod proofs;
pub mod root;
pub mod trie;
pub mod verify;

pub use cache::*;
pub use encoding::*;
pub use entities::*;
pub use errors::*;
pub use nibbles::*;
pub use node::*;
pub use proofs::*;
pub use root::*;
pub use trie::*;
pub use verify::*;
