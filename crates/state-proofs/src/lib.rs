//! # state-proofs
//!
//! Merkle-Patricia-Trie state verification and proof engine.
//!
//! ## Role in System
//!
//! - **Proof Provider**: Builds `eth_getProof`-style account and storage
//!   proofs against a state root
//! - **Root Calculator**: Computes storage and world-state roots from flat state
//! - **Verified State Cache**: Block-scoped cache of already verified reads
//!
//! ## Proof Flow
//!
//! ```text
//! [StateStore] ──accounts/storage──→ [ProofService] ←──nodes── [TrieNodeStore]
//!                                          │
//!                     ┌────────────────────┴────────────────────┐
//!                     ↓                                         ↓
//!          incremental: load root,                  full rebuild: transient
//!          walk persisted nodes                     trie in memory
//!                     │                                         │
//!                     └──────────────→ AccountProof ←───────────┘
//! ```
//!
//! ## Security
//!
//! - Every trie key is the Keccak256 of the padded address or slot
//! - Node bytes read from a store are re-hashed before use (configurable)
//! - Proof verification is iterative and depth-limited

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::*;
pub use config::ProofConfig;
pub use domain::*;
pub use ports::*;
pub use service::ProofService;
