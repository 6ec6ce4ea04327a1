//! # Integration Tests
//!
//! - `proof_flows`: account and storage proofs through `ProofService`
//! - `node_stores`: persistent node store behaviour (lazy reads, faults)
//! - `cache_scoping`: `VerifiedStateCache` block transitions under concurrency

pub mod node_stores;
pub mod proof_flows;
