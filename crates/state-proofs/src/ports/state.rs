//! # Driven Port: Flat State Store
//!
//! The flat account/storage store the proof engine reads from. It is owned
//! by the execution layer; this crate only reads it.
//!
//! Addresses are hex strings. The engine always passes the canonical form
//! (40 lowercase hex digits, no prefix, see `canonical_address`), and an
//! implementation must resolve it to the same account however the address
//! was spelled when it was written. Keys returned by `get_all_accounts` may
//! use any spelling, but no two of them may pad to the same address.

use crate::domain::{Account, StateProofError};
use async_trait::async_trait;
use primitive_types::U256;
use std::collections::HashMap;

/// Interface for reading flat account state.
///
/// ## Implementation Notes
///
/// Faults of the backing store are reported as `StateProofError::StateStore`.
/// The engine performs no retries; they belong to the implementation.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Get an account record.
    ///
    /// # Returns
    ///
    /// * `Some(Account)` - If the account exists
    /// * `None` - If the account does not exist (never interacted with)
    async fn get_account(&self, address: &str) -> Result<Option<Account>, StateProofError>;

    /// Get every account, keyed by address.
    async fn get_all_accounts(&self) -> Result<HashMap<String, Account>, StateProofError>;

    /// Get every non-zero storage slot of an account.
    ///
    /// Values are big-endian integers. An account without storage yields an
    /// empty map.
    async fn get_all_storage(
        &self,
        address: &str,
    ) -> Result<HashMap<U256, Vec<u8>>, StateProofError>;
}
