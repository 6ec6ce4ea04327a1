use crate::domain::{
    canonical_address, keccak256, trim_leading_zeros, Account, Hash, StateProofError,
};
use crate::ports::StateStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::HashMap;

#[derive(Default)]
struct StateTables {
    accounts: HashMap<String, Account>,
    storage: HashMap<String, HashMap<U256, Vec<u8>>>,
    code: HashMap<Hash, Vec<u8>>,
}

/// In-memory implementation of StateStore for tests and local tooling.
///
/// Addresses are keyed by their canonical padded form, so `0x01` and the
/// full 20-byte spelling name the same account.
#[derive(Default)]
pub struct InMemoryStateStore {
    tables: RwLock<StateTables>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save_account(&self, address: &str, account: Account) -> Result<(), StateProofError> {
        let key = address_key(address)?;
        self.tables.write().accounts.insert(key, account);
        Ok(())
    }

    /// Set a storage slot. A zero or empty value deletes the slot.
    ///
    /// Values are big-endian integers of at most 32 significant bytes.
    pub fn save_storage(
        &self,
        address: &str,
        slot: U256,
        value: Vec<u8>,
    ) -> Result<(), StateProofError> {
        let key = address_key(address)?;
        let significant = trim_leading_zeros(&value).len();
        if significant > 32 {
            return Err(StateProofError::InvalidArgument(format!(
                "storage value is {significant} bytes, expected at most 32"
            )));
        }

        let mut tables = self.tables.write();
        let slots = tables.storage.entry(key).or_default();
        if significant == 0 {
            slots.remove(&slot);
        } else {
            slots.insert(slot, value);
        }
        Ok(())
    }

    pub fn get_storage(&self, address: &str, slot: U256) -> Result<Option<Vec<u8>>, StateProofError> {
        let key = address_key(address)?;
        Ok(self
            .tables
            .read()
            .storage
            .get(&key)
            .and_then(|slots| slots.get(&slot))
            .cloned())
    }

    /// Store contract code under its Keccak256 hash and return the hash.
    pub fn save_code(&self, code: Vec<u8>) -> Hash {
        let hash = keccak256(&code);
        self.tables.write().code.insert(hash, code);
        hash
    }

    pub fn get_code(&self, code_hash: &Hash) -> Option<Vec<u8>> {
        self.tables.read().code.get(code_hash).cloned()
    }

    /// Remove an account together with its storage.
    pub fn delete_account(&self, address: &str) -> Result<(), StateProofError> {
        let key = address_key(address)?;
        let mut tables = self.tables.write();
        tables.accounts.remove(&key);
        tables.storage.remove(&key);
        Ok(())
    }

    pub fn clear(&self) {
        *self.tables.write() = StateTables::default();
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get_account(&self, address: &str) -> Result<Option<Account>, StateProofError> {
        let key = address_key(address)?;
        Ok(self.tables.read().accounts.get(&key).cloned())
    }

    async fn get_all_accounts(&self) -> Result<HashMap<String, Account>, StateProofError> {
        Ok(self.tables.read().accounts.clone())
    }

    async fn get_all_storage(
        &self,
        address: &str,
    ) -> Result<HashMap<U256, Vec<u8>>, StateProofError> {
        let key = address_key(address)?;
        Ok(self
            .tables
            .read()
            .storage
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}

fn address_key(address: &str) -> Result<String, StateProofError> {
    canonical_address(address)
}
