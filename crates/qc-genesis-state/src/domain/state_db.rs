//! # State Database
//!
//! Account model on top of a `KeyValueStore`: balances, nonces, contract code
//! and contract storage words.
//!
//! ## State Root
//!
//! The root commits to every stored pair in key order:
//!
//! ```text
//! keccak256("qc:state-root" ‖ for each pair: [u32 BE key len][key][u32 BE value len][value])
//! ```
//!
//! Two stores holding the same pairs have the same root regardless of the
//! order the pairs were written in.

use shared_crypto::Keccak256Hasher;
use shared_types::{Address, Hash, ZERO_HASH};

use super::errors::StateError;
use super::keys::KeyPrefix;
use crate::ports::{KeyValueStore, KvIter};

const STATE_ROOT_DOMAIN: &[u8] = b"qc:state-root";

/// Account-level view over a key-value store.
#[derive(Debug, Clone, Default)]
pub struct StateDb<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> StateDb<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Borrow the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Number of stored pairs.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Iterate the raw pairs in key order.
    pub fn iter(&self) -> KvIter<'_> {
        self.store.iter()
    }

    // =========================================================================
    // BALANCES
    // =========================================================================

    pub fn balance(&self, address: &Address) -> Result<u128, StateError> {
        let key = KeyPrefix::balance_key(address);
        match self.store.get(&key)? {
            Some(raw) => Ok(u128::from_be_bytes(fixed_width(&key, &raw)?)),
            None => Ok(0),
        }
    }

    /// Credit `amount` to `address` and return the new balance.
    pub fn add_balance(&mut self, address: &Address, amount: u128) -> Result<u128, StateError> {
        let balance = self.balance(address)?;
        let updated = balance
            .checked_add(amount)
            .ok_or(StateError::BalanceOverflow {
                address: *address,
                balance,
                amount,
            })?;
        self.store
            .put(&KeyPrefix::balance_key(address), &updated.to_be_bytes())?;
        Ok(updated)
    }

    // =========================================================================
    // NONCES
    // =========================================================================

    pub fn nonce(&self, address: &Address) -> Result<u64, StateError> {
        let key = KeyPrefix::nonce_key(address);
        match self.store.get(&key)? {
            Some(raw) => Ok(u64::from_be_bytes(fixed_width(&key, &raw)?)),
            None => Ok(0),
        }
    }

    pub fn set_nonce(&mut self, address: &Address, nonce: u64) -> Result<(), StateError> {
        self.store
            .put(&KeyPrefix::nonce_key(address), &nonce.to_be_bytes())?;
        Ok(())
    }

    // =========================================================================
    // CODE
    // =========================================================================

    pub fn code(&self, address: &Address) -> Result<Option<Vec<u8>>, StateError> {
        Ok(self.store.get(&KeyPrefix::code_key(address))?)
    }

    pub fn has_code(&self, address: &Address) -> Result<bool, StateError> {
        Ok(self.code(address)?.is_some())
    }

    /// Replace the code at `address`. Empty code removes it.
    pub fn set_code(&mut self, address: &Address, code: &[u8]) -> Result<(), StateError> {
        let key = KeyPrefix::code_key(address);
        if code.is_empty() {
            self.store.delete(&key)?;
        } else {
            self.store.put(&key, code)?;
        }
        Ok(())
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    /// Read a storage word; unset slots read as zero.
    pub fn storage(&self, address: &Address, slot: &Hash) -> Result<Hash, StateError> {
        let key = KeyPrefix::storage_key(address, slot);
        match self.store.get(&key)? {
            Some(raw) => fixed_width(&key, &raw),
            None => Ok(ZERO_HASH),
        }
    }

    /// Write a storage word. Writing zero clears the slot.
    pub fn set_storage(
        &mut self,
        address: &Address,
        slot: &Hash,
        value: &Hash,
    ) -> Result<(), StateError> {
        let key = KeyPrefix::storage_key(address, slot);
        if *value == ZERO_HASH {
            self.store.delete(&key)?;
        } else {
            self.store.put(&key, value)?;
        }
        Ok(())
    }

    // =========================================================================
    // ROOT
    // =========================================================================

    /// Commitment over every stored pair.
    pub fn root_hash(&self) -> Result<Hash, StateError> {
        let mut hasher = Keccak256Hasher::new();
        hasher.update(STATE_ROOT_DOMAIN);
        let mut pairs = 0usize;
        for item in self.store.iter() {
            let (key, value) = item?;
            hasher
                .update(&(key.len() as u32).to_be_bytes())
                .update(&key)
                .update(&(value.len() as u32).to_be_bytes())
                .update(&value);
            pairs += 1;
        }
        let root = hasher.finalize();

        #[cfg(feature = "tracing-log")]
        tracing::debug!(
            "[qc-genesis-state] State root {} over {} pairs",
            hex::encode(&root[..8]),
            pairs
        );
        #[cfg(not(feature = "tracing-log"))]
        let _ = pairs;

        Ok(root)
    }
}

fn fixed_width<const N: usize>(key: &[u8], raw: &[u8]) -> Result<[u8; N], StateError> {
    raw.try_into().map_err(|_| StateError::MalformedValue {
        key: hex::encode(key),
        expected: N,
        actual: raw.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryKvStore;
    use proptest::prelude::*;

    fn state() -> StateDb<InMemoryKvStore> {
        StateDb::new(InMemoryKvStore::new())
    }

    #[test]
    fn test_add_balance_accumulates() {
        let mut db = state();
        let alice = [1u8; 20];

        assert_eq!(db.balance(&alice).unwrap(), 0);
        assert_eq!(db.add_balance(&alice, 100).unwrap(), 100);
        assert_eq!(db.add_balance(&alice, 50).unwrap(), 150);
        assert_eq!(db.balance(&alice).unwrap(), 150);
    }

    #[test]
    fn test_add_balance_overflow() {
        let mut db = state();
        let alice = [1u8; 20];
        db.add_balance(&alice, u128::MAX).unwrap();

        let err = db.add_balance(&alice, 1).unwrap_err();
        assert!(matches!(err, StateError::BalanceOverflow { amount: 1, .. }));
        // Balance unchanged
        assert_eq!(db.balance(&alice).unwrap(), u128::MAX);
    }

    #[test]
    fn test_set_code_replaces() {
        let mut db = state();
        let contract = [0x10u8; 20];

        db.set_code(&contract, &[1, 2, 3]).unwrap();
        db.set_code(&contract, &[0]).unwrap();
        assert_eq!(db.code(&contract).unwrap(), Some(vec![0]));

        db.set_code(&contract, &[]).unwrap();
        assert!(!db.has_code(&contract).unwrap());
    }

    #[test]
    fn test_storage_zero_clears_slot() {
        let mut db = state();
        let contract = [0x10u8; 20];
        let slot = [7u8; 32];

        db.set_storage(&contract, &slot, &[9u8; 32]).unwrap();
        assert_eq!(db.storage(&contract, &slot).unwrap(), [9u8; 32]);
        assert_eq!(db.len(), 1);

        db.set_storage(&contract, &slot, &ZERO_HASH).unwrap();
        assert_eq!(db.storage(&contract, &slot).unwrap(), ZERO_HASH);
        assert!(db.is_empty());
    }

    #[test]
    fn test_nonce_roundtrip() {
        let mut db = state();
        let alice = [1u8; 20];
        assert_eq!(db.nonce(&alice).unwrap(), 0);
        db.set_nonce(&alice, 42).unwrap();
        assert_eq!(db.nonce(&alice).unwrap(), 42);
    }

    #[test]
    fn test_malformed_balance_reported() {
        let alice = [1u8; 20];
        let store =
            InMemoryKvStore::from_pairs(vec![(KeyPrefix::balance_key(&alice), vec![1, 2, 3])]);
        let db = StateDb::new(store);

        let err = db.balance(&alice).unwrap_err();
        assert!(matches!(
            err,
            StateError::MalformedValue {
                expected: 16,
                actual: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_root_changes_with_state() {
        let mut db = state();
        let empty_root = db.root_hash().unwrap();
        db.add_balance(&[1u8; 20], 1).unwrap();
        assert_ne!(db.root_hash().unwrap(), empty_root);
    }

    proptest! {
        #[test]
        fn prop_root_independent_of_write_order(
            credits in proptest::collection::vec((any::<u8>(), 1u64..1_000_000), 1..20)
        ) {
            let mut forward = state();
            for (who, amount) in &credits {
                forward.add_balance(&[*who; 20], *amount as u128).unwrap();
            }

            let mut backward = state();
            for (who, amount) in credits.iter().rev() {
                backward.add_balance(&[*who; 20], *amount as u128).unwrap();
            }

            prop_assert_eq!(forward.root_hash().unwrap(), backward.root_hash().unwrap());
        }
    }
}
