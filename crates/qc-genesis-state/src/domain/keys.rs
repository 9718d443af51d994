//! Key layout of the state store.

use shared_types::{Address, Hash};

/// Key prefixes for different data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPrefix {
    /// Account balance: `a:{address}` -> u128 BE
    Balance,
    /// Contract code: `c:{address}` -> bytecode
    Code,
    /// Account nonce: `n:{address}` -> u64 BE
    Nonce,
    /// Contract storage: `s:{address}{slot}` -> 32-byte word
    Storage,
}

impl KeyPrefix {
    /// Get the byte prefix for this key type.
    pub fn as_bytes(&self) -> &'static [u8] {
        match self {
            KeyPrefix::Balance => b"a:",
            KeyPrefix::Code => b"c:",
            KeyPrefix::Nonce => b"n:",
            KeyPrefix::Storage => b"s:",
        }
    }

    /// Build a full key with the given suffix.
    pub fn key(&self, suffix: &[u8]) -> Vec<u8> {
        let mut key = self.as_bytes().to_vec();
        key.extend_from_slice(suffix);
        key
    }

    pub fn balance_key(address: &Address) -> Vec<u8> {
        KeyPrefix::Balance.key(address)
    }

    pub fn code_key(address: &Address) -> Vec<u8> {
        KeyPrefix::Code.key(address)
    }

    pub fn nonce_key(address: &Address) -> Vec<u8> {
        KeyPrefix::Nonce.key(address)
    }

    pub fn storage_key(address: &Address, slot: &Hash) -> Vec<u8> {
        let mut suffix = Vec::with_capacity(address.len() + slot.len());
        suffix.extend_from_slice(address);
        suffix.extend_from_slice(slot);
        KeyPrefix::Storage.key(&suffix)
    }
}
