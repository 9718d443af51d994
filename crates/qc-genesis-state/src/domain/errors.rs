use shared_types::Address;
use thiserror::Error;

/// Key-value backend errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum KvStoreError {
    #[error("KV store I/O error: {message}")]
    Io { message: String },

    #[error("KV store corruption: {message}")]
    Corruption { message: String },
}

#[derive(Debug, Error)]
pub enum StateError {
    #[error(transparent)]
    Store(#[from] KvStoreError),

    #[error("Balance overflow for {}: balance {balance}, credit {amount}", hex::encode(address))]
    BalanceOverflow {
        address: Address,
        balance: u128,
        amount: u128,
    },

    #[error("Malformed value under key {key}: expected {expected} bytes, got {actual}")]
    MalformedValue {
        key: String,
        expected: usize,
        actual: usize,
    },
}
