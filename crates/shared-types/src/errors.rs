//! # Error Types
//!
//! Errors raised while decoding or encoding shared types.

use thiserror::Error;

/// Errors from parsing shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Section kind byte is not one of the known kinds.
    #[error("Unknown section kind: {0}")]
    UnknownSectionKind(u8),

    /// Network preset name is not recognised.
    #[error("Unknown network preset: {0} (expected testnet or devnet)")]
    UnknownNetwork(String),

    /// Network name does not fit the header encoding.
    #[error("Network name is {len} bytes, limit is {max}")]
    NetworkNameTooLong { len: usize, max: usize },
}
