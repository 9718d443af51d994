//! # Shared Crypto - Genesis Cryptographic Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | Keccak-256 | Addresses, state roots, section hashes |
//! | `ecdsa` | secp256k1 | Validator and node identities |
//!
//! ## Security Properties
//!
//! - **secp256k1**: secret scalars drawn from a caller-supplied CSPRNG,
//!   seed buffers zeroized after use
//! - **Keccak-256**: Ethereum-compatible address derivation

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ecdsa;
pub mod errors;
pub mod hashing;

// Re-exports
pub use ecdsa::{Secp256k1KeyPair, Secp256k1PublicKey};
pub use errors::CryptoError;
pub use hashing::{keccak256, keccak256_many, Keccak256Hasher};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
