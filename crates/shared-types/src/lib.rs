//! # Shared Types Crate
//!
//! Domain entities shared by every genesis crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: validators, delegations, block/epoch records
//!   and the genesis header are defined once, here.
//! - **Deterministic Encoding**: every record uses ordered collections so that
//!   bincode output and record hashes are identical across machines.
//! - **Fixed Hash Feeds**: record hashes are computed by feeding fields into
//!   Keccak-256 in a fixed order, never from an encoder's output.
//!
//! ## Clusters
//!
//! - **Identity**: `ValidatorId`, `Epoch`, `BlockIdx`, `Timestamp`, `Address`
//! - **Staking**: `Validator`, `ValidatorPubKey`, `Delegation`
//! - **Records**: `BlockState`, `EpochState`, `EpochRecord`, `BlockRecord`
//! - **Artifact**: `GenesisHeader`, `SectionKind`, `SectionDescriptor`

pub mod entities;
pub mod errors;
pub mod genesis;
mod hashing;
pub mod records;
pub mod rules;

pub use entities::*;
pub use errors::*;
pub use genesis::*;
pub use records::*;
pub use rules::*;
