//! # qc-genesis-state
//!
//! Embedded state store for genesis construction.
//!
//! ## Role in System
//!
//! - **Builder backend**: `GenesisBuilder` credits balances and installs code
//!   through `StateDb`
//! - **Export source**: the State section streams the store's ordered
//!   key/value pairs
//! - **Restore target**: a verified artifact rebuilds an `InMemoryKvStore`
//!
//! ## Layout
//!
//! ```text
//! StateDb<S: KeyValueStore>
//!     │  a:{address}          -> balance (u128 BE)
//!     │  n:{address}          -> nonce   (u64 BE)
//!     │  c:{address}          -> bytecode
//!     │  s:{address}{slot}    -> storage word (32 bytes)
//!     ↓
//! KeyValueStore (ordered, fallible iteration)
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;
