//! # qc-genesis-builder
//!
//! Builds the deterministic initial state of a network.
//!
//! ## Role in System
//!
//! - **Accumulates** balances and system contract code in a `StateDb`
//! - **Seeds** the block/epoch baseline exactly once
//! - **Drives** an injected `BlockProcessor` over the genesis transactions
//! - **Exposes** blocks, epochs, total supply and the genesis ID once
//!   execution has finished
//!
//! ## Flow
//!
//! ```text
//! add_balance / set_code ──→ GenesisBuilder ──set_current_epoch──┐
//!                                                                 ↓
//!            genesis_txs() ──→ execute_genesis_txs(processor, txs)
//!                                                                 ↓
//!                       ExecutedGenesis { blocks, epochs, state, current_hash }
//! ```
//!
//! Execution results feed `qc-genesis-store`, which exports them into a
//! hashed multi-section artifact.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;

pub use adapters::*;
pub use config::*;
pub use domain::*;
pub use error::*;
pub use ports::*;
