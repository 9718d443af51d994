//! Error types for genesis construction

use qc_genesis_state::StateError;
use shared_crypto::CryptoError;
use shared_types::Epoch;
use thiserror::Error;

/// Result type alias for genesis builder operations
pub type Result<T> = std::result::Result<T, GenesisError>;

/// Errors that abort a genesis build
#[derive(Debug, Error)]
pub enum GenesisError {
    /// `set_current_epoch` was called a second time
    #[error("Current epoch already seeded at epoch {existing}")]
    EpochAlreadySeeded {
        /// Epoch of the record seeded first
        existing: Epoch,
    },

    /// Execution requested before the epoch baseline was seeded
    #[error("Current epoch not seeded; set_current_epoch must precede execution")]
    EpochNotSeeded,

    /// Total supply no longer fits in u128
    #[error("Total supply overflow: supply {supply}, credit {amount}")]
    SupplyOverflow {
        /// Supply before the failing credit
        supply: u128,
        /// Amount being credited
        amount: u128,
    },

    /// A genesis transaction was rejected by the block processor
    #[error("Genesis transaction {index} of {total} rejected: {reason}")]
    Execution {
        /// Position of the rejected transaction
        index: usize,
        /// Number of submitted transactions
        total: usize,
        /// Processor's reason
        reason: String,
    },

    /// Processor output does not extend the seeded records
    #[error("Inconsistent processor output: {0}")]
    InconsistentOutput(String),

    /// Invalid fake-network parameters
    #[error("Invalid genesis parameters: {0}")]
    InvalidParams(String),

    /// System contract bytecode could not be loaded
    #[error("Failed to load contract {name}: {reason}")]
    ContractLoad {
        /// Contract name
        name: &'static str,
        /// Cause
        reason: String,
    },

    /// State store access failed
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Key generation failed
    #[error("Key generation error: {0}")]
    Crypto(#[from] CryptoError),
}

/// Errors reported by a `BlockProcessor`
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// Transaction at `index` was rejected
    #[error("transaction {index} rejected: {reason}")]
    Rejected {
        /// Position in the submitted list
        index: usize,
        /// Cause
        reason: String,
    },

    /// State store access failed during execution
    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl ExecutionError {
    pub(crate) fn rejected(index: usize, reason: impl Into<String>) -> Self {
        ExecutionError::Rejected {
            index,
            reason: reason.into(),
        }
    }
}
