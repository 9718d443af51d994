//! # Outbound Ports (Driven Ports)
//!
//! The execution pipeline the builder drives. The builder seeds state and an
//! epoch baseline, then hands both to a `BlockProcessor` together with the
//! ordered genesis transactions.

use qc_genesis_state::{KeyValueStore, StateDb};
use shared_types::{BlockRecord, EpochRecord};

use crate::domain::GenesisTx;
use crate::error::ExecutionError;

/// Records committed by one processor run, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub blocks: Vec<BlockRecord>,
    pub epochs: Vec<EpochRecord>,
}

/// Deterministic block-execution pipeline.
///
/// Implementations must be pure functions of `(state, seed, txs)`: the same
/// inputs yield the same records and the same resulting state on any
/// machine. Any rejected transaction aborts the run.
///
/// Reference implementation: `NativeGenesisProcessor`.
pub trait BlockProcessor<S: KeyValueStore> {
    fn process(
        &self,
        state: &mut StateDb<S>,
        seed: &EpochRecord,
        txs: &[GenesisTx],
    ) -> Result<ExecutionOutput, ExecutionError>;
}
