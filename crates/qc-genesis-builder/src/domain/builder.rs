//! # Genesis Builder
//!
//! Two-phase construction of a genesis snapshot.
//!
//! ```text
//! GenesisBuilder<S>                         ExecutedGenesis<S>
//!   add_balance / set_code / ...              blocks()  epochs()   (newest first)
//!   set_current_epoch (once)   ──execute──→   total_supply()
//!                                             current_hash()  header()  state()
//! ```
//!
//! `execute_genesis_txs` consumes the builder. The genesis identity is only
//! reachable from `ExecutedGenesis`, so it can never be taken from a state
//! that has not been fully executed, and a failed execution leaves nothing
//! behind.

use qc_genesis_state::{KeyValueStore, StateDb};
use shared_types::{Address, BlockRecord, EpochRecord, GenesisHeader, Hash, NetworkRules};

use crate::domain::transactions::GenesisTx;
use crate::error::{ExecutionError, GenesisError, Result};
use crate::ports::{BlockProcessor, ExecutionOutput};

/// Mutable pre-execution genesis state.
pub struct GenesisBuilder<S: KeyValueStore> {
    state: StateDb<S>,
    total_supply: u128,
    seed: Option<EpochRecord>,
}

impl<S: KeyValueStore> GenesisBuilder<S> {
    pub fn new(store: S) -> Self {
        Self {
            state: StateDb::new(store),
            total_supply: 0,
            seed: None,
        }
    }

    /// Credit `amount` to `address`. Additive across calls.
    pub fn add_balance(&mut self, address: Address, amount: u128) -> Result<()> {
        let supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(GenesisError::SupplyOverflow {
                supply: self.total_supply,
                amount,
            })?;
        self.state.add_balance(&address, amount)?;
        self.total_supply = supply;
        Ok(())
    }

    /// Install bytecode at `address`, replacing any previous code.
    pub fn set_code(&mut self, address: Address, code: &[u8]) -> Result<()> {
        self.state.set_code(&address, code)?;
        Ok(())
    }

    pub fn set_nonce(&mut self, address: Address, nonce: u64) -> Result<()> {
        self.state.set_nonce(&address, nonce)?;
        Ok(())
    }

    pub fn set_storage(&mut self, address: Address, slot: Hash, value: Hash) -> Result<()> {
        self.state.set_storage(&address, &slot, &value)?;
        Ok(())
    }

    /// Seed the block/epoch baseline execution extends. Exactly once.
    pub fn set_current_epoch(&mut self, record: EpochRecord) -> Result<()> {
        if let Some(existing) = &self.seed {
            return Err(GenesisError::EpochAlreadySeeded {
                existing: existing.idx,
            });
        }
        tracing::debug!(
            "[qc-genesis] Seeded epoch {} at block {}",
            record.idx,
            record.block_state.last_block.idx
        );
        self.seed = Some(record);
        Ok(())
    }

    /// Sum of all credited balances.
    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    pub fn state(&self) -> &StateDb<S> {
        &self.state
    }

    /// Run the genesis transactions through `processor`.
    ///
    /// Consumes the builder: on failure the partially executed state is
    /// dropped with it.
    pub fn execute_genesis_txs<P>(
        self,
        processor: &P,
        txs: &[GenesisTx],
    ) -> Result<ExecutedGenesis<S>>
    where
        P: BlockProcessor<S> + ?Sized,
    {
        let Self {
            mut state,
            total_supply,
            seed,
        } = self;
        let seed = seed.ok_or(GenesisError::EpochNotSeeded)?;
        let total = txs.len();

        tracing::info!(
            "[qc-genesis] Executing {} genesis transactions on top of epoch {}",
            total,
            seed.idx
        );

        let output = processor
            .process(&mut state, &seed, txs)
            .map_err(|e| match e {
                ExecutionError::Rejected { index, reason } => {
                    tracing::warn!(
                        "[qc-genesis] Genesis transaction {}/{} rejected: {}",
                        index,
                        total,
                        reason
                    );
                    GenesisError::Execution {
                        index,
                        total,
                        reason,
                    }
                }
                ExecutionError::State(e) => GenesisError::State(e),
            })?;

        check_extends_seed(&seed, &output)?;
        let ExecutionOutput { blocks, epochs } = output;

        // Newest first
        let mut all_epochs = Vec::with_capacity(epochs.len() + 1);
        all_epochs.push(seed);
        all_epochs.extend(epochs);
        all_epochs.reverse();
        let mut blocks = blocks;
        blocks.reverse();

        let newest = &all_epochs[0];
        let current_hash = newest.hash();
        let rules = newest.epoch_state.rules.clone();

        tracing::info!(
            "[qc-genesis] Execution complete: {} blocks, {} epochs, genesis id {}",
            blocks.len(),
            all_epochs.len(),
            hex::encode(current_hash)
        );

        Ok(ExecutedGenesis {
            state,
            total_supply,
            blocks,
            epochs: all_epochs,
            current_hash,
            rules,
        })
    }
}

/// Records must strictly extend the seeded block and epoch indices.
fn check_extends_seed(seed: &EpochRecord, output: &ExecutionOutput) -> Result<()> {
    let mut last_block = seed.block_state.last_block.idx;
    for block in &output.blocks {
        if block.idx <= last_block {
            return Err(GenesisError::InconsistentOutput(format!(
                "block {} does not follow block {}",
                block.idx, last_block
            )));
        }
        last_block = block.idx;
    }
    let mut last_epoch = seed.idx;
    for epoch in &output.epochs {
        if epoch.idx <= last_epoch {
            return Err(GenesisError::InconsistentOutput(format!(
                "epoch {} does not follow epoch {}",
                epoch.idx, last_epoch
            )));
        }
        last_epoch = epoch.idx;
    }
    Ok(())
}

/// Read-only result of a successful genesis execution.
pub struct ExecutedGenesis<S: KeyValueStore> {
    state: StateDb<S>,
    total_supply: u128,
    blocks: Vec<BlockRecord>,
    epochs: Vec<EpochRecord>,
    current_hash: Hash,
    rules: NetworkRules,
}

impl<S: KeyValueStore> ExecutedGenesis<S> {
    /// Committed blocks, newest first.
    pub fn blocks(&self) -> &[BlockRecord] {
        &self.blocks
    }

    /// Epoch records including the seed, newest first.
    pub fn epochs(&self) -> &[EpochRecord] {
        &self.epochs
    }

    pub fn total_supply(&self) -> u128 {
        self.total_supply
    }

    /// Hash of the newest epoch record. This is the genesis ID.
    pub fn current_hash(&self) -> Hash {
        self.current_hash
    }

    /// Rules of the newest epoch.
    pub fn rules(&self) -> &NetworkRules {
        &self.rules
    }

    pub fn header(&self) -> GenesisHeader {
        GenesisHeader {
            genesis_id: self.current_hash,
            network_id: self.rules.network_id,
            network_name: self.rules.name.clone(),
        }
    }

    pub fn state(&self) -> &StateDb<S> {
        &self.state
    }
}
