//! # Native Genesis Processor
//!
//! Reference `BlockProcessor`: applies genesis transactions directly to the
//! system contracts' storage instead of interpreting contract bytecode.
//!
//! ## Execution
//!
//! 1. Open block `last + 1` at `time + 1ns`.
//! 2. Apply each transaction in order. The first rejection aborts the run.
//! 3. Commit the block with one receipt per transaction and the resulting
//!    state root.
//! 4. Seal epoch `seed + 1` with the stake-weighted validator table.
//!
//! ## Rules
//!
//! | Transaction | Rejected when |
//! |-------------|---------------|
//! | `InitializeNetwork` | already initialized, a contract has no code, sealed epoch not before the seed |
//! | `SetGenesisValidator` | network not initialized, id not the next sequential id, empty key, duplicate address |
//! | `SetGenesisDelegation` | network not initialized, unknown validator, zero stake, locked stake above stake |

use std::collections::{BTreeMap, BTreeSet};

use qc_genesis_state::{KeyValueStore, StateDb};
use shared_crypto::Keccak256Hasher;
use shared_types::{
    Address, BlockCtx, BlockIdx, BlockRecord, BlockState, Delegation, Epoch, EpochRecord, EpochState,
    Hash, Receipt, ReceiptStatus, Validator, ValidatorId, ValidatorProfile, ValidatorWeights,
};

use crate::domain::{ContractAddresses, GenesisTx};
use crate::error::ExecutionError;
use crate::ports::{BlockProcessor, ExecutionOutput};

/// Intrinsic gas of every genesis transaction.
pub const GENESIS_TX_BASE_GAS: u64 = 21_000;

/// Gas charged per storage word written.
pub const STORAGE_WRITE_GAS: u64 = 20_000;

/// Reference genesis execution pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeGenesisProcessor;

impl NativeGenesisProcessor {
    pub fn new() -> Self {
        Self
    }
}

impl<S: KeyValueStore> BlockProcessor<S> for NativeGenesisProcessor {
    fn process(
        &self,
        state: &mut StateDb<S>,
        seed: &EpochRecord,
        txs: &[GenesisTx],
    ) -> Result<ExecutionOutput, ExecutionError> {
        let last = &seed.block_state.last_block;
        let block_idx = BlockIdx(last.idx.0 + 1);
        let block_time = last.time.add_nanos(1);

        let mut run = GenesisRun::new(seed);
        let mut tx_hashes = Vec::with_capacity(txs.len());
        let mut receipts = Vec::with_capacity(txs.len());
        let mut block_gas = 0u64;

        for (index, tx) in txs.iter().enumerate() {
            let writes = run.apply(state, index, tx)?;
            let gas_used = GENESIS_TX_BASE_GAS + STORAGE_WRITE_GAS * writes;
            let tx_hash = tx.hash();
            tracing::debug!(
                "[qc-genesis] Applied {} #{} ({} storage writes)",
                tx.kind(),
                index,
                writes
            );
            block_gas = block_gas.saturating_add(gas_used);
            tx_hashes.push(tx_hash);
            receipts.push(Receipt {
                tx_hash,
                status: ReceiptStatus::Success,
                gas_used,
            });
        }

        let state_root = state.root_hash()?;
        let parent_hash = last.atropos;
        let block_hash =
            BlockRecord::compute_hash(block_idx, &parent_hash, &state_root, block_time, &tx_hashes);
        let block = BlockRecord {
            idx: block_idx,
            hash: block_hash,
            parent_hash,
            state_root,
            time: block_time,
            duration: block_time.0.saturating_sub(last.time.0),
            gas_used: block_gas,
            txs: tx_hashes,
            receipts,
        };

        let profiles = run.profiles;
        let sealed_epoch = Epoch(seed.idx.0 + 1);
        let sealed = EpochRecord {
            idx: sealed_epoch,
            block_state: BlockState {
                last_block: BlockCtx {
                    idx: block_idx,
                    time: block_time,
                    atropos: block_hash,
                },
                finalized_state_root: state_root,
                epoch_gas: 0,
                advance_epochs: 0,
                next_validator_profiles: profiles.clone(),
            },
            epoch_state: EpochState {
                epoch: sealed_epoch,
                epoch_start: block_time,
                prev_epoch_start: seed.epoch_state.epoch_start,
                epoch_state_root: state_root,
                validators: ValidatorWeights::from_profiles(&profiles),
                validator_profiles: profiles,
                rules: seed.epoch_state.rules.clone(),
            },
        };

        tracing::info!(
            "[qc-genesis] Committed block {} ({} txs, gas {}), sealed epoch {} with {} validators",
            block.idx,
            block.txs.len(),
            block.gas_used,
            sealed.idx,
            sealed.epoch_state.validators.len()
        );

        Ok(ExecutionOutput {
            blocks: vec![block],
            epochs: vec![sealed],
        })
    }
}

// =============================================================================
// RUN STATE
// =============================================================================

/// Bookkeeping of one processor run.
struct GenesisRun<'a> {
    seed: &'a EpochRecord,
    contracts: Option<ContractAddresses>,
    profiles: BTreeMap<ValidatorId, ValidatorProfile>,
    addresses: BTreeSet<Address>,
    next_id: u32,
}

impl<'a> GenesisRun<'a> {
    fn new(seed: &'a EpochRecord) -> Self {
        let profiles = seed.epoch_state.validator_profiles.clone();
        let next_id = profiles.keys().next_back().map(|id| id.0 + 1).unwrap_or(1);
        Self {
            seed,
            contracts: None,
            profiles,
            addresses: BTreeSet::new(),
            next_id,
        }
    }

    /// Apply one transaction; returns the number of storage words written.
    fn apply<S: KeyValueStore>(
        &mut self,
        state: &mut StateDb<S>,
        index: usize,
        tx: &GenesisTx,
    ) -> Result<u64, ExecutionError> {
        match tx {
            GenesisTx::InitializeNetwork {
                sealed_epoch,
                total_supply,
                contracts,
                owner,
            } => {
                if self.contracts.is_some() {
                    return Err(ExecutionError::rejected(index, "network already initialized"));
                }
                if *sealed_epoch >= self.seed.idx {
                    return Err(ExecutionError::rejected(
                        index,
                        format!(
                            "sealed epoch {} must precede seeded epoch {}",
                            sealed_epoch, self.seed.idx
                        ),
                    ));
                }
                for address in contracts.all() {
                    if !state.has_code(&address)? {
                        return Err(ExecutionError::rejected(
                            index,
                            format!("no code at system contract {}", hex::encode(address)),
                        ));
                    }
                }

                let mut writes = Writes::new(state);
                writes.put(
                    &contracts.network_initializer,
                    slot(b"initialized", &[]),
                    word_u128(1),
                )?;
                writes.put(
                    &contracts.staking,
                    slot(b"sealed-epoch", &[]),
                    word_u128(sealed_epoch.0 as u128),
                )?;
                writes.put(
                    &contracts.staking,
                    slot(b"total-supply", &[]),
                    word_u128(*total_supply),
                )?;
                writes.put(&contracts.staking, slot(b"owner", &[]), word_address(owner))?;
                writes.put(
                    &contracts.staking,
                    slot(b"node-driver-auth", &[]),
                    word_address(&contracts.node_driver_auth),
                )?;
                writes.put(
                    &contracts.node_driver_auth,
                    slot(b"staking", &[]),
                    word_address(&contracts.staking),
                )?;
                writes.put(
                    &contracts.node_driver_auth,
                    slot(b"node-driver", &[]),
                    word_address(&contracts.node_driver),
                )?;
                writes.put(
                    &contracts.node_driver,
                    slot(b"backend", &[]),
                    word_address(&contracts.node_driver_auth),
                )?;
                self.contracts = Some(*contracts);
                Ok(writes.count)
            }

            GenesisTx::SetGenesisValidator(validator) => {
                let contracts = self.initialized(index)?;
                self.check_validator(index, validator)?;

                let id = id_bytes(validator.id);
                let mut writes = Writes::new(state);
                writes.put(
                    &contracts.staking,
                    slot(b"validator.address", &[&id]),
                    word_address(&validator.address),
                )?;
                writes.put(
                    &contracts.staking,
                    slot(b"validator.pubkey", &[&id]),
                    pub_key_hash(validator),
                )?;
                writes.put(
                    &contracts.staking,
                    slot(b"validator.status", &[&id]),
                    word_u128(validator.status.0 as u128),
                )?;
                writes.put(
                    &contracts.staking,
                    slot(b"validator.created", &[&id]),
                    word_pair(validator.creation_epoch.0 as u64, validator.creation_time.0),
                )?;
                writes.put(
                    &contracts.staking,
                    slot(b"validator.deactivated", &[&id]),
                    word_pair(
                        validator.deactivated_epoch.0 as u64,
                        validator.deactivated_time.0,
                    ),
                )?;
                writes.put(
                    &contracts.staking,
                    slot(b"last-validator-id", &[]),
                    word_u128(validator.id.0 as u128),
                )?;

                self.profiles.insert(
                    validator.id,
                    ValidatorProfile {
                        weight: 0,
                        pub_key: validator.pub_key.clone(),
                    },
                );
                self.addresses.insert(validator.address);
                self.next_id = validator.id.0 + 1;
                Ok(writes.count)
            }

            GenesisTx::SetGenesisDelegation(delegation) => {
                let contracts = self.initialized(index)?;
                check_delegation(index, delegation)?;
                let current_weight = match self.profiles.get(&delegation.validator_id) {
                    Some(profile) => profile.weight,
                    None => {
                        return Err(ExecutionError::rejected(
                            index,
                            format!("unknown validator {}", delegation.validator_id),
                        ))
                    }
                };
                let weight = current_weight.checked_add(delegation.stake).ok_or_else(|| {
                    ExecutionError::rejected(
                        index,
                        format!("stake of validator {} overflows", delegation.validator_id),
                    )
                })?;

                let staking = contracts.staking;
                let id = id_bytes(delegation.validator_id);
                let total_slot = slot(b"total-stake", &[]);
                let stake_slot = slot(b"stake", &[&delegation.address, &id]);
                let total_stake = read_u128(state, &staking, &total_slot)?
                    .checked_add(delegation.stake)
                    .ok_or_else(|| ExecutionError::rejected(index, "total stake overflows"))?;
                let stake = read_u128(state, &staking, &stake_slot)?
                    .checked_add(delegation.stake)
                    .ok_or_else(|| ExecutionError::rejected(index, "delegation stake overflows"))?;

                let mut writes = Writes::new(state);
                writes.put(&staking, stake_slot, word_u128(stake))?;
                writes.put(
                    &staking,
                    slot(b"validator.stake", &[&id]),
                    word_u128(weight),
                )?;
                writes.put(&staking, total_slot, word_u128(total_stake))?;
                if delegation.locked_stake > 0 {
                    writes.put(
                        &staking,
                        slot(b"locked-stake", &[&delegation.address, &id]),
                        word_u128(delegation.locked_stake),
                    )?;
                    writes.put(
                        &staking,
                        slot(b"lockup", &[&delegation.address, &id]),
                        word_pair(
                            delegation.lockup_from_epoch.0 as u64,
                            delegation.lockup_end_time.0,
                        ),
                    )?;
                }
                if delegation.rewards > 0 {
                    writes.put(
                        &staking,
                        slot(b"rewards", &[&delegation.address, &id]),
                        word_u128(delegation.rewards),
                    )?;
                }

                if let Some(profile) = self.profiles.get_mut(&delegation.validator_id) {
                    profile.weight = weight;
                }
                Ok(writes.count)
            }
        }
    }

    fn initialized(&self, index: usize) -> Result<ContractAddresses, ExecutionError> {
        self.contracts
            .ok_or_else(|| ExecutionError::rejected(index, "network not initialized"))
    }

    fn check_validator(&self, index: usize, validator: &Validator) -> Result<(), ExecutionError> {
        if validator.id.0 != self.next_id {
            return Err(ExecutionError::rejected(
                index,
                format!(
                    "validator id {} out of sequence, expected {}",
                    validator.id, self.next_id
                ),
            ));
        }
        if validator.pub_key.is_empty() {
            return Err(ExecutionError::rejected(
                index,
                format!("validator {} has an empty public key", validator.id),
            ));
        }
        if self.addresses.contains(&validator.address) {
            return Err(ExecutionError::rejected(
                index,
                format!(
                    "validator address {} already registered",
                    hex::encode(validator.address)
                ),
            ));
        }
        Ok(())
    }
}

fn check_delegation(index: usize, delegation: &Delegation) -> Result<(), ExecutionError> {
    if delegation.stake == 0 {
        return Err(ExecutionError::rejected(
            index,
            format!("zero stake delegated to validator {}", delegation.validator_id),
        ));
    }
    if delegation.locked_stake > delegation.stake {
        return Err(ExecutionError::rejected(
            index,
            format!(
                "locked stake {} exceeds stake {}",
                delegation.locked_stake, delegation.stake
            ),
        ));
    }
    Ok(())
}

// =============================================================================
// STORAGE HELPERS
// =============================================================================

/// Counts storage words written by one transaction.
struct Writes<'s, S: KeyValueStore> {
    state: &'s mut StateDb<S>,
    count: u64,
}

impl<'s, S: KeyValueStore> Writes<'s, S> {
    fn new(state: &'s mut StateDb<S>) -> Self {
        Self { state, count: 0 }
    }

    fn put(&mut self, contract: &Address, slot: Hash, value: Hash) -> Result<(), ExecutionError> {
        self.state.set_storage(contract, &slot, &value)?;
        self.count += 1;
        Ok(())
    }
}

/// Storage slot `keccak(label ‖ parts…)`.
fn slot(label: &[u8], parts: &[&[u8]]) -> Hash {
    let mut hasher = Keccak256Hasher::new();
    hasher.update(label);
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize()
}

fn id_bytes(id: ValidatorId) -> [u8; 4] {
    id.0.to_be_bytes()
}

fn word_u128(value: u128) -> Hash {
    let mut word = [0u8; 32];
    word[16..].copy_from_slice(&value.to_be_bytes());
    word
}

fn word_address(address: &Address) -> Hash {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address);
    word
}

/// Two u64 values packed into one word: `[.. hi ..][.. lo ..]`.
fn word_pair(hi: u64, lo: u64) -> Hash {
    let mut word = [0u8; 32];
    word[16..24].copy_from_slice(&hi.to_be_bytes());
    word[24..].copy_from_slice(&lo.to_be_bytes());
    word
}

fn pub_key_hash(validator: &Validator) -> Hash {
    let mut hasher = Keccak256Hasher::new();
    hasher.update(&validator.pub_key.bytes());
    hasher.finalize()
}

fn read_u128<S: KeyValueStore>(
    state: &StateDb<S>,
    contract: &Address,
    slot: &Hash,
) -> Result<u128, ExecutionError> {
    let word = state.storage(contract, slot)?;
    let mut low = [0u8; 16];
    low.copy_from_slice(&word[16..]);
    Ok(u128::from_be_bytes(low))
}
