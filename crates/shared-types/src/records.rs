//! # Block and Epoch Records
//!
//! Immutable records produced by the execution pipeline and exported into the
//! Blocks and Epochs sections of a genesis artifact.
//!
//! An `EpochRecord` captures both the last committed block context
//! (`BlockState`) and the validator/epoch snapshot (`EpochState`). The record
//! hash of the newest epoch is the genesis identity, so every field that can
//! differ between two genesis runs is part of the hash feed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entities::{BlockIdx, Epoch, Hash, Timestamp, ValidatorId, ValidatorPubKey};
use crate::hashing::RecordHasher;
use crate::rules::NetworkRules;

/// Context of a committed block.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockCtx {
    pub idx: BlockIdx,
    pub time: Timestamp,
    /// Event that decided the block (zero for genesis).
    pub atropos: Hash,
}

/// Profile of a validator as seen by the epoch machinery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorProfile {
    /// Voting weight (total delegated stake).
    pub weight: u128,
    /// Consensus public key.
    pub pub_key: ValidatorPubKey,
}

/// Stake-weighted validator table, sorted by validator ID.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ValidatorWeights(Vec<(ValidatorId, u128)>);

impl ValidatorWeights {
    /// Build a table from profiles. Zero-weight validators are excluded.
    pub fn from_profiles(profiles: &BTreeMap<ValidatorId, ValidatorProfile>) -> Self {
        Self(
            profiles
                .iter()
                .filter(|(_, profile)| profile.weight > 0)
                .map(|(id, profile)| (*id, profile.weight))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Weight of a validator, zero if absent.
    pub fn get(&self, id: ValidatorId) -> u128 {
        self.0
            .binary_search_by_key(&id, |(vid, _)| *vid)
            .map(|pos| self.0[pos].1)
            .unwrap_or(0)
    }

    /// Sum of all weights (saturating).
    pub fn total_weight(&self) -> u128 {
        self.0
            .iter()
            .fold(0u128, |acc, (_, w)| acc.saturating_add(*w))
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ValidatorId, u128)> {
        self.0.iter()
    }
}

/// Block-level state carried across blocks of an epoch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockState {
    pub last_block: BlockCtx,
    pub finalized_state_root: Hash,
    pub epoch_gas: u64,
    pub advance_epochs: u32,
    pub next_validator_profiles: BTreeMap<ValidatorId, ValidatorProfile>,
}

impl BlockState {
    pub fn hash(&self) -> Hash {
        let mut hasher = RecordHasher::new(b"qc:block-state");
        hasher
            .u64(self.last_block.idx.0)
            .u64(self.last_block.time.0)
            .fixed(&self.last_block.atropos)
            .fixed(&self.finalized_state_root)
            .u64(self.epoch_gas)
            .u32(self.advance_epochs);
        feed_profiles(&mut hasher, &self.next_validator_profiles);
        hasher.finish()
    }
}

/// Validator and rule snapshot of one epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochState {
    pub epoch: Epoch,
    pub epoch_start: Timestamp,
    pub prev_epoch_start: Timestamp,
    pub epoch_state_root: Hash,
    pub validators: ValidatorWeights,
    pub validator_profiles: BTreeMap<ValidatorId, ValidatorProfile>,
    pub rules: NetworkRules,
}

impl EpochState {
    pub fn hash(&self) -> Hash {
        let mut hasher = RecordHasher::new(b"qc:epoch-state");
        hasher
            .u32(self.epoch.0)
            .u64(self.epoch_start.0)
            .u64(self.prev_epoch_start.0)
            .fixed(&self.epoch_state_root)
            .u64(self.validators.len() as u64);
        for (id, weight) in self.validators.iter() {
            hasher.u32(id.0).u128(*weight);
        }
        feed_profiles(&mut hasher, &self.validator_profiles);
        self.rules.feed(&mut hasher);
        hasher.finish()
    }
}

fn feed_profiles(hasher: &mut RecordHasher, profiles: &BTreeMap<ValidatorId, ValidatorProfile>) {
    hasher.u64(profiles.len() as u64);
    for (id, profile) in profiles {
        hasher
            .u32(id.0)
            .u128(profile.weight)
            .u8(profile.pub_key.scheme.tag())
            .bytes(&profile.pub_key.raw);
    }
}

/// An indexed epoch record: block state plus epoch state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRecord {
    pub idx: Epoch,
    pub block_state: BlockState,
    pub epoch_state: EpochState,
}

impl EpochRecord {
    /// keccak(block_state.hash() || epoch_state.hash())
    pub fn hash(&self) -> Hash {
        let mut hasher = RecordHasher::new(b"");
        hasher
            .fixed(&self.block_state.hash())
            .fixed(&self.epoch_state.hash());
        hasher.finish()
    }
}

/// Execution status of a genesis transaction.
///
/// A failing genesis transaction aborts execution, so committed blocks only
/// carry successful receipts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReceiptStatus {
    Success,
}

/// Receipt of one transaction in a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: Hash,
    pub status: ReceiptStatus,
    pub gas_used: u64,
}

/// A committed block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub idx: BlockIdx,
    pub hash: Hash,
    pub parent_hash: Hash,
    pub state_root: Hash,
    pub time: Timestamp,
    /// Nanoseconds since the previous block.
    pub duration: u64,
    pub gas_used: u64,
    pub txs: Vec<Hash>,
    pub receipts: Vec<Receipt>,
}

impl BlockRecord {
    /// Hash of the block identity fields.
    pub fn compute_hash(
        idx: BlockIdx,
        parent_hash: &Hash,
        state_root: &Hash,
        time: Timestamp,
        txs: &[Hash],
    ) -> Hash {
        let mut hasher = RecordHasher::new(b"qc:block");
        hasher
            .u64(idx.0)
            .fixed(parent_hash)
            .fixed(state_root)
            .u64(time.0)
            .u64(txs.len() as u64);
        for tx in txs {
            hasher.fixed(tx);
        }
        hasher.finish()
    }
}
