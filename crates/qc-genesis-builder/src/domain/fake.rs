//! Fake Network Genesis
//!
//! Assembles the genesis of a test/dev network: N self-staked validators
//! with equal balances, the system contracts, and a seeded epoch baseline.

use std::collections::BTreeMap;

use qc_genesis_state::KeyValueStore;
use rand::{CryptoRng, RngCore};
use shared_crypto::{Secp256k1KeyPair, Secp256k1PublicKey};
use shared_types::{
    BlockCtx, BlockIdx, BlockState, Delegation, Epoch, EpochRecord, EpochState, Timestamp,
    Validator, ValidatorId, ValidatorPubKey, ValidatorStatus, ValidatorWeights, ZERO_ADDRESS,
    ZERO_HASH,
};

use super::builder::{ExecutedGenesis, GenesisBuilder};
use super::contracts::{ContractAddresses, SystemContracts};
use super::transactions::genesis_txs;
use crate::config::FakeGenesisParams;
use crate::error::Result;
use crate::ports::BlockProcessor;

/// Node identity and validator signing key of one fake validator.
pub struct FakeValidatorKeys {
    pub node: Secp256k1KeyPair,
    pub validator: Secp256k1KeyPair,
}

/// Generate node and validator keys for `count` validators.
pub fn generate_validator_keys<R: RngCore + CryptoRng>(
    count: usize,
    rng: &mut R,
) -> Result<Vec<FakeValidatorKeys>> {
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        keys.push(FakeValidatorKeys {
            node: Secp256k1KeyPair::generate(rng)?,
            validator: Secp256k1KeyPair::generate(rng)?,
        });
    }
    Ok(keys)
}

/// Active validator created at genesis time.
pub fn fake_validator(
    id: ValidatorId,
    public_key: &Secp256k1PublicKey,
    genesis_time: Timestamp,
) -> Validator {
    Validator {
        id,
        address: public_key.to_address(),
        pub_key: ValidatorPubKey::secp256k1(public_key.as_bytes().to_vec()),
        creation_time: genesis_time,
        creation_epoch: Epoch(0),
        deactivated_time: Timestamp(0),
        deactivated_epoch: Epoch(0),
        status: ValidatorStatus::OK,
    }
}

/// Validators with IDs `1..=N` in key order.
pub fn fake_validators(keys: &[FakeValidatorKeys], genesis_time: Timestamp) -> Vec<Validator> {
    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            fake_validator(
                ValidatorId(i as u32 + 1),
                &key.validator.public_key(),
                genesis_time,
            )
        })
        .collect()
}

/// Baseline record: epoch `epoch - 1`, last block `block - 1`.
pub fn seed_epoch_record(params: &FakeGenesisParams) -> EpochRecord {
    let epoch = Epoch(params.epoch.0.saturating_sub(1));
    EpochRecord {
        idx: epoch,
        block_state: BlockState {
            last_block: BlockCtx {
                idx: BlockIdx(params.block.0.saturating_sub(1)),
                time: params.genesis_time,
                atropos: ZERO_HASH,
            },
            finalized_state_root: ZERO_HASH,
            epoch_gas: 0,
            advance_epochs: 0,
            next_validator_profiles: BTreeMap::new(),
        },
        epoch_state: EpochState {
            epoch,
            epoch_start: params.genesis_time,
            prev_epoch_start: Timestamp(params.genesis_time.0.saturating_sub(1)),
            epoch_state_root: ZERO_HASH,
            validators: ValidatorWeights::default(),
            validator_profiles: BTreeMap::new(),
            rules: params.rules.clone(),
        },
    }
}

/// One unlocked self-delegation of `stake` per validator.
pub fn fake_delegations(validators: &[Validator], stake: u128) -> Vec<Delegation> {
    validators
        .iter()
        .map(|v| Delegation::unlocked(v.address, v.id, stake))
        .collect()
}

/// Build and execute a fake-network genesis.
///
/// Every validator is credited `params.balance` and self-delegates
/// `params.stake`; the first validator owns the network.
pub fn build_fake_genesis<S, P>(
    store: S,
    validators: &[Validator],
    params: &FakeGenesisParams,
    contracts: &SystemContracts,
    processor: &P,
) -> Result<ExecutedGenesis<S>>
where
    S: KeyValueStore,
    P: BlockProcessor<S> + ?Sized,
{
    params.validate()?;

    let mut builder = GenesisBuilder::new(store);
    for validator in validators {
        builder.add_balance(validator.address, params.balance)?;
    }
    let delegations = fake_delegations(validators, params.stake);

    contracts.install(&mut builder)?;
    builder.set_current_epoch(seed_epoch_record(params))?;

    let owner = validators
        .first()
        .map(|v| v.address)
        .unwrap_or(ZERO_ADDRESS);
    let txs = genesis_txs(
        Epoch(params.epoch.0 - 2),
        validators,
        builder.total_supply(),
        &delegations,
        owner,
        ContractAddresses::standard(),
    );

    tracing::info!(
        "[qc-genesis] Building {} genesis: {} validators, total supply {}",
        params.rules.name,
        validators.len(),
        builder.total_supply()
    );

    builder.execute_genesis_txs(processor, &txs)
}
