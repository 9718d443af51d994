//! Genesis Transactions
//!
//! Synthetic transactions submitted to the block processor during genesis
//! execution: network initialization, validator registration and
//! delegations.

use shared_crypto::Keccak256Hasher;
use shared_types::{Address, Delegation, Epoch, Hash, Validator};

use super::contracts::ContractAddresses;

/// One synthetic genesis transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisTx {
    /// Activate the network initializer, wiring the system contracts.
    InitializeNetwork {
        /// Last epoch considered sealed before genesis.
        sealed_epoch: Epoch,
        total_supply: u128,
        contracts: ContractAddresses,
        owner: Address,
    },
    /// Register one genesis validator.
    SetGenesisValidator(Validator),
    /// Record one genesis delegation.
    SetGenesisDelegation(Delegation),
}

impl GenesisTx {
    pub fn kind(&self) -> &'static str {
        match self {
            GenesisTx::InitializeNetwork { .. } => "initialize-network",
            GenesisTx::SetGenesisValidator(_) => "set-genesis-validator",
            GenesisTx::SetGenesisDelegation(_) => "set-genesis-delegation",
        }
    }

    /// Transaction hash, fed field by field.
    pub fn hash(&self) -> Hash {
        let mut hasher = Keccak256Hasher::new();
        hasher.update(b"qc:genesis-tx");
        match self {
            GenesisTx::InitializeNetwork {
                sealed_epoch,
                total_supply,
                contracts,
                owner,
            } => {
                hasher
                    .update(&[0u8])
                    .update(&sealed_epoch.0.to_be_bytes())
                    .update(&total_supply.to_be_bytes());
                for address in contracts.all() {
                    hasher.update(&address);
                }
                hasher.update(owner);
            }
            GenesisTx::SetGenesisValidator(validator) => {
                let pub_key = validator.pub_key.bytes();
                hasher
                    .update(&[1u8])
                    .update(&validator.id.0.to_be_bytes())
                    .update(&validator.address)
                    .update(&(pub_key.len() as u32).to_be_bytes())
                    .update(&pub_key)
                    .update(&validator.creation_time.0.to_be_bytes())
                    .update(&validator.creation_epoch.0.to_be_bytes())
                    .update(&validator.deactivated_time.0.to_be_bytes())
                    .update(&validator.deactivated_epoch.0.to_be_bytes())
                    .update(&validator.status.0.to_be_bytes());
            }
            GenesisTx::SetGenesisDelegation(delegation) => {
                hasher
                    .update(&[2u8])
                    .update(&delegation.address)
                    .update(&delegation.validator_id.0.to_be_bytes())
                    .update(&delegation.stake.to_be_bytes())
                    .update(&delegation.locked_stake.to_be_bytes())
                    .update(&delegation.lockup_from_epoch.0.to_be_bytes())
                    .update(&delegation.lockup_end_time.0.to_be_bytes())
                    .update(&delegation.lockup_duration.to_be_bytes())
                    .update(&delegation.early_unlock_penalty.to_be_bytes())
                    .update(&delegation.rewards.to_be_bytes());
            }
        }
        hasher.finalize()
    }
}

/// Assemble the genesis transaction list.
///
/// Order is fixed: initializer, then validators, then delegations.
pub fn genesis_txs(
    sealed_epoch: Epoch,
    validators: &[Validator],
    total_supply: u128,
    delegations: &[Delegation],
    owner: Address,
    contracts: ContractAddresses,
) -> Vec<GenesisTx> {
    let mut txs = Vec::with_capacity(1 + validators.len() + delegations.len());
    txs.push(GenesisTx::InitializeNetwork {
        sealed_epoch,
        total_supply,
        contracts,
        owner,
    });
    txs.extend(validators.iter().cloned().map(GenesisTx::SetGenesisValidator));
    txs.extend(
        delegations
            .iter()
            .cloned()
            .map(GenesisTx::SetGenesisDelegation),
    );
    txs
}
