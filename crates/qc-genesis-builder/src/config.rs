//! Configuration for fake-network genesis construction

use shared_types::{
    to_native, BlockIdx, Epoch, NetworkRules, Timestamp, FAKE_GENESIS_TIME, NATIVE_DECIMALS,
};

use crate::error::{GenesisError, Result};

/// Default per-validator balance in whole tokens.
pub const DEFAULT_BALANCE_UNITS: u64 = 1_000_000_000;

/// Default per-validator stake in whole tokens.
pub const DEFAULT_STAKE_UNITS: u64 = 5_000_000;

/// Default first epoch of the network.
pub const DEFAULT_EPOCH: u32 = 2;

/// Default first block of the network.
pub const DEFAULT_BLOCK: u64 = 1;

/// Parameters of a fake (test/dev) network genesis
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FakeGenesisParams {
    /// Balance credited to every validator, in base units
    pub balance: u128,

    /// Stake delegated by every validator to itself, in base units
    pub stake: u128,

    /// Requested first epoch; the seeded record sits at `epoch - 1`
    pub epoch: Epoch,

    /// Requested first block; the seeded last block is `block - 1`
    pub block: BlockIdx,

    /// Network rules of the seeded epoch
    pub rules: NetworkRules,

    /// Creation time of validators and the seeded epoch
    pub genesis_time: Timestamp,
}

impl Default for FakeGenesisParams {
    fn default() -> Self {
        Self {
            balance: scale(DEFAULT_BALANCE_UNITS),
            stake: scale(DEFAULT_STAKE_UNITS),
            epoch: Epoch(DEFAULT_EPOCH),
            block: BlockIdx(DEFAULT_BLOCK),
            rules: NetworkRules::testnet(),
            genesis_time: FAKE_GENESIS_TIME,
        }
    }
}

impl FakeGenesisParams {
    /// Parameters from whole-token amounts.
    pub fn from_units(balance_units: u64, stake_units: u64) -> Result<Self> {
        let balance = to_native(balance_units).ok_or_else(|| {
            GenesisError::InvalidParams(format!("balance {} overflows", balance_units))
        })?;
        let stake = to_native(stake_units).ok_or_else(|| {
            GenesisError::InvalidParams(format!("stake {} overflows", stake_units))
        })?;
        Ok(Self {
            balance,
            stake,
            ..Self::default()
        })
    }

    pub fn with_epoch(mut self, epoch: u32, block: u64) -> Self {
        self.epoch = Epoch(epoch);
        self.block = BlockIdx(block);
        self
    }

    pub fn with_rules(mut self, rules: NetworkRules) -> Self {
        self.rules = rules;
        self
    }

    /// Check the parameters describe a constructible genesis.
    pub fn validate(&self) -> Result<()> {
        // The initializer seals `epoch - 2`, so two epochs must precede it.
        if self.epoch.0 < 2 {
            return Err(GenesisError::InvalidParams(format!(
                "epoch must be at least 2, got {}",
                self.epoch
            )));
        }
        if self.block.0 < 1 {
            return Err(GenesisError::InvalidParams(format!(
                "block must be at least 1, got {}",
                self.block
            )));
        }
        if self.stake == 0 {
            return Err(GenesisError::InvalidParams("stake must be positive".to_string()));
        }
        if self.genesis_time.0 == 0 {
            return Err(GenesisError::InvalidParams(
                "genesis time must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Whole tokens to base units. Any u64 fits once scaled by 10^18.
fn scale(units: u64) -> u128 {
    units as u128 * 10u128.pow(NATIVE_DECIMALS)
}
