//! # Network Rules
//!
//! The rule set active in an epoch. Rules are part of every `EpochState`
//! and therefore part of the genesis identity.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::TypeError;
use crate::hashing::RecordHasher;

/// Epoch sealing limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpochRules {
    /// Gas that may be spent in one epoch before it is sealed.
    pub max_epoch_gas: u64,
    /// Maximum epoch duration in nanoseconds.
    pub max_epoch_duration: u64,
}

/// Per-block limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRules {
    /// Block gas limit.
    pub max_block_gas: u64,
    /// Minimum gas price in base units.
    pub min_gas_price: u128,
}

/// Complete rule set of a network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkRules {
    /// Network (chain) identifier.
    pub network_id: u64,
    /// Human-readable network name.
    pub name: String,
    /// Epoch limits.
    pub epochs: EpochRules,
    /// Block limits.
    pub blocks: BlockRules,
}

impl NetworkRules {
    /// Public test network.
    pub fn testnet() -> Self {
        Self {
            network_id: 4003,
            name: "quantum-testnet".to_string(),
            epochs: EpochRules {
                max_epoch_gas: 1_500_000_000,
                max_epoch_duration: 4 * 3600 * 1_000_000_000,
            },
            blocks: BlockRules {
                max_block_gas: 20_500_000,
                min_gas_price: 1_000_000_000,
            },
        }
    }

    /// Local development network with short epochs.
    pub fn devnet() -> Self {
        Self {
            network_id: 4004,
            name: "quantum-devnet".to_string(),
            epochs: EpochRules {
                max_epoch_gas: 300_000_000,
                max_epoch_duration: 600 * 1_000_000_000,
            },
            blocks: BlockRules {
                max_block_gas: 20_500_000,
                min_gas_price: 0,
            },
        }
    }

    pub(crate) fn feed(&self, hasher: &mut RecordHasher) {
        hasher
            .u64(self.network_id)
            .bytes(self.name.as_bytes())
            .u64(self.epochs.max_epoch_gas)
            .u64(self.epochs.max_epoch_duration)
            .u64(self.blocks.max_block_gas)
            .u128(self.blocks.min_gas_price);
    }
}

/// Named rule presets selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkPreset {
    Testnet,
    Devnet,
}

impl NetworkPreset {
    /// Rules of this preset.
    pub fn rules(&self) -> NetworkRules {
        match self {
            NetworkPreset::Testnet => NetworkRules::testnet(),
            NetworkPreset::Devnet => NetworkRules::devnet(),
        }
    }
}

impl FromStr for NetworkPreset {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "testnet" => Ok(NetworkPreset::Testnet),
            "devnet" => Ok(NetworkPreset::Devnet),
            other => Err(TypeError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for NetworkPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkPreset::Testnet => write!(f, "testnet"),
            NetworkPreset::Devnet => write!(f, "devnet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_have_distinct_ids() {
        assert_ne!(
            NetworkRules::testnet().network_id,
            NetworkRules::devnet().network_id
        );
    }

    #[test]
    fn test_preset_parsing() {
        assert_eq!(
            "testnet".parse::<NetworkPreset>().unwrap(),
            NetworkPreset::Testnet
        );
        assert_eq!(
            "DevNet".parse::<NetworkPreset>().unwrap(),
            NetworkPreset::Devnet
        );
        assert!(matches!(
            "mainnet".parse::<NetworkPreset>(),
            Err(TypeError::UnknownNetwork(_))
        ));
    }

    #[test]
    fn test_preset_display_roundtrip() {
        for preset in [NetworkPreset::Testnet, NetworkPreset::Devnet] {
            assert_eq!(preset.to_string().parse::<NetworkPreset>().unwrap(), preset);
        }
    }
}
