//! System Contracts
//!
//! Pre-deployed contracts every genesis installs at fixed addresses before
//! execution. Bytecode semantics are opaque here: the builder only needs the
//! code to be present so the network initializer can run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use qc_genesis_state::KeyValueStore;
use shared_types::Address;

use crate::domain::builder::GenesisBuilder;
use crate::error::{GenesisError, Result};

/// Base of the system contract address range (`0x…1000`).
const SYSTEM_ADDRESS_BASE: u16 = 0x1000;

/// Opcode prefix of placeholder bytecode (INVALID).
const PLACEHOLDER_OPCODE: u8 = 0xfe;

/// The pre-deployed system contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SystemContract {
    NetworkInitializer,
    NodeDriver,
    NodeDriverAuth,
    Staking,
    /// Precompile; only needs non-empty code.
    EvmWriter,
}

impl SystemContract {
    /// Installation order.
    pub const ALL: [SystemContract; 5] = [
        SystemContract::NetworkInitializer,
        SystemContract::NodeDriver,
        SystemContract::NodeDriverAuth,
        SystemContract::Staking,
        SystemContract::EvmWriter,
    ];

    /// File stem used when loading bytecode (`<name>.bin`).
    pub fn name(&self) -> &'static str {
        match self {
            SystemContract::NetworkInitializer => "netinit",
            SystemContract::NodeDriver => "driver",
            SystemContract::NodeDriverAuth => "driverauth",
            SystemContract::Staking => "sfc",
            SystemContract::EvmWriter => "evmwriter",
        }
    }

    /// Fixed deployment address.
    pub fn address(&self) -> Address {
        let offset = match self {
            SystemContract::NetworkInitializer => 0,
            SystemContract::NodeDriver => 1,
            SystemContract::NodeDriverAuth => 2,
            SystemContract::Staking => 3,
            SystemContract::EvmWriter => 4,
        };
        let mut address = [0u8; 20];
        address[18..].copy_from_slice(&(SYSTEM_ADDRESS_BASE + offset).to_be_bytes());
        address
    }

    fn placeholder_code(&self) -> Vec<u8> {
        match self {
            SystemContract::EvmWriter => vec![0],
            other => {
                let mut code = vec![PLACEHOLDER_OPCODE];
                code.extend_from_slice(other.name().as_bytes());
                code
            }
        }
    }
}

/// Addresses the network initializer wires together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContractAddresses {
    pub network_initializer: Address,
    pub node_driver: Address,
    pub node_driver_auth: Address,
    pub staking: Address,
    pub evm_writer: Address,
}

impl ContractAddresses {
    /// The fixed system addresses.
    pub fn standard() -> Self {
        Self {
            network_initializer: SystemContract::NetworkInitializer.address(),
            node_driver: SystemContract::NodeDriver.address(),
            node_driver_auth: SystemContract::NodeDriverAuth.address(),
            staking: SystemContract::Staking.address(),
            evm_writer: SystemContract::EvmWriter.address(),
        }
    }

    /// All addresses in installation order.
    pub fn all(&self) -> [Address; 5] {
        [
            self.network_initializer,
            self.node_driver,
            self.node_driver_auth,
            self.staking,
            self.evm_writer,
        ]
    }
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self::standard()
    }
}

/// Bytecode for every system contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemContracts {
    code: BTreeMap<SystemContract, Vec<u8>>,
}

impl SystemContracts {
    /// Placeholder bytecode for every contract.
    pub fn placeholder() -> Self {
        Self {
            code: SystemContract::ALL
                .iter()
                .map(|contract| (*contract, contract.placeholder_code()))
                .collect(),
        }
    }

    /// Load hex bytecode from `<dir>/<name>.bin`.
    ///
    /// The EVM writer precompile is never loaded; it always gets `[0]`.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let mut contracts = Self::placeholder();
        for contract in SystemContract::ALL {
            if contract == SystemContract::EvmWriter {
                continue;
            }
            let path = dir.join(format!("{}.bin", contract.name()));
            let text = fs::read_to_string(&path).map_err(|e| GenesisError::ContractLoad {
                name: contract.name(),
                reason: format!("{}: {}", path.display(), e),
            })?;
            let trimmed = text.trim();
            let hex_body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
            let code = hex::decode(hex_body).map_err(|e| GenesisError::ContractLoad {
                name: contract.name(),
                reason: format!("invalid hex: {}", e),
            })?;
            if code.is_empty() {
                return Err(GenesisError::ContractLoad {
                    name: contract.name(),
                    reason: "empty bytecode".to_string(),
                });
            }
            tracing::debug!(
                "[qc-genesis] Loaded {} bytecode ({} bytes)",
                contract.name(),
                code.len()
            );
            contracts.code.insert(contract, code);
        }
        Ok(contracts)
    }

    pub fn code(&self, contract: SystemContract) -> &[u8] {
        self.code.get(&contract).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Pre-deploy every contract into the builder's state.
    pub fn install<S: KeyValueStore>(&self, builder: &mut GenesisBuilder<S>) -> Result<()> {
        for contract in SystemContract::ALL {
            builder.set_code(contract.address(), self.code(contract))?;
        }
        Ok(())
    }
}

impl Default for SystemContracts {
    fn default() -> Self {
        Self::placeholder()
    }
}
