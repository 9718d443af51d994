//! # Core Genesis Entities
//!
//! Identity and staking types that flow from the genesis tool into the
//! builder, the execution pipeline and the exported artifact.
//!
//! ## Type Decisions
//!
//! - Balances and stakes are `u128` base units. 10^18 base units make one
//!   native token, so `u128` still covers 3.4 * 10^20 whole tokens.
//! - Timestamps are nanoseconds since the Unix epoch.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The all-zero hash.
pub const ZERO_HASH: Hash = [0u8; 32];

/// The all-zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Number of decimals of the native token.
pub const NATIVE_DECIMALS: u32 = 18;

/// Fixed genesis time used by fake networks (2020-12-22T01:20:00Z).
pub const FAKE_GENESIS_TIME: Timestamp = Timestamp(1_608_600_000 * 1_000_000_000);

/// Scale a whole-token amount to base units.
///
/// Returns `None` on overflow.
pub fn to_native(units: u64) -> Option<u128> {
    (units as u128).checked_mul(10u128.pow(NATIVE_DECIMALS))
}

/// Render bytes as a `0x`-prefixed hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Sequential validator identifier. IDs start at 1 and are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct ValidatorId(pub u32);

/// Epoch index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Epoch(pub u32);

/// Block index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BlockIdx(pub u64);

/// Nanoseconds since the Unix epoch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Timestamp(pub u64);

impl fmt::Display for ValidatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BlockIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Timestamp {
    /// Timestamp advanced by `nanos`, saturating at `u64::MAX`.
    pub fn add_nanos(self, nanos: u64) -> Self {
        Timestamp(self.0.saturating_add(nanos))
    }
}

// =============================================================================
// VALIDATOR IDENTITY
// =============================================================================

/// Signature scheme of a validator public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PubKeyScheme {
    /// Uncompressed secp256k1 public key.
    Secp256k1,
}

impl PubKeyScheme {
    /// One-byte wire tag of the scheme.
    pub fn tag(&self) -> u8 {
        match self {
            PubKeyScheme::Secp256k1 => 0xc0,
        }
    }
}

/// A validator public key: raw bytes plus scheme tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValidatorPubKey {
    /// Raw key bytes (65 bytes for uncompressed secp256k1).
    pub raw: Vec<u8>,
    /// Signature scheme.
    pub scheme: PubKeyScheme,
}

impl ValidatorPubKey {
    /// Create a secp256k1 validator key from raw uncompressed bytes.
    pub fn secp256k1(raw: Vec<u8>) -> Self {
        Self {
            raw,
            scheme: PubKeyScheme::Secp256k1,
        }
    }

    /// Tagged encoding: `tag || raw`.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.raw.len() + 1);
        out.push(self.scheme.tag());
        out.extend_from_slice(&self.raw);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl fmt::Display for ValidatorPubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", to_hex(&self.bytes()))
    }
}

/// Validator status bit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ValidatorStatus(pub u64);

impl ValidatorStatus {
    pub const OK: ValidatorStatus = ValidatorStatus(0);
    pub const WITHDRAWN: ValidatorStatus = ValidatorStatus(1);
    pub const OFFLINE: ValidatorStatus = ValidatorStatus(1 << 3);
    pub const DOUBLESIGN: ValidatorStatus = ValidatorStatus(1 << 7);

    /// True when no deactivation flag is set.
    pub fn is_active(&self) -> bool {
        self.0 == 0
    }
}

/// A staking identity registered at genesis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validator {
    /// Sequential ID, assigned 1..N in creation order.
    pub id: ValidatorId,
    /// Address derived from the validator public key.
    pub address: Address,
    /// Consensus public key.
    pub pub_key: ValidatorPubKey,
    /// Creation time.
    pub creation_time: Timestamp,
    /// Creation epoch.
    pub creation_epoch: Epoch,
    /// Deactivation time (zero while active).
    pub deactivated_time: Timestamp,
    /// Deactivation epoch (zero while active).
    pub deactivated_epoch: Epoch,
    /// Status flags.
    pub status: ValidatorStatus,
}

/// An assignment of stake from an address to a validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    /// Delegator address.
    pub address: Address,
    /// Target validator. Must exist in the same genesis run.
    pub validator_id: ValidatorId,
    /// Delegated stake in base units.
    pub stake: u128,
    /// Portion of `stake` that is locked up.
    pub locked_stake: u128,
    /// Epoch the lockup started.
    pub lockup_from_epoch: Epoch,
    /// Time the lockup ends.
    pub lockup_end_time: Timestamp,
    /// Lockup duration in nanoseconds.
    pub lockup_duration: u64,
    /// Penalty accrued by early unlocks.
    pub early_unlock_penalty: u128,
    /// Unclaimed rewards.
    pub rewards: u128,
}

impl Delegation {
    /// Unlocked delegation of `stake` to `validator_id`.
    pub fn unlocked(address: Address, validator_id: ValidatorId, stake: u128) -> Self {
        Self {
            address,
            validator_id,
            stake,
            locked_stake: 0,
            lockup_from_epoch: Epoch(0),
            lockup_end_time: Timestamp(0),
            lockup_duration: 0,
            early_unlock_penalty: 0,
            rewards: 0,
        }
    }
}
