//! # Genesis Artifact Identity
//!
//! The `GenesisHeader` binds every section of an exported artifact to one
//! snapshot identity. It is computed once, after execution, and repeated in
//! the preamble of each section.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::{to_hex, Hash};
use crate::errors::TypeError;

/// Upper bound on the encoded network name length.
pub const MAX_NETWORK_NAME_LEN: usize = 1024;

/// Header shared by all sections of one genesis export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisHeader {
    /// Content hash of the fully executed genesis state.
    pub genesis_id: Hash,
    /// Network identifier.
    pub network_id: u64,
    /// Network name.
    pub network_name: String,
}

impl GenesisHeader {
    /// Canonical encoding:
    /// `genesis_id (32) || network_id (u64 LE) || name_len (u32 LE) || name`.
    ///
    /// Fails when the name exceeds `MAX_NETWORK_NAME_LEN` bytes.
    pub fn encode(&self) -> Result<Vec<u8>, TypeError> {
        let name = self.network_name.as_bytes();
        let name_len = u32::try_from(name.len())
            .ok()
            .filter(|len| *len as usize <= MAX_NETWORK_NAME_LEN)
            .ok_or(TypeError::NetworkNameTooLong {
                len: name.len(),
                max: MAX_NETWORK_NAME_LEN,
            })?;
        let mut out = Vec::with_capacity(32 + 8 + 4 + name.len());
        out.extend_from_slice(&self.genesis_id);
        out.extend_from_slice(&self.network_id.to_le_bytes());
        out.extend_from_slice(&name_len.to_le_bytes());
        out.extend_from_slice(name);
        Ok(out)
    }
}

impl fmt::Display for GenesisHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (network {} \"{}\")",
            to_hex(&self.genesis_id),
            self.network_id,
            self.network_name
        )
    }
}

/// Kind of a section in the genesis artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    Blocks,
    Epochs,
    State,
}

impl SectionKind {
    /// Export order of section kinds.
    pub const ALL: [SectionKind; 3] = [SectionKind::Blocks, SectionKind::Epochs, SectionKind::State];

    pub fn as_u8(&self) -> u8 {
        match self {
            SectionKind::Blocks => 1,
            SectionKind::Epochs => 2,
            SectionKind::State => 3,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, TypeError> {
        match value {
            1 => Ok(SectionKind::Blocks),
            2 => Ok(SectionKind::Epochs),
            3 => Ok(SectionKind::State),
            other => Err(TypeError::UnknownSectionKind(other)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SectionKind::Blocks => "blocks",
            SectionKind::Epochs => "epochs",
            SectionKind::State => "state",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind and index of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionDescriptor {
    pub kind: SectionKind,
    pub index: u32,
}

impl SectionDescriptor {
    pub fn blocks(index: u32) -> Self {
        Self {
            kind: SectionKind::Blocks,
            index,
        }
    }

    pub fn epochs(index: u32) -> Self {
        Self {
            kind: SectionKind::Epochs,
            index,
        }
    }

    pub fn state(index: u32) -> Self {
        Self {
            kind: SectionKind::State,
            index,
        }
    }
}

impl fmt::Display for SectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.kind, self.index)
    }
}
