//! # Container Format
//!
//! One artifact holds the header and every section, in export order.
//!
//! ```text
//! [magic "QCGS"][version u32 LE][GenesisHeader::encode()]
//! section*:
//!   [kind u8][index u32 LE][genesis_id 32][payload_len u64 LE][payload][content_hash 32]
//! payload:
//!   frame*: [len u32 LE][bytes]
//! ```
//!
//! `content_hash = keccak256(header.encode() ‖ kind ‖ index LE ‖ payload)`.
//! The repeated `genesis_id` lets a reader reject a section spliced in from
//! another artifact before hashing it.

use std::io::{Read, Write};

use shared_crypto::Keccak256Hasher;
use shared_types::{GenesisHeader, Hash, SectionDescriptor, MAX_NETWORK_NAME_LEN};

use crate::error::{ExportStage, GenesisStoreError, Result};

/// Artifact magic bytes.
pub const MAGIC: [u8; 4] = *b"QCGS";

/// Container format version.
pub const FORMAT_VERSION: u32 = 1;

/// Hasher seeded with the section preamble.
pub fn section_hasher(
    header: &GenesisHeader,
    descriptor: SectionDescriptor,
) -> Result<Keccak256Hasher> {
    let mut hasher = Keccak256Hasher::new();
    hasher
        .update(&header.encode()?)
        .update(&[descriptor.kind.as_u8()])
        .update(&descriptor.index.to_le_bytes());
    Ok(hasher)
}

/// Write magic, version and header.
pub fn write_container_header<W: Write>(out: &mut W, header: &GenesisHeader) -> Result<()> {
    let io = GenesisStoreError::io(ExportStage::Output);
    let encoded = header.encode()?;
    let mut bytes = Vec::with_capacity(8 + encoded.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    bytes.extend_from_slice(&encoded);
    out.write_all(&bytes).map_err(io)
}

/// Read and validate magic, version and header.
pub fn read_container_header<R: Read>(input: &mut R) -> Result<GenesisHeader> {
    let mut magic = [0u8; 4];
    input
        .read_exact(&mut magic)
        .map_err(GenesisStoreError::read("magic"))?;
    if magic != MAGIC {
        return Err(GenesisStoreError::Corrupted(format!(
            "bad magic {}",
            hex::encode(magic)
        )));
    }
    let version = read_u32(input, "version")?;
    if version != FORMAT_VERSION {
        return Err(GenesisStoreError::Corrupted(format!(
            "unsupported format version {}",
            version
        )));
    }

    let genesis_id = read_hash(input, "genesis id")?;
    let network_id = read_u64(input, "network id")?;
    let name_len = read_u32(input, "network name length")? as usize;
    if name_len > MAX_NETWORK_NAME_LEN {
        return Err(GenesisStoreError::Corrupted(format!(
            "network name length {} exceeds {}",
            name_len, MAX_NETWORK_NAME_LEN
        )));
    }
    let mut name = vec![0u8; name_len];
    input
        .read_exact(&mut name)
        .map_err(GenesisStoreError::read("network name"))?;
    let network_name = String::from_utf8(name)
        .map_err(|_| GenesisStoreError::Corrupted("network name is not UTF-8".to_string()))?;

    Ok(GenesisHeader {
        genesis_id,
        network_id,
        network_name,
    })
}

/// Section prefix preceding the payload.
pub fn encode_section_prefix(
    genesis_id: &Hash,
    descriptor: SectionDescriptor,
    payload_len: u64,
) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(1 + 4 + 32 + 8);
    prefix.push(descriptor.kind.as_u8());
    prefix.extend_from_slice(&descriptor.index.to_le_bytes());
    prefix.extend_from_slice(genesis_id);
    prefix.extend_from_slice(&payload_len.to_le_bytes());
    prefix
}

/// Encode one payload frame header.
pub fn frame_len(len: usize) -> Option<[u8; 4]> {
    u32::try_from(len).ok().map(u32::to_le_bytes)
}

/// Split a payload into its frames.
pub fn split_frames(section: SectionDescriptor, payload: &[u8]) -> Result<Vec<&[u8]>> {
    let mut frames = Vec::new();
    let mut cursor = 0usize;
    while cursor < payload.len() {
        let Some(len_bytes) = payload.get(cursor..cursor + 4) else {
            return Err(GenesisStoreError::Corrupted(format!(
                "{}: truncated frame header at offset {}",
                section, cursor
            )));
        };
        let mut len = [0u8; 4];
        len.copy_from_slice(len_bytes);
        let len = u32::from_le_bytes(len) as usize;
        cursor += 4;
        let Some(frame) = payload.get(cursor..cursor + len) else {
            return Err(GenesisStoreError::Corrupted(format!(
                "{}: frame of {} bytes overruns payload at offset {}",
                section, len, cursor
            )));
        };
        frames.push(frame);
        cursor += len;
    }
    Ok(frames)
}

pub(crate) fn read_u32<R: Read>(input: &mut R, context: &'static str) -> Result<u32> {
    let mut bytes = [0u8; 4];
    input
        .read_exact(&mut bytes)
        .map_err(GenesisStoreError::read(context))?;
    Ok(u32::from_le_bytes(bytes))
}

pub(crate) fn read_u64<R: Read>(input: &mut R, context: &'static str) -> Result<u64> {
    let mut bytes = [0u8; 8];
    input
        .read_exact(&mut bytes)
        .map_err(GenesisStoreError::read(context))?;
    Ok(u64::from_le_bytes(bytes))
}

pub(crate) fn read_hash<R: Read>(input: &mut R, context: &'static str) -> Result<Hash> {
    let mut bytes = [0u8; 32];
    input
        .read_exact(&mut bytes)
        .map_err(GenesisStoreError::read(context))?;
    Ok(bytes)
}
