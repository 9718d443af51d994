//! # Genesis Reader
//!
//! Opens an exported artifact, re-hashes every section while indexing it and
//! decodes the typed records back out.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use qc_genesis_state::InMemoryKvStore;
use serde::de::DeserializeOwned;
use shared_types::{
    BlockRecord, EpochRecord, GenesisHeader, Hash, SectionDescriptor, SectionKind,
};
use tracing::debug;

use crate::domain::container::{
    read_container_header, read_hash, read_u32, read_u64, section_hasher, split_frames,
};
use crate::error::{ExportStage, GenesisStoreError, Result};

const COPY_CHUNK: usize = 64 * 1024;

/// Location and hash of one verified section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionEntry {
    pub descriptor: SectionDescriptor,
    pub hash: Hash,
    /// Byte offset of the payload within the file.
    pub payload_offset: u64,
    pub payload_len: u64,
}

pub struct GenesisReader {
    path: PathBuf,
    header: GenesisHeader,
    sections: Vec<SectionEntry>,
}

impl GenesisReader {
    /// Parse the container and verify every section hash.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(GenesisStoreError::io(ExportStage::Read))?;
        let mut input = BufReader::new(file);

        let header = read_container_header(&mut input)?;
        let mut offset = (4 + 4 + header.encode()?.len()) as u64;
        let mut sections = Vec::new();

        while let Some(kind) = read_section_kind(&mut input)? {
            let index = read_u32(&mut input, "section index")?;
            let descriptor = SectionDescriptor { kind, index };
            let genesis_id = read_hash(&mut input, "section genesis id")?;
            if genesis_id != header.genesis_id {
                return Err(GenesisStoreError::HeaderMismatch {
                    section: descriptor,
                    expected: hex::encode(header.genesis_id),
                    found: hex::encode(genesis_id),
                });
            }
            let payload_len = read_u64(&mut input, "payload length")?;
            let payload_offset = offset + 1 + 4 + 32 + 8;

            let mut hasher = section_hasher(&header, descriptor)?;
            let mut remaining = payload_len;
            let mut chunk = vec![0u8; COPY_CHUNK];
            while remaining > 0 {
                let want = remaining.min(COPY_CHUNK as u64) as usize;
                input
                    .read_exact(&mut chunk[..want])
                    .map_err(GenesisStoreError::read("section payload"))?;
                hasher.update(&chunk[..want]);
                remaining -= want as u64;
            }
            let computed = hasher.finalize();
            let stored = read_hash(&mut input, "section hash")?;
            if stored != computed {
                return Err(GenesisStoreError::HashMismatch {
                    section: descriptor,
                    stored: hex::encode(stored),
                    computed: hex::encode(computed),
                });
            }

            debug!(
                "[qc-genesis-store] Verified {} ({} bytes)",
                descriptor, payload_len
            );
            sections.push(SectionEntry {
                descriptor,
                hash: stored,
                payload_offset,
                payload_len,
            });
            offset = payload_offset + payload_len + 32;
        }

        Ok(Self {
            path: path.to_path_buf(),
            header,
            sections,
        })
    }

    pub fn header(&self) -> &GenesisHeader {
        &self.header
    }

    pub fn sections(&self) -> &[SectionEntry] {
        &self.sections
    }

    pub fn section(&self, descriptor: SectionDescriptor) -> Option<&SectionEntry> {
        self.sections.iter().find(|s| s.descriptor == descriptor)
    }

    /// Re-hash the file and check the Blocks, Epochs, State layout.
    ///
    /// Returns each section's content hash in container order.
    pub fn verify(&self) -> Result<Vec<(SectionDescriptor, Hash)>> {
        let fresh = Self::open(&self.path)?;
        if fresh.header != self.header || fresh.sections != self.sections {
            return Err(GenesisStoreError::Corrupted(
                "artifact changed since it was opened".to_string(),
            ));
        }

        let layout: Vec<SectionDescriptor> =
            self.sections.iter().map(|s| s.descriptor).collect();
        let expected = [
            SectionDescriptor::blocks(0),
            SectionDescriptor::epochs(0),
            SectionDescriptor::state(0),
        ];
        if layout != expected {
            let found: Vec<String> = layout.iter().map(|d| d.to_string()).collect();
            return Err(GenesisStoreError::Corrupted(format!(
                "unexpected section layout [{}]",
                found.join(", ")
            )));
        }

        Ok(self
            .sections
            .iter()
            .map(|s| (s.descriptor, s.hash))
            .collect())
    }

    /// Raw frames of one section.
    pub fn frames(&self, descriptor: SectionDescriptor) -> Result<Vec<Vec<u8>>> {
        let entry = self.section(descriptor).ok_or_else(|| {
            GenesisStoreError::Corrupted(format!("section {} not present", descriptor))
        })?;
        let payload_len = usize::try_from(entry.payload_len).map_err(|_| {
            GenesisStoreError::Corrupted(format!(
                "{} payload of {} bytes does not fit in memory",
                descriptor, entry.payload_len
            ))
        })?;

        let mut file = File::open(&self.path).map_err(GenesisStoreError::io(ExportStage::Read))?;
        file.seek(SeekFrom::Start(entry.payload_offset))
            .map_err(GenesisStoreError::io(ExportStage::Read))?;
        let mut payload = vec![0u8; payload_len];
        file.read_exact(&mut payload)
            .map_err(GenesisStoreError::read("section payload"))?;

        Ok(split_frames(descriptor, &payload)?
            .into_iter()
            .map(<[u8]>::to_vec)
            .collect())
    }

    /// Blocks, oldest first.
    pub fn blocks(&self) -> Result<Vec<BlockRecord>> {
        self.decode_section(SectionDescriptor::blocks(0))
    }

    /// Epoch records, oldest first.
    pub fn epochs(&self) -> Result<Vec<EpochRecord>> {
        self.decode_section(SectionDescriptor::epochs(0))
    }

    /// State pairs in key order.
    pub fn state_pairs(&self) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let descriptor = SectionDescriptor::state(0);
        let frames = self.frames(descriptor)?;
        if frames.len() % 2 != 0 {
            return Err(GenesisStoreError::Corrupted(format!(
                "{} holds {} frames, expected key/value pairs",
                descriptor,
                frames.len()
            )));
        }
        let mut pairs = Vec::with_capacity(frames.len() / 2);
        let mut frames = frames.into_iter();
        while let (Some(key), Some(value)) = (frames.next(), frames.next()) {
            pairs.push((key, value));
        }
        Ok(pairs)
    }

    /// Rebuild the exported state into a fresh store.
    pub fn restore_state(&self) -> Result<InMemoryKvStore> {
        Ok(InMemoryKvStore::from_pairs(self.state_pairs()?))
    }

    fn decode_section<T: DeserializeOwned>(&self, descriptor: SectionDescriptor) -> Result<Vec<T>> {
        self.frames(descriptor)?
            .iter()
            .enumerate()
            .map(|(i, frame)| {
                bincode::deserialize(frame).map_err(|e| GenesisStoreError::Decode {
                    section: descriptor,
                    record: i as u64,
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

/// `None` at a clean end of file.
fn read_section_kind<R: Read>(input: &mut R) -> Result<Option<SectionKind>> {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(SectionKind::from_u8(byte[0])?)),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(GenesisStoreError::Io {
                    stage: ExportStage::Read,
                    source: e,
                })
            }
        }
    }
}
