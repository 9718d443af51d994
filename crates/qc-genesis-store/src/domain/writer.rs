//! # Section Writer
//!
//! Writes one hashed section into a container sink. Each state is its own
//! type, so sequencing mistakes are rejected by the compiler:
//!
//! ```text
//! SectionWriter ──start()──→ ActiveSection ──flush()──→ FlushedSection
//!     (idle)                   (writing)        │
//!                                               └──→ Err(SectionFailed) once poisoned
//! ```
//!
//! `start` consumes the idle writer and `flush` consumes the active section.
//! Writing after a flush does not compile:
//!
//! ```compile_fail
//! use qc_genesis_store::SectionWriter;
//! use shared_types::{GenesisHeader, SectionDescriptor};
//!
//! let header = GenesisHeader {
//!     genesis_id: [1u8; 32],
//!     network_id: 4003,
//!     network_name: "quantum-testnet".to_string(),
//! };
//! let mut sink = Vec::new();
//! let dir = std::env::temp_dir();
//! let mut section = SectionWriter::new(&mut sink).start(&header, SectionDescriptor::blocks(0), &dir);
//! let _ = section.flush();
//! let _ = section.write_record(b"late");
//! ```
//!
//! A full section round:
//!
//! ```
//! use qc_genesis_store::SectionWriter;
//! use shared_types::{GenesisHeader, SectionDescriptor};
//!
//! let header = GenesisHeader {
//!     genesis_id: [1u8; 32],
//!     network_id: 4003,
//!     network_name: "quantum-testnet".to_string(),
//! };
//! let mut sink = Vec::new();
//! let dir = std::env::temp_dir();
//! let mut section = SectionWriter::new(&mut sink).start(&header, SectionDescriptor::blocks(0), &dir);
//! section.write_record(b"first").unwrap();
//! section.write_record(b"second").unwrap();
//! let flushed = section.flush().unwrap();
//! assert_eq!(flushed.records, 2);
//! assert_ne!(flushed.hash, [0u8; 32]);
//! ```

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use serde::Serialize;
use shared_crypto::Keccak256Hasher;
use shared_types::{GenesisHeader, Hash, SectionDescriptor};
use tempfile::NamedTempFile;
use tracing::debug;

use super::container::{encode_section_prefix, frame_len, section_hasher};
use super::spill::SpillBuffer;
use crate::config::DEFAULT_SPILL_THRESHOLD;
use crate::error::{ExportStage, GenesisStoreError, Result};

// =============================================================================
// SINK
// =============================================================================

/// Destination of flushed sections.
pub trait SectionSink: Write {
    /// Push written bytes to durable storage.
    fn sync(&mut self) -> io::Result<()>;
}

impl SectionSink for File {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

impl SectionSink for NamedTempFile {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.as_file().sync_all()
    }
}

impl<W: SectionSink> SectionSink for BufWriter<W> {
    fn sync(&mut self) -> io::Result<()> {
        self.flush()?;
        self.get_mut().sync()
    }
}

impl SectionSink for Vec<u8> {
    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: SectionSink + ?Sized> SectionSink for &mut S {
    fn sync(&mut self) -> io::Result<()> {
        (**self).sync()
    }
}

// =============================================================================
// IDLE
// =============================================================================

/// Idle writer bound to a sink.
pub struct SectionWriter<'w, W: SectionSink> {
    sink: &'w mut W,
    spill_threshold: usize,
}

impl<'w, W: SectionSink> SectionWriter<'w, W> {
    pub fn new(sink: &'w mut W) -> Self {
        Self {
            sink,
            spill_threshold: DEFAULT_SPILL_THRESHOLD,
        }
    }

    pub fn with_spill_threshold(mut self, threshold: usize) -> Self {
        self.spill_threshold = threshold;
        self
    }

    /// Begin a section. The preamble is hashed immediately; nothing reaches
    /// the sink until `flush`. A header that cannot be encoded poisons the
    /// section.
    pub fn start(
        self,
        header: &GenesisHeader,
        descriptor: SectionDescriptor,
        spill_dir: &Path,
    ) -> ActiveSection<'w, W> {
        debug!("[qc-genesis-store] Starting section {}", descriptor);
        let (hasher, failure) = match section_hasher(header, descriptor) {
            Ok(hasher) => (hasher, None),
            Err(err) => (Keccak256Hasher::new(), Some(err.to_string())),
        };
        ActiveSection {
            sink: self.sink,
            genesis_id: header.genesis_id,
            descriptor,
            hasher,
            buffer: SpillBuffer::new(descriptor, self.spill_threshold, spill_dir),
            records: 0,
            failure,
        }
    }
}

// =============================================================================
// WRITING
// =============================================================================

/// Section accepting records.
///
/// Dropping it without `flush` discards the payload and its spill file.
pub struct ActiveSection<'w, W: SectionSink> {
    sink: &'w mut W,
    genesis_id: Hash,
    descriptor: SectionDescriptor,
    hasher: Keccak256Hasher,
    buffer: SpillBuffer,
    records: u64,
    failure: Option<String>,
}

impl<'w, W: SectionSink> ActiveSection<'w, W> {
    pub fn is_poisoned(&self) -> bool {
        self.failure.is_some()
    }

    /// Append one framed record.
    pub fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_healthy()?;
        self.append_frame(bytes)?;
        self.records += 1;
        Ok(())
    }

    /// Append one bincode-encoded record.
    pub fn write_encoded<T: Serialize>(&mut self, record: &T) -> Result<()> {
        self.ensure_healthy()?;
        let bytes = match bincode::serialize(record) {
            Ok(bytes) => bytes,
            Err(source) => {
                return Err(self.fail(GenesisStoreError::Encode {
                    section: self.descriptor,
                    source,
                }))
            }
        };
        self.write_record(&bytes)
    }

    /// Append a key frame and a value frame as one record.
    pub fn write_kv(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        self.ensure_healthy()?;
        self.append_frame(key)?;
        self.append_frame(value)?;
        self.records += 1;
        Ok(())
    }

    /// Mark the section failed; `flush` will refuse to emit a hash.
    pub fn poison(&mut self, reason: impl Into<String>) {
        if self.failure.is_none() {
            self.failure = Some(reason.into());
        }
    }

    /// Emit the section and its content hash into the sink.
    pub fn flush(self) -> Result<FlushedSection> {
        let ActiveSection {
            sink,
            genesis_id,
            descriptor,
            hasher,
            buffer,
            records,
            failure,
        } = self;

        if let Some(reason) = failure {
            return Err(GenesisStoreError::SectionFailed {
                section: descriptor,
                reason,
            });
        }

        let hash = hasher.finalize();
        let payload_len = buffer.len();
        let spilled = buffer.is_spilled();
        let stage = ExportStage::Flush(descriptor);

        sink.write_all(&encode_section_prefix(&genesis_id, descriptor, payload_len))
            .map_err(GenesisStoreError::io(stage))?;
        buffer.drain_into(&mut *sink)?;
        sink.write_all(&hash).map_err(GenesisStoreError::io(stage))?;
        sink.sync().map_err(GenesisStoreError::io(stage))?;

        debug!(
            "[qc-genesis-store] Flushed {}: {} records, {} bytes, hash {}",
            descriptor,
            records,
            payload_len,
            hex::encode(hash)
        );

        Ok(FlushedSection {
            descriptor,
            hash,
            records,
            payload_len,
            spilled,
        })
    }

    fn ensure_healthy(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(GenesisStoreError::SectionFailed {
                section: self.descriptor,
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }

    fn append_frame(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(len) = frame_len(bytes.len()) else {
            return Err(self.fail(GenesisStoreError::RecordTooLarge {
                section: self.descriptor,
                len: bytes.len(),
            }));
        };
        self.append(&len)?;
        self.append(bytes)
    }

    fn append(&mut self, bytes: &[u8]) -> Result<()> {
        self.hasher.update(bytes);
        if let Err(err) = self.buffer.write(bytes) {
            return Err(self.fail(err));
        }
        Ok(())
    }

    fn fail(&mut self, err: GenesisStoreError) -> GenesisStoreError {
        self.poison(err.to_string());
        err
    }
}

// =============================================================================
// FLUSHED
// =============================================================================

/// Summary of a section written to the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedSection {
    pub descriptor: SectionDescriptor,
    pub hash: Hash,
    pub records: u64,
    pub payload_len: u64,
    /// Whether the payload overflowed to a spill file.
    pub spilled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::container::split_frames;
    use proptest::prelude::*;

    fn header() -> GenesisHeader {
        GenesisHeader {
            genesis_id: [9u8; 32],
            network_id: 4003,
            network_name: "quantum-testnet".to_string(),
        }
    }

    fn write_section(records: &[Vec<u8>], threshold: usize) -> (Vec<u8>, FlushedSection) {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let mut section = SectionWriter::new(&mut sink)
            .with_spill_threshold(threshold)
            .start(&header(), SectionDescriptor::state(0), dir.path());
        for record in records {
            section.write_record(record).unwrap();
        }
        let flushed = section.flush().unwrap();
        (sink, flushed)
    }

    #[test]
    fn test_flushed_layout() {
        let (bytes, flushed) = write_section(&[b"ab".to_vec(), b"cde".to_vec()], 1024);

        assert_eq!(bytes[0], 3);
        assert_eq!(&bytes[1..5], &0u32.to_le_bytes());
        assert_eq!(&bytes[5..37], &[9u8; 32]);
        assert_eq!(&bytes[37..45], &13u64.to_le_bytes());
        let payload = &bytes[45..58];
        assert_eq!(&bytes[58..], &flushed.hash);
        assert_eq!(bytes.len(), 90);

        let frames = split_frames(SectionDescriptor::state(0), payload).unwrap();
        assert_eq!(frames, vec![&b"ab"[..], &b"cde"[..]]);
        assert_eq!(flushed.records, 2);
        assert_eq!(flushed.payload_len, 13);
        assert!(!flushed.spilled);
    }

    #[test]
    fn test_hash_covers_header_and_payload() {
        let mut expected = section_hasher(&header(), SectionDescriptor::state(0)).unwrap();
        expected.update(&1u32.to_le_bytes()).update(b"z");

        let (_, flushed) = write_section(&[b"z".to_vec()], 1024);
        assert_eq!(flushed.hash, expected.finalize());
    }

    #[test]
    fn test_empty_section_has_hash() {
        let (bytes, flushed) = write_section(&[], 1024);
        assert_eq!(flushed.records, 0);
        assert_eq!(flushed.payload_len, 0);
        let expected = section_hasher(&header(), SectionDescriptor::state(0)).unwrap();
        assert_eq!(flushed.hash, expected.finalize());
        assert_eq!(bytes.len(), 45 + 32);
    }

    #[test]
    fn test_poisoned_section_refuses_writes_and_flush() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();
        let mut section =
            SectionWriter::new(&mut sink).start(&header(), SectionDescriptor::blocks(0), dir.path());
        section.write_record(b"ok").unwrap();
        section.poison("store went away");

        assert!(section.is_poisoned());
        assert!(matches!(
            section.write_record(b"more"),
            Err(GenesisStoreError::SectionFailed { .. })
        ));
        match section.flush() {
            Err(GenesisStoreError::SectionFailed { reason, .. }) => {
                assert_eq!(reason, "store went away")
            }
            other => panic!("expected SectionFailed, got {:?}", other),
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_unencodable_header_poisons_section() {
        let dir = tempfile::tempdir().unwrap();
        let mut oversized = header();
        oversized.network_name = "x".repeat(shared_types::MAX_NETWORK_NAME_LEN + 1);
        let mut sink = Vec::new();
        let mut section =
            SectionWriter::new(&mut sink).start(&oversized, SectionDescriptor::blocks(0), dir.path());

        assert!(section.is_poisoned());
        assert!(section.write_record(b"r").is_err());
        assert!(matches!(
            section.flush(),
            Err(GenesisStoreError::SectionFailed { .. })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn test_spill_failure_poisons_section() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let mut sink = Vec::new();
        let mut section = SectionWriter::new(&mut sink)
            .with_spill_threshold(0)
            .start(&header(), SectionDescriptor::state(0), &missing);

        assert!(matches!(
            section.write_kv(b"k", b"v"),
            Err(GenesisStoreError::Io {
                stage: ExportStage::Spill(_),
                ..
            })
        ));
        assert!(section.is_poisoned());
        assert!(section.flush().is_err());
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sections_share_sink_sequentially() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = Vec::new();

        let mut blocks =
            SectionWriter::new(&mut sink).start(&header(), SectionDescriptor::blocks(0), dir.path());
        blocks.write_record(b"b").unwrap();
        let first = blocks.flush().unwrap();

        let mut epochs =
            SectionWriter::new(&mut sink).start(&header(), SectionDescriptor::epochs(0), dir.path());
        epochs.write_record(b"b").unwrap();
        let second = epochs.flush().unwrap();

        assert_ne!(first.hash, second.hash);
        assert_eq!(sink.len(), 2 * (45 + 5 + 32));
        assert_eq!(sink[0], 1);
        assert_eq!(sink[45 + 5 + 32], 2);
    }

    proptest! {
        #[test]
        fn prop_spill_threshold_not_observable(
            records in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..40),
        ) {
            let (in_memory, a) = write_section(&records, usize::MAX);
            let (spilled, b) = write_section(&records, 0);

            prop_assert_eq!(a.hash, b.hash);
            prop_assert_eq!(in_memory, spilled);
            prop_assert!(!a.spilled);
            prop_assert_eq!(b.spilled, !records.is_empty());
        }
    }
}
