//! Error types for genesis artifact export and verification

use std::fmt;
use std::io;

use qc_genesis_state::KvStoreError;
use shared_types::{SectionDescriptor, TypeError};
use thiserror::Error;

/// Result type alias for genesis store operations
pub type Result<T> = std::result::Result<T, GenesisStoreError>;

/// Stage of an export or read that hit an I/O failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    /// Creating or writing the artifact's temporary output file
    Output,
    /// Creating the spill directory
    SpillDir,
    /// Buffering a section's payload (memory or spill file)
    Spill(SectionDescriptor),
    /// Appending a section to the container
    Flush(SectionDescriptor),
    /// Renaming the finished artifact into place
    Persist,
    /// Reading an artifact back
    Read,
}

impl fmt::Display for ExportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStage::Output => write!(f, "output"),
            ExportStage::SpillDir => write!(f, "spill directory"),
            ExportStage::Spill(section) => write!(f, "spill of {}", section),
            ExportStage::Flush(section) => write!(f, "flush of {}", section),
            ExportStage::Persist => write!(f, "persist"),
            ExportStage::Read => write!(f, "read"),
        }
    }
}

/// Errors that can occur while exporting or reading a genesis artifact
#[derive(Debug, Error)]
pub enum GenesisStoreError {
    /// Artifact or spill file create/write failure
    #[error("I/O failure during {stage}: {source}")]
    Io {
        stage: ExportStage,
        #[source]
        source: io::Error,
    },

    /// A record could not be serialized
    #[error("Failed to encode record in {section}: {source}")]
    Encode {
        section: SectionDescriptor,
        #[source]
        source: bincode::Error,
    },

    /// A record is larger than a frame can describe
    #[error("Record of {len} bytes in {section} exceeds the frame limit")]
    RecordTooLarge { section: SectionDescriptor, len: usize },

    /// State store read failed during the State section dump
    #[error("State iteration failed after {entries} entries: {source}")]
    Iteration {
        entries: u64,
        #[source]
        source: KvStoreError,
    },

    /// The section was poisoned by an earlier failure
    #[error("Section {section} failed: {reason}")]
    SectionFailed {
        section: SectionDescriptor,
        reason: String,
    },

    /// Export cancelled through its `CancelToken`
    #[error("Export cancelled")]
    Cancelled,

    /// Stored content hash differs from the recomputed one
    #[error("Section {section} hash mismatch: stored {stored}, computed {computed}")]
    HashMismatch {
        section: SectionDescriptor,
        stored: String,
        computed: String,
    },

    /// Section bound to a different genesis than the container header
    #[error("Section {section} bound to genesis {found}, expected {expected}")]
    HeaderMismatch {
        section: SectionDescriptor,
        expected: String,
        found: String,
    },

    /// Structural damage in the artifact
    #[error("Corrupted artifact: {0}")]
    Corrupted(String),

    /// A record could not be deserialized
    #[error("Failed to decode record {record} in {section}: {reason}")]
    Decode {
        section: SectionDescriptor,
        record: u64,
        reason: String,
    },

    /// Unknown section kind or similar type-level error
    #[error(transparent)]
    Type(#[from] TypeError),
}

impl GenesisStoreError {
    pub(crate) fn io(stage: ExportStage) -> impl FnOnce(io::Error) -> Self {
        move |source| GenesisStoreError::Io { stage, source }
    }

    /// Map a read error, turning premature EOF into `Corrupted`.
    pub(crate) fn read(context: &'static str) -> impl FnOnce(io::Error) -> Self {
        move |source| {
            if source.kind() == io::ErrorKind::UnexpectedEof {
                GenesisStoreError::Corrupted(format!("truncated while reading {}", context))
            } else {
                GenesisStoreError::Io {
                    stage: ExportStage::Read,
                    source,
                }
            }
        }
    }
}
