//! # Spill Buffer
//!
//! Holds a section payload until flush. Bytes stay in memory up to the
//! threshold, then move to a temporary file under the spill directory.
//! The file is deleted when the buffer is dropped, flushed or not.

use std::io::{self, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use shared_types::SectionDescriptor;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ExportStage, GenesisStoreError, Result};

/// Prefix for spill file names.
pub const SPILL_FILE_PREFIX: &str = "qc-genesis-";

/// Suffix for spill file names.
pub const SPILL_FILE_SUFFIX: &str = ".spill";

pub struct SpillBuffer {
    section: SectionDescriptor,
    threshold: usize,
    spill_dir: PathBuf,
    memory: Vec<u8>,
    file: Option<BufWriter<NamedTempFile>>,
    len: u64,
}

impl SpillBuffer {
    pub fn new(section: SectionDescriptor, threshold: usize, spill_dir: &Path) -> Self {
        Self {
            section,
            threshold,
            spill_dir: spill_dir.to_path_buf(),
            memory: Vec::new(),
            file: None,
            len: 0,
        }
    }

    /// Buffered payload length.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_spilled(&self) -> bool {
        self.file.is_some()
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        match self.file.as_mut() {
            Some(file) => file
                .write_all(bytes)
                .map_err(GenesisStoreError::io(ExportStage::Spill(self.section)))?,
            None => {
                self.memory.extend_from_slice(bytes);
                if self.memory.len() > self.threshold {
                    self.spill()?;
                }
            }
        }
        self.len += bytes.len() as u64;
        Ok(())
    }

    fn spill(&mut self) -> Result<()> {
        let stage = ExportStage::Spill(self.section);
        let file = tempfile::Builder::new()
            .prefix(SPILL_FILE_PREFIX)
            .suffix(SPILL_FILE_SUFFIX)
            .tempfile_in(&self.spill_dir)
            .map_err(GenesisStoreError::io(stage))?;
        debug!(
            "[qc-genesis-store] {} exceeded {} bytes, spilling to {}",
            self.section,
            self.threshold,
            file.path().display()
        );

        let mut writer = BufWriter::new(file);
        writer
            .write_all(&self.memory)
            .map_err(GenesisStoreError::io(stage))?;
        self.memory = Vec::new();
        self.file = Some(writer);
        Ok(())
    }

    /// Copy the whole payload into `out`, consuming the buffer.
    pub fn drain_into<W: Write + ?Sized>(self, out: &mut W) -> Result<()> {
        let flush_stage = ExportStage::Flush(self.section);
        match self.file {
            None => out
                .write_all(&self.memory)
                .map_err(GenesisStoreError::io(flush_stage)),
            Some(writer) => {
                let mut file = writer
                    .into_inner()
                    .map_err(|e| GenesisStoreError::Io {
                        stage: ExportStage::Spill(self.section),
                        source: e.into_error(),
                    })?;
                file.seek(SeekFrom::Start(0))
                    .map_err(GenesisStoreError::io(flush_stage))?;
                let copied = io::copy(&mut file, out).map_err(GenesisStoreError::io(flush_stage))?;
                if copied != self.len {
                    return Err(GenesisStoreError::Io {
                        stage: flush_stage,
                        source: io::Error::new(
                            io::ErrorKind::UnexpectedEof,
                            format!("spill file held {} of {} bytes", copied, self.len),
                        ),
                    });
                }
                Ok(())
            }
        }
    }
}
