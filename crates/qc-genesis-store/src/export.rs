//! # Genesis Export
//!
//! Writes an executed genesis into one container file:
//!
//! ```text
//! [container header] [Blocks(0)] [Epochs(0)] [State(0)]
//! ```
//!
//! The artifact is assembled in a sibling temporary file and renamed into
//! place only after every section flushed and synced. Any failure or
//! cancellation drops the temporary file, the spill directory and every
//! staging file, so no partial artifact is ever visible at `output`.

use std::fs;
use std::io::{self, BufWriter, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use qc_genesis_builder::ExecutedGenesis;
use qc_genesis_state::{KeyValueStore, StateDb};
use serde::Serialize;
use shared_types::{GenesisHeader, SectionDescriptor, SectionKind};
use tempfile::{NamedTempFile, TempDir};
use tracing::{debug, info, warn};

use crate::config::{ExportConfig, ExportMode, SpillDirPolicy};
use crate::domain::{
    write_container_header, CancelToken, FlushedSection, KvDump, SectionSink, SectionWriter,
};
use crate::error::{ExportStage, GenesisStoreError, Result};

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub header: GenesisHeader,
    /// Sections in container order.
    pub sections: Vec<FlushedSection>,
    pub output: PathBuf,
    /// Retained spill directory, if the policy kept it.
    pub spill_dir: Option<PathBuf>,
    pub mode: ExportMode,
}

impl ExportReport {
    pub fn section(&self, kind: SectionKind) -> Option<&FlushedSection> {
        self.sections.iter().find(|s| s.descriptor.kind == kind)
    }
}

/// Export `genesis` to `output`.
pub fn export_genesis<S: KeyValueStore>(
    genesis: &ExecutedGenesis<S>,
    output: &Path,
    config: &ExportConfig,
) -> Result<ExportReport> {
    let header = genesis.header();
    config.cancel.check()?;
    header.encode()?;

    info!(
        "[qc-genesis-store] Exporting genesis {} to {} ({:?})",
        hex::encode(header.genesis_id),
        output.display(),
        config.mode
    );

    let spill_root = create_spill_root(config)?;
    let mut sink = BufWriter::new(create_output_temp(output)?);
    write_container_header(&mut sink, &header)?;

    let sections = match config.mode {
        ExportMode::Sequential => {
            write_sequential(genesis, &header, &mut sink, spill_root.path(), config)?
        }
        ExportMode::Parallel => {
            write_parallel(genesis, &header, &mut sink, spill_root.path(), config)?
        }
    };
    config.cancel.check()?;

    let file = sink.into_inner().map_err(|e| GenesisStoreError::Io {
        stage: ExportStage::Output,
        source: e.into_error(),
    })?;
    file.as_file()
        .sync_all()
        .map_err(GenesisStoreError::io(ExportStage::Output))?;
    file.persist(output).map_err(|e| GenesisStoreError::Io {
        stage: ExportStage::Persist,
        source: e.error,
    })?;

    let spill_dir = match config.spill_policy {
        SpillDirPolicy::Remove => {
            let path = spill_root.path().to_path_buf();
            if let Err(e) = spill_root.remove() {
                warn!(
                    "[qc-genesis-store] Failed to remove spill directory {}: {}",
                    path.display(),
                    e
                );
            }
            None
        }
        SpillDirPolicy::Retain => {
            let path = spill_root.keep();
            info!("[qc-genesis-store] Spill directory retained at {}", path.display());
            Some(path)
        }
    };

    for section in &sections {
        info!(
            "[qc-genesis-store] {} hash: {} ({} records{})",
            section.descriptor.kind,
            hex::encode(section.hash),
            section.records,
            if section.spilled { ", spilled" } else { "" }
        );
    }

    Ok(ExportReport {
        header,
        sections,
        output: output.to_path_buf(),
        spill_dir,
        mode: config.mode,
    })
}

/// Per-run spill directory plus any parents created for it.
///
/// Dropping it removes the run directory, then each created parent that is
/// still empty, deepest first.
struct SpillRoot {
    dir: Option<TempDir>,
    created: Vec<PathBuf>,
}

impl SpillRoot {
    fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }

    fn remove(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => dir.close(),
            None => Ok(()),
        }
    }

    /// Keep the run directory and the parents leading to it.
    fn keep(mut self) -> PathBuf {
        self.created.clear();
        match self.dir.take() {
            Some(dir) => dir.keep(),
            None => PathBuf::new(),
        }
    }
}

impl Drop for SpillRoot {
    fn drop(&mut self) {
        drop(self.dir.take());
        for dir in &self.created {
            if fs::remove_dir(dir).is_ok() {
                debug!("[qc-genesis-store] Removed spill parent {}", dir.display());
            }
        }
    }
}

fn create_spill_root(config: &ExportConfig) -> Result<SpillRoot> {
    let io = GenesisStoreError::io(ExportStage::SpillDir);
    let mut builder = tempfile::Builder::new();
    builder.prefix("qc-genesis-spill-");
    match &config.spill_dir {
        Some(parent) => {
            let created: Vec<PathBuf> = parent
                .ancestors()
                .take_while(|dir| !dir.as_os_str().is_empty() && !dir.exists())
                .map(Path::to_path_buf)
                .collect();
            let mut root = SpillRoot { dir: None, created };
            fs::create_dir_all(parent).map_err(GenesisStoreError::io(ExportStage::SpillDir))?;
            root.dir = Some(builder.tempdir_in(parent).map_err(io)?);
            Ok(root)
        }
        None => Ok(SpillRoot {
            dir: Some(builder.tempdir().map_err(io)?),
            created: Vec::new(),
        }),
    }
}

fn create_output_temp(output: &Path) -> Result<NamedTempFile> {
    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    tempfile::Builder::new()
        .prefix(".qc-genesis-")
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(GenesisStoreError::io(ExportStage::Output))
}

// =============================================================================
// SECTION PASSES
// =============================================================================

fn write_records<'a, T, I, W>(
    writer: SectionWriter<'_, W>,
    header: &GenesisHeader,
    descriptor: SectionDescriptor,
    records: I,
    spill_dir: &Path,
    cancel: &CancelToken,
) -> Result<FlushedSection>
where
    T: Serialize + 'a,
    I: IntoIterator<Item = &'a T>,
    W: SectionSink,
{
    let mut section = writer.start(header, descriptor, spill_dir);
    for record in records {
        cancel.check()?;
        section.write_encoded(record)?;
    }
    section.flush()
}

fn write_state<S: KeyValueStore, W: SectionSink>(
    writer: SectionWriter<'_, W>,
    header: &GenesisHeader,
    state: &StateDb<S>,
    spill_dir: &Path,
    cancel: &CancelToken,
) -> Result<FlushedSection> {
    let mut section = writer.start(header, SectionDescriptor::state(0), spill_dir);
    let entries = KvDump::new(state.iter()).write_into(&mut section, cancel)?;
    debug!("[qc-genesis-store] Dumped {} state entries", entries);
    section.flush()
}

// Blocks and epochs are held newest first; the container stores them oldest first.
fn write_sequential<S: KeyValueStore, W: SectionSink>(
    genesis: &ExecutedGenesis<S>,
    header: &GenesisHeader,
    sink: &mut W,
    spill_dir: &Path,
    config: &ExportConfig,
) -> Result<Vec<FlushedSection>> {
    let threshold = config.spill_threshold;
    let cancel = &config.cancel;

    let blocks = write_records(
        SectionWriter::new(&mut *sink).with_spill_threshold(threshold),
        header,
        SectionDescriptor::blocks(0),
        genesis.blocks().iter().rev(),
        spill_dir,
        cancel,
    )?;
    let epochs = write_records(
        SectionWriter::new(&mut *sink).with_spill_threshold(threshold),
        header,
        SectionDescriptor::epochs(0),
        genesis.epochs().iter().rev(),
        spill_dir,
        cancel,
    )?;
    let state = write_state(
        SectionWriter::new(&mut *sink).with_spill_threshold(threshold),
        header,
        genesis.state(),
        spill_dir,
        cancel,
    )?;

    Ok(vec![blocks, epochs, state])
}

/// A section written to its own staging file.
struct StagedSection {
    flushed: FlushedSection,
    file: NamedTempFile,
    _dir: TempDir,
}

fn stage_section<F>(run_dir: &Path, descriptor: SectionDescriptor, write: F) -> Result<StagedSection>
where
    F: FnOnce(&mut NamedTempFile, &Path) -> Result<FlushedSection>,
{
    let dir = tempfile::Builder::new()
        .prefix(descriptor.kind.name())
        .tempdir_in(run_dir)
        .map_err(GenesisStoreError::io(ExportStage::SpillDir))?;
    let mut file = tempfile::Builder::new()
        .prefix("stage-")
        .suffix(".section")
        .tempfile_in(dir.path())
        .map_err(GenesisStoreError::io(ExportStage::Spill(descriptor)))?;
    let flushed = write(&mut file, dir.path())?;
    Ok(StagedSection {
        flushed,
        file,
        _dir: dir,
    })
}

fn write_parallel<S: KeyValueStore, W: SectionSink>(
    genesis: &ExecutedGenesis<S>,
    header: &GenesisHeader,
    sink: &mut W,
    run_dir: &Path,
    config: &ExportConfig,
) -> Result<Vec<FlushedSection>> {
    let threshold = config.spill_threshold;
    let cancel = &config.cancel;

    let (blocks, (epochs, state)) = rayon::join(
        || {
            stage_section(run_dir, SectionDescriptor::blocks(0), |file, dir| {
                write_records(
                    SectionWriter::new(file).with_spill_threshold(threshold),
                    header,
                    SectionDescriptor::blocks(0),
                    genesis.blocks().iter().rev(),
                    dir,
                    cancel,
                )
            })
        },
        || {
            rayon::join(
                || {
                    stage_section(run_dir, SectionDescriptor::epochs(0), |file, dir| {
                        write_records(
                            SectionWriter::new(file).with_spill_threshold(threshold),
                            header,
                            SectionDescriptor::epochs(0),
                            genesis.epochs().iter().rev(),
                            dir,
                            cancel,
                        )
                    })
                },
                || {
                    stage_section(run_dir, SectionDescriptor::state(0), |file, dir| {
                        write_state(
                            SectionWriter::new(file).with_spill_threshold(threshold),
                            header,
                            genesis.state(),
                            dir,
                            cancel,
                        )
                    })
                },
            )
        },
    );

    // First failure in section order wins.
    let staged = [blocks?, epochs?, state?];

    let mut sections = Vec::with_capacity(staged.len());
    for mut staged in staged {
        cancel.check()?;
        let stage = ExportStage::Flush(staged.flushed.descriptor);
        staged
            .file
            .seek(SeekFrom::Start(0))
            .map_err(GenesisStoreError::io(stage))?;
        io::copy(&mut staged.file, &mut *sink).map_err(GenesisStoreError::io(stage))?;
        sections.push(staged.flushed);
    }
    sink.sync()
        .map_err(GenesisStoreError::io(ExportStage::Output))?;

    Ok(sections)
}
