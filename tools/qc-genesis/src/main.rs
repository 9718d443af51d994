//! # qc-genesis
//!
//! Generates a fake-network genesis: validator keys, funded accounts, system
//! contracts and the executed genesis transactions, exported as one hashed
//! artifact.
//!
//! ```text
//! keys ──→ validators ──→ GenesisBuilder ──execute──→ export_genesis ──→ genesis.g
//! ```
//!
//! Keys, section hashes and the genesis ID go to stdout; logs go to stderr
//! (`QC_LOG_LEVEL`, default `info`).

mod report;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use qc_genesis_builder::{
    build_fake_genesis, fake_validators, generate_validator_keys, FakeGenesisParams,
    FakeValidatorKeys, NativeGenesisProcessor, SystemContracts, DEFAULT_BLOCK, DEFAULT_EPOCH,
};
use qc_genesis_state::InMemoryKvStore;
use qc_genesis_store::{
    export_genesis, ExportConfig, ExportMode, ExportReport, GenesisReader, SpillDirPolicy,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::{to_hex, NetworkPreset, SectionKind, Validator};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::report::GenesisReport;

/// Environment variable holding the log filter.
const LOG_LEVEL_ENV: &str = "QC_LOG_LEVEL";

/// Quantum-Chain fake genesis generator
#[derive(Parser, Debug)]
#[command(name = "qc-genesis")]
#[command(about = "Build and export a fake-network genesis artifact")]
struct Args {
    /// Number of validators
    #[arg(long, default_value_t = 3)]
    num: usize,

    /// Balance per validator, in whole tokens
    #[arg(long, default_value_t = 1_000_000_000)]
    balance: u64,

    /// Self-stake per validator, in whole tokens
    #[arg(long, default_value_t = 5_000_000)]
    stake: u64,

    /// First epoch of the network (at least 2)
    #[arg(long, default_value_t = DEFAULT_EPOCH)]
    epoch: u32,

    /// First block of the network (at least 1)
    #[arg(long, default_value_t = DEFAULT_BLOCK)]
    block: u64,

    /// Network rules preset (testnet or devnet)
    #[arg(long, default_value = "testnet")]
    network: NetworkPreset,

    /// Artifact path
    #[arg(short, long, default_value = "genesis.g")]
    output: PathBuf,

    /// Parent directory for spill files
    #[arg(long)]
    spill_dir: Option<PathBuf>,

    /// In-memory section buffer before spilling, in MiB
    #[arg(long)]
    spill_threshold_mb: Option<usize>,

    /// Keep the per-run spill directory after a successful export
    #[arg(long)]
    keep_spill_dir: bool,

    /// Write the three sections concurrently
    #[arg(long)]
    parallel: bool,

    /// Seed for deterministic key generation
    #[arg(long)]
    seed: Option<u64>,

    /// Directory with compiled system contracts (`<name>.bin`, hex)
    #[arg(long)]
    contracts_dir: Option<PathBuf>,

    /// Write a JSON summary to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Re-open the artifact and verify every section hash
    #[arg(long)]
    verify: bool,
}

impl Args {
    fn export_config(&self) -> Result<ExportConfig> {
        let mut config = ExportConfig::from_env();
        if let Some(dir) = &self.spill_dir {
            config = config.with_spill_dir(dir);
        }
        if let Some(mb) = self.spill_threshold_mb {
            let bytes = mb
                .checked_mul(1024 * 1024)
                .with_context(|| format!("spill threshold of {} MiB is too large", mb))?;
            config = config.with_spill_threshold(bytes);
        }
        if self.keep_spill_dir {
            config = config.with_spill_policy(SpillDirPolicy::Retain);
        }
        if self.parallel {
            config = config.with_mode(ExportMode::Parallel);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let params = FakeGenesisParams::from_units(args.balance, args.stake)
        .context("invalid balance or stake")?
        .with_epoch(args.epoch, args.block)
        .with_rules(args.network.rules());
    params.validate().context("invalid genesis parameters")?;

    let mut rng = match args.seed {
        Some(seed) => {
            warn!("[qc-genesis] Deterministic keys from seed {}, do not use outside tests", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };
    let keys = generate_validator_keys(args.num, &mut rng).context("generating validator keys")?;
    let validators = fake_validators(&keys, params.genesis_time);
    print_validators(&validators, &keys);

    let contracts = match &args.contracts_dir {
        Some(dir) => SystemContracts::load_from_dir(dir)
            .with_context(|| format!("loading system contracts from {}", dir.display()))?,
        None => SystemContracts::placeholder(),
    };

    info!(
        "[qc-genesis] Building {} genesis: {} validators, epoch {}, block {}",
        args.network, args.num, args.epoch, args.block
    );
    let genesis = build_fake_genesis(
        InMemoryKvStore::new(),
        &validators,
        &params,
        &contracts,
        &NativeGenesisProcessor::new(),
    )
    .context("building genesis")?;
    info!(
        "[qc-genesis] Total supply {} across {} state entries",
        genesis.total_supply(),
        genesis.state().len()
    );

    let config = args.export_config()?;
    let export = export_genesis(&genesis, &args.output, &config)
        .with_context(|| format!("exporting genesis to {}", args.output.display()))?;
    print_hashes(&export)?;

    if args.verify {
        verify(&export)?;
    }

    if let Some(path) = &args.report {
        let report = GenesisReport::new(&export, genesis.total_supply(), &validators, &keys);
        let file = File::create(path)
            .with_context(|| format!("creating report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!("[qc-genesis] Report written to {}", path.display());
    }

    Ok(())
}

fn print_validators(validators: &[Validator], keys: &[FakeValidatorKeys]) {
    println!("Validator num: {}", validators.len());
    for (validator, key) in validators.iter().zip(keys) {
        println!("Validator {}:", validator.id);
        println!("- Node private key: {}", to_hex(key.node.to_bytes().as_slice()));
        println!("- Node public key: {}", to_hex(key.node.public_key().as_bytes()));
        println!(
            "- Validator private key: {}",
            to_hex(key.validator.to_bytes().as_slice())
        );
        println!("- Validator public key: {}", to_hex(&validator.pub_key.bytes()));
        println!("- Address: {}", to_hex(&validator.address));
    }
}

fn print_hashes(export: &ExportReport) -> Result<()> {
    for line in hash_lines(export)? {
        println!("{}", line);
    }
    Ok(())
}

/// Section hashes in container order, then the genesis ID.
fn hash_lines(export: &ExportReport) -> Result<Vec<String>> {
    let mut lines = Vec::with_capacity(4);
    for (kind, label) in [
        (SectionKind::Blocks, "Blocks"),
        (SectionKind::Epochs, "Epochs"),
        (SectionKind::State, "State"),
    ] {
        let section = export
            .section(kind)
            .with_context(|| format!("{} section missing from export report", kind))?;
        lines.push(format!("- {} hash: {}", label, to_hex(&section.hash)));
    }
    lines.push(format!("Genesis ID: {}", to_hex(&export.header.genesis_id)));
    Ok(lines)
}

fn verify(export: &ExportReport) -> Result<()> {
    let reader = GenesisReader::open(&export.output)
        .with_context(|| format!("opening {}", export.output.display()))?;
    let verified = reader.verify().context("verifying artifact")?;

    for ((descriptor, hash), written) in verified.iter().zip(&export.sections) {
        if *descriptor != written.descriptor || *hash != written.hash {
            bail!(
                "section {} reads back as {} but was written as {}",
                descriptor,
                to_hex(hash),
                to_hex(&written.hash)
            );
        }
    }
    info!(
        "[qc-genesis] Verified {} sections of {}",
        verified.len(),
        export.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_network() {
        let args = Args::try_parse_from(["qc-genesis"]).unwrap();
        assert_eq!(args.num, 3);
        assert_eq!(args.balance, 1_000_000_000);
        assert_eq!(args.stake, 5_000_000);
        assert_eq!(args.epoch, 2);
        assert_eq!(args.block, 1);
        assert_eq!(args.network, NetworkPreset::Testnet);
        assert_eq!(args.output, PathBuf::from("genesis.g"));
        assert!(!args.parallel);
    }

    #[test]
    fn test_flags_shape_export_config() {
        let args = Args::try_parse_from([
            "qc-genesis",
            "--spill-threshold-mb",
            "2",
            "--keep-spill-dir",
            "--parallel",
            "--spill-dir",
            "/tmp/qc-spill",
        ])
        .unwrap();
        let config = args.export_config().unwrap();
        assert_eq!(config.spill_threshold, 2 * 1024 * 1024);
        assert_eq!(config.spill_policy, SpillDirPolicy::Retain);
        assert_eq!(config.mode, ExportMode::Parallel);
        assert_eq!(config.spill_dir, Some(PathBuf::from("/tmp/qc-spill")));
    }

    #[test]
    fn test_unknown_network_rejected() {
        assert!(Args::try_parse_from(["qc-genesis", "--network", "mainnet"]).is_err());
    }

    #[test]
    fn test_hash_lines_follow_container_order() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("genesis.g");
        let args = Args::try_parse_from([
            "qc-genesis".to_string(),
            "--seed".to_string(),
            "11".to_string(),
            "--parallel".to_string(),
            "--output".to_string(),
            output.display().to_string(),
        ])
        .unwrap();
        let params = FakeGenesisParams::default();
        let keys = generate_validator_keys(args.num, &mut StdRng::seed_from_u64(11)).unwrap();
        let genesis = build_fake_genesis(
            InMemoryKvStore::new(),
            &fake_validators(&keys, params.genesis_time),
            &params,
            &SystemContracts::placeholder(),
            &NativeGenesisProcessor::new(),
        )
        .unwrap();
        let export = export_genesis(&genesis, &output, &args.export_config().unwrap()).unwrap();

        let lines = hash_lines(&export).unwrap();
        let reader = GenesisReader::open(&output).unwrap();
        assert_eq!(lines.len(), 4);
        for ((line, label), entry) in lines
            .iter()
            .zip(["Blocks", "Epochs", "State"])
            .zip(reader.sections())
        {
            assert_eq!(*line, format!("- {} hash: {}", label, to_hex(&entry.hash)));
        }
        assert_eq!(lines[3], format!("Genesis ID: {}", to_hex(&genesis.current_hash())));
    }

    #[test]
    fn test_run_with_seed_writes_verified_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("genesis.g");
        let report = dir.path().join("report.json");
        let args = Args::try_parse_from([
            "qc-genesis".to_string(),
            "--seed".to_string(),
            "7".to_string(),
            "--verify".to_string(),
            "--output".to_string(),
            output.display().to_string(),
            "--report".to_string(),
            report.display().to_string(),
        ])
        .unwrap();

        run(&args).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&report).unwrap()).unwrap();
        assert_eq!(json["sections"].as_array().unwrap().len(), 3);
        assert_eq!(json["validators"].as_array().unwrap().len(), 3);
        let reader = GenesisReader::open(&output).unwrap();
        assert_eq!(
            json["genesis_id"].as_str().unwrap(),
            to_hex(&reader.header().genesis_id)
        );
    }
}
