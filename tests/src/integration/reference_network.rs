//! # Reference Network
//!
//! Three validators, 1e9 tokens each, 5e6 stake, first epoch 2, first block 1.

#[cfg(test)]
mod tests {
    use qc_genesis_builder::FakeGenesisParams;
    use qc_genesis_store::{export_genesis, ExportConfig, GenesisReader};
    use shared_types::{to_native, BlockIdx, Epoch, SectionKind, ValidatorId, ZERO_HASH};

    use crate::fixtures::{build_with, validators_from_seed, DEFAULT_SEED};

    fn reference_params() -> FakeGenesisParams {
        FakeGenesisParams::from_units(1_000_000_000, 5_000_000)
            .unwrap()
            .with_epoch(2, 1)
    }

    #[test]
    fn test_reference_network_genesis() {
        let (_, validators) = validators_from_seed(3, DEFAULT_SEED);
        let ids: Vec<_> = validators.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![ValidatorId(1), ValidatorId(2), ValidatorId(3)]);

        let genesis = build_with(&validators, &reference_params());

        assert_eq!(
            genesis.total_supply(),
            3 * to_native(1_000_000_000).unwrap()
        );

        // Seed record sits at epoch - 1 and is the oldest epoch.
        let seed = genesis.epochs().last().unwrap();
        assert_eq!(seed.idx, Epoch(1));
        assert_eq!(seed.block_state.last_block.idx, BlockIdx(0));

        assert_eq!(genesis.blocks().len(), 1);
        assert_eq!(genesis.blocks()[0].idx, BlockIdx(1));

        let newest = &genesis.epochs()[0];
        assert_eq!(newest.idx, Epoch(2));
        assert_eq!(newest.epoch_state.validators.len(), 3);
        assert_eq!(genesis.current_hash(), newest.hash());
    }

    #[test]
    fn test_reference_network_export() {
        let (_, validators) = validators_from_seed(3, DEFAULT_SEED);
        let genesis = build_with(&validators, &reference_params());
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("genesis.g");

        let report = export_genesis(&genesis, &output, &ExportConfig::default()).unwrap();

        for kind in SectionKind::ALL {
            let section = report.section(kind).unwrap();
            assert_ne!(section.hash, ZERO_HASH, "{} hash is zero", kind);
            assert!(section.records > 0, "{} is empty", kind);
        }
        assert_eq!(report.header.genesis_id, genesis.current_hash());

        let reader = GenesisReader::open(&output).unwrap();
        assert_eq!(reader.header().genesis_id, genesis.current_hash());
        assert_eq!(reader.verify().unwrap().len(), 3);
    }
}
