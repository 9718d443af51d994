//! # Artifact Round Trip
//!
//! Export followed by read-back reproduces blocks, epochs and state.

#[cfg(test)]
mod tests {
    use qc_genesis_state::{InMemoryKvStore, KeyValueStore};
    use qc_genesis_store::{
        export_genesis, ExportConfig, ExportMode, GenesisReader, GenesisStoreError,
    };
    use shared_types::{SectionDescriptor, SectionKind};

    use crate::fixtures::{seeded_genesis, DEFAULT_SEED};

    #[test]
    fn test_blocks_read_back_in_increasing_order() {
        let genesis = seeded_genesis(4, DEFAULT_SEED);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("genesis.g");
        export_genesis(&genesis, &output, &ExportConfig::default()).unwrap();

        let blocks = GenesisReader::open(&output).unwrap().blocks().unwrap();
        assert_eq!(blocks.len(), genesis.blocks().len());
        assert!(blocks.windows(2).all(|w| w[0].idx < w[1].idx));
        let mut expected = genesis.blocks().to_vec();
        expected.reverse();
        assert_eq!(blocks, expected);
    }

    #[test]
    fn test_epochs_read_back_in_increasing_order() {
        let genesis = seeded_genesis(4, DEFAULT_SEED);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("genesis.g");
        export_genesis(&genesis, &output, &ExportConfig::default()).unwrap();

        let epochs = GenesisReader::open(&output).unwrap().epochs().unwrap();
        assert_eq!(epochs.len(), genesis.epochs().len());
        assert!(epochs.windows(2).all(|w| w[0].idx < w[1].idx));
        assert_eq!(epochs.last().unwrap().hash(), genesis.current_hash());
    }

    #[test]
    fn test_state_round_trip_law() {
        for mode in [ExportMode::Sequential, ExportMode::Parallel] {
            let genesis = seeded_genesis(5, DEFAULT_SEED);
            let dir = tempfile::tempdir().unwrap();
            let output = dir.path().join("genesis.g");
            export_genesis(&genesis, &output, &ExportConfig::default().with_mode(mode)).unwrap();

            let restored: InMemoryKvStore = GenesisReader::open(&output)
                .unwrap()
                .restore_state()
                .unwrap();
            assert_eq!(&restored, genesis.state().store(), "{:?}", mode);
            assert_eq!(restored.len(), genesis.state().len());
        }
    }

    #[test]
    fn test_large_state_spills_without_changing_hash() {
        let genesis = seeded_genesis(8, DEFAULT_SEED);
        let dir = tempfile::tempdir().unwrap();
        let spill_parent = tempfile::tempdir().unwrap();
        let small = dir.path().join("small.g");
        let spilled = dir.path().join("spilled.g");

        let a = export_genesis(&genesis, &small, &ExportConfig::default()).unwrap();
        let b = export_genesis(
            &genesis,
            &spilled,
            &ExportConfig::default()
                .with_spill_dir(spill_parent.path())
                .with_spill_threshold(64),
        )
        .unwrap();

        let state_a = a.section(SectionKind::State).unwrap();
        let state_b = b.section(SectionKind::State).unwrap();
        assert!(!state_a.spilled);
        assert!(state_b.spilled);
        assert_eq!(state_a.hash, state_b.hash);
        assert_eq!(std::fs::read_dir(spill_parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_tampered_state_rejected() {
        let genesis = seeded_genesis(2, DEFAULT_SEED);
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("genesis.g");
        export_genesis(&genesis, &output, &ExportConfig::default()).unwrap();

        let entry = *GenesisReader::open(&output)
            .unwrap()
            .section(SectionDescriptor::state(0))
            .unwrap();
        let mut bytes = std::fs::read(&output).unwrap();
        let last_payload_byte = (entry.payload_offset + entry.payload_len - 1) as usize;
        bytes[last_payload_byte] = bytes[last_payload_byte].wrapping_add(1);
        std::fs::write(&output, bytes).unwrap();

        assert!(matches!(
            GenesisReader::open(&output),
            Err(GenesisStoreError::HashMismatch { .. })
        ));
    }
}
