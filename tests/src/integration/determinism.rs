//! # Determinism
//!
//! The genesis ID is a pure function of validators, balances, stakes and
//! epoch/block parameters.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use qc_genesis_builder::FakeGenesisParams;
    use qc_genesis_store::{export_genesis, ExportConfig, GenesisReader};

    use crate::fixtures::{build_with, seeded_genesis, validators_from_seed, DEFAULT_SEED};

    #[test]
    fn test_identical_inputs_identical_genesis_id() {
        let a = seeded_genesis(3, DEFAULT_SEED);
        let b = seeded_genesis(3, DEFAULT_SEED);
        assert_eq!(a.current_hash(), b.current_hash());
        assert_eq!(a.state().root_hash().unwrap(), b.state().root_hash().unwrap());
    }

    #[test]
    fn test_identical_inputs_identical_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.g");
        let second = dir.path().join("second.g");

        export_genesis(&seeded_genesis(3, DEFAULT_SEED), &first, &ExportConfig::default()).unwrap();
        export_genesis(&seeded_genesis(3, DEFAULT_SEED), &second, &ExportConfig::default())
            .unwrap();

        assert_eq!(std::fs::read(first).unwrap(), std::fs::read(second).unwrap());
    }

    #[test]
    fn test_different_validator_address_changes_id() {
        let a = seeded_genesis(3, DEFAULT_SEED);
        let b = seeded_genesis(3, DEFAULT_SEED + 1);
        assert_ne!(a.current_hash(), b.current_hash());
    }

    #[test]
    fn test_different_balance_changes_id() {
        let (_, validators) = validators_from_seed(3, DEFAULT_SEED);
        let base = FakeGenesisParams::default();
        let richer = FakeGenesisParams {
            balance: base.balance + 1,
            ..base.clone()
        };
        assert_ne!(
            build_with(&validators, &base).current_hash(),
            build_with(&validators, &richer).current_hash()
        );
    }

    #[test]
    fn test_different_stake_changes_id() {
        let (_, validators) = validators_from_seed(3, DEFAULT_SEED);
        let base = FakeGenesisParams::default();
        let staked = FakeGenesisParams {
            stake: base.stake * 2,
            ..base.clone()
        };
        assert_ne!(
            build_with(&validators, &base).current_hash(),
            build_with(&validators, &staked).current_hash()
        );
    }

    #[test]
    fn test_different_epoch_changes_id() {
        let (_, validators) = validators_from_seed(2, DEFAULT_SEED);
        let base = FakeGenesisParams::default();
        let later = base.clone().with_epoch(5, 10);
        assert_ne!(
            build_with(&validators, &base).current_hash(),
            build_with(&validators, &later).current_hash()
        );
    }

    #[test]
    fn test_zero_validators_zero_supply() {
        let genesis = build_with(&[], &FakeGenesisParams::default());
        assert_eq!(genesis.total_supply(), 0);
        assert_eq!(genesis.blocks().len(), 1);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(8))]

        #[test]
        fn prop_genesis_id_survives_export(count in 0usize..5, seed in any::<u64>()) {
            let (_, validators) = validators_from_seed(count, seed);
            let genesis = build_with(&validators, &FakeGenesisParams::default());
            prop_assert_eq!(
                genesis.total_supply(),
                count as u128 * FakeGenesisParams::default().balance
            );

            let dir = tempfile::tempdir().unwrap();
            let output = dir.path().join("genesis.g");
            export_genesis(&genesis, &output, &ExportConfig::default()).unwrap();
            let reader = GenesisReader::open(&output).unwrap();
            prop_assert_eq!(reader.header().genesis_id, genesis.current_hash());
        }
    }
}
