//! # Test Fixtures
//!
//! Deterministic fake genesis construction shared by the integration tests
//! and benchmarks.

use qc_genesis_builder::{
    build_fake_genesis, fake_validators, generate_validator_keys, ExecutedGenesis,
    FakeGenesisParams, FakeValidatorKeys, NativeGenesisProcessor, SystemContracts,
};
use qc_genesis_state::InMemoryKvStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared_types::Validator;

/// Seed used when a test does not care which keys it gets.
pub const DEFAULT_SEED: u64 = 0x5eed;

/// Keys and validators generated from `seed`.
pub fn validators_from_seed(count: usize, seed: u64) -> (Vec<FakeValidatorKeys>, Vec<Validator>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let keys = generate_validator_keys(count, &mut rng).expect("key generation");
    let validators = fake_validators(&keys, FakeGenesisParams::default().genesis_time);
    (keys, validators)
}

/// Build a genesis for `validators` with `params` and placeholder contracts.
pub fn build_with(
    validators: &[Validator],
    params: &FakeGenesisParams,
) -> ExecutedGenesis<InMemoryKvStore> {
    build_fake_genesis(
        InMemoryKvStore::new(),
        validators,
        params,
        &SystemContracts::placeholder(),
        &NativeGenesisProcessor::new(),
    )
    .expect("fake genesis builds")
}

/// Default-parameter genesis with `count` seeded validators.
pub fn seeded_genesis(count: usize, seed: u64) -> ExecutedGenesis<InMemoryKvStore> {
    let (_, validators) = validators_from_seed(count, seed);
    build_with(&validators, &FakeGenesisParams::default())
}
