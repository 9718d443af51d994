//! Machine-readable summary written by `--report`.

use qc_genesis_builder::FakeValidatorKeys;
use qc_genesis_store::ExportReport;
use serde::Serialize;
use shared_types::{to_hex, Validator};

#[derive(Debug, Serialize)]
pub struct GenesisReport {
    pub genesis_id: String,
    pub network_id: u64,
    pub network_name: String,
    /// Decimal string; the value does not fit a JSON number.
    pub total_supply: String,
    pub output: String,
    pub mode: String,
    pub spill_dir: Option<String>,
    pub sections: Vec<SectionReport>,
    pub validators: Vec<ValidatorReport>,
}

#[derive(Debug, Serialize)]
pub struct SectionReport {
    pub kind: String,
    pub index: u32,
    pub hash: String,
    pub records: u64,
    pub payload_len: u64,
    pub spilled: bool,
}

#[derive(Debug, Serialize)]
pub struct ValidatorReport {
    pub id: u32,
    pub address: String,
    pub validator_public_key: String,
    pub node_public_key: String,
}

impl GenesisReport {
    pub fn new(
        export: &ExportReport,
        total_supply: u128,
        validators: &[Validator],
        keys: &[FakeValidatorKeys],
    ) -> Self {
        Self {
            genesis_id: to_hex(&export.header.genesis_id),
            network_id: export.header.network_id,
            network_name: export.header.network_name.clone(),
            total_supply: total_supply.to_string(),
            output: export.output.display().to_string(),
            mode: format!("{:?}", export.mode).to_lowercase(),
            spill_dir: export.spill_dir.as_ref().map(|p| p.display().to_string()),
            sections: export
                .sections
                .iter()
                .map(|s| SectionReport {
                    kind: s.descriptor.kind.name().to_string(),
                    index: s.descriptor.index,
                    hash: to_hex(&s.hash),
                    records: s.records,
                    payload_len: s.payload_len,
                    spilled: s.spilled,
                })
                .collect(),
            validators: validators
                .iter()
                .zip(keys)
                .map(|(v, k)| ValidatorReport {
                    id: v.id.0,
                    address: to_hex(&v.address),
                    validator_public_key: to_hex(&v.pub_key.bytes()),
                    node_public_key: to_hex(k.node.public_key().as_bytes()),
                })
                .collect(),
        }
    }
}
