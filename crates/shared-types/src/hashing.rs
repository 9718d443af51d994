use shared_crypto::Keccak256Hasher;

use crate::entities::Hash;

/// Field-by-field Keccak-256 feed used for record hashes.
///
/// Variable-length inputs are length-prefixed so that adjacent fields can
/// never alias each other.
pub(crate) struct RecordHasher(Keccak256Hasher);

impl RecordHasher {
    pub(crate) fn new(domain: &[u8]) -> Self {
        let mut hasher = Keccak256Hasher::new();
        hasher.update(domain);
        Self(hasher)
    }

    pub(crate) fn u8(&mut self, value: u8) -> &mut Self {
        self.0.update(&[value]);
        self
    }

    pub(crate) fn u32(&mut self, value: u32) -> &mut Self {
        self.0.update(&value.to_be_bytes());
        self
    }

    pub(crate) fn u64(&mut self, value: u64) -> &mut Self {
        self.0.update(&value.to_be_bytes());
        self
    }

    pub(crate) fn u128(&mut self, value: u128) -> &mut Self {
        self.0.update(&value.to_be_bytes());
        self
    }

    pub(crate) fn fixed(&mut self, bytes: &[u8]) -> &mut Self {
        self.0.update(bytes);
        self
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.0
            .update(&(bytes.len() as u64).to_be_bytes())
            .update(bytes);
        self
    }

    pub(crate) fn finish(self) -> Hash {
        self.0.finalize()
    }
}
