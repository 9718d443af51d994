//! # ECDSA Keys (secp256k1)
//!
//! Validator and node identities on the secp256k1 curve.
//!
//! ## Address Derivation
//!
//! Addresses are Ethereum-compatible: the last 20 bytes of
//! `keccak256(uncompressed_pubkey[1..])`.

use crate::hashing::keccak256;
use crate::CryptoError;
use k256::ecdsa::{SigningKey, VerifyingKey};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroizing;

/// Attempts before giving up on a randomness source that keeps producing
/// out-of-range scalars.
const MAX_KEYGEN_ATTEMPTS: usize = 8;

/// Uncompressed secp256k1 public key (65 bytes, starting with 0x04).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1PublicKey([u8; 65]);

impl Secp256k1PublicKey {
    /// Create from SEC1 bytes (compressed or uncompressed).
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let verifying_key =
            VerifyingKey::from_sec1_bytes(bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self::from_verifying_key(&verifying_key))
    }

    fn from_verifying_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let mut bytes = [0u8; 65];
        bytes.copy_from_slice(point.as_bytes());
        Self(bytes)
    }

    /// Get raw uncompressed bytes.
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Derive the 20-byte account address.
    pub fn to_address(&self) -> [u8; 20] {
        let hash = keccak256(&self.0[1..]);
        let mut address = [0u8; 20];
        address.copy_from_slice(&hash[12..]);
        address
    }
}

/// secp256k1 keypair.
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
}

impl Secp256k1KeyPair {
    /// Generate a keypair from the given randomness source.
    ///
    /// Fails with `KeyGenerationFailed` when the source errors or keeps
    /// yielding scalars outside the curve order.
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Self, CryptoError> {
        let mut seed = Zeroizing::new([0u8; 32]);
        for _ in 0..MAX_KEYGEN_ATTEMPTS {
            rng.try_fill_bytes(&mut seed[..])
                .map_err(|e| CryptoError::KeyGenerationFailed(e.to_string()))?;
            if let Ok(signing_key) = SigningKey::from_bytes((&*seed).into()) {
                return Ok(Self { signing_key });
            }
        }
        Err(CryptoError::KeyGenerationFailed(format!(
            "no valid scalar after {} attempts",
            MAX_KEYGEN_ATTEMPTS
        )))
    }

    /// Generate a keypair from the operating system RNG.
    pub fn generate_random() -> Result<Self, CryptoError> {
        Self::generate(&mut rand::rngs::OsRng)
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self { signing_key })
    }

    /// Get public key (uncompressed, 65 bytes).
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey::from_verifying_key(self.signing_key.verifying_key())
    }

    /// Address derived from the public key.
    pub fn address(&self) -> [u8; 20] {
        self.public_key().to_address()
    }

    /// Get secret key bytes (for display/serialization).
    pub fn to_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.signing_key.to_bytes().into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// RNG that always fails, to exercise the error path.
    struct BrokenRng;

    impl RngCore for BrokenRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
            Err(rand::Error::new("entropy source unavailable"))
        }
    }

    impl CryptoRng for BrokenRng {}

    /// RNG that only produces zero bytes (an invalid scalar).
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }
        fn next_u64(&mut self) -> u64 {
            0
        }
        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    impl CryptoRng for ZeroRng {}

    #[test]
    fn test_known_address_derivation() {
        // Secret key 0x...01 maps to the well-known generator-point address.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let keypair = Secp256k1KeyPair::from_bytes(secret).unwrap();
        assert_eq!(
            hex::encode(keypair.address()),
            "7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_public_key_is_uncompressed() {
        let keypair = Secp256k1KeyPair::generate_random().unwrap();
        let public = keypair.public_key();
        assert_eq!(public.as_bytes()[0], 0x04);
        assert_eq!(public.as_bytes().len(), 65);
    }

    #[test]
    fn test_seeded_generation_is_deterministic() {
        let a = Secp256k1KeyPair::generate(&mut StdRng::seed_from_u64(7)).unwrap();
        let b = Secp256k1KeyPair::generate(&mut StdRng::seed_from_u64(7)).unwrap();
        let c = Secp256k1KeyPair::generate(&mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_ne!(a.public_key(), c.public_key());
    }

    #[test]
    fn test_broken_rng_reports_failure() {
        let result = Secp256k1KeyPair::generate(&mut BrokenRng);
        assert!(matches!(result, Err(CryptoError::KeyGenerationFailed(_))));
    }

    #[test]
    fn test_invalid_scalar_source_gives_up() {
        let result = Secp256k1KeyPair::generate(&mut ZeroRng);
        assert!(matches!(result, Err(CryptoError::KeyGenerationFailed(_))));
    }

    #[test]
    fn test_roundtrip_bytes() {
        let original = Secp256k1KeyPair::generate_random().unwrap();
        let bytes = original.to_bytes();
        let restored = Secp256k1KeyPair::from_bytes(*bytes).unwrap();
        assert_eq!(original.public_key(), restored.public_key());
    }

    #[test]
    fn test_public_key_from_sec1() {
        let keypair = Secp256k1KeyPair::generate_random().unwrap();
        let public = keypair.public_key();
        let parsed = Secp256k1PublicKey::from_sec1_bytes(public.as_bytes()).unwrap();
        assert_eq!(parsed, public);
        assert!(Secp256k1PublicKey::from_sec1_bytes(&[0u8; 65]).is_err());
    }
}
