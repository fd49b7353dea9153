//! Recoverable secp256k1 key pairs and signatures.
//!
//! Signatures are 65 bytes laid out as `r || s || v` with `v ∈ {27, 28}`, the
//! form the multisig contract expects. The signer of a digest is never sent
//! alongside the signature; it is recovered from it.

use crate::{Address, Hash};
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{All, Message, PublicKey as SecpPublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::OnceLock;

fn context() -> &'static Secp256k1<All> {
    static CONTEXT: OnceLock<Secp256k1<All>> = OnceLock::new();
    CONTEXT.get_or_init(Secp256k1::new)
}

/// A secp256k1 key pair for signing digests.
#[derive(Clone)]
pub struct KeyPair {
    secret: SecretKey,
    public: SecpPublicKey,
}

impl KeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        loop {
            rand::RngCore::fill_bytes(&mut rand::rngs::OsRng, &mut seed);
            if let Ok(secret) = SecretKey::from_slice(&seed) {
                return Self::from_secret(secret);
            }
        }
    }

    /// Generate a key pair from a seed (for testing/simulation).
    ///
    /// Seeds that are not a valid scalar are re-hashed until one is, so every
    /// seed maps to exactly one key pair.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let mut candidate = *seed;
        loop {
            if let Ok(secret) = SecretKey::from_slice(&candidate) {
                return Self::from_secret(secret);
            }
            candidate = Hash::from_bytes(&candidate).to_bytes();
        }
    }

    /// Load a key pair from raw secret key bytes.
    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let secret = SecretKey::from_slice(bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        Ok(Self::from_secret(secret))
    }

    fn from_secret(secret: SecretKey) -> Self {
        let public = SecpPublicKey::from_secret_key(context(), &secret);
        Self { secret, public }
    }

    /// Raw secret key bytes.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.secret_bytes()
    }

    /// Uncompressed public key (65 bytes, `0x04` tagged).
    pub fn public_key_uncompressed(&self) -> [u8; 65] {
        self.public.serialize_uncompressed()
    }

    /// The address controlled by this key pair.
    pub fn address(&self) -> Address {
        Address::from_uncompressed_public_key(&self.public.serialize_uncompressed())
    }

    /// Sign a 32-byte digest.
    pub fn sign_digest(&self, digest: &Hash) -> Signature {
        let message = Message::from_digest(digest.to_bytes());
        let signature = context().sign_ecdsa_recoverable(&message, &self.secret);
        let (recovery_id, compact) = signature.serialize_compact();

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&compact);
        bytes[64] = 27 + recovery_id.to_i32() as u8;
        Signature(bytes)
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyPair({})", self.address())
    }
}

/// A 65-byte recoverable ECDSA signature (`r || s || v`).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; 65]);

impl Signature {
    /// Size of a signature in bytes.
    pub const BYTES: usize = 65;

    /// Create from raw bytes without validation.
    pub fn from_raw(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    /// Create from a byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; 65] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// Get signature as byte slice.
    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    /// Recover the address that produced this signature over `digest`.
    pub fn recover(&self, digest: &Hash) -> Result<Address, CryptoError> {
        let v = self.0[64];
        let recovery = match v {
            27 | 28 => v - 27,
            0 | 1 => v,
            other => return Err(CryptoError::InvalidRecoveryId(other)),
        };
        let recovery_id = RecoveryId::from_i32(recovery as i32)
            .map_err(|_| CryptoError::InvalidRecoveryId(v))?;
        let signature = RecoverableSignature::from_compact(&self.0[..64], recovery_id)
            .map_err(|_| CryptoError::MalformedSignature)?;

        let message = Message::from_digest(digest.to_bytes());
        let public = context()
            .recover_ecdsa(&message, &signature)
            .map_err(|_| CryptoError::RecoveryFailed)?;
        Ok(Address::from_uncompressed_public_key(
            &public.serialize_uncompressed(),
        ))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", &hex::encode(self.0)[..16])
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(&s))
            .map_err(serde::de::Error::custom)?;
        Signature::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

/// Errors from key handling and signature recovery.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Secret key bytes are not a valid secp256k1 scalar.
    #[error("Invalid secret key")]
    InvalidSecretKey,

    /// Signature has the wrong number of bytes.
    #[error("Invalid signature length: expected 65, got {0}")]
    InvalidSignatureLength(usize),

    /// The `v` byte is not a known recovery id.
    #[error("Invalid recovery id: {0}")]
    InvalidRecoveryId(u8),

    /// `r || s` do not form a valid signature.
    #[error("Malformed signature")]
    MalformedSignature,

    /// No public key could be recovered for the digest.
    #[error("Public key recovery failed")]
    RecoveryFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_recover() {
        let keypair = KeyPair::generate();
        let digest = Hash::from_bytes(b"test message");

        let signature = keypair.sign_digest(&digest);

        assert!(matches!(signature.as_bytes()[64], 27 | 28));
        assert_eq!(signature.recover(&digest).unwrap(), keypair.address());
    }

    #[test]
    fn test_recover_wrong_digest_gives_other_address() {
        let keypair = KeyPair::generate();
        let signature = keypair.sign_digest(&Hash::from_bytes(b"test message"));

        let recovered = signature.recover(&Hash::from_bytes(b"wrong message"));
        assert_ne!(recovered.ok(), Some(keypair.address()));
    }

    #[test]
    fn test_keypair_from_seed_is_deterministic() {
        let seed = [42u8; 32];
        let kp1 = KeyPair::from_seed(&seed);
        let kp2 = KeyPair::from_seed(&seed);

        let digest = Hash::from_bytes(b"test");
        assert_eq!(kp1.sign_digest(&digest), kp2.sign_digest(&digest));
        assert_eq!(kp1.address(), kp2.address());
    }

    #[test]
    fn test_zero_seed_still_yields_key() {
        let kp = KeyPair::from_seed(&[0u8; 32]);
        assert_ne!(kp.address(), Address::ZERO);
    }

    #[test]
    fn test_known_address_derivation() {
        // Secret key 1 maps to the generator point.
        let mut secret = [0u8; 32];
        secret[31] = 1;
        let kp = KeyPair::from_secret_bytes(&secret).unwrap();
        assert_eq!(
            kp.address().to_string(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn test_bad_signatures_rejected() {
        assert_eq!(
            Signature::from_slice(&[0u8; 64]),
            Err(CryptoError::InvalidSignatureLength(64))
        );
        let mut raw = [1u8; 65];
        raw[64] = 5;
        assert_eq!(
            Signature::from_raw(raw).recover(&Hash::ZERO),
            Err(CryptoError::InvalidRecoveryId(5))
        );
    }

    #[test]
    fn test_signature_serde_roundtrip() {
        let sig = KeyPair::from_seed(&[7u8; 32]).sign_digest(&Hash::from_bytes(b"x"));
        let json = serde_json::to_string(&sig).unwrap();
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }
}
