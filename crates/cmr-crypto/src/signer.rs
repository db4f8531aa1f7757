use std::fmt;

use ed25519_dalek::{Signer as _, Verifier as _};

use crate::error::{SigningError, SigningResult};
use crate::handler::{SignatureInfo, Signer, Verifier};
use crate::keys::{PrivateKey, PublicKey};

/// Private half of an Ed25519 key pair.
pub struct SigningKey(ed25519_dalek::SigningKey);

/// Public half of an Ed25519 key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct VerifyingKey(ed25519_dalek::VerifyingKey);

/// A raw Ed25519 signature value.
#[derive(Clone, PartialEq, Eq)]
pub struct Signature(ed25519_dalek::Signature);

impl SigningKey {
    /// A fresh key from the thread-local CSPRNG.
    pub fn generate() -> Self {
        Self(ed25519_dalek::SigningKey::generate(&mut rand::thread_rng()))
    }

    pub fn from_bytes(secret: [u8; 32]) -> Self {
        Self(ed25519_dalek::SigningKey::from_bytes(&secret))
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }

    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }
}

impl VerifyingKey {
    pub fn from_bytes(public: [u8; 32]) -> SigningResult<Self> {
        ed25519_dalek::VerifyingKey::from_bytes(&public)
            .map(Self)
            .map_err(|_| SigningError::InvalidKey)
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    pub fn verify(&self, message: &[u8], signature: &Signature) -> SigningResult<()> {
        self.0
            .verify(message, &signature.0)
            .map_err(|_| SigningError::InvalidSignature)
    }
}

impl Signature {
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }

    /// Parse a signature; fails unless `raw` is exactly 64 bytes.
    pub fn from_slice(raw: &[u8]) -> SigningResult<Self> {
        ed25519_dalek::Signature::from_slice(raw)
            .map(Self)
            .map_err(|_| SigningError::InvalidSignature)
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(..)")
    }
}

impl fmt::Debug for VerifyingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("VerifyingKey").field(&hex::encode(self.to_bytes())).finish()
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signature").field(&hex::encode(self.to_bytes())).finish()
    }
}

// ---------------------------------------------------------------------------
// Ed25519Handler
// ---------------------------------------------------------------------------

/// Signature handler for Ed25519 over hex-encoded digests.
///
/// The signed message is the raw digest (the hex string decoded), so the
/// signature is independent of the digest's textual case.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ed25519Handler;

impl Ed25519Handler {
    pub const ALGORITHM: &'static str = "ed25519";
    pub const MEDIA_TYPE: &'static str = "application/vnd.cmr.signature.ed25519";
}

fn digest_bytes(digest: &str) -> SigningResult<Vec<u8>> {
    hex::decode(digest).map_err(|e| SigningError::InvalidDigest(e.to_string()))
}

impl Signer for Ed25519Handler {
    fn algorithm(&self) -> &str {
        Self::ALGORITHM
    }

    fn sign(
        &self,
        digest: &str,
        hash_algorithm: &str,
        issuer: Option<&str>,
        key: &PrivateKey,
    ) -> SigningResult<SignatureInfo> {
        let PrivateKey::Ed25519(sk) = key else {
            return Err(SigningError::KeyTypeMismatch {
                expected: Self::ALGORITHM.to_string(),
            });
        };
        let signature = sk.sign(&digest_bytes(digest)?);
        Ok(SignatureInfo {
            algorithm: Self::ALGORITHM.to_string(),
            hash_algorithm: hash_algorithm.to_string(),
            value: hex::encode(signature.to_bytes()),
            media_type: Self::MEDIA_TYPE.to_string(),
            issuer: issuer.map(str::to_string),
        })
    }
}

impl Verifier for Ed25519Handler {
    fn algorithm(&self) -> &str {
        Self::ALGORITHM
    }

    fn verify(&self, digest: &str, signature: &SignatureInfo, key: &PublicKey) -> SigningResult<()> {
        let PublicKey::Ed25519(vk) = key else {
            return Err(SigningError::KeyTypeMismatch {
                expected: Self::ALGORITHM.to_string(),
            });
        };
        if signature.algorithm != Self::ALGORITHM {
            return Err(SigningError::UnknownAlgorithm(signature.algorithm.clone()));
        }
        let raw = hex::decode(&signature.value).map_err(|_| SigningError::InvalidSignature)?;
        vk.verify(&digest_bytes(digest)?, &Signature::from_slice(&raw)?)
    }
}
