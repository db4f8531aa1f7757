use std::fmt;

use crate::signer::{SigningKey, VerifyingKey};

/// Public key material held by a [`KeyRegistry`](crate::KeyRegistry).
#[derive(Clone, PartialEq, Eq)]
pub enum PublicKey {
    Ed25519(VerifyingKey),
    /// Opaque material for algorithms this crate does not implement.
    Raw(Vec<u8>),
}

/// Private key material held by a [`KeyRegistry`](crate::KeyRegistry).
pub enum PrivateKey {
    Ed25519(SigningKey),
    /// Opaque material for algorithms this crate does not implement.
    Raw(Vec<u8>),
}

impl PrivateKey {
    /// The public half, where it can be derived.
    pub fn public_key(&self) -> Option<PublicKey> {
        match self {
            Self::Ed25519(sk) => Some(PublicKey::Ed25519(sk.verifying_key())),
            Self::Raw(_) => None,
        }
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519(vk) => write!(f, "PublicKey::Ed25519({})", hex::encode(vk.to_bytes())),
            Self::Raw(b) => write!(f, "PublicKey::Raw({} bytes)", b.len()),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ed25519(_) => write!(f, "PrivateKey::Ed25519(<redacted>)"),
            Self::Raw(_) => write!(f, "PrivateKey::Raw(<redacted>)"),
        }
    }
}

impl From<VerifyingKey> for PublicKey {
    fn from(key: VerifyingKey) -> Self {
        Self::Ed25519(key)
    }
}

impl From<SigningKey> for PrivateKey {
    fn from(key: SigningKey) -> Self {
        Self::Ed25519(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_derives_public() {
        let sk = SigningKey::generate();
        let vk = sk.verifying_key();
        let private = PrivateKey::from(sk);
        assert_eq!(private.public_key(), Some(PublicKey::Ed25519(vk)));
        assert_eq!(PrivateKey::Raw(vec![1]).public_key(), None);
    }

    #[test]
    fn debug_redacts_private_material() {
        let private = PrivateKey::from(SigningKey::generate());
        assert!(format!("{private:?}").contains("redacted"));
        assert!(format!("{:?}", PrivateKey::Raw(vec![1, 2])).contains("redacted"));
    }
}
