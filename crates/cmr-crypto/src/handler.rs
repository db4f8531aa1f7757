use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SigningResult;
use crate::keys::{PrivateKey, PublicKey};

/// A signature over a digest, as stored next to the signed content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureInfo {
    /// Signature algorithm (the handler name it was produced with).
    pub algorithm: String,
    /// Hash algorithm of the signed digest.
    pub hash_algorithm: String,
    /// Hex-encoded signature value.
    pub value: String,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
}

/// Produces signatures over hex-encoded digests.
pub trait Signer: Send + Sync {
    fn algorithm(&self) -> &str;

    fn sign(
        &self,
        digest: &str,
        hash_algorithm: &str,
        issuer: Option<&str>,
        key: &PrivateKey,
    ) -> SigningResult<SignatureInfo>;
}

/// Checks signatures over hex-encoded digests.
pub trait Verifier: Send + Sync {
    fn algorithm(&self) -> &str;

    fn verify(&self, digest: &str, signature: &SignatureInfo, key: &PublicKey) -> SigningResult<()>;
}

/// A registrable signing handler with explicit capabilities.
///
/// Whether a value can sign, verify, or both is decided when the handler is
/// built, not discovered later by probing. Registries check these
/// capabilities at registration time.
#[derive(Clone)]
pub enum SigningHandler {
    Signer(Arc<dyn Signer>),
    Verifier(Arc<dyn Verifier>),
    /// One value that both signs and verifies.
    Both {
        signer: Arc<dyn Signer>,
        verifier: Arc<dyn Verifier>,
    },
}

impl SigningHandler {
    pub fn signer(signer: impl Signer + 'static) -> Self {
        Self::Signer(Arc::new(signer))
    }

    pub fn verifier(verifier: impl Verifier + 'static) -> Self {
        Self::Verifier(Arc::new(verifier))
    }

    /// Wrap a value implementing both capabilities; both entries share it.
    pub fn both<H: Signer + Verifier + 'static>(handler: H) -> Self {
        let handler = Arc::new(handler);
        Self::Both {
            signer: Arc::clone(&handler) as Arc<dyn Signer>,
            verifier: handler,
        }
    }

    pub fn as_signer(&self) -> Option<Arc<dyn Signer>> {
        match self {
            Self::Signer(s) | Self::Both { signer: s, .. } => Some(Arc::clone(s)),
            Self::Verifier(_) => None,
        }
    }

    pub fn as_verifier(&self) -> Option<Arc<dyn Verifier>> {
        match self {
            Self::Verifier(v) | Self::Both { verifier: v, .. } => Some(Arc::clone(v)),
            Self::Signer(_) => None,
        }
    }

    pub fn can_sign(&self) -> bool {
        !matches!(self, Self::Verifier(_))
    }

    pub fn can_verify(&self) -> bool {
        !matches!(self, Self::Signer(_))
    }
}

impl fmt::Debug for SigningHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signer(s) => write!(f, "SigningHandler::Signer({})", s.algorithm()),
            Self::Verifier(v) => write!(f, "SigningHandler::Verifier({})", v.algorithm()),
            Self::Both { signer, .. } => write!(f, "SigningHandler::Both({})", signer.algorithm()),
        }
    }
}
