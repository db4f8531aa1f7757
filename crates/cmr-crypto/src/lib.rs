//! Cryptographic building blocks for component model resolution.
//!
//! Provides named hash algorithms, an Ed25519 signature handler, and the
//! layered registries that let independent backends and security policies
//! plug in signers, verifiers, hashers, and key material by name.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod error;
pub mod handler;
pub mod hasher;
pub mod keys;
pub mod registry;
pub mod signer;

pub use error::{SigningError, SigningResult};
pub use handler::{SignatureInfo, Signer, SigningHandler, Verifier};
pub use hasher::{Blake3Hasher, HashState, Hasher, Sha256Hasher, Sha512Hasher};
pub use keys::{PrivateKey, PublicKey};
pub use registry::{HandlerRegistry, HasherProvider, KeyRegistry, SigningRegistry};
pub use signer::{Ed25519Handler, Signature, SigningKey, VerifyingKey};
