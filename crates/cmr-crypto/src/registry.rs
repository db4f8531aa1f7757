//! Layered registries for signing handlers, hashers, and key material.
//!
//! Every registry keeps its own local maps and may be layered over a base
//! registry. Lookups check the local map first and read through to the base
//! on a miss, with no caching and no write-back. Lookups never fail: absence
//! is `None`.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;

use crate::error::{SigningError, SigningResult};
use crate::handler::{Signer, SigningHandler, Verifier};
use crate::hasher::{Blake3Hasher, Hasher, Sha256Hasher, Sha512Hasher};
use crate::keys::{PrivateKey, PublicKey};
use crate::signer::Ed25519Handler;

/// Source of named hash algorithms.
pub trait HasherProvider: Send + Sync {
    fn get_hasher(&self, name: &str) -> Option<Arc<dyn Hasher>>;
}

// ---------------------------------------------------------------------------
// HandlerRegistry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Handlers {
    signers: HashMap<String, Arc<dyn Signer>>,
    verifiers: HashMap<String, Arc<dyn Verifier>>,
    hashers: HashMap<String, Arc<dyn Hasher>>,
}

/// Signers, verifiers, and hashers by name.
pub struct HandlerRegistry {
    local: RwLock<Handlers>,
    base: Option<Arc<HandlerRegistry>>,
}

impl HandlerRegistry {
    /// Create an empty, non-layered registry.
    pub fn new() -> Self {
        Self {
            local: RwLock::new(Handlers::default()),
            base: None,
        }
    }

    /// Create an empty registry that reads through to `base`.
    pub fn layered(base: Arc<HandlerRegistry>) -> Self {
        Self {
            local: RwLock::new(Handlers::default()),
            base: Some(base),
        }
    }

    pub fn base(&self) -> Option<&Arc<HandlerRegistry>> {
        self.base.as_ref()
    }

    /// Install `handler` as both signer and verifier for `name`, replacing
    /// any previous entries.
    pub fn register_signature_handler<H: Signer + Verifier + 'static>(&self, name: &str, handler: H) {
        let handler = Arc::new(handler);
        let mut local = self.write();
        local
            .signers
            .insert(name.to_string(), Arc::clone(&handler) as Arc<dyn Signer>);
        local.verifiers.insert(name.to_string(), handler);
        debug!(name, "registered signature handler");
    }

    /// Set the signer for `name`.
    ///
    /// If the handler can also verify and no verifier is registered locally
    /// for `name`, it becomes the verifier too. An existing verifier is never
    /// replaced. Fails if the handler cannot sign.
    pub fn register_signer(&self, name: &str, handler: SigningHandler) -> SigningResult<()> {
        let signer = handler.as_signer().ok_or_else(|| SigningError::CapabilityUnsupported {
            name: name.to_string(),
            capability: "signing".to_string(),
        })?;
        let mut local = self.write();
        local.signers.insert(name.to_string(), signer);
        if let Some(verifier) = handler.as_verifier() {
            if !local.verifiers.contains_key(name) {
                local.verifiers.insert(name.to_string(), verifier);
                debug!(name, "promoted signer to verifier");
            }
        }
        debug!(name, "registered signer");
        Ok(())
    }

    /// Set the verifier for `name`.
    ///
    /// Symmetric to [`HandlerRegistry::register_signer`]: a handler that can
    /// also sign becomes the signer only if none is registered locally.
    pub fn register_verifier(&self, name: &str, handler: SigningHandler) -> SigningResult<()> {
        let verifier = handler.as_verifier().ok_or_else(|| SigningError::CapabilityUnsupported {
            name: name.to_string(),
            capability: "verification".to_string(),
        })?;
        let mut local = self.write();
        local.verifiers.insert(name.to_string(), verifier);
        if let Some(signer) = handler.as_signer() {
            if !local.signers.contains_key(name) {
                local.signers.insert(name.to_string(), signer);
                debug!(name, "promoted verifier to signer");
            }
        }
        debug!(name, "registered verifier");
        Ok(())
    }

    pub fn register_hasher(&self, name: &str, hasher: impl Hasher + 'static) {
        self.write().hashers.insert(name.to_string(), Arc::new(hasher));
        debug!(name, "registered hasher");
    }

    pub fn get_signer(&self, name: &str) -> Option<Arc<dyn Signer>> {
        let local = self.read().signers.get(name).cloned();
        local.or_else(|| self.base.as_ref()?.get_signer(name))
    }

    pub fn get_verifier(&self, name: &str) -> Option<Arc<dyn Verifier>> {
        let local = self.read().verifiers.get(name).cloned();
        local.or_else(|| self.base.as_ref()?.get_verifier(name))
    }

    pub fn get_hasher(&self, name: &str) -> Option<Arc<dyn Hasher>> {
        let local = self.read().hashers.get(name).cloned();
        local.or_else(|| self.base.as_ref()?.get_hasher(name))
    }

    fn read(&self) -> RwLockReadGuard<'_, Handlers> {
        self.local.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Handlers> {
        self.local.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HasherProvider for HandlerRegistry {
    fn get_hasher(&self, name: &str) -> Option<Arc<dyn Hasher>> {
        HandlerRegistry::get_hasher(self, name)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = self.read();
        let mut signers: Vec<&String> = local.signers.keys().collect();
        let mut verifiers: Vec<&String> = local.verifiers.keys().collect();
        let mut hashers: Vec<&String> = local.hashers.keys().collect();
        signers.sort();
        verifiers.sort();
        hashers.sort();
        f.debug_struct("HandlerRegistry")
            .field("signers", &signers)
            .field("verifiers", &verifiers)
            .field("hashers", &hashers)
            .field("layered", &self.base.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// KeyRegistry
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Keys {
    public: HashMap<String, Arc<PublicKey>>,
    private: HashMap<String, Arc<PrivateKey>>,
}

/// Public and private key material by name.
pub struct KeyRegistry {
    local: RwLock<Keys>,
    base: Option<Arc<KeyRegistry>>,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self {
            local: RwLock::new(Keys::default()),
            base: None,
        }
    }

    pub fn layered(base: Arc<KeyRegistry>) -> Self {
        Self {
            local: RwLock::new(Keys::default()),
            base: Some(base),
        }
    }

    pub fn base(&self) -> Option<&Arc<KeyRegistry>> {
        self.base.as_ref()
    }

    pub fn register_public_key(&self, name: &str, key: impl Into<PublicKey>) {
        self.write().public.insert(name.to_string(), Arc::new(key.into()));
        debug!(name, "registered public key");
    }

    pub fn register_private_key(&self, name: &str, key: impl Into<PrivateKey>) {
        self.write().private.insert(name.to_string(), Arc::new(key.into()));
        debug!(name, "registered private key");
    }

    pub fn get_public_key(&self, name: &str) -> Option<Arc<PublicKey>> {
        let local = self.read().public.get(name).cloned();
        local.or_else(|| self.base.as_ref()?.get_public_key(name))
    }

    pub fn get_private_key(&self, name: &str) -> Option<Arc<PrivateKey>> {
        let local = self.read().private.get(name).cloned();
        local.or_else(|| self.base.as_ref()?.get_private_key(name))
    }

    fn read(&self) -> RwLockReadGuard<'_, Keys> {
        self.local.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Keys> {
        self.local.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for KeyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for KeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let local = self.read();
        let mut public: Vec<&String> = local.public.keys().collect();
        let mut private: Vec<&String> = local.private.keys().collect();
        public.sort();
        private.sort();
        f.debug_struct("KeyRegistry")
            .field("public", &public)
            .field("private", &private)
            .field("layered", &self.base.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// SigningRegistry
// ---------------------------------------------------------------------------

/// A handler registry and a key registry, layered independently.
#[derive(Clone, Debug)]
pub struct SigningRegistry {
    handlers: Arc<HandlerRegistry>,
    keys: Arc<KeyRegistry>,
}

impl SigningRegistry {
    /// Empty, non-layered registries.
    pub fn new() -> Self {
        Self::from_parts(Arc::new(HandlerRegistry::new()), Arc::new(KeyRegistry::new()))
    }

    /// Use the given registries directly.
    pub fn from_parts(handlers: Arc<HandlerRegistry>, keys: Arc<KeyRegistry>) -> Self {
        Self { handlers, keys }
    }

    /// Fresh local registries reading through to the given bases.
    pub fn layered(base_handlers: Arc<HandlerRegistry>, base_keys: Arc<KeyRegistry>) -> Self {
        Self::from_parts(
            Arc::new(HandlerRegistry::layered(base_handlers)),
            Arc::new(KeyRegistry::layered(base_keys)),
        )
    }

    /// Fresh local registries reading through to this registry.
    pub fn extend(&self) -> Self {
        Self::layered(Arc::clone(&self.handlers), Arc::clone(&self.keys))
    }

    /// Registries pre-populated with the built-in hashers and the Ed25519
    /// signature handler.
    pub fn with_defaults() -> Self {
        let reg = Self::new();
        reg.register_hasher(Sha256Hasher::ALGORITHM, Sha256Hasher);
        reg.register_hasher(Sha512Hasher::ALGORITHM, Sha512Hasher);
        reg.register_hasher(Blake3Hasher::ALGORITHM, Blake3Hasher);
        reg.register_signature_handler(Ed25519Handler::ALGORITHM, Ed25519Handler);
        reg
    }

    pub fn handlers(&self) -> &Arc<HandlerRegistry> {
        &self.handlers
    }

    pub fn keys(&self) -> &Arc<KeyRegistry> {
        &self.keys
    }

    pub fn register_signature_handler<H: Signer + Verifier + 'static>(&self, name: &str, handler: H) {
        self.handlers.register_signature_handler(name, handler);
    }

    pub fn register_signer(&self, name: &str, handler: SigningHandler) -> SigningResult<()> {
        self.handlers.register_signer(name, handler)
    }

    pub fn register_verifier(&self, name: &str, handler: SigningHandler) -> SigningResult<()> {
        self.handlers.register_verifier(name, handler)
    }

    pub fn register_hasher(&self, name: &str, hasher: impl Hasher + 'static) {
        self.handlers.register_hasher(name, hasher);
    }

    pub fn get_signer(&self, name: &str) -> Option<Arc<dyn Signer>> {
        self.handlers.get_signer(name)
    }

    pub fn get_verifier(&self, name: &str) -> Option<Arc<dyn Verifier>> {
        self.handlers.get_verifier(name)
    }

    pub fn get_hasher(&self, name: &str) -> Option<Arc<dyn Hasher>> {
        self.handlers.get_hasher(name)
    }

    pub fn register_public_key(&self, name: &str, key: impl Into<PublicKey>) {
        self.keys.register_public_key(name, key);
    }

    pub fn register_private_key(&self, name: &str, key: impl Into<PrivateKey>) {
        self.keys.register_private_key(name, key);
    }

    pub fn get_public_key(&self, name: &str) -> Option<Arc<PublicKey>> {
        self.keys.get_public_key(name)
    }

    pub fn get_private_key(&self, name: &str) -> Option<Arc<PrivateKey>> {
        self.keys.get_private_key(name)
    }
}

impl Default for SigningRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HasherProvider for SigningRegistry {
    fn get_hasher(&self, name: &str) -> Option<Arc<dyn Hasher>> {
        self.handlers.get_hasher(name)
    }
}
