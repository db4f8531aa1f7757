use std::sync::{Arc, OnceLock};

use cmr_crypto::{Hasher, SigningRegistry};
use cmr_runtime::{Scheme, SpecSource, Unmarshaler, DEFAULT_ENCODING};
use cmr_types::DigestDescriptor;

use crate::compose::ComposeSpec;
use crate::config::ContextConfig;
use crate::digest::{DigesterRegistry, GenericBlobDigester};
use crate::error::AccessResult;
use crate::method::AccessMethod;
use crate::spec::{new_access_type_scheme, AccessSpec, AccessTypeScheme};

/// The registries and settings access resolution runs against.
///
/// Cloning is cheap and clones share registries. Every component that needs
/// a registry takes it from an explicit context.
#[derive(Clone, Debug)]
pub struct Context {
    config: Arc<ContextConfig>,
    access_types: Arc<AccessTypeScheme>,
    digesters: Arc<DigesterRegistry>,
    signing: SigningRegistry,
}

impl Context {
    /// A context with fresh registries holding the built-in entries: the
    /// compose access kinds, a default generic digester using the configured
    /// hash algorithm, and the default hashers and signature handlers.
    pub fn new(config: ContextConfig) -> Self {
        let access_types = new_access_type_scheme();
        ComposeSpec::register(&access_types);

        let digesters = DigesterRegistry::new();
        digesters.register(
            Arc::new(GenericBlobDigester::new(&config.default_hash_algorithm)),
            &[],
        );

        Self {
            config: Arc::new(config),
            access_types: Arc::new(access_types),
            digesters: Arc::new(digesters),
            signing: SigningRegistry::with_defaults(),
        }
    }

    pub fn with_access_types(mut self, access_types: Arc<AccessTypeScheme>) -> Self {
        self.access_types = access_types;
        self
    }

    pub fn with_digesters(mut self, digesters: Arc<DigesterRegistry>) -> Self {
        self.digesters = digesters;
        self
    }

    pub fn with_signing(mut self, signing: SigningRegistry) -> Self {
        self.signing = signing;
        self
    }

    /// A child context whose registries are layered over this one's.
    /// Registrations on the child are invisible to the parent.
    pub fn extend(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            access_types: Arc::new(Scheme::layered(Arc::clone(&self.access_types))),
            digesters: Arc::new(DigesterRegistry::layered(Arc::clone(&self.digesters))),
            signing: self.signing.extend(),
        }
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn access_types(&self) -> &Arc<AccessTypeScheme> {
        &self.access_types
    }

    pub fn digesters(&self) -> &Arc<DigesterRegistry> {
        &self.digesters
    }

    pub fn signing(&self) -> &SigningRegistry {
        &self.signing
    }

    /// Decode a JSON access spec envelope.
    pub fn decode_access_spec(&self, data: &[u8]) -> AccessResult<Arc<dyn AccessSpec>> {
        self.decode_access_spec_with(data, &DEFAULT_ENCODING)
    }

    pub fn decode_access_spec_with(
        &self,
        data: &[u8],
        unmarshaler: &dyn Unmarshaler,
    ) -> AccessResult<Arc<dyn AccessSpec>> {
        Ok(self.access_types.decode(data, unmarshaler)?)
    }

    /// Turn a typed or generic spec into a typed one.
    pub fn create_access_spec(
        &self,
        source: impl Into<SpecSource<dyn AccessSpec>>,
    ) -> AccessResult<Arc<dyn AccessSpec>> {
        Ok(self.access_types.create_spec(source)?)
    }

    /// The hasher named by the configured default hash algorithm.
    pub fn default_hasher(&self) -> Option<Arc<dyn Hasher>> {
        self.signing.get_hasher(&self.config.default_hash_algorithm)
    }

    /// Digest the content behind `method` with the digesters registered for
    /// `resource_type`, preferring the default hasher.
    pub fn determine_digests(
        &self,
        resource_type: &str,
        method: &dyn AccessMethod,
    ) -> AccessResult<Vec<DigestDescriptor>> {
        self.digesters
            .determine_digests(resource_type, self.default_hasher(), &self.signing, method)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(ContextConfig::default())
    }
}

/// Process-wide default context for top-level callers.
pub fn default_context() -> &'static Context {
    static DEFAULT: OnceLock<Context> = OnceLock::new();
    DEFAULT.get_or_init(Context::default)
}
