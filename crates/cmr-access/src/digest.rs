use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cmr_crypto::{Hasher, HasherProvider, SigningError};
use cmr_types::{DigestDescriptor, DigesterType};
use tracing::debug;

use crate::error::{AccessError, AccessResult};
use crate::method::AccessMethod;

/// Reserved resource type holding the digesters consulted when a resource
/// type has none of its own.
pub const DEFAULT_RESOURCE_TYPE: &str = "";

/// Normalisation reported by [`GenericBlobDigester`].
pub const GENERIC_BLOB_DIGEST_V1: &str = "genericBlobDigest/v1";

/// Computes a digest of one (hash, normalisation) variant.
pub trait BlobDigester: Send + Sync {
    fn digester_type(&self) -> DigesterType;

    /// `preferred` is the hasher to use, if the caller or the registry
    /// could supply one.
    fn determine_digest(
        &self,
        resource_type: &str,
        method: &dyn AccessMethod,
        preferred: Option<&dyn Hasher>,
    ) -> AccessResult<DigestDescriptor>;
}

type Digesters = HashMap<String, Vec<Arc<dyn BlobDigester>>>;

/// Ordered digesters per resource type, optionally layered over a base.
///
/// Lookups return local entries followed by base entries.
pub struct DigesterRegistry {
    local: RwLock<Digesters>,
    base: Option<Arc<DigesterRegistry>>,
}

impl DigesterRegistry {
    pub fn new() -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            base: None,
        }
    }

    pub fn layered(base: Arc<DigesterRegistry>) -> Self {
        Self {
            local: RwLock::new(HashMap::new()),
            base: Some(base),
        }
    }

    pub fn base(&self) -> Option<&Arc<DigesterRegistry>> {
        self.base.as_ref()
    }

    /// Append `digester` to each of `resource_types`. An empty list
    /// registers it as a default digester.
    pub fn register(&self, digester: Arc<dyn BlobDigester>, resource_types: &[&str]) {
        let types: &[&str] = if resource_types.is_empty() {
            &[DEFAULT_RESOURCE_TYPE]
        } else {
            resource_types
        };
        let digester_type = digester.digester_type();
        let mut local = self.write();
        for resource_type in types {
            local
                .entry(resource_type.to_string())
                .or_default()
                .push(Arc::clone(&digester));
            debug!(resource_type, digester = %digester_type, "registered digester");
        }
    }

    /// Digesters registered for exactly `resource_type`, local then base.
    pub fn get_digesters_for_type(&self, resource_type: &str) -> Vec<Arc<dyn BlobDigester>> {
        let mut found = self.read().get(resource_type).cloned().unwrap_or_default();
        if let Some(base) = &self.base {
            found.extend(base.get_digesters_for_type(resource_type));
        }
        found
    }

    /// Digesters tried for `resource_type`: its own, or the defaults if it
    /// has none.
    pub fn candidates(&self, resource_type: &str) -> Vec<Arc<dyn BlobDigester>> {
        let found = self.get_digesters_for_type(resource_type);
        if found.is_empty() {
            self.get_digesters_for_type(DEFAULT_RESOURCE_TYPE)
        } else {
            found
        }
    }

    /// Resource types with at least one digester, locally or in a base.
    pub fn known_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.read().keys().cloned().collect();
        if let Some(base) = &self.base {
            types.extend(base.known_types());
        }
        types.sort();
        types.dedup();
        types
    }

    /// Snapshot the merged view into an independent, non-layered registry.
    pub fn copy(&self) -> DigesterRegistry {
        let merged: Digesters = self
            .known_types()
            .into_iter()
            .map(|t| {
                let digesters = self.get_digesters_for_type(&t);
                (t, digesters)
            })
            .collect();
        Self {
            local: RwLock::new(merged),
            base: None,
        }
    }

    /// Run the candidates for `resource_type` in order and return the
    /// descriptor of the first that succeeds.
    ///
    /// Each digester gets `preferred` when it implements the digester's hash
    /// algorithm, else the hasher `hashers` knows under that algorithm.
    pub fn determine_digests(
        &self,
        resource_type: &str,
        preferred: Option<Arc<dyn Hasher>>,
        hashers: &dyn HasherProvider,
        method: &dyn AccessMethod,
    ) -> AccessResult<Vec<DigestDescriptor>> {
        for digester in self.candidates(resource_type) {
            let digester_type = digester.digester_type();
            let hasher = preferred
                .clone()
                .filter(|h| h.algorithm() == digester_type.hash_algorithm)
                .or_else(|| hashers.get_hasher(&digester_type.hash_algorithm));
            match digester.determine_digest(resource_type, method, hasher.as_deref()) {
                Ok(descriptor) => return Ok(vec![descriptor]),
                Err(err) => {
                    debug!(resource_type, digester = %digester_type, error = %err, "digester failed");
                }
            }
        }
        Err(AccessError::NoDigester {
            resource_type: resource_type.to_string(),
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, Digesters> {
        self.local.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Digesters> {
        self.local.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for DigesterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DigesterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DigesterRegistry")
            .field("known_types", &self.known_types())
            .field("layered", &self.base.is_some())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// GenericBlobDigester
// ---------------------------------------------------------------------------

/// Hashes the complete blob content.
#[derive(Clone, Debug)]
pub struct GenericBlobDigester {
    hash_algorithm: String,
}

impl GenericBlobDigester {
    pub fn new(hash_algorithm: impl Into<String>) -> Self {
        Self {
            hash_algorithm: hash_algorithm.into(),
        }
    }
}

impl BlobDigester for GenericBlobDigester {
    fn digester_type(&self) -> DigesterType {
        DigesterType::new(&self.hash_algorithm, GENERIC_BLOB_DIGEST_V1)
    }

    fn determine_digest(
        &self,
        _resource_type: &str,
        method: &dyn AccessMethod,
        preferred: Option<&dyn Hasher>,
    ) -> AccessResult<DigestDescriptor> {
        let hasher = preferred
            .filter(|h| h.algorithm() == self.hash_algorithm)
            .ok_or_else(|| SigningError::UnknownAlgorithm(self.hash_algorithm.clone()))?;
        let mut reader = method.reader()?;
        let value = hasher.digest_reader(&mut reader)?;
        Ok(DigestDescriptor::new(
            hasher.algorithm(),
            GENERIC_BLOB_DIGEST_V1,
            value,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cmr_blob::{BlobAccess, MIME_TEXT};
    use cmr_crypto::{Sha256Hasher, Sha512Hasher, SigningRegistry};

    use crate::compose::ComposeSpec;
    use crate::method::BlobMethod;
    use crate::spec::AccessSpec;

    struct Fixed {
        name: &'static str,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl BlobDigester for Fixed {
        fn digester_type(&self) -> DigesterType {
            DigesterType::new("SHA-256", self.name)
        }

        fn determine_digest(
            &self,
            _resource_type: &str,
            _method: &dyn AccessMethod,
            _preferred: Option<&dyn Hasher>,
        ) -> AccessResult<DigestDescriptor> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(DigestDescriptor::new("SHA-256", self.name, "D"))
        }
    }

    struct Failing;

    impl BlobDigester for Failing {
        fn digester_type(&self) -> DigesterType {
            DigesterType::new("SHA-256", "failing")
        }

        fn determine_digest(
            &self,
            resource_type: &str,
            _method: &dyn AccessMethod,
            _preferred: Option<&dyn Hasher>,
        ) -> AccessResult<DigestDescriptor> {
            Err(AccessError::NoDigester {
                resource_type: resource_type.to_string(),
            })
        }
    }

    fn names(digesters: &[Arc<dyn BlobDigester>]) -> Vec<String> {
        digesters
            .iter()
            .map(|d| d.digester_type().normalization_algorithm)
            .collect()
    }

    fn text_method(content: &str) -> BlobMethod {
        let spec: Arc<dyn AccessSpec> = Arc::new(ComposeSpec::new("", MIME_TEXT, None));
        BlobMethod::new(spec, MIME_TEXT, BlobAccess::for_string(MIME_TEXT, content), true).unwrap()
    }

    #[test]
    fn single_digester_result_is_returned() {
        let reg = DigesterRegistry::new();
        reg.register(Fixed::new("n"), &["t"]);
        let method = text_method("x");
        let hashers = SigningRegistry::with_defaults();

        let digests = reg.determine_digests("t", None, &hashers, &method).unwrap();
        assert_eq!(digests, vec![DigestDescriptor::new("SHA-256", "n", "D")]);
    }

    #[test]
    fn unregistered_type_without_default_fails() {
        let reg = DigesterRegistry::new();
        reg.register(Fixed::new("n"), &["t"]);
        let method = text_method("x");
        let err = reg
            .determine_digests("other", None, &SigningRegistry::new(), &method)
            .unwrap_err();
        assert!(matches!(err, AccessError::NoDigester { ref resource_type } if resource_type == "other"));
    }

    #[test]
    fn first_success_wins_after_failures() {
        let reg = DigesterRegistry::new();
        let second = Fixed::new("second");
        let third = Fixed::new("third");
        reg.register(Arc::new(Failing), &["t"]);
        reg.register(second.clone(), &["t"]);
        reg.register(third.clone(), &["t"]);

        let method = text_method("x");
        let digests = reg
            .determine_digests("t", None, &SigningRegistry::new(), &method)
            .unwrap();
        assert_eq!(digests[0].normalisation_algorithm, "second");
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
        assert_eq!(third.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_failing_is_no_digester() {
        let reg = DigesterRegistry::new();
        reg.register(Arc::new(Failing), &[]);
        let method = text_method("x");
        assert!(matches!(
            reg.determine_digests("t", None, &SigningRegistry::new(), &method),
            Err(AccessError::NoDigester { .. })
        ));
    }

    #[test]
    fn default_digesters_apply_only_without_specific_ones() {
        let reg = DigesterRegistry::new();
        reg.register(Fixed::new("default"), &[]);
        reg.register(Fixed::new("specific"), &["t"]);
        assert_eq!(names(&reg.candidates("t")), vec!["specific"]);
        assert_eq!(names(&reg.candidates("u")), vec!["default"]);
    }

    #[test]
    fn layered_lookup_is_local_then_base() {
        let base = Arc::new(DigesterRegistry::new());
        base.register(Fixed::new("base"), &["t", "b"]);
        let ext = DigesterRegistry::layered(Arc::clone(&base));
        ext.register(Fixed::new("local"), &["t", "e"]);

        assert_eq!(names(&ext.get_digesters_for_type("t")), vec!["local", "base"]);
        assert_eq!(names(&ext.get_digesters_for_type("b")), vec!["base"]);
        assert_eq!(names(&ext.get_digesters_for_type("e")), vec!["local"]);
        assert!(base.get_digesters_for_type("e").is_empty());
        assert_eq!(ext.known_types(), vec!["b", "e", "t"]);
    }

    #[test]
    fn copy_is_an_independent_snapshot() {
        let base = Arc::new(DigesterRegistry::new());
        base.register(Fixed::new("base"), &["t"]);
        let ext = DigesterRegistry::layered(Arc::clone(&base));
        ext.register(Fixed::new("local"), &["t"]);

        let copy = ext.copy();
        assert!(copy.base().is_none());
        assert_eq!(names(&copy.get_digesters_for_type("t")), vec!["local", "base"]);

        base.register(Fixed::new("late-base"), &["t"]);
        ext.register(Fixed::new("late-local"), &["t"]);
        assert_eq!(names(&copy.get_digesters_for_type("t")), vec!["local", "base"]);

        copy.register(Fixed::new("copy-only"), &["t", "c"]);
        assert_eq!(
            names(&copy.get_digesters_for_type("t")),
            vec!["local", "base", "copy-only"]
        );
        assert_eq!(
            names(&ext.get_digesters_for_type("t")),
            vec!["local", "late-local", "base", "late-base"]
        );
        assert!(ext.get_digesters_for_type("c").is_empty());
        assert!(base.get_digesters_for_type("c").is_empty());
    }

    #[test]
    fn generic_digester_hashes_content() {
        let method = text_method("abc");
        let sha256 = GenericBlobDigester::new(Sha256Hasher::ALGORITHM);

        let d = sha256
            .determine_digest("blob", &method, Some(&Sha256Hasher))
            .unwrap();
        assert_eq!(d.hash_algorithm, "SHA-256");
        assert_eq!(d.normalisation_algorithm, GENERIC_BLOB_DIGEST_V1);
        assert_eq!(
            d.value,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );

        assert!(matches!(
            sha256.determine_digest("blob", &method, None),
            Err(AccessError::Signing(SigningError::UnknownAlgorithm(_)))
        ));
    }

    #[test]
    fn generic_digester_rejects_other_algorithms() {
        let method = text_method("abc");
        let sha256 = GenericBlobDigester::new(Sha256Hasher::ALGORITHM);
        let err = sha256
            .determine_digest("blob", &method, Some(&Sha512Hasher))
            .unwrap_err();
        assert!(matches!(
            err,
            AccessError::Signing(SigningError::UnknownAlgorithm(ref a)) if a == "SHA-256"
        ));
    }

    #[test]
    fn registry_supplies_hashers_by_name() {
        let reg = DigesterRegistry::new();
        reg.register(Arc::new(GenericBlobDigester::new(Sha512Hasher::ALGORITHM)), &[]);
        let method = text_method("abc");
        let hashers = SigningRegistry::with_defaults();

        let d = reg.determine_digests("blob", None, &hashers, &method).unwrap();
        assert_eq!(d[0].hash_algorithm, "SHA-512");
        assert_eq!(d[0].value, Sha512Hasher.digest(b"abc"));

        let preferred: Arc<dyn Hasher> = Arc::new(Sha256Hasher);
        let d = reg
            .determine_digests("blob", Some(preferred), &hashers, &method)
            .unwrap();
        assert_eq!(d[0].hash_algorithm, "SHA-512");
        assert_eq!(d[0].value, Sha512Hasher.digest(b"abc"));
    }

    #[test]
    fn matching_preferred_hasher_is_used() {
        let reg = DigesterRegistry::new();
        reg.register(Arc::new(GenericBlobDigester::new(Sha256Hasher::ALGORITHM)), &[]);
        let method = text_method("abc");

        // No hasher is registered by name, so only the preferred one can serve.
        let preferred: Arc<dyn Hasher> = Arc::new(Sha256Hasher);
        let d = reg
            .determine_digests("blob", Some(preferred), &SigningRegistry::new(), &method)
            .unwrap();
        assert_eq!(d[0].hash_algorithm, "SHA-256");
        assert_eq!(d[0].value, Sha256Hasher.digest(b"abc"));
    }
}
