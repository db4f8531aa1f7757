//! In-memory component version for testing and staging.
//!
//! [`InMemoryComponentVersion`] keeps resource blobs in memory under compose
//! specs and resolves those specs back to their blobs. Content is released
//! when the version is dropped.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use cmr_blob::BlobAccess;
use cmr_crypto::{SignatureInfo, SigningError};
use cmr_types::DigestDescriptor;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::compose::{as_compose, ComposeSpec};
use crate::context::Context;
use crate::cv::ComponentVersionAccess;
use crate::error::{AccessError, AccessResult};
use crate::method::AccessMethod;
use crate::spec::{AccessSpec, AccessSpecExt};
use crate::spec_ref::AccessSpecRef;

/// Identity of a resource within a component version.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMeta {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ResourceMeta {
    pub fn new(name: impl Into<String>, resource_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            version: None,
        }
    }
}

/// A resource entry: its identity, where its bytes live, and their digest.
#[derive(Clone, Debug)]
pub struct Resource {
    meta: ResourceMeta,
    access: Arc<dyn AccessSpec>,
    digest: Option<DigestDescriptor>,
}

impl Resource {
    pub fn meta(&self) -> &ResourceMeta {
        &self.meta
    }

    pub fn access(&self) -> &Arc<dyn AccessSpec> {
        &self.access
    }

    pub fn digest(&self) -> Option<&DigestDescriptor> {
        self.digest.as_ref()
    }

    /// Resolve the resource's access spec against `cv`.
    pub fn access_method(&self, cv: &dyn ComponentVersionAccess) -> AccessResult<Box<dyn AccessMethod>> {
        self.access.access_method(cv)
    }
}

/// A component version held entirely in memory.
pub struct InMemoryComponentVersion {
    ctx: Context,
    name: String,
    version: String,
    blobs: RwLock<HashMap<String, BlobAccess>>,
    resources: RwLock<Vec<Resource>>,
}

impl InMemoryComponentVersion {
    /// Create an empty version of component `name`.
    pub fn new_version(ctx: Context, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            ctx,
            name: name.into(),
            version: version.into(),
            blobs: RwLock::new(HashMap::new()),
            resources: RwLock::new(Vec::new()),
        }
    }

    /// Stage `blob` as the content of resource `meta`.
    ///
    /// The blob is kept under a fresh compose spec (the version holds its
    /// own duplicate of the handle) and digested through the context's
    /// digest registry. A resource with the same name is replaced and its
    /// content released. Returns the new access spec.
    pub fn set_resource_blob(
        &self,
        meta: ResourceMeta,
        blob: &BlobAccess,
        hint: &str,
        global: Option<AccessSpecRef>,
    ) -> AccessResult<Arc<dyn AccessSpec>> {
        if !self.ctx.config().composition_mode {
            return Err(AccessError::Config(
                "in-memory component versions require composition mode".to_string(),
            ));
        }
        let compose = ComposeSpec::new(hint, blob.mime_type(), global);
        let id = compose.id.clone();
        let spec: Arc<dyn AccessSpec> = Arc::new(compose);

        let method = ComposeSpec::new_method(Arc::clone(&spec), blob)?;
        let digests = self.ctx.determine_digests(&meta.resource_type, &method);
        method.close()?;
        let digest = digests?.into_iter().next();

        self.write_blobs().insert(id.clone(), blob.dup()?);
        debug!(
            component = %self.name,
            version = %self.version,
            resource = %meta.name,
            id = %id,
            "staged resource blob"
        );

        let resource = Resource {
            meta,
            access: Arc::clone(&spec),
            digest,
        };
        let replaced = {
            let mut resources = self.write_resources();
            match resources.iter().position(|r| r.meta.name == resource.meta.name) {
                Some(pos) => Some(std::mem::replace(&mut resources[pos], resource)),
                None => {
                    resources.push(resource);
                    None
                }
            }
        };
        if let Some(old) = replaced {
            if let Some(old_compose) = as_compose(&*old.access) {
                let removed = self.write_blobs().remove(&old_compose.id);
                if let Some(old_blob) = removed {
                    if let Err(err) = old_blob.close() {
                        warn!(
                            component = %self.name,
                            id = %old_compose.id,
                            error = %err,
                            "release of replaced resource blob failed"
                        );
                    }
                }
            }
        }
        Ok(spec)
    }

    /// The resource named `name`.
    pub fn get_resource(&self, name: &str) -> AccessResult<Resource> {
        self.read_resources()
            .iter()
            .find(|r| r.meta.name == name)
            .cloned()
            .ok_or_else(|| AccessError::not_found("resource", name))
    }

    pub fn resources(&self) -> Vec<Resource> {
        self.read_resources().clone()
    }

    /// Sign the digest of resource `name` with private key `key_name`, using
    /// the context's default signing algorithm.
    pub fn sign_resource(&self, name: &str, key_name: &str) -> AccessResult<SignatureInfo> {
        let digest = self.resource_digest(name)?;
        let signing = self.ctx.signing();
        let algorithm = &self.ctx.config().default_signing_algorithm;
        let signer = signing
            .get_signer(algorithm)
            .ok_or_else(|| SigningError::UnknownAlgorithm(algorithm.clone()))?;
        let key = signing
            .get_private_key(key_name)
            .ok_or_else(|| AccessError::not_found("private key", key_name))?;
        Ok(signer.sign(&digest.value, &digest.hash_algorithm, Some(key_name), &key)?)
    }

    /// Check `signature` over the digest of resource `name` against public
    /// key `key_name`.
    pub fn verify_resource(
        &self,
        name: &str,
        key_name: &str,
        signature: &SignatureInfo,
    ) -> AccessResult<()> {
        let digest = self.resource_digest(name)?;
        let signing = self.ctx.signing();
        let verifier = signing
            .get_verifier(&signature.algorithm)
            .ok_or_else(|| SigningError::UnknownAlgorithm(signature.algorithm.clone()))?;
        let key = signing
            .get_public_key(key_name)
            .ok_or_else(|| AccessError::not_found("public key", key_name))?;
        Ok(verifier.verify(&digest.value, signature, &key)?)
    }

    fn resource_digest(&self, name: &str) -> AccessResult<DigestDescriptor> {
        self.get_resource(name)?
            .digest
            .ok_or_else(|| AccessError::not_found("digest of resource", name))
    }

    fn read_blobs(&self) -> RwLockReadGuard<'_, HashMap<String, BlobAccess>> {
        self.blobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_blobs(&self) -> RwLockWriteGuard<'_, HashMap<String, BlobAccess>> {
        self.blobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_resources(&self) -> RwLockReadGuard<'_, Vec<Resource>> {
        self.resources.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_resources(&self) -> RwLockWriteGuard<'_, Vec<Resource>> {
        self.resources.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ComponentVersionAccess for InMemoryComponentVersion {
    fn context(&self) -> &Context {
        &self.ctx
    }

    fn component_name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn access_method(&self, spec: Arc<dyn AccessSpec>) -> AccessResult<Box<dyn AccessMethod>> {
        if let Some(unknown) = spec.as_unknown() {
            return Err(unknown.unsupported().into());
        }
        let Some(compose) = as_compose(&*spec) else {
            return Err(AccessError::capability(spec.kind(), "in-memory access"));
        };
        let blobs = self.read_blobs();
        let blob = blobs
            .get(&compose.id)
            .ok_or_else(|| AccessError::not_found("compose blob", &compose.id))?;
        let method = ComposeSpec::new_method(Arc::clone(&spec), blob)?;
        Ok(Box::new(method))
    }
}

impl fmt::Debug for InMemoryComponentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryComponentVersion")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("resources", &self.read_resources().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmr_blob::{BlobError, BlobResult, BlobSource, MIME_JSON, MIME_TEXT};
    use cmr_crypto::{Hasher, Sha256Hasher, SigningKey};
    use cmr_types::resource_types;

    use crate::config::ContextConfig;
    use crate::digest::GENERIC_BLOB_DIGEST_V1;

    fn version() -> InMemoryComponentVersion {
        InMemoryComponentVersion::new_version(Context::default(), "acme.org/demo", "1.0.0")
    }

    struct FailingRelease;

    impl BlobSource for FailingRelease {
        fn reader(&self) -> BlobResult<Box<dyn std::io::Read + Send>> {
            Ok(Box::new(std::io::Cursor::new(b"old".to_vec())))
        }

        fn release(&self) -> BlobResult<()> {
            Err(BlobError::open("backend gone"))
        }
    }

    #[test]
    fn replacement_succeeds_when_old_release_fails() {
        let cv = version();
        let old = BlobAccess::for_source(MIME_TEXT, FailingRelease);
        cv.set_resource_blob(ResourceMeta::new("r", resource_types::PLAIN_TEXT), &old, "", None)
            .unwrap();
        // Leave the version as the only owner of the old content.
        drop(old);

        let new = BlobAccess::for_string(MIME_TEXT, "new");
        let spec = cv
            .set_resource_blob(ResourceMeta::new("r", resource_types::PLAIN_TEXT), &new, "", None)
            .unwrap();
        assert_eq!(cv.resources().len(), 1);
        let method = spec.access_method(&cv).unwrap();
        assert_eq!(&method.get().unwrap()[..], b"new");
    }

    #[test]
    fn staged_blob_resolves_through_its_spec() {
        let cv = version();
        let blob = BlobAccess::for_string(MIME_TEXT, "hello");
        let spec = cv
            .set_resource_blob(ResourceMeta::new("text", resource_types::PLAIN_TEXT), &blob, "", None)
            .unwrap();
        blob.close().unwrap();

        let res = cv.get_resource("text").unwrap();
        assert_eq!(res.access().kind(), "compose");
        let digest = res.digest().unwrap();
        assert_eq!(digest.hash_algorithm, "SHA-256");
        assert_eq!(digest.normalisation_algorithm, GENERIC_BLOB_DIGEST_V1);
        assert_eq!(digest.value, Sha256Hasher.digest(b"hello"));

        let method = spec.access_method(&cv).unwrap();
        assert_eq!(&method.get().unwrap()[..], b"hello");
        assert_eq!(
            spec.inexpensive_content_version_identity(&cv),
            as_compose(&*spec).unwrap().id
        );
        method.close().unwrap();

        let again = res.access_method(&cv).unwrap();
        assert_eq!(&again.get().unwrap()[..], b"hello");
    }

    #[test]
    fn decoded_spec_with_wrong_media_type_is_a_mismatch() {
        let cv = version();
        let blob = BlobAccess::for_string(MIME_TEXT, "hello");
        let spec = cv
            .set_resource_blob(ResourceMeta::new("text", resource_types::BLOB), &blob, "", None)
            .unwrap();
        let id = as_compose(&*spec).unwrap().id.clone();

        let data = format!(r#"{{"type":"compose/v1","id":"{id}","mediaType":"{MIME_JSON}"}}"#);
        let forged = cv.context().decode_access_spec(data.as_bytes()).unwrap();
        assert!(matches!(
            forged.access_method(&cv),
            Err(AccessError::SpecMismatch { .. })
        ));
    }

    #[test]
    fn unknown_ids_and_resources_are_not_found() {
        let cv = version();
        let missing: Arc<dyn AccessSpec> = Arc::new(ComposeSpec::new("", MIME_TEXT, None));
        assert!(matches!(
            missing.access_method(&cv),
            Err(AccessError::NotFound { ref kind, .. }) if kind == "compose blob"
        ));
        assert!(matches!(
            cv.get_resource("nope"),
            Err(AccessError::NotFound { ref kind, .. }) if kind == "resource"
        ));
    }

    #[test]
    fn replacing_a_resource_releases_old_content() {
        let cv = version();
        let first = BlobAccess::for_string(MIME_TEXT, "one");
        cv.set_resource_blob(ResourceMeta::new("r", resource_types::BLOB), &first, "", None)
            .unwrap();
        assert_eq!(first.ref_count(), 2);

        let second = BlobAccess::for_string(MIME_TEXT, "two");
        cv.set_resource_blob(ResourceMeta::new("r", resource_types::BLOB), &second, "", None)
            .unwrap();
        assert_eq!(first.ref_count(), 1);
        assert_eq!(cv.resources().len(), 1);

        drop(cv);
        assert_eq!(second.ref_count(), 1);
    }

    #[test]
    fn composition_mode_off_is_rejected() {
        let ctx = Context::new(ContextConfig {
            composition_mode: false,
            ..Default::default()
        });
        let cv = InMemoryComponentVersion::new_version(ctx, "acme.org/demo", "1.0.0");
        let blob = BlobAccess::for_string(MIME_TEXT, "x");
        assert!(matches!(
            cv.set_resource_blob(ResourceMeta::new("r", resource_types::BLOB), &blob, "", None),
            Err(AccessError::Config(_))
        ));
    }

    #[test]
    fn sign_and_verify_resource_digest() {
        let cv = version();
        let sk = SigningKey::generate();
        cv.context().signing().register_public_key("acme", sk.verifying_key());
        cv.context().signing().register_private_key("acme", sk);

        let blob = BlobAccess::for_string(MIME_TEXT, "signed");
        cv.set_resource_blob(ResourceMeta::new("r", resource_types::BLOB), &blob, "", None)
            .unwrap();

        let sig = cv.sign_resource("r", "acme").unwrap();
        assert_eq!(sig.algorithm, "ed25519");
        assert_eq!(sig.hash_algorithm, "SHA-256");
        cv.verify_resource("r", "acme", &sig).unwrap();

        let mut tampered = sig.clone();
        tampered.value = "00".repeat(64);
        assert!(matches!(
            cv.verify_resource("r", "acme", &tampered),
            Err(AccessError::Signing(SigningError::InvalidSignature))
        ));
        assert!(matches!(
            cv.sign_resource("r", "nobody"),
            Err(AccessError::NotFound { .. })
        ));
    }
}
