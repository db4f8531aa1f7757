use std::any::Any;
use std::sync::Arc;

use cmr_runtime::{decode_typed, Scheme, SchemeResult, TypedObject, UnknownTypedObject, Unmarshaler};
use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::cv::ComponentVersionAccess;
use crate::error::{AccessError, AccessResult};
use crate::method::AccessMethod;

/// Type scheme for access specs. Unregistered kinds decode into
/// [`UnknownAccessSpec`].
pub type AccessTypeScheme = Scheme<dyn AccessSpec>;

/// A polymorphic, versioned descriptor of where a resource's bytes live.
///
/// Optional behaviour is exposed through capability queries
/// (`as_hint_provider`, `as_global_access_provider`) that return `None`
/// when the concrete spec lacks the capability.
pub trait AccessSpec: TypedObject + Any {
    /// Human-readable one-line description.
    fn describe(&self, _ctx: &Context) -> String {
        format!("{} access", self.kind())
    }

    /// `true` if the content can be read without a remote fetch.
    fn is_local(&self, _ctx: &Context) -> bool {
        false
    }

    /// A cheap, stable identity of the content, usable for deduplication
    /// without reading it. Empty when the spec cannot provide one.
    fn inexpensive_content_version_identity(&self, _cv: &dyn ComponentVersionAccess) -> String {
        String::new()
    }

    fn as_hint_provider(&self) -> Option<&dyn HintProvider> {
        None
    }

    fn as_global_access_provider(&self) -> Option<&dyn GlobalAccessProvider> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

/// Suggests an external name a persisting repository may reuse.
pub trait HintProvider {
    fn reference_hint(&self, cv: &dyn ComponentVersionAccess) -> String;
}

/// Offers an alternate, more widely reachable spec for the same content.
pub trait GlobalAccessProvider {
    /// `None` if no alternate is configured. An alternate that fails to
    /// resolve through `ctx` is returned unresolved.
    fn global_access_spec(&self, ctx: &Context) -> Option<Arc<dyn AccessSpec>>;
}

/// Operations on a shared access spec.
pub trait AccessSpecExt {
    /// Bind the spec to live content in `cv`.
    ///
    /// Fails with [`AccessError::UnsupportedKind`] for an unknown spec,
    /// before the backend is consulted.
    fn access_method(&self, cv: &dyn ComponentVersionAccess) -> AccessResult<Box<dyn AccessMethod>>;

    /// The reference hint, or an empty string if the spec offers none.
    fn reference_hint(&self, cv: &dyn ComponentVersionAccess) -> String;

    /// The global access alternate. Fails with
    /// [`AccessError::CapabilityUnsupported`] if the spec has no such
    /// capability.
    fn global_access_spec(&self, ctx: &Context) -> AccessResult<Option<Arc<dyn AccessSpec>>>;
}

impl AccessSpecExt for Arc<dyn AccessSpec> {
    fn access_method(&self, cv: &dyn ComponentVersionAccess) -> AccessResult<Box<dyn AccessMethod>> {
        if let Some(unknown) = self.as_unknown() {
            return Err(unknown.unsupported().into());
        }
        cv.access_method(Arc::clone(self))
    }

    fn reference_hint(&self, cv: &dyn ComponentVersionAccess) -> String {
        self.as_hint_provider()
            .map(|p| p.reference_hint(cv))
            .unwrap_or_default()
    }

    fn global_access_spec(&self, ctx: &Context) -> AccessResult<Option<Arc<dyn AccessSpec>>> {
        self.as_global_access_provider()
            .map(|p| p.global_access_spec(ctx))
            .ok_or_else(|| AccessError::capability(self.kind(), "global access"))
    }
}

// ---------------------------------------------------------------------------
// UnknownAccessSpec
// ---------------------------------------------------------------------------

/// An access spec whose kind has no registered decoder.
///
/// Re-encodes to its original bytes; cannot be resolved.
#[derive(Clone, Debug)]
pub struct UnknownAccessSpec(UnknownTypedObject);

impl UnknownAccessSpec {
    pub fn new(inner: UnknownTypedObject) -> Self {
        Self(inner)
    }

    pub fn inner(&self) -> &UnknownTypedObject {
        &self.0
    }
}

impl TypedObject for UnknownAccessSpec {
    fn kind(&self) -> &str {
        self.0.kind()
    }

    fn encode(&self) -> SchemeResult<Vec<u8>> {
        self.0.encode()
    }

    fn as_unknown(&self) -> Option<&UnknownTypedObject> {
        Some(&self.0)
    }
}

impl AccessSpec for UnknownAccessSpec {
    fn describe(&self, _ctx: &Context) -> String {
        format!("unknown access type {}", self.kind())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn wrap_unknown(unknown: UnknownTypedObject) -> Arc<dyn AccessSpec> {
    Arc::new(UnknownAccessSpec(unknown))
}

/// An empty access type scheme with the [`UnknownAccessSpec`] fallback.
pub fn new_access_type_scheme() -> AccessTypeScheme {
    Scheme::new(wrap_unknown)
}

fn decode_as<S>(data: &[u8], unmarshaler: &dyn Unmarshaler) -> SchemeResult<Arc<dyn AccessSpec>>
where
    S: AccessSpec + DeserializeOwned + 'static,
{
    let spec: S = decode_typed(data, unmarshaler)?;
    Ok(Arc::new(spec))
}

/// Register a serde-decodable spec type under each of `kinds`.
pub fn register_access_type<S>(scheme: &AccessTypeScheme, kinds: &[&str])
where
    S: AccessSpec + DeserializeOwned + 'static,
{
    for kind in kinds {
        scheme.register(kind, decode_as::<S>);
    }
}
