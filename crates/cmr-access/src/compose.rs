use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use cmr_blob::BlobAccess;
use cmr_runtime::{encode_typed, SchemeResult, TypedObject};
use cmr_types::TypeName;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::Context;
use crate::cv::ComponentVersionAccess;
use crate::error::{AccessError, AccessResult};
use crate::method::BlobMethod;
use crate::spec::{register_access_type, AccessSpec, AccessTypeScheme, GlobalAccessProvider, HintProvider};
use crate::spec_ref::AccessSpecRef;

/// Kind name of the compose access spec.
pub const COMPOSE_KIND: &str = "compose";
/// Versioned kind of the compose access spec.
pub const COMPOSE_KIND_V1: &str = "compose/v1";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> String {
    format!("compose-{}", NEXT_ID.fetch_add(1, Ordering::Relaxed))
}

/// Access spec for content staged in a component version before it is
/// persisted to a durable repository.
///
/// The id comes from a process-wide counter: unique for the lifetime of the
/// process and nothing more.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeSpec {
    #[serde(rename = "type")]
    kind: String,
    pub id: String,
    pub media_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_access: Option<AccessSpecRef>,
}

impl ComposeSpec {
    /// A new spec with a fresh id.
    pub fn new(hint: &str, media_type: &str, global: Option<AccessSpecRef>) -> Self {
        Self {
            kind: COMPOSE_KIND.to_string(),
            id: next_id(),
            media_type: media_type.to_string(),
            reference_name: hint.to_string(),
            global_access: global,
        }
    }

    /// Register the compose kinds with an access type scheme.
    pub fn register(scheme: &AccessTypeScheme) {
        register_access_type::<ComposeSpec>(scheme, &[COMPOSE_KIND, COMPOSE_KIND_V1]);
    }

    /// Bind a compose spec to content the caller already holds.
    ///
    /// The method owns a duplicate of `blob`. Fails with
    /// [`AccessError::SpecMismatch`] unless the blob's media type equals the
    /// spec's, and with [`AccessError::UnsupportedKind`] if `spec` is not a
    /// compose spec.
    pub fn new_method(spec: Arc<dyn AccessSpec>, blob: &BlobAccess) -> AccessResult<BlobMethod> {
        let media_type = as_compose(&*spec)
            .ok_or_else(|| AccessError::UnsupportedKind {
                kind: spec.kind().to_string(),
            })?
            .media_type
            .clone();
        if blob.mime_type() != media_type {
            return Err(AccessError::SpecMismatch {
                expected: media_type,
                actual: blob.mime_type().to_string(),
            });
        }
        BlobMethod::new(spec, &media_type, blob.dup()?, true)
    }
}

/// The spec as a compose spec, if it is one.
pub fn as_compose(spec: &dyn AccessSpec) -> Option<&ComposeSpec> {
    spec.as_any().downcast_ref::<ComposeSpec>()
}

/// `true` if the spec's kind name is `compose`, in any version.
pub fn is_compose(spec: &dyn AccessSpec) -> bool {
    TypeName::parse(spec.kind())
        .map(|t| t.name() == COMPOSE_KIND)
        .unwrap_or(false)
}

impl TypedObject for ComposeSpec {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn encode(&self) -> SchemeResult<Vec<u8>> {
        encode_typed(self)
    }
}

impl AccessSpec for ComposeSpec {
    fn describe(&self, _ctx: &Context) -> String {
        format!("Composition blob {}", self.id)
    }

    fn is_local(&self, _ctx: &Context) -> bool {
        true
    }

    fn inexpensive_content_version_identity(&self, _cv: &dyn ComponentVersionAccess) -> String {
        self.id.clone()
    }

    fn as_hint_provider(&self) -> Option<&dyn HintProvider> {
        Some(self)
    }

    fn as_global_access_provider(&self) -> Option<&dyn GlobalAccessProvider> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl HintProvider for ComposeSpec {
    fn reference_hint(&self, _cv: &dyn ComponentVersionAccess) -> String {
        self.reference_name.clone()
    }
}

impl GlobalAccessProvider for ComposeSpec {
    fn global_access_spec(&self, ctx: &Context) -> Option<Arc<dyn AccessSpec>> {
        let global = self.global_access.as_ref()?;
        match global.resolve(ctx) {
            Ok(spec) => Some(spec),
            Err(err) => {
                debug!(id = %self.id, kind = global.kind(), error = %err, "global access unresolved; using raw spec");
                global.unresolved().ok()
            }
        }
    }
}
