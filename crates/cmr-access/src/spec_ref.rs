use std::sync::Arc;

use cmr_runtime::{GenericTypedObject, TypedObject, UnknownTypedObject, DEFAULT_ENCODING};
use serde::{Deserialize, Serialize};

use crate::context::Context;
use crate::error::AccessResult;
use crate::spec::{AccessSpec, UnknownAccessSpec};

/// A serialized reference to another access spec, embedded in a spec's
/// fields (e.g. `globalAccess`).
///
/// Held in generic form so the embedding spec decodes even when the
/// referenced kind is unknown; [`AccessSpecRef::resolve`] turns it into a
/// typed spec on demand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessSpecRef(GenericTypedObject);

impl AccessSpecRef {
    pub fn new(spec: &dyn AccessSpec) -> AccessResult<Self> {
        Ok(Self(GenericTypedObject::from_object(spec)?))
    }

    pub fn from_generic(generic: GenericTypedObject) -> Self {
        Self(generic)
    }

    pub fn kind(&self) -> &str {
        self.0.kind()
    }

    pub fn generic(&self) -> &GenericTypedObject {
        &self.0
    }

    /// Decode through the context's access type scheme.
    pub fn resolve(&self, ctx: &Context) -> AccessResult<Arc<dyn AccessSpec>> {
        ctx.create_access_spec(self.0.clone())
    }

    /// The referenced spec without consulting any scheme.
    pub fn unresolved(&self) -> AccessResult<Arc<dyn AccessSpec>> {
        let raw = self.0.to_bytes(&DEFAULT_ENCODING)?;
        Ok(Arc::new(UnknownAccessSpec::new(UnknownTypedObject::new(
            self.0.type_name().clone(),
            raw,
        ))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ComposeSpec;

    #[test]
    fn serializes_as_plain_envelope() {
        let spec = ComposeSpec::new("", "text/plain", None);
        let r = AccessSpecRef::new(&spec).unwrap();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["type"], "compose");
        assert_eq!(json["id"], spec.id.as_str());
        let back: AccessSpecRef = serde_json::from_value(json).unwrap();
        assert_eq!(back, r);
    }

    #[test]
    fn resolve_and_unresolved() {
        let ctx = Context::default();
        let spec = ComposeSpec::new("", "text/plain", None);
        let r = AccessSpecRef::new(&spec).unwrap();

        let resolved = r.resolve(&ctx).unwrap();
        assert!(resolved.as_any().downcast_ref::<ComposeSpec>().is_some());

        let raw = r.unresolved().unwrap();
        assert_eq!(raw.kind(), "compose");
        assert!(raw.as_unknown().is_some());
    }
}
