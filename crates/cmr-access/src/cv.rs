use std::sync::Arc;

use crate::context::Context;
use crate::error::AccessResult;
use crate::method::AccessMethod;
use crate::spec::AccessSpec;

/// A component version as seen by access resolution.
///
/// Repository backends implement this; access specs resolve against it.
pub trait ComponentVersionAccess: Send + Sync {
    fn context(&self) -> &Context;

    fn component_name(&self) -> &str;

    fn version(&self) -> &str;

    /// Bind `spec` to live content held by this component version.
    ///
    /// Fails with [`crate::AccessError::NotFound`] if the referenced content
    /// is absent and [`crate::AccessError::SpecMismatch`] if its media type
    /// differs from the one the spec declares.
    fn access_method(&self, spec: Arc<dyn AccessSpec>) -> AccessResult<Box<dyn AccessMethod>>;
}
