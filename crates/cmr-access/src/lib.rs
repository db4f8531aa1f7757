//! Access spec resolution for component model resources.
//!
//! An access spec is a polymorphic, versioned descriptor of where a
//! resource's bytes live. Specs decode through a [`Context`]'s access type
//! scheme and resolve, against a [`ComponentVersionAccess`], into an
//! [`AccessMethod`]: a live handle on the content.
//!
//! # Building Blocks
//!
//! - [`AccessSpec`] -- the spec contract, with capability queries for
//!   [`HintProvider`] and [`GlobalAccessProvider`]
//! - [`UnknownAccessSpec`] -- lossless fallback for unregistered kinds
//! - [`ComposeSpec`] -- content staged in memory before persisting
//! - [`AccessSpecRef`] -- a serialized reference to another spec
//! - [`DigesterRegistry`] -- per-resource-type digesters, layered
//! - [`Context`] -- the registries and settings resolution runs against
//! - [`InMemoryComponentVersion`] -- a reference backend
//!
//! # Design Rules
//!
//! 1. Decoding never fails because a kind is unregistered.
//! 2. Resolving an unknown spec fails with `UnsupportedKind`.
//! 3. Registries are injected through a context; nothing reads a global.
//! 4. Layered registries look locally first, then in their base.

pub mod compose;
pub mod config;
pub mod context;
pub mod cv;
pub mod digest;
pub mod error;
pub mod memory;
pub mod method;
pub mod spec;
pub mod spec_ref;

pub use compose::{as_compose, is_compose, ComposeSpec, COMPOSE_KIND, COMPOSE_KIND_V1};
pub use config::ContextConfig;
pub use context::{default_context, Context};
pub use cv::ComponentVersionAccess;
pub use digest::{
    BlobDigester, DigesterRegistry, GenericBlobDigester, DEFAULT_RESOURCE_TYPE,
    GENERIC_BLOB_DIGEST_V1,
};
pub use error::{AccessError, AccessResult};
pub use memory::{InMemoryComponentVersion, Resource, ResourceMeta};
pub use method::{AccessMethod, BlobMethod};
pub use spec::{
    new_access_type_scheme, register_access_type, AccessSpec, AccessSpecExt, AccessTypeScheme,
    GlobalAccessProvider, HintProvider, UnknownAccessSpec,
};
pub use spec_ref::AccessSpecRef;
