//! Foundation types for component model resolution (CMR).
//!
//! This crate provides the small value types shared by every other CMR
//! crate. It has no knowledge of registries, blobs, or backends.
//!
//! # Key Types
//!
//! - [`TypeName`] -- Parsed `kind[/version]` string used as a registry key
//! - [`DigesterType`] -- (hash algorithm, normalisation algorithm) pair
//! - [`DigestDescriptor`] -- A computed digest plus the variant that produced it
//! - [`resource_types`] -- Well-known resource type names

pub mod digest;
pub mod error;
pub mod kind;
pub mod resource_types;

pub use digest::{DigestDescriptor, DigesterType};
pub use error::TypeError;
pub use kind::{TypeName, DEFAULT_VERSION, VERSION_SEPARATOR};
