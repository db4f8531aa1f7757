//! Type scheme for component model resolution.
//!
//! A [`Scheme`] maps a `kind[/version]` string to a [`Decoder`] that turns the
//! serialized envelope `{ "type": "<kind>", ...fields }` into a concrete,
//! strongly-typed value. The core never needs to know every kind in advance:
//! kinds without a registered decoder decode into an [`UnknownTypedObject`]
//! that keeps the original bytes, so re-encoding is lossless.
//!
//! # Modules
//!
//! - [`encoding`] -- The [`Unmarshaler`]/[`Marshaler`] seam and [`JsonEncoding`]
//! - [`object`] -- [`TypedObject`], [`GenericTypedObject`], [`UnknownTypedObject`]
//! - [`scheme`] -- The [`Scheme`] registry itself
//! - [`error`] -- [`SchemeError`]

pub mod encoding;
pub mod error;
pub mod object;
pub mod scheme;

pub use encoding::{JsonEncoding, Marshaler, Unmarshaler, DEFAULT_ENCODING};
pub use error::{SchemeError, SchemeResult};
pub use object::{decode_typed, encode_typed, GenericTypedObject, TypedObject, UnknownTypedObject};
pub use scheme::{Decoder, Scheme, SpecSource};
