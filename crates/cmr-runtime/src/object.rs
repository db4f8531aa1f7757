use std::fmt;

use cmr_types::TypeName;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::encoding::{Marshaler, Unmarshaler, DEFAULT_ENCODING};
use crate::error::{SchemeError, SchemeResult};

/// Name of the envelope field carrying the combined `kind[/version]` string.
pub const TYPE_FIELD: &str = "type";

/// An object identified by a `kind[/version]` string.
pub trait TypedObject: fmt::Debug + Send + Sync {
    /// The combined kind string this object was decoded under.
    fn kind(&self) -> &str;

    /// Serialize the object back into its envelope form.
    fn encode(&self) -> SchemeResult<Vec<u8>>;

    /// Capability query: the lossless fallback representation, if this object
    /// is one.
    fn as_unknown(&self) -> Option<&UnknownTypedObject> {
        None
    }
}

/// Extract and validate the `type` field of an envelope.
pub(crate) fn envelope_kind(value: &Value) -> SchemeResult<TypeName> {
    let obj = value
        .as_object()
        .ok_or_else(|| SchemeError::decode("envelope is not an object"))?;
    let kind = obj
        .get(TYPE_FIELD)
        .ok_or_else(|| SchemeError::decode("missing type field"))?
        .as_str()
        .ok_or_else(|| SchemeError::decode("type field is not a string"))?;
    TypeName::parse(kind).map_err(|e| SchemeError::decode(e.to_string()))
}

/// Decode a full envelope into a serde type.
pub fn decode_typed<S: DeserializeOwned>(data: &[u8], unmarshaler: &dyn Unmarshaler) -> SchemeResult<S> {
    let value = unmarshaler.unmarshal(data)?;
    serde_json::from_value(value).map_err(|e| SchemeError::decode(e.to_string()))
}

/// Encode a serde type as compact JSON.
pub fn encode_typed<S: Serialize>(value: &S) -> SchemeResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| SchemeError::Encode(e.to_string()))
}

// ---------------------------------------------------------------------------
// GenericTypedObject
// ---------------------------------------------------------------------------

/// An envelope held as a kind plus untyped fields.
///
/// Used to carry a typed object across a boundary without knowing its
/// concrete type, e.g. an embedded reference to another spec.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenericTypedObject {
    #[serde(rename = "type")]
    kind: TypeName,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl GenericTypedObject {
    pub fn new(kind: TypeName) -> Self {
        Self {
            kind,
            fields: Map::new(),
        }
    }

    /// Build from an already-parsed envelope value.
    pub fn from_value(value: Value) -> SchemeResult<Self> {
        let kind = envelope_kind(&value)?;
        let Value::Object(mut fields) = value else {
            return Err(SchemeError::decode("envelope is not an object"));
        };
        fields.remove(TYPE_FIELD);
        Ok(Self { kind, fields })
    }

    /// Parse serialized bytes through the given unmarshaler.
    pub fn from_bytes(data: &[u8], unmarshaler: &dyn Unmarshaler) -> SchemeResult<Self> {
        Self::from_value(unmarshaler.unmarshal(data)?)
    }

    /// Convert any typed object into its generic form.
    pub fn from_object<O: TypedObject + ?Sized>(obj: &O) -> SchemeResult<Self> {
        Self::from_bytes(&obj.encode()?, &DEFAULT_ENCODING)
    }

    pub fn type_name(&self) -> &TypeName {
        &self.kind
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Set a field. Setting `type` is ignored; the kind is fixed.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        if field != TYPE_FIELD {
            self.fields.insert(field, value);
        }
    }

    /// The full envelope as a JSON value.
    pub fn to_value(&self) -> Value {
        let mut map = self.fields.clone();
        map.insert(TYPE_FIELD.to_string(), Value::String(self.kind.to_string()));
        Value::Object(map)
    }

    pub fn to_bytes(&self, marshaler: &dyn Marshaler) -> SchemeResult<Vec<u8>> {
        marshaler.marshal(&self.to_value())
    }
}

impl TypedObject for GenericTypedObject {
    fn kind(&self) -> &str {
        self.kind.as_str()
    }

    fn encode(&self) -> SchemeResult<Vec<u8>> {
        self.to_bytes(&DEFAULT_ENCODING)
    }
}

// ---------------------------------------------------------------------------
// UnknownTypedObject
// ---------------------------------------------------------------------------

/// Fallback for a kind with no registered decoder.
///
/// Keeps the exact bytes it was decoded from, so [`TypedObject::encode`]
/// reproduces the input byte for byte. Any operational use must fail with
/// [`SchemeError::UnsupportedKind`]; see [`UnknownTypedObject::unsupported`].
#[derive(Clone, PartialEq, Eq)]
pub struct UnknownTypedObject {
    kind: TypeName,
    raw: Vec<u8>,
}

impl UnknownTypedObject {
    pub fn new(kind: TypeName, raw: Vec<u8>) -> Self {
        Self { kind, raw }
    }

    pub fn type_name(&self) -> &TypeName {
        &self.kind
    }

    /// The bytes this object was decoded from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Re-parse the retained bytes into generic form.
    pub fn to_generic(&self, unmarshaler: &dyn Unmarshaler) -> SchemeResult<GenericTypedObject> {
        GenericTypedObject::from_bytes(&self.raw, unmarshaler)
    }

    /// The error to report when this object is used operationally.
    pub fn unsupported(&self) -> SchemeError {
        SchemeError::unsupported(self.kind.as_str())
    }
}

impl TypedObject for UnknownTypedObject {
    fn kind(&self) -> &str {
        self.kind.as_str()
    }

    fn encode(&self) -> SchemeResult<Vec<u8>> {
        Ok(self.raw.clone())
    }

    fn as_unknown(&self) -> Option<&UnknownTypedObject> {
        Some(self)
    }
}

impl fmt::Debug for UnknownTypedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnknownTypedObject")
            .field("kind", &self.kind.as_str())
            .field("raw_len", &self.raw.len())
            .finish()
    }
}
