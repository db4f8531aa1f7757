use serde_json::Value;

use crate::error::{SchemeError, SchemeResult};

/// Converts serialized bytes into a structured value.
///
/// The scheme is parametric over this seam; JSON is the default, other
/// encodings plug in by implementing the trait.
pub trait Unmarshaler: Send + Sync {
    fn unmarshal(&self, data: &[u8]) -> SchemeResult<Value>;
}

/// Converts a structured value back into bytes.
pub trait Marshaler: Send + Sync {
    fn marshal(&self, value: &Value) -> SchemeResult<Vec<u8>>;
}

/// Compact JSON encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonEncoding;

/// The encoding used when a caller does not supply one.
pub static DEFAULT_ENCODING: JsonEncoding = JsonEncoding;

impl Unmarshaler for JsonEncoding {
    fn unmarshal(&self, data: &[u8]) -> SchemeResult<Value> {
        serde_json::from_slice(data).map_err(|e| SchemeError::decode(e.to_string()))
    }
}

impl Marshaler for JsonEncoding {
    fn marshal(&self, value: &Value) -> SchemeResult<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| SchemeError::Encode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_roundtrip() {
        let value = serde_json::json!({"type": "demo/v1", "id": "x"});
        let bytes = JsonEncoding.marshal(&value).unwrap();
        assert_eq!(JsonEncoding.unmarshal(&bytes).unwrap(), value);
    }

    #[test]
    fn invalid_json_is_a_decode_error() {
        let err = JsonEncoding.unmarshal(b"{not json").unwrap_err();
        assert!(matches!(err, SchemeError::Decode { .. }));
    }
}
