use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::encoding::{Unmarshaler, DEFAULT_ENCODING};
use crate::error::{SchemeError, SchemeResult};
use crate::object::{envelope_kind, GenericTypedObject, TypedObject, UnknownTypedObject};

/// Turns a serialized envelope into a concrete object.
///
/// The decoder receives the complete original bytes, not just the fields
/// after `type`. Any closure with the matching signature is a decoder.
pub trait Decoder<T: ?Sized>: Send + Sync {
    fn decode(&self, data: &[u8], unmarshaler: &dyn Unmarshaler) -> SchemeResult<Arc<T>>;
}

impl<T, F> Decoder<T> for F
where
    T: ?Sized,
    F: Fn(&[u8], &dyn Unmarshaler) -> SchemeResult<Arc<T>> + Send + Sync,
{
    fn decode(&self, data: &[u8], unmarshaler: &dyn Unmarshaler) -> SchemeResult<Arc<T>> {
        self(data, unmarshaler)
    }
}

/// Input accepted by [`Scheme::create_spec`].
pub enum SpecSource<T: ?Sized> {
    /// An already-typed object, passed through unchanged.
    Typed(Arc<T>),
    /// A generic envelope, decoded through the scheme.
    Generic(GenericTypedObject),
}

impl<T: ?Sized> From<Arc<T>> for SpecSource<T> {
    fn from(obj: Arc<T>) -> Self {
        Self::Typed(obj)
    }
}

impl<T: ?Sized> From<GenericTypedObject> for SpecSource<T> {
    fn from(obj: GenericTypedObject) -> Self {
        Self::Generic(obj)
    }
}

/// Registry mapping a combined `kind[/version]` string to a decoder.
///
/// Lookups are exact-match on the combined string. Kinds without a decoder
/// decode into an [`UnknownTypedObject`], wrapped by the scheme's fallback
/// constructor, so decoding never fails just because a kind is unregistered.
///
/// A scheme may be layered over a base scheme: lookups that miss locally
/// read through to the base. Registrations always go to the local map.
///
/// All registration and lookup is internally synchronized; concurrent
/// registrations for the same kind are last-write-wins.
pub struct Scheme<T: ?Sized> {
    decoders: RwLock<HashMap<String, Arc<dyn Decoder<T>>>>,
    base: Option<Arc<Scheme<T>>>,
    unknown: fn(UnknownTypedObject) -> Arc<T>,
}

impl<T: TypedObject + ?Sized> Scheme<T> {
    /// Create an empty scheme. `unknown` wraps the lossless fallback into
    /// the scheme's object type.
    pub fn new(unknown: fn(UnknownTypedObject) -> Arc<T>) -> Self {
        Self {
            decoders: RwLock::new(HashMap::new()),
            base: None,
            unknown,
        }
    }

    /// Create an empty scheme reading through to `base`.
    pub fn layered(base: Arc<Scheme<T>>) -> Self {
        Self {
            decoders: RwLock::new(HashMap::new()),
            unknown: base.unknown,
            base: Some(base),
        }
    }

    pub fn base(&self) -> Option<&Arc<Scheme<T>>> {
        self.base.as_ref()
    }

    /// Register (or replace) the decoder for `kind`.
    pub fn register<D: Decoder<T> + 'static>(&self, kind: &str, decoder: D) {
        self.write_decoders().insert(kind.to_string(), Arc::new(decoder));
        debug!(kind, "registered decoder");
    }

    /// The decoder registered for exactly `kind`, locally or in a base.
    pub fn get_decoder(&self, kind: &str) -> Option<Arc<dyn Decoder<T>>> {
        let local = self.read_decoders().get(kind).cloned();
        local.or_else(|| self.base.as_ref()?.get_decoder(kind))
    }

    /// Returns `true` if a decoder is registered for exactly `kind`.
    pub fn is_known(&self, kind: &str) -> bool {
        self.get_decoder(kind).is_some()
    }

    /// All kinds with a decoder, locally or in a base, sorted.
    pub fn known_types(&self) -> Vec<String> {
        let mut kinds: Vec<String> = self.read_decoders().keys().cloned().collect();
        if let Some(base) = &self.base {
            kinds.extend(base.known_types());
        }
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Merge every registration visible through `other` into this scheme's
    /// local map.
    ///
    /// Where both schemes know a kind, `other`'s decoder replaces the local
    /// one. Registrations made on `other` afterwards are not seen here.
    pub fn add_known_types(&self, other: &Scheme<T>) {
        if std::ptr::eq(self, other) {
            return;
        }
        let snapshot: Vec<(String, Arc<dyn Decoder<T>>)> = other
            .known_types()
            .into_iter()
            .filter_map(|kind| other.get_decoder(&kind).map(|d| (kind, d)))
            .collect();
        let mut decoders = self.write_decoders();
        for (kind, decoder) in snapshot {
            decoders.insert(kind, decoder);
        }
    }

    /// Decode an envelope.
    ///
    /// Fails with [`SchemeError::Decode`] if the envelope is malformed or the
    /// registered decoder rejects it.
    pub fn decode(&self, data: &[u8], unmarshaler: &dyn Unmarshaler) -> SchemeResult<Arc<T>> {
        let kind = envelope_kind(&unmarshaler.unmarshal(data)?)?;
        let Some(decoder) = self.get_decoder(kind.as_str()) else {
            debug!(kind = %kind, "no decoder registered; keeping raw object");
            return Ok((self.unknown)(UnknownTypedObject::new(kind, data.to_vec())));
        };
        let obj = decoder.decode(data, unmarshaler)?;
        if obj.kind() != kind.as_str() {
            return Err(SchemeError::KindMismatch {
                expected: kind.to_string(),
                actual: obj.kind().to_string(),
            });
        }
        Ok(obj)
    }

    /// Turn a typed or generic object into a typed one.
    ///
    /// Typed objects pass through. Generic envelopes are serialized with the
    /// default encoding and decoded through [`Scheme::decode`].
    pub fn create_spec(&self, source: impl Into<SpecSource<T>>) -> SchemeResult<Arc<T>> {
        match source.into() {
            SpecSource::Typed(obj) => Ok(obj),
            SpecSource::Generic(generic) => {
                let data = generic.to_bytes(&DEFAULT_ENCODING)?;
                self.decode(&data, &DEFAULT_ENCODING)
            }
        }
    }

    fn read_decoders(
        &self,
    ) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<dyn Decoder<T>>>> {
        self.decoders.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_decoders(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<dyn Decoder<T>>>> {
        self.decoders.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: TypedObject + ?Sized> fmt::Debug for Scheme<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheme")
            .field("known_types", &self.known_types())
            .field("layered", &self.base.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::JsonEncoding;
    use crate::object::{decode_typed, encode_typed};
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize)]
    struct DemoSpec {
        #[serde(rename = "type")]
        kind: String,
        id: String,
    }

    impl TypedObject for DemoSpec {
        fn kind(&self) -> &str {
            &self.kind
        }

        fn encode(&self) -> SchemeResult<Vec<u8>> {
            encode_typed(self)
        }
    }

    fn wrap_unknown(u: UnknownTypedObject) -> Arc<dyn TypedObject> {
        Arc::new(u)
    }

    fn demo_decoder(data: &[u8], u: &dyn Unmarshaler) -> SchemeResult<Arc<dyn TypedObject>> {
        let spec: DemoSpec = decode_typed(data, u)?;
        Ok(Arc::new(spec))
    }

    fn scheme() -> Scheme<dyn TypedObject> {
        Scheme::new(wrap_unknown)
    }

    #[test]
    fn registered_kind_decodes_typed() {
        let s = scheme();
        s.register("demo/v1", demo_decoder);
        let obj = s.decode(br#"{"type":"demo/v1","id":"x"}"#, &JsonEncoding).unwrap();
        assert_eq!(obj.kind(), "demo/v1");
        assert!(obj.as_unknown().is_none());
    }

    #[test]
    fn unregistered_kind_falls_back_losslessly() {
        let s = scheme();
        s.register("demo/v1", demo_decoder);
        let input = br#"{"type":"demo/v2","id":"y"}"#;
        let obj = s.decode(input, &JsonEncoding).unwrap();
        assert_eq!(obj.kind(), "demo/v2");
        assert!(obj.as_unknown().is_some());
        assert_eq!(obj.encode().unwrap(), input.to_vec());
    }

    #[test]
    fn free_form_kind_falls_back_losslessly() {
        let s = scheme();
        let input = br#"{"type":"My Kind/v1","id":"z"}"#;
        let obj = s.decode(input, &JsonEncoding).unwrap();
        assert_eq!(obj.kind(), "My Kind/v1");
        let unknown = obj.as_unknown().unwrap();
        assert_eq!(unknown.type_name().name(), "My Kind");
        assert_eq!(obj.encode().unwrap(), input.to_vec());
    }

    #[test]
    fn malformed_envelope_is_decode_error() {
        let s = scheme();
        let err = s.decode(br#"{"id":"x"}"#, &JsonEncoding).unwrap_err();
        assert!(matches!(err, SchemeError::Decode { .. }));
        let err = s.decode(b"not json", &JsonEncoding).unwrap_err();
        assert!(matches!(err, SchemeError::Decode { .. }));
    }

    #[test]
    fn decoder_rejection_is_decode_error() {
        let s = scheme();
        s.register("demo/v1", demo_decoder);
        let err = s.decode(br#"{"type":"demo/v1"}"#, &JsonEncoding).unwrap_err();
        assert!(matches!(err, SchemeError::Decode { .. }));
    }

    #[test]
    fn decoder_must_preserve_kind() {
        let s = scheme();
        // Registered under an alias but decodes to the inner kind.
        s.register(
            "alias",
            |data: &[u8], u: &dyn Unmarshaler| -> SchemeResult<Arc<dyn TypedObject>> {
                let mut spec: DemoSpec = decode_typed(data, u)?;
                spec.kind = "demo/v1".into();
                Ok(Arc::new(spec))
            },
        );
        let err = s.decode(br#"{"type":"alias","id":"x"}"#, &JsonEncoding).unwrap_err();
        assert_eq!(
            err,
            SchemeError::KindMismatch {
                expected: "alias".into(),
                actual: "demo/v1".into()
            }
        );
    }

    #[test]
    fn create_spec_passes_typed_through() {
        let s = scheme();
        let obj: Arc<dyn TypedObject> = Arc::new(DemoSpec {
            kind: "demo/v1".into(),
            id: "x".into(),
        });
        let created = s.create_spec(Arc::clone(&obj)).unwrap();
        assert!(Arc::ptr_eq(&created, &obj));
    }

    #[test]
    fn create_spec_decodes_generic() {
        let s = scheme();
        s.register("demo/v1", demo_decoder);
        let generic = GenericTypedObject::from_bytes(br#"{"type":"demo/v1","id":"z"}"#, &JsonEncoding)
            .unwrap();
        let created = s.create_spec(generic).unwrap();
        assert_eq!(created.kind(), "demo/v1");
        assert!(created.as_unknown().is_none());
    }

    #[test]
    fn add_known_types_overwrites_local() {
        let base = scheme();
        base.register("demo/v1", demo_decoder);
        base.register("other", demo_decoder);

        let local = scheme();
        local.register("demo/v1", |_: &[u8], _: &dyn Unmarshaler| {
            Err::<Arc<dyn TypedObject>, _>(SchemeError::decode("local decoder"))
        });
        local.add_known_types(&base);
        local.add_known_types(&local);

        assert_eq!(local.known_types(), vec!["demo/v1".to_string(), "other".to_string()]);
        // The merged-in decoder won.
        assert!(local
            .decode(br#"{"type":"demo/v1","id":"x"}"#, &JsonEncoding)
            .is_ok());

        // Later registrations on the source are not seen.
        base.register("late", demo_decoder);
        assert!(!local.is_known("late"));
    }

    #[test]
    fn layered_scheme_reads_through() {
        let base = Arc::new(scheme());
        let ext = Scheme::layered(Arc::clone(&base));
        base.register("demo/v1", demo_decoder);
        ext.register("ext/v1", demo_decoder);

        assert!(ext.is_known("demo/v1"));
        assert!(ext.is_known("ext/v1"));
        assert!(!base.is_known("ext/v1"));
        assert_eq!(ext.known_types(), vec!["demo/v1".to_string(), "ext/v1".to_string()]);

        let obj = ext.decode(br#"{"type":"demo/v1","id":"x"}"#, &JsonEncoding).unwrap();
        assert!(obj.as_unknown().is_none());
        let obj = base.decode(br#"{"type":"ext/v1","id":"x"}"#, &JsonEncoding).unwrap();
        assert!(obj.as_unknown().is_some());
    }

    #[test]
    fn concurrent_registration_is_safe() {
        let s = Arc::new(scheme());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let s = Arc::clone(&s);
                std::thread::spawn(move || {
                    s.register(&format!("kind{i}"), demo_decoder);
                    s.register("shared", demo_decoder);
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(s.known_types().len(), 9);
    }

    proptest! {
        #[test]
        fn unknown_kinds_roundtrip_bytes(
            name in "[a-z][a-zA-Z0-9.]{0,12}",
            version in proptest::option::of("v[0-9]{1,2}"),
            fields in proptest::collection::btree_map("[a-z]{1,6}", "[ -~]{0,16}", 0..5),
            pretty in any::<bool>(),
        ) {
            let kind = match &version {
                Some(v) => format!("{name}/{v}"),
                None => name.clone(),
            };
            let mut map = serde_json::Map::new();
            for (k, v) in fields {
                map.insert(k, serde_json::Value::String(v));
            }
            map.insert("type".into(), serde_json::Value::String(kind.clone()));
            let value = serde_json::Value::Object(map);
            let input = if pretty {
                serde_json::to_vec_pretty(&value).unwrap()
            } else {
                serde_json::to_vec(&value).unwrap()
            };

            let obj = scheme().decode(&input, &JsonEncoding).unwrap();
            prop_assert_eq!(obj.kind(), kind.as_str());
            prop_assert_eq!(obj.encode().unwrap(), input);
        }
    }
}
