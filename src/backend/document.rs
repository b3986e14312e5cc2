use std::collections::BTreeMap;

use educe::Educe;

use super::Backend;
use crate::depth_tracking::DepthTracker;
use crate::element::{serialize_elem, Element, Parser};
use crate::error::{Error, Result};
use crate::value::Value;
use crate::{MAX_DEPTH, MAX_DOC_SIZE};

/// Encodes and decodes whole documents. A document is always an object at the root.
///
/// Codecs are handed to a [`DocumentBackend`] per call, so a codec with its own state or
/// resources can be injected wherever encoding happens. Codecs must be safe to use concurrently,
/// or be synchronized by whoever owns them.
pub trait DocumentCodec {
    fn encode_document(&self, doc: &BTreeMap<String, Value>) -> Result<Vec<u8>>;

    fn decode_document(&self, raw: &[u8]) -> Result<BTreeMap<String, Value>>;
}

/// Binary document backend, delegating to an injected [`DocumentCodec`].
///
/// Only objects can be packed; any other root value fails with [`Error::BadEncode`].
#[derive(Debug)]
pub struct DocumentBackend<'c, C: DocumentCodec + ?Sized> {
    codec: &'c C,
}

impl<'c, C: DocumentCodec + ?Sized> Clone for DocumentBackend<'c, C> {
    fn clone(&self) -> Self {
        Self { codec: self.codec }
    }
}

impl<'c, C: DocumentCodec + ?Sized> DocumentBackend<'c, C> {
    pub fn new(codec: &'c C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &'c C {
        self.codec
    }
}

impl<'c, C: DocumentCodec + ?Sized> Backend for DocumentBackend<'c, C> {
    type Packed = Vec<u8>;
    type Raw = [u8];

    fn pack(&self, value: &Value) -> Result<Vec<u8>> {
        match value {
            Value::Map(doc) => self.codec.encode_document(doc),
            other => Err(Error::BadEncode(format!(
                "document root must be an object, not {}",
                other.type_name()
            ))),
        }
    }

    fn unpack(&self, raw: &[u8]) -> Result<Value> {
        self.codec.decode_document(raw).map(Value::Map)
    }
}

/// The canonical binary document codec.
///
/// The format is derived from MessagePack:
/// - Every value uses the shortest encoding available to it.
/// - Multi-byte numbers and lengths are little-endian.
/// - Strings must be valid UTF-8.
/// - Map keys are strings, in strictly increasing byte order, so no key repeats.
/// - Nothing may follow the root object.
///
/// Because of this, a value has exactly one valid encoding, and decoding rejects anything that
/// isn't it. Documents are limited both in nesting depth and in total size, on encode and on
/// decode.
#[derive(Clone, Debug, PartialEq, Eq, Educe)]
#[educe(Default)]
pub struct MarkerCodec {
    #[educe(Default(expression = MAX_DEPTH))]
    max_depth: usize,
    #[educe(Default(expression = MAX_DOC_SIZE))]
    max_size: usize,
}

impl MarkerCodec {
    /// A codec with the default limits: [`MAX_DEPTH`] and [`MAX_DOC_SIZE`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum nesting depth of arrays and maps, counting the root object.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the maximum encoded document size, in bytes. Lengths are written as at most 32 bits,
    /// so the limit is capped at `u32::MAX`.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.min(u32::MAX as usize);
        self
    }

    fn write(&self, buf: &mut Vec<u8>, depth: &mut DepthTracker, elem: Element) -> Result<()> {
        depth.update_elem(&elem)?;
        let payload = match &elem {
            Element::Str(v) => v.len(),
            Element::Bin(v) => v.len(),
            _ => 0,
        };
        let projected = buf.len().saturating_add(payload);
        if projected > self.max_size {
            return Err(Error::LengthTooLong {
                max: self.max_size,
                actual: projected,
            });
        }
        serialize_elem(buf, elem);
        if buf.len() > self.max_size {
            return Err(Error::LengthTooLong {
                max: self.max_size,
                actual: buf.len(),
            });
        }
        Ok(())
    }

    fn encode_value(
        &self,
        buf: &mut Vec<u8>,
        depth: &mut DepthTracker,
        value: &Value,
    ) -> Result<()> {
        match value {
            Value::Null => self.write(buf, depth, Element::Null),
            Value::Bool(v) => self.write(buf, depth, Element::Bool(*v)),
            Value::Int(v) => self.write(buf, depth, Element::Int(*v)),
            Value::F64(v) => self.write(buf, depth, Element::F64(*v)),
            Value::Str(v) => self.write(buf, depth, Element::Str(v)),
            Value::Bin(v) => self.write(buf, depth, Element::Bin(v)),
            Value::Array(items) => {
                self.write(buf, depth, Element::Array(items.len()))?;
                for item in items {
                    self.encode_value(buf, depth, item)?;
                }
                Ok(())
            }
            Value::Map(map) => self.encode_map(buf, depth, map),
        }
    }

    fn encode_map(
        &self,
        buf: &mut Vec<u8>,
        depth: &mut DepthTracker,
        map: &BTreeMap<String, Value>,
    ) -> Result<()> {
        self.write(buf, depth, Element::Map(map.len()))?;
        for (key, value) in map {
            self.write(buf, depth, Element::Str(key))?;
            self.encode_value(buf, depth, value)?;
        }
        Ok(())
    }

    fn decode_value(&self, parser: &mut Parser, elem: Element) -> Result<Value> {
        Ok(match elem {
            Element::Null => Value::Null,
            Element::Bool(v) => Value::Bool(v),
            Element::Int(v) => Value::Int(v),
            Element::F64(v) => Value::F64(v),
            Element::Str(v) => Value::Str(v.to_string()),
            Element::Bin(v) => Value::Bin(v.to_vec()),
            Element::Array(len) => {
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    let elem = next_elem(parser)?;
                    items.push(self.decode_value(parser, elem)?);
                }
                Value::Array(items)
            }
            Element::Map(len) => Value::Map(self.decode_map(parser, len)?),
        })
    }

    fn decode_map(&self, parser: &mut Parser, len: usize) -> Result<BTreeMap<String, Value>> {
        let mut map = BTreeMap::new();
        let mut last_key: Option<&str> = None;
        for _ in 0..len {
            let key = match next_elem(parser)? {
                Element::Str(key) => key,
                elem => {
                    return Err(Error::BadDecode(format!(
                        "map keys must be Str, got {}",
                        elem.name()
                    )))
                }
            };
            if let Some(last_key) = last_key {
                if key <= last_key {
                    return Err(Error::BadDecode(format!(
                        "map keys out of order or repeated: {:?} came after {:?}",
                        key, last_key
                    )));
                }
            }
            last_key = Some(key);
            let elem = next_elem(parser)?;
            let value = self.decode_value(parser, elem)?;
            map.insert(key.to_string(), value);
        }
        Ok(map)
    }
}

fn next_elem<'a>(parser: &mut Parser<'a>) -> Result<Element<'a>> {
    parser.next().ok_or(Error::LengthTooShort {
        step: "get next element",
        actual: 0,
        expected: 1,
    })?
}

impl DocumentCodec for MarkerCodec {
    fn encode_document(&self, doc: &BTreeMap<String, Value>) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let mut depth = DepthTracker::new(self.max_depth);
        self.encode_map(&mut buf, &mut depth, doc)?;
        Ok(buf)
    }

    fn decode_document(&self, raw: &[u8]) -> Result<BTreeMap<String, Value>> {
        if raw.len() > self.max_size {
            return Err(Error::LengthTooLong {
                max: self.max_size,
                actual: raw.len(),
            });
        }
        let mut parser = Parser::new(raw, self.max_depth);
        let doc = match next_elem(&mut parser)? {
            Element::Map(len) => self.decode_map(&mut parser, len)?,
            elem => {
                return Err(Error::BadDecode(format!(
                    "document root must be a Map, got {}",
                    elem.name()
                )))
            }
        };
        if parser.remaining() > 0 {
            return Err(Error::BadDecode(format!(
                "{} trailing bytes after document",
                parser.remaining()
            )));
        }
        Ok(doc)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;

    fn doc(pairs: Vec<(&str, Value)>) -> BTreeMap<String, Value> {
        pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
    }

    fn nested(depth: usize) -> BTreeMap<String, Value> {
        let mut value = Value::Null;
        for _ in 0..depth {
            value = Value::Array(vec![value]);
        }
        doc(vec![("v", value)])
    }

    #[test]
    fn exact_bytes() {
        let codec = MarkerCodec::new();
        let encoded = codec
            .encode_document(&doc(vec![
                ("b", Value::from(300)),
                ("a", Value::Bin(vec![0xff])),
            ]))
            .unwrap();
        assert_eq!(
            encoded,
            vec![0x82, 0xa1, b'a', 0xc4, 0x01, 0xff, 0xa1, b'b', 0xcd, 0x2c, 0x01]
        );
        assert_eq!(
            codec.decode_document(&encoded).unwrap(),
            doc(vec![("a", Value::Bin(vec![0xff])), ("b", Value::from(300))])
        );
    }

    #[test]
    fn round_trip() {
        let codec = MarkerCodec::new();
        let original = doc(vec![
            ("title", Value::from("All Star")),
            ("rating", Value::from(-2.5)),
            ("nan", Value::F64(f64::INFINITY)),
            ("none", Value::Null),
            ("list", Value::Array(vec![Value::from(true), Value::from(-40)])),
            ("inner", Value::Map(doc(vec![("id", Value::from("m1"))]))),
        ]);
        let encoded = codec.encode_document(&original).unwrap();
        assert_eq!(codec.decode_document(&encoded).unwrap(), original);
    }

    #[test]
    fn unordered_keys() {
        let codec = MarkerCodec::new();
        let bytes = [0x82, 0xa1, b'b', 0x01, 0xa1, b'a', 0x02];
        assert!(matches!(codec.decode_document(&bytes), Err(Error::BadDecode(_))));
        let repeated = [0x82, 0xa1, b'a', 0x01, 0xa1, b'a', 0x02];
        assert!(matches!(codec.decode_document(&repeated), Err(Error::BadDecode(_))));
    }

    #[test]
    fn non_string_key() {
        let bytes = [0x81, 0x01, 0x02];
        assert!(MarkerCodec::new().decode_document(&bytes).is_err());
    }

    #[test]
    fn root_must_be_map() {
        assert!(MarkerCodec::new().decode_document(&[0x90]).is_err());
        assert!(MarkerCodec::new().decode_document(&[]).is_err());
        let codec = MarkerCodec::new();
        let backend = DocumentBackend::new(&codec);
        let err = backend.pack(&Value::Array(Vec::new())).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Basic data encoding failure: document root must be an object, not array"
        );
    }

    #[test]
    fn trailing_bytes() {
        assert!(MarkerCodec::new().decode_document(&[0x80, 0xc0]).is_err());
    }

    #[test]
    fn truncated() {
        let codec = MarkerCodec::new();
        let encoded = codec
            .encode_document(&doc(vec![("title", Value::from("All Star"))]))
            .unwrap();
        for end in 0..encoded.len() {
            assert!(codec.decode_document(&encoded[..end]).is_err());
        }
    }

    #[test]
    fn depth_limit() {
        let codec = MarkerCodec::new().max_depth(4);
        // Root map plus three arrays
        let ok = codec.encode_document(&nested(3)).unwrap();
        assert!(codec.decode_document(&ok).is_ok());
        assert!(matches!(
            codec.encode_document(&nested(4)),
            Err(Error::ParseLimit(_))
        ));
        let deep = MarkerCodec::new().encode_document(&nested(4)).unwrap();
        assert!(matches!(codec.decode_document(&deep), Err(Error::ParseLimit(_))));
    }

    #[test]
    fn size_limit() {
        let codec = MarkerCodec::new().max_size(16);
        let big = doc(vec![("data", Value::Bin(vec![0; 32]))]);
        assert!(matches!(
            codec.encode_document(&big),
            Err(Error::LengthTooLong { max: 16, .. })
        ));
        let encoded = MarkerCodec::new().encode_document(&big).unwrap();
        assert!(matches!(
            codec.decode_document(&encoded),
            Err(Error::LengthTooLong { max: 16, .. })
        ));
    }

    #[test]
    fn random_garbage_never_panics() {
        let codec = MarkerCodec::new();
        let mut rng = rand::thread_rng();
        for _ in 0..2000 {
            let len = rng.gen_range(0..64);
            let bytes: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
            if let Ok(doc) = codec.decode_document(&bytes) {
                // Anything accepted is canonical
                assert_eq!(codec.encode_document(&doc).unwrap(), bytes);
            }
        }
    }

    #[test]
    fn default_limits() {
        assert_eq!(
            MarkerCodec::default(),
            MarkerCodec::new().max_depth(MAX_DEPTH).max_size(MAX_DOC_SIZE)
        );
    }

    #[test]
    fn size_limit_capped_at_u32() {
        let codec = MarkerCodec::new().max_size(usize::MAX);
        assert_eq!(codec.max_size, u32::MAX as usize);
    }

    #[test]
    fn oversized_payload_rejected_before_copy() {
        let codec = MarkerCodec::new().max_size(64);
        let big = doc(vec![("data", Value::Bin(vec![0; 4096]))]);
        match codec.encode_document(&big) {
            Err(Error::LengthTooLong { max, actual }) => {
                assert_eq!(max, 64);
                // Map marker, key marker, key bytes, then the payload itself
                assert_eq!(actual, 1 + 1 + 4 + 4096);
            }
            other => panic!("expected LengthTooLong, got {:?}", other),
        }
        let text = doc(vec![("s", Value::from("x".repeat(100)))]);
        assert!(matches!(
            codec.encode_document(&text),
            Err(Error::LengthTooLong { max: 64, .. })
        ));
    }
}
