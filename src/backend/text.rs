use base64::{engine::general_purpose::STANDARD, Engine};
use serde_json::{Map, Number, Value as Json};

use super::Backend;
use crate::error::{Error, Result};
use crate::value::Value;

/// The key marking an object that holds base64-encoded bytes.
pub const BIN_KEY: &str = "$bin";

/// JSON text backend.
///
/// Object keys are always written in sorted order, so the same value always packs to the same
/// text. JSON has no byte sequence type, so bytes are written as `{"$bin": "<base64>"}` and read
/// back as bytes. A real object key of the form `$bin`, `$$bin`, and so on gets one more leading
/// `$` when written, and loses it when read, so objects never collide with bytes. Non-finite
/// floats can't be written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextBackend {
    pretty: bool,
}

impl TextBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write indented, multi-line text instead of the compact form.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// Whether a key is one or more `$` followed by `bin`.
fn is_bin_like(key: &str) -> bool {
    key.starts_with('$') && key.trim_start_matches('$') == "bin"
}

fn escape_key(key: &str) -> String {
    if is_bin_like(key) {
        format!("${}", key)
    } else {
        key.to_string()
    }
}

fn unescape_key(key: String) -> String {
    if key.len() > BIN_KEY.len() && is_bin_like(&key) {
        key[1..].to_string()
    } else {
        key
    }
}

fn to_json(value: &Value) -> Result<Json> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(v) => Json::Bool(*v),
        Value::Int(v) => Json::Number((*v).into()),
        Value::F64(v) => Json::Number(Number::from_f64(*v).ok_or_else(|| {
            Error::BadEncode(format!("non-finite number {} can't be written as text", v))
        })?),
        Value::Str(v) => Json::String(v.clone()),
        Value::Bin(v) => {
            let mut map = Map::new();
            map.insert(BIN_KEY.to_string(), Json::String(STANDARD.encode(v)));
            Json::Object(map)
        }
        Value::Array(v) => Json::Array(v.iter().map(to_json).collect::<Result<_>>()?),
        Value::Map(v) => Json::Object(
            v.iter()
                .map(|(k, v)| Ok((escape_key(k), to_json(v)?)))
                .collect::<Result<_>>()?,
        ),
    })
}

fn from_json(json: Json) -> Result<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(v) => Value::Bool(v),
        Json::Number(n) => {
            if let Some(v) = n.as_i64() {
                Value::Int(v)
            } else if let Some(v) = n.as_u64() {
                Value::from(v)
            } else {
                Value::F64(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(v) => Value::Str(v),
        Json::Array(v) => Value::Array(v.into_iter().map(from_json).collect::<Result<_>>()?),
        Json::Object(map) => {
            if map.len() == 1 {
                if let Some(Json::String(encoded)) = map.get(BIN_KEY) {
                    let bytes = STANDARD
                        .decode(encoded)
                        .map_err(|e| Error::BadDecode(format!("bad base64 bytes: {}", e)))?;
                    return Ok(Value::Bin(bytes));
                }
            }
            Value::Map(
                map.into_iter()
                    .map(|(k, v)| Ok((unescape_key(k), from_json(v)?)))
                    .collect::<Result<_>>()?,
            )
        }
    })
}

impl Backend for TextBackend {
    type Packed = String;
    type Raw = str;

    fn pack(&self, value: &Value) -> Result<String> {
        let json = to_json(value)?;
        let text = if self.pretty {
            serde_json::to_string_pretty(&json)
        } else {
            serde_json::to_string(&json)
        };
        text.map_err(|e| Error::BadEncode(e.to_string()))
    }

    fn unpack(&self, raw: &str) -> Result<Value> {
        let json: Json = serde_json::from_str(raw).map_err(|e| Error::BadDecode(e.to_string()))?;
        from_json(json)
    }
}
