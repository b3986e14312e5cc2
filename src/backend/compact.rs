use super::Backend;
use crate::error::{Error, Result};
use crate::value::Value;

/// MessagePack backend.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CompactBackend;

impl CompactBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for CompactBackend {
    type Packed = Vec<u8>;
    type Raw = [u8];

    fn pack(&self, value: &Value) -> Result<Vec<u8>> {
        rmp_serde::to_vec(value).map_err(|e| Error::BadEncode(e.to_string()))
    }

    fn unpack(&self, raw: &[u8]) -> Result<Value> {
        rmp_serde::from_slice(raw).map_err(|e| Error::BadDecode(e.to_string()))
    }
}
