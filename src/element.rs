use crate::depth_tracking::DepthTracker;
use crate::error::{Error, Result};
use crate::marker::Marker;

use byteorder::{LittleEndian, ReadBytesExt};

/// A single piece of an encoded document. Arrays and maps only carry their length; their
/// contents are the elements that follow.
#[derive(Clone, Debug, PartialEq)]
pub enum Element<'a> {
    Null,
    Bool(bool),
    Int(i64),
    F64(f64),
    Str(&'a str),
    Bin(&'a [u8]),
    Array(usize),
    Map(usize),
}

impl<'a> Element<'a> {
    pub fn name(&self) -> &'static str {
        use self::Element::*;
        match self {
            Null => "Null",
            Bool(_) => "Bool",
            Int(_) => "Int",
            F64(_) => "F64",
            Str(_) => "Str",
            Bin(_) => "Bin",
            Array(_) => "Array",
            Map(_) => "Map",
        }
    }
}

fn write_len(buf: &mut Vec<u8>, len: usize, markers: [Marker; 3]) {
    if len <= u8::MAX as usize {
        buf.push(markers[0].into());
        buf.push(len as u8);
    } else if len <= u16::MAX as usize {
        buf.push(markers[1].into());
        buf.extend_from_slice(&(len as u16).to_le_bytes());
    } else {
        buf.push(markers[2].into());
        buf.extend_from_slice(&(len as u32).to_le_bytes());
    }
}

/// Serialize an element onto a byte vector, always with the shortest possible encoding. Doesn't
/// check if Array & Map structures make sense, just writes elements out.
///
/// Lengths must fit in a `u32`; callers enforce a much lower document size limit.
pub fn serialize_elem(buf: &mut Vec<u8>, elem: Element) {
    use self::Element::*;
    match elem {
        Null => buf.push(Marker::Null.into()),
        Bool(v) => buf.push(if v { Marker::True } else { Marker::False }.into()),
        Int(v) if v >= 0 => {
            if v <= 127 {
                buf.push(Marker::PosFixInt(v as u8).into());
            } else if v <= u8::MAX as i64 {
                buf.push(Marker::UInt8.into());
                buf.push(v as u8);
            } else if v <= u16::MAX as i64 {
                buf.push(Marker::UInt16.into());
                buf.extend_from_slice(&(v as u16).to_le_bytes());
            } else if v <= u32::MAX as i64 {
                buf.push(Marker::UInt32.into());
                buf.extend_from_slice(&(v as u32).to_le_bytes());
            } else {
                buf.push(Marker::UInt64.into());
                buf.extend_from_slice(&(v as u64).to_le_bytes());
            }
        }
        Int(v) => {
            if v >= -32 {
                buf.push(Marker::NegFixInt(v as i8).into());
            } else if v >= i8::MIN as i64 {
                buf.push(Marker::Int8.into());
                buf.push(v as u8);
            } else if v >= i16::MIN as i64 {
                buf.push(Marker::Int16.into());
                buf.extend_from_slice(&(v as i16).to_le_bytes());
            } else if v >= i32::MIN as i64 {
                buf.push(Marker::Int32.into());
                buf.extend_from_slice(&(v as i32).to_le_bytes());
            } else {
                buf.push(Marker::Int64.into());
                buf.extend_from_slice(&v.to_le_bytes());
            }
        }
        F64(v) => {
            buf.push(Marker::F64.into());
            buf.extend_from_slice(&v.to_bits().to_le_bytes());
        }
        Str(v) => {
            let len = v.len();
            if len <= 31 {
                buf.push(Marker::FixStr(len as u8).into());
            } else {
                write_len(buf, len, [Marker::Str8, Marker::Str16, Marker::Str32]);
            }
            buf.extend_from_slice(v.as_bytes());
        }
        Bin(v) => {
            write_len(buf, v.len(), [Marker::Bin8, Marker::Bin16, Marker::Bin32]);
            buf.extend_from_slice(v);
        }
        Array(len) => {
            if len <= 15 {
                buf.push(Marker::FixArray(len as u8).into());
            } else {
                write_len(buf, len, [Marker::Array8, Marker::Array16, Marker::Array32]);
            }
        }
        Map(len) => {
            if len <= 15 {
                buf.push(Marker::FixMap(len as u8).into());
            } else {
                write_len(buf, len, [Marker::Map8, Marker::Map16, Marker::Map32]);
            }
        }
    }
}

fn not_shortest(what: &str, value: impl std::fmt::Display) -> Error {
    Error::BadDecode(format!(
        "Got {} with value = {}. This is not the shortest encoding.",
        what, value
    ))
}

/// Reads elements out of an encoded document, one at a time, tracking nesting depth as it goes.
/// Every non-shortest encoding is rejected.
#[derive(Clone, Debug)]
pub struct Parser<'a> {
    data: &'a [u8],
    depth_tracking: DepthTracker,
    errored: bool,
}

impl<'a> Parser<'a> {
    pub fn new(data: &'a [u8], max_depth: usize) -> Parser<'a> {
        Self {
            data,
            depth_tracking: DepthTracker::new(max_depth),
            errored: false,
        }
    }

    /// Bytes not yet parsed.
    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    fn read_len(&mut self, step: &'static str, width: usize) -> Result<usize> {
        let short = |actual| Error::LengthTooShort {
            step,
            actual,
            expected: width,
        };
        let actual = self.data.len();
        let len = match width {
            1 => self.data.read_u8().map_err(|_| short(actual))? as usize,
            2 => self.data.read_u16::<LittleEndian>().map_err(|_| short(actual))? as usize,
            _ => self.data.read_u32::<LittleEndian>().map_err(|_| short(actual))? as usize,
        };
        // Each width must only be used once the narrower one can't hold the length.
        let floor = match width {
            1 => 0,
            2 => u8::MAX as usize,
            _ => u16::MAX as usize,
        };
        if width > 1 && len <= floor {
            return Err(not_shortest(step, len));
        }
        Ok(len)
    }

    fn take(&mut self, step: &'static str, len: usize) -> Result<&'a [u8]> {
        if len > self.data.len() {
            return Err(Error::LengthTooShort {
                step,
                actual: self.data.len(),
                expected: len,
            });
        }
        let (bytes, data) = self.data.split_at(len);
        self.data = data;
        Ok(bytes)
    }

    fn take_str(&mut self, step: &'static str, len: usize) -> Result<Element<'a>> {
        let bytes = self.take(step, len)?;
        let string = std::str::from_utf8(bytes).map_err(|e| Error::BadDecode(format!("{}", e)))?;
        Ok(Element::Str(string))
    }

    // A container can't claim more items than there are bytes left, as each takes at least one.
    fn container_len(&self, step: &'static str, len: usize, per_item: usize) -> Result<usize> {
        if len.saturating_mul(per_item) > self.data.len() {
            return Err(Error::BadDecode(format!(
                "Got {} with length = {}, but there are only {} bytes left.",
                step,
                len,
                self.data.len()
            )));
        }
        Ok(len)
    }

    // Given a retrieved marker, try to turn it into the next element, which may move through the
    // indexed data. If we can't, error. This function *does not* set the the errored flag. That's
    // up to the caller.
    fn parse_element(&mut self, marker: Marker) -> Result<Element<'a>> {
        use self::Marker::*;
        let elem = match marker {
            Reserved => return Err(Error::BadDecode(String::from("Reserved marker found"))),
            Null => Element::Null,
            False => Element::Bool(false),
            True => Element::Bool(true),
            PosFixInt(v) => Element::Int(v.into()),
            NegFixInt(v) => Element::Int(v.into()),
            UInt8 => {
                let v = self.read_len("decode UInt8", 1)?;
                if v < 128 {
                    return Err(not_shortest("UInt8", v));
                }
                Element::Int(v as i64)
            }
            UInt16 => Element::Int(self.read_len("decode UInt16", 2)? as i64),
            UInt32 => Element::Int(self.read_len("decode UInt32", 4)? as i64),
            UInt64 => {
                let actual = self.data.len();
                let v = self
                    .data
                    .read_u64::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode UInt64",
                        actual,
                        expected: 8,
                    })?;
                if v <= u32::MAX as u64 {
                    return Err(not_shortest("UInt64", v));
                }
                let v = i64::try_from(v).map_err(|_| {
                    Error::BadDecode(format!("Got UInt64 with value = {}, which is too large", v))
                })?;
                Element::Int(v)
            }
            Int8 => {
                let actual = self.data.len();
                let v = self.data.read_i8().map_err(|_| Error::LengthTooShort {
                    step: "decode Int8",
                    actual,
                    expected: 1,
                })?;
                if v >= -32 {
                    return Err(not_shortest("Int8", v));
                }
                Element::Int(v.into())
            }
            Int16 => {
                let actual = self.data.len();
                let v = self
                    .data
                    .read_i16::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Int16",
                        actual,
                        expected: 2,
                    })?;
                if v >= i8::MIN as i16 {
                    return Err(not_shortest("Int16", v));
                }
                Element::Int(v.into())
            }
            Int32 => {
                let actual = self.data.len();
                let v = self
                    .data
                    .read_i32::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Int32",
                        actual,
                        expected: 4,
                    })?;
                if v >= i16::MIN as i32 {
                    return Err(not_shortest("Int32", v));
                }
                Element::Int(v.into())
            }
            Int64 => {
                let actual = self.data.len();
                let v = self
                    .data
                    .read_i64::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode Int64",
                        actual,
                        expected: 8,
                    })?;
                if v >= i32::MIN as i64 {
                    return Err(not_shortest("Int64", v));
                }
                Element::Int(v)
            }
            F64 => {
                let actual = self.data.len();
                let v = self
                    .data
                    .read_f64::<LittleEndian>()
                    .map_err(|_| Error::LengthTooShort {
                        step: "decode F64",
                        actual,
                        expected: 8,
                    })?;
                Element::F64(v)
            }
            Bin8 => {
                let len = self.read_len("decode Bin8 length", 1)?;
                Element::Bin(self.take("get Bin8 content", len)?)
            }
            Bin16 => {
                let len = self.read_len("decode Bin16 length", 2)?;
                Element::Bin(self.take("get Bin16 content", len)?)
            }
            Bin32 => {
                let len = self.read_len("decode Bin32 length", 4)?;
                Element::Bin(self.take("get Bin32 content", len)?)
            }
            FixStr(len) => self.take_str("get FixStr content", len as usize)?,
            Str8 => {
                let len = self.read_len("decode Str8 length", 1)?;
                if len <= 31 {
                    return Err(not_shortest("Str8 length", len));
                }
                self.take_str("get Str8 content", len)?
            }
            Str16 => {
                let len = self.read_len("decode Str16 length", 2)?;
                self.take_str("get Str16 content", len)?
            }
            Str32 => {
                let len = self.read_len("decode Str32 length", 4)?;
                self.take_str("get Str32 content", len)?
            }
            FixArray(len) => Element::Array(len as usize),
            Array8 => {
                let len = self.read_len("decode Array8 length", 1)?;
                if len <= 15 {
                    return Err(not_shortest("Array8 length", len));
                }
                Element::Array(self.container_len("Array8", len, 1)?)
            }
            Array16 => {
                let len = self.read_len("decode Array16 length", 2)?;
                Element::Array(self.container_len("Array16", len, 1)?)
            }
            Array32 => {
                let len = self.read_len("decode Array32 length", 4)?;
                Element::Array(self.container_len("Array32", len, 1)?)
            }
            FixMap(len) => Element::Map(len as usize),
            Map8 => {
                let len = self.read_len("decode Map8 length", 1)?;
                if len <= 15 {
                    return Err(not_shortest("Map8 length", len));
                }
                Element::Map(self.container_len("Map8", len, 2)?)
            }
            Map16 => {
                let len = self.read_len("decode Map16 length", 2)?;
                Element::Map(self.container_len("Map16", len, 2)?)
            }
            Map32 => {
                let len = self.read_len("decode Map32 length", 4)?;
                Element::Map(self.container_len("Map32", len, 2)?)
            }
        };
        self.depth_tracking.update_elem(&elem)?;
        Ok(elem)
    }
}

impl<'a> std::iter::Iterator for Parser<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.errored {
            return None;
        }
        let (&marker, data) = self.data.split_first()?;
        self.data = data;
        let result = self.parse_element(Marker::from_u8(marker));
        if result.is_err() {
            self.errored = true;
        }
        Some(result)
    }
}
