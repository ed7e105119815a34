use std::collections::BTreeMap;

use bytes::{Buf, BufMut, BytesMut};

use super::Xmms2Error;
use super::protocol::{MAX_VALUE_DEPTH, value_type};

/// A serialized XMMS2 value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// No value
    None,
    /// Error message
    Error(String),
    /// Signed integer
    Int(i64),
    /// UTF-8 string
    String(String),
    /// Raw bytes
    Binary(Vec<u8>),
    /// Ordered values
    List(Vec<Value>),
    /// String-keyed values
    Dict(BTreeMap<String, Value>),
}

impl Value {
    /// Name of the value's type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Error(_) => "error",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            Self::List(_) => "list",
            Self::Dict(_) => "dict",
        }
    }

    /// The integer carried by this value
    ///
    /// # Errors
    /// Returns `Xmms2Error::UnexpectedValue` for any other type
    pub fn as_int(&self) -> Result<i64, Xmms2Error> {
        match self {
            Self::Int(value) => Ok(*value),
            other => Err(other.unexpected("int")),
        }
    }

    /// The string carried by this value
    ///
    /// # Errors
    /// Returns `Xmms2Error::UnexpectedValue` for any other type
    pub fn as_str(&self) -> Result<&str, Xmms2Error> {
        match self {
            Self::String(value) => Ok(value),
            other => Err(other.unexpected("string")),
        }
    }

    /// The entries carried by this value
    ///
    /// # Errors
    /// Returns `Xmms2Error::UnexpectedValue` for any other type
    pub fn as_dict(&self) -> Result<&BTreeMap<String, Value>, Xmms2Error> {
        match self {
            Self::Dict(entries) => Ok(entries),
            other => Err(other.unexpected("dict")),
        }
    }

    fn unexpected(&self, expected: &'static str) -> Xmms2Error {
        Xmms2Error::UnexpectedValue {
            expected,
            found: self.type_name(),
        }
    }

    /// Append the tagged wire form of this value to `dst`
    pub fn encode(&self, dst: &mut BytesMut) {
        match self {
            Self::None => dst.put_u32(value_type::NONE),
            Self::Error(message) => {
                dst.put_u32(value_type::ERROR);
                put_string(dst, message);
            }
            Self::Int(value) => {
                dst.put_u32(value_type::INT64);
                dst.put_i64(*value);
            }
            Self::String(value) => {
                dst.put_u32(value_type::STRING);
                put_string(dst, value);
            }
            Self::Binary(data) => {
                dst.put_u32(value_type::BIN);
                dst.put_u32(wire_len(data.len()));
                dst.put_slice(data);
            }
            Self::List(items) => {
                dst.put_u32(value_type::LIST);
                dst.put_u32(value_type::NONE);
                dst.put_u32(wire_len(items.len()));
                for item in items {
                    item.encode(dst);
                }
            }
            Self::Dict(entries) => {
                dst.put_u32(value_type::DICT);
                dst.put_u32(wire_len(entries.len()));
                for (key, value) in entries {
                    put_string(dst, key);
                    value.encode(dst);
                }
            }
        }
    }

    /// Read one tagged value from the front of `src`
    ///
    /// # Errors
    /// Returns `Xmms2Error::Protocol` when the bytes are truncated, carry an
    /// unknown type tag, or nest too deeply
    pub fn decode(src: &mut impl Buf) -> Result<Self, Xmms2Error> {
        decode_at(src, 0)
    }
}

fn decode_at(src: &mut impl Buf, depth: usize) -> Result<Value, Xmms2Error> {
    if depth > MAX_VALUE_DEPTH {
        return Err(Xmms2Error::protocol("value nesting too deep"));
    }

    match take_u32(src)? {
        value_type::NONE => Ok(Value::None),
        value_type::ERROR => Ok(Value::Error(take_string(src)?)),
        value_type::INT64 => {
            ensure(src, 8)?;
            Ok(Value::Int(src.get_i64()))
        }
        value_type::STRING => Ok(Value::String(take_string(src)?)),
        value_type::BIN => {
            let len = take_len(src)?;
            Ok(Value::Binary(src.copy_to_bytes(len).to_vec()))
        }
        value_type::LIST => {
            let _restrict = take_u32(src)?;
            let count = take_u32(src)?;
            let mut items = Vec::new();
            for _ in 0..count {
                items.push(decode_at(src, depth + 1)?);
            }
            Ok(Value::List(items))
        }
        value_type::DICT => {
            let count = take_u32(src)?;
            let mut entries = BTreeMap::new();
            for _ in 0..count {
                let key = take_string(src)?;
                let value = decode_at(src, depth + 1)?;
                entries.insert(key, value);
            }
            Ok(Value::Dict(entries))
        }
        value_type::COLL => Err(Xmms2Error::protocol("collections are not supported")),
        tag => Err(Xmms2Error::protocol(format!("unknown value type {tag}"))),
    }
}

fn wire_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

/// Strings travel with their trailing NUL, counted in the length
fn put_string(dst: &mut BytesMut, value: &str) {
    dst.put_u32(wire_len(value.len() + 1));
    dst.put_slice(value.as_bytes());
    dst.put_u8(0);
}

fn ensure(src: &impl Buf, needed: usize) -> Result<(), Xmms2Error> {
    if src.remaining() < needed {
        return Err(Xmms2Error::protocol(format!(
            "truncated value: need {needed} bytes, {} left",
            src.remaining()
        )));
    }
    Ok(())
}

fn take_u32(src: &mut impl Buf) -> Result<u32, Xmms2Error> {
    ensure(src, 4)?;
    Ok(src.get_u32())
}

fn take_len(src: &mut impl Buf) -> Result<usize, Xmms2Error> {
    let len = usize::try_from(take_u32(src)?)
        .map_err(|_| Xmms2Error::protocol("length does not fit in memory"))?;
    ensure(src, len)?;
    Ok(len)
}

fn take_string(src: &mut impl Buf) -> Result<String, Xmms2Error> {
    let len = take_len(src)?;
    let raw = src.copy_to_bytes(len);
    let text = raw.strip_suffix(&[0]).unwrap_or(&raw[..]);

    String::from_utf8(text.to_vec()).map_err(|e| Xmms2Error::protocol(format!("invalid string: {e}")))
}
