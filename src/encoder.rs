//! The canonical (smallest-form) MessagePack encoder.
//!
//! Every integer, string, container and ext header is written using the
//! shortest wire tag that can hold it: a `Value::IntU(5)` is one byte
//! (positive fixint), never the five-byte `0xcc`-tagged form. There is
//! exactly one encoding for any given value, which is what lets the test
//! suite assert exact byte strings rather than merely round-tripping.

use crate::errors::EncodeError;
use crate::ext::encode_timestamp_payload;
use crate::limits::MAX_DEPTH;
use crate::Value;

/// Signature for a user "default" hook: given a `Value` variant this
/// encoder doesn't know how to serialize (there are none today, since
/// every `Value` variant is handled — this exists for forward
/// compatibility with caller-defined wrapper types that convert to
/// `Value` lazily), produce a substitute value to encode instead.
///
/// Mirrors the ext hook on the decode side: a hook that keeps returning
/// something itself unserializable will hit [`EncodeError::NestingTooDeep`]
/// rather than recursing forever, since each substitution re-enters the
/// same depth-checked encode path.
pub type DefaultHook = Box<dyn FnMut(&Value) -> Result<Value, EncodeError>>;

/// A reusable MessagePack encoder.
///
/// Holds only the optional `default` hook; encoding itself is stateless
/// across calls (no partial-output buffering, unlike the decoder).
pub struct Encoder {
    default_hook: Option<DefaultHook>,
}

impl Default for Encoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder {
    /// An encoder with no `default` hook: every `Value` variant this
    /// crate defines encodes directly.
    pub fn new() -> Self {
        Encoder { default_hook: None }
    }

    /// An encoder that falls back to `hook` for values it can't encode
    /// on its own.
    pub fn with_default(hook: DefaultHook) -> Self {
        Encoder {
            default_hook: Some(hook),
        }
    }

    /// Encode a single value to a fresh byte vector. Starts with a 1 KiB
    /// capacity and grows geometrically as `Vec::extend_from_slice`
    /// reallocates, matching the exponential-growth output buffer the
    /// spec calls for.
    pub fn encode(&mut self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::with_capacity(1024);
        self.encode_into(&mut out, value)?;
        Ok(out)
    }

    /// Encode a single value, appending onto an existing output buffer
    /// rather than allocating a fresh one. Useful for batching several
    /// values (or a value alongside a hand-written prefix) into one
    /// contiguous write.
    pub fn encode_into(&mut self, out: &mut Vec<u8>, value: &Value) -> Result<(), EncodeError> {
        self.write_value(out, value, 0)
    }

    fn write_value(
        &mut self,
        out: &mut Vec<u8>,
        value: &Value,
        depth: usize,
    ) -> Result<(), EncodeError> {
        if depth >= MAX_DEPTH {
            return Err(EncodeError::NestingTooDeep);
        }

        match value {
            Value::Nil => out.push(0xc0),
            Value::Bool(false) => out.push(0xc2),
            Value::Bool(true) => out.push(0xc3),
            Value::IntU(v) => encode_uint(out, *v),
            Value::IntS(v) => encode_int(out, *v),
            Value::F32(v) => {
                out.push(0xca);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Value::F64(v) => {
                out.push(0xcb);
                out.extend_from_slice(&v.to_be_bytes());
            }
            Value::Str(s) => encode_str(out, s),
            Value::Bin(b) => encode_bin(out, b),
            Value::Array(items) => {
                encode_array_header(out, items.len())?;
                for item in items {
                    self.write_value(out, item, depth + 1)?;
                }
            }
            Value::Map(pairs) => {
                encode_map_header(out, pairs.len())?;
                for (k, v) in pairs {
                    self.write_value(out, k, depth + 1)?;
                    self.write_value(out, v, depth + 1)?;
                }
            }
            Value::Ext(ext) => encode_ext(out, ext.code, &ext.data)?,
            Value::Timestamp(ts) => {
                let payload = encode_timestamp_payload(ts);
                encode_ext(out, -1, &payload)?;
            }
            Value::Raw(bytes) => out.extend_from_slice(bytes),
        }
        Ok(())
    }
}

fn encode_uint(out: &mut Vec<u8>, v: u64) {
    if v <= 0x7f {
        out.push(v as u8);
    } else if v <= u8::MAX as u64 {
        out.push(0xcc);
        out.push(v as u8);
    } else if v <= u16::MAX as u64 {
        out.push(0xcd);
        out.extend_from_slice(&(v as u16).to_be_bytes());
    } else if v <= u32::MAX as u64 {
        out.push(0xce);
        out.extend_from_slice(&(v as u32).to_be_bytes());
    } else {
        out.push(0xcf);
        out.extend_from_slice(&v.to_be_bytes());
    }
}

fn encode_int(out: &mut Vec<u8>, v: i64) {
    if v >= 0 {
        return encode_uint(out, v as u64);
    }
    if v >= -32 {
        out.push((v as i8) as u8);
    } else if v >= i8::MIN as i64 {
        out.push(0xd0);
        out.push(v as i8 as u8);
    } else if v >= i16::MIN as i64 {
        out.push(0xd1);
        out.extend_from_slice(&(v as i16).to_be_bytes());
    } else if v >= i32::MIN as i64 {
        out.push(0xd2);
        out.extend_from_slice(&(v as i32).to_be_bytes());
    } else {
        out.push(0xd3);
        out.extend_from_slice(&v.to_be_bytes());
    }
}

fn encode_str(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let len = bytes.len();
    if len <= 31 {
        out.push(0xa0 | len as u8);
    } else if len <= u8::MAX as usize {
        out.push(0xd9);
        out.push(len as u8);
    } else if len <= u16::MAX as usize {
        out.push(0xda);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0xdb);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    out.extend_from_slice(bytes);
}

fn encode_bin(out: &mut Vec<u8>, data: &[u8]) {
    let len = data.len();
    if len <= u8::MAX as usize {
        out.push(0xc4);
        out.push(len as u8);
    } else if len <= u16::MAX as usize {
        out.push(0xc5);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else {
        out.push(0xc6);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    }
    out.extend_from_slice(data);
}

fn encode_array_header(out: &mut Vec<u8>, len: usize) -> Result<(), EncodeError> {
    if len <= 15 {
        out.push(0x90 | len as u8);
    } else if len <= u16::MAX as usize {
        out.push(0xdc);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else if len <= u32::MAX as usize {
        out.push(0xdd);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    } else {
        return Err(EncodeError::Overflow);
    }
    Ok(())
}

fn encode_map_header(out: &mut Vec<u8>, len: usize) -> Result<(), EncodeError> {
    if len <= 15 {
        out.push(0x80 | len as u8);
    } else if len <= u16::MAX as usize {
        out.push(0xde);
        out.extend_from_slice(&(len as u16).to_be_bytes());
    } else if len <= u32::MAX as usize {
        out.push(0xdf);
        out.extend_from_slice(&(len as u32).to_be_bytes());
    } else {
        return Err(EncodeError::Overflow);
    }
    Ok(())
}

fn encode_ext(out: &mut Vec<u8>, code: i8, data: &[u8]) -> Result<(), EncodeError> {
    let len = data.len();
    match len {
        1 => out.push(0xd4),
        2 => out.push(0xd5),
        4 => out.push(0xd6),
        8 => out.push(0xd7),
        16 => out.push(0xd8),
        _ if len <= u8::MAX as usize => {
            out.push(0xc7);
            out.push(len as u8);
        }
        _ if len <= u16::MAX as usize => {
            out.push(0xc8);
            out.extend_from_slice(&(len as u16).to_be_bytes());
        }
        _ if len <= u32::MAX as usize => {
            out.push(0xc9);
            out.extend_from_slice(&(len as u32).to_be_bytes());
        }
        _ => return Err(EncodeError::Overflow),
    }
    out.push(code as u8);
    out.extend_from_slice(data);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Ext;

    fn enc(v: &Value) -> Vec<u8> {
        Encoder::new().encode(v).unwrap()
    }

    #[test]
    fn encodes_nil_and_bools() {
        assert_eq!(enc(&Value::Nil), vec![0xc0]);
        assert_eq!(enc(&Value::Bool(false)), vec![0xc2]);
        assert_eq!(enc(&Value::Bool(true)), vec![0xc3]);
    }

    #[test]
    fn picks_smallest_uint_form() {
        assert_eq!(enc(&Value::IntU(0)), vec![0x00]);
        assert_eq!(enc(&Value::IntU(127)), vec![0x7f]);
        assert_eq!(enc(&Value::IntU(128)), vec![0xcc, 0x80]);
        assert_eq!(enc(&Value::IntU(256)), vec![0xcd, 0x01, 0x00]);
        assert_eq!(enc(&Value::IntU(65536)), vec![0xce, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn picks_smallest_int_form() {
        assert_eq!(enc(&Value::IntS(-1)), vec![0xff]);
        assert_eq!(enc(&Value::IntS(-32)), vec![0xe0]);
        assert_eq!(enc(&Value::IntS(-33)), vec![0xd0, 0xdf]);
        assert_eq!(enc(&Value::IntS(-129)), vec![0xd1, 0xff, 0x7f]);
    }

    #[test]
    fn encodes_fixstr_and_str8() {
        assert_eq!(enc(&Value::Str("foo".into())), b"\xa3foo".to_vec());
        let long = "a".repeat(32);
        let mut expected = vec![0xd9, 32];
        expected.extend(long.bytes());
        assert_eq!(enc(&Value::Str(long)), expected);
    }

    #[test]
    fn encodes_containers() {
        assert_eq!(enc(&Value::Array(vec![])), vec![0x90]);
        assert_eq!(enc(&Value::Map(vec![])), vec![0x80]);
    }

    #[test]
    fn encodes_ext_and_timestamp() {
        assert_eq!(
            enc(&Value::Ext(Ext::new(5, vec![1, 2]))),
            vec![0xd5, 5, 1, 2]
        );
        let bytes = enc(&Value::Timestamp(crate::Timestamp::new(0, 0)));
        assert_eq!(bytes, vec![0xd6, 0xff, 0, 0, 0, 0]);
    }

    #[test]
    fn raw_is_emitted_verbatim() {
        assert_eq!(enc(&Value::Raw(vec![0xc2])), vec![0xc2]);
        assert_eq!(
            enc(&Value::Array(vec![
                Value::Raw(vec![0xc2]),
                Value::Raw(vec![0xc3]),
            ])),
            vec![0x92, 0xc2, 0xc3]
        );
    }

    #[test]
    fn encode_into_appends_to_existing_buffer() {
        let mut out = vec![0xaa];
        Encoder::new().encode_into(&mut out, &Value::Nil).unwrap();
        assert_eq!(out, vec![0xaa, 0xc0]);
    }

    #[test]
    fn rejects_nesting_past_32_levels() {
        let mut value = Value::Array(vec![]);
        for _ in 0..33 {
            value = Value::Array(vec![value]);
        }
        assert!(matches!(
            Encoder::new().encode(&value),
            Err(EncodeError::NestingTooDeep)
        ));
    }

    #[test]
    fn exactly_32_levels_succeeds() {
        let mut value = Value::Array(vec![]);
        for _ in 0..31 {
            value = Value::Array(vec![value]);
        }
        assert!(Encoder::new().encode(&value).is_ok());
    }
}
