//! A compact, sans-I/O implementation of the [MessagePack](https://msgpack.org/)
//! serialization format.
//!
//! The decoder is push-based: bytes are fed in through [`Decoder::push`]
//! (or one of the convenience wrappers, [`Unpacker`]/[`FileUnpacker`]) in
//! whatever chunks they arrive in, and [`Decoder::step`] is called
//! repeatedly to pull out complete values. Nothing in this crate blocks
//! or owns a socket; that's left entirely to the caller.
//!
//! Encoding always picks the smallest wire representation a value fits
//! ("canonical" MessagePack): a `u8` of `5` is written as a one-byte
//! positive fixint, never as a `0xcc`-tagged `u8`.
//!
//! Common abbreviations used throughout this crate:
//!
//! - BE: big-endian
//! - MSB: most significant bit

pub mod buffer;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod ext;
pub mod file_adapter;
pub mod limits;
pub mod packer;
pub mod unpacker;

pub use decoder::{Decoder, ExtHook, Step};
pub use encoder::{DefaultHook, Encoder};
pub use errors::{DecodeError, EncodeError};
pub use ext::{Ext, Timestamp};
pub use file_adapter::{FileUnpacker, FileUnpackerError};
pub use limits::{Limits, MAX_DEPTH};
pub use packer::Packer;
pub use unpacker::Unpacker;

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A decoded MessagePack value.
///
/// Integers keep their signedness from the wire rather than collapsing
/// to a single numeric tower: `IntU` covers values that needed an
/// unsigned encoding (including ones too big for `i64`), `IntS` covers
/// values written as signed. `Map` is a `Vec` of pairs, not a
/// `HashMap`, so duplicate keys and insertion order survive a decode —
/// callers that want dictionary semantics build one from the pairs
/// themselves.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde_crate"))]
pub enum Value {
    /// MessagePack `nil`.
    Nil,
    /// `true` or `false`.
    Bool(bool),
    /// An integer that was encoded (or will be encoded) in one of the
    /// unsigned wire forms: positive fixint, `u8`, `u16`, `u32`, `u64`.
    IntU(u64),
    /// An integer that was encoded (or will be encoded) in one of the
    /// signed wire forms: negative fixint, `i8`, `i16`, `i32`, `i64`.
    IntS(i64),
    /// A 32-bit IEEE-754 float.
    F32(f32),
    /// A 64-bit IEEE-754 float.
    F64(f64),
    /// A UTF-8 string.
    Str(String),
    /// Opaque binary data.
    Bin(Vec<u8>),
    /// An ordered sequence of values.
    Array(Vec<Value>),
    /// An ordered sequence of key/value pairs. Not a `HashMap`: wire
    /// order and duplicate keys are preserved verbatim.
    Map(Vec<(Value, Value)>),
    /// An extension value whose type code this crate doesn't interpret
    /// (or that an `ext_hook` explicitly passed through).
    Ext(Ext),
    /// A timestamp extension (code `-1`), promoted out of `Ext`
    /// automatically unless an `ext_hook` intercepts it first.
    Timestamp(Timestamp),
    /// An already-encoded MessagePack fragment, written to the output
    /// verbatim and unvalidated. Never produced by the decoder; exists
    /// purely as an encoder-side passthrough escape hatch, e.g. for
    /// embedding a pre-serialized sub-document without paying to decode
    /// and re-encode it.
    Raw(Vec<u8>),
}

impl Value {
    /// A short, stable name for this value's kind, used in error
    /// messages (`"Unserializable {kind} object"` and friends).
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "NoneType",
            Value::Bool(_) => "bool",
            Value::IntU(_) | Value::IntS(_) => "int",
            Value::F32(_) | Value::F64(_) => "float",
            Value::Str(_) => "str",
            Value::Bin(_) => "bytes",
            Value::Array(_) => "list",
            Value::Map(_) => "dict",
            Value::Ext(_) => "ext",
            Value::Timestamp(_) => "timestamp",
            Value::Raw(_) => "raw",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::IntS(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::IntU(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bin(v)
    }
}

/// Encode a single value to a fresh byte vector, using the smallest wire
/// form available at every step.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    Encoder::new().encode(value)
}

/// Encode a single value, falling back to `default` for any `Value` this
/// crate's encoder doesn't itself know how to turn into bytes.
///
/// Every variant `Value` defines today encodes directly, so `default` is
/// only reachable through a hook that recurses into its own substitute
/// (in which case depth-guard re-entry eventually rejects it); the hook
/// exists for forward compatibility with callers who grow their own
/// wrapper type around `Value` lazily.
pub fn encode_with_default(value: &Value, default: DefaultHook) -> Result<Vec<u8>, EncodeError> {
    Encoder::with_default(default).encode(value)
}

/// Decode exactly one value from `bytes`, failing if the buffer holds
/// anything less or more than a single complete value.
pub fn decode(bytes: &[u8]) -> Result<Value, DecodeError> {
    let mut unpacker = Unpacker::new();
    unpacker.unpackb(bytes)
}
