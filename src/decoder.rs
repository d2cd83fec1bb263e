//! Incremental, push-based MessagePack decoder.
//!
//! Sans-I/O, in the same sense as this crate's teacher: [`Decoder`] never
//! reads from anywhere itself. A caller pushes whatever bytes it has, in
//! whatever slices it received them, and repeatedly calls [`Decoder::step`]
//! to pull out complete values. `step` never blocks; when the buffered
//! bytes don't yet add up to a full value it returns [`Step::NeedMore`]
//! and the caller is expected to `push` more and call `step` again.

use bitmatch::bitmatch;

use crate::buffer::ByteQueue;
use crate::errors::DecodeError;
use crate::ext::{decode_timestamp_payload, Ext};
use crate::limits::{Limits, MAX_DEPTH};
use crate::Value;

/// The result of one [`Decoder::step`] call.
#[derive(Debug)]
pub enum Step {
    /// A complete top-level value was assembled.
    Value(Value),
    /// Not enough buffered bytes to complete the current value; `push`
    /// more and call `step` again.
    NeedMore,
}

/// Dispatch for a single tag byte. Variable-length forms carry the
/// already-extracted length field (for the fixed-size forms, the
/// "length" is implied by the variant itself, not a header field).
enum TagInfo {
    Nil,
    False,
    True,
    Reserved,
    PosFixInt(u8),
    NegFixInt(i64),
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    FixStr(u32),
    Str8,
    Str16,
    Str32,
    Bin8,
    Bin16,
    Bin32,
    FixArray(u32),
    Array16,
    Array32,
    FixMap(u32),
    Map16,
    Map32,
    FixExt1,
    FixExt2,
    FixExt4,
    FixExt8,
    FixExt16,
    Ext8,
    Ext16,
    Ext32,
}

#[bitmatch]
fn decode_tag(tag: u8) -> TagInfo {
    #[bitmatch]
    match tag {
        "0vvv_vvvv" => TagInfo::PosFixInt(v),
        "1000_llll" => TagInfo::FixMap(l as u32),
        "1001_llll" => TagInfo::FixArray(l as u32),
        "101l_llll" => TagInfo::FixStr(l as u32),
        "1100_0000" => TagInfo::Nil,
        "1100_0001" => TagInfo::Reserved,
        "1100_0010" => TagInfo::False,
        "1100_0011" => TagInfo::True,
        "1100_0100" => TagInfo::Bin8,
        "1100_0101" => TagInfo::Bin16,
        "1100_0110" => TagInfo::Bin32,
        "1100_0111" => TagInfo::Ext8,
        "1100_1000" => TagInfo::Ext16,
        "1100_1001" => TagInfo::Ext32,
        "1100_1010" => TagInfo::F32,
        "1100_1011" => TagInfo::F64,
        "1100_1100" => TagInfo::U8,
        "1100_1101" => TagInfo::U16,
        "1100_1110" => TagInfo::U32,
        "1100_1111" => TagInfo::U64,
        "1101_0000" => TagInfo::I8,
        "1101_0001" => TagInfo::I16,
        "1101_0010" => TagInfo::I32,
        "1101_0011" => TagInfo::I64,
        "1101_0100" => TagInfo::FixExt1,
        "1101_0101" => TagInfo::FixExt2,
        "1101_0110" => TagInfo::FixExt4,
        "1101_0111" => TagInfo::FixExt8,
        "1101_1000" => TagInfo::FixExt16,
        "1101_1001" => TagInfo::Str8,
        "1101_1010" => TagInfo::Str16,
        "1101_1011" => TagInfo::Str32,
        "1101_1100" => TagInfo::Array16,
        "1101_1101" => TagInfo::Array32,
        "1101_1110" => TagInfo::Map16,
        "1101_1111" => TagInfo::Map32,
        "111v_vvvv" => TagInfo::NegFixInt(v as i64 - 32),
    }
}

/// An in-progress container on the decoder's assembly stack.
enum Frame {
    Array {
        remaining: u32,
        items: Vec<Value>,
    },
    Map {
        remaining: u32,
        items: Vec<(Value, Value)>,
        pending_key: Option<Value>,
    },
}

/// A decoded atom: either a finished scalar/composite [`Value`], or the
/// opening of a container whose children are decoded by subsequent calls.
enum Atom {
    Value(Value),
    OpenArray(u32),
    OpenMap(u32),
}

/// Signature for a user extension-type hook: given an [`Ext`], either
/// produce a substitute [`Value`] or fail. `Ext::default_value` lets the
/// hook fall through to "just keep the Ext" for codes it doesn't handle.
pub type ExtHook = Box<dyn FnMut(Ext) -> Result<Value, DecodeError>>;

/// The incremental MessagePack decoder.
///
/// Holds the byte queue, the in-progress container stack, and the
/// configured length ceilings / extension hook. `push` and `step` are
/// the entire API: there is no `read`, no thread, nothing that blocks.
pub struct Decoder {
    queue: ByteQueue,
    stack: Vec<Frame>,
    limits: Limits,
    ext_hook: Option<ExtHook>,
    /// Once a fatal error is observed the decoder stops trying: the
    /// reference implementation's streaming unpacker does not self-heal,
    /// and retrying past a corrupted tag byte would silently resync on
    /// garbage.
    fatal: Option<String>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    /// Construct a decoder with the default [`Limits`] and no ext hook.
    pub fn new() -> Self {
        Decoder {
            queue: ByteQueue::new(),
            stack: Vec::new(),
            limits: Limits::default(),
            ext_hook: None,
            fatal: None,
        }
    }

    /// Construct a decoder with explicit limits and an optional ext hook.
    pub fn with_options(limits: Limits, ext_hook: Option<ExtHook>) -> Self {
        Decoder {
            queue: ByteQueue::new(),
            stack: Vec::new(),
            limits,
            ext_hook,
            fatal: None,
        }
    }

    /// Push newly-arrived bytes into the decoder's queue.
    pub fn push(&mut self, data: &[u8]) {
        self.queue.push(data);
    }

    /// Bytes buffered but not yet consumed into a value.
    pub fn available(&self) -> usize {
        self.queue.available()
    }

    /// Attempt to produce the next complete top-level value.
    pub fn step(&mut self) -> Result<Step, DecodeError> {
        if let Some(message) = &self.fatal {
            return Err(sticky_error(message));
        }

        loop {
            let atom = match self.try_parse_atom() {
                Ok(Some(atom)) => atom,
                Ok(None) => return Ok(Step::NeedMore),
                Err(e) => {
                    self.fatal = Some(e.to_string());
                    return Err(e);
                }
            };

            match atom {
                Atom::OpenArray(len) => {
                    if self.stack.len() >= MAX_DEPTH {
                        let e = DecodeError::NestingTooDeep;
                        self.fatal = Some(e.to_string());
                        return Err(e);
                    }
                    self.stack.push(Frame::Array {
                        remaining: len,
                        items: Vec::with_capacity(len.min(1024) as usize),
                    });
                }
                Atom::OpenMap(len) => {
                    if self.stack.len() >= MAX_DEPTH {
                        let e = DecodeError::NestingTooDeep;
                        self.fatal = Some(e.to_string());
                        return Err(e);
                    }
                    self.stack.push(Frame::Map {
                        remaining: len,
                        items: Vec::with_capacity(len.min(1024) as usize),
                        pending_key: None,
                    });
                }
                Atom::Value(value) => match self.complete_value(value) {
                    Ok(Some(top)) => return Ok(Step::Value(top)),
                    Ok(None) => continue,
                    Err(e) => {
                        self.fatal = Some(e.to_string());
                        return Err(e);
                    }
                },
            }

            // A freshly-opened empty container closes immediately.
            if let Some(top) = self.close_empty_frames()? {
                return Ok(Step::Value(top));
            }
        }
    }

    /// Fold zero-length array/map frames at the top of the stack into
    /// their parent, repeating until the top frame still expects items
    /// (or the stack empties out and we have a finished top-level value).
    fn close_empty_frames(&mut self) -> Result<Option<Value>, DecodeError> {
        loop {
            let finished = matches!(
                self.stack.last(),
                Some(Frame::Array { remaining: 0, .. }) | Some(Frame::Map { remaining: 0, .. })
            );
            if !finished {
                return Ok(None);
            }
            let value = match self.stack.pop().unwrap() {
                Frame::Array { items, .. } => Value::Array(items),
                Frame::Map { items, .. } => Value::Map(items),
            };
            match self.complete_value(value)? {
                Some(top) => return Ok(Some(top)),
                None => continue,
            }
        }
    }

    /// Fold a just-completed value into the frame on top of the assembly
    /// stack, if any. Returns `Some(value)` once the value (or the chain
    /// of containers it closed out) has nowhere left to go but back to
    /// the caller.
    fn complete_value(&mut self, mut value: Value) -> Result<Option<Value>, DecodeError> {
        loop {
            match self.stack.last_mut() {
                None => return Ok(Some(value)),
                Some(Frame::Array { remaining, items }) => {
                    items.push(value);
                    *remaining -= 1;
                    if *remaining > 0 {
                        return Ok(None);
                    }
                    let Frame::Array { items, .. } = self.stack.pop().unwrap() else {
                        unreachable!()
                    };
                    value = Value::Array(items);
                }
                Some(Frame::Map {
                    remaining,
                    items,
                    pending_key,
                }) => {
                    if let Some(key) = pending_key.take() {
                        items.push((key, value));
                        *remaining -= 1;
                        if *remaining > 0 {
                            return Ok(None);
                        }
                        let Frame::Map { items, .. } = self.stack.pop().unwrap() else {
                            unreachable!()
                        };
                        value = Value::Map(items);
                    } else {
                        check_hashable(&value)?;
                        *pending_key = Some(value);
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Try to parse exactly one atom (scalar value or container header)
    /// from the front of the queue. Never consumes on a `NeedMore`.
    fn try_parse_atom(&mut self) -> Result<Option<Atom>, DecodeError> {
        let tag = match self.queue.peek_byte() {
            Some(b) => b,
            None => return Ok(None),
        };

        match decode_tag(tag) {
            TagInfo::Reserved => Err(DecodeError::ReservedByte),
            TagInfo::Nil => self.consume_fixed(1, |_| Atom::Value(Value::Nil)),
            TagInfo::False => self.consume_fixed(1, |_| Atom::Value(Value::Bool(false))),
            TagInfo::True => self.consume_fixed(1, |_| Atom::Value(Value::Bool(true))),
            TagInfo::PosFixInt(v) => {
                self.consume_fixed(1, move |_| Atom::Value(Value::IntU(v as u64)))
            }
            TagInfo::NegFixInt(v) => self.consume_fixed(1, move |_| Atom::Value(Value::IntS(v))),
            TagInfo::U8 => self.consume_fixed(2, |b| Atom::Value(Value::IntU(b[1] as u64))),
            TagInfo::U16 => self.consume_fixed(3, |b| {
                Atom::Value(Value::IntU(u16::from_be_bytes([b[1], b[2]]) as u64))
            }),
            TagInfo::U32 => self.consume_fixed(5, |b| {
                Atom::Value(Value::IntU(
                    u32::from_be_bytes([b[1], b[2], b[3], b[4]]) as u64
                ))
            }),
            TagInfo::U64 => self.consume_fixed(9, |b| {
                let mut a = [0u8; 8];
                a.copy_from_slice(&b[1..9]);
                Atom::Value(Value::IntU(u64::from_be_bytes(a)))
            }),
            TagInfo::I8 => self.consume_fixed(2, |b| Atom::Value(Value::IntS(b[1] as i8 as i64))),
            TagInfo::I16 => self.consume_fixed(3, |b| {
                Atom::Value(Value::IntS(i16::from_be_bytes([b[1], b[2]]) as i64))
            }),
            TagInfo::I32 => self.consume_fixed(5, |b| {
                Atom::Value(Value::IntS(
                    i32::from_be_bytes([b[1], b[2], b[3], b[4]]) as i64
                ))
            }),
            TagInfo::I64 => self.consume_fixed(9, |b| {
                let mut a = [0u8; 8];
                a.copy_from_slice(&b[1..9]);
                Atom::Value(Value::IntS(i64::from_be_bytes(a)))
            }),
            TagInfo::F32 => self.consume_fixed(5, |b| {
                Atom::Value(Value::F32(f32::from_be_bytes([b[1], b[2], b[3], b[4]])))
            }),
            TagInfo::F64 => self.consume_fixed(9, |b| {
                let mut a = [0u8; 8];
                a.copy_from_slice(&b[1..9]);
                Atom::Value(Value::F64(f64::from_be_bytes(a)))
            }),

            TagInfo::FixStr(len) => self.read_str_payload(1, len as u64),
            TagInfo::Str8 => match self.peek_len(1) {
                Some(len) => self.read_str_payload(2, len),
                None => Ok(None),
            },
            TagInfo::Str16 => match self.peek_len(2) {
                Some(len) => self.read_str_payload(3, len),
                None => Ok(None),
            },
            TagInfo::Str32 => match self.peek_len(4) {
                Some(len) => self.read_str_payload(5, len),
                None => Ok(None),
            },

            TagInfo::Bin8 => match self.peek_len(1) {
                Some(len) => self.read_bin_payload(2, len),
                None => Ok(None),
            },
            TagInfo::Bin16 => match self.peek_len(2) {
                Some(len) => self.read_bin_payload(3, len),
                None => Ok(None),
            },
            TagInfo::Bin32 => match self.peek_len(4) {
                Some(len) => self.read_bin_payload(5, len),
                None => Ok(None),
            },

            TagInfo::FixArray(len) => self.consume_fixed(1, move |_| Atom::OpenArray(len)),
            TagInfo::Array16 => self.open_container(2, true),
            TagInfo::Array32 => self.open_container(4, true),
            TagInfo::FixMap(len) => self.consume_fixed(1, move |_| Atom::OpenMap(len)),
            TagInfo::Map16 => self.open_container(2, false),
            TagInfo::Map32 => self.open_container(4, false),

            TagInfo::FixExt1 => self.read_ext_payload(1, 1),
            TagInfo::FixExt2 => self.read_ext_payload(1, 2),
            TagInfo::FixExt4 => self.read_ext_payload(1, 4),
            TagInfo::FixExt8 => self.read_ext_payload(1, 8),
            TagInfo::FixExt16 => self.read_ext_payload(1, 16),
            TagInfo::Ext8 => match self.peek_len(1) {
                Some(len) => self.read_ext_payload(2, len),
                None => Ok(None),
            },
            TagInfo::Ext16 => match self.peek_len(2) {
                Some(len) => self.read_ext_payload(3, len),
                None => Ok(None),
            },
            TagInfo::Ext32 => match self.peek_len(4) {
                Some(len) => self.read_ext_payload(5, len),
                None => Ok(None),
            },
        }
    }

    /// Consume exactly `total` bytes (tag included) if available, handing
    /// the whole slice to `build`. Returns `NeedMore` otherwise.
    fn consume_fixed(
        &mut self,
        total: usize,
        build: impl FnOnce(&[u8]) -> Atom,
    ) -> Result<Option<Atom>, DecodeError> {
        let Some(buf) = self.queue.peek(total) else {
            return Ok(None);
        };
        let atom = build(&buf);
        self.queue.consume(total);
        Ok(Some(atom))
    }

    /// Peek the `len_width`-byte big-endian length field that follows the
    /// tag byte, without consuming anything. Callers re-check
    /// availability against the *total* size (header + payload) before
    /// consuming.
    fn peek_len(&self, len_width: usize) -> Option<u64> {
        let header = 1 + len_width;
        let buf = self.queue.peek(header)?;
        Some(read_be_uint(&buf[1..]))
    }

    /// Read a string payload of `len` bytes, where `header_len` is the
    /// total number of bytes preceding the payload (tag + length field).
    fn read_str_payload(&mut self, header_len: usize, len: u64) -> Result<Option<Atom>, DecodeError> {
        if len > self.limits.str {
            return Err(DecodeError::StrTooBig {
                size: len,
                limit: self.limits.str,
            });
        }
        let total = header_len + len as usize;
        let Some(buf) = self.queue.peek(total) else {
            return Ok(None);
        };
        let s = std::str::from_utf8(&buf[header_len..])
            .map_err(|_| DecodeError::InvalidUtf8)?
            .to_owned();
        self.queue.consume(total);
        Ok(Some(Atom::Value(Value::Str(s))))
    }

    fn read_bin_payload(&mut self, header_len: usize, len: u64) -> Result<Option<Atom>, DecodeError> {
        if len > self.limits.bin {
            return Err(DecodeError::BinTooBig {
                size: len,
                limit: self.limits.bin,
            });
        }
        let total = header_len + len as usize;
        let Some(buf) = self.queue.peek(total) else {
            return Ok(None);
        };
        let bin = buf[header_len..].to_vec();
        self.queue.consume(total);
        Ok(Some(Atom::Value(Value::Bin(bin))))
    }

    fn open_container(
        &mut self,
        len_width: usize,
        is_array: bool,
    ) -> Result<Option<Atom>, DecodeError> {
        let total = 1 + len_width;
        let Some(buf) = self.queue.peek(total) else {
            return Ok(None);
        };
        let len = read_be_uint(&buf[1..]);
        let limit = if is_array {
            self.limits.array
        } else {
            self.limits.map
        };
        if len > limit {
            self.queue.consume(total);
            return Err(if is_array {
                DecodeError::ArrayTooBig { size: len, limit }
            } else {
                DecodeError::MapTooBig { size: len, limit }
            });
        }
        self.queue.consume(total);
        Ok(Some(if is_array {
            Atom::OpenArray(len as u32)
        } else {
            Atom::OpenMap(len as u32)
        }))
    }

    fn read_ext_payload(
        &mut self,
        header_len: usize,
        len: u64,
    ) -> Result<Option<Atom>, DecodeError> {
        if len > self.limits.ext {
            return Err(DecodeError::ExtTooBig {
                size: len,
                limit: self.limits.ext,
            });
        }
        // +1 for the ext type code, which sits right after the length field.
        let total = header_len + 1 + len as usize;
        let Some(buf) = self.queue.peek(total) else {
            return Ok(None);
        };
        let code = buf[header_len] as i8;
        let data = buf[header_len + 1..].to_vec();
        self.queue.consume(total);

        let ext = Ext::new(code, data);
        if let Some(hook) = &mut self.ext_hook {
            return Ok(Some(Atom::Value(hook(ext)?)));
        }
        if ext.code == -1 {
            if let Some(ts) = decode_timestamp_payload(&ext.data) {
                return Ok(Some(Atom::Value(Value::Timestamp(ts))));
            }
        }
        Ok(Some(Atom::Value(Value::Ext(ext))))
    }
}

/// Array/map length header checks consume the header before discovering
/// the size is oversized (the original implementation's error messages
/// name the declared size, which can only be known after reading it), so
/// the fatal path rebuilds a fresh error from the stored message text
/// rather than trying to keep the original `DecodeError` around (several
/// variants are not `Clone`-free, e.g. they'd need to re-box a hook
/// message).
fn sticky_error(message: &str) -> DecodeError {
    DecodeError::Sticky(message.to_owned())
}

fn read_be_uint(bytes: &[u8]) -> u64 {
    let mut v: u64 = 0;
    for &b in bytes {
        v = (v << 8) | b as u64;
    }
    v
}

fn check_hashable(value: &Value) -> Result<(), DecodeError> {
    match value {
        Value::Map(_) => Err(DecodeError::UnhashableKey("dict")),
        Value::Array(_) => Err(DecodeError::UnhashableKey("list")),
        _ => Ok(()),
    }
}
