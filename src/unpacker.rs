//! In-memory feeding conveniences built on top of [`crate::Decoder`].
//!
//! `Unpacker` is the streaming multi-value API: `feed` bytes in as they
//! arrive, iterate over however many complete values that unlocks.
//! `unpackb` is the one-shot API: decode exactly one value from a
//! buffer that is known to hold exactly one, erroring on anything left
//! over or anything missing.

use crate::decoder::{Decoder, ExtHook, Step};
use crate::errors::DecodeError;
use crate::limits::Limits;
use crate::Value;

/// Decodes a stream of MessagePack values fed in incrementally.
///
/// Wraps a [`Decoder`]; the difference is purely ergonomic — `Unpacker`
/// exposes an `Iterator`-friendly `next_value` plus the one-shot
/// `unpackb`, rather than making every caller hand-roll a `step` loop.
pub struct Unpacker {
    decoder: Decoder,
    tuple: bool,
}

impl Default for Unpacker {
    fn default() -> Self {
        Self::new()
    }
}

impl Unpacker {
    /// An unpacker with default limits and no ext hook.
    pub fn new() -> Self {
        Unpacker {
            decoder: Decoder::new(),
            tuple: false,
        }
    }

    /// An unpacker with explicit limits and/or an ext hook.
    pub fn with_options(limits: Limits, ext_hook: Option<ExtHook>) -> Self {
        Unpacker {
            decoder: Decoder::with_options(limits, ext_hook),
            tuple: false,
        }
    }

    /// An unpacker that additionally reports whether sequences should be
    /// treated as immutable tuples downstream (see [`Value`]'s doc
    /// comment: this has no effect on the decoded shape itself, since
    /// Rust has no separate mutable/immutable `Vec` at this layer — it's
    /// tracked purely so callers mirroring the reference implementation's
    /// `tuple=` keyword have somewhere to read it back from).
    pub fn with_tuple_mode(limits: Limits, ext_hook: Option<ExtHook>, tuple: bool) -> Self {
        Unpacker {
            decoder: Decoder::with_options(limits, ext_hook),
            tuple,
        }
    }

    /// Whether this unpacker was constructed with `tuple` mode on.
    pub fn is_tuple_mode(&self) -> bool {
        self.tuple
    }

    /// Feed newly-arrived bytes in. Does not attempt to decode them;
    /// call `next_value` (or iterate) afterwards.
    pub fn feed(&mut self, data: &[u8]) {
        self.decoder.push(data);
    }

    /// Pull the next complete value out, if the buffered bytes add up
    /// to one. Returns `Ok(None)` rather than an error when there just
    /// isn't enough data yet.
    pub fn next_value(&mut self) -> Result<Option<Value>, DecodeError> {
        match self.decoder.step()? {
            Step::Value(v) => Ok(Some(v)),
            Step::NeedMore => Ok(None),
        }
    }

    /// Bytes buffered but not yet resolved into a value.
    pub fn available(&self) -> usize {
        self.decoder.available()
    }

    /// Decode exactly one value from `bytes`. Fails with
    /// [`DecodeError::Incomplete`] if `bytes` doesn't hold a full value,
    /// or [`DecodeError::ExtraData`] if it holds more than one.
    pub fn unpackb(&mut self, bytes: &[u8]) -> Result<Value, DecodeError> {
        self.feed(bytes);
        let value = match self.next_value()? {
            Some(v) => v,
            None => return Err(DecodeError::Incomplete),
        };
        if self.available() > 0 {
            return Err(DecodeError::ExtraData);
        }
        Ok(value)
    }
}

/// Iterates over however many complete values the buffered bytes
/// currently resolve to. Stops (returning `None`) on `NeedMore`, not on
/// end-of-input — the caller is expected to `feed` more and iterate
/// again once more bytes arrive.
impl Iterator for Unpacker {
    type Item = Result<Value, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_value() {
            Ok(Some(v)) => Some(Ok(v)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unpackb_roundtrips_a_single_value() {
        let bytes = crate::encode(&Value::IntU(42)).unwrap();
        let mut u = Unpacker::new();
        assert_eq!(u.unpackb(&bytes).unwrap(), Value::IntU(42));
    }

    #[test]
    fn unpackb_rejects_trailing_bytes() {
        let mut bytes = crate::encode(&Value::IntU(1)).unwrap();
        bytes.extend(crate::encode(&Value::IntU(2)).unwrap());
        let mut u = Unpacker::new();
        assert!(matches!(u.unpackb(&bytes), Err(DecodeError::ExtraData)));
    }

    #[test]
    fn iterates_multiple_queued_values() {
        let mut u = Unpacker::new();
        u.feed(&crate::encode(&Value::IntU(1)).unwrap());
        u.feed(&crate::encode(&Value::IntU(2)).unwrap());
        let values: Vec<_> = (&mut u).map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![Value::IntU(1), Value::IntU(2)]);
    }

    #[test]
    fn feeding_a_partial_value_yields_nothing_yet() {
        let bytes = crate::encode(&Value::Str("hello".into())).unwrap();
        let mut u = Unpacker::new();
        u.feed(&bytes[..bytes.len() - 1]);
        assert_eq!(u.next_value().unwrap(), None);
        u.feed(&bytes[bytes.len() - 1..]);
        assert_eq!(u.next_value().unwrap(), Some(Value::Str("hello".into())));
    }

    #[test]
    fn new_and_with_options_default_to_tuple_mode_off() {
        assert!(!Unpacker::new().is_tuple_mode());
        assert!(!Unpacker::with_options(Limits::default(), None).is_tuple_mode());
    }

    #[test]
    fn with_tuple_mode_reports_the_flag_back_without_changing_decoded_shape() {
        let mut u = Unpacker::with_tuple_mode(Limits::default(), None, true);
        assert!(u.is_tuple_mode());

        let bytes = crate::encode(&Value::Array(vec![Value::IntU(1), Value::IntU(2)])).unwrap();
        u.feed(&bytes);
        assert_eq!(
            u.next_value().unwrap(),
            Some(Value::Array(vec![Value::IntU(1), Value::IntU(2)]))
        );
    }
}
