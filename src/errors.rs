//! Error taxonomy for the encoder and decoder.
//!
//! Mirrors the kinds in the MessagePack wire contract: malformed input,
//! values that don't fit their declared bounds, nesting that runs away,
//! and the handful of places a caller-supplied hook can fail.

use crate::Ext;

/// Failures that can occur while turning a [`crate::Value`] into bytes.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    /// An integer value (or `Timestamp::seconds`) did not fit the wire's
    /// `[-2^63, 2^64-1]` range.
    #[error("int too big to convert")]
    Overflow,

    /// Containers nested more than 32 levels deep. A `default` hook that
    /// returns another non-encodable value re-enters this check, so a
    /// fixed-point hook terminates here rather than overflowing the stack.
    #[error("Deeply nested object")]
    NestingTooDeep,

    /// No `Value` variant matched the input and no `default` hook was
    /// configured (or the hook itself gave up).
    #[error("Unserializable '{0}' object")]
    Unserializable(&'static str),

    /// The output buffer could not be grown to hold the next write.
    #[error("out of memory")]
    Memory,

    /// A `default` hook raised while being asked to substitute a value.
    #[error("{0}")]
    Hook(String),
}

/// Failures that can occur while decoding MessagePack bytes.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Tag byte `0xc1`, reserved and never emitted by a conforming encoder.
    #[error("0xc1 byte must not be used")]
    ReservedByte,

    /// A one-shot `decode` call was given more bytes than one value needs.
    #[error("Extra data")]
    ExtraData,

    /// A one-shot `decode` call ran out of bytes mid-value.
    #[error("Incomplete MessagePack format")]
    Incomplete,

    /// An array header declared a length over the configured ceiling.
    #[error("list size {size} is too big (>{limit})")]
    ArrayTooBig { size: u64, limit: u64 },

    /// A map header declared a length over the configured ceiling.
    #[error("dict size {size} is too big (>{limit})")]
    MapTooBig { size: u64, limit: u64 },

    /// A str header declared a length over the configured ceiling.
    #[error("string size {size} is too big (>{limit})")]
    StrTooBig { size: u64, limit: u64 },

    /// A bin header declared a length over the configured ceiling.
    #[error("bytes size {size} is too big (>{limit})")]
    BinTooBig { size: u64, limit: u64 },

    /// An ext header declared a length over the configured ceiling.
    #[error("ext size {size} is too big (>{limit})")]
    ExtTooBig { size: u64, limit: u64 },

    /// A str payload was not valid UTF-8.
    #[error("invalid utf-8 in str payload")]
    InvalidUtf8,

    /// Containers nested more than 32 levels deep.
    #[error("Deeply nested object")]
    NestingTooDeep,

    /// A map key decoded to a `Value` variant that cannot serve as a key
    /// (a `Map` or an `Array`, neither of which has a stable hash). Carries
    /// the Python-style type name the reference implementation names in
    /// its error text (`"dict"` or `"list"`).
    #[error("unhashable type: '{0}'")]
    UnhashableKey(&'static str),

    /// `Ext::to_timestamp` was asked to interpret a payload whose length
    /// is not one of the three lengths the spec reserves for timestamps.
    #[error(
        "Invalid timestamp length {0}, allowed values are 4, 8 and 12 (see MessagePack specification)"
    )]
    InvalidTimestampLength(usize),

    /// A user `ext_hook` raised while being asked to interpret an [`Ext`].
    #[error("{message}")]
    Hook {
        /// The ext passed to the hook, retained for diagnostic replay.
        ext: Ext,
        /// The hook's error message.
        message: String,
    },

    /// The decoder hit a fatal error on a previous `step` call and will
    /// not attempt to resync on a corrupted stream; this replays the
    /// original error's message on every subsequent call.
    #[error("{0}")]
    Sticky(String),

    /// A length that passed its ceiling check still could not be
    /// allocated (e.g. an allocator-failure-injection harness in tests).
    /// Unlike the `*TooBig` variants, which reject a declared length
    /// before committing to an allocation, this is the (normally
    /// unreachable) case where the allocation attempt itself failed.
    #[error("out of memory")]
    Memory,
}
