//! The MessagePack extension mechanism: a user type code plus an opaque
//! payload, and the single reserved code (`-1`) that denotes a [`Timestamp`].

use crate::{DecodeError, Value};

#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A MessagePack extension value: a signed type code plus opaque data.
///
/// Equality and hashing are by `(code, data)`. Unlike most value types in
/// this crate `Ext` deliberately does not implement `PartialOrd`/`Ord` —
/// extensions carry no inherent order, and the reference implementation
/// this crate tracks rejects `<`/`>` on them for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde_crate"))]
pub struct Ext {
    /// The extension type code. Negative codes are reserved by the
    /// MessagePack spec; presently only `-1` (timestamp) is defined.
    pub code: i8,
    /// The extension payload, exactly as it appears on the wire.
    pub data: Vec<u8>,
}

impl Ext {
    /// Construct a new extension value.
    pub fn new(code: i8, data: Vec<u8>) -> Self {
        Ext { code, data }
    }

    /// True if this ext *could* be interpreted as a [`Timestamp`]: code
    /// `-1` and a payload length the format reserves for timestamps (4, 8,
    /// or 12 bytes).
    pub fn is_timestamp(&self) -> bool {
        self.code == -1 && matches!(self.data.len(), 4 | 8 | 12)
    }

    /// Interpret this ext's payload as a [`Timestamp`], regardless of
    /// `code` (callers that already know they're holding a timestamp ext
    /// can skip the `code == -1` check `is_timestamp` performs).
    ///
    /// Fails if the payload length isn't one of the three lengths the
    /// MessagePack spec reserves for timestamps.
    pub fn to_timestamp(&self) -> Result<Timestamp, DecodeError> {
        decode_timestamp_payload(&self.data)
            .ok_or(DecodeError::InvalidTimestampLength(self.data.len()))
    }

    /// Passthrough: hand the ext back unchanged, wrapped as a [`Value`].
    /// Exists so an `ext_hook` can fall through to the default behavior
    /// for codes it doesn't recognize: `return ext.default()`.
    pub fn default_value(self) -> Value {
        Value::Ext(self)
    }
}

/// A MessagePack timestamp: a Unix epoch offset plus a nanosecond
/// fraction, exactly as the wire format represents it. Round-trips
/// through extension code `-1`.
///
/// Ordered and hashable so it can serve as a map key or a `BTreeMap`/
/// `HashMap` value like any other scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(crate = "serde_crate"))]
pub struct Timestamp {
    /// Seconds since the Unix epoch. May be negative (before 1970).
    pub seconds: i64,
    /// Nanoseconds within the second, `0..1_000_000_000`.
    pub nanoseconds: u32,
}

impl Timestamp {
    /// Construct a new timestamp.
    pub fn new(seconds: i64, nanoseconds: u32) -> Self {
        Timestamp {
            seconds,
            nanoseconds,
        }
    }

    /// Convert to [`std::time::SystemTime`], the closest stdlib
    /// equivalent. A thin value-level accessor, not a full calendar
    /// library: callers that need locale/calendar-aware formatting
    /// should convert further with a dedicated date/time crate.
    ///
    /// Returns `None` if `seconds` is negative and magnitude exceeds what
    /// `SystemTime::UNIX_EPOCH - Duration` can represent on this
    /// platform (pre-1970 timestamps underflow on some targets).
    pub fn to_system_time(&self) -> Option<std::time::SystemTime> {
        use std::time::{Duration, SystemTime};
        if self.seconds >= 0 {
            SystemTime::UNIX_EPOCH
                .checked_add(Duration::new(self.seconds as u64, self.nanoseconds))
        } else {
            SystemTime::UNIX_EPOCH
                .checked_sub(Duration::new((-self.seconds) as u64, 0))
                .and_then(|t| t.checked_add(Duration::new(0, self.nanoseconds)))
        }
    }
}

/// Decode a timestamp ext payload per the MessagePack spec's three
/// fixed-width encodings. Returns `None` for any other length.
pub(crate) fn decode_timestamp_payload(data: &[u8]) -> Option<Timestamp> {
    match data.len() {
        4 => {
            let seconds = u32::from_be_bytes(data.try_into().ok()?);
            Some(Timestamp::new(seconds as i64, 0))
        }
        8 => {
            let packed = u64::from_be_bytes(data.try_into().ok()?);
            let nanoseconds = (packed >> 34) as u32;
            let seconds = (packed & 0x3_FFFF_FFFF) as i64;
            Some(Timestamp::new(seconds, nanoseconds))
        }
        12 => {
            let nanoseconds = u32::from_be_bytes(data[0..4].try_into().ok()?);
            let seconds = i64::from_be_bytes(data[4..12].try_into().ok()?);
            Some(Timestamp::new(seconds, nanoseconds))
        }
        _ => None,
    }
}

/// Encode a timestamp to the shortest of the three wire payload forms it
/// fits: 4 bytes (seconds only, `nanoseconds == 0`, `seconds` in `u32`
/// range), 8 bytes (`seconds` fits 34 bits, `nanoseconds` fits 30 bits),
/// or 12 bytes (the fully general form).
pub(crate) fn encode_timestamp_payload(ts: &Timestamp) -> Vec<u8> {
    const THIRTY_FOUR_BITS: u64 = 1 << 34;
    const THIRTY_BITS: u32 = 1 << 30;

    if ts.nanoseconds == 0 && ts.seconds >= 0 && ts.seconds <= u32::MAX as i64 {
        (ts.seconds as u32).to_be_bytes().to_vec()
    } else if ts.seconds >= 0 && (ts.seconds as u64) < THIRTY_FOUR_BITS && ts.nanoseconds < THIRTY_BITS
    {
        let packed = ((ts.nanoseconds as u64) << 34) | (ts.seconds as u64);
        packed.to_be_bytes().to_vec()
    } else {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&ts.nanoseconds.to_be_bytes());
        out.extend_from_slice(&ts.seconds.to_be_bytes());
        out
    }
}
