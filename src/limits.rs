//! Ceilings the decoder enforces on declared container/payload lengths,
//! checked against the header *before* any storage for the payload is
//! allocated.

/// Declared-length ceilings for the incremental decoder.
///
/// The defaults match the reference MessagePack implementation this crate
/// tracks byte-for-byte: an attacker (or a corrupted stream) cannot make
/// the decoder commit to an allocation bigger than these before a single
/// payload byte has been read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum `Value::Array` length. Default 10,000,000.
    pub array: u64,
    /// Maximum `Value::Map` length (entry count). Default 100,000.
    pub map: u64,
    /// Maximum `Value::Str` byte length. Default 128 MiB.
    pub str: u64,
    /// Maximum `Value::Bin` byte length. Default 128 MiB.
    pub bin: u64,
    /// Maximum `Value::Ext` payload byte length. Default 128 MiB.
    pub ext: u64,
}

const MIB_128: u64 = 128 * 1024 * 1024;

impl Default for Limits {
    fn default() -> Self {
        Limits {
            array: 10_000_000,
            map: 100_000,
            str: MIB_128,
            bin: MIB_128,
            ext: MIB_128,
        }
    }
}

/// Containers (arrays and maps) may nest at most this many levels deep,
/// on both the encode and decode paths.
pub const MAX_DEPTH: usize = 32;
