//! Glue that drives a [`Decoder`] from any [`std::io::Read`] implementor.
//!
//! This is the one place in the crate where bytes actually cross an I/O
//! boundary, so it's also the one place that logs: everything under
//! [`crate::buffer`], [`crate::decoder`] and [`crate::encoder`] is a pure
//! state machine and never touches `log`.

use std::io::Read;

use crate::decoder::{Decoder, ExtHook, Step};
use crate::errors::DecodeError;
use crate::limits::Limits;
use crate::Value;

/// Default chunk size for [`FileUnpacker::read`] calls, matching the
/// reference implementation's default.
pub const DEFAULT_READ_SIZE: usize = 4096;

/// Failures that can occur while driving a [`FileUnpacker`]: either the
/// underlying reader failed, or the bytes it produced didn't decode.
#[derive(Debug, thiserror::Error)]
pub enum FileUnpackerError {
    /// The wrapped reader's `read` call returned an error. The decoder
    /// keeps whatever it had already buffered, so a caller that can
    /// retry the read (e.g. after a transient failure) may call `next`
    /// again.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The bytes read so far failed to decode.
    #[error("{0}")]
    Decode(#[from] DecodeError),
}

/// Pulls bytes from a `Read` implementor on demand and decodes them.
///
/// On every [`Iterator::next`]: ask the decoder for a value; if it needs
/// more bytes, `read(read_size)` from the wrapped reader and feed the
/// result in. A zero-byte read is end-of-stream (`None`); a non-empty
/// read always makes progress, since the decoder only asks for more once
/// it has exhausted what's buffered.
pub struct FileUnpacker<R: Read> {
    reader: R,
    decoder: Decoder,
    read_size: usize,
    tuple: bool,
    read_buf: Vec<u8>,
}

impl<R: Read> FileUnpacker<R> {
    /// A file unpacker with the default read size, default limits, and
    /// no ext hook.
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DEFAULT_READ_SIZE, false, None, Limits::default())
    }

    /// A file unpacker with every option spelled out.
    pub fn with_options(
        reader: R,
        read_size: usize,
        tuple: bool,
        ext_hook: Option<ExtHook>,
        limits: Limits,
    ) -> Self {
        FileUnpacker {
            reader,
            decoder: Decoder::with_options(limits, ext_hook),
            read_size,
            tuple,
            read_buf: vec![0u8; read_size],
        }
    }

    /// Whether this unpacker was configured to report sequences as
    /// tuples rather than lists (see [`Value`]'s doc comment: the wire
    /// model doesn't distinguish the two, so this is a no-op on the
    /// value shape and exists for API parity with the reference
    /// implementation's `tuple=` keyword).
    pub fn is_tuple_mode(&self) -> bool {
        self.tuple
    }

    fn fill(&mut self) -> Result<bool, std::io::Error> {
        log::trace!("reading up to {} bytes", self.read_size);
        let n = self.reader.read(&mut self.read_buf)?;
        log::trace!("read {n} bytes");
        if n == 0 {
            return Ok(false);
        }
        self.decoder.push(&self.read_buf[..n]);
        Ok(true)
    }
}

impl<R: Read> Iterator for FileUnpacker<R> {
    type Item = Result<Value, FileUnpackerError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.decoder.step() {
                Ok(Step::Value(v)) => return Some(Ok(v)),
                Ok(Step::NeedMore) => match self.fill() {
                    Ok(true) => continue,
                    Ok(false) => return None,
                    Err(e) => return Some(Err(e.into())),
                },
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
