//! A thin, reusable wrapper around [`crate::Encoder`] plus the
//! one-shot `packb` convenience.

use crate::encoder::{DefaultHook, Encoder};
use crate::errors::EncodeError;
use crate::Value;

/// Encodes values, optionally with a `default` hook for types the core
/// encoder doesn't know about.
///
/// Reusable across calls: unlike `Unpacker`, there's no internal buffer
/// to reset between values, since encoding never spans a `step`-style
/// partial-progress boundary.
pub struct Packer {
    encoder: Encoder,
}

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}

impl Packer {
    /// A packer with no `default` hook.
    pub fn new() -> Self {
        Packer {
            encoder: Encoder::new(),
        }
    }

    /// A packer that falls back to `hook` for values the core encoder
    /// can't represent directly.
    pub fn with_default(hook: DefaultHook) -> Self {
        Packer {
            encoder: Encoder::with_default(hook),
        }
    }

    /// Encode a single value to a fresh byte vector.
    pub fn packb(&mut self, value: &Value) -> Result<Vec<u8>, EncodeError> {
        self.encoder.encode(value)
    }
}
