//! Block header layouts.
//!
//! Every block starts with an id region followed by a 4-byte body length:
//!
//! ```text
//! ┌────────────────────┬───────────────────┬──────────────────────┐
//! │ Id (header_len B)  │ Body length       │ Body                 │
//! │                    │ (4B, host order)  │ (body length bytes)  │
//! └────────────────────┴───────────────────┴──────────────────────┘
//! ```
//!
//! The two modes differ only in how the id region is sized and filled.

use std::fmt;

use tracing::warn;

use crate::error::{BufferError, Result};

/// Size of the body length field that follows every id.
pub const LENGTH_FIELD_SIZE: usize = 4;

/// Upper bound for a fixed header length.
pub const MAX_FIXED_HEADER_LEN: usize = 64;

/// Fill byte for unused id bytes in fixed mode.
pub const ID_PAD: u8 = b' ';

/// How block ids are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    /// Every id occupies exactly `len` bytes, space-padded or truncated.
    /// The block is signed after its body has been written.
    Fixed { len: usize },
    /// Each id is written null-terminated, so its region is `id.len() + 1`
    /// bytes. The block is signed before the body and finalized after it.
    Variable,
}

impl HeaderMode {
    /// Fixed header mode with `len` clamped to [`MAX_FIXED_HEADER_LEN`].
    pub fn fixed(len: usize) -> Self {
        HeaderMode::Fixed { len }.normalized()
    }

    /// Returns the mode with its fixed length clamped into range.
    pub fn normalized(self) -> Self {
        match self {
            HeaderMode::Fixed { len } if len > MAX_FIXED_HEADER_LEN => {
                warn!(
                    requested = len,
                    max = MAX_FIXED_HEADER_LEN,
                    "fixed header length clamped"
                );
                HeaderMode::Fixed {
                    len: MAX_FIXED_HEADER_LEN,
                }
            }
            other => other,
        }
    }

    pub fn is_fixed(self) -> bool {
        matches!(self, HeaderMode::Fixed { .. })
    }

    /// Id region length for `id` under this mode.
    pub fn id_region_len(self, id: &[u8]) -> usize {
        match self {
            HeaderMode::Fixed { len } => len,
            HeaderMode::Variable => id.len() + 1,
        }
    }
}

impl fmt::Display for HeaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderMode::Fixed { len } => write!(f, "fixed({len})"),
            HeaderMode::Variable => f.write_str("variable"),
        }
    }
}

/// Normalize an optional caller id to bytes. `None` and `""` are both
/// "no id"; ids may not contain a zero byte.
pub(crate) fn id_bytes(id: Option<&str>) -> Result<&[u8]> {
    let bytes = id.map(str::as_bytes).unwrap_or_default();
    if bytes.contains(&0) {
        return Err(BufferError::InvalidId);
    }
    Ok(bytes)
}

/// Fill `dst` with `id`, truncating or padding with [`ID_PAD`].
pub(crate) fn write_fixed_id(dst: &mut [u8], id: &[u8]) {
    let n = id.len().min(dst.len());
    dst[..n].copy_from_slice(&id[..n]);
    dst[n..].fill(ID_PAD);
}
