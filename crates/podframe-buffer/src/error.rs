use std::collections::TryReserveError;

use crate::header::HeaderMode;

/// Errors that can occur while writing or replaying a serialization buffer.
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    /// Growing the buffer could not obtain memory. The buffer is unchanged
    /// but the write that needed the room did not happen.
    #[error("allocation of {requested} bytes failed: {source}")]
    AllocationFailure {
        requested: usize,
        source: TryReserveError,
    },

    /// The requested size cannot be represented (cursor arithmetic overflow).
    #[error("requested capacity overflows usize (cursor {cursor}, additional {additional})")]
    CapacityOverflow { cursor: usize, additional: usize },

    /// Growth would exceed the configured capacity ceiling.
    #[error("capacity limit reached ({requested} bytes requested, max {max})")]
    CapacityLimit { requested: usize, max: usize },

    /// The buffer configuration is unusable.
    #[error("invalid buffer configuration: {0}")]
    InvalidConfig(&'static str),

    /// A block id contains a zero byte and cannot be framed.
    #[error("block id contains a zero byte")]
    InvalidId,

    /// A string field contains a zero byte and would be truncated on read.
    #[error("string field contains an interior zero byte at {position}")]
    InteriorNul { position: usize },

    /// The block body does not fit the 4-byte length field.
    #[error("block body too large ({size} bytes, max {max})")]
    BlockTooLarge { size: usize, max: usize },

    /// The operation does not exist for this header mode.
    #[error("{operation} is not available in {mode} header mode")]
    WrongHeaderMode {
        operation: &'static str,
        mode: HeaderMode,
    },

    /// A variable-header block was signed while another is still open.
    #[error("a block is already open at offset {block_start}")]
    BlockAlreadyOpen { block_start: usize },

    /// A variable-header operation needs a block opened by `sign_block`.
    #[error("no block is open (call sign_block first)")]
    NoOpenBlock,

    /// A field read would run past the end of the message.
    #[error("read of {needed} bytes at offset {offset} overruns message length {length}")]
    ReadOverrun {
        offset: usize,
        needed: usize,
        length: usize,
    },

    /// A field read was attempted before `read_block` positioned the cursor.
    #[error("no block is positioned for reading (call read_block first)")]
    NoCurrentBlock,

    /// A string field has no terminator before the end of the message.
    #[error("unterminated string at offset {offset}")]
    UnterminatedString { offset: usize },

    /// A string field is not valid UTF-8.
    #[error("string field is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// A block header points outside the message.
    #[error("malformed block at offset {offset}: {reason}")]
    MalformedBlock { offset: usize, reason: &'static str },

    /// Writing the buffer to a sink failed.
    #[error("buffer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BufferError>;
