//! Plain-old-data message framing buffer.
//!
//! Packs a sequence of named blocks into one contiguous, growable byte
//! region and replays them in write order. Every block is framed with:
//! - An id region (fixed width and space-padded, or null-terminated)
//! - A 4-byte host-order body length
//! - A body of untagged scalar and string fields
//!
//! The format carries no schema: both ends agree on the field order.

pub mod buffer;
pub mod config;
pub mod error;
pub mod field;
pub mod header;
pub mod reader;
pub mod writer;

pub use buffer::SerializationBuffer;
pub use config::{BufferConfig, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_CAPACITY};
pub use error::{BufferError, Result};
pub use field::{is_null_marker, Field, FieldKind, Scalar, UnknownFieldKind, NULL_MARKER};
pub use header::{HeaderMode, LENGTH_FIELD_SIZE, MAX_FIXED_HEADER_LEN};
pub use reader::BlockHeader;
