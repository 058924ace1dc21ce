use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use bytes::Bytes;
use tracing::debug;

use crate::config::BufferConfig;
use crate::error::{BufferError, Result};
use crate::field::{Field, Scalar};
use crate::header::{HeaderMode, LENGTH_FIELD_SIZE};
use crate::reader::ReadState;

/// A growable byte region holding a sequence of framed blocks.
///
/// The region is always fully initialized: `capacity()` bytes exist and the
/// ones past `len()` are either zero or stale. All offsets are indices into
/// that region, so growth never invalidates them.
pub struct SerializationBuffer {
    pub(crate) data: Vec<u8>,
    /// Extent of all closed blocks (or of replaced contents).
    pub(crate) length: usize,
    pub(crate) write_cursor: usize,
    pub(crate) block_start: usize,
    pub(crate) header_len: usize,
    /// Variable mode only: a block has been signed but not finalized.
    pub(crate) block_open: bool,
    pub(crate) read: ReadState,
    pub(crate) read_cursor: usize,
    pub(crate) config: BufferConfig,
}

impl SerializationBuffer {
    /// Allocate a buffer with `config.initial_capacity` zeroed bytes.
    pub fn new(config: BufferConfig) -> Result<Self> {
        let config = BufferConfig {
            header_mode: config.header_mode.normalized(),
            ..config
        };
        if config.initial_capacity == 0 {
            return Err(BufferError::InvalidConfig("initial capacity must be non-zero"));
        }
        if config.initial_capacity > config.max_capacity {
            return Err(BufferError::InvalidConfig(
                "initial capacity exceeds max capacity",
            ));
        }

        let data = zeroed_region(config.initial_capacity)?;
        let mut buffer = Self {
            data,
            length: 0,
            write_cursor: 0,
            block_start: 0,
            header_len: 0,
            block_open: false,
            read: ReadState::BeforeFirstBlock,
            read_cursor: 0,
            config,
        };

        // Fixed mode keeps the first header region reserved at all times.
        // Capacity never shrinks, so `reset` can rely on this room existing.
        buffer.ensure_capacity(buffer.header_reservation())?;
        buffer.reset();
        Ok(buffer)
    }

    /// Allocate a buffer with default sizing and the given header mode.
    pub fn with_header_mode(header_mode: HeaderMode) -> Result<Self> {
        Self::new(BufferConfig::with_header_mode(header_mode))
    }

    /// Allocated size in bytes.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of meaningful bytes (closed blocks or replaced contents).
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn header_mode(&self) -> HeaderMode {
        self.config.header_mode
    }

    /// Id region length of the block being written.
    pub fn header_len(&self) -> usize {
        self.header_len
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    pub fn block_start(&self) -> usize {
        self.block_start
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Double the allocation, keeping every byte at its offset.
    ///
    /// On error the buffer is left untouched.
    pub fn grow(&mut self) -> Result<()> {
        let old_capacity = self.capacity();
        let new_capacity = old_capacity
            .checked_mul(2)
            .ok_or(BufferError::CapacityOverflow {
                cursor: self.write_cursor,
                additional: old_capacity,
            })?;
        if new_capacity > self.config.max_capacity {
            return Err(BufferError::CapacityLimit {
                requested: new_capacity,
                max: self.config.max_capacity,
            });
        }

        let mut region = Vec::new();
        region
            .try_reserve_exact(new_capacity)
            .map_err(|source| BufferError::AllocationFailure {
                requested: new_capacity,
                source,
            })?;
        region.extend_from_slice(&self.data);
        region.resize(new_capacity, 0);
        self.data = region;

        debug!(old_capacity, new_capacity, "serialization buffer grown");
        Ok(())
    }

    /// Grow until `additional` more bytes fit after the write cursor.
    ///
    /// Every `grow` doubles a non-zero capacity and fails past
    /// `max_capacity`, so this always terminates.
    pub fn ensure_capacity(&mut self, additional: usize) -> Result<()> {
        let required = self
            .write_cursor
            .checked_add(additional)
            .ok_or(BufferError::CapacityOverflow {
                cursor: self.write_cursor,
                additional,
            })?;
        while required >= self.capacity() {
            self.grow()?;
        }
        Ok(())
    }

    /// Seed the buffer from bytes produced elsewhere (e.g. a transport).
    ///
    /// Grows as needed, copies `bytes` to the start of the region, sets the
    /// message length and rewinds all cursors so blocks can be read.
    pub fn replace_contents(&mut self, bytes: &[u8]) -> Result<()> {
        while bytes.len() >= self.capacity() {
            self.grow()?;
        }
        self.data[..bytes.len()].copy_from_slice(bytes);
        self.length = bytes.len();
        self.reset();

        debug!(length = self.length, capacity = self.capacity(), "contents replaced");
        Ok(())
    }

    /// Rewind write and read cursors. Memory, bytes and length are kept.
    pub fn reset(&mut self) {
        self.block_start = 0;
        self.block_open = false;
        self.header_len = match self.config.header_mode {
            HeaderMode::Fixed { len } => len,
            HeaderMode::Variable => 0,
        };
        self.write_cursor = self.header_reservation();
        self.read = ReadState::BeforeFirstBlock;
        self.read_cursor = 0;
    }

    /// Rewind, zero the whole region and forget the message.
    pub fn clear(&mut self) {
        self.reset();
        self.data.fill(0);
        self.length = 0;
    }

    /// The message bytes, ready for an external encoder.
    pub fn fetch_raw(&self) -> &[u8] {
        &self.data[..self.length]
    }

    /// Owned copy of the message bytes.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(self.fetch_raw())
    }

    /// Write the whole allocated region, unused tail included.
    pub fn dump_to<W: Write>(&self, mut sink: W) -> Result<()> {
        sink.write_all(&self.data)?;
        sink.flush()?;
        Ok(())
    }

    /// Dump the allocated region into a file at `path`.
    pub fn dump_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        self.dump_to(BufWriter::new(file))?;
        debug!(path = %path.display(), bytes = self.capacity(), "buffer dumped");
        Ok(())
    }

    /// Append one field to the open block.
    pub fn write_field(&mut self, field: &Field) -> Result<()> {
        if let Field::Str(s) = field {
            return self.write_string(s.as_deref());
        }
        self.append(field.encoded_len(), |dst| field.encode(dst))
    }

    /// Append a scalar as its raw host-order bytes.
    pub fn write<T: Scalar>(&mut self, value: T) -> Result<()> {
        self.write_field(&value.into_field())
    }

    /// Append a zero-terminated string. `None` is written as `"NULL"`.
    pub fn write_string(&mut self, s: Option<&str>) -> Result<()> {
        if let Some(position) = s.and_then(|s| s.bytes().position(|b| b == 0)) {
            return Err(BufferError::InteriorNul { position });
        }
        match s {
            Some(s) => self.append(s.len() + 1, |dst| {
                dst[..s.len()].copy_from_slice(s.as_bytes());
                dst[s.len()] = 0;
            }),
            None => {
                let marker = Field::Str(None);
                self.append(marker.encoded_len(), |dst| marker.encode(dst))
            }
        }
    }

    /// Bytes reserved in front of the first body: the whole header in fixed
    /// mode, nothing in variable mode (`sign_block` writes it).
    pub(crate) fn header_reservation(&self) -> usize {
        match self.config.header_mode {
            HeaderMode::Fixed { len } => len + LENGTH_FIELD_SIZE,
            HeaderMode::Variable => 0,
        }
    }

    fn append(&mut self, n: usize, encode: impl FnOnce(&mut [u8])) -> Result<()> {
        if self.config.header_mode == HeaderMode::Variable && !self.block_open {
            return Err(BufferError::NoOpenBlock);
        }
        self.ensure_capacity(n)?;
        let start = self.write_cursor;
        encode(&mut self.data[start..start + n]);
        self.write_cursor = start + n;
        Ok(())
    }
}

impl std::fmt::Debug for SerializationBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializationBuffer")
            .field("mode", &self.config.header_mode)
            .field("capacity", &self.capacity())
            .field("length", &self.length)
            .field("write_cursor", &self.write_cursor)
            .field("block_start", &self.block_start)
            .finish()
    }
}

fn zeroed_region(capacity: usize) -> Result<Vec<u8>> {
    let mut region = Vec::new();
    region
        .try_reserve_exact(capacity)
        .map_err(|source| BufferError::AllocationFailure {
            requested: capacity,
            source,
        })?;
    region.resize(capacity, 0);
    Ok(region)
}
