//! Block signing.
//!
//! Fixed mode: write the body, then `sign_block` fills in the header that
//! was reserved in front of it and reserves the next one.
//!
//! Variable mode: `sign_block` writes the header first, then the body is
//! written, then `finalize_block` fills in the body length.

use bytes::BufMut;
use tracing::trace;

use crate::buffer::SerializationBuffer;
use crate::error::{BufferError, Result};
use crate::header::{id_bytes, write_fixed_id, HeaderMode, LENGTH_FIELD_SIZE};

impl SerializationBuffer {
    /// Sign the current block with `id`. `None` and `""` mean "no id".
    ///
    /// In fixed mode this seals the body written since the previous
    /// signature. In variable mode this opens a new block and must be
    /// followed by the body and [`finalize_block`](Self::finalize_block).
    pub fn sign_block(&mut self, id: Option<&str>) -> Result<()> {
        let id = id_bytes(id)?;
        match self.config.header_mode {
            HeaderMode::Fixed { len } => self.seal_fixed(len, id),
            HeaderMode::Variable => self.open_variable(id),
        }
    }

    /// Seal a variable-mode block by writing its body length.
    pub fn finalize_block(&mut self) -> Result<()> {
        let mode = self.config.header_mode;
        if mode.is_fixed() {
            return Err(BufferError::WrongHeaderMode {
                operation: "finalize_block",
                mode,
            });
        }
        if !self.block_open {
            return Err(BufferError::NoOpenBlock);
        }

        let body_len = self.pending_body_len()?;
        self.put_body_len(body_len);
        self.close_block();
        trace!(body_len, length = self.length, "variable block finalized");
        Ok(())
    }

    /// Write one block regardless of header mode: `body` appends the
    /// fields, signing and finalizing happen around it as the mode needs.
    pub fn write_block<F>(&mut self, id: Option<&str>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        match self.config.header_mode {
            HeaderMode::Fixed { .. } => {
                body(self)?;
                self.sign_block(id)
            }
            HeaderMode::Variable => {
                self.sign_block(id)?;
                body(self)?;
                self.finalize_block()
            }
        }
    }

    fn seal_fixed(&mut self, header_len: usize, id: &[u8]) -> Result<()> {
        let body_len = self.pending_body_len()?;
        let reservation = header_len + LENGTH_FIELD_SIZE;

        // Make room for the next header before touching this one, so a
        // failed growth leaves the block unsigned rather than half-written.
        self.ensure_capacity(reservation)?;

        let start = self.block_start;
        write_fixed_id(&mut self.data[start..start + header_len], id);
        self.put_body_len(body_len);
        self.close_block();
        self.write_cursor += reservation;

        trace!(body_len, length = self.length, "fixed block signed");
        Ok(())
    }

    fn open_variable(&mut self, id: &[u8]) -> Result<()> {
        if self.block_open {
            return Err(BufferError::BlockAlreadyOpen {
                block_start: self.block_start,
            });
        }

        let header_len = self.config.header_mode.id_region_len(id);
        self.ensure_capacity(header_len + LENGTH_FIELD_SIZE)?;

        let start = self.block_start;
        self.data[start..start + id.len()].copy_from_slice(id);
        self.data[start + id.len()] = 0;
        self.data[start + header_len..start + header_len + LENGTH_FIELD_SIZE].fill(0);

        self.header_len = header_len;
        self.write_cursor = start + header_len + LENGTH_FIELD_SIZE;
        self.block_open = true;

        trace!(header_len, block_start = start, "variable block opened");
        Ok(())
    }

    fn pending_body_len(&self) -> Result<u32> {
        let body_len = self.write_cursor - self.block_start - self.header_len - LENGTH_FIELD_SIZE;
        u32::try_from(body_len).map_err(|_| BufferError::BlockTooLarge {
            size: body_len,
            max: u32::MAX as usize,
        })
    }

    fn put_body_len(&mut self, body_len: u32) {
        let at = self.block_start + self.header_len;
        let mut dst = &mut self.data[at..at + LENGTH_FIELD_SIZE];
        dst.put_u32_ne(body_len);
    }

    fn close_block(&mut self) {
        self.block_start = self.write_cursor;
        self.length = self.block_start;
        self.block_open = false;
    }
}
