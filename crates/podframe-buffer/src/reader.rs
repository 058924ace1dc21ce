//! Block replay.
//!
//! Blocks are visited in write order with [`SerializationBuffer::read_block`];
//! fields of the current block are then pulled out in the order they were
//! written. Nothing checks that the reader's field list matches the
//! writer's: reads are only bounded by the message length.

use std::borrow::Cow;
use std::ops::Range;

use bytes::{Buf, Bytes};
use tracing::trace;

use crate::buffer::SerializationBuffer;
use crate::error::{BufferError, Result};
use crate::field::{decode_scalar, is_null_marker, Field, FieldKind, Scalar};
use crate::header::{HeaderMode, ID_PAD, LENGTH_FIELD_SIZE};

/// Position of the block reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadState {
    BeforeFirstBlock,
    /// `extent` covers id, length field and body.
    AtBlock {
        start: usize,
        extent: usize,
    },
    Exhausted,
}

/// Header of the block the reader is positioned on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    /// Raw id bytes: padded to the header length in fixed mode, without
    /// the terminator in variable mode.
    pub id: Bytes,
    /// Offset of the block's first header byte.
    pub offset: usize,
    /// Id region length, terminator included in variable mode.
    pub header_len: usize,
    /// Body size in bytes.
    pub body_len: usize,
    /// True when `id` carries fixed-mode padding.
    pub padded: bool,
}

impl BlockHeader {
    /// The id as text with fixed-mode padding trimmed.
    pub fn id_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.id_text())
    }

    /// True if the block was signed without an id.
    pub fn is_anonymous(&self) -> bool {
        self.id_text().is_empty()
    }

    fn id_text(&self) -> &[u8] {
        if !self.padded {
            return &self.id;
        }
        let end = self
            .id
            .iter()
            .rposition(|b| *b != ID_PAD)
            .map_or(0, |i| i + 1);
        &self.id[..end]
    }

    /// Full framed size: header, length field and body.
    pub fn extent(&self) -> usize {
        self.header_len + LENGTH_FIELD_SIZE + self.body_len
    }
}

impl SerializationBuffer {
    /// Advance to the next block.
    ///
    /// Returns `Ok(None)` once every block has been visited; that state is
    /// sticky until [`reset`](Self::reset).
    pub fn read_block(&mut self) -> Result<Option<BlockHeader>> {
        let start = match self.read {
            ReadState::BeforeFirstBlock => 0,
            ReadState::AtBlock { start, extent } => start + extent,
            ReadState::Exhausted => return Ok(None),
        };

        match self.parse_header(start) {
            Ok(Some(header)) => {
                self.read = ReadState::AtBlock {
                    start,
                    extent: header.extent(),
                };
                self.read_cursor = start + header.header_len + LENGTH_FIELD_SIZE;
                trace!(offset = start, body_len = header.body_len, "block read");
                Ok(Some(header))
            }
            Ok(None) => {
                self.read = ReadState::Exhausted;
                trace!(offset = start, "no more blocks");
                Ok(None)
            }
            Err(err) => {
                self.read = ReadState::Exhausted;
                Err(err)
            }
        }
    }

    /// Unread body bytes of the current block. Diagnostic only: reads are
    /// not stopped at the block boundary.
    pub fn body_remaining(&self) -> usize {
        match self.read {
            ReadState::AtBlock { start, extent } => (start + extent).saturating_sub(self.read_cursor),
            _ => 0,
        }
    }

    /// Read the next field, which must be of `kind`.
    ///
    /// Strings come back as `Field::Str(None)` when they hold the null marker.
    pub fn read_field(&mut self, kind: FieldKind) -> Result<Field> {
        let Some(size) = kind.fixed_size() else {
            return self.read_nullable_string().map(Field::Str);
        };
        let range = self.take(size)?;
        let offset = range.start;
        decode_scalar(kind, &self.data[range]).ok_or(BufferError::MalformedBlock {
            offset,
            reason: "field kind has no scalar encoding",
        })
    }

    /// Read the next field as a scalar of type `T`.
    pub fn read<T: Scalar>(&mut self) -> Result<T> {
        let offset = self.read_cursor;
        let field = self.read_field(T::KIND)?;
        T::from_field(field).ok_or(BufferError::MalformedBlock {
            offset,
            reason: "decoded field kind mismatch",
        })
    }

    /// Read a zero-terminated string. The null marker is returned verbatim.
    pub fn read_string(&mut self) -> Result<String> {
        self.ensure_positioned()?;
        let offset = self.read_cursor;
        let rest = self
            .data
            .get(offset..self.length)
            .ok_or(BufferError::ReadOverrun {
                offset,
                needed: 1,
                length: self.length,
            })?;
        let len = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or(BufferError::UnterminatedString { offset })?;

        let text = String::from_utf8(self.data[offset..offset + len].to_vec())?;
        self.read_cursor = offset + len + 1;
        Ok(text)
    }

    /// Read a string, mapping the null marker to `None`.
    pub fn read_nullable_string(&mut self) -> Result<Option<String>> {
        let text = self.read_string()?;
        Ok((!is_null_marker(&text)).then_some(text))
    }

    fn parse_header(&self, start: usize) -> Result<Option<BlockHeader>> {
        if start >= self.length {
            return Ok(None);
        }

        let (header_len, id_len) = match self.config.header_mode {
            HeaderMode::Fixed { len } => {
                // Ids never contain a zero byte, so a zero here is the
                // untouched tail of the region.
                if len > 0 && self.data[start] == 0 {
                    return Ok(None);
                }
                (len, len)
            }
            HeaderMode::Variable => {
                let id_len = self.data[start..self.length]
                    .iter()
                    .position(|b| *b == 0)
                    .ok_or(BufferError::MalformedBlock {
                        offset: start,
                        reason: "unterminated block id",
                    })?;
                (id_len + 1, id_len)
            }
        };

        let body_start = start + header_len + LENGTH_FIELD_SIZE;
        if body_start > self.length {
            return Err(BufferError::MalformedBlock {
                offset: start,
                reason: "header runs past message end",
            });
        }

        let mut len_field = &self.data[start + header_len..body_start];
        let body_len = len_field.get_u32_ne() as usize;
        if body_start + body_len > self.length {
            return Err(BufferError::MalformedBlock {
                offset: start,
                reason: "body runs past message end",
            });
        }

        Ok(Some(BlockHeader {
            id: Bytes::copy_from_slice(&self.data[start..start + id_len]),
            offset: start,
            header_len,
            body_len,
            padded: self.config.header_mode.is_fixed(),
        }))
    }

    fn ensure_positioned(&self) -> Result<()> {
        match self.read {
            ReadState::AtBlock { .. } => Ok(()),
            _ => Err(BufferError::NoCurrentBlock),
        }
    }

    fn take(&mut self, needed: usize) -> Result<Range<usize>> {
        self.ensure_positioned()?;
        let offset = self.read_cursor;
        let end = offset
            .checked_add(needed)
            .filter(|end| *end <= self.length)
            .ok_or(BufferError::ReadOverrun {
                offset,
                needed,
                length: self.length,
            })?;
        self.read_cursor = end;
        Ok(offset..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BufferConfig;

    fn sample_blocks(mode: HeaderMode, initial_capacity: usize) -> SerializationBuffer {
        let mut buf = SerializationBuffer::new(BufferConfig {
            initial_capacity,
            header_mode: mode,
            ..BufferConfig::default()
        })
        .unwrap();
        for i in 0..2u8 {
            let id = format!("dev{}", i + 1);
            buf.write_block(Some(&id), |b| {
                b.write(4096i32 + i32::from(i))?;
                b.write(b'a' + i)?;
                b.write_string(None)?;
                b.write(b'A' + i)?;
                b.write(3.14f32 + f32::from(i))
            })
            .unwrap();
        }
        buf
    }

    #[test]
    fn concrete_two_block_scenario() {
        let mut buf = sample_blocks(HeaderMode::fixed(4), 4);
        assert!(buf.capacity() > 4);
        buf.reset();

        for i in 0..2u8 {
            let header = buf.read_block().unwrap().expect("block present");
            assert_eq!(header.id.as_ref(), format!("dev{}", i + 1).as_bytes());
            assert_eq!(buf.read::<i32>().unwrap(), 4096 + i32::from(i));
            assert_eq!(buf.read::<u8>().unwrap(), b'a' + i);
            assert_eq!(buf.read_nullable_string().unwrap(), None);
            assert_eq!(buf.read::<u8>().unwrap(), b'A' + i);
            assert_eq!(buf.read::<f32>().unwrap(), 3.14f32 + f32::from(i));
            assert_eq!(buf.body_remaining(), 0);
        }
        assert!(buf.read_block().unwrap().is_none());
        assert!(buf.read_block().unwrap().is_none());
    }

    #[test]
    fn variable_mode_replays_ids_of_any_length() {
        let mut buf = SerializationBuffer::with_header_mode(HeaderMode::Variable).unwrap();
        for id in ["a", "", "a-much-longer-device-name"] {
            buf.write_block(Some(id), |b| b.write_string(Some(id))).unwrap();
        }
        buf.reset();

        for id in ["a", "", "a-much-longer-device-name"] {
            let header = buf.read_block().unwrap().unwrap();
            assert_eq!(header.id.as_ref(), id.as_bytes());
            assert_eq!(header.header_len, id.len() + 1);
            assert_eq!(buf.read_string().unwrap(), id);
        }
        assert!(buf.read_block().unwrap().is_none());
    }

    #[test]
    fn skipping_fields_still_reaches_next_block() {
        let mut buf = sample_blocks(HeaderMode::fixed(4), 64);
        buf.reset();

        let first = buf.read_block().unwrap().unwrap();
        assert_eq!(first.body_len, 4 + 1 + 5 + 1 + 4);
        let second = buf.read_block().unwrap().unwrap();
        assert_eq!(second.offset, first.extent());
        assert_eq!(second.id_lossy(), "dev2");
    }

    #[test]
    fn anonymous_fixed_block() {
        let mut buf = SerializationBuffer::with_header_mode(HeaderMode::fixed(4)).unwrap();
        buf.write(1u8).unwrap();
        buf.sign_block(None).unwrap();
        buf.reset();

        let header = buf.read_block().unwrap().unwrap();
        assert!(header.is_anonymous());
        assert_eq!(header.id_lossy(), "");
        assert_eq!(header.id.as_ref(), b"    ");
    }

    #[test]
    fn padded_id_trimmed() {
        let mut buf = SerializationBuffer::with_header_mode(HeaderMode::fixed(8)).unwrap();
        buf.sign_block(Some("ab")).unwrap();
        buf.reset();

        let header = buf.read_block().unwrap().unwrap();
        assert_eq!(header.id.as_ref(), b"ab      ");
        assert_eq!(header.id_lossy(), "ab");
        assert!(!header.is_anonymous());
    }

    #[test]
    fn null_marker_read_verbatim_by_read_string() {
        let mut buf = sample_blocks(HeaderMode::fixed(4), 64);
        buf.reset();
        buf.read_block().unwrap();
        buf.read::<i32>().unwrap();
        buf.read::<u8>().unwrap();
        assert_eq!(buf.read_string().unwrap(), "NULL");
    }

    #[test]
    fn read_field_by_kind() {
        let mut buf = sample_blocks(HeaderMode::Variable, 64);
        buf.reset();
        buf.read_block().unwrap();

        let kinds = [
            FieldKind::I32,
            FieldKind::U8,
            FieldKind::Str,
            FieldKind::U8,
            FieldKind::F32,
        ];
        let fields: Vec<Field> = kinds
            .iter()
            .map(|kind| buf.read_field(*kind).unwrap())
            .collect();
        assert_eq!(
            fields,
            vec![
                Field::I32(4096),
                Field::U8(b'a'),
                Field::Str(None),
                Field::U8(b'A'),
                Field::F32(3.14),
            ]
        );
    }

    #[test]
    fn read_before_read_block_rejected() {
        let mut buf = sample_blocks(HeaderMode::fixed(4), 64);
        buf.reset();
        assert!(matches!(
            buf.read::<i32>(),
            Err(BufferError::NoCurrentBlock)
        ));
    }

    #[test]
    fn read_past_message_end_rejected() {
        let mut buf = SerializationBuffer::with_header_mode(HeaderMode::fixed(4)).unwrap();
        buf.write(1u16).unwrap();
        buf.sign_block(Some("dev1")).unwrap();
        buf.reset();
        buf.read_block().unwrap().unwrap();

        let err = buf.read::<u64>().unwrap_err();
        assert!(matches!(
            err,
            BufferError::ReadOverrun {
                offset: 8,
                needed: 8,
                length: 10
            }
        ));
    }

    #[test]
    fn overrun_into_next_block_is_not_detected() {
        let mut buf = sample_blocks(HeaderMode::fixed(4), 64);
        buf.reset();
        buf.read_block().unwrap();
        buf.read::<i32>().unwrap();
        buf.read::<u8>().unwrap();
        buf.read_string().unwrap();
        buf.read::<u8>().unwrap();
        buf.read::<f32>().unwrap();

        // The next bytes are block two's id; reading them is a caller error
        // that the format cannot see.
        assert_eq!(buf.read::<u8>().unwrap(), b'd');
    }

    #[test]
    fn empty_buffer_has_no_blocks() {
        let mut buf = SerializationBuffer::with_header_mode(HeaderMode::fixed(4)).unwrap();
        assert!(buf.read_block().unwrap().is_none());
    }

    #[test]
    fn replaced_contents_replay() {
        let source = sample_blocks(HeaderMode::fixed(4), 4);
        let mut target = SerializationBuffer::with_header_mode(HeaderMode::fixed(4)).unwrap();
        target.replace_contents(source.fetch_raw()).unwrap();
        target.reset();

        let mut ids = Vec::new();
        while let Some(header) = target.read_block().unwrap() {
            ids.push(header.id_lossy().into_owned());
            assert_eq!(target.read::<i32>().unwrap() - 4096, ids.len() as i32 - 1);
        }
        assert_eq!(ids, ["dev1", "dev2"]);
    }

    #[test]
    fn truncated_body_is_malformed() {
        let source = sample_blocks(HeaderMode::fixed(4), 64);
        let raw = source.fetch_raw();
        let mut target = SerializationBuffer::with_header_mode(HeaderMode::fixed(4)).unwrap();
        target.replace_contents(&raw[..12]).unwrap();

        let err = target.read_block().unwrap_err();
        assert!(matches!(
            err,
            BufferError::MalformedBlock {
                offset: 0,
                reason: "body runs past message end"
            }
        ));
        assert!(target.read_block().unwrap().is_none());
    }

    #[test]
    fn variable_unterminated_id_is_malformed() {
        let mut target = SerializationBuffer::with_header_mode(HeaderMode::Variable).unwrap();
        target.replace_contents(b"dev").unwrap();
        assert!(matches!(
            target.read_block(),
            Err(BufferError::MalformedBlock { offset: 0, .. })
        ));
    }

    #[test]
    fn unterminated_string_detected() {
        let mut target = SerializationBuffer::with_header_mode(HeaderMode::fixed(0)).unwrap();
        let mut raw = 3u32.to_ne_bytes().to_vec();
        raw.extend_from_slice(b"abc");
        target.replace_contents(&raw).unwrap();

        target.read_block().unwrap().unwrap();
        assert!(matches!(
            target.read_string(),
            Err(BufferError::UnterminatedString { offset: 4 })
        ));
    }

    #[test]
    fn reset_then_replay_writes_identical_bytes() {
        for mode in [HeaderMode::fixed(4), HeaderMode::Variable] {
            let mut buf = sample_blocks(mode, 4);
            let first_pass = buf.fetch_raw().to_vec();
            let length = buf.len();
            let capacity = buf.capacity();

            buf.reset();
            for i in 0..2u8 {
                let id = format!("dev{}", i + 1);
                buf.write_block(Some(&id), |b| {
                    b.write(4096i32 + i32::from(i))?;
                    b.write(b'a' + i)?;
                    b.write_string(None)?;
                    b.write(b'A' + i)?;
                    b.write(3.14f32 + f32::from(i))
                })
                .unwrap();
            }

            assert_eq!(buf.fetch_raw(), first_pass.as_slice(), "{mode}");
            assert_eq!(buf.len(), length, "{mode}");
            assert_eq!(buf.capacity(), capacity, "{mode}");
        }
    }

    #[test]
    fn string_read_after_message_shrank_is_overrun() {
        let mut buf = sample_blocks(HeaderMode::fixed(4), 4);
        buf.reset();
        buf.read_block().unwrap().unwrap();
        buf.read_block().unwrap().unwrap();
        buf.read::<i32>().unwrap();
        buf.read::<u8>().unwrap();
        buf.read_string().unwrap();
        buf.read::<u8>().unwrap();
        buf.read::<f32>().unwrap();

        buf.write(1u8).unwrap();
        buf.sign_block(Some("dev3")).unwrap();
        assert_eq!(buf.len(), 9);

        assert!(matches!(
            buf.read_string(),
            Err(BufferError::ReadOverrun {
                offset: 46,
                needed: 1,
                length: 9
            })
        ));
        assert!(matches!(
            buf.read::<u8>(),
            Err(BufferError::ReadOverrun { length: 9, .. })
        ));
    }

    #[test]
    fn variable_ids_keep_trailing_spaces() {
        let mut buf = SerializationBuffer::with_header_mode(HeaderMode::Variable).unwrap();
        buf.write_block(Some("ab "), |b| b.write(1u8)).unwrap();
        buf.write_block(Some("  "), |b| b.write(2u8)).unwrap();
        buf.write_block(None, |b| b.write(3u8)).unwrap();
        buf.reset();

        let first = buf.read_block().unwrap().unwrap();
        assert!(!first.padded);
        assert_eq!(first.id_lossy(), "ab ");
        let second = buf.read_block().unwrap().unwrap();
        assert_eq!(second.id_lossy(), "  ");
        assert!(!second.is_anonymous());
        let third = buf.read_block().unwrap().unwrap();
        assert!(third.is_anonymous());
        assert_eq!(third.id_lossy(), "");
    }
}
