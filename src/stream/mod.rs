//! stream — forward-only cursor over the snapshot bytes.
//!
//! Все стадии разбора (header, base objects, clusters, roots) читают через один
//! `SnapshotStream`; позиция курсора — единственное изменяемое состояние чтения.
//!
//! Содержит:
//! - фиксированные LE-чтения (u8/u32/u64, сырые байты);
//! - bool / C-строки (NUL-terminated, UTF-8);
//! - varint-декодер (см. `varint.rs`).

use byteorder::{ByteOrder, LittleEndian};

use crate::consts::NUM_BYTES_PER_READ32;
use crate::error::{Result, SnapshotError};

mod varint;

/// Cursor over a borrowed snapshot buffer.
#[derive(Debug, Clone)]
pub struct SnapshotStream<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> SnapshotStream<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current byte offset from the start of the buffer.
    #[inline]
    pub fn tell(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Whole underlying buffer (independent of the cursor position).
    #[inline]
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        match self.buf.get(self.pos) {
            Some(&b) => {
                self.pos += 1;
                Ok(b)
            }
            None => Err(SnapshotError::TruncatedStream {
                offset: self.pos,
                needed: 1,
            }),
        }
    }

    /// Take the next `len` bytes as a view into the buffer.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(SnapshotError::TruncatedStream {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.read_bytes(4)?))
    }

    pub fn read_u64_le(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.read_bytes(8)?))
    }

    /// Exactly one byte: 0x00 → false, 0x01 → true.
    pub fn read_bool(&mut self) -> Result<bool> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(SnapshotError::InvalidBooleanEncoding { offset, value }),
        }
    }

    /// Bytes up to (not including) a NUL terminator, decoded as UTF-8.
    /// The cursor ends up right after the terminator.
    pub fn read_string(&mut self) -> Result<String> {
        let start = self.pos;
        let rest = &self.buf[self.pos..];
        let end = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(SnapshotError::MalformedString {
                offset: start,
                reason: "missing NUL terminator",
            })?;
        let s = std::str::from_utf8(&rest[..end]).map_err(|_| SnapshotError::MalformedString {
            offset: start,
            reason: "invalid utf-8",
        })?;
        self.pos += end + 1;
        Ok(s.to_string())
    }

    /// Class id: signed 32-bit varint.
    #[inline]
    pub fn read_cid(&mut self) -> Result<i32> {
        let offset = self.pos;
        let v = self.read_int(32)?;
        i32::try_from(v).map_err(|_| SnapshotError::VarintOverflow { offset })
    }

    /// Object reference: unsigned varint of unbounded width.
    #[inline]
    pub fn read_ref(&mut self) -> Result<u64> {
        self.read_unsigned()
    }

    #[inline]
    pub fn read_token_position(&mut self) -> Result<i64> {
        self.read_int(32)
    }

    /// Machine word assembled from `reads` unsigned 32-bit varints
    /// (low half first). Used by 32-bit targets.
    pub fn read_word_with_32bit_reads(&mut self, reads: usize) -> Result<u64> {
        let mut value = 0u64;
        for j in 0..reads {
            let part = self.read_unsigned_bits(32)?;
            let shift = j * NUM_BYTES_PER_READ32 * 8;
            if shift < 64 {
                value |= part << shift;
            }
        }
        Ok(value)
    }
}
