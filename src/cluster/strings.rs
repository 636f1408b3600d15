//! OneByteString / TwoByteString clusters (snapshots without code).
//!
//! alloc: [count] then [length] per string;
//! fill:  [length] then the code units: raw bytes for one-byte strings,
//!        16-bit units (signed varint, bit-cast) for two-byte strings.

use std::ops::Range;

use super::{AllocRange, ClusterDeserializer, DeserializationContext};
use crate::class_id::ClassId;
use crate::error::{Result, SnapshotError};
use crate::object::{ObjectData, ObjectRecord, RefIndex};

/// One UTF-16 unit: the writer bit-casts u16 to i16, so both ranges are accepted.
fn read_code_unit(ctx: &mut DeserializationContext<'_, '_>) -> Result<u16> {
    let offset = ctx.stream.tell();
    let v = ctx.stream.read_int(16)?;
    match i16::try_from(v) {
        Ok(unit) => Ok(unit as u16),
        Err(_) => u16::try_from(v).map_err(|_| SnapshotError::VarintOverflow { offset }),
    }
}

#[derive(Debug)]
pub struct StringDeserializer {
    cid: ClassId,
    range: AllocRange,
}

impl StringDeserializer {
    pub fn one_byte() -> Self {
        Self {
            cid: ClassId::ONE_BYTE_STRING,
            range: AllocRange::default(),
        }
    }

    pub fn two_byte() -> Self {
        Self {
            cid: ClassId::TWO_BYTE_STRING,
            range: AllocRange::default(),
        }
    }

    fn read_text(&self, ctx: &mut DeserializationContext<'_, '_>, length: usize) -> Result<String> {
        if self.cid == ClassId::ONE_BYTE_STRING {
            // Latin-1: байт == code point
            let bytes = ctx.stream.read_bytes(length)?;
            Ok(bytes.iter().map(|&b| char::from(b)).collect())
        } else {
            let mut units = Vec::with_capacity(length.min(ctx.stream.remaining()));
            for _ in 0..length {
                units.push(read_code_unit(ctx)?);
            }
            Ok(String::from_utf16_lossy(&units))
        }
    }
}

impl ClusterDeserializer for StringDeserializer {
    fn cid(&self) -> ClassId {
        self.cid
    }

    fn read_alloc(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool) -> Result<()> {
        self.range.begin(ctx);
        let count = ctx.read_object_count()?;
        for _ in 0..count {
            let _length = ctx.read_count()?;
            ctx.assign_ref(ObjectRecord::pending(self.cid, is_canonical));
        }
        self.range.end(ctx);
        Ok(())
    }

    fn read_fill(&mut self, ctx: &mut DeserializationContext<'_, '_>, _is_canonical: bool) -> Result<()> {
        for r in self.range.as_range() {
            let length = ctx.read_count()?;
            let text = self.read_text(ctx, length)?;
            ctx.set_data(r, ObjectData::String(text))?;
        }
        Ok(())
    }

    fn range(&self) -> Range<RefIndex> {
        self.range.as_range()
    }
}
