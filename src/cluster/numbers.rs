//! Mint / Double clusters.

use std::ops::Range;

use super::{AllocRange, ClusterDeserializer, DeserializationContext};
use crate::class_id::ClassId;
use crate::error::Result;
use crate::object::{ObjectData, ObjectRecord, RefIndex};

/// Integers: values are read at allocation; those that fit the target's Smi
/// range become `Smi`, the rest `Mint`. Fill reads nothing.
#[derive(Debug, Default)]
pub struct MintDeserializer {
    range: AllocRange,
}

impl ClusterDeserializer for MintDeserializer {
    fn cid(&self) -> ClassId {
        ClassId::MINT
    }

    fn read_alloc(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool) -> Result<()> {
        self.range.begin(ctx);
        let count = ctx.read_object_count()?;
        for _ in 0..count {
            let value = ctx.stream.read_int(64)?;
            let rec = if ctx.arch.is_valid_smi(value) {
                ObjectRecord::with_data(ClassId::SMI, is_canonical, ObjectData::Smi(value))
            } else {
                ObjectRecord::with_data(ClassId::MINT, is_canonical, ObjectData::Mint(value))
            };
            ctx.assign_ref(rec);
        }
        self.range.end(ctx);
        Ok(())
    }

    fn read_fill(&mut self, _ctx: &mut DeserializationContext<'_, '_>, _is_canonical: bool) -> Result<()> {
        Ok(())
    }

    fn range(&self) -> Range<RefIndex> {
        self.range.as_range()
    }
}

/// Doubles: placeholders at allocation, the 64-bit pattern (signed varint) at fill.
#[derive(Debug, Default)]
pub struct DoubleDeserializer {
    range: AllocRange,
}

impl ClusterDeserializer for DoubleDeserializer {
    fn cid(&self) -> ClassId {
        ClassId::DOUBLE
    }

    fn read_alloc(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool) -> Result<()> {
        self.range.begin(ctx);
        let count = ctx.read_object_count()?;
        for _ in 0..count {
            ctx.assign_ref(ObjectRecord::pending(ClassId::DOUBLE, is_canonical));
        }
        self.range.end(ctx);
        Ok(())
    }

    fn read_fill(&mut self, ctx: &mut DeserializationContext<'_, '_>, _is_canonical: bool) -> Result<()> {
        for r in self.range.as_range() {
            let bits = ctx.stream.read_int(64)? as u64;
            ctx.set_data(r, ObjectData::Double(f64::from_bits(bits)))?;
        }
        Ok(())
    }

    fn range(&self) -> Range<RefIndex> {
        self.range.as_range()
    }
}
