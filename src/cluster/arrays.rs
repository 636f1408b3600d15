//! Array-like clusters: Array / ImmutableArray, GrowableObjectArray, TypeArguments.
//!
//! Все поля-ссылки читаются в fill и могут указывать вперёд, на объекты
//! кластеров, выделенных позже.

use std::ops::Range;

use super::{AllocRange, ClusterDeserializer, DeserializationContext};
use crate::class_id::ClassId;
use crate::error::{Result, SnapshotError};
use crate::object::{ObjectData, ObjectRecord, RefIndex};

/// alloc: [count] + [length] per array; fill: [length][type_args ref][elements ref * length].
#[derive(Debug)]
pub struct ArrayDeserializer {
    cid: ClassId,
    range: AllocRange,
}

impl ArrayDeserializer {
    pub fn new(cid: ClassId) -> Self {
        Self {
            cid,
            range: AllocRange::default(),
        }
    }
}

impl ClusterDeserializer for ArrayDeserializer {
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
            let type_arguments = ctx.read_ref()?;
            let mut elements = Vec::with_capacity(length.min(ctx.stream.remaining()));
            for _ in 0..length {
                elements.push(ctx.read_ref()?);
            }
            ctx.set_data(
                r,
                ObjectData::Array {
                    type_arguments,
                    elements,
                },
            )?;
        }
        Ok(())
    }

    fn range(&self) -> Range<RefIndex> {
        self.range.as_range()
    }
}

/// alloc: [count]; fill: [type_args ref][length ref][data ref].
#[derive(Debug, Default)]
pub struct GrowableArrayDeserializer {
    range: AllocRange,
}

impl ClusterDeserializer for GrowableArrayDeserializer {
    fn cid(&self) -> ClassId {
        ClassId::GROWABLE_OBJECT_ARRAY
    }

    fn read_alloc(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool) -> Result<()> {
        self.range.begin(ctx);
        let count = ctx.read_object_count()?;
        for _ in 0..count {
            ctx.assign_ref(ObjectRecord::pending(ClassId::GROWABLE_OBJECT_ARRAY, is_canonical));
        }
        self.range.end(ctx);
        Ok(())
    }

    fn read_fill(&mut self, ctx: &mut DeserializationContext<'_, '_>, _is_canonical: bool) -> Result<()> {
        for r in self.range.as_range() {
            let type_arguments = ctx.read_ref()?;
            let length = ctx.read_ref()?;
            let data = ctx.read_ref()?;
            ctx.set_data(
                r,
                ObjectData::GrowableArray {
                    type_arguments,
                    length,
                    data,
                },
            )?;
        }
        Ok(())
    }

    fn range(&self) -> Range<RefIndex> {
        self.range.as_range()
    }
}

/// alloc: [count] + [length] per vector;
/// fill: [length][hash i32][nullability][instantiations ref][type ref * length].
#[derive(Debug, Default)]
pub struct TypeArgumentsDeserializer {
    range: AllocRange,
}

impl ClusterDeserializer for TypeArgumentsDeserializer {
    fn cid(&self) -> ClassId {
        ClassId::TYPE_ARGUMENTS
    }

    fn read_alloc(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool) -> Result<()> {
        self.range.begin(ctx);
        let count = ctx.read_object_count()?;
        for _ in 0..count {
            let _length = ctx.read_count()?;
            ctx.assign_ref(ObjectRecord::pending(ClassId::TYPE_ARGUMENTS, is_canonical));
        }
        self.range.end(ctx);
        Ok(())
    }

    fn read_fill(&mut self, ctx: &mut DeserializationContext<'_, '_>, _is_canonical: bool) -> Result<()> {
        for r in self.range.as_range() {
            let length = ctx.read_count()?;
            let offset = ctx.stream.tell();
            let hash = i32::try_from(ctx.stream.read_int(32)?)
                .map_err(|_| SnapshotError::VarintOverflow { offset })?;
            let nullability = ctx.stream.read_unsigned()?;
            let instantiations = ctx.read_ref()?;
            let mut types = Vec::with_capacity(length.min(ctx.stream.remaining()));
            for _ in 0..length {
                types.push(ctx.read_ref()?);
            }
            ctx.set_data(
                r,
                ObjectData::TypeArguments {
                    hash,
                    nullability,
                    instantiations,
                    types,
                },
            )?;
        }
        Ok(())
    }

    fn range(&self) -> Range<RefIndex> {
        self.range.as_range()
    }
}
