//! ROData cluster: objects stored in the read-only data image.
//!
//! alloc: [count] затем для каждого объекта приращение смещения в единицах
//! выравнивания объекта (`<< object_alignment_log2`); смещение накапливается.
//! fill ничего не читает.

use log::warn;
use std::ops::Range;

use super::{AllocRange, ClusterDeserializer, DeserializationContext};
use crate::class_id::ClassId;
use crate::error::{Result, SnapshotError};
use crate::object::{ObjectData, ObjectRecord, RefIndex};

#[derive(Debug)]
pub struct RoDataDeserializer {
    cid: ClassId,
    range: AllocRange,
}

impl RoDataDeserializer {
    pub fn new(cid: ClassId) -> Self {
        Self {
            cid,
            range: AllocRange::default(),
        }
    }
}

impl ClusterDeserializer for RoDataDeserializer {
    fn cid(&self) -> ClassId {
        self.cid
    }

    fn read_alloc(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool) -> Result<()> {
        self.range.begin(ctx);
        let count = ctx.read_object_count()?;
        let shift = ctx.arch.object_alignment_log2;
        let mut running_offset = 0usize;
        for _ in 0..count {
            let offset = ctx.stream.tell();
            let delta = ctx.read_count()?;
            running_offset = delta
                .checked_shl(shift)
                .filter(|d| *d >> shift == delta)
                .and_then(|d| running_offset.checked_add(d))
                .ok_or(SnapshotError::LengthOverflow {
                    offset,
                    value: delta as u64,
                })?;
            if running_offset >= ctx.data_image.len() {
                warn!(
                    "{} object at data image offset {} lies past the image ({} bytes)",
                    self.cid,
                    running_offset,
                    ctx.data_image.len()
                );
            }
            ctx.assign_ref(ObjectRecord::with_data(
                self.cid,
                is_canonical,
                ObjectData::ReadOnly {
                    offset: running_offset,
                },
            ));
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
