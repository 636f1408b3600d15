//! cluster — per-cid cluster deserializers and the two-phase driver.
//!
//! Контракт кластера (два метода):
//! - `read_alloc`: резервирует N слотов в таблице ссылок (по одному на объект);
//! - `read_fill`: дочитывает поля уже зарезервированных слотов.
//!
//! Все alloc (канонические, затем обычные) выполняются до любого fill, поэтому
//! ссылки вперёд внутри снапшота разрешимы. Ссылки, прочитанные во время fill,
//! проверяются против следующего свободного индекса.

use log::trace;
use serde::Serialize;
use std::ops::Range;

use crate::arch::ArchConstants;
use crate::class_id::ClassId;
use crate::error::{Result, SnapshotError};
use crate::header::SnapshotFlags;
use crate::object::{ObjectData, ObjectRecord, RefIndex, RefTable};
use crate::stream::SnapshotStream;

pub mod arrays;
pub mod driver;
pub mod numbers;
pub mod rodata;
pub mod strings;

pub use driver::{read_cluster_alloc, run_clusters, ClusterSet};

/// Everything a cluster may touch while reading.
pub struct DeserializationContext<'s, 'a> {
    pub stream: &'s mut SnapshotStream<'a>,
    pub refs: &'s RefTable,
    pub arch: &'s ArchConstants,
    pub flags: SnapshotFlags,
    /// Read-only data image (objects referenced by offset).
    pub data_image: &'a [u8],
    pub trace: bool,
}

impl<'s, 'a> DeserializationContext<'s, 'a> {
    #[inline]
    pub fn next_index(&self) -> RefIndex {
        self.refs.next_index()
    }

    pub fn assign_ref(&mut self, rec: ObjectRecord) -> RefIndex {
        let cid = rec.cid;
        let r = self.refs.assign(rec);
        if self.trace {
            trace!("assign ref {} -> {}", r, cid);
        }
        r
    }

    /// Unsigned varint interpreted as an element count / length.
    pub fn read_count(&mut self) -> Result<usize> {
        let offset = self.stream.tell();
        let v = self.stream.read_unsigned()?;
        usize::try_from(v).map_err(|_| SnapshotError::LengthOverflow { offset, value: v })
    }

    /// Object count of a cluster. Every object costs at least one stream byte
    /// (in alloc or fill), so a count above what is left cannot be satisfied
    /// and is rejected before any slot is reserved.
    pub fn read_object_count(&mut self) -> Result<usize> {
        let count = self.read_count()?;
        let remaining = self.stream.remaining();
        if count > remaining {
            return Err(SnapshotError::TruncatedStream {
                offset: self.stream.tell(),
                needed: count - remaining,
            });
        }
        Ok(count)
    }

    /// Reference that must already be allocated (filled or not).
    pub fn read_ref(&mut self) -> Result<RefIndex> {
        let offset = self.stream.tell();
        let v = self.stream.read_ref()?;
        let next = self.next_index();
        match usize::try_from(v) {
            Ok(r) if r < next => Ok(r),
            _ => Err(SnapshotError::DanglingReference {
                reference: v,
                next,
                offset,
            }),
        }
    }

    /// Store the filled payload of `r`; `r` must be an allocated slot.
    pub fn set_data(&mut self, r: RefIndex, data: ObjectData) -> Result<()> {
        if self.trace {
            trace!("fill ref {}: {:?}", r, data);
        }
        if self.refs.update(r, |rec| rec.data = data) {
            return Ok(());
        }
        Err(SnapshotError::DanglingReference {
            reference: r as u64,
            next: self.next_index(),
            offset: self.stream.tell(),
        })
    }
}

/// Two-method cluster contract.
pub trait ClusterDeserializer {
    fn cid(&self) -> ClassId;

    fn read_alloc(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool)
        -> Result<()>;

    fn read_fill(&mut self, ctx: &mut DeserializationContext<'_, '_>, is_canonical: bool)
        -> Result<()>;

    /// References reserved by `read_alloc`.
    fn range(&self) -> Range<RefIndex>;
}

/// Reference range reserved by a cluster during allocation.
#[derive(Debug, Clone, Default)]
pub struct AllocRange {
    pub start: RefIndex,
    pub stop: RefIndex,
}

impl AllocRange {
    #[inline]
    pub fn begin(&mut self, ctx: &DeserializationContext<'_, '_>) {
        self.start = ctx.next_index();
        self.stop = self.start;
    }

    #[inline]
    pub fn end(&mut self, ctx: &DeserializationContext<'_, '_>) {
        self.stop = ctx.next_index();
    }

    #[inline]
    pub fn as_range(&self) -> Range<RefIndex> {
        self.start..self.stop
    }
}

/// What remains of a cluster once it has been filled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterSummary {
    pub cid: ClassId,
    pub canonical: bool,
    pub start: RefIndex,
    pub stop: RefIndex,
}

impl ClusterSummary {
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.stop
    }
}

/// Registry: (includes_code, cid) → deserializer. `None` for unregistered cids.
///
/// В снапшотах с кодом дескрипторы/карты и строки лежат в data image
/// (ROData); без кода дескрипторов в потоке нет вовсе.
pub fn deserializer_for_cid(includes_code: bool, cid: ClassId) -> Option<Box<dyn ClusterDeserializer>> {
    if includes_code {
        match cid {
            ClassId::PC_DESCRIPTORS
            | ClassId::CODE_SOURCE_MAP
            | ClassId::COMPRESSED_STACK_MAPS
            | ClassId::ONE_BYTE_STRING
            | ClassId::TWO_BYTE_STRING => {
                return Some(Box::new(rodata::RoDataDeserializer::new(cid)));
            }
            _ => {}
        }
    }

    let d: Box<dyn ClusterDeserializer> = match cid {
        ClassId::MINT => Box::new(numbers::MintDeserializer::default()),
        ClassId::DOUBLE => Box::new(numbers::DoubleDeserializer::default()),
        ClassId::ONE_BYTE_STRING => Box::new(strings::StringDeserializer::one_byte()),
        ClassId::TWO_BYTE_STRING => Box::new(strings::StringDeserializer::two_byte()),
        ClassId::ARRAY | ClassId::IMMUTABLE_ARRAY => Box::new(arrays::ArrayDeserializer::new(cid)),
        ClassId::GROWABLE_OBJECT_ARRAY => Box::new(arrays::GrowableArrayDeserializer::default()),
        ClassId::TYPE_ARGUMENTS => Box::new(arrays::TypeArgumentsDeserializer::default()),
        _ => return None,
    };
    Some(d)
}
