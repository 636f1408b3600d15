use log::info;
use serde::Serialize;

use crate::consts::NUM_STUB_ENTRIES;
use crate::error::{Result, SnapshotError};
use crate::object::RefIndex;
use crate::stream::SnapshotStream;

/// Roots read after the fill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SnapshotRoots {
    pub symbol_table: RefIndex,
    /// Stub code references; empty unless the snapshot includes code.
    pub stubs: Vec<RefIndex>,
}

impl SnapshotRoots {
    /// Symbol-table ref, then `NUM_STUB_ENTRIES` stub refs when code is included.
    /// Every ref must be below `next`. Roots are not interpreted further.
    pub fn read(stream: &mut SnapshotStream<'_>, includes_code: bool, next: RefIndex) -> Result<Self> {
        info!("Reading roots");
        let symbol_table = read_root(stream, next)?;
        let mut stubs = Vec::new();
        if includes_code {
            stubs.reserve(NUM_STUB_ENTRIES);
            for _ in 0..NUM_STUB_ENTRIES {
                stubs.push(read_root(stream, next)?);
            }
        }
        Ok(Self { symbol_table, stubs })
    }
}

fn read_root(stream: &mut SnapshotStream<'_>, next: RefIndex) -> Result<RefIndex> {
    let offset = stream.tell();
    let v = stream.read_ref()?;
    match usize::try_from(v) {
        Ok(r) if r < next => Ok(r),
        _ => Err(SnapshotError::DanglingReference {
            reference: v,
            next,
            offset,
        }),
    }
}
