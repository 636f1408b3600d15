//! report — machine-readable view of a parsed snapshot.
//!
//! Сериализация через serde_json (pretty). Объекты графа не выгружаются
//! целиком: только счётчики и сводка по кластерам.

use serde::Serialize;

use crate::arch::ArchConstants;
use crate::cluster::ClusterSummary;
use crate::header::{SnapshotFlags, SnapshotHeader};
use crate::object::RefIndex;
use crate::snapshot::Snapshot;
use crate::util::version_info;

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotReport {
    pub isolate: bool,
    pub header: SnapshotHeader,
    pub version: &'static str,
    pub flags: SnapshotFlags,
    pub arch: ArchConstants,
    pub data_image_offset: u64,
    pub data_image_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions_offset: Option<u64>,
    pub next_ref_index: RefIndex,
    pub canonical_clusters: Vec<ClusterSummary>,
    pub clusters: Vec<ClusterSummary>,
    pub symbol_table: RefIndex,
    pub stub_count: usize,
}

impl SnapshotReport {
    pub fn from_snapshot(s: &Snapshot<'_>) -> Self {
        Self {
            isolate: s.is_isolate(),
            header: s.header().clone(),
            version: version_info(s.hash()),
            flags: s.flags(),
            arch: *s.constants(),
            data_image_offset: s.data_image_offset(),
            data_image_len: s.data_image().len(),
            instructions_offset: s.instructions_offset(),
            next_ref_index: s.next_ref_index(),
            canonical_clusters: s.canonical_clusters().to_vec(),
            clusters: s.clusters().to_vec(),
            symbol_table: s.symbol_table(),
            stub_count: s.stubs().len(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl<'a> Snapshot<'a> {
    pub fn report(&self) -> SnapshotReport {
        SnapshotReport::from_snapshot(self)
    }
}
