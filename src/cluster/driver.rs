//! cluster/driver — two-phase allocation/fill over all clusters.
//!
//! Порядок обязателен:
//!   alloc(canonical...) → alloc(regular...) → [hook] → fill(canonical...) → fill(regular...)
//! Fill продолжает чтение ровно с того места, где закончился последний alloc.

use log::{debug, info};

use super::{deserializer_for_cid, ClusterDeserializer, ClusterSummary, DeserializationContext};
use crate::class_id::ClassId;
use crate::error::{Result, SnapshotError};
use crate::metrics;

/// Summaries of the canonical and regular clusters, in stream order.
#[derive(Debug, Clone, Default)]
pub struct ClusterSet {
    pub canonical: Vec<ClusterSummary>,
    pub clusters: Vec<ClusterSummary>,
}

/// Read one cluster tag, dispatch on (includes_code, cid) and run its allocation.
pub fn read_cluster_alloc(
    ctx: &mut DeserializationContext<'_, '_>,
    is_canonical: bool,
) -> Result<Box<dyn ClusterDeserializer>> {
    let offset = ctx.stream.tell();
    let cid = ClassId(ctx.stream.read_cid()?);
    let includes_code = ctx.flags.includes_code;
    let mut d = deserializer_for_cid(includes_code, cid).ok_or(SnapshotError::UnknownClassId {
        cid: cid.raw(),
        includes_code,
        offset,
    })?;
    d.read_alloc(ctx, is_canonical)?;

    let r = d.range();
    debug!(
        "alloc {} canonical={} refs [{}..{}) at offset {}",
        cid, is_canonical, r.start, r.end, offset
    );
    metrics::record_cluster_allocated(r.len() as u64);
    Ok(d)
}

fn read_cluster_fill(
    ctx: &mut DeserializationContext<'_, '_>,
    d: &mut dyn ClusterDeserializer,
    is_canonical: bool,
) -> Result<()> {
    let offset = ctx.stream.tell();
    d.read_fill(ctx, is_canonical)?;
    let r = d.range();
    debug!(
        "fill {} canonical={} refs [{}..{}) at offset {}",
        d.cid(),
        is_canonical,
        r.start,
        r.end,
        offset
    );
    Ok(())
}

fn summarize(d: &dyn ClusterDeserializer, canonical: bool) -> ClusterSummary {
    let r = d.range();
    ClusterSummary {
        cid: d.cid(),
        canonical,
        start: r.start,
        stop: r.end,
    }
}

/// Run both phases. `after_alloc` is invoked once every cluster has been
/// allocated and before any fill (used for object-count checks).
pub fn run_clusters<F>(
    ctx: &mut DeserializationContext<'_, '_>,
    num_canonical: u64,
    num_clusters: u64,
    after_alloc: F,
) -> Result<ClusterSet>
where
    F: FnOnce(&DeserializationContext<'_, '_>) -> Result<()>,
{
    info!("Allocating clusters");
    let mut canonical = Vec::new();
    for _ in 0..num_canonical {
        canonical.push(read_cluster_alloc(ctx, true)?);
    }
    let mut clusters = Vec::new();
    for _ in 0..num_clusters {
        clusters.push(read_cluster_alloc(ctx, false)?);
    }

    after_alloc(&*ctx)?;

    info!("Filling clusters");
    for d in canonical.iter_mut() {
        read_cluster_fill(ctx, d.as_mut(), true)?;
    }
    for d in clusters.iter_mut() {
        read_cluster_fill(ctx, d.as_mut(), false)?;
    }

    Ok(ClusterSet {
        canonical: canonical.iter().map(|d| summarize(d.as_ref(), true)).collect(),
        clusters: clusters.iter().map(|d| summarize(d.as_ref(), false)).collect(),
    })
}
