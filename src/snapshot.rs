//! snapshot — facade that drives the whole parse.
//!
//! Конвейер (строго последовательно, один курсор):
//!   header → arch → base objects | таблица родителя → alloc → fill → roots
//!
//! Снапшот неизменяем после построения. Isolate-снапшот, построенный с
//! родителем, разделяет с ним таблицу ссылок (тот же экземпляр).

use log::{info, warn};
use std::fmt::Write as _;

use crate::arch::{Arch, ArchConstants};
use crate::base_objects::add_base_objects;
use crate::cluster::{run_clusters, ClusterSet, ClusterSummary, DeserializationContext};
use crate::config::SnapshotConfig;
use crate::consts::MAGIC_SIZE;
use crate::error::{Result, SnapshotError};
use crate::header::{SnapshotFlags, SnapshotHeader};
use crate::kind::Kind;
use crate::metrics;
use crate::object::{ObjectRecord, RefIndex, RefTable};
use crate::roots::SnapshotRoots;
use crate::stream::SnapshotStream;
use crate::util::version_info;

#[derive(Debug)]
pub struct Snapshot<'a> {
    header: SnapshotHeader,
    flags: SnapshotFlags,
    arch: ArchConstants,
    data: &'a [u8],
    data_image_offset: u64,
    instructions_offset: Option<u64>,
    refs: RefTable,
    clusters: ClusterSet,
    roots: SnapshotRoots,
    is_isolate: bool,
    stream_end: usize,
}

/// Compare a declared count with the actual one; error only in strict mode.
fn check_count(what: &str, declared: u64, actual: usize, strict: bool) -> Result<()> {
    let allocated = actual as u64;
    if declared == allocated {
        return Ok(());
    }
    if strict {
        return Err(SnapshotError::ObjectCountMismatch {
            declared,
            allocated,
        });
    }
    warn!(
        "{} count mismatch: header declares {}, table holds {}",
        what, declared, allocated
    );
    Ok(())
}

impl<'a> Snapshot<'a> {
    /// Parse with default configuration. `base` is the VM snapshot whose
    /// reference table an isolate snapshot builds upon.
    pub fn parse(data: &'a [u8], base: Option<&Snapshot<'_>>) -> Result<Self> {
        Self::parse_with_config(data, base, &SnapshotConfig::default())
    }

    pub fn parse_with_config(
        data: &'a [u8],
        base: Option<&Snapshot<'_>>,
        cfg: &SnapshotConfig,
    ) -> Result<Self> {
        let res = Self::parse_inner(data, base, cfg);
        match &res {
            Ok(s) => metrics::record_snapshot_parsed(s.stream_end as u64),
            Err(_) => metrics::record_snapshot_failed(),
        }
        res
    }

    fn parse_inner(data: &'a [u8], base: Option<&Snapshot<'_>>, cfg: &SnapshotConfig) -> Result<Self> {
        if base.is_none() {
            info!("Parsing VM snapshot");
        } else {
            info!("Parsing isolate snapshot");
        }
        let mut stream = SnapshotStream::new(data);

        let header = SnapshotHeader::parse(&mut stream)?;
        let flags = header.flags();
        let arch = ArchConstants::resolve(&header.features)?;

        let data_image_offset = header.data_image_offset()?;
        let data_image: &'a [u8] = usize::try_from(data_image_offset)
            .ok()
            .and_then(|off| data.get(off..))
            .unwrap_or(&[]);

        let refs = match base {
            Some(parent) => parent.refs.clone(),
            None => {
                let t = RefTable::new();
                add_base_objects(&t, header.kind);
                t
            }
        };
        check_count(
            "base object",
            header.num_base_objects,
            refs.assigned(),
            cfg.strict_counts,
        )?;

        // Таблица может быть общей с родителем: при ошибке откатываем всё,
        // что успели выделить, чтобы родитель остался как был.
        let mark = refs.next_index();
        let body = {
            let mut ctx = DeserializationContext {
                stream: &mut stream,
                refs: &refs,
                arch: &arch,
                flags,
                data_image,
                trace: cfg.trace_clusters,
            };
            Self::read_body(&mut ctx, &header, cfg.strict_counts)
        };
        let (clusters, roots) = match body {
            Ok(v) => v,
            Err(e) => {
                let dropped = refs.next_index() - mark;
                if dropped > 0 {
                    warn!("parse failed, releasing {} reference(s) from {}", dropped, mark);
                }
                refs.truncate(mark);
                return Err(e);
            }
        };

        Ok(Self {
            header,
            flags,
            arch,
            data,
            data_image_offset,
            instructions_offset: cfg.instructions_offset,
            refs,
            clusters,
            roots,
            is_isolate: base.is_some(),
            stream_end: stream.tell(),
        })
    }

    /// Clusters (alloc + fill) followed by the roots.
    fn read_body(
        ctx: &mut DeserializationContext<'_, '_>,
        header: &SnapshotHeader,
        strict: bool,
    ) -> Result<(ClusterSet, SnapshotRoots)> {
        let declared = header.num_objects;
        let clusters = run_clusters(
            ctx,
            header.num_canonical_clusters,
            header.num_clusters,
            |ctx: &DeserializationContext<'_, '_>| {
                check_count("object", declared, ctx.refs.assigned(), strict)
            },
        )?;
        let next = ctx.next_index();
        let roots = SnapshotRoots::read(ctx.stream, ctx.flags.includes_code, next)?;
        Ok((clusters, roots))
    }

    // ---- header ----

    pub fn header(&self) -> &SnapshotHeader {
        &self.header
    }

    pub fn magic(&self) -> u32 {
        self.header.magic
    }

    /// Length in bytes, excluding the magic.
    pub fn size(&self) -> u64 {
        self.header.size
    }

    pub fn kind(&self) -> Kind {
        self.header.kind
    }

    pub fn hash(&self) -> &str {
        &self.header.hash
    }

    pub fn features(&self) -> &[String] {
        &self.header.features
    }

    pub fn num_base_objects(&self) -> u64 {
        self.header.num_base_objects
    }

    pub fn num_objects(&self) -> u64 {
        self.header.num_objects
    }

    pub fn num_canonical_clusters(&self) -> u64 {
        self.header.num_canonical_clusters
    }

    pub fn num_clusters(&self) -> u64 {
        self.header.num_clusters
    }

    pub fn field_table_length(&self) -> u64 {
        self.header.field_table_length
    }

    // ---- derived ----

    pub fn flags(&self) -> SnapshotFlags {
        self.flags
    }

    pub fn is_product(&self) -> bool {
        self.flags.is_product
    }

    pub fn is_precompiled(&self) -> bool {
        self.flags.is_precompiled
    }

    pub fn is_debug(&self) -> bool {
        self.flags.is_debug
    }

    pub fn use_bare_instructions(&self) -> bool {
        self.flags.use_bare_instructions
    }

    pub fn includes_code(&self) -> bool {
        self.flags.includes_code
    }

    pub fn arch(&self) -> Arch {
        self.arch.arch
    }

    pub fn constants(&self) -> &ArchConstants {
        &self.arch
    }

    pub fn is_64(&self) -> bool {
        self.arch.is_64
    }

    pub fn is_isolate(&self) -> bool {
        self.is_isolate
    }

    pub fn data_image_offset(&self) -> u64 {
        self.data_image_offset
    }

    /// Read-only view of the data image (empty if the offset lies past the buffer).
    pub fn data_image(&self) -> &'a [u8] {
        usize::try_from(self.data_image_offset)
            .ok()
            .and_then(|off| self.data.get(off..))
            .unwrap_or(&[])
    }

    pub fn instructions_offset(&self) -> Option<u64> {
        self.instructions_offset
    }

    /// Offset right after the last byte consumed by the main stream.
    pub fn stream_end(&self) -> usize {
        self.stream_end
    }

    // ---- object graph ----

    pub fn refs(&self) -> &RefTable {
        &self.refs
    }

    pub fn next_ref_index(&self) -> RefIndex {
        self.refs.next_index()
    }

    pub fn object(&self, r: RefIndex) -> Option<ObjectRecord> {
        self.refs.get(r)
    }

    pub fn canonical_clusters(&self) -> &[ClusterSummary] {
        &self.clusters.canonical
    }

    pub fn clusters(&self) -> &[ClusterSummary] {
        &self.clusters.clusters
    }

    pub fn roots(&self) -> &SnapshotRoots {
        &self.roots
    }

    pub fn symbol_table(&self) -> RefIndex {
        self.roots.symbol_table
    }

    pub fn stubs(&self) -> &[RefIndex] {
        &self.roots.stubs
    }

    /// Multi-line human-readable summary.
    pub fn summary(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Magic: 0x{:08x}", self.magic());
        let _ = writeln!(
            s,
            "Snapshot size (including {}B of magic): {}B",
            MAGIC_SIZE,
            self.size() + MAGIC_SIZE as u64
        );
        let _ = writeln!(s, "Kind: {}", self.kind());
        let _ = writeln!(s, "Version: {} ({})", self.hash(), version_info(self.hash()));
        let _ = writeln!(s, "Features: {}", self.features().join(", "));
        let _ = writeln!(s, "Architecture: {}", self.arch());
        let _ = writeln!(s, "Base objects count: {}", self.num_base_objects());
        let _ = writeln!(s, "Objects count: {}", self.num_objects());
        let _ = writeln!(s, "Canonical clusters count: {}", self.num_canonical_clusters());
        let _ = writeln!(s, "Clusters count: {}", self.num_clusters());
        let _ = writeln!(s, "Field table length: {}", self.field_table_length());
        let _ = write!(s, "Data image offset: {}", self.data_image_offset());
        s
    }
}
