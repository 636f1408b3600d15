//! cli/inspect — read-only commands over snapshot files.
//!
//! Файлы мапятся через memmap2; пустой файл (mmap невозможен) читается в RAM.

use anyhow::{Context, Result};
use memmap2::Mmap;
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use crate::arch::ArchConstants;
use crate::config::SnapshotConfig;
use crate::header::SnapshotHeader;
use crate::metrics::{self, MetricsSnapshot};
use crate::object::ObjectData;
use crate::report::SnapshotReport;
use crate::snapshot::Snapshot;
use crate::stream::SnapshotStream;
use crate::util::version_info;

/// Snapshot file contents: mapped or, for empty files, owned.
pub enum SnapshotBytes {
    Mapped(Mmap),
    Owned(Vec<u8>),
}

impl SnapshotBytes {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
        let len = file.metadata()?.len();
        if len == 0 {
            return Ok(Self::Owned(Vec::new()));
        }
        let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mmap {}", path.display()))?;
        Ok(Self::Mapped(mmap))
    }
}

impl Deref for SnapshotBytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        match self {
            Self::Mapped(m) => &m[..],
            Self::Owned(v) => v.as_slice(),
        }
    }
}

#[derive(Serialize)]
struct SummaryJson {
    vm: SnapshotReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    isolate: Option<SnapshotReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<MetricsSnapshot>,
}

fn parse_vm<'a>(path: &Path, bytes: &'a [u8], cfg: &SnapshotConfig) -> Result<Snapshot<'a>> {
    Snapshot::parse_with_config(bytes, None, cfg)
        .with_context(|| format!("parse VM snapshot {}", path.display()))
}

fn parse_isolate<'a>(
    path: &Path,
    bytes: &'a [u8],
    vm: &Snapshot<'_>,
    cfg: &SnapshotConfig,
) -> Result<Snapshot<'a>> {
    Snapshot::parse_with_config(bytes, Some(vm), cfg)
        .with_context(|| format!("parse isolate snapshot {}", path.display()))
}

fn write_snapshot_text<W: Write>(out: &mut W, title: &str, path: &Path, s: &Snapshot<'_>) -> Result<()> {
    writeln!(out, "{} snapshot {}", title, path.display())?;
    writeln!(out, "{}", s.summary())?;
    writeln!(
        out,
        "Clusters: {} canonical, {} regular",
        s.canonical_clusters().len(),
        s.clusters().len()
    )?;
    if let Some(off) = s.instructions_offset() {
        writeln!(out, "Instructions offset: 0x{:x}", off)?;
    }
    writeln!(out, "Next ref index: {}", s.next_ref_index())?;
    Ok(())
}

/// Parse counters of this process, printed after a command's own output.
fn write_metrics_text<W: Write>(out: &mut W, m: &MetricsSnapshot) -> Result<()> {
    writeln!(out, "snapshots_parsed   = {}", m.snapshots_parsed)?;
    writeln!(out, "snapshots_failed   = {}", m.snapshots_failed)?;
    writeln!(out, "clusters_allocated = {}", m.clusters_allocated)?;
    writeln!(out, "objects_assigned   = {}", m.objects_assigned)?;
    writeln!(out, "bytes_consumed     = {}", m.bytes_consumed)?;
    writeln!(out, "avg_objects/cluster= {:.2}", m.avg_objects_per_cluster())?;
    Ok(())
}

pub fn cmd_summary<W: Write>(
    out: &mut W,
    vm_path: PathBuf,
    isolate_path: Option<PathBuf>,
    cfg: &SnapshotConfig,
    json: bool,
    with_metrics: bool,
) -> Result<()> {
    let vm_bytes = SnapshotBytes::open(&vm_path)?;
    let vm = parse_vm(&vm_path, &vm_bytes, cfg)?;

    let iso_bytes = match &isolate_path {
        Some(p) => Some(SnapshotBytes::open(p)?),
        None => None,
    };
    let isolate = match (&isolate_path, &iso_bytes) {
        (Some(p), Some(b)) => Some(parse_isolate(p, b, &vm, cfg)?),
        _ => None,
    };

    if json {
        let doc = SummaryJson {
            vm: vm.report(),
            isolate: isolate.as_ref().map(|s| s.report()),
            metrics: with_metrics.then(metrics::snapshot),
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        return Ok(());
    }

    write_snapshot_text(out, "VM", &vm_path, &vm)?;
    if let (Some(p), Some(s)) = (&isolate_path, &isolate) {
        writeln!(out)?;
        write_snapshot_text(out, "Isolate", p, s)?;
    }
    if with_metrics {
        writeln!(out)?;
        write_metrics_text(out, &metrics::snapshot())?;
    }
    Ok(())
}

#[derive(Serialize)]
struct HeaderJson<'a> {
    header: &'a SnapshotHeader,
    version: &'static str,
    arch: Option<ArchConstants>,
    data_image_offset: u64,
    is_product: bool,
    is_precompiled: bool,
    includes_code: bool,
}

pub fn cmd_header<W: Write>(out: &mut W, path: PathBuf, json: bool) -> Result<()> {
    let bytes = SnapshotBytes::open(&path)?;
    let mut stream = SnapshotStream::new(&bytes);
    let h = SnapshotHeader::parse(&mut stream)
        .with_context(|| format!("parse header of {}", path.display()))?;
    let flags = h.flags();
    // Заголовок печатаем и для неизвестной архитектуры.
    let arch = ArchConstants::resolve(&h.features).ok();
    let image_off = h
        .data_image_offset()
        .with_context(|| format!("data image offset of {}", path.display()))?;

    if json {
        let doc = HeaderJson {
            header: &h,
            version: version_info(&h.hash),
            arch,
            data_image_offset: image_off,
            is_product: flags.is_product,
            is_precompiled: flags.is_precompiled,
            includes_code: flags.includes_code,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        return Ok(());
    }

    writeln!(out, "Snapshot header of {}", path.display())?;
    writeln!(out, "  magic              = 0x{:08x}", h.magic)?;
    writeln!(out, "  size               = {} bytes (+4 magic)", h.size)?;
    writeln!(out, "  kind               = {}", h.kind)?;
    writeln!(out, "  hash               = {} ({})", h.hash, version_info(&h.hash))?;
    writeln!(out, "  features           = {}", h.features.join(" "))?;
    match &arch {
        Some(a) => writeln!(
            out,
            "  arch               = {} (word {} bytes, alignment {})",
            a.arch, a.word_size, a.object_alignment
        )?,
        None => writeln!(out, "  arch               = (unsupported)")?,
    }
    writeln!(out, "  base_objects       = {}", h.num_base_objects)?;
    writeln!(out, "  objects            = {}", h.num_objects)?;
    writeln!(out, "  canonical_clusters = {}", h.num_canonical_clusters)?;
    writeln!(out, "  clusters           = {}", h.num_clusters)?;
    writeln!(out, "  field_table_length = {}", h.field_table_length)?;
    writeln!(out, "  data_image_offset  = {}", image_off)?;
    writeln!(out, "    product          = {}", flags.is_product)?;
    writeln!(out, "    precompiled      = {}", flags.is_precompiled)?;
    writeln!(out, "    includes_code    = {}", flags.includes_code)?;
    Ok(())
}

/// One-line rendering of a record's payload.
pub fn describe(data: &ObjectData) -> String {
    match data {
        ObjectData::Invalid => "-".to_string(),
        ObjectData::Base { slot: Some(s), .. } => format!("base #{}", s),
        ObjectData::Base { slot: None, .. } => "base".to_string(),
        ObjectData::Pending => "(not filled)".to_string(),
        ObjectData::Smi(v) => format!("smi {}", v),
        ObjectData::Mint(v) => format!("mint {}", v),
        ObjectData::Double(v) => format!("double {}", v),
        ObjectData::String(s) => format!("{:?}", s),
        ObjectData::Array {
            type_arguments,
            elements,
        } => format!("[{}] targs=@{} {:?}", elements.len(), type_arguments, elements),
        ObjectData::GrowableArray {
            type_arguments,
            length,
            data,
        } => format!("targs=@{} length=@{} data=@{}", type_arguments, length, data),
        ObjectData::TypeArguments {
            hash,
            nullability,
            instantiations,
            types,
        } => format!(
            "hash=0x{:08x} nullability={} inst=@{} {:?}",
            hash, nullability, instantiations, types
        ),
        ObjectData::ReadOnly { offset } => format!("rodata +0x{:x}", offset),
    }
}

pub fn cmd_refs<W: Write>(
    out: &mut W,
    vm_path: PathBuf,
    isolate_path: Option<PathBuf>,
    cfg: &SnapshotConfig,
    from: usize,
    limit: usize,
    with_metrics: bool,
) -> Result<()> {
    let vm_bytes = SnapshotBytes::open(&vm_path)?;
    let vm = parse_vm(&vm_path, &vm_bytes, cfg)?;

    // Isolate делит таблицу с VM, так что печать идёт по общей таблице.
    let iso_bytes = match &isolate_path {
        Some(p) => Some(SnapshotBytes::open(p)?),
        None => None,
    };
    let _isolate = match (&isolate_path, &iso_bytes) {
        (Some(p), Some(b)) => Some(parse_isolate(p, b, &vm, cfg)?),
        _ => None,
    };

    let recs = vm.refs().records();
    writeln!(out, "refs [{}..) of {} (limit {})", from, recs.len(), limit)?;
    for (i, rec) in recs.iter().enumerate().skip(from).take(limit) {
        writeln!(
            out,
            "{:>7} {:<32} {} {}",
            i,
            rec.name(),
            if rec.canonical { "C" } else { " " },
            describe(&rec.data)
        )?;
    }
    if with_metrics {
        writeln!(out)?;
        write_metrics_text(out, &metrics::snapshot())?;
    }
    Ok(())
}
