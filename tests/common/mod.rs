//! Общие помощники для интеграционных тестов: varint-энкодер и сборщик снапшотов.
#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use DartSnap::base_objects::base_objects;
use DartSnap::consts::{SNAPSHOT_MAGIC, SUPPORTED_VERSION_HASH};
use DartSnap::Kind;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

pub fn unique_root(prefix: &str) -> PathBuf {
    let pid = std::process::id();
    let t = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    let base = std::env::temp_dir();
    base.join(format!("dstest-{prefix}-{pid}-{t}-{id}"))
}

/// Write `bytes` to a fresh temp file and return its path.
pub fn write_temp(prefix: &str, bytes: &[u8]) -> PathBuf {
    let root = unique_root(prefix);
    fs::create_dir_all(&root).unwrap();
    let p = root.join("snapshot.bin");
    fs::write(&p, bytes).unwrap();
    p
}

/// Byte writer with the snapshot varint encodings.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    pub buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn unsigned(&mut self, mut v: u64) -> &mut Self {
        while v > 0x7f {
            self.buf.push((v & 0x7f) as u8);
            v >>= 7;
        }
        self.buf.push(v as u8 + 0x80);
        self
    }

    pub fn signed(&mut self, mut v: i64) -> &mut Self {
        while !(-64..=63).contains(&v) {
            self.buf.push((v & 0x7f) as u8);
            v >>= 7;
        }
        self.buf.push((v + 0xc0) as u8);
        self
    }

    pub fn cid(&mut self, cid: i32) -> &mut Self {
        self.signed(i64::from(cid))
    }
}

pub const X64_PRODUCT: &str = "product x64-sysv";

/// Base-object count the reader will add for `kind` (raw kind value).
pub fn base_count(kind: u64) -> u64 {
    base_objects(Kind::from_raw(kind).unwrap()).len() as u64
}

/// Snapshot image builder: header + alloc section + fill section + roots,
/// then padding up to the data image and the image itself.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub magic: u32,
    pub kind: u64,
    pub hash: String,
    pub features: String,
    pub num_base_objects: u64,
    pub num_objects: u64,
    pub num_canonical: u64,
    pub num_clusters: u64,
    pub field_table_length: u64,
    pub alloc: Writer,
    pub fill: Writer,
    pub roots: Writer,
    pub image: Vec<u8>,
}

impl Fixture {
    /// VM snapshot of `kind` with no clusters and a symbol table ref of 1.
    pub fn vm(kind: u64) -> Self {
        let base = base_count(kind);
        let mut roots = Writer::new();
        roots.unsigned(1);
        if kind == 2 || kind == 3 {
            for i in 0..103u64 {
                roots.unsigned(1 + i % 10);
            }
        }
        Self {
            magic: SNAPSHOT_MAGIC,
            kind,
            hash: SUPPORTED_VERSION_HASH.to_string(),
            features: X64_PRODUCT.to_string(),
            num_base_objects: base,
            num_objects: base,
            num_canonical: 0,
            num_clusters: 0,
            field_table_length: 0,
            alloc: Writer::new(),
            fill: Writer::new(),
            roots,
            image: Vec::new(),
        }
    }

    pub fn header_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.raw(&self.magic.to_le_bytes());
        w.raw(&0u64.to_le_bytes()); // size, patched in build()
        w.raw(&self.kind.to_le_bytes());
        w.raw(self.hash.as_bytes());
        w.raw(self.features.as_bytes());
        w.raw(&[0]);
        w.unsigned(self.num_base_objects)
            .unsigned(self.num_objects)
            .unsigned(self.num_canonical)
            .unsigned(self.num_clusters)
            .unsigned(self.field_table_length);
        w.buf
    }

    /// Stream part only (header through roots), with the size field patched.
    pub fn stream_bytes(&self) -> Vec<u8> {
        let mut out = self.header_bytes();
        out.extend_from_slice(&self.alloc.buf);
        out.extend_from_slice(&self.fill.buf);
        out.extend_from_slice(&self.roots.buf);
        let size = (out.len() - 4) as u64;
        out[4..12].copy_from_slice(&size.to_le_bytes());
        out
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = self.stream_bytes();
        if !self.image.is_empty() {
            let aligned = (out.len() + 15) / 16 * 16;
            out.resize(aligned, 0);
            out.extend_from_slice(&self.image);
        }
        out
    }
}
