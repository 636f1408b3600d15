//! header — fixed-layout snapshot header.
//!
//! Формат (LE):
//! [magic u32][length u64 (без magic)][kind u64][version hash 32 bytes UTF-8]
//! [features: NUL-terminated, разделитель — пробел]
//! [varint: base_objects][varint: objects][varint: canonical_clusters]
//! [varint: clusters][varint: field_table_length]
//!
//! Политика:
//! - hash проверяется до разбора kind: неподдерживаемая версия всегда даёт
//!   `UnsupportedVersion`, что бы ни лежало в остальных полях;
//! - magic не фатален (warn).

use log::{info, warn};
use serde::Serialize;

use crate::consts::{
    HASH_SIZE, MAGIC_SIZE, MAX_OBJECT_ALIGNMENT, SNAPSHOT_MAGIC, SUPPORTED_VERSION_HASH,
};
use crate::error::{Result, SnapshotError};
use crate::kind::Kind;
use crate::stream::SnapshotStream;
use crate::util::round_up;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    /// Snapshot length in bytes, excluding the magic.
    pub size: u64,
    pub kind: Kind,
    pub hash: String,
    pub features: Vec<String>,
    pub num_base_objects: u64,
    pub num_objects: u64,
    pub num_canonical_clusters: u64,
    pub num_clusters: u64,
    pub field_table_length: u64,
}

/// Flags derived from kind + features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SnapshotFlags {
    pub is_product: bool,
    pub is_precompiled: bool,
    pub is_debug: bool,
    pub use_bare_instructions: bool,
    pub includes_code: bool,
}

impl SnapshotHeader {
    /// Read the header from the current cursor position.
    pub fn parse(stream: &mut SnapshotStream<'_>) -> Result<Self> {
        info!("Parsing header");
        let magic = stream.read_u32_le()?;
        let size = stream.read_u64_le()?;
        let raw_kind = stream.read_u64_le()?;

        let hash_offset = stream.tell();
        let hash_bytes = stream.read_bytes(HASH_SIZE)?;
        let hash = std::str::from_utf8(hash_bytes)
            .map_err(|_| SnapshotError::MalformedString {
                offset: hash_offset,
                reason: "version hash is not utf-8",
            })?
            .to_string();
        if hash != SUPPORTED_VERSION_HASH {
            return Err(SnapshotError::UnsupportedVersion { hash });
        }
        let kind = Kind::from_raw(raw_kind)?;

        if magic != SNAPSHOT_MAGIC {
            warn!(
                "unexpected snapshot magic 0x{:08x} (expected 0x{:08x})",
                magic, SNAPSHOT_MAGIC
            );
        }

        let features = stream
            .read_string()?
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            magic,
            size,
            kind,
            hash,
            features,
            num_base_objects: stream.read_unsigned()?,
            num_objects: stream.read_unsigned()?,
            num_canonical_clusters: stream.read_unsigned()?,
            num_clusters: stream.read_unsigned()?,
            field_table_length: stream.read_unsigned()?,
        })
    }

    pub fn has_feature(&self, token: &str) -> bool {
        self.features.iter().any(|f| f == token)
    }

    pub fn flags(&self) -> SnapshotFlags {
        let is_product = self.has_feature("product");
        SnapshotFlags {
            is_product,
            is_precompiled: self.kind == Kind::FullAot && is_product,
            is_debug: self.has_feature("debug"),
            use_bare_instructions: self.has_feature("use_bare_instructions"),
            includes_code: self.kind.includes_code(),
        }
    }

    /// Offset of the data image: (length + magic) rounded up to the maximum
    /// object alignment. `LengthOverflow` if the declared length is too large.
    pub fn data_image_offset(&self) -> Result<u64> {
        self.size
            .checked_add(MAGIC_SIZE as u64)
            .and_then(|n| round_up(n, MAX_OBJECT_ALIGNMENT as u64))
            .ok_or(SnapshotError::LengthOverflow {
                offset: MAGIC_SIZE,
                value: self.size,
            })
    }
}
