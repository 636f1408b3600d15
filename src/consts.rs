//! Общие константы формата снапшота (header, varint, base objects, data image).

// -------- Header --------
// Layout (LE): [magic u32][length u64][kind u64][version hash 32 bytes][features\0][varints...]
pub const MAGIC_SIZE: usize = 4;
pub const LENGTH_SIZE: usize = 8;
pub const KIND_SIZE: usize = 8;
pub const HASH_SIZE: usize = 32;
pub const HEADER_FIXED_SIZE: usize = MAGIC_SIZE + LENGTH_SIZE + KIND_SIZE + HASH_SIZE;

/// Expected magic value (bytes f5 f5 dc dc on disk).
pub const SNAPSHOT_MAGIC: u32 = 0xdcdc_f5f5;

/// The only version hash this reader accepts.
pub const SUPPORTED_VERSION_HASH: &str = "9cf77f4405212c45daf608e1cd646852";

// -------- Varint --------
pub const DATA_BITS_PER_BYTE: u32 = 7;
pub const BYTE_MASK: u8 = (1 << DATA_BITS_PER_BYTE) - 1; // 0x7f
pub const MAX_UNSIGNED_DATA_PER_BYTE: u8 = BYTE_MASK; // 0x7f
pub const MIN_DATA_PER_BYTE: i64 = -(1 << (DATA_BITS_PER_BYTE - 1)); // -64
pub const MAX_DATA_PER_BYTE: i64 = !MIN_DATA_PER_BYTE & BYTE_MASK as i64; // 0x3f
pub const END_BYTE_MARKER: u8 = (255 - MAX_DATA_PER_BYTE) as u8; // 0xc0
pub const END_UNSIGNED_BYTE_MARKER: u8 = 255 - MAX_UNSIGNED_DATA_PER_BYTE; // 0x80

pub const NUM_BYTES_PER_READ32: usize = 4;

// -------- Objects / data image --------
/// Alignment of the data image start, independent of the target word size.
pub const MAX_OBJECT_ALIGNMENT: usize = 16;

/// Fixed reference reserved as "invalid"; real references start at 1.
pub const INVALID_REF: usize = 0;
pub const FIRST_REF: usize = 1;

// -------- Base objects (pinned to the supported build) --------
pub const CACHED_DESCRIPTOR_COUNT: usize = 32;
pub const CACHED_IC_DATA_ARRAY_COUNT: usize = 4;
pub const NUM_STUB_ENTRIES: usize = 103;

// -------- Class ids --------
pub const TOP_LEVEL_CID_OFFSET: i32 = 1 << 16;
