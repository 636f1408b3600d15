use thiserror::Error;

pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Ошибки разбора снапшота. Все фатальные: частичного результата нет.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("unsupported Dart version: {hash}")]
    UnsupportedVersion { hash: String },

    #[error("unsupported architecture (features: {features})")]
    UnsupportedArchitecture { features: String },

    #[error("stream truncated at offset {offset}: need {needed} more byte(s)")]
    TruncatedStream { offset: usize, needed: usize },

    #[error("expected boolean, got 0x{value:02x} at stream offset {offset}")]
    InvalidBooleanEncoding { offset: usize, value: u8 },

    #[error("malformed string at offset {offset}: {reason}")]
    MalformedString { offset: usize, reason: &'static str },

    #[error("no cluster deserializer for cid {cid} (includes_code={includes_code}) at offset {offset}")]
    UnknownClassId {
        cid: i32,
        includes_code: bool,
        offset: usize,
    },

    #[error("unknown snapshot kind {0}")]
    UnknownKind(u64),

    #[error("varint does not fit in 64 bits at offset {offset}")]
    VarintOverflow { offset: usize },

    #[error("length {value} at offset {offset} does not fit in memory")]
    LengthOverflow { offset: usize, value: u64 },

    #[error("reference {reference} read at offset {offset} is not allocated (next free index {next})")]
    DanglingReference {
        reference: u64,
        next: usize,
        offset: usize,
    },

    #[error("object count mismatch (header declares {declared}, allocated {allocated})")]
    ObjectCountMismatch { declared: u64, allocated: u64 },
}

impl SnapshotError {
    /// Byte offset at which the error was detected, if the variant carries one.
    pub fn offset(&self) -> Option<usize> {
        match self {
            SnapshotError::TruncatedStream { offset, .. }
            | SnapshotError::InvalidBooleanEncoding { offset, .. }
            | SnapshotError::MalformedString { offset, .. }
            | SnapshotError::UnknownClassId { offset, .. }
            | SnapshotError::VarintOverflow { offset }
            | SnapshotError::LengthOverflow { offset, .. }
            | SnapshotError::DanglingReference { offset, .. } => Some(*offset),
            _ => None,
        }
    }
}
