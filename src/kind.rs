use serde::Serialize;
use std::fmt;

use crate::error::{Result, SnapshotError};

/// Snapshot build variant, as stored in the header's kind field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Kind {
    /// Full snapshot of a core library set (VM + isolate).
    Full,
    /// Full snapshot of the core libraries only.
    FullCore,
    /// Full snapshot with JIT-compiled code.
    FullJit,
    /// Full snapshot with AOT-compiled code.
    FullAot,
    None,
    Invalid,
}

impl Kind {
    pub fn from_raw(v: u64) -> Result<Kind> {
        Ok(match v {
            0 => Kind::Full,
            1 => Kind::FullCore,
            2 => Kind::FullJit,
            3 => Kind::FullAot,
            4 => Kind::None,
            5 => Kind::Invalid,
            other => return Err(SnapshotError::UnknownKind(other)),
        })
    }

    pub fn as_raw(self) -> u64 {
        self as u64
    }

    /// Compiled code (and the stub table) is embedded in the snapshot.
    #[inline]
    pub fn includes_code(self) -> bool {
        matches!(self, Kind::FullJit | Kind::FullAot)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Full => "FULL",
            Kind::FullCore => "FULL_CORE",
            Kind::FullJit => "FULL_JIT",
            Kind::FullAot => "FULL_AOT",
            Kind::None => "NONE",
            Kind::Invalid => "INVALID",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_values_roundtrip() {
        for v in 0..=5u64 {
            assert_eq!(Kind::from_raw(v).unwrap().as_raw(), v);
        }
        assert!(matches!(Kind::from_raw(9), Err(SnapshotError::UnknownKind(9))));
    }

    #[test]
    fn only_jit_and_aot_include_code() {
        assert!(Kind::FullJit.includes_code());
        assert!(Kind::FullAot.includes_code());
        assert!(!Kind::Full.includes_code());
        assert!(!Kind::FullCore.includes_code());
    }
}
