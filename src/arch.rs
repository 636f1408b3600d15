//! arch — architecture detection and per-target constants.
//!
//! Константы выбираются один раз на снапшот и передаются явно (никакого
//! глобального изменяемого состояния): кластеры получают `&ArchConstants`.

use serde::Serialize;
use std::fmt;

use crate::consts::NUM_BYTES_PER_READ32;
use crate::error::{Result, SnapshotError};

/// Supported target architectures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Arch {
    X64,
    Arm,
    Arm64,
}

impl Arch {
    /// Feature token that identifies the architecture in the header.
    pub fn feature_token(self) -> &'static str {
        match self {
            Arch::X64 => "x64-sysv",
            Arch::Arm => "arm-eabi",
            Arch::Arm64 => "arm64-sysv",
        }
    }

    /// Pick the architecture from the header features. Tokens are checked in a
    /// fixed priority order: x64, then arm, then arm64.
    pub fn detect<S: AsRef<str>>(features: &[S]) -> Result<Arch> {
        let has = |tok: &str| features.iter().any(|f| f.as_ref() == tok);
        [Arch::X64, Arch::Arm, Arch::Arm64]
            .into_iter()
            .find(|a| has(a.feature_token()))
            .ok_or_else(|| SnapshotError::UnsupportedArchitecture {
                features: features
                    .iter()
                    .map(|f| f.as_ref())
                    .collect::<Vec<_>>()
                    .join(" "),
            })
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Arch::X64 => "X64",
            Arch::Arm => "ARM",
            Arch::Arm64 => "ARM64",
        };
        f.write_str(s)
    }
}

/// Immutable per-snapshot target constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArchConstants {
    pub arch: Arch,
    pub is_64: bool,
    pub word_size: usize,
    pub word_size_log2: u32,
    pub object_alignment: usize,
    pub object_alignment_log2: u32,
    /// Byte offsets of the AOT monomorphic / polymorphic entry points.
    pub monomorphic_entry_offset_aot: usize,
    pub polymorphic_entry_offset_aot: usize,
    /// How many 32-bit varint reads make up one machine word.
    pub num_read32_per_word: usize,
}

impl ArchConstants {
    pub fn for_arch(arch: Arch) -> Self {
        // 64-битные значения по умолчанию
        let base = Self {
            arch,
            is_64: true,
            word_size: 8,
            word_size_log2: 3,
            object_alignment: 16,
            object_alignment_log2: 4,
            monomorphic_entry_offset_aot: 8,
            polymorphic_entry_offset_aot: 22,
            num_read32_per_word: 8 / NUM_BYTES_PER_READ32,
        };
        match arch {
            Arch::X64 => base,
            Arch::Arm64 => Self {
                polymorphic_entry_offset_aot: 20,
                ..base
            },
            Arch::Arm => Self {
                is_64: false,
                word_size: 4,
                word_size_log2: 2,
                object_alignment: 8,
                object_alignment_log2: 3,
                monomorphic_entry_offset_aot: 0,
                polymorphic_entry_offset_aot: 12,
                num_read32_per_word: 4 / NUM_BYTES_PER_READ32,
                ..base
            },
        }
    }

    /// Payload bits of a Smi (tagged small integer) on this target.
    #[inline]
    pub fn smi_bits(&self) -> u32 {
        if self.is_64 {
            62
        } else {
            30
        }
    }

    /// Whether `v` is representable as a Smi on this target.
    #[inline]
    pub fn is_valid_smi(&self, v: i64) -> bool {
        let bits = self.smi_bits();
        v >= -(1i64 << bits) && v < (1i64 << bits)
    }

    /// Detect the architecture from features and build its constants.
    pub fn resolve<S: AsRef<str>>(features: &[S]) -> Result<Self> {
        Arch::detect(features).map(Self::for_arch)
    }
}
