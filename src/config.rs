//! Parse options for `Snapshot::parse_with_config`.
//!
//! `SnapshotConfig::from_env()` reads DS_* env vars; `with_*` setters override them.
//!
//! Env:
//! - DS_INSTRUCTIONS_OFFSET — base instructions offset supplied by the loader (dec or 0x hex)
//! - DS_STRICT_COUNTS = 0|1 — fail when allocated objects differ from the header count
//! - DS_TRACE_CLUSTERS = 0|1 — per-object trace logging during alloc/fill

use std::fmt;

use crate::util::{env_flag, parse_u64_auto};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SnapshotConfig {
    /// Offset of the instructions image, if the caller knows it.
    /// Env: DS_INSTRUCTIONS_OFFSET (default None)
    pub instructions_offset: Option<u64>,

    /// Object-count mismatch after allocation is an error instead of a warning.
    /// Env: DS_STRICT_COUNTS (default false)
    pub strict_counts: bool,

    /// Log every allocated/filled object at trace level.
    /// Env: DS_TRACE_CLUSTERS (default false)
    pub trace_clusters: bool,
}

impl SnapshotConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("DS_INSTRUCTIONS_OFFSET") {
            if let Ok(n) = parse_u64_auto(&v) {
                cfg.instructions_offset = Some(n);
            }
        }
        if let Some(on) = env_flag("DS_STRICT_COUNTS") {
            cfg.strict_counts = on;
        }
        if let Some(on) = env_flag("DS_TRACE_CLUSTERS") {
            cfg.trace_clusters = on;
        }

        cfg
    }

    pub fn with_instructions_offset(mut self, off: Option<u64>) -> Self {
        self.instructions_offset = off;
        self
    }

    pub fn with_strict_counts(mut self, on: bool) -> Self {
        self.strict_counts = on;
        self
    }

    pub fn with_trace_clusters(mut self, on: bool) -> Self {
        self.trace_clusters = on;
        self
    }

    pub fn build(self) -> Self {
        self
    }
}

impl fmt::Display for SnapshotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SnapshotConfig {{ instructions_offset: {}, strict_counts: {}, trace_clusters: {} }}",
            self.instructions_offset
                .map(|v| format!("0x{:x}", v))
                .unwrap_or_else(|| "none".to_string()),
            self.strict_counts,
            self.trace_clusters,
        )
    }
}
