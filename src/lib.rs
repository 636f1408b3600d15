#![allow(non_snake_case)]

// Базовые модули
pub mod consts;
pub mod error;
pub mod config;
pub mod metrics;
pub mod util;   // src/util/mod.rs

// Поток и формат
pub mod stream; // src/stream/{mod,varint}.rs
pub mod arch;
pub mod kind;
pub mod header;
pub mod class_id;

// Граф объектов
pub mod object;
pub mod base_objects;
pub mod cluster; // src/cluster/{mod,driver,numbers,strings,arrays,rodata}.rs
pub mod roots;

// Фасад
pub mod snapshot;
pub mod report;

// CLI (dartsnap)
pub mod cli;

// Удобные реэкспорты
pub use arch::{Arch, ArchConstants};
pub use class_id::ClassId;
pub use config::SnapshotConfig;
pub use error::{Result, SnapshotError};
pub use header::{SnapshotFlags, SnapshotHeader};
pub use kind::Kind;
pub use object::{ObjectData, ObjectRecord, RefIndex, RefTable};
pub use report::SnapshotReport;
pub use roots::SnapshotRoots;
pub use snapshot::Snapshot;
pub use stream::SnapshotStream;
