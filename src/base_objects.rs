//! base_objects — VM-intrinsic objects that precede every cluster.
//!
//! Порядок значим: данные кластеров ссылаются на base objects только по
//! позиционному индексу. Для isolate-снапшота этот шаг пропускается —
//! таблица берётся у родительского VM-снапшота.

use log::debug;

use crate::class_id::ClassId;
use crate::consts::{CACHED_DESCRIPTOR_COUNT, CACHED_IC_DATA_ARRAY_COUNT, NUM_STUB_ENTRIES};
use crate::kind::Kind;
use crate::object::{ObjectRecord, RefTable};

// Singletons in table order.
const SINGLETONS: &[(ClassId, &str)] = &[
    (ClassId::NULL, "Null"),
    (ClassId::INSTANCE, "Sentinel"),
    (ClassId::INSTANCE, "TransitionSentinel"),
    (ClassId::ARRAY, "EmptyArray"),
    (ClassId::ARRAY, "ZeroArray"),
    (ClassId::TYPE, "DynamicType"),
    (ClassId::TYPE, "VoidType"),
    (ClassId::TYPE_ARGUMENTS, "EmptyTypeArguments"),
    (ClassId::BOOL, "True"),
    (ClassId::BOOL, "False"),
    (ClassId::ARRAY, "ExtractorParameterTypes"),
    (ClassId::ARRAY, "ExtractorParameterNames"),
    (ClassId::CONTEXT_SCOPE, "EmptyContextScope"),
    (ClassId::OBJECT_POOL, "EmptyObjectPool"),
    (ClassId::COMPRESSED_STACK_MAPS, "EmptyCompressedStackmaps"),
    (ClassId::PC_DESCRIPTORS, "EmptyDescriptors"),
    (ClassId::LOCAL_VAR_DESCRIPTORS, "EmptyVarDescriptors"),
    (ClassId::EXCEPTION_HANDLERS, "EmptyExceptionHandlers"),
];

/// Class ids that get a class-stub base object: every internal class from
/// `CLASS` to `UNWIND_ERROR`, except `ERROR` and `CALL_SITE_DATA`.
pub fn class_stub_cids() -> impl Iterator<Item = ClassId> {
    (ClassId::CLASS.0..=ClassId::UNWIND_ERROR.0)
        .map(ClassId)
        .filter(|c| *c != ClassId::ERROR && *c != ClassId::CALL_SITE_DATA)
}

/// Deterministic base-object list for a snapshot kind.
pub fn base_objects(kind: Kind) -> Vec<ObjectRecord> {
    let mut out = Vec::new();

    for &(cid, name) in SINGLETONS {
        out.push(ObjectRecord::base(cid, name));
    }
    for i in 0..CACHED_DESCRIPTOR_COUNT {
        out.push(ObjectRecord::base_slot(
            ClassId::ARRAY,
            "CachedArgsDescriptors",
            Some(i as i64),
        ));
    }
    for i in 0..CACHED_IC_DATA_ARRAY_COUNT {
        out.push(ObjectRecord::base_slot(
            ClassId::ARRAY,
            "CachedICDataArrays",
            Some(i as i64),
        ));
    }
    out.push(ObjectRecord::base(ClassId::ARRAY, "CachedArray"));

    for cid in class_stub_cids() {
        out.push(ObjectRecord::base_slot(
            ClassId::CLASS,
            "ClassStub",
            Some(i64::from(cid.raw())),
        ));
    }
    out.push(ObjectRecord::base_slot(
        ClassId::CLASS,
        "DynamicCid",
        Some(i64::from(ClassId::DYNAMIC.raw())),
    ));
    out.push(ObjectRecord::base_slot(
        ClassId::CLASS,
        "VoidCid",
        Some(i64::from(ClassId::VOID.raw())),
    ));

    // Код стабов здесь только если он не встроен в сам снапшот.
    if !kind.includes_code() {
        for i in 0..NUM_STUB_ENTRIES {
            out.push(ObjectRecord::base_slot(ClassId::CODE, "StubCode", Some(i as i64)));
        }
    }
    out
}

/// Append the base objects to `refs`; returns how many were added.
pub fn add_base_objects(refs: &RefTable, kind: Kind) -> usize {
    let objs = base_objects(kind);
    let n = objs.len();
    for rec in objs {
        refs.assign(rec);
    }
    debug!("added {} base objects (kind {}), next ref {}", n, kind, refs.next_index());
    n
}
