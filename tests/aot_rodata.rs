mod common;

use anyhow::Result;

use common::Fixture;
use DartSnap::{Arch, ClassId, Kind, ObjectData, Snapshot};

/// AOT snapshot: descriptors and strings live in the data image.
///   canonical: PcDescriptors [+0]         -> ref 91
///   regular:   OneByteString [+16, +48]   -> refs 92, 93
fn aot_fixture() -> Fixture {
    let mut f = Fixture::vm(3);
    assert_eq!(f.num_base_objects, 90);
    f.features = "product use_bare_instructions x64-sysv".into();
    f.num_canonical = 1;
    f.num_clusters = 1;
    f.num_objects = 93;
    f.alloc.cid(ClassId::PC_DESCRIPTORS.raw()).unsigned(1).unsigned(0);
    f.alloc.cid(ClassId::ONE_BYTE_STRING.raw()).unsigned(2).unsigned(1).unsigned(2);
    f.image = vec![0xab; 64];
    f
}

#[test]
fn aot_objects_point_into_data_image() -> Result<()> {
    let bytes = aot_fixture().build();
    let s = Snapshot::parse(&bytes, None)?;

    assert_eq!(s.kind(), Kind::FullAot);
    assert!(s.is_precompiled());
    assert!(s.includes_code());
    assert!(s.use_bare_instructions());
    assert!(!s.is_debug());
    assert_eq!(s.data_image().len(), 64);

    assert_eq!(s.object(91).unwrap().data, ObjectData::ReadOnly { offset: 0 });
    assert!(s.object(91).unwrap().canonical);
    assert_eq!(s.object(92).unwrap().data, ObjectData::ReadOnly { offset: 16 });
    assert_eq!(s.object(93).unwrap().data, ObjectData::ReadOnly { offset: 48 });
    assert_eq!(s.object(93).unwrap().cid, ClassId::ONE_BYTE_STRING);

    assert_eq!(s.symbol_table(), 1);
    assert_eq!(s.stubs().len(), 103);
    Ok(())
}

#[test]
fn no_stub_base_objects_when_code_is_included() -> Result<()> {
    let bytes = aot_fixture().build();
    let s = Snapshot::parse(&bytes, None)?;
    let recs = s.refs().records();
    assert!(recs.iter().all(|r| r.name() != "StubCode"));
    Ok(())
}

#[test]
fn rodata_offsets_scale_with_alignment() -> Result<()> {
    for (features, kind, arch, expected) in [
        ("arm-eabi", 3u64, Arch::Arm, 8usize),
        ("arm64-sysv", 2, Arch::Arm64, 16),
    ] {
        let mut f = Fixture::vm(kind);
        f.features = features.into();
        f.num_clusters = 1;
        f.num_objects = f.num_base_objects + 1;
        f.alloc.cid(ClassId::CODE_SOURCE_MAP.raw()).unsigned(1).unsigned(1);
        let bytes = f.build();

        let s = Snapshot::parse(&bytes, None)?;
        assert_eq!(s.arch(), arch);
        assert!(!s.is_precompiled(), "no product feature");
        let r = s.num_base_objects() as usize + 1;
        assert_eq!(s.object(r).unwrap().data, ObjectData::ReadOnly { offset: expected });
    }
    Ok(())
}

#[test]
fn json_report_describes_snapshot() -> Result<()> {
    let bytes = aot_fixture().build();
    let s = Snapshot::parse(&bytes, None)?;
    let v: serde_json::Value = serde_json::from_str(&s.report().to_json()?)?;

    assert_eq!(v["isolate"], false);
    assert_eq!(v["header"]["kind"], "FullAot");
    assert_eq!(v["header"]["num_objects"], 93);
    assert_eq!(v["version"], "Dart v2.13");
    assert_eq!(v["flags"]["is_precompiled"], true);
    assert_eq!(v["arch"]["arch"], "X64");
    assert_eq!(v["arch"]["word_size"], 8);
    assert_eq!(v["data_image_len"], 64);
    assert_eq!(v["next_ref_index"], 94);
    assert_eq!(v["canonical_clusters"][0]["cid"], 19);
    assert_eq!(v["clusters"][0]["cid"], 79);
    assert_eq!(v["clusters"][0]["start"], 92);
    assert_eq!(v["clusters"][0]["stop"], 94);
    assert_eq!(v["stub_count"], 103);
    assert!(v.get("instructions_offset").is_none());
    Ok(())
}
