mod common;

use anyhow::Result;

use common::{Fixture, X64_PRODUCT};
use DartSnap::consts::SUPPORTED_VERSION_HASH;
use DartSnap::{Arch, ClassId, Kind, ObjectData, Snapshot};

/// Full (no code) VM snapshot:
///   canonical: Mint [5, 2^62]                  -> refs 194, 195
///   regular:   Array(len 3)                    -> ref 196
///              OneByteString("hi")             -> ref 197
///              Double(-2.25)                   -> ref 198
/// The array points forward at the string and the double.
fn full_vm() -> Fixture {
    let mut f = Fixture::vm(0);
    assert_eq!(f.num_base_objects, 193);
    f.num_canonical = 1;
    f.num_clusters = 3;
    f.num_objects = 198;

    f.alloc.cid(ClassId::MINT.raw()).unsigned(2).signed(5).signed(1 << 62);
    f.alloc.cid(ClassId::ARRAY.raw()).unsigned(1).unsigned(3);
    f.alloc.cid(ClassId::ONE_BYTE_STRING.raw()).unsigned(1).unsigned(2);
    f.alloc.cid(ClassId::DOUBLE.raw()).unsigned(1);

    // Array: length, type args, elements
    f.fill.unsigned(3).unsigned(0).unsigned(197).unsigned(198).unsigned(194);
    // String: length + Latin-1 bytes
    f.fill.unsigned(2).raw(b"hi");
    // Double: bit pattern as signed varint
    f.fill.signed((-2.25f64).to_bits() as i64);

    f.roots = common::Writer::new();
    f.roots.unsigned(197);
    f
}

#[test]
fn parses_full_vm_snapshot() -> Result<()> {
    let bytes = full_vm().build();
    let s = Snapshot::parse(&bytes, None)?;

    assert_eq!(s.kind(), Kind::Full);
    assert_eq!(s.hash(), SUPPORTED_VERSION_HASH);
    assert_eq!(s.features(), &["product".to_string(), "x64-sysv".to_string()]);
    assert_eq!(s.size(), bytes.len() as u64 - 4);
    assert_eq!(s.arch(), Arch::X64);
    assert!(s.is_64());
    assert!(s.is_product());
    assert!(!s.is_precompiled());
    assert!(!s.includes_code());
    assert!(!s.is_isolate());
    assert_eq!(s.stream_end(), bytes.len());

    assert_eq!(s.next_ref_index(), 199);
    assert_eq!(s.refs().assigned() as u64, s.num_objects());

    let mint_small = s.object(194).unwrap();
    assert!(mint_small.canonical);
    assert_eq!(mint_small.cid, ClassId::SMI);
    assert_eq!(mint_small.data, ObjectData::Smi(5));
    let mint_big = s.object(195).unwrap();
    assert_eq!(mint_big.cid, ClassId::MINT);
    assert_eq!(mint_big.data, ObjectData::Mint(1 << 62));

    let arr = s.object(196).unwrap();
    assert!(!arr.canonical);
    assert_eq!(
        arr.data,
        ObjectData::Array {
            type_arguments: 0,
            elements: vec![197, 198, 194],
        }
    );
    assert_eq!(s.object(197).unwrap().data, ObjectData::String("hi".into()));
    assert_eq!(s.object(198).unwrap().data, ObjectData::Double(-2.25));

    assert_eq!(s.canonical_clusters().len(), 1);
    assert_eq!(s.canonical_clusters()[0].len(), 2);
    let regular: Vec<_> = s.clusters().iter().map(|c| (c.cid, c.start, c.stop)).collect();
    assert_eq!(
        regular,
        vec![
            (ClassId::ARRAY, 196, 197),
            (ClassId::ONE_BYTE_STRING, 197, 198),
            (ClassId::DOUBLE, 198, 199),
        ]
    );

    assert_eq!(s.symbol_table(), 197);
    assert!(s.stubs().is_empty());
    Ok(())
}

#[test]
fn base_objects_come_first() -> Result<()> {
    let bytes = full_vm().build();
    let s = Snapshot::parse(&bytes, None)?;

    assert!(s.object(0).is_none());
    assert_eq!(s.object(1).unwrap().name(), "Null");
    let last_base = s.object(193).unwrap();
    assert!(last_base.is_base());
    assert_eq!(last_base.name(), "StubCode");
    assert!(!s.object(194).unwrap().is_base());
    Ok(())
}

#[test]
fn summary_lists_header_fields() -> Result<()> {
    let bytes = full_vm().build();
    let s = Snapshot::parse(&bytes, None)?;
    let text = s.summary();

    assert!(text.starts_with("Magic: 0xdcdcf5f5\n"));
    assert!(text.contains(&format!("Snapshot size (including 4B of magic): {}B", bytes.len())));
    assert!(text.contains("Kind: FULL\n"));
    assert!(text.contains(&format!("Version: {} (Dart v2.13)", SUPPORTED_VERSION_HASH)));
    assert!(text.contains("Features: product, x64-sysv\n"));
    assert!(text.contains("Architecture: X64\n"));
    assert!(text.contains("Base objects count: 193\n"));
    assert!(text.contains("Objects count: 198\n"));
    assert!(text.contains("Canonical clusters count: 1\n"));
    assert!(text.contains("Clusters count: 3\n"));
    assert!(text.ends_with(&format!("Data image offset: {}", s.data_image_offset())));
    Ok(())
}

#[test]
fn data_image_starts_at_aligned_offset() -> Result<()> {
    let mut f = full_vm();
    f.image = (0u8..32).collect();
    let bytes = f.build();
    let s = Snapshot::parse(&bytes, None)?;

    assert_eq!(s.data_image_offset() % 16, 0);
    assert_eq!(s.data_image_offset(), (s.size() + 4 + 15) / 16 * 16);
    assert_eq!(s.data_image(), &f.image[..]);
    Ok(())
}

#[test]
fn arm_uses_narrow_smi_range() -> Result<()> {
    let mut f = Fixture::vm(0);
    f.features = "arm-eabi".into();
    f.num_clusters = 1;
    f.num_objects = f.num_base_objects + 2;
    f.alloc.cid(ClassId::MINT.raw()).unsigned(2).signed(1 << 29).signed(1 << 40);
    let bytes = f.build();

    let s = Snapshot::parse(&bytes, None)?;
    assert_eq!(s.arch(), Arch::Arm);
    assert!(!s.is_64());
    assert!(!s.is_product());
    assert_eq!(s.constants().word_size, 4);
    let first = s.num_base_objects() as usize + 1;
    assert_eq!(s.object(first).unwrap().data, ObjectData::Smi(1 << 29));
    assert_eq!(s.object(first + 1).unwrap().data, ObjectData::Mint(1 << 40));
    Ok(())
}

#[test]
fn x64_wins_over_other_arch_tokens() -> Result<()> {
    let mut f = Fixture::vm(0);
    f.features = format!("arm64-sysv {} arm-eabi", X64_PRODUCT);
    let bytes = f.build();
    let s = Snapshot::parse(&bytes, None)?;
    assert_eq!(s.arch(), Arch::X64);
    Ok(())
}

#[test]
fn growable_array_and_type_arguments() -> Result<()> {
    let mut f = Fixture::vm(0);
    let b = f.num_base_objects as usize;
    f.num_clusters = 2;
    f.num_objects = f.num_base_objects + 2;
    f.alloc.cid(ClassId::TYPE_ARGUMENTS.raw()).unsigned(1).unsigned(2);
    f.alloc.cid(ClassId::GROWABLE_OBJECT_ARRAY.raw()).unsigned(1);
    // TypeArguments: length, hash, nullability, instantiations, types
    f.fill
        .unsigned(2)
        .signed(-7)
        .unsigned(3)
        .unsigned(1)
        .unsigned(5)
        .unsigned(6);
    // GrowableObjectArray: type args, length, data
    f.fill.unsigned(b as u64 + 1).unsigned(1).unsigned(2);
    let bytes = f.build();

    let s = Snapshot::parse(&bytes, None)?;
    assert_eq!(
        s.object(b + 1).unwrap().data,
        ObjectData::TypeArguments {
            hash: -7,
            nullability: 3,
            instantiations: 1,
            types: vec![5, 6],
        }
    );
    assert_eq!(
        s.object(b + 2).unwrap().data,
        ObjectData::GrowableArray {
            type_arguments: b + 1,
            length: 1,
            data: 2,
        }
    );
    Ok(())
}

#[test]
fn two_byte_strings_decode_utf16_units() -> Result<()> {
    let mut f = Fixture::vm(0);
    let b = f.num_base_objects as usize;
    f.num_clusters = 1;
    f.num_objects = f.num_base_objects + 1;
    f.alloc.cid(ClassId::TWO_BYTE_STRING.raw()).unsigned(1).unsigned(3);
    f.fill.unsigned(3);
    for unit in "Ж→z".encode_utf16() {
        f.fill.signed(i64::from(unit as i16));
    }
    let bytes = f.build();

    let s = Snapshot::parse(&bytes, None)?;
    assert_eq!(s.object(b + 1).unwrap().data, ObjectData::String("Ж→z".into()));
    Ok(())
}
