use std::collections::{BTreeMap, HashMap};

use deku::DekuContainerRead;
use pretty_assertions::assert_eq;
use sha2::{Digest, Sha256};
use xattr_file::header::{AppleDoubleHeader, AttributeEntry, AttributeHeader};
use xattr_file::types::EntryId;
use xattr_file::{Error, create};

/// Parsed view of a `._` file, used to check offsets against the raw buffer.
struct Parsed {
    header: AppleDoubleHeader,
    attr_header: AttributeHeader,
    entries: Vec<AttributeEntry>,
}

fn parse(file: &[u8]) -> Parsed {
    let (_, header) = AppleDoubleHeader::from_bytes((file, 0)).unwrap();
    let mut position = AppleDoubleHeader::SIZE;

    let (_, attr_header) = AttributeHeader::from_bytes((&file[position..], 0)).unwrap();
    position += AttributeHeader::SIZE;

    let count = u16::from_be_bytes([file[position], file[position + 1]]);
    position += 2;

    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (_, entry) = AttributeEntry::from_bytes((&file[position..], 0)).unwrap();
        position += AttributeEntry::padded_length(entry.name().len());
        entries.push(entry);
    }
    assert_eq!(position as u32, attr_header.data_start);

    Parsed {
        header,
        attr_header,
        entries,
    }
}

fn value_of<'a>(file: &'a [u8], entry: &AttributeEntry) -> &'a [u8] {
    let start = entry.offset as usize;
    &file[start..start + entry.length as usize]
}

#[test]
fn single_attribute_golden() {
    let file = create([("com.apple.test", "hello")]).unwrap();

    let expected = hex::decode(concat!(
        // header
        "00051607000200004d6163204f53205820202020202020200002000000090000",
        "003200000067000000020000009900000000",
        // attribute header
        "0000000000000000000000000000000000000000000000000000000000000000",
        "0000415454520000000000000099000000940000000500000000000000000000",
        "00000000",
        // key table
        "0001000000940000000500000f636f6d2e6170706c652e74657374000000",
        // data
        "68656c6c6f",
    ))
    .unwrap();
    assert_eq!(file, expected);

    // 50 header + 68 attribute header + 2 count + 28 record + 5 data
    assert_eq!(file.len(), 153);
    let parsed = parse(&file);
    assert_eq!(parsed.attr_header.data_start as usize, file.len() - 5);
    assert_eq!(&file[file.len() - 5..], b"hello");
    assert_eq!(parsed.entries[0].name(), b"com.apple.test");
    assert_eq!(parsed.entries[0].name_length, 15);
}

#[test]
fn empty_attribute_set() {
    let file = create(Vec::<(String, Vec<u8>)>::new()).unwrap();

    assert_eq!(file.len(), 120);
    let parsed = parse(&file);
    assert!(parsed.entries.is_empty());
    assert_eq!(parsed.attr_header.total_size, 120);
    assert_eq!(parsed.attr_header.data_start, 120);
    assert_eq!(parsed.attr_header.data_length, 0);
    assert_eq!(parsed.header.entries[0].length, 70);
    assert_eq!(parsed.header.entries[1].offset, 120);
}

#[test]
fn entries_are_sorted_by_name() {
    let file = create(HashMap::from([("b", "2"), ("a", "1")])).unwrap();
    let parsed = parse(&file);

    let names = parsed.entries.iter().map(|e| e.name()).collect::<Vec<_>>();
    assert_eq!(names, [&b"a"[..], &b"b"[..]]);
    assert_eq!(&file[parsed.attr_header.data_start as usize..], b"12");
}

#[test]
fn output_is_deterministic() {
    let forward = (0..50)
        .map(|i| (format!("user.attr.{i}"), vec![i as u8; i % 5]))
        .collect::<Vec<_>>();
    let mut backward = forward.clone();
    backward.reverse();
    let map = forward.iter().cloned().collect::<HashMap<_, _>>();

    let expected = create(forward).unwrap();
    assert_eq!(create(backward).unwrap(), expected);
    assert_eq!(create(&map).unwrap(), expected);
}

#[test]
fn lengths_and_offsets_are_consistent() {
    let attributes = BTreeMap::from([
        ("com.apple.FinderInfo", vec![0u8; 32]),
        ("com.apple.quarantine", b"0083;5f1e2a3b;Safari;".to_vec()),
        ("com.apple.lastuseddate#PS", vec![0x5f, 0x1e, 0x2a, 0x3b, 0, 0, 0, 0]),
        ("empty", Vec::new()),
        ("x", vec![0xff; 1000]),
    ]);
    let file = create(&attributes).unwrap();
    let parsed = parse(&file);
    let file_length = file.len() as u32;

    let [finder_info, resource_fork] = &parsed.header.entries[..] else {
        panic!("expected two entries");
    };
    assert_eq!(EntryId::try_from(finder_info.entry_id), Ok(EntryId::FinderInfo));
    assert_eq!(finder_info.offset, AppleDoubleHeader::SIZE as u32);
    assert_eq!(finder_info.offset + finder_info.length, file_length);
    assert_eq!(EntryId::try_from(resource_fork.entry_id), Ok(EntryId::ResourceFork));
    assert_eq!(resource_fork.offset, file_length);
    assert_eq!(resource_fork.length, 0);

    assert_eq!(parsed.attr_header.total_size, file_length);
    assert_eq!(
        parsed.attr_header.data_start + parsed.attr_header.data_length,
        file_length
    );

    assert_eq!(parsed.entries.len(), attributes.len());
    for (entry, (name, value)) in parsed.entries.iter().zip(&attributes) {
        assert_eq!(entry.name(), name.as_bytes());
        assert_eq!(entry.flags, 0);
        assert_eq!(value_of(&file, entry), value.as_slice());
    }
}

#[test]
fn name_length_boundary() {
    let longest = "n".repeat(254);
    let file = create([(longest.as_str(), "v")]).unwrap();
    let parsed = parse(&file);
    assert_eq!(parsed.entries[0].name_length, 255);
    assert_eq!(value_of(&file, &parsed.entries[0]), b"v");

    let too_long = "n".repeat(255);
    assert!(matches!(
        create([(too_long.as_str(), "v")]),
        Err(Error::InvalidAttributeName { .. })
    ));
}

#[test]
fn rejects_nul_in_name() {
    let err = create([("user.a\0b", "v")]).unwrap_err();
    assert!(matches!(err, Error::InvalidAttributeName { .. }));
    assert!(err.to_string().contains("NUL"));
}

#[test]
fn large_attribute_set_digest() {
    let mut attributes = (0..100)
        .map(|i: usize| (format!("org.example.attr{i:03}"), vec![i as u8; i % 7]))
        .collect::<HashMap<_, _>>();
    attributes.insert(
        "com.apple.quarantine".to_string(),
        b"0083;5f1e2a3b;Safari;".to_vec(),
    );

    let file = create(&attributes).unwrap();

    assert_eq!(file.len(), 3672);
    assert_eq!(
        format!("{:x}", Sha256::digest(&file)),
        "b57503819caf55d8432046889b8559258419bcfa1e9a2044c611fcae1a4d35e9"
    );
}
