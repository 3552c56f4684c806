// Tests for container summary
//
//  Copyright (C) 2014-2023 Ryan Specialty, LLC.
//
//  This file is part of TAME.
//
//  This program is free software: you can redistribute it and/or modify
//  it under the terms of the GNU General Public License as published by
//  the Free Software Foundation, either version 3 of the License, or
//  (at your option) any later version.
//
//  This program is distributed in the hope that it will be useful,
//  but WITHOUT ANY WARRANTY; without even the implied warranty of
//  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//  GNU General Public License for more details.
//
//  You should have received a copy of the GNU General Public License
//  along with this program.  If not, see <http://www.gnu.org/licenses/>.

use super::*;
use crate::error::LinkError;
use byteorder::{LittleEndian, WriteBytesExt};
use proptest::prelude::*;

type Sut = Summary;

fn sample() -> Sut {
    let generations = vec![
        Generation {
            export_count: 3,
            name_count: 7,
        },
        Generation {
            export_count: 4,
            name_count: 9,
        },
    ];

    let header_len = Sut::encoded_len_for(generations.len()) as u32;

    Sut {
        flags: ContainerFlags::ALLOW_DOWNLOAD | ContainerFlags::NEED,
        symbols: TableInfo {
            count: 9,
            offset: header_len,
        },
        exports: TableInfo {
            count: 4,
            offset: header_len,
        },
        imports: TableInfo {
            count: 0,
            offset: header_len,
        },
        ..Sut::new(Guid::from_words([1, 2, 3, 4]), generations)
    }
}

fn write(summary: &Sut) -> Vec<u8> {
    let mut buf = Vec::new();
    summary.write(&mut buf).unwrap();
    buf
}

/// Header in the layout predating generation records,
///   followed by `stamps` heritage GUIDs.
fn legacy_header(version: u16, stamps: &[[u32; 4]]) -> Vec<u8> {
    let mut buf = Vec::new();
    let header_len = 44;

    buf.write_u32::<LittleEndian>(global::CONTAINER_TAG).unwrap();
    buf.write_u32::<LittleEndian>(u32::from(version)).unwrap();
    buf.write_u32::<LittleEndian>(0).unwrap();

    // symbols, exports, imports
    for count in [5, 2, 1] {
        buf.write_i32::<LittleEndian>(count).unwrap();
        buf.write_i32::<LittleEndian>(header_len).unwrap();
    }

    buf.write_i32::<LittleEndian>(stamps.len() as i32).unwrap();
    buf.write_i32::<LittleEndian>(header_len).unwrap();
    assert_eq!(header_len as usize, buf.len());

    for stamp in stamps {
        for word in stamp {
            buf.write_u32::<LittleEndian>(*word).unwrap();
        }
    }

    buf
}

#[test]
fn written_summary_reads_back() {
    let summary = sample();
    let buf = write(&summary);

    assert_eq!(summary.encoded_len(), buf.len());
    assert_eq!(56 + 8 * 2, buf.len());

    let mut reader = ContainerReader::new(&buf);
    assert_eq!(summary, Sut::read(&mut reader).unwrap());
    assert_eq!(buf.len() as u64, reader.position());
}

#[test]
fn version_field_packs_licensee_version() {
    let summary = Sut {
        licensee_version: 3,
        ..sample()
    };

    let buf = write(&summary);
    assert_eq!(&[69, 0, 3, 0], &buf[4..8]);
    assert_eq!(0x0003_0045, summary.packed_version());

    let given = Sut::read(&mut ContainerReader::new(&buf)).unwrap();
    assert_eq!(3, given.licensee_version);
    assert_eq!(global::CURRENT_VERSION, given.file_version);
}

#[test]
fn rejects_bad_tag() {
    let mut buf = write(&sample());
    buf[0] ^= 0xFF;

    assert!(matches!(
        Sut::read(&mut ContainerReader::new(&buf)),
        Err(LinkError::CorruptHeader {
            field: "tag",
            offset: 0
        })
    ));
}

#[test]
fn rejects_versions_outside_window() {
    for version in [global::MIN_VERSION - 1, global::CURRENT_VERSION + 1] {
        let mut buf = write(&sample());
        buf[4..6].copy_from_slice(&version.to_le_bytes());

        assert!(
            matches!(
                Sut::read(&mut ContainerReader::new(&buf)),
                Err(LinkError::VersionUnsupported(v)) if v == version
            ),
            "version {version}"
        );
    }
}

#[test]
fn negative_table_count_names_field_and_offset() {
    let mut buf = write(&sample());
    buf[20..24].copy_from_slice(&(-1i32).to_le_bytes());

    assert!(matches!(
        Sut::read(&mut ContainerReader::new(&buf)),
        Err(LinkError::CorruptHeader {
            field: "export count",
            offset: 20
        })
    ));
}

#[test]
fn table_offset_past_end_is_corrupt() {
    let mut buf = write(&sample());
    buf[32..36].copy_from_slice(&1000i32.to_le_bytes());

    assert!(matches!(
        Sut::read(&mut ContainerReader::new(&buf)),
        Err(LinkError::CorruptHeader {
            field: "import offset",
            offset: 32
        })
    ));
}

#[test]
fn truncated_summary_is_corrupt() {
    let buf = write(&Sut {
        symbols: TableInfo::default(),
        exports: TableInfo::default(),
        imports: TableInfo::default(),
        ..sample()
    });

    assert!(matches!(
        Sut::read(&mut ContainerReader::new(&buf[..40])),
        Err(LinkError::CorruptHeader { field: "guid", .. })
    ));

    assert!(matches!(
        Sut::read(&mut ContainerReader::new(&buf[..10])),
        Err(LinkError::CorruptHeader {
            field: "flags",
            offset: 8
        })
    ));
}

#[test]
fn excessive_generation_count_is_corrupt() {
    let mut buf = write(&sample());
    buf[52..56].copy_from_slice(&u32::MAX.to_le_bytes());

    assert!(matches!(
        Sut::read(&mut ContainerReader::new(&buf)),
        Err(LinkError::CorruptHeader {
            field: "generation count",
            offset: 52
        })
    ));
}

#[test]
fn read_states_transition_in_order() {
    let buf = write(&sample());
    let mut reader = ContainerReader::new(&buf);

    let st = ReadState::default();
    assert_eq!(ReadState::ReadTag, st);

    let st = st.read_next(&mut reader).unwrap();
    assert_eq!(ReadState::ReadVersionAndFlags, st);
    assert_eq!(4, reader.position());

    let st = st.read_next(&mut reader).unwrap();
    assert!(matches!(st, ReadState::ReadTableCounts(_)));
    assert_eq!(12, reader.position());

    let st = st.read_next(&mut reader).unwrap();
    assert!(matches!(st, ReadState::ReadGenerationInfoOrHeritage(_)));
    assert_eq!(36, reader.position());

    let st = st.read_next(&mut reader).unwrap();
    assert_eq!(ReadState::Ready(sample()), st);

    // Ready is terminal.
    let st = st.read_next(&mut reader).unwrap();
    assert_eq!(ReadState::Ready(sample()), st);
}

#[test]
fn heritage_uses_last_stamp_as_identity() {
    let buf = legacy_header(63, &[[1, 1, 1, 1], [2, 2, 2, 2], [3, 4, 5, 6]]);
    let mut reader = ContainerReader::new(&buf);

    let given = Sut::read(&mut reader).unwrap();

    assert_eq!(Guid::from_words([3, 4, 5, 6]), given.guid);
    assert_eq!(44, reader.position(), "must seek back after heritage");
}

#[test]
fn heritage_without_stamps_has_zero_identity() {
    let buf = legacy_header(60, &[]);

    let given = Sut::read(&mut ContainerReader::new(&buf)).unwrap();
    assert!(given.guid.is_zero());
}

#[test]
fn heritage_past_end_is_corrupt() {
    let mut buf = legacy_header(63, &[[1, 1, 1, 1]]);
    buf.truncate(buf.len() - 1);

    assert!(matches!(
        Sut::read(&mut ContainerReader::new(&buf)),
        Err(LinkError::CorruptHeader {
            field: "heritage offset",
            offset: 40
        })
    ));
}

proptest! {
    #[test]
    fn heritage_synthesizes_single_generation(
        stamps in prop::collection::vec(any::<[u32; 4]>(), 0..8),
        version in global::MIN_VERSION..global::GENERATIONS_VERSION,
    ) {
        let buf = legacy_header(version, &stamps);
        let given = Sut::read(&mut ContainerReader::new(&buf)).unwrap();

        prop_assert_eq!(
            vec![Generation { export_count: 2, name_count: 5 }],
            given.generations
        );
    }
}

#[test]
fn legacy_summary_is_written_in_newest_layout() {
    let buf = legacy_header(62, &[[9, 8, 7, 6]]);
    let legacy = Sut::read(&mut ContainerReader::new(&buf)).unwrap();

    let rewritten = write(&legacy);
    assert_eq!(Sut::encoded_len_for(1), rewritten.len());

    let given = Sut::read(&mut ContainerReader::new(&rewritten)).unwrap();

    assert_eq!(global::CURRENT_VERSION, given.file_version);
    assert_eq!(legacy.guid, given.guid);
    assert_eq!(legacy.generations, given.generations);
}

#[test]
fn write_states_mirror_read_states() {
    let summary = sample();
    let mut buf = Vec::new();

    let st = WriteState::default();
    let st = st.write_next(&summary, &mut buf).unwrap();
    assert_eq!((WriteState::WriteVersionAndFlags, 4), (st, buf.len()));

    let st = st.write_next(&summary, &mut buf).unwrap();
    assert_eq!((WriteState::WriteTableCounts, 12), (st, buf.len()));

    let st = st.write_next(&summary, &mut buf).unwrap();
    assert_eq!((WriteState::WriteGenerationInfo, 36), (st, buf.len()));

    let st = st.write_next(&summary, &mut buf).unwrap();
    assert_eq!((WriteState::Done, 72), (st, buf.len()));
}

#[test]
fn guid_display() {
    let guid = Guid::from_words([0xDEADBEEF, 1, 0, 0xFFFFFFFF]);
    assert_eq!("DEADBEEF-00000001-00000000-FFFFFFFF", guid.to_string());
}

#[test]
fn new_guids_differ() {
    assert_ne!(Guid::new_v4(), Guid::new_v4());
}
