// Tests for container symbol table
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

#[test]
fn new_table_contains_only_sentinel() {
    let sut = SymbolTable::new();

    assert_eq!(1, sut.len());
    assert_eq!(global::NONE_SYMBOL, sut.resolve(SymbolIndex::NONE).unwrap());
}

#[test]
fn recognizes_equal_strings() {
    let mut sut = SymbolTable::new();

    let a = sut.intern("foo");
    let b = sut.intern(&String::from("foo"));
    let c = sut.intern("foobar");
    let d = sut.intern(&"foobar"[0..3]);

    assert_eq!(a, b);
    assert_eq!(a, d);
    assert_ne!(a, c);
    assert_eq!(3, sut.len(), "sentinel, foo, foobar");
}

#[test]
fn indices_are_assigned_in_insertion_order() {
    let mut sut = SymbolTable::new();

    assert_eq!(SymbolIndex::new(1), sut.intern("Root"));
    assert_eq!(SymbolIndex::new(2), sut.intern("Leaf"));
    assert_eq!(SymbolIndex::new(1), sut.intern("Root"));
    assert_eq!(SymbolIndex::new(3), sut.intern("Apple"));

    let order: Vec<_> = sut.iter().map(|(_, text)| text).collect();
    assert_eq!(vec!["None", "Root", "Leaf", "Apple"], order);
}

#[test]
fn intern_soft_does_not_intern() {
    let mut sut = SymbolTable::new();
    let foo = sut.intern("foo");

    assert_eq!(Some(foo), sut.intern_soft("foo"));
    assert_eq!(None, sut.intern_soft("bar"));
    assert!(!sut.contains("bar"));
    assert_eq!(2, sut.len());
}

#[test]
fn sorted_is_a_copy() {
    let mut sut = SymbolTable::new();
    let zed = sut.intern("Zed");
    sut.intern("Alpha");

    assert_eq!(vec!["Alpha", "None", "Zed"], sut.sorted());

    assert_eq!(
        "Zed",
        sut.resolve(zed).unwrap(),
        "sorting must not disturb indices"
    );
}

#[test]
fn resolve_out_of_range() {
    let sut = SymbolTable::new();

    assert!(matches!(
        sut.resolve(SymbolIndex::new(1)),
        Err(LinkError::IndexOutOfRange(1))
    ));
}

#[test]
fn from_raw_rejects_negative_index() {
    assert!(matches!(
        SymbolIndex::from_raw(-1),
        Err(LinkError::IndexOutOfRange(_))
    ));

    assert_eq!(SymbolIndex::new(5), SymbolIndex::from_raw(5).unwrap());
}

#[test]
fn flags_merge_on_reintern() {
    let mut sut = SymbolTable::new();

    let a = sut.intern_flagged("Obj", ObjectFlags::LOAD_FOR_CLIENT);
    let b = sut.intern_flagged("Obj", ObjectFlags::LOAD_FOR_EDIT);
    sut.intern("Obj");

    assert_eq!(a, b);
    assert_eq!(
        ObjectFlags::LOAD_FOR_CLIENT | ObjectFlags::LOAD_FOR_EDIT,
        sut.flags(a).unwrap()
    );
}

#[test]
fn written_table_reads_back() {
    let mut sut = SymbolTable::new();
    sut.intern("Root");
    sut.intern_flagged("Leaf", ObjectFlags::LOAD_FOR_SERVER);

    let mut buf = Vec::new();
    sut.write(&mut buf).unwrap();

    assert_eq!(sut.encoded_len(), buf.len());

    let mut reader = ContainerReader::new(&buf);
    let given =
        SymbolTable::read(&mut reader, sut.len(), global::CURRENT_VERSION)
            .unwrap();

    assert_eq!(sut, given);
    assert_eq!(buf.len() as u64, reader.position());
}

#[test]
fn sized_entry_layout() {
    let mut sut = SymbolTable::default();
    sut.intern_flagged("ab", ObjectFlags::from_bits_retain(0x0102_0304));

    let mut buf = Vec::new();
    sut.write(&mut buf).unwrap();

    assert_eq!(vec![3, b'a', b'b', 0, 0x04, 0x03, 0x02, 0x01], buf);
}

#[test]
fn reads_nul_terminated_symbols_before_sized_version() {
    let buf = b"None\0\0\0\0\0Pkg\0\x00\x00\x01\x00";
    let mut reader = ContainerReader::new(buf);

    let given = SymbolTable::read(
        &mut reader,
        2,
        global::SIZED_SYMBOL_VERSION - 1,
    )
    .unwrap();

    assert_eq!("Pkg", given.resolve(SymbolIndex::new(1)).unwrap());
    assert_eq!(
        ObjectFlags::LOAD_FOR_CLIENT,
        given.flags(SymbolIndex::new(1)).unwrap()
    );
}

#[test]
fn loaded_table_keeps_whatever_is_at_index_zero() {
    let buf = [4, b'A', b'b', b'c', 0, 0, 0, 0, 0];
    let mut reader = ContainerReader::new(&buf);

    let given = SymbolTable::read(&mut reader, 1, global::CURRENT_VERSION)
        .unwrap();

    assert_eq!("Abc", given.resolve(SymbolIndex::NONE).unwrap());
    assert!(!given.contains(global::NONE_SYMBOL));
}

#[test]
fn non_utf8_symbol_is_corrupt() {
    let buf = [2, 0xFF, 0, 0, 0, 0, 0];
    let mut reader = ContainerReader::new(&buf);

    assert!(matches!(
        SymbolTable::read(&mut reader, 1, global::CURRENT_VERSION),
        Err(LinkError::CorruptTable {
            table: Table::Symbols,
            entry: 0,
            field: "text",
        })
    ));
}

#[test]
fn sized_symbol_without_nul_is_corrupt() {
    let buf = [2, b'a', b'b', 0, 0, 0, 0];
    let mut reader = ContainerReader::new(&buf);

    assert!(matches!(
        SymbolTable::read(&mut reader, 1, global::CURRENT_VERSION),
        Err(LinkError::CorruptTable {
            field: "text",
            ..
        })
    ));
}

#[test]
fn truncated_flags_are_corrupt() {
    let buf = [2, b'a', 0, 0, 0];
    let mut reader = ContainerReader::new(&buf);

    assert!(matches!(
        SymbolTable::read(&mut reader, 1, global::CURRENT_VERSION),
        Err(LinkError::CorruptTable {
            table: Table::Symbols,
            entry: 0,
            field: "flags",
        })
    ));
}
