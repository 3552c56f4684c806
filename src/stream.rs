// Position-aware container reader
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

//! Reading fixed-width and compact fields from an in-memory container.
//!
//! Containers are read into memory in their entirety before being
//!   parsed,
//!     since exports retain the container's bytes for later access to
//!     their serialized payloads.
//! [`ContainerReader`] wraps those bytes and attaches context to every
//!   failure:
//!     a failed read of a header field produces
//!     [`LinkError::CorruptHeader`] naming the field and its offset,
//!   and a failed read of a table entry produces
//!     [`LinkError::CorruptTable`] naming the table,
//!     entry,
//!     and field.
//!
//! All fixed-width fields are little-endian.

use crate::error::{LinkError, Result, Table};
use crate::index::{self, CompactIndexError};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Cursor, Read};

/// Location within a container that is being read,
///   used to give context to errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum At {
    /// The container summary.
    Header,

    /// The given entry of a table.
    Entry(Table, usize),
}

/// Reader over the bytes of a single container.
#[derive(Debug)]
pub struct ContainerReader<'a> {
    cur: Cursor<&'a [u8]>,
}

impl<'a> ContainerReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            cur: Cursor::new(bytes),
        }
    }

    /// Current byte offset from the start of the container.
    #[inline]
    pub fn position(&self) -> u64 {
        self.cur.position()
    }

    /// Total length of the container in bytes.
    #[inline]
    pub fn len(&self) -> u64 {
        self.cur.get_ref().len() as u64
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Move to an absolute offset within the container.
    ///
    /// Seeking past the end of the container is not an error in itself;
    ///   the next read will fail.
    #[inline]
    pub fn seek(&mut self, offset: u64) {
        self.cur.set_position(offset);
    }

    fn fail(&self, at: At, field: &'static str, offset: u64) -> LinkError {
        match at {
            At::Header => LinkError::CorruptHeader { field, offset },
            At::Entry(table, entry) => LinkError::CorruptTable {
                table,
                entry,
                field,
            },
        }
    }

    pub fn u32(&mut self, at: At, field: &'static str) -> Result<u32> {
        let offset = self.position();

        self.cur
            .read_u32::<LittleEndian>()
            .map_err(|_| self.fail(at, field, offset))
    }

    pub fn i32(&mut self, at: At, field: &'static str) -> Result<i32> {
        let offset = self.position();

        self.cur
            .read_i32::<LittleEndian>()
            .map_err(|_| self.fail(at, field, offset))
    }

    /// Read a fixed-width count or offset that must not be negative.
    pub fn len_field(&mut self, at: At, field: &'static str) -> Result<u32> {
        let offset = self.position();

        match self.i32(at, field)? {
            n if n < 0 => Err(self.fail(at, field, offset)),
            n => Ok(n as u32),
        }
    }

    /// Read a compact index (see [`crate::index`]).
    ///
    /// Truncated input is reported against `field`;
    ///   a structurally invalid index is always
    ///   [`LinkError::MalformedIndex`].
    pub fn compact(&mut self, at: At, field: &'static str) -> Result<i32> {
        let offset = self.position();

        index::read_compact(&mut self.cur).map_err(|e| match e {
            CompactIndexError::Io(_) => self.fail(at, field, offset),
            CompactIndexError::Overlong | CompactIndexError::Overflow => {
                LinkError::MalformedIndex { offset }
            }
        })
    }

    /// Read a compact index that must not be negative.
    pub fn compact_len(&mut self, at: At, field: &'static str) -> Result<u32> {
        let offset = self.position();

        match self.compact(at, field)? {
            n if n < 0 => Err(self.fail(at, field, offset)),
            n => Ok(n as u32),
        }
    }

    /// Read exactly `len` bytes.
    pub fn bytes(
        &mut self,
        at: At,
        field: &'static str,
        len: usize,
    ) -> Result<&'a [u8]> {
        let offset = self.position();
        let all: &'a [u8] = *self.cur.get_ref();

        let start = offset as usize;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= all.len())
            .ok_or_else(|| self.fail(at, field, offset))?;

        self.seek(end as u64);
        Ok(&all[start..end])
    }

    /// Read bytes up to and including a NUL terminator,
    ///   producing the bytes before the terminator.
    pub fn nul_terminated(
        &mut self,
        at: At,
        field: &'static str,
    ) -> Result<&'a [u8]> {
        let offset = self.position();
        let all: &'a [u8] = *self.cur.get_ref();
        let start = offset as usize;

        let rest = all.get(start..).unwrap_or_default();
        let nul = rest
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| self.fail(at, field, offset))?;

        self.seek((start + nul + 1) as u64);
        Ok(&rest[..nul])
    }

    /// Read exactly `N` bytes into an array.
    pub fn array<const N: usize>(
        &mut self,
        at: At,
        field: &'static str,
    ) -> Result<[u8; N]> {
        let offset = self.position();
        let mut buf = [0; N];

        self.cur
            .read_exact(&mut buf)
            .map_err(|_| self.fail(at, field, offset))?;

        Ok(buf)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_failure_names_field_and_offset() {
        let bytes = [1, 0, 0, 0, 2, 0];
        let mut sut = ContainerReader::new(&bytes);

        assert_eq!(1, sut.u32(At::Header, "first").unwrap());

        assert!(matches!(
            sut.u32(At::Header, "second"),
            Err(LinkError::CorruptHeader {
                field: "second",
                offset: 4
            })
        ));
    }

    #[test]
    fn table_failure_names_table_and_entry() {
        let mut sut = ContainerReader::new(&[]);

        assert!(matches!(
            sut.compact(At::Entry(Table::Exports, 3), "name"),
            Err(LinkError::CorruptTable {
                table: Table::Exports,
                entry: 3,
                field: "name",
            })
        ));
    }

    #[test]
    fn malformed_compact_index_reports_offset() {
        let bytes = [0xFF, 0x40, 0x80, 0x80, 0x80, 0x80, 0x00];
        let mut sut = ContainerReader::new(&bytes);
        sut.seek(1);

        assert!(matches!(
            sut.compact(At::Entry(Table::Imports, 0), "owner"),
            Err(LinkError::MalformedIndex { offset: 1 })
        ));
    }

    #[test]
    fn negative_length_is_rejected() {
        let bytes = (-1i32).to_le_bytes();
        let mut sut = ContainerReader::new(&bytes);

        assert!(matches!(
            sut.len_field(At::Header, "count"),
            Err(LinkError::CorruptHeader {
                field: "count",
                offset: 0
            })
        ));
    }

    #[test]
    fn reads_nul_terminated_text() {
        let bytes = b"abc\0de\0";
        let mut sut = ContainerReader::new(bytes);

        assert_eq!(b"abc", sut.nul_terminated(At::Header, "a").unwrap());
        assert_eq!(b"de", sut.nul_terminated(At::Header, "b").unwrap());
        assert!(sut.nul_terminated(At::Header, "c").is_err());
    }

    #[test]
    fn bytes_do_not_read_past_end() {
        let bytes = [1, 2, 3];
        let mut sut = ContainerReader::new(&bytes);

        assert_eq!(&[1u8, 2][..], sut.bytes(At::Header, "x", 2).unwrap());
        assert!(sut.bytes(At::Header, "y", 2).is_err());
        assert_eq!(2, sut.position(), "failed read must not advance");
    }
}
