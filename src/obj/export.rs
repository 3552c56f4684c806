// Export descriptors
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

use super::{ObjectFlags, ObjectRef};
use crate::error::{Result, Table};
use crate::index;
use crate::stream::{At, ContainerReader};
use crate::sym::SymbolIndex;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};
use std::ops::Range;

/// An object defined within this container.
///
/// On disk,
///   an export is laid out as follows
///     (`C` denotes a compact index):
///
/// ```text
///   C    class
///   C    super
///   i32  owner
///   C    name
///   u32  flags
///   C    serial size
///   C    serial offset  (only when serial size is non-zero)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Export {
    /// Class of the object;
    ///   [`ObjectRef::NULL`] denotes the root meta-class.
    pub class: ObjectRef,

    /// Parent class when this object is itself a class.
    pub super_class: ObjectRef,

    /// Export containing this object;
    ///   [`ObjectRef::NULL`] for objects directly within the container.
    pub owner: ObjectRef,

    pub name: SymbolIndex,

    /// Persisted object flags.
    pub flags: ObjectFlags,

    pub serial_size: u32,

    /// Offset of the serialized payload from the start of the container.
    ///
    /// Meaningless unless [`Export::serial_size`] is non-zero.
    pub serial_offset: u32,
}

impl Export {
    /// Byte range of the serialized payload within the container,
    ///   if any.
    pub fn payload_range(&self) -> Option<Range<usize>> {
        match self.serial_size {
            0 => None,
            size => {
                let start = self.serial_offset as usize;
                Some(start..start + size as usize)
            }
        }
    }

    pub fn read(reader: &mut ContainerReader, entry: usize) -> Result<Self> {
        let at = At::Entry(Table::Exports, entry);

        let class = ObjectRef::from_raw(reader.compact(at, "class")?);
        let super_class = ObjectRef::from_raw(reader.compact(at, "super")?);
        let owner = ObjectRef::from_raw(reader.i32(at, "owner")?);
        let name = reader.compact_len(at, "name")?;
        let flags = ObjectFlags::from_bits_retain(reader.u32(at, "flags")?);
        let serial_size = reader.compact_len(at, "serial size")?;

        let serial_offset = match serial_size {
            0 => 0,
            _ => reader.compact_len(at, "serial offset")?,
        };

        Ok(Self {
            class,
            super_class,
            owner,
            name: SymbolIndex::new(name),
            flags,
            serial_size,
            serial_offset,
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        index::write_compact(writer, self.class.raw())?;
        index::write_compact(writer, self.super_class.raw())?;
        writer.write_i32::<LittleEndian>(self.owner.raw())?;
        index::write_compact(writer, self.name.as_raw())?;
        writer.write_u32::<LittleEndian>(self.flags.persistent().bits())?;
        index::write_compact(writer, self.serial_size as i32)?;

        if self.serial_size != 0 {
            index::write_compact(writer, self.serial_offset as i32)?;
        }

        Ok(())
    }

    /// Number of bytes that [`Export::write`] will produce.
    pub fn encoded_len(&self) -> usize {
        let offset_len = match self.serial_size {
            0 => 0,
            _ => index::encoded_len(self.serial_offset as i32),
        };

        index::encoded_len(self.class.raw())
            + index::encoded_len(self.super_class.raw())
            + 4
            + index::encoded_len(self.name.as_raw())
            + 4
            + index::encoded_len(self.serial_size as i32)
            + offset_len
    }
}
