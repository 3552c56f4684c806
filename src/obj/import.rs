// Import descriptors
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

use super::{ExportIndex, ObjectRef};
use crate::error::{Result, Table};
use crate::index;
use crate::ld::LinkerId;
use crate::stream::{At, ContainerReader};
use crate::sym::SymbolIndex;
use byteorder::{LittleEndian, WriteBytesExt};
use std::io::{self, Write};

/// Where an import was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImportSource {
    /// Linker of the container defining the object.
    pub linker: LinkerId,

    /// Export defining the object,
    ///   or [`None`] if the import names the root of that container.
    pub export: Option<ExportIndex>,
}

/// Transient resolution state of an import.
///
/// This state is never written to a container;
///   every import begins [`Resolution::Unresolved`] after a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Resolution {
    #[default]
    Unresolved,

    /// Resolution of this import has begun but not yet completed.
    ///
    /// Arriving at an import in this state means that resolution has
    ///   cycled back on itself.
    InProgress,

    Resolved(ImportSource),
}

/// An object defined in some other container.
///
/// Imports identify their object by name alone:
///
/// ```text
///   C    class container name
///   C    class name
///   i32  owner
///   C    object name
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Name of the container that defines the object's class.
    pub class_container: SymbolIndex,

    pub class_name: SymbolIndex,

    /// Object containing this one,
    ///   or [`ObjectRef::NULL`] if this object is itself a container.
    pub owner: ObjectRef,

    pub name: SymbolIndex,

    resolution: Resolution,
}

impl Import {
    pub fn new(
        class_container: SymbolIndex,
        class_name: SymbolIndex,
        owner: ObjectRef,
        name: SymbolIndex,
    ) -> Self {
        Self {
            class_container,
            class_name,
            owner,
            name,
            resolution: Resolution::Unresolved,
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub(crate) fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    pub fn read(reader: &mut ContainerReader, entry: usize) -> Result<Self> {
        let at = At::Entry(Table::Imports, entry);

        let class_container = reader.compact_len(at, "class container")?;
        let class_name = reader.compact_len(at, "class name")?;
        let owner = ObjectRef::from_raw(reader.i32(at, "owner")?);
        let name = reader.compact_len(at, "name")?;

        Ok(Self::new(
            SymbolIndex::new(class_container),
            SymbolIndex::new(class_name),
            owner,
            SymbolIndex::new(name),
        ))
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        index::write_compact(writer, self.class_container.as_raw())?;
        index::write_compact(writer, self.class_name.as_raw())?;
        writer.write_i32::<LittleEndian>(self.owner.raw())?;
        index::write_compact(writer, self.name.as_raw())?;

        Ok(())
    }

    /// Number of bytes that [`Import::write`] will produce.
    pub fn encoded_len(&self) -> usize {
        index::encoded_len(self.class_container.as_raw())
            + index::encoded_len(self.class_name.as_raw())
            + 4
            + index::encoded_len(self.name.as_raw())
    }
}
