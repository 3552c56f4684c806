// Container object descriptors
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

//! Descriptors of the objects within a container.
//!
//! A container describes two kinds of objects:
//!
//!   - _[Exports](Export)_ are objects defined within the container,
//!       along with the location of their serialized payload;
//!         and
//!   - _[Imports](Import)_ are objects defined in some other container
//!       that are referenced by objects of this one,
//!         identified only by name.
//!
//! Descriptors reference one another through [`ObjectRef`],
//!   a signed index that selects either table by its sign.
//! This is the only way that objects are ever related to one another
//!   within a container;
//!     no in-memory handle is ever stored in a descriptor.
//!
//! The [linker](crate::ld) owns the [`ObjectTables`] of each container
//!   and is responsible for mapping between descriptors and live objects.

mod export;
mod flags;
mod import;
mod reference;
mod table;

pub use export::Export;
pub use flags::{ContainerFlags, ObjectFlags};
pub use import::{Import, ImportSource, Resolution};
pub use reference::{ExportIndex, ImportIndex, ObjectRef, RefKind};
pub use table::{Descriptor, ObjectTables};
