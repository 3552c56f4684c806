// Signed object references
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

//! References between descriptors.
//!
//! Tables are indexed from `0` internally,
//!   but every reference stored in a container uses a _signed 1-based_
//!   convention:
//!
//! | Raw value `v` | Refers to               |
//! | ------------- | ----------------------- |
//! | `v > 0`       | export `v - 1`          |
//! | `v < 0`       | import `-v - 1`         |
//! | `v == 0`      | no object (or the root) |
//!
//! This convention is baked into every container ever written.
//! [`ObjectRef`] holds the raw value and [`ObjectRef::kind`] performs the
//!   dispatch;
//!     the raw value is never interpreted anywhere else.
//!
//! ```
//! use tamepkg::obj::{ExportIndex, ImportIndex, ObjectRef, RefKind};
//!
//! let first_export = ExportIndex::new(0);
//! let first_import = ImportIndex::new(0);
//!
//! assert_eq!(RefKind::Export(first_export), ObjectRef::from_raw(1).kind());
//! assert_eq!(RefKind::Import(first_import), ObjectRef::from_raw(-1).kind());
//! assert_eq!(RefKind::Null, ObjectRef::from_raw(0).kind());
//! ```

use crate::global;
use std::fmt::{self, Display};

/// Index into the export table of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ExportIndex(global::ObjIndexSize);

/// Index into the import table of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ImportIndex(global::ObjIndexSize);

macro_rules! table_index {
    ($ty:ident, $label:literal) => {
        impl $ty {
            pub const fn new(index: global::ObjIndexSize) -> Self {
                Self(index)
            }

            #[inline]
            pub fn as_usize(self) -> usize {
                self.0 as usize
            }
        }

        impl From<usize> for $ty {
            fn from(index: usize) -> Self {
                Self(index as global::ObjIndexSize)
            }
        }

        impl Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}[{}]", $label, self.0)
            }
        }
    };
}

table_index!(ExportIndex, "export");
table_index!(ImportIndex, "import");

/// Signed reference to an export,
///   an import,
///   or nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectRef(i32);

assert_eq_size!(ObjectRef, i32);

/// Table selected by an [`ObjectRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefKind {
    /// No object.
    ///
    /// As a class this denotes the root meta-class;
    ///   as an owner it denotes the top level of the container.
    Null,
    Export(ExportIndex),
    Import(ImportIndex),
}

impl ObjectRef {
    pub const NULL: Self = Self(0);

    /// Interpret a raw value read from a container.
    pub fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Raw value to be written to a container.
    #[inline]
    pub fn raw(self) -> i32 {
        self.0
    }

    pub fn export(index: ExportIndex) -> Self {
        Self(index.0 as i32 + 1)
    }

    pub fn import(index: ImportIndex) -> Self {
        Self(-(index.0 as i32) - 1)
    }

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    pub fn kind(self) -> RefKind {
        match self.0 {
            0 => RefKind::Null,
            v if v > 0 => RefKind::Export(ExportIndex((v - 1) as u32)),
            // !v == -v - 1 without overflowing at `i32::MIN`.
            v => RefKind::Import(ImportIndex(!v as u32)),
        }
    }
}

impl From<ExportIndex> for ObjectRef {
    fn from(index: ExportIndex) -> Self {
        Self::export(index)
    }
}

impl From<ImportIndex> for ObjectRef {
    fn from(index: ImportIndex) -> Self {
        Self::import(index)
    }
}

impl Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind() {
            RefKind::Null => write!(f, "null"),
            RefKind::Export(index) => Display::fmt(&index, f),
            RefKind::Import(index) => Display::fmt(&index, f),
        }
    }
}
