// Linker errors
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

//! Errors while reading, writing, and resolving containers.
//!
//! Errors fall into two groups:
//!
//!   - _Fatal_ errors ([`LinkError::is_fatal`]) mean that the container
//!       itself cannot be trusted and the entire open must be aborted;
//!   - _Recoverable_ errors ([`LinkError::is_recoverable`]) affect only a
//!       single lookup or import,
//!         and the caller may substitute a placeholder object and
//!         continue.
//!
//! Errors contain only owned values rather than references to container
//!   data so that they may outlive the linker that produced them.

use crate::index::CompactIndexError;
use crate::ld::LinkerId;
use crate::obj::ObjectRef;
use std::fmt::{self, Display};
use std::io;

/// A [`Result`](std::result::Result) with a hard-coded [`LinkError`]
///   error type.
pub type Result<T> = std::result::Result<T, LinkError>;

/// Table section of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Symbols,
    Exports,
    Imports,
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Symbols => write!(f, "symbol table"),
            Self::Exports => write!(f, "export table"),
            Self::Imports => write!(f, "import table"),
        }
    }
}

/// Why an import could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// The named container was opened,
    ///   but it defines no export with a matching name and owner chain.
    NoMatchingExport(String),

    /// Resolution arrived back at an import that was already being
    ///   resolved.
    Cycle,
}

impl Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NoMatchingExport(container) => {
                write!(f, "no matching export in `{container}`")
            }
            Self::Cycle => write!(f, "import resolution cycle"),
        }
    }
}

/// Error while processing a container.
#[derive(Debug)]
pub enum LinkError {
    /// Propagated I/O error.
    Io(io::Error),

    /// A fixed-width summary field could not be read or holds a value
    ///   that cannot be valid.
    CorruptHeader { field: &'static str, offset: u64 },

    /// A table entry could not be read or references something that does
    ///   not exist.
    CorruptTable {
        table: Table,
        entry: usize,
        field: &'static str,
    },

    /// A compact index ran past its maximum width or overflowed.
    MalformedIndex { offset: u64 },

    /// The container's file version is outside of the supported window.
    VersionUnsupported(u16),

    /// A symbol index is not within the symbol table.
    IndexOutOfRange(usize),

    /// An object reference exceeds the length of the table it selects.
    BadReference(i32),

    /// An owner chain loops back on itself.
    OwnerCycle(ObjectRef),

    /// An import could not be located in its source container.
    UnresolvedImport {
        name: String,
        reason: UnresolvedReason,
    },

    /// The container opener has no container by this name.
    NotFound(String),

    /// The linker handle does not refer to an open linker.
    NotOpen(LinkerId),

    /// The requested operation is not available for the linker's mode
    ///   (e.g. flushing a linker opened for load).
    WrongMode(LinkerId, &'static str),
}

impl LinkError {
    /// Whether this error invalidates the entire container.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Io(_)
            | Self::CorruptHeader { .. }
            | Self::CorruptTable { .. }
            | Self::MalformedIndex { .. }
            | Self::VersionUnsupported(_) => true,

            Self::IndexOutOfRange(_)
            | Self::BadReference(_)
            | Self::OwnerCycle(_)
            | Self::UnresolvedImport { .. }
            | Self::NotFound(_)
            | Self::NotOpen(_)
            | Self::WrongMode(..) => false,
        }
    }

    /// Whether the caller may substitute a placeholder for the object
    ///   that failed to resolve and continue.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::IndexOutOfRange(_)
                | Self::BadReference(_)
                | Self::UnresolvedImport { .. }
                | Self::NotFound(_)
        )
    }
}

impl Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => Display::fmt(e, f),

            Self::CorruptHeader { field, offset } => write!(
                f,
                "corrupt container header: bad `{field}` at offset {offset}"
            ),

            Self::CorruptTable {
                table,
                entry,
                field,
            } => write!(f, "corrupt {table}: bad `{field}` in entry {entry}"),

            Self::MalformedIndex { offset } => {
                write!(f, "malformed compact index at offset {offset}")
            }

            Self::VersionUnsupported(ver) => {
                write!(f, "unsupported container version {ver}")
            }

            Self::IndexOutOfRange(index) => {
                write!(f, "symbol index {index} is out of range")
            }

            Self::BadReference(value) => {
                write!(f, "object reference {value} is out of range")
            }

            Self::OwnerCycle(oref) => {
                write!(f, "owner chain of {oref} is cyclic")
            }

            Self::UnresolvedImport { name, reason } => {
                write!(f, "unresolved import `{name}`: {reason}")
            }

            Self::NotFound(name) => write!(f, "container `{name}` not found"),

            Self::NotOpen(id) => write!(f, "linker {id} is not open"),

            Self::WrongMode(id, op) => {
                write!(f, "cannot {op} with linker {id} in its current mode")
            }
        }
    }
}

impl std::error::Error for LinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for LinkError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<CompactIndexError> for LinkError {
    /// Convert without offset context.
    ///
    /// Readers that know their position should produce
    ///   [`LinkError::MalformedIndex`] themselves.
    fn from(e: CompactIndexError) -> Self {
        match e {
            CompactIndexError::Io(e) => Self::Io(e),
            CompactIndexError::Overlong | CompactIndexError::Overflow => {
                Self::MalformedIndex { offset: 0 }
            }
        }
    }
}
