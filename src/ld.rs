// Package linker
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

//! Persisting object graphs to containers and linking them back together.
//!
//! A [linker][] is responsible for a single container.
//! It owns that container's [symbol table](crate::sym),
//!   [export and import tables](crate::obj),
//!   and [summary](crate::summary),
//!   and maps between the descriptors in those tables and the live objects
//!   that they describe.
//!
//! [linker]: https://en.wikipedia.org/wiki/Linker_(computing)
//!
//! Linkers are created and owned by a [`Registry`],
//!   which knows which containers are currently open and is passed
//!   explicitly to every operation that may need to open another
//!   container.
//! There is no global state.
//!
//!
//! Saving
//! ======
//! [`Registry::open_for_save`] walks the object graph reachable from a
//!   root object (see [`ObjectGraph`](crate::graph::ObjectGraph)).
//! Every object whose outermost owner is that root becomes an _export_;
//!   every other object becomes an _import_,
//!     identified by its name and the names of its owners.
//! [`Registry::flush`] then writes the container in a fixed order:
//!
//! ```text
//!   summary | symbols | exports | imports | payloads
//! ```
//!
//! Loading
//! =======
//! [`Registry::open_for_load`] reads the summary and the three tables of
//!   a container eagerly.
//! Imports are _not_ resolved at that time;
//!   doing so would load the transitive closure of every container
//!   referenced.
//! Instead,
//!   each import is resolved on demand by
//!   [`Registry::resolve_import_source`],
//!     which opens the container that defines the import
//!       (if it is not already open)
//!     and searches it for an export with a matching name and owner
//!       chain.
//! The result is cached on the import until the linker is closed.
//!
//! Containers may reference one another cyclically.
//! This is safe:
//!   opening a container never resolves its imports,
//!     and an import that is reached again while it is itself being
//!     resolved fails with [`UnresolvedReason::Cycle`].
//!
//! [`UnresolvedReason::Cycle`]: crate::error::UnresolvedReason::Cycle

mod linker;
mod load;
pub mod name;
mod registry;
mod resolve;
mod save;

pub use linker::{Linker, Mode};
pub use registry::Registry;
pub use resolve::UnresolvedImport;

use std::fmt::{self, Display};

/// Handle to a [`Linker`] owned by a [`Registry`].
///
/// Handles are never reused within a single registry,
///   so a handle to a closed linker remains invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkerId(u32);

impl LinkerId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Display for LinkerId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
