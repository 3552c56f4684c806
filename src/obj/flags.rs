// Object and container flags
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

//! Flags persisted alongside objects and containers.
//!
//! Unknown bits read from a container are retained so that they survive
//!   a load followed by a save.

use bitflags::bitflags;
use std::fmt::{self, Display};

bitflags! {
    /// Object flags.
    ///
    /// Only [`ObjectFlags::PERSISTENT`] bits are ever written to a
    ///   container;
    ///     the remainder describe the state of a live object.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ObjectFlags: u32 {
        const TRANSACTIONAL   = 0x0000_0001;
        const PUBLIC          = 0x0000_0004;
        const TAG_IMPORT      = 0x0000_0008;
        const TAG_EXPORT      = 0x0000_0010;
        const NEED_LOAD       = 0x0000_0200;
        const LOAD_FOR_CLIENT = 0x0001_0000;
        const LOAD_FOR_SERVER = 0x0002_0000;
        const LOAD_FOR_EDIT   = 0x0004_0000;
        const STANDALONE      = 0x0008_0000;
        const NOT_FOR_CLIENT  = 0x0010_0000;
        const NOT_FOR_SERVER  = 0x0020_0000;
        const NOT_FOR_EDIT    = 0x0040_0000;
        const HAS_STACK       = 0x0200_0000;
        const NATIVE          = 0x0400_0000;

        /// Flags recorded on the symbols naming an object.
        const LOAD_CONTEXT = Self::LOAD_FOR_CLIENT.bits()
            | Self::LOAD_FOR_SERVER.bits()
            | Self::LOAD_FOR_EDIT.bits();

        /// Flags that are written to a container.
        const PERSISTENT = Self::TRANSACTIONAL.bits()
            | Self::PUBLIC.bits()
            | Self::LOAD_CONTEXT.bits()
            | Self::STANDALONE.bits()
            | Self::NOT_FOR_CLIENT.bits()
            | Self::NOT_FOR_SERVER.bits()
            | Self::NOT_FOR_EDIT.bits()
            | Self::HAS_STACK.bits();
    }
}

impl ObjectFlags {
    /// The subset of these flags that may be written to a container.
    pub fn persistent(self) -> Self {
        self & Self::PERSISTENT
    }
}

bitflags! {
    /// Flags describing an entire container.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ContainerFlags: u32 {
        const ALLOW_DOWNLOAD   = 0x0001;
        const CLIENT_OPTIONAL  = 0x0002;
        const SERVER_SIDE_ONLY = 0x0004;
        const BROKEN_LINKS     = 0x0008;
        const UNSECURE         = 0x0010;
        const NEED             = 0x8000;
    }
}

impl Display for ObjectFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.bits())
    }
}

impl Display for ContainerFlags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:#010x}", self.bits())
    }
}
