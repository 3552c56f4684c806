// Container summary
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

//! Fixed-layout preamble of every container.
//!
//! The summary identifies a container,
//!   states the version of the format it was written in,
//!   and locates each of its tables:
//!
//! ```text
//!   u32       tag (see `global::CONTAINER_TAG`)
//!   u32       file version (low 16 bits) and licensee version (high 16)
//!   u32       container flags
//!   i32, i32  symbol count, offset
//!   i32, i32  export count, offset
//!   i32, i32  import count, offset
//!
//!   version >= 68:
//!     [u32; 4]  GUID
//!     u32       generation count `n`
//!     n * (u32 export count, u32 name count)
//!
//!   version < 68:
//!     i32       heritage count `n`
//!     i32       heritage offset (n GUIDs of [u32; 4])
//! ```
//!
//! Summaries are always written using the newest layout,
//!   regardless of the layout they were read from.
//! Reading and writing are each performed by a small state machine
//!   (see [`ReadState`] and [`WriteState`]);
//!     every state consumes or produces one complete group of fixed-width
//!     fields before transitioning.

mod state;

pub use state::{ReadState, WriteState};

use crate::error::Result;
use crate::global;
use crate::obj::ContainerFlags;
use crate::stream::ContainerReader;
use std::fmt::{self, Display};
use std::io::{self, Write};

/// Globally unique identity of a container lineage.
///
/// A GUID is assigned when a container is first created and is retained
///   by every subsequent save of that container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid([u32; 4]);

impl Guid {
    /// Create a new random GUID.
    pub fn new_v4() -> Self {
        let bytes = *uuid::Uuid::new_v4().as_bytes();
        let word = |i: usize| {
            u32::from_le_bytes([
                bytes[i * 4],
                bytes[i * 4 + 1],
                bytes[i * 4 + 2],
                bytes[i * 4 + 3],
            ])
        };

        Self([word(0), word(1), word(2), word(3)])
    }

    pub fn from_words(words: [u32; 4]) -> Self {
        Self(words)
    }

    pub fn words(&self) -> [u32; 4] {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0; 4]
    }
}

impl Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d] = self.0;
        write!(f, "{a:08X}-{b:08X}-{c:08X}-{d:08X}")
    }
}

/// Table sizes as of a single save.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Generation {
    pub export_count: u32,
    pub name_count: u32,
}

/// Count and offset of a single table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableInfo {
    pub count: u32,

    /// Offset from the start of the container.
    pub offset: u32,
}

/// Container summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub file_version: u16,
    pub licensee_version: u16,
    pub flags: ContainerFlags,
    pub symbols: TableInfo,
    pub exports: TableInfo,
    pub imports: TableInfo,
    pub guid: Guid,

    /// History of table sizes,
    ///   oldest first.
    ///
    /// This list is never truncated.
    pub generations: Vec<Generation>,
}

impl Default for Summary {
    fn default() -> Self {
        Self {
            file_version: global::CURRENT_VERSION,
            licensee_version: global::CURRENT_LICENSEE_VERSION,
            flags: ContainerFlags::empty(),
            symbols: Default::default(),
            exports: Default::default(),
            imports: Default::default(),
            guid: Default::default(),
            generations: Vec::new(),
        }
    }
}

impl Summary {
    /// Summary of a container that is about to be written.
    pub fn new(guid: Guid, generations: Vec<Generation>) -> Self {
        Self {
            guid,
            generations,
            ..Default::default()
        }
    }

    /// The four-byte version field as it appears on disk.
    pub fn packed_version(&self) -> u32 {
        (u32::from(self.licensee_version) << 16) | u32::from(self.file_version)
    }

    /// Number of bytes that [`Summary::write`] will produce.
    pub fn encoded_len(&self) -> usize {
        Self::encoded_len_for(self.generations.len())
    }

    /// Number of bytes occupied by a summary with `ngenerations`
    ///   generation records.
    pub fn encoded_len_for(ngenerations: usize) -> usize {
        56 + 8 * ngenerations
    }

    /// Read a summary from the start of a container.
    ///
    /// The reader is left positioned immediately after the summary.
    pub fn read(reader: &mut ContainerReader) -> Result<Self> {
        let mut state = ReadState::default();

        loop {
            state = match state {
                ReadState::Ready(summary) => return Ok(summary),
                st => st.read_next(reader)?,
            }
        }
    }

    /// Write this summary using the newest layout.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut state = WriteState::default();

        while state != WriteState::Done {
            state = state.write_next(self, writer)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test;
