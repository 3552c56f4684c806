// Container symbol table
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

//! Interned names of a single container.
//!
//! Every name stored in a container
//!   (object names, class names, the names of the containers that define
//!   classes)
//!   is stored exactly once in the container's [`SymbolTable`] and
//!   referenced elsewhere by its [`SymbolIndex`].
//! The table is append-only:
//!   once a name has been assigned an index,
//!     that index never changes,
//!     and the position of an entry within the table _is_ its index.
//!
//! ```
//! use tamepkg::sym::{SymbolIndex, SymbolTable};
//!
//! let mut syms = SymbolTable::new();
//!
//! let a = syms.intern("Leaf");
//! let b = syms.intern("Root");
//!
//! assert_eq!(a, syms.intern("Leaf"));
//! assert_ne!(a, b);
//!
//! // Index 0 is always the sentinel.
//! assert_eq!(SymbolIndex::NONE, syms.intern("None"));
//! assert_eq!(3, syms.len());
//!
//! assert_eq!("Root", syms.resolve(b).unwrap());
//! ```
//!
//! Symbols are local to their table;
//!   an index from one container is meaningless in any other,
//!     and so symbols are never shared between linkers.
//!
//! Persisted Flags
//! ===============
//! Each symbol carries a word of [`ObjectFlags`] that is written alongside
//!   its text.
//! When an object's name is interned during a save,
//!   the [load context](ObjectFlags::LOAD_CONTEXT) of that object is
//!   merged into the flags of its name,
//!     allowing a loader to determine from the symbol table alone whether
//!     any object by that name is needed in a given context.

use crate::error::{LinkError, Result, Table};
use crate::global;
use crate::index;
use crate::obj::ObjectFlags;
use crate::stream::{At, ContainerReader};
use byteorder::{LittleEndian, WriteBytesExt};
use fxhash::FxHashMap;
use std::fmt::{self, Display};
use std::io::{self, Write};
use std::rc::Rc;

/// Index of a symbol within its [`SymbolTable`].
///
/// The default index is [`SymbolIndex::NONE`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolIndex(global::SymSize);

assert_eq_size!(SymbolIndex, global::SymSize);

impl SymbolIndex {
    /// Index of the sentinel symbol denoting "no name".
    pub const NONE: Self = Self(0);

    pub fn new(index: global::SymSize) -> Self {
        Self(index)
    }

    /// Convert an index read from a container,
    ///   which is signed on disk.
    pub fn from_raw(raw: i32) -> Result<Self> {
        global::SymSize::try_from(raw)
            .map(Self)
            .map_err(|_| LinkError::IndexOutOfRange(raw as usize))
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Value written to a container as a compact index.
    #[inline]
    pub fn as_raw(self) -> i32 {
        self.0 as i32
    }
}

impl Display for SymbolIndex {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    text: Rc<str>,
    flags: ObjectFlags,
}

/// Deduplicated, insertion-ordered table of names.
///
/// Text is reference-counted and shared between the index and the
///   entries so that each name is allocated only once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    map: FxHashMap<Rc<str>, SymbolIndex>,
    entries: Vec<Entry>,
}

impl SymbolTable {
    /// Create a new table containing only the sentinel
    ///   [`global::NONE_SYMBOL`] at [`SymbolIndex::NONE`].
    pub fn new() -> Self {
        let mut table = Self::default();
        table.intern(global::NONE_SYMBOL);
        table
    }

    /// Intern `text`,
    ///   producing its existing index or appending a new entry.
    pub fn intern(&mut self, text: &str) -> SymbolIndex {
        self.intern_flagged(text, ObjectFlags::empty())
    }

    /// Intern `text` and merge `flags` into its persisted flags.
    pub fn intern_flagged(
        &mut self,
        text: &str,
        flags: ObjectFlags,
    ) -> SymbolIndex {
        if let Some(&index) = self.map.get(text) {
            self.entries[index.as_usize()].flags |= flags;
            return index;
        }

        self.push(Rc::from(text), flags)
    }

    fn push(&mut self, text: Rc<str>, flags: ObjectFlags) -> SymbolIndex {
        let index = SymbolIndex(self.entries.len() as global::SymSize);

        // Older containers may hold duplicate names;
        //   the first occurrence is the one that lookups produce.
        self.map.entry(Rc::clone(&text)).or_insert(index);
        self.entries.push(Entry { text, flags });

        index
    }

    /// Look up the index of `text` without interning it.
    pub fn intern_soft(&self, text: &str) -> Option<SymbolIndex> {
        self.map.get(text).copied()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.map.contains_key(text)
    }

    /// Number of symbols,
    ///   including the sentinel.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of the symbol at `index`.
    pub fn resolve(&self, index: SymbolIndex) -> Result<&str> {
        self.entries
            .get(index.as_usize())
            .map(|entry| entry.text.as_ref())
            .ok_or(LinkError::IndexOutOfRange(index.as_usize()))
    }

    /// Persisted flags of the symbol at `index`.
    pub fn flags(&self, index: SymbolIndex) -> Result<ObjectFlags> {
        self.entries
            .get(index.as_usize())
            .map(|entry| entry.flags)
            .ok_or(LinkError::IndexOutOfRange(index.as_usize()))
    }

    /// Symbols in table order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolIndex, &str)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (SymbolIndex(i as global::SymSize), &*entry.text))
    }

    /// Alphabetically sorted copy of all symbol text.
    ///
    /// The table itself is never reordered,
    ///   since that would invalidate every index referencing it.
    pub fn sorted(&self) -> Vec<&str> {
        let mut names: Vec<&str> =
            self.entries.iter().map(|entry| &*entry.text).collect();

        names.sort_unstable();
        names
    }

    /// Read `count` symbols as written by a container of file version
    ///   `version`.
    pub fn read(
        reader: &mut ContainerReader,
        count: usize,
        version: u16,
    ) -> Result<Self> {
        let mut table = Self::default();

        for entry in 0..count {
            let at = At::Entry(Table::Symbols, entry);

            let raw = if version >= global::SIZED_SYMBOL_VERSION {
                Self::read_sized(reader, entry)?
            } else {
                reader.nul_terminated(at, "text")?
            };

            let text = std::str::from_utf8(raw).map_err(|_| {
                LinkError::CorruptTable {
                    table: Table::Symbols,
                    entry,
                    field: "text",
                }
            })?;

            let flags = ObjectFlags::from_bits_retain(reader.u32(at, "flags")?);

            table.push(Rc::from(text), flags);
        }

        Ok(table)
    }

    /// Length-prefixed text whose length includes a trailing NUL.
    fn read_sized<'a>(
        reader: &mut ContainerReader<'a>,
        entry: usize,
    ) -> Result<&'a [u8]> {
        let at = At::Entry(Table::Symbols, entry);
        let len = reader.compact_len(at, "length")? as usize;

        match reader.bytes(at, "text", len)?.split_last() {
            Some((0, text)) => Ok(text),
            _ => Err(LinkError::CorruptTable {
                table: Table::Symbols,
                entry,
                field: "text",
            }),
        }
    }

    /// Write every symbol in table order using the current format.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for entry in &self.entries {
            let bytes = entry.text.as_bytes();

            index::write_compact(writer, (bytes.len() + 1) as i32)?;
            writer.write_all(bytes)?;
            writer.write_u8(0)?;
            writer.write_u32::<LittleEndian>(entry.flags.bits())?;
        }

        Ok(())
    }

    /// Number of bytes that [`SymbolTable::write`] will produce.
    pub fn encoded_len(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| {
                let len = entry.text.len() + 1;
                index::encoded_len(len as i32) + len + 4
            })
            .sum()
    }
}

#[cfg(test)]
mod test;
