// Save walk and container encoding
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

//! Populating the tables of a container from a live object graph,
//!   and encoding those tables.
//!
//! The walk is breadth-first from the root in discovery order.
//! Each object is _tagged_ exactly once:
//!   if its outermost owner is the root it becomes an export and its own
//!   references are walked in turn;
//!     otherwise it becomes an import and the walk stops there.
//! Owners are always tagged before the objects that they own,
//!   so an owner reference never points forward in its table.

use super::Linker;
use crate::error::{LinkError, Result};
use crate::global;
use crate::graph::{ObjectGraph, ObjectId};
use crate::obj::{Export, ExportIndex, Import, ObjectFlags, ObjectRef};
use crate::summary::{Generation, TableInfo};
use fxhash::FxHashSet;
use log::trace;
use std::collections::VecDeque;
use std::io;

/// Walk the graph reachable from the root of `linker`,
///   populating its tables and capturing the payload of every export.
///
/// A generation record describing the resulting tables is appended to
///   the summary.
pub(super) fn walk<G: ObjectGraph>(
    linker: &mut Linker,
    graph: &G,
    root: ObjectId,
) -> Result<()> {
    let mut state = Walk {
        graph,
        linker: &mut *linker,
        root,
        queue: VecDeque::from([root]),
    };

    while let Some(obj) = state.queue.pop_front() {
        for child in graph.references(obj) {
            state.tag(child)?;
        }
    }

    let payloads = (0..linker.tables.export_count())
        .map(|i| {
            linker
                .object_at(ObjectRef::export(ExportIndex::from(i)))
                .map(|obj| graph.payload(obj, linker))
                .unwrap_or_default()
        })
        .collect();

    linker.payloads = payloads;

    linker.summary.generations.push(Generation {
        export_count: linker.tables.export_count() as u32,
        name_count: linker.symbols.len() as u32,
    });

    trace!(
        "save walk of `{}` produced {} symbol(s), {} export(s), \
         {} import(s)",
        linker.name(),
        linker.symbols.len(),
        linker.tables.export_count(),
        linker.tables.import_count(),
    );

    Ok(())
}

struct Walk<'a, G> {
    graph: &'a G,
    linker: &'a mut Linker,
    root: ObjectId,

    /// Exports whose references have yet to be walked.
    queue: VecDeque<ObjectId>,
}

impl<'a, G: ObjectGraph> Walk<'a, G> {
    /// Reference to `obj`,
    ///   adding it to the appropriate table on first sight.
    fn tag(&mut self, obj: ObjectId) -> Result<ObjectRef> {
        if obj == self.root {
            return Ok(ObjectRef::NULL);
        }

        if let Some(oref) = self.linker.object_ref(obj) {
            return Ok(oref);
        }

        if self.outermost(obj)? == self.root {
            self.tag_export(obj)
        } else {
            self.tag_import(obj)
        }
    }

    fn tag_opt(&mut self, obj: Option<ObjectId>) -> Result<ObjectRef> {
        obj.map_or(Ok(ObjectRef::NULL), |obj| self.tag(obj))
    }

    fn tag_export(&mut self, obj: ObjectId) -> Result<ObjectRef> {
        let owner = self.tag_opt(self.graph.owner(obj))?;

        // the class or super of an owner may lead back here
        if let Some(oref) = self.linker.object_ref(obj) {
            return Ok(oref);
        }

        let flags = self.graph.flags(obj);
        let name = self.linker.symbols.intern_flagged(
            self.graph.name(obj),
            flags & ObjectFlags::LOAD_CONTEXT,
        );

        let index = ExportIndex::from(self.linker.tables.export_count());
        let oref = self.linker.tables_mut().push_export(Export {
            owner,
            name,
            flags: flags.persistent(),
            ..Default::default()
        });

        self.linker.bind(oref, obj);
        self.queue.push_back(obj);

        // bound first so that a class referencing its own instances
        //   resolves to this export
        let class = self.tag_opt(self.graph.class(obj))?;
        let super_class = self.tag_opt(self.graph.super_class(obj))?;

        let export = self.linker.tables_mut().export_mut(index)?;
        export.class = class;
        export.super_class = super_class;

        Ok(oref)
    }

    fn tag_import(&mut self, obj: ObjectId) -> Result<ObjectRef> {
        let owner = self.tag_opt(self.graph.owner(obj))?;

        let (class_container, class_name) = match self.graph.class(obj) {
            None if owner.is_null() => (
                global::CORE_CONTAINER_NAME,
                global::CONTAINER_CLASS_NAME,
            ),
            None => (global::CORE_CONTAINER_NAME, global::META_CLASS_NAME),
            Some(class) => {
                let container = self.outermost(class)?;
                (self.graph.name(container), self.graph.name(class))
            }
        };

        let symbols = &mut self.linker.symbols;
        let import = Import::new(
            symbols.intern(class_container),
            symbols.intern(class_name),
            owner,
            symbols.intern(self.graph.name(obj)),
        );

        let oref = self.linker.tables_mut().push_import(import);
        self.linker.bind(oref, obj);

        Ok(oref)
    }

    /// Top of the owner chain of `obj`,
    ///   which is `obj` itself if it has no owner.
    fn outermost(&self, obj: ObjectId) -> Result<ObjectId> {
        let mut seen = FxHashSet::default();
        let mut cur = obj;

        while let Some(owner) = self.graph.owner(cur) {
            if !seen.insert(cur) {
                return Err(LinkError::OwnerCycle(ObjectRef::NULL));
            }

            cur = owner;
        }

        Ok(cur)
    }
}

/// Encode the container of a linker that has completed its save walk.
///
/// Table offsets and serial offsets are stored in variable-length
///   fields whose widths depend on their values,
///     so layout is repeated until no offset changes.
/// Offsets only ever grow between passes,
///   so this terminates.
pub(super) fn encode(linker: &mut Linker) -> Result<Vec<u8>> {
    for (i, payload) in linker.payloads.iter().enumerate() {
        let size = checked_len(payload.len())?;
        linker.tables.export_mut(ExportIndex::from(i))?.serial_size = size;
    }

    let total = loop {
        let header_len = linker.summary.encoded_len();
        let symbols_at = header_len;
        let exports_at = symbols_at + linker.symbols.encoded_len();
        let imports_at = exports_at + linker.tables.exports_encoded_len();
        let payloads_at = imports_at + linker.tables.imports_encoded_len();

        linker.summary.symbols = TableInfo {
            count: linker.symbols.len() as u32,
            offset: checked_len(symbols_at)?,
        };
        linker.summary.exports = TableInfo {
            count: linker.tables.export_count() as u32,
            offset: checked_len(exports_at)?,
        };
        linker.summary.imports = TableInfo {
            count: linker.tables.import_count() as u32,
            offset: checked_len(imports_at)?,
        };

        let mut next = payloads_at;
        let mut changed = false;

        for i in 0..linker.tables.export_count() {
            let export = linker.tables.export_mut(ExportIndex::from(i))?;

            let offset = match export.serial_size {
                0 => 0,
                size => {
                    let offset = checked_len(next)?;
                    next += size as usize;
                    offset
                }
            };

            changed |= export.serial_offset != offset;
            export.serial_offset = offset;
        }

        checked_len(next)?;

        if !changed {
            break next;
        }
    };

    let mut buf = Vec::with_capacity(total);

    linker.summary.write(&mut buf)?;
    linker.symbols.write(&mut buf)?;
    linker.tables.write_exports(&mut buf)?;
    linker.tables.write_imports(&mut buf)?;

    for payload in &linker.payloads {
        buf.extend_from_slice(payload);
    }

    debug_assert_eq!(total, buf.len());

    trace!("encoded `{}` in {} byte(s)", linker.name(), buf.len());

    Ok(buf)
}

/// Offsets and sizes are stored as non-negative signed values.
fn checked_len(len: usize) -> Result<u32> {
    i32::try_from(len).map(|len| len as u32).map_err(|_| {
        LinkError::Io(io::Error::new(
            io::ErrorKind::InvalidData,
            "container exceeds maximum size",
        ))
    })
}
