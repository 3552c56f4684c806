// Per-container linker
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

use super::name;
use super::LinkerId;
use crate::error::{LinkError, Result};
use crate::global;
use crate::graph::ObjectId;
use crate::obj::{
    Descriptor, ExportIndex, ImportIndex, ObjectRef, ObjectTables, RefKind,
};
use crate::summary::{Generation, Guid, Summary};
use crate::sym::SymbolTable;
use fxhash::{FxHashMap, FxHashSet};

/// Operation for which a [`Linker`] was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Load,
    Save,
}

/// The tables of a single container and the live objects that they
///   describe.
///
/// A linker is owned by its [`Registry`](super::Registry);
///   tables are never shared between linkers.
#[derive(Debug)]
pub struct Linker {
    id: LinkerId,
    name: String,
    mode: Mode,

    pub(super) summary: Summary,
    pub(super) symbols: SymbolTable,
    pub(super) tables: ObjectTables,

    /// Entire container as read,
    ///   retained for access to export payloads.
    bytes: Vec<u8>,

    /// Payloads of each export of a container being saved.
    pub(super) payloads: Vec<Vec<u8>>,

    root: Option<ObjectId>,
    by_object: FxHashMap<ObjectId, ObjectRef>,
    by_ref: FxHashMap<ObjectRef, ObjectId>,

    /// Imports that have already been reported as unresolved.
    pub(super) reported: FxHashSet<ImportIndex>,
}

impl Linker {
    fn new(id: LinkerId, name: &str, mode: Mode, summary: Summary) -> Self {
        Self {
            id,
            name: name.to_string(),
            mode,
            summary,
            symbols: SymbolTable::new(),
            tables: ObjectTables::new(),
            bytes: Vec::new(),
            payloads: Vec::new(),
            root: None,
            by_object: Default::default(),
            by_ref: Default::default(),
            reported: Default::default(),
        }
    }

    pub(super) fn for_load(
        id: LinkerId,
        name: &str,
        summary: Summary,
        symbols: SymbolTable,
        tables: ObjectTables,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            symbols,
            tables,
            bytes,
            ..Self::new(id, name, Mode::Load, summary)
        }
    }

    pub(super) fn for_save(
        id: LinkerId,
        name: &str,
        root: ObjectId,
        summary: Summary,
    ) -> Self {
        let mut linker = Self::new(id, name, Mode::Save, summary);
        linker.set_root(root);
        linker
    }

    pub fn id(&self) -> LinkerId {
        self.id
    }

    /// Name of the container,
    ///   which is also the name of its root object.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn guid(&self) -> Guid {
        self.summary.guid
    }

    pub fn generations(&self) -> &[Generation] {
        &self.summary.generations
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn tables(&self) -> &ObjectTables {
        &self.tables
    }

    pub(super) fn tables_mut(&mut self) -> &mut ObjectTables {
        &mut self.tables
    }

    /// Live root object of the container,
    ///   if one has been bound.
    pub fn root(&self) -> Option<ObjectId> {
        self.root
    }

    pub(super) fn set_root(&mut self, root: ObjectId) {
        self.root = Some(root);
        self.by_object.insert(root, ObjectRef::NULL);
    }

    /// Associate a live object with a descriptor.
    pub(super) fn bind(&mut self, oref: ObjectRef, obj: ObjectId) {
        self.by_object.insert(obj, oref);
        self.by_ref.insert(oref, obj);
    }

    /// Reference under which `obj` is stored in this container.
    ///
    /// The root object maps to [`ObjectRef::NULL`].
    pub fn object_ref(&self, obj: ObjectId) -> Option<ObjectRef> {
        self.by_object.get(&obj).copied()
    }

    /// Live object bound to `oref`,
    ///   if any.
    pub fn object_at(&self, oref: ObjectRef) -> Option<ObjectId> {
        match oref {
            ObjectRef::NULL => self.root,
            _ => self.by_ref.get(&oref).copied(),
        }
    }

    /// Serialized payload of an export.
    ///
    /// Exports without a payload produce an empty slice.
    pub fn payload(&self, index: ExportIndex) -> Result<&[u8]> {
        let export = self.tables.export(index)?;

        match self.mode {
            Mode::Save => Ok(self
                .payloads
                .get(index.as_usize())
                .map(Vec::as_slice)
                .unwrap_or_default()),

            Mode::Load => Ok(export
                .payload_range()
                .and_then(|range| self.bytes.get(range))
                .unwrap_or_default()),
        }
    }

    /// Name of the object referenced by `oref`.
    ///
    /// [`ObjectRef::NULL`] names the container itself.
    pub fn object_name(&self, oref: ObjectRef) -> Result<&str> {
        match self.tables.get(oref)? {
            Descriptor::Null => Ok(&self.name),
            Descriptor::Export(export) => self.symbols.resolve(export.name),
            Descriptor::Import(import) => self.symbols.resolve(import.name),
        }
    }

    /// Full name of the object referenced by `oref` in the form
    ///   `ClassName Outer.Inner.Name`.
    ///
    /// See [`name`] for the distinction between exports and imports.
    pub fn full_name(&self, oref: ObjectRef) -> Result<String> {
        match oref.kind() {
            RefKind::Null => {
                Ok(format!("{} {}", global::CONTAINER_CLASS_NAME, self.name))
            }
            RefKind::Export(index) => self.export_full_name(index),
            RefKind::Import(index) => self.import_full_name(index),
        }
    }

    pub fn export_full_name(&self, index: ExportIndex) -> Result<String> {
        name::export_full_name(&self.symbols, &self.tables, index)
    }

    pub fn import_full_name(&self, index: ImportIndex) -> Result<String> {
        name::import_full_name(&self.symbols, &self.tables, index)
    }

    pub fn export_path(&self, index: ExportIndex) -> Result<Vec<&str>> {
        name::export_path(&self.symbols, &self.tables, index)
    }

    pub fn import_path(&self, index: ImportIndex) -> Result<Vec<&str>> {
        name::import_path(&self.symbols, &self.tables, index)
    }

    /// Container and name of the class of an export.
    pub fn export_class(&self, index: ExportIndex) -> Result<(&str, &str)> {
        let export = self.tables.export(index)?;

        match export.class.kind() {
            RefKind::Null => {
                Ok((global::CORE_CONTAINER_NAME, global::META_CLASS_NAME))
            }
            RefKind::Export(class) => Ok((
                &self.name,
                self.symbols.resolve(self.tables.export(class)?.name)?,
            )),
            RefKind::Import(class) => {
                let path = self.import_path(class)?;
                let container = path
                    .first()
                    .copied()
                    .ok_or(LinkError::BadReference(export.class.raw()))?;

                Ok((
                    container,
                    self.symbols.resolve(self.tables.import(class)?.name)?,
                ))
            }
        }
    }

    /// Find the export whose owner chain names are `path`,
    ///   outermost first,
    ///   not including the container itself.
    pub fn find_export<S: AsRef<str>>(
        &self,
        path: &[S],
    ) -> Result<Option<ExportIndex>> {
        let leaf = match path.last() {
            Some(leaf) => leaf.as_ref(),
            None => return Ok(None),
        };

        for (index, export) in self.tables.exports() {
            if self.symbols.resolve(export.name)? != leaf {
                continue;
            }

            let candidate = self.export_path(index)?;

            let matches = candidate.len() == path.len()
                && candidate
                    .iter()
                    .zip(path)
                    .all(|(given, want)| *given == want.as_ref());

            if matches {
                return Ok(Some(index));
            }
        }

        Ok(None)
    }
}
