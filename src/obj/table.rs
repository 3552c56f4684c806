// Export and import tables
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

use super::{Export, ExportIndex, Import, ImportIndex, ObjectRef, RefKind};
use crate::error::{LinkError, Result, Table};
use crate::stream::ContainerReader;
use crate::sym::SymbolIndex;
use std::io::{self, Write};

/// Descriptor selected by an [`ObjectRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor<'a> {
    Null,
    Export(&'a Export),
    Import(&'a Import),
}

/// The export and import tables of a single container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectTables {
    exports: Vec<Export>,
    imports: Vec<Import>,
}

impl ObjectTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the descriptor referenced by `oref`,
    ///   dispatching on its sign.
    pub fn get(&self, oref: ObjectRef) -> Result<Descriptor> {
        match oref.kind() {
            RefKind::Null => Ok(Descriptor::Null),
            RefKind::Export(index) => self
                .exports
                .get(index.as_usize())
                .map(Descriptor::Export)
                .ok_or(LinkError::BadReference(oref.raw())),
            RefKind::Import(index) => self
                .imports
                .get(index.as_usize())
                .map(Descriptor::Import)
                .ok_or(LinkError::BadReference(oref.raw())),
        }
    }

    pub fn export(&self, index: ExportIndex) -> Result<&Export> {
        self.exports
            .get(index.as_usize())
            .ok_or(LinkError::BadReference(ObjectRef::export(index).raw()))
    }

    pub fn import(&self, index: ImportIndex) -> Result<&Import> {
        self.imports
            .get(index.as_usize())
            .ok_or(LinkError::BadReference(ObjectRef::import(index).raw()))
    }

    pub(crate) fn import_mut(
        &mut self,
        index: ImportIndex,
    ) -> Result<&mut Import> {
        self.imports
            .get_mut(index.as_usize())
            .ok_or(LinkError::BadReference(ObjectRef::import(index).raw()))
    }

    pub(crate) fn export_mut(
        &mut self,
        index: ExportIndex,
    ) -> Result<&mut Export> {
        self.exports
            .get_mut(index.as_usize())
            .ok_or(LinkError::BadReference(ObjectRef::export(index).raw()))
    }

    /// Append an export,
    ///   producing a reference to it.
    pub fn push_export(&mut self, export: Export) -> ObjectRef {
        self.exports.push(export);
        ObjectRef::export(ExportIndex::from(self.exports.len() - 1))
    }

    /// Append an import,
    ///   producing a reference to it.
    pub fn push_import(&mut self, import: Import) -> ObjectRef {
        self.imports.push(import);
        ObjectRef::import(ImportIndex::from(self.imports.len() - 1))
    }

    pub fn exports(&self) -> impl Iterator<Item = (ExportIndex, &Export)> {
        self.exports
            .iter()
            .enumerate()
            .map(|(i, export)| (ExportIndex::from(i), export))
    }

    pub fn imports(&self) -> impl Iterator<Item = (ImportIndex, &Import)> {
        self.imports
            .iter()
            .enumerate()
            .map(|(i, import)| (ImportIndex::from(i), import))
    }

    pub fn export_count(&self) -> usize {
        self.exports.len()
    }

    pub fn import_count(&self) -> usize {
        self.imports.len()
    }

    /// Read `count` exports.
    pub fn read_exports(
        &mut self,
        reader: &mut ContainerReader,
        count: usize,
    ) -> Result<()> {
        for entry in 0..count {
            self.exports.push(Export::read(reader, entry)?);
        }

        Ok(())
    }

    /// Read `count` imports.
    pub fn read_imports(
        &mut self,
        reader: &mut ContainerReader,
        count: usize,
    ) -> Result<()> {
        for entry in 0..count {
            self.imports.push(Import::read(reader, entry)?);
        }

        Ok(())
    }

    pub fn write_exports<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.exports.iter().try_for_each(|export| export.write(writer))
    }

    pub fn write_imports<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        self.imports.iter().try_for_each(|import| import.write(writer))
    }

    /// Number of bytes that [`ObjectTables::write_exports`] will produce.
    pub fn exports_encoded_len(&self) -> usize {
        self.exports.iter().map(Export::encoded_len).sum()
    }

    /// Number of bytes that [`ObjectTables::write_imports`] will produce.
    pub fn imports_encoded_len(&self) -> usize {
        self.imports.iter().map(Import::encoded_len).sum()
    }

    /// Verify that every symbol index and object reference held by a
    ///   descriptor lies within its table,
    ///     and that every payload lies within a container of
    ///     `container_len` bytes.
    ///
    /// This is performed once after a load so that later lookups need
    ///   not consider a corrupt container.
    pub fn validate(
        &self,
        sym_count: usize,
        container_len: usize,
    ) -> Result<()> {
        let corrupt = |table, entry, field| LinkError::CorruptTable {
            table,
            entry,
            field,
        };

        let sym_ok = |sym: SymbolIndex| sym.as_usize() < sym_count;
        let ref_ok = |oref: ObjectRef| self.get(oref).is_ok();

        for (entry, export) in self.exports.iter().enumerate() {
            let fail = |field| corrupt(Table::Exports, entry, field);

            if !ref_ok(export.class) {
                return Err(fail("class"));
            }
            if !ref_ok(export.super_class) {
                return Err(fail("super"));
            }

            let owner_is_export =
                !matches!(export.owner.kind(), RefKind::Import(_));

            if !owner_is_export || !ref_ok(export.owner) {
                return Err(fail("owner"));
            }
            if !sym_ok(export.name) {
                return Err(fail("name"));
            }

            let payload_ok = export
                .payload_range()
                .map_or(true, |range| range.end <= container_len);

            if !payload_ok {
                return Err(fail("serial offset"));
            }
        }

        for (entry, import) in self.imports.iter().enumerate() {
            let fail = |field| corrupt(Table::Imports, entry, field);

            if !sym_ok(import.class_container) {
                return Err(fail("class container"));
            }
            if !sym_ok(import.class_name) {
                return Err(fail("class name"));
            }
            if !ref_ok(import.owner) {
                return Err(fail("owner"));
            }
            if !sym_ok(import.name) {
                return Err(fail("name"));
            }
        }

        Ok(())
    }

    /// Clear the transient resolution state of every import.
    pub fn reset_resolutions(&mut self) {
        self.imports
            .iter_mut()
            .for_each(|import| import.set_resolution(Default::default()));
    }
}
