// Full-name reconstruction
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

//! Reconstruction of hierarchical names from owner chains.
//!
//! Containers never store the full name of an object;
//!   it is recovered by following owner references until the top of the
//!   container is reached.
//! The full name is the class name,
//!   a space,
//!   and each name along that chain joined by `.` with the outermost name
//!   first:
//!
//! ```text
//!   ClassName Outer.Inner.Leaf
//! ```
//!
//! Exports and imports are walked differently,
//!   and the two walks are intentionally kept separate:
//!
//!   - An _import_ chain starts at the import itself and follows owner
//!       references into _either_ table by their sign,
//!         so an import may be owned by an export of the same container.
//!       The class name is the import's own class name symbol.
//!   - An _export_ chain starts at the export itself and follows only
//!       export owners;
//!         an export owned by an import is a [`LinkError::BadReference`].
//!       The class name is the name of the object referenced by the
//!       export's class,
//!         or [`global::META_CLASS_NAME`] if that reference is null.
//!
//! Both walks fail with [`LinkError::OwnerCycle`] rather than looping if an
//!   owner chain is longer than the number of descriptors in the
//!   container.

use crate::error::{LinkError, Result};
use crate::global;
use crate::obj::{ExportIndex, ImportIndex, ObjectRef, ObjectTables, RefKind};
use crate::sym::SymbolTable;

/// Names along the owner chain of an import,
///   outermost first and ending with the import itself.
pub fn import_path<'a>(
    symbols: &'a SymbolTable,
    tables: &ObjectTables,
    index: ImportIndex,
) -> Result<Vec<&'a str>> {
    let start = ObjectRef::import(index);
    let limit = step_limit(tables);

    let mut names = Vec::new();
    let mut cur = start;

    while !cur.is_null() {
        if names.len() > limit {
            return Err(LinkError::OwnerCycle(start));
        }

        let (name, owner) = match cur.kind() {
            RefKind::Import(i) => {
                let import = tables.import(i)?;
                (import.name, import.owner)
            }
            RefKind::Export(i) => {
                let export = tables.export(i)?;
                (export.name, export.owner)
            }
            RefKind::Null => break,
        };

        names.push(symbols.resolve(name)?);
        cur = owner;
    }

    names.reverse();
    Ok(names)
}

/// Names along the owner chain of an export,
///   outermost first and ending with the export itself.
///
/// The container itself is not included.
pub fn export_path<'a>(
    symbols: &'a SymbolTable,
    tables: &ObjectTables,
    index: ExportIndex,
) -> Result<Vec<&'a str>> {
    let start = ObjectRef::export(index);
    let limit = step_limit(tables);

    let mut names = Vec::new();
    let mut cur = index;

    loop {
        if names.len() > limit {
            return Err(LinkError::OwnerCycle(start));
        }

        let export = tables.export(cur)?;
        names.push(symbols.resolve(export.name)?);

        match export.owner.kind() {
            RefKind::Null => break,
            RefKind::Export(owner) => cur = owner,
            RefKind::Import(_) => {
                return Err(LinkError::BadReference(export.owner.raw()))
            }
        }
    }

    names.reverse();
    Ok(names)
}

/// `ClassName Outer.Leaf` for an import.
pub fn import_full_name(
    symbols: &SymbolTable,
    tables: &ObjectTables,
    index: ImportIndex,
) -> Result<String> {
    let class = symbols.resolve(tables.import(index)?.class_name)?;
    let path = import_path(symbols, tables, index)?;

    Ok(join(class, &path))
}

/// `ClassName Outer.Leaf` for an export.
pub fn export_full_name(
    symbols: &SymbolTable,
    tables: &ObjectTables,
    index: ExportIndex,
) -> Result<String> {
    let class = export_class(symbols, tables, index)?;
    let path = export_path(symbols, tables, index)?;

    Ok(join(class, &path))
}

/// Name of the class of an export.
pub fn export_class<'a>(
    symbols: &'a SymbolTable,
    tables: &ObjectTables,
    index: ExportIndex,
) -> Result<&'a str> {
    match tables.export(index)?.class.kind() {
        RefKind::Null => Ok(global::META_CLASS_NAME),
        RefKind::Export(class) => symbols.resolve(tables.export(class)?.name),
        RefKind::Import(class) => symbols.resolve(tables.import(class)?.name),
    }
}

fn step_limit(tables: &ObjectTables) -> usize {
    tables.export_count() + tables.import_count()
}

fn join(class: &str, path: &[&str]) -> String {
    let sep = global::PATH_SEPARATOR.to_string();
    format!("{class} {}", path.join(&sep))
}

#[cfg(test)]
mod test;
