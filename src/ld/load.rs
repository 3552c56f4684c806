// Container decoding
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

use super::{Linker, LinkerId};
use crate::error::Result;
use crate::obj::ObjectTables;
use crate::stream::ContainerReader;
use crate::summary::Summary;
use crate::sym::SymbolTable;
use log::trace;

/// Decode the summary and tables of a container.
///
/// Every symbol index and object reference is validated before the
///   linker is produced,
///     and every import begins unresolved.
pub(super) fn decode(
    id: LinkerId,
    name: &str,
    bytes: Vec<u8>,
) -> Result<Linker> {
    let (summary, symbols, mut tables) = {
        let mut reader = ContainerReader::new(&bytes);
        let summary = Summary::read(&mut reader)?;

        reader.seek(summary.symbols.offset.into());
        let symbols = SymbolTable::read(
            &mut reader,
            summary.symbols.count as usize,
            summary.file_version,
        )?;

        let mut tables = ObjectTables::new();

        reader.seek(summary.exports.offset.into());
        tables.read_exports(&mut reader, summary.exports.count as usize)?;

        reader.seek(summary.imports.offset.into());
        tables.read_imports(&mut reader, summary.imports.count as usize)?;

        (summary, symbols, tables)
    };

    tables.validate(symbols.len(), bytes.len())?;
    tables.reset_resolutions();

    trace!(
        "decoded `{name}` version {}: {} symbol(s), {} export(s), \
         {} import(s), {} generation(s)",
        summary.file_version,
        symbols.len(),
        tables.export_count(),
        tables.import_count(),
        summary.generations.len(),
    );

    Ok(Linker::for_load(id, name, summary, symbols, tables, bytes))
}
