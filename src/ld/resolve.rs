// Lazy import resolution
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

//! Resolution of imports against the exports of other containers.
//!
//! An import is resolved by
//!   (1) resolving its import owner,
//!   (2) opening the container named by the outermost object of its owner
//!     chain,
//!   and (3) searching that container for an export whose name and owner
//!     chain match the remainder of the import's chain.
//!
//! The result is cached on the import as a [`Resolution`].
//! While resolution is underway the import is marked
//!   [`Resolution::InProgress`] so that arriving at it again fails rather
//!   than recursing forever.
//! A failed resolution always restores [`Resolution::Unresolved`],
//!   so that retrying produces the same failure.

use super::{LinkerId, Registry};
use crate::diagnose::{Diagnostics, Level};
use crate::error::{LinkError, Result, UnresolvedReason};
use crate::global;
use crate::graph::{ExportRequest, ObjectFactory, ObjectId};
use crate::obj::{
    ExportIndex, ImportIndex, ImportSource, ObjectRef, RefKind, Resolution,
};
use crate::store::ContainerStore;
use log::trace;
use std::fmt::{self, Display};

/// An import that could not be resolved.
#[derive(Debug)]
pub struct UnresolvedImport {
    pub index: ImportIndex,

    /// Full name of the import,
    ///   or its index if even that could not be determined.
    pub full_name: String,

    pub error: LinkError,
}

impl Display for UnresolvedImport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error {
            LinkError::UnresolvedImport { .. } => Display::fmt(&self.error, f),
            error => {
                write!(f, "unresolved import `{}`: {error}", self.full_name)
            }
        }
    }
}

impl<S: ContainerStore, D: Diagnostics> Registry<S, D> {
    /// Locate the container and export defining import `index` of linker
    ///   `id`,
    ///     opening that container if necessary.
    ///
    /// The result is cached;
    ///   a resolved import is never searched for again until its source
    ///   linker is closed.
    pub fn resolve_import_source(
        &mut self,
        id: LinkerId,
        index: ImportIndex,
    ) -> Result<ImportSource> {
        let linker = self.linker(id)?;

        match linker.tables().import(index)?.resolution() {
            Resolution::Resolved(source) => return Ok(source),
            Resolution::InProgress => {
                return Err(LinkError::UnresolvedImport {
                    name: display_name(linker.import_full_name(index), index),
                    reason: UnresolvedReason::Cycle,
                })
            }
            Resolution::Unresolved => (),
        }

        self.set_resolution(id, index, Resolution::InProgress)?;

        match self.locate_import(id, index) {
            Ok(source) => {
                self.set_resolution(id, index, Resolution::Resolved(source))?;
                Ok(source)
            }
            Err(e) => {
                self.set_resolution(id, index, Resolution::Unresolved)?;
                Err(e)
            }
        }
    }

    fn set_resolution(
        &mut self,
        id: LinkerId,
        index: ImportIndex,
        resolution: Resolution,
    ) -> Result<()> {
        self.linker_mut(id)?
            .tables_mut()
            .import_mut(index)?
            .set_resolution(resolution);

        Ok(())
    }

    fn locate_import(
        &mut self,
        id: LinkerId,
        index: ImportIndex,
    ) -> Result<ImportSource> {
        let linker = self.linker(id)?;
        let import = linker.tables().import(index)?;

        let owner = import.owner;
        let full_name = linker.import_full_name(index)?;
        let class_name = linker.symbols().resolve(import.class_name)?;
        let class_name = class_name.to_string();

        let path: Vec<String> = linker
            .import_path(index)?
            .into_iter()
            .map(String::from)
            .collect();

        if let RefKind::Import(owner) = owner.kind() {
            self.resolve_import_source(id, owner)?;
        }

        let (container, inner) = path
            .split_first()
            .ok_or(LinkError::BadReference(ObjectRef::import(index).raw()))?;

        let source = self.open_for_load(container)?;

        if inner.is_empty() {
            return Ok(ImportSource {
                linker: source,
                export: None,
            });
        }

        let source_linker = self.linker(source)?;

        let export = source_linker.find_export(inner)?.ok_or_else(|| {
            LinkError::UnresolvedImport {
                name: full_name.clone(),
                reason: UnresolvedReason::NoMatchingExport(
                    source_linker.name().to_string(),
                ),
            }
        })?;

        let (_, found_class) = source_linker.export_class(export)?;

        if found_class != class_name {
            let message = format!(
                "import `{full_name}` resolved to {export} of `{}` \
                 with non-matching class `{found_class}`",
                source_linker.name(),
            );

            self.diagnostics.warn(message);
        }

        trace!("resolved `{full_name}` to {export} of linker {source}");

        Ok(ImportSource {
            linker: source,
            export: Some(export),
        })
    }

    /// Resolve import `index` of linker `id` and materialize the object
    ///   that it names using `factory`.
    ///
    /// Objects are materialized at most once per linker;
    ///   owners are materialized before the objects that they own.
    /// Unresolved imports are reported to the diagnostics sink once.
    pub fn resolve_import<F: ObjectFactory>(
        &mut self,
        id: LinkerId,
        index: ImportIndex,
        factory: &mut F,
    ) -> Result<ObjectId> {
        let oref = ObjectRef::import(index);

        if let Some(obj) = self.linker(id)?.object_at(oref) {
            return Ok(obj);
        }

        let source = match self.resolve_import_source(id, index) {
            Ok(source) => source,
            Err(e) => {
                if e.is_recoverable() {
                    self.report_unresolved(id, index, &e)?;
                }

                return Err(e);
            }
        };

        let obj = match source.export {
            None => self.materialize_root(source.linker, factory)?,
            Some(export) => {
                self.materialize_export(source.linker, export, factory)?
            }
        };

        self.linker_mut(id)?.bind(oref, obj);

        Ok(obj)
    }

    fn materialize_root<F: ObjectFactory>(
        &mut self,
        id: LinkerId,
        factory: &mut F,
    ) -> Result<ObjectId> {
        let linker = self.linker_mut(id)?;

        Ok(match linker.root() {
            Some(root) => root,
            None => {
                let root = factory.create_root(linker.name());
                linker.set_root(root);
                root
            }
        })
    }

    fn materialize_export<F: ObjectFactory>(
        &mut self,
        id: LinkerId,
        export: ExportIndex,
        factory: &mut F,
    ) -> Result<ObjectId> {
        let oref = ObjectRef::export(export);
        let linker = self.linker(id)?;

        if let Some(obj) = linker.object_at(oref) {
            return Ok(obj);
        }

        // also rejects cyclic owner chains before recursing
        linker.export_path(export)?;

        let owner = linker.tables().export(export)?.owner;
        let outer = match owner.kind() {
            RefKind::Null => self.materialize_root(id, factory)?,
            RefKind::Export(owner) => {
                self.materialize_export(id, owner, factory)?
            }
            RefKind::Import(_) => {
                return Err(LinkError::BadReference(owner.raw()))
            }
        };

        let linker = self.linker(id)?;
        let desc = linker.tables().export(export)?;
        let sep = global::PATH_SEPARATOR.to_string();
        let path = linker.export_path(export)?.join(&sep);
        let (class_container, class_name) = linker.export_class(export)?;

        let obj = factory.create_export(ExportRequest {
            container: linker.name(),
            export,
            path: &path,
            name: linker.symbols().resolve(desc.name)?,
            class_container,
            class_name,
            outer,
            flags: desc.flags,
            payload: linker.payload(export)?,
        });

        self.linker_mut(id)?.bind(oref, obj);

        Ok(obj)
    }

    /// Attempt to resolve every import of linker `id`,
    ///   producing those that failed.
    ///
    /// Each failure is reported to the diagnostics sink the first time
    ///   that it is seen.
    pub fn verify_imports(
        &mut self,
        id: LinkerId,
    ) -> Result<Vec<UnresolvedImport>> {
        let count = self.linker(id)?.tables().import_count();
        let mut unresolved = Vec::new();

        for index in (0..count).map(ImportIndex::from) {
            if let Err(error) = self.resolve_import_source(id, index) {
                self.report_unresolved(id, index, &error)?;

                let full_name = self.linker(id)?.import_full_name(index);

                unresolved.push(UnresolvedImport {
                    index,
                    full_name: display_name(full_name, index),
                    error,
                });
            }
        }

        Ok(unresolved)
    }

    fn report_unresolved(
        &mut self,
        id: LinkerId,
        index: ImportIndex,
        error: &LinkError,
    ) -> Result<()> {
        let linker = self.linker_mut(id)?;

        if !linker.reported.insert(index) {
            return Ok(());
        }

        let full_name = display_name(linker.import_full_name(index), index);
        let message = match error {
            LinkError::UnresolvedImport { .. } => error.to_string(),
            _ => format!("unresolved import `{full_name}`: {error}"),
        };

        self.diagnostics.report(Level::Warning, message);

        Ok(())
    }
}

fn display_name(full_name: Result<String>, index: ImportIndex) -> String {
    full_name.unwrap_or_else(|_| index.to_string())
}
