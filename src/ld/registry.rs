// Registry of open linkers
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

use super::{load, save, Linker, LinkerId, Mode};
use crate::diagnose::{Diagnostics, LogDiagnostics};
use crate::error::{LinkError, Result};
use crate::graph::{ObjectGraph, ObjectId};
use crate::obj::{ImportIndex, ObjectRef, Resolution};
use crate::store::ContainerStore;
use crate::summary::{Guid, Summary};
use fxhash::FxHashMap;
use log::debug;

/// Every linker that is currently open,
///   along with the collaborators that they need.
///
/// A registry begins empty and owns each linker that it opens;
///   dropping the registry closes all of them.
/// Linkers opened for load are known by the name of their container,
///   compared case-insensitively,
///   so that opening the same container twice produces the same linker.
/// Linkers opened for save are never found by name.
#[derive(Debug)]
pub struct Registry<S: ContainerStore, D: Diagnostics = LogDiagnostics> {
    pub(super) store: S,
    pub(super) diagnostics: D,
    pub(super) linkers: Vec<Option<Linker>>,
    by_name: FxHashMap<String, LinkerId>,
}

impl<S: ContainerStore> Registry<S> {
    /// Create an empty registry reporting diagnostics through the
    ///   [`log`] facade.
    pub fn new(store: S) -> Self {
        Self::with_diagnostics(store, LogDiagnostics)
    }
}

impl<S: ContainerStore, D: Diagnostics> Registry<S, D> {
    pub fn with_diagnostics(store: S, diagnostics: D) -> Self {
        Self {
            store,
            diagnostics,
            linkers: Vec::new(),
            by_name: Default::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn diagnostics(&self) -> &D {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut D {
        &mut self.diagnostics
    }

    /// Linker of the container named `name` opened for load,
    ///   if any.
    pub fn find(&self, name: &str) -> Option<LinkerId> {
        self.by_name.get(&name.to_lowercase()).copied()
    }

    pub fn linker(&self, id: LinkerId) -> Result<&Linker> {
        self.linkers
            .get(id.as_usize())
            .and_then(Option::as_ref)
            .ok_or(LinkError::NotOpen(id))
    }

    pub(super) fn linker_mut(&mut self, id: LinkerId) -> Result<&mut Linker> {
        self.linkers
            .get_mut(id.as_usize())
            .and_then(Option::as_mut)
            .ok_or(LinkError::NotOpen(id))
    }

    /// Whether `id` refers to an open linker.
    pub fn is_open(&self, id: LinkerId) -> bool {
        self.linker(id).is_ok()
    }

    /// Number of open linkers.
    pub fn len(&self) -> usize {
        self.linkers.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handles of every open linker in the order in which they were
    ///   opened.
    pub fn ids(&self) -> impl Iterator<Item = LinkerId> + '_ {
        self.linkers
            .iter()
            .flatten()
            .map(|linker| linker.id())
    }

    fn next_id(&self) -> LinkerId {
        LinkerId::new(self.linkers.len() as u32)
    }

    /// Open the container named `name` for load,
    ///   or produce the linker that already has it open.
    ///
    /// The summary and tables are read eagerly;
    ///   imports are left unresolved.
    pub fn open_for_load(&mut self, name: &str) -> Result<LinkerId> {
        if let Some(id) = self.find(name) {
            return Ok(id);
        }

        let bytes = self.store.read_all(name)?;
        let len = bytes.len();

        let id = self.next_id();
        let linker = load::decode(id, name, bytes)?;

        debug!("opened `{name}` ({len} bytes) for load as linker {id}");

        self.linkers.push(Some(linker));
        self.by_name.insert(name.to_lowercase(), id);

        Ok(id)
    }

    /// Tag every object reachable from `root` for a save of the container
    ///   named `name`.
    ///
    /// If the container is currently open for load,
    ///   the new container inherits its GUID and generation history;
    ///     otherwise it receives a new GUID.
    /// Nothing is written until [`Registry::flush`].
    pub fn open_for_save<G: ObjectGraph>(
        &mut self,
        graph: &G,
        root: ObjectId,
        name: &str,
    ) -> Result<LinkerId> {
        let summary = match self.find(name) {
            Some(prev) => {
                let prev = self.linker(prev)?;
                Summary::new(prev.guid(), prev.generations().to_vec())
            }
            None => Summary::new(Guid::new_v4(), Vec::new()),
        };

        let id = self.next_id();
        let mut linker = Linker::for_save(id, name, root, summary);

        save::walk(&mut linker, graph, root)?;

        debug!(
            "opened `{name}` for save as linker {id} (guid {}, generation {})",
            linker.guid(),
            linker.generations().len(),
        );

        self.linkers.push(Some(linker));

        Ok(id)
    }

    /// Encode a container opened for save and publish it to the store.
    pub fn flush(&mut self, id: LinkerId) -> Result<()> {
        let linker = self
            .linkers
            .get_mut(id.as_usize())
            .and_then(Option::as_mut)
            .ok_or(LinkError::NotOpen(id))?;

        if linker.mode() != Mode::Save {
            return Err(LinkError::WrongMode(id, "flush"));
        }

        let bytes = save::encode(linker)?;
        self.store.publish(linker.name(), &bytes)?;

        debug!("flushed `{}` ({} bytes)", linker.name(), bytes.len());

        Ok(())
    }

    /// Full name of the object referenced by `oref` within the container
    ///   of linker `id`.
    pub fn full_name_of(
        &self,
        id: LinkerId,
        oref: ObjectRef,
    ) -> Result<String> {
        self.linker(id)?.full_name(oref)
    }

    /// Close linker `id`.
    ///
    /// Imports of other linkers that were resolved into this linker
    ///   revert to unresolved.
    pub fn close(&mut self, id: LinkerId) -> Result<()> {
        let linker = self
            .linkers
            .get_mut(id.as_usize())
            .and_then(Option::take)
            .ok_or(LinkError::NotOpen(id))?;

        self.by_name.retain(|_, open| *open != id);

        for other in self.linkers.iter_mut().flatten() {
            let stale: Vec<ImportIndex> = other
                .tables()
                .imports()
                .filter(|(_, import)| {
                    matches!(
                        import.resolution(),
                        Resolution::Resolved(src) if src.linker == id
                    )
                })
                .map(|(index, _)| index)
                .collect();

            for index in stale {
                other
                    .tables_mut()
                    .import_mut(index)?
                    .set_resolution(Resolution::Unresolved);
            }
        }

        debug!("closed `{}` (linker {id})", linker.name());

        Ok(())
    }

    /// Close every open linker.
    pub fn close_all(&mut self) {
        self.linkers.iter_mut().for_each(|linker| *linker = None);
        self.by_name.clear();
    }
}
