// Live object graph seams
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

//! The in-memory object model as seen by the linker.
//!
//! The linker does not own live objects.
//! It sees them only through two traits implemented by the host:
//!
//!   - [`ObjectGraph`] is walked when a container is saved,
//!       to discover which objects are exported and which are imported;
//!         and
//!   - [`ObjectFactory`] is asked to construct an object once the linker
//!       has located the export that describes it.
//!
//! Objects are identified by an opaque [`ObjectId`] chosen by the host.
//!
//! [`MemGraph`] is a simple arena implementation of both traits that is
//!   sufficient for tools and tests.

use crate::index;
use crate::ld::Linker;
use crate::obj::{ExportIndex, ObjectFlags};

/// Opaque handle to a live object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

/// Read-only view of a live object graph.
pub trait ObjectGraph {
    fn name(&self, obj: ObjectId) -> &str;

    /// Class of `obj`,
    ///   or [`None`] if `obj` is an instance of the root meta-class.
    fn class(&self, obj: ObjectId) -> Option<ObjectId>;

    /// Parent class of `obj` if `obj` is itself a class.
    fn super_class(&self, obj: ObjectId) -> Option<ObjectId>;

    /// Object containing `obj`,
    ///   or [`None`] if `obj` is the root of a container.
    fn owner(&self, obj: ObjectId) -> Option<ObjectId>;

    fn flags(&self, obj: ObjectId) -> ObjectFlags;

    /// Objects referenced by `obj`.
    fn references(&self, obj: ObjectId) -> Vec<ObjectId>;

    /// Serialized contents of `obj`.
    ///
    /// `linker` maps any referenced object to the reference under which it
    ///   is stored in the container being saved
    ///     (see [`Linker::object_ref`]).
    fn payload(&self, obj: ObjectId, linker: &Linker) -> Vec<u8>;
}

/// Everything known about an export that is to be materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest<'a> {
    /// Name of the container defining the export.
    pub container: &'a str,

    pub export: ExportIndex,

    /// Owner chain of the export joined by `.`,
    ///   not including the container.
    pub path: &'a str,

    pub name: &'a str,
    pub class_container: &'a str,
    pub class_name: &'a str,

    /// Already materialized owner of the export.
    pub outer: ObjectId,

    pub flags: ObjectFlags,
    pub payload: &'a [u8],
}

/// Construction of live objects from located exports.
pub trait ObjectFactory {
    /// Construct the root object of the container `container`.
    fn create_root(&mut self, container: &str) -> ObjectId;

    fn create_export(&mut self, req: ExportRequest) -> ObjectId;
}

/// An object within a [`MemGraph`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MemObject {
    pub name: String,
    pub class: Option<ObjectId>,
    pub super_class: Option<ObjectId>,
    pub owner: Option<ObjectId>,
    pub flags: ObjectFlags,
    pub references: Vec<ObjectId>,
    pub data: Vec<u8>,

    /// Class container and class name of an object that was materialized
    ///   from a container,
    ///     whose class object may not exist in this graph.
    pub class_identity: Option<(String, String)>,
}

impl MemObject {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn owner(mut self, owner: ObjectId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn class(mut self, class: ObjectId) -> Self {
        self.class = Some(class);
        self
    }

    pub fn super_class(mut self, super_class: ObjectId) -> Self {
        self.super_class = Some(super_class);
        self
    }

    pub fn flags(mut self, flags: ObjectFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn refers_to(mut self, obj: ObjectId) -> Self {
        self.references.push(obj);
        self
    }

    pub fn data<D: Into<Vec<u8>>>(mut self, data: D) -> Self {
        self.data = data.into();
        self
    }
}

/// Arena of [`MemObject`]s.
///
/// The payload of each object is its [`MemObject::data`] followed by each
///   of its references encoded as a compact index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemGraph {
    objects: Vec<MemObject>,
}

impl MemGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, obj: MemObject) -> ObjectId {
        self.objects.push(obj);
        ObjectId(self.objects.len() as u32 - 1)
    }

    pub fn get(&self, obj: ObjectId) -> Option<&MemObject> {
        self.objects.get(obj.as_usize())
    }

    pub fn get_mut(&mut self, obj: ObjectId) -> Option<&mut MemObject> {
        self.objects.get_mut(obj.as_usize())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Names of `obj` and its owners joined by `.`,
    ///   outermost first.
    ///
    /// Owner chains are assumed to be acyclic.
    pub fn path_name(&self, obj: ObjectId) -> String {
        let mut names = vec![self.name(obj)];
        let mut cur = self.owner(obj);

        while let Some(owner) = cur {
            names.push(self.name(owner));
            cur = self.owner(owner);
        }

        names.reverse();
        names.join(".")
    }

    /// Find an object by the result of [`MemGraph::path_name`].
    pub fn find(&self, path: &str) -> Option<ObjectId> {
        (0..self.objects.len() as u32)
            .map(ObjectId)
            .find(|obj| self.path_name(*obj) == path)
    }

    fn obj(&self, obj: ObjectId) -> &MemObject {
        &self.objects[obj.as_usize()]
    }
}

impl ObjectGraph for MemGraph {
    fn name(&self, obj: ObjectId) -> &str {
        &self.obj(obj).name
    }

    fn class(&self, obj: ObjectId) -> Option<ObjectId> {
        self.obj(obj).class
    }

    fn super_class(&self, obj: ObjectId) -> Option<ObjectId> {
        self.obj(obj).super_class
    }

    fn owner(&self, obj: ObjectId) -> Option<ObjectId> {
        self.obj(obj).owner
    }

    fn flags(&self, obj: ObjectId) -> ObjectFlags {
        self.obj(obj).flags
    }

    fn references(&self, obj: ObjectId) -> Vec<ObjectId> {
        self.obj(obj).references.clone()
    }

    fn payload(&self, obj: ObjectId, linker: &Linker) -> Vec<u8> {
        let mem = self.obj(obj);
        let mut payload = mem.data.clone();

        for oref in &mem.references {
            let raw = linker.object_ref(*oref).unwrap_or_default().raw();
            payload.extend(index::encode(raw));
        }

        payload
    }
}

impl ObjectFactory for MemGraph {
    fn create_root(&mut self, container: &str) -> ObjectId {
        self.add(MemObject::new(container))
    }

    fn create_export(&mut self, req: ExportRequest) -> ObjectId {
        self.add(MemObject {
            owner: Some(req.outer),
            flags: req.flags,
            data: req.payload.to_vec(),
            class_identity: Some((
                req.class_container.to_string(),
                req.class_name.to_string(),
            )),
            ..MemObject::new(req.name)
        })
    }
}
