// Package linker library
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

//! A linker for containers of persisted object graphs.
//!
//! A _container_ holds a set of objects along with enough information to
//!   locate every object that they reference in _other_ containers.
//! Objects are never stored by address;
//!   they are identified by interned names and signed table indices,
//!     and references that leave the container are resolved lazily by
//!     name when they are needed.
//!
//! The crate is organized bottom-up:
//!
//!   - [`index`] encodes the compact variable-length integers used
//!       throughout containers;
//!   - [`sym`] interns names;
//!   - [`obj`] defines object references and the export and import
//!       tables;
//!   - [`summary`] reads and writes the container header;
//!   - [`ld`] ties them together into a linker and a registry of open
//!       containers;
//!         and
//!   - [`graph`], [`store`], and [`diagnose`] define the collaborators
//!       that the linker is given by its host.
//!
//! The [`pkgld`](../pkgld) binary inspects containers on disk.

// We build docs for private items.
#![allow(rustdoc::private_intra_doc_links)]

pub mod global;

#[macro_use]
extern crate static_assertions;

pub mod diagnose;
pub mod error;
pub mod graph;
pub mod index;
pub mod ld;
pub mod obj;
pub mod store;
pub mod stream;
pub mod summary;
pub mod sym;
