// Global constants across the entire crate
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

//! System-wide static configuration.
//!
//! This module provides a system-wide configuration.
//! Subsystems should reference these values rather than defining their own
//!   and risk incompatibilities or maintenance issues as requirements
//!   change.
//!
//! Most of these values are baked into every container ever written;
//!   changing them will render existing containers unreadable.
//!
//! By convention,
//!   import this entire module rather than individual members and reference
//!   them as `global::foo` to emphasize their nature and risk.

/// Magic tag at the start of every container.
pub const CONTAINER_TAG: u32 = 0x9E2A83C1;

/// Oldest file version that can still be loaded.
pub const MIN_VERSION: u16 = 60;

/// File version written by this linker.
///
/// This is also the newest version that can be loaded.
pub const CURRENT_VERSION: u16 = 69;

/// Licensee version written by this linker.
pub const CURRENT_LICENSEE_VERSION: u16 = 0;

/// First file version that stores a GUID and generation history in
///   place of heritage stamps.
pub const GENERATIONS_VERSION: u16 = 68;

/// First file version that prefixes symbol text with its length.
///
/// Older symbols are terminated only by a NUL byte.
pub const SIZED_SYMBOL_VERSION: u16 = 64;

/// Maximum number of bytes occupied by a single compact index.
pub const COMPACT_INDEX_MAX_LEN: usize = 5;

/// Text of the sentinel symbol at index `0`.
pub const NONE_SYMBOL: &str = "None";

/// Class name reported for objects whose class reference is null,
///   which denotes the root meta-class.
pub const META_CLASS_NAME: &str = "Class";

/// Class of top-level container objects.
pub const CONTAINER_CLASS_NAME: &str = "Package";

/// Container that defines [`CONTAINER_CLASS_NAME`] and
///   [`META_CLASS_NAME`].
pub const CORE_CONTAINER_NAME: &str = "Core";

/// Separator between object names in a full name.
pub const PATH_SEPARATOR: char = '.';

/// A size capable of representing every symbol in a single container.
pub type SymSize = u32;

/// A size capable of representing every export or import of a single
///   container.
///
/// References to objects are signed on disk,
///   which halves the usable range.
pub type ObjIndexSize = u32;
