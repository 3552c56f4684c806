// Container storage
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

//! Locating containers by name.
//!
//! The linker never touches the filesystem itself;
//!   it asks a [`ContainerStore`] to open a container by its logical name
//!   and to publish the bytes of a container that has been saved.
//!
//!   - [`FsContainerStore`] stores each container as `<name>.pkg` within a
//!       single directory;
//!         and
//!   - [`MemContainerStore`] holds containers in memory.
//!
//! Publishing is atomic for the filesystem store:
//!   a container is written to a temporary file in the same directory and
//!   then renamed over any previous container of the same name,
//!     so that a reader never observes a partially written container.

use crate::error::{LinkError, Result};
use fxhash::FxHashMap;
use std::fs;
use std::io::{self, BufReader, Cursor, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File extension of containers in a [`FsContainerStore`].
pub const CONTAINER_EXT: &str = "pkg";

/// Source and destination of containers.
pub trait ContainerStore {
    type Reader: Read;

    /// Open the container named `name`,
    ///   failing with [`LinkError::NotFound`] if there is no such
    ///   container.
    fn open(&self, name: &str) -> Result<Self::Reader>;

    /// Replace the container named `name` with `bytes`.
    fn publish(&mut self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Read the entirety of the container named `name`.
    fn read_all(&self, name: &str) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.open(name)?.read_to_end(&mut buf)?;

        Ok(buf)
    }
}

/// A file that can be opened by path.
pub trait File: Read
where
    Self: Sized,
{
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self>;
}

impl File for fs::File {
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::open(path)
    }
}

impl<F: File> File for BufReader<F> {
    /// Open the file at `path` and construct a [`BufReader`] from it.
    fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(BufReader::new(F::open(path)?))
    }
}

/// Containers stored as files within a single directory.
///
/// Container names are matched case-insensitively:
///   if `<name>.pkg` does not exist,
///     the directory is searched for a file whose name differs only in
///     case.
#[derive(Debug)]
pub struct FsContainerStore<F: File = BufReader<fs::File>> {
    dir: PathBuf,
    _file: PhantomData<F>,
}

impl<F: File> FsContainerStore<F> {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            _file: PhantomData,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path at which a container named `name` is published.
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.{CONTAINER_EXT}"))
    }

    /// Locate an existing container,
    ///   ignoring case.
    fn locate(&self, name: &str) -> Option<PathBuf> {
        let exact = self.path_of(name);

        if exact.is_file() {
            return Some(exact);
        }

        fs::read_dir(&self.dir)
            .ok()?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .find(|path| {
                let ext_ok = path.extension().map_or(false, |ext| {
                    ext.eq_ignore_ascii_case(CONTAINER_EXT)
                });

                let stem_ok = path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .map_or(false, |stem| stem.eq_ignore_ascii_case(name));

                ext_ok && stem_ok && path.is_file()
            })
    }
}

impl<F: File> ContainerStore for FsContainerStore<F> {
    type Reader = F;

    fn open(&self, name: &str) -> Result<F> {
        let path = self
            .locate(name)
            .ok_or_else(|| LinkError::NotFound(name.to_string()))?;

        F::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => LinkError::NotFound(name.to_string()),
            _ => e.into(),
        })
    }

    fn publish(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;

        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;

        // An existing container under a different case would otherwise
        //   shadow the new one on case-sensitive filesystems.
        let dest = self.locate(name).unwrap_or_else(|| self.path_of(name));

        tmp.persist(dest).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Containers held in memory.
///
/// Names are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct MemContainerStore {
    containers: FxHashMap<String, Vec<u8>>,
}

impl MemContainerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of the container named `name`,
    ///   if any.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.containers
            .get(&name.to_lowercase())
            .map(|bytes| bytes.as_slice())
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl ContainerStore for MemContainerStore {
    type Reader = Cursor<Vec<u8>>;

    fn open(&self, name: &str) -> Result<Self::Reader> {
        self.get(name)
            .map(|bytes| Cursor::new(bytes.to_vec()))
            .ok_or_else(|| LinkError::NotFound(name.to_string()))
    }

    fn publish(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        self.containers.insert(name.to_lowercase(), bytes.to_vec());
        Ok(())
    }
}

impl<S: ContainerStore> ContainerStore for &mut S {
    type Reader = S::Reader;

    fn open(&self, name: &str) -> Result<Self::Reader> {
        (**self).open(name)
    }

    fn publish(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        (**self).publish(name, bytes)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct DummyFile(PathBuf);

    impl File for DummyFile {
        fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
            Ok(Self(path.as_ref().to_path_buf()))
        }
    }

    impl Read for DummyFile {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Ok(0)
        }
    }

    #[test]
    fn buf_reader_file() {
        let path: PathBuf = "buf/path".into();
        let result: BufReader<DummyFile> = File::open(path.clone()).unwrap();

        assert_eq!(DummyFile(path), result.into_inner());
    }

    #[test]
    fn fs_store_publishes_and_opens() {
        let dir = tempfile::tempdir().unwrap();
        let mut sut: FsContainerStore = FsContainerStore::new(dir.path());

        sut.publish("Foo", b"first").unwrap();
        sut.publish("Foo", b"second").unwrap();

        assert_eq!(b"second".to_vec(), sut.read_all("Foo").unwrap());
        assert!(dir.path().join("Foo.pkg").is_file());
    }

    #[test]
    fn fs_store_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("MixedCase.pkg"), b"data").unwrap();

        let mut sut: FsContainerStore = FsContainerStore::new(dir.path());
        assert_eq!(b"data".to_vec(), sut.read_all("mixedcase").unwrap());

        // publishing must replace the existing file rather than shadow it
        sut.publish("MIXEDCASE", b"new").unwrap();
        assert_eq!(b"new".to_vec(), sut.read_all("MixedCase").unwrap());
    }

    #[test]
    fn fs_store_opens_through_file_abstraction() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Pkg.pkg"), b"").unwrap();

        let sut = FsContainerStore::<DummyFile>::new(dir.path());

        assert_eq!(
            DummyFile(dir.path().join("Pkg.pkg")),
            sut.open("pkg").unwrap()
        );
    }

    #[test]
    fn fs_store_missing_container_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let sut: FsContainerStore = FsContainerStore::new(dir.path());

        assert!(matches!(
            sut.open("Missing"),
            Err(LinkError::NotFound(name)) if name == "Missing"
        ));
    }

    #[test]
    fn mem_store_ignores_case() {
        let mut sut = MemContainerStore::new();
        sut.publish("Core", &[1, 2, 3]).unwrap();

        assert_eq!(vec![1, 2, 3], sut.read_all("CORE").unwrap());
        assert_eq!(1, sut.len());

        assert!(matches!(sut.open("Other"), Err(LinkError::NotFound(_))));
    }
}
