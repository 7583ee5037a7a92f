//! Filesystem-backed store.
//!
//! ```text
//! <root>/
//! ├── images/                 # container
//! │   ├── photo.jpg           # original
//! │   ├── photo-w=300.jpg     # variant
//! │   └── 2024/trip.png       # names may contain `/`
//! └── avatars/
//! ```
//!
//! Writes go to a temporary file next to the target and are renamed into
//! place, so a concurrent reader sees either the previous object or the new
//! one, never a partial file.

use super::{ImageStore, StoreError};
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_dir(&self, container: &str) -> Result<PathBuf, StoreError> {
        if container.contains('/') {
            return Err(StoreError::InvalidName(container.to_string()));
        }
        Ok(self.root.join(checked_relative(container)?))
    }

    fn object_path(&self, container: &str, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.container_dir(container)?.join(checked_relative(name)?))
    }
}

/// Accept only plain relative paths: no `..`, no root, no backslashes.
fn checked_relative(name: &str) -> Result<&Path, StoreError> {
    let invalid = || StoreError::InvalidName(name.to_string());
    if name.is_empty() || name.contains('\\') {
        return Err(invalid());
    }
    let path = Path::new(name);
    if path
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        Ok(path)
    } else {
        Err(invalid())
    }
}

impl ImageStore for FsStore {
    fn get(&self, container: &str, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = self.object_path(container, name)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            // A directory where an object was expected is just "no such object".
            Err(_) if path.is_dir() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), StoreError> {
        let path = self.object_path(container, name)?;
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::InvalidName(name.to_string()))?;
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(data)?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    fn list(&self, container: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.container_dir(container)?;
        if !dir.is_dir() {
            return Err(StoreError::ContainerNotFound(container.to_string()));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.map_err(|e| StoreError::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            // Skip in-flight temp files from concurrent puts.
            if entry.file_name().to_string_lossy().starts_with(".tmp") {
                continue;
            }
            let relative = entry.path().strip_prefix(&dir).unwrap_or(entry.path());
            let name: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            names.push(name.join("/"));
        }
        names.sort();
        Ok(names)
    }
}
