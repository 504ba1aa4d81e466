//! In-memory storage backend
//!
//! Useful as a test fixture and for exercising the engine without touching
//! disk. Honours the same error contracts as [`LocalStorage`](super::LocalStorage).

use std::collections::{BTreeMap, BTreeSet};
use std::io;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{MirrorError, Result};
use crate::path::{Location, SEPARATOR};
use crate::signature::{bytes_signature, Signature, SignatureAlgorithm};
use crate::storage::Storage;

/// Number of storage calls observed, by kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounts {
    pub copies: usize,
    pub file_deletions: usize,
    pub directory_creations: usize,
    pub directory_deletions: usize,
    pub signatures: usize,
}

#[derive(Debug, Default)]
struct Inner {
    files: BTreeMap<String, Vec<u8>>,
    directories: BTreeSet<String>,
    counts: OperationCounts,
}

/// Storage that keeps every file and directory in memory
#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

fn key(location: &Location) -> String {
    let trimmed = location.as_str().trim_end_matches(SEPARATOR);
    if trimmed.is_empty() && !location.as_str().is_empty() {
        SEPARATOR.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory key for everything before the separator at `index`; the
/// leading separator of an absolute key stands for `/` itself
fn prefix(key: &str, index: usize) -> &str {
    if index == 0 {
        &key[..1]
    } else {
        &key[..index]
    }
}

/// Every proper ancestor of `key`, including `/` for absolute keys
fn ancestors(key: &str) -> impl Iterator<Item = &str> {
    key.match_indices(SEPARATOR)
        .map(move |(index, _)| prefix(key, index))
        .filter(move |ancestor| *ancestor != key)
}

fn parent(key: &str) -> Option<&str> {
    key.rfind(SEPARATOR)
        .map(|index| prefix(key, index))
        .filter(|parent| *parent != key)
}

fn is_beneath(candidate: &str, dir: &str) -> bool {
    candidate.len() > dir.len()
        && candidate.starts_with(dir)
        && (dir.ends_with(SEPARATOR) || candidate[dir.len()..].starts_with(SEPARATOR))
}

fn not_found(operation: &'static str, location: &str) -> MirrorError {
    MirrorError::io(
        operation,
        location,
        io::Error::new(io::ErrorKind::NotFound, "no such file or directory"),
    )
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `content` at `location`, creating parent directories
    pub fn write_file(&self, location: impl Into<Location>, content: impl AsRef<[u8]>) {
        let location = key(&location.into());
        let mut inner = self.inner.write();
        for ancestor in ancestors(&location) {
            inner.directories.insert(ancestor.to_string());
        }
        inner.files.insert(location, content.as_ref().to_vec());
    }

    /// Content of the file at `location`, if any
    pub fn read_file(&self, location: impl Into<Location>) -> Option<Vec<u8>> {
        self.inner.read().files.get(&key(&location.into())).cloned()
    }

    /// Remove a file without counting it as an engine operation
    pub fn remove_file(&self, location: impl Into<Location>) -> bool {
        self.inner.write().files.remove(&key(&location.into())).is_some()
    }

    pub fn file_exists(&self, location: impl Into<Location>) -> bool {
        self.inner.read().files.contains_key(&key(&location.into()))
    }

    pub fn dir_exists(&self, location: impl Into<Location>) -> bool {
        self.inner.read().directories.contains(&key(&location.into()))
    }

    /// Operations performed through the [`Storage`] trait so far
    pub fn counts(&self) -> OperationCounts {
        self.inner.read().counts
    }

    pub fn reset_counts(&self) {
        self.inner.write().counts = OperationCounts::default();
    }
}

impl Storage for MemoryStorage {
    fn create_directory(&self, dir: &Location) -> Result<()> {
        let dir = key(dir);
        let mut inner = self.inner.write();

        if let Some(file) = ancestors(&dir)
            .chain(std::iter::once(dir.as_str()))
            .find(|candidate| inner.files.contains_key(*candidate))
        {
            return Err(MirrorError::io(
                "create_directory",
                file,
                io::Error::new(io::ErrorKind::AlreadyExists, "a file exists at this location"),
            ));
        }

        let created: Vec<String> = ancestors(&dir)
            .chain(std::iter::once(dir.as_str()))
            .map(str::to_string)
            .collect();
        inner.directories.extend(created);
        inner.counts.directory_creations += 1;
        Ok(())
    }

    fn enumerate_files(&self, dir: &Location) -> Result<Vec<Location>> {
        let dir = key(dir);
        let inner = self.inner.read();
        if !inner.directories.contains(&dir) {
            return Ok(Vec::new());
        }

        Ok(inner
            .files
            .keys()
            .filter(|file| is_beneath(file, &dir))
            .map(|file| Location::new(file.clone()))
            .collect())
    }

    fn enumerate_directories(&self, dir: &Location) -> Result<Vec<Location>> {
        let dir = key(dir);
        let inner = self.inner.read();
        if !inner.directories.contains(&dir) {
            return Ok(Vec::new());
        }

        Ok(inner
            .directories
            .iter()
            .filter(|candidate| is_beneath(candidate, &dir))
            .map(|candidate| Location::new(candidate.clone()))
            .collect())
    }

    fn copy_file(&self, source: &Location, target: &Location) -> Result<()> {
        let source = key(source);
        let target = key(target);
        let mut inner = self.inner.write();

        let content = inner
            .files
            .get(&source)
            .cloned()
            .ok_or_else(|| not_found("copy_file", &source))?;

        if let Some(parent) = parent(&target) {
            if !inner.directories.contains(parent) {
                return Err(not_found("copy_file", parent));
            }
        }
        if inner.directories.contains(&target) {
            return Err(MirrorError::io(
                "copy_file",
                target,
                io::Error::new(io::ErrorKind::Other, "target is a directory"),
            ));
        }

        inner.files.insert(target, content);
        inner.counts.copies += 1;
        Ok(())
    }

    fn delete_file(&self, file: &Location) -> Result<()> {
        let file = key(file);
        let mut inner = self.inner.write();
        if inner.files.remove(&file).is_none() {
            return Err(not_found("delete_file", &file));
        }
        inner.counts.file_deletions += 1;
        Ok(())
    }

    fn delete_directory(&self, dir: &Location) -> Result<()> {
        let dir = key(dir);
        let mut inner = self.inner.write();
        if !inner.directories.remove(&dir) {
            return Err(not_found("delete_directory", &dir));
        }

        inner.files.retain(|file, _| !is_beneath(file, &dir));
        inner.directories.retain(|candidate| !is_beneath(candidate, &dir));
        inner.counts.directory_deletions += 1;
        Ok(())
    }

    fn signature(&self, file: &Location) -> Result<Signature> {
        let file = key(file);
        let mut inner = self.inner.write();
        let signature = inner
            .files
            .get(&file)
            .map(|content| bytes_signature(content, SignatureAlgorithm::Sha256))
            .ok_or_else(|| not_found("signature", &file))?;
        inner.counts.signatures += 1;
        Ok(signature)
    }
}
