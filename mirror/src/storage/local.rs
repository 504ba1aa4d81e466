//! Local filesystem storage using walkdir and std::fs

use std::fs;
use std::io;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{MirrorError, Result};
use crate::path::Location;
use crate::signature::{file_signature, Signature, SignatureAlgorithm, DEFAULT_BUFFER_SIZE};
use crate::storage::Storage;

/// Storage backed by the local filesystem.
///
/// Signatures are full-content digests. Symbolic links are never descended
/// into: a link to a file is listed as a file, links to directories and
/// dangling links are left out. Entries whose names are not valid UTF-8 are
/// rejected with [`MirrorError::Path`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorage {
    /// Digest used for content signatures
    pub algorithm: SignatureAlgorithm,
    /// Read buffer size used while hashing
    pub buffer_size: usize,
}

impl Default for LocalStorage {
    fn default() -> Self {
        Self::new()
    }
}

/// Which kind of entries a walk should collect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    File,
    Directory,
}

impl LocalStorage {
    /// SHA-256 signatures read in 16 KiB chunks
    pub fn new() -> Self {
        Self {
            algorithm: SignatureAlgorithm::default(),
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }

    pub fn with_algorithm(algorithm: SignatureAlgorithm) -> Self {
        Self {
            algorithm,
            ..Self::new()
        }
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    fn walk(&self, dir: &Location, kind: EntryKind) -> Result<Vec<Location>> {
        let root = dir.to_path_buf();
        if !root.is_dir() {
            trace!(dir = %dir, "enumerating missing directory");
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&root).min_depth(1).follow_links(false) {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(|p| p.to_string_lossy().into_owned())
                    .unwrap_or_else(|| dir.to_string());
                MirrorError::io("enumerate", path, io::Error::from(e))
            })?;

            let entry_kind = match classify(&entry)? {
                Some(entry_kind) => entry_kind,
                None => continue,
            };
            if entry_kind != kind {
                continue;
            }

            let path = entry.path().to_str().ok_or_else(|| {
                MirrorError::path_error(
                    entry.path().to_string_lossy(),
                    "entry name is not valid UTF-8",
                )
            })?;
            entries.push(Location::new(path));
        }

        Ok(entries)
    }
}

/// Kind of a walked entry. Links to files count as files; links to
/// directories and dangling links are skipped.
fn classify(entry: &walkdir::DirEntry) -> Result<Option<EntryKind>> {
    let file_type = entry.file_type();
    if file_type.is_dir() {
        return Ok(Some(EntryKind::Directory));
    }
    if !file_type.is_symlink() {
        return Ok(Some(EntryKind::File));
    }

    match fs::metadata(entry.path()) {
        Ok(metadata) if metadata.is_dir() => {
            debug!(path = %entry.path().display(), "Skipping symlink to a directory");
            Ok(None)
        }
        Ok(_) => Ok(Some(EntryKind::File)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %entry.path().display(), "Skipping dangling symlink");
            Ok(None)
        }
        Err(e) => Err(MirrorError::io("enumerate", entry.path().to_string_lossy(), e)),
    }
}

impl Storage for LocalStorage {
    fn create_directory(&self, dir: &Location) -> Result<()> {
        trace!(dir = %dir, "create_directory");
        fs::create_dir_all(dir.to_path_buf())
            .map_err(|e| MirrorError::io("create_directory", dir.as_str(), e))
    }

    fn enumerate_files(&self, dir: &Location) -> Result<Vec<Location>> {
        self.walk(dir, EntryKind::File)
    }

    fn enumerate_directories(&self, dir: &Location) -> Result<Vec<Location>> {
        self.walk(dir, EntryKind::Directory)
    }

    fn copy_file(&self, source: &Location, target: &Location) -> Result<()> {
        trace!(source = %source, target = %target, "copy_file");
        fs::copy(source.to_path_buf(), target.to_path_buf())
            .map(|_| ())
            .map_err(|e| {
                MirrorError::io("copy_file", format!("{} -> {}", source, target), e)
            })
    }

    fn delete_file(&self, file: &Location) -> Result<()> {
        trace!(file = %file, "delete_file");
        fs::remove_file(file.to_path_buf())
            .map_err(|e| MirrorError::io("delete_file", file.as_str(), e))
    }

    fn delete_directory(&self, dir: &Location) -> Result<()> {
        trace!(dir = %dir, "delete_directory");
        fs::remove_dir_all(dir.to_path_buf())
            .map_err(|e| MirrorError::io("delete_directory", dir.as_str(), e))
    }

    fn signature(&self, file: &Location) -> Result<Signature> {
        file_signature(file.to_path_buf(), self.algorithm, self.buffer_size)
    }
}
