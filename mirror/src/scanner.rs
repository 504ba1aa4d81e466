//! Tree scanning: the relative file and directory sets beneath a root

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::path::{RelativeId, Root};
use crate::storage::Storage;

/// Files and subdirectories beneath a root, identified relative to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub root: Root,
    pub files: BTreeSet<RelativeId>,
    pub directories: BTreeSet<RelativeId>,
}

impl TreeSnapshot {
    /// A snapshot with no entries
    pub fn empty(root: Root) -> Self {
        Self {
            root,
            files: BTreeSet::new(),
            directories: BTreeSet::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.directories.is_empty()
    }

    pub fn contains_file(&self, id: &RelativeId) -> bool {
        self.files.contains(id)
    }

    pub fn contains_directory(&self, id: &RelativeId) -> bool {
        self.directories.contains(id)
    }
}

/// Enumerate everything beneath `root` through `storage`.
///
/// A root that does not exist produces an empty snapshot.
pub fn scan_tree<S: Storage + ?Sized>(storage: &S, root: &Root) -> Result<TreeSnapshot> {
    let files = storage
        .enumerate_files(root.location())?
        .iter()
        .map(|location| root.relativize(location))
        .collect::<Result<BTreeSet<_>>>()?;

    let directories = storage
        .enumerate_directories(root.location())?
        .iter()
        .map(|location| root.relativize(location))
        .collect::<Result<BTreeSet<_>>>()?;

    debug!(
        root = %root,
        files = files.len(),
        directories = directories.len(),
        "Scanned tree"
    );

    Ok(TreeSnapshot {
        root: root.clone(),
        files,
        directories,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Location;
    use crate::storage::{LocalStorage, MemoryStorage};
    use tempfile::TempDir;

    fn id(s: &str) -> RelativeId {
        RelativeId::new(s).unwrap()
    }

    #[test]
    fn test_scan_memory_tree() {
        let storage = MemoryStorage::new();
        storage.write_file("mem/src/a.txt", b"a");
        storage.write_file("mem/src/dir/b.txt", b"b");
        storage.create_directory(&Location::new("mem/src/empty")).unwrap();

        let snapshot = scan_tree(&storage, &Root::new("mem/src")).unwrap();
        assert_eq!(snapshot.files, [id("a.txt"), id("dir/b.txt")].into_iter().collect());
        assert_eq!(snapshot.directories, [id("dir"), id("empty")].into_iter().collect());
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let root = Root::from(temp_dir.path().join("missing"));

        let snapshot = scan_tree(&LocalStorage::new(), &root).unwrap();
        assert!(snapshot.is_empty());
        assert_eq!(snapshot, TreeSnapshot::empty(root));
    }

    #[test]
    fn test_scan_local_tree_uses_relative_ids() {
        let temp_dir = TempDir::new().unwrap();
        let root_path = temp_dir.path().join("src");
        std::fs::create_dir_all(root_path.join("nested")).unwrap();
        std::fs::write(root_path.join("nested").join("file.txt"), b"x").unwrap();

        let snapshot = scan_tree(&LocalStorage::new(), &Root::from(&root_path)).unwrap();
        assert!(snapshot.contains_file(&id("nested/file.txt")));
        assert!(snapshot.contains_directory(&id("nested")));
    }
}
