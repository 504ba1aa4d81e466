//! Main mirror engine that orchestrates the synchronization process

use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::conflict::detect_conflicts;
use crate::diff::{generate_plan, SyncAction, SyncPlan};
use crate::error::{MirrorError, Result};
use crate::metrics::SyncMetrics;
use crate::path::Root;
use crate::scanner::{scan_tree, TreeSnapshot};
use crate::storage::{LocalStorage, Storage};

/// Options for mirror runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Plan and report without modifying the target
    #[serde(default)]
    pub dry_run: bool,
}

/// Anything that names one source root or an ordered list of them
pub trait IntoSourceRoots {
    fn into_source_roots(self) -> Vec<Root>;
}

macro_rules! single_source_root {
    ($($ty:ty),*) => {
        $(
            impl IntoSourceRoots for $ty {
                fn into_source_roots(self) -> Vec<Root> {
                    vec![Root::from(self)]
                }
            }
        )*
    };
}

single_source_root!(Root, &Root, &str, String, &Path, PathBuf, &PathBuf);

impl<T: Into<Root>> IntoSourceRoots for Vec<T> {
    fn into_source_roots(self) -> Vec<Root> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Clone + Into<Root>> IntoSourceRoots for &[T] {
    fn into_source_roots(self) -> Vec<Root> {
        self.iter().cloned().map(Into::into).collect()
    }
}

impl<T: Clone + Into<Root>> IntoSourceRoots for &Vec<T> {
    fn into_source_roots(self) -> Vec<Root> {
        self.as_slice().into_source_roots()
    }
}

impl<T: Into<Root>, const N: usize> IntoSourceRoots for [T; N] {
    fn into_source_roots(self) -> Vec<Root> {
        self.into_iter().map(Into::into).collect()
    }
}

fn require_sources(sources: Vec<Root>) -> Result<Vec<Root>> {
    if sources.is_empty() {
        return Err(MirrorError::Config("at least one source directory is required".to_string()));
    }
    Ok(sources)
}

/// Everything computed before the target is touched
struct Prepared {
    sources: Vec<TreeSnapshot>,
    plan: SyncPlan,
}

/// Mirror engine over a storage backend
pub struct SyncEngine<S: Storage = LocalStorage> {
    storage: S,
    options: SyncOptions,
}

impl Default for SyncEngine<LocalStorage> {
    fn default() -> Self {
        Self::new(SyncOptions::default())
    }
}

impl SyncEngine<LocalStorage> {
    /// Create an engine over the local filesystem
    pub fn new(options: SyncOptions) -> Self {
        Self::with_storage(LocalStorage::default(), options)
    }
}

impl<S: Storage> SyncEngine<S> {
    /// Create an engine over the given storage backend
    pub fn with_storage(storage: S, options: SyncOptions) -> Self {
        Self { storage, options }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SyncOptions) {
        self.options = options;
    }

    /// Make `target` contain exactly the union of `sources`.
    ///
    /// Fails with [`MirrorError::Conflict`] before any target file is touched
    /// when two sources contain the same file. Storage failures abort the run
    /// where they occur; running again converges the target.
    pub fn sync(&self, sources: impl IntoSourceRoots, target: impl Into<Root>) -> Result<SyncMetrics> {
        let sources = require_sources(sources.into_source_roots())?;
        let target = target.into();

        let mut metrics = SyncMetrics::new();
        metrics.dry_run = self.options.dry_run;
        metrics.start();

        info!(
            session_id = %metrics.session_id,
            sources = sources.len(),
            target = %target,
            dry_run = self.options.dry_run,
            "Starting mirror run"
        );

        if !self.options.dry_run {
            self.storage.create_directory(target.location())?;
        }

        let prepared = self.prepare(&sources, &target)?;
        metrics.record_scan(
            prepared.sources.len(),
            prepared.sources.iter().map(|tree| tree.files.len()).sum(),
        );

        for action in &prepared.plan.actions {
            if !self.options.dry_run {
                self.execute_action(action, &prepared.sources, &target)?;
            }
            metrics.record(action);
        }

        metrics.complete();
        Ok(metrics)
    }

    /// Compute the plan `sync` would execute, without modifying anything
    pub fn preview(&self, sources: impl IntoSourceRoots, target: impl Into<Root>) -> Result<SyncPlan> {
        let sources = require_sources(sources.into_source_roots())?;
        let target = target.into();
        self.prepare(&sources, &target).map(|prepared| prepared.plan)
    }

    /// Scan every tree, check ownership and build the plan
    fn prepare(&self, sources: &[Root], target: &Root) -> Result<Prepared> {
        let start_time = Instant::now();
        let source_trees = sources
            .iter()
            .map(|root| scan_tree(&self.storage, root))
            .collect::<Result<Vec<_>>>()?;
        let target_tree = scan_tree(&self.storage, target)?;
        debug!(duration_ms = start_time.elapsed().as_millis() as u64, "Scanned source and target trees");

        let ownership = detect_conflicts(&source_trees, target)?;
        let plan = generate_plan(&self.storage, &source_trees, &target_tree, &ownership)?;

        Ok(Prepared {
            sources: source_trees,
            plan,
        })
    }

    /// Execute a single planned action against the storage
    fn execute_action(&self, action: &SyncAction, sources: &[TreeSnapshot], target: &Root) -> Result<()> {
        debug!(action = action.name(), path = %action.path(), "Executing");

        match action {
            SyncAction::CreateDirectory { path } => self.storage.create_directory(&target.resolve(path)),
            SyncAction::Copy { path, source } | SyncAction::Update { path, source } => self
                .storage
                .copy_file(&sources[*source].root.resolve(path), &target.resolve(path)),
            SyncAction::Skip { .. } => Ok(()),
            SyncAction::DeleteFile { path } => self.storage.delete_file(&target.resolve(path)),
            SyncAction::DeleteDirectory { path } => self.storage.delete_directory(&target.resolve(path)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sync_engine_basic() {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = temp_dir.path().join("source");
        let dest_dir = temp_dir.path().join("dest");

        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("file1.txt"), b"content1").unwrap();
        fs::write(source_dir.join("file2.txt"), b"content2").unwrap();

        let engine = SyncEngine::new(SyncOptions::default());
        let metrics = engine.sync(&source_dir, &dest_dir).unwrap();

        assert_eq!(fs::read(dest_dir.join("file1.txt")).unwrap(), b"content1");
        assert_eq!(fs::read(dest_dir.join("file2.txt")).unwrap(), b"content2");
        assert_eq!(metrics.files.copied, 2);
        assert_eq!(metrics.files.scanned, 2);
        assert!(metrics.end_time.is_some());
    }

    #[test]
    fn test_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = temp_dir.path().join("source");
        let dest_dir = temp_dir.path().join("dest");

        fs::create_dir_all(source_dir.join("sub")).unwrap();
        fs::write(source_dir.join("sub").join("file1.txt"), b"content1").unwrap();

        let engine = SyncEngine::new(SyncOptions { dry_run: true });
        let metrics = engine.sync(&source_dir, &dest_dir).unwrap();

        // Nothing is created, not even the target itself
        assert!(!dest_dir.exists());

        // But metrics are still recorded
        assert!(metrics.dry_run);
        assert_eq!(metrics.files.copied, 1);
        assert_eq!(metrics.files.directories_created, 1);
    }

    #[test]
    fn test_preview() {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = temp_dir.path().join("source");
        let dest_dir = temp_dir.path().join("dest");

        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("file1.txt"), b"content1").unwrap();
        fs::write(source_dir.join("file2.txt"), b"content2").unwrap();

        fs::create_dir_all(&dest_dir).unwrap();
        fs::write(dest_dir.join("file1.txt"), b"content1").unwrap();

        let engine = SyncEngine::new(SyncOptions::default());
        let plan = engine.preview(&source_dir, &dest_dir).unwrap();

        // One copy (file2.txt) and one skip (file1.txt)
        assert_eq!(plan.summary.copies, 1);
        assert_eq!(plan.summary.skips, 1);
        assert!(!dest_dir.join("file2.txt").exists());
    }

    #[test]
    fn test_no_sources_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let engine = SyncEngine::new(SyncOptions::default());
        let sources: Vec<PathBuf> = Vec::new();

        let dest_dir = temp_dir.path().join("dest");
        let err = engine.sync(sources, &dest_dir).unwrap_err();
        assert!(matches!(err, MirrorError::Config(_)));
        assert!(!dest_dir.exists());
    }

    #[test]
    fn test_source_root_conversions() {
        let single = "a".into_source_roots();
        assert_eq!(single, vec![Root::new("a")]);

        let many = ["a", "b/"].into_source_roots();
        assert_eq!(many, vec![Root::new("a"), Root::new("b")]);

        let paths = vec![PathBuf::from("x"), PathBuf::from("y")];
        assert_eq!(paths.as_slice().into_source_roots().len(), 2);
        assert_eq!((&paths).into_source_roots().len(), 2);
        assert_eq!(paths.into_source_roots()[1], Root::new("y"));
    }
}
