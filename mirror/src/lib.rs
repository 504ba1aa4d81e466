//! Mirror Engine Library
//!
//! One-way mirroring of one or more source directories into a single target:
//! - Storage capability trait with local filesystem and in-memory backends
//! - Root-relative path model shared by every backend
//! - Cross-source conflict detection
//! - Content-signature change detection (SHA-256 or BLAKE3)
//! - Plan preview and dry runs
//! - Per-run metrics

pub mod error;
pub mod path;
pub mod signature;
pub mod storage;
pub mod scanner;
pub mod conflict;
pub mod diff;
pub mod sync_engine;
pub mod metrics;

// Re-export main types and functions
pub use error::{MirrorError, Result};
pub use path::{Location, RelativeId, Root};
pub use signature::{Signature, SignatureAlgorithm};
pub use storage::{LocalStorage, MemoryStorage, OperationCounts, Storage};
pub use scanner::{scan_tree, TreeSnapshot};
pub use conflict::{detect_conflicts, Ownership};
pub use diff::{generate_plan, PlanSummary, SyncAction, SyncPlan};
pub use sync_engine::{IntoSourceRoots, SyncEngine, SyncOptions};
pub use metrics::{FileStats, SyncMetrics};

/// Mirror `sources` into `target` on the local filesystem
pub fn synchronize(sources: impl IntoSourceRoots, target: impl Into<Root>) -> Result<SyncMetrics> {
    SyncEngine::new(SyncOptions::default()).sync(sources, target)
}

/// Mirror `sources` into `target` through the given storage backend
pub fn synchronize_with<S: Storage + ?Sized>(
    sources: impl IntoSourceRoots,
    target: impl Into<Root>,
    storage: &S,
) -> Result<SyncMetrics> {
    SyncEngine::with_storage(storage, SyncOptions::default()).sync(sources, target)
}

/// Plan a local filesystem mirror without modifying anything
pub fn preview(sources: impl IntoSourceRoots, target: impl Into<Root>) -> Result<SyncPlan> {
    SyncEngine::new(SyncOptions::default()).preview(sources, target)
}
