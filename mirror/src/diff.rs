//! Planning: the ordered list of storage operations that brings the target in
//! line with the union of the sources
//!
//! Planning reads signatures but never mutates anything, so a plan can be
//! inspected (preview, dry run) before it is executed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::conflict::Ownership;
use crate::error::Result;
use crate::path::RelativeId;
use crate::scanner::TreeSnapshot;
use crate::storage::Storage;

/// A single planned step. `source` is an index into the source list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SyncAction {
    /// Create a directory that some source has and the target lacks
    CreateDirectory { path: RelativeId },
    /// Copy a file the target lacks
    Copy { path: RelativeId, source: usize },
    /// Overwrite a target file whose signature differs from the source
    Update { path: RelativeId, source: usize },
    /// Target file already matches its source
    Skip { path: RelativeId, source: usize },
    /// Remove a target file no source has
    DeleteFile { path: RelativeId },
    /// Remove a target directory, recursively, that no source has
    DeleteDirectory { path: RelativeId },
}

impl SyncAction {
    pub fn path(&self) -> &RelativeId {
        match self {
            SyncAction::CreateDirectory { path }
            | SyncAction::Copy { path, .. }
            | SyncAction::Update { path, .. }
            | SyncAction::Skip { path, .. }
            | SyncAction::DeleteFile { path }
            | SyncAction::DeleteDirectory { path } => path,
        }
    }

    /// Whether executing this action changes the target
    pub fn is_mutation(&self) -> bool {
        !matches!(self, SyncAction::Skip { .. })
    }

    /// Short lowercase name used in logs and summaries
    pub fn name(&self) -> &'static str {
        match self {
            SyncAction::CreateDirectory { .. } => "create_directory",
            SyncAction::Copy { .. } => "copy",
            SyncAction::Update { .. } => "update",
            SyncAction::Skip { .. } => "skip",
            SyncAction::DeleteFile { .. } => "delete_file",
            SyncAction::DeleteDirectory { .. } => "delete_directory",
        }
    }
}

/// Counts of each action kind in a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_actions: usize,
    pub directory_creates: usize,
    pub copies: usize,
    pub updates: usize,
    pub skips: usize,
    pub file_deletes: usize,
    pub directory_deletes: usize,
}

impl PlanSummary {
    pub fn from_actions(actions: &[SyncAction]) -> Self {
        let mut summary = PlanSummary {
            total_actions: actions.len(),
            ..Default::default()
        };

        for action in actions {
            match action {
                SyncAction::CreateDirectory { .. } => summary.directory_creates += 1,
                SyncAction::Copy { .. } => summary.copies += 1,
                SyncAction::Update { .. } => summary.updates += 1,
                SyncAction::Skip { .. } => summary.skips += 1,
                SyncAction::DeleteFile { .. } => summary.file_deletes += 1,
                SyncAction::DeleteDirectory { .. } => summary.directory_deletes += 1,
            }
        }

        summary
    }

    /// Number of actions that would change the target
    pub fn mutations(&self) -> usize {
        self.total_actions - self.skips
    }
}

/// An ordered list of actions with summary counts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub actions: Vec<SyncAction>,
    pub summary: PlanSummary,
}

impl SyncPlan {
    pub fn new(actions: Vec<SyncAction>) -> Self {
        let summary = PlanSummary::from_actions(&actions);
        Self { actions, summary }
    }

    /// True when executing the plan would leave the target unchanged
    pub fn is_noop(&self) -> bool {
        self.summary.mutations() == 0
    }

    /// Actions that change the target, in execution order
    pub fn mutations(&self) -> impl Iterator<Item = &SyncAction> {
        self.actions.iter().filter(|action| action.is_mutation())
    }
}

/// Keep only the entries none of whose ancestors are also candidates
fn top_most<'a>(candidates: &BTreeSet<&'a RelativeId>) -> Vec<&'a RelativeId> {
    candidates
        .iter()
        .filter(|id| {
            let mut ancestor = id.parent();
            while let Some(dir) = ancestor {
                if candidates.contains(&dir) {
                    return false;
                }
                ancestor = dir.parent();
            }
            true
        })
        .copied()
        .collect()
}

/// Build the plan that makes `target` equal to the union of `sources`.
///
/// Actions are ordered so that each one is valid when executed in sequence:
/// entries whose kind changed (file in the target, directory in a source, or
/// the reverse) are removed first, then missing directories are created,
/// files are copied or overwritten source by source, extraneous files are
/// deleted and finally extraneous directories are deleted. Only the top-most
/// extraneous directory of a subtree is deleted, since deletion is recursive.
pub fn generate_plan<S: Storage + ?Sized>(
    storage: &S,
    sources: &[TreeSnapshot],
    target: &TreeSnapshot,
    ownership: &Ownership,
) -> Result<SyncPlan> {
    let source_directories: BTreeSet<&RelativeId> =
        sources.iter().flat_map(|tree| tree.directories.iter()).collect();

    let mut actions = Vec::new();

    // Kind changes
    let replaced_directories: BTreeSet<&RelativeId> = target
        .directories
        .iter()
        .filter(|id| ownership.contains(id))
        .collect();
    let replaced_directories = top_most(&replaced_directories);
    let is_replaced = |id: &RelativeId| {
        replaced_directories
            .iter()
            .any(|dir| id == *dir || id.is_descendant_of(dir))
    };

    for dir in &replaced_directories {
        debug!(path = %dir, "Target directory replaced by a source file");
        actions.push(SyncAction::DeleteDirectory { path: (*dir).clone() });
    }

    let target_files: BTreeSet<&RelativeId> = target
        .files
        .iter()
        .filter(|id| !is_replaced(*id))
        .collect();
    let target_directories: BTreeSet<&RelativeId> = target
        .directories
        .iter()
        .filter(|id| !is_replaced(*id))
        .collect();

    let shadowed_files: BTreeSet<&RelativeId> = target_files
        .iter()
        .filter(|id| source_directories.contains(*id))
        .copied()
        .collect();
    for file in &shadowed_files {
        debug!(path = %file, "Target file replaced by a source directory");
        actions.push(SyncAction::DeleteFile { path: (*file).clone() });
    }
    let target_files: BTreeSet<&RelativeId> =
        target_files.difference(&shadowed_files).copied().collect();

    // Directory creation
    for dir in source_directories.difference(&target_directories) {
        actions.push(SyncAction::CreateDirectory { path: (*dir).clone() });
    }

    // Copies and overwrites
    for (index, tree) in sources.iter().enumerate() {
        for id in &tree.files {
            if !target_files.contains(id) {
                actions.push(SyncAction::Copy { path: id.clone(), source: index });
                continue;
            }

            let source_signature = storage.signature(&tree.root.resolve(id))?;
            let target_signature = storage.signature(&target.root.resolve(id))?;
            if source_signature == target_signature {
                trace!(path = %id, signature = %source_signature, "Unchanged");
                actions.push(SyncAction::Skip { path: id.clone(), source: index });
            } else {
                actions.push(SyncAction::Update { path: id.clone(), source: index });
            }
        }
    }

    // Extraneous files
    for file in target_files.iter().filter(|id| !ownership.contains(id)) {
        actions.push(SyncAction::DeleteFile { path: (*file).clone() });
    }

    // Extraneous directories
    let extraneous_directories: BTreeSet<&RelativeId> = target_directories
        .difference(&source_directories)
        .copied()
        .collect();
    for dir in top_most(&extraneous_directories) {
        actions.push(SyncAction::DeleteDirectory { path: dir.clone() });
    }

    let plan = SyncPlan::new(actions);
    debug!(
        total = plan.summary.total_actions,
        copies = plan.summary.copies,
        updates = plan.summary.updates,
        skips = plan.summary.skips,
        file_deletes = plan.summary.file_deletes,
        directory_creates = plan.summary.directory_creates,
        directory_deletes = plan.summary.directory_deletes,
        "Generated sync plan"
    );

    Ok(plan)
}
