//! Metrics and statistics for mirror runs

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::diff::SyncAction;

/// Statistics for a single synchronization call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMetrics {
    /// Unique session identifier
    pub session_id: Uuid,
    /// Start time of the run
    pub start_time: DateTime<Utc>,
    /// End time of the run
    pub end_time: Option<DateTime<Utc>>,
    /// Total duration of the run
    pub duration: Duration,
    /// Whether the run only planned without touching the target
    pub dry_run: bool,
    /// File statistics
    pub files: FileStats,
}

/// File-related statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileStats {
    /// Source trees scanned
    pub sources_scanned: usize,
    /// Files found across all sources
    pub scanned: usize,
    /// Files copied because the target lacked them
    pub copied: usize,
    /// Files overwritten because their signature changed
    pub updated: usize,
    /// Files left untouched because their signature matched
    pub unchanged: usize,
    /// Target files removed
    pub deleted: usize,
    /// Target directories created
    pub directories_created: usize,
    /// Target directories removed (recursively)
    pub directories_deleted: usize,
}

impl FileStats {
    /// Files written to the target, new or overwritten
    pub fn transferred(&self) -> usize {
        self.copied + self.updated
    }
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            start_time: Utc::now(),
            end_time: None,
            duration: Duration::default(),
            dry_run: false,
            files: FileStats::default(),
        }
    }

    /// Mark the run as started
    pub fn start(&mut self) {
        self.start_time = Utc::now();
    }

    /// Record the size of the scanned source trees
    pub fn record_scan(&mut self, sources: usize, files: usize) {
        self.files.sources_scanned = sources;
        self.files.scanned = files;
    }

    /// Record one executed (or, in a dry run, planned) action
    pub fn record(&mut self, action: &SyncAction) {
        match action {
            SyncAction::CreateDirectory { .. } => self.files.directories_created += 1,
            SyncAction::Copy { .. } => self.files.copied += 1,
            SyncAction::Update { .. } => self.files.updated += 1,
            SyncAction::Skip { .. } => self.files.unchanged += 1,
            SyncAction::DeleteFile { .. } => self.files.deleted += 1,
            SyncAction::DeleteDirectory { .. } => self.files.directories_deleted += 1,
        }
    }

    /// Mark the run as completed and log the outcome
    pub fn complete(&mut self) {
        let end_time = Utc::now();
        self.duration = (end_time - self.start_time).to_std().unwrap_or_default();
        self.end_time = Some(end_time);

        info!(
            session_id = %self.session_id,
            duration_secs = self.duration.as_secs_f64(),
            dry_run = self.dry_run,
            sources = self.files.sources_scanned,
            files_scanned = self.files.scanned,
            files_copied = self.files.copied,
            files_updated = self.files.updated,
            files_unchanged = self.files.unchanged,
            files_deleted = self.files.deleted,
            directories_created = self.files.directories_created,
            directories_deleted = self.files.directories_deleted,
            "Mirror run completed"
        );
    }

    /// One-line human readable summary
    pub fn summary(&self) -> String {
        format!(
            "{}{} copied, {} updated, {} unchanged, {} deleted, {} directories created, {} directories deleted in {:.2}s",
            if self.dry_run { "DRY RUN: " } else { "" },
            self.files.copied,
            self.files.updated,
            self.files.unchanged,
            self.files.deleted,
            self.files.directories_created,
            self.files.directories_deleted,
            self.duration.as_secs_f64(),
        )
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
