//! Per-request scratch workspaces
//!
//! Every assessment gets an isolated directory for downloaded media and
//! intermediate files. The directory is removed before the response leaves
//! the service, and the removal is verified. `WorkspaceGuard` owns the
//! handle so the directory is also released if the request future is
//! dropped part-way through.

mod dir;
mod layout;

pub use dir::*;
pub use layout::WorkspaceLayout;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ============================================================================
// Traits
// ============================================================================

/// An acquired scratch directory.
pub trait ScratchArea: Send + Sync + std::fmt::Debug {
    /// Root of the scratch directory.
    fn root(&self) -> &Path;

    /// Delete the directory and verify it is gone.
    fn release(&mut self) -> CleanupReport;
}

/// Hands out scratch areas keyed by candidate.
pub trait WorkspaceProvider: Send + Sync {
    fn acquire(&self, key: &str) -> Result<Box<dyn ScratchArea>, WorkspaceError>;
}

// ============================================================================
// Cleanup report
// ============================================================================

/// Outcome of releasing a workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub workspace: PathBuf,
    pub key: String,
    /// Removal was performed (or the directory was already gone)
    pub deleted: bool,
    /// The directory was confirmed absent afterwards
    pub verified: bool,
    pub files_deleted: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl CleanupReport {
    /// Require a fully verified, error-free cleanup.
    pub fn ensure_clean(&self) -> Result<(), CleanupError> {
        if !self.deleted {
            return Err(CleanupError::NotDeleted {
                workspace: self.workspace.clone(),
                errors: self.errors.clone(),
            });
        }
        if !self.verified {
            return Err(CleanupError::NotVerified {
                workspace: self.workspace.clone(),
            });
        }
        if !self.errors.is_empty() {
            return Err(CleanupError::CompletedWithErrors {
                workspace: self.workspace.clone(),
                errors: self.errors.clone(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("failed to create workspace {}: {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("workspace key '{0}' contains no usable characters")]
    InvalidKey(String),
}

/// Scratch data could not be confirmed removed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CleanupError {
    #[error("workspace deletion failed for {}: {}", .workspace.display(), .errors.join("; "))]
    NotDeleted { workspace: PathBuf, errors: Vec<String> },
    #[error("workspace {} still present after deletion", .workspace.display())]
    NotVerified { workspace: PathBuf },
    #[error(
        "workspace cleanup for {} completed with errors: {}",
        .workspace.display(),
        .errors.join("; ")
    )]
    CompletedWithErrors { workspace: PathBuf, errors: Vec<String> },
}

// ============================================================================
// Guard
// ============================================================================

/// Owns an acquired scratch area and releases it exactly once.
///
/// Call `release()` to obtain the report. If the guard is dropped without
/// an explicit release (cancellation, early return) the area is released
/// from `Drop`.
#[derive(Debug)]
pub struct WorkspaceGuard {
    area: Option<Box<dyn ScratchArea>>,
    report: Option<CleanupReport>,
}

impl WorkspaceGuard {
    pub fn new(area: Box<dyn ScratchArea>) -> Self {
        Self {
            area: Some(area),
            report: None,
        }
    }

    /// Scratch root, or `None` once released.
    pub fn path(&self) -> Option<&Path> {
        self.area.as_deref().map(ScratchArea::root)
    }

    /// Release the area. Later calls return the first report.
    pub fn release(&mut self) -> CleanupReport {
        if let Some(mut area) = self.area.take() {
            let report = area.release();
            self.report = Some(report);
        }
        self.report.clone().unwrap_or_default()
    }

    /// Same as [`WorkspaceGuard::release`], with the filesystem work moved
    /// onto the blocking pool.
    ///
    /// The area is handed to the blocking task before the first await, so
    /// dropping this future mid-way still completes the release exactly once.
    pub async fn release_blocking(&mut self) -> CleanupReport {
        if let Some(mut area) = self.area.take() {
            let workspace = area.root().to_path_buf();
            let report = tokio::task::spawn_blocking(move || area.release())
                .await
                .unwrap_or_else(|e| CleanupReport {
                    workspace,
                    errors: vec![format!("cleanup task failed: {e}")],
                    ..CleanupReport::default()
                });
            self.report = Some(report);
        }
        self.report.clone().unwrap_or_default()
    }

    pub fn is_released(&self) -> bool {
        self.area.is_none()
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        if self.area.is_some() {
            let report = self.release();
            if report.ensure_clean().is_err() {
                tracing::warn!(
                    workspace = %report.workspace.display(),
                    errors = ?report.errors,
                    "Workspace released on drop without verified cleanup"
                );
            } else {
                tracing::debug!(
                    workspace = %report.workspace.display(),
                    "Workspace released on drop"
                );
            }
        }
    }
}
