//! Filesystem-backed workspaces under a shared parent directory
//!
//! Layout: `<root>/<sanitized key>_<unix millis>_<suffix>/{videos,audios,images}`

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::{CleanupReport, ScratchArea, WorkspaceError, WorkspaceLayout, WorkspaceProvider};

/// Strip everything except ASCII alphanumerics, `_` and `-`.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Creates one directory per request under `root`.
#[derive(Debug, Clone)]
pub struct DirWorkspaceProvider {
    root: PathBuf,
}

impl DirWorkspaceProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create a workspace with its standard subdirectories.
    pub fn create(&self, key: &str) -> Result<DirWorkspace, WorkspaceError> {
        let sanitized = sanitize_key(key);
        if sanitized.is_empty() {
            return Err(WorkspaceError::InvalidKey(key.to_string()));
        }

        let millis = chrono::Utc::now().timestamp_millis();
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let dir = self
            .root
            .join(format!("{sanitized}_{millis}_{}", &suffix[..8]));

        let create = |path: &Path| {
            fs::create_dir_all(path).map_err(|source| WorkspaceError::Create {
                path: path.to_path_buf(),
                source,
            })
        };
        create(&dir)?;
        for sub in WorkspaceLayout::new(&dir).subdirs() {
            if let Err(e) = create(&sub) {
                let _ = fs::remove_dir_all(&dir);
                return Err(e);
            }
        }

        info!(workspace = %dir.display(), "Created workspace");
        Ok(DirWorkspace {
            root: dir,
            parent: self.root.clone(),
            key: sanitized,
        })
    }
}

impl WorkspaceProvider for DirWorkspaceProvider {
    fn acquire(&self, key: &str) -> Result<Box<dyn ScratchArea>, WorkspaceError> {
        Ok(Box::new(self.create(key)?))
    }
}

/// One request's scratch directory.
#[derive(Debug)]
pub struct DirWorkspace {
    root: PathBuf,
    parent: PathBuf,
    key: String,
}

impl DirWorkspace {
    pub fn layout(&self) -> WorkspaceLayout {
        WorkspaceLayout::new(&self.root)
    }

    /// The directory must sit directly under the provider root and carry
    /// the key in its name before anything is deleted.
    fn is_safe_to_delete(&self) -> bool {
        let named_for_key = self
            .root
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(&format!("{}_", self.key)));
        named_for_key && self.root.parent() == Some(self.parent.as_path())
    }
}

impl ScratchArea for DirWorkspace {
    fn root(&self) -> &Path {
        &self.root
    }

    fn release(&mut self) -> CleanupReport {
        let mut report = CleanupReport {
            workspace: self.root.clone(),
            key: self.key.clone(),
            ..CleanupReport::default()
        };

        if !self.is_safe_to_delete() {
            let msg = format!(
                "refusing to delete {}: not a workspace for '{}'",
                self.root.display(),
                self.key
            );
            error!("{}", msg);
            report.errors.push(msg);
            return report;
        }

        if self.root.exists() {
            let counted = count_files(&self.root);
            let removed = fs::remove_dir_all(&self.root);
            record_removal(&mut report, counted, removed);
        } else {
            warn!(workspace = %self.root.display(), "Workspace already deleted");
            report.deleted = true;
        }

        report.verified = report.deleted && !self.root.exists();
        if report.verified {
            debug!(
                workspace = %self.root.display(),
                files_deleted = report.files_deleted,
                "Cleanup verified"
            );
        } else {
            error!(workspace = %self.root.display(), "Workspace still present after cleanup");
        }
        report
    }
}

/// A failed file count is logged only; the deletion outcome alone decides
/// whether the report carries errors.
fn record_removal(report: &mut CleanupReport, counted: io::Result<usize>, removed: io::Result<()>) {
    match counted {
        Ok(n) => report.files_deleted = n,
        Err(e) => {
            warn!(
                workspace = %report.workspace.display(),
                error = %e,
                "Failed to count workspace files"
            );
        }
    }
    match removed {
        Ok(()) => report.deleted = true,
        Err(e) => report.errors.push(format!("failed to delete workspace: {e}")),
    }
}

fn count_files(dir: &Path) -> io::Result<usize> {
    let mut total = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            total += count_files(&entry.path())?;
        } else {
            total += 1;
        }
    }
    Ok(total)
}
