//! Temporary staging workspace that accumulates the archive's content.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::core::naming::WORKSPACE_PREFIX;
use crate::io::tree_delete::delete_tree;

/// Uniquely named directory under the output directory, owned by one build.
///
/// The directory is deleted with [`delete_tree`] when the guard is closed or
/// dropped, so every exit path after creation (early return, `?`, panic)
/// removes it.
#[derive(Debug)]
pub struct StagingWorkspace {
    path: PathBuf,
    armed: bool,
}

impl StagingWorkspace {
    /// Create `<parent>/agent-jar<random>`.
    pub fn create(parent: &Path) -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(parent)
            .with_context(|| format!("create staging workspace in {}", parent.display()))?;
        let path = dir.keep();
        debug!(path = %path.display(), "staging workspace created");
        Ok(Self { path, armed: true })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the workspace, reporting any failure to the caller.
    pub fn close(mut self) -> Result<()> {
        self.armed = false;
        delete_tree(&self.path)
            .with_context(|| format!("delete staging workspace {}", self.path.display()))
    }
}

impl Drop for StagingWorkspace {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = delete_tree(&self.path) {
            warn!(path = %self.path.display(), err = %format!("{err:#}"), "failed to delete staging workspace");
        }
    }
}
