//! Exclusive per-output-directory build lock.
//!
//! Two builds into the same output directory would race on `mop/` and on the
//! weave descriptor, so a build holds `<output_dir>/.agentgen.lock` for its
//! whole duration. The file is created with `create_new`, which fails if it
//! already exists.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

pub const LOCK_FILE: &str = ".agentgen.lock";

/// Held lock; the lock file is removed on drop.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
}

impl BuildLock {
    /// Try to take the lock for `dir`. Returns `Ok(None)` if another build holds it.
    pub fn acquire(dir: &Path) -> Result<Option<Self>> {
        let path = lock_path(dir);
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!(path = %path.display(), "build lock already held");
                return Ok(None);
            }
            Err(e) => return Err(e).with_context(|| format!("create {}", path.display())),
        };
        let lock = Self { path };
        writeln!(file, "{}", std::process::id())
            .with_context(|| format!("write {}", lock.path.display()))?;
        debug!(path = %lock.path.display(), "build lock acquired");
        Ok(Some(lock))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for BuildLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), err = %e, "failed to release build lock");
        }
    }
}

/// Lock file location for `dir`.
pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE)
}
