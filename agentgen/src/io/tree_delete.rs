//! Recursive, descendants-first directory deletion.
//!
//! Entries are removed bottom-up: every file and subdirectory before its
//! parent. An entry whose metadata cannot be read is still deleted, since
//! deleting only needs write access to the parent. A failure to delete
//! anything aborts the walk.

use std::collections::HashSet;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Delete `root` and everything beneath it. Symlinks are removed, never followed.
pub fn delete_tree(root: &Path) -> Result<()> {
    delete_tree_with(root, |_| {})
}

/// Like [`delete_tree`], calling `on_removed` with each path right after it is removed.
pub fn delete_tree_with<F: FnMut(&Path)>(root: &Path, mut on_removed: F) -> Result<()> {
    debug!(root = %root.display(), "deleting tree");
    let mut removed_uninspected: HashSet<PathBuf> = HashSet::new();

    let walker = WalkDir::new(root)
        .follow_links(false)
        .follow_root_links(false)
        .contents_first(true);
    for entry in walker {
        match entry {
            Ok(entry) => {
                let path = entry.path();
                if entry.file_type().is_dir() {
                    match fs::remove_dir(path) {
                        Ok(()) => {}
                        // Already removed when its listing failed.
                        Err(e)
                            if e.kind() == ErrorKind::NotFound
                                && removed_uninspected.contains(path) =>
                        {
                            continue;
                        }
                        Err(e) => {
                            return Err(e)
                                .with_context(|| format!("remove directory {}", path.display()));
                        }
                    }
                } else {
                    fs::remove_file(path)
                        .with_context(|| format!("remove file {}", path.display()))?;
                }
                on_removed(path);
            }
            Err(err) => {
                let Some(path) = err.path().map(Path::to_path_buf) else {
                    return Err(err).with_context(|| format!("walk {}", root.display()));
                };
                warn!(path = %path.display(), err = %err, "cannot inspect entry, deleting anyway");
                remove_uninspected(&path)
                    .with_context(|| format!("remove uninspected {}", path.display()))?;
                on_removed(&path);
                removed_uninspected.insert(path);
            }
        }
    }
    Ok(())
}

/// Remove a path of unknown type: as a file first, then as an empty directory.
fn remove_uninspected(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(file_err) => match fs::remove_dir(path) {
            Ok(()) => Ok(()),
            Err(dir_err) if dir_err.kind() == ErrorKind::NotADirectory => Err(file_err),
            Err(dir_err) => Err(dir_err),
        },
    }
}
