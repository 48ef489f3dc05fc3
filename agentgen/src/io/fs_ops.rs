//! Byte-exact file copy and directory relocation used while staging.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::Path;

use anyhow::{Context, Result, bail};

/// Copy the whole content of `source` into `dest`, returning the bytes copied.
///
/// `dest` is created empty when missing and truncated otherwise. On failure
/// `dest` may be left partially written.
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64> {
    if !dest.exists() {
        File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    }

    let mut src = File::open(source).with_context(|| format!("open {}", source.display()))?;
    let expected = src
        .metadata()
        .with_context(|| format!("stat {}", source.display()))?
        .len();
    let mut dst = OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(dest)
        .with_context(|| format!("open {}", dest.display()))?;

    let copied = io::copy(&mut src, &mut dst)
        .with_context(|| format!("copy {} to {}", source.display(), dest.display()))?;
    if copied != expected {
        bail!(
            "short copy {} to {}: {} of {} bytes",
            source.display(),
            dest.display(),
            copied,
            expected
        );
    }
    Ok(copied)
}

/// Move a directory with a single rename. Both paths must be on the same filesystem.
pub fn move_dir(source: &Path, dest: &Path) -> Result<()> {
    fs::rename(source, dest)
        .with_context(|| format!("move {} to {}", source.display(), dest.display()))
}

/// Reuse `path` if it is already a directory, otherwise create it.
///
/// Fails when `path` exists but is not a directory.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }
    fs::create_dir(path).with_context(|| format!("create directory {}", path.display()))
}

/// Remove `path` if it exists. Returns whether a file was removed.
pub fn remove_file_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err).with_context(|| format!("remove {}", path.display())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_empty_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("empty.xml");
        let dest = temp.path().join("copy.xml");
        fs::write(&source, b"").expect("write");

        let copied = copy_file(&source, &dest).expect("copy");
        assert_eq!(copied, 0);
        assert_eq!(fs::read(&dest).expect("read"), b"");
    }

    #[test]
    fn copies_binary_content_exactly() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("Monitor.class");
        let dest = temp.path().join("copy.class");
        let content: Vec<u8> = (0..=255u8).cycle().take(70_000).collect();
        fs::write(&source, &content).expect("write");

        let copied = copy_file(&source, &dest).expect("copy");
        assert_eq!(copied, content.len() as u64);
        assert_eq!(fs::read(&dest).expect("read"), content);
    }

    #[test]
    fn overwrites_longer_destination() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("MANIFEST.MF");
        let dest = temp.path().join("existing.MF");
        fs::write(&source, b"Manifest-Version: 1.0\n").expect("write");
        fs::write(&dest, vec![b'x'; 4096]).expect("write");

        copy_file(&source, &dest).expect("copy");
        assert_eq!(fs::read(&dest).expect("read"), b"Manifest-Version: 1.0\n");
    }

    #[test]
    fn missing_source_fails() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = copy_file(&temp.path().join("absent"), &temp.path().join("dest")).unwrap_err();
        assert!(format!("{err:#}").contains("absent"));
    }

    #[test]
    fn move_dir_transfers_whole_tree() {
        let temp = tempfile::tempdir().expect("tempdir");
        let source = temp.path().join("mop");
        fs::create_dir_all(source.join("nested")).expect("mkdir");
        fs::write(source.join("nested").join("A.class"), b"cafe").expect("write");
        let dest = temp.path().join("ws").join("mop");
        fs::create_dir(temp.path().join("ws")).expect("mkdir");

        move_dir(&source, &dest).expect("move");
        assert!(!source.exists());
        assert_eq!(
            fs::read(dest.join("nested").join("A.class")).expect("read"),
            b"cafe"
        );
    }

    #[test]
    fn ensure_dir_reuses_existing_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let dir = temp.path().join("META-INF");
        ensure_dir(&dir).expect("create");
        fs::write(dir.join("keep"), b"1").expect("write");
        ensure_dir(&dir).expect("reuse");
        assert!(dir.join("keep").exists());
    }

    #[test]
    fn ensure_dir_rejects_plain_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("META-INF");
        fs::write(&path, b"not a dir").expect("write");
        assert!(ensure_dir(&path).is_err());
    }

    #[test]
    fn remove_file_if_exists_tolerates_missing_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("aop-ajc.xml");
        assert!(!remove_file_if_exists(&path).expect("missing"));

        fs::write(&path, b"<old/>").expect("write");
        assert!(remove_file_if_exists(&path).expect("remove"));
        assert!(!path.exists());
    }

    #[test]
    fn remove_file_if_exists_rejects_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("aop-ajc.xml");
        fs::create_dir(&path).expect("mkdir");
        assert!(remove_file_if_exists(&path).is_err());
    }
}
