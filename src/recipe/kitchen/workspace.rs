// src/recipe/kitchen/workspace.rs

//! The build workspace: a disposable scratch directory for one run
//!
//! The Kitchen builds the handle from its configuration and passes it to each
//! stage, so nothing refers to a fixed global path.

use crate::error::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Name of the checked-out source tree inside the workspace
pub const SOURCE_DIR: &str = "source";

/// Handle to a workspace directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Location of the source tree
    pub fn source_dir(&self) -> PathBuf {
        self.root.join(SOURCE_DIR)
    }

    /// Location of a scratch sibling of the source tree
    pub fn scratch_dir(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}.{}", SOURCE_DIR, name))
    }

    /// Whether a checked-out source tree is present
    pub fn has_source(&self) -> bool {
        self.source_dir().is_dir()
    }

    /// Destroy any previous contents and recreate an empty workspace
    pub fn reset(&self) -> Result<()> {
        debug!("Resetting workspace {}", self.root.display());
        remove_path(&self.root).map_err(|e| Error::workspace(&self.root, e))?;
        fs::create_dir_all(&self.root).map_err(|e| Error::workspace(&self.root, e))?;
        Ok(())
    }
}

/// Remove a file or directory tree; missing paths are fine
pub(crate) fn remove_path(path: &Path) -> io::Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Recursively copy `src` to `dst`, preserving symlinks and file modes
///
/// Returns the number of regular files copied.
pub(crate) fn copy_tree(src: &Path, dst: &Path) -> io::Result<u64> {
    let mut files = 0;

    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(io::Error::other)?;
        let target = dst.join(rel);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            std::os::unix::fs::symlink(link, &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
            files += 1;
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_reset_creates_empty_dir() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path().join("build/workspace"));
        ws.reset().unwrap();
        assert!(ws.path().is_dir());
        assert_eq!(fs::read_dir(ws.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_reset_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let ws = Workspace::new(tmp.path().join("ws"));

        fs::create_dir_all(ws.source_dir().join("nested")).unwrap();
        fs::write(ws.source_dir().join("nested/file.c"), "int x;").unwrap();
        fs::write(ws.path().join("stale.log"), "old").unwrap();

        for _ in 0..2 {
            ws.reset().unwrap();
            assert!(ws.path().is_dir());
            assert_eq!(fs::read_dir(ws.path()).unwrap().count(), 0);
        }
        assert!(!ws.has_source());
    }

    #[test]
    fn test_remove_path_missing_is_ok() {
        let tmp = TempDir::new().unwrap();
        assert!(remove_path(&tmp.path().join("nope")).is_ok());
    }

    #[test]
    fn test_copy_tree() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        fs::create_dir_all(src.join("a/b")).unwrap();
        fs::create_dir_all(src.join("empty")).unwrap();
        fs::write(src.join("top.txt"), "top").unwrap();
        fs::write(src.join("a/b/deep.txt"), "deep").unwrap();
        std::os::unix::fs::symlink("top.txt", src.join("link")).unwrap();

        let dst = tmp.path().join("dst");
        let copied = copy_tree(&src, &dst).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.join("a/b/deep.txt")).unwrap(), "deep");
        assert!(dst.join("empty").is_dir());
        assert_eq!(fs::read_link(dst.join("link")).unwrap(), PathBuf::from("top.txt"));
        // Source is left alone
        assert!(src.join("top.txt").exists());
    }
}
