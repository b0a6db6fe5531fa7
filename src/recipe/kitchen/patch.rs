// src/recipe/kitchen/patch.rs

//! Patch application
//!
//! Patches live in `<image-dir>/patches/*.patch` and are applied in lexical
//! filename order. They go onto a throwaway copy of the source tree which is
//! swapped in only after every patch applied; a rejected patch leaves the
//! acquired tree exactly as it was.

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::recipe::kitchen::workspace::{copy_tree, remove_path, Workspace};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const STAGE: &str = "patch";

/// Directory inside an image definition that holds patches
pub const PATCHES_DIR: &str = "patches";

/// Scratch name the patched copy is built under
const SCRATCH: &str = "patching";

/// List the patch files for an image, sorted by file name
///
/// A missing patches directory yields an empty list.
pub fn discover_patches(image_dir: &Path) -> Result<Vec<PathBuf>> {
    let patches_dir = image_dir.join(PATCHES_DIR);
    if !patches_dir.is_dir() {
        debug!("No patches directory at {}", patches_dir.display());
        return Ok(Vec::new());
    }

    let io_err = |e: std::io::Error| Error::Io {
        context: format!("Failed to read patches directory {}", patches_dir.display()),
        source: e,
    };

    let mut patches = Vec::new();
    for entry in fs::read_dir(&patches_dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "patch") {
            patches.push(path);
        }
    }
    patches.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(patches)
}

/// Applies an image's local patches to the workspace source tree
pub struct PatchApplier<'a> {
    runner: &'a dyn CommandRunner,
    git: &'a str,
}

impl<'a> PatchApplier<'a> {
    pub fn new(runner: &'a dyn CommandRunner, git: &'a str) -> Self {
        Self { runner, git }
    }

    /// Apply every patch for `image_dir`, returning the applied file names
    pub fn apply(&self, image_dir: &Path, workspace: &Workspace) -> Result<Vec<String>> {
        let patches = discover_patches(image_dir)?;
        if patches.is_empty() {
            return Ok(Vec::new());
        }

        info!("Applying {} patch(es)...", patches.len());

        // git runs inside the scratch tree, so hand it absolute paths
        let mut resolved = Vec::with_capacity(patches.len());
        for patch in &patches {
            let name = patch
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let path = fs::canonicalize(patch).map_err(|e| Error::Io {
                context: format!("Failed to resolve patch {}", patch.display()),
                source: e,
            })?;
            resolved.push((name, path));
        }

        let source_dir = workspace.source_dir();
        let scratch = workspace.scratch_dir(SCRATCH);
        remove_path(&scratch).map_err(|e| Error::workspace(&scratch, e))?;
        copy_tree(&source_dir, &scratch).map_err(|e| {
            let _ = remove_path(&scratch);
            Error::workspace(&scratch, e)
        })?;

        let mut applied = Vec::with_capacity(resolved.len());
        for (name, path) in resolved {
            info!("Applying patch: {}", name);
            let invocation = Invocation::new(self.git, &scratch)
                .arg("apply")
                .arg(path.to_string_lossy());

            if let Err(failure) = self.runner.run(STAGE, &invocation) {
                let _ = remove_path(&scratch);
                return Err(Error::PatchApplication {
                    patch: name,
                    failure,
                });
            }
            applied.push(name);
        }

        remove_path(&source_dir).map_err(|e| Error::workspace(&source_dir, e))?;
        fs::rename(&scratch, &source_dir).map_err(|e| Error::workspace(&source_dir, e))?;

        Ok(applied)
    }
}
