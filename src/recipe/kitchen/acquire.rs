// src/recipe/kitchen/acquire.rs

//! Source acquisition: clone upstream and check out the pinned ref
//!
//! The clone lands in a staging directory next to the final source tree and
//! is only renamed into place once the checkout succeeded, so a failed fetch
//! never leaves a half-usable tree behind.

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::recipe::format::Recipe;
use crate::recipe::kitchen::workspace::{remove_path, Workspace, SOURCE_DIR};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

const STAGE: &str = "acquire";

/// Scratch name the clone is staged under
pub const STAGING: &str = "partial";

/// Fetches upstream source into a workspace
pub struct SourceAcquirer<'a> {
    runner: &'a dyn CommandRunner,
    git: &'a str,
}

impl<'a> SourceAcquirer<'a> {
    pub fn new(runner: &'a dyn CommandRunner, git: &'a str) -> Self {
        Self { runner, git }
    }

    /// Produce `<workspace>/source` checked out at the recipe's ref
    pub fn acquire(&self, recipe: &Recipe, workspace: &Workspace) -> Result<PathBuf> {
        let source_dir = workspace.source_dir();
        let staging_name = format!("{}.{}", SOURCE_DIR, STAGING);
        let staging = workspace.path().join(&staging_name);

        for stale in [source_dir.as_path(), staging.as_path()] {
            remove_path(stale).map_err(|e| Error::workspace(stale, e))?;
        }

        let checkout_ref = recipe.checkout_ref();
        info!(
            "Cloning {} (version {})",
            recipe.upstream.repo, recipe.version
        );

        let clone = Invocation::new(self.git, workspace.path())
            .arg("clone")
            .arg(recipe.upstream.repo.as_str())
            .arg(staging_name);
        self.run_or_discard(&clone, &staging)?;

        info!("Checking out {}", checkout_ref);
        let checkout = Invocation::new(self.git, &staging)
            .arg("checkout")
            .arg(checkout_ref);
        self.run_or_discard(&checkout, &staging)?;

        fs::rename(&staging, &source_dir).map_err(|e| {
            let _ = remove_path(&staging);
            Error::workspace(&source_dir, e)
        })?;

        Ok(source_dir)
    }

    fn run_or_discard(&self, invocation: &Invocation, staging: &Path) -> Result<()> {
        self.runner.run(STAGE, invocation).map_err(|failure| {
            let _ = remove_path(staging);
            Error::Acquisition {
                command: invocation.to_string(),
                failure,
            }
        })
    }
}
