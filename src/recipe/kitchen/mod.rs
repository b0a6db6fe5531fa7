// src/recipe/kitchen/mod.rs

//! Kitchen: the pipeline controller for cooking recipes into images
//!
//! The Kitchen sequences the build stages for one named recipe:
//! - Load and validate the recipe
//! - Reset the workspace
//! - Acquire the pinned upstream source
//! - Apply the image's local patches
//! - Run the recipe's build steps
//! - Copy the result into the image context and build the image
//!
//! It stops at the first failing stage and reports which one broke.

mod acquire;
mod config;
mod cook;
mod package;
pub mod patch;
mod steps;
pub mod workspace;

pub use acquire::SourceAcquirer;
pub use config::{KitchenConfig, ToolsSection};
pub use cook::{BuildReport, Cook, CookFailure, PipelineState, Stage};
pub use package::{ImageDescriptor, Packager};
pub use patch::{discover_patches, PatchApplier};
pub use steps::StepRunner;
pub use workspace::Workspace;

use crate::error::Result;
use crate::exec::{CancelToken, CommandRunner, ProcessRunner};
use crate::recipe::format::Recipe;
use crate::recipe::parser::RecipeLoader;
use std::sync::Arc;
use tracing::info;

/// The Kitchen: where recipes are cooked
pub struct Kitchen {
    pub(crate) config: KitchenConfig,
    runner: Arc<dyn CommandRunner>,
    cancel: CancelToken,
}

impl Kitchen {
    /// Create a new Kitchen that runs real processes
    pub fn new(config: KitchenConfig) -> Self {
        let cancel = CancelToken::new();
        let runner = Arc::new(ProcessRunner::new(config.timeout(), cancel.clone()));
        Self {
            config,
            runner,
            cancel,
        }
    }

    /// Create a new Kitchen with a custom command runner
    pub fn with_runner(config: KitchenConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            config,
            runner,
            cancel: CancelToken::new(),
        }
    }

    /// Create a Kitchen with default configuration
    pub fn with_defaults() -> Self {
        Self::new(KitchenConfig::default())
    }

    pub fn config(&self) -> &KitchenConfig {
        &self.config
    }

    /// Token that aborts a running cook when cancelled
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Load and validate a recipe by name, returning it with its warnings
    pub fn load(&self, name: &str) -> Result<(Recipe, Vec<String>)> {
        RecipeLoader::new(&self.config.recipes_dir).load(name)
    }

    /// Cook a recipe into a tagged image
    ///
    /// This is the main entry point. Exactly one image is built per call.
    pub fn cook(&self, name: &str) -> std::result::Result<BuildReport, CookFailure> {
        info!(
            "Cooking {} (workspace {})",
            name,
            self.config.workspace_dir.display()
        );
        Cook::new(self, name).run()
    }
}
