// src/recipe/kitchen/cook.rs

//! Cook: one pass of the build pipeline for a single recipe
//!
//! A cook moves strictly forward through
//! `Init → RecipeLoaded → WorkspaceReady → SourceAcquired → PatchesApplied →
//! StepsComplete → Packaged`. The first failing stage moves it to
//! `Failed(stage)` and nothing after it runs. There are no retries and no
//! resume across runs.

use crate::error::Error;
use crate::recipe::kitchen::acquire::SourceAcquirer;
use crate::recipe::kitchen::package::{ImageDescriptor, Packager};
use crate::recipe::kitchen::patch::PatchApplier;
use crate::recipe::kitchen::steps::StepRunner;
use crate::recipe::kitchen::Kitchen;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A pipeline stage, each with its own failure kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    LoadRecipe,
    ResetWorkspace,
    Acquire,
    Patch,
    Build,
    Package,
}

impl Stage {
    /// Get all stages in order
    pub fn all() -> &'static [Stage] {
        &[
            Self::LoadRecipe,
            Self::ResetWorkspace,
            Self::Acquire,
            Self::Patch,
            Self::Build,
            Self::Package,
        ]
    }

    /// Get a human-readable name for the stage
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadRecipe => "load recipe",
            Self::ResetWorkspace => "reset workspace",
            Self::Acquire => "acquire source",
            Self::Patch => "apply patches",
            Self::Build => "run build steps",
            Self::Package => "package image",
        }
    }

    /// State the pipeline reaches when this stage succeeds
    pub fn reached(&self) -> PipelineState {
        match self {
            Self::LoadRecipe => PipelineState::RecipeLoaded,
            Self::ResetWorkspace => PipelineState::WorkspaceReady,
            Self::Acquire => PipelineState::SourceAcquired,
            Self::Patch => PipelineState::PatchesApplied,
            Self::Build => PipelineState::StepsComplete,
            Self::Package => PipelineState::Packaged,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Where a cook is in the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Init,
    RecipeLoaded,
    WorkspaceReady,
    SourceAcquired,
    PatchesApplied,
    StepsComplete,
    /// Terminal success
    Packaged,
    /// Terminal failure in the given stage
    Failed(Stage),
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Packaged | Self::Failed(_))
    }

    fn rank(&self) -> u8 {
        match self {
            Self::Init => 0,
            Self::RecipeLoaded => 1,
            Self::WorkspaceReady => 2,
            Self::SourceAcquired => 3,
            Self::PatchesApplied => 4,
            Self::StepsComplete => 5,
            Self::Packaged | Self::Failed(_) => 6,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(stage) => write!(f, "Failed({})", stage),
            other => write!(f, "{:?}", other),
        }
    }
}

/// A failed cook: the stage that broke and why
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed")]
pub struct CookFailure {
    pub stage: Stage,
    #[source]
    pub error: Error,
}

impl CookFailure {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        self.error.exit_code()
    }
}

/// Result of a successful cook
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// The tagged image that was built
    pub image: ImageDescriptor,
    /// Upstream ref the source was checked out at
    pub checkout_ref: String,
    /// Patches applied, in application order
    pub patches: Vec<String>,
    /// Number of build steps run
    pub steps_run: usize,
    /// Validation warnings from the recipe
    pub warnings: Vec<String>,
    /// Wall-clock time for the whole cook
    pub duration: Duration,
}

/// A single cook operation
pub struct Cook<'a> {
    kitchen: &'a Kitchen,
    name: &'a str,
    state: PipelineState,
    started: Instant,
}

impl<'a> Cook<'a> {
    pub(super) fn new(kitchen: &'a Kitchen, name: &'a str) -> Self {
        Self {
            kitchen,
            name,
            state: PipelineState::Init,
            started: Instant::now(),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) {
        debug_assert!(!self.state.is_terminal(), "cook already finished");
        debug_assert!(next.rank() > self.state.rank(), "pipeline cannot move backwards");
        debug!("{}: {} -> {}", self.name, self.state, next);
        self.state = next;
    }

    /// Run one stage, recording the transition it causes
    fn stage<T>(
        &mut self,
        stage: Stage,
        work: impl FnOnce() -> crate::Result<T>,
    ) -> Result<T, CookFailure> {
        let outcome = if self.kitchen.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            info!("==> {}", stage);
            work()
        };

        match outcome {
            Ok(value) => {
                self.transition(stage.reached());
                Ok(value)
            }
            Err(error) => {
                self.transition(PipelineState::Failed(stage));
                match error.command_failure() {
                    Some(failure) => error!("{} failed ({}): {}", stage, failure, error),
                    None => error!("{} failed: {}", stage, error),
                }
                Err(CookFailure { stage, error })
            }
        }
    }

    /// Drive the pipeline to a terminal state
    pub(super) fn run(&mut self) -> Result<BuildReport, CookFailure> {
        let kitchen = self.kitchen;
        let config = &kitchen.config;
        let runner = kitchen.runner.as_ref();
        let tools = &config.tools;
        let name = self.name;

        info!("Building package: {}", name);

        let (recipe, warnings) = self.stage(Stage::LoadRecipe, || kitchen.load(name))?;
        for warning in &warnings {
            warn!("{}: {}", name, warning);
        }

        let image_dir = config.image_dir(name);
        if !image_dir.is_dir() {
            warn!("Image definition directory {} does not exist", image_dir.display());
        }

        let workspace = config.workspace();
        self.stage(Stage::ResetWorkspace, || workspace.reset())?;

        let source_dir = self.stage(Stage::Acquire, || {
            SourceAcquirer::new(runner, &tools.git).acquire(&recipe, &workspace)
        })?;

        let patches = self.stage(Stage::Patch, || {
            PatchApplier::new(runner, &tools.git).apply(&image_dir, &workspace)
        })?;

        let steps_run = self.stage(Stage::Build, || {
            StepRunner::new(runner, &tools.shell).run(&recipe.build.steps, &source_dir)
        })?;

        let image = self.stage(Stage::Package, || {
            Packager::new(runner, &tools.docker, &config.namespace, &config.image_descriptor)
                .package(&recipe, &image_dir, &workspace)
        })?;

        let duration = self.started.elapsed();
        info!("Built image {} in {:.1}s", image, duration.as_secs_f64());

        Ok(BuildReport {
            image,
            checkout_ref: recipe.checkout_ref(),
            patches,
            steps_run,
            warnings,
            duration,
        })
    }
}
