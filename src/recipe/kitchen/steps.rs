// src/recipe/kitchen/steps.rs

//! Build step execution

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, Invocation};
use std::path::Path;
use tracing::info;

const STAGE: &str = "build";

/// Runs a recipe's build steps, in order, from the source root
pub struct StepRunner<'a> {
    runner: &'a dyn CommandRunner,
    shell: &'a str,
}

impl<'a> StepRunner<'a> {
    pub fn new(runner: &'a dyn CommandRunner, shell: &'a str) -> Self {
        Self { runner, shell }
    }

    /// Run every step, stopping at the first failure
    ///
    /// Returns the number of steps run.
    pub fn run(&self, steps: &[String], source_dir: &Path) -> Result<usize> {
        for (i, step) in steps.iter().enumerate() {
            info!("Step {}/{}: {}", i + 1, steps.len(), step);

            let invocation = Invocation::new(self.shell, source_dir)
                .arg("-c")
                .arg(step.as_str());

            self.runner
                .run(STAGE, &invocation)
                .map_err(|failure| Error::BuildStep {
                    index: i + 1,
                    command: step.clone(),
                    failure,
                })?;
        }

        Ok(steps.len())
    }
}
