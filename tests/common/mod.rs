// tests/common/mod.rs

//! Common test utilities for integration tests
//!
//! `FakeRunner` stands in for git and docker so the pipeline can be driven
//! without network access or a container daemon. Build steps still run
//! through a real shell.

#![allow(dead_code)]

use helmhub_builder::recipe::kitchen::Workspace;
use helmhub_builder::{CommandFailure, CommandRunner, Invocation, Kitchen, KitchenConfig};
use helmhub_builder::{CancelToken, ProcessRunner};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Marker file the fake `git apply` appends each patch name to
pub const APPLIED_LOG: &str = "APPLIED";

/// A command seen by the fake runner
#[derive(Debug, Clone)]
pub struct Call {
    pub stage: String,
    pub invocation: Invocation,
}

/// Runner that simulates git and docker and records every invocation
#[derive(Default)]
pub struct FakeRunner {
    calls: Mutex<Vec<Call>>,
    clone_failure: Option<i32>,
    patch_failure: Option<(String, i32)>,
    image_build_failure: Option<i32>,
    cancel_on_clone: Mutex<Option<CancelToken>>,
    shell: ProcessRunner,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `git clone` exit with `code`
    pub fn failing_clone(mut self, code: i32) -> Self {
        self.clone_failure = Some(code);
        self
    }

    /// Make `git apply` of the named patch exit with `code`
    pub fn failing_patch(mut self, patch: &str, code: i32) -> Self {
        self.patch_failure = Some((patch.to_string(), code));
        self
    }

    /// Make `docker build` exit with `code`
    pub fn failing_image_build(mut self, code: i32) -> Self {
        self.image_build_failure = Some(code);
        self
    }

    /// Cancel `token` while the clone is "running"
    pub fn cancel_during_clone(&self, token: CancelToken) {
        *self.cancel_on_clone.lock().unwrap() = Some(token);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Invocations of `program`, in call order
    pub fn invocations_of(&self, program: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|call| call.invocation.program == program)
            .map(|call| call.invocation)
            .collect()
    }

    fn git(&self, invocation: &Invocation) -> Result<(), CommandFailure> {
        let args = &invocation.args;
        match args.first().map(String::as_str) {
            Some("clone") => {
                if let Some(token) = self.cancel_on_clone.lock().unwrap().as_ref() {
                    token.cancel();
                }
                if let Some(code) = self.clone_failure {
                    return Err(CommandFailure::Exit(code));
                }
                let target = invocation.cwd.join(&args[2]);
                fs::create_dir_all(target.join(".git")).map_err(CommandFailure::Io)?;
                fs::create_dir_all(target.join("src")).map_err(CommandFailure::Io)?;
                fs::write(target.join("README"), "upstream\n").map_err(CommandFailure::Io)?;
                fs::write(target.join("src/main.c"), "int main(void) { return 0; }\n")
                    .map_err(CommandFailure::Io)?;
                Ok(())
            }
            Some("checkout") => fs::write(invocation.cwd.join(".git/HEAD"), &args[1])
                .map_err(CommandFailure::Io),
            Some("apply") => {
                let name = Path::new(&args[1])
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if let Some((failing, code)) = &self.patch_failure {
                    if *failing == name {
                        return Err(CommandFailure::Exit(*code));
                    }
                }
                let log = invocation.cwd.join(APPLIED_LOG);
                let mut content = fs::read_to_string(&log).unwrap_or_default();
                content.push_str(&name);
                content.push('\n');
                fs::write(log, content).map_err(CommandFailure::Io)
            }
            _ => Err(CommandFailure::Exit(1)),
        }
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, stage: &str, invocation: &Invocation) -> Result<(), CommandFailure> {
        self.calls.lock().unwrap().push(Call {
            stage: stage.to_string(),
            invocation: invocation.clone(),
        });

        match invocation.program.as_str() {
            "git" => self.git(invocation),
            "docker" => match self.image_build_failure {
                Some(code) => Err(CommandFailure::Exit(code)),
                None => Ok(()),
            },
            _ => self.shell.run(stage, invocation),
        }
    }
}

/// A project layout in a temporary directory
pub struct Fixture {
    pub dir: TempDir,
    pub config: KitchenConfig,
}

impl Fixture {
    /// Create empty `recipes/` and `images/` directories
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("recipes")).unwrap();
        fs::create_dir_all(root.join("images")).unwrap();

        let config = KitchenConfig {
            recipes_dir: root.join("recipes"),
            images_dir: root.join("images"),
            workspace_dir: root.join("build/workspace"),
            timeout_secs: 60,
            ..Default::default()
        };

        Self { dir, config }
    }

    /// Write `recipes/<name>.yaml`
    pub fn recipe(&self, name: &str, content: &str) {
        fs::write(self.config.recipes_dir.join(format!("{}.yaml", name)), content).unwrap();
    }

    /// Create `images/<name>/` with a Dockerfile
    pub fn image(&self, name: &str) -> PathBuf {
        let dir = self.config.image_dir(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("Dockerfile"), "FROM scratch\nCOPY source /src\n").unwrap();
        dir
    }

    /// Write `images/<image>/patches/<file>`
    pub fn patch(&self, image: &str, file: &str) {
        let dir = self.config.image_dir(image).join("patches");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), format!("--- a/{0}\n+++ b/{0}\n", file)).unwrap();
    }

    pub fn workspace(&self) -> Workspace {
        self.config.workspace()
    }

    pub fn kitchen(&self, runner: &Arc<FakeRunner>) -> Kitchen {
        let runner: Arc<dyn CommandRunner> = runner.clone();
        Kitchen::with_runner(self.config.clone(), runner)
    }
}

/// Recipe for `foo` 1.2.0 tagged `v1.2.0` upstream
pub fn foo_recipe(steps: &[&str]) -> String {
    let mut yaml = String::from(
        "version: \"1.2.0\"\n\
         upstream:\n  repo: https://example.invalid/foo.git\n  tagPrefix: v\n\
         build:\n  steps:",
    );
    if steps.is_empty() {
        yaml.push_str(" []\n");
    } else {
        yaml.push('\n');
    }
    for step in steps {
        yaml.push_str(&format!("    - \"{}\"\n", step));
    }
    yaml
}

/// Relative path to contents for every regular file under `root`
pub fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read(entry.path()).unwrap())
        })
        .collect()
}
