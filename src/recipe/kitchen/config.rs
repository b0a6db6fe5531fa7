// src/recipe/kitchen/config.rs

//! Configuration types for the Kitchen
//!
//! Defaults match the conventional project layout (`recipes/`, `images/`,
//! `build/workspace`). A TOML file may override any subset:
//!
//! ```toml
//! namespace = "helmhub"
//! recipes_dir = "recipes"
//! images_dir = "images"
//! workspace_dir = "build/workspace"
//! timeout_secs = 3600
//!
//! [tools]
//! git = "git"
//! docker = "docker"
//! shell = "sh"
//! ```

use crate::error::{Error, Result};
use crate::recipe::kitchen::workspace::Workspace;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// External tool names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolsSection {
    /// Version-control client, also used for `apply`
    pub git: String,
    /// Image build tool
    pub docker: String,
    /// Shell used to run build steps with `-c`
    pub shell: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            docker: "docker".to_string(),
            shell: "sh".to_string(),
        }
    }
}

/// Configuration for the Kitchen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KitchenConfig {
    /// Directory holding `<image>.yaml` recipes
    pub recipes_dir: PathBuf,
    /// Directory holding one image definition directory per image
    pub images_dir: PathBuf,
    /// Scratch directory, wiped at the start of every run
    pub workspace_dir: PathBuf,
    /// Image namespace used in the produced tag
    pub namespace: String,
    /// Image build descriptor expected in each image directory
    pub image_descriptor: String,
    /// Per-command timeout in seconds (0 = no limit)
    pub timeout_secs: u64,
    /// External tools
    pub tools: ToolsSection,
}

impl Default for KitchenConfig {
    fn default() -> Self {
        Self {
            recipes_dir: PathBuf::from("recipes"),
            images_dir: PathBuf::from("images"),
            workspace_dir: PathBuf::from("build/workspace"),
            namespace: "helmhub".to_string(),
            image_descriptor: "Dockerfile".to_string(),
            timeout_secs: 3600, // 1 hour
            tools: ToolsSection::default(),
        }
    }
}

impl KitchenConfig {
    /// Parse a configuration from a TOML string
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        config.validate(path)?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, path)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidConfig {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        if self.namespace.trim().is_empty() {
            return Err(invalid("namespace cannot be empty"));
        }
        if self.image_descriptor.trim().is_empty() {
            return Err(invalid("image_descriptor cannot be empty"));
        }
        let tools = &self.tools;
        if [&tools.git, &tools.docker, &tools.shell]
            .iter()
            .any(|t| t.trim().is_empty())
        {
            return Err(invalid("tool names cannot be empty"));
        }
        Ok(())
    }

    /// Per-command timeout, `None` when disabled
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    /// Image definition directory for an image
    pub fn image_dir(&self, name: &str) -> PathBuf {
        self.images_dir.join(name)
    }

    /// Workspace handle for a run
    pub fn workspace(&self) -> Workspace {
        Workspace::new(&self.workspace_dir)
    }
}
