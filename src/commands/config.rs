// src/commands/config.rs

//! Builder configuration resolution
//!
//! Precedence, lowest to highest: built-in defaults, the configuration file,
//! command-line flags. Without `--config` the file is `./helmhub.toml` if it
//! exists, else `<config dir>/helmhub/builder.toml` (e.g.
//! `~/.config/helmhub/builder.toml`).

use anyhow::{Context, Result};
use helmhub_builder::KitchenConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration file looked up in the current directory
const LOCAL_CONFIG: &str = "helmhub.toml";

/// Values given on the command line
#[derive(Debug, Default)]
pub struct ConfigOverrides {
    pub recipes_dir: Option<PathBuf>,
    pub images_dir: Option<PathBuf>,
    pub workspace_dir: Option<PathBuf>,
    pub namespace: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    fn apply(self, config: &mut KitchenConfig) {
        if let Some(dir) = self.recipes_dir {
            config.recipes_dir = dir;
        }
        if let Some(dir) = self.images_dir {
            config.images_dir = dir;
        }
        if let Some(dir) = self.workspace_dir {
            config.workspace_dir = dir;
        }
        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout_secs = secs;
        }
    }
}

/// Per-user configuration file, relative to the platform config directory
const USER_CONFIG: &str = "helmhub/builder.toml";

/// Find the configuration file to use when none was given explicitly
///
/// `./helmhub.toml` wins, then `<config dir>/helmhub/builder.toml`.
fn default_config_path() -> Option<PathBuf> {
    find_config(Path::new(LOCAL_CONFIG), dirs::config_dir().as_deref())
}

fn find_config(local: &Path, user_config_dir: Option<&Path>) -> Option<PathBuf> {
    if local.is_file() {
        return Some(local.to_path_buf());
    }

    user_config_dir
        .map(|dir| dir.join(USER_CONFIG))
        .filter(|path| path.is_file())
}

/// Build the effective configuration
pub fn resolve_config(explicit: Option<&Path>, overrides: ConfigOverrides) -> Result<KitchenConfig> {
    let path = explicit.map(Path::to_path_buf).or_else(default_config_path);

    let mut config = match &path {
        Some(path) => {
            debug!("Loading configuration from {}", path.display());
            KitchenConfig::from_file(path)
                .with_context(|| format!("Failed to load configuration: {}", path.display()))?
        }
        None => KitchenConfig::default(),
    };

    overrides.apply(&mut config);

    if config.namespace.trim().is_empty() {
        anyhow::bail!("Image namespace cannot be empty");
    }

    Ok(config)
}
