// src/recipe/format.rs

//! Recipe file format definitions
//!
//! Recipes are YAML files, one per image, keyed by the image name:
//!
//! ```yaml
//! version: "1.2.0"
//! upstream:
//!   repo: https://example/foo.git
//!   tagPrefix: v
//! build:
//!   steps:
//!     - make
//!     - make install
//! ```

use serde::{Deserialize, Serialize};

/// A complete recipe for building one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Recipe {
    /// Image name the recipe was loaded under (not part of the file)
    #[serde(skip)]
    pub name: String,

    /// Upstream tag or ref identifier to build
    pub version: String,

    /// Where the source comes from
    pub upstream: Upstream,

    /// Build instructions
    pub build: BuildSection,
}

impl Recipe {
    /// The ref checked out from upstream: tag prefix followed by version
    pub fn checkout_ref(&self) -> String {
        self.upstream.tag_prefix.apply(&self.version)
    }
}

/// Upstream repository section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Upstream {
    /// Fetchable repository URL
    pub repo: String,

    /// Prefix prepended to the version to form the checkout ref
    #[serde(default, rename = "tagPrefix")]
    pub tag_prefix: TagPrefix,
}

/// How the checkout ref is derived from the recipe version
///
/// An absent or empty `tagPrefix` field is [`TagPrefix::None`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum TagPrefix {
    /// The version is the ref
    #[default]
    None,
    /// The ref is this prefix followed by the version
    Prefix(String),
}

impl TagPrefix {
    pub fn apply(&self, version: &str) -> String {
        match self {
            Self::None => version.to_string(),
            Self::Prefix(prefix) => format!("{}{}", prefix, version),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Prefix(prefix) => Some(prefix),
        }
    }
}

impl From<Option<String>> for TagPrefix {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(prefix) if !prefix.is_empty() => Self::Prefix(prefix),
            _ => Self::None,
        }
    }
}

impl From<TagPrefix> for Option<String> {
    fn from(value: TagPrefix) -> Self {
        match value {
            TagPrefix::None => None,
            TagPrefix::Prefix(prefix) => Some(prefix),
        }
    }
}

/// Build instructions section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildSection {
    /// Shell commands, run in order from the source root
    pub steps: Vec<String>,
}
