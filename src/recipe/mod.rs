// src/recipe/mod.rs

//! Recipe system for building container images from upstream source
//!
//! A recipe pins an upstream repository at a version and lists the shell
//! commands that turn it into something worth packaging. Each recipe has a
//! matching image definition directory holding the image build descriptor
//! and an optional `patches/` directory.
//!
//! # Culinary Terminology
//!
//! - **Recipe**: the build description for one image
//! - **Kitchen**: the pipeline controller that cooks a recipe
//! - **Workspace**: the disposable scratch area for one cook
//! - **Prep**: fetch the pinned source and apply patches
//! - **Simmer**: run the build steps
//! - **Plate**: copy the result into the image context and build the image

mod format;
pub mod kitchen;
pub mod parser;

pub use format::{BuildSection, Recipe, TagPrefix, Upstream};
pub use kitchen::{BuildReport, CookFailure, ImageDescriptor, Kitchen, KitchenConfig};
pub use parser::{parse_recipe, parse_recipe_file, validate_recipe, RecipeLoader};
