// src/lib.rs

//! HelmHub image builder
//!
//! Builds one container image per invocation from a named recipe: fetch the
//! pinned upstream revision, apply local patches, run the recipe's build
//! steps, then package the tree with the image build tool.
//!
//! # Architecture
//!
//! - Recipes: YAML descriptors, one per image
//! - Kitchen: sequential pipeline controller, stops at the first failure
//! - Workspace: disposable scratch directory, wiped at the start of each run
//! - External tools: git, the shell and docker, all behind [`CommandRunner`]

mod error;
pub mod exec;
pub mod recipe;

pub use error::{CommandFailure, Error, Result};
pub use exec::{CancelToken, CommandRunner, Invocation, ProcessRunner};
pub use recipe::{
    BuildReport, CookFailure, ImageDescriptor, Kitchen, KitchenConfig, Recipe, RecipeLoader,
};
