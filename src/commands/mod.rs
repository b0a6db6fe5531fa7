// src/commands/mod.rs
//! Command handlers for the helmhub-build CLI

mod config;
mod cook;
mod interrupt;

pub use config::{resolve_config, ConfigOverrides};
pub use cook::{cmd_cook, cmd_validate};
