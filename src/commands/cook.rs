// src/commands/cook.rs

//! Cook command - build an image from a named recipe

use super::interrupt::cancel_on_interrupt;
use anyhow::{Context, Result};
use helmhub_builder::recipe::kitchen::discover_patches;
use helmhub_builder::{ImageDescriptor, Kitchen, KitchenConfig};
use tracing::info;

/// Build the image for `image`
///
/// Failures come back as the library's `CookFailure` so the exit status of
/// the failing command can be propagated. SIGINT and SIGTERM cancel the
/// build.
pub fn cmd_cook(image: &str, config: KitchenConfig) -> Result<()> {
    let kitchen = Kitchen::new(config);
    cancel_on_interrupt(kitchen.cancel_token())?;

    let report = kitchen.cook(image)?;

    println!("\n[COMPLETE] Built image: {}", report.image);
    println!("  Ref: {}", report.checkout_ref);
    if !report.patches.is_empty() {
        println!("  Patches: {}", report.patches.join(", "));
    }
    println!("  Steps: {}", report.steps_run);

    if !report.warnings.is_empty() {
        println!("\nRecipe warnings:");
        for warning in &report.warnings {
            println!("  - {}", warning);
        }
    }

    info!(
        "Successfully cooked {} in {:.1}s",
        report.image,
        report.duration.as_secs_f64()
    );

    Ok(())
}

/// Load and validate a recipe, then print what a build would do
pub fn cmd_validate(image: &str, config: KitchenConfig) -> Result<()> {
    let kitchen = Kitchen::new(config);
    let (recipe, warnings) = kitchen.load(image)?;

    let config = kitchen.config();
    let image_dir = config.image_dir(image);
    let patches = discover_patches(&image_dir)
        .with_context(|| format!("Failed to list patches for {}", image))?;
    let target = ImageDescriptor::new(&config.namespace, &recipe.name, &recipe.version);

    println!("Recipe: {} version {}", recipe.name, recipe.version);
    println!("  Upstream: {}", recipe.upstream.repo);
    println!("  Checkout: {}", recipe.checkout_ref());
    println!("  Patches: {}", patches.len());
    for patch in &patches {
        if let Some(name) = patch.file_name() {
            println!("    - {}", name.to_string_lossy());
        }
    }
    println!("  Steps: {}", recipe.build.steps.len());
    for (i, step) in recipe.build.steps.iter().enumerate() {
        println!("    {}. {}", i + 1, step);
    }
    println!("  Image: {}", target);

    for warning in &warnings {
        println!("Warning: {}", warning);
    }

    if !image_dir.join(&config.image_descriptor).is_file() {
        println!(
            "Warning: {} not found in {}",
            config.image_descriptor,
            image_dir.display()
        );
    }

    if warnings.is_empty() {
        println!("[OK] No issues found");
    } else {
        println!("[OK] {} warning(s)", warnings.len());
    }

    Ok(())
}
