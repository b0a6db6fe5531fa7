// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: a directory override
fn dir_arg(name: &'static str, long: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(long).value_name("DIR").help(help)
}

fn build_cli() -> Command {
    Command::new("helmhub-build")
        .version(env!("CARGO_PKG_VERSION"))
        .author("HelmHub Contributors")
        .about("Build a container image from a named recipe")
        .arg(
            Arg::new("image")
                .required(true)
                .help("Image name; selects recipes/<IMAGE>.yaml and images/<IMAGE>/"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Builder configuration file (default: ./helmhub.toml, then <config dir>/helmhub/builder.toml)"),
        )
        .arg(dir_arg("recipes_dir", "recipes-dir", "Directory holding recipe files"))
        .arg(dir_arg("images_dir", "images-dir", "Directory holding image definitions"))
        .arg(dir_arg(
            "workspace",
            "workspace",
            "Scratch directory, wiped at the start of every run",
        ))
        .arg(
            Arg::new("namespace")
                .long("namespace")
                .help("Image namespace for the produced tag"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .help("Per-command timeout in seconds (0 = no limit)"),
        )
        .arg(
            Arg::new("validate")
                .long("validate")
                .action(ArgAction::SetTrue)
                .help("Only load and validate the recipe, then print the build plan"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Man page goes to OUT_DIR so builds never touch the source tree
    let out_dir = match env::var("OUT_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=OUT_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = out_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("helmhub-build.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
