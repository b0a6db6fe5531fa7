// src/recipe/kitchen/package.rs

//! Packaging: turn the built source tree into a tagged container image

use crate::error::{Error, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::recipe::format::Recipe;
use crate::recipe::kitchen::workspace::{copy_tree, remove_path, Workspace, SOURCE_DIR};
use std::fmt;
use std::path::Path;
use tracing::info;

const STAGE: &str = "package";

/// Identity of a produced image: `<namespace>/<name>:<version>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDescriptor {
    pub namespace: String,
    pub name: String,
    pub version: String,
}

impl ImageDescriptor {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// The image reference passed to the image build tool
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.name, self.version)
    }
}

/// Assembles the image build context and invokes the image build
pub struct Packager<'a> {
    runner: &'a dyn CommandRunner,
    docker: &'a str,
    namespace: &'a str,
    descriptor_file: &'a str,
}

impl<'a> Packager<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        docker: &'a str,
        namespace: &'a str,
        descriptor_file: &'a str,
    ) -> Self {
        Self {
            runner,
            docker,
            namespace,
            descriptor_file,
        }
    }

    /// Copy the source tree into `image_dir` and build the image
    pub fn package(
        &self,
        recipe: &Recipe,
        image_dir: &Path,
        workspace: &Workspace,
    ) -> Result<ImageDescriptor> {
        let descriptor = image_dir.join(self.descriptor_file);
        if !descriptor.is_file() {
            return Err(Error::packaging(
                format!("image build descriptor not found: {}", descriptor.display()),
                None,
            ));
        }

        let context_source = image_dir.join(SOURCE_DIR);
        remove_path(&context_source).map_err(|e| {
            Error::packaging(
                format!("failed to remove stale {}", context_source.display()),
                Some(e),
            )
        })?;

        let files = copy_tree(&workspace.source_dir(), &context_source).map_err(|e| {
            Error::packaging(
                format!("failed to copy source into {}", context_source.display()),
                Some(e),
            )
        })?;
        info!("Copied {} file(s) into {}", files, context_source.display());

        let image = ImageDescriptor::new(self.namespace, &recipe.name, &recipe.version);
        let tag = image.tag();

        info!("Building image {}", tag);
        let invocation = Invocation::new(self.docker, image_dir)
            .args(["build", "-t"])
            .arg(tag.as_str())
            .arg(".");

        self.runner
            .run(STAGE, &invocation)
            .map_err(|failure| Error::ImageBuild { tag, failure })?;

        Ok(image)
    }
}
